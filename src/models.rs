// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Placeholder when an element's text cannot be read.
pub const NO_TEXT_FOUND: &str = "NoTextFound.";
/// Placeholder when a listing carries no phone fragments at all.
pub const NO_PHONE_FOUND: &str = "NoPhoneFound";
/// Placeholder when phone fragments exist but range expansion yielded nothing.
pub const NO_PHONE_EXPANDED: &str = "NoPhoneFoundInExpanded";
/// Placeholder when a listing carries no email fragments.
pub const NO_EMAIL_FOUND: &str = "NoEmailFound";

/// True when `phone_key` marks a phone-less record; such records bypass
/// duplicate detection entirely.
pub fn is_phone_sentinel(phone_key: &str) -> bool {
    phone_key == NO_PHONE_FOUND || phone_key == NO_PHONE_EXPANDED
}

/// Nullable coordinate pair pulled from a listing's map link.
/// Serialized as `{"lat": ..., "lon": ...}` with explicit nulls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GisPoint {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl GisPoint {
    pub fn empty() -> Self {
        Self { lat: None, lon: None }
    }
}

/// One extracted listing. Every field is always populated, with a sentinel
/// standing in for anything unreadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: String,
    pub specialty: String,
    /// Pipe-joined, fully expanded phone numbers in encounter order;
    /// the deduplication identity of the listing.
    pub phone_key: String,
    pub address: String,
    pub email: String,
    pub category_name: String,
    pub subcategory_name: String,
    pub subsidiary_name: String,
    pub gis: GisPoint,
    pub scraped_at: DateTime<Utc>,
}

/// Taxonomy position of the listing currently being extracted.
#[derive(Debug, Clone)]
pub struct TaxonomyContext {
    pub category_name: String,
    pub subcategory_name: String,
    pub subsidiary_name: String,
}

/// Resumption coordinates supplied at startup. `category_floor` skips the
/// first N categories; `subsidiary_floor` skips the first N entries of the
/// flattened subsidiary-link list of the first category processed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlCheckpoint {
    pub category_floor: usize,
    pub subsidiary_floor: usize,
}
