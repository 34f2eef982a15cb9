// src/extract.rs
use crate::browser::{DocumentProvider, Element};
use crate::gis::GisResolver;
use crate::models::{
    BusinessRecord, TaxonomyContext, NO_EMAIL_FOUND, NO_PHONE_EXPANDED, NO_PHONE_FOUND,
    NO_TEXT_FOUND,
};
use crate::phones::expand_phone_range;
use chrono::Utc;
use tracing::debug;

// Listing-card internals.
const NAME: &str = "h2 a";
const KEYWORDS: &str = "div.keywords";
const POSTAL_DESC: &str = "p.print-postal-hidden";
const PHONE_FRAGMENTS: &str = r#"div[data-print-adv="phone"] span"#;
const ADDRESS: &str = r#"p[data-print-adv="address"]"#;
const EMAIL_FRAGMENTS: &str = r#"div[data-print-adv="email"] span"#;
const MAP_LINK: &str = r#"a[href*="destination="]"#;

/// Reads one listing card into a `BusinessRecord`. Every field read is
/// independently fault-tolerant: an unreadable sub-element becomes a
/// sentinel, never a dropped record.
pub struct RecordExtractor {
    gis: GisResolver,
}

impl RecordExtractor {
    pub fn new() -> Self {
        Self {
            gis: GisResolver::new(),
        }
    }

    pub fn extract<D: DocumentProvider>(
        &self,
        provider: &mut D,
        card: Element,
        ctx: &TaxonomyContext,
    ) -> BusinessRecord {
        let name = text_or_sentinel(provider, card, NAME);

        let mut specialty = text_or_sentinel(provider, card, KEYWORDS);
        specialty.push_str(" | ");
        specialty.push_str(&text_or_sentinel(provider, card, POSTAL_DESC));

        let phone_key = self.extract_phone_key(provider, card);
        let address = text_or_sentinel(provider, card, ADDRESS);
        let email = extract_email(provider, card);

        let map_link = provider
            .find_in(card, MAP_LINK)
            .and_then(|el| provider.attr(el, "href"));
        let gis = self.gis.resolve(map_link.as_deref());

        debug!("Extracted listing: {} ({})", name, phone_key);

        BusinessRecord {
            name,
            specialty,
            phone_key,
            address,
            email,
            category_name: ctx.category_name.clone(),
            subcategory_name: ctx.subcategory_name.clone(),
            subsidiary_name: ctx.subsidiary_name.clone(),
            gis,
            scraped_at: Utc::now(),
        }
    }

    /// Every phone fragment on the card is range-expanded and the expansions
    /// flattened, pipe-joined in encounter order. No fragments at all and a
    /// fragment set that expands to nothing get distinct sentinels; both mark
    /// the record phone-less but still persistable.
    fn extract_phone_key<D: DocumentProvider>(&self, provider: &mut D, card: Element) -> String {
        let fragments: Vec<String> = provider
            .find_all_in(card, PHONE_FRAGMENTS)
            .into_iter()
            .filter_map(|el| provider.text(el))
            .collect();

        if fragments.is_empty() {
            return NO_PHONE_FOUND.to_string();
        }

        let numbers: Vec<String> = fragments
            .iter()
            .flat_map(|raw| expand_phone_range(raw))
            .filter(|n| !n.is_empty())
            .collect();

        if numbers.is_empty() {
            NO_PHONE_EXPANDED.to_string()
        } else {
            numbers.join("|")
        }
    }
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn text_or_sentinel<D: DocumentProvider>(provider: &mut D, card: Element, selector: &str) -> String {
    provider
        .find_in(card, selector)
        .and_then(|el| provider.text(el))
        .unwrap_or_else(|| NO_TEXT_FOUND.to_string())
}

fn extract_email<D: DocumentProvider>(provider: &mut D, card: Element) -> String {
    let emails: Vec<String> = provider
        .find_all_in(card, EMAIL_FRAGMENTS)
        .into_iter()
        .filter_map(|el| provider.text(el))
        .collect();

    if emails.is_empty() {
        NO_EMAIL_FOUND.to_string()
    } else {
        emails.join("|")
    }
}
