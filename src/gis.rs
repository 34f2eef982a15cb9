// src/gis.rs
use crate::models::GisPoint;
use regex::Regex;
use tracing::debug;

/// Pulls a `destination=<lat>,<lon>` pair out of a listing's map link.
pub struct GisResolver {
    destination: Regex,
}

impl GisResolver {
    pub fn new() -> Self {
        Self {
            destination: Regex::new(r"destination=(-?[0-9.]+),(-?[0-9.]+)").unwrap(),
        }
    }

    /// Resolve a map link into coordinates. Missing link, malformed link or
    /// unparsable numbers all collapse to the empty point; this never fails
    /// and never aborts extraction of the rest of the record.
    pub fn resolve(&self, link: Option<&str>) -> GisPoint {
        let Some(link) = link else {
            return GisPoint::empty();
        };

        let Some(caps) = self.destination.captures(link) else {
            debug!("No destination pair in map link: {}", link);
            return GisPoint::empty();
        };

        match (caps[1].parse::<f64>(), caps[2].parse::<f64>()) {
            (Ok(lat), Ok(lon)) => GisPoint {
                lat: Some(lat),
                lon: Some(lon),
            },
            _ => GisPoint::empty(),
        }
    }
}

impl Default for GisResolver {
    fn default() -> Self {
        Self::new()
    }
}
