// src/dedup.rs
use crate::models::is_phone_sentinel;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Default run length of consecutive duplicates that abandons the current
/// province scope. Overridable via `DUPLICATE_THRESHOLD`.
pub const DEFAULT_DUPLICATE_THRESHOLD: u32 = 5;

/// Verdict for one candidate listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// New (or phone-less) listing: persist it.
    Persist,
    /// Already seen: drop the listing, keep scanning.
    Skip,
    /// Too many consecutive duplicates: stop paginating this scope.
    AbortScope,
}

/// Stateful duplicate filter. Owns the set of individual phone numbers seen
/// so far (seeded from the store at startup, append-only for the run) and a
/// consecutive-duplicate counter that is reset at the start of every result
/// page and on every non-duplicate observation.
///
/// Directory pages tend to surface new listings first, so a long run of
/// already-seen phone keys means the rest of the scope was ingested on a
/// previous run.
pub struct DuplicateGate {
    seen: HashSet<String>,
    consecutive: u32,
    threshold: u32,
}

impl DuplicateGate {
    pub fn new(seen: HashSet<String>, threshold: u32) -> Self {
        Self {
            seen,
            consecutive: 0,
            threshold,
        }
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Reset the consecutive counter; called at the start of every result page.
    pub fn start_page(&mut self) {
        self.consecutive = 0;
    }

    /// Judge one candidate phone key. A `Persist` verdict also records the
    /// key's constituent numbers so later listings in the same run see them.
    pub fn evaluate(&mut self, phone_key: &str) -> GateDecision {
        if self.is_duplicate(phone_key) {
            self.consecutive += 1;
            debug!(
                "Duplicate phone key ({}/{}): {}",
                self.consecutive, self.threshold, phone_key
            );
            if self.consecutive > self.threshold {
                warn!("Duplicate run exceeded {}, abandoning scope", self.threshold);
                return GateDecision::AbortScope;
            }
            return GateDecision::Skip;
        }

        self.consecutive = 0;
        if !is_phone_sentinel(phone_key) {
            for number in phone_key.split('|').filter(|n| !n.is_empty()) {
                self.seen.insert(number.to_string());
            }
        }
        GateDecision::Persist
    }

    /// A non-sentinel key is a duplicate when every one of its constituent
    /// numbers is already on file.
    fn is_duplicate(&self, phone_key: &str) -> bool {
        if is_phone_sentinel(phone_key) {
            return false;
        }
        let mut numbers = phone_key.split('|').filter(|n| !n.is_empty()).peekable();
        if numbers.peek().is_none() {
            return false;
        }
        numbers.all(|n| self.seen.contains(n))
    }
}
