// src/phones.rs
//
// Directory listings compress runs of phone numbers into a range notation:
// "021-4442~45" means 0214442, 0214443, 0214444, 0214445. The suffix after
// the `~` fixes the width of the varying tail; the rest of the base is an
// invariant prefix.

const RANGE_MARKER: char = '~';

/// Expand a raw phone string into the ordered list of individual numbers.
///
/// Spaces and hyphens are stripped first. Without a range marker the result
/// is always a one-element list of the cleaned string (possibly empty — the
/// extractor substitutes a sentinel upstream). A malformed range (non-digit
/// suffix, suffix longer than the base, second marker bleeding into the
/// suffix) degrades to the cleaned string rather than failing. A range whose
/// start exceeds its end expands to nothing.
pub fn expand_phone_range(raw: &str) -> Vec<String> {
    let cleaned: String = raw.chars().filter(|c| *c != ' ' && *c != '-').collect();

    let Some((base, end_suffix)) = cleaned.split_once(RANGE_MARKER) else {
        return vec![cleaned];
    };

    let width = end_suffix.len();
    if width == 0 || !end_suffix.bytes().all(|b| b.is_ascii_digit()) {
        return vec![cleaned];
    }
    if base.len() < width || !base.bytes().all(|b| b.is_ascii_digit()) {
        return vec![cleaned];
    }

    let (prefix, start_suffix) = base.split_at(base.len() - width);
    let (Ok(start), Ok(end)) = (start_suffix.parse::<u64>(), end_suffix.parse::<u64>()) else {
        return vec![cleaned];
    };

    (start..=end)
        .map(|i| format!("{prefix}{i:0width$}"))
        .collect()
}
