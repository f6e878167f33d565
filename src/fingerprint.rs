use chrono::NaiveDate;
use uuid::Uuid;

/// Fixed namespace so fingerprints stay stable across builds and runs.
const FINGERPRINT_NAMESPACE: Uuid = Uuid::from_u128(0x8f1d_4c2a_9b6e_4d3f_a750_13c9e02ab4d6);

/// Derive the deduplication identity of an event: what + when + where.
///
/// Source, price and description are deliberately excluded so the same
/// real-world event reported by two sources collapses to one key. Case and
/// surrounding whitespace are folded; genuine title differences are not.
pub fn fingerprint(title: &str, date: NaiveDate, venue: &str) -> Uuid {
    let key = format!(
        "{}|{}|{}",
        title.trim().to_lowercase(),
        date.format("%Y-%m-%d"),
        venue.trim().to_lowercase()
    );
    Uuid::new_v5(&FINGERPRINT_NAMESPACE, key.as_bytes())
}

/// Stable row identifier for the human-facing store.
pub fn row_id(fingerprint: &Uuid) -> String {
    let hex = fingerprint.simple().to_string();
    format!("evt_{}", &hex[..12])
}
