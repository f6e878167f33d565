use crate::types::Price;
use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:a las\s+)?(\d{1,2}):(\d{2})\s*h?").unwrap());

/// Pull an `HH:MM` start time out of free text. Absence yields None, which
/// the store renders as "unknown" rather than midnight.
pub fn extract_time(text: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

static FREE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(gratis|gratuito|gratuita|entrada libre)\b").unwrap());

static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:[.,]\d{1,2})?)\s*(?:€|euros?)").unwrap());

static LABELED_PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)precio:\s*(\d+(?:[.,]\d{1,2})?)").unwrap());

/// Pull a ticket price out of free text. "gratis"/"entrada libre" beats a
/// number so "antes 10 €, ahora gratis" reads as free.
pub fn extract_price(text: &str) -> Price {
    if FREE_RE.is_match(text) {
        return Price::Free;
    }
    let amount = AMOUNT_RE
        .captures(text)
        .or_else(|| LABELED_PRICE_RE.captures(text))
        .and_then(|caps| caps[1].replace(',', ".").parse::<f64>().ok());
    match amount {
        Some(euros) => Price::Amount { euros },
        None => Price::Unknown,
    }
}

/// Venue aliases as they appear in municipal prose, mapped to the canonical
/// names used in the store.
const KNOWN_VENUES: [(&str, &str); 7] = [
    ("teatro regio", "Teatro Regio"),
    ("teatro principal", "Teatro Principal"),
    ("castillo", "Castillo de Almansa"),
    ("auditorio", "Auditorio de la Unión Musical"),
    ("recinto ferial", "Recinto Ferial"),
    ("plaza mayor", "Plaza Mayor"),
    ("casa de la cultura", "Casa de la Cultura"),
];

pub fn extract_venue(text: &str) -> Option<String> {
    let haystack = text.to_lowercase();
    KNOWN_VENUES
        .iter()
        .find(|(alias, _)| haystack.contains(alias))
        .map(|(_, canonical)| canonical.to_string())
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const MAX_DESCRIPTION_CHARS: usize = 300;

/// Strip markup, collapse whitespace and cap the description for the store.
pub fn clean_description(text: &str) -> String {
    let stripped = TAG_RE.replace_all(text, " ");
    let collapsed = WS_RE.replace_all(&stripped, " ");
    collapsed.trim().chars().take(MAX_DESCRIPTION_CHARS).collect()
}
