use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on strip passes so a pathological title cannot loop the
/// cleaner indefinitely.
const MAX_STRIP_PASSES: usize = 8;

/// Ordered noise-suffix rules, applied greedily until none matches.
/// These mirror the junk the ticket vendors append to listing titles.
static STRIP_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Trailing "en 21" vendor artifact
        r"\s+en\s+21\s*$",
        // Trailing city/region qualifier
        r"(?i)\s+en\s+(ALBACETE|JAÉN|MURCIA|VALENCIA|ALICANTE|MADRID)\b.*$",
        // Trailing "- Sábado de <phrase>" style clauses
        r"\s+-\s+\p{Lu}\p{Ll}+\s+(?:de|del)\s+.*$",
        // Trailing year-like token
        r"\s+(?:19|20)\d{2}\s*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// HTML entities that survive feed extraction.
fn decode_entities(text: &str) -> String {
    text.replace("&#8211;", "-")
        .replace("&#8230;", "...")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
}

/// Trim and strip known noise suffixes from a scraped title.
pub fn clean_title(raw: &str) -> String {
    let mut title = decode_entities(raw).trim().to_string();
    for _ in 0..MAX_STRIP_PASSES {
        let mut changed = false;
        for rule in STRIP_RULES.iter() {
            let stripped = rule.replace(&title, "").trim().to_string();
            if stripped != title {
                title = stripped;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    title
}

/// Characters that count toward the minimum-title-length check.
pub fn meaningful_len(title: &str) -> usize {
    title.chars().filter(|c| c.is_alphanumeric()).count()
}
