use crate::config::CategoryKeywords;
use crate::types::Category;

/// Classify an event from its title + description text against the ordered
/// keyword table. The first category with a matching keyword wins; table
/// order is the priority order. No match means Culture.
pub fn classify(text: &str, table: &[CategoryKeywords]) -> Category {
    let haystack = text.to_lowercase();
    for entry in table {
        if entry
            .keywords
            .iter()
            .any(|keyword| haystack.contains(keyword.as_str()))
        {
            return entry.category;
        }
    }
    Category::default()
}
