//! Simulated keyword suggestions.

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KeywordSuggestion {
    pub keyword: String,
    pub search_volume: u32,
}

/// Five canned suggestions around `seed_phrase`, or `None` when it is empty.
pub fn extract(seed_phrase: &str) -> Option<Vec<KeywordSuggestion>> {
    if seed_phrase.is_empty() {
        return None;
    }

    let rows = [
        (format!("{} best price", seed_phrase), 8500),
        (format!("{} for sale", seed_phrase), 3200),
        ("e-commerce product keyword".to_string(), 5000),
        ("top trending listing keyword".to_string(), 1500),
        ("formula man's suggestion".to_string(), 900),
    ];

    Some(
        rows.into_iter()
            .map(|(keyword, search_volume)| KeywordSuggestion {
                keyword,
                search_volume,
            })
            .collect(),
    )
}
