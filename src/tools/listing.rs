//! Listing drafts and the simulated listing analysis.

use serde::{Deserialize, Serialize};

pub const MIN_PRICE: f64 = 0.01;

/// Product categories offered by the listing form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Electronics,
    Clothing,
    HomeGoods,
    Other,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Electronics,
        Category::Clothing,
        Category::HomeGoods,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Clothing => "Clothing",
            Category::HomeGoods => "Home Goods",
            Category::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.label() == label)
    }
}

/// Raw listing form values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: String,
}

/// Why a draft could not be summarized.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingIssue {
    MissingTitle,
    UnknownCategory(String),
    InvalidPrice(String),
}

impl ListingIssue {
    pub fn message(&self) -> String {
        match self {
            ListingIssue::MissingTitle => "Please enter a Product Title.".to_string(),
            ListingIssue::UnknownCategory(c) => format!("Unknown category: {}", c),
            ListingIssue::InvalidPrice(p) => {
                format!("Price must be a number of at least {:.2}, got {:?}", MIN_PRICE, p)
            }
        }
    }
}

/// Preview of a listing ready to publish.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListingSummary {
    pub title: String,
    pub category: &'static str,
    pub price: String,
    pub description: String,
}

/// Build the listing preview for a submitted draft.
///
/// # Arguments
/// * `draft` - Raw form values
///
/// # Returns
/// * `Ok(ListingSummary)` - Title, category, formatted price and description
/// * `Err(ListingIssue)` - The title is blank, the category is unknown, or
///   the price is below [`MIN_PRICE`] or not a number. A blank price counts as
///   the minimum
pub fn summarize(draft: &ListingDraft) -> Result<ListingSummary, ListingIssue> {
    if draft.title.is_empty() {
        return Err(ListingIssue::MissingTitle);
    }

    let category = Category::from_label(&draft.category)
        .ok_or_else(|| ListingIssue::UnknownCategory(draft.category.clone()))?;

    let price = match draft.price.trim() {
        "" => MIN_PRICE,
        raw => raw
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= MIN_PRICE)
            .ok_or_else(|| ListingIssue::InvalidPrice(draft.price.clone()))?,
    };

    Ok(ListingSummary {
        title: draft.title.clone(),
        category: category.label(),
        price: format!("${:.2}", price),
        description: draft.description.clone(),
    })
}

/// One line of the canned listing analysis.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Finding {
    pub aspect: &'static str,
    pub verdict: &'static str,
}

const FINDINGS: [Finding; 3] = [
    Finding {
        aspect: "Keyword Density",
        verdict: "Low (Need more target keywords from Key Word Extractor)",
    },
    Finding {
        aspect: "Readability",
        verdict: "Good (Flesch-Kincaid Grade Level: 8)",
    },
    Finding {
        aspect: "Call-to-Action",
        verdict: "Missing (Suggest adding a strong CTA like 'Buy Now!')",
    },
];

/// Simulated analysis output.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListingAnalysis {
    pub findings: Vec<Finding>,
    pub suggestion: String,
}

/// Fixed findings plus a suggestion with every `product` rewritten.
/// Empty text yields `None`.
pub fn analyze(listing_text: &str) -> Option<ListingAnalysis> {
    if listing_text.is_empty() {
        return None;
    }
    Some(ListingAnalysis {
        findings: FINDINGS.to_vec(),
        suggestion: listing_text.replace("product", "high-quality product listing"),
    })
}
