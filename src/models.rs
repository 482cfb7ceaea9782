use serde::{Deserialize, Serialize};

/// One search-result item as returned by a page fetch.
///
/// Holds the item's markup; only an `ItemExtractor` looks inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemHandle {
    markup: String,
}

impl ItemHandle {
    pub fn new(markup: impl Into<String>) -> Self {
        Self { markup: markup.into() }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// Baseline attributes of a listing, fixed the first time its id is seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub name: String,
    pub property_type: String,
    pub city: String,
    pub price: u32,
    pub beds: u32,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
}

/// Id and nightly price read off an item during the availability pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceSighting {
    pub id: String,
    pub price: u32,
}
