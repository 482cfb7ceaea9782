use crate::models::{ItemHandle, ListingRecord, PriceSighting};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Counted as one empty attempt by the collector.
    #[error("request timed out")]
    Timeout,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionErrorKind {
    MissingName,
    MalformedName,
    MissingCard,
    MissingId,
    MissingPrice,
    MissingBeds,
    Unparseable(String),
}

impl fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionErrorKind::MissingName => write!(f, "name meta tag missing"),
            ExtractionErrorKind::MalformedName => write!(f, "name is not `title - type - city`"),
            ExtractionErrorKind::MissingCard => write!(f, "listing card missing"),
            ExtractionErrorKind::MissingId => write!(f, "listing id missing"),
            ExtractionErrorKind::MissingPrice => write!(f, "price missing"),
            ExtractionErrorKind::MissingBeds => write!(f, "bed count missing"),
            ExtractionErrorKind::Unparseable(what) => write!(f, "cannot parse {}", what),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("extraction failed: {kind}")]
pub struct ExtractionError {
    pub kind: ExtractionErrorKind,
}

impl From<ExtractionErrorKind> for ExtractionError {
    fn from(kind: ExtractionErrorKind) -> Self {
        Self { kind }
    }
}

/// Retrieves result pages from the search index.
pub trait PageFetcher {
    fn name(&self) -> &str;

    /// Item handles found on the page at `url`, possibly none.
    fn fetch_page(&self, url: &str) -> Result<Vec<ItemHandle>, FetchError>;

    /// One attempt at reading the declared page count; `Ok(None)` when the
    /// page carries no usable pagination text.
    fn probe_page_count(&self, url: &str) -> Result<Option<u32>, FetchError>;
}

/// Turns an item handle into structured listing data.
pub trait ItemExtractor {
    fn extract(&self, item: &ItemHandle) -> Result<ListingRecord, ExtractionError>;

    /// Reads only the id and price, for listings already in the catalog.
    fn extract_price(&self, item: &ItemHandle) -> Result<PriceSighting, ExtractionError>;
}
