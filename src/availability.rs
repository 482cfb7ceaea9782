use crate::calendar::ScanDate;
use crate::catalog::ListingCatalog;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Prices at which one listing was offered, per scanned day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityEntry {
    pub listing_id: String,
    pub prices: BTreeMap<ScanDate, u32>,
}

impl AvailabilityEntry {
    pub fn price_on(&self, date: &ScanDate) -> Option<u32> {
        self.prices.get(date).copied()
    }

    pub fn vacant_days(&self) -> usize {
        self.prices.len()
    }
}

/// Per-listing availability over a scan window.
///
/// Bed counts are read from the `ListingCatalog` by id; entries only grow.
#[derive(Debug, Default, Clone)]
pub struct AvailabilityCalendar {
    entries: Vec<AvailabilityEntry>,
    index: HashMap<String, usize>,
}

impl AvailabilityCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `id` was offered on `date` at `price`. A second sighting
    /// for the same day replaces the price.
    pub fn record_sighting(&mut self, id: &str, date: ScanDate, price: u32) {
        let position = match self.index.get(id) {
            Some(&position) => position,
            None => {
                self.entries.push(AvailabilityEntry {
                    listing_id: id.to_string(),
                    prices: BTreeMap::new(),
                });
                self.index.insert(id.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[position].prices.insert(date, price);
    }

    pub fn entry(&self, id: &str) -> Option<&AvailabilityEntry> {
        self.index.get(id).map(|&position| &self.entries[position])
    }

    pub fn vacant_days(&self, id: &str) -> usize {
        self.entry(id).map_or(0, AvailabilityEntry::vacant_days)
    }

    pub fn by_bed_count_and_date(&self, catalog: &ListingCatalog, beds: u32, date: &ScanDate) -> Vec<u32> {
        self.entries
            .iter()
            .filter(|entry| catalog.lookup(&entry.listing_id).is_some_and(|r| r.beds == beds))
            .filter_map(|entry| entry.price_on(date))
            .collect()
    }

    pub fn count_by_bed_count_and_date(&self, catalog: &ListingCatalog, beds: u32, date: &ScanDate) -> usize {
        self.by_bed_count_and_date(catalog, beds, date).len()
    }

    /// Entries in first-sighting order.
    pub fn iter(&self) -> impl Iterator<Item = &AvailabilityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
