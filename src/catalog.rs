use crate::models::ListingRecord;
use std::collections::HashMap;

/// Every unique listing seen during a scan, keyed by listing id.
///
/// The first record stored for an id wins; later sightings never update it.
#[derive(Debug, Default, Clone)]
pub struct ListingCatalog {
    records: Vec<ListingRecord>,
    index: HashMap<String, usize>,
    max_beds: u32,
    max_price: u32,
}

impl ListingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record` unless its id is already known, and returns the
    /// record held for that id either way.
    pub fn add_or_get(&mut self, record: ListingRecord) -> &ListingRecord {
        if let Some(&position) = self.index.get(&record.id) {
            return &self.records[position];
        }
        self.max_beds = self.max_beds.max(record.beds);
        self.max_price = self.max_price.max(record.price);
        let position = self.records.len();
        self.index.insert(record.id.clone(), position);
        self.records.push(record);
        &self.records[position]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn lookup(&self, id: &str) -> Option<&ListingRecord> {
        self.index.get(id).map(|&position| &self.records[position])
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ListingRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    pub fn by_bed_count(&self, beds: u32) -> Vec<&ListingRecord> {
        self.records.iter().filter(|record| record.beds == beds).collect()
    }

    pub fn count_by_bed_count(&self, beds: u32) -> usize {
        self.records.iter().filter(|record| record.beds == beds).count()
    }

    pub fn prices_by_bed_count(&self, beds: u32) -> Vec<u32> {
        self.records
            .iter()
            .filter(|record| record.beds == beds)
            .map(|record| record.price)
            .collect()
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ListingRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn max_beds(&self) -> u32 {
        self.max_beds
    }

    pub fn max_price(&self) -> u32 {
        self.max_price
    }
}

#[cfg(test)]
pub(crate) fn listing(id: &str, price: u32, beds: u32) -> ListingRecord {
    ListingRecord {
        id: id.to_string(),
        name: format!("Listing {}", id),
        property_type: "Entire home/apt".to_string(),
        city: "Boca Raton".to_string(),
        price,
        beds,
        rating: Some(4.8),
        review_count: Some(12),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_wins() {
        let mut catalog = ListingCatalog::new();
        let original = listing("42", 120, 2);
        assert_eq!(catalog.add_or_get(original.clone()), &original);

        let mut conflicting = listing("42", 900, 7);
        conflicting.name = "Renamed".to_string();
        assert_eq!(catalog.add_or_get(conflicting.clone()), &original);
        assert_eq!(catalog.add_or_get(conflicting), &original);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.max_beds(), 2);
        assert_eq!(catalog.max_price(), 120);
    }

    #[test]
    fn maxima_track_new_records() {
        let mut catalog = ListingCatalog::new();
        catalog.add_or_get(listing("a", 80, 1));
        catalog.add_or_get(listing("b", 310, 3));
        catalog.add_or_get(listing("c", 150, 4));
        assert_eq!(catalog.max_beds(), 4);
        assert_eq!(catalog.max_price(), 310);
    }

    #[test]
    fn filters_by_bed_count() {
        let mut catalog = ListingCatalog::new();
        catalog.add_or_get(listing("a", 80, 1));
        catalog.add_or_get(listing("b", 95, 1));
        catalog.add_or_get(listing("c", 150, 2));

        let ones: Vec<&str> = catalog.by_bed_count(1).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ones, vec!["a", "b"]);
        assert_eq!(catalog.count_by_bed_count(2), 1);
        assert_eq!(catalog.count_by_bed_count(5), 0);
        assert_eq!(catalog.prices_by_bed_count(1), vec![80, 95]);
    }

    #[test]
    fn lookup_reports_missing_ids() {
        let mut catalog = ListingCatalog::new();
        catalog.add_or_get(listing("a", 80, 1));
        assert_eq!(catalog.lookup("a").map(|r| r.price), Some(80));
        assert!(catalog.lookup("zzz").is_none());
        assert_eq!(catalog.find_by_name("Listing a").map(|r| r.id.as_str()), Some("a"));
    }
}
