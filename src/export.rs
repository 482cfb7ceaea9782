use crate::availability::{AvailabilityCalendar, AvailabilityEntry};
use crate::calendar::ScanDate;
use crate::catalog::ListingCatalog;
use crate::models::ListingRecord;
use crate::report::vacancy_share;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const MISSING: &str = "--";

const BASELINE_HEADER: [&str; 10] = [
    "ID",
    "Title",
    "Type",
    "City",
    "Price",
    "Beds",
    "Rating",
    "Number of Reviews",
    "# of Vacant Days",
    "% Vacancy",
];

fn or_missing<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| v.to_string())
}

fn baseline_row(record: &ListingRecord, calendar: &AvailabilityCalendar, scan_length: u32) -> Vec<String> {
    let (vacant, share) = match calendar.entry(&record.id) {
        Some(entry) => (
            entry.vacant_days().to_string(),
            vacancy_share(entry.vacant_days(), scan_length),
        ),
        None => (MISSING.to_string(), MISSING.to_string()),
    };
    vec![
        record.id.clone(),
        record.name.clone(),
        record.property_type.clone(),
        record.city.clone(),
        record.price.to_string(),
        record.beds.to_string(),
        or_missing(record.rating),
        or_missing(record.review_count),
        vacant,
        share,
    ]
}

/// One row per catalog listing, with its vacancy over the scan window.
pub fn write_baseline<W: Write>(
    writer: W,
    catalog: &ListingCatalog,
    calendar: &AvailabilityCalendar,
    scan_length: u32,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(BASELINE_HEADER)?;
    for record in catalog.iter() {
        writer.write_record(baseline_row(record, calendar, scan_length))?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per calendar listing, `V` on each day it was offered.
pub fn write_vacancy<W: Write>(writer: W, calendar: &AvailabilityCalendar, days: &[ScanDate]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    let mut header = vec!["ID".to_string()];
    header.extend(days.iter().map(ScanDate::key));
    writer.write_record(&header)?;

    for entry in calendar.iter() {
        let mut row = vec![entry.listing_id.clone()];
        row.extend(days.iter().map(|day| match entry.price_on(day) {
            Some(_) => "V".to_string(),
            None => MISSING.to_string(),
        }));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Failed to create output file: {}", path.display()))
}

pub fn save_baseline_csv(
    output_dir: &Path,
    title: &str,
    catalog: &ListingCatalog,
    calendar: &AvailabilityCalendar,
    scan_length: u32,
) -> Result<PathBuf> {
    let path = output_dir.join(format!("{} Baseline.csv", title));
    write_baseline(create(&path)?, catalog, calendar, scan_length)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved {} listings to {}", catalog.len(), path.display());
    Ok(path)
}

pub fn save_vacancy_csv(
    output_dir: &Path,
    title: &str,
    calendar: &AvailabilityCalendar,
    days: &[ScanDate],
) -> Result<PathBuf> {
    let path = output_dir.join(format!("{} Vacancy.csv", title));
    write_vacancy(create(&path)?, calendar, days).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved vacancy for {} listings to {}", calendar.len(), path.display());
    Ok(path)
}

#[derive(Serialize)]
struct Snapshot<'a> {
    title: &'a str,
    days: &'a [ScanDate],
    listings: Vec<&'a ListingRecord>,
    availability: Vec<&'a AvailabilityEntry>,
}

/// Catalog and calendar as one JSON document.
pub fn save_json_snapshot(
    output_dir: &Path,
    title: &str,
    catalog: &ListingCatalog,
    calendar: &AvailabilityCalendar,
    days: &[ScanDate],
) -> Result<PathBuf> {
    let path = output_dir.join(format!("{} Snapshot.json", title));
    let snapshot = Snapshot {
        title,
        days,
        listings: catalog.iter().collect(),
        availability: calendar.iter().collect(),
    };
    serde_json::to_writer_pretty(create(&path)?, &snapshot)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved snapshot to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::days_forward;
    use crate::catalog::listing;

    fn fixture() -> (ListingCatalog, AvailabilityCalendar, Vec<ScanDate>) {
        let mut catalog = ListingCatalog::new();
        catalog.add_or_get(listing("1", 120, 2));
        let mut unrated = listing("2", 80, 1);
        unrated.rating = None;
        catalog.add_or_get(unrated);

        let days: Vec<ScanDate> = days_forward("2024-02-28".parse().unwrap(), 2).collect();
        let mut calendar = AvailabilityCalendar::new();
        calendar.record_sighting("1", days[0], 120);
        calendar.record_sighting("1", days[2], 130);
        (catalog, calendar, days)
    }

    #[test]
    fn baseline_rows_mark_missing_vacancy() {
        let (catalog, calendar, _) = fixture();
        let mut out = Vec::new();
        write_baseline(&mut out, &catalog, &calendar, 4).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "ID,Title,Type,City,Price,Beds,Rating,Number of Reviews,# of Vacant Days,% Vacancy"
        );
        assert_eq!(lines[1], "1,Listing 1,Entire home/apt,Boca Raton,120,2,4.8,12,2,50.0%");
        assert_eq!(lines[2], "2,Listing 2,Entire home/apt,Boca Raton,80,1,--,12,--,--");
    }

    #[test]
    fn vacancy_grid_has_a_column_per_day() {
        let (_, calendar, days) = fixture();
        let mut out = Vec::new();
        write_vacancy(&mut out, &calendar, &days).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec!["ID,2024-02-28,2024-03-01,2024-03-02", "1,V,--,V"]
        );
    }

    #[test]
    fn files_are_named_after_the_title() {
        let (catalog, calendar, days) = fixture();
        let dir = std::env::temp_dir().join(format!("airanalytics-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let baseline = save_baseline_csv(&dir, "Boca Raton", &catalog, &calendar, 3).unwrap();
        let snapshot = save_json_snapshot(&dir, "Boca Raton", &catalog, &calendar, &days).unwrap();
        assert!(baseline.ends_with("Boca Raton Baseline.csv"));

        let json: serde_json::Value = serde_json::from_reader(File::open(&snapshot).unwrap()).unwrap();
        assert_eq!(json["listings"].as_array().unwrap().len(), 2);
        assert_eq!(json["availability"][0]["prices"]["2024-03-02"], 130);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
