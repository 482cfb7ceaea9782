use crate::availability::AvailabilityCalendar;
use crate::calendar::{days_forward, tomorrow, ScanDate};
use crate::catalog::ListingCatalog;
use crate::collector::{AccuracyTracker, CancelFlag, CollectorPolicy, Harvest, PaginatedCollector, QueryReport};
use crate::models::{ItemHandle, ListingRecord};
use crate::region::GeoRegion;
use crate::source::{ExtractionError, ItemExtractor, PageFetcher};
use crate::tui::{percent, ScanTUI};
use crate::debug_println;
use anyhow::Result;
use std::collections::HashSet;

/// Knobs for a full scan: grid size and the day window.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub split: usize,
    pub scan_length: u32,
    /// First scanned day; tomorrow when unset.
    pub start: Option<ScanDate>,
    pub skip_availability: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            split: 3,
            scan_length: 30,
            start: None,
            skip_availability: false,
        }
    }
}

impl ScanOptions {
    pub fn days(&self) -> Vec<ScanDate> {
        let start = self.start.unwrap_or_else(tomorrow);
        days_forward(start, self.scan_length).collect()
    }
}

/// Outcome of the date-agnostic pass over a grid of regions.
#[derive(Debug, Clone, Default)]
pub struct BaselineSummary {
    /// Grid cells with their running unit and price totals.
    pub regions: Vec<GeoRegion>,
    pub reports: Vec<QueryReport>,
    pub accuracy: AccuracyTracker,
    pub new_listings: usize,
    pub cancelled: bool,
}

/// Outcome of the per-day pass.
#[derive(Debug, Clone, Default)]
pub struct AvailabilitySummary {
    pub days: Vec<ScanDate>,
    pub reports: Vec<QueryReport>,
    pub accuracy: AccuracyTracker,
    /// Listings first seen during this pass and added to the catalog.
    pub discovered: usize,
    pub cancelled: bool,
}

impl BaselineSummary {
    pub fn overflowed(&self) -> impl Iterator<Item = &QueryReport> {
        self.reports.iter().filter(|report| report.overflow)
    }
}

impl AvailabilitySummary {
    pub fn overflowed(&self) -> impl Iterator<Item = &QueryReport> {
        self.reports.iter().filter(|report| report.overflow)
    }
}

/// Everything a full scan produced.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub catalog: ListingCatalog,
    pub calendar: AvailabilityCalendar,
    pub baseline: BaselineSummary,
    pub availability: Option<AvailabilitySummary>,
}

impl ScanResult {
    /// Accuracy rolled up over both passes.
    pub fn accuracy(&self) -> AccuracyTracker {
        let mut total = self.baseline.accuracy.clone();
        if let Some(availability) = &self.availability {
            total.merge(&availability.accuracy);
        }
        total
    }

    pub fn cancelled(&self) -> bool {
        self.baseline.cancelled || self.availability.as_ref().map_or(false, |a| a.cancelled)
    }
}

struct BaselineHarvest<'a, E: ItemExtractor> {
    extractor: &'a E,
    catalog: &'a mut ListingCatalog,
    seen: HashSet<String>,
    units: u64,
    price_sum: u64,
    new_listings: usize,
}

impl<'a, E: ItemExtractor> Harvest for BaselineHarvest<'a, E> {
    type Item = ListingRecord;

    fn extract(&mut self, item: &ItemHandle) -> Result<ListingRecord, ExtractionError> {
        self.extractor.extract(item)
    }

    fn price(item: &ListingRecord) -> u32 {
        item.price
    }

    fn accept(&mut self, items: Vec<ListingRecord>) {
        for record in items {
            // region totals count each listing once even if it shows up on two pages
            if self.seen.insert(record.id.clone()) {
                self.units += 1;
                self.price_sum += record.price as u64;
            }
            if !self.catalog.contains(&record.id) {
                self.new_listings += 1;
            }
            self.catalog.add_or_get(record);
        }
    }
}

struct Sighting {
    id: String,
    price: u32,
    /// Full fields, present only when the id was not in the catalog yet.
    listing: Option<ListingRecord>,
}

struct AvailabilityHarvest<'a, E: ItemExtractor> {
    extractor: &'a E,
    catalog: &'a mut ListingCatalog,
    calendar: &'a mut AvailabilityCalendar,
    date: ScanDate,
    discovered: usize,
}

impl<'a, E: ItemExtractor> Harvest for AvailabilityHarvest<'a, E> {
    type Item = Sighting;

    fn extract(&mut self, item: &ItemHandle) -> Result<Sighting, ExtractionError> {
        let sighting = self.extractor.extract_price(item)?;
        let listing = if self.catalog.contains(&sighting.id) {
            None
        } else {
            Some(self.extractor.extract(item)?)
        };
        Ok(Sighting {
            id: sighting.id,
            price: sighting.price,
            listing,
        })
    }

    fn price(item: &Sighting) -> u32 {
        item.price
    }

    fn accept(&mut self, items: Vec<Sighting>) {
        for sighting in items {
            if let Some(record) = sighting.listing {
                if !self.catalog.contains(&record.id) {
                    self.discovered += 1;
                    debug_println!("Discovered listing {} on {}", record.id, self.date);
                }
                self.catalog.add_or_get(record);
            }
            self.calendar.record_sighting(&sighting.id, self.date, sighting.price);
        }
    }
}

fn print_query_line(report: &QueryReport) {
    if report.overflow {
        eprintln!(
            "ALERT: listings missed - search span included {} pages",
            report.declared_pages
        );
    }
    match report.accuracy() {
        Some(ratio) => println!(
            "Sample of {}/{} listings ({} accuracy)",
            report.accepted,
            report.sampled,
            percent(ratio)
        ),
        None => println!("Search provided no results."),
    }
}

/// Runs the baseline and availability passes against one source.
pub struct ScrapeOrchestrator<'a, F: PageFetcher, E: ItemExtractor> {
    fetcher: &'a F,
    extractor: &'a E,
    policy: CollectorPolicy,
    cancel: CancelFlag,
}

impl<'a, F: PageFetcher, E: ItemExtractor> ScrapeOrchestrator<'a, F, E> {
    pub fn new(fetcher: &'a F, extractor: &'a E, policy: CollectorPolicy) -> Self {
        Self {
            fetcher,
            extractor,
            policy,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Baseline over `area`, then availability for each day of the window
    /// unless skipped or cancelled.
    pub fn run(&self, area: &GeoRegion, options: &ScanOptions, mut tui: Option<&mut ScanTUI>) -> Result<ScanResult> {
        let mut result = ScanResult::default();
        result.baseline = self.baseline_pass(area, options.split, &mut result.catalog, tui.as_deref_mut())?;
        println!("Catalog holds {} listings", result.catalog.len());

        if options.skip_availability || result.baseline.cancelled {
            return Ok(result);
        }
        let availability = self.availability_pass(
            area.base(),
            options.days(),
            &mut result.catalog,
            &mut result.calendar,
            tui.as_deref_mut(),
        )?;
        println!(
            "Calendar holds {} listings, {} found only during the availability pass",
            result.calendar.len(),
            availability.discovered
        );
        result.availability = Some(availability);
        Ok(result)
    }

    /// Splits `area` into a `split` x `split` grid and collects every cell
    /// into `catalog`.
    pub fn baseline_pass(
        &self,
        area: &GeoRegion,
        split: usize,
        catalog: &mut ListingCatalog,
        mut tui: Option<&mut ScanTUI>,
    ) -> Result<BaselineSummary> {
        let mut summary = BaselineSummary {
            regions: area.split(split)?,
            ..BaselineSummary::default()
        };
        let mut collector = PaginatedCollector::new(self.fetcher, &self.policy, &self.cancel);

        if let Some(tui) = tui.as_mut() {
            tui.start_pass("Baseline", summary.regions.len())?;
        }

        let total = summary.regions.len();
        for (position, region) in summary.regions.iter_mut().enumerate() {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let query = region.query();
            debug_println!("Search {}/{} on {}: {}", position + 1, total, self.fetcher.name(), query);
            if let Some(tui) = tui.as_mut() {
                tui.start_unit("Search")?;
            }

            let mut harvest = BaselineHarvest {
                extractor: self.extractor,
                catalog: &mut *catalog,
                seen: HashSet::new(),
                units: 0,
                price_sum: 0,
                new_listings: 0,
            };
            let report = collector.collect(&query, &mut harvest);
            region.record(harvest.units, harvest.price_sum);
            summary.new_listings += harvest.new_listings;
            summary.cancelled |= report.cancelled;

            match tui.as_mut() {
                Some(tui) => tui.finish_unit("Search", &report)?,
                None => print_query_line(&report),
            }
            summary.accuracy.record(&report);
            summary.reports.push(report);
        }

        if let Some(tui) = tui.as_mut() {
            if summary.cancelled {
                tui.cancelled()?;
            }
            tui.finish_pass(&summary.accuracy)?;
        }
        Ok(summary)
    }

    /// Collects one-night availability for each day into `calendar`,
    /// adding listings the baseline never saw to `catalog`.
    pub fn availability_pass(
        &self,
        base_query: &str,
        days: impl IntoIterator<Item = ScanDate>,
        catalog: &mut ListingCatalog,
        calendar: &mut AvailabilityCalendar,
        mut tui: Option<&mut ScanTUI>,
    ) -> Result<AvailabilitySummary> {
        let mut summary = AvailabilitySummary {
            days: days.into_iter().collect(),
            ..AvailabilitySummary::default()
        };
        let mut collector = PaginatedCollector::new(self.fetcher, &self.policy, &self.cancel);

        if let Some(tui) = tui.as_mut() {
            tui.start_pass("Availability", summary.days.len())?;
        }

        for date in &summary.days {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let query = format!("{}{}", base_query, date.stay_path());
            let label = format!("Date {:02}/{:02}", date.month(), date.day());
            debug_println!("{}: {}", label, query);
            if let Some(tui) = tui.as_mut() {
                tui.start_unit(&label)?;
            }

            let mut harvest = AvailabilityHarvest {
                extractor: self.extractor,
                catalog: &mut *catalog,
                calendar: &mut *calendar,
                date: *date,
                discovered: 0,
            };
            let report = collector.collect(&query, &mut harvest);
            summary.discovered += harvest.discovered;
            summary.cancelled |= report.cancelled;

            match tui.as_mut() {
                Some(tui) => tui.finish_unit(&label, &report)?,
                None => print_query_line(&report),
            }
            summary.accuracy.record(&report);
            summary.reports.push(report);
        }

        if let Some(tui) = tui.as_mut() {
            if summary.cancelled {
                tui.cancelled()?;
            }
            tui.finish_pass(&summary.accuracy)?;
        }
        Ok(summary)
    }
}
