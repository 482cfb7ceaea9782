//! Pagination over one query with bounded retries.
//!
//! Each page runs through a small state machine:
//!
//! ```text
//! Fetching --empty/timeout--> Retrying(EmptyPage, n) --> Fetching
//! Fetching --ratio <= threshold--> Retrying(LowAccuracy, n) --> Fetching
//! Fetching --ratio > threshold--> Accepted
//! Fetching --budget spent / transport error--> Rejected
//! ```
//!
//! Extracted items only reach the caller's `Harvest::accept` from `Accepted`.

use crate::models::ItemHandle;
use crate::source::{ExtractionError, ExtractionErrorKind, FetchError, PageFetcher};
use crate::{debug_eprintln, debug_println};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Retry budgets and thresholds for one pass.
#[derive(Debug, Clone)]
pub struct CollectorPolicy {
    /// Fetches of an empty page before it counts as "no data".
    pub empty_page_attempts: u32,
    /// Extra fetch+extract cycles allowed after a low-accuracy page.
    pub low_accuracy_retries: u32,
    /// A page is accepted only when its success ratio is above this.
    pub accept_ratio: f64,
    /// Declared page counts at or above this mean the region is too big.
    pub overflow_ceiling: u32,
    pub probe_attempts: u32,
    pub offset_param: String,
    /// Pause before every request after the first.
    pub request_delay: Duration,
}

impl Default for CollectorPolicy {
    fn default() -> Self {
        Self {
            empty_page_attempts: 3,
            low_accuracy_retries: 2,
            accept_ratio: 0.80,
            overflow_ceiling: 18,
            probe_attempts: 3,
            offset_param: "&section_offset=".to_string(),
            request_delay: Duration::from_millis(500),
        }
    }
}

/// Cooperative stop signal, checked before each query and each page.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a pass does with result items: how to extract them and where
/// accepted ones go.
pub trait Harvest {
    type Item;

    fn extract(&mut self, item: &ItemHandle) -> Result<Self::Item, ExtractionError>;

    fn price(item: &Self::Item) -> u32;

    /// Called once per accepted page with every item extracted from it.
    fn accept(&mut self, items: Vec<Self::Item>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCause {
    EmptyPage,
    LowAccuracy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageRejection {
    /// Every attempt came back empty or timed out.
    NoData,
    /// The last attempt still fell at or below the accept ratio.
    LowAccuracy { sampled: usize, extracted: usize },
    Transport(FetchError),
}

#[derive(Debug)]
enum PageState<T> {
    Fetching,
    Retrying(RetryCause, u32),
    Accepted(PageAttempt<T>),
    Rejected(PageRejection),
}

#[derive(Debug)]
struct PageAttempt<T> {
    sampled: usize,
    items: Vec<T>,
    failures: Vec<ExtractionErrorKind>,
}

impl<T> PageAttempt<T> {
    fn ratio(&self) -> f64 {
        if self.sampled == 0 {
            0.0
        } else {
            self.items.len() as f64 / self.sampled as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Accepted { extracted: usize, sampled: usize, price_sum: u64 },
    Rejected(PageRejection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageReport {
    pub index: u32,
    pub url: String,
    pub fetches: u32,
    /// Raw items this page adds to the query's sample, accepted or not.
    pub sampled: usize,
    pub outcome: PageOutcome,
}

/// Totals for one query across all of its pages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryReport {
    pub query: String,
    /// Page count as probed, before promoting 0 to 1.
    pub declared_pages: u32,
    /// Declared count reached the ceiling; listings were likely missed.
    pub overflow: bool,
    pub accepted: usize,
    pub sampled: usize,
    pub price_sum: u64,
    pub pages: Vec<PageReport>,
    pub cancelled: bool,
}

impl QueryReport {
    /// Extraction accuracy in 0..=1, or `None` when nothing was sampled.
    pub fn accuracy(&self) -> Option<f64> {
        if self.sampled == 0 {
            None
        } else {
            Some(self.accepted as f64 / self.sampled as f64)
        }
    }

    /// Pages that ended in a transport failure.
    pub fn failed_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|page| matches!(page.outcome, PageOutcome::Rejected(PageRejection::Transport(_))))
            .count()
    }
}

/// Running accuracy over all queries of a pass.
///
/// `mean_accuracy` averages per-query ratios without weighting by sample
/// size; `pooled_accuracy` is the count-weighted figure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccuracyTracker {
    ratio_sum: f64,
    queries: usize,
    accepted: usize,
    sampled: usize,
    empty_queries: usize,
}

impl AccuracyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, report: &QueryReport) {
        match report.accuracy() {
            Some(ratio) => {
                self.ratio_sum += ratio;
                self.queries += 1;
                self.accepted += report.accepted;
                self.sampled += report.sampled;
            }
            None => self.empty_queries += 1,
        }
    }

    pub fn merge(&mut self, other: &AccuracyTracker) {
        self.ratio_sum += other.ratio_sum;
        self.queries += other.queries;
        self.accepted += other.accepted;
        self.sampled += other.sampled;
        self.empty_queries += other.empty_queries;
    }

    pub fn mean_accuracy(&self) -> Option<f64> {
        if self.queries == 0 {
            None
        } else {
            Some(self.ratio_sum / self.queries as f64)
        }
    }

    pub fn pooled_accuracy(&self) -> Option<f64> {
        if self.sampled == 0 {
            None
        } else {
            Some(self.accepted as f64 / self.sampled as f64)
        }
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn sampled(&self) -> usize {
        self.sampled
    }

    pub fn queries(&self) -> usize {
        self.queries
    }

    pub fn empty_queries(&self) -> usize {
        self.empty_queries
    }
}

/// Walks every page of a query through a `PageFetcher`.
pub struct PaginatedCollector<'a, F: PageFetcher> {
    fetcher: &'a F,
    policy: &'a CollectorPolicy,
    cancel: &'a CancelFlag,
    requests: u32,
}

impl<'a, F: PageFetcher> PaginatedCollector<'a, F> {
    pub fn new(fetcher: &'a F, policy: &'a CollectorPolicy, cancel: &'a CancelFlag) -> Self {
        Self {
            fetcher,
            policy,
            cancel,
            requests: 0,
        }
    }

    /// Declared page count for `query`, or 0 when every probe failed.
    pub fn declared_page_count(&mut self, query: &str) -> u32 {
        for attempt in 1..=self.policy.probe_attempts {
            self.pause();
            match self.fetcher.probe_page_count(query) {
                Ok(Some(pages)) => return pages,
                Ok(None) => debug_println!("Page count probe {} found no pagination", attempt),
                Err(e) => debug_eprintln!("Page count probe {} failed: {}", attempt, e),
            }
        }
        0
    }

    pub fn collect<H: Harvest>(&mut self, query: &str, harvest: &mut H) -> QueryReport {
        let mut report = QueryReport {
            query: query.to_string(),
            ..QueryReport::default()
        };

        let declared = self.declared_page_count(query);
        report.declared_pages = declared;
        let pages = if declared >= self.policy.overflow_ceiling {
            report.overflow = true;
            debug_eprintln!(
                "Declared {} pages, at or above the {} page ceiling",
                declared,
                self.policy.overflow_ceiling
            );
            declared
        } else {
            declared.max(1)
        };

        for index in 0..pages {
            if self.cancel.is_cancelled() {
                debug_println!("Cancelled before page {} of {}", index + 1, pages);
                report.cancelled = true;
                break;
            }

            let url = self.page_url(query, index);
            debug_println!("Page {}/{}: {}", index + 1, pages, url);
            let page = self.collect_page(index, url, harvest);

            report.sampled += page.sampled;
            if let PageOutcome::Accepted { extracted, price_sum, .. } = &page.outcome {
                report.accepted += extracted;
                report.price_sum += price_sum;
            }
            report.pages.push(page);
        }

        report
    }

    fn page_url(&self, query: &str, index: u32) -> String {
        if index == 0 {
            query.to_string()
        } else {
            format!("{}{}{}", query, self.policy.offset_param, index)
        }
    }

    fn collect_page<H: Harvest>(&mut self, index: u32, url: String, harvest: &mut H) -> PageReport {
        let mut state: PageState<H::Item> = PageState::Fetching;
        let mut fetches = 0;
        let mut empty_fetches = 0;
        let mut low_accuracy = 0;
        // (sampled, extracted) of the latest low-accuracy attempt
        let mut last_low: Option<(usize, usize)> = None;

        loop {
            state = match state {
                current @ (PageState::Fetching | PageState::Retrying(..)) => {
                    if let PageState::Retrying(cause, n) = current {
                        debug_println!("Retrying page {} ({:?} #{})", index + 1, cause, n);
                    }
                    self.pause();
                    fetches += 1;
                    match self.fetcher.fetch_page(&url) {
                        Ok(items) if !items.is_empty() => {
                            let attempt = extract_page(&items, harvest);
                            if attempt.ratio() > self.policy.accept_ratio {
                                PageState::Accepted(attempt)
                            } else {
                                low_accuracy += 1;
                                last_low = Some((attempt.sampled, attempt.items.len()));
                                debug_println!(
                                    "Low accuracy page: {}/{} extracted ({:?})",
                                    attempt.items.len(),
                                    attempt.sampled,
                                    attempt.failures
                                );
                                if low_accuracy > self.policy.low_accuracy_retries {
                                    let rejection = PageRejection::LowAccuracy {
                                        sampled: attempt.sampled,
                                        extracted: attempt.items.len(),
                                    };
                                    PageState::Rejected(rejection)
                                } else {
                                    PageState::Retrying(RetryCause::LowAccuracy, low_accuracy)
                                }
                            }
                        }
                        Ok(_) | Err(FetchError::Timeout) => {
                            empty_fetches += 1;
                            if empty_fetches >= self.policy.empty_page_attempts {
                                debug_println!("Page {}: no data", index + 1);
                                match last_low {
                                    Some((sampled, extracted)) => {
                                        PageState::Rejected(PageRejection::LowAccuracy { sampled, extracted })
                                    }
                                    None => PageState::Rejected(PageRejection::NoData),
                                }
                            } else {
                                PageState::Retrying(RetryCause::EmptyPage, empty_fetches)
                            }
                        }
                        Err(e) => {
                            debug_eprintln!("Page {} failed: {}", index + 1, e);
                            PageState::Rejected(PageRejection::Transport(e))
                        }
                    }
                }
                PageState::Accepted(attempt) => {
                    let extracted = attempt.items.len();
                    let price_sum: u64 = attempt.items.iter().map(|item| H::price(item) as u64).sum();
                    debug_println!("{}/{}", extracted, attempt.sampled);
                    harvest.accept(attempt.items);
                    return PageReport {
                        index,
                        url,
                        fetches,
                        sampled: attempt.sampled,
                        outcome: PageOutcome::Accepted {
                            extracted,
                            sampled: attempt.sampled,
                            price_sum,
                        },
                    };
                }
                PageState::Rejected(rejection) => {
                    return PageReport {
                        index,
                        url,
                        fetches,
                        sampled: last_low.map_or(0, |(sampled, _)| sampled),
                        outcome: PageOutcome::Rejected(rejection),
                    };
                }
            };
        }
    }

    fn pause(&mut self) {
        if self.requests > 0 && !self.policy.request_delay.is_zero() {
            thread::sleep(self.policy.request_delay);
        }
        self.requests += 1;
    }
}

fn extract_page<H: Harvest>(items: &[ItemHandle], harvest: &mut H) -> PageAttempt<H::Item> {
    let mut attempt = PageAttempt {
        sampled: items.len(),
        items: Vec::with_capacity(items.len()),
        failures: Vec::new(),
    };
    for item in items {
        match harvest.extract(item) {
            Ok(extracted) => attempt.items.push(extracted),
            Err(e) => {
                debug_eprintln!("Listing Error - {}", e.kind);
                attempt.failures.push(e.kind);
            }
        }
    }
    attempt
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::{ListingRecord, PriceSighting};
    use crate::source::ItemExtractor;
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    /// Plays back scripted responses per URL; the last one repeats.
    #[derive(Default)]
    pub struct ScriptedFetcher {
        pages: RefCell<HashMap<String, VecDeque<Result<Vec<ItemHandle>, FetchError>>>>,
        counts: RefCell<HashMap<String, VecDeque<Result<Option<u32>, FetchError>>>>,
        pub fetch_log: RefCell<Vec<String>>,
        pub count_log: RefCell<Vec<String>>,
    }

    fn play<T: Clone>(queue: Option<&mut VecDeque<T>>, fallback: T) -> T {
        match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(fallback),
            Some(queue) => queue.front().cloned().unwrap_or(fallback),
            None => fallback,
        }
    }

    impl ScriptedFetcher {
        pub fn page(mut self, url: &str, responses: Vec<Result<Vec<ItemHandle>, FetchError>>) -> Self {
            self.pages.get_mut().insert(url.to_string(), responses.into());
            self
        }

        pub fn count(self, url: &str, pages: Option<u32>) -> Self {
            self.counts_in_turn(url, vec![Ok(pages)])
        }

        /// One answer per page-count attempt; the last one repeats.
        pub fn counts_in_turn(mut self, url: &str, answers: Vec<Result<Option<u32>, FetchError>>) -> Self {
            self.counts.get_mut().insert(url.to_string(), answers.into());
            self
        }

        pub fn count_requests_of(&self, url: &str) -> usize {
            self.count_log.borrow().iter().filter(|u| *u == url).count()
        }

        pub fn fetches_of(&self, url: &str) -> usize {
            self.fetch_log.borrow().iter().filter(|u| *u == url).count()
        }
    }

    impl PageFetcher for ScriptedFetcher {
        fn name(&self) -> &str {
            "scripted"
        }

        fn fetch_page(&self, url: &str) -> Result<Vec<ItemHandle>, FetchError> {
            self.fetch_log.borrow_mut().push(url.to_string());
            play(self.pages.borrow_mut().get_mut(url), Ok(Vec::new()))
        }

        fn probe_page_count(&self, url: &str) -> Result<Option<u32>, FetchError> {
            self.count_log.borrow_mut().push(url.to_string());
            play(self.counts.borrow_mut().get_mut(url), Ok(None))
        }
    }

    /// Items are `ok:<id>:<price>:<beds>` or `bad`.
    pub fn items(good: usize, bad: usize, prefix: &str) -> Vec<ItemHandle> {
        let mut out: Vec<ItemHandle> = (0..good)
            .map(|i| ItemHandle::new(format!("ok:{}{}:{}:{}", prefix, i, 100 + i, 1 + i % 3)))
            .collect();
        out.extend((0..bad).map(|_| ItemHandle::new("bad")));
        out
    }

    pub struct TokenExtractor;

    impl ItemExtractor for TokenExtractor {
        fn extract(&self, item: &ItemHandle) -> Result<ListingRecord, ExtractionError> {
            let parts: Vec<&str> = item.markup().split(':').collect();
            match parts.as_slice() {
                ["ok", id, price, beds] => Ok(ListingRecord {
                    id: id.to_string(),
                    name: format!("Listing {}", id),
                    property_type: "Entire home/apt".to_string(),
                    city: "Testville".to_string(),
                    price: price.parse().unwrap(),
                    beds: beds.parse().unwrap(),
                    rating: None,
                    review_count: Some(0),
                }),
                _ => Err(ExtractionErrorKind::MissingCard.into()),
            }
        }

        fn extract_price(&self, item: &ItemHandle) -> Result<PriceSighting, ExtractionError> {
            self.extract(item).map(|record| PriceSighting {
                id: record.id,
                price: record.price,
            })
        }
    }

    /// Harvest that keeps accepted records in a vector.
    #[derive(Default)]
    pub struct Collected(pub Vec<ListingRecord>);

    impl Harvest for Collected {
        type Item = ListingRecord;

        fn extract(&mut self, item: &ItemHandle) -> Result<ListingRecord, ExtractionError> {
            TokenExtractor.extract(item)
        }

        fn price(item: &ListingRecord) -> u32 {
            item.price
        }

        fn accept(&mut self, items: Vec<ListingRecord>) {
            self.0.extend(items);
        }
    }

    pub fn quiet_policy() -> CollectorPolicy {
        CollectorPolicy {
            request_delay: Duration::ZERO,
            ..CollectorPolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    const Q: &str = "https://example.test/s/town?x=1";

    fn run(fetcher: &ScriptedFetcher) -> (QueryReport, Collected) {
        let policy = quiet_policy();
        let cancel = CancelFlag::new();
        let mut harvest = Collected::default();
        let report = PaginatedCollector::new(fetcher, &policy, &cancel).collect(Q, &mut harvest);
        (report, harvest)
    }

    #[test]
    fn ninety_percent_page_is_accepted_first_time() {
        let fetcher = ScriptedFetcher::default()
            .count(Q, Some(1))
            .page(Q, vec![Ok(items(9, 1, "a"))]);
        let (report, harvest) = run(&fetcher);

        assert_eq!(fetcher.fetches_of(Q), 1);
        assert_eq!((report.accepted, report.sampled), (9, 10));
        assert_eq!(harvest.0.len(), 9);
        assert_eq!(report.accuracy(), Some(0.9));
    }

    #[test]
    fn seventy_percent_page_is_retried() {
        let fetcher = ScriptedFetcher::default()
            .count(Q, Some(1))
            .page(Q, vec![Ok(items(7, 3, "a")), Ok(items(10, 0, "b"))]);
        let (report, harvest) = run(&fetcher);

        assert_eq!(fetcher.fetches_of(Q), 2);
        assert_eq!((report.accepted, report.sampled), (10, 10));
        // the rejected attempt's partial results never reach the harvest
        assert!(harvest.0.iter().all(|r| r.id.starts_with('b')));
    }

    #[test]
    fn exactly_eighty_percent_is_not_enough() {
        let fetcher = ScriptedFetcher::default()
            .count(Q, Some(1))
            .page(Q, vec![Ok(items(8, 2, "a"))]);
        let (report, harvest) = run(&fetcher);

        assert_eq!(fetcher.fetches_of(Q), 3);
        assert_eq!(report.accepted, 0);
        assert_eq!(report.sampled, 10);
        assert!(harvest.0.is_empty());
        assert_eq!(
            report.pages[0].outcome,
            PageOutcome::Rejected(PageRejection::LowAccuracy { sampled: 10, extracted: 8 })
        );
    }

    #[test]
    fn empty_page_gives_up_after_three_fetches() {
        let fetcher = ScriptedFetcher::default().count(Q, Some(1)).page(Q, vec![Ok(vec![])]);
        let (report, _) = run(&fetcher);

        assert_eq!(fetcher.fetches_of(Q), 3);
        assert_eq!(report.sampled, 0);
        assert_eq!(report.accuracy(), None);
        assert_eq!(report.pages[0].outcome, PageOutcome::Rejected(PageRejection::NoData));
    }

    #[test]
    fn timeouts_count_as_empty_attempts() {
        let fetcher = ScriptedFetcher::default()
            .count(Q, Some(1))
            .page(Q, vec![Err(FetchError::Timeout), Ok(vec![]), Ok(items(5, 0, "a"))]);
        let (report, _) = run(&fetcher);

        assert_eq!(fetcher.fetches_of(Q), 3);
        assert_eq!(report.accepted, 5);
    }

    #[test]
    fn transport_failure_ends_only_that_page() {
        let page2 = format!("{}&section_offset=1", Q);
        let fetcher = ScriptedFetcher::default()
            .count(Q, Some(2))
            .page(Q, vec![Err(FetchError::Status(503))])
            .page(&page2, vec![Ok(items(4, 0, "p2"))]);
        let (report, _) = run(&fetcher);

        assert_eq!(fetcher.fetches_of(Q), 1);
        assert_eq!(report.pages.len(), 2);
        assert_eq!(
            report.pages[0].outcome,
            PageOutcome::Rejected(PageRejection::Transport(FetchError::Status(503)))
        );
        assert_eq!(report.accepted, 4);
        assert_eq!(report.failed_pages(), 1);
    }

    #[test]
    fn later_pages_use_offset_parameter() {
        let fetcher = ScriptedFetcher::default()
            .count(Q, Some(3))
            .page(Q, vec![Ok(items(2, 0, "p0"))])
            .page(&format!("{}&section_offset=1", Q), vec![Ok(items(2, 0, "p1"))])
            .page(&format!("{}&section_offset=2", Q), vec![Ok(items(2, 0, "p2"))]);
        let (report, harvest) = run(&fetcher);

        assert_eq!(report.accepted, 6);
        assert_eq!(report.price_sum, 100 + 101 + 100 + 101 + 100 + 101);
        assert_eq!(harvest.0.len(), 6);
    }

    #[test]
    fn low_accuracy_then_empty_keeps_the_sample() {
        let fetcher = ScriptedFetcher::default()
            .count(Q, Some(1))
            .page(Q, vec![Ok(items(5, 5, "a")), Ok(vec![])]);
        let (report, harvest) = run(&fetcher);

        assert_eq!(fetcher.fetches_of(Q), 4);
        assert_eq!((report.accepted, report.sampled), (0, 10));
        assert_eq!(report.accuracy(), Some(0.0));
        assert!(harvest.0.is_empty());
        assert_eq!(
            report.pages[0].outcome,
            PageOutcome::Rejected(PageRejection::LowAccuracy { sampled: 10, extracted: 5 })
        );
    }

    #[test]
    fn low_accuracy_then_transport_failure_keeps_the_sample() {
        let fetcher = ScriptedFetcher::default()
            .count(Q, Some(1))
            .page(Q, vec![Ok(items(6, 4, "a")), Err(FetchError::Status(500))]);
        let (report, _) = run(&fetcher);

        assert_eq!(fetcher.fetches_of(Q), 2);
        assert_eq!(report.sampled, 10);
        assert_eq!(report.failed_pages(), 1);
    }

    #[test]
    fn page_count_from_a_later_attempt_is_used() {
        let fetcher = ScriptedFetcher::default()
            .counts_in_turn(Q, vec![Ok(None), Err(FetchError::Timeout), Ok(Some(2))])
            .page(Q, vec![Ok(items(1, 0, "p0"))])
            .page(&format!("{}&section_offset=1", Q), vec![Ok(items(1, 0, "p1"))]);
        let (report, _) = run(&fetcher);

        assert_eq!(fetcher.count_requests_of(Q), 3);
        assert_eq!(report.declared_pages, 2);
        assert_eq!(report.pages.len(), 2);
    }

    #[test]
    fn page_count_gives_up_after_three_attempts() {
        let fetcher = ScriptedFetcher::default()
            .counts_in_turn(Q, vec![Ok(None), Ok(None), Ok(None), Ok(Some(5))])
            .page(Q, vec![Ok(items(3, 0, "a"))]);
        let (report, _) = run(&fetcher);

        assert_eq!(fetcher.count_requests_of(Q), 3);
        assert_eq!(report.declared_pages, 0);
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.accepted, 3);
    }

    #[test]
    fn missing_page_count_still_tries_one_page() {
        let fetcher = ScriptedFetcher::default().page(Q, vec![Ok(items(3, 0, "a"))]);
        let (report, _) = run(&fetcher);

        assert_eq!(fetcher.count_requests_of(Q), 3);
        assert_eq!(report.declared_pages, 0);
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.accepted, 3);
        assert!(!report.overflow);
    }

    #[test]
    fn page_count_at_ceiling_is_flagged() {
        let fetcher = ScriptedFetcher::default().count(Q, Some(18));
        let (report, _) = run(&fetcher);

        assert!(report.overflow);
        assert_eq!(report.pages.len(), 18);
    }

    #[test]
    fn cancellation_stops_at_page_boundary() {
        let fetcher = ScriptedFetcher::default()
            .count(Q, Some(4))
            .page(Q, vec![Ok(items(2, 0, "a"))]);
        let policy = quiet_policy();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut harvest = Collected::default();
        let report = PaginatedCollector::new(&fetcher, &policy, &cancel).collect(Q, &mut harvest);

        assert!(report.cancelled);
        assert!(report.pages.is_empty());
        assert!(fetcher.fetch_log.borrow().is_empty());
    }

    #[test]
    fn tracker_averages_ratios_not_counts() {
        let mut tracker = AccuracyTracker::new();
        tracker.record(&QueryReport { accepted: 1, sampled: 1, ..QueryReport::default() });
        tracker.record(&QueryReport { accepted: 50, sampled: 100, ..QueryReport::default() });
        tracker.record(&QueryReport::default());

        assert_eq!(tracker.mean_accuracy(), Some(0.75));
        assert_eq!(tracker.pooled_accuracy(), Some(51.0 / 101.0));
        assert_eq!(tracker.queries(), 2);
        assert_eq!(tracker.empty_queries(), 1);

        let mut other = AccuracyTracker::new();
        other.record(&QueryReport { accepted: 2, sampled: 4, ..QueryReport::default() });
        tracker.merge(&other);
        assert_eq!(tracker.queries(), 3);
        assert_eq!(tracker.sampled(), 105);
    }
}
