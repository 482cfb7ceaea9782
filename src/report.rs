//! Read-only summaries of a finished scan, shaped for charts and tables.

use crate::availability::AvailabilityCalendar;
use crate::calendar::ScanDate;
use crate::catalog::ListingCatalog;
use std::collections::BTreeMap;
use std::fmt;

pub const HISTOGRAM_BIN_WIDTH: u32 = 20;

/// Bed counts need more than this many listings (or prices) to get a series.
pub const MIN_SERIES_SIZE: usize = 3;

/// Baseline prices bucketed per bed count.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistogram {
    pub bin_width: u32,
    /// Lower edge of each bin, from 0 up to the highest baseline price.
    pub edges: Vec<u32>,
    pub counts_by_beds: BTreeMap<u32, Vec<usize>>,
}

impl PriceHistogram {
    pub fn bin_of(&self, price: u32) -> usize {
        ((price / self.bin_width) as usize).min(self.edges.len().saturating_sub(1))
    }
}

impl fmt::Display for PriceHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (beds, counts) in &self.counts_by_beds {
            let total: usize = counts.iter().sum();
            writeln!(f, "{} Bed ({} listings)", beds, total)?;
            for (edge, count) in self.edges.iter().zip(counts).filter(|&(_, &count)| count > 0) {
                writeln!(f, "  ${:>5}-{:<5} {}", edge, edge + self.bin_width - 1, "#".repeat(*count))?;
            }
        }
        Ok(())
    }
}

pub fn price_histogram(catalog: &ListingCatalog, bin_width: u32) -> PriceHistogram {
    let bin_width = bin_width.max(1);
    let edges: Vec<u32> = (0..=catalog.max_price()).step_by(bin_width as usize).collect();
    let mut histogram = PriceHistogram {
        bin_width,
        edges,
        counts_by_beds: BTreeMap::new(),
    };

    for beds in 1..=catalog.max_beds() {
        let prices = catalog.prices_by_bed_count(beds);
        if prices.is_empty() {
            continue;
        }
        let mut counts = vec![0; histogram.edges.len()];
        for price in prices {
            counts[histogram.bin_of(price)] += 1;
        }
        histogram.counts_by_beds.insert(beds, counts);
    }
    histogram
}

/// Vacant listings per day, split by bed count.
#[derive(Debug, Clone, PartialEq)]
pub struct VacancyReport {
    pub days: Vec<ScanDate>,
    /// Only bed counts with enough catalog listings and at least one sighting.
    pub by_beds: BTreeMap<u32, Vec<usize>>,
    pub total: Vec<usize>,
    /// Days whose total dips below both neighbours.
    pub low_demand_days: Vec<ScanDate>,
}

impl fmt::Display for VacancyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12}", "Date")?;
        for beds in self.by_beds.keys() {
            write!(f, "{:>7}", format!("{} Bed", beds))?;
        }
        writeln!(f, "{:>7}", "Total")?;
        for (i, day) in self.days.iter().enumerate() {
            write!(f, "{:<12}", day.key())?;
            for series in self.by_beds.values() {
                write!(f, "{:>7}", series[i])?;
            }
            let marker = if self.low_demand_days.contains(day) { "  <" } else { "" };
            writeln!(f, "{:>7}{}", self.total[i], marker)?;
        }
        Ok(())
    }
}

pub fn vacancy_report(catalog: &ListingCatalog, calendar: &AvailabilityCalendar, days: &[ScanDate]) -> VacancyReport {
    let mut total = vec![0; days.len()];
    let mut by_beds = BTreeMap::new();

    for beds in 1..=catalog.max_beds() {
        if catalog.count_by_bed_count(beds) <= MIN_SERIES_SIZE {
            continue;
        }
        let series: Vec<usize> = days
            .iter()
            .map(|day| calendar.count_by_bed_count_and_date(catalog, beds, day))
            .collect();
        for (slot, count) in total.iter_mut().zip(&series) {
            *slot += count;
        }
        if series.iter().any(|&count| count > 0) {
            by_beds.insert(beds, series);
        }
    }

    let low_demand_days = local_minima(&total).into_iter().map(|i| days[i]).collect();
    VacancyReport {
        days: days.to_vec(),
        by_beds,
        total,
        low_demand_days,
    }
}

/// Indices of strict interior local minima.
pub fn local_minima(series: &[usize]) -> Vec<usize> {
    series
        .windows(3)
        .enumerate()
        .filter(|(_, w)| w[1] < w[0] && w[1] < w[2])
        .map(|(i, _)| i + 1)
        .collect()
}

/// Per-bed price lists for one day, keeping bed counts with enough prices.
pub fn date_price_distribution(
    catalog: &ListingCatalog,
    calendar: &AvailabilityCalendar,
    date: &ScanDate,
) -> BTreeMap<u32, Vec<u32>> {
    (1..=catalog.max_beds())
        .map(|beds| (beds, calendar.by_bed_count_and_date(catalog, beds, date)))
        .filter(|(_, prices)| prices.len() > MIN_SERIES_SIZE)
        .collect()
}

/// Share of the scan window a listing was vacant, as `12.5%`.
pub fn vacancy_share(vacant_days: usize, scan_length: u32) -> String {
    if scan_length == 0 {
        return "--".to_string();
    }
    format!("{:.1}%", 100.0 * vacant_days as f64 / scan_length as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::days_forward;
    use crate::catalog::listing;

    fn catalog_with(beds: &[(u32, u32)]) -> ListingCatalog {
        let mut catalog = ListingCatalog::new();
        for (i, &(price, bed)) in beds.iter().enumerate() {
            catalog.add_or_get(listing(&format!("l{}", i), price, bed));
        }
        catalog
    }

    #[test]
    fn histogram_bins_by_twenty() {
        let catalog = catalog_with(&[(15, 1), (20, 1), (39, 1), (100, 2)]);
        let histogram = price_histogram(&catalog, HISTOGRAM_BIN_WIDTH);

        assert_eq!(histogram.edges, vec![0, 20, 40, 60, 80, 100]);
        assert_eq!(histogram.counts_by_beds[&1], vec![1, 2, 0, 0, 0, 0]);
        assert_eq!(histogram.counts_by_beds[&2], vec![0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn minima_are_strict_and_interior() {
        assert_eq!(local_minima(&[1, 3, 2, 4, 4, 1]), vec![2]);
        assert_eq!(local_minima(&[5, 2, 2, 5]), Vec::<usize>::new());
        assert_eq!(local_minima(&[0, 1]), Vec::<usize>::new());
    }

    #[test]
    fn vacancy_keeps_only_well_populated_bed_counts() {
        // five 1-bed listings, two 2-bed listings
        let catalog = catalog_with(&[(100, 1), (110, 1), (120, 1), (130, 1), (140, 1), (200, 2), (210, 2)]);
        let days: Vec<ScanDate> = days_forward("2024-03-01".parse().unwrap(), 2).collect();
        let mut calendar = AvailabilityCalendar::new();
        for id in ["l0", "l1", "l2"] {
            calendar.record_sighting(id, days[0], 100);
            calendar.record_sighting(id, days[2], 100);
        }
        calendar.record_sighting("l3", days[1], 100);
        calendar.record_sighting("l5", days[1], 200);

        let report = vacancy_report(&catalog, &calendar, &days);

        assert_eq!(report.by_beds.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(report.total, vec![3, 1, 3]);
        assert_eq!(report.low_demand_days, vec![days[1]]);
    }

    #[test]
    fn distribution_needs_more_than_three_prices() {
        let catalog = catalog_with(&[(100, 1), (110, 1), (120, 1), (130, 1), (200, 2), (210, 2)]);
        let day: ScanDate = "2024-05-10".parse().unwrap();
        let mut calendar = AvailabilityCalendar::new();
        for (id, price) in [("l0", 90), ("l1", 95), ("l2", 99), ("l3", 105), ("l4", 180)] {
            calendar.record_sighting(id, day, price);
        }

        let distribution = date_price_distribution(&catalog, &calendar, &day);
        assert_eq!(distribution.len(), 1);
        assert_eq!(distribution[&1].len(), 4);
    }

    #[test]
    fn vacancy_share_formats_one_decimal() {
        assert_eq!(vacancy_share(3, 30), "10.0%");
        assert_eq!(vacancy_share(1, 3), "33.3%");
        assert_eq!(vacancy_share(1, 0), "--");
    }
}
