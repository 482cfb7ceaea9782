use airanalytics::airbnb::{self, ListingCardExtractor, SearchClient};
use airanalytics::calendar::ScanDate;
use airanalytics::collector::CollectorPolicy;
use airanalytics::orchestrator::{ScanOptions, ScanResult, ScrapeOrchestrator};
use airanalytics::region::GeoRegion;
use airanalytics::tui::{percent, ScanTUI};
use airanalytics::{debug, export, report};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[clap(author, version, about = "AirAnalytics - short-term rental market scanner")]
struct Args {
    /// Market name used in report titles and output file names
    #[clap(short, long, default_value = "Market")]
    title: String,

    /// Search location slug, e.g. boca-raton
    #[clap(short, long)]
    location: String,

    /// Bounding box as ne_lat=..&ne_lng=..&sw_lat=..&sw_lng=..
    #[clap(short, long)]
    coords: String,

    #[clap(long, default_value = "Entire home/apt")]
    room_type: String,

    /// Grid factor; the area is searched as split x split regions
    #[clap(short, long, default_value = "3")]
    split: usize,

    /// Days scanned after the start date, at most a year
    #[clap(long, default_value = "30", value_parser = clap::value_parser!(u32).range(0..=365))]
    scan_length: u32,

    /// First scanned day (YYYY-MM-DD or MM/DD/YYYY), tomorrow if omitted
    #[clap(long)]
    start: Option<String>,

    #[clap(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Pause between page requests
    #[clap(long, default_value = "500")]
    delay_ms: u64,

    /// Per-page fetch timeout; a timed out fetch counts as an empty page
    #[clap(long, default_value = "30")]
    timeout_secs: u64,

    /// Only run the baseline pass
    #[clap(long)]
    skip_availability: bool,

    /// Also write a JSON snapshot of catalog and calendar
    #[clap(long)]
    json: bool,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

fn print_reports(title: &str, result: &ScanResult) {
    println!("\n=== {} - Baseline ===", title);
    print!("{}", report::price_histogram(&result.catalog, report::HISTOGRAM_BIN_WIDTH));
    for (i, region) in result.baseline.regions.iter().enumerate() {
        match region.average_price() {
            Some(average) => println!("Region {}: {} listings, average ${:.2}", i + 1, region.unit_count(), average),
            None => println!("Region {}: no listings", i + 1),
        }
    }

    let Some(availability) = &result.availability else {
        return;
    };
    let vacancy = report::vacancy_report(&result.catalog, &result.calendar, &availability.days);
    println!("\n=== {} - Vacancy Report ===", title);
    print!("{}", vacancy);

    for day in &vacancy.low_demand_days {
        println!("\n{} - {}", day, title);
        for (beds, prices) in report::date_price_distribution(&result.catalog, &result.calendar, day) {
            let low = prices.iter().min().copied().unwrap_or_default();
            let high = prices.iter().max().copied().unwrap_or_default();
            let mean = prices.iter().map(|&p| p as f64).sum::<f64>() / prices.len() as f64;
            println!("  {} Bed: {} offers, ${}-${} (mean ${:.2})", beds, prices.len(), low, high, mean);
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    debug::set_debug(args.debug);
    let started = Instant::now();

    println!("AirAnalytics - {}", args.title);
    println!("{}", "=".repeat(args.title.len() + 15));

    let base = airbnb::search_url(&args.location, &args.room_type);
    let area = GeoRegion::from_coordinates(base, &args.coords).context("Invalid --coords")?;
    let start = args
        .start
        .as_deref()
        .map(str::parse::<ScanDate>)
        .transpose()
        .context("Invalid --start")?;

    let options = ScanOptions {
        split: args.split,
        scan_length: args.scan_length,
        start,
        skip_availability: args.skip_availability,
    };
    let policy = CollectorPolicy {
        request_delay: Duration::from_millis(args.delay_ms),
        ..CollectorPolicy::default()
    };

    let client = SearchClient::new(Duration::from_secs(args.timeout_secs))?;
    let extractor = ListingCardExtractor::new()?;
    let orchestrator = ScrapeOrchestrator::new(&client, &extractor, policy);

    let cancel = orchestrator.cancel_flag();
    ctrlc::set_handler(move || {
        eprintln!("Stopping after the current page...");
        cancel.cancel();
    })
    .context("Failed to install Ctrl-C handler")?;

    let mut tui = ScanTUI::new();
    let result = orchestrator.run(&area, &options, Some(&mut tui))?;

    print_reports(&args.title, &result);

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    export::save_baseline_csv(&args.output_dir, &args.title, &result.catalog, &result.calendar, args.scan_length)?;
    let days = result.availability.as_ref().map(|a| a.days.as_slice()).unwrap_or_default();
    if result.availability.is_some() {
        export::save_vacancy_csv(&args.output_dir, &args.title, &result.calendar, days)?;
    }
    if args.json {
        export::save_json_snapshot(&args.output_dir, &args.title, &result.catalog, &result.calendar, days)?;
    }

    println!("\n=== Summary ===");
    let accuracy = result.accuracy();
    if let Some(pooled) = accuracy.pooled_accuracy() {
        println!(
            "Sample of {}/{} listings ({} accuracy)",
            accuracy.accepted(),
            accuracy.sampled(),
            percent(pooled)
        );
    }
    println!("Total listings in catalog: {}", result.catalog.len());
    let overflowed = result.baseline.overflowed().count()
        + result.availability.as_ref().map_or(0, |a| a.overflowed().count());
    if overflowed > 0 {
        println!("Queries over the page ceiling: {}", overflowed);
    }
    if result.cancelled() {
        println!("Scan was cancelled before it finished");
    }
    println!("Time Elapsed: {:.1?}", started.elapsed());

    Ok(())
}
