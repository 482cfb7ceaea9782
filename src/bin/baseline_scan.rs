use airanalytics::airbnb::{self, ListingCardExtractor, SearchClient};
use airanalytics::availability::AvailabilityCalendar;
use airanalytics::catalog::ListingCatalog;
use airanalytics::collector::CollectorPolicy;
use airanalytics::orchestrator::ScrapeOrchestrator;
use airanalytics::region::GeoRegion;
use airanalytics::tui::ScanTUI;
use airanalytics::{debug, export, report};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about = "AirAnalytics baseline scan")]
struct Args {
    #[clap(short, long, default_value = "Market")]
    title: String,

    #[clap(short, long)]
    location: String,

    /// Bounding box as ne_lat=..&ne_lng=..&sw_lat=..&sw_lng=..
    #[clap(short, long)]
    coords: String,

    #[clap(long, default_value = "Entire home/apt")]
    room_type: String,

    #[clap(short, long, default_value = "3")]
    split: usize,

    #[clap(short, long, default_value = ".")]
    output_dir: PathBuf,

    #[clap(long, default_value = "500")]
    delay_ms: u64,

    #[clap(long, default_value = "30")]
    timeout_secs: u64,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    debug::set_debug(args.debug);

    let base = airbnb::search_url(&args.location, &args.room_type);
    let area = GeoRegion::from_coordinates(base, &args.coords).context("Invalid --coords")?;
    let policy = CollectorPolicy {
        request_delay: Duration::from_millis(args.delay_ms),
        ..CollectorPolicy::default()
    };

    let client = SearchClient::new(Duration::from_secs(args.timeout_secs))?;
    let extractor = ListingCardExtractor::new()?;
    let orchestrator = ScrapeOrchestrator::new(&client, &extractor, policy);

    let cancel = orchestrator.cancel_flag();
    ctrlc::set_handler(move || cancel.cancel()).context("Failed to install Ctrl-C handler")?;

    let mut catalog = ListingCatalog::new();
    let mut tui = ScanTUI::new();
    let summary = orchestrator.baseline_pass(&area, args.split, &mut catalog, Some(&mut tui))?;

    print!("{}", report::price_histogram(&catalog, report::HISTOGRAM_BIN_WIDTH));

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    // no availability pass, so every vacancy column reads "--"
    export::save_baseline_csv(&args.output_dir, &args.title, &catalog, &AvailabilityCalendar::new(), 0)?;

    println!("Total listings in catalog: {}", catalog.len());
    println!("Regions overflowing the page ceiling: {}", summary.overflowed().count());

    Ok(())
}
