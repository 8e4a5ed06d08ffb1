use anyhow::{Context, Result};
use clap::Parser;
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use itinerary::{config::Config, geojson::FeatureCollection, AirportIndex, Resolver, Summary};

fn main() -> Result<()> {
    let config = Config::parse();

    TermLogger::init(
        config.log_level(),
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logging")?;

    log::info!("Loading airport datasets");
    let airports = AirportIndex::load(&config.airports, Some(config.openflights.as_path()))
        .with_context(|| format!("Failed to build airport index from {:?}", config.airports))?;
    log::info!(
        "Airport index holds {} codes ({} dataset rows skipped)",
        airports.len(),
        airports.skips.len()
    );

    let resolution = Resolver::new(&airports)
        .resolve_dir(&config.in_dir)
        .with_context(|| format!("Failed to read itineraries from {:?}", config.in_dir))?;
    for (kind, count) in resolution.skips.counts() {
        log::info!("Skipped {} records: {}", count, kind);
    }

    std::fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", config.out_dir))?;

    let geojson_path = config.geojson_path();
    FeatureCollection::from_segments(&resolution.segments)
        .write(&geojson_path)
        .context("Failed to write GeoJSON")?;
    println!("Wrote: {}", geojson_path.display());

    let summary_path = config.summary_path();
    Summary::from(&resolution)
        .write(&summary_path)
        .context("Failed to write summary")?;
    println!("Wrote: {}", summary_path.display());

    Ok(())
}
