use std::path::PathBuf;

use clap::Parser;

/// Turns exported travel itineraries into trip segments and summaries.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Directory containing itinerary exports (*.txt)
    #[arg(long = "in", value_name = "DIR", env = "ITINERARY_IN")]
    pub in_dir: PathBuf,

    /// Output directory for trips.geojson and summary.json
    #[arg(long = "out", value_name = "DIR", env = "ITINERARY_OUT")]
    pub out_dir: PathBuf,

    /// OurAirports airports.csv
    #[arg(
        long,
        value_name = "FILE",
        env = "ITINERARY_AIRPORTS",
        default_value = "./data/airports.csv"
    )]
    pub airports: PathBuf,

    /// OpenFlights airports.dat, used to fill codes missing from airports.csv
    #[arg(
        long,
        value_name = "FILE",
        env = "ITINERARY_OPENFLIGHTS",
        default_value = "./data/openflights_airports.dat"
    )]
    pub openflights: PathBuf,

    /// Log every skipped record
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        }
    }

    pub fn geojson_path(&self) -> PathBuf {
        self.out_dir.join("trips.geojson")
    }

    pub fn summary_path(&self) -> PathBuf {
        self.out_dir.join("summary.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["itinerary", "--in", "raw", "--out", "site"]).unwrap();

        assert_eq!(config.in_dir, PathBuf::from("raw"));
        assert_eq!(config.airports, PathBuf::from("./data/airports.csv"));
        assert_eq!(config.summary_path(), PathBuf::from("site/summary.json"));
        assert_eq!(config.log_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_verbose_and_overrides() {
        let config = Config::try_parse_from([
            "itinerary",
            "--in",
            "raw",
            "--out",
            "site",
            "--openflights",
            "/tmp/of.dat",
            "-v",
        ])
        .unwrap();

        assert_eq!(config.openflights, PathBuf::from("/tmp/of.dat"));
        assert_eq!(config.log_level(), log::LevelFilter::Debug);
        assert_eq!(config.geojson_path(), PathBuf::from("site/trips.geojson"));
    }
}
