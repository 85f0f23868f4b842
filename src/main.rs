//! # Tide Predictor Application Entry Point
//!
//! Retrieves tidal constituents for a location from www.worldtides.info and
//! uses them to compute high and low tides and water heights for the coming
//! window (24 hours by default).
//!
//! ```text
//! tide-predictor [--config <PATH>] [--chart] [<APIKEY> <LATITUDE> <LONGITUDE>]
//! ```
//!
//! Without positional arguments the API key and location come from
//! `tide-config.toml`. The report goes to stdout; logs go to stderr and are
//! filtered with `RUST_LOG` (default `warn`).

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{bail, Context};
use chrono::Duration;
use std::env;
use tide_predictor::config::Config;
use tide_predictor::datum::{Reference, TidePredictor};
use tide_predictor::renderer::{draw_ascii, render_report, Report};
use tide_predictor::worldtides::{self, UnknownConstituentPolicy};
use tide_predictor::Epoch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command line options.
#[derive(Debug, Default, PartialEq)]
pub struct Args {
    /// Alternative config file
    pub config_path: Option<String>,
    /// Append an ASCII chart of the heights
    pub chart: bool,
    /// API key and location overriding the config file
    pub request: Option<(String, f64, f64)>,
}

/// Parse command line arguments (program name excluded).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Args> {
    let mut parsed = Args::default();
    let mut positional = Vec::new();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--chart" => parsed.chart = true,
            "--config" => {
                let path = iter.next().context("--config needs a path")?;
                parsed.config_path = Some(path);
            }
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            _ => positional.push(arg),
        }
    }

    match positional.as_slice() {
        [] => {}
        [key, lat, lon] => {
            let lat: f64 = lat.parse().with_context(|| format!("invalid latitude {}", lat))?;
            let lon: f64 = lon.parse().with_context(|| format!("invalid longitude {}", lon))?;
            parsed.request = Some((key.clone(), lat, lon));
        }
        _ => bail!("expected <APIKEY> <LATITUDE> <LONGITUDE>"),
    }

    Ok(parsed)
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(env::args().skip(1))?;

    let mut config = match &args.config_path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    if let Some((key, lat, lon)) = &args.request {
        config.api.key = key.clone();
        config.location.latitude = *lat;
        config.location.longitude = *lon;
    }
    if config.api.key.is_empty() {
        bail!("no API key: pass <APIKEY> <LATITUDE> <LONGITUDE> or set [api] key in tide-config.toml");
    }

    let (lat, lon) = (config.location.latitude, config.location.longitude);
    info!("Predicting tides near {} {}", lat, lon);

    // Create Tokio runtime for the one async operation: the constituent fetch
    let rt = tokio::runtime::Runtime::new()?;
    let response = rt
        .block_on(worldtides::fetch(&config.api, lat, lon))
        .context("failed to retrieve tidal constituents")?;

    let policy = if config.api.skip_unknown_constituents {
        UnknownConstituentPolicy::Skip
    } else {
        UnknownConstituentPolicy::Reject
    };
    let constituents = response
        .constituent_set(policy)
        .context("constituent data does not match the catalog")?;
    info!("Loaded {} constituents", constituents.len());

    let mut predictor =
        TidePredictor::new(constituents).with_search(config.search.to_search_config());
    match response.datum(&config.api.datum) {
        Some(datum) => predictor = predictor.with_datum(datum),
        None => warn!(
            "Datum {} not in response; heights are relative to mean sea level",
            config.api.datum
        ),
    }

    let start = Epoch::now();
    let window = Duration::hours(config.prediction.window_hours);
    let interval = Duration::minutes(config.prediction.height_interval_minutes);

    let extremes = predictor
        .extremes(start, window, Reference::Datum)
        .context("constituent data produced unusable heights")?;
    let heights = predictor.heights(start, window, interval, Reference::Datum);

    let report = Report {
        copyright: response.copyright.clone(),
        location: response.response_lat.zip(response.response_lon),
        datum: Some(
            predictor
                .datum()
                .map_or_else(|| "MSL".to_string(), |d| d.code.clone()),
        ),
        extremes,
        heights,
    };

    print!("{}", render_report(&report));
    if args.chart {
        println!();
        print!("{}", draw_ascii(&report.heights, &report.extremes));
    }

    Ok(())
}
