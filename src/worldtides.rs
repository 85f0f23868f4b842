//! # WorldTides Constituent Fetching and Caching
//!
//! This module obtains the harmonic constituents for a location from the
//! WorldTides API and turns the response into the engine's types. Everything
//! here is I/O or parsing; the engine itself never touches the network.
//!
//! ## Data Source
//!
//! - **URL**: `https://www.worldtides.info/api?constituents&datums&datum=LAT&lat=..&lon=..&key=..`
//! - **Location**: the closest sea point to the requested coordinates
//! - **Format**: JSON, with one `{name, real, imaginary}` entry per constituent
//!   and one `{name, height}` entry per datum
//!
//! ## Caching Strategy
//!
//! Constituents change only with the nodal cycle, so a response stays useful
//! for a long time. The raw response is cached to disk:
//! - **TTL**: checked against the cache file's modification time
//! - **Validation**: a cache for different coordinates or datum is ignored
//! - **Corruption**: an unreadable cache falls back to a fresh network fetch
//!
//! ## Error Handling
//!
//! All failures surface through [`FetchError`]. A non-200 HTTP status keeps
//! the response body for diagnostics; a 200 response whose own `status` field
//! reports a failure becomes [`FetchError::Api`].

use crate::calculator::ConstituentSet;
use crate::complex::ComplexAmplitude;
use crate::config::ApiConfig;
use crate::constituents::{CatalogError, TidalConstituent};
use crate::datum::{Datum, DatumOffset};
use crate::{Epoch, Sample, TideExtreme};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{fs, io, time::SystemTime};
use thiserror::Error;
use tracing::{debug, warn};

/// Datum code of mean sea level, the reference of constituent heights.
const MEAN_SEA_LEVEL: &str = "MSL";

/// Errors that can occur while fetching and interpreting WorldTides data.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, TLS, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status code
    #[error("server returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// Response decoded but reports an API-level failure
    #[error("API error: {0}")]
    Api(String),

    /// Response body is not the expected JSON document
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache file operations failed
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),

    /// Response names a constituent the catalog does not know
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// What to do with constituents the catalog does not know.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnknownConstituentPolicy {
    /// Leave them out and log a warning
    Skip,
    /// Fail with [`CatalogError::UnknownConstituent`]
    Reject,
}

/// One constituent as published by the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConstituentEntry {
    pub name: String,
    pub real: f64,
    pub imaginary: f64,
}

/// Height of a named datum relative to the response datum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatumEntry {
    pub name: String,
    pub height: f64,
}

/// A server-side height prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightEntry {
    /// Unix timestamp in seconds
    pub dt: i64,
    pub height: f64,
}

/// A server-side high/low prediction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtremeEntry {
    /// Unix timestamp in seconds
    pub dt: i64,
    pub height: f64,
    /// "High" or "Low"
    #[serde(rename = "type")]
    pub kind: String,
}

/// Typed view of a WorldTides response.
///
/// Only `status` is mandatory; every section the request did not ask for is
/// simply absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atlas: Option<String>,
    /// Datum the returned heights and datum entries are relative to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_datum: Option<String>,
    /// Datum the caller asked for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datums: Vec<DatumEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constituents: Vec<ConstituentEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub heights: Vec<HeightEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extremes: Vec<ExtremeEntry>,
}

impl ApiResponse {
    /// Parse a response body, rejecting API-level failures.
    pub fn from_json(body: &str) -> Result<Self, FetchError> {
        let response: ApiResponse = serde_json::from_str(body)?;
        if response.status != 200 {
            let message = response
                .error
                .clone()
                .unwrap_or_else(|| format!("status {}", response.status));
            return Err(FetchError::Api(message));
        }
        Ok(response)
    }

    /// Build the engine's constituent set from the published entries.
    pub fn constituent_set(
        &self,
        policy: UnknownConstituentPolicy,
    ) -> Result<ConstituentSet, CatalogError> {
        let mut set = ConstituentSet::new();
        for entry in &self.constituents {
            match TidalConstituent::lookup(&entry.name) {
                Ok(constituent) => {
                    let amplitude = ComplexAmplitude::new(entry.real, entry.imaginary);
                    if set.insert(constituent, amplitude).is_some() {
                        warn!("Duplicate constituent {} in response; keeping the last", constituent);
                    }
                }
                Err(err) => match policy {
                    UnknownConstituentPolicy::Skip => {
                        warn!("Skipping constituent {}: not in catalog", entry.name);
                    }
                    UnknownConstituentPolicy::Reject => return Err(err),
                },
            }
        }
        Ok(set)
    }

    /// Datum correction for the requested datum, if the response carries one.
    ///
    /// Datum entries give the height of each datum relative to `responseDatum`,
    /// which is usually the requested datum itself. Heights computed from the
    /// constituents are relative to mean sea level, so the correction is the
    /// height of MSL above the requested datum: `height(MSL) - height(code)`.
    /// A datum one metre below MSL adds one metre to every height.
    ///
    /// `None` when the requested datum is not listed, or when MSL is neither
    /// listed nor the response datum.
    pub fn datum(&self, code: &str) -> Option<Datum> {
        let entry = self.datum_entry(code)?;
        let served_in_msl = self
            .response_datum
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case(MEAN_SEA_LEVEL));
        let msl = match self.datum_entry(MEAN_SEA_LEVEL) {
            Some(msl) => msl.height,
            None if served_in_msl => 0.0,
            None => {
                warn!(
                    "No {} entry relative to {:?}; cannot place datum {}",
                    MEAN_SEA_LEVEL, self.response_datum, entry.name
                );
                return None;
            }
        };
        Some(Datum::new(
            entry.name.clone(),
            DatumOffset(msl - entry.height),
        ))
    }

    fn datum_entry(&self, code: &str) -> Option<&DatumEntry> {
        self.datums.iter().find(|d| d.name.eq_ignore_ascii_case(code))
    }

    /// Server-side heights, when the request included them.
    pub fn server_heights(&self) -> Vec<Sample> {
        self.heights
            .iter()
            .map(|h| Sample::new(Epoch(h.dt as f64), h.height))
            .collect()
    }

    /// Server-side extremes, when the request included them.
    pub fn server_extremes(&self) -> Vec<TideExtreme> {
        self.extremes
            .iter()
            .map(|e| {
                TideExtreme::new(
                    Epoch(e.dt as f64),
                    e.height,
                    e.kind.eq_ignore_ascii_case("high"),
                )
            })
            .collect()
    }

    /// True when this response was produced for the given request.
    fn matches(&self, lat: f64, lon: f64, datum: &str) -> bool {
        let close = |a: Option<f64>, b: f64| a.is_some_and(|a| (a - b).abs() < 1e-6);
        close(self.request_lat, lat)
            && close(self.request_lon, lon)
            && self
                .datum
                .as_deref()
                .map_or(true, |d| d.eq_ignore_ascii_case(datum))
    }
}

/// Build the request URL for a location.
pub fn request_url(api: &ApiConfig, lat: f64, lon: f64) -> String {
    format!(
        "{}?constituents&datums&datum={}&lat={}&lon={}&key={}",
        api.base_url, api.datum, lat, lon, api.key
    )
}

/// Fetch constituents for a location from cache or the WorldTides API.
///
/// Cache first: a fresh cache for the same coordinates and datum is returned
/// without touching the network. Otherwise the API is queried and the
/// response cached; failing to write the cache is not an error.
///
/// # Example
/// ```no_run
/// use tide_predictor::config::Config;
/// use tide_predictor::worldtides::{fetch, UnknownConstituentPolicy};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::load();
/// let response = fetch(&config.api, 52.37, 4.89).await?;
/// let set = response.constituent_set(UnknownConstituentPolicy::Skip)?;
/// println!("{} constituents", set.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch(api: &ApiConfig, lat: f64, lon: f64) -> Result<ApiResponse, FetchError> {
    let ttl_secs = api.cache_ttl_minutes.saturating_mul(60);
    match load_cache(&api.cache_path, ttl_secs) {
        Ok(response) if response.matches(lat, lon, &api.datum) => {
            debug!("Using cached constituents from {}", api.cache_path);
            return Ok(response);
        }
        Ok(_) => debug!("Cache is for a different request; refetching"),
        Err(e) => debug!("No usable cache: {}", e),
    }

    let body = download(&request_url(api, lat, lon)).await?;
    let response = ApiResponse::from_json(&body)?;

    if let Err(e) = save_cache(&api.cache_path, &response) {
        warn!("Could not write cache {}: {}", api.cache_path, e);
    }

    Ok(response)
}

// -- Private Implementation --

async fn download(url: &str) -> Result<String, FetchError> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(FetchError::Status {
            code: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Load a cached response if the file is younger than `ttl_secs`.
fn load_cache<P: AsRef<Path>>(path: P, ttl_secs: u64) -> Result<ApiResponse, io::Error> {
    let meta = fs::metadata(&path)?;

    let age = SystemTime::now()
        .duration_since(meta.modified()?)
        .map_err(|_| io::Error::other("time error"))?
        .as_secs();

    if age > ttl_secs {
        return Err(io::Error::other("stale"));
    }

    let data = fs::read(&path)?;
    let response = serde_json::from_slice(&data)?;

    Ok(response)
}

fn save_cache<P: AsRef<Path>>(path: P, response: &ApiResponse) -> Result<(), io::Error> {
    let data = serde_json::to_vec(response)?;
    fs::write(path, data)?;
    Ok(())
}
