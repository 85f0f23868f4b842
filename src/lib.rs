//! # Harmonic Tide Predictor Core Library
//!
//! This library predicts water height and high/low tides at a location from a
//! set of harmonic tidal constituents. Once the constituents for a location
//! have been fetched, any number of heights and tide tables can be computed
//! offline without another network round trip.
//!
//! ## Architecture
//!
//! The numeric engine is pure and synchronous:
//! - [`constituents`]: the closed catalog of constituents and their angular speeds
//! - [`complex`]: a constituent's complex amplitude (amplitude + phase)
//! - [`calculator`]: the [`calculator::ConstituentSet`] and the height function
//! - [`extremes`]: coarse-then-refine search for highs and lows
//! - [`datum`]: datum correction and the [`datum::TidePredictor`] session type
//!
//! Around it sit the collaborators that feed it and present its output:
//! - [`worldtides`]: WorldTides API client, response cache and typed response
//! - [`config`]: `tide-config.toml` loading
//! - [`renderer`]: console report
//!
//! ## Time
//!
//! All engine arithmetic uses [`Epoch`], seconds since 1970-01-01T00:00:00Z.
//! Constituent phases are referenced to that same instant.
//!
//! ## Example
//! ```
//! use tide_predictor::calculator::{height, ConstituentSet};
//! use tide_predictor::complex::ComplexAmplitude;
//! use tide_predictor::constituents::TidalConstituent;
//! use tide_predictor::Epoch;
//!
//! let mut set = ConstituentSet::new();
//! set.insert(TidalConstituent::M2, ComplexAmplitude::new(1.0, 0.0));
//!
//! assert_eq!(height(&set, Epoch::ZERO), 1.0);
//! ```

use chrono::{DateTime, Utc};
use datum::DatumOffset;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod calculator;
pub mod complex;
pub mod config;
pub mod constituents;
pub mod datum;
pub mod extremes;
pub mod renderer;
pub mod worldtides;

/// An instant, as seconds since the Unix epoch.
///
/// Fractional seconds are kept so refined extreme times are not rounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(pub f64);

impl Epoch {
    /// 1970-01-01T00:00:00Z, the phase reference of every constituent.
    pub const ZERO: Epoch = Epoch(0.0);

    pub const fn from_secs(secs: f64) -> Self {
        Epoch(secs)
    }

    pub fn from_hours(hours: f64) -> Self {
        Epoch(hours * 3600.0)
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Epoch(dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9)
    }

    /// Convert to a calendar time, rounded to the nearest millisecond.
    ///
    /// Returns `None` for non-finite or out-of-range instants.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if !self.0.is_finite() {
            return None;
        }
        DateTime::from_timestamp_millis((self.0 * 1000.0).round() as i64)
    }

    pub const fn secs(self) -> f64 {
        self.0
    }

    pub fn offset_secs(self, secs: f64) -> Self {
        Epoch(self.0 + secs)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            None => write!(f, "{}s", self.0),
        }
    }
}

/// One evaluated point of a height curve.
///
/// `height` is what the constituents produced and is never rewritten; datum
/// corrections accumulate in `datum_offset`. [`Sample::level`] is the height
/// against the current datum.
///
/// # Example
/// ```
/// use tide_predictor::datum::{ApplyDatum, DatumOffset};
/// use tide_predictor::{Epoch, Sample};
///
/// let sample = Sample::new(Epoch::from_hours(1.0), 0.42);
/// assert_eq!(sample.time.secs(), 3600.0);
/// assert_eq!(sample.apply_datum(DatumOffset(1.0)).level(), 1.42);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: Epoch,
    /// Height in the unit of the constituent data (metres for WorldTides)
    pub height: f64,
    /// Sum of the datum offsets applied so far
    #[serde(default)]
    pub datum_offset: DatumOffset,
}

impl Sample {
    pub fn new(time: Epoch, height: f64) -> Self {
        Self {
            time,
            height,
            datum_offset: DatumOffset::default(),
        }
    }

    /// Height against the datum this sample has been shifted to.
    pub fn level(&self) -> f64 {
        self.height + self.datum_offset.0
    }
}

/// A local maximum (high tide) or minimum (low tide) of the height curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TideExtreme {
    pub time: Epoch,
    pub height: f64,
    pub is_high: bool,
    #[serde(default)]
    pub datum_offset: DatumOffset,
}

impl TideExtreme {
    pub fn new(time: Epoch, height: f64, is_high: bool) -> Self {
        Self {
            time,
            height,
            is_high,
            datum_offset: DatumOffset::default(),
        }
    }

    /// Height against the datum this extreme has been shifted to.
    pub fn level(&self) -> f64 {
        self.height + self.datum_offset.0
    }

    pub fn kind(&self) -> &'static str {
        if self.is_high {
            "High"
        } else {
            "Low"
        }
    }
}

impl fmt::Display for TideExtreme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:+.2} {}", self.time, self.level(), self.kind())
    }
}
