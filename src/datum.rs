//! # Datum Correction
//!
//! Heights from [`crate::calculator::height`] are relative to mean sea level.
//! Tide tables are usually quoted against a chart datum instead (for example
//! Lowest Astronomical Tide), which sits a fixed distance below it. This
//! module shifts heights and extremes by that distance.
//!
//! The offset is metadata supplied by the data provider; nothing here derives
//! it from the constituents.
//!
//! [`TidePredictor`] bundles a constituent set with an optional [`Datum`] so
//! callers can ask for mean-referenced or datum-referenced output from one
//! place.

use crate::calculator::{self, ConstituentSet};
use crate::extremes::{self, SearchConfig, SearchError};
use crate::{Epoch, Sample, TideExtreme};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg};

/// Vertical shift from mean-referenced heights to a chart datum, added to
/// every height.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatumOffset(pub f64);

impl Neg for DatumOffset {
    type Output = DatumOffset;

    fn neg(self) -> Self::Output {
        DatumOffset(-self.0)
    }
}

impl Add for DatumOffset {
    type Output = DatumOffset;

    fn add(self, rhs: DatumOffset) -> Self::Output {
        DatumOffset(self.0 + rhs.0)
    }
}

/// Values carrying a height that can be re-referenced to a datum.
///
/// Offsets accumulate next to the computed height instead of being folded into
/// it, so a correction never rounds the computed height. Values come out of
/// the engine with a zero offset, and `0 + d + (-d)` is exactly zero, so
/// shifting such a value by `+d` and then by `-d` restores it bit for bit.
pub trait ApplyDatum: Sized {
    /// Return a copy with every height shifted by `+offset`.
    fn apply_datum(self, offset: DatumOffset) -> Self;
}

impl ApplyDatum for Sample {
    fn apply_datum(self, offset: DatumOffset) -> Self {
        Sample {
            datum_offset: self.datum_offset + offset,
            ..self
        }
    }
}

impl ApplyDatum for TideExtreme {
    fn apply_datum(self, offset: DatumOffset) -> Self {
        TideExtreme {
            datum_offset: self.datum_offset + offset,
            ..self
        }
    }
}

impl<T: ApplyDatum> ApplyDatum for Vec<T> {
    fn apply_datum(self, offset: DatumOffset) -> Self {
        self.into_iter().map(|v| v.apply_datum(offset)).collect()
    }
}

/// A vertical datum for datum-referenced output.
#[derive(Clone, Debug, PartialEq)]
pub struct Datum {
    /// Short datum code, e.g. `"LAT"` or `"MLLW"`
    pub code: String,
    pub offset: DatumOffset,
    /// Constituents to evaluate instead of the mean-referenced set, when the
    /// provider publishes a separate set for this datum
    pub constituents: Option<ConstituentSet>,
}

impl Datum {
    pub fn new(code: impl Into<String>, offset: DatumOffset) -> Self {
        Self {
            code: code.into(),
            offset,
            constituents: None,
        }
    }

    pub fn with_constituents(mut self, constituents: ConstituentSet) -> Self {
        self.constituents = Some(constituents);
        self
    }
}

/// Which vertical reference a prediction is reported against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference {
    MeanSeaLevel,
    /// The predictor's datum; same as `MeanSeaLevel` when none is set
    Datum,
}

/// A prediction session over one location's constituents.
///
/// Read-only once built, so one predictor can serve any number of threads.
#[derive(Clone, Debug, Default)]
pub struct TidePredictor {
    constituents: ConstituentSet,
    datum: Option<Datum>,
    search: SearchConfig,
}

impl TidePredictor {
    pub fn new(constituents: ConstituentSet) -> Self {
        Self {
            constituents,
            datum: None,
            search: SearchConfig::default(),
        }
    }

    pub fn with_datum(mut self, datum: Datum) -> Self {
        self.datum = Some(datum);
        self
    }

    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    pub fn constituents(&self) -> &ConstituentSet {
        &self.constituents
    }

    pub fn datum(&self) -> Option<&Datum> {
        self.datum.as_ref()
    }

    /// Constituent set and offset that produce output for `reference`.
    fn resolve(&self, reference: Reference) -> (&ConstituentSet, Option<DatumOffset>) {
        match (reference, &self.datum) {
            (Reference::Datum, Some(datum)) => (
                datum.constituents.as_ref().unwrap_or(&self.constituents),
                Some(datum.offset),
            ),
            _ => (&self.constituents, None),
        }
    }

    pub fn height(&self, t: Epoch, reference: Reference) -> f64 {
        let (set, offset) = self.resolve(reference);
        let h = calculator::height(set, t);
        match offset {
            Some(offset) => h + offset.0,
            None => h,
        }
    }

    /// Heights every `interval` from `start` up to, not including, the window end.
    pub fn heights(
        &self,
        start: Epoch,
        length: chrono::Duration,
        interval: chrono::Duration,
        reference: Reference,
    ) -> Vec<Sample> {
        let (set, offset) = self.resolve(reference);
        let samples = calculator::sample_heights(
            set,
            start,
            duration_secs(length),
            duration_secs(interval),
        );
        match offset {
            Some(offset) => samples.apply_datum(offset),
            None => samples,
        }
    }

    pub fn extremes(
        &self,
        start: Epoch,
        length: chrono::Duration,
        reference: Reference,
    ) -> Result<Vec<TideExtreme>, SearchError> {
        let (set, offset) = self.resolve(reference);
        let found = extremes::find_extremes_with(set, start, duration_secs(length), &self.search)?;
        Ok(match offset {
            Some(offset) => found.apply_datum(offset),
            None => found,
        })
    }
}

fn duration_secs(d: chrono::Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::ComplexAmplitude;
    use crate::constituents::TidalConstituent;
    use approx::assert_abs_diff_eq;
    use chrono::Duration;

    fn m2_set(amplitude: f64) -> ConstituentSet {
        [(TidalConstituent::M2, ComplexAmplitude::new(amplitude, 0.0))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_apply_datum_is_additive() {
        let sample = Sample::new(Epoch::ZERO, 1.25).apply_datum(DatumOffset(0.5));
        assert_eq!(sample.level(), 1.75);
        assert_eq!(sample.height, 1.25);

        let extreme = TideExtreme::new(Epoch::ZERO, -0.75, false)
            .apply_datum(DatumOffset(-1.0))
            .apply_datum(DatumOffset(-0.5));
        assert_eq!(extreme.level(), -2.25);
        assert_eq!(extreme.datum_offset, DatumOffset(-1.5));
    }

    #[test]
    fn test_apply_datum_is_invertible() {
        // 0.1 + 0.2 - 0.2 != 0.1 in f64; the round trip must still be exact.
        for d in [DatumOffset(0.2), DatumOffset(0.7), DatumOffset(-1.3), DatumOffset(1e-17)] {
            for x in [0.1_f64, -0.3, 1.37, 2.0 / 3.0, 0.0] {
                let sample = Sample::new(Epoch::from_hours(x), x);
                assert_eq!(sample.apply_datum(d).apply_datum(-d), sample);

                let extreme = TideExtreme::new(Epoch::from_hours(6.0), x, x > 0.0);
                assert_eq!(extreme.apply_datum(d).apply_datum(-d), extreme);
            }
        }

        let series = vec![Sample::new(Epoch::ZERO, 0.1), Sample::new(Epoch::from_hours(0.5), 0.3)];
        let d = DatumOffset(0.2);
        assert_eq!(series.clone().apply_datum(d).apply_datum(-d), series);
    }

    #[test]
    fn test_apply_datum_keeps_time_and_kind() {
        let extreme = TideExtreme::new(Epoch::from_hours(1.0), 1.0, true);
        let shifted = extreme.apply_datum(DatumOffset(2.0));
        assert_eq!(shifted.time, extreme.time);
        assert!(shifted.is_high);
        assert_eq!(shifted.level(), 3.0);
    }

    #[test]
    fn test_predictor_without_datum_ignores_reference() {
        let predictor = TidePredictor::new(m2_set(1.0));
        assert_eq!(predictor.height(Epoch::ZERO, Reference::MeanSeaLevel), 1.0);
        assert_eq!(predictor.height(Epoch::ZERO, Reference::Datum), 1.0);
    }

    #[test]
    fn test_predictor_shifts_heights_and_extremes() {
        let predictor = TidePredictor::new(m2_set(1.0)).with_datum(Datum::new("LAT", DatumOffset(1.5)));

        assert_eq!(predictor.height(Epoch::ZERO, Reference::Datum), 2.5);

        let msl = predictor
            .extremes(Epoch::ZERO, Duration::hours(24), Reference::MeanSeaLevel)
            .unwrap();
        let lat = predictor
            .extremes(Epoch::ZERO, Duration::hours(24), Reference::Datum)
            .unwrap();
        assert_eq!(msl.len(), lat.len());
        for (m, l) in msl.iter().zip(&lat) {
            assert_eq!(m.time, l.time);
            assert_eq!(m.is_high, l.is_high);
            assert_abs_diff_eq!(l.level() - m.level(), 1.5, epsilon = 1e-12);
        }

        let heights = predictor.heights(
            Epoch::ZERO,
            Duration::hours(24),
            Duration::minutes(30),
            Reference::Datum,
        );
        assert_eq!(heights.len(), 48);
        assert_eq!(heights[0].level(), 2.5);
    }

    #[test]
    fn test_datum_can_swap_constituents() {
        let datum = Datum::new("LAT", DatumOffset(0.0)).with_constituents(m2_set(2.0));
        let predictor = TidePredictor::new(m2_set(1.0)).with_datum(datum);

        assert_eq!(predictor.height(Epoch::ZERO, Reference::MeanSeaLevel), 1.0);
        assert_eq!(predictor.height(Epoch::ZERO, Reference::Datum), 2.0);
    }

    #[test]
    fn test_predictor_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TidePredictor>();
        assert_send_sync::<ConstituentSet>();
    }
}
