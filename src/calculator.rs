//! # Height Evaluation
//!
//! Sums the harmonic contribution of every constituent in a [`ConstituentSet`]
//! at an instant:
//!
//! ```text
//! h(t) = Σ Aᵢ · cos(ωᵢ · t + φᵢ)
//! ```
//!
//! where `Aᵢ` and `φᵢ` are the amplitude and phase (radians) of the complex
//! amplitude, `ωᵢ` is the constituent speed in radians per second, and `t` is
//! seconds since the Unix epoch. The phase is added, and is referenced to the
//! Unix epoch, so a constituent with zero phase peaks at 1970-01-01T00:00:00Z.
//!
//! The result is the mean-referenced height; see [`crate::datum`] to shift it
//! onto a chart datum.

use crate::complex::ComplexAmplitude;
use crate::constituents::TidalConstituent;
use crate::{Epoch, Sample};
use std::collections::btree_map::{self, BTreeMap};

/// Complex amplitudes for one location, keyed by constituent.
///
/// Constituents missing from the set contribute nothing. Iteration always
/// follows catalog order, which fixes the summation order of [`height`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConstituentSet {
    amplitudes: BTreeMap<TidalConstituent, ComplexAmplitude>,
}

impl ConstituentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a constituent, returning the previous amplitude.
    pub fn insert(
        &mut self,
        constituent: TidalConstituent,
        amplitude: ComplexAmplitude,
    ) -> Option<ComplexAmplitude> {
        self.amplitudes.insert(constituent, amplitude)
    }

    pub fn get(&self, constituent: TidalConstituent) -> Option<&ComplexAmplitude> {
        self.amplitudes.get(&constituent)
    }

    pub fn remove(&mut self, constituent: TidalConstituent) -> Option<ComplexAmplitude> {
        self.amplitudes.remove(&constituent)
    }

    pub fn len(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amplitudes.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, TidalConstituent, ComplexAmplitude> {
        self.amplitudes.iter()
    }

    /// The fastest constituent whose amplitude exceeds `negligible`.
    ///
    /// NaN amplitudes count as significant so bad data is still evaluated
    /// (and shows up as NaN) instead of being skipped.
    pub fn fastest_significant(&self, negligible: f64) -> Option<TidalConstituent> {
        self.iter()
            .filter(|(_, amp)| {
                let a = amp.amplitude();
                a > negligible || a.is_nan()
            })
            .map(|(c, _)| *c)
            .max_by(|a, b| a.speed().total_cmp(&b.speed()))
    }
}

impl FromIterator<(TidalConstituent, ComplexAmplitude)> for ConstituentSet {
    fn from_iter<I: IntoIterator<Item = (TidalConstituent, ComplexAmplitude)>>(iter: I) -> Self {
        Self {
            amplitudes: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConstituentSet {
    type Item = (&'a TidalConstituent, &'a ComplexAmplitude);
    type IntoIter = btree_map::Iter<'a, TidalConstituent, ComplexAmplitude>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Contribution of a single constituent at `t`.
#[inline]
pub fn contribution(constituent: TidalConstituent, amplitude: &ComplexAmplitude, t: Epoch) -> f64 {
    let omega = constituent.radians_per_second();
    amplitude.amplitude() * (omega * t.secs() + amplitude.phase_radians()).cos()
}

/// Mean-referenced water height at `t`.
///
/// Pure and deterministic: identical inputs give bit-identical output. An
/// empty set yields `0.0`; NaN amplitudes yield NaN.
///
/// # Example
/// ```
/// use tide_predictor::calculator::{height, ConstituentSet};
/// use tide_predictor::complex::ComplexAmplitude;
/// use tide_predictor::constituents::TidalConstituent;
/// use tide_predictor::Epoch;
///
/// let set: ConstituentSet = [(TidalConstituent::S2, ComplexAmplitude::new(0.5, 0.0))]
///     .into_iter()
///     .collect();
///
/// // S2 runs at exactly 30°/h, so after three hours it is a quarter turn on.
/// assert!(height(&set, Epoch::from_hours(3.0)).abs() < 1e-12);
/// ```
pub fn height(constituents: &ConstituentSet, t: Epoch) -> f64 {
    constituents
        .iter()
        .fold(0.0, |acc, (c, amp)| acc + contribution(*c, amp, t))
}

/// Evaluate [`height`] every `interval_secs` over `[start, start + length)`.
///
/// The end instant is excluded, so a day at 30 minute intervals gives 48 rows.
/// A non-positive interval, a negative length, or a non-finite value for
/// either yields an empty series.
pub fn sample_heights(
    constituents: &ConstituentSet,
    start: Epoch,
    length_secs: f64,
    interval_secs: f64,
) -> Vec<Sample> {
    let valid = interval_secs.is_finite()
        && interval_secs > 0.0
        && length_secs.is_finite()
        && length_secs >= 0.0;
    if !valid {
        return Vec::new();
    }
    let count = (length_secs / interval_secs).ceil() as usize;
    (0..count)
        .map(|i| {
            let time = start.offset_secs(i as f64 * interval_secs);
            Sample::new(time, height(constituents, time))
        })
        .collect()
}
