//! # High and Low Tide Search
//!
//! Locates the local maxima and minima of the height curve within a time
//! window. A sum of cosines at unrelated frequencies has no closed-form
//! derivative root, so the search runs in two phases.
//!
//! ## 1. Coarse Scan
//! The curve is sampled on a regular grid whose step is at most one eighth of
//! the period of the fastest significant constituent (and never more than
//! [`SearchConfig::max_step_secs`]). A two-step bracket is then narrower than a
//! quarter period, so each bracket holds exactly one unimodal extremum.
//!
//! One guard sample is taken on each side of the window so an extremum sitting
//! exactly on a window sample still gets a slope on both sides. Brackets are
//! refined first and only then checked against the window: an extremum whose
//! refined time falls outside `[start, start + length]` is dropped, never moved
//! onto the edge. Window edges are therefore never reported just because the
//! curve happens to be rising or falling there.
//!
//! ## 2. Refinement
//! Each bracket is narrowed by ternary search: evaluate two points at the
//! thirds, drop the outer third that cannot hold the extremum, repeat until the
//! bracket is no wider than [`SearchConfig::tolerance_secs`] or
//! [`SearchConfig::max_iterations`] is reached. The reported time is the final
//! bracket midpoint. Hitting the iteration cap is best effort, not an error.
//!
//! ## Tie Policy
//! Two consecutive samples with exactly equal heights form a flat step. A flat
//! step never counts as a change of slope sign: the scan compares the last
//! rising/falling step with the next one, skipping flat steps in between. A
//! plateau between a rise and a fall therefore yields one extreme, and a curve
//! that is flat everywhere yields none.
//!
//! ## Malformed Data
//! A NaN or infinite height anywhere in the scan aborts the search with
//! [`SearchError::NonFiniteHeight`], so bad constituent data cannot be mistaken
//! for a flat tide.

use crate::calculator::{height, ConstituentSet};
use crate::{Epoch, TideExtreme};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SearchError {
    #[error("non-finite tide height {height} at {time}")]
    NonFiniteHeight { time: Epoch, height: f64 },
}

/// Tuning for the coarse scan and the refinement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Upper bound for the coarse sampling step, in seconds
    pub max_step_secs: f64,
    /// Refinement stops once the bracket is no wider than this, in seconds
    pub tolerance_secs: f64,
    /// Refinement stops after this many narrowing rounds regardless of width
    pub max_iterations: u32,
    /// Constituents at or below this amplitude do not shorten the sampling step
    pub negligible_amplitude: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_step_secs: 600.0,
            tolerance_secs: 60.0,
            max_iterations: 64,
            negligible_amplitude: 1e-9,
        }
    }
}

/// Outcome of narrowing one bracket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Refinement {
    /// Midpoint of the final bracket
    pub time: Epoch,
    /// Narrowing rounds performed
    pub iterations: u32,
    /// False when the iteration cap was hit before the tolerance was met
    pub converged: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slope {
    Rising,
    Falling,
}

impl Slope {
    /// `None` for a flat step (or NaN heights).
    fn between(from: f64, to: f64) -> Option<Slope> {
        let delta = to - from;
        if delta > 0.0 {
            Some(Slope::Rising)
        } else if delta < 0.0 {
            Some(Slope::Falling)
        } else {
            None
        }
    }
}

/// Sample indices enclosing one extremum of a sampled curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bracket {
    /// Start of the last step before the slope changed sign
    pub lo: usize,
    /// End of the first step after the slope changed sign
    pub hi: usize,
    /// First sample after the last step of the old slope
    pub pivot: usize,
    pub is_high: bool,
}

/// Find every slope sign change in a sampled curve.
///
/// Flat steps are skipped (see the module-level tie policy), so brackets are
/// `[i-1, i+1]` in the common case and wider across plateaus.
pub fn find_brackets(heights: &[f64]) -> Vec<Bracket> {
    let mut brackets = Vec::new();
    let mut last: Option<(usize, Slope)> = None;

    for (i, pair) in heights.windows(2).enumerate() {
        let Some(slope) = Slope::between(pair[0], pair[1]) else {
            continue;
        };
        if let Some((j, prev)) = last {
            if prev != slope {
                brackets.push(Bracket {
                    lo: j,
                    hi: i + 1,
                    pivot: j + 1,
                    is_high: prev == Slope::Rising,
                });
            }
        }
        last = Some((i, slope));
    }

    brackets
}

/// Coarse sampling step for a constituent set, in seconds.
///
/// `None` when no constituent has a significant amplitude (the curve is flat)
/// or when the configured maximum step is not positive.
pub fn sampling_step(constituents: &ConstituentSet, config: &SearchConfig) -> Option<f64> {
    let fastest = constituents.fastest_significant(config.negligible_amplitude)?;
    let eighth_period = fastest.period_hours() * 3600.0 / 8.0;
    let step = config.max_step_secs.min(eighth_period);
    (step > 0.0).then_some(step)
}

/// Narrow `[lo, hi]` around the single maximum (or minimum) it holds.
pub fn refine(
    constituents: &ConstituentSet,
    lo: Epoch,
    hi: Epoch,
    is_high: bool,
    config: &SearchConfig,
) -> Refinement {
    let sign = if is_high { 1.0 } else { -1.0 };
    let (mut a, mut b) = (lo.secs(), hi.secs());
    let mut iterations = 0;

    while b - a > config.tolerance_secs && iterations < config.max_iterations {
        let third = (b - a) / 3.0;
        let m1 = a + third;
        let m2 = b - third;
        let h1 = sign * height(constituents, Epoch(m1));
        let h2 = sign * height(constituents, Epoch(m2));
        // Equal values keep the lower part, so ties resolve the same way every time.
        if h1 < h2 {
            a = m1;
        } else {
            b = m2;
        }
        iterations += 1;
    }

    let converged = b - a <= config.tolerance_secs;
    if !converged {
        debug!(
            "Refinement stopped after {} iterations with bracket {:.1}s wide",
            iterations,
            b - a
        );
    }

    Refinement {
        time: Epoch((a + b) / 2.0),
        iterations,
        converged,
    }
}

/// High and low tides in `[window_start, window_start + window_length]` using
/// the default [`SearchConfig`].
///
/// # Example
/// ```
/// use tide_predictor::calculator::ConstituentSet;
/// use tide_predictor::complex::ComplexAmplitude;
/// use tide_predictor::constituents::TidalConstituent;
/// use tide_predictor::extremes::find_extremes;
/// use tide_predictor::Epoch;
///
/// let set: ConstituentSet = [(TidalConstituent::M2, ComplexAmplitude::new(1.0, 0.0))]
///     .into_iter()
///     .collect();
///
/// let extremes = find_extremes(&set, Epoch::ZERO, chrono::Duration::hours(24))?;
/// assert_eq!(extremes.len(), 4);
/// assert!(extremes[0].is_high);
/// # Ok::<(), tide_predictor::extremes::SearchError>(())
/// ```
pub fn find_extremes(
    constituents: &ConstituentSet,
    window_start: Epoch,
    window_length: chrono::Duration,
) -> Result<Vec<TideExtreme>, SearchError> {
    let length_secs = window_length.num_milliseconds() as f64 / 1000.0;
    find_extremes_with(
        constituents,
        window_start,
        length_secs,
        &SearchConfig::default(),
    )
}

/// High and low tides in `[window_start, window_start + length_secs]`, in
/// ascending time order.
///
/// A window shorter than one sampling step, a non-finite window length, or a
/// set with no significant constituent yields an empty sequence. An extremum
/// within half the refinement tolerance of an edge is reported only when its
/// refined time lands inside the window.
pub fn find_extremes_with(
    constituents: &ConstituentSet,
    window_start: Epoch,
    length_secs: f64,
    config: &SearchConfig,
) -> Result<Vec<TideExtreme>, SearchError> {
    let Some(step) = sampling_step(constituents, config) else {
        debug!("No significant constituents; the height curve is flat");
        return Ok(Vec::new());
    };
    if !length_secs.is_finite() || length_secs < step {
        debug!(
            "Window of {}s is not a finite span of at least one {}s sampling step",
            length_secs, step
        );
        return Ok(Vec::new());
    }

    let start = window_start.secs();
    let end = start + length_secs;
    let last_inside = (length_secs / step).floor() as usize;
    let Some(last_guard) = last_inside.checked_add(2) else {
        debug!("Window of {}s holds too many samples", length_secs);
        return Ok(Vec::new());
    };

    // Index k sits at start + (k - 1) * step; k = 0 and k = last_guard are guards.
    let time_at = |k: usize| Epoch(start + (k as f64 - 1.0) * step);
    let mut heights = Vec::with_capacity(last_guard + 1);
    for k in 0..=last_guard {
        let time = time_at(k);
        let h = height(constituents, time);
        if !h.is_finite() {
            warn!("Non-finite tide height {} at {}; constituent data is malformed", h, time);
            return Err(SearchError::NonFiniteHeight { time, height: h });
        }
        heights.push(h);
    }

    let extremes: Vec<TideExtreme> = find_brackets(&heights)
        .into_iter()
        .filter(|b| (1..=last_inside + 1).contains(&b.pivot))
        .filter_map(|b| {
            let refined = refine(constituents, time_at(b.lo), time_at(b.hi), b.is_high, config);
            if !(start..=end).contains(&refined.time.secs()) {
                debug!("Dropping extreme at {} outside the window", refined.time);
                return None;
            }
            Some(TideExtreme::new(
                refined.time,
                height(constituents, refined.time),
                b.is_high,
            ))
        })
        .collect();

    debug!(
        "Found {} extremes from {} samples at {:.0}s step",
        extremes.len(),
        heights.len(),
        step
    );
    Ok(extremes)
}
