//! # Prediction Engine Test Suite
//!
//! Property and scenario tests for the height function, the high/low search
//! and datum correction, exercised through the library's public API the way
//! the application uses it.

use approx::assert_abs_diff_eq;
use chrono::Duration;
use std::sync::Arc;
use std::thread;
use tide_predictor::calculator::{height, sample_heights, ConstituentSet};
use tide_predictor::complex::ComplexAmplitude;
use tide_predictor::constituents::TidalConstituent;
use tide_predictor::datum::{ApplyDatum, Datum, DatumOffset, Reference, TidePredictor};
use tide_predictor::extremes::{find_extremes, find_extremes_with, SearchConfig, SearchError};
use tide_predictor::{Epoch, TideExtreme};

/// 2023-11-14T22:13:20Z, a realistic prediction start.
const RECENT: Epoch = Epoch::from_secs(1_700_000_000.0);

fn single(constituent: TidalConstituent, amp: ComplexAmplitude) -> ConstituentSet {
    [(constituent, amp)].into_iter().collect()
}

/// A semidiurnal station with a noticeable diurnal inequality.
fn mixed_station() -> ConstituentSet {
    [
        (TidalConstituent::M2, ComplexAmplitude::from_polar(1.37, 0.40)),
        (TidalConstituent::S2, ComplexAmplitude::from_polar(0.21, 1.10)),
        (TidalConstituent::N2, ComplexAmplitude::from_polar(0.29, -0.35)),
        (TidalConstituent::K1, ComplexAmplitude::from_polar(0.14, 2.20)),
        (TidalConstituent::O1, ComplexAmplitude::from_polar(0.11, -1.90)),
        (TidalConstituent::M4, ComplexAmplitude::from_polar(0.03, 0.75)),
    ]
    .into_iter()
    .collect()
}

fn assert_alternating(extremes: &[TideExtreme]) {
    for pair in extremes.windows(2) {
        assert_ne!(
            pair[0].is_high, pair[1].is_high,
            "extremes at {} and {} do not alternate",
            pair[0].time, pair[1].time
        );
        assert!(pair[0].time < pair[1].time, "extremes are not in time order");
    }
}

/// Constituents with zero amplitude leave the height unchanged, bit for bit.
#[test]
fn zero_amplitude_constituents_contribute_nothing() {
    let base: ConstituentSet = [
        (TidalConstituent::M2, ComplexAmplitude::new(0.8, 0.3)),
        (TidalConstituent::K1, ComplexAmplitude::new(0.2, -0.1)),
    ]
    .into_iter()
    .collect();

    let mut padded = base.clone();
    padded.insert(TidalConstituent::S2, ComplexAmplitude::ZERO);
    padded.insert(TidalConstituent::M4, ComplexAmplitude::ZERO);
    padded.insert(TidalConstituent::O1, ComplexAmplitude::new(0.0, 0.0));

    for i in 0..200 {
        let t = RECENT.offset_secs(f64::from(i) * 937.0);
        assert_eq!(height(&base, t), height(&padded, t), "differs at {}", t);
    }
}

/// A lone constituent repeats after exactly one of its periods.
#[test]
fn single_constituent_is_periodic() {
    for constituent in [
        TidalConstituent::M2,
        TidalConstituent::K1,
        TidalConstituent::O1,
        TidalConstituent::M4,
        TidalConstituent::MF,
    ] {
        let set = single(constituent, ComplexAmplitude::new(0.6, -0.45));
        let period_secs = 360.0 / constituent.speed() * 3600.0;
        for t in [0.0, 12_345.6, 1.0e8, RECENT.secs()] {
            assert_abs_diff_eq!(
                height(&set, Epoch(t)),
                height(&set, Epoch(t + period_secs)),
                epsilon = 1e-9
            );
        }
    }
}

/// With zero phase, the cosine peaks at the epoch: height(0) == amplitude.
#[test]
fn zero_phase_peaks_at_epoch() {
    for constituent in TidalConstituent::ALL {
        let set = single(constituent, ComplexAmplitude::new(2.5, 0.0));
        assert_eq!(height(&set, Epoch::ZERO), 2.5, "{}", constituent);
    }
}

/// A pure sinusoid yields alternating ±A extremes half a period apart.
#[test]
fn sinusoid_extremes_alternate_half_a_period_apart() {
    let amplitude = 1.3;
    let set = single(
        TidalConstituent::M2,
        ComplexAmplitude::from_polar(amplitude, 0.7),
    );
    let config = SearchConfig::default();
    let half_period = TidalConstituent::M2.period_hours() * 3600.0 / 2.0;

    let extremes = find_extremes_with(&set, RECENT, 3.0 * 86_400.0, &config).unwrap();
    assert!(extremes.len() >= 10, "only {} extremes", extremes.len());
    assert_alternating(&extremes);

    for pair in extremes.windows(2) {
        let spacing = pair[1].time.secs() - pair[0].time.secs();
        assert!(
            (spacing - half_period).abs() <= config.tolerance_secs,
            "spacing {} vs {}",
            spacing,
            half_period
        );
    }
    for e in &extremes {
        let expected = if e.is_high { amplitude } else { -amplitude };
        assert_abs_diff_eq!(e.height, expected, epsilon = 1e-4);
    }
}

/// Nothing to find on a flat line.
#[test]
fn flat_sets_have_no_extremes() {
    let window = Duration::days(2);
    assert!(find_extremes(&ConstituentSet::new(), RECENT, window)
        .unwrap()
        .is_empty());

    let zeros: ConstituentSet = [
        (TidalConstituent::M2, ComplexAmplitude::ZERO),
        (TidalConstituent::K1, ComplexAmplitude::ZERO),
    ]
    .into_iter()
    .collect();
    assert!(find_extremes(&zeros, RECENT, window).unwrap().is_empty());
}

/// Shifting onto a datum and back restores the original values.
#[test]
fn datum_correction_round_trips() {
    let set = mixed_station();
    let extremes = find_extremes(&set, RECENT, Duration::days(1)).unwrap();
    assert!(!extremes.is_empty());
    for d in [DatumOffset(0.1), DatumOffset(0.2), DatumOffset(-2.7)] {
        assert_eq!(extremes.clone().apply_datum(d).apply_datum(-d), extremes);
    }

    let samples = sample_heights(&set, RECENT, 86_400.0, 1800.0);
    let d = DatumOffset(0.2);
    assert_eq!(samples.clone().apply_datum(d).apply_datum(-d), samples);

    let shifted = samples.clone().apply_datum(d);
    for (raw, s) in samples.iter().zip(&shifted) {
        assert_eq!(s.height, raw.height);
        assert_eq!(s.level(), raw.height + 0.2);
    }
}

/// Repeated searches give identical results.
#[test]
fn extremes_are_deterministic() {
    let set = mixed_station();
    let first = find_extremes(&set, RECENT, Duration::days(7)).unwrap();
    let second = find_extremes(&set, RECENT, Duration::days(7)).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

/// M2 alone over one day: two highs and two lows, the first at the epoch.
#[test]
fn m2_day_has_four_extremes() {
    let set = single(TidalConstituent::M2, ComplexAmplitude::new(1.0, 0.0));
    let extremes = find_extremes(&set, Epoch::ZERO, Duration::hours(24)).unwrap();

    assert_eq!(extremes.len(), 4, "{:?}", extremes);
    assert_alternating(&extremes);

    let first = extremes[0];
    assert!(first.is_high);
    assert!(first.time.secs().abs() <= 60.0, "first extreme at {}", first.time.secs());
    assert_abs_diff_eq!(first.height, 1.0, epsilon = 1e-5);

    let last = extremes[3];
    assert!(!last.is_high);
    let expected = 1.5 * TidalConstituent::M2.period_hours() * 3600.0;
    assert!((last.time.secs() - expected).abs() <= 30.0);
}

/// Reported times match a brute-force dense scan of a mixed tide.
#[test]
fn mixed_tide_matches_dense_scan() {
    let set = mixed_station();
    let extremes = find_extremes(&set, RECENT, Duration::days(3)).unwrap();
    assert!(extremes.len() >= 10);
    assert_alternating(&extremes);

    for e in &extremes {
        // Best sample within ±40 minutes on a 5-second grid
        let sign = if e.is_high { 1.0 } else { -1.0 };
        let best = (-480..=480)
            .map(|k| e.time.offset_secs(f64::from(k) * 5.0))
            .max_by(|a, b| (sign * height(&set, *a)).total_cmp(&(sign * height(&set, *b))))
            .unwrap();
        assert!(
            (best.secs() - e.time.secs()).abs() <= 60.0,
            "{} found at {} but dense scan says {}",
            e.kind(),
            e.time,
            best
        );
        assert_abs_diff_eq!(e.height, height(&set, best), epsilon = 1e-3);
    }
}

/// An iteration cap that stops refinement early still reports every extreme.
#[test]
fn capped_refinement_is_best_effort() {
    let set = mixed_station();
    let full = find_extremes_with(&set, RECENT, 2.0 * 86_400.0, &SearchConfig::default()).unwrap();
    let capped = find_extremes_with(
        &set,
        RECENT,
        2.0 * 86_400.0,
        &SearchConfig {
            max_iterations: 1,
            ..SearchConfig::default()
        },
    )
    .unwrap();

    assert_eq!(full.len(), capped.len());
    for (f, c) in full.iter().zip(&capped) {
        assert_eq!(f.is_high, c.is_high);
        // One round leaves a bracket of 800s, so the midpoint is within 400s.
        assert!((f.time.secs() - c.time.secs()).abs() <= 400.0 + 30.0);
    }
}

/// Every reported time lies inside the requested window.
#[test]
fn extremes_stay_inside_window() {
    let set = mixed_station();
    let start = RECENT.offset_secs(1234.0);
    let length = Duration::hours(30);
    let end = start.secs() + 30.0 * 3600.0;
    for e in find_extremes(&set, start, length).unwrap() {
        assert!(e.time.secs() >= start.secs() && e.time.secs() <= end);
    }
}

/// Highs just outside either edge are not pulled onto the edge.
#[test]
fn extremes_just_outside_window_are_not_reported() {
    // Highs at 0 and 2P; the window opens 200s after the first and closes 200s
    // before the second, leaving low, high, low inside.
    let set = single(TidalConstituent::M2, ComplexAmplitude::new(1.0, 0.0));
    let period = TidalConstituent::M2.period_hours() * 3600.0;
    let start = Epoch(200.0);
    let length = 2.0 * period - 400.0;

    let extremes = find_extremes_with(&set, start, length, &SearchConfig::default()).unwrap();
    assert_eq!(extremes.len(), 3, "{:?}", extremes);
    assert_alternating(&extremes);
    assert!(!extremes[0].is_high);
    assert!(!extremes[2].is_high);

    let end = start.secs() + length;
    for e in &extremes {
        assert!(e.time.secs() > start.secs() + 60.0, "start edge reported: {:?}", e);
        assert!(e.time.secs() < end - 60.0, "end edge reported: {:?}", e);
        assert_abs_diff_eq!(e.height.abs(), 1.0, epsilon = 1e-5);
    }
}

/// Bad upstream data shows up as NaN rather than being hidden.
#[test]
fn nan_input_propagates() {
    let mut set = mixed_station();
    set.insert(TidalConstituent::K2, ComplexAmplitude::new(f64::NAN, 0.0));
    assert!(height(&set, RECENT).is_nan());

    let predictor = TidePredictor::new(set).with_datum(Datum::new("LAT", DatumOffset(1.0)));
    assert!(predictor.height(RECENT, Reference::Datum).is_nan());

    // The search refuses NaN data instead of reporting a flat tide.
    let result = predictor.extremes(RECENT, Duration::days(1), Reference::Datum);
    assert!(matches!(result, Err(SearchError::NonFiniteHeight { .. })));
}

/// One predictor shared across threads gives the same answers everywhere.
#[test]
fn predictor_is_safe_to_share() {
    let predictor = Arc::new(
        TidePredictor::new(mixed_station()).with_datum(Datum::new("LAT", DatumOffset(2.1))),
    );
    let expected = predictor
        .extremes(RECENT, Duration::days(2), Reference::Datum)
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let predictor = Arc::clone(&predictor);
            thread::spawn(move || {
                predictor
                    .extremes(RECENT, Duration::days(2), Reference::Datum)
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[cfg(test)]
mod performance_tests {
    use super::*;
    use std::time::Instant;

    /// A month of extremes over the full catalog is cheap.
    #[test]
    fn month_of_extremes_is_fast() {
        let set: ConstituentSet = TidalConstituent::ALL
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let amp = 0.5 / (1.0 + i as f64);
                (*c, ComplexAmplitude::from_polar(amp, i as f64 * 0.37))
            })
            .collect();

        let start = Instant::now();
        let extremes = find_extremes(&set, RECENT, Duration::days(30)).unwrap();
        let duration = start.elapsed();

        assert!(!extremes.is_empty());
        assert!(
            duration.as_millis() < 2000,
            "Extreme search took too long: {:?}",
            duration
        );
    }
}
