//! Offline saccade and fixation segmentation of a 1D gaze-position signal.
//!
//! Operates on a full (times, positions) recording rather than per frame:
//! non-finite samples are interpolated, the signal is smoothed, and maximal
//! runs of above-threshold velocity become saccades. Fixations are the
//! complementary runs. Latency and intrusion statistics are derived from
//! the saccade onsets.

use ndarray::Array1;
use serde::Serialize;

/// One detected saccade over a closed run of samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Saccade {
    pub onset_index: usize,
    pub offset_index: usize,
    pub onset_time: f64,
    pub offset_time: f64,
    pub duration: f64,
    pub peak_velocity: f64,
    /// Signed smoothed-position change from onset to offset
    pub amplitude: f64,
}

/// One detected fixation over a closed run of non-saccadic samples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fixation {
    pub start_index: usize,
    pub end_index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub duration: f64,
    /// Mean of the raw positions over the run, ignoring NaN samples
    pub mean_position: f64,
}

/// Saccade counts over a set of query intervals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntrusionCounts {
    pub total: usize,
    pub per_interval: Vec<usize>,
}

/// Detect saccades in a gaze-position time series.
///
/// Non-finite samples are filled by linear interpolation over the finite
/// ones, the filled signal is smoothed with a centered moving average of
/// `smoothing_width` samples, and maximal runs where the absolute velocity
/// strictly exceeds `velocity_threshold` are kept when they span at least
/// `min_duration` seconds. Fewer than 3 finite samples yield no saccades.
///
/// # Panics
///
/// Panics if `times` and `positions` have different lengths.
#[must_use]
pub fn detect_saccades(
    times: &[f64],
    positions: &[f64],
    velocity_threshold: f64,
    min_duration: f64,
    smoothing_width: usize,
) -> Vec<Saccade> {
    assert_eq!(
        times.len(),
        positions.len(),
        "times and positions must have the same length"
    );
    let n = times.len();

    let finite: Vec<bool> = times
        .iter()
        .zip(positions.iter())
        .map(|(t, p)| t.is_finite() && p.is_finite())
        .collect();
    let finite_count = finite.iter().filter(|&&f| f).count();
    if finite_count < 3 {
        return Vec::new();
    }

    let mut filled = Array1::from_iter(positions.iter().copied());
    if finite_count < n {
        let mut sample_times = Vec::with_capacity(finite_count);
        let mut sample_values = Vec::with_capacity(finite_count);
        for i in 0..n {
            if finite[i] {
                sample_times.push(times[i]);
                sample_values.push(positions[i]);
            }
        }
        for i in 0..n {
            if !finite[i] {
                filled[i] = linear_interp(times[i], &sample_times, &sample_values);
            }
        }
    }

    let smoothed = moving_average(&filled, smoothing_width);
    let velocity = absolute_gradient(&smoothed, times);
    let active: Vec<bool> = velocity.iter().map(|&v| v > velocity_threshold).collect();

    let mut saccades = Vec::new();
    let mut i = 0;
    while i < n {
        if !active[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && active[i] {
            i += 1;
        }
        let end = i - 1;
        let duration = times[end] - times[start];
        if duration >= min_duration {
            let peak = velocity
                .slice(ndarray::s![start..=end])
                .iter()
                .fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
            saccades.push(Saccade {
                onset_index: start,
                offset_index: end,
                onset_time: times[start],
                offset_time: times[end],
                duration,
                peak_velocity: peak,
                amplitude: smoothed[end] - smoothed[start],
            });
        }
    }
    saccades
}

/// Detect fixations as the maximal runs of samples not covered by any
/// saccade's [onset, offset] index range, kept when they span at least
/// `min_fixation_duration` seconds. The mean position is taken over the
/// raw (non-smoothed) samples, ignoring NaN values.
///
/// # Panics
///
/// Panics if `times` and `positions` have different lengths.
#[must_use]
pub fn detect_fixations(
    times: &[f64],
    positions: &[f64],
    saccades: &[Saccade],
    min_fixation_duration: f64,
) -> Vec<Fixation> {
    assert_eq!(
        times.len(),
        positions.len(),
        "times and positions must have the same length"
    );
    let n = times.len();

    let mut saccadic = vec![false; n];
    for saccade in saccades {
        let span = saccade.offset_index - saccade.onset_index + 1;
        for slot in saccadic.iter_mut().skip(saccade.onset_index).take(span) {
            *slot = true;
        }
    }

    let mut fixations = Vec::new();
    let mut i = 0;
    while i < n {
        if saccadic[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && !saccadic[i] {
            i += 1;
        }
        let end = i - 1;
        let duration = times[end] - times[start];
        if duration >= min_fixation_duration {
            fixations.push(Fixation {
                start_index: start,
                end_index: end,
                start_time: times[start],
                end_time: times[end],
                duration,
                mean_position: nan_mean(&positions[start..=end]),
            });
        }
    }
    fixations
}

/// Latency from each stimulus time to the first saccade onset at or after
/// it. Latencies above `max_latency` are reported as NaN, as is every
/// stimulus when the saccade list is empty.
#[must_use]
pub fn saccade_latency_to_stimuli(
    saccades: &[Saccade],
    stimulus_times: &[f64],
    max_latency: f64,
) -> Vec<f64> {
    let onsets: Vec<f64> = saccades.iter().map(|s| s.onset_time).collect();
    stimulus_times
        .iter()
        .map(|&stimulus| {
            if onsets.is_empty() {
                return f64::NAN;
            }
            let idx = onsets.partition_point(|&onset| onset < stimulus);
            if idx < onsets.len() && onsets[idx] - stimulus <= max_latency {
                onsets[idx] - stimulus
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Count saccades whose onset falls within each closed `(start, end)`
/// interval, returning the per-interval counts and their sum
#[must_use]
pub fn count_intrusive_saccades(saccades: &[Saccade], intervals: &[(f64, f64)]) -> IntrusionCounts {
    let per_interval: Vec<usize> = intervals
        .iter()
        .map(|&(start, end)| {
            saccades
                .iter()
                .filter(|s| s.onset_time >= start && s.onset_time <= end)
                .count()
        })
        .collect();
    let total = per_interval.iter().sum();
    IntrusionCounts {
        total,
        per_interval,
    }
}

/// Linear interpolation with endpoint clamping. `sample_times` must be
/// sorted ascending and non-empty; a NaN query yields NaN.
fn linear_interp(query: f64, sample_times: &[f64], sample_values: &[f64]) -> f64 {
    if query.is_nan() {
        return f64::NAN;
    }
    let n = sample_times.len();
    if query <= sample_times[0] {
        return sample_values[0];
    }
    if query >= sample_times[n - 1] {
        return sample_values[n - 1];
    }
    let hi = sample_times.partition_point(|&t| t < query);
    let lo = hi - 1;
    let t0 = sample_times[lo];
    let t1 = sample_times[hi];
    sample_values[lo] + (sample_values[hi] - sample_values[lo]) * (query - t0) / (t1 - t0)
}

/// Centered moving average with zero padding at the edges, keeping the
/// output length equal to the input length. Width 1 or less is a no-op.
fn moving_average(signal: &Array1<f64>, width: usize) -> Array1<f64> {
    if width <= 1 {
        return signal.clone();
    }
    let n = signal.len();
    let shift = (width - 1) / 2;
    let mut smoothed = Array1::zeros(n);
    for i in 0..n {
        let upper = (i + shift).min(n - 1);
        let lower = (i + shift + 1).saturating_sub(width);
        let mut sum = 0.0;
        for j in lower..=upper {
            sum += signal[j];
        }
        smoothed[i] = sum / width as f64;
    }
    smoothed
}

/// Absolute numerical gradient of `values` with respect to `times`:
/// a three-point stencil weighted by the neighboring sample spacings
/// inside (exact for quadratics on uneven grids, plain central
/// differences when the spacing is uniform), one-sided at the
/// boundaries
fn absolute_gradient(values: &Array1<f64>, times: &[f64]) -> Array1<f64> {
    let n = values.len();
    let mut gradient = Array1::zeros(n);
    if n < 2 {
        return gradient;
    }
    gradient[0] = ((values[1] - values[0]) / (times[1] - times[0])).abs();
    for i in 1..n - 1 {
        let hs = times[i] - times[i - 1];
        let hd = times[i + 1] - times[i];
        let slope = -hd / (hs * (hs + hd)) * values[i - 1]
            + (hd - hs) / (hs * hd) * values[i]
            + hs / (hd * (hs + hd)) * values[i + 1];
        gradient[i] = slope.abs();
    }
    gradient[n - 1] = ((values[n - 1] - values[n - 2]) / (times[n - 1] - times[n - 2])).abs();
    gradient
}

/// Mean of the non-NaN values, or NaN when every value is NaN
fn nan_mean(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut count = 0_usize;
    for &value in values {
        if !value.is_nan() {
            sum += value;
            count += 1;
        }
    }
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_MIN_SACCADE_DURATION, DEFAULT_VELOCITY_THRESHOLD};
    use ndarray::array;

    fn ramp_session() -> (Vec<f64>, Vec<f64>) {
        // Flat at 0, a linear ramp to 0.4 over samples 31..=40, flat at 0.4
        let times: Vec<f64> = (0..80).map(|i| f64::from(i) * 0.01).collect();
        let positions: Vec<f64> = (0..80)
            .map(|i| match i {
                0..=30 => 0.0,
                31..=40 => f64::from(i - 30) * 0.04,
                _ => 0.4,
            })
            .collect();
        (times, positions)
    }

    #[test]
    fn test_moving_average_width_one_is_identity() {
        let signal = array![1.0, f64::NAN, 3.0];
        let smoothed = moving_average(&signal, 1);
        assert!((smoothed[0] - 1.0).abs() < f64::EPSILON);
        assert!(smoothed[1].is_nan());
        assert!((smoothed[2] - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_moving_average_zero_pads_edges() {
        let smoothed = moving_average(&array![3.0, 3.0, 3.0], 3);
        assert!((smoothed[0] - 2.0).abs() < 1e-12);
        assert!((smoothed[1] - 3.0).abs() < 1e-12);
        assert!((smoothed[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_interp_clamps_to_endpoints() {
        let sample_times = [1.0, 2.0, 3.0];
        let sample_values = [10.0, 20.0, 30.0];
        assert!((linear_interp(0.0, &sample_times, &sample_values) - 10.0).abs() < 1e-12);
        assert!((linear_interp(5.0, &sample_times, &sample_values) - 30.0).abs() < 1e-12);
        assert!((linear_interp(2.5, &sample_times, &sample_values) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_interp_nan_query_is_nan() {
        let sample_times = [1.0, 2.0, 3.0];
        let sample_values = [10.0, 20.0, 30.0];
        assert!(linear_interp(f64::NAN, &sample_times, &sample_values).is_nan());
    }

    #[test]
    fn test_gradient_uniform_grid_is_central_differences() {
        let times = [0.0, 1.0, 2.0, 3.0];
        let values = array![0.0, 1.0, 4.0, 9.0];
        let gradient = absolute_gradient(&values, &times);
        assert!((gradient[0] - 1.0).abs() < 1e-12);
        assert!((gradient[1] - 2.0).abs() < 1e-12);
        assert!((gradient[2] - 4.0).abs() < 1e-12);
        assert!((gradient[3] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_gradient_weights_uneven_spacing() {
        // A 0.01 position step across a 0.01 s gap flanked by 0.1 s
        // steps: the stencil is exact for the quadratic through each
        // triple, giving 10/11 at both sides of the gap
        let times = [0.0, 0.1, 0.11, 0.21, 0.31];
        let values = array![0.0, 0.0, 0.01, 0.01, 0.01];
        let gradient = absolute_gradient(&values, &times);
        assert!(gradient[0].abs() < 1e-12);
        assert!((gradient[1] - 10.0 / 11.0).abs() < 1e-9);
        assert!((gradient[2] - 10.0 / 11.0).abs() < 1e-9);
        assert!(gradient[3].abs() < 1e-9);
        assert!(gradient[4].abs() < 1e-12);
    }

    #[test]
    fn test_detect_saccades_spans_dropped_frames() {
        // Dropped frames leave two 0.1 s steps around a 0.01 s gap;
        // the step across the gap must still cross the threshold
        let times = [0.0, 0.1, 0.11, 0.21, 0.31];
        let positions = [0.0, 0.0, 0.01, 0.01, 0.01];
        let saccades = detect_saccades(&times, &positions, 0.5, 0.005, 1);

        assert_eq!(saccades.len(), 1, "got {:?}", saccades);
        assert_eq!(saccades[0].onset_index, 1);
        assert_eq!(saccades[0].offset_index, 2);
        assert!((saccades[0].peak_velocity - 10.0 / 11.0).abs() < 1e-9);
        assert!((saccades[0].amplitude - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_nan_mean_ignores_nan() {
        assert!((nan_mean(&[1.0, f64::NAN, 3.0]) - 2.0).abs() < 1e-12);
        assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
    }

    #[test]
    fn test_detect_saccades_requires_three_finite_samples() {
        let times = [0.0, 0.01, f64::NAN, f64::NAN];
        let positions = [0.0, 1.0, 2.0, 3.0];
        assert!(detect_saccades(&times, &positions, 0.5, 0.02, 5).is_empty());
    }

    #[test]
    fn test_detect_saccades_finds_ramp() {
        let (times, positions) = ramp_session();
        let saccades = detect_saccades(
            &times,
            &positions,
            DEFAULT_VELOCITY_THRESHOLD,
            DEFAULT_MIN_SACCADE_DURATION,
            1,
        );
        assert_eq!(saccades.len(), 1);
        // Unsmoothed, the active run is exactly the ramp support
        assert_eq!(saccades[0].onset_index, 30);
        assert_eq!(saccades[0].offset_index, 40);
        assert!((saccades[0].amplitude - 0.4).abs() < 1e-9);
        assert!((saccades[0].peak_velocity - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_runs_are_discarded() {
        // A single-sample spike produces runs shorter than min_duration
        let times: Vec<f64> = (0..20).map(|i| f64::from(i) * 0.01).collect();
        let mut positions = vec![0.0; 20];
        positions[10] = 0.05;
        let saccades = detect_saccades(&times, &positions, 0.5, 0.05, 1);
        assert!(saccades.is_empty());
    }

    #[test]
    fn test_detect_fixations_flanks_the_saccade() {
        let (times, positions) = ramp_session();
        let saccades = detect_saccades(&times, &positions, 0.5, 0.02, 1);
        let fixations = detect_fixations(&times, &positions, &saccades, 0.08);
        assert_eq!(fixations.len(), 2);
        assert_eq!(fixations[0].start_index, 0);
        assert_eq!(fixations[0].end_index, 29);
        assert!((fixations[0].mean_position).abs() < 1e-12);
        assert_eq!(fixations[1].start_index, 41);
        assert_eq!(fixations[1].end_index, 79);
        assert!((fixations[1].mean_position - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_latency_reports_first_onset_after_stimulus() {
        let (times, positions) = ramp_session();
        let saccades = detect_saccades(&times, &positions, 0.5, 0.02, 1);
        let onset = saccades[0].onset_time;

        let latencies = saccade_latency_to_stimuli(&saccades, &[onset - 0.1], 1.0);
        assert!((latencies[0] - 0.1).abs() < 1e-9);

        // Beyond max_latency the stimulus is left unanswered
        let latencies = saccade_latency_to_stimuli(&saccades, &[onset - 0.1], 0.05);
        assert!(latencies[0].is_nan());

        // A stimulus after the last onset has no answering saccade
        let latencies = saccade_latency_to_stimuli(&saccades, &[onset + 0.1], 1.0);
        assert!(latencies[0].is_nan());
    }

    #[test]
    fn test_latency_without_saccades_is_nan() {
        let latencies = saccade_latency_to_stimuli(&[], &[0.0, 1.0], 1.0);
        assert_eq!(latencies.len(), 2);
        assert!(latencies.iter().all(|l| l.is_nan()));
    }

    fn saccade_at(onset_time: f64) -> Saccade {
        Saccade {
            onset_index: 0,
            offset_index: 1,
            onset_time,
            offset_time: onset_time + 0.05,
            duration: 0.05,
            peak_velocity: 1.0,
            amplitude: 0.1,
        }
    }

    #[test]
    fn test_latency_ceiling_turns_gap_into_nan() {
        let saccades = [saccade_at(1.0), saccade_at(3.0)];

        let latencies = saccade_latency_to_stimuli(&saccades, &[0.5], 1.0);
        assert!((latencies[0] - 0.5).abs() < 1e-12);

        let latencies = saccade_latency_to_stimuli(&saccades, &[0.5], 0.2);
        assert!(latencies[0].is_nan());
    }

    #[test]
    fn test_intrusion_interval_counts_onsets_inclusively() {
        let saccades = [saccade_at(1.0), saccade_at(2.5), saccade_at(4.0)];
        let counts = count_intrusive_saccades(&saccades, &[(1.0, 3.0)]);
        assert_eq!(counts.per_interval, vec![2]);
        assert_eq!(counts.total, 2);
    }

    #[test]
    fn test_intrusion_counts_use_closed_intervals() {
        let (times, positions) = ramp_session();
        let saccades = detect_saccades(&times, &positions, 0.5, 0.02, 1);
        let onset = saccades[0].onset_time;

        let counts = count_intrusive_saccades(
            &saccades,
            &[(onset, onset), (onset + 0.01, onset + 0.5), (0.0, 1.0)],
        );
        assert_eq!(counts.per_interval, vec![1, 0, 1]);
        assert_eq!(counts.total, 2);
    }

    #[test]
    fn test_empty_input_yields_no_events() {
        let saccades = detect_saccades(&[], &[], 0.5, 0.02, 5);
        assert!(saccades.is_empty());
        let fixations = detect_fixations(&[], &[], &saccades, 0.08);
        assert!(fixations.is_empty());
    }
}
