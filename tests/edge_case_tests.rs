//! Edge case tests for segmentation and session loading

use gaze_tracking::config::SegmentationConfig;
use gaze_tracking::saccades::{
    count_intrusive_saccades, detect_fixations, detect_saccades, saccade_latency_to_stimuli,
};
use gaze_tracking::session::{analyze_session, SessionData};
use std::path::PathBuf;

fn write_temp_csv(name: &str, content: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("gaze_edge_{}_{}.csv", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

/// Deterministic noise in [-0.5, 0.5), same congruential recurrence
/// throughout the tests
fn noise(rng: &mut u32) -> f64 {
    *rng = rng.wrapping_mul(1_103_515_245).wrapping_add(12_345);
    f64::from((*rng / 65_536) % 1_000) / 1_000.0 - 0.5
}

#[test]
fn test_sparse_finite_samples_yield_no_saccades() {
    // Two finite pairs are not enough to differentiate
    let times = [0.0, 0.01, f64::NAN, 0.03, f64::NAN];
    let positions = [0.0, 5.0, 5.0, f64::NAN, 0.0];
    let saccades = detect_saccades(&times, &positions, 0.5, 0.0, 5);
    assert!(saccades.is_empty());
}

#[test]
fn test_all_nan_positions_give_nan_fixation_mean() {
    let times: Vec<f64> = (0..50).map(|i| f64::from(i) * 0.01).collect();
    let positions = vec![f64::NAN; 50];

    let saccades = detect_saccades(&times, &positions, 0.5, 0.02, 5);
    assert!(saccades.is_empty());

    // With no saccades the whole session is one fixation, but there is
    // no position data to average
    let fixations = detect_fixations(&times, &positions, &saccades, 0.08);
    assert_eq!(fixations.len(), 1);
    assert_eq!(fixations[0].start_index, 0);
    assert_eq!(fixations[0].end_index, 49);
    assert!(fixations[0].mean_position.is_nan());
}

#[test]
fn test_interpolated_gap_preserves_detection() {
    let times: Vec<f64> = (0..80).map(|i| f64::from(i) * 0.01).collect();
    let positions: Vec<f64> = (0..80)
        .map(|i| match i {
            0..=30 => 0.0,
            31..=40 => f64::from(i - 30) * 0.04,
            _ => 0.4,
        })
        .collect();

    let mut gapped = positions.clone();
    gapped[35] = f64::NAN;

    let clean = detect_saccades(&times, &positions, 0.5, 0.02, 5);
    let filled = detect_saccades(&times, &gapped, 0.5, 0.02, 5);

    // The dropout sits on a linear segment, so interpolation restores it
    assert_eq!(clean.len(), filled.len());
    for (a, b) in clean.iter().zip(filled.iter()) {
        assert_eq!(a.onset_index, b.onset_index);
        assert_eq!(a.offset_index, b.offset_index);
        assert!((a.amplitude - b.amplitude).abs() < 1e-9);
        assert!((a.peak_velocity - b.peak_velocity).abs() < 1e-9);
    }
}

#[test]
fn test_infinite_position_contaminates_fixation_mean() {
    let times: Vec<f64> = (0..60).map(|i| f64::from(i) * 0.01).collect();
    let mut positions = vec![0.0; 60];
    positions[10] = f64::INFINITY;

    // The saccade path interpolates every non-finite sample away
    let saccades = detect_saccades(&times, &positions, 0.5, 0.02, 5);
    assert!(saccades.is_empty());

    // The fixation mean filters NaN only, so infinity passes through
    let fixations = detect_fixations(&times, &positions, &saccades, 0.08);
    assert_eq!(fixations.len(), 1);
    assert!(fixations[0].mean_position.is_infinite());
}

#[test]
fn test_empty_inputs_produce_empty_outputs() {
    let saccades = detect_saccades(&[], &[], 0.5, 0.02, 5);
    assert!(saccades.is_empty());
    assert!(detect_fixations(&[], &[], &saccades, 0.08).is_empty());
    assert!(saccade_latency_to_stimuli(&saccades, &[], 1.0).is_empty());

    let counts = count_intrusive_saccades(&saccades, &[]);
    assert_eq!(counts.total, 0);
    assert!(counts.per_interval.is_empty());
}

#[test]
fn test_header_only_session_analyzes_clean() {
    let path = write_temp_csv("header_only", "t,g_horizontal\n");
    let session = SessionData::from_csv_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(session.is_empty());
    assert!(session.duration().is_nan());

    let report = analyze_session(&session, &SegmentationConfig::default(), &[1.0], &[(0.0, 2.0)]);
    assert_eq!(report.sample_count, 0);
    assert!(report.duration.is_nan());
    assert!(report.saccades.is_empty());
    assert!(report.fixations.is_empty());
    assert!(report.latencies[0].is_nan());
    assert_eq!(report.intrusions.total, 0);
}

#[test]
fn test_noisy_flat_signal_stays_quiet() {
    let times: Vec<f64> = (0..500).map(|i| f64::from(i) * 0.01).collect();
    let mut rng = 7_u32;
    let positions: Vec<f64> = (0..500).map(|_| noise(&mut rng) * 0.002).collect();

    let saccades = detect_saccades(&times, &positions, 0.5, 0.02, 5);
    assert!(saccades.is_empty(), "noise alone produced {:?}", saccades);
}

#[test]
fn test_step_in_noise_finds_step_and_tail_taper() {
    let times: Vec<f64> = (0..500).map(|i| f64::from(i) * 0.01).collect();
    let mut rng = 7_u32;
    let positions: Vec<f64> = (0..500)
        .map(|i| {
            let step = if i >= 250 { 0.5 } else { 0.0 };
            step + noise(&mut rng) * 0.002
        })
        .collect();

    let saccades = detect_saccades(&times, &positions, 0.5, 0.02, 5);
    assert_eq!(
        saccades.len(),
        2,
        "expected the step and the tail taper, got {:?}",
        saccades
    );

    let step = &saccades[0];
    assert!(
        (246..=248).contains(&step.onset_index),
        "onset index was {}",
        step.onset_index
    );
    assert!(
        (251..=253).contains(&step.offset_index),
        "offset index was {}",
        step.offset_index
    );
    assert!((step.amplitude - 0.5).abs() < 0.02);
    assert!(step.peak_velocity > 5.0);

    // Zero padding shortens the last two smoothing windows, tapering
    // the smoothed tail 0.5 -> 0.4 -> 0.3; on a signal ending away
    // from zero that taper is itself an above-threshold run
    let tail = &saccades[1];
    assert_eq!(tail.onset_index, 497);
    assert_eq!(tail.offset_index, 499);
    assert!((tail.amplitude + 0.2).abs() < 0.01);
    assert!((tail.peak_velocity - 10.0).abs() < 0.2);
}
