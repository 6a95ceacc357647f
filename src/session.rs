//! Recorded gaze session loading and offline analysis.
//!
//! A session is a pair of parallel arrays: sample timestamps and a 1D
//! horizontal gaze position. Sessions load from CSV recordings and feed
//! the segmentation pipeline, which this module composes into a single
//! serializable report.

use std::path::Path;

use log::info;
use serde::Serialize;

use crate::config::SegmentationConfig;
use crate::saccades::{
    count_intrusive_saccades, detect_fixations, detect_saccades, saccade_latency_to_stimuli,
    Fixation, IntrusionCounts, Saccade,
};
use crate::{Error, Result};

/// A recorded gaze session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    /// Sample timestamps in seconds
    pub times: Vec<f64>,
    /// Horizontal gaze positions, NaN where the recording has no value
    pub positions: Vec<f64>,
}

impl SessionData {
    /// Create a session from parallel time and position arrays.
    ///
    /// # Errors
    ///
    /// Returns an error when the arrays have different lengths.
    pub fn new(times: Vec<f64>, positions: Vec<f64>) -> Result<Self> {
        if times.len() != positions.len() {
            return Err(Error::InvalidInput(format!(
                "Session arrays differ in length: {} times, {} positions",
                times.len(),
                positions.len()
            )));
        }
        Ok(Self { times, positions })
    }

    /// Load a session from a CSV file with a header row.
    ///
    /// The time column is `t`. The position column is `g_horizontal`,
    /// falling back to `left_px` for every row where `g_horizontal` is
    /// absent or empty. Missing or unparseable values become NaN; the
    /// segmentation stage recovers from those by interpolation.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, has no header row,
    /// or the header carries neither a time nor a position column.
    pub fn from_csv_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut lines = content.lines();

        let header = lines
            .next()
            .ok_or_else(|| Error::SessionError("Session file is empty".to_string()))?;
        let columns: Vec<&str> = header
            .trim_end_matches('\r')
            .split(',')
            .map(str::trim)
            .collect();

        let time_column = columns
            .iter()
            .position(|&c| c == "t")
            .ok_or_else(|| Error::SessionError("Session file has no 't' column".to_string()))?;
        let gaze_column = columns.iter().position(|&c| c == "g_horizontal");
        let pixel_column = columns.iter().position(|&c| c == "left_px");
        if gaze_column.is_none() && pixel_column.is_none() {
            return Err(Error::SessionError(
                "Session file has neither 'g_horizontal' nor 'left_px' column".to_string(),
            ));
        }

        let mut times = Vec::new();
        let mut positions = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split(',').collect();

            times.push(cells.get(time_column).copied().map_or(f64::NAN, parse_float));

            let gaze = gaze_column.and_then(|i| cells.get(i)).copied();
            let cell = match gaze {
                Some(value) if !value.is_empty() => Some(value),
                _ => pixel_column.and_then(|i| cells.get(i)).copied(),
            };
            positions.push(cell.map_or(f64::NAN, parse_float));
        }

        info!("Loaded session with {} samples", times.len());
        Ok(Self { times, positions })
    }

    /// Number of samples in the session
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when the session holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Span from the first to the last finite timestamp, NaN when the
    /// session has no finite timestamps
    #[must_use]
    pub fn duration(&self) -> f64 {
        let finite: Vec<f64> = self
            .times
            .iter()
            .copied()
            .filter(|t| t.is_finite())
            .collect();
        match (finite.first(), finite.last()) {
            (Some(first), Some(last)) => last - first,
            _ => f64::NAN,
        }
    }
}

fn parse_float(cell: &str) -> f64 {
    cell.trim().parse().unwrap_or(f64::NAN)
}

/// Summary of one analyzed session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Number of samples in the session
    pub sample_count: usize,
    /// Recording span in seconds, NaN when no timestamp is finite
    pub duration: f64,
    /// Detected saccades, ordered by onset
    pub saccades: Vec<Saccade>,
    /// Detected fixations, ordered by start
    pub fixations: Vec<Fixation>,
    /// Latency per stimulus, NaN where no saccade answered in time
    pub latencies: Vec<f64>,
    /// Saccade counts over the configured intrusion intervals
    pub intrusions: IntrusionCounts,
}

/// Run the full segmentation pipeline over a session and collect the
/// results into a report
#[must_use]
pub fn analyze_session(
    session: &SessionData,
    config: &SegmentationConfig,
    stimuli: &[f64],
    intrusion_intervals: &[(f64, f64)],
) -> AnalysisReport {
    let saccades = detect_saccades(
        &session.times,
        &session.positions,
        config.velocity_threshold,
        config.min_saccade_duration,
        config.smoothing_width,
    );
    let fixations = detect_fixations(
        &session.times,
        &session.positions,
        &saccades,
        config.min_fixation_duration,
    );
    let latencies = saccade_latency_to_stimuli(&saccades, stimuli, config.max_latency);
    let intrusions = count_intrusive_saccades(&saccades, intrusion_intervals);

    AnalysisReport {
        sample_count: session.len(),
        duration: session.duration(),
        saccades,
        fixations,
        latencies,
        intrusions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_temp_csv(name: &str, content: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("gaze_session_{}_{}.csv", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_session_with_gaze_column() {
        let path = write_temp_csv("gaze", "t,g_horizontal\n0.0,1.5\n0.01,2.5\n");
        let session = SessionData::from_csv_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(session.len(), 2);
        assert!((session.times[1] - 0.01).abs() < 1e-12);
        assert!((session.positions[0] - 1.5).abs() < 1e-12);
        assert!((session.positions[1] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_gaze_cells_fall_back_to_pixel_column() {
        let path = write_temp_csv(
            "fallback",
            "t,g_horizontal,left_px\n0.0,,10.0\n0.01,2.0,20.0\n",
        );
        let session = SessionData::from_csv_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!((session.positions[0] - 10.0).abs() < 1e-12);
        assert!((session.positions[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_pixel_only_session_loads() {
        let path = write_temp_csv("pixel", "t,left_px\n0.0,31.0\n0.01,32.0\n");
        let session = SessionData::from_csv_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!((session.positions[0] - 31.0).abs() < 1e-12);
    }

    #[test]
    fn test_unparseable_values_become_nan() {
        let path = write_temp_csv("nan", "t,g_horizontal\nbad,worse\n0.01,\n");
        let session = SessionData::from_csv_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(session.times[0].is_nan());
        assert!(session.positions[0].is_nan());
        // Empty cell with no fallback column also becomes NaN
        assert!(session.positions[1].is_nan());
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let path = write_temp_csv("empty", "");
        let result = SessionData::from_csv_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_time_column_is_an_error() {
        let path = write_temp_csv("no_time", "g_horizontal\n1.0\n");
        let result = SessionData::from_csv_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_position_columns_is_an_error() {
        let path = write_temp_csv("no_position", "t,other\n0.0,1.0\n");
        let result = SessionData::from_csv_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_mismatched_arrays_are_rejected() {
        assert!(SessionData::new(vec![0.0, 0.01], vec![1.0]).is_err());
        assert!(SessionData::new(vec![0.0], vec![1.0]).is_ok());
    }

    #[test]
    fn test_duration_ignores_non_finite_timestamps() {
        let session =
            SessionData::new(vec![f64::NAN, 1.0, 2.0, f64::NAN], vec![0.0; 4]).unwrap();
        assert!((session.duration() - 1.0).abs() < 1e-12);

        let empty = SessionData::new(vec![f64::NAN], vec![0.0]).unwrap();
        assert!(empty.duration().is_nan());
    }

    #[test]
    fn test_analyze_session_collects_all_statistics() {
        // Flat, ramp up over ten samples, flat again
        let times: Vec<f64> = (0..80).map(|i| f64::from(i) * 0.01).collect();
        let positions: Vec<f64> = (0..80)
            .map(|i| match i {
                0..=30 => 0.0,
                31..=40 => f64::from(i - 30) * 0.04,
                _ => 0.4,
            })
            .collect();
        let session = SessionData::new(times, positions).unwrap();
        let config = SegmentationConfig {
            smoothing_width: 1,
            ..SegmentationConfig::default()
        };

        let onset = 0.3;
        let report = analyze_session(
            &session,
            &config,
            &[onset - 0.25],
            &[(0.0, 1.0), (0.5, 0.6)],
        );

        assert_eq!(report.sample_count, 80);
        assert!((report.duration - 0.79).abs() < 1e-9);
        assert_eq!(report.saccades.len(), 1);
        assert_eq!(report.fixations.len(), 2);
        assert_eq!(report.latencies.len(), 1);
        assert!((report.latencies[0] - 0.25).abs() < 1e-9);
        assert_eq!(report.intrusions.per_interval, vec![1, 0]);
        assert_eq!(report.intrusions.total, 1);
    }

    #[test]
    fn test_report_serializes_to_yaml() {
        let session = SessionData::new(vec![0.0, 0.01, 0.02], vec![0.0, 0.0, 0.0]).unwrap();
        let report = analyze_session(&session, &SegmentationConfig::default(), &[], &[]);
        let text = serde_yaml::to_string(&report).unwrap();
        assert!(text.contains("sample_count: 3"));
        assert!(text.contains("saccades: []"));
    }
}
