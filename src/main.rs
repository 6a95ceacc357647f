//! Command line tool for analyzing recorded gaze sessions.

use anyhow::{Context, Result};
use clap::Parser;
use gaze_tracking::config::AnalysisConfig;
use gaze_tracking::session::{analyze_session, SessionData};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Session recording to analyze (CSV format)
    session: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Velocity threshold for saccade detection, in position units per second
    #[arg(long)]
    velocity_threshold: Option<f64>,

    /// Minimum saccade duration in seconds
    #[arg(long)]
    min_saccade_duration: Option<f64>,

    /// Moving average window applied before differentiation
    #[arg(long)]
    smoothing_width: Option<usize>,

    /// Minimum fixation duration in seconds
    #[arg(long)]
    min_fixation_duration: Option<f64>,

    /// Longest accepted saccade latency in seconds
    #[arg(long)]
    max_latency: Option<f64>,

    /// Stimulus onset time in seconds (repeatable)
    #[arg(short, long = "stimulus")]
    stimuli: Vec<f64>,

    /// Intrusion interval as START,END in seconds (repeatable)
    #[arg(short, long = "interval")]
    intervals: Vec<String>,

    /// Write the full analysis report to this file (YAML format)
    #[arg(short, long)]
    report: Option<String>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_example_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_example_config {
        print!("{}", gaze_tracking::config::EXAMPLE_CONFIG);
        return Ok(());
    }

    let Some(session_path) = args.session else {
        anyhow::bail!("no session file given, pass the path to a CSV recording");
    };

    info!("Gaze Session Analysis");

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match AnalysisConfig::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                AnalysisConfig::default()
            }
        }
    } else {
        AnalysisConfig::default()
    };

    // Command line values take precedence over the config file
    if let Some(value) = args.velocity_threshold {
        config.segmentation.velocity_threshold = value;
    }
    if let Some(value) = args.min_saccade_duration {
        config.segmentation.min_saccade_duration = value;
    }
    if let Some(value) = args.smoothing_width {
        config.segmentation.smoothing_width = value;
    }
    if let Some(value) = args.min_fixation_duration {
        config.segmentation.min_fixation_duration = value;
    }
    if let Some(value) = args.max_latency {
        config.segmentation.max_latency = value;
    }
    if !args.stimuli.is_empty() {
        config.stimuli = args.stimuli;
    }
    if !args.intervals.is_empty() {
        config.intrusion_intervals = args
            .intervals
            .iter()
            .map(|raw| parse_interval(raw))
            .collect::<Result<Vec<_>>>()?;
    }

    config.validate()?;

    let session = SessionData::from_csv_file(&session_path)
        .with_context(|| format!("Failed to load session from {}", session_path))?;

    let report = analyze_session(
        &session,
        &config.segmentation,
        &config.stimuli,
        &config.intrusion_intervals,
    );

    println!(
        "Session: {} samples spanning {:.2} s",
        report.sample_count, report.duration
    );

    println!("Saccades: {}", report.saccades.len());
    for saccade in &report.saccades {
        println!(
            "  onset {:.3} s  duration {:.3} s  amplitude {:+.3}  peak {:.3}/s",
            saccade.onset_time, saccade.duration, saccade.amplitude, saccade.peak_velocity
        );
    }

    println!("Fixations: {}", report.fixations.len());
    for fixation in &report.fixations {
        println!(
            "  start {:.3} s  duration {:.3} s  mean position {:.3}",
            fixation.start_time, fixation.duration, fixation.mean_position
        );
    }

    if !config.stimuli.is_empty() {
        println!("Stimulus latencies:");
        for (stimulus, latency) in config.stimuli.iter().zip(&report.latencies) {
            if latency.is_nan() {
                println!("  stimulus {:.3} s: no saccade in time", stimulus);
            } else {
                println!("  stimulus {:.3} s: {:.3} s", stimulus, latency);
            }
        }
    }

    if !config.intrusion_intervals.is_empty() {
        println!("Intrusive saccades: {} total", report.intrusions.total);
        for (&(start, end), count) in config
            .intrusion_intervals
            .iter()
            .zip(&report.intrusions.per_interval)
        {
            println!("  [{:.3}, {:.3}] s: {}", start, end, count);
        }
    }

    if let Some(report_path) = &args.report {
        let yaml = serde_yaml::to_string(&report)?;
        std::fs::write(report_path, yaml)
            .with_context(|| format!("Failed to write report to {}", report_path))?;
        info!("Report written to: {}", report_path);
    }

    Ok(())
}

fn parse_interval(raw: &str) -> Result<(f64, f64)> {
    let (start, end) = raw
        .split_once(',')
        .with_context(|| format!("invalid interval '{}', expected START,END", raw))?;
    let start: f64 = start
        .trim()
        .parse()
        .with_context(|| format!("invalid interval start '{}'", start))?;
    let end: f64 = end
        .trim()
        .parse()
        .with_context(|| format!("invalid interval end '{}'", end))?;
    Ok((start, end))
}
