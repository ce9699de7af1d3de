use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::{EventKind, Hemisphere};

#[derive(Parser)]
#[command(name = "climate-extremes")]
#[command(about = "Percentile-based extreme climate event detection for daily station series")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase log verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Hide progress output")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Settings file (TOML, JSON or YAML)")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a day-of-year threshold profile from a baseline series
    Thresholds {
        #[arg(short, long, help = "Baseline CSV")]
        baseline: PathBuf,

        #[arg(short, long, help = "Output profile (JSON)")]
        output: PathBuf,

        #[arg(long, help = "Also write the profile as a CSV table")]
        csv: Option<PathBuf>,

        #[command(flatten)]
        detection: DetectionArgs,
    },

    /// Detect events in one subject series
    Detect {
        #[arg(short, long, help = "Subject CSV")]
        subject: PathBuf,

        #[command(flatten)]
        source: ThresholdSource,

        #[command(flatten)]
        detection: DetectionArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[arg(long, help = "Print a text chart of yearly event counts")]
        chart: bool,

        #[arg(long, help = "Also write the per-day classification table")]
        classified: bool,
    },

    /// Detect events for every subject CSV in a directory
    Batch {
        #[arg(short, long, help = "Directory of subject CSVs, one per station")]
        input_dir: PathBuf,

        #[arg(long, help = "Station metadata CSV (station_id,name,latitude,longitude)")]
        stations: Option<PathBuf>,

        #[command(flatten)]
        source: ThresholdSource,

        #[command(flatten)]
        detection: DetectionArgs,

        #[command(flatten)]
        output: OutputArgs,

        #[arg(long)]
        max_workers: Option<usize>,
    },

    /// Report gaps, leap days and inconsistent values in a series
    Validate {
        #[arg(short, long, help = "Series CSV")]
        input: PathBuf,

        #[arg(long, default_value_t = crate::utils::constants::DEFAULT_JUMP_THRESHOLD)]
        jump_threshold: f64,

        #[command(flatten)]
        detection: DetectionArgs,
    },
}

/// Where thresholds come from: a baseline to build them, or a saved profile.
#[derive(Args, Debug, Clone)]
pub struct ThresholdSource {
    #[arg(short, long, help = "Baseline CSV used to build thresholds")]
    pub baseline: Option<PathBuf>,

    #[arg(short, long, conflicts_with = "baseline", help = "Saved profile (JSON)")]
    pub profile: Option<PathBuf>,
}

/// Detection options. Unset flags fall back to the settings file, then defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct DetectionArgs {
    #[arg(short, long, help = "Event kind, e.g. heat-wave, cold-wave, range-event, HW")]
    pub kind: Option<EventKind>,

    #[arg(long)]
    pub max_column: Option<String>,

    #[arg(long)]
    pub min_column: Option<String>,

    #[arg(long, help = "Column for difference events [default: max column]")]
    pub difference_column: Option<String>,

    #[arg(long)]
    pub date_column: Option<String>,

    #[arg(short, long, help = "Odd day-of-year window width")]
    pub window: Option<usize>,

    #[arg(long, help = "Percentile in [0, 100]")]
    pub percentile: Option<f64>,

    #[arg(long)]
    pub min_duration: Option<usize>,

    #[arg(long, help = "northern or southern; inferred from station latitude in batch mode")]
    pub hemisphere: Option<Hemisphere>,

    #[arg(long, help = "Inputs are already gap-free, without Feb 29")]
    pub no_normalize: bool,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    #[arg(short, long)]
    pub compression: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detect() {
        let cli = Cli::try_parse_from([
            "climate-extremes",
            "-vv",
            "detect",
            "--subject",
            "s.csv",
            "--profile",
            "p.json",
            "--kind",
            "CW",
            "--hemisphere",
            "southern",
            "--format",
            "parquet",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Detect {
                source, detection, output, ..
            } => {
                assert_eq!(source.profile, Some(PathBuf::from("p.json")));
                assert_eq!(detection.kind, Some(EventKind::ColdWave));
                assert_eq!(detection.hemisphere, Some(Hemisphere::Southern));
                assert_eq!(output.format, Some(OutputFormat::Parquet));
            }
            _ => panic!("expected detect"),
        }
    }

    #[test]
    fn test_baseline_conflicts_with_profile() {
        let result = Cli::try_parse_from([
            "climate-extremes",
            "detect",
            "-s",
            "s.csv",
            "-b",
            "b.csv",
            "-p",
            "p.json",
        ]);
        assert!(result.is_err());
    }
}
