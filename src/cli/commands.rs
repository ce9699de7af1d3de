use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analyzers::EventAnalyzer;
use crate::cli::args::{Cli, Commands, OutputFormat, ThresholdSource};
use crate::cli::settings::DetectionSettings;
use crate::error::{ProcessingError, Result};
use crate::models::{
    EventKind, IntensityRecord, MetricColumn, MetricsTable, ObservationSeries, StationMetadata,
    StationSeries, ThresholdProfile, WaveSeries,
};
use crate::processors::{
    build_profile, evaluate_subject, EventCheck, IntegrityChecker, ParallelProcessor,
};
use crate::readers::{ProfileReader, SeriesReader, StationReader};
use crate::renderers::{MetricsRenderer, PlotRequest, TextChartRenderer};
use crate::utils::filename::{output_filename, station_id_from_path};
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvWriter, ParquetWriter};

pub fn run(cli: Cli) -> Result<()> {
    let settings = DetectionSettings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Thresholds {
            baseline,
            output,
            csv,
            detection,
        } => {
            let settings = settings.apply_detection(&detection).validated()?;
            let kind = settings.kind;
            println!("Building {} thresholds from {}", kind, baseline.display());

            let progress = ProgressReporter::new_spinner("Computing day-of-year percentiles...", cli.quiet);
            let series = read_series(&baseline, &settings)?;
            let profile = build_profile(kind, &series, &settings.checker_config())?;
            progress.finish_with_message("Thresholds computed");

            create_parent(&output)?;
            let writer = CsvWriter::new();
            writer.write_profile_json(&profile, &output)?;
            if let Some(csv) = csv {
                create_parent(&csv)?;
                writer.write_profile(&profile, &csv)?;
            }

            println!("\n{}", coverage_summary(&profile));
            println!("Profile written to {}", output.display());
        }

        Commands::Detect {
            subject,
            source,
            detection,
            output,
            chart,
            classified,
        } => {
            let settings = settings
                .apply_detection(&detection)
                .apply_output(&output)
                .validated()?;
            let kind = settings.kind;
            let config = settings.checker_config();
            println!("Detecting {} in {}", kind, subject.display());

            let profile = load_profile(&source, kind, &settings)?;
            let series = read_series(&subject, &settings)?;

            let waves = evaluate_subject(kind, &profile, &series, &config)?;
            let check = EventCheck {
                kind,
                profile,
                waves,
            };
            let metrics = check.metrics()?;
            let season_metrics = match settings.hemisphere {
                Some(hemisphere) => Some(check.season_metrics(hemisphere)?),
                None => {
                    info!("No hemisphere configured; skipping seasonal metrics");
                    None
                }
            };
            let intensity = check.intensity(settings.hemisphere.is_some());

            let output_dir = &output.output_dir;
            fs::create_dir_all(output_dir)?;
            let outputs = TableOutputs::new(&settings)?;
            outputs.write_all(output_dir, kind, None, &metrics, season_metrics.as_ref(), &intensity)?;
            if classified {
                outputs.write_classified(output_dir, kind, None, &check.waves)?;
            }

            let stats = EventAnalyzer::new().with_kind(kind).analyze(&check.waves)?;
            println!("\n{}", stats.detailed_summary());

            if chart {
                let request = PlotRequest::new(&metrics, MetricColumn::Count)
                    .with_title(format!("{} per year", MetricColumn::Count.header(&metrics.prefix)));
                println!("\n{}", TextChartRenderer::new().render(&request)?);
            }
        }

        Commands::Batch {
            input_dir,
            stations,
            source,
            detection,
            output,
            max_workers,
        } => {
            let settings = settings
                .apply_detection(&detection)
                .apply_output(&output)
                .with_max_workers(max_workers)
                .validated()?;
            let kind = settings.kind;
            let config = settings.checker_config();

            let profile = load_profile(&source, kind, &settings)?;
            let metadata = match &stations {
                Some(path) => StationReader::with_skip_invalid(true).read_stations_map(path)?,
                None => HashMap::new(),
            };

            let files = subject_files(&input_dir)?;
            if files.is_empty() {
                println!("No CSV files found in {}", input_dir.display());
                return Ok(());
            }
            println!(
                "Detecting {} in {} stations with {} workers",
                kind,
                files.len(),
                settings.max_workers
            );

            let mut subjects = Vec::with_capacity(files.len());
            for path in &files {
                let Some(station_id) = station_id_from_path(path) else {
                    warn!("Skipping {}: no station id in file name", path.display());
                    continue;
                };
                let station = metadata
                    .get(&station_id)
                    .cloned()
                    .unwrap_or_else(|| StationMetadata::new(station_id.clone(), station_id.clone()));
                subjects.push(StationSeries {
                    station,
                    series: read_series(path, &settings)?,
                });
            }

            let progress = ProgressReporter::new(subjects.len() as u64, "Evaluating stations...", cli.quiet);
            let outcomes = ParallelProcessor::new(settings.max_workers)
                .with_hemisphere(settings.hemisphere)
                .evaluate_stations(kind, &profile, &subjects, &config, Some(&progress))?;

            let output_dir = &output.output_dir;
            fs::create_dir_all(output_dir)?;
            let outputs = TableOutputs::new(&settings)?;
            for outcome in &outcomes {
                outputs.write_all(
                    output_dir,
                    kind,
                    Some(&outcome.station.station_id),
                    &outcome.metrics,
                    outcome.season_metrics.as_ref(),
                    &outcome.intensity,
                )?;
                println!(
                    "{:<12} {:>4} events, {:>5} event days",
                    outcome.station.station_id,
                    outcome.waves.events.len(),
                    outcome.waves.event_days()
                );
            }
            println!("\nBatch complete: {} stations written to {}", outcomes.len(), output_dir.display());
        }

        Commands::Validate {
            input,
            jump_threshold,
            detection,
        } => {
            let settings = settings.apply_detection(&detection).validated()?;
            println!("Validating {}", input.display());

            let series = read_series(&input, &settings)?;
            let checker = IntegrityChecker::new()
                .with_extremes(&settings.max_column, &settings.min_column)
                .with_jump_threshold(jump_threshold);
            let report = checker.check_integrity(&series);

            println!("\n{}", checker.generate_summary(&report));
            if report.violations.is_empty() {
                println!("✅ All data passed validation checks");
            } else {
                println!("⚠️  Found {} validation issues", report.violations.len());
                if !report.is_normalized() {
                    println!("Calendar issues are repaired automatically unless --no-normalize is set");
                }
            }
        }
    }

    Ok(())
}

fn read_series(path: &Path, settings: &DetectionSettings) -> Result<ObservationSeries> {
    let reader = match &settings.date_column {
        Some(column) => SeriesReader::new().with_date_column(column),
        None => SeriesReader::new(),
    };
    reader.read_series(path)
}

fn load_profile(source: &ThresholdSource, kind: EventKind, settings: &DetectionSettings) -> Result<ThresholdProfile> {
    match (&source.profile, &source.baseline) {
        (Some(path), _) => {
            let profile = ProfileReader::read_profile_with_roles(path, kind.policy().threshold_roles())?;
            info!("Reusing profile {}", path.display());
            Ok(profile)
        }
        (None, Some(path)) => {
            let baseline = read_series(path, settings)?;
            build_profile(kind, &baseline, &settings.checker_config())
        }
        (None, None) => Err(ProcessingError::configuration(
            "either --baseline or --profile is required",
        )),
    }
}

fn subject_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn coverage_summary(profile: &ThresholdProfile) -> String {
    let mut summary = format!(
        "Threshold profile (window {} days, P{})\n",
        profile.window_size, profile.percentile
    );
    for role in profile.roles() {
        let Some(table) = profile.table(role) else {
            continue;
        };
        summary.push_str(&format!("  {}: {}/365 days defined", role, table.defined_count()));

        let undefined = table.undefined_slots();
        if !undefined.is_empty() {
            let shown: Vec<String> = undefined.iter().take(10).map(|d| d.to_string()).collect();
            let more = if undefined.len() > 10 { ", ..." } else { "" };
            summary.push_str(&format!(" (undefined: {}{})", shown.join(", "), more));
        }
        summary.push('\n');
    }
    summary
}

/// Writes result tables in the configured format.
enum TableOutputs {
    Csv(CsvWriter),
    Parquet(ParquetWriter),
}

impl TableOutputs {
    fn new(settings: &DetectionSettings) -> Result<Self> {
        Ok(match settings.format {
            OutputFormat::Csv => TableOutputs::Csv(CsvWriter::new()),
            OutputFormat::Parquet => {
                TableOutputs::Parquet(ParquetWriter::new().with_compression(&settings.compression)?)
            }
        })
    }

    fn extension(&self) -> &'static str {
        match self {
            TableOutputs::Csv(_) => OutputFormat::Csv.extension(),
            TableOutputs::Parquet(_) => OutputFormat::Parquet.extension(),
        }
    }

    fn path(&self, dir: &Path, kind: EventKind, station: Option<&String>, table: &str) -> PathBuf {
        let table = match station {
            Some(station) => format!("{}-{}", station, table),
            None => table.to_string(),
        };
        output_filename(dir, kind, &table, self.extension())
    }

    fn write_metrics(&self, table: &MetricsTable, path: &Path) -> Result<()> {
        match self {
            TableOutputs::Csv(w) => w.write_metrics(table, path),
            TableOutputs::Parquet(w) => w.write_metrics(table, path),
        }
    }

    fn write_all(
        &self,
        dir: &Path,
        kind: EventKind,
        station: Option<&String>,
        metrics: &MetricsTable,
        season_metrics: Option<&MetricsTable>,
        intensity: &[IntensityRecord],
    ) -> Result<()> {
        let yearly = self.path(dir, kind, station, "yearly");
        self.write_metrics(metrics, &yearly)?;
        println!("Yearly metrics: {}", yearly.display());

        if let Some(seasonal) = season_metrics {
            let path = self.path(dir, kind, station, "seasonal");
            self.write_metrics(seasonal, &path)?;
            println!("Seasonal metrics: {}", path.display());
        }

        let path = self.path(dir, kind, station, "intensity");
        match self {
            TableOutputs::Csv(w) => w.write_intensity(intensity, &path)?,
            TableOutputs::Parquet(w) => w.write_intensity(intensity, &path)?,
        }
        println!("Event intensities: {}", path.display());
        Ok(())
    }

    fn write_classified(&self, dir: &Path, kind: EventKind, station: Option<&String>, waves: &WaveSeries) -> Result<()> {
        let path = self.path(dir, kind, station, "classified");
        match self {
            TableOutputs::Csv(w) => w.write_classified(waves, &path)?,
            TableOutputs::Parquet(w) => w.write_classified(waves, &path)?,
        }
        println!("Classified days: {}", path.display());
        Ok(())
    }
}
