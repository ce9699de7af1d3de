use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::cli::args::{DetectionArgs, OutputArgs, OutputFormat};
use crate::error::Result;
use crate::models::{EventKind, Hemisphere};
use crate::processors::{CheckerConfig, ColumnNames};
use crate::utils::constants::{COMPRESSION_SNAPPY, DEFAULT_MIN_DURATION, DEFAULT_WINDOW_SIZE};

pub const ENV_PREFIX: &str = "CLIMATE_EXTREMES";

/// Detection settings after merging defaults, settings file, environment
/// and command-line flags, in that order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DetectionSettings {
    pub kind: EventKind,

    #[validate(length(min = 1))]
    pub max_column: String,

    #[validate(length(min = 1))]
    pub min_column: String,

    pub difference_column: Option<String>,

    pub date_column: Option<String>,

    #[validate(range(min = 1, max = 365))]
    pub window_size: usize,

    #[validate(range(min = 0.0, max = 100.0))]
    pub percentile: Option<f64>,

    #[validate(range(min = 1))]
    pub min_duration: usize,

    pub hemisphere: Option<Hemisphere>,

    pub normalize: bool,

    pub format: OutputFormat,

    pub compression: String,

    #[validate(range(min = 1))]
    pub max_workers: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            kind: EventKind::HeatWave,
            max_column: "TMAX".to_string(),
            min_column: "TMIN".to_string(),
            difference_column: None,
            date_column: None,
            window_size: DEFAULT_WINDOW_SIZE,
            percentile: None,
            min_duration: DEFAULT_MIN_DURATION,
            hemisphere: None,
            normalize: true,
            format: OutputFormat::Csv,
            compression: COMPRESSION_SNAPPY.to_string(),
            max_workers: num_cpus::get(),
        }
    }
}

impl DetectionSettings {
    /// Defaults, then the optional settings file, then `CLIMATE_EXTREMES_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn apply_detection(mut self, args: &DetectionArgs) -> Self {
        if let Some(kind) = args.kind {
            self.kind = kind;
        }
        if let Some(column) = &args.max_column {
            self.max_column = column.clone();
        }
        if let Some(column) = &args.min_column {
            self.min_column = column.clone();
        }
        if args.difference_column.is_some() {
            self.difference_column = args.difference_column.clone();
        }
        if args.date_column.is_some() {
            self.date_column = args.date_column.clone();
        }
        if let Some(window) = args.window {
            self.window_size = window;
        }
        if args.percentile.is_some() {
            self.percentile = args.percentile;
        }
        if let Some(min_duration) = args.min_duration {
            self.min_duration = min_duration;
        }
        if args.hemisphere.is_some() {
            self.hemisphere = args.hemisphere;
        }
        if args.no_normalize {
            self.normalize = false;
        }
        self
    }

    pub fn apply_output(mut self, args: &OutputArgs) -> Self {
        if let Some(format) = args.format {
            self.format = format;
        }
        if let Some(compression) = &args.compression {
            self.compression = compression.clone();
        }
        self
    }

    pub fn with_max_workers(mut self, max_workers: Option<usize>) -> Self {
        if let Some(workers) = max_workers {
            self.max_workers = workers;
        }
        self
    }

    /// Range checks only; window parity is left to the threshold builder.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn columns(&self) -> ColumnNames {
        let columns = ColumnNames::new(&self.max_column, &self.min_column);
        match &self.difference_column {
            Some(column) => columns.with_difference(column),
            None => columns,
        }
    }

    pub fn checker_config(&self) -> CheckerConfig {
        let config = CheckerConfig::default()
            .with_columns(self.columns())
            .with_window_size(self.window_size)
            .with_min_duration(self.min_duration)
            .with_normalize(self.normalize);
        match self.percentile {
            Some(percentile) => config.with_percentile(percentile),
            None => config,
        }
    }
}
