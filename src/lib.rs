pub mod analyzers;
pub mod cli;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod renderers;
pub mod utils;
pub mod writers;

pub use error::{ProcessingError, Result};
pub use models::{
    ClassifiedSeries, EventKind, Hemisphere, MetricsTable, ObservationSeries, ThresholdProfile,
    WaveSeries,
};
pub use processors::{CheckerConfig, EventCheck};
