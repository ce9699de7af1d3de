pub mod constants;
pub mod filename;
pub mod logging;
pub mod progress;
pub mod stats;

pub use constants::*;
pub use filename::{output_filename, station_id_from_path};
pub use progress::ProgressReporter;
pub use stats::{percentile, quantile_type7};
