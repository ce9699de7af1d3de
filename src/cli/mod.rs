pub mod args;
pub mod commands;
pub mod settings;

pub use args::{Cli, Commands, DetectionArgs, OutputArgs, OutputFormat, ThresholdSource};
pub use commands::run;
pub use settings::DetectionSettings;
