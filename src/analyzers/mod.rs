pub mod biometeo;
pub mod event_analyzer;

pub use biometeo::{append_heat_index, Exposure, Moisture};
pub use event_analyzer::{EventAnalyzer, EventStatistics};
