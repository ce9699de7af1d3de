pub mod day_index;
pub mod event;
pub mod kind;
pub mod metrics;
pub mod season;
pub mod series;
pub mod station;
pub mod threshold;

pub use day_index::DayIndex;
pub use event::{ClassifiedDay, ClassifiedSeries, EventInstance, WaveSeries};
pub use kind::{ComparisonPolicy, EventKind};
pub use metrics::{IntensityRecord, MetricColumn, MetricsRecord, MetricsTable};
pub use season::{Hemisphere, Season, SeasonBucket};
pub use series::{is_next_day, ObservationSeries};
pub use station::{StationMetadata, StationSeries};
pub use threshold::{DayTable, ThresholdProfile, ThresholdRole};
