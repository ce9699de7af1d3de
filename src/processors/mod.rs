pub mod calendar_normalizer;
pub mod classifier;
pub mod event_checker;
pub mod integrity_checker;
pub mod metrics_aggregator;
pub mod parallel_processor;
pub mod run_detector;
pub mod threshold_builder;

pub use calendar_normalizer::CalendarNormalizer;
pub use classifier::{ClassificationEvaluator, ColumnNames};
pub use event_checker::{
    build_profile, check_cold_wave, check_difference_event, check_event, check_heat_wave,
    check_high_humidity_wave, check_high_pressure_wave, check_low_humidity_wave,
    check_low_pressure_wave, check_range_event, evaluate_subject, seasonal_metrics,
    yearly_metrics, CheckerConfig, EventCheck,
};
pub use integrity_checker::{IntegrityChecker, IntegrityReport, SeriesViolation, ViolationType};
pub use metrics_aggregator::MetricsAggregator;
pub use parallel_processor::{ParallelProcessor, StationOutcome};
pub use run_detector::RunDetector;
pub use threshold_builder::{get_percentile, ThresholdProfileBuilder};
