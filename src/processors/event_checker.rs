use tracing::info;

use crate::error::Result;
use crate::models::{
    ComparisonPolicy, EventKind, Hemisphere, IntensityRecord, MetricsTable, ObservationSeries,
    ThresholdProfile, WaveSeries,
};
use crate::processors::{
    CalendarNormalizer, ClassificationEvaluator, ColumnNames, MetricsAggregator, RunDetector,
    ThresholdProfileBuilder,
};
use crate::utils::constants::{DEFAULT_MIN_DURATION, DEFAULT_WINDOW_SIZE};

/// Options shared by every composite checker.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    pub columns: ColumnNames,
    pub window_size: usize,
    /// Percentile in `[0, 100]`; the event kind's default when unset.
    pub percentile: Option<f64>,
    pub min_duration: usize,
    /// Precomputed profile; skips threshold construction when set.
    pub profile: Option<ThresholdProfile>,
    /// Fill date gaps, drop Feb 29 and assign day-of-year before use.
    /// Disable when both series are already normalized.
    pub normalize: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            percentile: None,
            min_duration: DEFAULT_MIN_DURATION,
            profile: None,
            normalize: true,
        }
    }
}

impl CheckerConfig {
    pub fn with_columns(mut self, columns: ColumnNames) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_percentile(mut self, percentile: f64) -> Self {
        self.percentile = Some(percentile);
        self
    }

    pub fn with_min_duration(mut self, min_duration: usize) -> Self {
        self.min_duration = min_duration;
        self
    }

    pub fn with_profile(mut self, profile: ThresholdProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn percentile_for(&self, kind: EventKind) -> f64 {
        self.percentile.unwrap_or_else(|| kind.default_percentile())
    }
}

/// Outcome of one composite check.
#[derive(Debug, Clone)]
pub struct EventCheck {
    pub kind: EventKind,
    pub profile: ThresholdProfile,
    pub waves: WaveSeries,
}

impl EventCheck {
    pub fn metrics(&self) -> Result<MetricsTable> {
        yearly_metrics(self.kind, &self.waves)
    }

    pub fn season_metrics(&self, hemisphere: Hemisphere) -> Result<MetricsTable> {
        seasonal_metrics(self.kind, &self.waves, hemisphere)
    }

    pub fn intensity(&self, seasonal: bool) -> Vec<IntensityRecord> {
        MetricsAggregator::for_kind(self.kind).wave_intensity(&self.waves, seasonal)
    }
}

/// Yearly table through the aggregation matching the kind's policy.
pub fn yearly_metrics(kind: EventKind, waves: &WaveSeries) -> Result<MetricsTable> {
    let aggregator = MetricsAggregator::for_kind(kind);
    match kind.policy() {
        ComparisonPolicy::AboveRange => aggregator.range_metrics(waves),
        ComparisonPolicy::AboveDifference => aggregator.dif_metrics(waves),
        _ => aggregator.wave_metrics(waves),
    }
}

pub fn seasonal_metrics(kind: EventKind, waves: &WaveSeries, hemisphere: Hemisphere) -> Result<MetricsTable> {
    let aggregator = MetricsAggregator::for_kind(kind);
    match kind.policy() {
        ComparisonPolicy::AboveRange => aggregator.range_season_metrics(waves, hemisphere),
        ComparisonPolicy::AboveDifference => aggregator.dif_season_metrics(waves, hemisphere),
        _ => aggregator.wave_season_metrics(waves, hemisphere),
    }
}

/// Builds the threshold profile `kind` needs from `baseline`.
pub fn build_profile(
    kind: EventKind,
    baseline: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<ThresholdProfile> {
    let builder = ThresholdProfileBuilder::new(config.window_size, config.percentile_for(kind))?;
    let baseline = prepare(baseline, config)?;
    let columns = &config.columns;

    match kind.policy() {
        ComparisonPolicy::AboveWave | ComparisonPolicy::BelowWave => {
            builder.build_wave_profile(&baseline, &columns.max, &columns.min)
        }
        ComparisonPolicy::AboveRange => builder.build_range_profile(&baseline, &columns.max, &columns.min),
        ComparisonPolicy::AboveDifference => {
            builder.build_difference_profile(&baseline, columns.difference_column())
        }
    }
}

/// Classifies and labels `subject` against an existing profile.
pub fn evaluate_subject(
    kind: EventKind,
    profile: &ThresholdProfile,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<WaveSeries> {
    let detector = RunDetector::new(config.min_duration)?;
    let subject = prepare(subject, config)?;
    let classified = ClassificationEvaluator::new(profile, config.columns.clone())
        .evaluate(&subject, kind.policy())?;
    Ok(detector.get_wave(&classified))
}

/// Normalize, build or reuse thresholds, classify and detect runs.
pub fn check_event(
    kind: EventKind,
    baseline: &ObservationSeries,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<EventCheck> {
    let profile = match &config.profile {
        Some(profile) => profile.clone(),
        None => build_profile(kind, baseline, config)?,
    };
    let waves = evaluate_subject(kind, &profile, subject, config)?;

    info!(
        "{}: {} events in {} days ({} flagged)",
        kind,
        waves.events.len(),
        waves.days.len(),
        waves.days.iter().filter(|d| d.flagged).count()
    );
    Ok(EventCheck {
        kind,
        profile,
        waves,
    })
}

fn prepare(series: &ObservationSeries, config: &CheckerConfig) -> Result<ObservationSeries> {
    if config.normalize {
        CalendarNormalizer::normalize(series)
    } else if series.has_day_index() {
        Ok(series.clone())
    } else {
        Ok(CalendarNormalizer::date_to_day365(series))
    }
}

pub fn check_heat_wave(
    baseline: &ObservationSeries,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<EventCheck> {
    check_event(EventKind::HeatWave, baseline, subject, config)
}

pub fn check_cold_wave(
    baseline: &ObservationSeries,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<EventCheck> {
    check_event(EventKind::ColdWave, baseline, subject, config)
}

pub fn check_high_humidity_wave(
    baseline: &ObservationSeries,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<EventCheck> {
    check_event(EventKind::HighHumidityWave, baseline, subject, config)
}

pub fn check_low_humidity_wave(
    baseline: &ObservationSeries,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<EventCheck> {
    check_event(EventKind::LowHumidityWave, baseline, subject, config)
}

pub fn check_high_pressure_wave(
    baseline: &ObservationSeries,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<EventCheck> {
    check_event(EventKind::HighPressureWave, baseline, subject, config)
}

pub fn check_low_pressure_wave(
    baseline: &ObservationSeries,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<EventCheck> {
    check_event(EventKind::LowPressureWave, baseline, subject, config)
}

pub fn check_range_event(
    baseline: &ObservationSeries,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<EventCheck> {
    check_event(EventKind::RangeEvent, baseline, subject, config)
}

pub fn check_difference_event(
    baseline: &ObservationSeries,
    subject: &ObservationSeries,
    config: &CheckerConfig,
) -> Result<EventCheck> {
    check_event(EventKind::DifferenceEvent, baseline, subject, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use crate::models::{DayTable, ThresholdRole};
    use chrono::{Datelike, NaiveDate};

    /// Two flat baseline years, then a subject year with a hot spell in July.
    fn series_pair() -> (ObservationSeries, ObservationSeries) {
        let build = |year: i32, hot: bool| {
            let dates: Vec<NaiveDate> = NaiveDate::from_ymd_opt(year, 1, 1)
                .unwrap()
                .iter_days()
                .take_while(|d| d.year() == year)
                .collect();
            let max: Vec<f64> = dates
                .iter()
                .map(|d| if hot && d.month() == 7 && (10..=14).contains(&d.day()) { 38.0 } else { 25.0 })
                .collect();
            let min: Vec<f64> = max.iter().map(|v| v - 10.0).collect();
            ObservationSeries::new(dates)
                .with_values("TMAX", &max)
                .unwrap()
                .with_values("TMIN", &min)
                .unwrap()
        };

        let first = build(1991, false);
        let second = build(1992, false);
        let mut dates = first.dates().to_vec();
        dates.extend_from_slice(second.dates());
        let mut max = first.column("TMAX").unwrap().to_vec();
        max.extend_from_slice(second.column("TMAX").unwrap());
        let mut min = first.column("TMIN").unwrap().to_vec();
        min.extend_from_slice(second.column("TMIN").unwrap());
        let baseline = ObservationSeries::new(dates)
            .with_column("TMAX", max)
            .unwrap()
            .with_column("TMIN", min)
            .unwrap();

        (baseline, build(2020, true))
    }

    #[test]
    fn test_check_heat_wave_end_to_end() {
        let (baseline, subject) = series_pair();
        let check = check_heat_wave(&baseline, &subject, &CheckerConfig::default()).unwrap();

        // flat baseline: every day sits at its threshold, so all days qualify
        // under the inclusive rule and the whole year is one event
        assert_eq!(check.waves.events.len(), 1);
        assert_eq!(check.waves.days.len(), 365);
        assert_eq!(check.metrics().unwrap().rows[0].frequency, 365);
        let peak = check.intensity(false)[0].intensity.unwrap();
        assert!((peak - 13.0).abs() < 1e-9);
    }

    #[test]
    fn test_reuses_precomputed_profile() {
        let (baseline, subject) = series_pair();
        let profile = ThresholdProfile::new(90.0, 15)
            .with_table(ThresholdRole::Max, DayTable::new(vec![Some(30.0); 365]).unwrap())
            .with_table(ThresholdRole::Min, DayTable::new(vec![Some(20.0); 365]).unwrap());
        let config = CheckerConfig::default().with_profile(profile.clone());

        let check = check_heat_wave(&baseline, &subject, &config).unwrap();

        assert_eq!(check.profile, profile);
        assert_eq!(check.waves.events.len(), 1);
        assert_eq!(check.waves.events[0].duration, 5);
        assert_eq!(
            check.waves.events[0].start,
            NaiveDate::from_ymd_opt(2020, 7, 10).unwrap()
        );
    }

    #[test]
    fn test_cold_wave_uses_lower_percentile() {
        let (baseline, subject) = series_pair();
        let check = check_cold_wave(&baseline, &subject, &CheckerConfig::default()).unwrap();
        assert_eq!(check.profile.percentile, 10.0);
        // hot spell breaks the year-long run at the threshold
        assert_eq!(check.waves.events.len(), 2);
    }

    #[test]
    fn test_range_and_difference_checkers() {
        let (baseline, subject) = series_pair();
        let range = check_range_event(&baseline, &subject, &CheckerConfig::default()).unwrap();
        assert!(range.profile.has_roles(&[ThresholdRole::Range]));
        assert!(range.metrics().is_ok());

        let config = CheckerConfig::default().with_percentile(99.0);
        let difference = check_difference_event(&baseline, &subject, &config).unwrap();
        // only the two jumps into and out of the hot spell exceed a zero threshold
        let flagged: Vec<NaiveDate> = difference
            .waves
            .days
            .iter()
            .filter(|d| d.flagged && d.deviation.unwrap_or(0.0) > 0.0)
            .map(|d| d.date)
            .collect();
        assert_eq!(
            flagged,
            vec![
                NaiveDate::from_ymd_opt(2020, 7, 10).unwrap(),
                NaiveDate::from_ymd_opt(2020, 7, 15).unwrap()
            ]
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (baseline, subject) = series_pair();
        let even_window = CheckerConfig::default().with_window_size(10);
        assert!(matches!(
            check_high_humidity_wave(&baseline, &subject, &even_window),
            Err(ProcessingError::Configuration(_))
        ));

        let zero_duration = CheckerConfig::default().with_min_duration(0);
        assert!(matches!(
            check_low_pressure_wave(&baseline, &subject, &zero_duration),
            Err(ProcessingError::Configuration(_))
        ));
    }
}
