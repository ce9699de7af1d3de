use chrono::Datelike;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{
    ComparisonPolicy, EventKind, Hemisphere, IntensityRecord, MetricsRecord, MetricsTable,
    SeasonBucket, WaveSeries,
};

type GroupKey = (i32, Option<SeasonBucket>);

/// Turns labeled event series into yearly and seasonal tables.
///
/// Events are grouped by the year (and season) of their first day. Every
/// year present in the series gets a row, zeros included.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    prefix: String,
}

impl MetricsAggregator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn for_kind(kind: EventKind) -> Self {
        Self::new(kind.prefix())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn wave_metrics(&self, waves: &WaveSeries) -> Result<MetricsTable> {
        check_wave_policy(waves)?;
        Ok(self.aggregate(waves, None))
    }

    pub fn range_metrics(&self, waves: &WaveSeries) -> Result<MetricsTable> {
        check_policy(waves, ComparisonPolicy::AboveRange)?;
        Ok(self.aggregate(waves, None))
    }

    pub fn dif_metrics(&self, waves: &WaveSeries) -> Result<MetricsTable> {
        check_policy(waves, ComparisonPolicy::AboveDifference)?;
        Ok(self.aggregate(waves, None))
    }

    pub fn wave_season_metrics(&self, waves: &WaveSeries, hemisphere: Hemisphere) -> Result<MetricsTable> {
        check_wave_policy(waves)?;
        Ok(self.aggregate(waves, Some(hemisphere)))
    }

    pub fn range_season_metrics(&self, waves: &WaveSeries, hemisphere: Hemisphere) -> Result<MetricsTable> {
        check_policy(waves, ComparisonPolicy::AboveRange)?;
        Ok(self.aggregate(waves, Some(hemisphere)))
    }

    pub fn dif_season_metrics(&self, waves: &WaveSeries, hemisphere: Hemisphere) -> Result<MetricsTable> {
        check_policy(waves, ComparisonPolicy::AboveDifference)?;
        Ok(self.aggregate(waves, Some(hemisphere)))
    }

    /// Peak absolute deviation of every event, with its season bucket when
    /// `seasonal` is set.
    pub fn wave_intensity(&self, waves: &WaveSeries, seasonal: bool) -> Vec<IntensityRecord> {
        waves
            .events
            .iter()
            .map(|event| {
                let intensity = waves
                    .event_days_of(event)
                    .iter()
                    .filter_map(|day| day.deviation.map(f64::abs))
                    .fold(None, |peak: Option<f64>, v| Some(peak.map_or(v, |p| p.max(v))));

                IntensityRecord {
                    event_id: event.id,
                    year: event.year(),
                    season: seasonal.then(|| SeasonBucket::from_date(event.start)),
                    start: event.start,
                    end: event.end,
                    duration: event.duration,
                    intensity,
                }
            })
            .collect()
    }

    fn aggregate(&self, waves: &WaveSeries, hemisphere: Option<Hemisphere>) -> MetricsTable {
        let key_of = |date: chrono::NaiveDate| -> GroupKey {
            (date.year(), hemisphere.map(|_| SeasonBucket::from_date(date)))
        };

        let mut groups: BTreeMap<GroupKey, MetricsRecord> = waves
            .days
            .iter()
            .map(|day| key_of(day.date))
            .map(|(year, season)| ((year, season), MetricsRecord::empty(year, season)))
            .collect();

        for day in waves.days.iter().filter(|d| d.flagged) {
            if let Some(record) = groups.get_mut(&key_of(day.date)) {
                record.extreme_days += 1;
            }
        }

        for event in &waves.events {
            let (year, season) = key_of(event.start);
            let record = groups
                .entry((year, season))
                .or_insert_with(|| MetricsRecord::empty(year, season));
            record.count += 1;
            record.max_duration = record.max_duration.max(event.duration);
            record.frequency += event.duration;
        }

        let table = MetricsTable {
            prefix: self.prefix.clone(),
            hemisphere,
            rows: groups.into_values().collect(),
        };
        debug!(
            "{} metrics: {} rows, {} events",
            self.prefix,
            table.rows.len(),
            table.total_events()
        );
        table
    }
}

fn check_wave_policy(waves: &WaveSeries) -> Result<()> {
    if waves.policy.is_wave() {
        Ok(())
    } else {
        Err(ProcessingError::configuration(format!(
            "wave metrics need a wave classification, got {:?}",
            waves.policy
        )))
    }
}

fn check_policy(waves: &WaveSeries, expected: ComparisonPolicy) -> Result<()> {
    if waves.policy == expected {
        Ok(())
    } else {
        Err(ProcessingError::configuration(format!(
            "expected a {:?} classification, got {:?}",
            expected, waves.policy
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassifiedDay, ClassifiedSeries, DayIndex, MetricColumn};
    use crate::processors::RunDetector;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn waves_from(start: NaiveDate, flags: &[bool], policy: ComparisonPolicy) -> WaveSeries {
        let days = start
            .iter_days()
            .zip(flags)
            .map(|(date, &flagged)| ClassifiedDay {
                date,
                day_index: DayIndex::from_date(date),
                flagged,
                deviation: Some(if flagged { 1.0 } else { -0.5 }),
            })
            .collect();
        RunDetector::default().get_wave(&ClassifiedSeries { policy, days })
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_zero_events_give_zero_metrics() {
        let waves = waves_from(date(2020, 6, 1), &[false; 40], ComparisonPolicy::AboveWave);
        let table = MetricsAggregator::for_kind(EventKind::HeatWave)
            .wave_metrics(&waves)
            .unwrap();

        assert_eq!(table.rows, vec![MetricsRecord::empty(2020, None)]);
        assert_eq!(table.total_events(), 0);
    }

    #[test]
    fn test_yearly_metrics() {
        let mut flags = vec![false; 20];
        flags[2..5].fill(true); // 3-day event
        flags[8..13].fill(true); // 5-day event
        flags[15] = true; // lone day
        let waves = waves_from(date(2021, 7, 1), &flags, ComparisonPolicy::AboveWave);

        let table = MetricsAggregator::new("HW").wave_metrics(&waves).unwrap();
        let row = table.row(2021, None).unwrap();

        assert_eq!(row.count, 2);
        assert_eq!(row.max_duration, 5);
        assert_eq!(row.frequency, 8);
        assert_eq!(row.extreme_days, 9);
        assert_eq!(row.value(MetricColumn::Frequency), 8.0);
    }

    #[test]
    fn test_event_crossing_year_counts_in_start_year() {
        let waves = waves_from(date(2020, 12, 30), &[true; 5], ComparisonPolicy::AboveWave);
        let table = MetricsAggregator::new("HW").wave_metrics(&waves).unwrap();

        let y2020 = table.row(2020, None).unwrap();
        let y2021 = table.row(2021, None).unwrap();
        assert_eq!((y2020.count, y2020.frequency), (1, 5));
        assert_eq!((y2021.count, y2021.frequency), (0, 0));
        assert_eq!(y2021.extreme_days, 3);
    }

    #[test]
    fn test_seasonal_metrics() {
        // Feb 24 .. Mar 5: one event in DJF, one in MAM
        let flags = [
            true, true, true, false, false, true, true, true, false, false,
        ];
        let waves = waves_from(date(2021, 2, 24), &flags, ComparisonPolicy::BelowWave);

        let table = MetricsAggregator::new("CW")
            .wave_season_metrics(&waves, Hemisphere::Southern)
            .unwrap();

        assert!(table.is_seasonal());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.row(2021, Some(SeasonBucket::Djf)).unwrap().count, 1);
        assert_eq!(table.row(2021, Some(SeasonBucket::Mam)).unwrap().count, 1);
        let djf = table.row(2021, Some(SeasonBucket::Djf)).unwrap();
        assert_eq!(table.season_name(djf), Some(crate::models::Season::Summer));
    }

    #[test]
    fn test_policy_mismatch() {
        let waves = waves_from(date(2021, 1, 1), &[true; 3], ComparisonPolicy::AboveRange);
        let aggregator = MetricsAggregator::new("RE");

        assert!(matches!(
            aggregator.wave_metrics(&waves),
            Err(ProcessingError::Configuration(_))
        ));
        assert!(aggregator.dif_metrics(&waves).is_err());
        assert_eq!(aggregator.range_metrics(&waves).unwrap().total_events(), 1);
        assert!(aggregator
            .range_season_metrics(&waves, Hemisphere::Northern)
            .is_ok());
    }

    #[test]
    fn test_intensity_is_peak_not_mean() {
        let mut waves = waves_from(date(2021, 1, 1), &[false, false, false, false, true, true, true], ComparisonPolicy::AboveWave);
        for (day, deviation) in waves.days[4..].iter_mut().zip([1.2, 2.5, 0.8]) {
            day.deviation = Some(deviation);
        }

        let records = MetricsAggregator::new("HW").wave_intensity(&waves, true);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].intensity, Some(2.5));
        assert_eq!(records[0].duration, 3);
        assert_eq!(records[0].season, Some(SeasonBucket::Djf));
        assert!(MetricsAggregator::new("HW").wave_intensity(&waves, false)[0]
            .season
            .is_none());
    }
}
