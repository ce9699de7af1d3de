use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{
    is_next_day, ClassifiedDay, ClassifiedSeries, ComparisonPolicy, DayIndex, ObservationSeries,
    ThresholdProfile, ThresholdRole,
};

/// Names of the subject columns the evaluators read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNames {
    pub max: String,
    pub min: String,
    /// Variable for day-over-day differences; falls back to `max`.
    pub difference: Option<String>,
}

impl ColumnNames {
    pub fn new(max: impl Into<String>, min: impl Into<String>) -> Self {
        Self {
            max: max.into(),
            min: min.into(),
            difference: None,
        }
    }

    pub fn with_difference(mut self, column: impl Into<String>) -> Self {
        self.difference = Some(column.into());
        self
    }

    pub fn difference_column(&self) -> &str {
        self.difference.as_deref().unwrap_or(&self.max)
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self::new("TMAX", "TMIN")
    }
}

/// Compares a subject series with day-matched thresholds.
///
/// Days with a missing observation, a missing day-of-year or an undefined
/// threshold are never flagged and carry no deviation.
pub struct ClassificationEvaluator<'a> {
    profile: &'a ThresholdProfile,
    columns: ColumnNames,
}

impl<'a> ClassificationEvaluator<'a> {
    pub fn new(profile: &'a ThresholdProfile, columns: ColumnNames) -> Self {
        Self { profile, columns }
    }

    pub fn columns(&self) -> &ColumnNames {
        &self.columns
    }

    pub fn evaluate(&self, subject: &ObservationSeries, policy: ComparisonPolicy) -> Result<ClassifiedSeries> {
        match policy {
            ComparisonPolicy::AboveWave => self.get_above_pct_wave(subject),
            ComparisonPolicy::BelowWave => self.get_below_pct_wave(subject),
            ComparisonPolicy::AboveRange => self.get_above_pct_range(subject),
            ComparisonPolicy::AboveDifference => self.get_above_pct_dif(subject),
        }
    }

    /// Flags days where max and min are both at or above their thresholds.
    /// Deviation tracks the daily maximum.
    pub fn get_above_pct_wave(&self, subject: &ObservationSeries) -> Result<ClassifiedSeries> {
        self.wave(subject, ComparisonPolicy::AboveWave)
    }

    /// Flags days where max and min are both at or below their thresholds.
    /// Deviation tracks the daily minimum.
    pub fn get_below_pct_wave(&self, subject: &ObservationSeries) -> Result<ClassifiedSeries> {
        self.wave(subject, ComparisonPolicy::BelowWave)
    }

    /// Flags days whose diurnal range is at or above the range threshold.
    pub fn get_above_pct_range(&self, subject: &ObservationSeries) -> Result<ClassifiedSeries> {
        let range_table = self.profile.require(ThresholdRole::Range)?;
        let max = subject.column(&self.columns.max)?;
        let min = subject.column(&self.columns.min)?;
        let days = day_slots(subject);

        let classified = (0..subject.len())
            .map(|row| {
                let range = max[row].zip(min[row]).map(|(hi, lo)| hi - lo);
                let threshold = days[row].and_then(|d| range_table.get(d));
                let deviation = range.zip(threshold).map(|(r, t)| r - t);
                classified_day(subject, &days, row, deviation.map_or(false, |d| d >= 0.0), deviation)
            })
            .collect();

        Ok(self.finish(ComparisonPolicy::AboveRange, classified))
    }

    /// Flags days whose absolute change from the previous day is at or above
    /// the difference threshold. The first row, and any row not preceded by
    /// its calendar predecessor, is never flagged.
    pub fn get_above_pct_dif(&self, subject: &ObservationSeries) -> Result<ClassifiedSeries> {
        let table = self.profile.require(ThresholdRole::Difference)?;
        let values = subject.column(self.columns.difference_column())?;
        let dates = subject.dates();
        let days = day_slots(subject);

        let classified = (0..subject.len())
            .map(|row| {
                let change = if row > 0 && is_next_day(dates[row - 1], dates[row]) {
                    values[row - 1].zip(values[row]).map(|(prev, curr)| (curr - prev).abs())
                } else {
                    None
                };
                let threshold = days[row].and_then(|d| table.get(d));
                let deviation = change.zip(threshold).map(|(c, t)| c - t);
                classified_day(subject, &days, row, deviation.map_or(false, |d| d >= 0.0), deviation)
            })
            .collect();

        Ok(self.finish(ComparisonPolicy::AboveDifference, classified))
    }

    fn wave(&self, subject: &ObservationSeries, policy: ComparisonPolicy) -> Result<ClassifiedSeries> {
        let max_table = self.profile.require(ThresholdRole::Max)?;
        let min_table = self.profile.require(ThresholdRole::Min)?;
        let max = subject.column(&self.columns.max)?;
        let min = subject.column(&self.columns.min)?;
        let days = day_slots(subject);
        let above = policy == ComparisonPolicy::AboveWave;

        let classified = (0..subject.len())
            .map(|row| {
                let max_gap = days[row]
                    .and_then(|d| max_table.get(d))
                    .zip(max[row])
                    .map(|(t, v)| v - t);
                let min_gap = days[row]
                    .and_then(|d| min_table.get(d))
                    .zip(min[row])
                    .map(|(t, v)| v - t);

                let flagged = match (max_gap, min_gap) {
                    (Some(hi), Some(lo)) if above => hi >= 0.0 && lo >= 0.0,
                    (Some(hi), Some(lo)) => hi <= 0.0 && lo <= 0.0,
                    _ => false,
                };
                let deviation = if above { max_gap } else { min_gap };
                classified_day(subject, &days, row, flagged, deviation)
            })
            .collect();

        Ok(self.finish(policy, classified))
    }

    fn finish(&self, policy: ComparisonPolicy, days: Vec<ClassifiedDay>) -> ClassifiedSeries {
        let series = ClassifiedSeries { policy, days };
        debug!(
            "{:?}: {} of {} days flagged",
            policy,
            series.flagged_count(),
            series.len()
        );
        series
    }
}

/// Day-of-year per row, from the series column when present or the dates.
fn day_slots(subject: &ObservationSeries) -> Vec<Option<DayIndex>> {
    match subject.day_index() {
        Some(days) => days.to_vec(),
        None => subject.dates().iter().map(|d| DayIndex::from_date(*d)).collect(),
    }
}

fn classified_day(
    subject: &ObservationSeries,
    days: &[Option<DayIndex>],
    row: usize,
    flagged: bool,
    deviation: Option<f64>,
) -> ClassifiedDay {
    ClassifiedDay {
        date: subject.dates()[row],
        day_index: days[row],
        flagged,
        deviation,
    }
}
