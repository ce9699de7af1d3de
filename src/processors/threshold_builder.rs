use tracing::{debug, warn};

use crate::error::{ProcessingError, Result};
use crate::models::{DayIndex, DayTable, ObservationSeries, ThresholdProfile, ThresholdRole};
use crate::utils::constants::{
    DAYS_PER_YEAR, DEFAULT_UPPER_PERCENTILE, DEFAULT_WINDOW_SIZE, DIFFERENCE_COLUMN, RANGE_COLUMN,
};
use crate::utils::stats;

/// Builds day-of-year percentile thresholds from a climatological baseline.
///
/// Every slot `d` collects the baseline values whose day-of-year falls within
/// `window_size / 2` slots of `d`, wrapping across the 365/1 boundary.
#[derive(Debug, Clone)]
pub struct ThresholdProfileBuilder {
    window_size: usize,
    percentile: f64,
}

impl Default for ThresholdProfileBuilder {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            percentile: DEFAULT_UPPER_PERCENTILE,
        }
    }
}

impl ThresholdProfileBuilder {
    pub fn new(window_size: usize, percentile: f64) -> Result<Self> {
        validate_window(window_size)?;
        validate_percentile(percentile)?;
        Ok(Self {
            window_size,
            percentile,
        })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    fn half_width(&self) -> i64 {
        (self.window_size / 2) as i64
    }

    /// Slots covered by the window centred on `center`, in calendar order.
    pub fn window_slots(&self, center: DayIndex) -> Vec<DayIndex> {
        let half = self.half_width();
        (-half..=half).map(|offset| center.shifted(offset)).collect()
    }

    /// Percentile threshold per day-of-year slot for `variable`.
    ///
    /// Null baseline values and rows without a day-of-year are skipped. Slots
    /// whose window holds no valid value stay undefined.
    pub fn get_percentile(&self, baseline: &ObservationSeries, variable: &str) -> Result<DayTable> {
        let buckets = bucket_by_day(baseline, variable)?;

        let mut thresholds = Vec::with_capacity(DAYS_PER_YEAR);
        let mut samples = Vec::new();
        for center in DayIndex::all() {
            samples.clear();
            for slot in self.window_slots(center) {
                samples.extend_from_slice(&buckets[slot.index()]);
            }
            thresholds.push(stats::percentile(&mut samples, self.percentile));
        }

        let table = DayTable::new(thresholds)?;
        let undefined = DAYS_PER_YEAR - table.defined_count();
        if undefined > 0 {
            warn!(
                "'{}' has {} day-of-year slots without baseline data; those days will never be flagged",
                variable, undefined
            );
        }
        debug!(
            "Built P{} thresholds for '{}' (window {})",
            self.percentile, variable, self.window_size
        );
        Ok(table)
    }

    /// Number of valid baseline values inside each slot's window.
    pub fn sample_counts(&self, baseline: &ObservationSeries, variable: &str) -> Result<Vec<usize>> {
        let buckets = bucket_by_day(baseline, variable)?;
        let counts = buckets.iter().map(Vec::len).collect::<Vec<_>>();
        Ok(DayIndex::all()
            .map(|center| {
                self.window_slots(center)
                    .into_iter()
                    .map(|slot| counts[slot.index()])
                    .sum()
            })
            .collect())
    }

    /// Max and min tables for wave detection.
    pub fn build_wave_profile(
        &self,
        baseline: &ObservationSeries,
        max_column: &str,
        min_column: &str,
    ) -> Result<ThresholdProfile> {
        Ok(self
            .empty_profile()
            .with_table(ThresholdRole::Max, self.get_percentile(baseline, max_column)?)
            .with_table(ThresholdRole::Min, self.get_percentile(baseline, min_column)?))
    }

    /// Threshold on the baseline's own diurnal range distribution.
    pub fn build_range_profile(
        &self,
        baseline: &ObservationSeries,
        max_column: &str,
        min_column: &str,
    ) -> Result<ThresholdProfile> {
        let derived = baseline.derive_range(max_column, min_column, RANGE_COLUMN)?;
        Ok(self
            .empty_profile()
            .with_table(ThresholdRole::Range, self.get_percentile(&derived, RANGE_COLUMN)?))
    }

    /// Threshold on the baseline's absolute day-over-day change in `column`.
    pub fn build_difference_profile(
        &self,
        baseline: &ObservationSeries,
        column: &str,
    ) -> Result<ThresholdProfile> {
        let derived = baseline.derive_abs_difference(column, DIFFERENCE_COLUMN)?;
        Ok(self.empty_profile().with_table(
            ThresholdRole::Difference,
            self.get_percentile(&derived, DIFFERENCE_COLUMN)?,
        ))
    }

    fn empty_profile(&self) -> ThresholdProfile {
        ThresholdProfile::new(self.percentile, self.window_size)
    }
}

/// One-shot form of [`ThresholdProfileBuilder::get_percentile`].
pub fn get_percentile(
    baseline: &ObservationSeries,
    variable: &str,
    window_size: usize,
    percentile: f64,
) -> Result<DayTable> {
    ThresholdProfileBuilder::new(window_size, percentile)?.get_percentile(baseline, variable)
}

fn validate_window(window_size: usize) -> Result<()> {
    if window_size == 0 || window_size % 2 == 0 {
        return Err(ProcessingError::configuration(format!(
            "window size must be odd and positive, got {}",
            window_size
        )));
    }
    if window_size > DAYS_PER_YEAR {
        return Err(ProcessingError::configuration(format!(
            "window size {} exceeds the {}-day cycle",
            window_size, DAYS_PER_YEAR
        )));
    }
    Ok(())
}

fn validate_percentile(percentile: f64) -> Result<()> {
    if !percentile.is_finite() || !(0.0..=100.0).contains(&percentile) {
        return Err(ProcessingError::configuration(format!(
            "percentile must be within [0, 100], got {}",
            percentile
        )));
    }
    Ok(())
}

/// Valid values of `variable` grouped by day-of-year slot.
fn bucket_by_day(baseline: &ObservationSeries, variable: &str) -> Result<Vec<Vec<f64>>> {
    let values = baseline.column(variable)?;
    let day_index = baseline.require_day_index()?;

    let mut buckets = vec![Vec::new(); DAYS_PER_YEAR];
    for (day, value) in day_index.iter().zip(values) {
        if let (Some(day), Some(value)) = (day, value) {
            buckets[day.index()].push(*value);
        }
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::CalendarNormalizer;
    use approx::assert_relative_eq;
    use chrono::{Datelike, NaiveDate};

    fn baseline(years: i32, value_of: impl Fn(NaiveDate) -> Option<f64>) -> ObservationSeries {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2000 + years - 1, 12, 31).unwrap();
        let dates: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
        let values = dates.iter().map(|d| value_of(*d)).collect();
        let series = ObservationSeries::new(dates)
            .with_column("TMAX", values)
            .unwrap();
        CalendarNormalizer::date_to_day365(&CalendarNormalizer::drop_leap_day(&series))
    }

    #[test]
    fn test_invalid_configuration() {
        for window in [0, 4, 367] {
            assert!(matches!(
                ThresholdProfileBuilder::new(window, 90.0),
                Err(ProcessingError::Configuration(_))
            ));
        }
        for pct in [-1.0, 100.5, f64::NAN] {
            assert!(matches!(
                ThresholdProfileBuilder::new(15, pct),
                Err(ProcessingError::Configuration(_))
            ));
        }
        assert!(ThresholdProfileBuilder::new(365, 0.0).is_ok());
    }

    #[test]
    fn test_window_wraps_year_boundary() {
        let builder = ThresholdProfileBuilder::new(15, 90.0).unwrap();
        let slots: Vec<u16> = builder
            .window_slots(DayIndex::new(1).unwrap())
            .into_iter()
            .map(DayIndex::get)
            .collect();
        let expected: Vec<u16> = (359..=365).chain(1..=8).collect();
        assert_eq!(slots, expected);

        let builder = ThresholdProfileBuilder::new(11, 90.0).unwrap();
        let slots: Vec<u16> = builder
            .window_slots(DayIndex::new(3).unwrap())
            .into_iter()
            .map(DayIndex::get)
            .collect();
        assert_eq!(slots, vec![363, 364, 365, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_profile_has_one_entry_per_slot() {
        let series = baseline(10, |d| Some(d.ordinal() as f64));
        let table = get_percentile(&series, "TMAX", 15, 90.0).unwrap();
        assert_eq!(table.values().len(), 365);
        assert_eq!(table.defined_count(), 365);
    }

    #[test]
    fn test_constant_baseline_yields_constant_threshold() {
        let series = baseline(3, |_| Some(21.5));
        let table = get_percentile(&series, "TMAX", 15, 90.0).unwrap();
        for value in table.values() {
            assert_relative_eq!(value.unwrap(), 21.5);
        }
    }

    #[test]
    fn test_percentile_uses_linear_interpolation() {
        // slot value = year offset, so each window holds 0..=3 repeated
        let series = baseline(4, |d| Some((d.year() - 2000) as f64));
        let table = get_percentile(&series, "TMAX", 1, 50.0).unwrap();
        assert_relative_eq!(table.values()[100].unwrap(), 1.5);
    }

    #[test]
    fn test_missing_values_leave_slots_undefined() {
        let series = baseline(2, |d| if d.month() == 7 { None } else { Some(30.0) });
        let table = get_percentile(&series, "TMAX", 5, 90.0).unwrap();
        let july_15 = DayIndex::from_date(NaiveDate::from_ymd_opt(2001, 7, 15).unwrap()).unwrap();
        let july_1 = DayIndex::from_date(NaiveDate::from_ymd_opt(2001, 7, 1).unwrap()).unwrap();
        assert_eq!(table.get(july_15), None);
        assert_eq!(table.get(july_1), Some(30.0));
    }

    #[test]
    fn test_sample_counts_grow_with_window() {
        let series = baseline(5, |d| if d.day() % 7 == 0 { None } else { Some(1.0) });
        let mut previous = vec![0; 365];
        for window in [1, 5, 15, 31] {
            let builder = ThresholdProfileBuilder::new(window, 90.0).unwrap();
            let counts = builder.sample_counts(&series, "TMAX").unwrap();
            assert!(counts.iter().zip(&previous).all(|(now, before)| now >= before));
            previous = counts;
        }
    }

    #[test]
    fn test_deterministic() {
        let series = baseline(3, |d| Some((d.ordinal() * 37 % 101) as f64));
        let builder = ThresholdProfileBuilder::new(15, 90.0).unwrap();
        assert_eq!(
            builder.get_percentile(&series, "TMAX").unwrap(),
            builder.get_percentile(&series, "TMAX").unwrap()
        );
    }

    #[test]
    fn test_requires_day_index() {
        let series = ObservationSeries::new(vec![NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()])
            .with_values("TMAX", &[1.0])
            .unwrap();
        assert!(matches!(
            get_percentile(&series, "TMAX", 15, 90.0),
            Err(ProcessingError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_range_and_difference_profiles() {
        let series = baseline(2, |d| Some(d.ordinal() as f64))
            .with_values("TMIN", &vec![0.0; 730])
            .unwrap();
        let builder = ThresholdProfileBuilder::default();

        let range = builder.build_range_profile(&series, "TMAX", "TMIN").unwrap();
        assert!(range.has_roles(&[ThresholdRole::Range]));

        let difference = builder.build_difference_profile(&series, "TMAX").unwrap();
        let table = difference.require(ThresholdRole::Difference).unwrap();
        assert_relative_eq!(table.values()[180].unwrap(), 1.0);
    }
}
