use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ProcessingError, Result};
use crate::models::DayIndex;

/// Daily observation table: one date per row plus caller-named numeric columns.
///
/// Missing measurements are `None`. The optional day-of-year column holds
/// `None` for February 29.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSeries {
    dates: Vec<NaiveDate>,
    day_index: Option<Vec<Option<DayIndex>>>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl ObservationSeries {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            day_index: None,
            columns: BTreeMap::new(),
        }
    }

    /// Builder-style column insertion.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Builder-style insertion of a fully populated column.
    pub fn with_values(self, name: impl Into<String>, values: &[f64]) -> Result<Self> {
        self.with_column(name, values.iter().map(|v| Some(*v)).collect())
    }

    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(ProcessingError::malformed(format!(
                "column '{}' has {} values but the series has {} dates",
                name,
                values.len(),
                self.dates.len()
            )));
        }
        // NaN is treated as a missing measurement
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        self.columns.insert(name, values);
        Ok(())
    }

    /// Attach a caller-supplied day-of-year column.
    pub fn with_day_index(mut self, day_index: Vec<Option<DayIndex>>) -> Result<Self> {
        if day_index.len() != self.dates.len() {
            return Err(ProcessingError::malformed(format!(
                "day-of-year column has {} values but the series has {} dates",
                day_index.len(),
                self.dates.len()
            )));
        }
        self.day_index = Some(day_index);
        Ok(self)
    }

    pub(crate) fn set_day_index(&mut self, day_index: Option<Vec<Option<DayIndex>>>) {
        self.day_index = day_index;
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ProcessingError::malformed(format!("required column '{}' is missing", name)))
    }

    pub fn has_day_index(&self) -> bool {
        self.day_index.is_some()
    }

    pub fn day_index(&self) -> Option<&[Option<DayIndex>]> {
        self.day_index.as_deref()
    }

    pub fn require_day_index(&self) -> Result<&[Option<DayIndex>]> {
        self.day_index().ok_or_else(|| {
            ProcessingError::malformed("series has no day-of-year column; assign one with date_to_day365")
        })
    }

    /// Distinct calendar years present, ascending.
    pub fn years(&self) -> BTreeSet<i32> {
        self.dates.iter().map(|d| d.year()).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.iter().min().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.iter().max().copied()
    }

    /// True when dates are strictly increasing.
    pub fn is_strictly_increasing(&self) -> bool {
        self.dates.windows(2).all(|w| w[0] < w[1])
    }

    /// New series holding the rows at `rows`, in that order.
    pub(crate) fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            dates: rows.iter().map(|&i| self.dates[i]).collect(),
            day_index: self
                .day_index
                .as_ref()
                .map(|idx| rows.iter().map(|&i| idx[i]).collect()),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), rows.iter().map(|&i| values[i]).collect()))
                .collect(),
        }
    }

    /// Adds `name` = `max - min`, null where either side is missing.
    pub fn derive_range(&self, max_column: &str, min_column: &str, name: &str) -> Result<Self> {
        let max = self.column(max_column)?;
        let min = self.column(min_column)?;
        let range = max
            .iter()
            .zip(min)
            .map(|(hi, lo)| match (hi, lo) {
                (Some(hi), Some(lo)) => Some(hi - lo),
                _ => None,
            })
            .collect();

        let mut derived = self.clone();
        derived.insert_column(name, range)?;
        Ok(derived)
    }

    /// Adds `name` = |value - previous day's value|.
    ///
    /// The first row and any row whose previous row is not the previous
    /// calendar day (Feb 29 skipped) get null.
    pub fn derive_abs_difference(&self, column: &str, name: &str) -> Result<Self> {
        let values = self.column(column)?;
        let mut difference = Vec::with_capacity(values.len());
        for i in 0..values.len() {
            let value = if i == 0 || !is_next_day(self.dates[i - 1], self.dates[i]) {
                None
            } else {
                match (values[i - 1], values[i]) {
                    (Some(prev), Some(curr)) => Some((curr - prev).abs()),
                    _ => None,
                }
            };
            difference.push(value);
        }

        let mut derived = self.clone();
        derived.insert_column(name, difference)?;
        Ok(derived)
    }
}

/// True when `next` follows `prev` by one day, treating Feb 28 -> Mar 1 as
/// consecutive in leap years once Feb 29 has been removed.
pub fn is_next_day(prev: NaiveDate, next: NaiveDate) -> bool {
    match prev.succ_opt() {
        Some(day) if day == next => true,
        Some(day) if day.month() == 2 && day.day() == 29 => day.succ_opt() == Some(next),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_column_length_is_checked() {
        let series = ObservationSeries::new(vec![date(2023, 1, 1), date(2023, 1, 2)]);
        let result = series.with_column("TMAX", vec![Some(1.0)]);
        assert!(matches!(result, Err(ProcessingError::MalformedInput(_))));
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let series = ObservationSeries::new(vec![date(2023, 1, 1)]);
        assert!(matches!(
            series.column("TMAX"),
            Err(ProcessingError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_nan_becomes_missing() {
        let series = ObservationSeries::new(vec![date(2023, 1, 1)])
            .with_column("TMAX", vec![Some(f64::NAN)])
            .unwrap();
        assert_eq!(series.column("TMAX").unwrap(), &[None]);
    }

    #[test]
    fn test_derive_range() {
        let series = ObservationSeries::new(vec![date(2023, 1, 1), date(2023, 1, 2)])
            .with_column("TMAX", vec![Some(30.0), None])
            .unwrap()
            .with_values("TMIN", &[18.5, 17.0])
            .unwrap()
            .derive_range("TMAX", "TMIN", "DTR")
            .unwrap();
        assert_eq!(series.column("DTR").unwrap(), &[Some(11.5), None]);
    }

    #[test]
    fn test_derive_abs_difference_skips_gaps() {
        let series = ObservationSeries::new(vec![
            date(2020, 2, 27),
            date(2020, 2, 28),
            date(2020, 3, 1),
            date(2020, 3, 3),
        ])
        .with_values("P", &[1010.0, 1004.0, 1009.0, 1000.0])
        .unwrap()
        .derive_abs_difference("P", "DP")
        .unwrap();

        assert_eq!(
            series.column("DP").unwrap(),
            &[None, Some(6.0), Some(5.0), None]
        );
    }

    #[test]
    fn test_is_next_day() {
        assert!(is_next_day(date(2023, 12, 31), date(2024, 1, 1)));
        assert!(is_next_day(date(2024, 2, 28), date(2024, 2, 29)));
        assert!(is_next_day(date(2024, 2, 28), date(2024, 3, 1)));
        assert!(!is_next_day(date(2023, 2, 27), date(2023, 3, 1)));
    }
}
