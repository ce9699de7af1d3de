use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{DayIndex, ObservationSeries};

/// Calendar normalisation of daily series: gap filling, leap-day removal and
/// the fixed 365-slot day-of-year mapping.
pub struct CalendarNormalizer;

impl CalendarNormalizer {
    /// Sort by date and insert every missing day between the first and last
    /// date with null measurements.
    ///
    /// Fails with `MalformedInput` when a date appears twice.
    pub fn complete_dates(series: &ObservationSeries) -> Result<ObservationSeries> {
        let (first, last) = match (series.first_date(), series.last_date()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(series.clone()),
        };

        let mut row_of: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for (row, date) in series.dates().iter().enumerate() {
            if row_of.insert(*date, row).is_some() {
                return Err(ProcessingError::malformed(format!(
                    "date {} appears more than once",
                    date
                )));
            }
        }

        let dates: Vec<NaiveDate> = first.iter_days().take_while(|d| *d <= last).collect();
        let inserted = dates.len() - series.len();

        let mut completed = ObservationSeries::new(dates.clone());
        for name in series.column_names() {
            let values = series.column(name)?;
            let filled = dates
                .iter()
                .map(|d| row_of.get(d).and_then(|&row| values[row]))
                .collect();
            completed.insert_column(name, filled)?;
        }

        if let Some(day_index) = series.day_index() {
            let filled = dates
                .iter()
                .map(|d| match row_of.get(d) {
                    Some(&row) => day_index[row],
                    None => DayIndex::from_date(*d),
                })
                .collect();
            completed.set_day_index(Some(filled));
        }

        debug!(
            "Completed series {}..{}: {} dates inserted",
            first, last, inserted
        );
        Ok(completed)
    }

    /// Remove every February 29, keeping the order of the remaining rows.
    pub fn drop_leap_day(series: &ObservationSeries) -> ObservationSeries {
        let rows: Vec<usize> = series
            .dates()
            .iter()
            .enumerate()
            .filter(|(_, d)| !(d.month() == 2 && d.day() == 29))
            .map(|(row, _)| row)
            .collect();

        if rows.len() == series.len() {
            return series.clone();
        }
        debug!("Dropped {} leap days", series.len() - rows.len());
        series.select_rows(&rows)
    }

    /// Assign the fixed-calendar day-of-year to every row (Feb 29 gets none).
    pub fn date_to_day365(series: &ObservationSeries) -> ObservationSeries {
        let day_index = series.dates().iter().map(|d| DayIndex::from_date(*d)).collect();
        let mut indexed = series.clone();
        indexed.set_day_index(Some(day_index));
        indexed
    }

    /// Calendar date of `day_index` in `year`, skipping Feb 29.
    pub fn day365_to_date(day_index: i64, year: i32) -> Result<NaiveDate> {
        let day = u16::try_from(day_index)
            .map_err(|_| ProcessingError::Range { day_index })
            .and_then(DayIndex::new)?;
        day.to_date(year)
    }

    /// Complete, strip leap days and index in one pass.
    pub fn normalize(series: &ObservationSeries) -> Result<ObservationSeries> {
        let completed = Self::complete_dates(series)?;
        Ok(Self::date_to_day365(&Self::drop_leap_day(&completed)))
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
    fn test_complete_dates_fills_gaps_with_nulls() {
        let series = ObservationSeries::new(vec![date(2023, 1, 3), date(2023, 1, 1)])
            .with_values("TMAX", &[25.0, 20.0])
            .unwrap();

        let completed = CalendarNormalizer::complete_dates(&series).unwrap();

        assert_eq!(
            completed.dates(),
            &[date(2023, 1, 1), date(2023, 1, 2), date(2023, 1, 3)]
        );
        assert_eq!(
            completed.column("TMAX").unwrap(),
            &[Some(20.0), None, Some(25.0)]
        );
    }

    #[test]
    fn test_complete_dates_rejects_duplicates() {
        let series = ObservationSeries::new(vec![date(2023, 1, 1), date(2023, 1, 1)]);
        assert!(matches!(
            CalendarNormalizer::complete_dates(&series),
            Err(ProcessingError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_complete_dates_on_empty_series() {
        let series = ObservationSeries::new(vec![]);
        assert!(CalendarNormalizer::complete_dates(&series).unwrap().is_empty());
    }

    #[test]
    fn test_drop_leap_day_is_idempotent() {
        let series = ObservationSeries::new(vec![
            date(2024, 2, 28),
            date(2024, 2, 29),
            date(2024, 3, 1),
        ])
        .with_values("TMIN", &[1.0, 2.0, 3.0])
        .unwrap();

        let once = CalendarNormalizer::drop_leap_day(&series);
        let twice = CalendarNormalizer::drop_leap_day(&once);

        assert_eq!(once.dates(), &[date(2024, 2, 28), date(2024, 3, 1)]);
        assert_eq!(once.column("TMIN").unwrap(), &[Some(1.0), Some(3.0)]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_date_to_day365() {
        let series = ObservationSeries::new(vec![date(2024, 3, 1), date(2023, 3, 1), date(2024, 12, 31)]);
        let indexed = CalendarNormalizer::date_to_day365(&series);
        let days: Vec<u16> = indexed
            .day_index()
            .unwrap()
            .iter()
            .map(|d| d.unwrap().get())
            .collect();
        assert_eq!(days, vec![60, 60, 365]);
    }

    #[test]
    fn test_day365_to_date() {
        assert_eq!(CalendarNormalizer::day365_to_date(60, 2024).unwrap(), date(2024, 3, 1));
        assert_eq!(CalendarNormalizer::day365_to_date(59, 2024).unwrap(), date(2024, 2, 28));
        assert_eq!(CalendarNormalizer::day365_to_date(1, 1990).unwrap(), date(1990, 1, 1));
        assert!(matches!(
            CalendarNormalizer::day365_to_date(0, 2024),
            Err(ProcessingError::Range { day_index: 0 })
        ));
        assert!(matches!(
            CalendarNormalizer::day365_to_date(366, 2024),
            Err(ProcessingError::Range { day_index: 366 })
        ));
        assert!(matches!(
            CalendarNormalizer::day365_to_date(-4, 2024),
            Err(ProcessingError::Range { day_index: -4 })
        ));
    }

    #[test]
    fn test_round_trip_for_all_non_leap_dates() {
        for d in date(2019, 1, 1).iter_days().take_while(|d| *d <= date(2021, 1, 1)) {
            if d.month() == 2 && d.day() == 29 {
                continue;
            }
            let slot = DayIndex::from_date(d).unwrap();
            assert_eq!(
                CalendarNormalizer::day365_to_date(slot.get() as i64, d.year()).unwrap(),
                d
            );
        }
    }

    #[test]
    fn test_normalize_yields_gapless_no_leap_sequence() {
        let series = ObservationSeries::new(vec![date(2024, 2, 27), date(2024, 3, 2)])
            .with_values("TMAX", &[10.0, 11.0])
            .unwrap();
        let normalized = CalendarNormalizer::normalize(&series).unwrap();

        assert_eq!(
            normalized.dates(),
            &[date(2024, 2, 27), date(2024, 2, 28), date(2024, 3, 1), date(2024, 3, 2)]
        );
        assert!(normalized.is_strictly_increasing());
        assert!(normalized.day_index().unwrap().iter().all(|d| d.is_some()));
    }
}
