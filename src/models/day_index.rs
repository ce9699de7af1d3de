//! Day-of-year index in the fixed 365-day calendar (Feb 29 excluded).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ProcessingError, Result};
use crate::utils::constants::DAYS_PER_YEAR;

/// Number of days in each month of the no-leap calendar (index 0 unused).
const DAYS_PER_MONTH: [u16; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Day-of-year on which each month starts (index 0 unused).
const MONTH_START: [u16; 13] = [0, 1, 32, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

/// A day-of-year slot in `1..=365`.
///
/// The mapping from calendar date is identical in leap and non-leap years:
/// March 1 is always slot 60 and December 31 is always slot 365.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct DayIndex(u16);

impl DayIndex {
    pub fn new(day: u16) -> Result<Self> {
        if !(1..=DAYS_PER_YEAR as u16).contains(&day) {
            return Err(ProcessingError::Range {
                day_index: day as i64,
            });
        }
        Ok(Self(day))
    }

    /// Slot for a calendar date, or `None` for February 29.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        let (month, day) = (date.month(), date.day());
        if month == 2 && day == 29 {
            return None;
        }
        Some(Self(MONTH_START[month as usize] + day as u16 - 1))
    }

    /// Calendar date of this slot in `year`.
    pub fn to_date(self, year: i32) -> Result<NaiveDate> {
        let month = (1..=12)
            .rev()
            .find(|&m| MONTH_START[m] <= self.0)
            .unwrap_or(1);
        let day = self.0 - MONTH_START[month] + 1;
        debug_assert!(day <= DAYS_PER_MONTH[month]);

        NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or_else(|| {
            ProcessingError::malformed(format!("year {} is outside the supported date range", year))
        })
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Zero-based position, suitable for indexing a 365-slot table.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn from_index(index: usize) -> Result<Self> {
        let day = u16::try_from(index + 1).map_err(|_| ProcessingError::Range {
            day_index: index as i64 + 1,
        })?;
        Self::new(day)
    }

    /// Slot reached by moving `offset` days around the 365-day cycle.
    pub fn shifted(self, offset: i64) -> Self {
        let zero_based = (self.index() as i64 + offset).rem_euclid(DAYS_PER_YEAR as i64);
        Self(zero_based as u16 + 1)
    }

    /// Shortest distance between two slots when the cycle wraps at 365.
    pub fn circular_distance(self, other: Self) -> u16 {
        let diff = self.0.abs_diff(other.0);
        diff.min(DAYS_PER_YEAR as u16 - diff)
    }

    pub fn all() -> impl Iterator<Item = DayIndex> {
        (1..=DAYS_PER_YEAR as u16).map(DayIndex)
    }
}

impl TryFrom<u16> for DayIndex {
    type Error = ProcessingError;

    fn try_from(value: u16) -> Result<Self> {
        DayIndex::new(value)
    }
}

impl From<DayIndex> for u16 {
    fn from(day: DayIndex) -> u16 {
        day.0
    }
}

impl std::fmt::Display for DayIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
