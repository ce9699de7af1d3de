use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{ComparisonPolicy, DayIndex};

/// Per-day outcome of comparing a subject day with its thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedDay {
    pub date: NaiveDate,
    pub day_index: Option<DayIndex>,
    pub flagged: bool,
    /// Observed minus threshold for the tracked quantity. Kept on
    /// non-flagged days too; `None` when either side is missing.
    pub deviation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSeries {
    pub policy: ComparisonPolicy,
    pub days: Vec<ClassifiedDay>,
}

impl ClassifiedSeries {
    pub fn flags(&self) -> Vec<bool> {
        self.days.iter().map(|d| d.flagged).collect()
    }

    pub fn flagged_count(&self) -> usize {
        self.days.iter().filter(|d| d.flagged).count()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// A maximal run of flagged days that reached the minimum duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInstance {
    pub id: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration: usize,
    /// Largest absolute deviation inside the run.
    pub peak_intensity: Option<f64>,
    /// Row range inside the labeled series, inclusive.
    pub first_row: usize,
    pub last_row: usize,
}

impl EventInstance {
    pub fn year(&self) -> i32 {
        self.start.year()
    }
}

/// Classified days with their event labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveSeries {
    pub policy: ComparisonPolicy,
    pub days: Vec<ClassifiedDay>,
    /// Event id per day; `None` outside any event.
    pub labels: Vec<Option<usize>>,
    pub events: Vec<EventInstance>,
}

impl WaveSeries {
    pub fn in_event(&self, row: usize) -> bool {
        self.labels.get(row).copied().flatten().is_some()
    }

    pub fn event_days(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.days.iter().map(|d| d.date.year()).collect()
    }

    pub fn event_days_of(&self, event: &EventInstance) -> &[ClassifiedDay] {
        &self.days[event.first_row..=event.last_row]
    }
}
