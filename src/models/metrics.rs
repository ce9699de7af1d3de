use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Hemisphere, Season, SeasonBucket};

/// Aggregated statistics for one year, or one year and season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub year: i32,
    pub season: Option<SeasonBucket>,
    /// Number of events starting in the group.
    pub count: usize,
    /// Longest of those events, in days.
    pub max_duration: usize,
    /// Total days covered by those events.
    pub frequency: usize,
    /// Individually flagged days in the group, inside or outside events.
    pub extreme_days: usize,
}

impl MetricsRecord {
    pub fn empty(year: i32, season: Option<SeasonBucket>) -> Self {
        Self {
            year,
            season,
            count: 0,
            max_duration: 0,
            frequency: 0,
            extreme_days: 0,
        }
    }

    pub fn value(&self, column: MetricColumn) -> f64 {
        match column {
            MetricColumn::Count => self.count as f64,
            MetricColumn::MaxDuration => self.max_duration as f64,
            MetricColumn::Frequency => self.frequency as f64,
            MetricColumn::ExtremeDays => self.extreme_days as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricColumn {
    Count,
    MaxDuration,
    Frequency,
    ExtremeDays,
}

impl MetricColumn {
    pub fn all() -> [MetricColumn; 4] {
        [
            MetricColumn::Count,
            MetricColumn::MaxDuration,
            MetricColumn::Frequency,
            MetricColumn::ExtremeDays,
        ]
    }

    /// Header for this column given the table prefix, e.g. `HWN`.
    pub fn header(self, prefix: &str) -> String {
        match self {
            MetricColumn::Count => format!("{}N", prefix),
            MetricColumn::MaxDuration => format!("{}D", prefix),
            MetricColumn::Frequency => format!("{}F", prefix),
            MetricColumn::ExtremeDays => "EXTREME_DAYS".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsTable {
    pub prefix: String,
    /// Set for seasonal tables.
    pub hemisphere: Option<Hemisphere>,
    pub rows: Vec<MetricsRecord>,
}

impl MetricsTable {
    pub fn is_seasonal(&self) -> bool {
        self.hemisphere.is_some()
    }

    pub fn row(&self, year: i32, season: Option<SeasonBucket>) -> Option<&MetricsRecord> {
        self.rows.iter().find(|r| r.year == year && r.season == season)
    }

    pub fn season_name(&self, record: &MetricsRecord) -> Option<Season> {
        match (record.season, self.hemisphere) {
            (Some(bucket), Some(hemisphere)) => Some(bucket.season(hemisphere)),
            _ => None,
        }
    }

    pub fn total_events(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }
}

/// Peak intensity of one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityRecord {
    pub event_id: usize,
    pub year: i32,
    pub season: Option<SeasonBucket>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub duration: usize,
    /// Maximum absolute deviation from threshold across the event.
    pub intensity: Option<f64>,
}
