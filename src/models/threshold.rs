use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ProcessingError, Result};
use crate::models::DayIndex;
use crate::utils::constants::DAYS_PER_YEAR;

/// Which quantity a threshold table applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdRole {
    Max,
    Min,
    Range,
    Difference,
}

impl ThresholdRole {
    pub fn name(self) -> &'static str {
        match self {
            ThresholdRole::Max => "max",
            ThresholdRole::Min => "min",
            ThresholdRole::Range => "range",
            ThresholdRole::Difference => "difference",
        }
    }
}

impl std::fmt::Display for ThresholdRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One threshold per day-of-year slot; `None` where the baseline had no data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<f64>>", into = "Vec<Option<f64>>")]
pub struct DayTable(Vec<Option<f64>>);

impl DayTable {
    pub fn new(values: Vec<Option<f64>>) -> Result<Self> {
        if values.len() != DAYS_PER_YEAR {
            return Err(ProcessingError::malformed(format!(
                "threshold table needs {} day-of-year entries, found {}",
                DAYS_PER_YEAR,
                values.len()
            )));
        }
        Ok(Self(values))
    }

    pub fn get(&self, day: DayIndex) -> Option<f64> {
        self.0[day.index()]
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn defined_count(&self) -> usize {
        self.0.iter().filter(|v| v.is_some()).count()
    }

    pub fn undefined_slots(&self) -> Vec<DayIndex> {
        DayIndex::all().filter(|d| self.get(*d).is_none()).collect()
    }
}

impl TryFrom<Vec<Option<f64>>> for DayTable {
    type Error = ProcessingError;

    fn try_from(values: Vec<Option<f64>>) -> Result<Self> {
        DayTable::new(values)
    }
}

impl From<DayTable> for Vec<Option<f64>> {
    fn from(table: DayTable) -> Self {
        table.0
    }
}

/// Climatological thresholds keyed by day-of-year, one table per role.
///
/// Derived only from a baseline; reusable across any number of subject series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    pub percentile: f64,
    pub window_size: usize,
    tables: BTreeMap<ThresholdRole, DayTable>,
}

impl ThresholdProfile {
    pub fn new(percentile: f64, window_size: usize) -> Self {
        Self {
            percentile,
            window_size,
            tables: BTreeMap::new(),
        }
    }

    pub fn with_table(mut self, role: ThresholdRole, table: DayTable) -> Self {
        self.tables.insert(role, table);
        self
    }

    pub fn insert(&mut self, role: ThresholdRole, table: DayTable) {
        self.tables.insert(role, table);
    }

    pub fn table(&self, role: ThresholdRole) -> Option<&DayTable> {
        self.tables.get(&role)
    }

    pub fn require(&self, role: ThresholdRole) -> Result<&DayTable> {
        self.table(role).ok_or_else(|| {
            ProcessingError::configuration(format!("threshold profile has no '{}' thresholds", role))
        })
    }

    pub fn threshold(&self, role: ThresholdRole, day: DayIndex) -> Option<f64> {
        self.table(role).and_then(|t| t.get(day))
    }

    pub fn roles(&self) -> impl Iterator<Item = ThresholdRole> + '_ {
        self.tables.keys().copied()
    }

    pub fn has_roles(&self, roles: &[ThresholdRole]) -> bool {
        roles.iter().all(|r| self.tables.contains_key(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_table_length() {
        assert!(DayTable::new(vec![Some(1.0); 365]).is_ok());
        assert!(matches!(
            DayTable::new(vec![Some(1.0); 364]),
            Err(ProcessingError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_profile_lookup() {
        let mut values = vec![Some(30.0); 365];
        values[0] = None;
        let profile = ThresholdProfile::new(90.0, 15)
            .with_table(ThresholdRole::Max, DayTable::new(values).unwrap());

        let first = DayIndex::new(1).unwrap();
        let second = DayIndex::new(2).unwrap();
        assert_eq!(profile.threshold(ThresholdRole::Max, first), None);
        assert_eq!(profile.threshold(ThresholdRole::Max, second), Some(30.0));
        assert_eq!(profile.table(ThresholdRole::Max).unwrap().undefined_slots(), vec![first]);
        assert!(matches!(
            profile.require(ThresholdRole::Min),
            Err(ProcessingError::Configuration(_))
        ));
    }

    #[test]
    fn test_profile_json_round_trip_rejects_short_tables() {
        let json = r#"{"percentile":90.0,"window_size":15,"tables":{"max":[1.0,2.0]}}"#;
        assert!(serde_json::from_str::<ThresholdProfile>(json).is_err());
    }
}
