use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ProcessingError;
use crate::models::ThresholdRole;
use crate::utils::constants::{DEFAULT_LOWER_PERCENTILE, DEFAULT_UPPER_PERCENTILE};

/// How a day is compared against its day-matched thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonPolicy {
    /// Daily max and min both at or above their upper thresholds.
    AboveWave,
    /// Daily max and min both at or below their lower thresholds.
    BelowWave,
    /// Diurnal range (max - min) at or above the range threshold.
    AboveRange,
    /// Absolute change from the previous day at or above the difference threshold.
    AboveDifference,
}

impl ComparisonPolicy {
    pub fn is_wave(self) -> bool {
        matches!(self, ComparisonPolicy::AboveWave | ComparisonPolicy::BelowWave)
    }

    /// Threshold tables a profile needs for this policy.
    pub fn threshold_roles(self) -> &'static [ThresholdRole] {
        match self {
            ComparisonPolicy::AboveWave | ComparisonPolicy::BelowWave => {
                &[ThresholdRole::Max, ThresholdRole::Min]
            }
            ComparisonPolicy::AboveRange => &[ThresholdRole::Range],
            ComparisonPolicy::AboveDifference => &[ThresholdRole::Difference],
        }
    }
}

/// Extreme event families the checkers know how to detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    HeatWave,
    ColdWave,
    HighHumidityWave,
    LowHumidityWave,
    HighPressureWave,
    LowPressureWave,
    RangeEvent,
    DifferenceEvent,
}

impl EventKind {
    pub fn all() -> [EventKind; 8] {
        [
            EventKind::HeatWave,
            EventKind::ColdWave,
            EventKind::HighHumidityWave,
            EventKind::LowHumidityWave,
            EventKind::HighPressureWave,
            EventKind::LowPressureWave,
            EventKind::RangeEvent,
            EventKind::DifferenceEvent,
        ]
    }

    pub fn policy(self) -> ComparisonPolicy {
        match self {
            EventKind::HeatWave | EventKind::HighHumidityWave | EventKind::HighPressureWave => {
                ComparisonPolicy::AboveWave
            }
            EventKind::ColdWave | EventKind::LowHumidityWave | EventKind::LowPressureWave => {
                ComparisonPolicy::BelowWave
            }
            EventKind::RangeEvent => ComparisonPolicy::AboveRange,
            EventKind::DifferenceEvent => ComparisonPolicy::AboveDifference,
        }
    }

    /// Column prefix used in metrics tables (HWN, HWD, HWF, ...).
    pub fn prefix(self) -> &'static str {
        match self {
            EventKind::HeatWave => "HW",
            EventKind::ColdWave => "CW",
            EventKind::HighHumidityWave => "HHW",
            EventKind::LowHumidityWave => "LHW",
            EventKind::HighPressureWave => "HPW",
            EventKind::LowPressureWave => "LPW",
            EventKind::RangeEvent => "RE",
            EventKind::DifferenceEvent => "DE",
        }
    }

    pub fn default_percentile(self) -> f64 {
        match self.policy() {
            ComparisonPolicy::BelowWave => DEFAULT_LOWER_PERCENTILE,
            _ => DEFAULT_UPPER_PERCENTILE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EventKind::HeatWave => "heat-wave",
            EventKind::ColdWave => "cold-wave",
            EventKind::HighHumidityWave => "high-humidity-wave",
            EventKind::LowHumidityWave => "low-humidity-wave",
            EventKind::HighPressureWave => "high-pressure-wave",
            EventKind::LowPressureWave => "low-pressure-wave",
            EventKind::RangeEvent => "range-event",
            EventKind::DifferenceEvent => "difference-event",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.to_lowercase().replace('_', "-");
        EventKind::all()
            .into_iter()
            .find(|kind| kind.name() == wanted || kind.prefix().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ProcessingError::configuration(format!("unknown event kind '{}'", s)))
    }
}
