use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{is_next_day, ObservationSeries};
use crate::utils::constants::DEFAULT_JUMP_THRESHOLD;

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub total_records: usize,
    /// Rows with a value in every column.
    pub complete_records: usize,
    pub missing_by_column: BTreeMap<String, usize>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub violations: Vec<SeriesViolation>,
}

impl IntegrityReport {
    pub fn count(&self, violation_type: ViolationType) -> usize {
        self.violations
            .iter()
            .filter(|v| v.violation_type == violation_type)
            .count()
    }

    /// True when the series can go straight to threshold construction.
    pub fn is_normalized(&self) -> bool {
        [
            ViolationType::DateGap,
            ViolationType::LeapDay,
            ViolationType::DuplicateDate,
            ViolationType::Unordered,
        ]
        .iter()
        .all(|t| self.count(*t) == 0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesViolation {
    pub date: NaiveDate,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ViolationType {
    MaxBelowMin,
    SuspiciousJump,
    DateGap,
    LeapDay,
    DuplicateDate,
    Unordered,
}

/// Pre-flight checks on an observation series before detection.
pub struct IntegrityChecker {
    jump_threshold: f64,
    extremes: Option<(String, String)>,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self {
            jump_threshold: DEFAULT_JUMP_THRESHOLD,
            extremes: None,
        }
    }

    pub fn with_jump_threshold(mut self, jump_threshold: f64) -> Self {
        self.jump_threshold = jump_threshold;
        self
    }

    /// Also check that `max` never falls below `min`.
    pub fn with_extremes(mut self, max: impl Into<String>, min: impl Into<String>) -> Self {
        self.extremes = Some((max.into(), min.into()));
        self
    }

    pub fn check_integrity(&self, series: &ObservationSeries) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_records: series.len(),
            complete_records: 0,
            missing_by_column: BTreeMap::new(),
            first_date: series.first_date(),
            last_date: series.last_date(),
            violations: Vec::new(),
        };

        self.check_calendar(series, &mut report);
        self.check_values(series, &mut report);
        if let Some((max, min)) = &self.extremes {
            self.check_extremes(series, max, min, &mut report);
        }

        report
    }

    fn check_calendar(&self, series: &ObservationSeries, report: &mut IntegrityReport) {
        let dates = series.dates();

        for date in dates.iter().filter(|d| d.month() == 2 && d.day() == 29) {
            report.violations.push(SeriesViolation {
                date: *date,
                violation_type: ViolationType::LeapDay,
                details: "February 29 present".to_string(),
            });
        }

        for pair in dates.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let violation = if curr == prev {
                Some((ViolationType::DuplicateDate, format!("{} repeated", curr)))
            } else if curr < prev {
                Some((ViolationType::Unordered, format!("{} follows {}", curr, prev)))
            } else if !is_next_day(prev, curr) {
                let missing = (curr - prev).num_days() - 1;
                Some((
                    ViolationType::DateGap,
                    format!("{} days missing after {}", missing, prev),
                ))
            } else {
                None
            };

            if let Some((violation_type, details)) = violation {
                report.violations.push(SeriesViolation {
                    date: curr,
                    violation_type,
                    details,
                });
            }
        }
    }

    fn check_values(&self, series: &ObservationSeries, report: &mut IntegrityReport) {
        let dates = series.dates();
        let mut complete = vec![true; series.len()];

        for name in series.column_names() {
            let Ok(values) = series.column(name) else {
                continue;
            };
            let mut missing = 0;
            for (row, value) in values.iter().enumerate() {
                if value.is_none() {
                    missing += 1;
                    complete[row] = false;
                }
            }
            report.missing_by_column.insert(name.to_string(), missing);

            for row in 1..values.len() {
                if !is_next_day(dates[row - 1], dates[row]) {
                    continue;
                }
                if let (Some(prev), Some(curr)) = (values[row - 1], values[row]) {
                    let jump = (curr - prev).abs();
                    if jump > self.jump_threshold {
                        report.violations.push(SeriesViolation {
                            date: dates[row],
                            violation_type: ViolationType::SuspiciousJump,
                            details: format!(
                                "{} jumped {:.1} from {} to {}",
                                name,
                                jump,
                                dates[row - 1],
                                dates[row]
                            ),
                        });
                    }
                }
            }
        }

        report.complete_records = complete.iter().filter(|c| **c).count();
    }

    fn check_extremes(&self, series: &ObservationSeries, max: &str, min: &str, report: &mut IntegrityReport) {
        let (Ok(max_values), Ok(min_values)) = (series.column(max), series.column(min)) else {
            return;
        };

        for (row, (hi, lo)) in max_values.iter().zip(min_values).enumerate() {
            if let (Some(hi), Some(lo)) = (hi, lo) {
                if hi < lo {
                    report.violations.push(SeriesViolation {
                        date: series.dates()[row],
                        violation_type: ViolationType::MaxBelowMin,
                        details: format!("{} {} is below {} {}", max, hi, min, lo),
                    });
                }
            }
        }
    }

    /// Generate a summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();
        let total = report.total_records.max(1) as f64;

        summary.push_str("=== Integrity Check Report ===\n");
        summary.push_str(&format!("Total Records: {}\n", report.total_records));
        if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
            summary.push_str(&format!("Period: {} to {}\n", first, last));
        }
        summary.push_str(&format!(
            "Complete Records: {} ({:.1}%)\n",
            report.complete_records,
            100.0 * report.complete_records as f64 / total
        ));
        for (column, missing) in &report.missing_by_column {
            summary.push_str(&format!(
                "Missing {}: {} ({:.1}%)\n",
                column,
                missing,
                100.0 * *missing as f64 / total
            ));
        }

        summary.push_str(&format!("\nViolations: {}\n", report.violations.len()));
        for violation_type in [
            ViolationType::DateGap,
            ViolationType::LeapDay,
            ViolationType::DuplicateDate,
            ViolationType::Unordered,
            ViolationType::MaxBelowMin,
            ViolationType::SuspiciousJump,
        ] {
            let count = report.count(violation_type);
            if count > 0 {
                summary.push_str(&format!("  {:?}: {}\n", violation_type, count));
            }
        }

        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {}: {}\n",
                    i + 1,
                    violation.date,
                    violation.details
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}
