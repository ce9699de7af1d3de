use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

use crate::error::{ProcessingError, Result};
use crate::models::{EventInstance, EventKind, WaveSeries};

#[derive(Debug)]
pub struct EventStatistics {
    pub kind: Option<EventKind>,
    pub total_days: usize,
    pub classified_days: usize,
    pub flagged_days: usize,
    pub event_days: usize,
    pub event_count: usize,
    pub longest: Option<EventInstance>,
    pub most_intense: Option<EventInstance>,
    pub mean_duration: f64,
    pub years_with_events: BTreeSet<i32>,
    pub years_covered: usize,
    pub date_range: (NaiveDate, NaiveDate),
}

impl EventStatistics {
    pub fn flagged_percentage(&self) -> f64 {
        percentage(self.flagged_days, self.classified_days)
    }

    pub fn event_day_percentage(&self) -> f64 {
        percentage(self.event_days, self.classified_days)
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

/// Summarises a labeled series for reporting.
pub struct EventAnalyzer {
    kind: Option<EventKind>,
}

impl EventAnalyzer {
    pub fn new() -> Self {
        Self { kind: None }
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn analyze(&self, waves: &WaveSeries) -> Result<EventStatistics> {
        let (first, last) = match (waves.days.first(), waves.days.last()) {
            (Some(first), Some(last)) => (first.date, last.date),
            _ => return Err(ProcessingError::malformed("No days to analyze")),
        };

        let classified_days = waves.days.iter().filter(|d| d.deviation.is_some()).count();
        let flagged_days = waves.days.iter().filter(|d| d.flagged).count();

        // Ties go to the earliest event.
        let longest = waves
            .events
            .iter()
            .fold(None::<&EventInstance>, |best, e| match best {
                Some(b) if b.duration >= e.duration => Some(b),
                _ => Some(e),
            })
            .cloned();

        let most_intense = waves
            .events
            .iter()
            .filter(|e| e.peak_intensity.is_some())
            .fold(None::<&EventInstance>, |best, e| match best {
                Some(b) if b.peak_intensity >= e.peak_intensity => Some(b),
                _ => Some(e),
            })
            .cloned();

        let mean_duration = if waves.events.is_empty() {
            0.0
        } else {
            waves.events.iter().map(|e| e.duration).sum::<usize>() as f64 / waves.events.len() as f64
        };

        Ok(EventStatistics {
            kind: self.kind,
            total_days: waves.days.len(),
            classified_days,
            flagged_days,
            event_days: waves.event_days(),
            event_count: waves.events.len(),
            longest,
            most_intense,
            mean_duration,
            years_with_events: waves.events.iter().map(|e| e.start.year()).collect(),
            years_covered: waves.years().len(),
            date_range: (first, last),
        })
    }
}

impl Default for EventAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn describe(event: &EventInstance) -> String {
    format!(
        "#{} {} to {} ({} days)",
        event.id, event.start, event.end, event.duration
    )
}

impl EventStatistics {
    pub fn summary(&self) -> String {
        let kind = self
            .kind
            .map(|k| format!("{} ({})", k.name(), k.prefix()))
            .unwrap_or_else(|| "Extreme events".to_string());

        format!(
            "Event Type: {}\n\
            Date Range: {} to {} ({} years)\n\
            Days: {} total, {} classified\n\
            Flagged: {} days ({:.1}%)\n\
            Events: {} covering {} days ({:.1}%)\n\
            Years With Events: {}/{}",
            kind,
            self.date_range.0,
            self.date_range.1,
            self.years_covered,
            self.total_days,
            self.classified_days,
            self.flagged_days,
            self.flagged_percentage(),
            self.event_count,
            self.event_days,
            self.event_day_percentage(),
            self.years_with_events.len(),
            self.years_covered
        )
    }

    pub fn detailed_summary(&self) -> String {
        let longest = self
            .longest
            .as_ref()
            .map(describe)
            .unwrap_or_else(|| "No events".to_string());

        let most_intense = self
            .most_intense
            .as_ref()
            .and_then(|e| e.peak_intensity.map(|p| format!("{}, peak {:.2}", describe(e), p)))
            .unwrap_or_else(|| "No events".to_string());

        format!(
            "{}\n\n\
            Event Extremes:\n\
            - Longest: {}\n\
            - Most intense: {}\n\
            - Mean duration: {:.1} days",
            self.summary(),
            longest,
            most_intense,
            self.mean_duration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassifiedDay, ClassifiedSeries, ComparisonPolicy};
    use crate::processors::RunDetector;

    fn waves(flags: &[bool], deviations: &[f64]) -> WaveSeries {
        let start = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let days = flags
            .iter()
            .zip(deviations)
            .enumerate()
            .map(|(i, (&flagged, &deviation))| ClassifiedDay {
                date: start + chrono::Duration::days(i as i64),
                day_index: None,
                flagged,
                deviation: Some(deviation),
            })
            .collect();
        let classified = ClassifiedSeries {
            policy: ComparisonPolicy::AboveWave,
            days,
        };
        RunDetector::new(3).unwrap().get_wave(&classified)
    }

    #[test]
    fn test_analyze_events() {
        let flags = [true, true, true, false, true, true, true, true, false, true];
        let deviations = [1.0, 4.0, 2.0, -1.0, 1.0, 1.5, 0.5, 1.0, -2.0, 3.0];
        let stats = EventAnalyzer::new()
            .with_kind(EventKind::HeatWave)
            .analyze(&waves(&flags, &deviations))
            .unwrap();

        assert_eq!(stats.total_days, 10);
        assert_eq!(stats.flagged_days, 8);
        assert_eq!(stats.event_count, 2);
        assert_eq!(stats.event_days, 7);
        assert_eq!(stats.longest.as_ref().unwrap().duration, 4);
        assert_eq!(stats.most_intense.as_ref().unwrap().id, 1);
        assert_eq!(stats.mean_duration, 3.5);
        assert_eq!(stats.years_with_events.len(), 1);
        assert!(stats.summary().contains("Events: 2 covering 7 days"));
        assert!(stats.detailed_summary().contains("peak 4.00"));
    }

    #[test]
    fn test_analyze_without_events() {
        let stats = EventAnalyzer::new()
            .analyze(&waves(&[false, true], &[-1.0, 1.0]))
            .unwrap();
        assert_eq!(stats.event_count, 0);
        assert!(stats.longest.is_none());
        assert!(stats.detailed_summary().contains("Longest: No events"));
    }

    #[test]
    fn test_analyze_empty_series() {
        let empty = WaveSeries {
            policy: ComparisonPolicy::BelowWave,
            days: vec![],
            labels: vec![],
            events: vec![],
        };
        assert!(EventAnalyzer::new().analyze(&empty).is_err());
    }
}
