use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{is_next_day, ClassifiedDay, ClassifiedSeries, EventInstance, WaveSeries};
use crate::utils::constants::DEFAULT_MIN_DURATION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Outside,
    /// Flagged run shorter than the minimum duration.
    Candidate { start: usize, length: usize },
    /// Run that reached the minimum duration and is still growing.
    Confirmed { start: usize, length: usize },
}

/// Labels maximal runs of consecutive flagged days as events.
///
/// A run must reach `min_duration` days to count. Runs never bridge a
/// non-flagged day or a gap in the calendar.
#[derive(Debug, Clone)]
pub struct RunDetector {
    min_duration: usize,
}

impl Default for RunDetector {
    fn default() -> Self {
        Self {
            min_duration: DEFAULT_MIN_DURATION,
        }
    }
}

impl RunDetector {
    pub fn new(min_duration: usize) -> Result<Self> {
        if min_duration == 0 {
            return Err(ProcessingError::configuration(
                "minimum event duration must be at least 1 day",
            ));
        }
        Ok(Self { min_duration })
    }

    pub fn min_duration(&self) -> usize {
        self.min_duration
    }

    pub fn get_wave(&self, classified: &ClassifiedSeries) -> WaveSeries {
        let days = &classified.days;
        let mut labels = vec![None; days.len()];
        let mut events = Vec::new();
        let mut state = RunState::Outside;

        for (row, day) in days.iter().enumerate() {
            let continues = row > 0 && is_next_day(days[row - 1].date, day.date);
            if !continues {
                state = self.close(state, days, &mut labels, &mut events);
            }

            state = match (state, day.flagged) {
                (_, false) => self.close(state, days, &mut labels, &mut events),
                (RunState::Outside, true) => self.grow(row, 1),
                (RunState::Candidate { start, length }, true) => self.grow(start, length + 1),
                (RunState::Confirmed { start, length }, true) => RunState::Confirmed {
                    start,
                    length: length + 1,
                },
            };
        }
        self.close(state, days, &mut labels, &mut events);

        debug!(
            "{:?}: {} events over {} days",
            classified.policy,
            events.len(),
            days.len()
        );
        WaveSeries {
            policy: classified.policy,
            days: days.clone(),
            labels,
            events,
        }
    }

    fn grow(&self, start: usize, length: usize) -> RunState {
        if length >= self.min_duration {
            RunState::Confirmed { start, length }
        } else {
            RunState::Candidate { start, length }
        }
    }

    /// Ends the current run, emitting an event when it was confirmed.
    fn close(
        &self,
        state: RunState,
        days: &[ClassifiedDay],
        labels: &mut [Option<usize>],
        events: &mut Vec<EventInstance>,
    ) -> RunState {
        if let RunState::Confirmed { start, length } = state {
            let id = events.len() + 1;
            let last = start + length - 1;
            labels[start..=last].iter_mut().for_each(|label| *label = Some(id));

            let peak_intensity = days[start..=last]
                .iter()
                .filter_map(|d| d.deviation.map(f64::abs))
                .fold(None, |peak: Option<f64>, v| Some(peak.map_or(v, |p| p.max(v))));

            events.push(EventInstance {
                id,
                start: days[start].date,
                end: days[last].date,
                duration: length,
                peak_intensity,
                first_row: start,
                last_row: last,
            });
        }
        RunState::Outside
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComparisonPolicy, DayIndex};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn classified(flags: &[bool]) -> ClassifiedSeries {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let days = start
            .iter_days()
            .zip(flags)
            .map(|(date, &flagged)| ClassifiedDay {
                date,
                day_index: DayIndex::from_date(date),
                flagged,
                deviation: Some(if flagged { 1.0 } else { -1.0 }),
            })
            .collect();
        ClassifiedSeries {
            policy: ComparisonPolicy::AboveWave,
            days,
        }
    }

    #[test]
    fn test_short_runs_are_not_events() {
        let waves = RunDetector::default().get_wave(&classified(&[true, true, false, true, false]));
        assert!(waves.events.is_empty());
        assert_eq!(waves.labels, vec![None; 5]);
    }

    #[test]
    fn test_days_five_to_seven_form_one_event() {
        // days 5,6,7 and 9 flagged, day 8 below
        let mut flags = vec![false; 10];
        for day in [5, 6, 7, 9] {
            flags[day - 1] = true;
        }
        let waves = RunDetector::default().get_wave(&classified(&flags));

        assert_eq!(waves.events.len(), 1);
        let event = &waves.events[0];
        assert_eq!(event.duration, 3);
        assert_eq!(event.start, NaiveDate::from_ymd_opt(2022, 1, 5).unwrap());
        assert_eq!(event.end, NaiveDate::from_ymd_opt(2022, 1, 7).unwrap());
        assert!(!waves.in_event(8));
        assert_eq!(waves.event_days(), 3);
    }

    #[test]
    fn test_runs_touching_series_edges_count() {
        let flags = [true, true, true, false, false, true, true, true, true];
        let waves = RunDetector::default().get_wave(&classified(&flags));

        let durations: Vec<usize> = waves.events.iter().map(|e| e.duration).collect();
        assert_eq!(durations, vec![3, 4]);
        assert_eq!(waves.events[1].last_row, 8);
        assert_eq!(
            waves.labels,
            vec![Some(1), Some(1), Some(1), None, None, Some(2), Some(2), Some(2), Some(2)]
        );
    }

    #[test]
    fn test_single_gap_separates_events() {
        let flags = [true, true, true, false, true, true, true];
        let waves = RunDetector::default().get_wave(&classified(&flags));
        assert_eq!(waves.events.len(), 2);
    }

    #[test]
    fn test_calendar_gap_breaks_run() {
        let mut series = classified(&[true; 6]);
        series.days.remove(3);
        let waves = RunDetector::default().get_wave(&series);
        assert_eq!(waves.events.len(), 1);
        assert_eq!(waves.events[0].duration, 3);
        assert_eq!(waves.labels[3..], [None, None]);
    }

    #[test]
    fn test_peak_intensity_is_largest_absolute_deviation() {
        let mut series = classified(&[true; 3]);
        for (day, deviation) in series.days.iter_mut().zip([1.2, 2.5, 0.8]) {
            day.deviation = Some(deviation);
        }
        let waves = RunDetector::default().get_wave(&series);
        assert_eq!(waves.events[0].peak_intensity, Some(2.5));
    }

    #[test]
    fn test_min_duration_validation() {
        assert!(matches!(
            RunDetector::new(0),
            Err(ProcessingError::Configuration(_))
        ));
        let waves = RunDetector::new(1).unwrap().get_wave(&classified(&[true, false, true]));
        assert_eq!(waves.events.len(), 2);
    }

    #[test]
    fn test_empty_series() {
        let waves = RunDetector::default().get_wave(&classified(&[]));
        assert!(waves.events.is_empty());
        assert!(waves.days.is_empty());
    }
}
