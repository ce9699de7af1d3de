use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

use crate::error::{ProcessingError, Result};
use crate::models::{
    EventKind, Hemisphere, IntensityRecord, MetricsTable, StationMetadata, StationSeries,
    ThresholdProfile, WaveSeries,
};
use crate::processors::event_checker::{evaluate_subject, seasonal_metrics, yearly_metrics, CheckerConfig};
use crate::processors::MetricsAggregator;
use crate::utils::progress::ProgressReporter;

/// Detection results for one station.
#[derive(Debug, Clone)]
pub struct StationOutcome {
    pub station: StationMetadata,
    pub waves: WaveSeries,
    pub metrics: MetricsTable,
    /// Absent when no hemisphere is configured or known for the station.
    pub season_metrics: Option<MetricsTable>,
    pub intensity: Vec<IntensityRecord>,
}

/// Evaluates many stations against one shared threshold profile.
pub struct ParallelProcessor {
    max_workers: usize,
    hemisphere: Option<Hemisphere>,
}

impl ParallelProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            hemisphere: None,
        }
    }

    /// Hemisphere for seasonal tables; otherwise taken from station latitude.
    pub fn with_hemisphere(mut self, hemisphere: Option<Hemisphere>) -> Self {
        self.hemisphere = hemisphere;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Runs detection for every station, returning outcomes sorted by
    /// station id. The first failing station aborts the batch.
    pub fn evaluate_stations(
        &self,
        kind: EventKind,
        profile: &ThresholdProfile,
        stations: &[StationSeries],
        config: &CheckerConfig,
        progress: Option<&ProgressReporter>,
    ) -> Result<Vec<StationOutcome>> {
        let processed_count = AtomicUsize::new(0);

        if let Some(p) = progress {
            p.set_message(&format!("Evaluating {} stations...", stations.len()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::configuration(e.to_string()))?;

        let outcomes: Result<Vec<StationOutcome>> = pool.install(|| {
            stations
                .par_iter()
                .map(|station| {
                    let result = self.evaluate_station(kind, profile, station, config);
                    processed_count.fetch_add(1, Ordering::Relaxed);
                    if let Some(p) = progress {
                        p.increment(1);
                    }
                    result
                })
                .collect()
        });

        let mut outcomes = outcomes?;
        outcomes.sort_by(|a, b| a.station.station_id.cmp(&b.station.station_id));

        let count = processed_count.load(Ordering::Relaxed);
        if let Some(p) = progress {
            p.finish_with_message(&format!("Processed {} stations", count));
        }
        info!("{}: evaluated {} stations", kind, count);

        Ok(outcomes)
    }

    fn evaluate_station(
        &self,
        kind: EventKind,
        profile: &ThresholdProfile,
        station: &StationSeries,
        config: &CheckerConfig,
    ) -> Result<StationOutcome> {
        let waves = evaluate_subject(kind, profile, &station.series, config).inspect_err(|e| {
            warn!("Station {} failed: {}", station.station.station_id, e);
        })?;
        let hemisphere = self.hemisphere.or_else(|| station.station.hemisphere());
        let season_metrics = match hemisphere {
            Some(hemisphere) => Some(seasonal_metrics(kind, &waves, hemisphere)?),
            None => None,
        };

        Ok(StationOutcome {
            station: station.station.clone(),
            metrics: yearly_metrics(kind, &waves)?,
            season_metrics,
            intensity: MetricsAggregator::for_kind(kind).wave_intensity(&waves, hemisphere.is_some()),
            waves,
        })
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayTable, ObservationSeries, ThresholdRole};
    use chrono::NaiveDate;

    fn station(id: &str, latitude: Option<f64>, hot_days: usize) -> StationSeries {
        let dates: Vec<NaiveDate> = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .iter_days()
            .take(30)
            .collect();
        let max: Vec<f64> = (0..30).map(|i| if i < hot_days { 35.0 } else { 20.0 }).collect();
        let series = ObservationSeries::new(dates)
            .with_values("TMAX", &max)
            .unwrap()
            .with_values("TMIN", &max.iter().map(|v| v - 10.0).collect::<Vec<_>>())
            .unwrap();

        let mut metadata = StationMetadata::new(id, format!("Station {}", id));
        if let Some(lat) = latitude {
            metadata = metadata.with_coordinates(lat, 0.0);
        }
        StationSeries {
            station: metadata,
            series,
        }
    }

    fn profile() -> ThresholdProfile {
        ThresholdProfile::new(90.0, 15)
            .with_table(ThresholdRole::Max, DayTable::new(vec![Some(30.0); 365]).unwrap())
            .with_table(ThresholdRole::Min, DayTable::new(vec![Some(20.0); 365]).unwrap())
    }

    #[test]
    fn test_evaluates_all_stations_sorted() {
        let stations = vec![
            station("b", Some(-10.0), 4),
            station("a", None, 0),
            station("c", Some(45.0), 2),
        ];
        let outcomes = ParallelProcessor::new(2)
            .evaluate_stations(
                EventKind::HeatWave,
                &profile(),
                &stations,
                &CheckerConfig::default(),
                None,
            )
            .unwrap();

        let ids: Vec<&str> = outcomes.iter().map(|o| o.station.station_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(outcomes[0].metrics.total_events(), 0);
        assert!(outcomes[0].season_metrics.is_none());
        assert_eq!(outcomes[1].metrics.total_events(), 1);
        assert_eq!(
            outcomes[1].season_metrics.as_ref().unwrap().hemisphere,
            Some(Hemisphere::Southern)
        );
        assert_eq!(outcomes[2].metrics.total_events(), 0);
    }

    #[test]
    fn test_configured_hemisphere_overrides_latitude() {
        let stations = vec![station("x", Some(-30.0), 3)];
        let outcomes = ParallelProcessor::new(1)
            .with_hemisphere(Some(Hemisphere::Northern))
            .evaluate_stations(
                EventKind::HeatWave,
                &profile(),
                &stations,
                &CheckerConfig::default(),
                None,
            )
            .unwrap();
        assert_eq!(
            outcomes[0].season_metrics.as_ref().unwrap().hemisphere,
            Some(Hemisphere::Northern)
        );
        assert_eq!(outcomes[0].intensity.len(), 1);
    }

    #[test]
    fn test_station_error_aborts_batch() {
        let mut broken = station("z", None, 0);
        broken.series = ObservationSeries::new(broken.series.dates().to_vec());
        let result = ParallelProcessor::default().evaluate_stations(
            EventKind::HeatWave,
            &profile(),
            &[broken],
            &CheckerConfig::default(),
            None,
        );
        assert!(matches!(result, Err(ProcessingError::MalformedInput(_))));
    }
}
