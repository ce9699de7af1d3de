use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Hemisphere, ObservationSeries};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StationMetadata {
    #[validate(length(min = 1))]
    pub station_id: String,

    pub name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

impl StationMetadata {
    pub fn new(station_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            name: name.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Hemisphere implied by latitude, if known.
    pub fn hemisphere(&self) -> Option<Hemisphere> {
        self.latitude.map(Hemisphere::from_latitude)
    }
}

/// A subject series together with the station it came from.
#[derive(Debug, Clone)]
pub struct StationSeries {
    pub station: StationMetadata,
    pub series: ObservationSeries,
}
