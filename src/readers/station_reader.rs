use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::warn;
use validator::Validate;

use crate::error::Result;
use crate::models::StationMetadata;

/// Reads station metadata from a CSV with `station_id,name,latitude,longitude`
/// headers. Latitude and longitude may be blank.
pub struct StationReader {
    skip_invalid: bool,
}

impl StationReader {
    pub fn new() -> Self {
        Self { skip_invalid: false }
    }

    /// Drop stations that fail validation instead of erroring.
    pub fn with_skip_invalid(skip_invalid: bool) -> Self {
        Self { skip_invalid }
    }

    pub fn read_stations(&self, path: &Path) -> Result<Vec<StationMetadata>> {
        self.read_from(File::open(path)?)
    }

    pub fn read_from<R: std::io::Read>(&self, input: R) -> Result<Vec<StationMetadata>> {
        let mut reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
        let mut stations = Vec::new();

        for record in reader.deserialize::<StationMetadata>() {
            let station = record?;
            match station.validate() {
                Ok(()) => stations.push(station),
                Err(e) if self.skip_invalid => {
                    warn!("Skipping station '{}': {}", station.station_id, e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(stations)
    }

    /// Station metadata keyed by id.
    pub fn read_stations_map(&self, path: &Path) -> Result<HashMap<String, StationMetadata>> {
        let stations = self.read_stations(path)?;
        Ok(stations
            .into_iter()
            .map(|s| (s.station_id.clone(), s))
            .collect())
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use crate::models::Hemisphere;

    const STATIONS: &str = "station_id,name,latitude,longitude\n\
        83781,Sao Paulo Mirante,-23.5,-46.6\n\
        257,De Bilt,52.1,5.18\n\
        999,Unknown,,\n";

    #[test]
    fn test_read_stations() {
        let stations = StationReader::new().read_from(STATIONS.as_bytes()).unwrap();
        assert_eq!(stations.len(), 3);
        assert_eq!(stations[0].hemisphere(), Some(Hemisphere::Southern));
        assert_eq!(stations[1].name, "De Bilt");
        assert_eq!(stations[2].latitude, None);
    }

    #[test]
    fn test_invalid_station() {
        let csv = "station_id,name,latitude,longitude\n1,Bad,120.0,0.0\n2,Good,10.0,0.0\n";
        assert!(matches!(
            StationReader::new().read_from(csv.as_bytes()),
            Err(ProcessingError::Validation(_))
        ));
        let stations = StationReader::with_skip_invalid(true)
            .read_from(csv.as_bytes())
            .unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, "2");
    }
}
