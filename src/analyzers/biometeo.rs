//! Biometeorological comfort and strain indices.
//!
//! Temperatures are degrees Celsius, humidity is percent, wind speed is
//! km/h for the Canadian wind chill and m/s elsewhere. Several indices are
//! empirical fits and only meaningful inside the range they were fitted on.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::ObservationSeries;

/// Saturation vapour pressure over water (t > 0) or ice, in Pa.
pub fn saturation_vapour_pressure(t: f64) -> f64 {
    if t > 0.0 {
        (34.494 - 4924.99 / (t + 237.1)).exp() / (t + 105.0).powf(1.57)
    } else {
        (43.494 - 6545.8 / (t + 278.0)).exp() / (t + 868.0).powi(2)
    }
}

/// Actual vapour pressure in Pa for relative humidity `rh` (%).
pub fn actual_vapour_pressure(t: f64, rh: f64) -> f64 {
    rh * saturation_vapour_pressure(t) / 100.0
}

pub fn dewpoint_from_relative_humidity(t: f64, rh: f64) -> f64 {
    (rh / 100.0).powf(1.0 / 8.0) * (112.0 + 0.9 * t) - 112.0 + 0.1 * t
}

pub fn relative_humidity_from_dewpoint(t: f64, dewpoint: f64) -> f64 {
    let x = (112.0 - 0.1 * t + dewpoint) / (112.0 + 0.9 * t);
    100.0 * x.powi(8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exposure {
    Indoors,
    Shade,
}

/// Steadman apparent temperature. `vapour_pressure` in kPa, wind in m/s
/// (ignored indoors).
pub fn apparent_temperature(t: f64, vapour_pressure: f64, wind_speed: f64, exposure: Exposure) -> f64 {
    match exposure {
        Exposure::Indoors => -1.3 + 0.92 * t + 2.2 * vapour_pressure,
        Exposure::Shade => -2.7 + 1.04 * t + 2.0 * vapour_pressure - 0.65 * wind_speed,
    }
}

/// Steadman wind chill, wind in m/s.
pub fn wind_chill(t: f64, wind_speed: f64) -> f64 {
    1.41 - 1.162 * wind_speed + 0.98 * t + 0.0124 * wind_speed.powi(2) + 0.0185 * t * wind_speed
}

/// Environment Canada wind chill, wind in km/h.
///
/// Defined only at or below freezing with non-negative wind.
pub fn wind_chill_canada(t: f64, wind_speed: f64) -> Option<f64> {
    if t > 0.0 || wind_speed < 0.0 {
        return None;
    }
    if wind_speed >= 5.0 {
        let v = wind_speed.powf(0.16);
        Some(13.12 + 0.6215 * t - 11.37 * v + 0.3965 * t * v)
    } else {
        Some(t + ((-1.59 + 0.1345 * t) / 5.0) * wind_speed)
    }
}

/// NWS heat index (Rothfusz regression with Steadman's simple form below
/// 80 F), returned in Celsius.
pub fn heat_index(t: f64, rh: f64) -> f64 {
    let tf = t * 9.0 / 5.0 + 32.0;
    if tf <= 40.0 {
        return t;
    }

    let simple = 0.5 * (61.0 + (tf - 68.0) * 1.2 + rh * 0.094 + tf);
    let hi = if simple <= 79.0 {
        simple
    } else {
        let mut hi = -42.379 + 2.04901523 * tf + 10.14333127 * rh
            - 0.22475541 * tf * rh
            - 6.83783e-3 * tf.powi(2)
            - 5.481717e-2 * rh.powi(2)
            + 1.22874e-3 * tf.powi(2) * rh
            + 8.5282e-4 * tf * rh.powi(2)
            - 1.99e-6 * tf.powi(2) * rh.powi(2);

        if rh <= 13.0 && (80.0..=112.0).contains(&tf) {
            hi -= (13.0 - rh) / 4.0 * ((17.0 - (tf - 95.0).abs()) / 17.0).sqrt();
        } else if rh > 85.0 && (80.0..=87.0).contains(&tf) {
            hi += (rh - 85.0) / 10.0 * ((87.0 - tf) / 5.0);
        }
        hi
    };

    (hi - 32.0) * 5.0 / 9.0
}

/// Thom discomfort index.
pub fn discomfort_index(t: f64, rh: f64) -> f64 {
    t - (0.55 - 0.0055 * rh) * (t - 14.5)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Moisture {
    DewPoint(f64),
    RelativeHumidity(f64),
}

/// Canadian humidex.
pub fn humidex(t: f64, moisture: Moisture) -> f64 {
    let dewpoint = match moisture {
        Moisture::DewPoint(td) => td,
        Moisture::RelativeHumidity(rh) => dewpoint_from_relative_humidity(t, rh),
    };
    let dewpoint_k = dewpoint + 273.15;
    let e = 6.112 * (5417.7530 * (1.0 / 273.15 - 1.0 / dewpoint_k)).exp();
    t + 0.5555 * (e - 10.0)
}

/// Relative strain index; `vapour_pressure` in hPa.
pub fn relative_strain_index(t: f64, vapour_pressure: f64) -> f64 {
    (10.7 + 0.74 * (t - 35.0)) / (44.0 - vapour_pressure)
}

/// Adds a heat-index column computed from `temperature` and `humidity`,
/// null where either input is missing.
pub fn append_heat_index(
    series: &ObservationSeries,
    temperature: &str,
    humidity: &str,
    name: &str,
) -> Result<ObservationSeries> {
    let t = series.column(temperature)?;
    let rh = series.column(humidity)?;
    let values = t
        .iter()
        .zip(rh)
        .map(|(t, rh)| t.zip(*rh).map(|(t, rh)| heat_index(t, rh)))
        .collect();

    let mut derived = series.clone();
    derived.insert_column(name, values)?;
    Ok(derived)
}
