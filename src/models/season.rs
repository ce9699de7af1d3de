use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ProcessingError;

/// Hemisphere of the station, which decides what each three-month bucket is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    Northern,
    Southern,
}

impl Hemisphere {
    pub fn from_latitude(latitude: f64) -> Self {
        if latitude < 0.0 {
            Hemisphere::Southern
        } else {
            Hemisphere::Northern
        }
    }
}

impl FromStr for Hemisphere {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "northern" | "north" | "n" => Ok(Hemisphere::Northern),
            "southern" | "south" | "s" => Ok(Hemisphere::Southern),
            _ => Err(ProcessingError::configuration(format!(
                "unknown hemisphere '{}' (expected northern or southern)",
                s
            ))),
        }
    }
}

/// Meteorological three-month bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeasonBucket {
    Djf,
    Mam,
    Jja,
    Son,
}

impl SeasonBucket {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => SeasonBucket::Djf,
            3..=5 => SeasonBucket::Mam,
            6..=8 => SeasonBucket::Jja,
            _ => SeasonBucket::Son,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }

    pub fn code(self) -> &'static str {
        match self {
            SeasonBucket::Djf => "DJF",
            SeasonBucket::Mam => "MAM",
            SeasonBucket::Jja => "JJA",
            SeasonBucket::Son => "SON",
        }
    }

    pub fn season(self, hemisphere: Hemisphere) -> Season {
        let northern = match self {
            SeasonBucket::Djf => Season::Winter,
            SeasonBucket::Mam => Season::Spring,
            SeasonBucket::Jja => Season::Summer,
            SeasonBucket::Son => Season::Autumn,
        };
        match hemisphere {
            Hemisphere::Northern => northern,
            Hemisphere::Southern => northern.opposite(),
        }
    }

    pub fn all() -> [SeasonBucket; 4] {
        [
            SeasonBucket::Djf,
            SeasonBucket::Mam,
            SeasonBucket::Jja,
            SeasonBucket::Son,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Summer,
    Autumn,
    Winter,
    Spring,
}

impl Season {
    fn opposite(self) -> Self {
        match self {
            Season::Summer => Season::Winter,
            Season::Winter => Season::Summer,
            Season::Spring => Season::Autumn,
            Season::Autumn => Season::Spring,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
            Season::Spring => "Spring",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets() {
        assert_eq!(SeasonBucket::from_month(12), SeasonBucket::Djf);
        assert_eq!(SeasonBucket::from_month(2), SeasonBucket::Djf);
        assert_eq!(SeasonBucket::from_month(3), SeasonBucket::Mam);
        assert_eq!(SeasonBucket::from_month(8), SeasonBucket::Jja);
        assert_eq!(SeasonBucket::from_month(11), SeasonBucket::Son);
    }

    #[test]
    fn test_hemisphere_naming() {
        assert_eq!(SeasonBucket::Djf.season(Hemisphere::Northern), Season::Winter);
        assert_eq!(SeasonBucket::Djf.season(Hemisphere::Southern), Season::Summer);
        assert_eq!(SeasonBucket::Mam.season(Hemisphere::Southern), Season::Autumn);
        assert_eq!(Hemisphere::from_latitude(-22.9), Hemisphere::Southern);
        assert_eq!("South".parse::<Hemisphere>().unwrap(), Hemisphere::Southern);
        assert!("east".parse::<Hemisphere>().is_err());
    }
}
