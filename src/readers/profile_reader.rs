use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{ThresholdProfile, ThresholdRole};

/// Loads a threshold profile saved as JSON for reuse across runs.
pub struct ProfileReader;

impl ProfileReader {
    pub fn read_profile(path: &Path) -> Result<ThresholdProfile> {
        let reader = BufReader::new(File::open(path)?);
        let profile: ThresholdProfile = serde_json::from_reader(reader)?;
        debug!(
            "Loaded P{} profile (window {}) from {}",
            profile.percentile,
            profile.window_size,
            path.display()
        );
        Ok(profile)
    }

    /// Load and check that the profile carries `roles`.
    pub fn read_profile_with_roles(path: &Path, roles: &[ThresholdRole]) -> Result<ThresholdProfile> {
        let profile = Self::read_profile(path)?;
        if !profile.has_roles(roles) {
            return Err(ProcessingError::configuration(format!(
                "profile {} lacks thresholds for {:?}",
                path.display(),
                roles
            )));
        }
        Ok(profile)
    }
}
