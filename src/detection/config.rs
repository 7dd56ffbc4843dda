//! Detector configuration: thresholds, guards and column naming.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DegradationError, DegradationResult};
use crate::table::TableSchema;

/// Default fraction of an entity's life treated as late stage.
pub const DEFAULT_LATE_FRACTION: f64 = 0.3;
/// Default shift, in baseline standard deviations, that counts as evidence.
pub const DEFAULT_MEAN_SIGMA: f64 = 1.5;
/// Entities with fewer rows are never labeled.
pub const DEFAULT_MIN_ENTITY_ROWS: usize = 50;
/// Sensors with fewer non-missing samples in either window are skipped.
pub const DEFAULT_MIN_WINDOW_SAMPLES: usize = 10;

/// Configuration for [`DegradationDetector`](super::DegradationDetector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Fraction of the sorted rows, counted from the end, forming the late window
    pub late_fraction: f64,
    /// Required |mean(late) - mean(baseline)| in units of baseline std
    pub mean_sigma: f64,
    /// Minimum-history guard
    pub min_entity_rows: usize,
    /// Per-sensor minimum-sample guard, applied to each window
    pub min_window_samples: usize,
    /// Column naming
    pub schema: TableSchema,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            late_fraction: DEFAULT_LATE_FRACTION,
            mean_sigma: DEFAULT_MEAN_SIGMA,
            min_entity_rows: DEFAULT_MIN_ENTITY_ROWS,
            min_window_samples: DEFAULT_MIN_WINDOW_SAMPLES,
            schema: TableSchema::default(),
        }
    }
}

impl DetectorConfig {
    /// Defaults with custom thresholds
    pub fn with_thresholds(late_fraction: f64, mean_sigma: f64) -> Self {
        Self {
            late_fraction,
            mean_sigma,
            ..Self::default()
        }
    }

    /// Load overrides from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> DegradationResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn validate(&self) -> DegradationResult<()> {
        if !(self.late_fraction > 0.0 && self.late_fraction < 1.0) {
            return Err(DegradationError::invalid_config(
                "late_fraction",
                self.late_fraction,
                "must lie strictly between 0 and 1",
            ));
        }
        if !(self.mean_sigma.is_finite() && self.mean_sigma > 0.0) {
            return Err(DegradationError::invalid_config(
                "mean_sigma",
                self.mean_sigma,
                "must be a finite value greater than 0",
            ));
        }
        if self.min_window_samples == 0 {
            return Err(DegradationError::invalid_config(
                "min_window_samples",
                self.min_window_samples,
                "must be at least 1",
            ));
        }
        if self.schema.sensor_prefix.is_empty() {
            return Err(DegradationError::invalid_config(
                "schema.sensor_prefix",
                "\"\"",
                "must not be empty",
            ));
        }
        Ok(())
    }

    /// Index of the first late-stage row for an entity of `n` rows.
    ///
    /// split = floor(n · (1 - late_fraction))
    pub fn split_index(&self, n: usize) -> usize {
        let split = (n as f64 * (1.0 - self.late_fraction)).floor() as usize;
        split.min(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.late_fraction, 0.3);
        assert_eq!(config.mean_sigma, 1.5);
        assert_eq!(config.min_entity_rows, 50);
        assert_eq!(config.min_window_samples, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_split_index() {
        let config = DetectorConfig::default();
        assert_eq!(config.split_index(100), 70);
        assert_eq!(config.split_index(50), 35);
        // floor(55 * 0.7) = 38
        assert_eq!(config.split_index(55), 38);
    }

    #[test]
    fn test_validate_rejects_bad_late_fraction() {
        for bad in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let config = DetectorConfig::with_thresholds(bad, 1.5);
            let err = config.validate().unwrap_err();
            assert!(matches!(err, DegradationError::InvalidConfig { field: "late_fraction", .. }));
        }
    }

    #[test]
    fn test_validate_rejects_bad_mean_sigma() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = DetectorConfig::with_thresholds(0.3, bad);
            let err = config.validate().unwrap_err();
            assert!(matches!(err, DegradationError::InvalidConfig { field: "mean_sigma", .. }));
        }
    }

    #[test]
    fn test_validate_rejects_zero_sample_guard() {
        let config = DetectorConfig {
            min_window_samples: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mean_sigma": 2.0, "schema": {{"entity_column": "unit"}}}}"#).unwrap();

        let config = DetectorConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.mean_sigma, 2.0);
        assert_eq!(config.late_fraction, 0.3);
        assert_eq!(config.schema.entity_column, "unit");
        assert_eq!(config.schema.cycle_column, "cycle");
    }
}
