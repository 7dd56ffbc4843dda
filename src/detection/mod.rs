//! Detection Module: Baseline-Relative Degradation Labeling
//!
//! Labels the late-stage rows of every entity whose late-life sensor
//! behaviour departs from its own early-life baseline.
//!
//! ## Procedure (per entity)
//!
//! 1. Sort rows by cycle; skip the entity if it has fewer than
//!    `min_entity_rows` rows.
//! 2. Split at s = floor(n · (1 - late_fraction)):
//!    baseline = rows [0, s), late stage = rows [s, n).
//! 3. For each sensor, with missing values dropped per window:
//!
//!      |μ_late - μ_base| > mean_sigma · σ_base,   σ_base > 0
//!
//!    Sensors with fewer than `min_window_samples` readings in either
//!    window, or a constant baseline, give no evidence.
//! 4. Any single sensor is enough; the late stage is then labeled.
//!
//! Entities never interact, so they are evaluated in parallel and the
//! results written to disjoint positions of the row mask.

mod config;
mod detector;
mod shift;

pub use config::{
    DetectorConfig,
    DEFAULT_LATE_FRACTION,
    DEFAULT_MEAN_SIGMA,
    DEFAULT_MIN_ENTITY_ROWS,
    DEFAULT_MIN_WINDOW_SAMPLES,
};
pub use detector::{
    DegradationDetector,
    DetectionReport,
    EntityStatus,
    EntityVerdict,
};
pub use shift::{MeanShiftTest, ShiftOutcome, WindowStats};
