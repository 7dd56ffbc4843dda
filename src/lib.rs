//! # Engine Degradation
//!
//! Flags the degraded portion of each engine's life in multivariate
//! run-to-failure sensor logs, relative to that engine's own early-life
//! baseline.
//!
//! ## Method
//!
//! For every engine (entity) with enough history, rows are ordered by
//! cycle and split into a baseline window and a late-stage window
//! (the last `late_fraction` of the rows). A sensor is evidence of
//! degradation when
//!
//!   |μ_late - μ_base| > mean_sigma · σ_base
//!
//! with σ_base > 0. One such sensor marks the engine degraded, and
//! every late-stage row of that engine is labeled.
//!
//! ## Layout
//!
//! - `table`: observation table, file loader, labeled output and exports
//! - `detection`: configuration, the per-sensor shift test and the detector
//! - `fleet`: synthetic run-to-failure fleets for demos and tests
//!
//! ## Example
//!
//! ```no_run
//! use engine_degradation::{load_whitespace_table, DegradationDetector};
//!
//! let (table, _stats) = load_whitespace_table("train_FD001.txt").unwrap();
//! let labeled = DegradationDetector::default().label(table).unwrap();
//! println!("{:?}", labeled.summary());
//! ```

pub mod error;
pub mod table;
pub mod detection;
pub mod fleet;

pub use error::{DegradationError, DegradationResult};

// Re-exports from table
pub use table::{
    EntityKey,
    LabeledTable,
    ObservationTable,
    RunSummary,
    SeriesPoint,
    TableSchema,
    LoadStats,
    load_whitespace_table,
    parse_whitespace_table,
    standard_columns,
};

// Re-exports from detection
pub use detection::{
    DegradationDetector,
    DetectionReport,
    DetectorConfig,
    EntityStatus,
    EntityVerdict,
    MeanShiftTest,
    ShiftOutcome,
};

// Re-exports from fleet
pub use fleet::{
    FleetConfig,
    FleetSimulator,
    SimulatedFleet,
};
