//! Fleet Module: Synthetic Run-to-Failure Data
//!
//! Generates engines whose sensors drift after a wear onset, in the
//! same column layout the loader produces. Used by the demo binary and
//! as a test bed for the detector.

mod wear;

pub use wear::{
    default_sensor_profiles,
    EngineTruth,
    FleetConfig,
    FleetSimulator,
    SensorProfile,
    SimulatedFleet,
    WearingEngine,
};
