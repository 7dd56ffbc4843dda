//! Run-to-Failure Fleet: Synthetic Wear Trajectories
//!
//! Each engine runs from cycle 1 until its failure cycle. Before the
//! wear onset every sensor is stationary noise around its nominal
//! level; after onset, drifting sensors move by
//!
//!   Δ = gain · σ · w(t)²,   w(t) = (t - t_onset) / (t_fail - t_onset)
//!
//! so the shift at failure is `gain` noise standard deviations.
//! Zero-noise channels stay constant for the whole life.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{DegradationError, DegradationResult};
use crate::table::loader::{standard_columns, OPERATIONAL_SETTINGS, SENSOR_CHANNELS};
use crate::table::ObservationTable;

/// Behaviour of one sensor channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorProfile {
    /// Nominal level
    pub nominal: f64,
    /// Measurement noise σ (0 = constant channel)
    pub noise_std: f64,
    /// Signed shift at failure, in units of σ
    pub wear_gain: f64,
}

impl SensorProfile {
    pub fn new(nominal: f64, noise_std: f64, wear_gain: f64) -> Self {
        Self { nominal, noise_std, wear_gain }
    }
}

/// Default 21-channel profile: a few constant channels, a few drifting
/// upward, a few downward, the rest flat noise.
pub fn default_sensor_profiles() -> Vec<SensorProfile> {
    (0..SENSOR_CHANNELS)
        .map(|k| match k {
            0 | 4 | 9 | 15 | 17 | 18 => SensorProfile::new(500.0 + k as f64, 0.0, 0.0),
            1 | 2 | 3 | 10 | 14 | 16 => SensorProfile::new(600.0 + 10.0 * k as f64, 0.5, 6.0),
            6 | 11 | 19 | 20 => SensorProfile::new(40.0 + k as f64, 0.2, -6.0),
            _ => SensorProfile::new(100.0 + k as f64, 0.1, 0.0),
        })
        .collect()
}

/// A single engine degrading toward failure
#[derive(Debug, Clone)]
pub struct WearingEngine {
    id: u32,
    cycle: u32,
    onset_cycle: u32,
    failure_cycle: u32,
    profiles: Vec<SensorProfile>,
    noise: Vec<Normal<f64>>,
    op_noise: [Normal<f64>; 2],
}

impl WearingEngine {
    /// Create an engine; `onset_cycle` may exceed `failure_cycle` for a unit that never wears.
    pub fn new(
        id: u32,
        onset_cycle: u32,
        failure_cycle: u32,
        profiles: Vec<SensorProfile>,
    ) -> DegradationResult<Self> {
        let noise = profiles
            .iter()
            .map(|p| normal(0.0, p.noise_std, "noise_std"))
            .collect::<DegradationResult<Vec<_>>>()?;

        Ok(Self {
            id,
            cycle: 0,
            onset_cycle,
            failure_cycle,
            profiles,
            noise,
            op_noise: [normal(0.0, 0.002, "op_noise")?, normal(0.0, 0.0003, "op_noise")?],
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn onset_cycle(&self) -> u32 {
        self.onset_cycle
    }

    pub fn failure_cycle(&self) -> u32 {
        self.failure_cycle
    }

    pub fn has_failed(&self) -> bool {
        self.cycle >= self.failure_cycle
    }

    /// Wear level in [0, 1] at the current cycle
    pub fn wear(&self) -> f64 {
        if self.cycle < self.onset_cycle || self.failure_cycle <= self.onset_cycle {
            return 0.0;
        }
        let span = (self.failure_cycle - self.onset_cycle) as f64;
        ((self.cycle - self.onset_cycle) as f64 / span).min(1.0)
    }

    /// Advance one cycle and emit a row in the standard layout.
    ///
    /// Returns `None` once the engine has reached its failure cycle.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Option<Vec<f64>> {
        if self.has_failed() {
            return None;
        }
        self.cycle += 1;

        let w = self.wear();
        let mut row = Vec::with_capacity(2 + OPERATIONAL_SETTINGS + self.profiles.len());
        row.push(self.id as f64);
        row.push(self.cycle as f64);
        row.push(self.op_noise[0].sample(rng));
        row.push(self.op_noise[1].sample(rng));
        row.push(100.0);

        for (profile, noise) in self.profiles.iter().zip(&self.noise) {
            let drift = profile.wear_gain * profile.noise_std * w * w;
            row.push(profile.nominal + drift + noise.sample(rng));
        }

        Some(row)
    }

    /// Run to failure, returning every emitted row.
    pub fn run<R: Rng>(&mut self, rng: &mut R) -> Vec<Vec<f64>> {
        let mut rows = Vec::with_capacity(self.failure_cycle.saturating_sub(self.cycle) as usize);
        while let Some(row) = self.step(rng) {
            rows.push(row);
        }
        rows
    }
}

/// Fleet generation parameters
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Number of engines
    pub n_engines: usize,
    /// Shortest and longest life in cycles
    pub life_range: (u32, u32),
    /// Wear onset as a fraction of life
    pub onset_fraction: f64,
    /// Fraction of engines that never wear
    pub healthy_fraction: f64,
    /// Number of additional engines with lives below `life_range.0`
    pub short_lived: usize,
    /// Probability that any sensor reading is missing
    pub missing_rate: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            n_engines: 20,
            life_range: (128, 320),
            onset_fraction: 0.5,
            healthy_fraction: 0.2,
            short_lived: 2,
            missing_rate: 0.0,
        }
    }
}

/// Ground truth for one simulated engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTruth {
    pub id: u32,
    pub failure_cycle: u32,
    /// `None` for engines that never wear
    pub onset_cycle: Option<u32>,
}

/// Simulated observation table with its ground truth
#[derive(Debug, Clone)]
pub struct SimulatedFleet {
    pub table: ObservationTable,
    pub truth: Vec<EngineTruth>,
}

/// Generates fleets of [`WearingEngine`]s in the standard column layout
#[derive(Debug, Clone, Default)]
pub struct FleetSimulator {
    config: FleetConfig,
    profiles: Option<Vec<SensorProfile>>,
}

impl FleetSimulator {
    pub fn new(config: FleetConfig) -> Self {
        Self { config, profiles: None }
    }

    /// Use custom sensor profiles (must have 21 channels).
    pub fn with_profiles(mut self, profiles: Vec<SensorProfile>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    pub fn generate<R: Rng>(&self, rng: &mut R) -> DegradationResult<SimulatedFleet> {
        let (min_life, max_life) = self.config.life_range;
        if min_life < 2 || max_life < min_life {
            return Err(DegradationError::invalid_config(
                "life_range",
                format!("{:?}", self.config.life_range),
                "need 2 <= min <= max",
            ));
        }

        let profiles = self.profiles.clone().unwrap_or_else(default_sensor_profiles);
        if profiles.len() != SENSOR_CHANNELS {
            return Err(DegradationError::ShapeMismatch {
                expected: SENSOR_CHANNELS,
                actual: profiles.len(),
            });
        }

        let mut rows = Vec::new();
        let mut truth = Vec::new();
        let total = self.config.n_engines + self.config.short_lived;

        for k in 0..total {
            let id = k as u32 + 1;
            let life = if k < self.config.n_engines {
                rng.random_range(min_life..=max_life)
            } else {
                rng.random_range((min_life / 4).max(2)..=(min_life / 3).max(2))
            };

            let healthy = rng.random::<f64>() < self.config.healthy_fraction;
            let onset = (life as f64 * self.config.onset_fraction).round() as u32;
            let onset_cycle = if healthy { None } else { Some(onset) };

            let mut engine = WearingEngine::new(id, onset_cycle.unwrap_or(u32::MAX), life, profiles.clone())?;
            for mut row in engine.run(rng) {
                if self.config.missing_rate > 0.0 {
                    for value in row.iter_mut().skip(2 + OPERATIONAL_SETTINGS) {
                        if rng.random::<f64>() < self.config.missing_rate {
                            *value = f64::NAN;
                        }
                    }
                }
                rows.push(row);
            }

            truth.push(EngineTruth { id, failure_cycle: life, onset_cycle });
        }

        let table = ObservationTable::from_rows(standard_columns(), &rows)?;
        Ok(SimulatedFleet { table, truth })
    }
}

fn normal(mean: f64, std: f64, field: &'static str) -> DegradationResult<Normal<f64>> {
    Normal::new(mean, std)
        .map_err(|_| DegradationError::invalid_config(field, std, "must be finite and non-negative"))
}
