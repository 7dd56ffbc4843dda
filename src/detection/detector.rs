//! Degradation Detector: Per-Entity Baseline/Late-Stage Segmentation
//!
//! Each entity's rows are sorted by cycle and split at
//! floor(n · (1 - late_fraction)). The entity is degraded when any
//! sensor's late-stage mean departs from its baseline mean by more than
//! `mean_sigma` baseline standard deviations; only its late rows are
//! then labeled.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use super::config::DetectorConfig;
use super::shift::{MeanShiftTest, ShiftOutcome, WindowStats};
use crate::error::DegradationResult;
use crate::table::{EntityKey, EntityRows, LabeledTable, ObservationTable, ResolvedColumns};

/// Decision for a single entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntityStatus {
    /// Too few rows for a reliable baseline; nothing labeled
    InsufficientHistory,
    /// No sensor shifted beyond the threshold
    Stable,
    /// First sensor (in column order) whose shift exceeded the threshold
    Degraded { sensor: String, sigmas: f64 },
}

/// Per-entity detection result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityVerdict {
    pub entity: EntityKey,
    /// Rows belonging to the entity
    pub n_rows: usize,
    /// Position (in cycle order) of the first late-stage row
    pub split_index: usize,
    pub status: EntityStatus,
}

impl EntityVerdict {
    pub fn is_degraded(&self) -> bool {
        matches!(self.status, EntityStatus::Degraded { .. })
    }

    /// Number of rows this verdict labels as degraded
    pub fn labeled_rows(&self) -> usize {
        if self.is_degraded() {
            self.n_rows - self.split_index
        } else {
            0
        }
    }
}

/// Full output of one detection run
#[derive(Debug, Clone)]
pub struct DetectionReport {
    /// One label per input row, in input order
    pub mask: Vec<bool>,
    /// One verdict per entity, in order of first appearance
    pub verdicts: Vec<EntityVerdict>,
}

impl DetectionReport {
    pub fn degraded_count(&self) -> usize {
        self.mask.iter().filter(|&&x| x).count()
    }

    pub fn degraded_entities(&self) -> impl Iterator<Item = &EntityVerdict> {
        self.verdicts.iter().filter(|v| v.is_degraded())
    }

    pub fn verdict(&self, entity: EntityKey) -> Option<&EntityVerdict> {
        self.verdicts.iter().find(|v| v.entity == entity)
    }
}

/// Baseline-relative mean-shift detector
///
/// Configuration is validated at construction and immutable afterwards;
/// detection itself is a pure function of the table.
#[derive(Debug, Clone)]
pub struct DegradationDetector {
    config: DetectorConfig,
    shift_test: MeanShiftTest,
}

impl DegradationDetector {
    /// Create a detector, rejecting invalid thresholds.
    pub fn new(config: DetectorConfig) -> DegradationResult<Self> {
        config.validate()?;
        let shift_test = MeanShiftTest::new(config.mean_sigma, config.min_window_samples);
        Ok(Self { config, shift_test })
    }

    /// Default guards and schema with custom thresholds
    pub fn with_thresholds(late_fraction: f64, mean_sigma: f64) -> DegradationResult<Self> {
        Self::new(DetectorConfig::with_thresholds(late_fraction, mean_sigma))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Label every row: `true` for late-stage rows of degraded entities.
    pub fn detect(&self, table: &ObservationTable) -> DegradationResult<Vec<bool>> {
        Ok(self.analyze(table)?.mask)
    }

    /// Run detection and attach the mask to the table.
    pub fn label(&self, table: ObservationTable) -> DegradationResult<LabeledTable> {
        let report = self.analyze(&table)?;
        Ok(LabeledTable::new(table, report))
    }

    /// Run detection, keeping the per-entity verdicts.
    pub fn analyze(&self, table: &ObservationTable) -> DegradationResult<DetectionReport> {
        let columns = table.resolve(&self.config.schema)?;
        let groups = table.group_by_entity(columns.entity, columns.cycle);

        // Entities are independent; each verdict only touches its own rows
        let verdicts: Vec<EntityVerdict> = groups
            .par_iter()
            .map(|group| self.assess_entity(table, &columns, group))
            .collect();

        let mut mask = vec![false; table.n_rows()];
        for (group, verdict) in groups.iter().zip(&verdicts) {
            if verdict.is_degraded() {
                for &row in &group.rows[verdict.split_index..] {
                    mask[row] = true;
                }
            }
        }

        let report = DetectionReport { mask, verdicts };
        info!(
            rows = table.n_rows(),
            entities = report.verdicts.len(),
            degraded_entities = report.degraded_entities().count(),
            degraded_rows = report.degraded_count(),
            "degradation detection complete"
        );

        Ok(report)
    }

    /// Decide one entity from its cycle-sorted rows.
    pub fn assess_entity(
        &self,
        table: &ObservationTable,
        columns: &ResolvedColumns,
        group: &EntityRows,
    ) -> EntityVerdict {
        let n = group.len();
        let split_index = self.config.split_index(n);

        if n < self.config.min_entity_rows {
            debug!(entity = %group.key, rows = n, "insufficient history, skipped");
            return EntityVerdict {
                entity: group.key,
                n_rows: n,
                split_index,
                status: EntityStatus::InsufficientHistory,
            };
        }

        let (baseline_rows, late_rows) = group.rows.split_at(split_index);
        let values = table.values();

        let mut status = EntityStatus::Stable;
        for &sensor in &columns.sensors {
            let baseline = WindowStats::from_values(baseline_rows.iter().map(|&i| values[[i, sensor]]));
            let late = WindowStats::from_values(late_rows.iter().map(|&i| values[[i, sensor]]));

            if let ShiftOutcome::Shifted { sigmas } = self.shift_test.evaluate(&baseline, &late) {
                status = EntityStatus::Degraded {
                    sensor: table.columns()[sensor].clone(),
                    sigmas,
                };
                break;
            }
        }

        debug!(entity = %group.key, rows = n, split_index, ?status, "entity assessed");

        EntityVerdict {
            entity: group.key,
            n_rows: n,
            split_index,
            status,
        }
    }
}

impl Default for DegradationDetector {
    fn default() -> Self {
        let config = DetectorConfig::default();
        let shift_test = MeanShiftTest::new(config.mean_sigma, config.min_window_samples);
        Self { config, shift_test }
    }
}
