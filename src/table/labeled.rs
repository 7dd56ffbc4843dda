//! Labeled Table: Observations Plus the Degradation Column
//!
//! The mask is attached once and only exposed read-only. Downstream
//! consumers filter, export or plot by it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::observation::{cmp_missing_last, EntityKey, ObservationTable};
use crate::detection::{DetectionReport, EntityVerdict};
use crate::error::{DegradationError, DegradationResult};

/// Name of the label column in exports
pub const LABEL_COLUMN: &str = "is_degraded";

/// Row and entity counts for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows_total: usize,
    pub rows_clean: usize,
    pub rows_degraded: usize,
    pub entities_total: usize,
    pub entities_degraded: usize,
}

/// One point of an entity/sensor series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub cycle: f64,
    /// Sensor reading; NaN when missing
    pub value: f64,
    pub is_degraded: bool,
}

/// Observation table with a row-aligned degradation label
#[derive(Debug, Clone)]
pub struct LabeledTable {
    table: ObservationTable,
    report: DetectionReport,
}

impl LabeledTable {
    pub(crate) fn new(table: ObservationTable, report: DetectionReport) -> Self {
        debug_assert_eq!(table.n_rows(), report.mask.len());
        Self { table, report }
    }

    pub fn table(&self) -> &ObservationTable {
        &self.table
    }

    pub fn mask(&self) -> &[bool] {
        &self.report.mask
    }

    pub fn verdicts(&self) -> &[EntityVerdict] {
        &self.report.verdicts
    }

    pub fn report(&self) -> &DetectionReport {
        &self.report
    }

    pub fn summary(&self) -> RunSummary {
        let rows_degraded = self.report.degraded_count();
        RunSummary {
            rows_total: self.table.n_rows(),
            rows_clean: self.table.n_rows() - rows_degraded,
            rows_degraded,
            entities_total: self.report.verdicts.len(),
            entities_degraded: self.report.degraded_entities().count(),
        }
    }

    /// Indices of unlabeled rows, in input order
    pub fn clean_rows(&self) -> Vec<usize> {
        self.rows_where(false)
    }

    /// Indices of labeled rows, in input order
    pub fn degraded_rows(&self) -> Vec<usize> {
        self.rows_where(true)
    }

    fn rows_where(&self, label: bool) -> Vec<usize> {
        self.report
            .mask
            .iter()
            .enumerate()
            .filter_map(|(i, &m)| if m == label { Some(i) } else { None })
            .collect()
    }

    /// Distinct entity ids, ascending
    pub fn entities(&self) -> Vec<EntityKey> {
        let mut keys: Vec<EntityKey> = self.report.verdicts.iter().map(|v| v.entity).collect();
        keys.sort();
        keys
    }

    /// Names of the columns the detector treated as sensors
    pub fn sensor_columns(&self, prefix: &str) -> Vec<&str> {
        self.table
            .columns_with_prefix(prefix)
            .into_iter()
            .map(|j| self.table.columns()[j].as_str())
            .collect()
    }

    /// Cycle-ordered series of one sensor for one entity.
    pub fn entity_sensor_view(
        &self,
        entity_column: &str,
        cycle_column: &str,
        entity: EntityKey,
        sensor: &str,
    ) -> DegradationResult<Vec<SeriesPoint>> {
        let ids = self
            .table
            .column(entity_column)
            .ok_or_else(|| DegradationError::UnknownColumn(entity_column.to_string()))?;
        let cycles = self
            .table
            .column(cycle_column)
            .ok_or_else(|| DegradationError::UnknownColumn(cycle_column.to_string()))?;
        let readings = self
            .table
            .column(sensor)
            .ok_or_else(|| DegradationError::UnknownColumn(sensor.to_string()))?;

        let mut points: Vec<SeriesPoint> = ids
            .iter()
            .enumerate()
            .filter(|(_, id)| EntityKey::from_value(**id) == Some(entity))
            .map(|(i, _)| SeriesPoint {
                cycle: cycles[i],
                value: readings[i],
                is_degraded: self.report.mask[i],
            })
            .collect();

        if points.is_empty() {
            return Err(DegradationError::UnknownEntity(entity.to_string()));
        }

        points.sort_by(|a, b| cmp_missing_last(a.cycle, b.cycle));
        Ok(points)
    }

    /// Write the unlabeled rows as CSV.
    pub fn write_clean_csv(&self, path: impl AsRef<Path>) -> DegradationResult<usize> {
        self.write_rows_csv_file(path, false)
    }

    /// Write the labeled rows as CSV.
    pub fn write_degraded_csv(&self, path: impl AsRef<Path>) -> DegradationResult<usize> {
        self.write_rows_csv_file(path, true)
    }

    fn write_rows_csv_file(&self, path: impl AsRef<Path>, label: bool) -> DegradationResult<usize> {
        let path = path.as_ref();
        let written = self.write_rows_csv(File::create(path)?, label)?;
        info!(path = %path.display(), rows = written, degraded = label, "exported rows");
        Ok(written)
    }

    /// Write header plus every row whose label equals `label`.
    ///
    /// Missing values become empty fields. Returns the number of data rows.
    pub fn write_rows_csv<W: Write>(&self, writer: W, label: bool) -> DegradationResult<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = self.table.columns().iter().map(String::as_str).collect();
        header.push(LABEL_COLUMN);
        csv_writer.write_record(&header)?;

        let rows = self.rows_where(label);
        for &i in &rows {
            let mut record: Vec<String> = self
                .table
                .row(i)
                .iter()
                .map(|v| format_cell(*v))
                .collect();
            record.push(label.to_string());
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(rows.len())
    }

    /// Write the run summary and per-entity verdicts as pretty JSON.
    pub fn write_summary_json(&self, path: impl AsRef<Path>) -> DegradationResult<()> {
        #[derive(Serialize)]
        struct SummaryDocument<'a> {
            summary: RunSummary,
            entities: &'a [EntityVerdict],
        }

        let document = SummaryDocument {
            summary: self.summary(),
            entities: &self.report.verdicts,
        };

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.flush()?;
        Ok(())
    }
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DegradationDetector;

    /// Engine 1 drifts sharply in its last 30 cycles, engine 2 stays flat with noise
    fn labeled_fleet() -> LabeledTable {
        let mut rows = Vec::new();
        for id in [1.0, 2.0] {
            for cycle in 1..=100 {
                let noise = if cycle % 2 == 0 { 0.5 } else { -0.5 };
                let drift = if id == 1.0 && cycle > 70 { 10.0 } else { 0.0 };
                let sensor_2 = if cycle == 5 { f64::NAN } else { 3.0 };
                rows.push(vec![id, cycle as f64, 100.0, 20.0 + noise + drift, sensor_2]);
            }
        }
        let table = ObservationTable::from_rows(
            ["engine_id", "cycle", "op_1", "sensor_1", "sensor_2"],
            &rows,
        )
        .unwrap();
        DegradationDetector::default().label(table).unwrap()
    }

    #[test]
    fn test_summary_counts() {
        let labeled = labeled_fleet();
        let summary = labeled.summary();
        assert_eq!(summary.rows_total, 200);
        assert_eq!(summary.rows_degraded, 30);
        assert_eq!(summary.rows_clean, 170);
        assert_eq!(summary.entities_total, 2);
        assert_eq!(summary.entities_degraded, 1);
    }

    #[test]
    fn test_clean_and_degraded_rows_partition() {
        let labeled = labeled_fleet();
        let clean = labeled.clean_rows();
        let degraded = labeled.degraded_rows();
        assert_eq!(clean.len() + degraded.len(), 200);
        assert_eq!(degraded, (70..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_entity_sensor_view() {
        let labeled = labeled_fleet();
        let engine = EntityKey::from_value(1.0).unwrap();
        let view = labeled
            .entity_sensor_view("engine_id", "cycle", engine, "sensor_1")
            .unwrap();

        assert_eq!(view.len(), 100);
        assert_eq!(view[0].cycle, 1.0);
        assert!(!view[69].is_degraded);
        assert!(view[70].is_degraded);
        assert_eq!(view.iter().filter(|p| p.is_degraded).count(), 30);
    }

    #[test]
    fn test_entity_sensor_view_errors() {
        let labeled = labeled_fleet();
        let engine = EntityKey::from_value(9.0).unwrap();
        assert!(matches!(
            labeled.entity_sensor_view("engine_id", "cycle", engine, "sensor_1"),
            Err(DegradationError::UnknownEntity(_))
        ));

        let engine = EntityKey::from_value(1.0).unwrap();
        assert!(matches!(
            labeled.entity_sensor_view("engine_id", "cycle", engine, "sensor_99"),
            Err(DegradationError::UnknownColumn(_))
        ));
    }

    #[test]
    fn test_csv_export() {
        let labeled = labeled_fleet();
        let mut buffer = Vec::new();
        let written = labeled.write_rows_csv(&mut buffer, true).unwrap();
        assert_eq!(written, 30);

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "engine_id,cycle,op_1,sensor_1,sensor_2,is_degraded"
        );
        assert_eq!(lines.next().unwrap(), "1,71,100,29.5,3,true");
        assert_eq!(text.lines().count(), 31);
    }

    #[test]
    fn test_csv_export_missing_values_empty() {
        let labeled = labeled_fleet();
        let mut buffer = Vec::new();
        labeled.write_rows_csv(&mut buffer, false).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let row = text.lines().nth(5).unwrap();
        assert_eq!(row, "1,5,100,19.5,,false");
    }

    #[test]
    fn test_file_exports() {
        let labeled = labeled_fleet();
        let dir = tempfile::tempdir().unwrap();

        let clean_path = dir.path().join("clean_rows.csv");
        let degraded_path = dir.path().join("degraded_rows.csv");
        let summary_path = dir.path().join("summary.json");

        assert_eq!(labeled.write_clean_csv(&clean_path).unwrap(), 170);
        assert_eq!(labeled.write_degraded_csv(&degraded_path).unwrap(), 30);
        labeled.write_summary_json(&summary_path).unwrap();

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(summary_path).unwrap()).unwrap();
        assert_eq!(summary["summary"]["rows_degraded"], 30);
        assert_eq!(summary["entities"][0]["status"]["status"], "degraded");
        assert_eq!(summary["entities"][0]["status"]["sensor"], "sensor_1");
    }

    #[test]
    fn test_entities_sorted() {
        let labeled = labeled_fleet();
        let ids: Vec<String> = labeled.entities().iter().map(|k| k.to_string()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(labeled.sensor_columns("sensor_"), vec!["sensor_1", "sensor_2"]);
    }
}
