//! Observation Table: Dense Numeric Sensor Log
//!
//! Rows are observations, columns are named numeric fields. A missing
//! value is stored as `NaN` and is skipped by every statistic; it is
//! never imputed.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DegradationError, DegradationResult};

/// Identifier of one physical unit.
///
/// Entity ids arrive as numbers after coercion, so the key wraps the
/// bit pattern of a non-missing `f64` (with `-0.0` folded into `0.0`).
/// Only equality is meaningful; `Ord` exists for stable listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey(u64);

impl EntityKey {
    /// Key for a raw cell value; `None` when the cell is missing.
    pub fn from_value(value: f64) -> Option<Self> {
        if value.is_nan() {
            return None;
        }
        let value = if value == 0.0 { 0.0 } else { value };
        Some(Self(value.to_bits()))
    }

    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

impl PartialOrd for EntityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().total_cmp(&other.value())
    }
}

impl Serialize for EntityKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.value();
        if v.fract() == 0.0 && v.abs() < 1e15 {
            write!(f, "{}", v as i64)
        } else {
            write!(f, "{}", v)
        }
    }
}

/// Column naming convention the detector relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    /// Grouping key column
    pub entity_column: String,
    /// Ordering column within an entity
    pub cycle_column: String,
    /// Any column whose name starts with this prefix is a sensor
    pub sensor_prefix: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            entity_column: "engine_id".to_string(),
            cycle_column: "cycle".to_string(),
            sensor_prefix: "sensor_".to_string(),
        }
    }
}

/// Column indices resolved against a concrete table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub entity: usize,
    pub cycle: usize,
    /// Sensor column indices in table order
    pub sensors: Vec<usize>,
}

/// Row indices of one entity, sorted ascending by cycle.
#[derive(Debug, Clone)]
pub struct EntityRows {
    pub key: EntityKey,
    pub rows: Vec<usize>,
}

impl EntityRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Tabular sensor log: named columns over a dense `rows × columns` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl ObservationTable {
    /// Build a table, checking that names are unique and match the width.
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> DegradationResult<Self> {
        if values.ncols() != columns.len() {
            return Err(DegradationError::ShapeMismatch {
                expected: columns.len(),
                actual: values.ncols(),
            });
        }

        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(DegradationError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self { columns, values })
    }

    /// Build a table from row vectors (each must have one value per column).
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: &[Vec<f64>],
    ) -> DegradationResult<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let width = columns.len();

        let mut flat = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(DegradationError::ShapeMismatch {
                    expected: width,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }

        let values = Array2::from_shape_vec((rows.len(), width), flat)
            .map_err(|_| DegradationError::ShapeMismatch { expected: width, actual: 0 })?;
        Self::new(columns, values)
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of a named column, or `None` if absent.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|j| self.values.column(j))
    }

    pub fn column_at(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.column(index)
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.values.row(index)
    }

    /// Indices of columns whose name starts with `prefix`.
    pub fn columns_with_prefix(&self, prefix: &str) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, name)| name.starts_with(prefix))
            .map(|(j, _)| j)
            .collect()
    }

    /// Resolve the schema's columns, failing fast on anything missing.
    pub fn resolve(&self, schema: &TableSchema) -> DegradationResult<ResolvedColumns> {
        let entity = self
            .column_index(&schema.entity_column)
            .ok_or_else(|| DegradationError::MissingColumn(schema.entity_column.clone()))?;
        let cycle = self
            .column_index(&schema.cycle_column)
            .ok_or_else(|| DegradationError::MissingColumn(schema.cycle_column.clone()))?;

        let sensors: Vec<usize> = self
            .columns_with_prefix(&schema.sensor_prefix)
            .into_iter()
            .filter(|&j| j != entity && j != cycle)
            .collect();
        if sensors.is_empty() {
            return Err(DegradationError::NoSensorColumns {
                prefix: schema.sensor_prefix.clone(),
            });
        }

        Ok(ResolvedColumns { entity, cycle, sensors })
    }

    /// Group rows by entity, each group sorted ascending by cycle.
    ///
    /// Groups are returned in order of first appearance. Rows with a
    /// missing entity id belong to no group. The sort is stable and
    /// places missing cycles last.
    pub fn group_by_entity(&self, entity_col: usize, cycle_col: usize) -> Vec<EntityRows> {
        let entity_ids = self.values.column(entity_col);
        let cycles = self.values.column(cycle_col);

        let mut slot: HashMap<EntityKey, usize> = HashMap::new();
        let mut groups: Vec<EntityRows> = Vec::new();

        for (i, &id) in entity_ids.iter().enumerate() {
            let Some(key) = EntityKey::from_value(id) else {
                continue;
            };
            let g = *slot.entry(key).or_insert_with(|| {
                groups.push(EntityRows { key, rows: Vec::new() });
                groups.len() - 1
            });
            groups[g].rows.push(i);
        }

        for group in &mut groups {
            group.rows.sort_by(|&a, &b| cmp_missing_last(cycles[a], cycles[b]));
        }

        groups
    }

    /// Copy of the selected rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> ObservationTable {
        Self {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }
}

/// Ascending order with missing values last; ties keep input order.
pub(crate) fn cmp_missing_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}
