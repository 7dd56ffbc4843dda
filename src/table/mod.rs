//! Table Module: Observation Storage, Loading and Labeled Output
//!
//! - `observation`: dense numeric table, schema resolution, entity grouping
//! - `loader`: whitespace-separated (optionally gzipped) run-to-failure logs
//! - `labeled`: the table plus its degradation column, with exports

mod observation;
mod labeled;
pub mod loader;

pub use observation::{
    EntityKey,
    EntityRows,
    ObservationTable,
    ResolvedColumns,
    TableSchema,
};
pub use labeled::{LabeledTable, RunSummary, SeriesPoint, LABEL_COLUMN};
pub use loader::{load_whitespace_table, parse_whitespace_table, standard_columns, LoadStats};
