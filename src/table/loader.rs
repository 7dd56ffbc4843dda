//! Whitespace-separated run-to-failure logs (optionally gzip-compressed).
//!
//! Layout per line: `engine_id cycle op_1 op_2 op_3 sensor_1 .. sensor_21`.
//! Every token is coerced to a number; anything unparseable becomes
//! missing. Short lines are padded with missing values, extra tokens
//! are dropped.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use ndarray::Array2;
use tracing::{info, warn};

use super::observation::ObservationTable;
use crate::error::{DegradationError, DegradationResult};

/// Number of operational-setting columns in the standard layout
pub const OPERATIONAL_SETTINGS: usize = 3;
/// Number of sensor columns in the standard layout
pub const SENSOR_CHANNELS: usize = 21;

/// Column names of the standard layout
pub fn standard_columns() -> Vec<String> {
    let mut columns = vec!["engine_id".to_string(), "cycle".to_string()];
    columns.extend((1..=OPERATIONAL_SETTINGS).map(|i| format!("op_{}", i)));
    columns.extend((1..=SENSOR_CHANNELS).map(|i| format!("sensor_{}", i)));
    columns
}

/// Line accounting from one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Non-blank lines turned into rows
    pub rows: usize,
    /// Lines padded because they had too few tokens
    pub short_lines: usize,
    /// Lines truncated because they had too many tokens
    pub long_lines: usize,
    /// Tokens that did not parse as numbers
    pub unparseable_cells: usize,
}

/// Load a file in the standard layout; `.gz` files are decompressed.
pub fn load_whitespace_table(path: impl AsRef<Path>) -> DegradationResult<(ObservationTable, LoadStats)> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    let reader: Box<dyn Read> = if is_gzip {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let (table, stats) = parse_whitespace_table(BufReader::new(reader), standard_columns())?;
    info!(
        path = %path.display(),
        rows = stats.rows,
        short_lines = stats.short_lines,
        long_lines = stats.long_lines,
        unparseable_cells = stats.unparseable_cells,
        "loaded observation table"
    );
    Ok((table, stats))
}

/// Parse whitespace-separated rows into a table with the given columns.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn parse_whitespace_table<R: BufRead>(
    mut reader: R,
    columns: Vec<String>,
) -> DegradationResult<(ObservationTable, LoadStats)> {
    let width = columns.len();
    if width == 0 {
        return Err(DegradationError::ShapeMismatch { expected: 1, actual: 0 });
    }

    let mut stats = LoadStats::default();
    let mut flat: Vec<f64> = Vec::new();
    let mut line = Vec::new();
    let mut line_no = 0usize;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_no += 1;

        let text = String::from_utf8_lossy(&line);
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        if tokens.len() < width {
            stats.short_lines += 1;
        } else if tokens.len() > width {
            stats.long_lines += 1;
            warn!(line = line_no, tokens = tokens.len(), expected = width, "extra fields dropped");
        }

        for j in 0..width {
            let value = match tokens.get(j) {
                Some(token) => parse_cell(token).unwrap_or_else(|| {
                    stats.unparseable_cells += 1;
                    f64::NAN
                }),
                None => f64::NAN,
            };
            flat.push(value);
        }
        stats.rows += 1;
    }

    let values = Array2::from_shape_vec((stats.rows, width), flat)
        .map_err(|_| DegradationError::ShapeMismatch { expected: width, actual: 0 })?;
    let table = ObservationTable::new(columns, values)?;
    Ok((table, stats))
}

/// Numeric coercion of a single token; `None` when it is not a number.
fn parse_cell(token: &str) -> Option<f64> {
    token.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn standard_line(engine: u32, cycle: u32, sensor_base: f64) -> String {
        let mut fields = vec![engine.to_string(), cycle.to_string()];
        fields.extend(["-0.0007", "-0.0004", "100.0"].iter().map(|s| s.to_string()));
        fields.extend((0..SENSOR_CHANNELS).map(|k| format!("{:.2}", sensor_base + k as f64)));
        fields.join(" ")
    }

    #[test]
    fn test_standard_columns() {
        let columns = standard_columns();
        assert_eq!(columns.len(), 26);
        assert_eq!(columns[0], "engine_id");
        assert_eq!(columns[4], "op_3");
        assert_eq!(columns[25], "sensor_21");
    }

    #[test]
    fn test_parse_coerces_and_pads() {
        let input = "1 1 0.5 x 2.0\n\n  1   2 0.5\n1 3 0.1 0.2 0.3 9 9\n";
        let columns: Vec<String> = ["engine_id", "cycle", "op_1", "sensor_1", "sensor_2"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let (table, stats) = parse_whitespace_table(Cursor::new(input), columns).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.short_lines, 1);
        assert_eq!(stats.long_lines, 1);
        assert_eq!(stats.unparseable_cells, 1);

        assert!(table.row(0)[3].is_nan());
        assert_eq!(table.row(0)[4], 2.0);
        assert!(table.row(1)[3].is_nan());
        assert!(table.row(1)[4].is_nan());
        assert_eq!(table.row(2)[4], 0.3);
    }

    #[test]
    fn test_parse_tolerates_invalid_utf8() {
        let mut input = b"1 1 ".to_vec();
        input.extend_from_slice(&[0xff, 0xfe]);
        input.extend_from_slice(b" 4.0\n");
        let columns: Vec<String> = ["engine_id", "cycle", "sensor_1", "sensor_2"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let (table, stats) = parse_whitespace_table(Cursor::new(input), columns).unwrap();
        assert_eq!(stats.unparseable_cells, 1);
        assert!(table.row(0)[2].is_nan());
        assert_eq!(table.row(0)[3], 4.0);
    }

    #[test]
    fn test_load_plain_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "{} ", standard_line(1, 1, 500.0)).unwrap();
        writeln!(file, "{} ", standard_line(1, 2, 501.0)).unwrap();

        let (table, stats) = load_whitespace_table(file.path()).unwrap();
        assert_eq!(stats.rows, 2);
        assert_eq!(table.n_columns(), 26);
        assert_eq!(table.column("sensor_1").unwrap()[1], 501.0);
        assert_eq!(table.column("op_3").unwrap()[0], 100.0);
    }

    #[test]
    fn test_load_gzip_file() {
        let file = tempfile::Builder::new().suffix(".txt.gz").tempfile().unwrap();
        {
            let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
            for cycle in 1..=3 {
                writeln!(encoder, "{}", standard_line(7, cycle, 600.0)).unwrap();
            }
            encoder.finish().unwrap();
        }

        let (table, _) = load_whitespace_table(file.path()).unwrap();
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.column("engine_id").unwrap()[2], 7.0);
        assert_eq!(table.column("cycle").unwrap()[2], 3.0);
    }

    #[test]
    fn test_missing_file() {
        let err = load_whitespace_table("/nonexistent/train_FD001.txt").unwrap_err();
        assert!(matches!(err, DegradationError::Io(_)));
    }
}
