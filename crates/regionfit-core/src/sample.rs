//! Sample sets: fixed-width tables of unique points.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::error::{RegionError, Result};

/// A fixed-width table of points with named columns.
///
/// Rows are unique by value: inserting a row equal to an existing one is a
/// no-op that reports `false`. Row order is insertion order.
///
/// # Example
///
/// ```
/// use regionfit_core::SampleSet;
///
/// let mut set = SampleSet::new(vec!["x".to_string(), "y".to_string()]);
/// assert!(set.insert(vec![1.0, 2.0]).unwrap());
/// assert!(!set.insert(vec![1.0, 2.0]).unwrap());
/// assert_eq!(set.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
    seen: HashSet<Vec<u64>>,
}

impl PartialEq for SampleSet {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }
}

// -0.0 and 0.0 must hash alike.
fn row_key(row: &[f64]) -> Vec<u64> {
    row.iter().map(|v| (v + 0.0).to_bits()).collect()
}

impl SampleSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Builds a set from rows, dropping duplicates.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        let mut set = Self::new(columns);
        for row in rows {
            set.insert(row)?;
        }
        Ok(set)
    }

    /// Inserts a row; returns whether it was new.
    pub fn insert(&mut self, row: Vec<f64>) -> Result<bool> {
        if row.len() != self.columns.len() {
            return Err(RegionError::DimensionMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        if self.seen.insert(row_key(&row)) {
            self.rows.push(row);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn contains(&self, row: &[f64]) -> bool {
        self.seen.contains(&row_key(row))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> &[f64] {
        &self.rows[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Keeps only the first `len` rows.
    pub fn truncate(&mut self, len: usize) {
        for row in self.rows.drain(len.min(self.rows.len())..) {
            self.seen.remove(&row_key(&row));
        }
    }

    /// New set holding the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut set = Self::new(self.columns.clone());
        for &idx in indices {
            let _ = set.insert(self.rows[idx].clone());
        }
        set
    }

    /// Re-aligns rows to `columns`: shared columns are copied, columns this
    /// set lacks are zero-filled, extra columns are dropped.
    pub fn aligned_to(&self, columns: &[String]) -> Self {
        let mapping: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let mut set = Self::new(columns.to_vec());
        for row in &self.rows {
            let aligned = mapping
                .iter()
                .map(|m| m.map_or(0.0, |idx| row[idx]))
                .collect();
            let _ = set.insert(aligned);
        }
        set
    }

    /// Splits off `name`, returning the remaining table and the removed column
    /// values (row-aligned), or `None` if the column does not exist.
    pub fn split_column(&self, name: &str) -> (Self, Option<Vec<f64>>) {
        let Some(idx) = self.column_index(name) else {
            return (self.clone(), None);
        };
        let columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, c)| c.clone())
            .collect();
        let mut rest = Self::new(columns);
        let mut removed = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            removed.push(row[idx]);
            let mut values = row.clone();
            values.remove(idx);
            rest.rows.push(values);
        }
        // Rows may collide once the column is gone; keep them row-aligned
        // with `removed` and only track keys.
        rest.seen = rest.rows.iter().map(|r| row_key(r)).collect();
        (rest, Some(removed))
    }

    /// Parses a comma-separated table with a header line.
    ///
    /// Blank lines are skipped; duplicate rows are dropped.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header)) = lines.next() else {
            return Err(RegionError::MalformedData {
                line: 1,
                message: "missing header".to_string(),
            });
        };
        let columns: Vec<String> = header
            .split(',')
            .map(|c| c.trim().trim_matches('"').to_string())
            .collect();

        let mut set = Self::new(columns);
        for (line_no, line) in lines {
            let row = line
                .split(',')
                .map(|cell| parse_cell(cell.trim()))
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| RegionError::MalformedData {
                    line: line_no + 1,
                    message: format!("non-numeric cell in '{line}'"),
                })?;
            set.insert(row).map_err(|err| RegionError::MalformedData {
                line: line_no + 1,
                message: err.to_string(),
            })?;
        }
        Ok(set)
    }

    /// Writes the table as CSV with a header line.
    pub fn to_csv_string(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{}", self.columns.join(","));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            let _ = writeln!(output, "{}", cells.join(","));
        }
        output
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    match cell.to_ascii_lowercase().as_str() {
        "true" => Some(1.0),
        "false" => Some(0.0),
        other => other.trim_matches('"').parse().ok(),
    }
}
