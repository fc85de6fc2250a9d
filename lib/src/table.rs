//! Scraped table model: typed cells, header-row cleanup and conversion into a
//! homogeneous [`DataFrame`].

use crate::{error::Error, Result};
use itertools::Itertools;
use polars::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CellKind {
    Number,
    Text,
}

impl Cell {
    /// Parses one scraped cell. Thousands separators are accepted in numbers.
    pub fn parse(raw: &str) -> Cell {
        let s = raw.trim();
        if s.is_empty() {
            return Cell::Missing;
        }
        let numeric_shape = s.bytes().any(|b| b.is_ascii_digit())
            && s.bytes().all(|b| b.is_ascii_digit() || b"+-.,eE".contains(&b));
        if !numeric_shape {
            return Cell::Text(s.to_string());
        }
        let plain = s.replace(',', "");
        if let Ok(i) = plain.parse::<i64>() {
            Cell::Int(i)
        } else if let Ok(f) = plain.parse::<f64>() {
            Cell::Float(f)
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn kind(&self) -> Option<CellKind> {
        match self {
            Cell::Missing => None,
            Cell::Int(_) | Cell::Float(_) => Some(CellKind::Number),
            Cell::Text(_) => Some(CellKind::Text),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Cell::Missing => String::new(),
            Cell::Int(i) => i.to_string(),
            // Debug keeps the trailing `.0` on integral floats.
            Cell::Float(f) => format!("{:?}", f),
            Cell::Text(s) => s.clone(),
        }
    }

    pub fn is_text(&self, other: &str) -> bool {
        matches!(self, Cell::Text(s) if s == other)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Builds a table from scraped rows, taking the row at `header_row` as the
    /// column names and discarding everything above it.
    pub fn from_rows(rows: Vec<Vec<String>>, header_row: usize) -> Result<Self> {
        let total = rows.len();
        let mut rows = rows.into_iter().skip(header_row);
        let header = rows.next().ok_or(Error::HeaderRowMissing {
            header_row,
            rows: total,
        })?;
        let headers = dedupe_headers(header);
        let width = headers.len();

        let rows = rows
            .map(|row| {
                let mut cells: Vec<Cell> = row.iter().take(width).map(|s| Cell::parse(s)).collect();
                cells.resize(width, Cell::Missing);
                cells
            })
            .collect();

        Ok(RawTable { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Drops repeated header rows, fills missing cells with zero and removes
    /// the index column.
    ///
    /// A row is a repeated header when its `marker_column` cell holds the
    /// column's own name. Without that column a row must repeat the whole
    /// header to be dropped.
    pub fn normalize(mut self, marker_column: &str, index_column: &str) -> Self {
        log::trace!("table::normalize");
        let before = self.rows.len();
        match self.column_index(marker_column) {
            Some(idx) => self.rows.retain(|row| !row[idx].is_text(marker_column)),
            None => {
                let headers = self.headers.clone();
                self.rows
                    .retain(|row| !row.iter().zip(&headers).all(|(c, h)| c.is_text(h)));
            }
        }
        log::debug!("dropped {} repeated header rows", before - self.rows.len());

        for cell in self.rows.iter_mut().flatten() {
            if *cell == Cell::Missing {
                *cell = Cell::Int(0);
            }
        }

        if let Some(idx) = self.column_index(index_column) {
            self.headers.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
        self
    }

    /// Converts every column holding both numbers and text to text. Returns
    /// the names of the converted columns.
    pub fn coerce_mixed_columns(&mut self) -> Vec<String> {
        let mut coerced = Vec::new();
        for (idx, name) in self.headers.iter().enumerate() {
            let kinds = self.rows.iter().filter_map(|row| row[idx].kind()).unique().count();
            if kinds > 1 {
                for row in &mut self.rows {
                    if !matches!(row[idx], Cell::Missing) {
                        row[idx] = Cell::Text(row[idx].to_text());
                    }
                }
                coerced.push(name.clone());
            }
        }
        coerced
    }

    /// Builds a data frame with one homogeneous dtype per column: `Int64` for
    /// integer columns, `Float64` when any float is present, `String`
    /// otherwise. Mixed columns are coerced to text first.
    pub fn into_frame(mut self) -> Result<DataFrame> {
        let coerced = self.coerce_mixed_columns();
        if !coerced.is_empty() {
            log::debug!("coerced mixed columns to text: {}", coerced.join(", "));
        }

        let columns = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| column_series(name, self.rows.iter().map(|row| &row[idx])))
            .collect::<Vec<_>>();
        Ok(DataFrame::new(columns)?)
    }
}

fn column_series<'a>(name: &str, cells: impl Iterator<Item = &'a Cell> + Clone) -> Series {
    let mut has_int = false;
    let mut has_float = false;
    let mut has_text = false;
    for cell in cells.clone() {
        match cell {
            Cell::Int(_) => has_int = true,
            Cell::Float(_) => has_float = true,
            Cell::Text(_) => has_text = true,
            Cell::Missing => {}
        }
    }

    if !has_text && has_float {
        let values: Vec<Option<f64>> = cells
            .map(|c| match c {
                Cell::Int(i) => Some(*i as f64),
                Cell::Float(f) => Some(*f),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else if !has_text && has_int {
        let values: Vec<Option<i64>> = cells
            .map(|c| match c {
                Cell::Int(i) => Some(*i),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else {
        let values: Vec<Option<String>> = cells
            .map(|c| match c {
                Cell::Missing => None,
                other => Some(other.to_text()),
            })
            .collect();
        Series::new(name, values)
    }
}

/// Blank names become `Unnamed: {i}` and repeats get a `.{n}` suffix, so the
/// frame never sees duplicate column names.
fn dedupe_headers(header: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            let base = if h.is_empty() { format!("Unnamed: {}", i) } else { h };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}
