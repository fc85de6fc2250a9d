//! Pearson correlation over the numeric columns of a frame.

use crate::Result;
use polars::prelude::*;

pub const NO_NUMERIC_DATA: &str = "No numeric data available to compute correlation.";

/// Numeric-typed columns of `df`, in their original order.
pub fn numeric_projection(df: &DataFrame) -> Result<DataFrame> {
    let names: Vec<&str> = df
        .get_columns()
        .iter()
        .filter(|s| s.dtype().is_numeric())
        .map(|s| s.name())
        .collect();
    Ok(df.select(names)?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` squared.
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Pairwise Pearson correlation of every numeric column of `df`. Nulls are
    /// dropped pair by pair. Returns `None` if there is nothing numeric.
    pub fn compute(df: &DataFrame) -> Result<Option<Self>> {
        log::trace!("correlation::compute");
        let numeric = numeric_projection(df)?;
        if numeric.width() == 0 || numeric.height() == 0 {
            return Ok(None);
        }

        let mut columns = Vec::with_capacity(numeric.width());
        let mut data: Vec<Vec<Option<f64>>> = Vec::with_capacity(numeric.width());
        for series in numeric.get_columns() {
            columns.push(series.name().to_string());
            let floats = series.cast(&DataType::Float64)?;
            data.push(floats.f64()?.into_iter().collect());
        }

        let n = columns.len();
        let mut values = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            for j in i..n {
                let r = pearson(&data[i], &data[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        log::debug!("{}x{} correlation matrix", n, n);
        Ok(Some(CorrelationMatrix { columns, values }))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Lower triangle only: the diagonal and everything above it is hidden.
    pub fn masked(&self) -> Vec<Vec<Option<f64>>> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, &v)| (j < i).then_some(v))
                    .collect()
            })
            .collect()
    }
}

/// Sample Pearson correlation. NaN when either side has zero variance or
/// fewer than two complete pairs.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .collect();
    let n = pairs.len();
    if n < 2 {
        return f64::NAN;
    }

    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    (sxy / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::fixture_stats;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn perfect_and_inverse() {
        let x = some(&[1.0, 2.0, 3.0, 4.0]);
        let y = some(&[2.0, 4.0, 6.0, 8.0]);
        let z = some(&[4.0, 3.0, 2.0, 1.0]);
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_variance_is_nan() {
        let x = some(&[1.0, 2.0, 3.0]);
        let flat = some(&[5.0, 5.0, 5.0]);
        assert!(pearson(&x, &flat).is_nan());
        assert!(pearson(&flat, &flat).is_nan());
    }

    #[test]
    fn nulls_dropped_pairwise() {
        let x = vec![Some(1.0), None, Some(2.0), Some(3.0)];
        let y = vec![Some(1.0), Some(100.0), Some(2.0), Some(3.0)];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn projection_keeps_numeric_columns() {
        let numeric = numeric_projection(&fixture_stats()).unwrap();
        assert_eq!(numeric.get_column_names(), vec!["Age", "Att", "Yds", "Y/A"]);
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let matrix = CorrelationMatrix::compute(&fixture_stats()).unwrap().unwrap();
        assert_eq!(matrix.len(), 4);
        for i in 0..matrix.len() {
            assert!((matrix.values[i][i] - 1.0).abs() < 1e-9);
            for j in 0..matrix.len() {
                assert_eq!(matrix.values[i][j].to_bits(), matrix.values[j][i].to_bits());
            }
        }
    }

    #[test]
    fn mask_hides_upper_triangle_and_diagonal() {
        let matrix = CorrelationMatrix::compute(&fixture_stats()).unwrap().unwrap();
        let masked = matrix.masked();
        for (i, row) in masked.iter().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                assert_eq!(cell.is_some(), j < i);
            }
        }
    }

    #[test]
    fn nothing_numeric() {
        let df = df!("Player" => ["a", "b"], "Pos" => ["RB", "QB"]).unwrap();
        assert!(CorrelationMatrix::compute(&df).unwrap().is_none());
    }
}
