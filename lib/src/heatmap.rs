//! Annotated lower-triangle heatmap of a [`CorrelationMatrix`].

use crate::{correlation::CorrelationMatrix, error::Error, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

const CELL: i32 = 60;
const LEFT: i32 = 90;
const TOP: i32 = 40;
const RIGHT: i32 = 20;
const BOTTOM: i32 = 90;
const TITLE: &str = "Intercorrelation Matrix Heatmap";

/// Canvas size that fits `n` columns.
pub fn canvas_size(n: usize) -> (u32, u32) {
    let grid = CELL * n as i32;
    ((LEFT + grid + RIGHT) as u32, (TOP + grid + BOTTOM) as u32)
}

/// Diverging blue-white-red scale over [-1, 1]; values above 1 saturate.
pub fn color_for(r: f64) -> RGBColor {
    let r = r.clamp(-1.0, 1.0);
    let white = (255.0, 255.0, 255.0);
    let (target, t) = if r >= 0.0 {
        ((180.0, 4.0, 38.0), r)
    } else {
        ((59.0, 76.0, 192.0), -r)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(mix(white.0, target.0), mix(white.1, target.1), mix(white.2, target.2))
}

pub(crate) fn drawing_error<E: std::fmt::Display>(err: E) -> Error {
    Error::Drawing(err.to_string())
}

pub fn draw_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    matrix: &CorrelationMatrix,
) -> Result<()> {
    log::trace!("heatmap::draw_heatmap");
    area.fill(&WHITE).map_err(drawing_error)?;

    let centered = Pos::new(HPos::Center, VPos::Center);
    let title_style = ("sans-serif", 18).into_font().color(&BLACK).pos(centered);
    let value_style = ("sans-serif", 13).into_font().color(&BLACK).pos(centered);
    let label_style = ("sans-serif", 13).into_font().color(&BLACK);

    let (width, _) = canvas_size(matrix.len());
    area.draw(&Text::new(TITLE, (width as i32 / 2, TOP / 2), title_style))
        .map_err(drawing_error)?;

    for (i, row) in matrix.masked().iter().enumerate() {
        let y0 = TOP + CELL * i as i32;
        for (j, cell) in row.iter().enumerate() {
            let Some(r) = cell.filter(|r| !r.is_nan()) else {
                continue;
            };
            let x0 = LEFT + CELL * j as i32;
            area.draw(&Rectangle::new(
                [(x0, y0), (x0 + CELL, y0 + CELL)],
                color_for(r).filled(),
            ))
            .map_err(drawing_error)?;
            area.draw(&Text::new(
                format!("{:.2}", r),
                (x0 + CELL / 2, y0 + CELL / 2),
                value_style.clone(),
            ))
            .map_err(drawing_error)?;
        }
    }

    let n = matrix.len() as i32;
    for (k, name) in matrix.columns.iter().enumerate() {
        let offset = CELL * k as i32 + CELL / 2;
        area.draw(&Text::new(
            name.clone(),
            (LEFT - 8, TOP + offset),
            label_style.clone().pos(Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(drawing_error)?;
        area.draw(&Text::new(
            name.clone(),
            (LEFT + offset, TOP + CELL * n + 8),
            label_style.clone().pos(Pos::new(HPos::Center, VPos::Top)),
        ))
        .map_err(drawing_error)?;
    }
    Ok(())
}

pub fn render_png<P: AsRef<Path>>(matrix: &CorrelationMatrix, path: P) -> Result<()> {
    let root = BitMapBackend::new(path.as_ref(), canvas_size(matrix.len())).into_drawing_area();
    draw_heatmap(&root, matrix)?;
    root.present().map_err(drawing_error)?;
    log::info!("wrote heatmap to {}", path.as_ref().display());
    Ok(())
}

pub fn render_svg(matrix: &CorrelationMatrix) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, canvas_size(matrix.len())).into_drawing_area();
        draw_heatmap(&root, matrix)?;
        root.present().map_err(drawing_error)?;
    }
    Ok(svg)
}
