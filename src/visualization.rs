//! # Comparison Rendering
//!
//! Composes an ordered sequence of titled rasters into a single grid image,
//! left to right and top to bottom.

use image::{imageops, GrayImage, Luma};

use crate::threshold::ThresholdError;

/// Spacing between panels and around the sheet, in pixels.
pub const PANEL_GUTTER: u32 = 8;

/// Sample value of the sheet background.
const SHEET_BACKGROUND: u8 = 128;

/// Lays out `panels` in a grid with `columns` columns.
///
/// Every cell is sized to the largest panel; smaller panels sit at the cell's
/// top-left corner.
pub fn render_comparison(
    panels: &[(String, &GrayImage)],
    columns: u32,
) -> Result<GrayImage, ThresholdError> {
    if columns == 0 {
        return Err(ThresholdError::InvalidParameter {
            field: "columns",
            message: "must be at least 1".to_string(),
        });
    }
    if panels.is_empty() {
        return Err(ThresholdError::InvalidParameter {
            field: "panels",
            message: "at least one panel is required".to_string(),
        });
    }

    let count = panels.len() as u32;
    let columns = columns.min(count);
    let rows = count.div_ceil(columns);
    let cell_width = panels.iter().map(|(_, p)| p.width()).max().unwrap_or(0);
    let cell_height = panels.iter().map(|(_, p)| p.height()).max().unwrap_or(0);

    let width = columns * cell_width + (columns + 1) * PANEL_GUTTER;
    let height = rows * cell_height + (rows + 1) * PANEL_GUTTER;
    let mut sheet = GrayImage::from_pixel(width, height, Luma([SHEET_BACKGROUND]));

    for (index, (title, panel)) in panels.iter().enumerate() {
        let index = index as u32;
        let column = index % columns;
        let row = index / columns;
        let x = PANEL_GUTTER + column * (cell_width + PANEL_GUTTER);
        let y = PANEL_GUTTER + row * (cell_height + PANEL_GUTTER);
        imageops::replace(&mut sheet, *panel, x as i64, y as i64);

        tracing::debug!(title = %title, row, column, "Panel placed");
    }

    Ok(sheet)
}
