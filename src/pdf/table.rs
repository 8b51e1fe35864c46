use pdf_writer::Content;

use crate::error::Error;
use crate::plan::{TableOp, TextStyle};

use super::{Painter, TableRequest};

const CELL_PADDING: f32 = 3.0; // mm, each side
const BORDER_WIDTH: f32 = 0.2;

/// Auto-fit column widths so every cell fits on one line. Columns start at
/// their natural width (widest cell plus padding) and share whatever is left
/// of `max_width` in proportion to that width. Fails when the natural widths
/// alone exceed `max_width`.
fn auto_fit_columns(
    request: &TableRequest,
    max_width: f32,
    measure: &impl Fn(&str, &TextStyle) -> f32,
) -> Result<Vec<f32>, Error> {
    let ncols = request.header.len();
    if ncols == 0 {
        return Err(Error::RenderBackendFailure("table has no columns".into()));
    }
    if let Some(row) = request.rows.iter().find(|r| r.len() != ncols) {
        return Err(Error::RenderBackendFailure(format!(
            "row has {} cells, header has {ncols}",
            row.len()
        )));
    }

    let mut natural = vec![0.0f32; ncols];
    for (i, cell) in request.header.iter().enumerate() {
        natural[i] = natural[i].max(measure(cell, &request.header_style));
    }
    for row in &request.rows {
        for (i, cell) in row.iter().enumerate() {
            natural[i] = natural[i].max(measure(cell, &request.body_style));
        }
    }
    for w in &mut natural {
        *w += 2.0 * CELL_PADDING;
    }

    let total: f32 = natural.iter().sum();
    if total > max_width {
        return Err(Error::RenderBackendFailure(format!(
            "table needs {total:.1}mm, only {max_width:.1}mm available"
        )));
    }

    let extra = max_width - total;
    Ok(natural.iter().map(|w| w + extra * w / total).collect())
}

pub(super) fn fit_table(
    request: &TableRequest,
    x: f32,
    y: f32,
    max_width: f32,
    measure: impl Fn(&str, &TextStyle) -> f32,
) -> Result<TableOp, Error> {
    let col_widths = auto_fit_columns(request, max_width, &measure)?;
    Ok(TableOp {
        x,
        y,
        col_widths,
        row_h: request.row_h,
        header: request.header.clone(),
        rows: request.rows.clone(),
        header_style: request.header_style,
        body_style: request.body_style,
        header_fill: request.header_fill,
        border_color: request.border_color,
        cell_padding: CELL_PADDING,
    })
}

/// Header row filled, grid lines around every cell, text vertically centred
/// on each row.
pub(super) fn draw_table(content: &mut Content, painter: &Painter, table: &TableOp) {
    let width = table.width();
    let height = table.height();
    let (x0, y0) = (table.x, table.y);

    painter.fill_rect(content, x0, y0, width, table.row_h, table.header_fill);

    let baseline = |row: usize, style: &TextStyle| {
        let text_h = style.size * 0.7 * 25.4 / 72.0;
        y0 + row as f32 * table.row_h + (table.row_h + text_h) / 2.0
    };

    let rows = std::iter::once(&table.header).chain(table.rows.iter());
    for (row_idx, cells) in rows.enumerate() {
        let style = if row_idx == 0 {
            &table.header_style
        } else {
            &table.body_style
        };
        let y = baseline(row_idx, style);
        let mut x = x0;
        for (cell, w) in cells.iter().zip(&table.col_widths) {
            painter.text(content, x + table.cell_padding, y, cell, style);
            x += w;
        }
    }

    for row in 0..=table.rows.len() + 1 {
        let y = y0 + row as f32 * table.row_h;
        painter.line(content, (x0, y), (x0 + width, y), BORDER_WIDTH, table.border_color);
    }
    let mut x = x0;
    for col in 0..=table.col_widths.len() {
        painter.line(content, (x, y0), (x, y0 + height), BORDER_WIDTH, table.border_color);
        if let Some(w) = table.col_widths.get(col) {
            x += w;
        }
    }
}
