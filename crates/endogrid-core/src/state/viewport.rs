use serde::{Deserialize, Serialize};

use super::input::CellHit;
use super::width::WidthData;

/// Height of every data row, in pixels
pub const DEFAULT_HEIGHT: f64 = 25.0;

/// Rows past this are never materialized, scrolled to or navigated to
pub const MAX_ROWS: usize = 1500;

/// A width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub width: f64,
    pub height: f64,
}

impl Dimension {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Nothing can be shown in a zero-sized area
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// Scroll offsets of the viewport within the content, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollPosition {
    pub scroll_left: f64,
    pub scroll_top: f64,
}

impl ScrollPosition {
    pub fn new(scroll_left: f64, scroll_top: f64) -> Self {
        Self {
            scroll_left,
            scroll_top,
        }
    }
}

/// Window of rows and columns to materialize.
///
/// Both ranges are half-open: `start_row..end_row` and
/// `start_column..end_column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetView {
    pub start_row: usize,
    pub end_row: usize,
    pub start_column: usize,
    pub end_column: usize,
}

impl SheetView {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.start_row..self.end_row
    }

    pub fn columns(&self) -> std::ops::Range<usize> {
        self.start_column..self.end_column
    }

    pub fn num_rows_rendered(&self) -> usize {
        self.end_row.saturating_sub(self.start_row)
    }

    pub fn num_columns_rendered(&self) -> usize {
        self.end_column.saturating_sub(self.start_column)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows_rendered() == 0 || self.num_columns_rendered() == 0
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        self.rows().contains(&row) && self.columns().contains(&column)
    }
}

/// Offset between the scroll position and the first rendered cell
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RendererTranslate {
    pub x: f64,
    pub y: f64,
}

/// Full scrollable size of a sheet
pub fn total_size(num_rows: usize, widths: &WidthData) -> Dimension {
    Dimension::new(
        widths.total_width(),
        num_rows.min(MAX_ROWS) as f64 * DEFAULT_HEIGHT,
    )
}

/// Keep the scroll position inside `[0, total - viewport]` on both axes
pub fn clamp_scroll_position(
    scroll: ScrollPosition,
    viewport: Dimension,
    total: Dimension,
) -> ScrollPosition {
    ScrollPosition::new(
        clamp_axis(scroll.scroll_left, viewport.width, total.width),
        clamp_axis(scroll.scroll_top, viewport.height, total.height),
    )
}

fn clamp_axis(offset: f64, extent: f64, total: f64) -> f64 {
    let max = (total - extent.max(0.0)).max(0.0);
    if offset.is_nan() {
        return 0.0;
    }
    offset.clamp(0.0, max)
}

/// Grow a visible window by one unit on each side, bounded by `count`
fn padded(first: usize, end: usize, count: usize) -> (usize, usize) {
    (first.saturating_sub(1), (end + 1).min(count))
}

fn row_window(scroll_top: f64, viewport_height: f64, num_rows: usize) -> (usize, usize) {
    if num_rows == 0 || !(viewport_height > 0.0) {
        return (0, 0);
    }
    let total = num_rows as f64 * DEFAULT_HEIGHT;
    let top = clamp_axis(scroll_top, viewport_height, total);

    let first = ((top / DEFAULT_HEIGHT).floor() as usize).min(num_rows - 1);
    let end = (((top + viewport_height) / DEFAULT_HEIGHT).ceil() as usize)
        .min(num_rows)
        .max(first + 1);
    padded(first, end, num_rows)
}

fn column_window(scroll_left: f64, viewport_width: f64, widths: &WidthData) -> (usize, usize) {
    let count = widths.len();
    if count == 0 || !(viewport_width > 0.0) {
        return (0, 0);
    }
    let left = clamp_axis(scroll_left, viewport_width, widths.total_width());
    let right = left + viewport_width;

    let first = widths.column_at_offset(left).unwrap_or(count - 1);
    let mut end = count;
    let mut offset = widths.column_offset(first);
    for (index, width) in widths.width_array().iter().enumerate().skip(first) {
        if offset >= right {
            end = index;
            break;
        }
        offset += width;
    }
    padded(first, end.max(first + 1), count)
}

/// Rows and columns intersecting the viewport, padded by one on each edge.
///
/// Scroll positions outside the content are clamped first. A zero-sized
/// viewport or a sheet without rows or columns yields an empty window.
pub fn calculate_sheet_view(
    scroll: ScrollPosition,
    viewport: Dimension,
    num_rows: usize,
    widths: &WidthData,
) -> SheetView {
    let num_rows = num_rows.min(MAX_ROWS);
    let (start_row, end_row) = row_window(scroll.scroll_top, viewport.height, num_rows);
    let (start_column, end_column) = column_window(scroll.scroll_left, viewport.width, widths);

    if start_row == end_row || start_column == end_column {
        return SheetView::default();
    }
    SheetView {
        start_row,
        end_row,
        start_column,
        end_column,
    }
}

/// Content coordinates of the first rendered cell's top-left corner
pub fn renderer_offset(view: &SheetView, widths: &WidthData) -> (f64, f64) {
    (
        widths.column_offset(view.start_column),
        view.start_row as f64 * DEFAULT_HEIGHT,
    )
}

/// Distance from the first rendered cell to the scroll position.
///
/// Placing the rendered window at `scroll - translate` puts every cell at
/// its true content coordinates.
pub fn calculate_translate(
    scroll: ScrollPosition,
    viewport: Dimension,
    num_rows: usize,
    widths: &WidthData,
) -> RendererTranslate {
    let total = total_size(num_rows, widths);
    let scroll = clamp_scroll_position(scroll, viewport, total);
    let view = calculate_sheet_view(scroll, viewport, num_rows, widths);
    let (x, y) = renderer_offset(&view, widths);
    RendererTranslate {
        x: scroll.scroll_left - x,
        y: scroll.scroll_top - y,
    }
}

/// Smallest scroll change that brings a cell fully into the viewport.
///
/// The header row and index column sentinels (`-1`) scroll to the first
/// row and column. A cell larger than the viewport aligns to its top or
/// left edge.
pub fn ensure_cell_visible(
    scroll: ScrollPosition,
    viewport: Dimension,
    widths: &WidthData,
    row_index: isize,
    column_index: isize,
) -> ScrollPosition {
    if viewport.is_empty() {
        return scroll;
    }

    let row = row_index.max(0) as f64;
    let top = row * DEFAULT_HEIGHT;
    let scroll_top = reveal(scroll.scroll_top, viewport.height, top, DEFAULT_HEIGHT);

    let column = column_index.max(0) as usize;
    let scroll_left = match widths.width_at(column) {
        Some(width) => reveal(
            scroll.scroll_left,
            viewport.width,
            widths.column_offset(column),
            width,
        ),
        None => scroll.scroll_left,
    };

    ScrollPosition::new(scroll_left, scroll_top)
}

fn reveal(offset: f64, extent: f64, start: f64, size: f64) -> f64 {
    if start < offset || size > extent {
        start
    } else if start + size > offset + extent {
        start + size - extent
    } else {
        offset
    }
}

/// Hit-test a point given relative to the viewport's top-left corner
pub fn cell_at_point(
    scroll: ScrollPosition,
    num_rows: usize,
    widths: &WidthData,
    x: f64,
    y: f64,
) -> Option<CellHit> {
    let content_y = y + scroll.scroll_top;
    if !(content_y >= 0.0) {
        return None;
    }
    let row = (content_y / DEFAULT_HEIGHT).floor() as usize;
    if row >= num_rows.min(MAX_ROWS) {
        return None;
    }
    let column = widths.column_at_offset(x + scroll.scroll_left)?;
    Some(CellHit::new(row as isize, column as isize))
}
