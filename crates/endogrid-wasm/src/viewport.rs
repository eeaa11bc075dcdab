//! Zero-copy render data for the JS renderer.
//!
//! Cells inside the current sheet view are written into flat arrays that
//! JavaScript reads directly through typed arrays over wasm memory.

use endogrid_core::{EditorState, Selection, SheetData, SheetView, WidthData};

/// Bit 0: the cell is inside a selected range
pub const FLAG_SELECTED: u32 = 1 << 0;
/// Bit 1: the cell is the ending point of the active range
pub const FLAG_ACTIVE: u32 = 1 << 1;
/// Bit 2: the cell editor is open on this cell
pub const FLAG_EDITING: u32 = 1 << 2;
/// Bit 3: the column is fully selected
pub const FLAG_COLUMN_SELECTED: u32 = 1 << 3;

/// Pack the per-cell render flags into a u32
#[inline]
pub fn pack_flags(selected: bool, active: bool, editing: bool, column_selected: bool) -> u32 {
    let mut flags = 0;
    if selected {
        flags |= FLAG_SELECTED;
    }
    if active {
        flags |= FLAG_ACTIVE;
    }
    if editing {
        flags |= FLAG_EDITING;
    }
    if column_selected {
        flags |= FLAG_COLUMN_SELECTED;
    }
    flags
}

#[inline]
pub fn unpack_flags(flags: u32) -> (bool, bool, bool, bool) {
    (
        flags & FLAG_SELECTED != 0,
        flags & FLAG_ACTIVE != 0,
        flags & FLAG_EDITING != 0,
        flags & FLAG_COLUMN_SELECTED != 0,
    )
}

/// Render buffer for the cells of one sheet view.
///
/// Cell arrays are parallel: entry `i` of each describes the same cell.
/// Column arrays hold one entry per rendered column.
#[derive(Default)]
pub struct ViewportBuffer {
    pub rows: Vec<u32>,
    pub cols: Vec<u32>,
    /// Numeric values (f64::NAN for non-numeric cells)
    pub values: Vec<f64>,
    pub flags: Vec<u32>,
    /// Display strings (still need JSON for strings)
    pub display_values: Vec<String>,
    /// Left edge of each rendered column, relative to the renderer offset
    pub column_lefts: Vec<f64>,
    pub column_widths: Vec<f64>,
}

impl ViewportBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
            cols: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            flags: Vec::with_capacity(capacity),
            display_values: Vec::with_capacity(capacity),
            column_lefts: Vec::new(),
            column_widths: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.cols.clear();
        self.values.clear();
        self.flags.clear();
        self.display_values.clear();
        self.column_lefts.clear();
        self.column_widths.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Push a cell into the buffer
    pub fn push(&mut self, row: u32, col: u32, numeric_value: f64, flags: u32, display: String) {
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(numeric_value);
        self.flags.push(flags);
        self.display_values.push(display);
    }

    /// Refill the buffer with every cell of `view`
    pub fn populate(
        &mut self,
        sheet: &SheetData,
        view: SheetView,
        widths: &WidthData,
        selection: &Selection,
        editor: Option<&EditorState>,
    ) {
        self.clear();

        let mut left = 0.0;
        for column in view.columns() {
            let width = widths.width_at(column).unwrap_or(0.0);
            self.column_lefts.push(left);
            self.column_widths.push(width);
            left += width;
        }

        let active_end = selection.active_range().end();
        for column in view.columns() {
            let column_index = column as isize;
            let Some(data) = sheet.column(column_index) else {
                continue;
            };
            let column_selected = selection.is_column_fully_selected(column_index);
            for row in view.rows() {
                let row_index = row as isize;
                let value = data.values.get(row).cloned().unwrap_or_default();
                let editing = editor
                    .map(|e| e.row_index == row_index && e.column_index == column_index)
                    .unwrap_or(false);
                let flags = pack_flags(
                    selection.is_cell_selected(row_index, column_index),
                    active_end == (row_index, column_index),
                    editing,
                    column_selected,
                );
                self.push(
                    row as u32,
                    column as u32,
                    value.as_number().unwrap_or(f64::NAN),
                    flags,
                    value.display_text(),
                );
            }
        }
    }
}
