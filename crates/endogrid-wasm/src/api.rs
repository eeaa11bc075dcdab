use endogrid_core::{
    CellHit, ColumnId, Dimension, EndoGrid, GridError, GridResponse, Key, KeyEvent, Modifiers,
    Platform, ScrollPosition, SheetData, TextSelection,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::viewport::ViewportBuffer;

/// One grid instance exposed to the notebook shell
#[wasm_bindgen(js_name = EndoGrid)]
pub struct JsEndoGrid {
    grid: EndoGrid,
    platform: Platform,
    /// Reusable buffer for viewport data (zero-copy optimization)
    viewport_buffer: ViewportBuffer,
}

/// Structured error object for JavaScript
#[derive(Debug, Serialize)]
pub struct JsGridError {
    code: String,
    message: String,
}

impl From<GridError> for JsGridError {
    fn from(err: GridError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl JsGridError {
    fn from_error<E: std::fmt::Display>(err: E) -> JsValue {
        let error = Self {
            code: "INVALID_ARGUMENT".to_string(),
            message: err.to_string(),
        };
        serde_wasm_bindgen::to_value(&error).unwrap_or(JsValue::NULL)
    }
}

fn to_js_error(err: GridError) -> JsValue {
    let js_error = JsGridError::from(err);
    serde_wasm_bindgen::to_value(&js_error).unwrap_or(JsValue::NULL)
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or(JsValue::NULL)
}

fn parse_sheets(sheets: JsValue) -> Result<Vec<SheetData>, JsValue> {
    serde_wasm_bindgen::from_value(sheets).map_err(|e| {
        web_sys::console::error_1(&format!("[EndoGrid] invalid sheets: {}", e).into());
        JsGridError::from_error(e)
    })
}

#[wasm_bindgen(js_class = EndoGrid)]
impl JsEndoGrid {
    /// Create a grid over the kernel's sheets.
    ///
    /// `platform` is `navigator.platform`; it decides whether Cmd or Ctrl is
    /// the primary modifier.
    #[wasm_bindgen(constructor)]
    pub fn new(sheets: JsValue, sheet_index: usize, platform: &str) -> Result<JsEndoGrid, JsValue> {
        let sheets = parse_sheets(sheets)?;
        Ok(Self::from_sheets(sheets, sheet_index, Platform::detect(platform)))
    }

    // =========================================================================
    // Dataset
    // =========================================================================

    /// Take new sheets from the kernel; returns the resulting effects
    #[wasm_bindgen(js_name = setDataset)]
    pub fn set_dataset(&mut self, sheets: JsValue, sheet_index: usize) -> Result<JsValue, JsValue> {
        let sheets = parse_sheets(sheets)?;
        Ok(to_js(&self.grid.set_dataset(sheets, sheet_index)))
    }

    #[wasm_bindgen(js_name = switchSheet)]
    pub fn switch_sheet(&mut self, sheet_index: usize) -> Result<JsValue, JsValue> {
        self.grid
            .switch_sheet(sheet_index)
            .map(|response| to_js(&response))
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = getSheetIndex)]
    pub fn get_sheet_index(&self) -> usize {
        self.grid.sheet_index()
    }

    /// Headers of the displayed sheet, in display order
    #[wasm_bindgen(js_name = getColumnHeaders)]
    pub fn get_column_headers(&self) -> js_sys::Array {
        let headers = js_sys::Array::new();
        if let Some(sheet) = self.grid.sheet() {
            for column in &sheet.columns {
                headers.push(&JsValue::from_str(&column.column_header));
            }
        }
        headers
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    #[wasm_bindgen(js_name = onViewportResize)]
    pub fn on_viewport_resize(&mut self, width: f64, height: f64) {
        self.grid.on_viewport_resize(Dimension::new(width, height));
    }

    #[wasm_bindgen(js_name = onScroll)]
    pub fn on_scroll(&mut self, scroll_left: f64, scroll_top: f64) {
        self.grid
            .on_scroll(ScrollPosition::new(scroll_left, scroll_top));
    }

    #[wasm_bindgen(js_name = resizeColumn)]
    pub fn resize_column(&mut self, column_id: &str, width: f64) {
        self.grid.resize_column(&ColumnId::from(column_id), width);
    }

    #[wasm_bindgen(js_name = getSheetView)]
    pub fn get_sheet_view(&self) -> JsValue {
        to_js(&self.grid.sheet_view())
    }

    #[wasm_bindgen(js_name = getTranslate)]
    pub fn get_translate(&self) -> JsValue {
        to_js(&self.grid.translate())
    }

    #[wasm_bindgen(js_name = getTotalSize)]
    pub fn get_total_size(&self) -> JsValue {
        to_js(&self.grid.total_size())
    }

    /// Cell under a point relative to the viewport, or null
    #[wasm_bindgen(js_name = hitTest)]
    pub fn hit_test(&self, x: f64, y: f64) -> JsValue {
        to_js(&self.grid.hit_test(x, y))
    }

    // =========================================================================
    // Pointer and keyboard events
    // =========================================================================

    #[wasm_bindgen(js_name = onMouseDown)]
    pub fn on_mouse_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, meta: bool) -> JsValue {
        to_js(&self.mouse_down(x, y, shift, ctrl, meta))
    }

    /// Mouse down on the column header row
    #[wasm_bindgen(js_name = onHeaderMouseDown)]
    pub fn on_header_mouse_down(&mut self, column_index: usize, shift: bool, ctrl: bool, meta: bool) -> JsValue {
        let hit = CellHit::new(-1, column_index as isize);
        to_js(&self.mouse_down_at(Some(hit), shift, ctrl, meta))
    }

    /// Mouse down on the index column
    #[wasm_bindgen(js_name = onIndexMouseDown)]
    pub fn on_index_mouse_down(&mut self, row_index: usize, shift: bool, ctrl: bool, meta: bool) -> JsValue {
        let hit = CellHit::new(row_index as isize, -1);
        to_js(&self.mouse_down_at(Some(hit), shift, ctrl, meta))
    }

    #[wasm_bindgen(js_name = onMouseMove)]
    pub fn on_mouse_move(&mut self, x: f64, y: f64) -> JsValue {
        let hit = self.grid.hit_test(x, y);
        to_js(&self.grid.on_mouse_move(hit))
    }

    #[wasm_bindgen(js_name = onMouseUp)]
    pub fn on_mouse_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, meta: bool) -> JsValue {
        let hit = self.grid.hit_test(x, y);
        let modifiers = self.modifiers(shift, ctrl, meta);
        to_js(&self.grid.on_mouse_up(hit, modifiers))
    }

    #[wasm_bindgen(js_name = onMouseLeave)]
    pub fn on_mouse_leave(&mut self) {
        self.grid.on_mouse_leave();
    }

    #[wasm_bindgen(js_name = onDoubleClick)]
    pub fn on_double_click(&mut self, x: f64, y: f64) -> JsValue {
        let hit = self.grid.hit_test(x, y);
        to_js(&self.grid.on_double_click(hit))
    }

    /// Handle a DOM `keydown`; `key` is `KeyboardEvent.key`.
    /// The shell calls `preventDefault` when the result is `handled`.
    #[wasm_bindgen(js_name = onKeyDown)]
    pub fn on_key_down(&mut self, key: &str, shift: bool, ctrl: bool, meta: bool) -> JsValue {
        to_js(&self.key_down(key, shift, ctrl, meta))
    }

    // =========================================================================
    // Cell editor
    // =========================================================================

    #[wasm_bindgen(js_name = openEditor)]
    pub fn open_editor(&mut self, row_index: i32, column_index: i32) -> Result<(), JsValue> {
        self.grid
            .open_editor(row_index as isize, column_index as isize)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = commitEdit)]
    pub fn commit_edit(&mut self) -> Result<JsValue, JsValue> {
        self.grid
            .commit_edit()
            .map(|response| to_js(&response))
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = cancelEdit)]
    pub fn cancel_edit(&mut self) -> Result<(), JsValue> {
        self.grid.cancel_edit().map_err(to_js_error)
    }

    /// Text typed into the editor, with the caret or selection after typing
    #[wasm_bindgen(js_name = setEditorInput)]
    pub fn set_editor_input(
        &mut self,
        formula: &str,
        selection_start: usize,
        selection_end: usize,
    ) -> Result<(), JsValue> {
        self.grid
            .set_editor_input(formula, TextSelection::new(selection_start, selection_end))
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setEditorTextSelection)]
    pub fn set_editor_text_selection(
        &mut self,
        selection_start: usize,
        selection_end: usize,
    ) -> Result<(), JsValue> {
        self.grid
            .set_editor_text_selection(TextSelection::new(selection_start, selection_end))
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = onEditingTaskpaneClosed)]
    pub fn on_editing_taskpane_closed(&mut self) {
        self.grid.on_editing_taskpane_closed();
    }

    #[wasm_bindgen(js_name = isEditing)]
    pub fn is_editing(&self) -> bool {
        self.grid.is_editing()
    }

    /// The open editor, or null
    #[wasm_bindgen(js_name = getEditor)]
    pub fn get_editor(&self) -> JsValue {
        to_js(&self.grid.editor())
    }

    // =========================================================================
    // State
    // =========================================================================

    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> JsValue {
        to_js(&*self.grid.state())
    }

    #[wasm_bindgen(js_name = getMode)]
    pub fn get_mode(&self) -> JsValue {
        to_js(self.grid.mode())
    }

    #[wasm_bindgen(js_name = getSelection)]
    pub fn get_selection(&self) -> JsValue {
        to_js(self.grid.selection())
    }

    // =========================================================================
    // Zero-Copy Viewport API
    // =========================================================================

    /// Fill the internal buffer with the cells of the current sheet view.
    /// Call this before accessing the viewport arrays.
    #[wasm_bindgen(js_name = populateViewport)]
    pub fn populate_viewport(&mut self) {
        self.populate();
    }

    /// Get the number of cells in the viewport buffer
    #[wasm_bindgen(js_name = getViewportLen)]
    pub fn get_viewport_len(&self) -> usize {
        self.viewport_buffer.len()
    }

    /// Get pointer to viewport row indices (Uint32Array)
    #[wasm_bindgen(js_name = getViewportRowsPtr)]
    pub fn get_viewport_rows_ptr(&self) -> *const u32 {
        self.viewport_buffer.rows.as_ptr()
    }

    /// Get pointer to viewport column indices (Uint32Array)
    #[wasm_bindgen(js_name = getViewportColsPtr)]
    pub fn get_viewport_cols_ptr(&self) -> *const u32 {
        self.viewport_buffer.cols.as_ptr()
    }

    /// Get pointer to viewport numeric values (Float64Array)
    #[wasm_bindgen(js_name = getViewportValuesPtr)]
    pub fn get_viewport_values_ptr(&self) -> *const f64 {
        self.viewport_buffer.values.as_ptr()
    }

    /// Get pointer to viewport render flags (Uint32Array)
    #[wasm_bindgen(js_name = getViewportFlagsPtr)]
    pub fn get_viewport_flags_ptr(&self) -> *const u32 {
        self.viewport_buffer.flags.as_ptr()
    }

    /// Get viewport display values as JSON (strings still need serialization)
    #[wasm_bindgen(js_name = getViewportDisplayValues)]
    pub fn get_viewport_display_values(&self) -> String {
        serde_json::to_string(&self.viewport_buffer.display_values)
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Number of rendered columns
    #[wasm_bindgen(js_name = getViewportColumnCount)]
    pub fn get_viewport_column_count(&self) -> usize {
        self.viewport_buffer.column_widths.len()
    }

    /// Get pointer to rendered column left edges (Float64Array)
    #[wasm_bindgen(js_name = getViewportColumnLeftsPtr)]
    pub fn get_viewport_column_lefts_ptr(&self) -> *const f64 {
        self.viewport_buffer.column_lefts.as_ptr()
    }

    /// Get pointer to rendered column widths (Float64Array)
    #[wasm_bindgen(js_name = getViewportColumnWidthsPtr)]
    pub fn get_viewport_column_widths_ptr(&self) -> *const f64 {
        self.viewport_buffer.column_widths.as_ptr()
    }
}

impl JsEndoGrid {
    pub fn from_sheets(sheets: Vec<SheetData>, sheet_index: usize, platform: Platform) -> Self {
        Self {
            grid: EndoGrid::new(sheets, sheet_index),
            platform,
            viewport_buffer: ViewportBuffer::with_capacity(1000),
        }
    }

    pub fn grid(&self) -> &EndoGrid {
        &self.grid
    }

    fn modifiers(&self, shift: bool, ctrl: bool, meta: bool) -> Modifiers {
        Modifiers::from_platform(self.platform, shift, ctrl, meta)
    }

    fn mouse_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, meta: bool) -> GridResponse {
        let hit = self.grid.hit_test(x, y);
        self.mouse_down_at(hit, shift, ctrl, meta)
    }

    fn mouse_down_at(&mut self, hit: Option<CellHit>, shift: bool, ctrl: bool, meta: bool) -> GridResponse {
        let modifiers = self.modifiers(shift, ctrl, meta);
        self.grid.on_mouse_down(hit, modifiers)
    }

    fn key_down(&mut self, key: &str, shift: bool, ctrl: bool, meta: bool) -> GridResponse {
        let event = KeyEvent::new(Key::from_dom(key), self.modifiers(shift, ctrl, meta));
        self.grid.on_key_down(event)
    }

    fn populate(&mut self) {
        let Some(sheet) = self.grid.sheet() else {
            self.viewport_buffer.clear();
            return;
        };
        let state = self.grid.state();
        self.viewport_buffer.populate(
            sheet,
            self.grid.sheet_view(),
            state.widths(),
            &state.selection,
            self.grid.editor(),
        );
    }
}
