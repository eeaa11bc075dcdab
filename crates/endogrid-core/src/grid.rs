use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{GridError, Result};
use crate::sheet::{ColumnId, SheetData, SheetShape, SheetSource};
use crate::state::viewport::cell_at_point;
use crate::state::{
    navigate, CellHit, Dimension, EditorKeyOutcome, EditorState, GridMode, GridState, Key,
    KeyEvent, Modifiers, RendererTranslate, ScrollPosition, Selection, SelectionRange, SheetView,
    TextSelection,
};

/// A request from the grid to the outside world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GridEffect {
    /// Write a formula or value into a cell
    #[serde(rename_all = "camelCase")]
    SubmitFormula {
        sheet_index: usize,
        row_index: isize,
        column_index: isize,
        column_id: ColumnId,
        formula: String,
    },
    #[serde(rename_all = "camelCase")]
    RenameColumnHeader {
        sheet_index: usize,
        column_id: ColumnId,
        new_header: String,
    },
    #[serde(rename_all = "camelCase")]
    DeleteColumns {
        sheet_index: usize,
        column_ids: Vec<ColumnId>,
    },
    /// The displayed sheet is a pivot table; its parameters are needed
    #[serde(rename_all = "camelCase")]
    FetchPivotParams { sheet_index: usize },
    /// The index column was clicked
    CloseControlPanel,
}

/// Outcome of one input event
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridResponse {
    pub effects: Vec<GridEffect>,
    /// The presentation layer should suppress the platform default
    pub handled: bool,
}

impl GridResponse {
    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn handled() -> Self {
        Self {
            effects: Vec::new(),
            handled: true,
        }
    }

    pub fn with_effect(mut self, effect: GridEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Interaction controller of the grid.
///
/// Every handler reads the current [`GridState`] snapshot and publishes at
/// most one replacement. Handlers never fail: events that do not map to a
/// valid target are ignored.
#[derive(Debug, Clone)]
pub struct EndoGrid {
    sheets: Vec<SheetData>,
    state: Arc<GridState>,
    mode: GridMode,
}

impl EndoGrid {
    pub fn new(sheets: Vec<SheetData>, sheet_index: usize) -> Self {
        let sheet_index = sheet_index.min(sheets.len().saturating_sub(1));
        let state = GridState::new(&sheets, sheet_index);
        Self {
            sheets,
            state: Arc::new(state),
            mode: GridMode::default(),
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> Arc<GridState> {
        Arc::clone(&self.state)
    }

    pub fn mode(&self) -> &GridMode {
        &self.mode
    }

    pub fn editor(&self) -> Option<&EditorState> {
        self.mode.editor()
    }

    pub fn is_editing(&self) -> bool {
        self.mode.is_editing()
    }

    pub fn selection(&self) -> &Selection {
        &self.state.selection
    }

    pub fn sheet_index(&self) -> usize {
        self.state.sheet_index
    }

    pub fn sheets(&self) -> &[SheetData] {
        &self.sheets
    }

    /// The displayed sheet
    pub fn sheet(&self) -> Option<&SheetData> {
        self.sheets.get(self.state.sheet_index)
    }

    fn shape(&self) -> SheetShape {
        self.sheet().map(SheetData::shape).unwrap_or_default()
    }

    pub fn sheet_view(&self) -> SheetView {
        self.state.sheet_view(self.shape().num_rows)
    }

    pub fn translate(&self) -> RendererTranslate {
        self.state.translate(self.shape().num_rows)
    }

    pub fn total_size(&self) -> Dimension {
        self.state.total_size(self.shape().num_rows)
    }

    /// Data cell under a point given relative to the viewport
    pub fn hit_test(&self, x: f64, y: f64) -> Option<CellHit> {
        cell_at_point(
            self.state.scroll_position,
            self.shape().num_rows,
            self.state.widths(),
            x,
            y,
        )
    }

    /// Publish a new state unless it equals the current one
    fn replace_state(&mut self, next: GridState) -> bool {
        if *self.state == next {
            return false;
        }
        self.state = Arc::new(next);
        true
    }

    fn select_single_cell(&mut self, row_index: isize, column_index: isize) {
        let selection = Selection::single(SelectionRange::single_cell(row_index, column_index));
        let next = self.state.with_selection(selection);
        self.replace_state(next);
    }

    /// Select one cell and scroll it into view
    fn reveal_single_cell(&mut self, row_index: isize, column_index: isize) {
        let selection = Selection::single(SelectionRange::single_cell(row_index, column_index));
        let next = self
            .state
            .with_selection(selection)
            .scrolled_to_cell(row_index, column_index);
        self.replace_state(next);
    }

    fn discard_editor(&mut self, reason: &str) {
        if let GridMode::Editing { editor } = &self.mode {
            debug!(
                row = editor.row_index,
                column = editor.column_index,
                reason,
                "discarding cell editor"
            );
            self.mode = GridMode::default();
        }
    }

    // Dataset and sheet changes

    /// Take a new set of sheets from the kernel.
    ///
    /// Selection and widths are reconciled from the current state. An open
    /// editor follows its column; it is discarded when the column or row is
    /// gone or the displayed sheet changed.
    pub fn set_dataset(&mut self, sheets: Vec<SheetData>, sheet_index: usize) -> GridResponse {
        let sheet_index = sheet_index.min(sheets.len().saturating_sub(1));
        let switched = sheet_index != self.state.sheet_index;
        let old_column_ids = self.state.column_ids().to_vec();
        let next = self.state.reconciled(&sheets, sheet_index);
        self.sheets = sheets;
        self.replace_state(next);

        if switched {
            return self.after_sheet_switch();
        }

        if let Some(editor) = self.editor().cloned() {
            let shape = self.shape();
            let moved = usize::try_from(editor.column_index)
                .ok()
                .and_then(|index| old_column_ids.get(index))
                .and_then(|id| self.sheet().and_then(|sheet| sheet.column_index(id)));
            match moved {
                Some(column_index) if editor.row_index < shape.num_rows as isize => {
                    self.mode = GridMode::Editing {
                        editor: editor.with_column_index(column_index as isize),
                    };
                }
                _ => self.discard_editor("edited cell no longer exists"),
            }
        }
        GridResponse::handled()
    }

    /// Show another sheet
    pub fn switch_sheet(&mut self, sheet_index: usize) -> Result<GridResponse> {
        if sheet_index >= self.sheets.len() {
            return Err(GridError::SheetOutOfRange {
                index: sheet_index,
                count: self.sheets.len(),
            });
        }
        if sheet_index == self.state.sheet_index {
            return Ok(GridResponse::ignored());
        }
        let next = self.state.reconciled(&self.sheets, sheet_index);
        self.replace_state(next);
        Ok(self.after_sheet_switch())
    }

    fn after_sheet_switch(&mut self) -> GridResponse {
        self.discard_editor("sheet switched");
        self.mode = GridMode::default();
        let sheet_index = self.state.sheet_index;
        debug!(sheet_index, "switched sheet");

        let response = GridResponse::handled();
        match self.sheet().map(|sheet| sheet.df_source) {
            Some(SheetSource::Pivoted) => {
                response.with_effect(GridEffect::FetchPivotParams { sheet_index })
            }
            _ => response,
        }
    }

    /// A taskpane that edits the sheet was closed
    pub fn on_editing_taskpane_closed(&mut self) {
        self.discard_editor("editing taskpane closed");
    }

    // Scrolling and sizing

    pub fn on_viewport_resize(&mut self, viewport: Dimension) {
        let next = self.state.with_viewport(viewport, self.shape().num_rows);
        self.replace_state(next);
    }

    pub fn on_scroll(&mut self, scroll_position: ScrollPosition) {
        let next = self
            .state
            .with_scroll_position(scroll_position, self.shape().num_rows);
        self.replace_state(next);
    }

    /// Resize a column of the displayed sheet
    pub fn resize_column(&mut self, column_id: &ColumnId, width: f64) {
        let next = self
            .state
            .with_column_width(self.state.sheet_index, column_id, width);
        self.replace_state(next);
    }

    // Pointer events

    pub fn on_mouse_down(&mut self, hit: Option<CellHit>, modifiers: Modifiers) -> GridResponse {
        if let Some(editor) = self.editor().cloned() {
            return self.editing_mouse_down(editor, hit, modifiers);
        }
        let Some(hit) = hit else {
            return GridResponse::ignored();
        };
        self.mode = GridMode::Navigation { dragging: true };

        let (row, col) = (hit.row_index, hit.column_index);
        let selection = &self.state.selection;
        let mut response = GridResponse::handled();
        let next = if modifiers.primary {
            if modifiers.shift {
                selection.append_range(row, col)
            } else if hit.is_column_header() {
                selection.toggle_column_in_selection(col)
            } else if !selection.is_cell_selected(row, col) {
                selection.append_range(row, col)
            } else {
                selection.start_new_range(row, col)
            }
        } else if modifiers.shift {
            selection.extend_active_range(row, col)
        } else {
            selection.start_new_range(row, col)
        };
        if !modifiers.primary && hit.is_index_column() {
            response = response.with_effect(GridEffect::CloseControlPanel);
        }

        let next = self.state.with_selection(next);
        self.replace_state(next);
        response
    }

    pub fn on_mouse_move(&mut self, hit: Option<CellHit>) -> GridResponse {
        if !self.mode.is_dragging() {
            return GridResponse::ignored();
        }
        let Some(hit) = hit else {
            return GridResponse::ignored();
        };
        // Dragging from a header would select every row of every column
        if self.state.selection.active_range().starting_row_index == -1 {
            return GridResponse::ignored();
        }
        let selection = self
            .state
            .selection
            .extend_active_range(hit.row_index, hit.column_index);
        let next = self.state.with_selection(selection);
        self.replace_state(next);
        GridResponse::handled()
    }

    pub fn on_mouse_up(&mut self, hit: Option<CellHit>, modifiers: Modifiers) -> GridResponse {
        match &mut self.mode {
            GridMode::Navigation { dragging } => *dragging = false,
            GridMode::Editing { .. } => return GridResponse::ignored(),
        }
        if modifiers.shift || modifiers.primary {
            return GridResponse::ignored();
        }
        let Some(hit) = hit else {
            return GridResponse::ignored();
        };
        if self.state.selection.active_range().starting_row_index == -1 {
            return GridResponse::ignored();
        }
        let selection = self
            .state
            .selection
            .extend_active_range(hit.row_index, hit.column_index);
        let next = self.state.with_selection(selection);
        self.replace_state(next);
        GridResponse::handled()
    }

    pub fn on_mouse_leave(&mut self) {
        if let GridMode::Navigation { dragging } = &mut self.mode {
            *dragging = false;
        }
    }

    pub fn on_double_click(&mut self, hit: Option<CellHit>) -> GridResponse {
        if self.is_editing() {
            return GridResponse::ignored();
        }
        let Some(hit) = hit.filter(CellHit::is_data_cell) else {
            return GridResponse::ignored();
        };
        let shape = self.shape();
        if hit.row_index >= shape.num_rows as isize || hit.column_index >= shape.num_columns as isize
        {
            return GridResponse::ignored();
        }
        let formula = self
            .sheet()
            .map(|sheet| sheet.starting_formula(hit.row_index, hit.column_index))
            .unwrap_or_default();
        self.start_editing(EditorState::open(hit.row_index, hit.column_index, formula));
        GridResponse::handled()
    }

    fn start_editing(&mut self, editor: EditorState) {
        debug!(
            row = editor.row_index,
            column = editor.column_index,
            "opening cell editor"
        );
        self.mode = GridMode::Editing { editor };
    }

    // Keyboard events

    pub fn on_key_down(&mut self, event: KeyEvent) -> GridResponse {
        if let Some(editor) = self.editor().cloned() {
            return self.editing_key_down(editor, event);
        }

        let key = event.key;
        if key.is_ignored_alone() {
            return GridResponse::ignored();
        }
        if !key.is_navigation_key() {
            if event.modifiers.primary || key == Key::Escape {
                return GridResponse::ignored();
            }
            if matches!(key, Key::Backspace | Key::Delete)
                && self.state.selection.is_only_column_headers()
            {
                return self.delete_selected_columns();
            }
            return self.start_editing_from_key(key);
        }

        let active = navigate(
            self.state.selection.active_range(),
            key,
            event.modifiers,
            self.shape(),
        );
        let (row, col) = active.end();
        let next = self
            .state
            .with_selection(Selection::single(active))
            .scrolled_to_cell(row, col);
        self.replace_state(next);
        GridResponse::handled()
    }

    fn delete_selected_columns(&mut self) -> GridResponse {
        let Some(sheet) = self.sheet() else {
            return GridResponse::ignored();
        };
        let column_ids: Vec<ColumnId> = self
            .state
            .selection
            .column_indexes()
            .into_iter()
            .filter_map(|index| sheet.columns.get(index))
            .map(|column| column.column_id.clone())
            .collect();
        if column_ids.is_empty() {
            return GridResponse::ignored();
        }
        debug!(count = column_ids.len(), "deleting selected columns");
        GridResponse::handled().with_effect(GridEffect::DeleteColumns {
            sheet_index: self.state.sheet_index,
            column_ids,
        })
    }

    fn start_editing_from_key(&mut self, key: Key) -> GridResponse {
        let (row, col) = self.state.selection.active_range().anchor();
        let Some(sheet) = self.sheet() else {
            return GridResponse::ignored();
        };
        let shape = sheet.shape();
        if col < 0 || col >= shape.num_columns as isize {
            return GridResponse::ignored();
        }
        if row < -1 || row >= shape.num_rows as isize {
            return GridResponse::ignored();
        }

        let formula = match key {
            _ if row == -1 => sheet.starting_formula(row, col),
            Key::Char(c) => c.to_string(),
            Key::Backspace | Key::Delete => String::new(),
            _ => sheet.starting_formula(row, col),
        };
        self.select_single_cell(row, col);
        self.start_editing(EditorState::open(row, col, formula));
        GridResponse::handled()
    }

    fn editing_key_down(&mut self, editor: EditorState, event: KeyEvent) -> GridResponse {
        match editor.interpret_key(event) {
            EditorKeyOutcome::Cancel => {
                self.discard_editor("cancelled");
                GridResponse::handled()
            }
            EditorKeyOutcome::Commit => self.commit_editor(editor),
            EditorKeyOutcome::MovePendingReference(delta) => {
                self.move_pending_reference(editor, delta)
            }
            EditorKeyOutcome::MoveSelection(delta) => {
                let shape = self.shape();
                if shape.is_empty() {
                    return GridResponse::handled();
                }
                let (row, col) = self.state.selection.active_range().end();
                let row = (row + delta).clamp(0, shape.num_rows as isize - 1);
                self.reveal_single_cell(row, col);
                GridResponse::handled()
            }
            EditorKeyOutcome::Unhandled => GridResponse::ignored(),
        }
    }

    fn move_pending_reference(&mut self, editor: EditorState, delta: isize) -> GridResponse {
        let Some(pending) = editor.pending_column_reference.as_ref() else {
            return GridResponse::ignored();
        };
        let Some(sheet) = self.sheet() else {
            return GridResponse::ignored();
        };
        if sheet.columns.is_empty() {
            return GridResponse::handled();
        }
        let last = sheet.num_columns() as isize - 1;
        let col = (pending.column_index + delta).clamp(0, last);
        let header = sheet.columns[col as usize].column_header.clone();
        let editor = editor.insert_column_reference(col, col, vec![header]);

        let (row, _) = self.state.selection.active_range().end();
        self.reveal_single_cell(row, col);
        self.mode = GridMode::Editing { editor };
        GridResponse::handled()
    }

    fn editing_mouse_down(
        &mut self,
        editor: EditorState,
        hit: Option<CellHit>,
        modifiers: Modifiers,
    ) -> GridResponse {
        if editor.is_header_edit() {
            let same_cell = hit.is_some_and(|h| editor.is_editing_cell(h.row_index, h.column_index));
            if !same_cell {
                self.discard_editor("clicked away from header editor");
            }
            return GridResponse::ignored();
        }

        let Some(hit) = hit else {
            return GridResponse::ignored();
        };
        if hit.is_index_column() || editor.is_editing_cell(hit.row_index, hit.column_index) {
            return GridResponse::ignored();
        }
        let Some(sheet) = self.sheet() else {
            return GridResponse::ignored();
        };
        let col = hit.column_index;
        let Some(clicked) = sheet.column(col) else {
            return GridResponse::ignored();
        };

        if !editor.accepts_column_reference() {
            return self.commit_editor(editor);
        }

        let (anchor, headers) = match (&editor.pending_column_reference, modifiers.shift) {
            (Some(pending), true) => {
                let last = sheet.num_columns() as isize - 1;
                let anchor = pending.anchor_column_index.clamp(0, last);
                let (low, high) = (anchor.min(col) as usize, anchor.max(col) as usize);
                let headers = sheet.columns[low..=high]
                    .iter()
                    .map(|column| column.column_header.clone())
                    .collect();
                (anchor, headers)
            }
            _ => (col, vec![clicked.column_header.clone()]),
        };
        let editor = editor.insert_column_reference(anchor, col, headers);
        debug!(column = col, formula = %editor.formula, "inserted column reference");

        self.select_single_cell(hit.row_index, col);
        self.mode = GridMode::Editing { editor };
        GridResponse::handled()
    }

    fn commit_editor(&mut self, editor: EditorState) -> GridResponse {
        self.mode = GridMode::default();
        self.select_single_cell(editor.row_index, editor.column_index);

        let sheet_index = self.state.sheet_index;
        let column_id = self
            .sheet()
            .and_then(|sheet| sheet.column_id(editor.column_index))
            .cloned();
        let Some(column_id) = column_id else {
            debug!(column = editor.column_index, "edited column no longer exists, dropping commit");
            return GridResponse::handled();
        };

        let effect = if editor.is_header_edit() {
            GridEffect::RenameColumnHeader {
                sheet_index,
                column_id,
                new_header: editor.formula,
            }
        } else {
            GridEffect::SubmitFormula {
                sheet_index,
                row_index: editor.row_index,
                column_index: editor.column_index,
                column_id,
                formula: editor.formula,
            }
        };
        GridResponse::handled().with_effect(effect)
    }

    // Explicit editor operations

    /// Open an editor on a cell or, with row `-1`, on a column header
    pub fn open_editor(&mut self, row_index: isize, column_index: isize) -> Result<()> {
        let shape = self.shape();
        if column_index < 0 || column_index >= shape.num_columns as isize {
            return Err(GridError::ColumnOutOfRange {
                index: column_index,
                count: shape.num_columns,
            });
        }
        if row_index < -1 || row_index >= shape.num_rows as isize {
            return Err(GridError::RowOutOfRange {
                index: row_index,
                count: shape.num_rows,
            });
        }
        let formula = self
            .sheet()
            .map(|sheet| sheet.starting_formula(row_index, column_index))
            .unwrap_or_default();
        self.select_single_cell(row_index, column_index);
        self.start_editing(EditorState::open(row_index, column_index, formula));
        Ok(())
    }

    pub fn commit_edit(&mut self) -> Result<GridResponse> {
        let editor = self.editor().cloned().ok_or(GridError::NotEditing)?;
        Ok(self.commit_editor(editor))
    }

    pub fn cancel_edit(&mut self) -> Result<()> {
        if !self.is_editing() {
            return Err(GridError::NotEditing);
        }
        self.discard_editor("cancelled");
        Ok(())
    }

    /// Text typed into the editor, with the resulting text selection
    pub fn set_editor_input(
        &mut self,
        formula: impl Into<String>,
        text_selection: TextSelection,
    ) -> Result<()> {
        match &mut self.mode {
            GridMode::Editing { editor } => {
                *editor = editor.with_input(formula, text_selection);
                Ok(())
            }
            GridMode::Navigation { .. } => Err(GridError::NotEditing),
        }
    }

    pub fn set_editor_text_selection(&mut self, text_selection: TextSelection) -> Result<()> {
        match &mut self.mode {
            GridMode::Editing { editor } => {
                *editor = editor.with_text_selection(text_selection);
                Ok(())
            }
            GridMode::Navigation { .. } => Err(GridError::NotEditing),
        }
    }
}
