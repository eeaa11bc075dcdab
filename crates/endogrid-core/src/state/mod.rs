pub mod edit;
pub mod input;
pub mod selection;
pub mod viewport;
pub mod width;

pub use edit::{EditorKeyOutcome, EditorState, PendingColumnReference, TextSelection};
pub use input::{CellHit, Key, KeyEvent, Modifiers, Platform};
pub use selection::{navigate, Selection, SelectionRange};
pub use viewport::{
    calculate_sheet_view, calculate_translate, clamp_scroll_position, ensure_cell_visible,
    total_size, Dimension, RendererTranslate, ScrollPosition, SheetView, DEFAULT_HEIGHT, MAX_ROWS,
};
pub use width::{reconcile_width_data_array, WidthData, DEFAULT_WIDTH, MIN_WIDTH};

use serde::{Deserialize, Serialize};

use crate::sheet::{column_ids_array, ColumnId, SheetData};

static NO_WIDTHS: WidthData = WidthData::empty();

/// Everything the grid renders from, replaced as a whole on every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridState {
    pub sheet_index: usize,
    pub viewport: Dimension,
    pub scroll_position: ScrollPosition,
    pub selection: Selection,
    /// Column ids of every sheet as of the last reconciliation
    pub column_ids_array: Vec<Vec<ColumnId>>,
    pub width_data_array: Vec<WidthData>,
}

impl GridState {
    /// Fresh state for a set of sheets, showing `sheet_index`
    pub fn new(sheets: &[SheetData], sheet_index: usize) -> Self {
        let column_ids_array = column_ids_array(sheets);
        let width_data_array = column_ids_array
            .iter()
            .map(|ids| WidthData::new(ids))
            .collect();
        Self {
            sheet_index,
            viewport: Dimension::default(),
            scroll_position: ScrollPosition::default(),
            selection: Selection::default(),
            column_ids_array,
            width_data_array,
        }
    }

    /// Column ids of the displayed sheet
    pub fn column_ids(&self) -> &[ColumnId] {
        self.column_ids_array
            .get(self.sheet_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Widths of the displayed sheet
    pub fn widths(&self) -> &WidthData {
        self.width_data_array
            .get(self.sheet_index)
            .unwrap_or(&NO_WIDTHS)
    }

    pub fn total_size(&self, num_rows: usize) -> Dimension {
        total_size(num_rows, self.widths())
    }

    pub fn sheet_view(&self, num_rows: usize) -> SheetView {
        calculate_sheet_view(self.scroll_position, self.viewport, num_rows, self.widths())
    }

    pub fn translate(&self, num_rows: usize) -> RendererTranslate {
        calculate_translate(self.scroll_position, self.viewport, num_rows, self.widths())
    }

    pub fn with_selection(&self, selection: Selection) -> Self {
        Self {
            selection,
            ..self.clone()
        }
    }

    /// New scroll position, clamped to the content
    pub fn with_scroll_position(&self, scroll_position: ScrollPosition, num_rows: usize) -> Self {
        let scroll_position =
            clamp_scroll_position(scroll_position, self.viewport, self.total_size(num_rows));
        Self {
            scroll_position,
            ..self.clone()
        }
    }

    /// New viewport size; the scroll position is re-clamped to fit
    pub fn with_viewport(&self, viewport: Dimension, num_rows: usize) -> Self {
        let resized = Self {
            viewport,
            ..self.clone()
        };
        let scroll_position =
            clamp_scroll_position(resized.scroll_position, viewport, resized.total_size(num_rows));
        Self {
            scroll_position,
            ..resized
        }
    }

    /// Resize a column of any sheet; unknown sheets or columns change nothing
    pub fn with_column_width(&self, sheet_index: usize, column_id: &ColumnId, width: f64) -> Self {
        let Some(width_data) = self.width_data_array.get(sheet_index) else {
            return self.clone();
        };
        let mut width_data_array = self.width_data_array.clone();
        width_data_array[sheet_index] = width_data.resize(column_id, width);
        Self {
            width_data_array,
            ..self.clone()
        }
    }

    /// Scroll the least amount needed to show a cell
    pub fn scrolled_to_cell(&self, row_index: isize, column_index: isize) -> Self {
        let scroll_position = ensure_cell_visible(
            self.scroll_position,
            self.viewport,
            self.widths(),
            row_index,
            column_index,
        );
        Self {
            scroll_position,
            ..self.clone()
        }
    }

    /// Bring the state in line with a new set of sheets.
    ///
    /// Staying on the same sheet remaps the current selection by column id;
    /// switching sheets resets selection and scroll. Widths are carried over
    /// per sheet either way.
    pub fn reconciled(&self, sheets: &[SheetData], sheet_index: usize) -> Self {
        let new_column_ids_array = column_ids_array(sheets);
        let width_data_array = reconcile_width_data_array(
            &self.width_data_array,
            &self.column_ids_array,
            &new_column_ids_array,
        );
        let shape = sheets
            .get(sheet_index)
            .map(SheetData::shape)
            .unwrap_or_default();

        let switched = sheet_index != self.sheet_index;
        let (selection, scroll_position) = if switched {
            (Selection::default(), ScrollPosition::default())
        } else {
            let new_ids = new_column_ids_array
                .get(sheet_index)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let selection =
                self.selection
                    .reconcile_after_structural_change(self.column_ids(), new_ids, shape);
            (selection, self.scroll_position)
        };

        let reconciled = Self {
            sheet_index,
            viewport: self.viewport,
            scroll_position,
            selection,
            column_ids_array: new_column_ids_array,
            width_data_array,
        };
        let scroll_position = clamp_scroll_position(
            reconciled.scroll_position,
            reconciled.viewport,
            reconciled.total_size(shape.num_rows),
        );
        Self {
            scroll_position,
            ..reconciled
        }
    }
}

/// Interaction mode of the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum GridMode {
    /// Selecting and scrolling; `dragging` while the pointer is held down
    Navigation { dragging: bool },
    /// A cell or header editor is open
    Editing { editor: EditorState },
}

impl Default for GridMode {
    fn default() -> Self {
        GridMode::Navigation { dragging: false }
    }
}

impl GridMode {
    pub fn is_editing(&self) -> bool {
        matches!(self, GridMode::Editing { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, GridMode::Navigation { dragging: true })
    }

    pub fn editor(&self) -> Option<&EditorState> {
        match self {
            GridMode::Editing { editor } => Some(editor),
            GridMode::Navigation { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue;
    use crate::sheet::{ColumnData, SheetSource};

    fn sheet(name: &str, columns: &[&str], num_rows: usize) -> SheetData {
        columns.iter().fold(SheetData::new(name, num_rows), |sheet, id| {
            sheet.with_column(
                ColumnData::new(*id, *id).with_values(vec![CellValue::Number(1.0); num_rows]),
            )
        })
    }

    #[test]
    fn test_grid_state_new() {
        let sheets = vec![sheet("df1", &["A", "B"], 10), sheet("df2", &["X"], 3)];
        let state = GridState::new(&sheets, 1);
        assert_eq!(state.sheet_index, 1);
        assert_eq!(state.column_ids(), &[ColumnId::from("X")]);
        assert_eq!(state.widths().total_width(), DEFAULT_WIDTH);
        assert_eq!(state.selection, Selection::default());
    }

    #[test]
    fn test_widths_of_missing_sheet() {
        let state = GridState::new(&[], 0);
        assert!(state.widths().is_empty());
        assert!(state.column_ids().is_empty());
        assert!(state.sheet_view(0).is_empty());
    }

    #[test]
    fn test_with_scroll_position_clamps() {
        let sheets = vec![sheet("df1", &["A", "B"], 10)];
        let state = GridState::new(&sheets, 0).with_viewport(Dimension::new(100.0, 100.0), 10);
        let scrolled = state.with_scroll_position(ScrollPosition::new(1000.0, 1000.0), 10);
        assert_eq!(scrolled.scroll_position, ScrollPosition::new(146.0, 150.0));
    }

    #[test]
    fn test_with_viewport_reclamps_scroll() {
        let sheets = vec![sheet("df1", &["A"], 10)];
        let state = GridState::new(&sheets, 0)
            .with_viewport(Dimension::new(50.0, 50.0), 10)
            .with_scroll_position(ScrollPosition::new(0.0, 200.0), 10);
        assert_eq!(state.scroll_position.scroll_top, 200.0);

        let grown = state.with_viewport(Dimension::new(50.0, 200.0), 10);
        assert_eq!(grown.scroll_position.scroll_top, 50.0);
    }

    #[test]
    fn test_with_column_width() {
        let sheets = vec![sheet("df1", &["A", "B"], 10)];
        let state = GridState::new(&sheets, 0).with_column_width(0, &ColumnId::from("B"), 20.0);
        assert_eq!(state.widths().width_array(), &[DEFAULT_WIDTH, MIN_WIDTH]);
        assert_eq!(state.with_column_width(5, &ColumnId::from("B"), 300.0), state);
    }

    #[test]
    fn test_reconciled_same_sheet_remaps_selection() {
        let before = vec![sheet("df1", &["A", "B", "C"], 10)];
        let state = GridState::new(&before, 0)
            .with_selection(Selection::single(SelectionRange::single_cell(0, 2)));

        let after = vec![sheet("df1", &["C", "A"], 10)];
        let reconciled = state.reconciled(&after, 0);
        assert_eq!(
            reconciled.selection.ranges(),
            &[SelectionRange::single_cell(0, 0)]
        );
        assert_eq!(reconciled.column_ids(), &[ColumnId::from("C"), ColumnId::from("A")]);
    }

    #[test]
    fn test_reconciled_is_idempotent() {
        let sheets = vec![sheet("df1", &["A", "B"], 10)];
        let state = GridState::new(&sheets, 0)
            .with_column_width(0, &ColumnId::from("A"), 200.0)
            .with_selection(Selection::single(SelectionRange::new(1, 3, 0, 1)));
        let once = state.reconciled(&sheets, 0);
        assert_eq!(once, state);
        assert_eq!(once.reconciled(&sheets, 0), once);
    }

    #[test]
    fn test_reconciled_sheet_switch_resets() {
        let sheets = vec![
            sheet("df1", &["A", "B"], 10),
            sheet("pivot", &["P"], 4).with_source(SheetSource::Pivoted),
        ];
        let state = GridState::new(&sheets, 0)
            .with_viewport(Dimension::new(100.0, 100.0), 10)
            .with_scroll_position(ScrollPosition::new(50.0, 50.0), 10)
            .with_selection(Selection::single(SelectionRange::single_cell(5, 1)))
            .with_column_width(0, &ColumnId::from("A"), 300.0);

        let switched = state.reconciled(&sheets, 1);
        assert_eq!(switched.sheet_index, 1);
        assert_eq!(switched.selection, Selection::default());
        assert_eq!(switched.scroll_position, ScrollPosition::default());
        // Widths of the other sheet survive the switch
        assert_eq!(switched.width_data_array[0].width_at(0), Some(300.0));
    }

    #[test]
    fn test_scrolled_to_cell() {
        let sheets = vec![sheet("df1", &["A", "B", "C"], 100)];
        let state = GridState::new(&sheets, 0)
            .with_viewport(Dimension::new(200.0, 100.0), 100)
            .scrolled_to_cell(20, 2);
        assert_eq!(state.scroll_position, ScrollPosition::new(169.0, 425.0));
    }

    #[test]
    fn test_grid_mode() {
        let mode = GridMode::default();
        assert!(!mode.is_editing());
        assert!(!mode.is_dragging());
        assert!(mode.editor().is_none());

        let mode = GridMode::Editing {
            editor: EditorState::open(0, 0, "1"),
        };
        assert!(mode.is_editing());
        assert_eq!(mode.editor().map(|e| e.formula.as_str()), Some("1"));

        let json = serde_json::to_value(&mode).unwrap();
        assert_eq!(json["mode"], "editing");
        assert_eq!(json["editor"]["formula"], "1");
    }

    #[test]
    fn test_serialization() {
        let sheets = vec![sheet("df1", &["A"], 1)];
        let state = GridState::new(&sheets, 0);
        let json = serde_json::to_string(&state).unwrap();
        let back: GridState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
