use serde::{Deserialize, Serialize};
use tracing::debug;

use super::input::{Key, Modifiers};
use crate::error::GridError;
use crate::sheet::{ColumnId, SheetShape};

/// A rectangular range of cells.
///
/// The bounds are not normalized: `starting_*` is the anchor where the
/// selection began and `ending_*` is the live point. A row index of `-1`
/// is the column header row and selects whole columns; a column index of
/// `-1` is the index column and selects whole rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRange {
    pub starting_row_index: isize,
    pub ending_row_index: isize,
    pub starting_column_index: isize,
    pub ending_column_index: isize,
}

impl SelectionRange {
    pub fn new(
        starting_row_index: isize,
        ending_row_index: isize,
        starting_column_index: isize,
        ending_column_index: isize,
    ) -> Self {
        Self {
            starting_row_index,
            ending_row_index,
            starting_column_index,
            ending_column_index,
        }
    }

    pub fn single_cell(row_index: isize, column_index: isize) -> Self {
        Self::new(row_index, row_index, column_index, column_index)
    }

    /// The header cell of a column, which stands for the entire column
    pub fn whole_column(column_index: isize) -> Self {
        Self::single_cell(-1, column_index)
    }

    /// Anchor of the range as `(row, column)`
    pub fn anchor(&self) -> (isize, isize) {
        (self.starting_row_index, self.starting_column_index)
    }

    /// Live end of the range as `(row, column)`
    pub fn end(&self) -> (isize, isize) {
        (self.ending_row_index, self.ending_column_index)
    }

    /// Same anchor, new live end
    pub fn with_end(&self, row_index: isize, column_index: isize) -> Self {
        Self {
            ending_row_index: row_index,
            ending_column_index: column_index,
            ..*self
        }
    }

    /// Row bounds as `(min, max)`
    pub fn row_bounds(&self) -> (isize, isize) {
        (
            self.starting_row_index.min(self.ending_row_index),
            self.starting_row_index.max(self.ending_row_index),
        )
    }

    /// Column bounds as `(min, max)`
    pub fn column_bounds(&self) -> (isize, isize) {
        (
            self.starting_column_index.min(self.ending_column_index),
            self.starting_column_index.max(self.ending_column_index),
        )
    }

    /// The range reaches into the header row, so it covers whole columns
    pub fn spans_header_row(&self) -> bool {
        self.row_bounds().0 <= -1
    }

    /// The range reaches into the index column, so it covers whole rows
    pub fn spans_index_column(&self) -> bool {
        self.column_bounds().0 <= -1
    }

    /// Both ends lie in the header row
    pub fn is_column_header_only(&self) -> bool {
        self.starting_row_index == -1 && self.ending_row_index == -1
    }

    pub fn contains_column(&self, column_index: isize) -> bool {
        let (min_col, max_col) = self.column_bounds();
        min_col <= column_index && column_index <= max_col
    }

    pub fn contains_row(&self, row_index: isize) -> bool {
        let (min_row, max_row) = self.row_bounds();
        min_row <= row_index && row_index <= max_row
    }

    /// Check if a cell is covered by this range, honoring the `-1` sentinels
    pub fn covers(&self, row_index: isize, column_index: isize) -> bool {
        let row_covered = self.spans_header_row() || self.contains_row(row_index);
        let column_covered = self.spans_index_column() || self.contains_column(column_index);
        row_covered && column_covered
    }

    /// Covers every row of `column_index`
    pub fn covers_whole_column(&self, column_index: isize) -> bool {
        self.spans_header_row() && self.contains_column(column_index)
    }

    /// Splits the range around a column, keeping the anchor-to-end direction
    fn without_column(&self, column_index: isize) -> Vec<SelectionRange> {
        let (min_col, max_col) = self.column_bounds();
        let ascending = self.starting_column_index <= self.ending_column_index;
        let piece = |lo: isize, hi: isize| {
            let (start, end) = if ascending { (lo, hi) } else { (hi, lo) };
            SelectionRange {
                starting_column_index: start,
                ending_column_index: end,
                ..*self
            }
        };

        let mut pieces = Vec::with_capacity(2);
        if min_col < column_index {
            pieces.push(piece(min_col, column_index - 1));
        }
        if column_index < max_col {
            pieces.push(piece(column_index + 1, max_col));
        }
        pieces
    }
}

/// An ordered, non-empty list of ranges.
///
/// The last range is the active one: drag and extend operations only ever
/// touch it, earlier ranges are frozen results of modifier clicks. Every
/// operation returns a new selection and leaves `self` untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SelectionRange>", into = "Vec<SelectionRange>")]
pub struct Selection {
    ranges: Vec<SelectionRange>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<Vec<SelectionRange>> for Selection {
    type Error = GridError;

    fn try_from(ranges: Vec<SelectionRange>) -> Result<Self, Self::Error> {
        Self::from_ranges(ranges)
    }
}

impl From<Selection> for Vec<SelectionRange> {
    fn from(selection: Selection) -> Self {
        selection.ranges
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::single(SelectionRange::default())
    }

    pub fn single(range: SelectionRange) -> Self {
        Self {
            ranges: vec![range],
        }
    }

    pub fn from_ranges(ranges: Vec<SelectionRange>) -> Result<Self, GridError> {
        if ranges.is_empty() {
            return Err(GridError::EmptySelection);
        }
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Never true; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The range mutated by drag and extend operations
    pub fn active_range(&self) -> SelectionRange {
        self.ranges[self.ranges.len() - 1]
    }

    /// Replace everything with a single cell anchored at `(row, column)`
    pub fn start_new_range(&self, row_index: isize, column_index: isize) -> Self {
        Self::single(SelectionRange::single_cell(row_index, column_index))
    }

    /// Move the live end of the active range, leaving the anchor in place
    pub fn extend_active_range(&self, row_index: isize, column_index: isize) -> Self {
        let mut ranges = self.ranges.clone();
        let last = ranges.len() - 1;
        ranges[last] = ranges[last].with_end(row_index, column_index);
        Self { ranges }
    }

    /// Add a single-cell range that becomes the active one
    pub fn append_range(&self, row_index: isize, column_index: isize) -> Self {
        self.append(SelectionRange::single_cell(row_index, column_index))
    }

    pub fn append(&self, range: SelectionRange) -> Self {
        let mut ranges = self.ranges.clone();
        ranges.push(range);
        Self { ranges }
    }

    /// Deselect a fully selected column, or add it when it is not selected
    pub fn toggle_column_in_selection(&self, column_index: isize) -> Self {
        if self.is_column_fully_selected(column_index) {
            self.remove_column(column_index)
        } else {
            self.append(SelectionRange::whole_column(column_index))
        }
    }

    fn remove_column(&self, column_index: isize) -> Self {
        let ranges: Vec<SelectionRange> = self
            .ranges
            .iter()
            .flat_map(|range| {
                if range.covers_whole_column(column_index) {
                    range.without_column(column_index)
                } else {
                    vec![*range]
                }
            })
            .collect();

        Self::from_ranges(ranges).unwrap_or_default()
    }

    /// A cell is selected when any range covers it
    pub fn is_cell_selected(&self, row_index: isize, column_index: isize) -> bool {
        self.ranges.iter().any(|r| r.covers(row_index, column_index))
    }

    pub fn is_column_fully_selected(&self, column_index: isize) -> bool {
        self.ranges
            .iter()
            .any(|r| r.covers_whole_column(column_index))
    }

    /// Every range sits entirely in the header row
    pub fn is_only_column_headers(&self) -> bool {
        self.ranges.iter().all(SelectionRange::is_column_header_only)
    }

    /// Distinct data column indexes touched by any range, ascending
    pub fn column_indexes(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = self
            .ranges
            .iter()
            .flat_map(|range| {
                let (min_col, max_col) = range.column_bounds();
                (min_col.max(0)..=max_col).filter_map(|c| usize::try_from(c).ok())
            })
            .collect();
        indexes.sort_unstable();
        indexes.dedup();
        indexes
    }

    /// Remap the selection after the sheet's columns or rows changed.
    ///
    /// Column bounds follow their column id to its new display position. A
    /// bound whose column disappeared lands on the column that slid into its
    /// place, or the last column when it was at the end. Row bounds are
    /// clamped to the new row count. With no columns or no rows left, bounds
    /// collapse onto the `-1` sentinel.
    pub fn reconcile_after_structural_change(
        &self,
        old_column_ids: &[ColumnId],
        new_column_ids: &[ColumnId],
        shape: SheetShape,
    ) -> Self {
        let remap_column = |index: isize| -> isize {
            if index < 0 || new_column_ids.is_empty() {
                return -1;
            }
            let last = new_column_ids.len() as isize - 1;
            let moved = old_column_ids
                .get(index as usize)
                .and_then(|id| new_column_ids.iter().position(|new_id| new_id == id));
            match moved {
                Some(position) => position as isize,
                None => {
                    debug!(column_index = index, "selected column no longer exists, clamping");
                    index.min(last)
                }
            }
        };
        let clamp_row = |index: isize| -> isize {
            if index < 0 || shape.num_rows == 0 {
                return -1;
            }
            index.min(shape.num_rows as isize - 1)
        };

        let ranges = self
            .ranges
            .iter()
            .map(|range| SelectionRange {
                starting_row_index: clamp_row(range.starting_row_index),
                ending_row_index: clamp_row(range.ending_row_index),
                starting_column_index: remap_column(range.starting_column_index),
                ending_column_index: remap_column(range.ending_column_index),
            })
            .collect();

        Self { ranges }
    }
}

/// Compute the active range after a navigation key.
///
/// Moves start from the range's live end. Arrows move one cell, Tab moves
/// right (left with shift), Enter moves down (up with shift), Home and End
/// go to the first and last column. With the primary modifier, arrows jump
/// to the sheet edge and Home/End go to the first/last cell. Shift with
/// arrows, Home or End extends the range instead of moving it. Targets are
/// clamped to the data area; non-navigation keys and empty sheets leave the
/// range unchanged.
pub fn navigate(
    active: SelectionRange,
    key: Key,
    modifiers: Modifiers,
    shape: SheetShape,
) -> SelectionRange {
    if shape.is_empty() {
        return active;
    }

    let max_row = shape.num_rows as isize - 1;
    let max_col = shape.num_columns as isize - 1;
    let (row, col) = active.end();
    let jump = modifiers.primary;
    let shift = modifiers.shift;

    let (target_row, target_col, extend) = match key {
        Key::ArrowUp => (if jump { 0 } else { row - 1 }, col, shift),
        Key::ArrowDown => (if jump { max_row } else { row + 1 }, col, shift),
        Key::ArrowLeft => (row, if jump { 0 } else { col - 1 }, shift),
        Key::ArrowRight => (row, if jump { max_col } else { col + 1 }, shift),
        Key::Tab => (row, if shift { col - 1 } else { col + 1 }, false),
        Key::Enter => (if shift { row - 1 } else { row + 1 }, col, false),
        Key::Home if jump => (0, 0, shift),
        Key::Home => (row, 0, shift),
        Key::End if jump => (max_row, max_col, shift),
        Key::End => (row, max_col, shift),
        _ => return active,
    };

    let target_row = target_row.clamp(0, max_row);
    let target_col = target_col.clamp(0, max_col);

    if extend {
        active.with_end(target_row, target_col)
    } else {
        SelectionRange::single_cell(target_row, target_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(names: &[&str]) -> Vec<ColumnId> {
        names.iter().map(|n| ColumnId::from(*n)).collect()
    }

    // SelectionRange tests
    #[test]
    fn test_range_bounds_unnormalized() {
        let range = SelectionRange::new(5, 2, 7, 3);
        assert_eq!(range.anchor(), (5, 7));
        assert_eq!(range.end(), (2, 3));
        assert_eq!(range.row_bounds(), (2, 5));
        assert_eq!(range.column_bounds(), (3, 7));
    }

    #[test]
    fn test_range_covers_reversed() {
        let range = SelectionRange::new(5, 2, 7, 3);
        assert!(range.covers(3, 5));
        assert!(range.covers(2, 3));
        assert!(range.covers(5, 7));
        assert!(!range.covers(1, 5));
        assert!(!range.covers(3, 8));
    }

    #[test]
    fn test_whole_column_covers_every_row() {
        let range = SelectionRange::whole_column(2);
        assert!(range.covers(-1, 2));
        assert!(range.covers(0, 2));
        assert!(range.covers(1400, 2));
        assert!(!range.covers(0, 3));
        assert!(range.covers_whole_column(2));
        assert!(range.is_column_header_only());
    }

    #[test]
    fn test_whole_row_covers_every_column() {
        let range = SelectionRange::single_cell(4, -1);
        assert!(range.covers(4, 0));
        assert!(range.covers(4, 99));
        assert!(!range.covers(5, 0));
        assert!(!range.covers_whole_column(0));
    }

    // Selection tests
    #[test]
    fn test_selection_default() {
        let selection = Selection::default();
        assert_eq!(selection.ranges(), &[SelectionRange::new(0, 0, 0, 0)]);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_from_ranges_rejects_empty() {
        assert_eq!(
            Selection::from_ranges(Vec::new()),
            Err(GridError::EmptySelection)
        );
    }

    #[test]
    fn test_start_then_extend() {
        let selection = Selection::new()
            .start_new_range(2, 3)
            .extend_active_range(4, 5);
        assert_eq!(selection.ranges(), &[SelectionRange::new(2, 4, 3, 5)]);
    }

    #[test]
    fn test_append_then_extend_only_touches_active() {
        let selection = Selection::single(SelectionRange::new(2, 4, 3, 5)).append_range(0, 0);
        assert_eq!(
            selection.ranges(),
            &[SelectionRange::new(2, 4, 3, 5), SelectionRange::new(0, 0, 0, 0)]
        );

        let selection = selection.extend_active_range(1, 1);
        assert_eq!(
            selection.ranges(),
            &[SelectionRange::new(2, 4, 3, 5), SelectionRange::new(0, 1, 0, 1)]
        );
    }

    #[test]
    fn test_operations_leave_original_untouched() {
        let original = Selection::new().start_new_range(1, 1);
        let _ = original.extend_active_range(3, 3);
        let _ = original.append_range(5, 5);
        assert_eq!(original.ranges(), &[SelectionRange::single_cell(1, 1)]);
    }

    #[test]
    fn test_toggle_column_adds_whole_column() {
        let selection = Selection::new().toggle_column_in_selection(3);
        assert_eq!(selection.len(), 2);
        assert_eq!(selection.active_range(), SelectionRange::whole_column(3));
        assert!(selection.is_column_fully_selected(3));
    }

    #[test]
    fn test_toggle_column_removes_single_column() {
        let selection = Selection::single(SelectionRange::new(0, 0, 0, 0))
            .append(SelectionRange::whole_column(3))
            .toggle_column_in_selection(3);
        assert_eq!(selection.ranges(), &[SelectionRange::new(0, 0, 0, 0)]);
    }

    #[test]
    fn test_toggle_column_splits_range() {
        let selection =
            Selection::single(SelectionRange::new(-1, -1, 1, 4)).toggle_column_in_selection(2);
        assert_eq!(
            selection.ranges(),
            &[SelectionRange::new(-1, -1, 1, 1), SelectionRange::new(-1, -1, 3, 4)]
        );
        assert!(!selection.is_column_fully_selected(2));
        assert!(selection.is_column_fully_selected(1));
        assert!(selection.is_column_fully_selected(4));
    }

    #[test]
    fn test_toggle_column_split_keeps_direction() {
        let selection =
            Selection::single(SelectionRange::new(-1, -1, 4, 1)).toggle_column_in_selection(4);
        assert_eq!(selection.ranges(), &[SelectionRange::new(-1, -1, 3, 1)]);
    }

    #[test]
    fn test_toggle_last_column_falls_back_to_default() {
        let selection =
            Selection::single(SelectionRange::whole_column(0)).toggle_column_in_selection(0);
        assert_eq!(selection, Selection::default());
    }

    #[test]
    fn test_toggle_ignores_partial_column() {
        // Rows 0..5 of column 2 are selected but not the whole column
        let selection =
            Selection::single(SelectionRange::new(0, 5, 2, 2)).toggle_column_in_selection(2);
        assert_eq!(selection.len(), 2);
        assert!(selection.is_column_fully_selected(2));
    }

    #[test]
    fn test_is_only_column_headers() {
        let selection = Selection::single(SelectionRange::whole_column(1))
            .append(SelectionRange::new(-1, -1, 3, 5));
        assert!(selection.is_only_column_headers());
        assert!(!selection.append_range(0, 0).is_only_column_headers());
    }

    #[test]
    fn test_column_indexes() {
        let selection = Selection::single(SelectionRange::new(-1, -1, 5, 3))
            .append(SelectionRange::whole_column(4))
            .append(SelectionRange::new(-1, -1, -1, 0));
        assert_eq!(selection.column_indexes(), vec![0, 3, 4, 5]);
    }

    // navigate tests
    fn shape() -> SheetShape {
        SheetShape::new(10, 5)
    }

    #[test]
    fn test_navigate_arrows() {
        let start = SelectionRange::single_cell(3, 2);
        let none = Modifiers::new();
        assert_eq!(
            navigate(start, Key::ArrowUp, none, shape()),
            SelectionRange::single_cell(2, 2)
        );
        assert_eq!(
            navigate(start, Key::ArrowDown, none, shape()),
            SelectionRange::single_cell(4, 2)
        );
        assert_eq!(
            navigate(start, Key::ArrowLeft, none, shape()),
            SelectionRange::single_cell(3, 1)
        );
        assert_eq!(
            navigate(start, Key::ArrowRight, none, shape()),
            SelectionRange::single_cell(3, 3)
        );
    }

    #[test]
    fn test_navigate_moves_from_live_end() {
        let dragged = SelectionRange::new(2, 4, 3, 5);
        assert_eq!(
            navigate(dragged, Key::ArrowDown, Modifiers::new(), SheetShape::new(10, 10)),
            SelectionRange::single_cell(5, 5)
        );
    }

    #[test]
    fn test_navigate_clamps_at_edges() {
        let none = Modifiers::new();
        assert_eq!(
            navigate(SelectionRange::single_cell(0, 0), Key::ArrowUp, none, shape()),
            SelectionRange::single_cell(0, 0)
        );
        assert_eq!(
            navigate(SelectionRange::single_cell(9, 4), Key::ArrowDown, none, shape()),
            SelectionRange::single_cell(9, 4)
        );
        assert_eq!(
            navigate(SelectionRange::single_cell(9, 4), Key::Tab, none, shape()),
            SelectionRange::single_cell(9, 4)
        );
    }

    #[test]
    fn test_navigate_out_of_header() {
        let header = SelectionRange::whole_column(2);
        assert_eq!(
            navigate(header, Key::ArrowDown, Modifiers::new(), shape()),
            SelectionRange::single_cell(0, 2)
        );
    }

    #[test]
    fn test_navigate_shift_extends() {
        let start = SelectionRange::single_cell(3, 2);
        let shift = Modifiers::new().with_shift(true);
        let extended = navigate(start, Key::ArrowDown, shift, shape());
        assert_eq!(extended, SelectionRange::new(3, 4, 2, 2));
        let extended = navigate(extended, Key::ArrowRight, shift, shape());
        assert_eq!(extended, SelectionRange::new(3, 4, 2, 3));
    }

    #[test]
    fn test_navigate_tab_and_enter() {
        let start = SelectionRange::single_cell(3, 2);
        let none = Modifiers::new();
        let shift = Modifiers::new().with_shift(true);
        assert_eq!(navigate(start, Key::Tab, none, shape()), SelectionRange::single_cell(3, 3));
        assert_eq!(navigate(start, Key::Tab, shift, shape()), SelectionRange::single_cell(3, 1));
        assert_eq!(navigate(start, Key::Enter, none, shape()), SelectionRange::single_cell(4, 2));
        assert_eq!(navigate(start, Key::Enter, shift, shape()), SelectionRange::single_cell(2, 2));
    }

    #[test]
    fn test_navigate_home_end() {
        let start = SelectionRange::single_cell(3, 2);
        let none = Modifiers::new();
        let primary = Modifiers::new().with_primary(true);
        assert_eq!(navigate(start, Key::Home, none, shape()), SelectionRange::single_cell(3, 0));
        assert_eq!(navigate(start, Key::End, none, shape()), SelectionRange::single_cell(3, 4));
        assert_eq!(navigate(start, Key::Home, primary, shape()), SelectionRange::single_cell(0, 0));
        assert_eq!(navigate(start, Key::End, primary, shape()), SelectionRange::single_cell(9, 4));
        assert_eq!(
            navigate(start, Key::End, Modifiers::new().with_shift(true), shape()),
            SelectionRange::new(3, 3, 2, 4)
        );
    }

    #[test]
    fn test_navigate_primary_jumps_to_edge() {
        let start = SelectionRange::single_cell(3, 2);
        let primary = Modifiers::new().with_primary(true);
        assert_eq!(navigate(start, Key::ArrowDown, primary, shape()), SelectionRange::single_cell(9, 2));
        assert_eq!(navigate(start, Key::ArrowLeft, primary, shape()), SelectionRange::single_cell(3, 0));
    }

    #[test]
    fn test_navigate_empty_sheet_is_noop() {
        let start = SelectionRange::default();
        assert_eq!(
            navigate(start, Key::ArrowDown, Modifiers::new(), SheetShape::new(0, 3)),
            start
        );
    }

    #[test]
    fn test_navigate_ignores_other_keys() {
        let start = SelectionRange::single_cell(3, 2);
        assert_eq!(navigate(start, Key::Char('x'), Modifiers::new(), shape()), start);
    }

    // reconcile tests
    #[test]
    fn test_reconcile_removed_column_lands_on_next() {
        let selection = Selection::single(SelectionRange::new(0, 0, 1, 1));
        let reconciled = selection.reconcile_after_structural_change(
            &ids(&["A", "B", "C"]),
            &ids(&["A", "C"]),
            SheetShape::new(5, 2),
        );
        assert_eq!(reconciled.ranges(), &[SelectionRange::new(0, 0, 1, 1)]);
    }

    #[test]
    fn test_reconcile_removed_last_column_clamps() {
        let selection = Selection::single(SelectionRange::new(0, 0, 2, 2));
        let reconciled = selection.reconcile_after_structural_change(
            &ids(&["A", "B", "C"]),
            &ids(&["A", "B"]),
            SheetShape::new(5, 2),
        );
        assert_eq!(reconciled.ranges(), &[SelectionRange::new(0, 0, 1, 1)]);
    }

    #[test]
    fn test_reconcile_follows_reorder() {
        let selection = Selection::single(SelectionRange::new(1, 2, 0, 2));
        let reconciled = selection.reconcile_after_structural_change(
            &ids(&["A", "B", "C"]),
            &ids(&["C", "X", "A", "B"]),
            SheetShape::new(5, 4),
        );
        assert_eq!(reconciled.ranges(), &[SelectionRange::new(1, 2, 2, 0)]);
    }

    #[test]
    fn test_reconcile_keeps_sentinels_and_clamps_rows() {
        let selection = Selection::single(SelectionRange::whole_column(0))
            .append(SelectionRange::new(3, 8, -1, -1));
        let reconciled = selection.reconcile_after_structural_change(
            &ids(&["A"]),
            &ids(&["A"]),
            SheetShape::new(5, 1),
        );
        assert_eq!(
            reconciled.ranges(),
            &[SelectionRange::whole_column(0), SelectionRange::new(3, 4, -1, -1)]
        );
    }

    #[test]
    fn test_reconcile_all_columns_removed() {
        let selection = Selection::single(SelectionRange::new(2, 2, 0, 0));
        let reconciled = selection.reconcile_after_structural_change(
            &ids(&["A"]),
            &[],
            SheetShape::new(0, 0),
        );
        assert_eq!(reconciled.ranges(), &[SelectionRange::new(-1, -1, -1, -1)]);
    }

    #[test]
    fn test_serialization_round_trip_and_empty_rejected() {
        let selection = Selection::single(SelectionRange::new(2, 4, 3, 5)).append_range(0, 0);
        let json = serde_json::to_string(&selection).unwrap();
        assert!(json.starts_with(r#"[{"startingRowIndex":2"#));
        let back: Selection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, selection);

        assert!(serde_json::from_str::<Selection>("[]").is_err());
    }

    fn arb_range(max: isize) -> impl Strategy<Value = SelectionRange> {
        (-1..max, -1..max, -1..max, -1..max)
            .prop_map(|(a, b, c, d)| SelectionRange::new(a, b, c, d))
    }

    fn arb_key() -> impl Strategy<Value = Key> {
        prop_oneof![
            Just(Key::ArrowUp),
            Just(Key::ArrowDown),
            Just(Key::ArrowLeft),
            Just(Key::ArrowRight),
            Just(Key::Tab),
            Just(Key::Enter),
            Just(Key::Home),
            Just(Key::End),
        ]
    }

    proptest! {
        #[test]
        fn prop_union_semantics(
            ranges in prop::collection::vec(arb_range(8), 1..5),
            row in -1isize..8,
            col in -1isize..8,
        ) {
            let selection = Selection::from_ranges(ranges.clone()).unwrap();
            let expected = ranges.iter().any(|r| r.covers(row, col));
            prop_assert_eq!(selection.is_cell_selected(row, col), expected);
        }

        #[test]
        fn prop_navigation_stays_in_bounds(
            rows in 1usize..20,
            cols in 1usize..20,
            start_row in 0usize..20,
            start_col in 0usize..20,
            presses in prop::collection::vec((arb_key(), any::<bool>(), any::<bool>()), 0..40),
        ) {
            let shape = SheetShape::new(rows, cols);
            let start_row = (start_row % rows) as isize;
            let start_col = (start_col % cols) as isize;
            let mut range = SelectionRange::single_cell(start_row, start_col);
            for (key, shift, primary) in presses {
                let modifiers = Modifiers::new().with_shift(shift).with_primary(primary);
                range = navigate(range, key, modifiers, shape);
                for index in [range.starting_row_index, range.ending_row_index] {
                    prop_assert!(index >= 0 && index < rows as isize);
                }
                for index in [range.starting_column_index, range.ending_column_index] {
                    prop_assert!(index >= 0 && index < cols as isize);
                }
            }
        }

        #[test]
        fn prop_reconcile_never_dangles(
            ranges in prop::collection::vec(arb_range(10), 1..5),
            old_len in 0usize..10,
            keep in prop::collection::vec(any::<bool>(), 10),
            added in 0usize..4,
            rows in 0usize..12,
        ) {
            let old_ids: Vec<ColumnId> = (0..old_len).map(|i| ColumnId::from(format!("c{}", i))).collect();
            let mut new_ids: Vec<ColumnId> = old_ids
                .iter()
                .zip(keep.iter())
                .filter(|(_, keep)| **keep)
                .map(|(id, _)| id.clone())
                .collect();
            new_ids.extend((0..added).map(|i| ColumnId::from(format!("new{}", i))));
            let shape = SheetShape::new(rows, new_ids.len());

            let selection = Selection::from_ranges(ranges).unwrap();
            let reconciled = selection.reconcile_after_structural_change(&old_ids, &new_ids, shape);

            prop_assert_eq!(reconciled.len(), selection.len());
            for range in reconciled.ranges() {
                for col in [range.starting_column_index, range.ending_column_index] {
                    prop_assert!(col == -1 || (col >= 0 && (col as usize) < new_ids.len()));
                }
                for row in [range.starting_row_index, range.ending_row_index] {
                    prop_assert!(row == -1 || (row >= 0 && (row as usize) < rows));
                }
            }
        }
    }
}
