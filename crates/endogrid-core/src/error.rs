use thiserror::Error;

/// Errors raised by explicit grid operations.
///
/// Input events never produce these: an event that maps to nothing is a
/// no-op. They surface only from calls that name a precondition, such as
/// committing an edit while no editor is open.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A selection must always contain at least one range
    #[error("a selection must contain at least one range")]
    EmptySelection,

    /// The operation requires an open cell editor
    #[error("no cell editor is open")]
    NotEditing,

    /// Sheet index does not refer to an open sheet
    #[error("sheet index {index} is out of range ({count} sheets open)")]
    SheetOutOfRange { index: usize, count: usize },

    /// Column index does not refer to a column of the sheet
    #[error("column index {index} is out of range ({count} columns)")]
    ColumnOutOfRange { index: isize, count: usize },

    /// Row index is neither the header row nor a displayed row
    #[error("row index {index} is out of range ({count} rows)")]
    RowOutOfRange { index: isize, count: usize },
}

impl GridError {
    /// Stable error code, used by the JavaScript bindings
    pub fn code(&self) -> &'static str {
        match self {
            GridError::EmptySelection => "EMPTY_SELECTION",
            GridError::NotEditing => "NOT_EDITING",
            GridError::SheetOutOfRange { .. } => "SHEET_OUT_OF_RANGE",
            GridError::ColumnOutOfRange { .. } => "COLUMN_OUT_OF_RANGE",
            GridError::RowOutOfRange { .. } => "ROW_OUT_OF_RANGE",
        }
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
