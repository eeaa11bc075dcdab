pub mod cell;
pub mod error;
pub mod grid;
pub mod sheet;
pub mod state;

pub use cell::CellValue;
pub use error::{GridError, Result};
pub use grid::{EndoGrid, GridEffect, GridResponse};
pub use sheet::{column_ids_array, ColumnData, ColumnId, SheetData, SheetShape, SheetSource};
pub use state::{
    CellHit, Dimension, EditorState, GridMode, GridState, Key, KeyEvent, Modifiers,
    PendingColumnReference, Platform, RendererTranslate, ScrollPosition, Selection,
    SelectionRange, SheetView, TextSelection, WidthData,
};
