use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::sheet::ColumnId;

/// Width of a column that was never resized
pub const DEFAULT_WIDTH: f64 = 123.0;

/// Columns can never be resized below this
pub const MIN_WIDTH: f64 = 50.0;

/// Default width for a column id
pub fn get_default_width(_column_id: &ColumnId) -> f64 {
    DEFAULT_WIDTH
}

/// Ordered column widths of one sheet.
///
/// `column_ids` and `width_array` are parallel and in display order;
/// `total_width` is always their sum.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidthData {
    column_ids: Vec<ColumnId>,
    width_array: Vec<f64>,
    total_width: f64,
}

impl WidthData {
    /// Widths of a sheet without columns
    pub const fn empty() -> Self {
        Self {
            column_ids: Vec::new(),
            width_array: Vec::new(),
            total_width: 0.0,
        }
    }

    /// Default widths for every column
    pub fn new(column_ids: &[ColumnId]) -> Self {
        let widths = column_ids.iter().map(get_default_width).collect();
        Self::from_parts(column_ids.to_vec(), widths)
    }

    fn from_parts(column_ids: Vec<ColumnId>, width_array: Vec<f64>) -> Self {
        let total_width = width_array.iter().sum();
        Self {
            column_ids,
            width_array,
            total_width,
        }
    }

    pub fn column_ids(&self) -> &[ColumnId] {
        &self.column_ids
    }

    pub fn width_array(&self) -> &[f64] {
        &self.width_array
    }

    pub fn total_width(&self) -> f64 {
        self.total_width
    }

    pub fn len(&self) -> usize {
        self.width_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.width_array.is_empty()
    }

    pub fn width_of(&self, column_id: &ColumnId) -> Option<f64> {
        self.column_ids
            .iter()
            .position(|id| id == column_id)
            .and_then(|index| self.width_array.get(index).copied())
    }

    pub fn width_at(&self, column_index: usize) -> Option<f64> {
        self.width_array.get(column_index).copied()
    }

    /// Resize one column, never below [`MIN_WIDTH`].
    ///
    /// Unknown column ids leave the widths as they are.
    pub fn resize(&self, column_id: &ColumnId, new_width: f64) -> Self {
        let Some(index) = self.column_ids.iter().position(|id| id == column_id) else {
            debug!(%column_id, "resize of unknown column ignored");
            return self.clone();
        };
        let mut widths = self.width_array.clone();
        let Some(width) = widths.get_mut(index) else {
            debug!(%column_id, "resize of column without a width ignored");
            return self.clone();
        };
        // f64::max drops a NaN operand
        *width = new_width.max(MIN_WIDTH);
        Self::from_parts(self.column_ids.clone(), widths)
    }

    /// Carry widths over to a new column order.
    ///
    /// Ids present before keep their width, new ids get the default width,
    /// removed ids are dropped.
    pub fn reconcile(&self, old_order: &[ColumnId], new_order: &[ColumnId]) -> Self {
        if self.column_ids == new_order && old_order == new_order {
            return self.clone();
        }

        let known: HashMap<&ColumnId, f64> = self
            .column_ids
            .iter()
            .zip(self.width_array.iter().copied())
            .collect();
        let widths = new_order
            .iter()
            .map(|id| {
                known
                    .get(id)
                    .copied()
                    .unwrap_or_else(|| get_default_width(id))
            })
            .collect();

        Self::from_parts(new_order.to_vec(), widths)
    }

    /// Left edge of a column in content pixels; past the end gives the total
    pub fn column_offset(&self, column_index: usize) -> f64 {
        self.width_array.iter().take(column_index).sum()
    }

    /// Column whose horizontal extent contains `offset`
    pub fn column_at_offset(&self, offset: f64) -> Option<usize> {
        if offset < 0.0 {
            return None;
        }
        let mut left = 0.0;
        for (index, width) in self.width_array.iter().enumerate() {
            if offset < left + width {
                return Some(index);
            }
            left += width;
        }
        None
    }
}

/// Reconcile the widths of every sheet at once.
///
/// Sheets are matched by position; sheets without previous widths start
/// with default widths.
pub fn reconcile_width_data_array(
    old_array: &[WidthData],
    old_column_ids_array: &[Vec<ColumnId>],
    new_column_ids_array: &[Vec<ColumnId>],
) -> Vec<WidthData> {
    new_column_ids_array
        .iter()
        .enumerate()
        .map(|(sheet_index, new_ids)| match old_array.get(sheet_index) {
            Some(width_data) => {
                let old_ids = old_column_ids_array
                    .get(sheet_index)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                width_data.reconcile(old_ids, new_ids)
            }
            None => WidthData::new(new_ids),
        })
        .collect()
}
