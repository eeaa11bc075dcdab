use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cell::CellValue;
use crate::state::viewport::MAX_ROWS;

/// Stable identifier of a column, independent of where it is displayed
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

impl ColumnId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ColumnId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// How the kernel produced a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SheetSource {
    #[default]
    Imported,
    Pivoted,
    Merged,
    Duplicated,
}

/// One column of a sheet snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnData {
    pub column_id: ColumnId,
    pub column_header: String,
    /// Column formula; empty for data columns
    #[serde(default)]
    pub column_formula: String,
    /// Materialized values, at most `MAX_ROWS` of them
    #[serde(default)]
    pub values: Vec<CellValue>,
}

impl ColumnData {
    pub fn new(column_id: impl Into<ColumnId>, column_header: impl Into<String>) -> Self {
        Self {
            column_id: column_id.into(),
            column_header: column_header.into(),
            column_formula: String::new(),
            values: Vec::new(),
        }
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.column_formula = formula.into();
        self
    }

    pub fn with_values(mut self, values: Vec<CellValue>) -> Self {
        self.values = values;
        self
    }
}

/// Row and column counts of the displayed part of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetShape {
    pub num_rows: usize,
    pub num_columns: usize,
}

impl SheetShape {
    pub fn new(num_rows: usize, num_columns: usize) -> Self {
        Self {
            num_rows,
            num_columns,
        }
    }

    /// True when there is no data cell to select
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0 || self.num_columns == 0
    }
}

/// Snapshot of one open dataset as last sent by the kernel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    pub df_name: String,
    #[serde(default)]
    pub df_source: SheetSource,
    /// Total number of rows in the dataset, which may exceed what is materialized
    pub num_rows: usize,
    pub columns: Vec<ColumnData>,
}

impl SheetData {
    pub fn new(df_name: impl Into<String>, num_rows: usize) -> Self {
        Self {
            df_name: df_name.into(),
            df_source: SheetSource::Imported,
            num_rows,
            columns: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: SheetSource) -> Self {
        self.df_source = source;
        self
    }

    pub fn with_column(mut self, column: ColumnData) -> Self {
        self.columns.push(column);
        self
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Rows that can be displayed, navigated and scrolled to
    pub fn num_displayed_rows(&self) -> usize {
        self.num_rows.min(MAX_ROWS)
    }

    pub fn shape(&self) -> SheetShape {
        SheetShape::new(self.num_displayed_rows(), self.num_columns())
    }

    /// Column at a display position; the `-1` index column has no data
    pub fn column(&self, column_index: isize) -> Option<&ColumnData> {
        usize::try_from(column_index)
            .ok()
            .and_then(|index| self.columns.get(index))
    }

    pub fn column_id(&self, column_index: isize) -> Option<&ColumnId> {
        self.column(column_index).map(|column| &column.column_id)
    }

    /// Display position of a column id
    pub fn column_index(&self, column_id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.column_id == column_id)
    }

    pub fn column_ids(&self) -> Vec<ColumnId> {
        self.columns.iter().map(|c| c.column_id.clone()).collect()
    }

    pub fn cell_value(&self, row_index: isize, column_index: isize) -> Option<&CellValue> {
        let row = usize::try_from(row_index).ok()?;
        self.column(column_index)?.values.get(row)
    }

    /// Text the cell editor opens with for a cell.
    ///
    /// Header cells edit the header; data cells edit the column formula when
    /// the column has one, otherwise the displayed value.
    pub fn starting_formula(&self, row_index: isize, column_index: isize) -> String {
        let Some(column) = self.column(column_index) else {
            return String::new();
        };
        if row_index == -1 {
            return column.column_header.clone();
        }
        if !column.column_formula.is_empty() {
            return column.column_formula.clone();
        }
        self.cell_value(row_index, column_index)
            .map(CellValue::display_text)
            .unwrap_or_default()
    }
}

/// Ordered column ids of every sheet, in sheet order
pub fn column_ids_array(sheets: &[SheetData]) -> Vec<Vec<ColumnId>> {
    sheets.iter().map(SheetData::column_ids).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_sheet() -> SheetData {
        SheetData::new("df1", 3)
            .with_column(ColumnData::new("A", "A").with_values(vec![
                CellValue::Number(1.0),
                CellValue::Number(2.0),
                CellValue::Number(3.0),
            ]))
            .with_column(
                ColumnData::new("B", "B")
                    .with_formula("=A + 1")
                    .with_values(vec![
                        CellValue::Number(2.0),
                        CellValue::Number(3.0),
                        CellValue::Number(4.0),
                    ]),
            )
    }

    #[test]
    fn test_column_lookup() {
        let sheet = sample_sheet();
        assert_eq!(sheet.num_columns(), 2);
        assert_eq!(sheet.column_id(1), Some(&ColumnId::from("B")));
        assert_eq!(sheet.column_id(-1), None);
        assert_eq!(sheet.column_id(2), None);
        assert_eq!(sheet.column_index(&ColumnId::from("B")), Some(1));
    }

    #[test]
    fn test_cell_value() {
        let sheet = sample_sheet();
        assert_eq!(sheet.cell_value(2, 0), Some(&CellValue::Number(3.0)));
        assert_eq!(sheet.cell_value(3, 0), None);
        assert_eq!(sheet.cell_value(-1, 0), None);
    }

    #[test]
    fn test_starting_formula() {
        let sheet = sample_sheet();
        assert_eq!(sheet.starting_formula(0, 0), "1");
        assert_eq!(sheet.starting_formula(0, 1), "=A + 1");
        assert_eq!(sheet.starting_formula(-1, 1), "B");
        assert_eq!(sheet.starting_formula(0, -1), "");
    }

    #[test]
    fn test_shape_caps_rows() {
        let sheet = SheetData::new("big", 1_000_000).with_column(ColumnData::new("A", "A"));
        assert_eq!(sheet.shape(), SheetShape::new(MAX_ROWS, 1));
        assert!(!sheet.shape().is_empty());
        assert!(SheetShape::new(5, 0).is_empty());
    }

    #[test]
    fn test_column_ids_array() {
        let ids = column_ids_array(&[sample_sheet(), SheetData::new("empty", 0)]);
        assert_eq!(ids, vec![vec![ColumnId::from("A"), ColumnId::from("B")], vec![]]);
    }

    #[test]
    fn test_deserialize_from_kernel_json() {
        let json = r#"{
            "dfName": "df1",
            "dfSource": "Pivoted",
            "numRows": 1,
            "columns": [{"columnId": "x", "columnHeader": "x", "values": [{"type": "Text", "value": "hi"}]}]
        }"#;
        let sheet: SheetData = serde_json::from_str(json).unwrap();
        assert_eq!(sheet.df_source, SheetSource::Pivoted);
        assert_eq!(sheet.columns[0].column_formula, "");
        assert_eq!(sheet.starting_formula(0, 0), "hi");
    }
}
