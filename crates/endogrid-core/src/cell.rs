use serde::{Deserialize, Serialize};
use std::fmt;

/// A materialized cell value as sent by the kernel
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl CellValue {
    /// Check if the value is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            CellValue::Text(s) => s.parse().ok(),
            CellValue::Empty => None,
        }
    }

    /// Text shown in the grid and used to seed the cell editor
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => if *b { "True" } else { "False" }.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_integral_number() {
        assert_eq!(CellValue::Number(42.0).display_text(), "42");
        assert_eq!(CellValue::Number(-3.0).display_text(), "-3");
    }

    #[test]
    fn test_display_fractional_number() {
        assert_eq!(CellValue::Number(1.5).display_text(), "1.5");
    }

    #[test]
    fn test_display_other_values() {
        assert_eq!(CellValue::Empty.display_text(), "");
        assert_eq!(CellValue::from("abc").display_text(), "abc");
        assert_eq!(CellValue::from(true).to_string(), "True");
    }

    #[test]
    fn test_as_number() {
        assert_eq!(CellValue::from("2.5").as_number(), Some(2.5));
        assert_eq!(CellValue::from(false).as_number(), Some(0.0));
        assert_eq!(CellValue::Empty.as_number(), None);
    }

    #[test]
    fn test_serialization() {
        let value = CellValue::Number(7.0);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"type":"Number","value":7.0}"#);
        let back: CellValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }
}
