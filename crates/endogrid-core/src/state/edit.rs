use serde::{Deserialize, Serialize};

use super::input::{Key, KeyEvent};

/// Characters after which a column reference can be inserted
const REFERENCE_PREFIX_CHARS: &[char] = &[
    '=', '+', '-', '*', '/', '^', '&', '(', ',', '<', '>', ':',
];

/// Text selection inside the formula, in character offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextSelection {
    pub start: usize,
    pub end: usize,
}

impl TextSelection {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    /// Collapsed selection at `position`
    pub fn caret(position: usize) -> Self {
        Self::new(position, position)
    }

    fn clamped(&self, len: usize) -> Self {
        Self::new(self.start.min(len), self.end.min(len))
    }
}

/// A column reference inserted by clicking, still open to replacement.
///
/// `selection_start..selection_end` is the character span holding the
/// inserted headers. Clicking another column overwrites that span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingColumnReference {
    pub column_headers: Vec<String>,
    pub selection_start: usize,
    pub selection_end: usize,
    /// Column a shift-click extends from
    pub anchor_column_index: isize,
    /// Most recently referenced column
    pub column_index: isize,
}

/// What a key press means to an open editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKeyOutcome {
    Commit,
    Cancel,
    /// Move the pending column reference by this many columns
    MovePendingReference(isize),
    /// Move the grid selection by this many rows
    MoveSelection(isize),
    /// The key belongs to the text box
    Unhandled,
}

/// An open cell editor.
///
/// A `row_index` of `-1` edits the column header instead of a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub row_index: isize,
    pub column_index: isize,
    pub formula: String,
    /// When set, arrow keys act on the grid rather than the text cursor
    pub arrow_keys_scroll_in_formula: bool,
    pub text_selection: TextSelection,
    pub pending_column_reference: Option<PendingColumnReference>,
}

impl EditorState {
    /// Open an editor with the cursor at the end of `formula`
    pub fn open(row_index: isize, column_index: isize, formula: impl Into<String>) -> Self {
        let formula = formula.into();
        let end = formula.chars().count();
        Self {
            row_index,
            column_index,
            arrow_keys_scroll_in_formula: !formula.is_empty(),
            formula,
            text_selection: TextSelection::caret(end),
            pending_column_reference: None,
        }
    }

    pub fn is_header_edit(&self) -> bool {
        self.row_index == -1
    }

    pub fn is_editing_cell(&self, row_index: isize, column_index: isize) -> bool {
        self.row_index == row_index && self.column_index == column_index
    }

    /// Replace the text after the user typed; any pending reference becomes permanent
    pub fn with_input(&self, formula: impl Into<String>, text_selection: TextSelection) -> Self {
        let formula = formula.into();
        let text_selection = text_selection.clamped(formula.chars().count());
        Self {
            formula,
            text_selection,
            pending_column_reference: None,
            ..self.clone()
        }
    }

    pub fn with_text_selection(&self, text_selection: TextSelection) -> Self {
        Self {
            text_selection: text_selection.clamped(self.formula.chars().count()),
            ..self.clone()
        }
    }

    /// The same editor on a column that moved to `column_index`
    pub fn with_column_index(&self, column_index: isize) -> Self {
        Self {
            column_index,
            ..self.clone()
        }
    }

    /// Check if clicking a column should insert a reference rather than commit
    pub fn accepts_column_reference(&self) -> bool {
        if self.pending_column_reference.is_some() {
            return true;
        }
        if self.is_header_edit() || !self.formula.starts_with('=') {
            return false;
        }
        let before: String = self.formula.chars().take(self.text_selection.start).collect();
        match before.chars().last() {
            None => true,
            Some(c) => c.is_whitespace() || REFERENCE_PREFIX_CHARS.contains(&c),
        }
    }

    /// Insert column headers at the pending span, or at the text selection
    /// when there is no pending reference yet.
    pub fn insert_column_reference(
        &self,
        anchor_column_index: isize,
        column_index: isize,
        column_headers: Vec<String>,
    ) -> Self {
        let (start, end) = match &self.pending_column_reference {
            Some(pending) => (pending.selection_start, pending.selection_end),
            None => (self.text_selection.start, self.text_selection.end),
        };
        let inserted = column_headers.join(", ");
        let formula = splice_chars(&self.formula, start, end, &inserted);
        let new_end = start + inserted.chars().count();

        Self {
            formula,
            arrow_keys_scroll_in_formula: true,
            text_selection: TextSelection::caret(new_end),
            pending_column_reference: Some(PendingColumnReference {
                column_headers,
                selection_start: start,
                selection_end: new_end,
                anchor_column_index,
                column_index,
            }),
            ..self.clone()
        }
    }

    /// Interpret a key press while this editor is open
    pub fn interpret_key(&self, event: KeyEvent) -> EditorKeyOutcome {
        match event.key {
            Key::Escape => EditorKeyOutcome::Cancel,
            Key::Enter | Key::Tab => EditorKeyOutcome::Commit,
            key if key.is_arrow() => {
                if !self.arrow_keys_scroll_in_formula {
                    return EditorKeyOutcome::Unhandled;
                }
                if self.pending_column_reference.is_none() {
                    return EditorKeyOutcome::Commit;
                }
                match key {
                    Key::ArrowLeft => EditorKeyOutcome::MovePendingReference(-1),
                    Key::ArrowRight => EditorKeyOutcome::MovePendingReference(1),
                    Key::ArrowUp => EditorKeyOutcome::MoveSelection(-1),
                    _ => EditorKeyOutcome::MoveSelection(1),
                }
            }
            _ => EditorKeyOutcome::Unhandled,
        }
    }
}

/// Replace the characters `start..end` of `text` with `insert`
fn splice_chars(text: &str, start: usize, end: usize, insert: &str) -> String {
    let byte_at = |index: usize| {
        text.char_indices()
            .nth(index)
            .map(|(byte, _)| byte)
            .unwrap_or(text.len())
    };
    let start_byte = byte_at(start);
    let end_byte = byte_at(end.max(start));

    let mut result = String::with_capacity(text.len() + insert.len());
    result.push_str(&text[..start_byte]);
    result.push_str(insert);
    result.push_str(&text[end_byte..]);
    result
}
