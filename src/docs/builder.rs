//! Batch-edit operations with a single running insertion cursor
//!
//! Every operation addresses the document by absolute index, so each insert
//! must land exactly where the previous one ended. `DocumentBuilder` owns the
//! cursor; callers can only append.

use serde::Serialize;

/// One request in a document batch update
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentOperation {
    InsertText(InsertText),
    UpdateTextStyle(UpdateTextStyle),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertText {
    pub location: Location,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyle {
    pub range: Range,
    pub text_style: TextStyle,
    pub fields: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: u32,
    pub end_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextStyle {
    pub bold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    Newline,
    Inline,
}

/// Length in document index units (UTF-16 code units)
pub fn index_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

#[derive(Debug)]
pub struct DocumentBuilder {
    start: u32,
    cursor: u32,
    operations: Vec<DocumentOperation>,
}

impl DocumentBuilder {
    pub fn new(start_index: u32) -> Self {
        Self {
            start: start_index,
            cursor: start_index,
            operations: Vec::new(),
        }
    }

    /// Insert `text` at the cursor with an explicit weight.
    ///
    /// The style range covers `text` only, never the trailing newline, and no
    /// style request is emitted for empty text.
    pub fn append_text(&mut self, text: &str, weight: Weight, line_end: LineEnd) {
        let mut content = String::with_capacity(text.len() + 1);
        content.push_str(text);
        if line_end == LineEnd::Newline {
            content.push('\n');
        }
        if content.is_empty() {
            return;
        }

        self.operations.push(DocumentOperation::InsertText(InsertText {
            location: Location { index: self.cursor },
            text: content.clone(),
        }));

        let styled = index_len(text);
        if styled > 0 {
            self.operations
                .push(DocumentOperation::UpdateTextStyle(UpdateTextStyle {
                    range: Range {
                        start_index: self.cursor,
                        end_index: self.cursor + styled,
                    },
                    text_style: TextStyle {
                        bold: weight == Weight::Bold,
                    },
                    fields: "bold".to_string(),
                }));
        }

        self.cursor += index_len(&content);
    }

    /// Bold label followed on the same line by a plain value (blank when absent).
    pub fn append_labeled_field(&mut self, label: &str, value: Option<&str>) {
        self.append_text(label, Weight::Bold, LineEnd::Inline);
        self.append_text(value.unwrap_or_default(), Weight::Normal, LineEnd::Newline);
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn operations(&self) -> &[DocumentOperation] {
        &self.operations
    }

    pub fn finish(self) -> Vec<DocumentOperation> {
        self.operations
    }
}
