//! Span-based edits applied atomically to a unit's source text.
//!
//! Node replacement in a tree-sitter tree is expressed as a text edit over the
//! node's byte range. Edits are collected during traversal and applied once
//! at the end, so a unit that fails halfway leaves its source untouched.
//!
//! | Operation | Span Semantics |
//! |-----------|----------------|
//! | `replace(node, text)` | `node.start..node.end` becomes `text` |
//! | `remove_statement(node)` | node plus trailing whitespace and line break removed |
//! | `insert(position, text)` | zero-width span at `position` |

use std::ops::Range;

use thiserror::Error;
use tree_sitter::Node;

use super::line_end;

/// Error type for edit application.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// Two edits touch the same bytes.
    #[error("Overlapping edits at {first:?} and {second:?}")]
    Overlap {
        first: Range<usize>,
        second: Range<usize>,
    },

    /// An edit span extends beyond the source or splits a character.
    #[error("Edit span {span:?} is invalid for source of length {source_len}")]
    InvalidSpan { span: Range<usize>, source_len: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    span: Range<usize>,
    text: String,
}

/// A batch of non-overlapping edits over one source text.
#[derive(Debug, Default)]
pub struct EditSet {
    edits: Vec<Edit>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the node's text.
    pub fn replace(&mut self, node: Node<'_>, text: impl Into<String>) {
        self.replace_range(node.start_byte()..node.end_byte(), text);
    }

    /// Replace an arbitrary byte range.
    pub fn replace_range(&mut self, span: Range<usize>, text: impl Into<String>) {
        self.edits.push(Edit {
            span,
            text: text.into(),
        });
    }

    /// Insert text at a byte offset.
    pub fn insert(&mut self, position: usize, text: impl Into<String>) {
        self.replace_range(position..position, text);
    }

    /// Remove a statement together with the rest of its line.
    pub fn remove_statement(&mut self, node: Node<'_>, source: &str) {
        let end = line_end(source, node.end_byte());
        self.replace_range(node.start_byte()..end, "");
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply all edits and return the new text.
    ///
    /// Insertions at the same offset keep the order they were added in and
    /// land before any replacement starting there.
    pub fn apply(mut self, source: &str) -> Result<String, EditError> {
        for edit in &self.edits {
            let span = &edit.span;
            if span.start > span.end
                || span.end > source.len()
                || !source.is_char_boundary(span.start)
                || !source.is_char_boundary(span.end)
            {
                return Err(EditError::InvalidSpan {
                    span: span.clone(),
                    source_len: source.len(),
                });
            }
        }

        self.edits.sort_by_key(|e| (e.span.start, e.span.end));
        for pair in self.edits.windows(2) {
            if pair[1].span.start < pair[0].span.end {
                return Err(EditError::Overlap {
                    first: pair[0].span.clone(),
                    second: pair[1].span.clone(),
                });
            }
        }

        let mut output = String::with_capacity(source.len());
        let mut cursor = 0;
        for edit in &self.edits {
            output.push_str(&source[cursor..edit.span.start]);
            output.push_str(&edit.text);
            cursor = edit.span.end;
        }
        output.push_str(&source[cursor..]);
        Ok(output)
    }
}
