//! Reference syntax layer: a tolerant parser for the subset of C# the analysis
//! needs, plus the [`Document`] type that owns a file's text, tokens and tree.

pub mod document;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod span;
pub mod tree;

pub use document::{Document, EditError};
pub use lexer::{Keyword, Token, TokenKind};
pub use span::{LineIndex, Span};

use thiserror::Error;

/// A file could not be tokenized or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    /// Byte offset where the problem was detected.
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}
