//! A parsed source file: text, tokens, syntax tree and line index together.

use thiserror::Error;

use super::SyntaxError;
use super::lexer::{Token, lex};
use super::parser::parse;
use super::render::render_argument;
use super::span::{LineIndex, Span};
use super::tree::{Argument, SourceUnit, Visit, walk_argument};
use crate::source::{SourceContext, SourceLocation};

/// A node replacement could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("node at {span} does not belong to this document")]
    StaleNode { span: Span },
    #[error("edited document no longer parses: {0}")]
    Reparse(#[source] SyntaxError),
}

/// Immutable snapshot of one file. Edits produce a new document.
#[derive(Debug, Clone)]
pub struct Document {
    path: String,
    text: String,
    tokens: Vec<Token>,
    unit: SourceUnit,
    line_index: LineIndex,
}

impl Document {
    pub fn parse(path: impl Into<String>, text: impl Into<String>) -> Result<Self, SyntaxError> {
        let text = text.into();
        let tokens = lex(&text)?;
        let unit = parse(&text, &tokens)?;
        let line_index = LineIndex::new(&text);
        Ok(Self {
            path: path.into(),
            text,
            tokens,
            unit,
            line_index,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn unit(&self) -> &SourceUnit {
        &self.unit
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Tokens lying within `span`, in order.
    pub fn tokens_in(&self, span: Span) -> &[Token] {
        let first = self.tokens.partition_point(|t| t.span.start < span.start);
        let last = self.tokens.partition_point(|t| t.span.start < span.end);
        &self.tokens[first..last.max(first)]
    }

    pub fn slice(&self, span: Span) -> &str {
        &self.text[span.start..span.end]
    }

    /// 1-based `(line, col)` of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        self.line_index.line_col(&self.text, offset)
    }

    pub fn location(&self, offset: usize) -> SourceLocation {
        let (line, col) = self.line_col(offset);
        SourceLocation::new(self.path.clone(), line, col)
    }

    /// Location of `offset` plus the text of its line, for reporting.
    pub fn source_context(&self, offset: usize) -> SourceContext {
        let location = self.location(offset);
        let source_line = self.line_index.line_text(&self.text, location.line);
        SourceContext::new(location, source_line)
    }

    /// Innermost argument in any method body whose span starts at `offset`.
    pub fn find_argument(&self, offset: usize) -> Option<&Argument> {
        let mut finder = ArgumentFinder {
            offset,
            found: None,
        };
        for body in self.unit.method_bodies() {
            finder.visit_method(body.method);
        }
        finder.found
    }

    /// Replace `old`, an argument of this document, with `new` and re-parse.
    ///
    /// `new` must have been derived from `old`: its spans still point into this
    /// document's text.
    pub fn replace_node(&self, old: &Argument, new: &Argument) -> Result<Document, EditError> {
        let stale = || EditError::StaleNode { span: old.span };
        if old.span.end > self.text.len() {
            return Err(stale());
        }
        match self.find_argument(old.span.start) {
            Some(current) if current == old => {}
            _ => return Err(stale()),
        }

        let replacement = render_argument(new, &self.text);
        let mut text = String::with_capacity(self.text.len() + replacement.len());
        text.push_str(&self.text[..old.span.start]);
        text.push_str(&replacement);
        text.push_str(&self.text[old.span.end..]);

        Document::parse(self.path.clone(), text).map_err(EditError::Reparse)
    }
}

struct ArgumentFinder<'ast> {
    offset: usize,
    found: Option<&'ast Argument>,
}

impl<'ast> Visit<'ast> for ArgumentFinder<'ast> {
    fn visit_argument(&mut self, arg: &'ast Argument) {
        // nested arguments starting at the same offset are shorter
        if arg.span.start == self.offset
            && self.found.is_none_or(|found| arg.span.len() < found.span.len())
        {
            self.found = Some(arg);
        }
        walk_argument(self, arg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PROGRAM: &str = r#"using System;

namespace ConsoleApplication1
{
    class TypeName
    {
        public void Foo(object obj) { }

        public void Bar()
        {
            Foo($"abc{1}");
        }
    }
}
"#;

    fn offset_of(text: &str, needle: &str) -> usize {
        text.find(needle).unwrap()
    }

    #[test]
    fn test_source_context_points_at_line() {
        let doc = Document::parse("Program.cs", PROGRAM).unwrap();
        let offset = offset_of(PROGRAM, "$\"abc");
        let ctx = doc.source_context(offset);
        assert_eq!(ctx.line(), 11);
        assert_eq!(ctx.col(), 17);
        assert_eq!(ctx.source_line, "            Foo($\"abc{1}\");");
    }

    #[test]
    fn test_tokens_in_span() {
        let doc = Document::parse("Program.cs", PROGRAM).unwrap();
        let start = offset_of(PROGRAM, "$\"abc");
        let arg = doc.find_argument(start).unwrap();
        let texts: Vec<&str> = doc
            .tokens_in(arg.span)
            .iter()
            .map(|t| doc.slice(t.span))
            .collect();
        assert_eq!(texts, vec!["$\"", "abc", "{", "1", "}", "\""]);
    }

    #[test]
    fn test_find_argument_prefers_innermost() {
        let text = "class C { void M() { Foo(Bar(x), y); } }";
        let doc = Document::parse("C.cs", text).unwrap();
        let offset = offset_of(text, "Bar(x)");
        assert_eq!(doc.slice(doc.find_argument(offset).unwrap().span), "Bar(x)");
        let inner = offset_of(text, "x)");
        assert_eq!(doc.slice(doc.find_argument(inner).unwrap().span), "x");
        assert!(doc.find_argument(offset_of(text, "Foo")).is_none());
    }

    #[test]
    fn test_replace_node_splices_and_reparses() {
        let doc = Document::parse("Program.cs", PROGRAM).unwrap();
        let offset = offset_of(PROGRAM, "$\"abc");
        let old = doc.find_argument(offset).unwrap().clone();
        let mut new = old.clone();
        new.name = None;
        let edited = doc.replace_node(&old, &new).unwrap();
        assert_eq!(edited.text(), PROGRAM);
        assert_eq!(edited.path(), "Program.cs");
    }

    #[test]
    fn test_replace_node_rejects_foreign_node() {
        let doc = Document::parse("Program.cs", PROGRAM).unwrap();
        let other = Document::parse("Other.cs", "class C { void M() { Foo(1); } }").unwrap();
        let offset = offset_of(other.text(), "1)");
        let foreign = other.find_argument(offset).unwrap().clone();
        assert_eq!(
            doc.replace_node(&foreign, &foreign).unwrap_err(),
            EditError::StaleNode { span: foreign.span }
        );
    }

    #[test]
    fn test_parse_failure_is_syntax_error() {
        let err = Document::parse("Bad.cs", "class C { void M() { Foo($\"x); } }").unwrap_err();
        assert!(err.message.contains("unterminated"));
    }
}
