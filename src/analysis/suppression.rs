//! Token heuristic for arguments that already mention `FormattableString`.
//!
//! Any identifier token spelled exactly `FormattableString` inside the
//! argument suppresses the finding, wherever it appears: a cast, an `as`, a
//! call inside a hole, even the argument name.

use crate::syntax::tree::Argument;
use crate::syntax::{Document, TokenKind};

pub const SUPPRESSING_IDENTIFIER: &str = "FormattableString";

pub fn is_suppressed(document: &Document, arg: &Argument) -> bool {
    document
        .tokens_in(arg.span)
        .iter()
        .any(|token| matches!(&token.kind, TokenKind::Identifier(text) if text == SUPPRESSING_IDENTIFIER))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suppressed(arg_text: &str) -> bool {
        let text = format!("class C {{ void M() {{ Foo({arg_text}); }} }}");
        let doc = Document::parse("C.cs", text.as_str()).unwrap();
        let offset = text.find(arg_text).unwrap();
        let arg = doc.find_argument(offset).unwrap();
        is_suppressed(&doc, arg)
    }

    #[test]
    fn test_identifier_in_hole_suppresses() {
        assert!(suppressed("$\"{typeof(FormattableString)}\""));
        assert!(suppressed("$\"{FormattableString.Invariant($\"x\")}\""));
    }

    #[test]
    fn test_argument_name_suppresses() {
        assert!(suppressed("FormattableString: $\"a{1}\""));
    }

    #[test]
    fn test_text_and_other_spellings_do_not_suppress() {
        assert!(!suppressed("$\"FormattableString {1}\""));
        assert!(!suppressed("$\"{formattableString}\""));
        assert!(!suppressed("$\"{FormattableStrings}\""));
        assert!(!suppressed("$\"{@FormattableString}\""));
        assert!(!suppressed("$\"{System.IFormattable.Empty}\""));
    }
}
