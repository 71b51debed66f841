//! Source text for rewritten nodes.
//!
//! A rewritten node keeps the spans of every node it was built from, so its
//! text is the original source slice plus the text of each synthetic node
//! spliced in front of the operand it wraps. Formatting and comments inside
//! the node survive unchanged.

use super::span::Span;
use super::tree::{Argument, CastExpr, Expr, Origin, Visit, walk_cast, walk_expr};

/// Text of `arg` for the document `source` its spans point into.
pub fn render_argument(arg: &Argument, source: &str) -> String {
    let mut casts = SyntheticCasts::default();
    casts.visit_argument(arg);

    let span = arg.span;
    let mut insertions = casts.insertions;
    insertions.sort_by_key(|(offset, _)| *offset);

    let mut out = String::with_capacity(span.len() + insertions.len() * 24);
    let mut cursor = span.start;
    for (offset, text) in insertions {
        if offset < cursor || offset > span.end {
            continue;
        }
        out.push_str(&source[cursor..offset]);
        out.push_str(&text);
        cursor = offset;
    }
    out.push_str(&source[cursor..span.end]);
    out
}

#[derive(Default)]
struct SyntheticCasts {
    insertions: Vec<(usize, String)>,
    /// Synthetic casts used as the target of `.x`, `[i]` or `(...)`. A cast
    /// binds looser than those, so these get their own parentheses.
    receivers: Vec<Span>,
}

impl<'ast> Visit<'ast> for SyntheticCasts {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        let target = match expr {
            Expr::Member(member) => Some(member.target.as_ref()),
            Expr::Index(access) => Some(access.target.as_ref()),
            Expr::Call(call) => Some(call.callee.as_ref()),
            _ => None,
        };
        if let Some(Expr::Cast(cast)) = target
            && cast.origin == Origin::Synthetic
        {
            self.receivers.push(cast.span);
        }
        walk_expr(self, expr);
    }

    fn visit_cast(&mut self, cast: &'ast CastExpr) {
        if cast.origin == Origin::Synthetic {
            let operand = cast.operand.span();
            if self.receivers.contains(&cast.span) {
                self.insertions
                    .push((operand.start, format!("(({})", cast.ty)));
                self.insertions.push((operand.end, ")".to_string()));
            } else {
                self.insertions
                    .push((operand.start, format!("({})", cast.ty)));
            }
        }
        walk_cast(self, cast);
    }
}
