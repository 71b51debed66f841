//! Rewrite that re-targets a flagged argument to `FormattableString`.
//!
//! Every interpolated string inside the argument, at any depth, is wrapped in
//! a synthetic `(FormattableString)` cast. The document is then rebuilt around
//! the new argument, so a fix is always a whole-document replacement.

pub mod workspace;

use thiserror::Error;
use tracing::debug;

use crate::analysis::{AnalysisError, CancellationToken};
use crate::issues::FormattableStringIssue;
use crate::syntax::tree::{
    Argument, CastExpr, Expr, LiteralExpr, LiteralKind, Origin, TypeRef, VisitMut, walk_mut_expr,
};
use crate::syntax::{Document, EditError};

pub use workspace::{FixOutcome, apply_all};

pub const FIX_TITLE: &str = "Add explicit cast to preserve FormattableString";

const CAST_TARGET: &str = "FormattableString";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    #[error("fix was cancelled")]
    Cancelled,
    #[error("no argument starts at byte {offset}")]
    ArgumentNotFound { offset: usize },
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl From<AnalysisError> for FixError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Cancelled => FixError::Cancelled,
        }
    }
}

/// New document with the argument of `finding` cast to `FormattableString`.
///
/// `document` is left untouched. Cancellation is honoured right before the
/// edit is committed.
pub fn compute_fix(
    document: &Document,
    finding: &FormattableStringIssue,
    cancel: &CancellationToken,
) -> Result<Document, FixError> {
    let offset = finding.span.start;
    let old = document
        .find_argument(offset)
        .ok_or(FixError::ArgumentNotFound { offset })?;

    let new = wrap_interpolations(old);

    if cancel.is_cancelled() {
        return Err(FixError::Cancelled);
    }
    let fixed = document.replace_node(old, &new)?;
    debug!(file = document.path(), at = %old.span, "cast inserted");
    Ok(fixed)
}

/// Copy of `arg` with each interpolated string wrapped in a synthetic cast.
pub fn wrap_interpolations(arg: &Argument) -> Argument {
    let mut new = arg.clone();
    InterpolationWrapper.visit_mut_argument(&mut new);
    new
}

struct InterpolationWrapper;

impl VisitMut for InterpolationWrapper {
    fn visit_mut_expr(&mut self, expr: &mut Expr) {
        walk_mut_expr(self, expr);
        if !expr.is_interpolated() {
            return;
        }
        let span = expr.span();
        let placeholder = Expr::Literal(LiteralExpr {
            kind: LiteralKind::Null,
            span,
        });
        let operand = std::mem::replace(expr, placeholder);
        *expr = Expr::Cast(CastExpr {
            ty: TypeRef {
                name: CAST_TARGET.to_string(),
                type_args: Vec::new(),
                array_rank: 0,
                nullable: false,
                span,
            },
            operand: Box::new(operand),
            origin: Origin::Synthetic,
            span,
        });
    }
}
