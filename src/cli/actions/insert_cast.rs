//! InsertFormattableCast action.
//!
//! Wraps every flagged argument in `(FormattableString)`. Used by the
//! `fmtguard fix` command and the `fix_findings` MCP tool.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::warn;

use super::operation::{Operation, changed_lines};
use super::traits::Action;
use crate::analysis::CancellationToken;
use crate::core::CheckContext;
use crate::fix::apply_all;
use crate::issues::FormattableStringIssue;

/// Action to insert `(FormattableString)` casts.
///
/// Every file with at least one issue is fixed as a whole, one fix at a time,
/// each on the document produced by the previous one.
pub struct InsertFormattableCast;

impl Action<FormattableStringIssue> for InsertFormattableCast {
    fn to_operations(
        ctx: &CheckContext,
        issues: &[FormattableStringIssue],
    ) -> Result<Vec<Operation>> {
        let paths: BTreeSet<&str> = issues.iter().map(|i| i.context.file_path()).collect();
        let documents = ctx.documents();
        let index = ctx.index();
        let cancel = CancellationToken::new();

        let results: Vec<Result<Option<Operation>>> = paths
            .par_iter()
            .map(|path| {
                let Some(document) = documents.get(*path) else {
                    warn!(file = path, "no parsed document for issue, skipped");
                    return Ok(None);
                };
                let outcome = apply_all(document, index, &cancel)
                    .with_context(|| format!("Failed to fix {}", path))?;
                if !outcome.is_modified() {
                    return Ok(None);
                }
                let contents = outcome.document.text().to_string();
                Ok(Some(Operation::RewriteFile {
                    file_path: path.to_string(),
                    changed_lines: changed_lines(document.text(), &contents),
                    contents,
                    fixes: outcome.applied,
                }))
            })
            .collect();

        results.into_iter().filter_map(Result::transpose).collect()
    }
}
