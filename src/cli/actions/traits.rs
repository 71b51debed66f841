//! Action trait definition.

use std::collections::HashSet;

use anyhow::Result;

use super::operation::Operation;
use crate::core::CheckContext;

/// Statistics from running an action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStats {
    /// Number of issues processed.
    pub processed: usize,
    /// Number of issues that produced no change.
    pub skipped: usize,
    /// Number of changes actually applied to files.
    pub changes_applied: usize,
    /// Number of files modified.
    pub files_modified: usize,
}

impl std::ops::AddAssign for ActionStats {
    fn add_assign(&mut self, other: Self) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.changes_applied += other.changes_applied;
        self.files_modified += other.files_modified;
    }
}

/// Converts issues into operations and executes them.
///
/// ```ignore
/// if apply {
///     InsertFormattableCast::run(&ctx, &issues)?;
/// } else {
///     InsertFormattableCast::preview(&ctx, &issues)?;
/// }
/// ```
pub trait Action<I> {
    /// Convert issues to file operations.
    ///
    /// This is the only method that must be implemented.
    fn to_operations(ctx: &CheckContext, issues: &[I]) -> Result<Vec<Operation>>;

    /// Execute the action (modify files).
    fn run(ctx: &CheckContext, issues: &[I]) -> Result<ActionStats> {
        let ops = Self::to_operations(ctx, issues)?;
        let mut stats = execute_operations(&ops)?;
        stats.processed = issues.len();
        stats.skipped = issues.len().saturating_sub(stats.changes_applied);
        Ok(stats)
    }

    /// Preview the action (dry-run mode).
    fn preview(ctx: &CheckContext, issues: &[I]) -> Result<Vec<Operation>> {
        let ops = Self::to_operations(ctx, issues)?;
        for op in &ops {
            op.preview();
        }
        Ok(ops)
    }
}

pub(crate) fn execute_operations(ops: &[Operation]) -> Result<ActionStats> {
    let mut files_modified: HashSet<&str> = HashSet::new();
    let mut changes_applied = 0;

    for op in ops {
        op.execute()?;
        changes_applied += op.fixes();
        files_modified.insert(op.file_path());
    }

    Ok(ActionStats {
        processed: ops.len(),
        skipped: 0,
        changes_applied,
        files_modified: files_modified.len(),
    })
}
