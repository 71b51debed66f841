//! Fix command - Insert `(FormattableString)` casts for reported arguments.
//!
//! Every interpolated string inside a reported argument is cast, so the
//! callee receives a `FormattableString` instead of an already formatted
//! `string`.
//!
//! Use `--apply` to actually rewrite files (default is dry-run mode).

use anyhow::Result;

use super::super::{
    actions::{Action, ActionStats, InsertFormattableCast},
    args::FixCommand,
    exit_status::ExitStatus,
    report,
};
use crate::{analysis::CancellationToken, core::CheckContext};

pub fn fix(cmd: FixCommand) -> Result<ExitStatus> {
    let args = &cmd.args;
    let ctx = CheckContext::new(&args.common)?;
    let apply = args.apply;

    let findings = ctx.findings(&CancellationToken::new())?;
    let parse_error_count = ctx.parse_errors().len();

    if findings.is_empty() {
        report::print_success(ctx.source_files_checked());
    } else if apply {
        let stats = InsertFormattableCast::run(&ctx, &findings)?;
        report::print_fix_summary(&stats, true);
    } else {
        let ops = InsertFormattableCast::preview(&ctx, &findings)?;
        let changes_applied: usize = ops.iter().map(|op| op.fixes()).sum();
        let stats = ActionStats {
            processed: findings.len(),
            skipped: findings.len().saturating_sub(changes_applied),
            changes_applied,
            files_modified: ops.len(),
        };
        report::print_fix_summary(&stats, false);
    }

    report::print_parse_warning(parse_error_count, args.common.verbose);

    // A dry run that finds work to do exits with Failure
    let pending = if apply { 0 } else { findings.len() };
    Ok(ExitStatus::from_counts(pending, parse_error_count))
}
