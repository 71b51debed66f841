//! Check command - Report interpolated strings passed as `object`.

use anyhow::Result;

use super::super::{args::CheckCommand, exit_status::ExitStatus, report};
use crate::{analysis::CancellationToken, core::CheckContext, issues::Issue};

pub fn check(cmd: CheckCommand) -> Result<ExitStatus> {
    let args = &cmd.args;
    let ctx = CheckContext::new(&args.common)?;

    let findings = ctx.findings(&CancellationToken::new())?;
    let finding_count = findings.len();
    let parse_errors = ctx.parse_errors();

    let mut issues: Vec<Issue> = findings.into_iter().map(Issue::FormattableString).collect();
    issues.extend(parse_errors.iter().cloned().map(Issue::ParseError));

    if issues.is_empty() {
        report::print_success(ctx.source_files_checked());
    } else {
        report::report(&issues);
        report::print_parse_warning(parse_errors.len(), args.common.verbose);
    }

    Ok(ExitStatus::from_counts(finding_count, parse_errors.len()))
}
