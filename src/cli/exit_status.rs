use std::process::ExitCode;

/// Exit status for CLI commands, following common conventions for linter tools.
///
/// - `Success` (0): nothing left to report
/// - `Failure` (1): findings reported (or, in a dry run, fixes pending)
/// - `Error` (2): internal error, or files that could not be parsed
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl ExitStatus {
    /// Status of a run that left `findings` unresolved and skipped
    /// `parse_errors` unparsable files. Findings take precedence.
    pub fn from_counts(findings: usize, parse_errors: usize) -> Self {
        if findings > 0 {
            ExitStatus::Failure
        } else if parse_errors > 0 {
            ExitStatus::Error
        } else {
            ExitStatus::Success
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_values() {
        assert_eq!(ExitCode::from(ExitStatus::Success), ExitCode::from(0));
        assert_eq!(ExitCode::from(ExitStatus::Failure), ExitCode::from(1));
        assert_eq!(ExitCode::from(ExitStatus::Error), ExitCode::from(2));
    }

    #[test]
    fn status_from_counts() {
        assert_eq!(ExitStatus::from_counts(0, 0), ExitStatus::Success);
        assert_eq!(ExitStatus::from_counts(3, 0), ExitStatus::Failure);
        assert_eq!(ExitStatus::from_counts(3, 1), ExitStatus::Failure);
        assert_eq!(ExitStatus::from_counts(0, 1), ExitStatus::Error);
    }
}
