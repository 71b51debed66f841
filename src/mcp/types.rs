use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cli::actions::{ChangedLine, Operation};
use crate::issues::FormattableStringIssue;

// ============================================================
// Parameters
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GetConfigParams {
    /// Absolute path of the project root
    pub project_root_path: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanFindingsParams {
    /// Absolute path of the project root
    pub project_root_path: String,
    /// Maximum number of items to return (default 20, max 100)
    pub limit: Option<u32>,
    /// Number of items to skip
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FixFindingsParams {
    /// Absolute path of the project root
    pub project_root_path: String,
    /// Rewrite files when true, otherwise only report what would change
    #[serde(default)]
    pub apply: bool,
}

// ============================================================
// Config Types (get_config)
// ============================================================

/// Configuration DTO for MCP
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDto {
    /// True if config was loaded from a file, false if using defaults
    pub from_file: bool,
    pub config: ConfigValues,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValues {
    pub ignores: Vec<String>,
    pub includes: Vec<String>,
    pub ignore_test_files: bool,
}

impl From<crate::config::Config> for ConfigValues {
    fn from(c: crate::config::Config) -> Self {
        Self {
            ignores: c.ignores,
            includes: c.includes,
            ignore_test_files: c.ignore_test_files,
        }
    }
}

// ============================================================
// Findings Types (scan_findings)
// ============================================================

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindingsScanResult {
    pub total_count: usize,
    pub total_file_count: usize,
    /// Files skipped because they could not be parsed
    pub parse_error_count: usize,
    pub items: Vec<FindingItem>,
    pub pagination: Pagination,
}

/// An interpolated string argument converted to `object`
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FindingItem {
    pub file_path: String,
    pub line: usize,
    pub col: usize,
    /// Argument source text, `name:` prefix included
    pub argument: String,
    pub parameter: String,
    /// `Type.Method` of the called method
    pub callee: String,
    pub source_line: String,
}

impl From<FormattableStringIssue> for FindingItem {
    fn from(issue: FormattableStringIssue) -> Self {
        Self {
            file_path: issue.context.location.file_path,
            line: issue.context.location.line,
            col: issue.context.location.col,
            argument: issue.argument,
            parameter: issue.parameter,
            callee: issue.callee,
            source_line: issue.context.source_line,
        }
    }
}

// ============================================================
// Fix Types (fix_findings)
// ============================================================

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FixFindingsResult {
    /// True if files were rewritten
    pub applied: bool,
    pub total_fixes: usize,
    pub files: Vec<FileFixItem>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileFixItem {
    pub file_path: String,
    pub fixes: usize,
    pub changed_lines: Vec<ChangedLineItem>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangedLineItem {
    pub line: usize,
    pub before: String,
    pub after: String,
}

impl From<&ChangedLine> for ChangedLineItem {
    fn from(change: &ChangedLine) -> Self {
        Self {
            line: change.line,
            before: change.before.clone(),
            after: change.after.clone(),
        }
    }
}

impl From<&Operation> for FileFixItem {
    fn from(op: &Operation) -> Self {
        match op {
            Operation::RewriteFile {
                file_path,
                fixes,
                changed_lines,
                ..
            } => Self {
                file_path: file_path.clone(),
                fixes: *fixes,
                changed_lines: changed_lines.iter().map(ChangedLineItem::from).collect(),
            },
        }
    }
}

/// Pagination information
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
    pub has_more: bool,
}
