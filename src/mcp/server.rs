use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    analysis::CancellationToken,
    cli::{
        actions::{Action, InsertFormattableCast, execute_operations},
        args::CommonArgs,
    },
    config::load_config,
    core::CheckContext,
    issues::FormattableStringIssue,
};

use super::types::{
    ConfigDto, ConfigValues, FileFixItem, FindingItem, FindingsScanResult, FixFindingsParams,
    FixFindingsResult, GetConfigParams, Pagination, ScanFindingsParams,
};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

#[derive(Clone)]
pub struct FmtguardMcpServer {
    tool_router: ToolRouter<Self>,
}

impl Default for FmtguardMcpServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl FmtguardMcpServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }

    /// List interpolated strings passed to `object` parameters
    #[tool(
        description = "Scan C# files for interpolated strings ($\"...\") passed to object parameters, where they lose their FormattableString form. Returns paginated list of findings."
    )]
    pub async fn scan_findings(
        &self,
        params: Parameters<ScanFindingsParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = params
            .0
            .limit
            .map(|v| v as usize)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        let offset = params.0.offset.map(|v| v as usize).unwrap_or(0);

        let ctx = context(&params.0.project_root_path)?;
        let findings = findings(&ctx)?;

        let total_count = findings.len();
        let total_file_count = findings
            .iter()
            .map(|f| f.context.file_path())
            .collect::<HashSet<_>>()
            .len();

        let items: Vec<FindingItem> = findings
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(FindingItem::from)
            .collect();
        let has_more = offset + items.len() < total_count;

        to_json_result(&FindingsScanResult {
            total_count,
            total_file_count,
            parse_error_count: ctx.parse_errors().len(),
            items,
            pagination: Pagination {
                offset,
                limit,
                has_more,
            },
        })
    }

    /// Insert `(FormattableString)` casts
    #[tool(
        description = "Insert (FormattableString) casts for every finding. Set apply to true to rewrite files; otherwise returns the lines that would change."
    )]
    pub async fn fix_findings(
        &self,
        params: Parameters<FixFindingsParams>,
    ) -> Result<CallToolResult, McpError> {
        let apply = params.0.apply;
        let ctx = context(&params.0.project_root_path)?;
        let findings = findings(&ctx)?;

        let ops = InsertFormattableCast::to_operations(&ctx, &findings)
            .map_err(|e| McpError::internal_error(format!("Fix failed: {}", e), None))?;
        if apply {
            let stats = execute_operations(&ops)
                .map_err(|e| McpError::internal_error(format!("Write failed: {}", e), None))?;
            debug!(files = stats.files_modified, "fixes written");
        }

        to_json_result(&FixFindingsResult {
            applied: apply,
            total_fixes: ops.iter().map(|op| op.fixes()).sum(),
            files: ops.iter().map(FileFixItem::from).collect(),
        })
    }

    /// Get the current fmtguard configuration
    #[tool(description = "Get the current fmtguard configuration.")]
    pub async fn get_config(
        &self,
        params: Parameters<GetConfigParams>,
    ) -> Result<CallToolResult, McpError> {
        let path = Path::new(&params.0.project_root_path);

        let result = load_config(path)
            .map_err(|e| McpError::internal_error(format!("Failed to load config: {}", e), None))?;

        to_json_result(&ConfigDto {
            from_file: result.from_file,
            config: ConfigValues::from(result.config),
        })
    }
}

fn context(project_root_path: &str) -> Result<CheckContext, McpError> {
    let args = CommonArgs {
        source_root: Some(PathBuf::from(project_root_path)),
        verbose: false,
    };
    CheckContext::new(&args)
        .map_err(|e| McpError::internal_error(format!("Failed to initialize: {}", e), None))
}

fn findings(ctx: &CheckContext) -> Result<Vec<FormattableStringIssue>, McpError> {
    ctx.findings(&CancellationToken::new())
        .map_err(|e| McpError::internal_error(format!("Scan failed: {}", e), None))
}

fn to_json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json_str = serde_json::to_string_pretty(value).map_err(|e| {
        McpError::internal_error(format!("JSON serialization failed: {}", e), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(json_str)]))
}

#[tool_handler]
impl ServerHandler for FmtguardMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "fmtguard MCP helps AI agents keep interpolated strings as FormattableString in C# projects.\n\n\
                 An interpolated string ($\"...\") passed to an object parameter is formatted to a plain\n\
                 string on the spot, so the callee never sees the raw values. Casting the argument to\n\
                 FormattableString keeps them.\n\n\
                 Available tools:\n\
                 1. get_config - Get project configuration\n\
                 2. scan_findings - List affected arguments (paginated)\n\
                 3. fix_findings - Insert (FormattableString) casts (dry run unless apply is true)\n\n\
                 Recommended Workflow:\n\
                 1. Use scan_findings to see what is affected\n\
                 2. Run fix_findings without apply to review the changed lines\n\
                 3. Run fix_findings with apply to rewrite the files"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Entry point for MCP server
pub fn run_server() -> Result<()> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let service = FmtguardMcpServer::new();
            let server = service.serve(rmcp::transport::stdio()).await?;
            server.waiting().await?;
            Ok(())
        })
}
