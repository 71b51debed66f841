use fmtguard::mcp::{FmtguardMcpServer, types::FixFindingsParams};
use rmcp::handler::server::wrapper::Parameters;

use crate::{McpTestFixture, SERVICE, extract_tool_result_json};

// ============================================================================
// fix_findings tests
// ============================================================================

#[tokio::test]
async fn test_fix_findings_dry_run() {
    let fixture = McpTestFixture::with_files(&[("Service.cs", SERVICE)]).unwrap();
    let server = FmtguardMcpServer::new();

    let params = Parameters(FixFindingsParams {
        project_root_path: fixture.root(),
        apply: false,
    });

    let result = server.fix_findings(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["applied"], false);
    assert_eq!(json_result["totalFixes"], 2);

    let files = json_result["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["fixes"], 2);

    let changed = files[0]["changedLines"].as_array().unwrap();
    assert_eq!(changed.len(), 2);
    assert_eq!(changed[0]["line"], 5);
    assert_eq!(changed[0]["before"], "        Log(\"user {0}\", $\"id {id}\");");
    assert_eq!(
        changed[0]["after"],
        "        Log(\"user {0}\", (FormattableString)$\"id {id}\");"
    );
    assert_eq!(
        changed[1]["after"],
        "        Audit(entry: (FormattableString)$\"visited {id}\");"
    );

    // Nothing written
    assert_eq!(fixture.read_file("Service.cs").unwrap(), SERVICE);
}

#[tokio::test]
async fn test_fix_findings_apply() {
    let fixture = McpTestFixture::with_files(&[("Service.cs", SERVICE)]).unwrap();
    let server = FmtguardMcpServer::new();

    let params = Parameters(FixFindingsParams {
        project_root_path: fixture.root(),
        apply: true,
    });

    let result = server.fix_findings(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["applied"], true);
    assert_eq!(json_result["totalFixes"], 2);

    let content = fixture.read_file("Service.cs").unwrap();
    assert!(content.contains("Log(\"user {0}\", (FormattableString)$\"id {id}\");"));
    assert!(content.contains("Audit(entry: (FormattableString)$\"visited {id}\");"));

    // Second run finds nothing left to fix
    let params = Parameters(FixFindingsParams {
        project_root_path: fixture.root(),
        apply: true,
    });
    let result = server.fix_findings(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);
    assert_eq!(json_result["totalFixes"], 0);
    assert!(json_result["files"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_fix_findings_respects_ignores() {
    let fixture = McpTestFixture::with_files(&[("Generated/Service.cs", SERVICE)]).unwrap();
    fixture
        .write_config(&serde_json::json!({ "ignores": ["**/Generated/**"] }))
        .unwrap();
    let server = FmtguardMcpServer::new();

    let params = Parameters(FixFindingsParams {
        project_root_path: fixture.root(),
        apply: true,
    });

    let result = server.fix_findings(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["totalFixes"], 0);
    assert_eq!(
        fixture.read_file("Generated/Service.cs").unwrap(),
        SERVICE
    );
}
