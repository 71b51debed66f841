use fmtguard::mcp::{FmtguardMcpServer, types::GetConfigParams};
use rmcp::handler::server::wrapper::Parameters;
use serde_json::json;

use crate::{McpTestFixture, extract_tool_result_json};

// ============================================================================
// get_config tests
// ============================================================================

#[tokio::test]
async fn test_get_config_defaults() {
    let fixture = McpTestFixture::new().unwrap();
    let server = FmtguardMcpServer::new();

    let params = Parameters(GetConfigParams {
        project_root_path: fixture.root(),
    });

    let result = server.get_config(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["fromFile"], false);
    assert_eq!(
        json_result["config"]["ignores"],
        json!(["**/bin/**", "**/obj/**"])
    );
    assert_eq!(json_result["config"]["includes"], json!([]));
    assert_eq!(json_result["config"]["ignoreTestFiles"], false);
}

#[tokio::test]
async fn test_get_config_from_file() {
    let fixture = McpTestFixture::new().unwrap();
    fixture
        .write_config(&json!({
            "includes": ["src"],
            "ignoreTestFiles": true
        }))
        .unwrap();
    assert!(fixture.root_path().join(".fmtguardrc.json").exists());
    let server = FmtguardMcpServer::new();

    let params = Parameters(GetConfigParams {
        project_root_path: fixture.root(),
    });

    let result = server.get_config(params).await.unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["fromFile"], true);
    assert_eq!(json_result["config"]["includes"], json!(["src"]));
    assert_eq!(json_result["config"]["ignoreTestFiles"], true);
    assert_eq!(
        json_result["config"]["ignores"],
        json!(["**/bin/**", "**/obj/**"])
    );
}

#[tokio::test]
async fn test_get_config_invalid_pattern_is_error() {
    let fixture = McpTestFixture::new().unwrap();
    fixture
        .write_config(&json!({ "ignores": ["[invalid"] }))
        .unwrap();
    let server = FmtguardMcpServer::new();

    let params = Parameters(GetConfigParams {
        project_root_path: fixture.root(),
    });

    assert!(server.get_config(params).await.is_err());
}
