use fmtguard::mcp::{FmtguardMcpServer, types::ScanFindingsParams};
use rmcp::handler::server::wrapper::Parameters;

use crate::{
    McpTestFixture, SERVICE, assert_pagination, extract_tool_result_json, fixture_with_findings,
};

fn params(
    fixture: &McpTestFixture,
    limit: Option<u32>,
    offset: Option<u32>,
) -> Parameters<ScanFindingsParams> {
    Parameters(ScanFindingsParams {
        project_root_path: fixture.root(),
        limit,
        offset,
    })
}

// ============================================================================
// scan_findings tests
// ============================================================================

#[tokio::test]
async fn test_scan_findings_items() {
    let fixture = McpTestFixture::with_files(&[("Service.cs", SERVICE)]).unwrap();
    let server = FmtguardMcpServer::new();

    let result = server
        .scan_findings(params(&fixture, None, None))
        .await
        .unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["totalCount"], 2);
    assert_eq!(json_result["totalFileCount"], 1);
    assert_eq!(json_result["parseErrorCount"], 0);

    let items = json_result["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert!(first["filePath"].as_str().unwrap().ends_with("Service.cs"));
    assert_eq!(first["line"], 5);
    assert_eq!(first["col"], 25);
    assert_eq!(first["argument"], "$\"id {id}\"");
    assert_eq!(first["parameter"], "args");
    assert_eq!(first["callee"], "Service.Log");
    assert_eq!(first["sourceLine"], "        Log(\"user {0}\", $\"id {id}\");");

    let second = &items[1];
    assert_eq!(second["line"], 6);
    assert_eq!(second["argument"], "entry: $\"visited {id}\"");
    assert_eq!(second["parameter"], "entry");

    assert_pagination(&json_result, 0, 20, false);
}

#[tokio::test]
async fn test_scan_findings_empty_project() {
    let fixture = McpTestFixture::with_files(&[("App.cs", "class App { }")]).unwrap();
    let server = FmtguardMcpServer::new();

    let result = server
        .scan_findings(params(&fixture, None, None))
        .await
        .unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["totalCount"], 0);
    assert!(json_result["items"].as_array().unwrap().is_empty());
    assert_pagination(&json_result, 0, 20, false);
}

#[tokio::test]
async fn test_scan_findings_pagination() {
    let fixture = fixture_with_findings(5).unwrap();
    let server = FmtguardMcpServer::new();

    let result = server
        .scan_findings(params(&fixture, Some(2), Some(0)))
        .await
        .unwrap();
    let json_result = extract_tool_result_json(&result);
    assert_eq!(json_result["totalCount"], 5);
    assert_eq!(json_result["totalFileCount"], 5);
    assert_eq!(json_result["items"].as_array().unwrap().len(), 2);
    assert_pagination(&json_result, 0, 2, true);

    let result = server
        .scan_findings(params(&fixture, Some(2), Some(4)))
        .await
        .unwrap();
    let json_result = extract_tool_result_json(&result);
    let items = json_result["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert!(
        items[0]["filePath"]
            .as_str()
            .unwrap()
            .ends_with("Service04.cs")
    );
    assert_pagination(&json_result, 4, 2, false);
}

#[tokio::test]
async fn test_scan_findings_limit_is_capped() {
    let fixture = fixture_with_findings(1).unwrap();
    let server = FmtguardMcpServer::new();

    let result = server
        .scan_findings(params(&fixture, Some(1000), None))
        .await
        .unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_pagination(&json_result, 0, 100, false);
}

#[tokio::test]
async fn test_scan_findings_counts_parse_errors() {
    let fixture = McpTestFixture::with_files(&[
        ("Service.cs", SERVICE),
        ("Broken.cs", "class Broken { void M() { Foo($\"x); } }"),
    ])
    .unwrap();
    let server = FmtguardMcpServer::new();

    let result = server
        .scan_findings(params(&fixture, None, None))
        .await
        .unwrap();
    let json_result = extract_tool_result_json(&result);

    assert_eq!(json_result["totalCount"], 2);
    assert_eq!(json_result["parseErrorCount"], 1);
}
