//! Integration tests for the MCP server.
//!
//! Uses `MockCloudApi` behind a real MCP client-server transport (in-process duplex)
//! to exercise tool listing, routing, fault reporting and JSON formatting end-to-end.
//!
//! Run with: `cargo test --features test-harness --test integration_mcp`
#![cfg(feature = "test-harness")]

use std::sync::Arc;

use droplet_mcp::api::factory::{ClientFactory, StaticClientFactory};
use droplet_mcp::api::mock::{FailingClientFactory, MockCloudApi, FIRST_CREATED_ID};
use droplet_mcp::tools::ToolRegistry;
use droplet_mcp::DropletMcpServer;

use rmcp::model::{CallToolRequestParams, ClientInfo};
use rmcp::{ClientHandler, ServiceExt};
use serde_json::json;

// ── Dummy client handler (required by rmcp) ──────────────────────────

#[derive(Debug, Clone, Default)]
struct TestClientHandler;

impl ClientHandler for TestClientHandler {
    fn get_info(&self) -> ClientInfo {
        ClientInfo::default()
    }
}

// ── Test harness ─────────────────────────────────────────────────────

/// Spins up a `DropletMcpServer` on an in-process duplex transport and
/// returns an MCP client that can call tools.
struct TestHarness {
    client: rmcp::service::RunningService<rmcp::RoleClient, TestClientHandler>,
    mock: Arc<MockCloudApi>,
    _server_handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestHarness {
    async fn new() -> Self {
        let mock = Arc::new(MockCloudApi::new());
        let factory = Arc::new(StaticClientFactory::new(mock.clone()));
        Self::with_factory(mock, factory).await
    }

    async fn with_factory(mock: Arc<MockCloudApi>, factory: Arc<dyn ClientFactory>) -> Self {
        let registry = Arc::new(ToolRegistry::builtin().expect("builtin registry"));
        let server = DropletMcpServer::new(registry, factory);

        let (server_transport, client_transport) = tokio::io::duplex(65536);

        let server_handle = tokio::spawn(async move {
            server.serve(server_transport).await?.waiting().await?;
            anyhow::Ok(())
        });

        let client = TestClientHandler
            .serve(client_transport)
            .await
            .expect("client setup failed");

        Self {
            client,
            mock,
            _server_handle: server_handle,
        }
    }

    /// Call a tool with JSON arguments.
    async fn call(
        &self,
        tool_name: &str,
        args: serde_json::Value,
    ) -> Result<rmcp::model::CallToolResult, rmcp::ServiceError> {
        self.client
            .call_tool(CallToolRequestParams {
                meta: None,
                name: tool_name.to_string().into(),
                arguments: Some(
                    args.as_object()
                        .expect("call requires a JSON object")
                        .clone(),
                ),
                task: None,
            })
            .await
    }

    async fn shutdown(self) -> anyhow::Result<()> {
        self.client.cancel().await?;
        self._server_handle.await??;
        Ok(())
    }
}

/// Extract the text content from a CallToolResult.
fn result_text(result: &rmcp::model::CallToolResult) -> String {
    result
        .content
        .first()
        .and_then(|c| c.raw.as_text())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

fn is_fault(result: &rmcp::model::CallToolResult) -> bool {
    result.is_error == Some(true)
}

// ════════════════════════════════════════════════════════════════════════
// Integration tests
// ════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn list_tools_advertises_catalogue() {
    let h = TestHarness::new().await;
    let tools = h.client.list_tools(None).await.expect("list_tools failed");

    assert_eq!(tools.tools.len(), 43);
    let names: Vec<String> = tools.tools.iter().map(|t| t.name.to_string()).collect();
    for name in [
        "droplet-create",
        "droplet-list",
        "droplet-reboot",
        "droplet-snapshot-by-tag",
        "image-list",
        "image-delete",
        "image-transfer",
    ] {
        assert!(names.contains(&name.to_string()), "missing {}", name);
    }

    let create = tools
        .tools
        .iter()
        .find(|t| t.name == "droplet-create")
        .unwrap();
    let schema = serde_json::Value::Object((*create.input_schema).clone());
    assert_eq!(schema["required"], json!(["Name", "Size", "ImageID", "Region"]));
    assert_eq!(schema["properties"]["Backup"]["default"], false);

    let delete = tools
        .tools
        .iter()
        .find(|t| t.name == "image-delete")
        .unwrap();
    assert_eq!(
        delete.annotations.as_ref().and_then(|a| a.destructive_hint),
        Some(true)
    );

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn create_droplet_end_to_end() {
    let h = TestHarness::new().await;
    let result = h
        .call(
            "droplet-create",
            json!({"Name": "test", "Size": "s-1vcpu-1gb", "ImageID": 456.0, "Region": "nyc1"}),
        )
        .await
        .unwrap();

    assert!(!is_fault(&result));
    let json: serde_json::Value = serde_json::from_str(&result_text(&result)).unwrap();
    assert_eq!(json["id"], FIRST_CREATED_ID);
    assert_eq!(json["name"], "test");

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn missing_argument_is_reported() {
    let h = TestHarness::new().await;
    let result = h
        .call(
            "droplet-create",
            json!({"Name": "test", "Size": "s-1vcpu-1gb", "ImageID": 456.0}),
        )
        .await
        .unwrap();

    assert!(is_fault(&result));
    assert_eq!(result_text(&result), "missing required argument: Region");
    assert_eq!(h.mock.call_count(), 0);

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn list_returns_pretty_json() {
    let h = TestHarness::new().await;
    let result = h.call("droplet-list", json!({})).await.unwrap();
    let text = result_text(&result);

    assert!(text.starts_with("[\n  {"));
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json[0]["name"], "web-1");

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn delete_returns_confirmation() {
    let h = TestHarness::new().await;
    let result = h.call("image-delete", json!({"ID": 3})).await.unwrap();

    assert!(!is_fault(&result));
    assert_eq!(result_text(&result), "Image deleted successfully");

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn upstream_failure_is_reported() {
    let h = TestHarness::new().await;
    h.mock.fail_with("rate limited");
    let result = h.call("droplet-reboot", json!({"ID": 1})).await.unwrap();

    assert!(is_fault(&result));
    assert_eq!(result_text(&result), "api error: rate limited");

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn malformed_policy_is_reported() {
    let h = TestHarness::new().await;
    let result = h
        .call(
            "droplet-change-backup-policy",
            json!({"ID": 1, "PolicyJSON": "{\"plan\":"}),
        )
        .await
        .unwrap();

    assert!(is_fault(&result));
    assert!(result_text(&result).contains("invalid backup policy json"));
    assert_eq!(h.mock.call_count(), 0);

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn unknown_tool_is_a_protocol_error() {
    let h = TestHarness::new().await;
    let result = h.call("droplet-teleport", json!({})).await;
    assert!(result.is_err());

    h.shutdown().await.unwrap();
}

#[tokio::test]
async fn client_failure_is_a_protocol_error() {
    let mock = Arc::new(MockCloudApi::new());
    let h = TestHarness::with_factory(mock, Arc::new(FailingClientFactory)).await;
    let result = h.call("droplet-get", json!({"ID": 1})).await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("failed to get DigitalOcean client"), "{}", err);

    h.shutdown().await.unwrap();
}
