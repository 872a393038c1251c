//! MCP server exposing the tool registry.
//!
//! `tools/list` advertises every registered tool; `tools/call` is routed
//! through the generic dispatcher. Runs over stdio or streamable HTTP.

use crate::api::factory::ClientFactory;
use crate::auth;
use crate::tools::{dispatch, Arguments, ToolContext, ToolRegistry};
use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler, ServiceExt};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Path the HTTP transport is mounted on.
pub const MCP_PATH: &str = "/mcp";

#[derive(Clone)]
pub struct DropletMcpServer {
    registry: Arc<ToolRegistry>,
    factory: Arc<dyn ClientFactory>,
}

impl DropletMcpServer {
    pub fn new(registry: Arc<ToolRegistry>, factory: Arc<dyn ClientFactory>) -> Self {
        Self { registry, factory }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

impl ServerHandler for DropletMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "DigitalOcean droplet management. Recommended workflow:\n\
                 1) droplet-list or droplet-list-by-tag: find droplets and their IDs\n\
                 2) droplet-get: inspect one droplet\n\
                 3) droplet-reboot, droplet-power-on, droplet-power-off: act on a droplet by ID\n\
                 Bulk actions: droplet-*-by-tag act on every droplet sharing a tag\n\
                 Images: image-list (Type: distribution, application, user), image-get, image-transfer\n\
                 IDs are numbers; JSON policies (BackupPolicy, PolicyJSON) are passed as strings"
                    .into(),
            ),
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, ErrorData>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(
            self.registry.mcp_tools(),
        )))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, ErrorData>> + Send + '_ {
        async move {
            let tool = self.registry.get(&request.name).ok_or_else(|| {
                ErrorData::invalid_params(format!("unknown tool: {}", request.name), None)
            })?;

            let ctx = tool_context(context.ct.clone(), &context.extensions);
            let args = Arguments::from(request.arguments);

            match dispatch(tool, self.factory.as_ref(), &ctx, &args).await {
                Ok(result) => Ok(result.into()),
                Err(e) => {
                    log::error!("tool {} aborted: {}", tool.name, e);
                    Err(ErrorData::internal_error(e.to_string(), None))
                }
            }
        }
    }
}

/// Per-call context: the request's cancellation token, plus the bearer
/// token when the call arrived over HTTP.
fn tool_context(cancel: CancellationToken, extensions: &Extensions) -> ToolContext {
    let mut ctx = ToolContext::new(cancel);
    if let Some(parts) = extensions.get::<axum::http::request::Parts>() {
        ctx.bearer_token = auth::bearer_from_headers(&parts.headers);
    }
    ctx
}

/// Serve MCP over stdin/stdout until the client disconnects.
pub async fn run_stdio(server: DropletMcpServer) -> anyhow::Result<()> {
    log::info!(
        "MCP server starting on stdio with {} tools",
        server.registry().len()
    );
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    log::info!("MCP stdio server stopped.");
    Ok(())
}

/// Serve MCP over streamable HTTP at `/mcp` until `shutdown` resolves.
pub async fn run_http(
    registry: Arc<ToolRegistry>,
    factory: Arc<dyn ClientFactory>,
    bind_address: &str,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use rmcp::transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    };

    let mcp_service = StreamableHttpService::new(
        move || Ok(DropletMcpServer::new(registry.clone(), factory.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service(MCP_PATH, mcp_service);

    let bind_addr = format!("{}:{}", bind_address, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("MCP server listening on http://{}{}", bind_addr, MCP_PATH);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    log::info!("MCP server stopped.");
    Ok(())
}
