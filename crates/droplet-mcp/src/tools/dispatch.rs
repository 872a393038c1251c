//! Generic tool dispatch.
//!
//! Every tool call runs through [`dispatch`]: validate the arguments,
//! obtain a client, run the handler once and turn its outcome into a
//! [`ToolResult`]. Failures the caller can act on become fault results;
//! only a missing client or an unserializable value is a hard error.
//!
//! Only upstream failures and cancellation carry the `api error: ` prefix.
//! Bad input caught inside a handler (wrong type, malformed policy JSON,
//! empty name list) is reported with its own message.

use super::args::Arguments;
use super::config::ToolConfig;
use crate::api::factory::{ClientError, ClientFactory};
use crate::api::ApiError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Per-call state handed to handlers.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub cancel: CancellationToken,
    /// Token from the caller's `Authorization: Bearer` header, if any.
    pub bearer_token: Option<String>,
}

impl ToolContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

/// Value produced by a successful handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Returned to the caller verbatim.
    Text(String),
    /// Pretty-printed JSON document.
    Json(String),
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Renders `value` as 2-space indented JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ToolError> {
        Ok(Self::Json(serde_json::to_string_pretty(value)?))
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) | Self::Json(s) => s,
        }
    }
}

/// Handler failures.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("missing required argument: {0}")]
    MissingArgument(String),
    #[error("invalid argument {name}: expected {expected}")]
    InvalidArgument { name: String, expected: String },
    #[error("invalid {what} json: {reason}")]
    InvalidJson { what: &'static str, reason: String },
    #[error("{0}")]
    Invalid(String),
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("api error: request cancelled")]
    Cancelled,
    #[error("json marshal error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that abort a call instead of producing a fault result.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to get DigitalOcean client: {0}")]
    Client(#[from] ClientError),
    #[error("json marshal error: {0}")]
    Serialize(serde_json::Error),
}

/// Uniform outcome of a tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub is_error: bool,
    pub text: String,
}

impl ToolResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            text: text.into(),
        }
    }

    pub fn fault(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            text: text.into(),
        }
    }
}

impl From<ToolResult> for CallToolResult {
    fn from(result: ToolResult) -> Self {
        let content = vec![Content::text(result.text)];
        if result.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}

/// Runs one tool call end to end.
pub async fn dispatch(
    tool: &ToolConfig,
    factory: &dyn ClientFactory,
    ctx: &ToolContext,
    args: &Arguments,
) -> Result<ToolResult, DispatchError> {
    log::debug!(
        "tool call: {} ({} argument(s))",
        tool.name,
        args.as_map().len()
    );

    if let Err(e) = tool.validate(args) {
        log::warn!("tool {} rejected: {}", tool.name, e);
        return Ok(ToolResult::fault(e.to_string()));
    }

    let client = factory.client(ctx).await?;

    let outcome = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => Err(ToolError::Cancelled),
        result = (tool.handler)(ctx, client.as_ref(), args) => result,
    };

    match outcome {
        Ok(output) => Ok(ToolResult::success(output.into_text())),
        Err(ToolError::Serialize(e)) => {
            log::error!("tool {} produced unserializable output: {}", tool.name, e);
            Err(DispatchError::Serialize(e))
        }
        Err(e) => {
            log::warn!("tool {} failed: {}", tool.name, e);
            Ok(ToolResult::fault(e.to_string()))
        }
    }
}
