//! Declarative tool descriptors.
//!
//! Each tool is a [`ToolConfig`]: a name, a description, the ordered list
//! of arguments it accepts and the handler that performs the upstream call.
//! The same descriptor drives the advertised JSON schema and the
//! required-argument check run before the handler.

use super::args::Arguments;
use super::dispatch::{ToolContext, ToolError, ToolOutput};
use crate::api::CloudApi;
use futures::future::BoxFuture;
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use serde_json::{json, Value};
use std::sync::Arc;

/// Handler signature shared by every tool.
pub type HandlerFn = for<'a> fn(
    &'a ToolContext,
    &'a dyn CloudApi,
    &'a Arguments,
) -> BoxFuture<'a, Result<ToolOutput, ToolError>>;

/// JSON type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ArgumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether `value` has this JSON type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentConfig {
    pub name: &'static str,
    pub kind: ArgumentKind,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<Value>,
}

impl ArgumentConfig {
    pub fn required(name: &'static str, kind: ArgumentKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: ArgumentKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn schema(&self) -> Value {
        let mut prop = json!({
            "type": self.kind.as_str(),
            "description": self.description,
        });
        if let (Some(default), Some(obj)) = (&self.default, prop.as_object_mut()) {
            obj.insert("default".to_string(), default.clone());
        }
        prop
    }
}

// ── Common argument shapes ──────────────────────────────────────────

pub fn id_arg(description: &'static str) -> ArgumentConfig {
    ArgumentConfig::required("ID", ArgumentKind::Number, description)
}

pub fn tag_arg(description: &'static str) -> ArgumentConfig {
    ArgumentConfig::required("Tag", ArgumentKind::String, description)
}

/// `Page` / `PerPage` with their advertised defaults.
pub fn paging_args() -> [ArgumentConfig; 2] {
    let defaults = crate::api::types::ListOptions::default();
    [
        ArgumentConfig::optional("Page", ArgumentKind::Number, "Page number")
            .with_default(defaults.page),
        ArgumentConfig::optional("PerPage", ArgumentKind::Number, "Items per page")
            .with_default(defaults.per_page),
    ]
}

// ── ToolConfig ──────────────────────────────────────────────────────

/// Descriptor of one callable tool.
#[derive(Clone)]
pub struct ToolConfig {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<ArgumentConfig>,
    pub handler: HandlerFn,
    pub destructive: bool,
}

impl std::fmt::Debug for ToolConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolConfig")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("destructive", &self.destructive)
            .finish_non_exhaustive()
    }
}

impl ToolConfig {
    pub fn new(name: &'static str, description: &'static str, handler: HandlerFn) -> Self {
        Self {
            name,
            description,
            arguments: Vec::new(),
            handler,
            destructive: false,
        }
    }

    pub fn arg(mut self, arg: ArgumentConfig) -> Self {
        self.arguments.push(arg);
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = ArgumentConfig>) -> Self {
        self.arguments.extend(args);
        self
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }

    /// Checks that every required argument is present as a key.
    ///
    /// Only presence is checked; value types are enforced by the typed
    /// accessors on [`Arguments`].
    pub fn validate(&self, args: &Arguments) -> Result<(), ToolError> {
        match self
            .arguments
            .iter()
            .find(|a| a.required && !args.contains(a.name))
        {
            Some(missing) => Err(ToolError::MissingArgument(missing.name.to_string())),
            None => Ok(()),
        }
    }

    /// JSON schema object advertised for this tool's input.
    pub fn input_schema(&self) -> JsonObject {
        let properties: serde_json::Map<String, Value> = self
            .arguments
            .iter()
            .map(|a| (a.name.to_string(), a.schema()))
            .collect();
        let required: Vec<&str> = self
            .arguments
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name)
            .collect();

        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), json!(required));
        }
        schema
    }

    /// MCP tool definition for `tools/list`.
    pub fn to_tool(&self) -> Tool {
        let mut tool = Tool::new(self.name, self.description, Arc::new(self.input_schema()));
        if self.destructive {
            tool.annotations = Some(ToolAnnotations::new().destructive(true));
        }
        tool
    }
}
