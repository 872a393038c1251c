//! The table of every tool the server exposes.

use super::config::ToolConfig;
use super::{droplet_actions, droplets, image_actions, images};
use rmcp::model::Tool;
use std::collections::HashMap;

/// Descriptor table violations, caught once at startup.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),
    #[error("tool {tool}: duplicate argument {argument}")]
    DuplicateArgument { tool: String, argument: String },
    #[error("tool {tool}: required argument {argument} has a default")]
    RequiredWithDefault { tool: String, argument: String },
    #[error("tool {tool}: default of {argument} is not a {kind}")]
    DefaultKindMismatch {
        tool: String,
        argument: String,
        kind: &'static str,
    },
}

/// Immutable, validated set of tools with lookup by name.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: Vec<ToolConfig>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<ToolConfig>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(tools.len());
        for (i, tool) in tools.iter().enumerate() {
            check_arguments(tool)?;
            if index.insert(tool.name, i).is_some() {
                return Err(RegistryError::DuplicateTool(tool.name.to_string()));
            }
        }
        Ok(Self { tools, index })
    }

    /// All droplet, droplet action, image and image action tools.
    pub fn builtin() -> Result<Self, RegistryError> {
        let mut tools = droplets::tools();
        tools.extend(droplet_actions::tools());
        tools.extend(images::tools());
        tools.extend(image_actions::tools());
        Self::new(tools)
    }

    pub fn get(&self, name: &str) -> Option<&ToolConfig> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    pub fn tools(&self) -> &[ToolConfig] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// MCP definitions in registration order.
    pub fn mcp_tools(&self) -> Vec<Tool> {
        self.tools.iter().map(ToolConfig::to_tool).collect()
    }
}

fn check_arguments(tool: &ToolConfig) -> Result<(), RegistryError> {
    let mut seen = std::collections::HashSet::new();
    for arg in &tool.arguments {
        if !seen.insert(arg.name) {
            return Err(RegistryError::DuplicateArgument {
                tool: tool.name.to_string(),
                argument: arg.name.to_string(),
            });
        }
        match &arg.default {
            Some(_) if arg.required => {
                return Err(RegistryError::RequiredWithDefault {
                    tool: tool.name.to_string(),
                    argument: arg.name.to_string(),
                })
            }
            Some(default) if !arg.kind.matches(default) => {
                return Err(RegistryError::DefaultKindMismatch {
                    tool: tool.name.to_string(),
                    argument: arg.name.to_string(),
                    kind: arg.kind.as_str(),
                })
            }
            _ => {}
        }
    }
    Ok(())
}
