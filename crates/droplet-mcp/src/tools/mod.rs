//! MCP tools over the DigitalOcean API.
//!
//! Tools are declared as [`ToolConfig`] tables per resource group and
//! executed through the generic [`dispatch`] path.

pub mod args;
pub mod config;
pub mod dispatch;
pub mod droplet_actions;
pub mod droplets;
pub mod image_actions;
pub mod images;
pub mod registry;

pub use args::Arguments;
pub use config::{ArgumentConfig, ArgumentKind, HandlerFn, ToolConfig};
pub use dispatch::{dispatch, DispatchError, ToolContext, ToolError, ToolOutput, ToolResult};
pub use registry::{RegistryError, ToolRegistry};
