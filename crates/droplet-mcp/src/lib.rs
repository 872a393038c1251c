//! droplet-mcp
//!
//! Exposes DigitalOcean droplets, images and their actions to AI assistants
//! via the Model Context Protocol.
//!
//! - [`tools`]: declarative tool tables, argument validation and dispatch
//! - [`api`]: the upstream [`api::CloudApi`] boundary and its HTTP client
//! - [`server`]: rmcp server over stdio or streamable HTTP
//! - [`config`]: YAML + environment configuration

pub mod api;
pub mod auth;
pub mod config;
pub mod server;
pub mod tools;

/// Server name
pub const SERVER_NAME: &str = "droplet-mcp";

/// Server version
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use server::DropletMcpServer;
