//! MCP (Model Context Protocol) server implementation.
//!
//! This module provides an MCP server that lets AI assistants search the icon
//! catalog and save icons as SVG files.

mod server;

pub use server::run_mcp_server;
