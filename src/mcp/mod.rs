//! Model Context Protocol (MCP) server implementation.
//!
//! Exposes the check and the fix to AI assistants over stdio.
//!
//! ## Module Structure
//!
//! - `server`: MCP server and its tools
//! - `types`: parameter and result types of the tools

mod server;
pub mod types;

pub use server::{FmtguardMcpServer, run_server};
