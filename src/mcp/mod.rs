//! MCP tool server.
//!
//! Exposes the task and project operations as MCP tools over stdio. Every
//! handler catches its own failures and returns them as textual tool output;
//! nothing surfaces as a protocol-level fault.

mod server;

pub use server::TickTickMcpServer;
