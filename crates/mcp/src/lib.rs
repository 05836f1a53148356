//! MCP server exposing the Qarnot compute platform as callable tools.
//!
//! The server is glue: each tool call maps to exactly one remote
//! operation, whose response is reshaped into a small JSON or plain-text
//! string. No task state is owned locally; the platform enforces every
//! lifecycle invariant.

pub mod error;
pub mod platform;
pub mod stdio;
pub mod tools;

#[cfg(test)]
pub(crate) mod fake;

pub use error::{GatewayError, Result};
pub use platform::ComputePlatform;
pub use tools::QarnotTools;
