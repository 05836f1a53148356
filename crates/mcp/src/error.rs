//! Error types for the MCP gateway.
//!
//! Collaborator failures carry no retry or translation policy: they are
//! surfaced to the host with their original message. Only invocation
//! faults (unknown tool, bad arguments) get dedicated variants, because
//! the protocol layer reports them as JSON-RPC errors instead of tool
//! results.

use thiserror::Error;

/// Main error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Failures reported by the platform client (remote lookup,
    /// transport, auth), surfaced unmodified
    #[error(transparent)]
    Platform(#[from] qarnot_client::ClientError),

    /// Tool name not in the exposed surface
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// Missing or ill-typed tool arguments
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
