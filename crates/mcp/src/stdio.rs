//! JSON-RPC serving loop over stdio (one JSON message per line).
//!
//! Requests are handled strictly in order: a tool call runs to completion
//! before the next line is read, so no two remote operations are ever in
//! flight at once from this process.
//!
//! Error-reporting convention: invocation faults (unknown tool, bad
//! arguments) are JSON-RPC errors; collaborator and local-I/O failures
//! come back as tool results with `isError: true`, carrying the original
//! error message verbatim.

use crate::error::GatewayError;
use crate::platform::ComputePlatform;
use crate::tools::QarnotTools;
use rmcp::model::{CallToolResult, Content};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader};
use tracing::{debug, warn};

/// Protocol revision advertised when the client does not name one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Serve the tool surface over stdin/stdout until stdin closes.
///
/// # Errors
///
/// Returns an error if stdin/stdout become unusable.
pub async fn serve<P: ComputePlatform>(tools: QarnotTools<P>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let Some(response) = handle_line(&tools, &line).await else {
            continue;
        };
        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        stdout.write_all(&payload).await?;
        stdout.flush().await?;
    }

    debug!("stdin closed; shutting down");
    Ok(())
}

async fn handle_line<P: ComputePlatform>(tools: &QarnotTools<P>, line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let msg: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "discarding non-JSON input line");
            return None;
        }
    };
    handle_message(tools, &msg).await
}

async fn handle_message<P: ComputePlatform>(tools: &QarnotTools<P>, msg: &Value) -> Option<Value> {
    let method = msg.get("method").and_then(Value::as_str)?;

    // Notifications carry no `id` and expect no reply.
    let Some(id) = msg.get("id") else {
        debug!(method = %method, "notification");
        return None;
    };

    let response = match method {
        "initialize" => jsonrpc_ok(id, &initialize_result(msg)),
        "ping" => jsonrpc_ok(id, &json!({})),
        "tools/list" => {
            let listed =
                serde_json::to_value(QarnotTools::<P>::list_tools()).unwrap_or_else(|_| json!([]));
            jsonrpc_ok(id, &json!({ "tools": listed }))
        }
        "tools/call" => tools_call_response(tools, id, msg).await,
        "resources/list" => jsonrpc_ok(id, &json!({ "resources": [] })),
        "prompts/list" => jsonrpc_ok(id, &json!({ "prompts": [] })),
        _ => jsonrpc_err(id, -32601, "method not found"),
    };
    Some(response)
}

async fn tools_call_response<P: ComputePlatform>(
    tools: &QarnotTools<P>,
    id: &Value,
    msg: &Value,
) -> Value {
    let params = msg.get("params").cloned().unwrap_or_else(|| json!({}));
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return jsonrpc_err(id, -32602, "tools/call requires params.name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

    match tools.call_tool(name, &arguments).await {
        Ok(result) => tool_result_response(id, &result),
        Err(GatewayError::UnknownTool(tool)) => {
            jsonrpc_err(id, -32601, &format!("unknown tool: {tool}"))
        }
        Err(GatewayError::InvalidParams(message)) => jsonrpc_err(id, -32602, &message),
        Err(other) => {
            warn!(tool = %name, error = %other, "tool call failed");
            let result = CallToolResult {
                content: vec![Content::text(other.to_string())],
                structured_content: None,
                is_error: Some(true),
                meta: None,
            };
            tool_result_response(id, &result)
        }
    }
}

fn tool_result_response(id: &Value, result: &CallToolResult) -> Value {
    match serde_json::to_value(result) {
        Ok(v) => jsonrpc_ok(id, &v),
        Err(e) => jsonrpc_err(id, -32603, &format!("result serialization failed: {e}")),
    }
}

fn initialize_result(msg: &Value) -> Value {
    let protocol_version = msg
        .get("params")
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION);

    json!({
        "protocolVersion": protocol_version,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": "qarnot-mcp",
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn jsonrpc_ok(id: &Value, result: &Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn jsonrpc_err(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}
