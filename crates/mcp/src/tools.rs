//! The eight tools exposed over MCP.
//!
//! Every tool translates one call into exactly one remote operation and
//! renders the response as a string: pretty-printed JSON for structured
//! results, plain text for logs and confirmations. Remote failures are
//! returned unmodified; the only local short-circuit is refusing to abort
//! a task that is already terminal.

use crate::error::{GatewayError, Result};
use crate::platform::ComputePlatform;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool, ToolAnnotations};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct QarnotTools<P> {
    platform: Arc<P>,
}

impl<P: ComputePlatform> QarnotTools<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    /// List the MCP `Tool`s exposed by this gateway.
    #[must_use]
    pub fn list_tools() -> Vec<Tool> {
        let uuid_prop = json!({
            "uuid": { "type": "string", "description": "The UUID of the task" }
        });
        let output_props = json!({
            "uuid": { "type": "string", "description": "The UUID of the task" },
            "instance_id": {
                "type": "integer",
                "description": "Optional instance ID for multi-instance tasks"
            }
        });
        let bucket_prop = json!({
            "bucket_name": { "type": "string", "description": "The name of the bucket" }
        });
        let download_props = json!({
            "bucket_name": { "type": "string", "description": "The name of the bucket" },
            "remote_path": {
                "type": "string",
                "description": "The path of the file in the bucket"
            },
            "local_path": {
                "type": "string",
                "description": "Where to save the file locally"
            }
        });

        vec![
            read_tool(
                "list_tasks",
                "List all Qarnot tasks for your account.",
                object_schema(json!({}), &[]),
            ),
            read_tool(
                "get_task_status",
                "Get detailed status of a specific Qarnot task, including any active SSH forwards.",
                object_schema(uuid_prop.clone(), &["uuid"]),
            ),
            read_tool(
                "get_task_stdout",
                "Get the standard output (stdout) of a Qarnot task.",
                object_schema(output_props.clone(), &["uuid"]),
            ),
            read_tool(
                "get_task_stderr",
                "Get the standard error (stderr) of a Qarnot task.",
                object_schema(output_props, &["uuid"]),
            ),
            mutating_tool(
                "cancel_task",
                "Cancel a running Qarnot task.",
                object_schema(uuid_prop, &["uuid"]),
            ),
            read_tool(
                "list_buckets",
                "List all storage buckets in your Qarnot account.",
                object_schema(json!({}), &[]),
            ),
            read_tool(
                "list_bucket_files",
                "List all files in a Qarnot storage bucket.",
                object_schema(bucket_prop, &["bucket_name"]),
            ),
            write_tool(
                "download_result",
                "Download a file from a Qarnot bucket to a local path.",
                object_schema(
                    download_props,
                    &["bucket_name", "remote_path", "local_path"],
                ),
            ),
        ]
    }

    /// Execute a tool call.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool name is unknown, required arguments
    /// are missing or ill-typed, or the remote operation fails.
    pub async fn call_tool(&self, name: &str, arguments: &Value) -> Result<CallToolResult> {
        debug!(tool = %name, "tool call");

        let text = match name {
            "list_tasks" => self.list_tasks().await?,
            "get_task_status" => self.get_task_status(required_str(arguments, "uuid")?).await?,
            "get_task_stdout" => {
                self.get_task_stdout(
                    required_str(arguments, "uuid")?,
                    optional_u32(arguments, "instance_id")?,
                )
                .await?
            }
            "get_task_stderr" => {
                self.get_task_stderr(
                    required_str(arguments, "uuid")?,
                    optional_u32(arguments, "instance_id")?,
                )
                .await?
            }
            "cancel_task" => self.cancel_task(required_str(arguments, "uuid")?).await?,
            "list_buckets" => self.list_buckets().await?,
            "list_bucket_files" => {
                self.list_bucket_files(required_str(arguments, "bucket_name")?)
                    .await?
            }
            "download_result" => {
                self.download_result(
                    required_str(arguments, "bucket_name")?,
                    required_str(arguments, "remote_path")?,
                    required_str(arguments, "local_path")?,
                )
                .await?
            }
            other => return Err(GatewayError::UnknownTool(other.to_string())),
        };

        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    async fn list_tasks(&self) -> Result<String> {
        let tasks = self.platform.tasks().await?;
        let summaries: Vec<Value> = tasks.iter().map(task_summary).collect();
        Ok(serde_json::to_string_pretty(&Value::Array(summaries))?)
    }

    async fn get_task_status(&self, uuid: &str) -> Result<String> {
        let task = self.platform.task(uuid).await?;
        let forwards = ssh_forwards(&task);

        let ssh_connections = if forwards.is_empty() {
            json!("No active SSH forwards")
        } else {
            Value::Array(forwards)
        };

        let result = json!({
            "uuid": task.uuid,
            "name": task.name,
            "state": task.state,
            "progress": format!("{}%", task.progress),
            "instance_count": task.instance_count,
            "running_instances": task.running_instance_count,
            "running_cores": task.running_core_count,
            "execution_time": task.execution_time.as_deref().unwrap_or("N/A"),
            "wall_time": task.wall_time.as_deref().unwrap_or("N/A"),
            "creation_date": task.creation_date.to_rfc3339(),
            "end_date": end_date_string(&task),
            "ssh_connections": ssh_connections,
        });

        Ok(serde_json::to_string_pretty(&result)?)
    }

    async fn get_task_stdout(&self, uuid: &str, instance: Option<u32>) -> Result<String> {
        let stdout = self.platform.task_stdout(uuid, instance).await?;
        if stdout.is_empty() {
            Ok("(no output)".to_string())
        } else {
            Ok(stdout)
        }
    }

    async fn get_task_stderr(&self, uuid: &str, instance: Option<u32>) -> Result<String> {
        let stderr = self.platform.task_stderr(uuid, instance).await?;
        if stderr.is_empty() {
            Ok("(no error output)".to_string())
        } else {
            Ok(stderr)
        }
    }

    async fn cancel_task(&self, uuid: &str) -> Result<String> {
        let task = self.platform.task(uuid).await?;

        if task.state.is_terminal() {
            return Ok(format!(
                "Task {uuid} is already in state '{}' and cannot be cancelled.",
                task.state
            ));
        }

        self.platform.abort_task(uuid).await?;
        Ok(format!("Task {uuid} has been cancelled."))
    }

    async fn list_buckets(&self) -> Result<String> {
        let buckets = self.platform.buckets().await?;
        if buckets.is_empty() {
            return Ok("No buckets found.".to_string());
        }

        let names: Vec<Value> = buckets.iter().map(|b| json!({ "name": b.name })).collect();
        Ok(serde_json::to_string_pretty(&Value::Array(names))?)
    }

    async fn list_bucket_files(&self, bucket: &str) -> Result<String> {
        let entries = self.platform.bucket_files(bucket).await?;
        if entries.is_empty() {
            return Ok("No files in bucket.".to_string());
        }

        let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
        Ok(serde_json::to_string_pretty(&keys)?)
    }

    async fn download_result(
        &self,
        bucket: &str,
        remote_path: &str,
        local_path: &str,
    ) -> Result<String> {
        let written = self
            .platform
            .download_file(bucket, remote_path, Path::new(local_path))
            .await?;
        debug!(bucket = %bucket, key = %remote_path, bytes = written, "result downloaded");
        Ok(format!(
            "Downloaded '{remote_path}' from '{bucket}' to '{local_path}'"
        ))
    }
}

// Progress renders via f64 `Display`: whole values come out without a
// trailing `.0` ("42%"), fractional values keep it ("66.5%").
fn task_summary(task: &qarnot_client::Task) -> Value {
    json!({
        "uuid": task.uuid,
        "name": task.name,
        "state": task.state,
        "progress": format!("{}%", task.progress),
        "instance_count": task.instance_count,
        "running_instances": task.running_instance_count,
        "creation_date": task.creation_date.to_rfc3339(),
        "end_date": end_date_string(task),
    })
}

fn end_date_string(task: &qarnot_client::Task) -> String {
    task.end_date
        .as_ref()
        .map_or_else(|| "N/A".to_string(), |d| d.to_rfc3339())
}

fn ssh_forwards(task: &qarnot_client::Task) -> Vec<Value> {
    let Some(info) = task
        .status
        .as_ref()
        .and_then(|s| s.running_instances_info.as_ref())
    else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for instance in &info.per_running_instance_info {
        for fwd in &instance.active_forwards {
            out.push(json!({
                "instance_id": instance.instance_id,
                "app_port": fwd.application_port,
                "host": fwd.forwarder_host,
                "port": fwd.forwarder_port,
                "ssh_command": (fwd.application_port == 22)
                    .then(|| format!("ssh -p {} user@{}", fwd.forwarder_port, fwd.forwarder_host)),
            }));
        }
    }
    out
}

fn object_schema(properties: Value, required: &[&str]) -> Arc<JsonObject> {
    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    Arc::new(schema.as_object().cloned().unwrap_or_else(JsonObject::new))
}

fn read_tool(name: &str, description: &str, schema: Arc<JsonObject>) -> Tool {
    let mut tool = Tool::new(name.to_string(), description.to_string(), schema);
    tool.annotations = Some(ToolAnnotations {
        title: None,
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(true),
    });
    tool
}

/// Remote read with a local filesystem write: not a read-only tool, but
/// nothing remote is mutated and re-running it lands the same bytes.
fn write_tool(name: &str, description: &str, schema: Arc<JsonObject>) -> Tool {
    let mut tool = Tool::new(name.to_string(), description.to_string(), schema);
    tool.annotations = Some(ToolAnnotations {
        title: None,
        read_only_hint: Some(false),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(true),
    });
    tool
}

fn mutating_tool(name: &str, description: &str, schema: Arc<JsonObject>) -> Tool {
    let mut tool = Tool::new(name.to_string(), description.to_string(), schema);
    tool.annotations = Some(ToolAnnotations {
        title: None,
        read_only_hint: Some(false),
        destructive_hint: Some(true),
        // Aborting an already-aborting task is a no-op on the platform.
        idempotent_hint: Some(true),
        open_world_hint: Some(true),
    });
    tool
}

fn required_str<'a>(arguments: &'a Value, name: &str) -> Result<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::InvalidParams(format!("Missing required parameter: {name}")))
}

fn optional_u32(arguments: &Value, name: &str) -> Result<Option<u32>> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                GatewayError::InvalidParams(format!(
                    "Parameter '{name}' must be a non-negative integer"
                ))
            }),
    }
}
