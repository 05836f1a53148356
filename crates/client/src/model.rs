//! Typed views over the platform's remote objects.
//!
//! These are read-only snapshots of server-side state; nothing here is
//! created or mutated locally. Conditionally-present fields (per-instance
//! status, forwards, end date) are modeled as `Option`/defaulted
//! collections rather than probed dynamically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a remote task.
///
/// The platform owns all transitions; this client only reads the state and
/// (via abort) requests a single transition to `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Running,
    Success,
    Failure,
    Cancelled,
}

impl TaskState {
    /// Terminal states can no longer be cancelled.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Cancelled)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// A remote unit of compute work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub uuid: String,
    pub name: String,
    pub state: TaskState,
    /// Completion percentage (0.0–100.0).
    #[serde(default)]
    pub progress: f64,
    pub instance_count: u32,
    #[serde(default)]
    pub running_instance_count: u32,
    #[serde(default)]
    pub running_core_count: u32,
    /// Accumulated core execution time, as reported by the platform.
    #[serde(default)]
    pub execution_time: Option<String>,
    /// Wall-clock time since dispatch, as reported by the platform.
    #[serde(default)]
    pub wall_time: Option<String>,
    pub creation_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Detailed status; only populated while the task has dispatched
    /// instances.
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    #[serde(default)]
    pub running_instances_info: Option<RunningInstancesInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningInstancesInfo {
    #[serde(default)]
    pub per_running_instance_info: Vec<RunningInstanceInfo>,
}

/// Execution details for one running instance of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningInstanceInfo {
    pub instance_id: u32,
    #[serde(default)]
    pub active_forwards: Vec<ActiveForward>,
}

/// A port-forwarding descriptor exposing an instance's network port
/// through a public forwarder host/port pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveForward {
    pub application_port: u16,
    pub forwarder_host: String,
    pub forwarder_port: u16,
}

/// An object-storage container.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
}

/// One stored object within a bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectEntry {
    pub key: String,
    #[serde(default)]
    pub size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskState};

    #[test]
    fn terminal_states_are_exactly_success_failure_cancelled() {
        assert!(TaskState::Success.is_terminal());
        assert!(TaskState::Failure.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }

    #[test]
    fn task_deserializes_with_optional_fields_absent() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "uuid": "11111111-2222-3333-4444-555555555555",
            "name": "fluid-sim",
            "state": "Pending",
            "instanceCount": 4,
            "creationDate": "2026-08-20T09:30:00Z"
        }))
        .expect("task json");

        assert_eq!(task.state, TaskState::Pending);
        assert_eq!(task.running_instance_count, 0);
        assert!(task.end_date.is_none());
        assert!(task.status.is_none());
        assert!(task.execution_time.is_none());
    }

    #[test]
    fn task_state_display_matches_wire_form() {
        let s = serde_json::to_value(TaskState::Cancelled).expect("state json");
        assert_eq!(s, serde_json::json!("Cancelled"));
        assert_eq!(TaskState::Cancelled.to_string(), "Cancelled");
    }
}
