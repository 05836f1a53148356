//! In-memory platform used by unit tests.

use crate::error::{GatewayError, Result};
use crate::platform::ComputePlatform;
use async_trait::async_trait;
use qarnot_client::{
    ActiveForward, Bucket, ClientError, ObjectEntry, RunningInstanceInfo, RunningInstancesInfo,
    Task, TaskState, TaskStatus,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

#[derive(Default)]
pub(crate) struct FakePlatform {
    pub tasks: Vec<Task>,
    pub buckets: Vec<Bucket>,
    /// Bucket name -> listing. A bucket absent here does not exist.
    pub files: HashMap<String, Vec<ObjectEntry>>,
    /// (bucket, key) -> object bytes.
    pub objects: HashMap<(String, String), Vec<u8>>,
    /// (uuid, instance) -> captured output.
    pub stdout: HashMap<(String, Option<u32>), String>,
    pub stderr: HashMap<(String, Option<u32>), String>,
    /// UUIDs abort was requested for, in call order.
    pub aborted: Mutex<Vec<String>>,
}

pub(crate) fn task(uuid: &str, state: TaskState) -> Task {
    Task {
        uuid: uuid.to_string(),
        name: format!("task-{uuid}"),
        state,
        progress: 42.0,
        instance_count: 2,
        running_instance_count: 1,
        running_core_count: 8,
        execution_time: Some("0:10:00".to_string()),
        wall_time: Some("0:05:00".to_string()),
        creation_date: "2026-08-20T09:30:00Z".parse().expect("date"),
        end_date: None,
        status: None,
    }
}

/// Attach one active forward to the task's per-instance status info.
pub(crate) fn with_forward(
    mut task: Task,
    instance_id: u32,
    application_port: u16,
    forwarder_host: &str,
    forwarder_port: u16,
) -> Task {
    let forward = ActiveForward {
        application_port,
        forwarder_host: forwarder_host.to_string(),
        forwarder_port,
    };

    let status = task.status.get_or_insert_with(TaskStatus::default);
    let info = status
        .running_instances_info
        .get_or_insert_with(RunningInstancesInfo::default);

    if let Some(instance) = info
        .per_running_instance_info
        .iter_mut()
        .find(|i| i.instance_id == instance_id)
    {
        instance.active_forwards.push(forward);
    } else {
        info.per_running_instance_info.push(RunningInstanceInfo {
            instance_id,
            active_forwards: vec![forward],
        });
    }

    task
}

fn not_found(what: &str) -> GatewayError {
    GatewayError::Platform(ClientError::Api {
        status: 404,
        body: format!("{what} not found"),
    })
}

#[async_trait]
impl ComputePlatform for FakePlatform {
    async fn tasks(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    async fn task(&self, uuid: &str) -> Result<Task> {
        self.tasks
            .iter()
            .find(|t| t.uuid == uuid)
            .cloned()
            .ok_or_else(|| not_found("task"))
    }

    async fn abort_task(&self, uuid: &str) -> Result<()> {
        self.aborted.lock().expect("lock").push(uuid.to_string());
        Ok(())
    }

    async fn task_stdout(&self, uuid: &str, instance: Option<u32>) -> Result<String> {
        Ok(self
            .stdout
            .get(&(uuid.to_string(), instance))
            .cloned()
            .unwrap_or_default())
    }

    async fn task_stderr(&self, uuid: &str, instance: Option<u32>) -> Result<String> {
        Ok(self
            .stderr
            .get(&(uuid.to_string(), instance))
            .cloned()
            .unwrap_or_default())
    }

    async fn buckets(&self) -> Result<Vec<Bucket>> {
        Ok(self.buckets.clone())
    }

    async fn bucket_files(&self, bucket: &str) -> Result<Vec<ObjectEntry>> {
        self.files
            .get(bucket)
            .cloned()
            .ok_or_else(|| not_found("bucket"))
    }

    async fn download_file(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        let bytes = self
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .ok_or_else(|| not_found("object"))?;
        std::fs::write(dest, bytes)?;
        Ok(bytes.len() as u64)
    }
}
