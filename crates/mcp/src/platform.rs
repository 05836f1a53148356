//! Seam between the tool layer and the remote platform.
//!
//! The trait mirrors the minimal collaborator surface the tools need.
//! Production code uses `qarnot_client::Connection`; tests substitute a
//! fake implementation.

use crate::error::Result;
use async_trait::async_trait;
use qarnot_client::{Bucket, Connection, ObjectEntry, Task};
use std::path::Path;

#[async_trait]
pub trait ComputePlatform: Send + Sync {
    /// Fetch all tasks visible to the credential.
    async fn tasks(&self) -> Result<Vec<Task>>;

    /// Fetch a fresh snapshot of one task by UUID.
    async fn task(&self, uuid: &str) -> Result<Task>;

    /// Request an abort of a task.
    async fn abort_task(&self, uuid: &str) -> Result<()>;

    /// Read captured stdout, optionally scoped to one instance.
    async fn task_stdout(&self, uuid: &str, instance: Option<u32>) -> Result<String>;

    /// Read captured stderr, optionally scoped to one instance.
    async fn task_stderr(&self, uuid: &str, instance: Option<u32>) -> Result<String>;

    /// Fetch all buckets.
    async fn buckets(&self) -> Result<Vec<Bucket>>;

    /// List the objects stored in a bucket.
    async fn bucket_files(&self, bucket: &str) -> Result<Vec<ObjectEntry>>;

    /// Stream one object to a local file, returning the bytes written.
    async fn download_file(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64>;
}

#[async_trait]
impl ComputePlatform for Connection {
    async fn tasks(&self) -> Result<Vec<Task>> {
        Ok(Connection::tasks(self).await?)
    }

    async fn task(&self, uuid: &str) -> Result<Task> {
        Ok(Connection::task(self, uuid).await?)
    }

    async fn abort_task(&self, uuid: &str) -> Result<()> {
        Ok(Connection::abort_task(self, uuid).await?)
    }

    async fn task_stdout(&self, uuid: &str, instance: Option<u32>) -> Result<String> {
        Ok(Connection::task_stdout(self, uuid, instance).await?)
    }

    async fn task_stderr(&self, uuid: &str, instance: Option<u32>) -> Result<String> {
        Ok(Connection::task_stderr(self, uuid, instance).await?)
    }

    async fn buckets(&self) -> Result<Vec<Bucket>> {
        Ok(Connection::buckets(self).await?)
    }

    async fn bucket_files(&self, bucket: &str) -> Result<Vec<ObjectEntry>> {
        Ok(Connection::bucket_files(self, bucket).await?)
    }

    async fn download_file(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        Ok(Connection::download_file(self, bucket, key, dest).await?)
    }
}
