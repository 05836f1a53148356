//! Minimal async client for the Qarnot compute REST API.
//!
//! Covers the small slice of the platform API that the MCP gateway needs:
//! task enumeration/retrieval/abort, per-task stdout/stderr capture, and
//! bucket listing/download. Everything else the platform offers is out of
//! scope here.

pub mod connection;
pub mod error;
pub mod model;

pub use connection::{Connection, DEFAULT_API_URL};
pub use error::{ClientError, Result};
pub use model::{
    ActiveForward, Bucket, ObjectEntry, RunningInstanceInfo, RunningInstancesInfo, Task,
    TaskState, TaskStatus,
};
