//! HTTP connection to the Qarnot REST API.
//!
//! One `Connection` holds a single authenticated `reqwest::Client` and is
//! safe to share; the platform requires no session handshake, only the
//! static token sent as an `Authorization` header on every request.

use crate::error::{ClientError, Result};
use crate::model::{Bucket, ObjectEntry, Task};
use futures::StreamExt as _;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::path::Path;
use tokio::io::AsyncWriteExt as _;
use tracing::debug;
use url::Url;

/// Public endpoint of the Qarnot compute REST API.
pub const DEFAULT_API_URL: &str = "https://api.qarnot.com/v1";

#[derive(Clone)]
pub struct Connection {
    http: Client,
    base_url: Url,
}

impl Connection {
    /// Build a connection against the public API endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Build a connection against an explicit API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or token is invalid, or the HTTP
    /// client cannot be built.
    pub fn with_base_url(token: &str, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("Invalid API base URL '{base_url}': {e}")))?;

        let mut auth = HeaderValue::from_str(token).map_err(|_| {
            ClientError::Config("API token contains characters not usable in a header".to_string())
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(concat!("qarnot-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, base_url })
    }

    /// List all tasks visible to the credential.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn tasks(&self) -> Result<Vec<Task>> {
        let url = self.endpoint(&["tasks"])?;
        let resp = check(self.http.get(url).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Fetch one task by UUID. Always hits the API; nothing is cached
    /// locally, so the returned snapshot is current.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 when the task does not
    /// exist, and propagates transport failures.
    pub async fn task(&self, uuid: &str) -> Result<Task> {
        let url = self.endpoint(&["tasks", uuid])?;
        let resp = check(self.http.get(url).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Request an abort of a task. The platform decides whether the
    /// transition is legal; this call does not pre-check state.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn abort_task(&self, uuid: &str) -> Result<()> {
        let url = self.endpoint(&["tasks", uuid, "abort"])?;
        check(self.http.post(url).send().await?).await?;
        Ok(())
    }

    /// Read the captured stdout of a task, optionally scoped to one
    /// instance.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn task_stdout(&self, uuid: &str, instance: Option<u32>) -> Result<String> {
        self.task_output(uuid, "stdout", instance).await
    }

    /// Read the captured stderr of a task, optionally scoped to one
    /// instance.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn task_stderr(&self, uuid: &str, instance: Option<u32>) -> Result<String> {
        self.task_output(uuid, "stderr", instance).await
    }

    async fn task_output(
        &self,
        uuid: &str,
        channel: &str,
        instance: Option<u32>,
    ) -> Result<String> {
        let url = match instance {
            Some(id) => self.endpoint(&["tasks", uuid, channel, &id.to_string()])?,
            None => self.endpoint(&["tasks", uuid, channel])?,
        };
        let resp = check(self.http.get(url).send().await?).await?;
        Ok(resp.text().await?)
    }

    /// List all buckets in the account.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-2xx response.
    pub async fn buckets(&self) -> Result<Vec<Bucket>> {
        let url = self.endpoint(&["buckets"])?;
        let resp = check(self.http.get(url).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// List the objects stored in a bucket.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` when the bucket does not exist, and
    /// propagates transport failures.
    pub async fn bucket_files(&self, bucket: &str) -> Result<Vec<ObjectEntry>> {
        let url = self.endpoint(&["buckets", bucket, "files"])?;
        let resp = check(self.http.get(url).send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Stream one object from a bucket to a local file, returning the
    /// number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing (non-2xx), the transfer
    /// fails mid-stream, or the destination is not writable.
    pub async fn download_file(&self, bucket: &str, key: &str, dest: &Path) -> Result<u64> {
        let mut url = self.endpoint(&["buckets", bucket, "data"])?;
        url.query_pairs_mut().append_pair("key", key);

        let resp = check(self.http.get(url).send().await?).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = resp.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(ClientError::from)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(bucket = %bucket, key = %key, bytes = written, "downloaded object");
        Ok(written)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Config("API base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The token lives in the client's default headers; never print it.
        f.debug_struct("Connection")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        body,
    })
}
