//! Port for the Krea HTTP API: submit work, query jobs, fetch results.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::KreaError;

/// One generation or enhance call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    /// API path, e.g. `/generate/image/google/nano-banana`.
    pub endpoint: String,
    /// JSON body.
    pub payload: serde_json::Value,
}

/// The two shapes a submit call can answer with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Submission {
    /// The result was ready in the response itself.
    Immediate {
        /// Result image URLs.
        urls: Vec<String>,
    },
    /// The work was queued and must be polled.
    Job(JobHandle),
}

/// Handle to a queued remote job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobHandle {
    /// Opaque job identifier.
    pub job_id: String,
}

/// Lifecycle of a remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not started.
    Pending,
    /// In progress.
    Running,
    /// Finished with results.
    Succeeded,
    /// Finished without results.
    Failed,
}

impl JobStatus {
    /// Map a status string reported by the API.
    #[must_use]
    pub fn from_remote(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "completed" | "succeeded" => Self::Succeeded,
            "failed" | "cancelled" | "canceled" => Self::Failed,
            "queued" | "pending" | "scheduled" | "backlogged" => Self::Pending,
            _ => Self::Running,
        }
    }
}

/// A snapshot of a remote job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier.
    pub id: String,
    /// Current status.
    pub status: JobStatus,
    /// Result image URLs, once succeeded.
    #[serde(default)]
    pub result_urls: Vec<String>,
    /// Failure reason, once failed.
    #[serde(default)]
    pub error: Option<String>,
}

/// Downloaded result bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Download {
    /// Raw image bytes.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// `Content-Type` header, if sent.
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Boxed future type returned by [`KreaApi`] methods.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, KreaError>> + Send + 'a>>;

/// Talks to the Krea API.
pub trait KreaApi: Send + Sync {
    /// Submit a generation or enhance request.
    fn submit(&self, request: &SubmitRequest) -> ApiFuture<'_, Submission>;

    /// Fetch the current state of a job.
    fn job(&self, job_id: &str) -> ApiFuture<'_, Job>;

    /// Download a result image.
    fn download(&self, url: &str) -> ApiFuture<'_, Download>;
}

/// Serde helper for serializing `Vec<u8>` as base64 strings in cassettes.
mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize bytes as base64 string.
    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        serializer.serialize_str(&encoded)
    }

    /// Deserialize base64 string to bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
