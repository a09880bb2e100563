//! Live adapter for the Krea HTTP API.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;

use crate::error::KreaError;
use crate::ports::krea_api::{
    ApiFuture, Download, Job, JobHandle, JobStatus, KreaApi, Submission, SubmitRequest,
};

const API_TIMEOUT: Duration = Duration::from_secs(30);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Live client that calls the Krea API with a bearer token.
pub struct KreaClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl KreaClient {
    /// Create a client for `base_url` authenticated with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: String) -> Result<Self, KreaError> {
        let client = Client::builder().timeout(API_TIMEOUT).build()?;
        Ok(Self { client, api_key, base_url })
    }

    async fn json_body(response: Response) -> Result<Value, KreaError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(KreaError::from_status(status.as_u16(), truncate(&text, 500)));
        }
        serde_json::from_str(&text).map_err(|e| KreaError::Api {
            status: status.as_u16(),
            message: format!("Failed to parse response: {e}"),
        })
    }
}

impl KreaApi for KreaClient {
    fn submit(&self, request: &SubmitRequest) -> ApiFuture<'_, Submission> {
        let request = request.clone();
        Box::pin(async move {
            let url = format!("{}{}", self.base_url, request.endpoint);
            tracing::debug!(%url, payload = %request.payload, "submitting request");
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request.payload)
                .send()
                .await?;
            parse_submission(&Self::json_body(response).await?)
        })
    }

    fn job(&self, job_id: &str) -> ApiFuture<'_, Job> {
        let job_id = job_id.to_string();
        Box::pin(async move {
            let url = format!("{}/jobs/{job_id}", self.base_url);
            let response = self.client.get(&url).bearer_auth(&self.api_key).send().await?;
            parse_job(&job_id, &Self::json_body(response).await?)
        })
    }

    fn download(&self, url: &str) -> ApiFuture<'_, Download> {
        let url = url.to_string();
        Box::pin(async move {
            let response = self.client.get(&url).timeout(DOWNLOAD_TIMEOUT).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(KreaError::from_download_status(status.as_u16(), &url, &truncate(&body, 200)));
            }
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let data = response.bytes().await?.to_vec();
            Ok(Download { data, content_type })
        })
    }
}

/// Interpret a submit response as an immediate result or a queued job.
fn parse_submission(body: &Value) -> Result<Submission, KreaError> {
    let urls = result_urls(body);
    let completed = body
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|s| JobStatus::from_remote(s) == JobStatus::Succeeded);

    if !urls.is_empty() && (completed || body.get("job_id").is_none()) {
        return Ok(Submission::Immediate { urls });
    }

    match body.get("job_id").and_then(Value::as_str) {
        Some(job_id) => Ok(Submission::Job(JobHandle { job_id: job_id.to_string() })),
        None => Err(KreaError::Api {
            status: 200,
            message: format!("No job_id in response: {}", truncate(&body.to_string(), 500)),
        }),
    }
}

/// Interpret a job status response.
fn parse_job(job_id: &str, body: &Value) -> Result<Job, KreaError> {
    let status = body.get("status").and_then(Value::as_str).ok_or_else(|| KreaError::Api {
        status: 200,
        message: format!("No status for job {job_id}: {}", truncate(&body.to_string(), 500)),
    })?;
    let status = JobStatus::from_remote(status);

    let error = match status {
        JobStatus::Failed => Some(
            body.get("error")
                .or_else(|| body.pointer("/result/error"))
                .map_or_else(|| truncate(&body.to_string(), 500), |e| match e.as_str() {
                    Some(s) => s.to_string(),
                    None => e.to_string(),
                }),
        ),
        _ => None,
    };

    Ok(Job { id: job_id.to_string(), status, result_urls: result_urls(body), error })
}

fn result_urls(body: &Value) -> Vec<String> {
    body.pointer("/result/urls")
        .and_then(Value::as_array)
        .map(|urls| urls.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
