//! Recording adapter for the `KreaApi` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::krea_api::{ApiFuture, Download, Job, KreaApi, Submission, SubmitRequest};

const PORT: &str = "krea_api";

/// Records API interactions while delegating to an inner implementation.
pub struct RecordingKreaApi {
    inner: Box<dyn KreaApi>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingKreaApi {
    /// Creates a new recording client wrapping the given implementation.
    pub fn new(inner: Box<dyn KreaApi>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl KreaApi for RecordingKreaApi {
    fn submit(&self, request: &SubmitRequest) -> ApiFuture<'_, Submission> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.submit(&request).await;
            record_result(&self.recorder, PORT, "submit", &request, &result);
            result
        })
    }

    fn job(&self, job_id: &str) -> ApiFuture<'_, Job> {
        let job_id = job_id.to_string();
        Box::pin(async move {
            let result = self.inner.job(&job_id).await;
            record_result(&self.recorder, PORT, "job", &job_id, &result);
            result
        })
    }

    fn download(&self, url: &str) -> ApiFuture<'_, Download> {
        let url = url.to_string();
        Box::pin(async move {
            let result = self.inner.download(&url).await;
            record_result(&self.recorder, PORT, "download", &url, &result);
            result
        })
    }
}
