//! Replaying adapter for the `KreaApi` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::KreaError;
use crate::ports::krea_api::{ApiFuture, Download, Job, KreaApi, Submission, SubmitRequest};

const PORT: &str = "krea_api";

/// Serves recorded API results from a cassette.
pub struct ReplayingKreaApi {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingKreaApi {
    /// Create a replaying client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }

    fn replay<T: serde::de::DeserializeOwned>(&self, method: &str) -> Result<T, KreaError> {
        let output = next_output(&self.replayer, PORT, method)?;
        replay_result::<T>(output).map_err(|message| replayed_error(&message))
    }
}

/// Rebuild an error from its recorded message so it keeps its class.
///
/// Network errors come back as transient failures since a `reqwest::Error`
/// cannot be recreated; both are retried.
fn replayed_error(message: &str) -> KreaError {
    if let Some(rest) = message.strip_prefix("Transient failure: ") {
        return KreaError::Transient(rest.to_string());
    }
    if let Some(rest) = message.strip_prefix("Network error: ") {
        return KreaError::Transient(rest.to_string());
    }
    if let Some(rest) = message.strip_prefix("Authentication failed: ") {
        return KreaError::Auth(rest.to_string());
    }
    if let Some(rest) = message.strip_prefix("Insufficient credits: ") {
        return KreaError::Quota(rest.to_string());
    }
    if let Some(rest) = message.strip_prefix("Request rejected: ") {
        let reason = rest.strip_suffix(". Rephrase the prompt or adjust the parameters.").unwrap_or(rest);
        return KreaError::Validation(reason.to_string());
    }
    if let Some((status, rest)) = message
        .strip_prefix("API error (")
        .and_then(|rest| rest.split_once("): "))
        .and_then(|(status, rest)| Some((status.parse::<u16>().ok()?, rest)))
    {
        return KreaError::Api { status, message: rest.to_string() };
    }
    KreaError::Api { status: 0, message: message.to_string() }
}

impl KreaApi for ReplayingKreaApi {
    fn submit(&self, _request: &SubmitRequest) -> ApiFuture<'_, Submission> {
        let result = self.replay("submit");
        Box::pin(async move { result })
    }

    fn job(&self, _job_id: &str) -> ApiFuture<'_, Job> {
        let result = self.replay("job");
        Box::pin(async move { result })
    }

    fn download(&self, _url: &str) -> ApiFuture<'_, Download> {
        let result = self.replay("download");
        Box::pin(async move { result })
    }
}
