//! Replaying adapters that serve recorded interactions from cassettes.

pub mod asset_uploader;
pub mod krea_api;

use std::sync::{Arc, Mutex};

use crate::cassette::replayer::CassetteReplayer;
use crate::error::KreaError;

/// Retrieve the next recorded output for a given port and method.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> Result<serde_json::Value, KreaError> {
    let mut guard = replayer
        .lock()
        .map_err(|e| KreaError::Api { status: 0, message: format!("replayer lock poisoned: {e}") })?;
    let interaction = guard.next_interaction(port, method)?;
    tracing::debug!(seq = interaction.seq, remaining = guard.remaining(), "replaying {port}::{method}");
    Ok(interaction.output)
}

/// Deserialize a replayed output as `Result<T, String>`.
///
/// Outputs are `{"Ok": value}` or `{"Err": "message"}`; a bare value is
/// treated as `Ok`.
pub(crate) fn replay_result<T: serde::de::DeserializeOwned>(
    output: serde_json::Value,
) -> Result<T, String> {
    if let Some(err_val) = output.get("Err") {
        return Err(err_val.as_str().unwrap_or("replayed error").to_string());
    }
    let value = match output.get("Ok") {
        Some(ok_val) => ok_val.clone(),
        None => output,
    };
    serde_json::from_value(value).map_err(|e| format!("malformed cassette output: {e}"))
}
