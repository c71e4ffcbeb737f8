use thiserror::Error;

use crate::data::{parse_json_input, report_to_json, DeliveryInput};
use crate::dispatch::{DispatchError, UniformDelay};

#[derive(Debug, Error)]
pub enum DispatchRequestError {
    #[error("invalid dispatch request: {0}")]
    Parse(serde_json::Error),
    #[error("invalid seed '{0}'")]
    Seed(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("failed to serialize report: {0}")]
    Serialize(serde_json::Error),
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "delivery-dispatch-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// `seed=N` from the query string, if present.
fn parse_seed(path: &str) -> Result<Option<u64>, DispatchRequestError> {
    let query = path.split_once('?').map(|(_, query)| query).unwrap_or("");
    for pair in query.split('&') {
        if let Some(value) = pair.trim().strip_prefix("seed=") {
            return value
                .parse::<u64>()
                .map(Some)
                .map_err(|_| DispatchRequestError::Seed(value.to_string()));
        }
    }
    Ok(None)
}

/// Runs one dispatch pass over the JSON request body and returns the report JSON.
pub fn dispatch_payload(path: &str, body: &str) -> Result<String, DispatchRequestError> {
    let seed = parse_seed(path)?;
    let input: DeliveryInput = parse_json_input(body).map_err(DispatchRequestError::Parse)?;
    let delay = seed
        .map(UniformDelay::from_seed)
        .unwrap_or_else(UniformDelay::from_entropy);
    let report = input.dispatch(delay)?;
    report_to_json(&report).map_err(DispatchRequestError::Serialize)
}
