use thiserror::Error;

/// Problems with the request itself; raised before any stats are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("selection_method must be one of [category, langlinks, file], but is {0}.")]
    InvalidSelectionMethod(String),
    #[error("selection must be a non-empty string.")]
    EmptySelection,
    #[error("No cases found.")]
    NoCases,
    #[error("input column '{column}' not found in {file}")]
    MissingColumn { column: String, file: String },
}

/// Failures reported by an upstream service. Fatal for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Error: {status} {reason} ({url})")]
    Status {
        status: u16,
        reason: String,
        url: String,
    },
    #[error("MediaWiki API error on {site}: {code}: {info}")]
    Api {
        site: String,
        code: String,
        info: String,
    },
}

impl FetchError {
    pub fn from_status(status: reqwest::StatusCode, url: &str) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            url: url.to_string(),
        }
    }
}

pub fn is_validation_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<ValidationError>().is_some()
}
