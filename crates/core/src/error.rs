//! Error types for the core crate.
//!
//! - `LlmError`: failures talking to the chat-completion endpoint
//! - `BackendError`: failures from the language backend
//! - `TurnError`: anything that aborts a turn
//! - `RegistryError`: invalid function registry at startup

use thiserror::Error;

/// Errors from the LLM client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("LLM request timed out")]
    Timeout,
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("invalid LLM response: {0}")]
    InvalidResponse(String),
    #[error("LLM response had neither text content nor a function call")]
    EmptyResponse,
}

/// Errors from the language backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend has no matching data (e.g. no dictionary entry). Recovered
    /// by the dispatcher and shown as ordinary text.
    #[error("{0}")]
    NoDataFound(String),
    #[error("language backend request failed: {0}")]
    RequestFailed(String),
    #[error("invalid language backend response: {0}")]
    InvalidResponse(String),
}

/// Errors that abort a single turn. The session reports them once through
/// the status channel.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("the language model did not answer in time")]
    UpstreamTimeout,
    #[error("malformed model response: {0}")]
    MalformedModelResponse(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors raised while building the function registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate function name: {0}")]
    DuplicateName(String),
    #[error("function name must not be empty")]
    EmptyName,
    #[error("function '{0}' has an empty description")]
    EmptyDescription(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_found_displays_backend_message_verbatim() {
        let err = BackendError::NoDataFound("no dictionary entry found".to_string());
        assert_eq!(err.to_string(), "no dictionary entry found");
    }

    #[test]
    fn turn_error_wraps_llm_error_transparently() {
        let err: TurnError = LlmError::RequestFailed("connection reset".to_string()).into();
        assert_eq!(err.to_string(), "LLM request failed: connection reset");
    }

    #[test]
    fn registry_error_names_the_function() {
        let err = RegistryError::EmptyDescription("breakdown".to_string());
        assert!(err.to_string().contains("breakdown"));
    }
}
