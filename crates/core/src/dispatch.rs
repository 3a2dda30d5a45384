//! Dispatch adapter.
//!
//! Maps a function call from the model onto a backend operation, sends the
//! result to the user where appropriate and returns the text the model gets
//! to see as the function's output.

use crate::{
    backend::{
        AudioFormat, AudioQuery, BreakdownQuery, LanguageBackend, TranslateLookupQuery,
        TransliterateQuery,
    },
    error::BackendError,
    output::OutputSink,
    registry::LanguageFunction,
};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one dispatched function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Text fed back to the model as the function's output.
    pub result: String,
    /// Whether something was sent to the user while dispatching.
    pub notified_user: bool,
}

impl DispatchOutcome {
    pub fn shown(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            notified_user: true,
        }
    }

    pub fn model_only(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            notified_user: false,
        }
    }
}

enum Parsed<T> {
    Query(T),
    Invalid(DispatchOutcome),
}

fn parse_query<T: DeserializeOwned>(function: LanguageFunction, arguments: &JsonValue) -> Parsed<T> {
    match serde_json::from_value(arguments.clone()) {
        Ok(query) => Parsed::Query(query),
        Err(e) => {
            warn!(function = function.name(), error = %e, "Function arguments do not match schema");
            Parsed::Invalid(DispatchOutcome::model_only(format!(
                "invalid arguments for {}: {e}",
                function.name()
            )))
        }
    }
}

pub struct Dispatcher {
    backend: Arc<dyn LanguageBackend>,
    audio_format: AudioFormat,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn LanguageBackend>, audio_format: AudioFormat) -> Self {
        Self {
            backend,
            audio_format,
        }
    }

    /// Executes `function_name` with `arguments`.
    ///
    /// Unknown functions and arguments that do not fit the function's schema
    /// produce a diagnostic for the model only. `NoDataFound` from the
    /// backend becomes the result text. Any other backend failure is
    /// returned as an error and aborts the turn.
    pub async fn dispatch(
        &self,
        function_name: &str,
        arguments: &JsonValue,
        sink: &dyn OutputSink,
    ) -> Result<DispatchOutcome, BackendError> {
        let Some(function) = LanguageFunction::from_name(function_name) else {
            warn!(function = function_name, "Model requested an unknown function");
            return Ok(DispatchOutcome::model_only(format!(
                "unknown function: {function_name}"
            )));
        };

        let text = match function {
            LanguageFunction::Pronounce => return self.pronounce(arguments, sink).await,
            LanguageFunction::TranslateOrLookup => {
                match parse_query::<TranslateLookupQuery>(function, arguments) {
                    Parsed::Query(q) => self.backend.translate_or_lookup(q).await,
                    Parsed::Invalid(outcome) => return Ok(outcome),
                }
            }
            LanguageFunction::Transliterate => {
                match parse_query::<TransliterateQuery>(function, arguments) {
                    Parsed::Query(q) => self.backend.transliterate(q).await,
                    Parsed::Invalid(outcome) => return Ok(outcome),
                }
            }
            LanguageFunction::Breakdown => match parse_query::<BreakdownQuery>(function, arguments) {
                Parsed::Query(q) => self.backend.breakdown(q).await,
                Parsed::Invalid(outcome) => return Ok(outcome),
            },
        };

        let result = match text {
            Ok(text) => text,
            Err(BackendError::NoDataFound(message)) => message,
            Err(e) => return Err(e),
        };
        info!(function = function.name(), %result, "Function call result");
        sink.send_text(result.clone()).await;
        Ok(DispatchOutcome::shown(result))
    }

    async fn pronounce(
        &self,
        arguments: &JsonValue,
        sink: &dyn OutputSink,
    ) -> Result<DispatchOutcome, BackendError> {
        let query = match parse_query::<AudioQuery>(LanguageFunction::Pronounce, arguments) {
            Parsed::Query(q) => q,
            Parsed::Invalid(outcome) => return Ok(outcome),
        };
        let input_text = query.input_text.clone();
        match self.backend.pronounce(query, self.audio_format).await {
            Ok(clip) => {
                info!(input_text = %input_text, bytes = clip.data.len(), "Sending pronunciation audio");
                sink.send_audio(clip).await;
                Ok(DispatchOutcome::shown(input_text))
            }
            Err(BackendError::NoDataFound(message)) => {
                sink.send_text(message.clone()).await;
                Ok(DispatchOutcome::shown(message))
            }
            Err(e) => Err(e),
        }
    }
}
