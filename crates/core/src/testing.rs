//! Test doubles shared by the unit tests.

use crate::{
    backend::AudioClip,
    error::LlmError,
    llm_client::{ChatRequest, FunctionCall, LLMAction, LLMClient},
    output::OutputSink,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Text(String),
    Audio(AudioClip),
    Status(String),
}

/// Records everything a session sends to its host.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn audio_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Audio(_)))
            .count()
    }
}

#[async_trait]
impl OutputSink for RecordingSink {
    async fn send_text(&self, text: String) {
        self.events.lock().unwrap().push(SinkEvent::Text(text));
    }

    async fn send_audio(&self, clip: AudioClip) {
        self.events.lock().unwrap().push(SinkEvent::Audio(clip));
    }

    async fn send_status(&self, status: String) {
        self.events.lock().unwrap().push(SinkEvent::Status(status));
    }
}

/// LLM client that replays queued actions and records every request.
///
/// Once the queue is empty it answers with `fallback` if one is set, and
/// with a request error otherwise.
#[derive(Default)]
pub struct ScriptedLlm {
    actions: Mutex<VecDeque<Result<LLMAction, LlmError>>>,
    fallback: Option<LLMAction>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every call with `action`, forever.
    pub fn always(action: LLMAction) -> Self {
        Self {
            fallback: Some(action),
            ..Self::default()
        }
    }

    pub fn then(self, action: LLMAction) -> Self {
        self.actions.lock().unwrap().push_back(Ok(action));
        self
    }

    pub fn then_error(self, error: LlmError) -> Self {
        self.actions.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLMClient for ScriptedLlm {
    async fn decide_action(&self, request: &ChatRequest) -> Result<LLMAction, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.actions.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| LlmError::RequestFailed("no scripted response queued".to_string())),
        }
    }
}

/// The classifier's forced function call.
pub fn classification(input_type: &str, instructions: Option<&str>) -> LLMAction {
    let arguments = match instructions {
        Some(text) => serde_json::json!({ "input_type": input_type, "instructions": text }),
        None => serde_json::json!({ "input_type": input_type }),
    };
    function_call("category_input_type", &arguments.to_string())
}

pub fn function_call(name: &str, arguments: &str) -> LLMAction {
    LLMAction::FunctionCall {
        call: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
        content: None,
    }
}

pub fn text(content: &str) -> LLMAction {
    LLMAction::TextResponse(content.to_string())
}
