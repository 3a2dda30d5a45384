//! Turn controller.
//!
//! A `ChatSession` owns one conversation. Each incoming message is
//! classified, then answered through a bounded loop of model calls in which
//! the model may invoke backend functions.

use crate::{
    backend::{AudioClip, AudioFormat, LanguageBackend},
    cache::{FunctionCallCache, canonical_arguments},
    classifier::{Classification, TurnClassifier},
    dispatch::{DispatchOutcome, Dispatcher},
    error::{LlmError, TurnError},
    llm_client::{ChatRequest, FunctionCall, FunctionChoice, LLMAction, LLMClient},
    message::Message,
    output::OutputSink,
    prompts,
    registry::FunctionRegistry,
    state::ConversationState,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_MODEL_CALLS: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Calls the model, giving up after `limit`.
pub(crate) async fn call_model(
    llm: &dyn LLMClient,
    request: &ChatRequest,
    limit: Duration,
) -> Result<LLMAction, TurnError> {
    match tokio::time::timeout(limit, llm.decide_action(request)).await {
        Ok(Ok(action)) => Ok(action),
        Ok(Err(LlmError::Timeout)) | Err(_) => Err(TurnError::UpstreamTimeout),
        Ok(Err(e)) => Err(e.into()),
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub request_timeout: Duration,
    /// Upper bound on model calls in one turn's function loop.
    pub max_model_calls: usize,
    /// Instruction used while the learner has not set one.
    pub default_instruction: String,
    pub audio_format: AudioFormat,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_model_calls: DEFAULT_MAX_MODEL_CALLS,
            default_instruction: prompts::DEFAULT_INSTRUCTIONS.to_string(),
            audio_format: AudioFormat::default(),
        }
    }
}

/// Shared, immutable dependencies of every session.
#[derive(Clone)]
pub struct ChatServices {
    pub llm: Arc<dyn LLMClient>,
    pub backend: Arc<dyn LanguageBackend>,
    pub registry: Arc<FunctionRegistry>,
    pub settings: SessionSettings,
}

pub struct ChatSession {
    services: ChatServices,
    classifier: TurnClassifier,
    dispatcher: Dispatcher,
    sink: Arc<dyn OutputSink>,
    state: ConversationState,
    last_request: Option<ChatRequest>,
}

impl ChatSession {
    pub fn new(services: ChatServices, sink: Arc<dyn OutputSink>) -> Self {
        let classifier =
            TurnClassifier::new(services.llm.clone(), services.settings.request_timeout);
        let dispatcher = Dispatcher::new(services.backend.clone(), services.settings.audio_format);
        Self {
            services,
            classifier,
            dispatcher,
            sink,
            state: ConversationState::new(),
            last_request: None,
        }
    }

    /// The instruction applied to the next turn.
    pub fn instruction(&self) -> &str {
        self.state
            .standing_instruction
            .as_deref()
            .unwrap_or(self.services.settings.default_instruction.as_str())
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// The prompt sent on the most recent model call of the function loop.
    pub fn last_request(&self) -> Option<&ChatRequest> {
        self.last_request.as_ref()
    }

    /// Replaces the standing instruction and confirms it to the user.
    pub async fn set_instruction(&mut self, instruction: &str) {
        info!(%instruction, "Setting standing instruction");
        self.state.standing_instruction = Some(instruction.to_string());
        self.sink
            .send_status(format!("My instructions are now: {instruction}"))
            .await;
    }

    /// Processes one incoming message. Errors abort the turn and are
    /// reported once through the status channel.
    pub async fn process_message(&mut self, text: &str) {
        if let Err(e) = self.run_turn(text).await {
            error!(error = %e, input = %text, "Turn aborted");
            self.sink.send_status(format!("error: {e}")).await;
        }
    }

    /// Transcribes `clip` and processes the transcript as a message.
    pub async fn process_audio(&mut self, clip: AudioClip) {
        match self.services.backend.recognize_audio(clip).await {
            Ok(text) => {
                info!(%text, "Recognized speech");
                self.sink
                    .send_status(format!("recognized text: {text}"))
                    .await;
                self.process_message(&text).await;
            }
            Err(e) => {
                let e = TurnError::from(e);
                error!(error = %e, "Speech recognition failed");
                self.sink.send_status(format!("error: {e}")).await;
            }
        }
    }

    async fn run_turn(&mut self, text: &str) -> Result<(), TurnError> {
        let classification = self
            .classifier
            .classify(self.state.last_topic_sentence.as_deref(), text)
            .await?;

        match classification {
            Classification::NewTopic => self.state.start_topic(text),
            Classification::FollowUp => {}
            Classification::Instruction(instruction) => {
                self.set_instruction(&instruction).await;
                return Ok(());
            }
        }
        self.state.push(Message::user(text));

        let mut cache = FunctionCallCache::new();
        let mut has_shown_user_output = false;
        let max_calls = self.services.settings.max_model_calls;

        for call_index in 0..max_calls {
            let request = self.build_request();
            self.last_request = Some(request.clone());
            let action = call_model(
                self.services.llm.as_ref(),
                &request,
                self.services.settings.request_timeout,
            )
            .await?;

            match action {
                LLMAction::FunctionCall { call, content } => {
                    debug!(call_index, function = %call.name, arguments = %call.arguments, "Model requested function call");
                    let outcome = self.run_function(&call, &mut cache).await?;
                    has_shown_user_output |= outcome.notified_user;
                    self.state.push(Message::function(call.name, outcome.result));
                    if let Some(content) = content.filter(|c| !c.trim().is_empty()) {
                        self.state.push(Message::assistant(content));
                    }
                }
                LLMAction::TextResponse(reply) => {
                    debug!(call_index, "Model answered without a function call");
                    if reply.trim().is_empty() {
                        return Ok(());
                    }
                    if !has_shown_user_output {
                        self.sink.send_text(reply.clone()).await;
                    }
                    self.state.push(Message::assistant(reply));
                    return Ok(());
                }
            }
        }

        warn!(max_calls, "Function loop reached its call limit");
        Ok(())
    }

    /// Runs one function call, replaying the result if the same call was
    /// already made this turn.
    async fn run_function(
        &self,
        call: &FunctionCall,
        cache: &mut FunctionCallCache,
    ) -> Result<DispatchOutcome, TurnError> {
        let arguments: JsonValue = match serde_json::from_str(&call.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(function = %call.name, arguments = %call.arguments, error = %e, "Could not parse function arguments");
                return Ok(DispatchOutcome::model_only(format!(
                    "could not parse arguments for {}: {e}",
                    call.name
                )));
            }
        };

        let key = canonical_arguments(&arguments);
        if let Some(cached) = cache.get(&call.name, &key) {
            info!(function = %call.name, arguments = %key, "Replaying cached function result");
            return Ok(cached.clone());
        }

        let outcome = self
            .dispatcher
            .dispatch(&call.name, &arguments, self.sink.as_ref())
            .await?;
        cache.insert(&call.name, key, outcome.clone());
        Ok(outcome)
    }

    fn build_request(&self) -> ChatRequest {
        let mut messages = Vec::with_capacity(self.state.history.len() + 2);
        messages.push(Message::system(prompts::SYSTEM_MSG_ASSISTANT));
        messages.push(Message::system(self.instruction()));
        messages.extend(self.state.history.iter().cloned());

        ChatRequest {
            messages,
            functions: self.services.registry.descriptors().to_vec(),
            function_choice: FunctionChoice::Auto,
            temperature: 0.0,
        }
    }
}
