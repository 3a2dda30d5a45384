use crate::{error::LlmError, message::Message, registry::FunctionDescriptor};
use async_openai::{
    Client,
    config::{Config, OpenAIConfig},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::debug;

/// How the model is allowed to pick a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionChoice {
    /// The model decides whether to call a function.
    Auto,
    /// The model must answer by calling the named function.
    Named(String),
}

/// A single chat-completion request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub functions: Vec<FunctionDescriptor>,
    pub function_choice: FunctionChoice,
    pub temperature: f32,
}

/// A function invocation requested by the model. `arguments` is the raw
/// JSON text exactly as the model produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// The two possible outcomes of one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LLMAction {
    /// The model answered with text and no function call.
    TextResponse(String),
    /// The model asked for a function call, possibly with accompanying text.
    FunctionCall {
        call: FunctionCall,
        content: Option<String>,
    },
}

/// A generic client for interacting with an LLM.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Makes a single, non-streaming call to the LLM to decide on the next action.
    async fn decide_action(&self, request: &ChatRequest) -> Result<LLMAction, LlmError>;
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

/// Builds the request body using the `functions` / `function_call` fields of
/// the chat-completions API.
fn request_body(model: &str, request: &ChatRequest) -> JsonValue {
    let mut body = json!({
        "model": model,
        "messages": request.messages,
        "temperature": request.temperature,
    });
    if !request.functions.is_empty() {
        body["functions"] = json!(request.functions);
        body["function_call"] = match &request.function_choice {
            FunctionChoice::Auto => json!("auto"),
            FunctionChoice::Named(name) => json!({ "name": name }),
        };
    }
    body
}

fn into_action(response: ChatCompletionResponse) -> Result<LLMAction, LlmError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

    match (choice.message.function_call, choice.message.content) {
        (Some(call), content) => Ok(LLMAction::FunctionCall { call, content }),
        (None, Some(content)) => Ok(LLMAction::TextResponse(content)),
        (None, None) => Err(LlmError::EmptyResponse),
    }
}

/// An implementation of `LLMClient` for any OpenAI-compatible API, including
/// Azure OpenAI deployments (`AzureConfig`).
pub struct OpenAICompatibleClient<C: Config = OpenAIConfig> {
    client: Client<C>,
    model: String,
}

impl<C: Config> OpenAICompatibleClient<C> {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The specific model identifier to use for chat completions (e.g., "gpt-4o").
    pub fn new(config: C, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl<C: Config> LLMClient for OpenAICompatibleClient<C> {
    async fn decide_action(&self, request: &ChatRequest) -> Result<LLMAction, LlmError> {
        let body = request_body(&self.model, request);
        debug!(model = %self.model, messages = request.messages.len(), "Sending chat completion request");

        let response: ChatCompletionResponse = self
            .client
            .chat()
            .create_byot(body)
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        into_action(response)
    }
}
