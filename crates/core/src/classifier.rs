//! Turn classifier.
//!
//! Labels each incoming message as the start of a new topic, a follow-up on
//! the current topic, or a standing instruction, by forcing the model to
//! answer through a single function call.

use crate::{
    error::TurnError,
    llm_client::{ChatRequest, FunctionChoice, LLMAction, LLMClient},
    message::Message,
    prompts,
    registry::FunctionDescriptor,
    session::call_model,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const CATEGORIZE_FUNCTION_NAME: &str = "category_input_type";

/// What an incoming message means for the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A new sentence unrelated to the previous one.
    NewTopic,
    /// A question or command about the current topic.
    FollowUp,
    /// A standing instruction, with the extracted instruction text.
    Instruction(String),
}

#[derive(Debug, Deserialize)]
enum InputType {
    #[serde(rename = "NEW_SENTENCE", alias = "NEW_TOPIC")]
    NewSentence,
    #[serde(rename = "QUESTION_OR_COMMAND", alias = "FOLLOW_UP")]
    QuestionOrCommand,
    #[serde(rename = "INSTRUCTIONS", alias = "INSTRUCTION")]
    Instructions,
}

#[derive(Debug, Deserialize)]
struct CategorizeInputQuery {
    input_type: InputType,
    #[serde(default)]
    instructions: Option<String>,
}

impl TryFrom<CategorizeInputQuery> for Classification {
    type Error = TurnError;

    fn try_from(query: CategorizeInputQuery) -> Result<Self, Self::Error> {
        match query.input_type {
            InputType::NewSentence => Ok(Self::NewTopic),
            InputType::QuestionOrCommand => Ok(Self::FollowUp),
            InputType::Instructions => match query.instructions {
                Some(text) if !text.trim().is_empty() => Ok(Self::Instruction(text)),
                _ => Err(TurnError::MalformedModelResponse(
                    "instruction classification without instruction text".to_string(),
                )),
            },
        }
    }
}

/// The function the classifier forces the model to call.
pub fn categorize_descriptor() -> FunctionDescriptor {
    FunctionDescriptor::new(
        CATEGORIZE_FUNCTION_NAME,
        prompts::DESCRIPTION_FN_CATEGORIZE_INPUT,
        json!({
            "type": "object",
            "properties": {
                "input_type": {
                    "type": "string",
                    "enum": ["NEW_SENTENCE", "QUESTION_OR_COMMAND", "INSTRUCTIONS"],
                    "description": prompts::DESCRIPTION_FLD_INPUT_TYPE,
                },
                "instructions": {
                    "type": "string",
                    "description": prompts::DESCRIPTION_FLD_INSTRUCTIONS,
                },
            },
            "required": ["input_type"],
        }),
    )
}

pub struct TurnClassifier {
    llm: Arc<dyn LLMClient>,
    timeout: Duration,
}

impl TurnClassifier {
    pub fn new(llm: Arc<dyn LLMClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Builds the classification request: system prompt, the previous topic
    /// sentence if there is one, then the incoming message.
    pub fn request(last_topic_sentence: Option<&str>, incoming: &str) -> ChatRequest {
        let mut messages = vec![Message::system(prompts::SYSTEM_MSG_ASSISTANT)];
        if let Some(previous) = last_topic_sentence {
            messages.push(Message::user(previous));
        }
        messages.push(Message::user(incoming));

        ChatRequest {
            messages,
            functions: vec![categorize_descriptor()],
            function_choice: FunctionChoice::Named(CATEGORIZE_FUNCTION_NAME.to_string()),
            temperature: 0.0,
        }
    }

    /// Classifies `incoming`. Has no effect on conversation state.
    ///
    /// Fails with `MalformedModelResponse` when the model does not answer
    /// through the forced function or its arguments do not parse.
    pub async fn classify(
        &self,
        last_topic_sentence: Option<&str>,
        incoming: &str,
    ) -> Result<Classification, TurnError> {
        let request = Self::request(last_topic_sentence, incoming);
        let action = call_model(self.llm.as_ref(), &request, self.timeout).await?;
        debug!(?action, "Classification response");

        let call = match action {
            LLMAction::FunctionCall { call, .. } => call,
            LLMAction::TextResponse(_) => {
                return Err(TurnError::MalformedModelResponse(
                    "classification answered without a function call".to_string(),
                ));
            }
        };
        if call.name != CATEGORIZE_FUNCTION_NAME {
            return Err(TurnError::MalformedModelResponse(format!(
                "classification called '{}' instead of '{CATEGORIZE_FUNCTION_NAME}'",
                call.name
            )));
        }

        let query: CategorizeInputQuery = serde_json::from_str(&call.arguments).map_err(|e| {
            TurnError::MalformedModelResponse(format!("classification arguments: {e}"))
        })?;
        let classification = Classification::try_from(query)?;
        info!(input = %incoming, ?classification, "Classified input");
        Ok(classification)
    }
}
