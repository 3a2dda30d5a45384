use crate::message::Message;
use serde::{Deserialize, Serialize};

/// Everything a session remembers between turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Directive applied to every turn until replaced. `None` means the
    /// session's default behavior.
    pub standing_instruction: Option<String>,
    /// Messages of the current topic, oldest first.
    pub history: Vec<Message>,
    /// The message that started the current topic.
    pub last_topic_sentence: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the history and makes `sentence` the current topic.
    pub fn start_topic(&mut self, sentence: &str) {
        self.history.clear();
        self.last_topic_sentence = Some(sentence.to_string());
    }

    pub fn push(&mut self, message: Message) {
        self.history.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_a_topic_clears_history() {
        let mut state = ConversationState::new();
        state.push(Message::user("呢條路係行返屋企嘅路"));
        state.push(Message::assistant("This road is the way home"));

        state.start_topic("黑社會");

        assert!(state.history.is_empty());
        assert_eq!(state.last_topic_sentence.as_deref(), Some("黑社會"));
    }

    #[test]
    fn starting_a_topic_keeps_the_instruction() {
        let mut state = ConversationState {
            standing_instruction: Some("translate French to English".to_string()),
            ..ConversationState::default()
        };
        state.start_topic("Je ne suis pas intéressé.");
        assert_eq!(
            state.standing_instruction.as_deref(),
            Some("translate French to English")
        );
    }
}
