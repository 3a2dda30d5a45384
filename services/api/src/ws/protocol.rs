//! Defines the WebSocket message protocol between the chat client and the API server.

use base64::{Engine, engine::general_purpose::STANDARD};
use lingobot_core::backend::{AudioClip, AudioFormat};
use serde::{Deserialize, Serialize};

/// Messages sent from the client to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A text message from the learner.
    UserMessage { text: String },
    /// Replaces the standing instruction directly, without classification.
    SetInstructions { text: String },
    /// Recorded speech, base64 encoded in the session's audio format.
    Audio { data: String },
}

/// Messages sent from the server to the client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Text meant for the learner.
    Text { text: String },
    /// Synthesized speech (base64 encoded).
    Audio { format: AudioFormat, data: String },
    /// Status information about the conversation.
    Status { message: String },
    /// The client sent something the server could not understand.
    Error { message: String },
}

impl ServerMessage {
    pub fn audio(clip: &AudioClip) -> Self {
        Self::Audio {
            format: clip.format,
            data: STANDARD.encode(&clip.data),
        }
    }
}

/// Decodes a base64 audio payload sent by the client.
pub fn decode_audio(data: &str, format: AudioFormat) -> Result<AudioClip, base64::DecodeError> {
    Ok(AudioClip::new(format, STANDARD.decode(data)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_are_tagged_by_type() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "user_message", "text": "成绩"})).unwrap();
        assert_eq!(msg, ClientMessage::UserMessage { text: "成绩".to_string() });

        let msg: ClientMessage = serde_json::from_value(
            json!({"type": "set_instructions", "text": "translate French to English"}),
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::SetInstructions {
                text: "translate French to English".to_string()
            }
        );
    }

    #[test]
    fn unknown_client_message_is_rejected() {
        let result = serde_json::from_value::<ClientMessage>(json!({"type": "init", "topic": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn audio_is_base64_encoded() {
        let clip = AudioClip::new(AudioFormat::OggOpus, vec![0u8, 1, 2, 255]);

        let value = serde_json::to_value(ServerMessage::audio(&clip)).unwrap();

        assert_eq!(
            value,
            json!({"type": "audio", "format": "ogg_opus", "data": "AAEC/w=="})
        );
    }

    #[test]
    fn status_serializes_with_message_field() {
        let value = serde_json::to_value(ServerMessage::Status {
            message: "recognized text: 成绩".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"type": "status", "message": "recognized text: 成绩"}));
    }

    #[test]
    fn decode_audio_round_trips_client_payload() {
        let clip = decode_audio("AAEC/w==", AudioFormat::Mp3).unwrap();
        assert_eq!(clip.data.as_ref(), &[0u8, 1, 2, 255]);
        assert!(decode_audio("not base64!", AudioFormat::Mp3).is_err());
    }
}
