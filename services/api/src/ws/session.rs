//! Manages the WebSocket connection lifecycle for a chat session.

use super::protocol::{ClientMessage, ServerMessage, decode_audio};
use crate::state::AppState;
use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use lingobot_core::{
    ChatSession,
    backend::{AudioClip, AudioFormat},
    output::OutputSink,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, error, info, instrument, warn};

pub const GREETING: &str =
    "Please enter a sentence in your target language (language that you are learning)";

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Work handed from the socket reader to the session task.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionInput {
    Message(String),
    Instructions(String),
    Audio(AudioClip),
}

/// Forwards session output to the socket writer task.
pub struct ChannelSink {
    tx: mpsc::Sender<ServerMessage>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ServerMessage>) -> Self {
        Self { tx }
    }

    async fn forward(&self, msg: ServerMessage) {
        if self.tx.send(msg).await.is_err() {
            debug!("Socket writer has gone away; dropping outgoing message.");
        }
    }
}

#[async_trait]
impl OutputSink for ChannelSink {
    async fn send_text(&self, text: String) {
        self.forward(ServerMessage::Text { text }).await;
    }

    async fn send_audio(&self, clip: AudioClip) {
        self.forward(ServerMessage::audio(&clip)).await;
    }

    async fn send_status(&self, status: String) {
        self.forward(ServerMessage::Status { message: status }).await;
    }
}

/// Translates one client frame into session input. `None` means the frame
/// carries nothing for the session; `Err` holds a protocol error for the
/// client.
pub fn parse_frame(msg: Message, format: AudioFormat) -> Option<Result<SessionInput, String>> {
    match msg {
        Message::Text(text) => Some(
            serde_json::from_str::<ClientMessage>(&text)
                .map_err(|e| format!("invalid message: {e}"))
                .and_then(|msg| match msg {
                    ClientMessage::UserMessage { text } => Ok(SessionInput::Message(text)),
                    ClientMessage::SetInstructions { text } => {
                        Ok(SessionInput::Instructions(text))
                    }
                    ClientMessage::Audio { data } => decode_audio(&data, format)
                        .map(SessionInput::Audio)
                        .map_err(|e| format!("invalid audio payload: {e}")),
                }),
        ),
        Message::Binary(data) => Some(Ok(SessionInput::Audio(AudioClip::new(format, data)))),
        Message::Close(_) | Message::Ping(_) | Message::Pong(_) => None,
    }
}

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// Spawns a writer task draining outgoing messages to the socket and a
/// session task processing client input one turn at a time. Both are
/// aborted when the client goes away.
#[instrument(name = "ws_session", skip_all, fields(connection_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    tracing::Span::current().record("connection_id", connection_id);
    info!("New WebSocket connection.");

    let (socket_tx, mut socket_rx) = socket.split();
    let (out_tx, out_rx) = mpsc::channel::<ServerMessage>(32);
    let (in_tx, in_rx) = mpsc::channel::<SessionInput>(8);

    let writer = tokio::spawn(run_writer(socket_tx, out_rx).in_current_span());

    let sink = Arc::new(ChannelSink::new(out_tx.clone()));
    let session = ChatSession::new(state.services.clone(), sink.clone());
    sink.send_status(GREETING.to_string()).await;
    let session_task = tokio::spawn(run_session(session, in_rx).in_current_span());

    let audio_format = state.config.audio_format;
    while let Some(msg_result) = socket_rx.next().await {
        let ws_msg = match msg_result {
            Ok(ws_msg) => ws_msg,
            Err(e) => {
                error!("Error receiving from client WebSocket: {:?}", e);
                break;
            }
        };
        if matches!(ws_msg, Message::Close(_)) {
            info!("Client sent close frame. Shutting down session.");
            break;
        }
        match parse_frame(ws_msg, audio_format) {
            Some(Ok(input)) => {
                if in_tx.send(input).await.is_err() {
                    warn!("Session task is no longer running.");
                    break;
                }
            }
            Some(Err(message)) => {
                warn!(%message, "Rejected client message.");
                let _ = out_tx.send(ServerMessage::Error { message }).await;
            }
            None => {}
        }
    }

    // Abandons any in-flight turn along with the conversation state.
    session_task.abort();
    writer.abort();
    info!("WebSocket connection closed and chat session terminated.");
}

/// Processes client input sequentially until the input channel closes.
pub async fn run_session(mut session: ChatSession, mut input: mpsc::Receiver<SessionInput>) {
    while let Some(next) = input.recv().await {
        match next {
            SessionInput::Message(text) => session.process_message(&text).await,
            SessionInput::Instructions(text) => session.set_instruction(&text).await,
            SessionInput::Audio(clip) => session.process_audio(clip).await,
        }
    }
    debug!("Session input closed.");
}

async fn run_writer(
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::Receiver<ServerMessage>,
) {
    while let Some(msg) = out_rx.recv().await {
        if let Err(e) = send_msg(&mut socket_tx, msg).await {
            error!("Failed to send message to client: {:?}", e);
            break;
        }
    }
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn text_frames_become_session_input() {
        let frame = Message::Text(r#"{"type":"user_message","text":"山路"}"#.into());
        assert_eq!(
            parse_frame(frame, AudioFormat::Mp3),
            Some(Ok(SessionInput::Message("山路".to_string())))
        );

        let frame = Message::Text(r#"{"type":"set_instructions","text":"pronounce it"}"#.into());
        assert_eq!(
            parse_frame(frame, AudioFormat::Mp3),
            Some(Ok(SessionInput::Instructions("pronounce it".to_string())))
        );
    }

    #[test]
    fn binary_frames_are_audio_in_the_configured_format() {
        let frame = Message::Binary(Bytes::from_static(&[1, 2, 3]));
        assert_eq!(
            parse_frame(frame, AudioFormat::OggOpus),
            Some(Ok(SessionInput::Audio(AudioClip::new(
                AudioFormat::OggOpus,
                vec![1u8, 2, 3]
            ))))
        );
    }

    #[test]
    fn malformed_frames_yield_protocol_errors() {
        let frame = Message::Text("not json".into());
        assert!(matches!(parse_frame(frame, AudioFormat::Mp3), Some(Err(_))));

        let frame = Message::Text(r#"{"type":"audio","data":"@@@"}"#.into());
        let err = parse_frame(frame, AudioFormat::Mp3).unwrap().unwrap_err();
        assert!(err.starts_with("invalid audio payload"));
    }

    #[test]
    fn control_frames_are_ignored() {
        assert_eq!(parse_frame(Message::Ping(Bytes::new()), AudioFormat::Mp3), None);
    }

    #[tokio::test]
    async fn channel_sink_forwards_output() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = ChannelSink::new(tx);

        sink.send_text("grades".to_string()).await;
        sink.send_status(GREETING.to_string()).await;

        assert_eq!(
            rx.recv().await,
            Some(ServerMessage::Text { text: "grades".to_string() })
        );
        assert_eq!(
            rx.recv().await,
            Some(ServerMessage::Status { message: GREETING.to_string() })
        );
    }

    #[tokio::test]
    async fn channel_sink_tolerates_closed_writer() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        ChannelSink::new(tx).send_text("ignored".to_string()).await;
    }
}
