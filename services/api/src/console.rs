//! Console front end: line commands and an output sink that prints to the
//! terminal and saves audio clips to disk.

use async_trait::async_trait;
use lingobot_core::{ChatRequest, backend::AudioClip, output::OutputSink};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::error;

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand<'a> {
    Quit,
    /// Show the last request sent to the model.
    History,
    SetInstructions(&'a str),
    Message(&'a str),
    Empty,
}

impl<'a> ConsoleCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            return Self::Quit;
        }
        if line.starts_with("history:") {
            return Self::History;
        }
        if let Some(rest) = line.strip_prefix("/instructions") {
            let rest = rest.trim();
            if !rest.is_empty() {
                return Self::SetInstructions(rest);
            }
        }
        Self::Message(line)
    }
}

/// Renders a request the way the `history:` command prints it.
pub fn format_request(request: &ChatRequest) -> String {
    request
        .messages
        .iter()
        .map(|m| format!("[{}] {}", m.role(), m.content()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct ConsoleSink {
    audio_dir: Option<PathBuf>,
    clip_counter: AtomicUsize,
}

impl ConsoleSink {
    pub fn new(audio_dir: Option<PathBuf>) -> Self {
        Self {
            audio_dir,
            clip_counter: AtomicUsize::new(0),
        }
    }

    async fn save_clip(&self, dir: &Path, clip: &AudioClip) -> std::io::Result<PathBuf> {
        let index = self.clip_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let path = dir.join(format!("clip_{index:03}.{}", clip.format.extension()));
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, &clip.data).await?;
        Ok(path)
    }
}

#[async_trait]
impl OutputSink for ConsoleSink {
    async fn send_text(&self, text: String) {
        println!("{text}");
    }

    async fn send_audio(&self, clip: AudioClip) {
        match &self.audio_dir {
            Some(dir) => match self.save_clip(dir, &clip).await {
                Ok(path) => println!("(audio saved to {})", path.display()),
                Err(e) => error!(error = %e, "Failed to save audio clip"),
            },
            None => println!("(audio clip, {} bytes)", clip.data.len()),
        }
    }

    async fn send_status(&self, status: String) {
        println!("* {status}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingobot_core::backend::AudioFormat;
    use lingobot_core::llm_client::FunctionChoice;
    use lingobot_core::message::Message;

    #[test]
    fn parses_console_commands() {
        assert_eq!(ConsoleCommand::parse("  quit "), ConsoleCommand::Quit);
        assert_eq!(ConsoleCommand::parse("history:"), ConsoleCommand::History);
        assert_eq!(
            ConsoleCommand::parse("history: please"),
            ConsoleCommand::History
        );
        assert_eq!(
            ConsoleCommand::parse("/instructions translate French to English"),
            ConsoleCommand::SetInstructions("translate French to English")
        );
        assert_eq!(ConsoleCommand::parse("成绩"), ConsoleCommand::Message("成绩"));
        assert_eq!(ConsoleCommand::parse("   "), ConsoleCommand::Empty);
    }

    #[test]
    fn bare_instructions_prefix_is_a_message() {
        assert_eq!(
            ConsoleCommand::parse("/instructions"),
            ConsoleCommand::Message("/instructions")
        );
    }

    #[test]
    fn formats_request_messages_with_roles() {
        let request = ChatRequest {
            messages: vec![Message::system("be helpful"), Message::user("成绩")],
            functions: vec![],
            function_choice: FunctionChoice::Auto,
            temperature: 0.0,
        };
        assert_eq!(format_request(&request), "[system] be helpful\n[user] 成绩");
    }

    #[tokio::test]
    async fn audio_clips_are_written_to_the_audio_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ConsoleSink::new(Some(dir.path().join("clips")));

        sink.send_audio(AudioClip::new(AudioFormat::OggOpus, vec![7u8; 8]))
            .await;
        sink.send_audio(AudioClip::new(AudioFormat::Mp3, vec![9u8; 4]))
            .await;

        let first = std::fs::read(dir.path().join("clips/clip_001.ogg")).unwrap();
        let second = std::fs::read(dir.path().join("clips/clip_002.mp3")).unwrap();
        assert_eq!(first, vec![7u8; 8]);
        assert_eq!(second, vec![9u8; 4]);
    }
}
