//! Language backend contract.
//!
//! The backend performs the actual translation, transliteration, sentence
//! breakdown, speech synthesis and speech recognition. The chat layer only
//! sees the narrow query/response shapes defined here.

use crate::error::BackendError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

/// Encoding of synthesized or recorded audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    #[default]
    Mp3,
    OggOpus,
}

impl AudioFormat {
    /// File extension used when a clip is written to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggOpus => "ogg",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::OggOpus => "ogg_opus",
        }
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "ogg_opus" | "ogg" | "opus" => Ok(Self::OggOpus),
            other => Err(format!("unsupported audio format '{other}'")),
        }
    }
}

/// A transient audio artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub format: AudioFormat,
    pub data: Bytes,
}

impl AudioClip {
    pub fn new(format: AudioFormat, data: impl Into<Bytes>) -> Self {
        Self {
            format,
            data: data.into(),
        }
    }
}

/// Arguments of the `translate_or_lookup` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslateLookupQuery {
    pub input_text: String,
    pub source_language: String,
    pub target_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Arguments of the `transliterate` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransliterateQuery {
    pub input_text: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// Arguments of the `breakdown` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreakdownQuery {
    pub input_text: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration_service: Option<String>,
}

/// Voice gender requested for speech synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Arguments of the `pronounce` function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioQuery {
    pub input_text: String,
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

/// The operations the chat layer can ask of the language backend.
///
/// Every method may fail with [`BackendError::NoDataFound`], which callers
/// treat as an ordinary (if unhelpful) answer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageBackend: Send + Sync {
    async fn translate_or_lookup(&self, query: TranslateLookupQuery)
    -> Result<String, BackendError>;

    async fn transliterate(&self, query: TransliterateQuery) -> Result<String, BackendError>;

    async fn breakdown(&self, query: BreakdownQuery) -> Result<String, BackendError>;

    async fn pronounce(
        &self,
        query: AudioQuery,
        format: AudioFormat,
    ) -> Result<AudioClip, BackendError>;

    /// Transcribes recorded speech to text.
    async fn recognize_audio(&self, clip: AudioClip) -> Result<String, BackendError>;
}

/// A `LanguageBackend` reached over HTTP.
///
/// Text operations answer with `{"result": "..."}`; a 404 carries
/// `{"error": "..."}` and means no matching data.
pub struct HttpLanguageBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLanguageBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_text<Q: Serialize + Sync>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.url(path))
            .json(query)
            .send()
            .await
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;
        let response = check_status(response).await?;
        read_result(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<JsonValue>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(JsonValue::as_str).map(str::to_string))
        .unwrap_or(body);
    if status == reqwest::StatusCode::NOT_FOUND {
        Err(BackendError::NoDataFound(message))
    } else {
        Err(BackendError::RequestFailed(format!("{status}: {message}")))
    }
}

async fn read_result(response: reqwest::Response) -> Result<String, BackendError> {
    let body: JsonValue = response
        .json()
        .await
        .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
    body.get("result")
        .and_then(JsonValue::as_str)
        .map(str::to_string)
        .ok_or_else(|| BackendError::InvalidResponse("missing 'result' field".to_string()))
}

#[async_trait]
impl LanguageBackend for HttpLanguageBackend {
    async fn translate_or_lookup(
        &self,
        query: TranslateLookupQuery,
    ) -> Result<String, BackendError> {
        self.post_text("translate_or_lookup", &query).await
    }

    async fn transliterate(&self, query: TransliterateQuery) -> Result<String, BackendError> {
        self.post_text("transliterate", &query).await
    }

    async fn breakdown(&self, query: BreakdownQuery) -> Result<String, BackendError> {
        self.post_text("breakdown", &query).await
    }

    async fn pronounce(
        &self,
        query: AudioQuery,
        format: AudioFormat,
    ) -> Result<AudioClip, BackendError> {
        let response = self
            .client
            .post(self.url("audio"))
            .json(&serde_json::json!({ "query": query, "format": format }))
            .send()
            .await
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;
        let response = check_status(response).await?;
        let data = response
            .bytes()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        debug!(bytes = data.len(), format = format.as_str(), "Received synthesized audio");
        Ok(AudioClip::new(format, data))
    }

    async fn recognize_audio(&self, clip: AudioClip) -> Result<String, BackendError> {
        let response = self
            .client
            .post(self.url("recognize_audio"))
            .query(&[("format", clip.format.as_str())])
            .body(clip.data)
            .send()
            .await
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;
        let response = check_status(response).await?;
        read_result(response).await
    }
}
