// SPDX-License-Identifier: MIT

//! Stateless proxies for the conversational AI and speech synthesis
//! collaborators. Text in, text (or audio) out; no retries, no streaming.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
const TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// One prior exchange in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// "user" or "model"
    pub role: String,
    pub text: String,
}

/// Client for the upstream AI services.
#[derive(Clone)]
pub struct AssistantService {
    http_client: reqwest::Client,
    gemini_api_key: String,
    tts_api_key: String,
}

impl AssistantService {
    pub fn new(gemini_api_key: String, tts_api_key: String) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            gemini_api_key,
            tts_api_key,
        }
    }

    /// Generate a chat completion for a message with optional history and
    /// free-text context.
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatTurn],
        context: Option<&str>,
    ) -> Result<String> {
        let mut contents: Vec<serde_json::Value> = Vec::with_capacity(history.len() + 1);

        for turn in history {
            contents.push(json!({
                "role": turn.role,
                "parts": [{ "text": turn.text }],
            }));
        }

        let user_text = match context {
            Some(ctx) if !ctx.is_empty() => format!("{}\n\n{}", ctx, message),
            _ => message.to_string(),
        };
        contents.push(json!({
            "role": "user",
            "parts": [{ "text": user_text }],
        }));

        let response = self
            .http_client
            .post(format!("{}?key={}", GEMINI_URL, self.gemini_api_key))
            .json(&json!({ "contents": contents }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Gemini returned status {}",
                response.status()
            )));
        }

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid Gemini response: {}", e)))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| AppError::Upstream("Gemini response had no candidates".to_string()))
    }

    /// Synthesize speech for a text snippet.
    ///
    /// Returns the audio as the base64 string the upstream service
    /// produces; the frontend plays it via a data URI.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        language_code: &str,
        speaking_rate: f64,
    ) -> Result<String> {
        let response = self
            .http_client
            .post(format!("{}?key={}", TTS_URL, self.tts_api_key))
            .json(&json!({
                "input": { "text": text },
                "voice": { "languageCode": language_code, "name": voice },
                "audioConfig": { "audioEncoding": "MP3", "speakingRate": speaking_rate },
            }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "TTS returned status {}",
                response.status()
            )));
        }

        let body: TtsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Invalid TTS response: {}", e)))?;

        Ok(body.audio_content)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct TtsResponse {
    #[serde(rename = "audioContent")]
    audio_content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_response_parsing() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello!"}],"role":"model"}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text, "Hello!");
    }

    #[test]
    fn test_gemini_empty_candidates() {
        let raw = r#"{"candidates":[]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn test_tts_response_parsing() {
        let raw = r#"{"audioContent":"dGVzdA=="}"#;
        let parsed: TtsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.audio_content, "dGVzdA==");
    }
}
