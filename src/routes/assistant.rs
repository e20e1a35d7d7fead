// SPDX-License-Identifier: MIT

//! Assistant proxy routes (chat completion + text-to-speech).

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::assistant::ChatTurn;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/tts", post(tts))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatTurn>,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Proxy a chat message to the completion service.
async fn chat(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    if body.message.trim().is_empty() {
        return Err(AppError::Validation("message is required".to_string()));
    }

    tracing::debug!(user_id = %user.user_id, "Forwarding chat message");

    let reply = state
        .assistant_service
        .chat(&body.message, &body.history, body.context.as_deref())
        .await?;

    Ok(Json(ChatResponse { reply }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    text: String,
    #[serde(default = "default_voice")]
    voice: String,
    #[serde(default = "default_language")]
    language_code: String,
    #[serde(default = "default_rate")]
    speaking_rate: f64,
}

fn default_voice() -> String {
    "en-US-Neural2-D".to_string()
}
fn default_language() -> String {
    "en-US".to_string()
}
fn default_rate() -> f64 {
    1.0
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsResponse {
    pub audio_content: String,
}

/// Proxy a speech synthesis request.
async fn tts(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<AuthUser>,
    Json(body): Json<TtsRequest>,
) -> Result<Json<TtsResponse>> {
    if body.text.trim().is_empty() {
        return Err(AppError::Validation("text is required".to_string()));
    }

    let audio_content = state
        .assistant_service
        .synthesize(
            &body.text,
            &body.voice,
            &body.language_code,
            body.speaking_rate,
        )
        .await?;

    Ok(Json(TtsResponse { audio_content }))
}
