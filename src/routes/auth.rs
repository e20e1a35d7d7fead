// SPDX-License-Identifier: MIT

//! Google sign-in authentication routes.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::User;
use crate::services::IdentityError;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", post(google_sign_in))
        .route("/auth/logout", get(logout))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignInRequest {
    id_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub token: String,
    pub user: SignInUser,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// Verify a Google ID token, upsert the user, and create a session.
async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<GoogleSignInRequest>,
) -> Result<(CookieJar, Json<SignInResponse>)> {
    let identity = state
        .identity_verifier
        .verify_id_token(&body.id_token)
        .await
        .map_err(|e| match e {
            IdentityError::Rejected(msg) => {
                tracing::warn!(error = %msg, "Google ID token rejected");
                AppError::InvalidToken
            }
            IdentityError::Transient(msg) => AppError::Unavailable(msg),
        })?;

    // First sign-in creates the user; later sign-ins refresh name/avatar
    let user = match state.db.find_user_by_google_id(&identity.sub).await? {
        Some(mut user) => {
            user.name = identity.name.clone();
            if user.profile.avatar.is_none() {
                user.profile.avatar = identity.picture.clone();
            }
            state.db.upsert_user(&user).await?;
            user
        }
        None => {
            let user = User::from_google_identity(
                &identity.sub,
                &identity.email,
                &identity.name,
                identity.picture.clone(),
                chrono::Utc::now(),
            );
            state.db.upsert_user(&user).await?;
            tracing::info!(user_id = %user.id, "New user signed up via Google");
            user
        }
    };

    let token = create_jwt(&user.id, &state.config.jwt_signing_key)?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        jar.add(cookie),
        Json(SignInResponse {
            token,
            user: SignInUser {
                id: user.id,
                name: user.name,
                email: user.email,
                avatar: user.profile.avatar,
            },
        }),
    ))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .build();

    (jar.remove(cookie), Json(LogoutResponse { success: true }))
}
