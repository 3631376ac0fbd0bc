use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;

use messagely_core::{CredentialStore, MessageQueryService, NewUser};
use messagely_types::api::{Claims, LoginRequest, RegisterRequest, TokenResponse};

use crate::error::{ApiError, blocking};

const TOKEN_TTL_DAYS: i64 = 30;
const MAX_USERNAME_LEN: usize = 64;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub credentials: CredentialStore,
    pub messages: MessageQueryService,
    pub jwt_secret: String,
}

/// POST /auth/register — creates the user and returns a token for them.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_empty() || req.username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "username must be 1-{} characters",
            MAX_USERNAME_LEN
        )));
    }
    if req.password.is_empty() {
        return Err(ApiError::BadRequest("password is required".into()));
    }

    let new_user = NewUser {
        username: req.username,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
    };

    // register() stamps last_login_at, so no separate login update is needed.
    let st = state.clone();
    let user = blocking(move || st.credentials.register(new_user)).await?;

    let token = create_token(&state.jwt_secret, &user.username).map_err(|_| ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// POST /auth/login — verifies the password and refreshes `last_login_at`.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let st = state.clone();
    let username = req.username.clone();
    let valid = blocking(move || {
        let valid = st.credentials.authenticate(&username, &req.password)?;
        if valid {
            st.credentials.record_login(&username)?;
        }
        Ok(valid)
    })
    .await?;

    if !valid {
        return Err(ApiError::InvalidCredentials);
    }

    info!("User {} logged in", req.username);

    let token = create_token(&state.jwt_secret, &req.username).map_err(|_| ApiError::Internal)?;
    Ok(Json(TokenResponse { token }))
}

fn create_token(secret: &str, username: &str) -> anyhow::Result<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        username: username.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + chrono::Duration::days(TOKEN_TTL_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
