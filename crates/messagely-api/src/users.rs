use axum::{
    Json,
    extract::{Path, State},
};

use messagely_types::api::{ReceivedMessagesResponse, SentMessagesResponse, UserResponse, UsersResponse};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// GET /users — `{users: [{username, first_name, last_name, phone}, ...]}`
pub async fn list(State(state): State<AppState>) -> Result<Json<UsersResponse>, ApiError> {
    let users = blocking(move || state.credentials.list()).await?;
    Ok(Json(UsersResponse { users }))
}

/// GET /users/{username} — `{user: {username, first_name, last_name, phone, join_at, last_login_at}}`
pub async fn detail(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = blocking(move || state.credentials.get(&username)).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/{username}/to — `{messages: [{id, body, sent_at, read_at, from_user}, ...]}`
pub async fn messages_to(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ReceivedMessagesResponse>, ApiError> {
    let messages = blocking(move || state.messages.messages_to(&username)).await?;
    Ok(Json(ReceivedMessagesResponse { messages }))
}

/// GET /users/{username}/from — `{messages: [{id, body, sent_at, read_at, to_user}, ...]}`
pub async fn messages_from(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<SentMessagesResponse>, ApiError> {
    let messages = blocking(move || state.messages.messages_from(&username)).await?;
    Ok(Json(SentMessagesResponse { messages }))
}
