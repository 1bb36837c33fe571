use axum::Json;
use axum::extract::State;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::{Visitor, clear_session_cookie, workspace_id};
use crate::error::AppError;
use crate::models::{Registration, User};
use crate::session::AuthSession;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<AuthSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn login(
    State(state): State<SharedState>,
    visitor: Visitor,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let users = &visitor.workspace.users;
    let session = users.login(&req.email, &req.password).await?;

    Ok((
        visitor.cookie_jar(&state),
        Json(SessionResponse {
            authenticated: true,
            session: Some(session),
            user: users.current_user(),
        }),
    ))
}

pub async fn register(
    State(state): State<SharedState>,
    visitor: Visitor,
    Json(req): Json<Registration>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    if req.email.is_empty() || req.name.is_empty() {
        return Err(AppError::BadRequest("Email and name are required".to_string()));
    }

    let users = &visitor.workspace.users;
    let session = users.register(req).await?;

    Ok((
        visitor.cookie_jar(&state),
        Json(SessionResponse {
            authenticated: true,
            session: Some(session),
            user: users.current_user(),
        }),
    ))
}

pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), AppError> {
    if let Some(id) = workspace_id(&jar) {
        if let Some(workspace) = state.workspaces.get(&id) {
            workspace.users.logout().await?;
        }
        state.workspaces.remove(&id);
    }

    Ok((
        jar.add(clear_session_cookie()),
        Json(MessageResponse {
            message: "Logged out".to_string(),
        }),
    ))
}

/// Ask the identity provider to mail a reset link. Sets no cookie: a caller
/// without a workspace gets a throwaway one.
pub async fn forgot_password(
    visitor: Visitor,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    visitor.workspace.users.reset_password(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "Password reset email sent".to_string(),
    }))
}

/// Current session and profile; unauthenticated callers get `authenticated: false`.
pub async fn session(State(state): State<SharedState>, jar: CookieJar) -> Json<SessionResponse> {
    let workspace = workspace_id(&jar).and_then(|id| state.workspaces.get(&id));
    let session = workspace.as_ref().and_then(|ws| ws.session.current());

    Json(SessionResponse {
        authenticated: session.is_some(),
        user: workspace
            .filter(|_| session.is_some())
            .and_then(|ws| ws.users.current_user()),
        session,
    })
}
