use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::SharedState;
use crate::workspace::Workspace;

pub const SESSION_COOKIE: &str = "realty_session";

/// Workspace id carried by the session cookie, if it parses.
pub fn workspace_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

pub fn session_cookie(id: Uuid, max_age: std::time::Duration) -> Cookie<'static> {
    let max_age = time::Duration::try_from(max_age).unwrap_or(time::Duration::hours(12));
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// The caller's workspace. A caller without one gets a fresh workspace that
/// is only registered once the handler hands out its cookie.
pub struct Visitor {
    pub workspace: Arc<Workspace>,
    registered: bool,
}

impl Visitor {
    /// Register the workspace and return the cookie that names it.
    /// Handlers call this only on success, so failed requests leave nothing behind.
    pub fn cookie_jar(&self, state: &SharedState) -> CookieJar {
        if !self.registered {
            state.workspaces.insert(self.workspace.clone());
        }
        CookieJar::new().add(session_cookie(self.workspace.id, state.config.session_idle))
    }
}

impl FromRequestParts<SharedState> for Visitor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(workspace) = workspace_id(&jar).and_then(|id| state.workspaces.get(&id)) {
            return Ok(Visitor {
                workspace,
                registered: true,
            });
        }

        Ok(Visitor {
            workspace: state.workspaces.create().await,
            registered: false,
        })
    }
}

/// A workspace with a signed-in user.
pub struct SignedIn {
    pub workspace: Arc<Workspace>,
    pub uid: String,
}

impl FromRequestParts<SharedState> for SignedIn {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let workspace = workspace_id(&jar)
            .and_then(|id| state.workspaces.get(&id))
            .ok_or_else(|| AppError::Unauthenticated("Missing session".to_string()))?;

        let uid = workspace.uid().ok_or_else(AppError::not_authenticated)?;
        Ok(SignedIn { workspace, uid })
    }
}
