use std::path::{Component, Path, PathBuf};

use axum::extract::{Request, State};
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::auth::extractor::workspace_id;
use crate::navigation::Navigation;
use crate::state::SharedState;

/// Runs the navigation guard for UI page requests before the bundle is served.
/// Files that exist in the bundle pass straight through.
pub async fn guard_navigation(
    State(state): State<SharedState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if !matches!(*req.method(), Method::GET | Method::HEAD)
        || is_bundle_file(&state.config.static_dir, &path).await
    {
        return next.run(req).await;
    }

    let authenticated = match workspace_id(&jar).and_then(|id| state.workspaces.get(&id)) {
        Some(workspace) => {
            workspace.session.settled().await;
            workspace.session.is_authenticated()
        }
        None => false,
    };

    match state.routes.navigate(&path, authenticated) {
        Navigation::Proceed => next.run(req).await,
        Navigation::Redirect(target) => {
            tracing::debug!(%path, target, authenticated, "Navigation redirected");
            Redirect::to(target).into_response()
        }
    }
}

/// Whether `path` names a regular file inside `static_dir`.
async fn is_bundle_file(static_dir: &Path, path: &str) -> bool {
    let Some(file) = bundle_path(static_dir, path) else {
        return false;
    };
    tokio::fs::metadata(file)
        .await
        .is_ok_and(|meta| meta.is_file())
}

fn bundle_path(static_dir: &Path, path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(path).ok()?;
    let relative = Path::new(decoded.trim_start_matches('/'));
    if relative.as_os_str().is_empty()
        || !relative.components().all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(static_dir.join(relative))
}
