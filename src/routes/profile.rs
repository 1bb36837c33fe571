use axum::Json;

use crate::auth::extractor::SignedIn;
use crate::error::AppError;
use crate::models::{ProfileUpdate, User};

pub async fn get(auth: SignedIn) -> Result<Json<User>, AppError> {
    let users = &auth.workspace.users;
    users
        .fetch_user_data()
        .await?
        .or_else(|| users.current_user())
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}

pub async fn update(
    auth: SignedIn,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let users = &auth.workspace.users;
    users
        .update_user_profile(req)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}
