pub mod auth;
pub mod clients;
pub mod profile;
pub mod properties;
pub mod upload;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/forgot-password", post(auth::forgot_password))
        .route("/api/v1/auth/session", get(auth::session))
        // Profile
        .route("/api/v1/profile", get(profile::get).put(profile::update))
        // Properties
        .route(
            "/api/v1/properties",
            get(properties::list).post(properties::create),
        )
        .route(
            "/api/v1/properties/{id}",
            get(properties::get)
                .put(properties::update)
                .delete(properties::delete),
        )
        .route(
            "/api/v1/properties/{id}/images",
            post(properties::upload_image),
        )
        .route("/api/v1/images", delete(properties::delete_image))
        // Clients
        .route("/api/v1/clients", get(clients::list).post(clients::create))
        .route(
            "/api/v1/clients/{id}",
            get(clients::get).put(clients::update).delete(clients::delete),
        )
        .route(
            "/api/v1/clients/{id}/interactions",
            post(clients::add_interaction),
        )
}
