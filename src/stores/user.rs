use serde_json::{Value, json};
use tokio::sync::watch;

use super::Status;
use crate::backend::Backend;
use crate::db;
use crate::error::AppError;
use crate::models::user::{PERMISSION_MANAGE_CLIENTS, PERMISSION_MANAGE_PROPERTIES};
use crate::models::{ProfileUpdate, Registration, Role, User, Validate, to_fields};
use crate::session::{AuthSession, SessionState};

/// The signed-in realtor's identity and profile.
pub struct UserStore {
    backend: Backend,
    session: SessionState,
    current: watch::Sender<Option<User>>,
    status: Status,
}

impl UserStore {
    pub fn new(backend: Backend, session: SessionState) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            backend,
            session,
            current,
            status: Status::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.current.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.status.error()
    }

    /// Load the profile for an already-active session, then signal that the
    /// auth state has settled. A load failure is recorded, not returned.
    pub async fn init(&self) {
        let result = self
            .status
            .track("Failed to initialize user", async {
                if self.session.is_authenticated() {
                    self.load_profile().await?;
                }
                Ok(())
            })
            .await;

        if result.is_err() {
            self.status.set_error("Failed to load user data");
        }
        self.session.mark_settled();
    }

    /// Reload the profile of the signed-in user. A missing profile document is
    /// logged and leaves the cached profile as it was.
    pub async fn fetch_user_data(&self) -> Result<Option<User>, AppError> {
        self.status
            .track("Error fetching user data", self.load_profile())
            .await
    }

    async fn load_profile(&self) -> Result<Option<User>, AppError> {
        let Some(uid) = self.session.uid() else {
            return Ok(None);
        };

        match db::users::find_by_id(self.backend.documents.as_ref(), &uid).await? {
            Some(user) => {
                self.current.send_replace(Some(user.clone()));
                Ok(Some(user))
            }
            None => {
                tracing::warn!(%uid, "No user document found");
                Ok(None)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        self.status
            .track("Login error", async {
                let session = self.backend.identity.sign_in(email, password).await?;
                self.session.set(session.clone());
                self.load_profile().await?;
                db::users::touch_last_login(self.backend.documents.as_ref(), &session.uid).await?;
                tracing::info!(uid = %session.uid, "User signed in");
                Ok(session)
            })
            .await
    }

    /// Create the account and its profile with the default realtor role.
    pub async fn register(&self, registration: Registration) -> Result<AuthSession, AppError> {
        self.status
            .track("Registration error", async {
                let identity = &self.backend.identity;
                let session = identity
                    .sign_up(&registration.email, &registration.password)
                    .await?;
                self.session.set(session.clone());

                let session = identity
                    .update_display_name(&session, &registration.name)
                    .await?;
                self.session.set(session.clone());

                let profile = new_profile(&session.uid, registration)?;
                db::users::create(self.backend.documents.as_ref(), &session.uid, profile).await?;
                self.load_profile().await?;

                tracing::info!(uid = %session.uid, "User registered");
                Ok(session)
            })
            .await
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.status
            .track("Logout error", async {
                if let Some(session) = self.session.current() {
                    self.backend.identity.sign_out(&session).await?;
                }
                self.session.clear();
                self.current.send_replace(None);
                Ok(())
            })
            .await
    }

    pub async fn reset_password(&self, email: &str) -> Result<(), AppError> {
        self.status
            .track(
                "Password reset error",
                self.backend.identity.send_password_reset(email),
            )
            .await
    }

    /// Merge `update` into the profile and reload it.
    pub async fn update_user_profile(&self, update: ProfileUpdate) -> Result<Option<User>, AppError> {
        self.status
            .track("Profile update error", async {
                let has_profile = self.current.borrow().is_some();
                let uid = match self.session.uid() {
                    Some(uid) if has_profile => uid,
                    _ => return Err(AppError::not_authenticated()),
                };
                update.validate()?;

                let fields = to_fields(&update)?;
                db::users::update(self.backend.documents.as_ref(), &uid, fields).await?;
                self.load_profile().await
            })
            .await
    }
}

fn new_profile(
    uid: &str,
    registration: Registration,
) -> Result<serde_json::Map<String, Value>, AppError> {
    let profile = json!({
        "id": uid,
        "email": registration.email,
        "name": registration.name,
        "agency": registration.agency.unwrap_or_default(),
        "phones": registration.phones,
        "experience": registration.experience,
        "city": registration.city,
        "region": registration.region,
        "avatar": "",
        "featured": false,
        "rating": 0,
        "reviews": 0,
        "role": Role::realtor(),
        "permissions": [PERMISSION_MANAGE_PROPERTIES, PERMISSION_MANAGE_CLIENTS],
    });
    to_fields(&profile)
}
