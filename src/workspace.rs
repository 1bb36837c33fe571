//! One browser session's containers, keyed by the session cookie.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::backend::BackendFactory;
use crate::session::SessionState;
use crate::stores::{ClientsStore, PropertiesStore, UserStore};

/// The identity session and the three state containers of one browser session.
pub struct Workspace {
    pub id: Uuid,
    pub session: SessionState,
    pub users: UserStore,
    pub properties: PropertiesStore,
    pub clients: ClientsStore,
    last_seen: Mutex<Instant>,
}

impl Workspace {
    pub fn new(factory: &dyn BackendFactory) -> Self {
        let session = SessionState::new();
        let backend = factory.connect(&session);
        Self {
            id: Uuid::now_v7(),
            users: UserStore::new(backend.clone(), session.clone()),
            properties: PropertiesStore::new(backend.clone()),
            clients: ClientsStore::new(backend),
            session,
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }

    /// Uid of the signed-in user, if any.
    pub fn uid(&self) -> Option<String> {
        self.session.uid()
    }
}

pub struct WorkspaceRegistry {
    factory: Arc<dyn BackendFactory>,
    workspaces: DashMap<Uuid, Arc<Workspace>>,
}

impl WorkspaceRegistry {
    pub fn new(factory: Arc<dyn BackendFactory>) -> Self {
        Self {
            factory,
            workspaces: DashMap::new(),
        }
    }

    /// Create and initialise a workspace without registering it.
    pub async fn create(&self) -> Arc<Workspace> {
        let workspace = Arc::new(Workspace::new(self.factory.as_ref()));
        workspace.users.init().await;
        workspace
    }

    /// Register a workspace so later requests carrying its id find it.
    pub fn insert(&self, workspace: Arc<Workspace>) {
        if self.workspaces.insert(workspace.id, workspace.clone()).is_none() {
            tracing::debug!(id = %workspace.id, "Workspace opened");
        }
    }

    /// Create, initialise and register a workspace.
    pub async fn open(&self) -> Arc<Workspace> {
        let workspace = self.create().await;
        self.insert(workspace.clone());
        workspace
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Workspace>> {
        let workspace = self.workspaces.get(id)?.value().clone();
        workspace.touch();
        Some(workspace)
    }

    pub fn remove(&self, id: &Uuid) {
        self.workspaces.remove(id);
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    /// Drop workspaces idle for longer than `max_idle`. Returns how many were dropped.
    pub fn cleanup(&self, max_idle: Duration) -> usize {
        let before = self.workspaces.len();
        self.workspaces.retain(|_, ws| ws.idle_for() < max_idle);
        let evicted = before.saturating_sub(self.workspaces.len());
        if evicted > 0 {
            tracing::info!(evicted, "Evicted idle workspaces");
        }
        evicted
    }
}
