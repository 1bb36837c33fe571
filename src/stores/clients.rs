use std::sync::Arc;

use tokio::sync::watch;

use super::{Listing, Snapshot, Status};
use crate::backend::Backend;
use crate::db;
use crate::error::AppError;
use crate::models::{
    Client, ClientData, ClientInteraction, ClientPatch, NewInteraction, Validate, to_fields,
};

/// The signed-in realtor's clients.
pub struct ClientsStore {
    backend: Backend,
    listing: Listing<Client>,
    current: watch::Sender<Option<Client>>,
    status: Status,
}

impl ClientsStore {
    pub fn new(backend: Backend) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            backend,
            listing: Listing::new(),
            current,
            status: Status::new(),
        }
    }

    pub fn clients(&self) -> Arc<Vec<Client>> {
        self.listing.items()
    }

    pub fn client_count(&self) -> usize {
        self.listing.len()
    }

    pub fn current_client(&self) -> Option<Client> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Client>> {
        self.listing.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.status.error()
    }

    pub async fn fetch_user_clients(&self, user_id: &str) -> Result<Arc<Vec<Client>>, AppError> {
        self.status
            .track("Error fetching clients", async {
                let generation = self.listing.begin();
                let clients = Arc::new(
                    db::clients::list_by_realtor(self.backend.documents.as_ref(), user_id).await?,
                );
                tracing::debug!(user_id, count = clients.len(), "Clients fetched");
                self.listing.publish(generation, clients.clone());
                Ok(clients)
            })
            .await
    }

    pub async fn fetch_client(&self, id: &str) -> Result<Client, AppError> {
        self.status
            .track("Error fetching client", self.load_client(id))
            .await
    }

    async fn load_client(&self, id: &str) -> Result<Client, AppError> {
        let client = db::clients::find_by_id(self.backend.documents.as_ref(), id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;
        self.current.send_replace(Some(client.clone()));
        Ok(client)
    }

    pub async fn add_client(&self, client: ClientData) -> Result<String, AppError> {
        self.status
            .track("Error adding client", async {
                client.validate()?;
                let fields = to_fields(&client)?;
                let id = db::clients::create(self.backend.documents.as_ref(), fields).await?;
                tracing::info!(%id, realtor_id = %client.realtor_id, "Client created");
                Ok(id)
            })
            .await
    }

    pub async fn update_client(&self, id: &str, patch: ClientPatch) -> Result<(), AppError> {
        self.status
            .track("Error updating client", async {
                patch.validate()?;
                let fields = to_fields(&patch)?;
                db::clients::update(self.backend.documents.as_ref(), id, fields).await
            })
            .await
    }

    pub async fn delete_client(&self, id: &str) -> Result<(), AppError> {
        self.status
            .track("Error deleting client", async {
                db::clients::delete(self.backend.documents.as_ref(), id).await?;
                self.listing.remove_where(|c| c.id == id);
                self.current.send_if_modified(|current| match current {
                    Some(c) if c.id == id => {
                        *current = None;
                        true
                    }
                    _ => false,
                });
                tracing::info!(%id, "Client deleted");
                Ok(())
            })
            .await
    }

    /// Append an interaction to the client's history and reload the client.
    ///
    /// Read-modify-write: two concurrent appends on the same client can lose one.
    pub async fn add_interaction(
        &self,
        client_id: &str,
        interaction: NewInteraction,
    ) -> Result<ClientInteraction, AppError> {
        self.status
            .track("Error adding interaction", async {
                let client = db::clients::find_by_id(self.backend.documents.as_ref(), client_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

                let interaction = interaction.into_interaction();
                let mut interactions = client.data.interactions;
                interactions.push(interaction.clone());

                let patch = ClientPatch {
                    interactions: Some(interactions),
                    ..ClientPatch::default()
                };
                self.update_client(client_id, patch).await?;
                self.load_client(client_id).await?;
                Ok(interaction)
            })
            .await
    }
}
