use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::watch;

use super::{Listing, Snapshot, Status};
use crate::backend::Backend;
use crate::db;
use crate::error::AppError;
use crate::models::{Property, PropertyData, PropertyFilter, PropertyPatch, Validate, to_fields};

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// The signed-in realtor's listings.
pub struct PropertiesStore {
    backend: Backend,
    listing: Listing<Property>,
    current: watch::Sender<Option<Property>>,
    status: Status,
    /// Last millisecond handed out to an upload path.
    last_upload_ms: AtomicI64,
}

impl PropertiesStore {
    pub fn new(backend: Backend) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            backend,
            listing: Listing::new(),
            current,
            status: Status::new(),
            last_upload_ms: AtomicI64::new(0),
        }
    }

    pub fn properties(&self) -> Arc<Vec<Property>> {
        self.listing.items()
    }

    pub fn property_count(&self) -> usize {
        self.listing.len()
    }

    pub fn current_property(&self) -> Option<Property> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot<Property>> {
        self.listing.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.status.error()
    }

    /// Cached listings matching `filter`. No remote call.
    pub fn filtered(&self, filter: &PropertyFilter) -> Vec<Property> {
        self.listing
            .items()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect()
    }

    /// Replace the cached list with `user_id`'s listings, newest first.
    ///
    /// Returns what this call fetched, even when a newer fetch has already
    /// replaced the cached list.
    pub async fn fetch_user_properties(&self, user_id: &str) -> Result<Arc<Vec<Property>>, AppError> {
        self.status
            .track("Error fetching properties", async {
                let generation = self.listing.begin();
                let properties = Arc::new(
                    db::properties::list_by_owner(self.backend.documents.as_ref(), user_id).await?,
                );
                tracing::debug!(user_id, count = properties.len(), "Properties fetched");
                self.listing.publish(generation, properties.clone());
                Ok(properties)
            })
            .await
    }

    pub async fn fetch_property(&self, id: &str) -> Result<Property, AppError> {
        self.status
            .track("Error fetching property", async {
                let property = db::properties::find_by_id(self.backend.documents.as_ref(), id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Property not found".to_string()))?;
                self.current.send_replace(Some(property.clone()));
                Ok(property)
            })
            .await
    }

    /// Create a listing and return its id. The cached list is not refreshed.
    pub async fn add_property(&self, property: PropertyData) -> Result<String, AppError> {
        self.status
            .track("Error adding property", async {
                property.validate()?;
                let fields = to_fields(&property)?;
                let id = db::properties::create(self.backend.documents.as_ref(), fields).await?;
                tracing::info!(%id, user_id = %property.user_id, "Property created");
                Ok(id)
            })
            .await
    }

    pub async fn update_property(&self, id: &str, patch: PropertyPatch) -> Result<(), AppError> {
        self.status
            .track("Error updating property", async {
                patch.validate()?;
                let fields = to_fields(&patch)?;
                db::properties::update(self.backend.documents.as_ref(), id, fields).await
            })
            .await
    }

    /// Delete remotely, then drop the listing from the cached list.
    pub async fn delete_property(&self, id: &str) -> Result<(), AppError> {
        self.status
            .track("Error deleting property", async {
                db::properties::delete(self.backend.documents.as_ref(), id).await?;
                self.listing.remove_where(|p| p.id == id);
                self.current.send_if_modified(|current| match current {
                    Some(p) if p.id == id => {
                        *current = None;
                        true
                    }
                    _ => false,
                });
                tracing::info!(%id, "Property deleted");
                Ok(())
            })
            .await
    }

    /// Store an image under `properties/{id}/{millis}_{name}` and return its download URL.
    pub async fn upload_property_image(
        &self,
        property_id: &str,
        file: ImageFile,
    ) -> Result<String, AppError> {
        self.status
            .track("Error uploading image", async {
                let path = format!(
                    "properties/{property_id}/{}_{}",
                    self.next_upload_ms(),
                    file.name
                );
                let blobs = &self.backend.blobs;
                blobs
                    .upload(&path, file.data, file.content_type.as_deref())
                    .await?;
                let url = blobs.download_url(&path).await?;
                tracing::info!(%path, "Image uploaded");
                Ok(url)
            })
            .await
    }

    /// Delete the blob behind `url`. Listings that reference it are left as they are.
    pub async fn delete_property_image(&self, url: &str) -> Result<(), AppError> {
        self.status
            .track("Error deleting image", self.backend.blobs.delete(url))
            .await
    }

    /// Wall-clock millis, bumped past the previous value so two uploads of the
    /// same file name never share a path.
    fn next_upload_ms(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_upload_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(prev + 1)
    }
}
