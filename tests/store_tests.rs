mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use serde_json::json;

use realtydesk::backend::memory::{MemoryBackend, MemoryDocuments};
use realtydesk::backend::{
    Backend, Document, DocumentStore, DocumentWrite, IdentityProvider, Query,
};
use realtydesk::auth::password;
use realtydesk::error::AppError;
use realtydesk::models::{
    ClientData, InteractionType, NewInteraction, ProfileUpdate, PropertyData, PropertyFilter,
    PropertyStatus, Registration,
};
use realtydesk::session::{AuthSession, SessionState};
use realtydesk::stores::properties::ImageFile;
use realtydesk::stores::{ClientsStore, Listing, PropertiesStore, UserStore};
use realtydesk::workspace::WorkspaceRegistry;

fn property(user_id: &str, title: &str, price: f64) -> PropertyData {
    let mut value = common::property_json(title, price);
    value["userId"] = json!(user_id);
    serde_json::from_value(value).unwrap()
}

fn client(realtor_id: &str, name: &str) -> ClientData {
    let mut value = common::client_json(name);
    value["realtorId"] = json!(realtor_id);
    serde_json::from_value(value).unwrap()
}

fn registration(email: &str, password: &str) -> Registration {
    serde_json::from_value(json!({
        "email": email,
        "password": password,
        "name": "Olena",
        "phones": ["+380501234567"],
        "experience": 3,
    }))
    .unwrap()
}

fn image(name: &str, data: &'static [u8]) -> ImageFile {
    ImageFile {
        name: name.to_string(),
        content_type: Some("image/jpeg".to_string()),
        data: Bytes::from_static(data),
    }
}

/// A document store whose every call fails.
struct UnavailableDocuments;

impl UnavailableDocuments {
    fn error() -> AppError {
        AppError::provider("firestore/unavailable", "The service is currently unavailable.")
    }
}

#[async_trait]
impl DocumentStore for UnavailableDocuments {
    async fn get(&self, _: &str, _: &str) -> Result<Option<Document>, AppError> {
        Err(Self::error())
    }
    async fn add(&self, _: &str, _: DocumentWrite) -> Result<String, AppError> {
        Err(Self::error())
    }
    async fn set(&self, _: &str, _: &str, _: DocumentWrite) -> Result<(), AppError> {
        Err(Self::error())
    }
    async fn update(&self, _: &str, _: &str, _: DocumentWrite) -> Result<(), AppError> {
        Err(Self::error())
    }
    async fn delete(&self, _: &str, _: &str) -> Result<(), AppError> {
        Err(Self::error())
    }
    async fn query(&self, _: &Query) -> Result<Vec<Document>, AppError> {
        Err(Self::error())
    }
}

/// Wraps the in-memory documents: owner queries for `slow_owner` stall
/// briefly, and deletes fail when `fail_deletes` is set.
struct SlowDocuments {
    inner: Arc<MemoryDocuments>,
    slow_owner: Option<&'static str>,
    fail_deletes: bool,
}

impl SlowDocuments {
    fn new(mem: &MemoryBackend) -> Self {
        Self {
            inner: mem.documents().clone(),
            slow_owner: None,
            fail_deletes: false,
        }
    }

    fn backend(self, mem: &MemoryBackend) -> Backend {
        Backend {
            documents: Arc::new(self),
            ..mem.backend()
        }
    }
}

#[async_trait]
impl DocumentStore for SlowDocuments {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        self.inner.get(collection, id).await
    }
    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<String, AppError> {
        self.inner.add(collection, write).await
    }
    async fn set(&self, collection: &str, id: &str, write: DocumentWrite) -> Result<(), AppError> {
        self.inner.set(collection, id, write).await
    }
    async fn update(&self, collection: &str, id: &str, write: DocumentWrite) -> Result<(), AppError> {
        self.inner.update(collection, id, write).await
    }
    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        if self.fail_deletes {
            return Err(AppError::provider(
                "firestore/permission-denied",
                "Missing or insufficient permissions.",
            ));
        }
        self.inner.delete(collection, id).await
    }
    async fn query(&self, query: &Query) -> Result<Vec<Document>, AppError> {
        let slow = match (&query.filter, self.slow_owner) {
            (Some((_, value)), Some(owner)) => value == owner,
            _ => false,
        };
        if slow {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.inner.query(query).await
    }
}

fn signed_in(uid: &str) -> SessionState {
    let session = SessionState::new();
    session.set(AuthSession {
        uid: uid.to_string(),
        email: format!("{uid}@test.com"),
        display_name: None,
        id_token: "token".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    });
    session
}

// ── Listing ─────────────────────────────────────────────────────

#[test]
fn stale_fetch_cannot_overwrite_newer_list() {
    let listing = Listing::<u32>::new();
    let older = listing.begin();
    let newer = listing.begin();

    assert!(listing.publish(newer, Arc::new(vec![2])));
    assert!(!listing.publish(older, Arc::new(vec![1])));
    assert_eq!(*listing.items(), vec![2]);
}

#[test]
fn removal_invalidates_fetches_in_flight() {
    let listing = Listing::<u32>::new();
    let first = listing.begin();
    assert!(listing.publish(first, Arc::new(vec![1, 2, 3])));

    let in_flight = listing.begin();
    listing.remove_where(|x| *x == 2);
    assert!(!listing.publish(in_flight, Arc::new(vec![1, 2, 3])));
    assert_eq!(*listing.items(), vec![1, 3]);

    let rx = listing.subscribe();
    assert_eq!(*rx.borrow().items, vec![1, 3]);
}

// ── Properties ──────────────────────────────────────────────────

#[tokio::test]
async fn fetch_returns_only_the_owners_listings_newest_first() {
    let mem = MemoryBackend::new();
    let store = PropertiesStore::new(mem.backend());

    let old = store.add_property(property("u1", "Old", 10.0)).await.unwrap();
    store.add_property(property("u2", "Other", 20.0)).await.unwrap();
    let new = store.add_property(property("u1", "New", 30.0)).await.unwrap();

    let list = store.fetch_user_properties("u1").await.unwrap();
    let ids: Vec<&str> = list.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec![new.as_str(), old.as_str()]);
    assert!(list.iter().all(|p| p.data.user_id == "u1"));
    assert!(list[0].created_at > list[1].created_at);
    assert_eq!(store.property_count(), 2);
    assert!(!store.is_loading());
    assert!(store.error().is_none());
}

#[tokio::test]
async fn add_does_not_refresh_the_cached_list() {
    let mem = MemoryBackend::new();
    let store = PropertiesStore::new(mem.backend());

    store.fetch_user_properties("u1").await.unwrap();
    store.add_property(property("u1", "New", 30.0)).await.unwrap();
    assert_eq!(store.property_count(), 0);
}

#[tokio::test]
async fn delete_drops_the_listing_from_the_cache() {
    let mem = MemoryBackend::new();
    let store = PropertiesStore::new(mem.backend());

    let keep = store.add_property(property("u1", "Keep", 10.0)).await.unwrap();
    let gone = store.add_property(property("u1", "Gone", 20.0)).await.unwrap();
    store.fetch_user_properties("u1").await.unwrap();
    store.fetch_property(&gone).await.unwrap();

    store.delete_property(&gone).await.unwrap();

    let ids: Vec<String> = store.properties().iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, vec![keep]);
    assert!(store.current_property().is_none());
    assert_eq!(mem.documents().count("properties"), 1);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn fetch_missing_property_records_the_error() {
    let mem = MemoryBackend::new();
    let store = PropertiesStore::new(mem.backend());

    let err = store.fetch_property("missing").await.unwrap_err();
    assert_eq!(err, AppError::NotFound("Property not found".to_string()));
    assert_eq!(store.error().as_deref(), Some("Property not found"));
    assert!(!store.is_loading());

    // The next successful call clears it.
    store.fetch_user_properties("u1").await.unwrap();
    assert!(store.error().is_none());
}

#[tokio::test]
async fn update_merges_and_stamps() {
    let mem = MemoryBackend::new();
    let store = PropertiesStore::new(mem.backend());
    let id = store.add_property(property("u1", "Flat", 10.0)).await.unwrap();
    let before = store.fetch_property(&id).await.unwrap();

    let patch = serde_json::from_value(json!({ "status": "sold", "price": 12.5 })).unwrap();
    store.update_property(&id, patch).await.unwrap();

    let after = store.fetch_property(&id).await.unwrap();
    assert_eq!(after.data.status, PropertyStatus::Sold);
    assert_eq!(after.data.price, 12.5);
    assert_eq!(after.data.title, "Flat");
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn filtered_reads_the_cache_only() {
    let mem = MemoryBackend::new();
    let store = PropertiesStore::new(mem.backend());
    store.add_property(property("u1", "Cheap", 100.0)).await.unwrap();
    store.add_property(property("u1", "Mid", 500.0)).await.unwrap();
    store.add_property(property("u1", "Dear", 900.0)).await.unwrap();
    store.fetch_user_properties("u1").await.unwrap();

    let filter = PropertyFilter {
        price_min: Some(200.0),
        price_max: Some(800.0),
        ..PropertyFilter::default()
    };
    let hits = store.filtered(&filter);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].data.title, "Mid");

    let filter = PropertyFilter {
        rooms: Some(3),
        ..PropertyFilter::default()
    };
    assert!(store.filtered(&filter).is_empty());
}

#[tokio::test]
async fn concurrent_fetches_all_complete() {
    let mem = MemoryBackend::new();
    let store = Arc::new(PropertiesStore::new(mem.backend()));
    store.add_property(property("u1", "Flat", 10.0)).await.unwrap();

    let (a, b, c) = tokio::join!(
        store.fetch_user_properties("u1"),
        store.fetch_user_properties("u1"),
        store.fetch_property("missing"),
    );
    assert_eq!(a.unwrap().len(), 1);
    assert_eq!(b.unwrap().len(), 1);
    assert!(c.is_err());
    assert!(!store.is_loading());
    assert_eq!(store.property_count(), 1);
}

#[tokio::test]
async fn overlapping_fetches_return_their_own_owners_listings() {
    let mem = MemoryBackend::new();
    let docs = SlowDocuments {
        slow_owner: Some("u1"),
        ..SlowDocuments::new(&mem)
    };
    let store = PropertiesStore::new(docs.backend(&mem));
    store.add_property(property("u1", "Slow", 10.0)).await.unwrap();
    store.add_property(property("u2", "Fast", 20.0)).await.unwrap();
    store.add_property(property("u2", "Faster", 30.0)).await.unwrap();

    let (slow, fast) = tokio::join!(
        store.fetch_user_properties("u1"),
        store.fetch_user_properties("u2"),
    );
    let slow = slow.unwrap();
    let fast = fast.unwrap();

    assert_eq!(slow.len(), 1);
    assert!(slow.iter().all(|p| p.data.user_id == "u1"));
    assert_eq!(fast.len(), 2);
    assert!(fast.iter().all(|p| p.data.user_id == "u2"));

    // u2's fetch started last, so its list is the one cached.
    assert!(store.properties().iter().all(|p| p.data.user_id == "u2"));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn failed_delete_keeps_the_cached_list() {
    let mem = MemoryBackend::new();
    let seed = PropertiesStore::new(mem.backend());
    let id = seed.add_property(property("u1", "Flat", 10.0)).await.unwrap();
    seed.add_property(property("u1", "House", 20.0)).await.unwrap();

    let docs = SlowDocuments {
        fail_deletes: true,
        ..SlowDocuments::new(&mem)
    };
    let store = PropertiesStore::new(docs.backend(&mem));
    let before = store.fetch_user_properties("u1").await.unwrap();
    store.fetch_property(&id).await.unwrap();

    let err = store.delete_property(&id).await.unwrap_err();
    assert_eq!(err.code(), Some("firestore/permission-denied"));
    assert_eq!(*store.properties(), *before);
    assert_eq!(store.current_property().map(|p| p.id), Some(id));
    assert!(store.error().unwrap().contains("firestore/permission-denied"));
    assert!(!store.is_loading());
    assert_eq!(mem.documents().count("properties"), 2);
}

#[tokio::test]
async fn subscribers_see_each_published_list() {
    let mem = MemoryBackend::new();
    let store = PropertiesStore::new(mem.backend());
    let mut rx = store.subscribe();
    assert!(rx.borrow_and_update().items.is_empty());

    let id = store.add_property(property("u1", "Flat", 10.0)).await.unwrap();
    store.fetch_user_properties("u1").await.unwrap();
    assert!(rx.has_changed().unwrap());
    let ids: Vec<String> = rx.borrow_and_update().items.iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, vec![id.clone()]);

    store.delete_property(&id).await.unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().items.is_empty());
}

#[tokio::test]
async fn uploads_with_the_same_name_get_distinct_urls() {
    let mem = MemoryBackend::new();
    let store = PropertiesStore::new(mem.backend());

    let first = store
        .upload_property_image("p1", image("front.jpg", b"one"))
        .await
        .unwrap();
    let second = store
        .upload_property_image("p1", image("front.jpg", b"two"))
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(mem.blobs().read(&first).unwrap(), Bytes::from_static(b"one"));
    assert_eq!(mem.blobs().read(&second).unwrap(), Bytes::from_static(b"two"));
    assert_eq!(mem.blobs().len(), 2);

    store.delete_property_image(&first).await.unwrap();
    assert!(mem.blobs().read(&first).is_none());

    let err = store.delete_property_image(&first).await.unwrap_err();
    assert_eq!(err.code(), Some("storage/object-not-found"));
}

// ── Clients ─────────────────────────────────────────────────────

#[tokio::test]
async fn added_client_reads_back_with_timestamps() {
    let mem = MemoryBackend::new();
    let store = ClientsStore::new(mem.backend());

    let data = client("u1", "Taras");
    let id = store.add_client(data.clone()).await.unwrap();
    let fetched = store.fetch_client(&id).await.unwrap();

    assert_eq!(fetched.id, id);
    assert_eq!(fetched.data, data);
    assert!(fetched.created_at.is_some());
    assert_eq!(fetched.created_at, fetched.updated_at);
    assert_eq!(store.current_client().map(|c| c.id), Some(id));
}

#[tokio::test]
async fn clients_are_scoped_to_their_realtor() {
    let mem = MemoryBackend::new();
    let store = ClientsStore::new(mem.backend());
    store.add_client(client("u1", "A")).await.unwrap();
    store.add_client(client("u2", "B")).await.unwrap();
    let latest = store.add_client(client("u1", "C")).await.unwrap();

    let list = store.fetch_user_clients("u1").await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, latest);
    assert_eq!(store.client_count(), 2);

    store.delete_client(&latest).await.unwrap();
    assert_eq!(store.client_count(), 1);
    assert!(store.current_client().is_none());
}

#[tokio::test]
async fn overlapping_client_fetches_return_their_own_realtors_clients() {
    let mem = MemoryBackend::new();
    let docs = SlowDocuments {
        slow_owner: Some("u1"),
        ..SlowDocuments::new(&mem)
    };
    let store = ClientsStore::new(docs.backend(&mem));
    store.add_client(client("u1", "A")).await.unwrap();
    store.add_client(client("u2", "B")).await.unwrap();

    let (slow, fast) = tokio::join!(
        store.fetch_user_clients("u1"),
        store.fetch_user_clients("u2"),
    );
    let slow = slow.unwrap();
    let fast = fast.unwrap();

    assert_eq!(slow.len(), 1);
    assert_eq!(slow[0].data.realtor_id, "u1");
    assert_eq!(fast.len(), 1);
    assert_eq!(fast[0].data.realtor_id, "u2");
    assert_eq!(store.clients()[0].data.realtor_id, "u2");
}

#[tokio::test]
async fn failed_client_delete_keeps_the_cached_list() {
    let mem = MemoryBackend::new();
    let seed = ClientsStore::new(mem.backend());
    let id = seed.add_client(client("u1", "Taras")).await.unwrap();

    let docs = SlowDocuments {
        fail_deletes: true,
        ..SlowDocuments::new(&mem)
    };
    let store = ClientsStore::new(docs.backend(&mem));
    let mut rx = store.subscribe();
    let before = store.fetch_user_clients("u1").await.unwrap();
    rx.mark_unchanged();

    store.delete_client(&id).await.unwrap_err();
    assert_eq!(*store.clients(), *before);
    assert!(!rx.has_changed().unwrap());
    assert!(store.error().unwrap().contains("firestore/permission-denied"));
    assert!(!store.is_loading());
    assert_eq!(mem.documents().count("clients"), 1);
}

#[tokio::test]
async fn interactions_append_in_order() {
    let mem = MemoryBackend::new();
    let store = ClientsStore::new(mem.backend());
    let id = store.add_client(client("u1", "Taras")).await.unwrap();

    for (kind, description) in [
        (InteractionType::Call, "Intro call"),
        (InteractionType::Showing, "Showed flat"),
    ] {
        store
            .add_interaction(
                &id,
                NewInteraction {
                    kind,
                    date: Utc::now(),
                    description: description.to_string(),
                    outcome: None,
                    next_steps: None,
                    related_property_id: None,
                },
            )
            .await
            .unwrap();
    }

    let current = store.current_client().unwrap();
    let log: Vec<&str> = current
        .data
        .interactions
        .iter()
        .map(|i| i.description.as_str())
        .collect();
    assert_eq!(log, vec!["Intro call", "Showed flat"]);
    assert_ne!(current.data.interactions[0].id, current.data.interactions[1].id);
    assert_eq!(current.data.name, "Taras");
}

// ── User ────────────────────────────────────────────────────────

#[tokio::test]
async fn register_writes_the_default_profile() {
    let mem = MemoryBackend::new();
    let session = SessionState::new();
    let store = UserStore::new(mem.backend(), session.clone());

    let auth = store
        .register(registration("olena@test.com", "secret1"))
        .await
        .unwrap();
    assert_eq!(auth.display_name.as_deref(), Some("Olena"));
    assert_eq!(session.uid(), Some(auth.uid.clone()));

    let user = store.current_user().unwrap();
    assert_eq!(user.id, auth.uid);
    assert_eq!(user.role.id, "realtor");
    assert!(user.role.is_default);
    assert!(user.has_permission("manage_properties"));
    assert!(user.has_permission("manage_clients"));
    assert!(!user.featured);
    assert_eq!(user.rating, 0.0);
    assert_eq!(user.reviews, 0);
    assert_eq!(user.experience, 3);
    assert!(user.created_at.is_some());
    assert!(user.last_login.is_some());
}

#[tokio::test]
async fn profile_subscribers_follow_login_and_logout() {
    let mem = MemoryBackend::new();
    let store = UserStore::new(mem.backend(), SessionState::new());
    let mut rx = store.subscribe();
    assert!(rx.borrow_and_update().is_none());

    let auth = store
        .register(registration("olena@test.com", "secret1"))
        .await
        .unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(
        rx.borrow_and_update().as_ref().map(|u| u.id.clone()),
        Some(auth.uid)
    );

    store.logout().await.unwrap();
    assert!(rx.borrow_and_update().is_none());
}

#[tokio::test]
async fn weak_password_surfaces_the_provider_code() {
    let mem = MemoryBackend::new();
    let store = UserStore::new(mem.backend(), SessionState::new());

    let err = store.register(registration("a@b.com", "x")).await.unwrap_err();
    assert_eq!(err.code(), Some("auth/weak-password"));
    assert!(store.error().unwrap().contains("auth/weak-password"));
    assert!(store.current_user().is_none());
    assert!(!store.session().is_authenticated());
}

#[test]
fn password_hashes_are_salted_and_verifiable() {
    let first = password::hash("secret1").unwrap();
    let second = password::hash("secret1").unwrap();
    assert_ne!(first, second);
    assert!(first.starts_with("$argon2id$"));

    assert!(password::verify("secret1", &first).unwrap());
    assert!(!password::verify("secret2", &first).unwrap());
    assert!(matches!(
        password::verify("secret1", "not-a-phc-string"),
        Err(AppError::Internal(_))
    ));
}

#[test]
fn short_passwords_are_weak() {
    let err = password::check_strength("five5").unwrap_err();
    assert_eq!(err.code(), Some("auth/weak-password"));
    assert!(password::check_strength("sixsix").is_ok());
    // Counted in characters, not bytes.
    assert!(password::check_strength("пароль").is_ok());
    assert!(password::check_strength("ключ").is_err());
}

#[tokio::test]
async fn login_stamps_last_login() {
    let mem = MemoryBackend::new();
    let first = UserStore::new(mem.backend(), SessionState::new());
    let auth = first
        .register(registration("olena@test.com", "secret1"))
        .await
        .unwrap();
    let registered = first.current_user().unwrap();

    let second = UserStore::new(mem.backend(), SessionState::new());
    let again = second.login("olena@test.com", "secret1").await.unwrap();
    assert_eq!(again.uid, auth.uid);

    let reloaded = second.fetch_user_data().await.unwrap().unwrap();
    assert!(reloaded.last_login > registered.last_login);

    second.logout().await.unwrap();
    assert!(second.current_user().is_none());
    assert!(!second.session().is_authenticated());
}

#[tokio::test]
async fn login_without_profile_document_fails() {
    let mem = MemoryBackend::new();
    mem.identity().sign_up("ghost@test.com", "secret1").await.unwrap();

    let store = UserStore::new(mem.backend(), SessionState::new());
    let err = store.login("ghost@test.com", "secret1").await.unwrap_err();
    assert_eq!(err.code(), Some("firestore/not-found"));
}

#[tokio::test]
async fn missing_profile_document_is_not_an_error() {
    let mem = MemoryBackend::new();
    let auth = mem.identity().sign_up("ghost@test.com", "secret1").await.unwrap();

    let store = UserStore::new(mem.backend(), signed_in(&auth.uid));
    assert_eq!(store.fetch_user_data().await.unwrap(), None);
    assert!(store.error().is_none());
}

#[tokio::test]
async fn profile_update_requires_a_loaded_profile() {
    let mem = MemoryBackend::new();
    let store = UserStore::new(mem.backend(), SessionState::new());

    let err = store
        .update_user_profile(ProfileUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated(_)));
    assert_eq!(store.error().as_deref(), Some("User not authenticated"));
}

#[tokio::test]
async fn profile_update_merges_into_the_profile() {
    let mem = MemoryBackend::new();
    let store = UserStore::new(mem.backend(), SessionState::new());
    store
        .register(registration("olena@test.com", "secret1"))
        .await
        .unwrap();

    let update = ProfileUpdate {
        agency: Some("Prime".to_string()),
        ..ProfileUpdate::default()
    };
    let user = store.update_user_profile(update).await.unwrap().unwrap();
    assert_eq!(user.agency, "Prime");
    assert_eq!(user.name, "Olena");
    assert!(user.updated_at.is_some());
}

#[tokio::test]
async fn init_settles_even_when_the_profile_load_fails() {
    let mem = MemoryBackend::new();
    let backend = Backend {
        documents: Arc::new(UnavailableDocuments),
        ..mem.backend()
    };
    let session = signed_in("u1");
    let store = UserStore::new(backend, session.clone());

    store.init().await;

    assert!(session.is_settled());
    assert_eq!(store.error().as_deref(), Some("Failed to load user data"));
    assert!(store.current_user().is_none());
    assert!(!store.is_loading());
}

#[tokio::test]
async fn init_without_session_settles_immediately() {
    let mem = MemoryBackend::new();
    let session = SessionState::new();
    let store = UserStore::new(mem.backend(), session.clone());

    store.init().await;
    tokio::time::timeout(Duration::from_secs(1), session.settled())
        .await
        .unwrap();
    assert!(store.error().is_none());
}

// ── Workspaces ──────────────────────────────────────────────────

#[tokio::test]
async fn idle_workspaces_are_evicted() {
    let registry = WorkspaceRegistry::new(Arc::new(MemoryBackend::new()));
    let workspace = registry.open().await;
    assert!(workspace.session.is_settled());
    assert_eq!(registry.len(), 1);

    assert_eq!(registry.cleanup(Duration::from_secs(3600)), 0);
    assert!(registry.get(&workspace.id).is_some());

    assert_eq!(registry.cleanup(Duration::ZERO), 1);
    assert!(registry.is_empty());
    assert!(registry.get(&workspace.id).is_none());
}
