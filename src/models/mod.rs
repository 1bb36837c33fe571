pub mod client;
pub mod property;
pub mod user;

pub use client::{
    Client, ClientData, ClientInteraction, ClientPatch, ClientStatus, InteractionType, Interests,
    NewInteraction,
};
pub use property::{
    Address, ContactInfo, Coordinates, PriceType, Property, PropertyData, PropertyDetails,
    PropertyFilter, PropertyPatch, PropertyStatus,
};
pub use user::{City, ProfileUpdate, Region, Registration, Role, User};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;

/// Keys that no extension map may carry at the top level of a document.
pub const RESERVED_KEYS: &[&str] = &["id", "createdAt", "updatedAt"];

/// Boundary check for records that carry open extension fields.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Reject extension keys that are empty, use the store's `__name__` form, or
/// shadow one of `reserved`.
pub fn check_extra(extra: &Map<String, Value>, reserved: &[&str]) -> Result<(), AppError> {
    for key in extra.keys() {
        if key.is_empty() {
            return Err(AppError::BadRequest("Field names must not be empty".to_string()));
        }
        if key.starts_with("__") && key.ends_with("__") {
            return Err(AppError::BadRequest(format!("Field name '{key}' is reserved")));
        }
        if reserved.contains(&key.as_str()) {
            return Err(AppError::BadRequest(format!("Field '{key}' cannot be set directly")));
        }
    }
    Ok(())
}

/// Serialize a record into the top-level field map written to the store.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Internal(format!("Expected an object, got {other}"))),
    }
}
