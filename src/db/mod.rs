//! Collection access over the document store, one module per collection.

pub mod clients;
pub mod properties;
pub mod users;

pub const USERS: &str = "users";
pub const PROPERTIES: &str = "properties";
pub const CLIENTS: &str = "clients";

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
