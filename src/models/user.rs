use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{RESERVED_KEYS, Validate, check_extra};
use crate::error::AppError;

pub const PERMISSION_MANAGE_PROPERTIES: &str = "manage_properties";
pub const PERMISSION_MANAGE_CLIENTS: &str = "manage_clients";

/// Realtor profile stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub agency: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub city: City,
    #[serde(default)]
    pub region: Region,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Settlement directory entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(rename = "Ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "DescriptionRu", default, skip_serializing_if = "Option::is_none")]
    pub description_ru: Option<String>,
    #[serde(rename = "AreaDescription", default, skip_serializing_if = "Option::is_none")]
    pub area_description: Option<String>,
    #[serde(
        rename = "SettlementTypeDescription",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub settlement_type_description: Option<String>,
    #[serde(rename = "Latitude", default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(rename = "Longitude", default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_editable: bool,
    #[serde(default)]
    pub is_removable: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Role {
    /// Role assigned to every self-registered account.
    pub fn realtor() -> Self {
        Role {
            id: "realtor".to_string(),
            name: "Риелтор".to_string(),
            description: "Пользователь с доступом к управлению недвижимостью.".to_string(),
            is_default: true,
            is_editable: false,
            is_removable: false,
            extra: Map::new(),
        }
    }
}

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub city: City,
    #[serde(default)]
    pub region: Region,
}

/// Partial profile update. Identity, role and reputation fields are not editable here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phones: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<City>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const PROFILE_LOCKED_KEYS: &[&str] = &[
    "email",
    "role",
    "permissions",
    "featured",
    "rating",
    "reviews",
    "lastLogin",
];

impl Validate for ProfileUpdate {
    fn validate(&self) -> Result<(), AppError> {
        check_extra(&self.extra, RESERVED_KEYS)?;
        check_extra(&self.extra, PROFILE_LOCKED_KEYS)
    }
}
