use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{RESERVED_KEYS, Validate, check_extra};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Active,
    Potential,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Call,
    Meeting,
    Email,
    Message,
    Showing,
    Other,
}

/// What a client is looking for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interests {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInteraction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub date: DateTime<Utc>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_steps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_property_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An interaction as logged by the realtor; id and creation time are assigned on append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInteraction {
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub date: DateTime<Utc>,
    pub description: String,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub next_steps: Option<String>,
    #[serde(default)]
    pub related_property_id: Option<String>,
}

impl NewInteraction {
    pub fn into_interaction(self) -> ClientInteraction {
        ClientInteraction {
            id: uuid::Uuid::now_v7().to_string(),
            kind: self.kind,
            date: self.date,
            description: self.description,
            outcome: self.outcome,
            next_steps: self.next_steps,
            related_property_id: self.related_property_id,
            created_at: Utc::now(),
            extra: Map::new(),
        }
    }
}

/// Client fields as written by the realtor: a client without its id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_phone: Option<String>,
    pub status: ClientStatus,
    #[serde(default)]
    pub interests: Interests,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub interactions: Vec<ClientInteraction>,
    pub realtor_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Validate for ClientData {
    fn validate(&self) -> Result<(), AppError> {
        check_extra(&self.extra, RESERVED_KEYS)?;
        check_extra(&self.interests.extra, &[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    #[serde(flatten)]
    pub data: ClientData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial client update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClientStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Interests>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactions: Option<Vec<ClientInteraction>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Validate for ClientPatch {
    fn validate(&self) -> Result<(), AppError> {
        check_extra(&self.extra, RESERVED_KEYS)?;
        check_extra(&self.extra, &["realtorId"])?;
        match &self.interests {
            Some(interests) => check_extra(&interests.extra, &[]),
            None => Ok(()),
        }
    }
}
