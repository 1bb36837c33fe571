use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{RESERVED_KEYS, Validate, check_extra};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Fixed,
    Negotiable,
    Contract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Active,
    Pending,
    Sold,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    pub area: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_parking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_elevator: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Listing fields as written by the owner: a property without its id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyData {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub price_type: PriceType,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    pub status: PropertyStatus,
    #[serde(default)]
    pub featured: bool,
    pub address: Address,
    pub details: PropertyDetails,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
    pub contact_info: ContactInfo,
    pub user_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Validate for PropertyData {
    fn validate(&self) -> Result<(), AppError> {
        check_extra(&self.extra, RESERVED_KEYS)?;
        check_extra(&self.details.extra, &[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    #[serde(flatten)]
    pub data: PropertyData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial listing update. Absent fields are left untouched; nested records
/// are replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_type: Option<PriceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PropertyStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<PropertyDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Validate for PropertyPatch {
    fn validate(&self) -> Result<(), AppError> {
        // Ownership moves are not a partial update.
        check_extra(&self.extra, RESERVED_KEYS)?;
        check_extra(&self.extra, &["userId"])?;
        match &self.details {
            Some(details) => check_extra(&details.extra, &[]),
            None => Ok(()),
        }
    }
}

/// Client-side filter over a cached listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub status: Option<PropertyStatus>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub area_min: Option<f64>,
    #[serde(default)]
    pub area_max: Option<f64>,
    /// Minimum number of rooms.
    #[serde(default)]
    pub rooms: Option<u32>,
    #[serde(default)]
    pub featured: Option<bool>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        let p = &property.data;
        self.category.as_ref().is_none_or(|c| *c == p.category)
            && self.subcategory.as_ref().is_none_or(|s| *s == p.subcategory)
            && self.status.is_none_or(|s| s == p.status)
            && self.price_min.is_none_or(|min| p.price >= min)
            && self.price_max.is_none_or(|max| p.price <= max)
            && self.area_min.is_none_or(|min| p.details.area >= min)
            && self.area_max.is_none_or(|max| p.details.area <= max)
            && self
                .rooms
                .is_none_or(|min| p.details.rooms.is_some_and(|r| r >= min))
            && self.featured.is_none_or(|f| f == p.featured)
    }
}
