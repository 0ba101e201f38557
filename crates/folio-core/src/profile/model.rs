//! Profile domain model.

use crate::error::{FolioError, Result};
use crate::store::Row;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Table holding one profile row per identity.
pub const PROFILES_TABLE: &str = "profiles";

/// Role granted to a profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

/// User profile domain model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Same value as the owning identity id
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Decodes a row returned by the row store.
    pub fn from_row(row: Row) -> Result<Self> {
        Ok(serde_json::from_value(serde_json::Value::Object(row))?)
    }
}

/// Partial profile update.
///
/// Only fields set to `Some` are sent to the row store. `role` is deliberately
/// absent: roles are granted out of band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn full_name(name: impl Into<String>) -> Self {
        Self {
            full_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.avatar_url.is_none()
    }

    /// Converts the update into the field map sent to the row store,
    /// stamping `updated_at`.
    pub fn into_row(self, now: DateTime<Utc>) -> Result<Row> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(mut fields) => {
                fields.insert("updated_at".to_string(), serde_json::to_value(now)?);
                Ok(fields)
            }
            other => Err(FolioError::internal(format!(
                "profile update serialized to non-object: {}",
                other
            ))),
        }
    }
}
