// src/models/profile.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::patch::Patch;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserProfile {
    #[schema(ignore)] // vem do token
    pub user_id: Uuid,
    pub full_name: Option<String>,
    #[schema(example = "male")]
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            full_name: None,
            gender: None,
            phone: None,
            date_of_birth: None,
            address: None,
            bio: None,
            avatar_url: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfilePayload {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub full_name: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub gender: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub phone: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<NaiveDate>)]
    pub date_of_birth: Patch<NaiveDate>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub address: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub bio: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub avatar_url: Patch<String>,
}

// ---
// Documentos do perfil (KTP, ijazah, etc.)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProfileDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "ktp")]
    pub doc_type: String,
    pub file_name: String,
    pub file_url: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub file_key: String,
    pub mime_type: Option<String>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

