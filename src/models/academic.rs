// src/models/academic.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::patch::Patch;

// =============================================================================
//  PROFESSORES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Teacher {
    pub id: Uuid,
    pub masjid_id: Uuid,
    pub user_id: Option<Uuid>,
    #[schema(example = "Ustadz Hasan")]
    pub name: String,
    #[schema(example = "UH-01")]
    pub code: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Teacher {
    pub fn snapshot(&self) -> TeacherSnapshot {
        TeacherSnapshot {
            id: self.id,
            name: self.name.clone(),
            code: self.code.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTeacherPayload {
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 120, message = "required"))]
    pub name: String,
    #[validate(length(min = 1, max = 30, message = "length"))]
    pub code: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTeacherPayload {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub name: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub code: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub avatar_url: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub user_id: Patch<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeacherFilter {
    /// Busca em nome e código.
    pub q: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
//  TURMAS E DISCIPLINAS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassSection {
    pub id: Uuid,
    pub masjid_id: Uuid,
    #[schema(example = "Kelas 1A")]
    pub name: String,
    #[schema(example = "1A")]
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subject {
    pub id: Uuid,
    pub masjid_id: Uuid,
    #[schema(example = "Tahfidz Al-Qur'an")]
    pub name: String,
    #[schema(example = "THF")]
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// Mesmo formato para turma e disciplina.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCatalogEntryPayload {
    #[validate(length(min = 1, max = 120, message = "required"))]
    pub name: String,
    #[validate(length(min = 1, max = 30, message = "required"))]
    pub code: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogFilter {
    /// Busca em nome e código.
    pub q: Option<String>,
}

// =============================================================================
//  CSST (turma x disciplina x professor)
// =============================================================================

// Cópia dos campos de exibição do professor, gravada junto do CSST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TeacherSnapshot {
    pub id: Uuid,
    pub name: String,
    pub code: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassSectionSubjectTeacher {
    pub id: Uuid,
    pub masjid_id: Uuid,
    pub class_section_id: Uuid,
    pub subject_id: Uuid,
    pub teacher_id: Option<Uuid>,
    pub is_active: bool,
    #[schema(value_type = Option<TeacherSnapshot>)]
    pub teacher_snapshot: Option<Json<TeacherSnapshot>>,
    pub section_name_snapshot: String,
    pub subject_name_snapshot: String,
    pub subject_code_snapshot: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCsstPayload {
    pub class_section_id: Uuid,
    pub subject_id: Uuid,
    pub teacher_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCsstPayload {
    /// `null` remove o professor (e o snapshot).
    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub teacher_id: Patch<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CsstFilter {
    pub class_section_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub is_active: Option<bool>,
    /// Busca nos snapshots (turma, disciplina, professor).
    pub q: Option<String>,
}
