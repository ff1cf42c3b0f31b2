// src/models/masjid.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::patch::Patch;
use crate::models::membership::MasjidRole;

// ---
// Masjid (o "Tenant")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Masjid {
    pub id: Uuid,
    #[schema(example = "Masjid Al-Falah")]
    pub name: String,
    #[schema(example = "masjid-al-falah")]
    pub slug: String,
    #[schema(example = "alfalah.or.id")]
    pub domain: Option<String>,
    #[schema(example = "Bandung")]
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// Masjid + o cargo do usuário logado nele (GET /api/u/masjids)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MyMasjid {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub masjid: Masjid,
    pub role: MasjidRole,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMasjidPayload {
    #[validate(length(min = 3, max = 150, message = "length"))]
    #[schema(example = "Masjid Al-Falah")]
    pub name: String,

    /// Gerado a partir do nome quando ausente.
    #[validate(length(min = 3, max = 80, message = "length"))]
    pub slug: Option<String>,

    #[validate(length(max = 253, message = "length"))]
    pub domain: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,

    #[validate(url)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMasjidPayload {
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub name: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub slug: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub domain: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub city: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub address: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub phone: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub bio: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub logo_url: Patch<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MasjidFilter {
    /// Busca em nome, slug e cidade.
    pub q: Option<String>,
    pub city: Option<String>,
}

// Nome -> slug: minúsculas, só [a-z0-9], separadores viram '-'.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}

// Domínio é guardado em minúsculas, sem esquema e sem barra final.
pub fn normalize_domain(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    without_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Masjid Al-Falah"), "masjid-al-falah");
        assert_eq!(slugify("  Pondok  Pesantren -- Nurul Huda! "), "pondok-pesantren-nurul-huda");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn normalize_domain_lowercases_and_strips_scheme() {
        assert_eq!(normalize_domain("HTTPS://AlFalah.OR.id/"), "alfalah.or.id");
        assert_eq!(normalize_domain(" sekolah.sch.id "), "sekolah.sch.id");
    }
}
