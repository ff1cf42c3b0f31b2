// src/models/membership.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// Cargos dentro de um masjid. DKM = comitê administrativo (Dewan Kemakmuran Masjid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "masjid_role", rename_all = "lowercase")] // Banco
#[serde(rename_all = "lowercase")] // JSON
pub enum MasjidRole {
    Owner,
    Dkm,
    Admin,
    Teacher,
    Staff,
}

impl MasjidRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MasjidRole::Owner => "owner",
            MasjidRole::Dkm => "dkm",
            MasjidRole::Admin => "admin",
            MasjidRole::Teacher => "teacher",
            MasjidRole::Staff => "staff",
        }
    }

    /// Só o dono pode conceder (ou mexer em quem tem) o cargo de dono.
    pub fn can_grant(self, target: MasjidRole) -> bool {
        match target {
            MasjidRole::Owner => self == MasjidRole::Owner,
            _ => matches!(self, MasjidRole::Owner | MasjidRole::Dkm | MasjidRole::Admin),
        }
    }
}

// ---
// Vínculo Usuário <-> Masjid (tabela masjid_admins)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MasjidAdmin {
    pub id: Uuid,
    pub masjid_id: Uuid,
    pub user_id: Uuid,
    pub role: MasjidRole,
    pub is_active: bool,
    #[schema(example = "ahmad@example.com")]
    pub user_email_snapshot: String,
    #[schema(example = "Ahmad Fauzi")]
    pub user_name_snapshot: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

// Tenant resolvido para a requisição + cargo do usuário nele.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasjidContext {
    pub masjid_id: Uuid,
    pub role: MasjidRole,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddAdminPayload {
    #[validate(email)]
    #[schema(example = "ustadz@example.com")]
    pub email: String,
    #[schema(example = "teacher")]
    pub role: MasjidRole,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAdminPayload {
    pub role: MasjidRole,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminFilter {
    pub role: Option<MasjidRole>,
    pub is_active: Option<bool>,
    /// Busca em e-mail e nome.
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_owner_grants_owner() {
        assert!(MasjidRole::Owner.can_grant(MasjidRole::Owner));
        assert!(!MasjidRole::Dkm.can_grant(MasjidRole::Owner));
        assert!(!MasjidRole::Admin.can_grant(MasjidRole::Owner));
    }

    #[test]
    fn managers_grant_other_roles() {
        for granter in [MasjidRole::Owner, MasjidRole::Dkm, MasjidRole::Admin] {
            assert!(granter.can_grant(MasjidRole::Teacher));
            assert!(granter.can_grant(MasjidRole::Staff));
        }
        assert!(!MasjidRole::Teacher.can_grant(MasjidRole::Staff));
        assert!(!MasjidRole::Staff.can_grant(MasjidRole::Teacher));
    }

    #[test]
    fn role_round_trips_as_lowercase_json() {
        assert_eq!(serde_json::to_string(&MasjidRole::Dkm).unwrap(), "\"dkm\"");
        let role: MasjidRole = serde_json::from_str("\"teacher\"").unwrap();
        assert_eq!(role, MasjidRole::Teacher);
    }
}
