// src/services/masjid_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::not_found,
        error::AppError,
        pagination::{Page, PageQuery, PageRequest, MAX_PAGE_SIZE},
        patch::Patch,
        query::OrderBy,
    },
    db::{
        masjid_repo::MASJID_SORT_KEYS, membership_repo::ADMIN_SORT_KEYS, MasjidRepository,
        MembershipRepository, UserRepository,
    },
    models::{
        masjid::{
            normalize_domain, slugify, CreateMasjidPayload, Masjid, MasjidFilter, MyMasjid,
            UpdateMasjidPayload,
        },
        membership::{AddAdminPayload, AdminFilter, MasjidAdmin, MasjidContext, MasjidRole},
    },
};

/// Como o cliente identificou o masjid (cabeçalho `X-Masjid-ID` ou `X-Masjid-Slug`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantSelector {
    Id(Uuid),
    Slug(String),
}

#[derive(Clone)]
pub struct MasjidService {
    pool: PgPool,
    masjid_repo: MasjidRepository,
    membership_repo: MembershipRepository,
    user_repo: UserRepository,
}

impl MasjidService {
    pub fn new(
        pool: PgPool,
        masjid_repo: MasjidRepository,
        membership_repo: MembershipRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            pool,
            masjid_repo,
            membership_repo,
            user_repo,
        }
    }

    // =========================================================================
    //  TENANT
    // =========================================================================

    /// Cria o masjid e, na mesma transação, torna o usuário o `owner`.
    pub async fn create_masjid(
        &self,
        owner_id: Uuid,
        payload: &CreateMasjidPayload,
    ) -> Result<Masjid, AppError> {
        let owner = self
            .user_repo
            .find_by_id(owner_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let slug = slugify(payload.slug.as_deref().unwrap_or(&payload.name));
        if slug.is_empty() {
            return Err(AppError::InvalidParam("slug".into()));
        }
        let domain = payload
            .domain
            .as_deref()
            .map(normalize_domain)
            .filter(|d| !d.is_empty());

        let mut tx = self.pool.begin().await?;

        let masjid = self
            .masjid_repo
            .create(&mut *tx, payload, &slug, domain.as_deref())
            .await?;

        self.membership_repo
            .create(&mut *tx, masjid.id, &owner, MasjidRole::Owner)
            .await?;

        tx.commit().await?;

        tracing::info!("Masjid '{}' ({}) criado por {}", masjid.slug, masjid.id, owner.id);
        Ok(masjid)
    }

    pub async fn list_my_masjids(&self, user_id: Uuid) -> Result<Vec<MyMasjid>, AppError> {
        self.masjid_repo.list_for_user(user_id).await
    }

    pub async fn list_public(
        &self,
        filter: &MasjidFilter,
        query: &PageQuery,
    ) -> Result<(Page<Masjid>, PageRequest), AppError> {
        let request = query.resolve(MAX_PAGE_SIZE);
        let order = OrderBy::resolve(MASJID_SORT_KEYS, query.sort_by.as_deref(), query.order.as_deref());
        let page = self.masjid_repo.list_public(filter, order, request).await?;
        Ok((page, request))
    }

    /// Masjid público: removido ou inativo é 404.
    pub async fn get_public(&self, slug: &str) -> Result<Masjid, AppError> {
        self.masjid_repo
            .find_by_slug(slug)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(|| not_found("masjid"))
    }

    pub async fn get_masjid(&self, masjid_id: Uuid) -> Result<Masjid, AppError> {
        self.masjid_repo
            .find_by_id(masjid_id)
            .await?
            .ok_or_else(|| not_found("masjid"))
    }

    pub async fn update_masjid(
        &self,
        masjid_id: Uuid,
        payload: UpdateMasjidPayload,
    ) -> Result<Masjid, AppError> {
        let changes = normalize_masjid_changes(payload)?;
        self.masjid_repo
            .update(&self.pool, masjid_id, changes)
            .await?
            .ok_or_else(|| not_found("masjid"))
    }

    pub async fn delete_masjid(&self, masjid_id: Uuid) -> Result<(), AppError> {
        if !self.masjid_repo.soft_delete(&self.pool, masjid_id).await? {
            return Err(not_found("masjid"));
        }
        tracing::warn!("Masjid {} removido (soft delete)", masjid_id);
        Ok(())
    }

    /// Usado pelo `tenant_guard`: masjid inexistente é 404, não-membro é 403.
    pub async fn resolve_context(
        &self,
        user_id: Uuid,
        selector: &TenantSelector,
    ) -> Result<MasjidContext, AppError> {
        let masjid = match selector {
            TenantSelector::Id(id) => self.masjid_repo.find_by_id(*id).await?,
            TenantSelector::Slug(slug) => self.masjid_repo.find_by_slug(slug).await?,
        }
        .ok_or_else(|| not_found("masjid"))?;

        let role = self
            .membership_repo
            .find_active_role(user_id, masjid.id)
            .await?
            .ok_or(AppError::NotMasjidMember)?;

        Ok(MasjidContext {
            masjid_id: masjid.id,
            role,
        })
    }

    // =========================================================================
    //  MEMBROS
    // =========================================================================

    pub async fn list_admins(
        &self,
        masjid_id: Uuid,
        filter: &AdminFilter,
        query: &PageQuery,
    ) -> Result<(Page<MasjidAdmin>, PageRequest), AppError> {
        let request = query.resolve(MAX_PAGE_SIZE);
        let order = OrderBy::resolve(ADMIN_SORT_KEYS, query.sort_by.as_deref(), query.order.as_deref());
        let page = self
            .membership_repo
            .list(masjid_id, filter, query.include_deleted, order, request)
            .await?;
        Ok((page, request))
    }

    pub async fn add_admin(
        &self,
        ctx: MasjidContext,
        payload: &AddAdminPayload,
    ) -> Result<MasjidAdmin, AppError> {
        ensure_can_grant(ctx.role, payload.role)?;

        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let admin = self
            .membership_repo
            .create(&self.pool, ctx.masjid_id, &user, payload.role)
            .await?;

        tracing::info!(
            "Usuário {} adicionado ao masjid {} como {}",
            user.id,
            ctx.masjid_id,
            payload.role.as_str()
        );
        Ok(admin)
    }

    pub async fn update_admin_role(
        &self,
        ctx: MasjidContext,
        actor_id: Uuid,
        admin_id: Uuid,
        role: MasjidRole,
    ) -> Result<MasjidAdmin, AppError> {
        let mut tx = self.pool.begin().await?;

        let target = self
            .membership_repo
            .lock(&mut *tx, ctx.masjid_id, admin_id)
            .await?
            .ok_or_else(|| not_found("masjid_admin"))?;

        if target.user_id == actor_id {
            return Err(AppError::Forbidden("self".into()));
        }
        ensure_can_grant(ctx.role, target.role)?;
        ensure_can_grant(ctx.role, role)?;

        let updated = self.membership_repo.update_role(&mut *tx, target.id, role).await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Liga/desliga o membro. Dono não pode ser desativado, nem o próprio usuário.
    pub async fn toggle_admin_active(
        &self,
        ctx: MasjidContext,
        actor_id: Uuid,
        admin_id: Uuid,
    ) -> Result<MasjidAdmin, AppError> {
        let mut tx = self.pool.begin().await?;

        let target = self
            .membership_repo
            .lock(&mut *tx, ctx.masjid_id, admin_id)
            .await?
            .ok_or_else(|| not_found("masjid_admin"))?;

        if target.user_id == actor_id {
            return Err(AppError::Forbidden("self".into()));
        }
        if target.role == MasjidRole::Owner {
            return Err(AppError::Forbidden("owner".into()));
        }
        ensure_can_grant(ctx.role, target.role)?;

        let updated = self
            .membership_repo
            .set_active(&mut *tx, target.id, !target.is_active)
            .await?;
        tx.commit().await?;

        tracing::info!(
            "Membro {} do masjid {} agora is_active={}",
            updated.id,
            ctx.masjid_id,
            updated.is_active
        );
        Ok(updated)
    }

    pub async fn remove_admin(&self, ctx: MasjidContext, admin_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let target = self
            .membership_repo
            .lock(&mut *tx, ctx.masjid_id, admin_id)
            .await?
            .ok_or_else(|| not_found("masjid_admin"))?;

        if target.role == MasjidRole::Owner {
            return Err(AppError::Forbidden("owner".into()));
        }
        ensure_can_grant(ctx.role, target.role)?;

        self.membership_repo.soft_delete(&mut *tx, target.id).await?;
        tx.commit().await?;
        Ok(())
    }
}

fn ensure_can_grant(actor: MasjidRole, target: MasjidRole) -> Result<(), AppError> {
    if actor.can_grant(target) {
        Ok(())
    } else {
        let required = match target {
            MasjidRole::Owner => "owner",
            _ => "owner|dkm|admin",
        };
        Err(AppError::InsufficientRole(required.into()))
    }
}

// Regras do PATCH: `name`/`slug` não aceitam null; strings vazias em colunas
// opcionais viram null; domínio e slug são normalizados.
fn normalize_masjid_changes(payload: UpdateMasjidPayload) -> Result<UpdateMasjidPayload, AppError> {
    let name = match payload.name.trimmed().require_value("name")? {
        Some(name) if name.chars().count() < 3 => {
            return Err(AppError::InvalidParam("name".into()));
        }
        Some(name) => Patch::Value(name),
        None => Patch::Missing,
    };

    let slug = match payload.slug.require_value("slug")? {
        Some(raw) => {
            let slug = slugify(&raw);
            if slug.is_empty() {
                return Err(AppError::InvalidParam("slug".into()));
            }
            Patch::Value(slug)
        }
        None => Patch::Missing,
    };

    Ok(UpdateMasjidPayload {
        name,
        slug,
        domain: payload.domain.map(|d| normalize_domain(&d)).blank_as_null(),
        city: payload.city.blank_as_null(),
        address: payload.address.blank_as_null(),
        phone: payload.phone.blank_as_null(),
        bio: payload.bio.blank_as_null(),
        logo_url: payload.logo_url.blank_as_null(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> UpdateMasjidPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn patch_normalizes_slug_and_domain() {
        let changes = normalize_masjid_changes(payload(json!({
            "slug": "Masjid Raya Bandung",
            "domain": "HTTPS://Raya.OR.ID/",
        })))
        .unwrap();

        assert_eq!(changes.slug, Patch::Value("masjid-raya-bandung".into()));
        assert_eq!(changes.domain, Patch::Value("raya.or.id".into()));
        assert_eq!(changes.name, Patch::Missing);
        assert_eq!(changes.city, Patch::Missing);
    }

    #[test]
    fn patch_rejects_null_name_and_slug() {
        assert!(normalize_masjid_changes(payload(json!({ "name": null }))).is_err());
        assert!(normalize_masjid_changes(payload(json!({ "slug": null }))).is_err());
        assert!(normalize_masjid_changes(payload(json!({ "name": " ab " }))).is_err());
    }

    #[test]
    fn patch_clears_optional_fields_with_null_or_blank() {
        let changes = normalize_masjid_changes(payload(json!({
            "bio": null,
            "phone": "   ",
            "city": " Bandung ",
        })))
        .unwrap();

        assert_eq!(changes.bio, Patch::Null);
        assert_eq!(changes.phone, Patch::Null);
        assert_eq!(changes.city, Patch::Value("Bandung".into()));
    }

    #[test]
    fn only_owner_may_touch_owner_role() {
        assert!(ensure_can_grant(MasjidRole::Admin, MasjidRole::Owner).is_err());
        assert!(ensure_can_grant(MasjidRole::Owner, MasjidRole::Owner).is_ok());
        assert!(ensure_can_grant(MasjidRole::Dkm, MasjidRole::Teacher).is_ok());
    }
}
