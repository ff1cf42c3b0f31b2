// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::membership::{MasjidContext, MasjidRole},
};

/// Um conjunto de cargos aceitos por uma rota.
pub trait RoleSet: Send + Sync + 'static {
    fn allowed() -> &'static [MasjidRole];

    /// Vai no detalhe da mensagem de erro (ex.: "owner|dkm|admin").
    fn label() -> &'static str;
}

pub fn check_role<T: RoleSet>(role: MasjidRole) -> Result<(), AppError> {
    if T::allowed().contains(&role) {
        Ok(())
    } else {
        Err(AppError::InsufficientRole(T::label().to_string()))
    }
}

/// O extractor (guardião). Depende do `tenant_guard` ter rodado antes.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let result = match parts.extensions.get::<MasjidContext>() {
            Some(ctx) => check_role::<T>(ctx.role),
            None => Err(AppError::MissingMasjidContext),
        };

        match result {
            Ok(()) => Ok(RequireRole(PhantomData)),
            Err(e) => {
                let app_state = AppState::from_ref(state);
                let locale = Locale::from_headers(&parts.headers);
                Err(e.to_api_error(&locale, &app_state.i18n_store))
            }
        }
    }
}

// ---
// CONJUNTOS DE CARGOS
// ---

pub struct AnyMember;
impl RoleSet for AnyMember {
    fn allowed() -> &'static [MasjidRole] {
        &[
            MasjidRole::Owner,
            MasjidRole::Dkm,
            MasjidRole::Admin,
            MasjidRole::Teacher,
            MasjidRole::Staff,
        ]
    }
    fn label() -> &'static str { "member" }
}

pub struct Staff;
impl RoleSet for Staff {
    fn allowed() -> &'static [MasjidRole] {
        &[MasjidRole::Owner, MasjidRole::Dkm, MasjidRole::Admin, MasjidRole::Staff]
    }
    fn label() -> &'static str { "owner|dkm|admin|staff" }
}

pub struct Managers;
impl RoleSet for Managers {
    fn allowed() -> &'static [MasjidRole] {
        &[MasjidRole::Owner, MasjidRole::Dkm, MasjidRole::Admin]
    }
    fn label() -> &'static str { "owner|dkm|admin" }
}

pub struct OwnerOnly;
impl RoleSet for OwnerOnly {
    fn allowed() -> &'static [MasjidRole] {
        &[MasjidRole::Owner]
    }
    fn label() -> &'static str { "owner" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managers_exclude_teachers_and_staff() {
        assert!(check_role::<Managers>(MasjidRole::Dkm).is_ok());
        assert!(check_role::<Managers>(MasjidRole::Staff).is_err());
        assert!(check_role::<Managers>(MasjidRole::Teacher).is_err());
    }

    #[test]
    fn staff_set_includes_managers_but_not_teachers() {
        assert!(check_role::<Staff>(MasjidRole::Owner).is_ok());
        assert!(check_role::<Staff>(MasjidRole::Staff).is_ok());
        assert!(check_role::<Staff>(MasjidRole::Teacher).is_err());
    }

    #[test]
    fn owner_only_names_the_required_role() {
        match check_role::<OwnerOnly>(MasjidRole::Admin) {
            Err(AppError::InsufficientRole(label)) => assert_eq!(label, "owner"),
            other => panic!("esperava InsufficientRole, veio {other:?}"),
        }
        assert!(check_role::<AnyMember>(MasjidRole::Teacher).is_ok());
    }
}
