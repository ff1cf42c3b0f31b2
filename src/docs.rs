// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::common::pagination;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,
        handlers::profile::get_profile,
        handlers::profile::update_profile,
        handlers::profile::list_documents,
        handlers::profile::upload_document,
        handlers::profile::delete_document,

        // --- Masjid ---
        handlers::masjid::create_masjid,
        handlers::masjid::list_my_masjids,
        handlers::masjid::get_current_masjid,
        handlers::masjid::update_current_masjid,
        handlers::masjid::delete_current_masjid,

        // --- Admins ---
        handlers::admins::list_admins,
        handlers::admins::add_admin,
        handlers::admins::update_admin_role,
        handlers::admins::toggle_admin_active,
        handlers::admins::remove_admin,

        // --- Academic ---
        handlers::academic::list_teachers,
        handlers::academic::create_teacher,
        handlers::academic::get_teacher,
        handlers::academic::update_teacher,
        handlers::academic::delete_teacher,
        handlers::academic::list_class_sections,
        handlers::academic::create_class_section,
        handlers::academic::delete_class_section,
        handlers::academic::list_subjects,
        handlers::academic::create_subject,
        handlers::academic::delete_subject,
        handlers::academic::list_csst,
        handlers::academic::create_csst,
        handlers::academic::get_csst,
        handlers::academic::update_csst,
        handlers::academic::delete_csst,

        // --- Billing ---
        handlers::billing::list_billings,
        handlers::billing::create_billing,
        handlers::billing::get_billing,
        handlers::billing::update_billing,
        handlers::billing::delete_billing,

        // --- Donations ---
        handlers::donations::list_donations,
        handlers::donations::get_donation,
        handlers::donations::delete_donation,

        // --- Public ---
        handlers::public::list_masjids,
        handlers::public::get_masjid,
        handlers::public::create_donation,
        handlers::public::list_donations,
        handlers::public::midtrans_notification,
    ),
    components(
        schemas(
            pagination::Pagination,

            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Profile ---
            models::profile::UserProfile,
            models::profile::UpdateProfilePayload,
            models::profile::ProfileDocument,

            // --- Masjid ---
            models::masjid::Masjid,
            models::masjid::MyMasjid,
            models::masjid::CreateMasjidPayload,
            models::masjid::UpdateMasjidPayload,

            // --- Admins ---
            models::membership::MasjidRole,
            models::membership::MasjidAdmin,
            models::membership::AddAdminPayload,
            models::membership::UpdateAdminPayload,

            // --- Academic ---
            models::academic::Teacher,
            models::academic::CreateTeacherPayload,
            models::academic::UpdateTeacherPayload,
            models::academic::ClassSection,
            models::academic::Subject,
            models::academic::CreateCatalogEntryPayload,
            models::academic::TeacherSnapshot,
            models::academic::ClassSectionSubjectTeacher,
            models::academic::CreateCsstPayload,
            models::academic::UpdateCsstPayload,

            // --- Billing ---
            models::billing::BillingStatus,
            models::billing::BillingCategory,
            models::billing::GeneralBilling,
            models::billing::CreateBillingPayload,
            models::billing::UpdateBillingPayload,

            // --- Donations ---
            models::donation::DonationStatus,
            models::donation::Donation,
            models::donation::PublicDonation,
            models::donation::CreateDonationPayload,
            models::donation::DonationCheckout,
            models::donation::PaymentInfo,
            models::donation::MidtransNotification,
            models::donation::NotificationResult,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário, Perfil e Documentos"),
        (name = "Masjid", description = "Gestão do Masjid (tenant)"),
        (name = "Admins", description = "Membros e Cargos do Masjid"),
        (name = "Academic", description = "Professores, Turmas, Disciplinas e Atribuições"),
        (name = "Billing", description = "Cobranças Gerais"),
        (name = "Donations", description = "Doações (visão administrativa)"),
        (name = "Public", description = "Vitrine pública, Checkout de Doações e Webhook do Midtrans")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_group_with_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/auth/login",
            "/api/a/admins/{id}/toggle-active",
            "/api/a/class-section-subject-teachers/{id}",
            "/public/payments/midtrans/notification",
        ] {
            assert!(doc.paths.paths.contains_key(path), "faltou {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
