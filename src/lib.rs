// src/lib.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::{auth::auth_guard, tenancy::tenant_guard};

// Folga para os outros campos do multipart além do arquivo.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Monta o router completo. `main` só carrega a configuração e serve.
pub fn build_app(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Rotas do usuário logado, sem contexto de masjid
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/masjids",
            post(handlers::masjid::create_masjid).get(handlers::masjid::list_my_masjids),
        )
        .route(
            "/profile",
            get(handlers::profile::get_profile).patch(handlers::profile::update_profile),
        )
        .route(
            "/profile/documents",
            get(handlers::profile::list_documents).post(handlers::profile::upload_document),
        )
        .route("/profile/documents/{id}", delete(handlers::profile::delete_document))
        .layer(DefaultBodyLimit::max(
            app_state.config.upload_max_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Rotas administrativas: auth primeiro (última layer), depois o tenant
    let admin_routes = Router::new()
        .route(
            "/masjid",
            get(handlers::masjid::get_current_masjid)
                .patch(handlers::masjid::update_current_masjid)
                .delete(handlers::masjid::delete_current_masjid),
        )
        .route(
            "/admins",
            get(handlers::admins::list_admins).post(handlers::admins::add_admin),
        )
        .route(
            "/admins/{id}",
            patch(handlers::admins::update_admin_role).delete(handlers::admins::remove_admin),
        )
        .route("/admins/{id}/toggle-active", post(handlers::admins::toggle_admin_active))
        .route(
            "/teachers",
            get(handlers::academic::list_teachers).post(handlers::academic::create_teacher),
        )
        .route(
            "/teachers/{id}",
            get(handlers::academic::get_teacher)
                .patch(handlers::academic::update_teacher)
                .delete(handlers::academic::delete_teacher),
        )
        .route(
            "/class-sections",
            get(handlers::academic::list_class_sections)
                .post(handlers::academic::create_class_section),
        )
        .route("/class-sections/{id}", delete(handlers::academic::delete_class_section))
        .route(
            "/subjects",
            get(handlers::academic::list_subjects).post(handlers::academic::create_subject),
        )
        .route("/subjects/{id}", delete(handlers::academic::delete_subject))
        .route(
            "/class-section-subject-teachers",
            get(handlers::academic::list_csst).post(handlers::academic::create_csst),
        )
        .route(
            "/class-section-subject-teachers/{id}",
            get(handlers::academic::get_csst)
                .patch(handlers::academic::update_csst)
                .delete(handlers::academic::delete_csst),
        )
        .route(
            "/billings",
            get(handlers::billing::list_billings).post(handlers::billing::create_billing),
        )
        .route(
            "/billings/{id}",
            get(handlers::billing::get_billing)
                .patch(handlers::billing::update_billing)
                .delete(handlers::billing::delete_billing),
        )
        .route("/donations", get(handlers::donations::list_donations))
        .route(
            "/donations/{id}",
            get(handlers::donations::get_donation).delete(handlers::donations::delete_donation),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let public_routes = Router::new()
        .route("/masjids", get(handlers::public::list_masjids))
        .route("/masjids/{slug}", get(handlers::public::get_masjid))
        .route(
            "/masjids/{slug}/donations",
            get(handlers::public::list_donations).post(handlers::public::create_donation),
        )
        .route(
            "/payments/midtrans/notification",
            post(handlers::public::midtrans_notification),
        );

    let uploads = ServeDir::new(&app_state.config.storage_dir);
    let uploads_path = app_state.config.storage_public_url.trim_end_matches('/').to_string();

    // Combina tudo no router principal
    let router = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .nest("/api/auth", auth_routes)
        .nest("/api/u", user_routes)
        .nest("/api/a", admin_routes)
        .nest("/public", public_routes);

    // Só serve os arquivos quando a URL pública é um caminho local
    let router = if uploads_path.starts_with('/') && !uploads_path.is_empty() {
        router.nest_service(&uploads_path, uploads)
    } else {
        router
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
