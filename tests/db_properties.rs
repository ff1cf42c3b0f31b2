// tests/db_properties.rs
// Propriedades que dependem do Postgres. Rode com:
//   DATABASE_URL=postgres://... cargo test -- --ignored

mod common;

use std::collections::HashSet;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use masjid_backend::{
    common::{error::AppError, pagination::PageQuery, patch::Patch},
    config::AppState,
    models::{
        academic::{
            CreateCatalogEntryPayload, CreateCsstPayload, CreateTeacherPayload, TeacherFilter,
            UpdateCsstPayload, UpdateTeacherPayload,
        },
        auth::RegisterUserPayload,
        billing::{BillingCategory, BillingFilter, BillingStatus, CreateBillingPayload, UpdateBillingPayload},
        donation::{CreateDonationPayload, DonationStatus, MidtransNotification},
        masjid::{CreateMasjidPayload, Masjid, UpdateMasjidPayload},
        profile::UpdateProfilePayload,
    },
    services::masjid_service::TenantSelector,
};

use common::{state_with_pool, VALID_SIGNATURE};

async fn register(state: &AppState, email: &str) -> Uuid {
    let payload = RegisterUserPayload {
        email: email.to_string(),
        password: "rahasia123".to_string(),
        full_name: "Ahmad Fauzi".to_string(),
    };
    let token = state.auth_service.register_user(&payload).await.unwrap();
    state.auth_service.decode_token(&token).unwrap().sub
}

async fn masjid(state: &AppState, owner: Uuid, slug: &str) -> Masjid {
    let payload = CreateMasjidPayload {
        name: format!("Masjid {slug}"),
        slug: Some(slug.to_string()),
        domain: None,
        city: Some("Bandung".to_string()),
        address: None,
        phone: None,
        bio: None,
        logo_url: None,
    };
    state.masjid_service.create_masjid(owner, &payload).await.unwrap()
}

fn billing_payload(title: &str) -> CreateBillingPayload {
    CreateBillingPayload {
        category: BillingCategory::Spp,
        code: None,
        title: title.to_string(),
        description: None,
        due_date: None,
        amount: Decimal::new(150_000, 0),
        class_section_id: None,
    }
}

fn teacher_payload(name: &str) -> CreateTeacherPayload {
    CreateTeacherPayload {
        user_id: None,
        name: name.to_string(),
        code: None,
        avatar_url: None,
    }
}

fn notification(order_id: &str, status: &str) -> MidtransNotification {
    MidtransNotification {
        order_id: order_id.to_string(),
        transaction_status: status.to_string(),
        status_code: Some("200".to_string()),
        gross_amount: Some("50000.00".to_string()),
        signature_key: Some(VALID_SIGNATURE.to_string()),
        payment_type: Some("qris".to_string()),
        transaction_id: None,
        fraud_status: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn rows_are_invisible_from_another_masjid(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let owner = register(&state, "owner@example.com").await;
    let a = masjid(&state, owner, "al-falah").await;
    let b = masjid(&state, owner, "al-ikhlas").await;

    let billing = state
        .billing_service
        .create(a.id, owner, &billing_payload("SPP Januari"))
        .await
        .unwrap();

    let err = state.billing_service.get(b.id, billing.id).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));

    let (page, _) = state
        .billing_service
        .list(b.id, &BillingFilter::default(), &PageQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    let err = state.billing_service.delete(b.id, billing.id).await.unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn strangers_cannot_resolve_a_masjid_context(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let owner = register(&state, "owner@example.com").await;
    let stranger = register(&state, "tamu@example.com").await;
    let m = masjid(&state, owner, "al-falah").await;

    let ctx = state
        .masjid_service
        .resolve_context(owner, &TenantSelector::Slug("al-falah".into()))
        .await
        .unwrap();
    assert_eq!(ctx.masjid_id, m.id);

    let err = state
        .masjid_service
        .resolve_context(stranger, &TenantSelector::Id(m.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotMasjidMember));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn soft_deleted_teachers_leave_default_listing(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let owner = register(&state, "owner@example.com").await;
    let m = masjid(&state, owner, "al-falah").await;

    let teacher = state
        .academic_service
        .create_teacher(m.id, &teacher_payload("Ustadz Hasan"))
        .await
        .unwrap();
    state.academic_service.delete_teacher(m.id, teacher.id).await.unwrap();

    let filter = TeacherFilter::default();
    let (page, _) = state
        .academic_service
        .list_teachers(m.id, &filter, &PageQuery::default())
        .await
        .unwrap();
    assert_eq!(page.total, 0);

    let with_deleted = PageQuery {
        include_deleted: true,
        ..PageQuery::default()
    };
    let (page, _) = state
        .academic_service
        .list_teachers(m.id, &filter, &with_deleted)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert!(page.items[0].deleted_at.is_some());

    assert!(state.academic_service.get_teacher(m.id, teacher.id).await.is_err());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn pages_cover_every_row_exactly_once(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let owner = register(&state, "owner@example.com").await;
    let m = masjid(&state, owner, "al-falah").await;

    for i in 0..7 {
        state
            .academic_service
            .create_teacher(m.id, &teacher_payload(&format!("Ustadz {i}")))
            .await
            .unwrap();
    }

    let mut seen = HashSet::new();
    for page_number in 1..=3 {
        let query = PageQuery {
            page: Some(page_number),
            page_size: Some(3),
            sort_by: Some("name".into()),
            ..PageQuery::default()
        };
        let (page, request) = state
            .academic_service
            .list_teachers(m.id, &TeacherFilter::default(), &query)
            .await
            .unwrap();
        assert_eq!(page.total, 7);
        assert_eq!(request.page_size, 3);
        seen.extend(page.items.iter().map(|t| t.id));
    }
    assert_eq!(seen.len(), 7);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn teacher_changes_flow_into_assignment_snapshots(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let owner = register(&state, "owner@example.com").await;
    let m = masjid(&state, owner, "al-falah").await;
    let academic = &state.academic_service;

    let section = academic
        .create_class_section(
            m.id,
            &CreateCatalogEntryPayload { name: "Kelas 1A".into(), code: "1A".into() },
        )
        .await
        .unwrap();
    let subject = academic
        .create_subject(
            m.id,
            &CreateCatalogEntryPayload { name: "Tahsin".into(), code: "THS".into() },
        )
        .await
        .unwrap();
    let teacher = academic
        .create_teacher(m.id, &teacher_payload("Ustadz Hasan"))
        .await
        .unwrap();

    let csst = academic
        .create_csst(
            m.id,
            &CreateCsstPayload {
                class_section_id: section.id,
                subject_id: subject.id,
                teacher_id: Some(teacher.id),
                is_active: true,
            },
        )
        .await
        .unwrap();
    assert_eq!(csst.section_name_snapshot, "Kelas 1A");
    assert_eq!(csst.teacher_snapshot.as_ref().unwrap().name, "Ustadz Hasan");

    let rename = UpdateTeacherPayload {
        name: Patch::Value("Ustadz Hasan Basri".into()),
        ..UpdateTeacherPayload::default()
    };
    academic.update_teacher(m.id, teacher.id, rename).await.unwrap();

    let refreshed = academic.get_csst(m.id, csst.id).await.unwrap();
    assert_eq!(refreshed.teacher_snapshot.as_ref().unwrap().name, "Ustadz Hasan Basri");

    let unassign = UpdateCsstPayload {
        teacher_id: Patch::Null,
        ..UpdateCsstPayload::default()
    };
    let cleared = academic.update_csst(m.id, csst.id, unassign).await.unwrap();
    assert!(cleared.teacher_id.is_none());
    assert!(cleared.teacher_snapshot.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn masjid_patch_distinguishes_null_from_absent(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let owner = register(&state, "owner@example.com").await;
    let m = masjid(&state, owner, "al-falah").await;

    let keep_city = UpdateMasjidPayload {
        bio: Patch::Value("Masjid kampus".into()),
        ..UpdateMasjidPayload::default()
    };
    let updated = state.masjid_service.update_masjid(m.id, keep_city).await.unwrap();
    assert_eq!(updated.city.as_deref(), Some("Bandung"));
    assert_eq!(updated.bio.as_deref(), Some("Masjid kampus"));

    let clear_city = UpdateMasjidPayload {
        city: Patch::Null,
        ..UpdateMasjidPayload::default()
    };
    let updated = state.masjid_service.update_masjid(m.id, clear_city).await.unwrap();
    assert!(updated.city.is_none());
    assert_eq!(updated.bio.as_deref(), Some("Masjid kampus"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn billing_status_moves_forward_only(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let owner = register(&state, "owner@example.com").await;
    let m = masjid(&state, owner, "al-falah").await;
    let billing = state
        .billing_service
        .create(m.id, owner, &billing_payload("SPP Februari"))
        .await
        .unwrap();

    let pay = || UpdateBillingPayload {
        status: Some(BillingStatus::Paid),
        ..UpdateBillingPayload::default()
    };
    let paid = state.billing_service.update(m.id, billing.id, pay()).await.unwrap();
    assert_eq!(paid.status, BillingStatus::Paid);
    let paid_at = paid.paid_at.expect("paid_at carimbado");

    // repetir o status não recarimba
    let again = state.billing_service.update(m.id, billing.id, pay()).await.unwrap();
    assert_eq!(again.paid_at, Some(paid_at));

    let reopen = UpdateBillingPayload {
        status: Some(BillingStatus::Unpaid),
        ..UpdateBillingPayload::default()
    };
    let err = state.billing_service.update(m.id, billing.id, reopen).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStatusTransition { .. }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn webhook_settles_pending_donations_once(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let owner = register(&state, "owner@example.com").await;
    masjid(&state, owner, "al-falah").await;

    let payload = CreateDonationPayload {
        donor_name: "Siti Aminah".into(),
        donor_email: None,
        donor_phone: None,
        amount: Decimal::new(50_000, 0),
        message: Some("Semoga berkah".into()),
        is_anonymous: false,
        purpose: None,
    };
    let checkout = state
        .donation_service
        .create_public("al-falah", &payload)
        .await
        .unwrap();
    let order_id = checkout.donation.order_id.clone();
    assert_eq!(checkout.donation.status, DonationStatus::Pending);
    assert_eq!(checkout.payment.token, format!("tok-{order_id}"));

    let pending = state
        .donation_service
        .handle_notification(&notification(&order_id, "pending"))
        .await
        .unwrap();
    assert!(!pending.changed);

    let settled = state
        .donation_service
        .handle_notification(&notification(&order_id, "settlement"))
        .await
        .unwrap();
    assert!(settled.changed);
    assert_eq!(settled.status, DonationStatus::Completed);

    let late_failure = state
        .donation_service
        .handle_notification(&notification(&order_id, "failed"))
        .await
        .unwrap();
    assert!(!late_failure.changed);
    assert_eq!(late_failure.status, DonationStatus::Completed);

    let unknown = state
        .donation_service
        .handle_notification(&notification("DON-inexistente", "settlement"))
        .await
        .unwrap_err();
    assert!(matches!(unknown, AppError::ResourceNotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn webhook_ignores_soft_deleted_donations(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let owner = register(&state, "owner@example.com").await;
    let m = masjid(&state, owner, "al-falah").await;

    let payload = CreateDonationPayload {
        donor_name: "Hamba Allah".into(),
        donor_email: None,
        donor_phone: None,
        amount: Decimal::new(25_000, 0),
        message: None,
        is_anonymous: true,
        purpose: None,
    };
    let checkout = state
        .donation_service
        .create_public("al-falah", &payload)
        .await
        .unwrap();
    let donation = checkout.donation;
    state.donation_service.delete(m.id, donation.id).await.unwrap();

    let err = state
        .donation_service
        .handle_notification(&notification(&donation.order_id, "settlement"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ResourceNotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requer DATABASE_URL"]
async fn concurrent_profile_patches_keep_both_changes(pool: PgPool) {
    let (state, _dir) = state_with_pool(pool);
    let user = register(&state, "siti@example.com").await;

    let seed = UpdateProfilePayload {
        phone: Patch::Value("0812".into()),
        bio: Patch::Value("x".into()),
        ..UpdateProfilePayload::default()
    };
    state.profile_service.update_profile(user, seed).await.unwrap();

    let clear_phone = UpdateProfilePayload {
        phone: Patch::Null,
        ..UpdateProfilePayload::default()
    };
    let new_bio = UpdateProfilePayload {
        bio: Patch::Value("z".into()),
        ..UpdateProfilePayload::default()
    };
    let (a, b) = tokio::join!(
        state.profile_service.update_profile(user, clear_phone),
        state.profile_service.update_profile(user, new_bio),
    );
    a.unwrap();
    b.unwrap();

    let profile = state.profile_service.get_profile(user).await.unwrap();
    assert!(profile.phone.is_none());
    assert_eq!(profile.bio.as_deref(), Some("z"));
}
