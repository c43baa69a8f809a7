//! Integration tests for the background reconciliation sweep.

mod common;

use admission_api::background::reconciliation::{sweep, SweepReport};
use admission_db::models::session::CreateSession;
use admission_db::repositories::{ApplicantRepo, SessionRepo};
use chrono::{Duration, Utc};
use common::{complete_wizard, create_order, pay, register};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_on_empty_database_does_nothing(pool: PgPool) {
    let report = sweep(&pool, 30).await.unwrap();
    assert_eq!(report, SweepReport::default());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_reports_pending_orders_past_the_threshold(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let cookie = register(&app, "asha@example.com", "9876543210").await;
    complete_wizard(&app, &cookie).await;
    let paid = create_order(&app, &cookie, "registration").await;
    pay(&app, &cookie, "registration", &paid, "pay_reg_1", 75_000).await;
    create_order(&app, &cookie, "seat").await;

    // Nothing is old enough yet.
    assert_eq!(sweep(&pool, 30).await.unwrap().stale_orders, 0);

    // With no grace period only the still-pending seat order is stale.
    assert_eq!(sweep(&pool, 0).await.unwrap().stale_orders, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sweep_purges_expired_sessions_only(pool: PgPool) {
    let app = common::build_test_app(pool.clone());
    let cookie = register(&app, "asha@example.com", "9876543210").await;
    let applicant = ApplicantRepo::find_by_email(&pool, "asha@example.com")
        .await
        .unwrap()
        .unwrap();

    SessionRepo::create(
        &pool,
        &CreateSession {
            applicant_id: applicant.id,
            token_hash: "expired-session".to_string(),
            expires_at: Utc::now() - Duration::hours(1),
            user_agent: None,
            ip_address: None,
        },
    )
    .await
    .unwrap();

    let report = sweep(&pool, 30).await.unwrap();
    assert_eq!(report.purged_sessions, 1);

    // The live session opened by registration survives.
    let response = common::get_with_cookie(app.router(), "/api/v1/application/status", &cookie).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}
