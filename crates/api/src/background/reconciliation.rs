//! Periodic reconciliation of abandoned payment orders and expired sessions.
//!
//! Orders stay `pending` until a verified outcome or a client report settles
//! them. Orders pending longer than the configured threshold are reported
//! for follow-up against the gateway dashboard; revoked and expired session
//! rows are purged.

use std::time::Duration;

use admission_db::repositories::{PaymentOrderRepo, SessionRepo};
use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Maximum stale orders reported per sweep.
const STALE_ORDER_BATCH: i64 = 100;

/// What one sweep found and removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub stale_orders: usize,
    pub purged_sessions: u64,
}

/// Run a single sweep.
pub async fn sweep(pool: &PgPool, stale_after_mins: i64) -> Result<SweepReport, sqlx::Error> {
    let cutoff = Utc::now() - chrono::Duration::minutes(stale_after_mins);
    let stale = PaymentOrderRepo::list_stale_pending(pool, cutoff, STALE_ORDER_BATCH).await?;
    for order in &stale {
        tracing::warn!(
            order_id = %order.order_id,
            application_id = order.application_id,
            payment_type = %order.payment_type,
            created_at = %order.created_at,
            "Payment order still pending"
        );
    }

    let purged_sessions = SessionRepo::cleanup_expired(pool).await?;

    Ok(SweepReport {
        stale_orders: stale.len(),
        purged_sessions,
    })
}

/// Run the reconciliation loop until `cancel` is triggered.
pub async fn run(pool: PgPool, stale_after_mins: i64, cancel: CancellationToken) {
    tracing::info!(
        stale_after_mins,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Payment reconciliation job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Payment reconciliation job stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep(&pool, stale_after_mins).await {
                    Ok(report) => {
                        if report.stale_orders > 0 || report.purged_sessions > 0 {
                            tracing::info!(
                                stale_orders = report.stale_orders,
                                purged_sessions = report.purged_sessions,
                                "Reconciliation sweep finished"
                            );
                        } else {
                            tracing::debug!("Reconciliation sweep: nothing to do");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Reconciliation sweep failed");
                    }
                }
            }
        }
    }
}
