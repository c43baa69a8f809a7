//! Repository for the `payment_orders` table.
//!
//! Orders are persisted as `pending` when minted and settled exactly once to
//! `completed`; `failed` orders may still complete later. Each write also
//! updates the payment sub-record in the same transaction.

use admission_core::payment::{completed_at_for, PaymentStatus, PaymentType};
use admission_core::types::{DbId, Timestamp};
use chrono::Utc;
use sqlx::PgPool;

use crate::models::payment::{PaymentRecord, WritePayment};
use crate::models::payment_order::{CreatePaymentOrder, PaymentOrder, SettleOrder};
use crate::repositories::PaymentRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, application_id, payment_type, order_id, amount_paise, currency, \
    receipt, status, payment_id, failure_reason, settled_at, created_at, updated_at";

/// Result of [`PaymentOrderRepo::settle`].
#[derive(Debug)]
pub enum SettleOutcome {
    /// The order was updated. `payment` is the rewritten sub-record, or
    /// `None` when a newer attempt owns the sub-record.
    Settled {
        order: PaymentOrder,
        payment: Option<PaymentRecord>,
    },
    /// The order had already completed; nothing was written.
    AlreadyCompleted(PaymentOrder),
    NotFound,
}

/// Provides order audit rows and the transactional payment writes.
pub struct PaymentOrderRepo;

impl PaymentOrderRepo {
    /// Record a new order and reset the type's sub-record to `pending` for
    /// it, atomically.
    pub async fn create_with_pending_payment(
        pool: &PgPool,
        input: &CreatePaymentOrder,
    ) -> Result<(PaymentOrder, PaymentRecord), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO payment_orders
                (application_id, payment_type, order_id, amount_paise, currency, receipt)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, PaymentOrder>(&query)
            .bind(input.application_id)
            .bind(input.payment_type.as_str())
            .bind(&input.order_id)
            .bind(input.amount_paise)
            .bind(&input.currency)
            .bind(&input.receipt)
            .fetch_one(&mut *tx)
            .await?;

        let payment = PaymentRepo::overwrite_in(
            &mut tx,
            input.application_id,
            input.payment_type,
            &WritePayment {
                status: PaymentStatus::Pending,
                order_id: Some(input.order_id.clone()),
                payment_id: None,
                amount_paise: Some(input.amount_paise),
                failure_reason: None,
                completed_at: None,
            },
        )
        .await?;

        tx.commit().await?;
        Ok((order, payment))
    }

    pub async fn find_by_order_id(
        pool: &PgPool,
        order_id: &str,
    ) -> Result<Option<PaymentOrder>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payment_orders WHERE order_id = $1");
        sqlx::query_as::<_, PaymentOrder>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// All orders of an application, newest first.
    pub async fn list_for_application(
        pool: &PgPool,
        application_id: DbId,
    ) -> Result<Vec<PaymentOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payment_orders
             WHERE application_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, PaymentOrder>(&query)
            .bind(application_id)
            .fetch_all(pool)
            .await
    }

    /// Pending orders created before `older_than`, oldest first.
    pub async fn list_stale_pending(
        pool: &PgPool,
        older_than: Timestamp,
        limit: i64,
    ) -> Result<Vec<PaymentOrder>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payment_orders
             WHERE status = 'pending' AND created_at < $1
             ORDER BY created_at
             LIMIT $2"
        );
        sqlx::query_as::<_, PaymentOrder>(&query)
            .bind(older_than)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Record an outcome for an order and mirror it into the sub-record.
    ///
    /// A completed order is never rewritten. The sub-record is overwritten
    /// when it belongs to this order, or when this order completes and the
    /// sub-record has not, so a late success on an older attempt still
    /// counts while stale failures do not clobber a newer attempt.
    pub async fn settle(
        pool: &PgPool,
        order_id: &str,
        input: &SettleOrder,
    ) -> Result<SettleOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM payment_orders WHERE order_id = $1 FOR UPDATE");
        let Some(order) = sqlx::query_as::<_, PaymentOrder>(&query)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(SettleOutcome::NotFound);
        };

        if order.status == PaymentStatus::Completed.as_str() {
            return Ok(SettleOutcome::AlreadyCompleted(order));
        }

        let now = Utc::now();
        let settled_at = (input.status != PaymentStatus::Pending).then_some(now);
        let query = format!(
            "UPDATE payment_orders SET
                status = $2, payment_id = $3, failure_reason = $4, settled_at = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, PaymentOrder>(&query)
            .bind(order.id)
            .bind(input.status.as_str())
            .bind(&input.payment_id)
            .bind(&input.failure_reason)
            .bind(settled_at)
            .fetch_one(&mut *tx)
            .await?;

        let current =
            PaymentRepo::find_for_update(&mut tx, order.application_id, &order.payment_type).await?;
        let owns_record = match &current {
            None => true,
            Some(p) => {
                p.order_id.as_deref() == Some(order.order_id.as_str())
                    || (input.status == PaymentStatus::Completed
                        && p.status != PaymentStatus::Completed.as_str())
            }
        };

        let payment = if owns_record {
            let payment_type = PaymentType::from_str_db(&order.payment_type)
                .map_err(|e| sqlx::Error::Decode(e.to_string().into()))?;
            Some(
                PaymentRepo::overwrite_in(
                    &mut tx,
                    order.application_id,
                    payment_type,
                    &WritePayment {
                        status: input.status,
                        order_id: Some(order.order_id.clone()),
                        payment_id: input.payment_id.clone(),
                        amount_paise: Some(order.amount_paise),
                        failure_reason: input.failure_reason.clone(),
                        completed_at: completed_at_for(input.status, now),
                    },
                )
                .await?,
            )
        } else {
            None
        };

        tx.commit().await?;
        Ok(SettleOutcome::Settled { order, payment })
    }
}
