//! Repository for the `payments` table (one sub-record per payment type).

use admission_core::payment::PaymentType;
use admission_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::payment::{PaymentRecord, WritePayment};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, application_id, payment_type, status, order_id, \
    payment_id, amount_paise, failure_reason, completed_at, created_at, updated_at";

/// Provides reads and full-overwrite writes for payment sub-records.
pub struct PaymentRepo;

impl PaymentRepo {
    pub async fn find(
        pool: &PgPool,
        application_id: DbId,
        payment_type: PaymentType,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE application_id = $1 AND payment_type = $2"
        );
        sqlx::query_as::<_, PaymentRecord>(&query)
            .bind(application_id)
            .bind(payment_type.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_application(
        pool: &PgPool,
        application_id: DbId,
    ) -> Result<Vec<PaymentRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE application_id = $1 ORDER BY payment_type"
        );
        sqlx::query_as::<_, PaymentRecord>(&query)
            .bind(application_id)
            .fetch_all(pool)
            .await
    }

    /// Replace the sub-record for `payment_type`. Never merges: every column
    /// takes the value in `input`, including NULLs.
    pub async fn overwrite(
        pool: &PgPool,
        application_id: DbId,
        payment_type: PaymentType,
        input: &WritePayment,
    ) -> Result<PaymentRecord, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::overwrite_in(&mut conn, application_id, payment_type, input).await
    }

    pub(crate) async fn overwrite_in(
        conn: &mut PgConnection,
        application_id: DbId,
        payment_type: PaymentType,
        input: &WritePayment,
    ) -> Result<PaymentRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments
                (application_id, payment_type, status, order_id, payment_id, amount_paise,
                 failure_reason, completed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (application_id, payment_type) DO UPDATE SET
                status = EXCLUDED.status,
                order_id = EXCLUDED.order_id,
                payment_id = EXCLUDED.payment_id,
                amount_paise = EXCLUDED.amount_paise,
                failure_reason = EXCLUDED.failure_reason,
                completed_at = EXCLUDED.completed_at
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PaymentRecord>(&query)
            .bind(application_id)
            .bind(payment_type.as_str())
            .bind(input.status.as_str())
            .bind(&input.order_id)
            .bind(&input.payment_id)
            .bind(input.amount_paise)
            .bind(&input.failure_reason)
            .bind(input.completed_at)
            .fetch_one(&mut *conn)
            .await
    }

    /// Lock and read the sub-record inside a transaction.
    pub(crate) async fn find_for_update(
        conn: &mut PgConnection,
        application_id: DbId,
        payment_type: &str,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments
             WHERE application_id = $1 AND payment_type = $2
             FOR UPDATE"
        );
        sqlx::query_as::<_, PaymentRecord>(&query)
            .bind(application_id)
            .bind(payment_type)
            .fetch_optional(&mut *conn)
            .await
    }
}
