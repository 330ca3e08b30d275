use async_trait::async_trait;
use chrono::{DateTime, Utc};
use invoice_core::{InvoiceTransaction, TransactionStatus};
use sqlx::{PgPool, Row};

use super::store::{ensure_persistable, StoreError, StoreResult, TransactionStore, TransitionOutcome};

/// Repository for import transactions
#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_status(&self, token: &str) -> StoreResult<Option<TransactionStatus>> {
        let row = sqlx::query(
            r#"
            SELECT status
            FROM invoice_transactions
            WHERE token = $1 AND ttl > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| parse_status(row.get("status"))).transpose()
    }
}

fn parse_status(raw: String) -> StoreResult<TransactionStatus> {
    raw.parse()
        .map_err(|_| StoreError::Corrupt(format!("unknown transaction status '{}'", raw)))
}

/// Transaction row
struct TransactionRow {
    token: String,
    status: String,
    connection_id: String,
    request_id: String,
    endpoint: Option<String>,
    expires_in_seconds: i64,
    created_at: DateTime<Utc>,
    ttl: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for TransactionRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(TransactionRow {
            token: row.try_get("token")?,
            status: row.try_get("status")?,
            connection_id: row.try_get("connection_id")?,
            request_id: row.try_get("request_id")?,
            endpoint: row.try_get("endpoint")?,
            expires_in_seconds: row.try_get("expires_in_seconds")?,
            created_at: row.try_get("created_at")?,
            ttl: row.try_get("ttl")?,
        })
    }
}

impl TryFrom<TransactionRow> for InvoiceTransaction {
    type Error = StoreError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(InvoiceTransaction {
            status: parse_status(row.status)?,
            token: row.token,
            connection_id: row.connection_id,
            created_at: row.created_at,
            expires_in_seconds: row.expires_in_seconds,
            ttl: row.ttl,
            request_id: row.request_id,
            endpoint: row.endpoint,
        })
    }
}

#[async_trait]
impl TransactionStore for TransactionRepository {
    #[tracing::instrument(skip(self, transaction), fields(token = %transaction.token))]
    async fn create(&self, transaction: &InvoiceTransaction) -> StoreResult<()> {
        ensure_persistable(transaction.status)?;

        // Use dynamic SQLx queries to avoid requiring DATABASE_URL/sqlx prepare
        let result = sqlx::query(
            r#"
            INSERT INTO invoice_transactions (
                token, status, connection_id, request_id, endpoint,
                expires_in_seconds, created_at, ttl
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (token) DO NOTHING
            "#,
        )
        .bind(&transaction.token)
        .bind(transaction.status.as_str())
        .bind(&transaction.connection_id)
        .bind(&transaction.request_id)
        .bind(&transaction.endpoint)
        .bind(transaction.expires_in_seconds)
        .bind(transaction.created_at)
        .bind(transaction.ttl)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(transaction.token.clone()));
        }

        Ok(())
    }

    async fn get(&self, token: &str) -> StoreResult<InvoiceTransaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT
                token, status, connection_id, request_id, endpoint,
                expires_in_seconds, created_at, ttl
            FROM invoice_transactions
            WHERE token = $1 AND ttl > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row.try_into(),
            None => Err(StoreError::NotFound(token.to_string())),
        }
    }

    async fn update_status(&self, token: &str, status: TransactionStatus) -> StoreResult<()> {
        ensure_persistable(status)?;

        let result = sqlx::query(
            r#"
            UPDATE invoice_transactions
            SET status = $2, updated_at = NOW()
            WHERE token = $1 AND ttl > NOW()
            "#,
        )
        .bind(token)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(token.to_string()));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn transition_status(
        &self,
        token: &str,
        expected: TransactionStatus,
        status: TransactionStatus,
    ) -> StoreResult<TransitionOutcome> {
        ensure_persistable(status)?;

        let applied = sqlx::query(
            r#"
            UPDATE invoice_transactions
            SET status = $3, updated_at = NOW()
            WHERE token = $1 AND status = $2 AND ttl > NOW()
            RETURNING token
            "#,
        )
        .bind(token)
        .bind(expected.as_str())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if applied.is_some() {
            return Ok(TransitionOutcome::Applied);
        }

        match self.current_status(token).await? {
            Some(current) => {
                tracing::debug!(%current, "Conditional status write lost");
                Ok(TransitionOutcome::Conflict { current })
            }
            None => Err(StoreError::NotFound(token.to_string())),
        }
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM invoice_transactions
            WHERE ttl <= NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
