use async_trait::async_trait;
use invoice_core::Invoice;
use sqlx::{PgPool, Row};

use super::store::{InvoiceStore, StoreResult};

/// Repository for committed invoices
#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

struct InvoiceRow(Invoice);

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for InvoiceRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(InvoiceRow(Invoice {
            customer_name: row.try_get("customer_name")?,
            invoice_number: row.try_get("invoice_number")?,
            total_value: row.try_get("total_value")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            source_transaction_token: row.try_get("source_transaction_token")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

#[async_trait]
impl InvoiceStore for InvoiceRepository {
    #[tracing::instrument(
        skip(self, invoice),
        fields(customer = %invoice.customer_name, invoice_number = %invoice.invoice_number)
    )]
    async fn put(&self, invoice: &Invoice) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                customer_name, invoice_number, total_value, product_id,
                quantity, source_transaction_token, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (customer_name, invoice_number) DO UPDATE SET
                total_value = EXCLUDED.total_value,
                product_id = EXCLUDED.product_id,
                quantity = EXCLUDED.quantity,
                source_transaction_token = EXCLUDED.source_transaction_token,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&invoice.customer_name)
        .bind(&invoice.invoice_number)
        .bind(invoice.total_value)
        .bind(&invoice.product_id)
        .bind(invoice.quantity)
        .bind(&invoice.source_transaction_token)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(
        &self,
        customer_name: &str,
        invoice_number: &str,
    ) -> StoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT
                customer_name, invoice_number, total_value, product_id,
                quantity, source_transaction_token, created_at
            FROM invoices
            WHERE customer_name = $1 AND invoice_number = $2
            "#,
        )
        .bind(customer_name)
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|InvoiceRow(invoice)| invoice))
    }

    async fn list_for_customer(&self, customer_name: &str) -> StoreResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT
                customer_name, invoice_number, total_value, product_id,
                quantity, source_transaction_token, created_at
            FROM invoices
            WHERE customer_name = $1
            ORDER BY invoice_number
            "#,
        )
        .bind(customer_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|InvoiceRow(invoice)| invoice).collect())
    }
}
