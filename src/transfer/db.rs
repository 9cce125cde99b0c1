//! Transfer Database Layer
//!
//! PostgreSQL persistence for transfer requests. The full request is kept as
//! a JSONB document; state, employee and reference are copied into columns
//! for lookup.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};

use super::adapters::TransferStore;
use super::error::TransferError;
use super::state::TransferState;
use super::types::{TransferId, TransferKind, TransferRequest};
use crate::core_types::EmployeeId;

/// Tables used by [`PgTransferStore`]
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS company_transfers_tb (
    transfer_id  TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    employee_id  BIGINT NOT NULL,
    state        SMALLINT NOT NULL,
    payload      JSONB NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL,
    updated_at   TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_company_transfers_employee
    ON company_transfers_tb (employee_id);
CREATE TABLE IF NOT EXISTS company_transfer_seq_tb (
    kind   TEXT PRIMARY KEY,
    value  BIGINT NOT NULL
);
"#;

pub struct PgTransferStore {
    pool: PgPool,
}

impl PgTransferStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the tables exist
    pub async fn connect(url: &str) -> Result<Self, TransferError> {
        let pool = PgPool::connect(url).await?;
        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    pub async fn init_schema(&self) -> Result<(), TransferError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    fn decode(row: &sqlx::postgres::PgRow) -> Result<TransferRequest, TransferError> {
        let payload: String = row.try_get("payload")?;
        Ok(serde_json::from_str(&payload)?)
    }
}

#[async_trait]
impl TransferStore for PgTransferStore {
    async fn get(&self, id: TransferId) -> Result<Option<TransferRequest>, TransferError> {
        let row = sqlx::query(
            "SELECT payload::text AS payload FROM company_transfers_tb WHERE transfer_id = $1",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn save(&self, request: &TransferRequest) -> Result<(), TransferError> {
        let payload = serde_json::to_string(request)?;
        sqlx::query(
            r#"
            INSERT INTO company_transfers_tb
                (transfer_id, name, employee_id, state, payload, created_at, updated_at)
            VALUES
                ($1, $2, $3, $4, $5::jsonb, $6, $7)
            ON CONFLICT (transfer_id) DO UPDATE
            SET state = EXCLUDED.state,
                payload = EXCLUDED.payload,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(request.id.to_string())
        .bind(&request.name)
        .bind(request.employee_id as i64)
        .bind(request.state.id())
        .bind(payload)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(transfer_id = %request.id, state = %request.state, "Transfer saved");
        Ok(())
    }

    async fn update_state_if(
        &self,
        id: TransferId,
        from: TransferState,
        to: TransferState,
    ) -> Result<bool, TransferError> {
        let updated_at = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE company_transfers_tb
            SET state = $1,
                payload = jsonb_set(
                    jsonb_set(payload, '{state}', to_jsonb($2::text)),
                    '{updated_at}',
                    to_jsonb($3::text)
                ),
                updated_at = $4
            WHERE transfer_id = $5 AND state = $6
            "#,
        )
        .bind(to.id())
        .bind(to.as_str())
        .bind(updated_at.to_rfc3339())
        .bind(updated_at)
        .bind(id.to_string())
        .bind(from.id())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn next_sequence(&self, kind: TransferKind) -> Result<u64, TransferError> {
        let value = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO company_transfer_seq_tb (kind, value) VALUES ($1, 1)
            ON CONFLICT (kind) DO UPDATE SET value = company_transfer_seq_tb.value + 1
            RETURNING value
            "#,
        )
        .bind(kind.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(value as u64)
    }

    async fn list_for_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<TransferRequest>, TransferError> {
        let rows = sqlx::query(
            r#"
            SELECT payload::text AS payload FROM company_transfers_tb
            WHERE employee_id = $1
            ORDER BY transfer_id
            "#,
        )
        .bind(employee_id as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::decode).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::test_support::sample_request;
    use crate::transfer::types::TransferMode;

    /// Connect to the database named by `DATABASE_URL`; tests skip without it
    async fn create_test_store() -> Option<PgTransferStore> {
        let url = std::env::var("DATABASE_URL").ok()?;
        PgTransferStore::connect(&url).await.ok()
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let Some(store) = create_test_store().await else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };
        let mut req = sample_request(TransferKind::Inter, TransferMode::Permanent);
        store.save(&req).await.unwrap();

        req.state = TransferState::Submit;
        store.save(&req).await.unwrap();

        let loaded = store.get(req.id).await.unwrap().unwrap();
        assert_eq!(loaded, req);
        assert!(store.list_for_employee(req.employee_id).await.unwrap().iter().any(|r| r.id == req.id));
    }

    #[tokio::test]
    async fn test_update_state_if() {
        let Some(store) = create_test_store().await else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };
        let req = sample_request(TransferKind::Inter, TransferMode::Permanent);
        store.save(&req).await.unwrap();

        assert!(store.update_state_if(req.id, TransferState::Draft, TransferState::Submit).await.unwrap());
        assert!(!store.update_state_if(req.id, TransferState::Draft, TransferState::Submit).await.unwrap());
        let loaded = store.get(req.id).await.unwrap().unwrap();
        assert_eq!(loaded.state, TransferState::Submit);
    }

    #[tokio::test]
    async fn test_sequence_increments() {
        let Some(store) = create_test_store().await else {
            eprintln!("DATABASE_URL not set, skipping");
            return;
        };
        let a = store.next_sequence(TransferKind::Intra).await.unwrap();
        let b = store.next_sequence(TransferKind::Intra).await.unwrap();
        assert_eq!(b, a + 1);
    }
}
