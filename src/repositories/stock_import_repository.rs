use crate::models::{StockImport, StockImportStatus};
use chrono::NaiveDateTime;
use sqlx::{Result as SqlxResult, SqlitePool};

/// Fields for a freshly uploaded import record
pub struct NewStockImport<'a> {
    pub id: &'a str,
    pub company_id: i64,
    pub original_filename: &'a str,
    pub stored_path: &'a str,
    pub disk: &'a str,
}

/// Repository for stock import lifecycle state
///
/// Status transitions are guarded in SQL: updates never move an import out
/// of a terminal status, so duplicate deliveries and late callbacks
/// degrade to no-ops instead of corrupting the state machine.
pub struct StockImportRepository {
    pool: SqlitePool,
}

const TERMINAL_GUARD: &str = "status NOT IN ('completed', 'failed')";

impl StockImportRepository {
    /// Create a new StockImportRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a pending import record
    pub async fn create(
        &self,
        import: NewStockImport<'_>,
        now: NaiveDateTime,
    ) -> SqlxResult<StockImport> {
        sqlx::query_as::<_, StockImport>(
            r#"
            INSERT INTO stock_imports
                (id, company_id, original_filename, stored_path, disk, status,
                 processed_rows, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'pending', 0, ?, ?)
            RETURNING *
            "#,
        )
        .bind(import.id)
        .bind(import.company_id)
        .bind(import.original_filename)
        .bind(import.stored_path)
        .bind(import.disk)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Find an import by id
    pub async fn find_by_id(&self, id: &str) -> SqlxResult<Option<StockImport>> {
        sqlx::query_as::<_, StockImport>("SELECT * FROM stock_imports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// List imports for a company, newest first
    pub async fn list_for_company(&self, company_id: i64) -> SqlxResult<Vec<StockImport>> {
        sqlx::query_as::<_, StockImport>(
            r#"
            SELECT * FROM stock_imports
            WHERE company_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(company_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Move a non-terminal import back to the queue, resetting progress
    ///
    /// Returns false when the import was terminal or missing (no-op).
    pub async fn mark_queued(&self, id: &str, now: NaiveDateTime) -> SqlxResult<bool> {
        let sql = format!(
            r#"
            UPDATE stock_imports
            SET status = 'queued', queued_at = ?, processed_rows = 0,
                failure_reason = NULL, batch_id = NULL, updated_at = ?
            WHERE id = ? AND {TERMINAL_GUARD}
            "#
        );

        let result = sqlx::query(&sql)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark an import processing, stamping started_at and clearing any
    /// progress left over from an earlier attempt
    pub async fn mark_processing(&self, id: &str, now: NaiveDateTime) -> SqlxResult<bool> {
        let sql = format!(
            r#"
            UPDATE stock_imports
            SET status = 'processing', started_at = ?, processed_rows = 0,
                failure_reason = NULL, updated_at = ?
            WHERE id = ? AND {TERMINAL_GUARD}
            "#
        );

        let result = sqlx::query(&sql)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the dispatched batch id and the total row count
    pub async fn set_batch(
        &self,
        id: &str,
        batch_id: &str,
        total_rows: i64,
        now: NaiveDateTime,
    ) -> SqlxResult<()> {
        sqlx::query(
            r#"
            UPDATE stock_imports
            SET batch_id = ?, total_rows = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(batch_id)
        .bind(total_rows)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Mark an import completed; a no-op if it already reached a terminal
    /// status (e.g. externally failed mid-flight)
    pub async fn mark_completed(&self, id: &str, now: NaiveDateTime) -> SqlxResult<bool> {
        let sql = format!(
            r#"
            UPDATE stock_imports
            SET status = 'completed', completed_at = ?, updated_at = ?
            WHERE id = ? AND {TERMINAL_GUARD}
            "#
        );

        let result = sqlx::query(&sql)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Complete an import that produced no chunk work at all
    pub async fn complete_empty(&self, id: &str, now: NaiveDateTime) -> SqlxResult<bool> {
        let sql = format!(
            r#"
            UPDATE stock_imports
            SET status = 'completed', completed_at = ?, total_rows = 0,
                processed_rows = 0, updated_at = ?
            WHERE id = ? AND {TERMINAL_GUARD}
            "#
        );

        let result = sqlx::query(&sql)
            .bind(now)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark an import failed with the triggering error's message
    pub async fn mark_failed(
        &self,
        id: &str,
        reason: &str,
        now: NaiveDateTime,
    ) -> SqlxResult<bool> {
        let sql = format!(
            r#"
            UPDATE stock_imports
            SET status = 'failed', failed_at = ?, failure_reason = ?, updated_at = ?
            WHERE id = ? AND {TERMINAL_GUARD}
            "#
        );

        let result = sqlx::query(&sql)
            .bind(now)
            .bind(reason)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically advance the processed-rows counter
    ///
    /// The increment happens in SQL, not read-modify-write in the
    /// application, so concurrent chunk tasks cannot lose updates.
    pub async fn increment_processed_rows(&self, id: &str, count: i64) -> SqlxResult<()> {
        sqlx::query(
            r#"
            UPDATE stock_imports
            SET processed_rows = processed_rows + ?
            WHERE id = ?
            "#,
        )
        .bind(count)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch just the status of an import
    pub async fn status_of(&self, id: &str) -> SqlxResult<Option<StockImportStatus>> {
        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM stock_imports WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(status.map(|(s,)| StockImportStatus::from(s)))
    }
}
