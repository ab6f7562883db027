use crate::models::Company;
use chrono::NaiveDateTime;
use sqlx::{Result as SqlxResult, SqlitePool};

/// Repository for company data access
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Create a new CompanyRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new company
    pub async fn create(
        &self,
        name: &str,
        symbol: &str,
        now: NaiveDateTime,
    ) -> SqlxResult<Company> {
        let slug = Company::slugify(name);

        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (name, symbol, slug, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, symbol, slug, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(symbol)
        .bind(slug)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a company by id
    pub async fn find_by_id(&self, id: i64) -> SqlxResult<Option<Company>> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, symbol, slug, created_at, updated_at
            FROM companies
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a company by ticker symbol
    pub async fn find_by_symbol(&self, symbol: &str) -> SqlxResult<Option<Company>> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, symbol, slug, created_at, updated_at
            FROM companies
            WHERE symbol = ?
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await
    }

    /// List all companies ordered by name
    pub async fn list(&self) -> SqlxResult<Vec<Company>> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT id, name, symbol, slug, created_at, updated_at
            FROM companies
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Bump the company's last-modified timestamp
    ///
    /// Invalidates downstream performance caches keyed on it. Concurrent
    /// touches may interleave; only the final value matters.
    pub async fn touch(&self, id: i64, now: NaiveDateTime) -> SqlxResult<()> {
        sqlx::query("UPDATE companies SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a company (imports and prices cascade)
    pub async fn delete(&self, id: i64) -> SqlxResult<bool> {
        let result = sqlx::query("DELETE FROM companies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
