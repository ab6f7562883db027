use crate::models::StockPrice;
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Result as SqlxResult, Sqlite, SqlitePool};

const SELECT_COLUMNS: &str = "id, company_id, stock_import_id, traded_on, price";

/// One sanitized row ready for storage, price already in minor units
#[derive(Debug, Clone)]
pub struct PriceRow {
    pub traded_on: NaiveDate,
    pub price_minor: i64,
}

/// Repository for stock price history
///
/// Writes go through a single upsert path keyed on
/// `(company_id, traded_on)`: the uniqueness constraint plus
/// update-on-conflict serializes concurrent writers at the storage layer
/// and makes chunk reprocessing idempotent.
pub struct StockPriceRepository {
    pool: SqlitePool,
}

impl StockPriceRepository {
    /// Create a new StockPriceRepository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Bulk upsert one chunk of rows for a company
    ///
    /// On conflict the price (and lineage) columns are overwritten: last
    /// write wins per `(company, date)`.
    pub async fn upsert_chunk(
        &self,
        company_id: i64,
        import_id: &str,
        rows: &[PriceRow],
    ) -> SqlxResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO stock_prices (company_id, stock_import_id, traded_on, price) ",
        );

        builder.push_values(rows, |mut b, row| {
            b.push_bind(company_id)
                .push_bind(import_id)
                .push_bind(row.traded_on)
                .push_bind(row.price_minor);
        });

        builder.push(
            r#"
            ON CONFLICT (company_id, traded_on) DO UPDATE SET
                price = excluded.price,
                stock_import_id = excluded.stock_import_id
            "#,
        );

        let result = builder.build().execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    /// Earliest price on record, regardless of date
    pub async fn oldest(&self, company_id: i64) -> SqlxResult<Option<StockPrice>> {
        sqlx::query_as::<_, StockPrice>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM stock_prices
            WHERE company_id = ?
            ORDER BY traded_on
            LIMIT 1
            "#
        ))
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Earliest price with trade date in `[start, end]`
    pub async fn first_in_range(
        &self,
        company_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SqlxResult<Option<StockPrice>> {
        sqlx::query_as::<_, StockPrice>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM stock_prices
            WHERE company_id = ? AND traded_on BETWEEN ? AND ?
            ORDER BY traded_on
            LIMIT 1
            "#
        ))
        .bind(company_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await
    }

    /// Earliest trade on or after the target date (next trading day)
    pub async fn first_on_or_after(
        &self,
        company_id: i64,
        target: NaiveDate,
    ) -> SqlxResult<Option<StockPrice>> {
        sqlx::query_as::<_, StockPrice>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM stock_prices
            WHERE company_id = ? AND traded_on >= ?
            ORDER BY traded_on
            LIMIT 1
            "#
        ))
        .bind(company_id)
        .bind(target)
        .fetch_optional(&self.pool)
        .await
    }

    /// Latest trade on or before the target date (previous trading day)
    pub async fn last_on_or_before(
        &self,
        company_id: i64,
        target: NaiveDate,
    ) -> SqlxResult<Option<StockPrice>> {
        sqlx::query_as::<_, StockPrice>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM stock_prices
            WHERE company_id = ? AND traded_on <= ?
            ORDER BY traded_on DESC
            LIMIT 1
            "#
        ))
        .bind(company_id)
        .bind(target)
        .fetch_optional(&self.pool)
        .await
    }

    /// Most recent price, optionally bounded by an as-of date
    pub async fn latest(
        &self,
        company_id: i64,
        as_of: Option<NaiveDate>,
    ) -> SqlxResult<Option<StockPrice>> {
        match as_of {
            Some(date) => self.last_on_or_before(company_id, date).await,
            None => {
                sqlx::query_as::<_, StockPrice>(&format!(
                    r#"
                    SELECT {SELECT_COLUMNS} FROM stock_prices
                    WHERE company_id = ?
                    ORDER BY traded_on DESC
                    LIMIT 1
                    "#
                ))
                .bind(company_id)
                .fetch_optional(&self.pool)
                .await
            }
        }
    }

    /// Price traded exactly on the given date
    pub async fn find_on(
        &self,
        company_id: i64,
        date: NaiveDate,
    ) -> SqlxResult<Option<StockPrice>> {
        sqlx::query_as::<_, StockPrice>(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM stock_prices
            WHERE company_id = ? AND traded_on = ?
            "#
        ))
        .bind(company_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
    }

    /// Number of stored prices for a company
    pub async fn count_for_company(&self, company_id: i64) -> SqlxResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM stock_prices WHERE company_id = ?")
                .bind(company_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
