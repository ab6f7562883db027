use crate::clock::SharedClock;
use crate::error::{AppError, AppResult};
use crate::importer::sanitizer::SanitizedRow;
use crate::pricing::{Price, PriceError, PRICE_SCALE};
use crate::repositories::{CompanyRepository, PriceRow, StockImportRepository, StockPriceRepository};
use crate::scheduler::BatchHandle;
use std::sync::Arc;
use tracing::debug;

/// One chunk of sanitized rows dispatched as a batch task
///
/// Storage is upsert-based, so re-running a chunk is safe; the progress
/// counter may over-count under redelivery, which the boundary accepts.
pub struct ChunkJob {
    pub import_id: String,
    pub company_id: i64,
    pub rows: Vec<SanitizedRow>,
    pub prices: Arc<StockPriceRepository>,
    pub companies: Arc<CompanyRepository>,
    pub imports: Arc<StockImportRepository>,
    pub clock: SharedClock,
}

impl ChunkJob {
    pub async fn run(self, batch: BatchHandle) -> AppResult<()> {
        if batch.cancelled() {
            debug!(import = %self.import_id, "skipping chunk of cancelled batch");
            return Ok(());
        }

        if self.rows.is_empty() {
            return Ok(());
        }

        let payload = self
            .rows
            .iter()
            .map(|row| {
                Price::from_str_amount(&row.price)
                    .and_then(|price| price.to_minor(PRICE_SCALE))
                    .map(|price_minor| PriceRow {
                        traded_on: row.traded_on,
                        price_minor,
                    })
            })
            .collect::<Result<Vec<_>, PriceError>>()
            .map_err(AppError::from)?;

        self.prices
            .upsert_chunk(self.company_id, &self.import_id, &payload)
            .await?;

        // The company's updated_at keys the performance cache; bumping it
        // invalidates stale summaries as fresh prices land
        self.companies
            .touch(self.company_id, self.clock.now().naive_utc())
            .await?;

        self.imports
            .increment_processed_rows(&self.import_id, payload.len() as i64)
            .await?;

        debug!(
            import = %self.import_id,
            rows = payload.len(),
            "chunk stored"
        );

        Ok(())
    }
}
