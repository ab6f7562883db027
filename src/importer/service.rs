use crate::clock::SharedClock;
use crate::config::ImportConfig;
use crate::error::{AppError, AppResult, RepositoryError};
use crate::importer::chunk::ChunkJob;
use crate::importer::handlers::{ImportBatchCompleted, ImportBatchFailed};
use crate::importer::reader::ImportRowReader;
use crate::importer::sanitizer::{RowSanitizer, SanitizedRow};
use crate::models::StockImport;
use crate::repositories::{
    CompanyRepository, NewStockImport, StockImportRepository, StockPriceRepository,
};
use crate::scheduler::BatchHandle;
use crate::storage::FileStorage;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Orchestrates the stock import pipeline: store the upload, queue it,
/// then fan the sanitized rows out as chunked batch tasks
///
/// Every lifecycle step tolerates redelivery: terminal imports no-op,
/// chunk writes are upserts, and batch callbacks fire at most once.
#[derive(Clone)]
pub struct ImportService {
    companies: Arc<CompanyRepository>,
    imports: Arc<StockImportRepository>,
    prices: Arc<StockPriceRepository>,
    storage: Arc<dyn FileStorage>,
    clock: SharedClock,
    config: ImportConfig,
    sanitizer: RowSanitizer,
}

impl ImportService {
    /// Create a new ImportService
    pub fn new(
        companies: Arc<CompanyRepository>,
        imports: Arc<StockImportRepository>,
        prices: Arc<StockPriceRepository>,
        storage: Arc<dyn FileStorage>,
        clock: SharedClock,
        config: ImportConfig,
    ) -> Self {
        Self {
            companies,
            imports,
            prices,
            storage,
            clock,
            config,
            sanitizer: RowSanitizer::new(),
        }
    }

    /// Persist an uploaded spreadsheet and create its pending import record
    ///
    /// The stored file is removed again if the record cannot be inserted,
    /// so a failed upload leaves no orphan on disk.
    pub async fn create_from_upload(
        &self,
        company_id: i64,
        original_filename: &str,
        bytes: &[u8],
    ) -> AppResult<StockImport> {
        if self.companies.find_by_id(company_id).await?.is_none() {
            return Err(AppError::NotFound("Company not found.".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("csv");
        let stored_path = format!("imports/{}.{}", id, extension);

        self.storage
            .store(&stored_path, bytes)
            .await
            .map_err(|err| AppError::Storage(err.to_string()))?;

        let now = self.clock.now().naive_utc();
        let record = NewStockImport {
            id: &id,
            company_id,
            original_filename,
            stored_path: &stored_path,
            disk: self.storage.disk(),
        };

        match self.imports.create(record, now).await {
            Ok(import) => {
                info!(
                    import = %import.id,
                    company = company_id,
                    filename = original_filename,
                    "stock import created"
                );
                Ok(import)
            }
            Err(err) => {
                if let Err(cleanup) = self.storage.delete(&stored_path).await {
                    warn!(path = %stored_path, error = %cleanup, "orphaned upload left behind");
                }
                Err(AppError::from(RepositoryError::from(err)))
            }
        }
    }

    /// Queue a pending import and hand it to a background worker
    ///
    /// Returns the worker's join handle, or `None` when the import is
    /// missing or already terminal. Re-queueing a non-terminal import
    /// resets its progress and starts over.
    pub async fn queue(&self, import_id: &str) -> AppResult<Option<JoinHandle<()>>> {
        let Some(import) = self.imports.find_by_id(import_id).await? else {
            return Ok(None);
        };

        if import.is_terminal() {
            return Ok(None);
        }

        let queued = self
            .imports
            .mark_queued(&import.id, self.clock.now().naive_utc())
            .await?;
        if !queued {
            return Ok(None);
        }

        info!(import = %import.id, company = import.company_id, "stock import queued");

        let service = self.clone();
        let id = import.id.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = service.process(&id).await {
                // The failure is already recorded on the import row
                error!(import = %id, error = %err, "stock import processing failed");
            }
        });

        Ok(Some(handle))
    }

    /// Read, sanitize, and dispatch an import's rows as chunked batch tasks
    ///
    /// Returns the dispatched batch, `None` when there was nothing to do
    /// (missing or terminal import, or a file with no valid rows). File
    /// access and read errors are fatal and fail the import; individual
    /// malformed rows are silently dropped.
    pub async fn process(&self, import_id: &str) -> AppResult<Option<BatchHandle>> {
        let Some(import) = self.imports.find_by_id(import_id).await? else {
            warn!(import = import_id, "import vanished before processing");
            return Ok(None);
        };

        if import.is_terminal() {
            return Ok(None);
        }

        self.imports
            .mark_processing(&import.id, self.clock.now().naive_utc())
            .await?;

        let completion = Arc::new(ImportBatchCompleted::new(
            self.imports.clone(),
            self.clock.clone(),
            import.id.clone(),
        ));
        let failure = Arc::new(ImportBatchFailed::new(
            self.imports.clone(),
            self.clock.clone(),
            import.id.clone(),
        ));

        let resolved = match self.storage.resolve_local(&import.stored_path).await {
            Ok(resolved) => resolved,
            Err(err) => {
                let err = AppError::Storage(err.to_string());
                failure.record(&err.to_string()).await;
                return Err(err);
            }
        };

        let reader = match ImportRowReader::open(resolved.path()) {
            Ok(reader) => reader,
            Err(err) => {
                let err = AppError::Storage(format!("Unable to read import file: {}", err));
                failure.record(&err.to_string()).await;
                return Err(err);
            }
        };

        let mut batch: Option<BatchHandle> = None;
        let mut buffer: Vec<SanitizedRow> = Vec::with_capacity(self.config.chunk_size);
        let mut total_rows: i64 = 0;

        for record in reader {
            let row = match record {
                Ok(row) => row,
                Err(err) => {
                    // A mid-file read error poisons the whole import
                    if let Some(batch) = &batch {
                        batch.cancel();
                    }
                    let err = AppError::Storage(format!("Unable to read import file: {}", err));
                    failure.record(&err.to_string()).await;
                    return Err(err);
                }
            };

            let Some(sanitized) = self.sanitizer.sanitize(&row) else {
                continue;
            };

            buffer.push(sanitized);
            total_rows += 1;

            if buffer.len() >= self.config.chunk_size {
                let rows = std::mem::replace(
                    &mut buffer,
                    Vec::with_capacity(self.config.chunk_size),
                );
                self.dispatch_chunk(&mut batch, rows, &import, &completion, &failure)
                    .await;
            }
        }

        if !buffer.is_empty() {
            self.dispatch_chunk(&mut batch, buffer, &import, &completion, &failure)
                .await;
        }

        match batch {
            None => {
                // Nothing worth importing; complete immediately without a batch
                self.imports
                    .complete_empty(&import.id, self.clock.now().naive_utc())
                    .await?;
                info!(import = %import.id, "stock import had no valid rows");
                Ok(None)
            }
            Some(batch) => {
                self.imports
                    .set_batch(
                        &import.id,
                        batch.id(),
                        total_rows,
                        self.clock.now().naive_utc(),
                    )
                    .await?;
                batch.seal().await;

                info!(
                    import = %import.id,
                    batch = %batch.id(),
                    rows = total_rows,
                    "stock import dispatched"
                );
                Ok(Some(batch))
            }
        }
    }

    /// Start the batch lazily on the first chunk, then add the chunk task
    async fn dispatch_chunk(
        &self,
        batch: &mut Option<BatchHandle>,
        rows: Vec<SanitizedRow>,
        import: &StockImport,
        completion: &Arc<ImportBatchCompleted>,
        failure: &Arc<ImportBatchFailed>,
    ) {
        let handle = batch
            .get_or_insert_with(|| {
                BatchHandle::new(
                    format!("stock-import:{}", import.id),
                    completion.clone(),
                    failure.clone(),
                )
            })
            .clone();

        let job = ChunkJob {
            import_id: import.id.clone(),
            company_id: import.company_id,
            rows,
            prices: self.prices.clone(),
            companies: self.companies.clone(),
            imports: self.imports.clone(),
            clock: self.clock.clone(),
        };

        let task_batch = handle.clone();
        handle.add_task(job.run(task_batch)).await;
    }
}
