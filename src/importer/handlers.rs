use crate::clock::SharedClock;
use crate::error::AppError;
use crate::repositories::StockImportRepository;
use crate::scheduler::{BatchCompletionHandler, BatchFailureHandler};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

/// Marks the owning import completed once its whole batch succeeds
pub struct ImportBatchCompleted {
    imports: Arc<StockImportRepository>,
    clock: SharedClock,
    import_id: String,
}

impl ImportBatchCompleted {
    pub fn new(
        imports: Arc<StockImportRepository>,
        clock: SharedClock,
        import_id: impl Into<String>,
    ) -> Self {
        Self {
            imports,
            clock,
            import_id: import_id.into(),
        }
    }
}

#[async_trait]
impl BatchCompletionHandler for ImportBatchCompleted {
    async fn on_batch_completed(&self, batch_id: &str) {
        match self
            .imports
            .mark_completed(&self.import_id, self.clock.now().naive_utc())
            .await
        {
            Ok(true) => {
                info!(import = %self.import_id, batch = %batch_id, "stock import completed");
            }
            Ok(false) => {
                // Import already reached a terminal status; nothing to do
            }
            Err(err) => {
                error!(import = %self.import_id, error = %err, "failed to mark import completed");
            }
        }
    }
}

/// Marks the owning import failed with the first error's message
pub struct ImportBatchFailed {
    imports: Arc<StockImportRepository>,
    clock: SharedClock,
    import_id: String,
}

impl ImportBatchFailed {
    pub fn new(
        imports: Arc<StockImportRepository>,
        clock: SharedClock,
        import_id: impl Into<String>,
    ) -> Self {
        Self {
            imports,
            clock,
            import_id: import_id.into(),
        }
    }

    /// Record a failure reason on the import; terminal imports are left alone
    pub async fn record(&self, reason: &str) {
        match self
            .imports
            .mark_failed(&self.import_id, reason, self.clock.now().naive_utc())
            .await
        {
            Ok(true) => {
                info!(import = %self.import_id, reason, "stock import failed");
            }
            Ok(false) => {}
            Err(err) => {
                error!(import = %self.import_id, error = %err, "failed to mark import failed");
            }
        }
    }
}

#[async_trait]
impl BatchFailureHandler for ImportBatchFailed {
    async fn on_batch_failed(&self, _batch_id: &str, error: &AppError) {
        self.record(&error.to_string()).await;
    }
}
