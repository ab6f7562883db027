use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle status of a stock import
///
/// `pending -> queued -> processing -> {completed | failed}`. Completed and
/// Failed are terminal: no transition leaves them, and operations against a
/// terminal import are silent no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockImportStatus {
    Pending,
    Queued,
    Processing,
    Completed,
    Failed,
}

impl StockImportStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StockImportStatus::Pending),
            "queued" => Ok(StockImportStatus::Queued),
            "processing" => Ok(StockImportStatus::Processing),
            "completed" => Ok(StockImportStatus::Completed),
            "failed" => Ok(StockImportStatus::Failed),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            StockImportStatus::Pending => "pending",
            StockImportStatus::Queued => "queued",
            StockImportStatus::Processing => "processing",
            StockImportStatus::Completed => "completed",
            StockImportStatus::Failed => "failed",
        }
    }

    /// Whether no further transition is permitted
    pub fn is_terminal(&self) -> bool {
        matches!(self, StockImportStatus::Completed | StockImportStatus::Failed)
    }

    /// Dashboard badge color
    pub fn color(&self) -> &'static str {
        match self {
            StockImportStatus::Completed => "green",
            StockImportStatus::Failed => "red",
            StockImportStatus::Processing => "blue",
            StockImportStatus::Queued => "amber",
            StockImportStatus::Pending => "zinc",
        }
    }
}

impl From<String> for StockImportStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(StockImportStatus::Pending)
    }
}

impl From<StockImportStatus> for String {
    fn from(status: StockImportStatus) -> Self {
        status.as_str().to_string()
    }
}

/// One uploaded spreadsheet and its ingestion progress
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StockImport {
    pub id: String,
    pub company_id: i64,
    pub original_filename: String,
    pub stored_path: String,
    pub disk: String,
    pub status: String, // Stored as TEXT, use StockImportStatus for type safety
    pub total_rows: Option<i64>,
    pub processed_rows: i64,
    pub batch_id: Option<String>,
    pub queued_at: Option<NaiveDateTime>,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub failed_at: Option<NaiveDateTime>,
    pub failure_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl StockImport {
    /// Get status as an enum
    pub fn status_enum(&self) -> StockImportStatus {
        StockImportStatus::from_str(&self.status).unwrap_or(StockImportStatus::Pending)
    }

    /// Check if the import is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status_enum().is_terminal()
    }
}
