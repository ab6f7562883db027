mod chunk;
mod handlers;
mod reader;
mod sanitizer;
mod service;

pub use chunk::ChunkJob;
pub use handlers::{ImportBatchCompleted, ImportBatchFailed};
pub use reader::ImportRowReader;
pub use sanitizer::{RawRow, RowSanitizer, SanitizedRow};
pub use service::ImportService;
