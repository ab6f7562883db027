use crate::importer::sanitizer::RawRow;
use csv::{ReaderBuilder, StringRecordsIntoIter, Trim};
use std::fs::File;
use std::path::Path;

/// Streaming CSV reader yielding header-keyed rows
///
/// Headers are normalized to snake_case so "Stock Price" and
/// "stock_price" address the same column downstream.
pub struct ImportRowReader {
    headers: Vec<String>,
    records: StringRecordsIntoIter<File>,
}

impl ImportRowReader {
    /// Open a spreadsheet file for row-by-row reading
    pub fn open(path: &Path) -> Result<Self, csv::Error> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_path(path)?;

        let headers = reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect::<Vec<_>>();

        Ok(Self {
            headers,
            records: reader.into_records(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for ImportRowReader {
    type Item = Result<RawRow, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;

        Some(record.map(|record| {
            self.headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, value)| (header.clone(), value.to_string()))
                .collect()
        }))
    }
}

/// Lowercase, non-alphanumerics to underscores, runs collapsed
fn normalize_header(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());

    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            normalized.push(ch.to_ascii_lowercase());
        } else if !normalized.ends_with('_') {
            normalized.push('_');
        }
    }

    normalized.trim_matches('_').to_string()
}
