use crate::error::{IngestError, IngestResult};
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::{Encoding, ISO_8859_15, UTF_8, WINDOWS_1252};
use std::path::Path;
use std::time::Duration;

/// Encodings attempted in order for local files; the first clean decode wins.
const FALLBACK_ENCODINGS: [&'static Encoding; 3] = [UTF_8, WINDOWS_1252, ISO_8859_15];

/// Row-oriented table as read from the source, before schema normalization.
pub type RawTable = Vec<StringRecord>;

pub struct SourceReader {
    client: reqwest::Client,
    lenient: bool,
}

impl SourceReader {
    pub fn new(lenient: bool) -> Self {
        Self {
            client: reqwest::Client::new(),
            lenient,
        }
    }

    /// Read a local delimited-text file, tolerating legacy encodings.
    pub fn read_file(&self, file_path: &str) -> IngestResult<RawTable> {
        if !Path::new(file_path).exists() {
            return Err(IngestError::FileNotFound(file_path.to_string()));
        }

        let bytes = std::fs::read(file_path)
            .map_err(|e| IngestError::DataUnavailable(format!("failed to read {}: {}", file_path, e)))?;

        let content =
            decode_bytes(&bytes).ok_or_else(|| IngestError::Encoding(file_path.to_string()))?;

        self.parse_csv(&content)
    }

    /// Fetch CSV bytes from a spreadsheet export endpoint.
    pub async fn fetch_url(&self, url: &str) -> IngestResult<RawTable> {
        println!("🌐 Fetching data from: {}", url);

        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| IngestError::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(IngestError::AccessDenied { status });
        }
        if !response.status().is_success() {
            return Err(IngestError::Fetch(format!(
                "HTTP request failed with status: {}",
                response.status()
            )));
        }

        let content = response
            .text()
            .await
            .map_err(|e| IngestError::Fetch(format!("failed to read response body: {}", e)))?;

        self.parse_csv(&content)
    }

    /// Parse CSV text into raw rows. In lenient mode malformed rows are
    /// skipped and counted instead of failing the whole read.
    pub fn parse_csv(&self, content: &str) -> IngestResult<RawTable> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(self.lenient)
            .from_reader(content.as_bytes());

        let mut rows = Vec::new();
        let mut skipped = 0usize;

        for result in reader.records() {
            match result {
                Ok(record) => rows.push(record),
                Err(e) if self.lenient => {
                    log::warn!("skipping malformed CSV row: {}", e);
                    skipped += 1;
                }
                Err(e) => {
                    return Err(IngestError::DataUnavailable(format!(
                        "malformed CSV row: {}",
                        e
                    )))
                }
            }
        }

        if skipped > 0 {
            println!("   ⚠️  Skipped {} malformed row(s)", skipped);
        }

        Ok(rows)
    }
}

fn decode_bytes(bytes: &[u8]) -> Option<String> {
    for encoding in FALLBACK_ENCODINGS {
        let (text, _, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return Some(text.into_owned());
        }
    }
    None
}
