use crate::error::{IngestError, IngestResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Data source configuration
    pub source_mode: SourceMode,
    pub data_file: Option<String>,
    pub sheet_id: Option<String>,
    pub sheet_gid: Option<String>,
    pub header_strategy: HeaderStrategy,
    pub lenient_rows: bool,
    pub cache_ttl_secs: u64,
    // Presentation configuration
    pub top_states_limit: usize,
    pub crore_factor: f64,
    pub currency_label: String,
    pub output_directory: Option<String>,
    // Optional AI summary collaborator
    pub summary_api_url: Option<String>,
    pub summary_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum SourceMode {
    #[serde(rename = "local")]
    Local,
    #[serde(rename = "remote")]
    Remote,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum HeaderStrategy {
    /// Trust the header row of the source and match columns by normalized name
    #[serde(rename = "trust")]
    Trust,
    /// Discard the first row and assign the fixed field names by position
    #[serde(rename = "positional")]
    Positional,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_mode: SourceMode::Local,
            data_file: Some("expenditure_data.csv".to_string()),
            sheet_id: Some("1cRXv_5qkGmfYtrRcXRqDrRnZKnBzoabf95yb9zh5Koo".to_string()),
            sheet_gid: Some("1933215839".to_string()),
            header_strategy: HeaderStrategy::Positional,
            lenient_rows: true,
            cache_ttl_secs: 60,
            top_states_limit: 10,
            crore_factor: 10.0,
            currency_label: "INR (Cr)".to_string(),
            output_directory: Some("output".to_string()),
            summary_api_url: Some(
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
                    .to_string(),
            ),
            summary_api_key: None,
        }
    }
}

impl Config {
    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    /// Public CSV export URL for the configured sheet tab
    pub fn export_url(&self) -> IngestResult<String> {
        match (&self.sheet_id, &self.sheet_gid) {
            (Some(id), Some(gid)) => Ok(format!(
                "https://docs.google.com/spreadsheets/d/{}/export?format=csv&gid={}",
                id, gid
            )),
            _ => Err(IngestError::DataUnavailable(
                "remote mode requires sheet_id and sheet_gid in the configuration".to_string(),
            )),
        }
    }
}

/// One row of the expenditure dataset after normalization.
/// The five amount fields are always finite and non-negative; unparsable
/// source cells have already been coerced to zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub sr_no: u32,
    pub agency_name: String,
    pub unique_id: String,
    pub state: String,
    pub agency_type: String,
    pub category: String,
    pub child_expenditure_limit_assigned: f64,
    pub success: f64,
    pub pending: f64,
    pub re_initiated: f64,
    pub balance: f64,
}

/// Ordered collection of records sharing the fixed schema.
/// Built once per load cycle and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Best-effort numeric coercion, total over all string inputs.
/// Strips every character that is not an ASCII digit or a decimal point
/// (currency symbols, thousands separators, non-Latin digit artifacts) and
/// falls back to zero when nothing parsable remains. The zero fallback is
/// intentional lossy behavior for manually-entered source data.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_strips_currency_and_separators() {
        assert_eq!(parse_amount("₹1,20,000.50"), 120000.50);
        assert_eq!(parse_amount("1,234"), 1234.0);
        assert_eq!(parse_amount("  450.75 "), 450.75);
    }

    #[test]
    fn parse_amount_falls_back_to_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("N/A"), 0.0);
        assert_eq!(parse_amount("-"), 0.0);
        assert_eq!(parse_amount("1.2.3"), 0.0);
    }

    #[test]
    fn parse_amount_is_idempotent_over_normalized_values() {
        for raw in ["₹1,20,000.50", "42", "0.01", "junk"] {
            let once = parse_amount(raw);
            let twice = parse_amount(&once.to_string());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn export_url_requires_sheet_coordinates() {
        let config = Config::default();
        let url = config.export_url().unwrap();
        assert!(url.contains("format=csv"));
        assert!(url.contains(config.sheet_gid.as_deref().unwrap()));

        let mut bare = Config::default();
        bare.sheet_id = None;
        assert!(bare.export_url().is_err());
    }
}
