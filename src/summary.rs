use crate::aggregate::KpiSummary;
use crate::filter::FilterSelection;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Failures of the external summarization collaborator. These are reported
/// inline and never affect the rest of the dashboard state.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Summary request failed: {0}")]
    Network(String),

    #[error("Summary service rejected the request (HTTP {0}); check the API key")]
    Auth(u16),

    #[error("Summary service returned an unexpected payload")]
    MalformedResponse,
}

/// Lifecycle of the optional AI summary, kept apart from the KPI state so
/// the presentation layer can render it independently.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryState {
    Idle,
    Pending,
    Ready(String),
    Failed(String),
}

pub struct SummaryClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl SummaryClient {
    pub fn new(url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }

    /// Ask the language-model endpoint for a short free-text summary of the
    /// current KPI snapshot.
    pub async fn summarize(
        &self,
        kpis: &KpiSummary,
        selection: &FilterSelection,
    ) -> Result<String, SummaryError> {
        let prompt = build_prompt(kpis, selection);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| SummaryError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(SummaryError::Auth(status));
        }
        if !response.status().is_success() {
            return Err(SummaryError::Network(format!("HTTP status {}", status)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|_| SummaryError::MalformedResponse)?;

        extract_text(&payload).ok_or(SummaryError::MalformedResponse)
    }
}

/// Plain-text prompt embedding the six KPI figures and the filter scope.
pub fn build_prompt(kpis: &KpiSummary, selection: &FilterSelection) -> String {
    format!(
        "Summarize this agency expenditure snapshot in two or three sentences \
         for a program officer.\n\
         Scope: state={}, category={}, agency={}, code={}.\n\
         Total budget assigned: {:.2}. Total success: {:.2}. \
         Success rate: {:.2}%. Total pending: {:.2}. \
         Total re-initiated: {:.2}. Total balance: {:.2}.",
        selection.state_label(),
        selection.category_label(),
        selection.agency_label(),
        selection.unique_id_label(),
        kpis.total_limit,
        kpis.total_success,
        kpis.success_rate,
        kpis.total_pending,
        kpis.total_re_initiated,
        kpis.total_balance,
    )
}

fn extract_text(payload: &Value) -> Option<String> {
    let text = payload["candidates"][0]["content"]["parts"][0]["text"].as_str()?;
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kpis() -> KpiSummary {
        KpiSummary {
            total_limit: 300.0,
            total_success: 150.0,
            total_pending: 30.0,
            total_re_initiated: 20.0,
            total_balance: 100.0,
            success_rate: 50.0,
        }
    }

    #[test]
    fn prompt_embeds_all_six_figures_and_the_scope() {
        let mut selection = FilterSelection::default();
        selection.set_state(Some("UP".to_string()));
        let prompt = build_prompt(&kpis(), &selection);

        assert!(prompt.contains("state=UP"));
        assert!(prompt.contains("category=All Categories"));
        assert!(prompt.contains("300.00"));
        assert!(prompt.contains("150.00"));
        assert!(prompt.contains("50.00%"));
        assert!(prompt.contains("30.00"));
        assert!(prompt.contains("20.00"));
        assert!(prompt.contains("100.00"));
    }

    #[test]
    fn extract_text_reads_the_first_candidate() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "  Spending is on track. " }] }
            }]
        });
        assert_eq!(extract_text(&payload).unwrap(), "Spending is on track.");
    }

    #[test]
    fn malformed_payloads_yield_none() {
        assert!(extract_text(&json!({})).is_none());
        assert!(extract_text(&json!({ "candidates": [] })).is_none());
        assert!(extract_text(&json!({
            "candidates": [{ "content": { "parts": [{ "text": "   " }] } }]
        }))
        .is_none());
    }
}
