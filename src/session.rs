use crate::aggregate::{self, CategoryRow, KpiSummary, StateSummary};
use crate::error::IngestResult;
use crate::filter::{self, CascadeOptions, FilterSelection};
use crate::models::{Config, Dataset, Record, SourceMode};
use crate::normalizer;
use crate::reader::SourceReader;
use crate::summary::{SummaryClient, SummaryState};
use std::time::{Duration, Instant};

/// Loaded dataset plus the instant it was fetched.
pub struct CachedDataset {
    pub dataset: Dataset,
    pub fetched_at: Instant,
}

impl CachedDataset {
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.fetched_at) > ttl
    }
}

/// Everything one recomputation pass hands to the presentation layer.
#[derive(Debug, Clone)]
pub struct DashboardFrame {
    pub kpis: KpiSummary,
    pub category_summary: Vec<CategoryRow>,
    pub state_summary: StateSummary,
    pub records: Vec<Record>,
    pub options: CascadeOptions,
    pub selection: FilterSelection,
}

/// Owns the cached dataset, the last selection and the AI-summary state
/// slice. Each pass replaces values wholesale rather than mutating in place.
pub struct DashboardSession {
    config: Config,
    reader: SourceReader,
    cache: Option<CachedDataset>,
    pub selection: FilterSelection,
    pub summary_state: SummaryState,
}

impl DashboardSession {
    pub fn new(config: Config) -> Self {
        let reader = SourceReader::new(config.lenient_rows);
        Self {
            config,
            reader,
            cache: None,
            selection: FilterSelection::default(),
            summary_state: SummaryState::Idle,
        }
    }

    /// One full pass: load (cache-checked) → filter → aggregate.
    /// `None` means the dataset is unavailable and downstream must halt.
    pub async fn run_pass(&mut self, selection: FilterSelection) -> Option<DashboardFrame> {
        self.selection = selection.clone();
        let top_limit = self.config.top_states_limit;

        let dataset = self.dataset().await?;
        let options = filter::cascade_options(dataset, &selection);
        let records = filter::apply(dataset, &selection);

        let kpis = aggregate::kpis(&records);
        let category_summary = aggregate::category_summary(&records);
        let state_summary = aggregate::top_states(&records, selection.state.is_some(), top_limit);

        Some(DashboardFrame {
            kpis,
            category_summary,
            state_summary,
            records,
            options,
            selection,
        })
    }

    /// Reload only when the cache is absent or older than the TTL; an
    /// ingestion failure is reported and leaves the empty-dataset sentinel.
    pub async fn dataset(&mut self) -> Option<&Dataset> {
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);
        let fresh = self
            .cache
            .as_ref()
            .map_or(false, |cached| !cached.is_expired(ttl, Instant::now()));

        if !fresh {
            match self.load().await {
                Ok(dataset) => {
                    println!("✅ Data loaded successfully ({} rows)", dataset.len());
                    self.cache = Some(CachedDataset {
                        dataset,
                        fetched_at: Instant::now(),
                    });
                }
                Err(e) => {
                    println!("❌ {}", e);
                    self.cache = None;
                    return None;
                }
            }
        } else {
            log::debug!("reusing cached dataset");
        }

        self.cache.as_ref().map(|cached| &cached.dataset)
    }

    async fn load(&self) -> IngestResult<Dataset> {
        let rows = match self.config.source_mode {
            SourceMode::Local => {
                let path = self
                    .config
                    .data_file
                    .as_deref()
                    .unwrap_or("expenditure_data.csv");
                self.reader.read_file(path)?
            }
            SourceMode::Remote => {
                let url = self.config.export_url()?;
                self.reader.fetch_url(&url).await?
            }
        };
        normalizer::normalize(&rows, self.config.header_strategy, self.config.lenient_rows)
    }

    /// Best-effort AI summary. Tracks its own state so a failure here never
    /// touches KPIs or tables already computed.
    pub async fn request_summary(&mut self, client: &SummaryClient, frame: &DashboardFrame) {
        self.summary_state = SummaryState::Pending;
        self.summary_state = match client.summarize(&frame.kpis, &frame.selection).await {
            Ok(text) => SummaryState::Ready(text),
            Err(e) => SummaryState::Failed(e.to_string()),
        };
    }
}
