use crate::models::Record;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Scalar KPIs over the filtered subset, in base currency units.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    pub total_limit: f64,
    pub total_success: f64,
    pub total_pending: f64,
    pub total_re_initiated: f64,
    pub total_balance: f64,
    /// success ÷ limit × 100; defined as zero when the limit sum is zero
    pub success_rate: f64,
}

impl KpiSummary {
    /// Pure display transform: divide every amount by the factor.
    /// The rate is a ratio and stays as it is.
    pub fn scaled(&self, factor: f64) -> KpiSummary {
        KpiSummary {
            total_limit: self.total_limit / factor,
            total_success: self.total_success / factor,
            total_pending: self.total_pending / factor,
            total_re_initiated: self.total_re_initiated / factor,
            total_balance: self.total_balance / factor,
            success_rate: self.success_rate,
        }
    }
}

pub fn kpis(records: &[Record]) -> KpiSummary {
    let total_limit: f64 = records
        .iter()
        .map(|r| r.child_expenditure_limit_assigned)
        .sum();
    let total_success: f64 = records.iter().map(|r| r.success).sum();
    let total_pending: f64 = records.iter().map(|r| r.pending).sum();
    let total_re_initiated: f64 = records.iter().map(|r| r.re_initiated).sum();
    let total_balance: f64 = records.iter().map(|r| r.balance).sum();

    let success_rate = if total_limit != 0.0 {
        total_success / total_limit * 100.0
    } else {
        0.0
    };

    KpiSummary {
        total_limit,
        total_success,
        total_pending,
        total_re_initiated,
        total_balance,
        success_rate,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub category: String,
    pub success: f64,
    pub pending: f64,
    pub re_initiated: f64,
}

impl CategoryRow {
    pub fn scaled(&self, factor: f64) -> CategoryRow {
        CategoryRow {
            category: self.category.clone(),
            success: self.success / factor,
            pending: self.pending / factor,
            re_initiated: self.re_initiated / factor,
        }
    }
}

/// Status sums per category present in the filtered data, sorted by
/// category. Absent categories are not zero-filled.
pub fn category_summary(records: &[Record]) -> Vec<CategoryRow> {
    let mut groups: BTreeMap<String, (f64, f64, f64)> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(record.category.clone()).or_insert((0.0, 0.0, 0.0));
        entry.0 += record.success;
        entry.1 += record.pending;
        entry.2 += record.re_initiated;
    }

    groups
        .into_iter()
        .map(|(category, (success, pending, re_initiated))| CategoryRow {
            category,
            success,
            pending,
            re_initiated,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateRow {
    pub state: String,
    pub total_limit: f64,
}

impl StateRow {
    pub fn scaled(&self, factor: f64) -> StateRow {
        StateRow {
            state: self.state.clone(),
            total_limit: self.total_limit / factor,
        }
    }
}

/// Top-N view by state, or a marker when it is not meaningful.
#[derive(Debug, Clone, PartialEq)]
pub enum StateSummary {
    Ranked(Vec<StateRow>),
    /// A top-states ranking degenerates to one row when a state filter is
    /// active, so the engine signals inapplicability instead.
    NotApplicable,
}

pub fn top_states(records: &[Record], state_filter_active: bool, limit: usize) -> StateSummary {
    if state_filter_active {
        return StateSummary::NotApplicable;
    }

    // States group case-insensitively, like the filter level
    let mut groups: HashMap<String, f64> = HashMap::new();
    for record in records {
        *groups.entry(record.state.to_uppercase()).or_insert(0.0) +=
            record.child_expenditure_limit_assigned;
    }

    let mut ranked: Vec<StateRow> = groups
        .into_iter()
        .map(|(state, total_limit)| StateRow { state, total_limit })
        .collect();

    ranked.sort_by(|a, b| {
        b.total_limit
            .partial_cmp(&a.total_limit)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.state.cmp(&b.state))
    });
    ranked.truncate(limit);

    StateSummary::Ranked(ranked)
}
