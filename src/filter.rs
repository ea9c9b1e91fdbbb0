use crate::models::{Dataset, Record};
use std::collections::BTreeSet;

pub const ALL_STATES: &str = "All States";
pub const ALL_CATEGORIES: &str = "All Categories";
pub const ALL_AGENCIES: &str = "All Agencies";
pub const ALL_CODES: &str = "All Codes";

/// Up to four dependent categorical constraints, in fixed cascade order:
/// state → category → agency_name → unique_id. `None` is the wildcard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub state: Option<String>,
    pub category: Option<String>,
    pub agency_name: Option<String>,
    pub unique_id: Option<String>,
}

impl FilterSelection {
    /// States compare case-insensitively, so the selection is stored uppercased.
    pub fn set_state(&mut self, value: Option<String>) {
        self.state = value
            .filter(|v| v.as_str() != ALL_STATES)
            .map(|v| v.to_uppercase());
    }

    pub fn set_category(&mut self, value: Option<String>) {
        self.category = value.filter(|v| v.as_str() != ALL_CATEGORIES);
    }

    pub fn set_agency_name(&mut self, value: Option<String>) {
        self.agency_name = value.filter(|v| v.as_str() != ALL_AGENCIES);
    }

    pub fn set_unique_id(&mut self, value: Option<String>) {
        self.unique_id = value.filter(|v| v.as_str() != ALL_CODES);
    }

    pub fn is_all_wildcards(&self) -> bool {
        self.state.is_none()
            && self.category.is_none()
            && self.agency_name.is_none()
            && self.unique_id.is_none()
    }

    /// All four active constraints applied simultaneously.
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_state(record)
            && self.matches_category(record)
            && self.matches_agency(record)
            && self.matches_unique_id(record)
    }

    pub fn matches_state(&self, record: &Record) -> bool {
        self.state
            .as_deref()
            .map_or(true, |state| record.state.to_uppercase() == state.to_uppercase())
    }

    pub fn matches_category(&self, record: &Record) -> bool {
        self.category
            .as_deref()
            .map_or(true, |category| record.category == category)
    }

    pub fn matches_agency(&self, record: &Record) -> bool {
        self.agency_name
            .as_deref()
            .map_or(true, |agency| record.agency_name == agency)
    }

    pub fn matches_unique_id(&self, record: &Record) -> bool {
        self.unique_id
            .as_deref()
            .map_or(true, |code| record.unique_id == code)
    }

    pub fn state_label(&self) -> &str {
        self.state.as_deref().unwrap_or(ALL_STATES)
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(ALL_CATEGORIES)
    }

    pub fn agency_label(&self) -> &str {
        self.agency_name.as_deref().unwrap_or(ALL_AGENCIES)
    }

    pub fn unique_id_label(&self) -> &str {
        self.unique_id.as_deref().unwrap_or(ALL_CODES)
    }
}

/// The selectable values at each cascade level, wildcard label first,
/// the rest deduplicated and lexicographically sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeOptions {
    pub states: Vec<String>,
    pub categories: Vec<String>,
    pub agencies: Vec<String>,
    pub unique_ids: Vec<String>,
}

/// Each level's options are computed against the dataset filtered by the
/// levels *before* it only: choosing a state narrows the category list, but
/// choosing a category never narrows the state list.
pub fn cascade_options(dataset: &Dataset, selection: &FilterSelection) -> CascadeOptions {
    let states = distinct(dataset.records.iter(), |r| r.state.to_uppercase());

    let by_state: Vec<&Record> = dataset
        .records
        .iter()
        .filter(|r| selection.matches_state(r))
        .collect();
    let categories = distinct(by_state.iter().copied(), |r| r.category.clone());

    let by_category: Vec<&Record> = by_state
        .into_iter()
        .filter(|r| selection.matches_category(r))
        .collect();
    let agencies = distinct(by_category.iter().copied(), |r| r.agency_name.clone());

    let by_agency: Vec<&Record> = by_category
        .into_iter()
        .filter(|r| selection.matches_agency(r))
        .collect();
    let unique_ids = distinct(by_agency.iter().copied(), |r| r.unique_id.clone());

    CascadeOptions {
        states: with_wildcard(ALL_STATES, states),
        categories: with_wildcard(ALL_CATEGORIES, categories),
        agencies: with_wildcard(ALL_AGENCIES, agencies),
        unique_ids: with_wildcard(ALL_CODES, unique_ids),
    }
}

/// The filtered subset: all four constraints ANDed, regardless of cascade order.
pub fn apply(dataset: &Dataset, selection: &FilterSelection) -> Vec<Record> {
    dataset
        .records
        .iter()
        .filter(|record| selection.matches(record))
        .cloned()
        .collect()
}

fn distinct<'a>(
    records: impl Iterator<Item = &'a Record>,
    key: impl Fn(&Record) -> String,
) -> Vec<String> {
    let set: BTreeSet<String> = records.map(|record| key(record)).collect();
    set.into_iter().collect()
}

fn with_wildcard(label: &str, values: Vec<String>) -> Vec<String> {
    let mut options = Vec::with_capacity(values.len() + 1);
    options.push(label.to_string());
    options.extend(values);
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, category: &str, agency: &str, code: &str) -> Record {
        Record {
            sr_no: 0,
            agency_name: agency.to_string(),
            unique_id: code.to_string(),
            state: state.to_string(),
            agency_type: "Line Dept".to_string(),
            category: category.to_string(),
            child_expenditure_limit_assigned: 100.0,
            success: 50.0,
            pending: 25.0,
            re_initiated: 10.0,
            balance: 15.0,
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            records: vec![
                record("UP", "A", "Alpha", "U-1"),
                record("up", "B", "Beta", "U-2"),
                record("Kerala", "A", "Gamma", "U-3"),
                record("Kerala", "C", "Delta", "U-4"),
            ],
        }
    }

    #[test]
    fn wildcard_selection_keeps_every_record() {
        let data = dataset();
        let filtered = apply(&data, &FilterSelection::default());
        assert_eq!(filtered.len(), data.len());
    }

    #[test]
    fn filtered_subset_never_grows() {
        let data = dataset();
        let mut selection = FilterSelection::default();
        selection.set_state(Some("Kerala".to_string()));
        selection.set_category(Some("A".to_string()));
        let filtered = apply(&data, &selection);
        assert!(filtered.len() <= data.len());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].agency_name, "Gamma");
    }

    #[test]
    fn state_matching_is_case_insensitive() {
        let data = dataset();
        let mut selection = FilterSelection::default();
        selection.set_state(Some("up".to_string()));
        assert_eq!(apply(&data, &selection).len(), 2);
    }

    #[test]
    fn wildcard_label_maps_to_no_constraint() {
        let mut selection = FilterSelection::default();
        selection.set_state(Some(ALL_STATES.to_string()));
        selection.set_category(Some(ALL_CATEGORIES.to_string()));
        assert!(selection.is_all_wildcards());
    }

    #[test]
    fn option_lists_are_sorted_with_wildcard_first() {
        let options = cascade_options(&dataset(), &FilterSelection::default());
        assert_eq!(options.states, vec!["All States", "KERALA", "UP"]);
        assert_eq!(options.categories[0], ALL_CATEGORIES);
        let mut sorted = options.categories[1..].to_vec();
        sorted.sort();
        assert_eq!(options.categories[1..].to_vec(), sorted);
    }

    #[test]
    fn choosing_a_state_narrows_category_options() {
        let mut selection = FilterSelection::default();
        selection.set_state(Some("UP".to_string()));
        let options = cascade_options(&dataset(), &selection);
        assert_eq!(options.categories, vec!["All Categories", "A", "B"]);
    }

    #[test]
    fn choosing_a_category_never_narrows_state_options() {
        let unconstrained = cascade_options(&dataset(), &FilterSelection::default());

        let mut selection = FilterSelection::default();
        selection.set_category(Some("C".to_string()));
        let constrained = cascade_options(&dataset(), &selection);

        assert_eq!(unconstrained.states, constrained.states);
        // but it does constrain the agency level below it
        assert_eq!(constrained.agencies, vec!["All Agencies", "Delta"]);
    }

    #[test]
    fn duplicate_values_collapse_into_one_option() {
        let mut data = dataset();
        data.records.push(record("UP", "A", "Alpha", "U-1"));
        let options = cascade_options(&data, &FilterSelection::default());
        assert_eq!(
            options
                .agencies
                .iter()
                .filter(|name| name.as_str() == "Alpha")
                .count(),
            1
        );
    }
}
