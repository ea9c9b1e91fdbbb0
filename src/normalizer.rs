use crate::error::{IngestError, IngestResult};
use crate::models::{parse_amount, Dataset, HeaderStrategy, Record};
use crate::reader::RawTable;
use regex::Regex;

/// The fixed schema every source variant is mapped onto.
pub const FIELD_NAMES: [&str; 11] = [
    "sr_no",
    "agency_name",
    "unique_id",
    "state",
    "agency_type",
    "category",
    "child_expenditure_limit_assigned",
    "success",
    "pending",
    "re_initiated",
    "balance",
];

/// Map raw rows onto the fixed schema and coerce the five amount fields.
/// Exactly one leading row is consumed either way: the trusted header, or
/// the discarded one in positional mode.
pub fn normalize(rows: &RawTable, strategy: HeaderStrategy, lenient: bool) -> IngestResult<Dataset> {
    if rows.is_empty() {
        return Err(IngestError::DataUnavailable(
            "source returned no rows; check the source link and sheet structure".to_string(),
        ));
    }

    let header = &rows[0];
    if header.len() != FIELD_NAMES.len() {
        return Err(IngestError::DataUnavailable(format!(
            "expected {} columns, found {}; check the source link and sheet structure",
            FIELD_NAMES.len(),
            header.len()
        )));
    }

    let column_index: Vec<usize> = match strategy {
        HeaderStrategy::Positional => (0..FIELD_NAMES.len()).collect(),
        HeaderStrategy::Trust => {
            let normalized: Vec<String> = header.iter().map(normalize_header).collect();
            let mut index = Vec::with_capacity(FIELD_NAMES.len());
            for field in FIELD_NAMES {
                match normalized.iter().position(|name| name == field) {
                    Some(position) => index.push(position),
                    None => {
                        return Err(IngestError::SchemaMismatch {
                            missing: field.to_string(),
                            available: normalized.join(", "),
                        })
                    }
                }
            }
            index
        }
    };

    let mut records = Vec::with_capacity(rows.len().saturating_sub(1));
    for row in &rows[1..] {
        if row.len() != FIELD_NAMES.len() {
            if lenient {
                log::warn!("skipping row with {} columns", row.len());
                continue;
            }
            return Err(IngestError::DataUnavailable(format!(
                "row has {} columns, expected {}",
                row.len(),
                FIELD_NAMES.len()
            )));
        }

        let cell = |field: usize| row.get(column_index[field]).unwrap_or("").trim().to_string();

        records.push(Record {
            sr_no: cell(0).parse().unwrap_or(0),
            agency_name: cell(1),
            unique_id: cell(2),
            state: cell(3),
            agency_type: cell(4),
            category: cell(5),
            child_expenditure_limit_assigned: parse_amount(&cell(6)),
            success: parse_amount(&cell(7)),
            pending: parse_amount(&cell(8)),
            re_initiated: parse_amount(&cell(9)),
            balance: parse_amount(&cell(10)),
        });
    }

    if records.is_empty() {
        return Err(IngestError::DataUnavailable(
            "no data rows after the header; check the source link and sheet structure".to_string(),
        ));
    }

    Ok(Dataset { records })
}

/// Normalize header text: trim, lowercase, collapse separators to
/// underscores, strip whatever non-word characters remain.
pub fn normalize_header(raw: &str) -> String {
    let separators = Regex::new(r"[\s\-./]+").unwrap();
    let non_word = Regex::new(r"[^\w]").unwrap();

    let lowered = raw.trim().to_lowercase();
    let underscored = separators.replace_all(&lowered, "_");
    non_word
        .replace_all(&underscored, "")
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::StringRecord;

    fn row(cells: &[&str]) -> StringRecord {
        StringRecord::from(cells.to_vec())
    }

    fn sample_rows() -> RawTable {
        vec![
            row(&[
                "Sr. No",
                "Agency Name",
                "Unique ID",
                "State",
                "Agency Type",
                "Category",
                "Child Expenditure Limit Assigned",
                " SUCCESS ",
                "Pending",
                "Re-Initiated",
                "Balance",
            ]),
            row(&[
                "1", "Alpha", "U-1", "UP", "Line Dept", "A", "₹1,20,000.50", "50", "30", "20", "0",
            ]),
            row(&[
                "2", "Beta", "U-2", "Kerala", "Line Dept", "B", "200", "100", "abc", "0", "100",
            ]),
        ]
    }

    #[test]
    fn header_text_is_normalized() {
        assert_eq!(normalize_header("Sr. No"), "sr_no");
        assert_eq!(normalize_header(" SUCCESS "), "success");
        assert_eq!(normalize_header("Re-Initiated"), "re_initiated");
        assert_eq!(
            normalize_header("Child Expenditure Limit Assigned"),
            "child_expenditure_limit_assigned"
        );
        assert_eq!(normalize_header("Balance (₹)"), "balance");
    }

    #[test]
    fn trust_strategy_maps_messy_headers() {
        let dataset = normalize(&sample_rows(), HeaderStrategy::Trust, false).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0].agency_name, "Alpha");
        assert_eq!(dataset.records[0].child_expenditure_limit_assigned, 120000.50);
        // Unparsable amount cell coerces to zero, never to a record error
        assert_eq!(dataset.records[1].pending, 0.0);
    }

    #[test]
    fn trust_strategy_names_the_missing_column() {
        let mut rows = sample_rows();
        let mut header: Vec<&str> = rows[0].iter().collect();
        header[7] = "Succeeded";
        rows[0] = StringRecord::from(header);

        let err = normalize(&rows, HeaderStrategy::Trust, false).unwrap_err();
        match err {
            IngestError::SchemaMismatch { missing, available } => {
                assert_eq!(missing, "success");
                assert!(available.contains("succeeded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn positional_strategy_skips_one_leading_row() {
        let dataset = normalize(&sample_rows(), HeaderStrategy::Positional, false).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[1].state, "Kerala");
    }

    #[test]
    fn wrong_column_count_is_data_unavailable() {
        let rows = vec![row(&["a", "b", "c"]), row(&["1", "2", "3"])];
        let err = normalize(&rows, HeaderStrategy::Positional, false).unwrap_err();
        assert!(matches!(err, IngestError::DataUnavailable(_)));
    }

    #[test]
    fn empty_table_and_header_only_table_are_data_unavailable() {
        let err = normalize(&Vec::new(), HeaderStrategy::Positional, false).unwrap_err();
        assert!(matches!(err, IngestError::DataUnavailable(_)));

        let header_only = vec![sample_rows()[0].clone()];
        let err = normalize(&header_only, HeaderStrategy::Trust, false).unwrap_err();
        assert!(matches!(err, IngestError::DataUnavailable(_)));
    }

    #[test]
    fn lenient_mode_skips_short_rows() {
        let mut rows = sample_rows();
        rows.push(row(&["3", "Gamma"]));
        let dataset = normalize(&rows, HeaderStrategy::Trust, true).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn renormalizing_amounts_is_a_fixed_point() {
        let dataset = normalize(&sample_rows(), HeaderStrategy::Trust, false).unwrap();
        for record in &dataset.records {
            for amount in [
                record.child_expenditure_limit_assigned,
                record.success,
                record.pending,
                record.re_initiated,
                record.balance,
            ] {
                assert_eq!(parse_amount(&amount.to_string()), amount);
            }
        }
    }
}
