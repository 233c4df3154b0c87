//! Assembly of per-load-case property sets into the requested report.

use std::collections::{BTreeMap, BTreeSet};

use rve_model::{
    ALL_SENTINEL, AVAILABLE_PROPERTIES, Cell, ColumnKey, LABEL_ROW, PropertyLabel, PropertySet,
    ReportTable,
};
use tracing::{debug, info, warn};

use crate::error::{CoreError, Result};

/// Builds report tables from property sets
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultsCompiler;

impl ResultsCompiler {
    /// Resolve the requested labels of every load case.
    ///
    /// A single request set is broadcast to all load cases. A set whose only
    /// entry is `all` (any case) expands to every available property.
    /// Unknown labels, physically impossible labels and duplicates within a
    /// set are rejected with every offender listed.
    pub fn resolve_requests(
        expected: &[Vec<String>],
        num_load_cases: usize,
    ) -> Result<Vec<Vec<PropertyLabel>>> {
        let sets: Vec<&Vec<String>> = if expected.len() == 1 && num_load_cases > 1 {
            std::iter::repeat_n(&expected[0], num_load_cases).collect()
        } else {
            expected.iter().collect()
        };
        if sets.len() != num_load_cases {
            return Err(CoreError::ReportAssembly(format!(
                "{} expected-property sets given for {num_load_cases} load cases",
                sets.len()
            )));
        }

        let mut unknown = Vec::new();
        let mut impossible = Vec::new();
        let mut duplicates = Vec::new();
        let mut resolved = Vec::with_capacity(sets.len());

        for (case, set) in sets.iter().enumerate() {
            let names: Vec<&str> = if set.iter().any(|s| s.eq_ignore_ascii_case(ALL_SENTINEL)) {
                if set.len() != 1 {
                    return Err(CoreError::ReportAssembly(format!(
                        "load case {}: \"{ALL_SENTINEL}\" must be the only requested property",
                        case + 1
                    )));
                }
                AVAILABLE_PROPERTIES.to_vec()
            } else {
                set.iter().map(String::as_str).collect()
            };

            let mut seen = BTreeSet::new();
            let mut labels = Vec::with_capacity(names.len());
            for name in names {
                match name.parse::<PropertyLabel>() {
                    Ok(label) if !label.is_possible() => impossible.push(name.to_string()),
                    Ok(label) => {
                        if !seen.insert(name) {
                            duplicates.push(format!("{name} (load case {})", case + 1));
                        }
                        labels.push(label);
                    }
                    Err(_) => unknown.push(name.to_string()),
                }
            }
            resolved.push(labels);
        }

        let mut problems = Vec::new();
        if !impossible.is_empty() {
            problems.push(format!("impossible properties requested: {}", impossible.join(", ")));
        }
        if !unknown.is_empty() {
            problems.push(format!("unknown properties requested: {}", unknown.join(", ")));
        }
        if !duplicates.is_empty() {
            problems.push(format!("duplicate properties requested: {}", duplicates.join(", ")));
        }
        if !problems.is_empty() {
            return Err(CoreError::ReportAssembly(problems.join("; ")));
        }
        Ok(resolved)
    }

    /// Build the report table.
    ///
    /// `property_sets` must hold exactly load cases `1..=num_load_cases`.
    /// Rows are the sorted unique requested labels, preceded by a `Label` row
    /// when `labels` is given; columns are the load cases in order.
    pub fn compile(
        property_sets: &BTreeMap<usize, PropertySet>,
        expected: &[Vec<String>],
        num_load_cases: usize,
        labels: Option<&[String]>,
    ) -> Result<ReportTable> {
        info!(load_cases = num_load_cases, "compiling report");

        if property_sets.len() != num_load_cases {
            return Err(CoreError::ReportAssembly(format!(
                "{} property sets for {num_load_cases} load cases",
                property_sets.len()
            )));
        }
        if let Some(missing) = (1..=num_load_cases).find(|n| !property_sets.contains_key(n)) {
            return Err(CoreError::ReportAssembly(format!(
                "no property set for load case {missing}"
            )));
        }
        if let Some(labels) = labels {
            if labels.len() != num_load_cases {
                return Err(CoreError::ReportAssembly(format!(
                    "{} labels given for {num_load_cases} load cases",
                    labels.len()
                )));
            }
        }

        let requests = Self::resolve_requests(expected, num_load_cases)?;

        let unique: BTreeSet<String> = requests.iter().flatten().map(ToString::to_string).collect();
        let mut rows: Vec<String> = Vec::with_capacity(unique.len() + 1);
        if labels.is_some() {
            rows.push(LABEL_ROW.to_string());
        }
        rows.extend(unique);

        let columns: Vec<ColumnKey> = (1..=num_load_cases).map(ColumnKey::LoadCase).collect();
        let mut table = ReportTable::new(rows, columns);

        if let Some(labels) = labels {
            for (case, label) in labels.iter().enumerate() {
                table.set(LABEL_ROW, ColumnKey::LoadCase(case + 1), Cell::Text(label.clone()));
            }
        }

        for (case, requested) in requests.iter().enumerate() {
            let load_case = case + 1;
            let properties = &property_sets[&load_case];
            for label in requested {
                let value = properties.value(label).ok_or_else(|| {
                    CoreError::ReportAssembly(format!("{label} has no value in a property set"))
                })?;
                table.set(&label.to_string(), ColumnKey::LoadCase(load_case), Cell::Value(value));
            }
            debug!(load_case, requested = requested.len(), "filled report column");
        }

        Ok(table)
    }

    /// Collapse the table into a leading `Full` column when every property row
    /// holds exactly one value.
    ///
    /// Each `Full` cell is the first non-empty cell of its row. Returns false,
    /// leaving the table untouched, when some property was requested by more
    /// than one load case.
    pub fn compress(table: &mut ReportTable) -> bool {
        if table.column_index(ColumnKey::Full).is_some() {
            return true;
        }

        let first_property_row = usize::from(table.has_label_row());
        let repeated: Vec<&str> = (first_property_row..table.rows().len())
            .filter(|&r| table.row_cells(r).iter().filter(|c| !c.is_empty()).count() != 1)
            .map(|r| table.rows()[r].as_str())
            .collect();
        if !repeated.is_empty() {
            warn!(
                properties = %repeated.join(", "),
                "report not compressible: properties not requested by exactly one load case"
            );
            return false;
        }

        let full: Vec<Cell> = (0..table.rows().len())
            .map(|r| {
                if r < first_property_row {
                    Cell::Text(ColumnKey::Full.to_string())
                } else {
                    table
                        .row_cells(r)
                        .iter()
                        .find(|c| !c.is_empty())
                        .cloned()
                        .unwrap_or_default()
                }
            })
            .collect();
        table.insert_column(0, ColumnKey::Full, full);
        info!("compressed report into a single column");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(e: [f64; 3]) -> PropertySet {
        PropertySet {
            elastic_moduli: e,
            poissons_ratios: [0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
            shear_moduli: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        }
    }

    fn sets(n: usize) -> BTreeMap<usize, PropertySet> {
        (1..=n)
            .map(|case| (case, set([case as f64 * 100.0, f64::NAN, f64::INFINITY])))
            .collect()
    }

    fn request(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn places_values_by_label_and_case() {
        let table = ResultsCompiler::compile(
            &sets(2),
            &[request(&["E11", "v12"]), request(&["G31"])],
            2,
            None,
        )
        .unwrap();
        assert_eq!(table.rows(), ["E11", "G31", "v12"]);
        assert_eq!(table.get("E11", ColumnKey::LoadCase(1)), Some(&Cell::Value(100.0)));
        assert_eq!(table.get("v12", ColumnKey::LoadCase(1)), Some(&Cell::Value(0.1)));
        assert_eq!(table.get("G31", ColumnKey::LoadCase(2)), Some(&Cell::Value(5.0)));
        assert_eq!(table.get("E11", ColumnKey::LoadCase(2)), Some(&Cell::Empty));
    }

    #[test]
    fn single_request_is_broadcast() {
        let table = ResultsCompiler::compile(&sets(3), &[request(&["E11"])], 3, None).unwrap();
        for case in 1..=3 {
            assert_eq!(
                table.get("E11", ColumnKey::LoadCase(case)),
                Some(&Cell::Value(case as f64 * 100.0))
            );
        }
    }

    #[test]
    fn all_sentinel_expands_to_every_property() {
        let requests = ResultsCompiler::resolve_requests(&[request(&["ALL"])], 1).unwrap();
        let names: Vec<String> = requests[0].iter().map(ToString::to_string).collect();
        assert_eq!(names, AVAILABLE_PROPERTIES);

        let err = ResultsCompiler::resolve_requests(&[request(&["all", "E11"])], 1).unwrap_err();
        assert!(err.to_string().contains("only requested property"));
    }

    #[test]
    fn rejects_impossible_unknown_and_duplicate_labels() {
        let err = ResultsCompiler::resolve_requests(
            &[request(&["G11", "v22", "E11", "E11"]), request(&["X99"])],
            2,
        )
        .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("G11, v22"), "{text}");
        assert!(text.contains("X99"), "{text}");
        assert!(text.contains("E11 (load case 1)"), "{text}");
    }

    #[test]
    fn rejects_count_mismatches() {
        let err = ResultsCompiler::compile(&sets(2), &[request(&["E11"])], 3, None).unwrap_err();
        assert!(matches!(err, CoreError::ReportAssembly(_)));

        let labels = vec!["only".to_string()];
        let err = ResultsCompiler::compile(&sets(2), &[request(&["E11"])], 2, Some(&labels))
            .unwrap_err();
        assert!(err.to_string().contains("1 labels"));

        let err = ResultsCompiler::compile(
            &sets(2),
            &[request(&["E11"]), request(&["E22"]), request(&["E33"])],
            2,
            None,
        )
        .unwrap_err();
        assert!(err.to_string().contains("3 expected-property sets"));
    }

    #[test]
    fn non_finite_values_are_reported_when_requested() {
        let table = ResultsCompiler::compile(&sets(1), &[request(&["E22", "E33"])], 1, None).unwrap();
        assert!(table.get("E22", ColumnKey::LoadCase(1)).unwrap().as_value().unwrap().is_nan());
        assert_eq!(
            table.get("E33", ColumnKey::LoadCase(1)),
            Some(&Cell::Value(f64::INFINITY))
        );
    }

    #[test]
    fn compresses_disjoint_requests_with_label_row() {
        let labels = vec!["axial".to_string(), "shear".to_string()];
        let mut table = ResultsCompiler::compile(
            &sets(2),
            &[request(&["E11"]), request(&["G12"])],
            2,
            Some(&labels),
        )
        .unwrap();
        assert!(ResultsCompiler::compress(&mut table));
        assert_eq!(table.columns()[0], ColumnKey::Full);
        assert_eq!(table.get(LABEL_ROW, ColumnKey::Full), Some(&Cell::Text("Full".into())));
        assert_eq!(table.get("E11", ColumnKey::Full), Some(&Cell::Value(100.0)));
        assert_eq!(table.get("G12", ColumnKey::Full), Some(&Cell::Value(1.0)));
        assert_eq!(table.get(LABEL_ROW, ColumnKey::LoadCase(2)), Some(&Cell::Text("shear".into())));
    }

    #[test]
    fn overlapping_requests_are_not_compressed() {
        let mut table = ResultsCompiler::compile(&sets(2), &[request(&["E11"])], 2, None).unwrap();
        let before = table.clone();
        assert!(!ResultsCompiler::compress(&mut table));
        assert_eq!(table, before);
    }
}
