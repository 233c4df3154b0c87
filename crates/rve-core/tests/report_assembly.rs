use std::collections::BTreeMap;

use rve_core::{CoreError, ResultsCompiler, compute_macro_tensors, compute_properties};
use rve_model::{Cell, ColumnKey, NodalResult, PropertySet};

fn uniaxial(load_case: usize, modulus: f64) -> PropertySet {
    // Unit cube stretched by 1% along one axis with the matching reaction
    let axis = load_case - 1;
    let mut nodes = [
        NodalResult::new([0.0, 0.0, 0.0], [0.0; 3], [0.0; 3]),
        NodalResult::new([1.0, 0.0, 0.0], [0.0; 3], [0.0; 3]),
        NodalResult::new([0.0, 1.0, 0.0], [0.0; 3], [0.0; 3]),
        NodalResult::new([0.0, 0.0, 1.0], [0.0; 3], [0.0; 3]),
    ];
    nodes[axis + 1].displacement[axis] = 0.01;
    nodes[axis + 1].reaction_force[axis] = 0.01 * modulus;
    nodes[0].reaction_force[axis] = -0.01 * modulus;
    compute_properties(&compute_macro_tensors(&nodes, 1.0))
}

fn request(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

#[test]
fn disjoint_moduli_compress_into_full_column() {
    let sets: BTreeMap<usize, PropertySet> =
        [(1, uniaxial(1, 210.0)), (2, uniaxial(2, 70.0))].into_iter().collect();
    let mut table =
        ResultsCompiler::compile(&sets, &[request(&["E11"]), request(&["E22"])], 2, None).unwrap();

    assert!(ResultsCompiler::compress(&mut table));
    assert_eq!(
        table.columns(),
        [ColumnKey::Full, ColumnKey::LoadCase(1), ColumnKey::LoadCase(2)]
    );
    let e11 = table.get("E11", ColumnKey::Full).and_then(Cell::as_value).unwrap();
    let e22 = table.get("E22", ColumnKey::Full).and_then(Cell::as_value).unwrap();
    assert!((e11 - 210.0).abs() < 1e-9);
    assert!((e22 - 70.0).abs() < 1e-9);

    let mut csv = Vec::new();
    rve_io::write_report_csv(&table, &mut csv).unwrap();
    let text = String::from_utf8(csv).unwrap();
    assert!(text.starts_with(",Full,1,2\n"), "{text}");
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn forbidden_diagonal_shear_is_rejected_by_name() {
    let sets: BTreeMap<usize, PropertySet> = [(1, uniaxial(1, 1.0))].into_iter().collect();
    let err = ResultsCompiler::compile(&sets, &[request(&["E11", "G11"])], 1, None).unwrap_err();
    match err {
        CoreError::ReportAssembly(message) => {
            assert!(message.contains("G11"), "{message}");
            assert!(!message.contains("E11"), "{message}");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn degenerate_values_only_appear_where_requested() {
    let sets: BTreeMap<usize, PropertySet> = [(1, uniaxial(1, 100.0))].into_iter().collect();
    assert!(sets[&1].elastic_moduli[1].is_nan());
    assert!(sets[&1].shear_moduli.iter().all(|g| g.is_nan()));

    let table = ResultsCompiler::compile(&sets, &[request(&["E11", "v12"])], 1, None).unwrap();
    assert_eq!(table.rows(), ["E11", "v12"]);
    let v12 = table.get("v12", ColumnKey::LoadCase(1)).and_then(Cell::as_value).unwrap();
    assert_eq!(v12, 0.0);
}
