use approx::assert_relative_eq;
use rve_core::{
    ConstraintSink, CoreError, FaceNode, MeshQuery, NodeCloud, Result, SolveOutput,
    SolverCollaborator, TestRunner,
};
use rve_model::{
    Axis, Cell, ColumnKey, ConstraintEquation, DeformationTensor, DirectionSpec, DisplacementBc,
    DofId, Loading, LoadingSpec, MeshExtents, NodalResult, Node, RetainedNodeSet, TensorSpec,
};

const E: f64 = 100.0;
const NU: f64 = 0.25;
const G: f64 = 40.0;

/// 3 x 3 x 3 grid of nodes on a box with the given minimum corner and edges
fn grid_mesh(min: [f64; 3], lengths: [f64; 3]) -> NodeCloud {
    let half = lengths.map(|l| l / 2.0);
    let mut nodes = Vec::new();
    let mut id = 1;
    for k in 0..3 {
        for j in 0..3 {
            for i in 0..3 {
                nodes.push(Node::new(
                    id,
                    min[0] + half[0] * i as f64,
                    min[1] + half[1] * j as f64,
                    min[2] + half[2] * k as f64,
                ));
                id += 1;
            }
        }
    }
    NodeCloud::from_nodes(nodes).unwrap()
}

fn box_mesh() -> NodeCloud {
    grid_mesh([0.5, -1.0, 2.0], [2.0, 3.0, 4.0])
}

/// Linear isotropic body whose response is the uniform field matching the
/// retained-node displacements, with free normal components traction-free
/// and free shear components strain-free
struct IsotropicSolver {
    mesh: NodeCloud,
    lambda: f64,
    mu: f64,
    equations: Vec<ConstraintEquation>,
    bcs: Vec<DisplacementBc>,
    solves: usize,
}

impl IsotropicSolver {
    fn new(mesh: NodeCloud) -> Self {
        Self {
            mesh,
            lambda: E * NU / ((1.0 + NU) * (1.0 - 2.0 * NU)),
            mu: E / (2.0 * (1.0 + NU)),
            equations: Vec::new(),
            bcs: Vec::new(),
            solves: 0,
        }
    }

    fn gradient(&self, retained: &RetainedNodeSet, lengths: [f64; 3]) -> Result<[[f64; 3]; 3]> {
        let ids = retained.as_array();
        let mut prescribed = [[None; 3]; 3];
        for bc in &self.bcs {
            let k = ids.iter().position(|&id| id == bc.node).ok_or_else(|| {
                CoreError::Solver(format!("displacement on non-retained node {}", bc.node))
            })?;
            if k == 0 {
                assert_eq!(bc.value, 0.0);
                continue;
            }
            prescribed[bc.dof.index()][k - 1] = Some(bc.value / lengths[k - 1]);
        }

        let free: Vec<usize> = (0..3).filter(|&i| prescribed[i][i].is_none()).collect();
        let known: f64 = (0..3).filter_map(|i| prescribed[i][i]).sum();
        let lateral = -self.lambda * known / (self.lambda * free.len() as f64 + 2.0 * self.mu);

        let mut grad = [[0.0; 3]; 3];
        for a in 0..3 {
            for b in 0..3 {
                grad[a][b] = match (prescribed[a][b], prescribed[b][a]) {
                    (Some(value), _) => value,
                    (None, _) if a == b => lateral,
                    (None, Some(other)) => -other,
                    (None, None) => 0.0,
                };
            }
        }
        Ok(grad)
    }
}

impl MeshQuery for IsotropicSolver {
    fn extents(&self) -> Result<MeshExtents> {
        self.mesh.extents()
    }

    fn select_face_nodes(&self, axis: Axis, coordinate: f64, tolerance: f64) -> Result<Vec<FaceNode>> {
        self.mesh.select_face_nodes(axis, coordinate, tolerance)
    }

    fn node_at(&self, point: [f64; 3]) -> Result<i32> {
        self.mesh.node_at(point)
    }
}

impl ConstraintSink for IsotropicSolver {
    fn add_constraint(&mut self, equation: &ConstraintEquation) -> Result<()> {
        self.equations.push(equation.clone());
        Ok(())
    }

    fn apply_displacement(&mut self, bc: DisplacementBc) -> Result<()> {
        self.bcs.push(bc);
        Ok(())
    }

    fn clear_displacements(&mut self) -> Result<()> {
        self.bcs.clear();
        Ok(())
    }
}

impl SolverCollaborator for IsotropicSolver {
    fn solve_and_extract(&mut self, retained: &RetainedNodeSet) -> Result<SolveOutput> {
        self.solves += 1;
        let extents = self.mesh.extents()?;
        let lengths = extents.edge_lengths();
        let volume = extents.volume();
        let grad = self.gradient(retained, lengths)?;

        let trace = grad[0][0] + grad[1][1] + grad[2][2];
        let mut stress = [[0.0; 3]; 3];
        for a in 0..3 {
            for b in 0..3 {
                let strain = 0.5 * (grad[a][b] + grad[b][a]);
                stress[a][b] = 2.0 * self.mu * strain + if a == b { self.lambda * trace } else { 0.0 };
            }
        }

        let ids = retained.as_array();
        let mut nodes = [NodalResult::default(); 4];
        for (k, node) in nodes.iter_mut().enumerate() {
            node.coord = self.mesh.get(ids[k]).unwrap().coords();
            if k > 0 {
                for c in 0..3 {
                    node.displacement[c] = grad[c][k - 1] * lengths[k - 1];
                    node.reaction_force[c] = stress[k - 1][c] * volume / lengths[k - 1];
                }
            }
        }
        for c in 0..3 {
            nodes[0].reaction_force[c] = -(1..4).map(|k| nodes[k].reaction_force[c]).sum::<f64>();
        }
        Ok(SolveOutput { nodes, volume })
    }

    fn name(&self) -> &str {
        "isotropic mock"
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn six_direction_loading() -> Loading {
    Loading {
        spec: LoadingSpec::Direction(DirectionSpec {
            directions: ["11", "22", "33", "12", "13", "23"]
                .iter()
                .map(|d| d.parse().unwrap())
                .collect(),
            normal_magnitude: 0.01,
            shear_magnitude: 0.02,
        }),
        expected_properties: vec![
            strings(&["E11", "v12", "v13"]),
            strings(&["E22", "v21", "v23"]),
            strings(&["E33", "v31", "v32"]),
            strings(&["G12"]),
            strings(&["G13"]),
            strings(&["G23"]),
        ],
        labels: Some(strings(&["x tension", "y tension", "z tension", "xy", "xz", "yz"])),
    }
}

fn full_value(table: &rve_model::ReportTable, label: &str) -> f64 {
    table.get(label, ColumnKey::Full).and_then(Cell::as_value).unwrap()
}

#[test]
fn isotropic_box_recovers_engineering_constants() {
    let mut solver = IsotropicSolver::new(box_mesh());
    let results = TestRunner::default()
        .run_loading(&six_direction_loading(), &mut solver)
        .unwrap();

    // 9 pairs per axis, one holds N0, 3 DOFs each.
    assert_eq!(solver.equations.len(), 3 * 8 * 3);
    assert_eq!(solver.solves, 6);
    assert!(results.compressed);

    let table = &results.reported;
    assert_eq!(table.columns()[0], ColumnKey::Full);
    assert_eq!(table.get("Label", ColumnKey::LoadCase(4)), Some(&Cell::Text("xy".into())));
    for label in ["E11", "E22", "E33"] {
        assert_relative_eq!(full_value(table, label), E, max_relative = 1e-9);
    }
    for label in ["v12", "v13", "v21", "v23", "v31", "v32"] {
        assert_relative_eq!(full_value(table, label), NU, max_relative = 1e-9);
    }
    for label in ["G12", "G13", "G23"] {
        assert_relative_eq!(full_value(table, label), G, max_relative = 1e-9);
    }

    assert_eq!(results.full_results.len(), 6);
    assert_eq!(results.debug.len(), 6);
    // Lateral strains of the x tension case contract by Poisson's ratio.
    let strain = results.debug[&1].tensors.strain;
    assert_relative_eq!(strain[(1, 1)], -NU * strain[(0, 0)], max_relative = 1e-9);
    assert_relative_eq!(strain[(0, 0)], 0.01 / 2.0, max_relative = 1e-12);
}

#[test]
fn cube_of_edge_ten_recovers_elastic_moduli() {
    let mut solver = IsotropicSolver::new(grid_mesh([0.0; 3], [10.0; 3]));
    let results = TestRunner::default()
        .run_loading(&six_direction_loading(), &mut solver)
        .unwrap();
    for (case, i) in [(1, 0), (2, 1), (3, 2)] {
        assert_relative_eq!(
            results.full_results[&case].elastic_moduli[i],
            E,
            max_relative = 1e-9
        );
    }
}

#[test]
fn periodic_equations_hold_for_the_solved_field() {
    let mut solver = IsotropicSolver::new(box_mesh());
    TestRunner::default()
        .run_loading(&six_direction_loading(), &mut solver)
        .unwrap();

    // The last load case is the yz shear; a uniform field u = G (x - x0)
    // must satisfy every periodicity equation.
    let extents = solver.mesh.extents().unwrap();
    let retained = rve_core::identify_retained_nodes(&solver.mesh, &extents).unwrap();
    let grad = solver.gradient(&retained, extents.edge_lengths()).unwrap();
    let origin = solver.mesh.get(retained.reference()).unwrap().coords();
    for equation in &solver.equations {
        let residual = equation.residual(|id: DofId| {
            let x = solver.mesh.get(id.node).unwrap().coords();
            (0..3).map(|k| grad[id.dof][k] * (x[k] - origin[k])).sum()
        });
        assert!(residual.abs() < 1e-12, "residual {residual}");
    }
}

#[test]
fn tensor_loading_with_overlapping_requests_is_not_compressed() {
    let mut uniaxial = DeformationTensor::zeros();
    uniaxial.set(0, 0, Some(1.0));
    uniaxial.set(1, 1, None);
    uniaxial.set(2, 2, None);
    let mut transverse = DeformationTensor::zeros();
    transverse.set(1, 1, Some(1.0));
    transverse.set(0, 0, None);
    transverse.set(2, 2, None);

    let loading = Loading {
        spec: LoadingSpec::Tensor(TensorSpec {
            tensors: vec![uniaxial, transverse],
            magnitude_multiplier: 0.001,
        }),
        expected_properties: vec![strings(&["E11", "E22", "v12"])],
        labels: None,
    };
    let mut solver = IsotropicSolver::new(box_mesh());
    let results = TestRunner::default().run_loading(&loading, &mut solver).unwrap();

    assert!(!results.compressed);
    let table = &results.reported;
    assert_eq!(table.rows(), ["E11", "E22", "v12"]);
    assert_eq!(table.columns(), [ColumnKey::LoadCase(1), ColumnKey::LoadCase(2)]);
    let e11 = table.get("E11", ColumnKey::LoadCase(1)).and_then(Cell::as_value).unwrap();
    assert_relative_eq!(e11, E, max_relative = 1e-9);
    let e22 = table.get("E22", ColumnKey::LoadCase(2)).and_then(Cell::as_value).unwrap();
    assert_relative_eq!(e22, E, max_relative = 1e-9);
    // The lateral faces of the x tension case are traction-free.
    let e22_first = table.get("E22", ColumnKey::LoadCase(1)).and_then(Cell::as_value).unwrap();
    assert!(e22_first.abs() < 1e-6, "{e22_first}");
}

#[test]
fn forbidden_label_fails_after_solving() {
    let mut loading = six_direction_loading();
    loading.expected_properties[3] = strings(&["G11"]);
    let mut solver = IsotropicSolver::new(box_mesh());
    let err = TestRunner::default().run_loading(&loading, &mut solver).unwrap_err();
    match err {
        CoreError::ReportAssembly(message) => assert!(message.contains("G11"), "{message}"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn missing_face_node_is_a_geometry_mismatch() {
    let nodes: Vec<Node> = box_mesh()
        .nodes()
        .iter()
        .filter(|node| node.id != 15)
        .copied()
        .collect();
    let mut solver = IsotropicSolver::new(NodeCloud::from_nodes(nodes).unwrap());
    let err = TestRunner::default()
        .run_loading(&six_direction_loading(), &mut solver)
        .unwrap_err();
    match err {
        CoreError::GeometryMismatch { axis, detail } => {
            assert_eq!(axis, Axis::X);
            assert!(detail.contains("8 on +X, 9 on -X"), "{detail}");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(solver.solves, 0);
}
