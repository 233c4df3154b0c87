//! Test sequence orchestration.
//!
//! One run sets up periodicity once, then solves and homogenizes every load
//! case in input order before compiling the report.

use std::collections::BTreeMap;

use rve_model::{Loading, PropertySet, ReportTable, TestCase};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::HomogenizationConfig;
use crate::error::Result;
use crate::face_pairs::find_node_pairs;
use crate::homogenize::{DebugRecord, Homogenizer};
use crate::loading::{LoadingTensorBuilder, apply_tensor};
use crate::periodic::{apply_periodic_conditions, identify_retained_nodes};
use crate::results::ResultsCompiler;
use crate::solver::SolverCollaborator;

/// Output of a complete test sequence
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledResults {
    /// Requested properties, compressed when possible
    pub reported: ReportTable,
    /// Every derived property, per load case
    pub full_results: BTreeMap<usize, PropertySet>,
    pub debug: BTreeMap<usize, DebugRecord>,
    /// Whether `reported` carries a `Full` column
    pub compressed: bool,
}

impl CompiledResults {
    /// Compile and compress a report from already homogenized load cases
    pub fn from_homogenized(
        loading: &Loading,
        full_results: BTreeMap<usize, PropertySet>,
        debug: BTreeMap<usize, DebugRecord>,
    ) -> Result<Self> {
        let mut reported = ResultsCompiler::compile(
            &full_results,
            &loading.expected_properties,
            loading.num_load_cases(),
            loading.labels.as_deref(),
        )?;
        let compressed = ResultsCompiler::compress(&mut reported);
        Ok(Self {
            reported,
            full_results,
            debug,
            compressed,
        })
    }
}

/// Drives a solver collaborator through every load case of a test case
#[derive(Debug, Clone, Copy, Default)]
pub struct TestRunner {
    config: HomogenizationConfig,
}

impl TestRunner {
    pub fn new(config: HomogenizationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HomogenizationConfig {
        &self.config
    }

    /// Check the test case parameters, then run its loading
    pub fn run<S: SolverCollaborator + ?Sized>(
        &self,
        case: &TestCase,
        solver: &mut S,
    ) -> Result<CompiledResults> {
        case.check_parameters()?;
        info!(case_id = %case.case_id, "starting test sequence");
        let results = self.run_loading(&case.loading, solver)?;
        info!(case_id = %case.case_id, compressed = results.compressed, "test sequence complete");
        Ok(results)
    }

    /// Apply periodicity, then solve and homogenize each load case in order
    pub fn run_loading<S: SolverCollaborator + ?Sized>(
        &self,
        loading: &Loading,
        solver: &mut S,
    ) -> Result<CompiledResults> {
        let extents = solver.extents()?;
        let retained = identify_retained_nodes(solver, &extents)?;
        let pairs = find_node_pairs(solver, &extents, &self.config)?;
        apply_periodic_conditions(solver, &pairs, &retained, &self.config)?;

        let edge_lengths = extents.edge_lengths();
        let tensors = LoadingTensorBuilder::build(&loading.spec, edge_lengths);
        info!(
            solver = solver.name(),
            load_cases = tensors.len(),
            "running load cases"
        );

        let mut full_results = BTreeMap::new();
        let mut debug_records = BTreeMap::new();
        for (index, tensor) in tensors.iter().enumerate() {
            let load_case = index + 1;
            debug!(load_case, tensor = %tensor, "applying loading tensor");
            apply_tensor(solver, tensor, &retained, edge_lengths)?;
            let output = solver.solve_and_extract(&retained)?;
            let case = Homogenizer::homogenize(load_case, &output.nodes, output.volume);
            full_results.insert(load_case, case.properties);
            debug_records.insert(load_case, case.debug);
        }

        CompiledResults::from_homogenized(loading, full_results, debug_records)
    }
}
