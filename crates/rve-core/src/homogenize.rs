//! Macroscopic tensors and effective elastic properties from the retained
//! nodes' post-solve data.
//!
//! Retained nodes N1..N3 sit one edge length from N0 along X, Y and Z, so the
//! relative position `r_k` of node `k` is (nearly) axis-aligned. Dividing a
//! node's displacement component-wise by `r_k` recovers one column of the
//! displacement gradient; the divisions by zero coordinates are discarded.
//!
//! Quotients that come out NaN or infinite in the derived properties are kept:
//! a load case only excites some components, and the report selects the
//! labels that make sense for it.

use std::collections::BTreeMap;

use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;
use rve_model::{CapturedLoadCase, NodalResult, OFF_DIAGONAL_PAIRS, PropertySet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Stress, symmetric strain and displacement gradient of one load case
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroTensors {
    pub stress: Matrix3<f64>,
    pub strain: Matrix3<f64>,
    pub displacement_gradient: Matrix3<f64>,
}

/// Everything kept about a homogenized load case for later inspection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugRecord {
    pub load_case: usize,
    pub nodes: [NodalResult; 4],
    pub volume: f64,
    pub tensors: MacroTensors,
}

/// Properties and debug data of one load case
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomogenizedCase {
    pub properties: PropertySet,
    pub debug: DebugRecord,
}

fn vector(values: [f64; 3]) -> Vector3<f64> {
    Vector3::new(values[0], values[1], values[2])
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Macro tensors from the retained nodes `[N0, N1, N2, N3]`
pub fn compute_macro_tensors(nodes: &[NodalResult; 4], volume: f64) -> MacroTensors {
    let origin = vector(nodes[0].coord);
    let relative: Vec<Vector3<f64>> = nodes.iter().map(|n| vector(n.coord) - origin).collect();

    let stress = relative
        .iter()
        .zip(nodes)
        .fold(Matrix3::<f64>::zeros(), |acc, (r, node)| {
            acc + r * vector(node.reaction_force).transpose()
        })
        / volume;

    let mut displacement_gradient = Matrix3::<f64>::zeros();
    for (r, node) in relative.iter().zip(nodes).skip(1) {
        let u = vector(node.displacement);
        let column = Matrix3::from_fn(|a, b| finite_or_zero(u[a] / r[b]));
        displacement_gradient += column;
    }

    let strain = (displacement_gradient + displacement_gradient.transpose()) * 0.5;

    MacroTensors {
        stress,
        strain,
        displacement_gradient,
    }
}

/// Effective moduli, Poisson's ratios and shear moduli of one load case
pub fn compute_properties(tensors: &MacroTensors) -> PropertySet {
    let MacroTensors {
        stress,
        strain,
        displacement_gradient: grad,
    } = tensors;

    PropertySet {
        elastic_moduli: [0, 1, 2].map(|i| stress[(i, i)] / strain[(i, i)]),
        poissons_ratios: OFF_DIAGONAL_PAIRS.map(|(i, j)| -strain[(j, j)] / strain[(i, i)]),
        shear_moduli: OFF_DIAGONAL_PAIRS.map(|(i, j)| stress[(j, i)] / grad[(j, i)]),
    }
}

/// Turns retained-node data into property sets
#[derive(Debug, Clone, Copy, Default)]
pub struct Homogenizer;

impl Homogenizer {
    /// Homogenize a single load case
    pub fn homogenize(load_case: usize, nodes: &[NodalResult; 4], volume: f64) -> HomogenizedCase {
        let tensors = compute_macro_tensors(nodes, volume);
        let properties = compute_properties(&tensors);
        debug!(
            load_case,
            volume,
            non_finite = properties.non_finite_count(),
            "homogenized load case"
        );
        HomogenizedCase {
            properties,
            debug: DebugRecord {
                load_case,
                nodes: *nodes,
                volume,
                tensors,
            },
        }
    }

    pub fn homogenize_captured(case: &CapturedLoadCase) -> HomogenizedCase {
        Self::homogenize(case.load_case, &case.nodes, case.volume)
    }

    /// Homogenize many independently captured load cases in parallel.
    ///
    /// The map is keyed by load case number; a repeated number keeps the last
    /// entry in input order.
    pub fn homogenize_all(cases: &[CapturedLoadCase]) -> BTreeMap<usize, HomogenizedCase> {
        let results: Vec<(usize, HomogenizedCase)> = cases
            .par_iter()
            .map(|case| (case.load_case, Self::homogenize_captured(case)))
            .collect();
        info!(load_cases = results.len(), "homogenized captured results");
        results.into_iter().collect()
    }
}
