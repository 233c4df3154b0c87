//! Validated description of one RVE test case.
//!
//! A test case is read from a JSON input file, then [`TestCase::with_path`]
//! resolves every relative path against the file's directory. Parameter
//! checks run once, before any solve.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{ModelError, Result};
use crate::loading::Loading;
use crate::properties::IMPOSSIBLE_PROPERTIES;

/// Relative tolerance of the isotropy check `G = E / (2(1 + v))`
pub const ISOTROPY_REL_TOL: f64 = 1e-9;

/// Externally generated mesh files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshSpec {
    /// Element type name understood by the solver
    pub element_type: String,
    #[serde(rename = "nodeFileRelativePath")]
    pub node_file: PathBuf,
    #[serde(rename = "elementFileRelativePath")]
    pub element_file: PathBuf,
    #[serde(rename = "csysFileRelativePath", default)]
    pub csys_file: Option<PathBuf>,
    /// Absolute paths, filled in by [`TestCase::with_path`]
    #[serde(skip)]
    pub node_file_absolute: Option<PathBuf>,
    #[serde(skip)]
    pub element_file_absolute: Option<PathBuf>,
    #[serde(skip)]
    pub csys_file_absolute: Option<PathBuf>,
}

impl MeshSpec {
    fn resolve(&mut self, base: &Path) {
        self.node_file_absolute = Some(base.join(&self.node_file));
        self.element_file_absolute = Some(base.join(&self.element_file));
        self.csys_file_absolute = self.csys_file.as_ref().map(|p| base.join(p));
    }

    /// Absolute paths of every referenced file
    pub fn absolute_files(&self) -> Vec<&Path> {
        [
            &self.node_file_absolute,
            &self.element_file_absolute,
            &self.csys_file_absolute,
        ]
        .into_iter()
        .flatten()
        .map(PathBuf::as_path)
        .collect()
    }
}

/// Material symmetry class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Isotropic,
    Orthotropic,
}

/// Linear elastic material definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    /// Material ID (1-based)
    pub material_index: u32,
    pub material_type: MaterialType,
    pub elastic_moduli: Vec<f64>,
    #[serde(default)]
    pub shear_moduli: Vec<f64>,
    pub poissons_ratios: Vec<f64>,
}

impl Material {
    /// An orthotropic definition whose moduli lists are each uniform
    pub fn is_nominally_isotropic(&self) -> bool {
        self.material_type == MaterialType::Orthotropic
            && [&self.elastic_moduli, &self.shear_moduli, &self.poissons_ratios]
                .iter()
                .all(|values| all_same(values))
    }
}

fn all_same(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

fn default_nproc() -> usize {
    4
}

/// Options forwarded to the solver collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerOptions {
    #[serde(rename = "override", alias = "overrideExisting")]
    pub override_existing: bool,
    /// Working directory of solver runs, relative to the input file
    #[serde(alias = "runLocation")]
    pub run_location: PathBuf,
    pub jobname: String,
    #[serde(default = "default_nproc")]
    pub nproc: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            override_existing: true,
            run_location: PathBuf::from("rve_working"),
            jobname: "rve_tester".to_string(),
            nproc: default_nproc(),
        }
    }
}

/// One RVE test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(deserialize_with = "string_or_number")]
    pub case_id: String,
    /// Input file this case was read from
    #[serde(skip)]
    pub path: PathBuf,
    pub mesh: MeshSpec,
    #[serde(default)]
    pub materials: Vec<Material>,
    pub loading: Loading,
    #[serde(default)]
    pub runner_options: RunnerOptions,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Int(n) => n.to_string(),
    })
}

impl TestCase {
    /// Attach the input file path and resolve relative paths against its
    /// directory
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        let base = self.input_dir().to_path_buf();
        self.mesh.resolve(&base);
        self.runner_options.run_location = base.join(&self.runner_options.run_location);
        self
    }

    /// Directory containing the input file
    pub fn input_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn num_load_cases(&self) -> usize {
        self.loading.num_load_cases()
    }

    /// Every requested label across all load cases with its occurrence count
    pub fn unique_expected_properties(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for label in self.loading.expected_properties.iter().flatten() {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Run the self-checks on the input parameters
    pub fn check_parameters(&self) -> Result<()> {
        let missing: Vec<String> = self
            .mesh
            .absolute_files()
            .into_iter()
            .filter(|path| !path.exists())
            .map(|path| path.display().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::Validation(format!(
                "mesh file(s) could not be found: {}",
                missing.join(", ")
            )));
        }

        for material in &self.materials {
            self.check_isotropy(material)?;
        }

        if let Some(labels) = &self.loading.labels
            && labels.len() != self.num_load_cases()
        {
            return Err(ModelError::Validation(format!(
                "number of labels must equal number of load cases: {} labels given for {} load cases",
                labels.len(),
                self.num_load_cases()
            )));
        }

        let impossible: Vec<&str> = self
            .unique_expected_properties()
            .into_keys()
            .filter(|label| IMPOSSIBLE_PROPERTIES.contains(label))
            .collect();
        if !impossible.is_empty() {
            return Err(ModelError::Validation(format!(
                "expected properties contain impossible property(s): {impossible:?}"
            )));
        }

        for (i, set) in self.loading.expected_properties.iter().enumerate() {
            let mut seen = std::collections::HashSet::new();
            if !set.iter().all(|label| seen.insert(label)) {
                return Err(ModelError::Validation(format!(
                    "expected properties contain duplicates in load case {}: {set:?}",
                    i + 1
                )));
            }
        }

        Ok(())
    }

    fn check_isotropy(&self, material: &Material) -> Result<()> {
        if material.material_type != MaterialType::Orthotropic {
            return Ok(());
        }
        let (Some(e), Some(g), Some(v)) = (
            material.elastic_moduli.first(),
            material.shear_moduli.first(),
            material.poissons_ratios.first(),
        ) else {
            warn!(
                material = material.material_index,
                "orthotropic material has an empty moduli list; isotropy check skipped"
            );
            return Ok(());
        };
        if !material.is_nominally_isotropic() {
            return Ok(());
        }
        let theory = e / (2.0 * (1.0 + v));
        if (g - theory).abs() > ISOTROPY_REL_TOL * theory.abs() {
            return Err(ModelError::Validation(format!(
                "material {} is isotropic but does not obey Hooke's law: shear input {g}, expected {theory}",
                material.material_index
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CASE_JSON: &str = r#"{
        "caseId": 7,
        "mesh": {
            "elementType": "C3D8",
            "nodeFileRelativePath": "mesh/nodes.inp",
            "elementFileRelativePath": "mesh/elements.inp"
        },
        "materials": [{
            "materialIndex": 1,
            "materialType": "orthotropic",
            "elasticModuli": [200.0, 200.0, 200.0],
            "shearModuli": [80.0, 80.0, 80.0],
            "poissonsRatios": [0.25, 0.25, 0.25]
        }],
        "loading": {
            "kind": "displacement",
            "directions": ["11", "22"],
            "normalMagnitude": 0.01,
            "shearMagnitude": 0.01,
            "expectedProperties": [["E11", "v12"], ["E22"]]
        },
        "runnerOptions": {"nproc": 2}
    }"#;

    fn unique_temp_dir(prefix: &str) -> tempfile::TempDir {
        tempfile::Builder::new().prefix(prefix).tempdir().unwrap()
    }

    fn parse_case() -> TestCase {
        serde_json::from_str(CASE_JSON).unwrap()
    }

    #[test]
    fn parses_and_applies_runner_defaults() {
        let case = parse_case();
        assert_eq!(case.case_id, "7");
        assert_eq!(case.num_load_cases(), 2);
        assert_eq!(case.runner_options.nproc, 2);
        assert_eq!(case.runner_options.jobname, "rve_tester");
        assert!(case.runner_options.override_existing);
    }

    #[test]
    fn resolves_paths_against_input_dir() {
        let case = parse_case().with_path("/data/cases/input.json");
        assert_eq!(
            case.mesh.node_file_absolute.as_deref(),
            Some(Path::new("/data/cases/mesh/nodes.inp"))
        );
        assert_eq!(case.runner_options.run_location, Path::new("/data/cases/rve_working"));
        assert_eq!(case.mesh.absolute_files().len(), 2);
    }

    #[test]
    fn counts_unique_expected_properties() {
        let case = parse_case();
        let counts = case.unique_expected_properties();
        assert_eq!(counts.get("E11"), Some(&1));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn check_reports_missing_mesh_files() {
        let dir = unique_temp_dir("rve_model_missing");
        let case = parse_case().with_path(dir.path().join("input.json"));
        let err = case.check_parameters().unwrap_err();
        assert!(err.to_string().contains("nodes.inp"));
    }

    fn case_with_mesh_files() -> (tempfile::TempDir, TestCase) {
        let dir = unique_temp_dir("rve_model_check");
        fs::create_dir_all(dir.path().join("mesh")).unwrap();
        fs::write(dir.path().join("mesh/nodes.inp"), "*NODE\n").unwrap();
        fs::write(dir.path().join("mesh/elements.inp"), "*ELEMENT\n").unwrap();
        let case = parse_case().with_path(dir.path().join("input.json"));
        (dir, case)
    }

    #[test]
    fn check_passes_for_consistent_input() {
        let (_dir, case) = case_with_mesh_files();
        case.check_parameters().unwrap();
    }

    #[test]
    fn check_rejects_isotropic_material_breaking_hookes_law() {
        let (_dir, mut case) = case_with_mesh_files();
        case.materials[0].shear_moduli = vec![70.0; 3];
        let err = case.check_parameters().unwrap_err();
        assert!(err.to_string().contains("Hooke"));
    }

    #[test]
    fn check_ignores_genuinely_orthotropic_material() {
        let (_dir, mut case) = case_with_mesh_files();
        case.materials[0].shear_moduli = vec![70.0, 75.0, 80.0];
        case.check_parameters().unwrap();
    }

    #[test]
    fn check_rejects_label_count_mismatch() {
        let (_dir, mut case) = case_with_mesh_files();
        case.loading.labels = Some(vec!["only one".to_string()]);
        let err = case.check_parameters().unwrap_err();
        assert!(err.to_string().contains("1 labels given for 2 load cases"));
    }

    #[test]
    fn check_rejects_impossible_properties() {
        let (_dir, mut case) = case_with_mesh_files();
        case.loading.expected_properties[1].push("G11".to_string());
        let err = case.check_parameters().unwrap_err();
        assert!(err.to_string().contains("G11"));
    }

    #[test]
    fn check_rejects_duplicates_within_load_case() {
        let (_dir, mut case) = case_with_mesh_files();
        case.loading.expected_properties[0].push("E11".to_string());
        let err = case.check_parameters().unwrap_err();
        assert!(err.to_string().contains("load case 1"));
    }
}
