//! Loading specifications and deformation tensors.
//!
//! A loading block is read in two phases: serde fills a [`RawLoading`] with
//! every field optional, then `TryFrom` checks the fields required by the
//! chosen `kind` and validates each direction code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// A uniaxial loading direction such as `"11"`, `"-13"` or `"32"`.
///
/// Parsed from the pattern `-?[1-3][1-3]`; `row` and `col` are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirectionCode {
    pub negative: bool,
    pub row: usize,
    pub col: usize,
}

impl DirectionCode {
    pub fn sign(&self) -> f64 {
        if self.negative { -1.0 } else { 1.0 }
    }

    /// Whether the code names a normal (diagonal) component
    pub fn is_normal(&self) -> bool {
        self.row == self.col
    }
}

impl FromStr for DirectionCode {
    type Err = ModelError;

    fn from_str(code: &str) -> Result<Self> {
        let invalid = || ModelError::Dimension {
            code: code.to_string(),
        };
        let (negative, digits) = match code.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, code),
        };
        let bytes = digits.as_bytes();
        if bytes.len() != 2 {
            return Err(invalid());
        }
        let index = |b: u8| match b {
            b'1'..=b'3' => Some(usize::from(b - b'1')),
            _ => None,
        };
        let row = index(bytes[0]).ok_or_else(invalid)?;
        let col = index(bytes[1]).ok_or_else(invalid)?;
        Ok(Self { negative, row, col })
    }
}

impl fmt::Display for DirectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.negative { "-" } else { "" };
        write!(f, "{sign}{}{}", self.row + 1, self.col + 1)
    }
}

impl TryFrom<String> for DirectionCode {
    type Error = ModelError;

    fn try_from(code: String) -> Result<Self> {
        code.parse()
    }
}

impl From<DirectionCode> for String {
    fn from(code: DirectionCode) -> Self {
        code.to_string()
    }
}

/// 3x3 deformation-gradient coefficients for one load case.
///
/// `None` marks a displacement component left unconstrained (traction-free).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeformationTensor(pub [[Option<f64>; 3]; 3]);

impl DeformationTensor {
    /// All entries constrained to zero
    pub fn zeros() -> Self {
        Self([[Some(0.0); 3]; 3])
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.0[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) {
        self.0[row][col] = value;
    }

    /// Multiply every non-null entry, leaving nulls untouched
    pub fn scaled(&self, factor: f64) -> Self {
        Self(self.0.map(|row| row.map(|entry| entry.map(|value| value * factor))))
    }

    /// Number of null (free) entries
    pub fn free_count(&self) -> usize {
        self.0.iter().flatten().filter(|entry| entry.is_none()).count()
    }

    pub fn rows(&self) -> &[[Option<f64>; 3]; 3] {
        &self.0
    }
}

impl fmt::Display for DeformationTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.0 {
            let cells: Vec<String> = row
                .iter()
                .map(|entry| match entry {
                    Some(value) => format!("{value:>14.6e}"),
                    None => format!("{:>14}", "free"),
                })
                .collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

/// Loading expressed as a list of direction codes
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionSpec {
    pub directions: Vec<DirectionCode>,
    /// Displacement magnitude for normal directions
    pub normal_magnitude: f64,
    /// Displacement magnitude for shear directions
    pub shear_magnitude: f64,
}

/// Loading expressed as literal deformation tensors
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    pub tensors: Vec<DeformationTensor>,
    pub magnitude_multiplier: f64,
}

/// The two loading variants
#[derive(Debug, Clone, PartialEq)]
pub enum LoadingSpec {
    Direction(DirectionSpec),
    Tensor(TensorSpec),
}

impl LoadingSpec {
    /// Discriminator string used in input files
    pub fn kind(&self) -> &'static str {
        match self {
            LoadingSpec::Direction(_) => "displacement",
            LoadingSpec::Tensor(_) => "tensor",
        }
    }

    pub fn num_load_cases(&self) -> usize {
        match self {
            LoadingSpec::Direction(spec) => spec.directions.len(),
            LoadingSpec::Tensor(spec) => spec.tensors.len(),
        }
    }
}

/// Validated loading block of a test case
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawLoading")]
pub struct Loading {
    pub spec: LoadingSpec,
    /// Requested property labels, one set per load case (or a single set
    /// broadcast to every case)
    pub expected_properties: Vec<Vec<String>>,
    /// Optional display label per load case
    pub labels: Option<Vec<String>>,
}

impl Loading {
    pub fn num_load_cases(&self) -> usize {
        self.spec.num_load_cases()
    }
}

/// Loading block as it appears in JSON, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLoading {
    pub kind: Option<String>,
    pub directions: Option<Vec<String>>,
    pub normal_magnitude: Option<f64>,
    pub shear_magnitude: Option<f64>,
    pub tensors: Option<Vec<DeformationTensor>>,
    pub magnitude_multiplier: Option<f64>,
    pub expected_properties: Option<Vec<Vec<String>>>,
    pub labels: Option<Vec<String>>,
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T> {
    value.ok_or_else(|| ModelError::MissingField {
        field,
        context: "loading".to_string(),
    })
}

impl TryFrom<RawLoading> for Loading {
    type Error = ModelError;

    fn try_from(raw: RawLoading) -> Result<Self> {
        let kind = required(raw.kind, "kind")?;
        let spec = match kind.as_str() {
            "displacement" => {
                let directions = required(raw.directions, "directions")?
                    .iter()
                    .map(|code| code.parse())
                    .collect::<Result<Vec<DirectionCode>>>()?;
                LoadingSpec::Direction(DirectionSpec {
                    directions,
                    normal_magnitude: required(raw.normal_magnitude, "normalMagnitude")?,
                    shear_magnitude: required(raw.shear_magnitude, "shearMagnitude")?,
                })
            }
            "tensor" => LoadingSpec::Tensor(TensorSpec {
                tensors: required(raw.tensors, "tensors")?,
                magnitude_multiplier: raw.magnitude_multiplier.unwrap_or(1.0),
            }),
            _ => return Err(ModelError::InvalidLoadingKind(kind)),
        };

        Ok(Self {
            spec,
            expected_properties: required(raw.expected_properties, "expectedProperties")?,
            labels: raw.labels,
        })
    }
}

impl From<&Loading> for RawLoading {
    fn from(loading: &Loading) -> Self {
        let mut raw = RawLoading {
            kind: Some(loading.spec.kind().to_string()),
            expected_properties: Some(loading.expected_properties.clone()),
            labels: loading.labels.clone(),
            ..RawLoading::default()
        };
        match &loading.spec {
            LoadingSpec::Direction(spec) => {
                raw.directions = Some(spec.directions.iter().map(|d| d.to_string()).collect());
                raw.normal_magnitude = Some(spec.normal_magnitude);
                raw.shear_magnitude = Some(spec.shear_magnitude);
            }
            LoadingSpec::Tensor(spec) => {
                raw.tensors = Some(spec.tensors.clone());
                raw.magnitude_multiplier = Some(spec.magnitude_multiplier);
            }
        }
        raw
    }
}

impl Serialize for Loading {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RawLoading::from(self).serialize(serializer)
    }
}
