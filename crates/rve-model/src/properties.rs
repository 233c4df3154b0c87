//! Effective elastic property sets and their report labels.
//!
//! Off-diagonal quantities (shear moduli, Poisson's ratios) are stored in the
//! fixed order of [`OFF_DIAGONAL_PAIRS`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Ordered off-diagonal index pairs `(i, j)`, `i != j`, lexicographic
pub const OFF_DIAGONAL_PAIRS: [(usize, usize); 6] = [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)];

/// Every label that a load case may request
#[rustfmt::skip]
pub const AVAILABLE_PROPERTIES: [&str; 15] = [
    "E11", "E22", "E33",
    "G12", "G13", "G21", "G23", "G31", "G32",
    "v12", "v13", "v21", "v23", "v31", "v32",
];

/// Well-formed labels that name no physical quantity
#[rustfmt::skip]
pub const IMPOSSIBLE_PROPERTIES: [&str; 12] = [
    "E12", "E13", "E21", "E23", "E31", "E32",
    "G11", "G22", "G33",
    "v11", "v22", "v33",
];

/// Sentinel requesting every available property
pub const ALL_SENTINEL: &str = "all";

/// Position of `(i, j)` within [`OFF_DIAGONAL_PAIRS`]
pub fn off_diagonal_index(i: usize, j: usize) -> Option<usize> {
    OFF_DIAGONAL_PAIRS.iter().position(|&pair| pair == (i, j))
}

/// Effective properties derived from one load case
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySet {
    /// E11, E22, E33
    pub elastic_moduli: [f64; 3],
    /// v12, v13, v21, v23, v31, v32
    pub poissons_ratios: [f64; 6],
    /// G12, G13, G21, G23, G31, G32
    pub shear_moduli: [f64; 6],
}

impl PropertySet {
    /// Look up the value a label refers to; `None` for impossible labels
    pub fn value(&self, label: &PropertyLabel) -> Option<f64> {
        let index = label.tuple_index()?;
        Some(match label.kind {
            PropertyKind::ElasticModulus => self.elastic_moduli[index],
            PropertyKind::ShearModulus => self.shear_moduli[index],
            PropertyKind::PoissonsRatio => self.poissons_ratios[index],
        })
    }

    /// Count of entries that are NaN or infinite
    pub fn non_finite_count(&self) -> usize {
        self.elastic_moduli
            .iter()
            .chain(&self.poissons_ratios)
            .chain(&self.shear_moduli)
            .filter(|value| !value.is_finite())
            .count()
    }
}

/// Family of an effective property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    ElasticModulus,
    ShearModulus,
    PoissonsRatio,
}

impl PropertyKind {
    pub fn prefix(self) -> char {
        match self {
            PropertyKind::ElasticModulus => 'E',
            PropertyKind::ShearModulus => 'G',
            PropertyKind::PoissonsRatio => 'v',
        }
    }

    /// Key of the matching `PropertySet` field in serialized output
    pub fn key(self) -> &'static str {
        match self {
            PropertyKind::ElasticModulus => "elasticModuli",
            PropertyKind::ShearModulus => "shearModuli",
            PropertyKind::PoissonsRatio => "poissonsRatios",
        }
    }
}

/// A parsed property label such as `E11`, `G23` or `v31`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyLabel {
    pub kind: PropertyKind,
    /// 0-based component indices
    pub i: usize,
    pub j: usize,
}

impl PropertyLabel {
    /// Whether the label names a physical quantity (diagonal E, off-diagonal G/v)
    pub fn is_possible(&self) -> bool {
        match self.kind {
            PropertyKind::ElasticModulus => self.i == self.j,
            PropertyKind::ShearModulus | PropertyKind::PoissonsRatio => self.i != self.j,
        }
    }

    /// Index into the matching `PropertySet` array.
    ///
    /// Diagonal pairs map to `0..3`; off-diagonal pairs map through
    /// [`OFF_DIAGONAL_PAIRS`]. Impossible labels have no slot.
    pub fn tuple_index(&self) -> Option<usize> {
        if !self.is_possible() {
            None
        } else if self.i == self.j {
            Some(self.i)
        } else {
            off_diagonal_index(self.i, self.j)
        }
    }
}

impl FromStr for PropertyLabel {
    type Err = ModelError;

    fn from_str(label: &str) -> Result<Self> {
        let unknown = || ModelError::UnknownProperty(label.to_string());
        let bytes = label.as_bytes();
        if bytes.len() != 3 {
            return Err(unknown());
        }
        let kind = match bytes[0] {
            b'E' => PropertyKind::ElasticModulus,
            b'G' => PropertyKind::ShearModulus,
            b'v' => PropertyKind::PoissonsRatio,
            _ => return Err(unknown()),
        };
        let index = |b: u8| match b {
            b'1'..=b'3' => Ok(usize::from(b - b'1')),
            _ => Err(unknown()),
        };
        Ok(Self {
            kind,
            i: index(bytes[1])?,
            j: index(bytes[2])?,
        })
    }
}

impl fmt::Display for PropertyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.kind.prefix(), self.i + 1, self.j + 1)
    }
}
