//! Numerical settings of a homogenization run.

use serde::{Deserialize, Serialize};

/// Significant figures kept when cleaning face coordinates
pub const DEFAULT_SIG_FIGS: u32 = 8;

/// Magnitudes at or below this are snapped to zero when cleaning coordinates
pub const DEFAULT_ZERO_EPSILON: f64 = f64::EPSILON * 1e3;

/// Face selection tolerance as a fraction of the edge length
pub const DEFAULT_TOLERANCE_MULTIPLIER: f64 = 1e-6;

/// Settings shared by face pairing and constraint generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HomogenizationConfig {
    pub sig_figs: u32,
    pub zero_epsilon: f64,
    pub tolerance_multiplier: f64,
    /// Include the `+u(N0)` term in periodic constraint equations
    pub anchor_reference_node: bool,
}

impl Default for HomogenizationConfig {
    fn default() -> Self {
        Self {
            sig_figs: DEFAULT_SIG_FIGS,
            zero_epsilon: DEFAULT_ZERO_EPSILON,
            tolerance_multiplier: DEFAULT_TOLERANCE_MULTIPLIER,
            anchor_reference_node: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = HomogenizationConfig::default();
        assert_eq!(config.sig_figs, 8);
        assert!((config.zero_epsilon - 2.220446049250313e-13).abs() < 1e-25);
        assert_eq!(config.tolerance_multiplier, 1e-6);
        assert!(config.anchor_reference_node);
    }
}
