//! Writers for the CalculiX cards that carry periodic constraints and
//! per-load-case displacements.

use rve_model::{ConstraintEquation, DisplacementBc};

/// Node set name holding the retained nodes in generated decks
pub const RETAINED_NSET: &str = "RETAINED";

/// Terms per data line of an `*EQUATION` card
const TERMS_PER_LINE: usize = 4;

/// Render `*EQUATION` cards, one per equation
pub fn render_equations(equations: &[ConstraintEquation]) -> String {
    let mut out = String::new();
    for equation in equations {
        out.push_str("*EQUATION\n");
        out.push_str(&format!("{}\n", equation.terms.len()));
        for chunk in equation.terms.chunks(TERMS_PER_LINE) {
            let fields: Vec<String> = chunk
                .iter()
                .map(|t| format!("{}, {}, {}", t.node, t.dof.ccx_number(), format_real(t.coefficient)))
                .collect();
            out.push_str(&format!("{}\n", fields.join(", ")));
        }
    }
    out
}

/// Render a `*NSET` card listing node ids, 16 per line
pub fn render_nset(name: &str, nodes: &[i32]) -> String {
    let mut out = format!("*NSET, NSET={name}\n");
    for chunk in nodes.chunks(16) {
        let ids: Vec<String> = chunk.iter().map(ToString::to_string).collect();
        out.push_str(&format!("{}\n", ids.join(", ")));
    }
    out
}

/// Render a `*BOUNDARY` card; `replace` issues `OP=NEW` so earlier
/// prescribed displacements are dropped
pub fn render_boundary(bcs: &[DisplacementBc], replace: bool) -> String {
    let mut out = String::from(if replace { "*BOUNDARY, OP=NEW\n" } else { "*BOUNDARY\n" });
    for bc in bcs {
        let dof = bc.dof.ccx_number();
        out.push_str(&format!("{}, {dof}, {dof}, {}\n", bc.node, format_real(bc.value)));
    }
    out
}

/// Render one linear static step applying `bcs` and printing displacements
/// and reaction forces of the retained node set
pub fn render_static_step(title: &str, bcs: &[DisplacementBc]) -> String {
    let mut out = format!("** {title}\n*STEP\n*STATIC\n");
    out.push_str(&render_boundary(bcs, true));
    out.push_str(&format!("*NODE PRINT, NSET={RETAINED_NSET}\nU\n"));
    out.push_str(&format!("*NODE PRINT, NSET={RETAINED_NSET}, TOTALS=NO\nRF\n"));
    out.push_str("*END STEP\n");
    out
}

/// Reals always carry a decimal point or exponent so CalculiX reads them as
/// floating-point fields
fn format_real(value: f64) -> String {
    let text = format!("{value:?}");
    if text.contains(['.', 'e', 'E']) || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}
