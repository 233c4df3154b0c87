//! I/O support for RVE homogenization.
//!
//! This crate provides:
//! - **INP (input deck)** reader for CalculiX/Abaqus keyword format, with
//!   `*INCLUDE` expansion and node-table extraction
//! - **INP writers** for `*EQUATION`, `*NSET`, `*BOUNDARY` and static steps
//! - **JSON loaders** for test cases and captured retained-node results
//! - **CSV report** output

pub mod error;
pub mod inp;
pub mod inp_writer;
pub mod json;
pub mod report_csv;

pub use error::{IoError, Result};
pub use inp::{Card, DataLine, Deck, Parameter, ParseError as InpParseError, parse_node_line};
pub use inp_writer::{RETAINED_NSET, render_boundary, render_equations, render_nset, render_static_step};
pub use json::{
    CapturedResults, load_captured_results, load_test_case, save_captured_results, save_json,
};
pub use report_csv::{save_results, write_report_csv};
