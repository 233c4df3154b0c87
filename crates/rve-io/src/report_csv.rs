//! CSV persistence of report tables.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rve_model::{Cell, ReportTable};
use tracing::info;

use crate::error::Result;

/// Write a report as CSV.
///
/// The header row is an empty cell followed by the column keys; each body row
/// starts with its property label. Empty cells are written as empty fields.
pub fn write_report_csv<W: Write>(table: &ReportTable, mut writer: W) -> io::Result<()> {
    let header: Vec<String> = std::iter::once(String::new())
        .chain(table.columns().iter().map(|c| c.to_string()))
        .collect();
    writeln!(writer, "{}", header.join(","))?;

    for (index, label) in table.rows().iter().enumerate() {
        let fields: Vec<String> = std::iter::once(escape(label))
            .chain(table.row_cells(index).iter().map(format_cell))
            .collect();
        writeln!(writer, "{}", fields.join(","))?;
    }
    writer.flush()
}

/// Save a report next to its input file as
/// `<input dir>/results/<input stem>_<case id>.csv`
pub fn save_results(table: &ReportTable, input_path: &Path, case_id: &str) -> Result<PathBuf> {
    let folder = input_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("results");
    fs::create_dir_all(&folder)?;

    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = folder.join(format!("{stem}_{case_id}.csv"));

    let file = fs::File::create(&path)?;
    write_report_csv(table, io::BufWriter::new(file))?;
    info!(path = %path.display(), "saved report");
    Ok(path)
}

fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Value(value) => format_value(*value),
        Cell::Text(text) => escape(text),
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        value.to_string()
    }
}

fn escape(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
