use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::dispatch::Report;

pub const DEFAULT_REPORT_PATH: &str = "report.json";
pub const DEFAULT_BEST_AGENT_CSV_PATH: &str = "best_agent.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write CSV '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

/// Pretty JSON with four-space indentation.
pub fn report_to_json(report: &Report) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    report.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn write_report_json(report: &Report, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let payload = report_to_json(report)?;
    let io_err = |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut file = BufWriter::new(File::create(path).map_err(io_err)?);
    file.write_all(payload.as_bytes()).map_err(io_err)?;
    file.flush().map_err(io_err)
}

/// `Agent,Efficiency` header plus the best agent's row. Header only when no
/// agent delivered anything. Efficiency keeps its decimal point (`1.0`, not `1`).
pub fn write_best_agent_csv(report: &Report, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let csv_err = |source| ExportError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(["Agent", "Efficiency"]).map_err(csv_err)?;
    if let Some((agent, efficiency)) = report.best_agent_row() {
        writer
            .write_record([agent, format!("{efficiency:?}").as_str()])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}
