//! Report export.
//!
//! Reports are written one file per customer, named
//! `<Customer_Name>_Billing.<extension>` in the target directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use keepbill_types::Customer;
use serde::Serialize;

/// Suffix appended to the customer file stem.
pub const FILE_SUFFIX: &str = "_Billing";

/// Writes a rendered report to disk.
pub trait ReportExporter {
    /// File extension without the dot.
    fn extension(&self) -> &str;

    /// Render `report` into `path`.
    fn export<R: Serialize>(&self, report: &R, path: &Path) -> anyhow::Result<()>;
}

/// Pretty-printed JSON exporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl ReportExporter for JsonExporter {
    fn extension(&self) -> &str {
        "json"
    }

    fn export<R: Serialize>(&self, report: &R, path: &Path) -> anyhow::Result<()> {
        let mut content = serde_json::to_string_pretty(report)?;
        content.push('\n');
        std::fs::write(path, content)
            .with_context(|| format!("could not write report {}", path.display()))
    }
}

/// Output path of the report of `customer`.
pub fn report_path<E: ReportExporter>(exporter: &E, directory: &Path, customer: &Customer) -> PathBuf {
    directory.join(format!(
        "{}{}.{}",
        customer.file_stem(),
        FILE_SUFFIX,
        exporter.extension()
    ))
}

/// Write the report of `customer` into `directory`, returning its path.
pub fn write_report<E, R>(
    exporter: &E,
    directory: &Path,
    customer: &Customer,
    report: &R,
) -> anyhow::Result<PathBuf>
where
    E: ReportExporter,
    R: Serialize,
{
    let path = report_path(exporter, directory, customer);
    exporter.export(report, &path)?;
    tracing::info!(customer = %customer.name, path = %path.display(), "report written");
    Ok(path)
}
