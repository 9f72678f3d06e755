//! Customer list loading.

use std::path::Path;

use anyhow::Context;
use keepbill_types::Customer;

/// Read the JSON array of customers at `path`.
pub fn load_customers(path: &Path) -> anyhow::Result<Vec<Customer>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read customers file {}", path.display()))?;
    parse_customers(&content)
        .with_context(|| format!("could not parse customers file {}", path.display()))
}

/// Parse a JSON array of customers.
pub fn parse_customers(content: &str) -> anyhow::Result<Vec<Customer>> {
    let customers: Vec<Customer> = serde_json::from_str(content)?;
    tracing::debug!(customers = customers.len(), "customers loaded");
    Ok(customers)
}
