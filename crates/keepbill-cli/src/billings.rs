//! The `billings` command: one report per customer.

use std::path::PathBuf;

use anyhow::Context;
use keepbill_billing::anomaly::TracingSink;
use keepbill_billing::batch::{generate_all, BatchOutcome};
use keepbill_billing::report::{BeaconReportGenerator, EcdsaReportGenerator};
use keepbill_chain::SnapshotChain;

use crate::config::{BillingConfig, ReportKind};
use crate::customers::load_customers;
use crate::export::{write_report, JsonExporter};

/// Generate and export the reports of every configured customer.
///
/// The cohort snapshot is built once before the first customer. Failures
/// of single customers are recorded in the outcome; only setup failures
/// (config, customers, chain, snapshot, output directory) abort the run.
pub fn run(config: &BillingConfig) -> anyhow::Result<BatchOutcome<PathBuf>> {
    let billings = &config.billings;
    let customers = load_customers(&billings.customers_file)?;
    let blocks = config.block_range()?;

    let chain = SnapshotChain::load(&config.chain.snapshot_file).with_context(|| {
        format!(
            "could not load chain snapshot {}",
            config.chain.snapshot_file.display()
        )
    })?;

    std::fs::create_dir_all(&billings.target_directory).with_context(|| {
        format!(
            "could not create target directory {}",
            billings.target_directory.display()
        )
    })?;

    let sink = TracingSink;
    let exporter = JsonExporter;
    let target = billings.target_directory.as_path();

    tracing::info!(
        customers = customers.len(),
        kind = ?billings.report_kind,
        "starting billings"
    );

    let outcome = match billings.report_kind {
        ReportKind::Beacon => {
            let generator =
                BeaconReportGenerator::fetch(&chain, &sink, billings.group_count_strategy)
                    .context("could not fetch groups")?;
            generate_all(&customers, |customer| -> anyhow::Result<PathBuf> {
                let report = generator.generate(customer, blocks)?;
                write_report(&exporter, target, customer, &report)
            })
        }
        ReportKind::Ecdsa => {
            let generator =
                EcdsaReportGenerator::fetch(&chain, &sink).context("could not fetch keeps")?;
            generate_all(&customers, |customer| -> anyhow::Result<PathBuf> {
                let report = generator.generate(customer)?;
                write_report(&exporter, target, customer, &report)
            })
        }
    };

    Ok(outcome)
}
