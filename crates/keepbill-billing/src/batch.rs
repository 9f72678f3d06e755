//! Per-customer isolation across a batch.
//!
//! One customer's failure is logged and recorded; the remaining customers
//! are still processed. A customer either gets a complete report or a
//! failure entry, never both.

use std::fmt::Display;

use keepbill_types::Customer;

/// Report generated for one customer.
#[derive(Clone, Debug)]
pub struct CustomerReport<R> {
    /// Billed customer.
    pub customer: Customer,
    /// Generated report.
    pub report: R,
}

/// Failure recorded for one customer.
#[derive(Clone, Debug)]
pub struct CustomerFailure {
    /// Customer that got no report.
    pub customer: Customer,
    /// Rendered error.
    pub error: String,
}

/// Outcome of a batch run, in customer order.
#[derive(Clone, Debug)]
pub struct BatchOutcome<R> {
    /// Successful reports.
    pub reports: Vec<CustomerReport<R>>,
    /// Customers whose report failed.
    pub failures: Vec<CustomerFailure>,
}

impl<R> BatchOutcome<R> {
    /// Whether every customer got a report.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run `generate` for every customer, isolating failures.
pub fn generate_all<R, E, F>(customers: &[Customer], mut generate: F) -> BatchOutcome<R>
where
    E: Display,
    F: FnMut(&Customer) -> Result<R, E>,
{
    let mut reports = Vec::with_capacity(customers.len());
    let mut failures = Vec::new();

    for customer in customers {
        tracing::info!(customer = %customer.name, "generating report");
        match generate(customer) {
            Ok(report) => reports.push(CustomerReport {
                customer: customer.clone(),
                report,
            }),
            Err(e) => {
                tracing::error!(
                    customer = %customer.name,
                    error = %e,
                    "could not generate report"
                );
                failures.push(CustomerFailure {
                    customer: customer.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        generated = reports.len(),
        failed = failures.len(),
        "batch finished"
    );

    BatchOutcome { reports, failures }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::RecordingSink;
    use crate::cohort::CountStrategy;
    use crate::report::BeaconReportGenerator;
    use crate::testing::{beacon_chain, customer};

    #[test]
    fn test_failure_does_not_stop_batch() {
        let mut second = customer(50);
        second.name = "Broken".to_string();
        let customers = vec![customer(80), second, customer(20)];

        let outcome = generate_all(&customers, |c| {
            if c.name == "Broken" {
                Err("node unavailable")
            } else {
                Ok(c.share_percentage.value())
            }
        });

        assert!(!outcome.is_complete());
        let shares: Vec<u8> = outcome.reports.iter().map(|r| r.report).collect();
        assert_eq!(shares, vec![80, 20]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].customer.name, "Broken");
        assert_eq!(outcome.failures[0].error, "node unavailable");
    }

    #[test]
    fn test_batch_with_generator() {
        let chain = beacon_chain();
        let sink = RecordingSink::new();
        let generator =
            BeaconReportGenerator::fetch(&chain, &sink, CountStrategy::Created).expect("fetch");
        let customers = vec![customer(80), customer(70)];

        let outcome = generate_all(&customers, |c| generator.generate(c, None));

        assert!(outcome.is_complete());
        assert_eq!(outcome.reports.len(), 2);
        assert_eq!(outcome.reports[1].report.base.customer_share_percentage, 70);
    }

    #[test]
    fn test_empty_batch() {
        let outcome = generate_all(&[], |_| Ok::<_, String>(()));
        assert!(outcome.is_complete());
        assert!(outcome.reports.is_empty());
    }
}
