//! # keepbill-billing
//!
//! Membership accounting and reward attribution for staking customers.
//!
//! A batch run builds one frozen [`CohortSnapshot`](keepbill_types::CohortSnapshot)
//! of every consensus group or signing keep, then reuses it for every
//! customer: slot counting, unclaimed reward accumulation and the
//! customer/provider split all read the same view of the chain.
//!
//! ## Modules
//!
//! - [`cohort`] — Snapshot construction from the data source
//! - [`membership`] — Active/inactive slot counting and summaries
//! - [`rewards`] — Unclaimed reward accumulation
//! - [`split`] — Customer/provider split with anomaly clamping
//! - [`anomaly`] — Injected reporting of recoverable anomalies
//! - [`transactions`] — Outbound transaction fee ledger
//! - [`report`] — Report assembly for the renderer
//! - [`batch`] — Per-customer isolation across a batch

#![warn(missing_docs)]

pub mod anomaly;
pub mod batch;
pub mod cohort;
pub mod membership;
pub mod report;
pub mod rewards;
pub mod split;
pub mod transactions;

#[cfg(test)]
mod testing;

use keepbill_chain::ChainError;

/// Error types for billing operations.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// A data source call failed.
    #[error("could not get {context}: {source}")]
    DataFetch {
        /// What was being fetched.
        context: String,
        /// The data source error, unmodified.
        source: ChainError,
    },

    /// Integer base-unit arithmetic overflowed.
    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    /// The data source reported cohorts that contradict each other.
    #[error("inconsistent cohorts: {0}")]
    InconsistentCohorts(String),

    /// A block range with `from > to`.
    #[error("invalid block range: from block {from} is after to block {to}")]
    InvalidBlockRange {
        /// First block of the range.
        from: u64,
        /// Last block of the range.
        to: u64,
    },
}

/// Convenience result type for billing operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Attach fetch context to data source results.
pub(crate) trait FetchContext<T> {
    fn fetching<F: FnOnce() -> String>(self, what: F) -> Result<T>;
}

impl<T> FetchContext<T> for keepbill_chain::Result<T> {
    fn fetching<F: FnOnce() -> String>(self, what: F) -> Result<T> {
        self.map_err(|source| BillingError::DataFetch {
            context: what(),
            source,
        })
    }
}
