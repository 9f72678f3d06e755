//! # keepbill-types
//!
//! Shared domain types used across the keepbill workspace: account
//! addresses, customers, reward-bearing cohorts and the unit helpers used to
//! move between on-chain base units and rendered decimal amounts.
//!
//! ## Modules
//!
//! - [`address`] — Case-insensitive 20-byte account addresses
//! - [`customer`] — Billing customers and share percentages
//! - [`cohort`] — Consensus groups, signing keeps and the cohort snapshot
//! - [`units`] — Base unit conversion and fixed-precision rendering

pub mod address;
pub mod cohort;
pub mod customer;
pub mod units;

pub use address::Address;
pub use cohort::{Cohort, CohortId, CohortKind, CohortSnapshot};
pub use customer::{Customer, SharePercentage};

/// Error types for domain type construction.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// Text is not a `0x`-prefixed 20-byte hex address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Share percentage outside `0..=100`.
    #[error("share percentage must be within 0..=100, got {0}")]
    InvalidSharePercentage(u8),

    /// Decimal amount finer than one wei or too large to render.
    #[error("amount scale {0} is out of range")]
    AmountScaleOutOfRange(i64),

    /// Cohorts handed to a snapshot are not strictly ascending by index.
    #[error("cohort index {next} does not follow {previous}")]
    UnorderedCohorts {
        /// Index of the preceding cohort.
        previous: u64,
        /// Offending index.
        next: u64,
    },
}

/// Convenience result type for domain type construction.
pub type Result<T> = std::result::Result<T, TypesError>;
