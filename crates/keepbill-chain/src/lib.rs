//! # keepbill-chain
//!
//! Read-only chain data source contract consumed by the billing engine.
//!
//! The engine never talks to a node directly. It is handed an
//! implementation of the traits in [`source`]; every call blocks until the
//! answer (or an error) is available. All amounts are integers in the
//! smallest on-chain denomination.
//!
//! ## Modules
//!
//! - [`source`] — Data source traits (balances, beacon groups, ECDSA keeps, transactions)
//! - [`snapshot`] — JSON chain-state snapshot implementing every trait

pub mod snapshot;
pub mod source;

pub use snapshot::SnapshotChain;
pub use source::{BalanceSource, BeaconSource, EcdsaSource, TransactionSource};

/// Error types for chain queries.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The node or transport failed to answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// A queried entity does not exist on chain.
    #[error("not found: {0}")]
    NotFound(String),

    /// A block range query with `from > to`.
    #[error("invalid block range: from block {from} is after to block {to}")]
    InvalidBlockRange {
        /// First block of the range.
        from: u64,
        /// Last block of the range.
        to: u64,
    },

    /// Chain snapshot content is malformed.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Reading the snapshot file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot JSON could not be decoded.
    #[error("snapshot decode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type for chain queries.
pub type Result<T> = std::result::Result<T, ChainError>;
