//! Recoverable anomaly reporting.
//!
//! Anomalies are conditions the split recovers from locally (by clamping
//! coin shares to zero) but that an operator has to look at. They are
//! handed to an [`AnomalySink`] passed in by the caller rather than logged
//! through global state, so tests can observe them deterministically.

use std::cell::RefCell;

use bigdecimal::BigDecimal;
use keepbill_types::units::{format_fixed, COIN_PLACES};

/// How loudly an anomaly should be surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Suspicious but explainable.
    Warning,
    /// Indicates data the billing cannot be trusted on.
    Error,
}

/// A recoverable billing anomaly.
#[derive(Clone, Debug, PartialEq)]
pub enum Anomaly {
    /// Operator balance grew beyond its initial balance: the account
    /// received external funding.
    NegativeOperationalCost {
        /// Customer being billed.
        customer: String,
        /// The negative cost, in ETH.
        operational_cost: BigDecimal,
    },
    /// Operating costs exceed the rewards received.
    NegativeNetReward {
        /// Customer being billed.
        customer: String,
        /// The negative net reward, in ETH.
        net_reward: BigDecimal,
    },
}

impl Anomaly {
    /// Severity of this anomaly.
    pub fn severity(&self) -> Severity {
        match self {
            Anomaly::NegativeOperationalCost { .. } => Severity::Error,
            Anomaly::NegativeNetReward { .. } => Severity::Warning,
        }
    }

    /// Customer the anomaly was raised for.
    pub fn customer(&self) -> &str {
        match self {
            Anomaly::NegativeOperationalCost { customer, .. }
            | Anomaly::NegativeNetReward { customer, .. } => customer,
        }
    }
}

/// Receiver of recoverable anomalies.
pub trait AnomalySink {
    /// Record one anomaly.
    fn report(&self, anomaly: Anomaly);
}

/// Sink forwarding anomalies to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl AnomalySink for TracingSink {
    fn report(&self, anomaly: Anomaly) {
        match &anomaly {
            Anomaly::NegativeOperationalCost {
                customer,
                operational_cost,
            } => tracing::error!(
                customer = %customer,
                operational_cost = %format_fixed(operational_cost, COIN_PLACES),
                "operational costs are negative, operator received external funding; \
                 ETH shares set to zero"
            ),
            Anomaly::NegativeNetReward {
                customer,
                net_reward,
            } => tracing::warn!(
                customer = %customer,
                net_reward = %format_fixed(net_reward, COIN_PLACES),
                "operational costs exceed rewards; ETH shares set to zero"
            ),
        }
    }
}

/// Sink keeping every anomaly in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    anomalies: RefCell<Vec<Anomaly>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Anomalies recorded so far, in report order.
    pub fn anomalies(&self) -> Vec<Anomaly> {
        self.anomalies.borrow().clone()
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.anomalies.borrow().is_empty()
    }
}

impl AnomalySink for RecordingSink {
    fn report(&self, anomaly: Anomaly) {
        self.anomalies.borrow_mut().push(anomaly);
    }
}
