//! Customer/provider split.
//!
//! The customer receives `share_percentage / 100` of what is being split,
//! the provider the remainder, so both parts always sum to the total.
//!
//! ## Coin (ETH)
//!
//! ```text
//! customer = reward * pct / 100 + beneficiary_balance
//! provider = reward - reward * pct / 100
//! ```
//!
//! The beneficiary balance is already held by the customer and is added on
//! top of the customer part.
//!
//! ## Token balances (KEEP, TBTC)
//!
//! ```text
//! customer = balance * pct / 100
//! provider = balance - customer
//! ```
//!
//! ## Anomalies
//!
//! A negative operational cost (operator balance above its initial balance)
//! or a negative net reward zeroes every coin output. Both are reported
//! through the [`AnomalySink`] and never returned as errors.

use bigdecimal::BigDecimal;
use keepbill_types::SharePercentage;
use num_traits::{Signed, Zero};
use serde::Serialize;

use crate::anomaly::{Anomaly, AnomalySink};

/// One amount split between customer and provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Split {
    /// Customer part.
    pub customer: BigDecimal,
    /// Service provider part.
    pub provider: BigDecimal,
}

impl Split {
    /// Both parts zero.
    pub fn zero() -> Self {
        Self {
            customer: BigDecimal::zero(),
            provider: BigDecimal::zero(),
        }
    }

    /// Sum of both parts.
    pub fn total(&self) -> BigDecimal {
        &self.customer + &self.provider
    }
}

/// Split an accumulated coin reward, adding the beneficiary balance to the
/// customer part.
pub fn split_coin(
    share: SharePercentage,
    beneficiary_balance: &BigDecimal,
    accumulated: &BigDecimal,
) -> Split {
    let customer_accumulated = accumulated * share.as_fraction();
    Split {
        provider: accumulated - &customer_accumulated,
        customer: customer_accumulated + beneficiary_balance,
    }
}

/// Split a live balance.
pub fn split_balance(share: SharePercentage, balance: &BigDecimal) -> Split {
    let customer = balance * share.as_fraction();
    Split {
        provider: balance - &customer,
        customer,
    }
}

/// Coin split together with the values it was derived from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CoinShares {
    /// Customer and provider coin shares.
    pub split: Split,
    /// Reward that was split: accumulated rewards minus operational cost.
    pub net_reward: BigDecimal,
    /// Operational cost, zero after a negative-cost anomaly.
    pub operational_cost: Option<BigDecimal>,
}

/// Coin split with anomaly clamping.
pub struct SplitCalculator<'a> {
    sink: &'a dyn AnomalySink,
}

impl<'a> SplitCalculator<'a> {
    /// Create a calculator reporting anomalies to `sink`.
    pub fn new(sink: &'a dyn AnomalySink) -> Self {
        Self { sink }
    }

    /// Split the coin reward of `customer`.
    ///
    /// Without an operational cost the accumulated reward is split as is.
    /// With one, the net reward `accumulated - cost` is split.
    pub fn coin_shares(
        &self,
        customer: &str,
        share: SharePercentage,
        beneficiary_balance: &BigDecimal,
        accumulated: &BigDecimal,
        operational_cost: Option<&BigDecimal>,
    ) -> CoinShares {
        if let Some(cost) = operational_cost.filter(|c| c.is_negative()) {
            self.sink.report(Anomaly::NegativeOperationalCost {
                customer: customer.to_string(),
                operational_cost: cost.clone(),
            });
            return CoinShares {
                split: Split::zero(),
                net_reward: BigDecimal::zero(),
                operational_cost: Some(BigDecimal::zero()),
            };
        }

        let net_reward = match operational_cost {
            Some(cost) => accumulated - cost,
            None => accumulated.clone(),
        };

        if net_reward.is_negative() {
            self.sink.report(Anomaly::NegativeNetReward {
                customer: customer.to_string(),
                net_reward: net_reward.clone(),
            });
            return CoinShares {
                split: Split::zero(),
                net_reward,
                operational_cost: operational_cost.cloned(),
            };
        }

        CoinShares {
            split: split_coin(share, beneficiary_balance, &net_reward),
            net_reward,
            operational_cost: operational_cost.cloned(),
        }
    }

    /// Split a token balance. Token balances never raise anomalies.
    pub fn token_shares(&self, share: SharePercentage, balance: &BigDecimal) -> Split {
        split_balance(share, balance)
    }
}
