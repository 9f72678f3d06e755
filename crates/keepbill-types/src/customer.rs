//! Billing customers.
//!
//! A customer delegates an operator to the service provider and receives a
//! contractual percentage of the rewards; the provider keeps the rest.
//! Legacy customer files use `PascalCase` keys, which are accepted as
//! aliases, and write ETH amounts as JSON numbers. Numbers are read from
//! their literal text, never through a float.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize};

use crate::units::ETH_DECIMALS;
use crate::{Address, Result, TypesError};

/// Upper bound of a share percentage.
pub const MAX_SHARE_PERCENTAGE: u8 = 100;

/// Largest power of ten an ETH amount in a customer file may carry.
pub const MAX_AMOUNT_EXPONENT: i64 = 30;

/// Customer share of rewards, in whole percent (`0..=100`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SharePercentage(u8);

impl SharePercentage {
    /// Create a share percentage.
    ///
    /// # Errors
    ///
    /// - [`TypesError::InvalidSharePercentage`] if `value > 100`
    pub fn new(value: u8) -> Result<Self> {
        if value > MAX_SHARE_PERCENTAGE {
            return Err(TypesError::InvalidSharePercentage(value));
        }
        Ok(Self(value))
    }

    /// The percentage as an integer.
    pub fn value(self) -> u8 {
        self.0
    }

    /// The percentage as an exact fraction (`value / 100`).
    ///
    /// Built as a decimal scale shift so no division rounding is involved.
    pub fn as_fraction(self) -> BigDecimal {
        BigDecimal::new(BigInt::from(self.0), 2)
    }
}

impl TryFrom<u8> for SharePercentage {
    type Error = TypesError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<SharePercentage> for u8 {
    fn from(share: SharePercentage) -> Self {
        share.0
    }
}

/// A staking customer. Immutable input to a report run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Display name, also used to derive the output file name.
    #[serde(alias = "Name")]
    pub name: String,
    /// Operator address whose memberships and rewards are billed.
    #[serde(alias = "Operator")]
    pub operator: Address,
    /// Address receiving withdrawn rewards for the operator.
    #[serde(alias = "Beneficiary")]
    pub beneficiary: Address,
    /// Customer share of rewards and balances.
    #[serde(alias = "CustomerSharePercentage")]
    pub share_percentage: SharePercentage,
    /// Operator ETH balance when the engagement started, in ETH.
    #[serde(
        default,
        alias = "InitialOperatorEthBalance",
        deserialize_with = "eth_amount"
    )]
    pub initial_operator_eth_balance: BigDecimal,
}

/// Check that an ETH amount is no finer than one wei and that its
/// normalized power of ten is at most [`MAX_AMOUNT_EXPONENT`].
///
/// # Errors
///
/// - [`TypesError::AmountScaleOutOfRange`] with the normalized scale
pub fn check_eth_amount(value: &BigDecimal) -> Result<()> {
    let (_, scale) = value.normalized().as_bigint_and_exponent();
    if !(-MAX_AMOUNT_EXPONENT..=ETH_DECIMALS).contains(&scale) {
        return Err(TypesError::AmountScaleOutOfRange(scale));
    }
    Ok(())
}

fn eth_amount<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<BigDecimal, D::Error> {
    let value = BigDecimal::deserialize(deserializer)?;
    check_eth_amount(&value).map_err(serde::de::Error::custom)?;
    Ok(value)
}

impl Customer {
    /// File-system friendly form of the customer name.
    pub fn file_stem(&self) -> String {
        self.name.replace(' ', "_")
    }
}
