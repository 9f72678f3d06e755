//! Outbound transaction fee ledger.
//!
//! Lists the transactions an operator sent within a block range, with the
//! gas paid for each. Fees are summed in wei and rendered at gas precision.

use keepbill_chain::TransactionSource;
use keepbill_types::units::{format_fixed, wei_to_eth, wei_to_gwei, GAS_PLACES};
use keepbill_types::Address;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{BillingError, FetchContext, Result};

/// Method name shown for transactions without decodable call data.
pub const UNKNOWN_METHOD: &str = "unknown";

/// Inclusive block range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    /// First block.
    pub from: u64,
    /// Last block.
    pub to: u64,
}

impl BlockRange {
    /// Create a range.
    ///
    /// # Errors
    ///
    /// - [`BillingError::InvalidBlockRange`] if `from > to`
    pub fn new(from: u64, to: u64) -> Result<Self> {
        if from > to {
            return Err(BillingError::InvalidBlockRange { from, to });
        }
        Ok(Self { from, to })
    }
}

/// One outbound transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionEntry {
    /// Block the transaction was mined in.
    pub block: u64,
    /// Transaction hash.
    pub hash: String,
    /// Contract method called, or [`UNKNOWN_METHOD`].
    pub method: String,
    /// Gas price in gwei.
    pub gas_price_gwei: String,
    /// Gas consumed.
    pub gas_used: String,
    /// `gas_price * gas_used`, in ETH.
    pub fee_eth: String,
}

/// Every outbound transaction of an operator in a block range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionLedger {
    /// First block of the range.
    pub from_block: u64,
    /// Last block of the range.
    pub to_block: u64,
    /// Transactions by ascending block, chain order within a block.
    pub entries: Vec<TransactionEntry>,
    /// Sum of all fees, in ETH.
    pub total_fee_eth: String,
}

/// Build the outbound transaction ledger of `operator`.
///
/// # Errors
///
/// - [`BillingError::InvalidBlockRange`] if `range.from > range.to`
/// - [`BillingError::DataFetch`] on the first failed query
/// - [`BillingError::Overflow`] if a fee or the total exceeds 256 bits
pub fn outbound_ledger<S>(source: &S, operator: &Address, range: BlockRange) -> Result<TransactionLedger>
where
    S: TransactionSource + ?Sized,
{
    if range.from > range.to {
        return Err(BillingError::InvalidBlockRange {
            from: range.from,
            to: range.to,
        });
    }

    let blocks = source
        .outbound_transactions(operator, range.from, range.to)
        .fetching(|| format!("outbound transactions of {operator}"))?;

    let mut entries = Vec::new();
    let mut total_fee = U256::zero();

    for (block, hashes) in blocks {
        for hash in hashes {
            let gas_price = source
                .transaction_gas_price(&hash)
                .fetching(|| format!("gas price of transaction {hash}"))?;
            let gas_used = source
                .transaction_gas_used(&hash)
                .fetching(|| format!("gas used by transaction {hash}"))?;
            let method = source
                .transaction_method(&hash)
                .fetching(|| format!("method of transaction {hash}"))?
                .unwrap_or_else(|| UNKNOWN_METHOD.to_string());

            let fee = gas_price
                .checked_mul(gas_used)
                .ok_or_else(|| BillingError::Overflow(format!("fee of transaction {hash}")))?;
            total_fee = total_fee
                .checked_add(fee)
                .ok_or_else(|| BillingError::Overflow("total transaction fees".to_string()))?;

            entries.push(TransactionEntry {
                block,
                method,
                gas_price_gwei: format_fixed(&wei_to_gwei(gas_price), GAS_PLACES),
                gas_used: gas_used.to_string(),
                fee_eth: format_fixed(&wei_to_eth(fee), GAS_PLACES),
                hash,
            });
        }
    }

    tracing::debug!(
        %operator,
        from = range.from,
        to = range.to,
        transactions = entries.len(),
        "outbound transactions collected"
    );

    Ok(TransactionLedger {
        from_block: range.from,
        to_block: range.to,
        entries,
        total_fee_eth: format_fixed(&wei_to_eth(total_fee), GAS_PLACES),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{addr, beacon_chain, FailingChain, OPERATOR, OTHER};

    #[test]
    fn test_block_range_rejects_reversed() {
        assert!(BlockRange::new(5, 5).is_ok());
        assert!(matches!(
            BlockRange::new(6, 5),
            Err(BillingError::InvalidBlockRange { from: 6, to: 5 })
        ));
    }

    #[test]
    fn test_ledger_lists_operator_transactions() {
        let range = BlockRange::new(0, 200).expect("range");
        let ledger = outbound_ledger(&beacon_chain(), &addr(OPERATOR), range).expect("ledger");

        let hashes: Vec<&str> = ledger.entries.iter().map(|e| e.hash.as_str()).collect();
        assert_eq!(hashes, vec!["0xa1", "0xa2", "0xc1"]);

        let first = &ledger.entries[0];
        assert_eq!(first.block, 100);
        assert_eq!(first.method, "submitTicket");
        assert_eq!(first.gas_price_gwei, "20.000000000");
        assert_eq!(first.gas_used, "21000");
        assert_eq!(first.fee_eth, "0.000420000");

        let third = &ledger.entries[2];
        assert_eq!(third.method, UNKNOWN_METHOD);
        assert_eq!(third.gas_price_gwei, "1.500000001");
        assert_eq!(third.fee_eth, "0.000000005");

        // 0.00042 + 0.003 + 0.000000004500000003
        assert_eq!(ledger.total_fee_eth, "0.003420005");
    }

    #[test]
    fn test_ledger_respects_range() {
        let range = BlockRange::new(101, 107).expect("range");
        let ledger = outbound_ledger(&beacon_chain(), &addr(OPERATOR), range).expect("ledger");
        assert_eq!(ledger.entries.len(), 1);
        assert_eq!(ledger.entries[0].hash, "0xc1");
        assert_eq!(ledger.from_block, 101);
        assert_eq!(ledger.to_block, 107);
    }

    #[test]
    fn test_empty_ledger() {
        let range = BlockRange::new(0, 99).expect("range");
        let ledger = outbound_ledger(&beacon_chain(), &addr(OTHER), range).expect("ledger");
        assert!(ledger.entries.is_empty());
        assert_eq!(ledger.total_fee_eth, "0.000000000");
    }

    #[test]
    fn test_reversed_range_rejected_before_fetch() {
        let chain = FailingChain {
            inner: beacon_chain(),
            fail_on: "outbound_transactions",
        };
        let err = outbound_ledger(&chain, &addr(OPERATOR), BlockRange { from: 9, to: 1 }).unwrap_err();
        assert!(matches!(err, BillingError::InvalidBlockRange { .. }));
    }

    #[test]
    fn test_gas_query_failure_propagates() {
        let chain = FailingChain {
            inner: beacon_chain(),
            fail_on: "transaction_gas_used",
        };
        let range = BlockRange::new(0, 200).expect("range");
        let err = outbound_ledger(&chain, &addr(OPERATOR), range).unwrap_err();
        assert!(err.to_string().contains("gas used by transaction 0xa1"));
    }
}
