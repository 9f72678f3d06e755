//! Integration test: per-customer failure isolation.
//!
//! One customer's data fetch failure must not stop the batch, and every
//! customer must be billed from a single group snapshot.

use std::cell::Cell;
use std::collections::BTreeMap;

use keepbill_billing::anomaly::RecordingSink;
use keepbill_billing::batch::generate_all;
use keepbill_billing::cohort::CountStrategy;
use keepbill_billing::report::BeaconReportGenerator;
use keepbill_chain::{
    BalanceSource, BeaconSource, ChainError, Result, SnapshotChain, TransactionSource,
};
use keepbill_integration_tests::{
    address, chain, customer, group_key, BENEFICIARY, OPERATOR, SECOND_BENEFICIARY,
    SECOND_OPERATOR,
};
use keepbill_types::Address;
use primitive_types::U256;

/// Counts snapshot-level queries and fails balance lookups of one account.
struct FlakyChain {
    inner: SnapshotChain,
    broken: Address,
    group_count_calls: Cell<u32>,
}

impl BalanceSource for FlakyChain {
    fn eth_balance(&self, address: &Address) -> Result<U256> {
        if *address == self.broken {
            return Err(ChainError::Transport("connection reset".to_string()));
        }
        self.inner.eth_balance(address)
    }

    fn keep_balance(&self, address: &Address) -> Result<U256> {
        self.inner.keep_balance(address)
    }

    fn tbtc_balance(&self, address: &Address) -> Result<U256> {
        self.inner.tbtc_balance(address)
    }

    fn stake(&self, address: &Address) -> Result<U256> {
        self.inner.stake(address)
    }
}

impl BeaconSource for FlakyChain {
    fn created_group_count(&self) -> Result<u64> {
        self.group_count_calls.set(self.group_count_calls.get() + 1);
        self.inner.created_group_count()
    }

    fn active_group_count(&self) -> Result<u64> {
        self.inner.active_group_count()
    }

    fn first_active_group_index(&self) -> Result<u64> {
        self.inner.first_active_group_index()
    }

    fn group_public_key(&self, index: u64) -> Result<Vec<u8>> {
        self.inner.group_public_key(index)
    }

    fn group_members(&self, public_key: &[u8]) -> Result<Vec<Address>> {
        self.inner.group_members(public_key)
    }

    fn group_member_rewards(&self, public_key: &[u8]) -> Result<U256> {
        self.inner.group_member_rewards(public_key)
    }

    fn rewards_withdrawn(&self, operator: &Address, group_index: u64) -> Result<bool> {
        self.inner.rewards_withdrawn(operator, group_index)
    }
}

impl TransactionSource for FlakyChain {
    fn outbound_transactions(
        &self,
        address: &Address,
        from: u64,
        to: u64,
    ) -> Result<BTreeMap<u64, Vec<String>>> {
        self.inner.outbound_transactions(address, from, to)
    }

    fn transaction_gas_price(&self, hash: &str) -> Result<U256> {
        self.inner.transaction_gas_price(hash)
    }

    fn transaction_gas_used(&self, hash: &str) -> Result<U256> {
        self.inner.transaction_gas_used(hash)
    }

    fn transaction_method(&self, hash: &str) -> Result<Option<String>> {
        self.inner.transaction_method(hash)
    }
}

fn flaky_chain() -> FlakyChain {
    let inner = chain(serde_json::json!({
        "balances": {
            OPERATOR: { "eth": "1000000000000000000" },
            SECOND_OPERATOR: { "eth": "1000000000000000000" },
            BENEFICIARY: { "eth": "500000000000000000" }
        },
        "beacon": {
            "first_active_group_index": 0,
            "groups": [
                { "public_key": group_key(0x11), "members": [OPERATOR, SECOND_OPERATOR],
                  "member_rewards": "10000000000000000" }
            ]
        }
    }));
    FlakyChain {
        inner,
        broken: address(SECOND_BENEFICIARY),
        group_count_calls: Cell::new(0),
    }
}

#[test]
fn failing_customer_is_skipped() {
    let chain = flaky_chain();
    let sink = RecordingSink::new();
    let generator =
        BeaconReportGenerator::fetch(&chain, &sink, CountStrategy::Created).expect("groups");

    let customers = vec![
        customer("First", OPERATOR, BENEFICIARY, 50),
        customer("Broken", SECOND_OPERATOR, SECOND_BENEFICIARY, 50),
        customer("Third", SECOND_OPERATOR, BENEFICIARY, 50),
    ];

    let outcome = generate_all(&customers, |c| generator.generate(c, None));

    let billed: Vec<&str> = outcome
        .reports
        .iter()
        .map(|r| r.customer.name.as_str())
        .collect();
    assert_eq!(billed, vec!["First", "Third"]);

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].customer.name, "Broken");
    assert!(outcome.failures[0]
        .error
        .starts_with("could not get ETH balance of"));
    assert!(outcome.failures[0].error.contains("connection reset"));

    assert_eq!(outcome.reports[0].report.base.accumulated_rewards, "0.010000");
    assert_eq!(outcome.reports[1].report.base.accumulated_rewards, "0.010000");
}

#[test]
fn snapshot_fetched_once_per_batch() {
    let chain = flaky_chain();
    let sink = RecordingSink::new();
    let generator =
        BeaconReportGenerator::fetch(&chain, &sink, CountStrategy::Created).expect("groups");

    let customers = vec![
        customer("First", OPERATOR, BENEFICIARY, 10),
        customer("Second", SECOND_OPERATOR, BENEFICIARY, 90),
    ];
    let outcome = generate_all(&customers, |c| generator.generate(c, None));

    assert!(outcome.is_complete());
    assert_eq!(chain.group_count_calls.get(), 1);
}
