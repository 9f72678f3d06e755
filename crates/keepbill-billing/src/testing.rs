//! Shared fixtures for unit tests.

use std::collections::{BTreeMap, HashMap};

use keepbill_chain::{
    BalanceSource, BeaconSource, ChainError, EcdsaSource, SnapshotChain, TransactionSource,
};
use keepbill_types::{Address, Customer, SharePercentage};
use primitive_types::U256;

pub(crate) const OPERATOR: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub(crate) const OTHER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
pub(crate) const BENEFICIARY: &str = "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb";
pub(crate) const KEEP_A: &str = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB";
pub(crate) const KEEP_B: &str = "0x52908400098527886E0F7030069857D2E4169EE7";
pub(crate) const KEEP_C: &str = "0x8617E340B3D01FA5F11F306F4090FD50E238070D";

pub(crate) fn addr(text: &str) -> Address {
    Address::parse(text).expect("address")
}

pub(crate) fn customer(share: u8) -> Customer {
    Customer {
        name: "Acme Staking".to_string(),
        operator: addr(OPERATOR),
        beneficiary: addr(BENEFICIARY),
        share_percentage: SharePercentage::new(share).expect("share"),
        initial_operator_eth_balance: "2".parse().expect("decimal"),
    }
}

/// Four groups, the first expired:
///
/// | index | members | reward (wei) | withdrawn by operator |
/// |---|---|---|---|
/// | 0 | op, other | 1e17 | no |
/// | 1 | other, op, op | 5e16 | no |
/// | 2 | other | 1e18 | no |
/// | 3 | op | 2e17 | yes |
pub(crate) fn beacon_chain() -> SnapshotChain {
    let json = serde_json::json!({
        "balances": {
            OPERATOR: { "eth": "1500000000000000000", "stake": "200000000000000000000000" },
            BENEFICIARY: { "eth": "1220000000000000000", "keep": "1924875000000000000" }
        },
        "beacon": {
            "first_active_group_index": 1,
            "groups": [
                { "public_key": format!("0x{}", "01".repeat(128)), "members": [OPERATOR, OTHER],
                  "member_rewards": "100000000000000000" },
                { "public_key": format!("0x{}", "02".repeat(128)), "members": [OTHER, OPERATOR, OPERATOR],
                  "member_rewards": "50000000000000000" },
                { "public_key": format!("0x{}", "03".repeat(128)), "members": [OTHER],
                  "member_rewards": "1000000000000000000" },
                { "public_key": format!("0x{}", "04".repeat(128)), "members": [OPERATOR],
                  "member_rewards": "200000000000000000", "withdrawn": [OPERATOR] }
            ]
        },
        "transactions": [
            { "block": 100, "hash": "0xa1", "from": OPERATOR, "gas_price": "20000000000",
              "gas_used": 21000, "method": "submitTicket" },
            { "block": 100, "hash": "0xa2", "from": OPERATOR, "gas_price": "30000000000",
              "gas_used": 100000, "method": "submitRelayEntry" },
            { "block": 105, "hash": "0xb1", "from": OTHER, "gas_price": "1", "gas_used": 1 },
            { "block": 107, "hash": "0xc1", "from": OPERATOR, "gas_price": "1500000001",
              "gas_used": 3 }
        ]
    });
    SnapshotChain::from_json(&json.to_string()).expect("beacon fixture")
}

/// Three keeps reported out of index order:
///
/// | index | active | members | operator balance (wei) |
/// |---|---|---|---|
/// | 0 | no | op | 1e16 |
/// | 1 | yes | op, other, op | 3e17 |
/// | 2 | yes | other | - |
pub(crate) fn keep_chain() -> SnapshotChain {
    let json = serde_json::json!({
        "balances": {
            OPERATOR: { "eth": "1500000000000000000", "stake": "200000000000000000000000" },
            BENEFICIARY: { "eth": "1220000000000000000", "keep": "1924875000000000000",
                           "tbtc": "500000000000000000" }
        },
        "ecdsa": {
            "keeps": [
                { "index": 2, "address": KEEP_C, "active": true, "members": [OTHER] },
                { "index": 0, "address": KEEP_A, "active": false, "members": [OPERATOR],
                  "member_balances": { OPERATOR: "10000000000000000" } },
                { "index": 1, "address": KEEP_B, "active": true, "members": [OPERATOR, OTHER, OPERATOR],
                  "member_balances": { OPERATOR: "300000000000000000" } }
            ]
        }
    });
    SnapshotChain::from_json(&json.to_string()).expect("keep fixture")
}

/// Wraps a snapshot and fails the named query.
pub(crate) struct FailingChain {
    pub(crate) inner: SnapshotChain,
    pub(crate) fail_on: &'static str,
}

impl FailingChain {
    fn check(&self, method: &str) -> keepbill_chain::Result<()> {
        if self.fail_on == method {
            return Err(ChainError::Transport(format!("{method} unavailable")));
        }
        Ok(())
    }
}

impl BalanceSource for FailingChain {
    fn eth_balance(&self, address: &Address) -> keepbill_chain::Result<U256> {
        self.check("eth_balance")?;
        self.inner.eth_balance(address)
    }

    fn keep_balance(&self, address: &Address) -> keepbill_chain::Result<U256> {
        self.check("keep_balance")?;
        self.inner.keep_balance(address)
    }

    fn tbtc_balance(&self, address: &Address) -> keepbill_chain::Result<U256> {
        self.check("tbtc_balance")?;
        self.inner.tbtc_balance(address)
    }

    fn stake(&self, address: &Address) -> keepbill_chain::Result<U256> {
        self.check("stake")?;
        self.inner.stake(address)
    }
}

impl BeaconSource for FailingChain {
    fn created_group_count(&self) -> keepbill_chain::Result<u64> {
        self.check("created_group_count")?;
        self.inner.created_group_count()
    }

    fn active_group_count(&self) -> keepbill_chain::Result<u64> {
        self.check("active_group_count")?;
        self.inner.active_group_count()
    }

    fn first_active_group_index(&self) -> keepbill_chain::Result<u64> {
        self.check("first_active_group_index")?;
        self.inner.first_active_group_index()
    }

    fn group_public_key(&self, index: u64) -> keepbill_chain::Result<Vec<u8>> {
        self.check("group_public_key")?;
        self.inner.group_public_key(index)
    }

    fn group_members(&self, public_key: &[u8]) -> keepbill_chain::Result<Vec<Address>> {
        self.check("group_members")?;
        self.inner.group_members(public_key)
    }

    fn group_member_rewards(&self, public_key: &[u8]) -> keepbill_chain::Result<U256> {
        self.check("group_member_rewards")?;
        self.inner.group_member_rewards(public_key)
    }

    fn rewards_withdrawn(&self, operator: &Address, group_index: u64) -> keepbill_chain::Result<bool> {
        self.check("rewards_withdrawn")?;
        self.inner.rewards_withdrawn(operator, group_index)
    }
}

impl EcdsaSource for FailingChain {
    fn keeps(&self) -> keepbill_chain::Result<(HashMap<u64, Address>, HashMap<u64, Address>)> {
        self.check("keeps")?;
        self.inner.keeps()
    }

    fn keep_members(&self, keep: &Address) -> keepbill_chain::Result<Vec<Address>> {
        self.check("keep_members")?;
        self.inner.keep_members(keep)
    }

    fn keep_member_balance(&self, keep: &Address, member: &Address) -> keepbill_chain::Result<U256> {
        self.check("keep_member_balance")?;
        self.inner.keep_member_balance(keep, member)
    }
}

impl TransactionSource for FailingChain {
    fn outbound_transactions(
        &self,
        address: &Address,
        from: u64,
        to: u64,
    ) -> keepbill_chain::Result<BTreeMap<u64, Vec<String>>> {
        self.check("outbound_transactions")?;
        self.inner.outbound_transactions(address, from, to)
    }

    fn transaction_gas_price(&self, hash: &str) -> keepbill_chain::Result<U256> {
        self.check("transaction_gas_price")?;
        self.inner.transaction_gas_price(hash)
    }

    fn transaction_gas_used(&self, hash: &str) -> keepbill_chain::Result<U256> {
        self.check("transaction_gas_used")?;
        self.inner.transaction_gas_used(hash)
    }

    fn transaction_method(&self, hash: &str) -> keepbill_chain::Result<Option<String>> {
        self.check("transaction_method")?;
        self.inner.transaction_method(hash)
    }
}
