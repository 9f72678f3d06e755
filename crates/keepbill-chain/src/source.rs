//! Data source traits.
//!
//! Two query shapes exist for cohorts:
//!
//! - Random beacon groups expose a count and a "first active index"
//!   threshold; activity is derived from the index.
//! - ECDSA keeps are enumerated directly into two disjoint index-keyed
//!   sets, active and inactive.
//!
//! Index-keyed maps carry no iteration order; callers sort them.

use std::collections::{BTreeMap, HashMap};

use keepbill_types::Address;
use primitive_types::U256;

use crate::Result;

/// Live balance queries shared by every report flavor.
pub trait BalanceSource {
    /// Native coin balance in wei.
    fn eth_balance(&self, address: &Address) -> Result<U256>;

    /// KEEP token balance in base units.
    fn keep_balance(&self, address: &Address) -> Result<U256>;

    /// TBTC token balance in base units.
    fn tbtc_balance(&self, address: &Address) -> Result<U256>;

    /// Staked KEEP of an operator in base units.
    fn stake(&self, address: &Address) -> Result<U256>;
}

/// Random beacon operator contract queries.
pub trait BeaconSource: BalanceSource {
    /// Total number of groups ever created.
    fn created_group_count(&self) -> Result<u64>;

    /// Number of active groups. Does not count terminated groups.
    fn active_group_count(&self) -> Result<u64>;

    /// Index of the first non-expired group.
    fn first_active_group_index(&self) -> Result<u64>;

    /// Public key of the group at `index`.
    fn group_public_key(&self, index: u64) -> Result<Vec<u8>>;

    /// Members of a group by slot.
    fn group_members(&self, public_key: &[u8]) -> Result<Vec<Address>>;

    /// Reward owed to each member slot of a group, in wei.
    fn group_member_rewards(&self, public_key: &[u8]) -> Result<U256>;

    /// Whether `operator` already withdrew its rewards for the group.
    fn rewards_withdrawn(&self, operator: &Address, group_index: u64) -> Result<bool>;
}

/// Bonded ECDSA keep factory and keep queries.
pub trait EcdsaSource: BalanceSource {
    /// All keeps, partitioned into `(active, inactive)` by index.
    fn keeps(&self) -> Result<(HashMap<u64, Address>, HashMap<u64, Address>)>;

    /// Members of a keep by slot.
    fn keep_members(&self, keep: &Address) -> Result<Vec<Address>>;

    /// ETH held by the keep on behalf of `member`, in wei.
    fn keep_member_balance(&self, keep: &Address, member: &Address) -> Result<U256>;
}

/// Transaction history queries.
pub trait TransactionSource {
    /// Hashes of transactions sent by `address`, keyed by block number,
    /// for blocks `from..=to`.
    fn outbound_transactions(
        &self,
        address: &Address,
        from: u64,
        to: u64,
    ) -> Result<BTreeMap<u64, Vec<String>>>;

    /// Gas price paid by a transaction, in wei.
    fn transaction_gas_price(&self, hash: &str) -> Result<U256>;

    /// Gas consumed by a transaction.
    fn transaction_gas_used(&self, hash: &str) -> Result<U256>;

    /// Name of the contract method a transaction called, if it is known.
    fn transaction_method(&self, hash: &str) -> Result<Option<String>>;
}
