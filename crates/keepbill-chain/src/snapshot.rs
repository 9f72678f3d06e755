//! JSON chain-state snapshot.
//!
//! [`SnapshotChain`] answers every data source query from a frozen JSON
//! document describing balances, beacon groups, ECDSA keeps and outbound
//! transactions. It stands in for a live node client in batch runs that
//! bill against an exported chain state, and doubles as the test fixture.
//!
//! Amounts are decimal strings or JSON integers of any size, in base
//! units. Group public keys are `0x`-prefixed hex. Accounts missing from
//! `balances` report zero, as a node would.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use keepbill_types::Address;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::source::{BalanceSource, BeaconSource, EcdsaSource, TransactionSource};
use crate::{ChainError, Result};

/// An integer base-unit amount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "String")]
pub struct Amount(pub U256);

impl TryFrom<serde_json::Value> for Amount {
    type Error = String;

    fn try_from(raw: serde_json::Value) -> std::result::Result<Self, Self::Error> {
        // Numbers keep their literal text, so integers beyond u64 parse too.
        let text = match raw {
            serde_json::Value::Number(number) => number.to_string(),
            serde_json::Value::String(text) => text,
            other => return Err(format!("invalid amount {other}")),
        };
        U256::from_dec_str(&text)
            .map(Amount)
            .map_err(|e| format!("invalid amount {text:?}: {e:?}"))
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.0.to_string()
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(U256::from(value))
    }
}

/// Balances of one account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalances {
    /// Wei.
    #[serde(default)]
    pub eth: Amount,
    /// KEEP base units.
    #[serde(default)]
    pub keep: Amount,
    /// TBTC base units.
    #[serde(default)]
    pub tbtc: Amount,
    /// Staked KEEP base units.
    #[serde(default)]
    pub stake: Amount,
}

/// One random beacon group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// `0x`-prefixed hex public key.
    pub public_key: String,
    /// Members by slot.
    #[serde(default)]
    pub members: Vec<Address>,
    /// Per-slot reward in wei.
    #[serde(default)]
    pub member_rewards: Amount,
    /// Operators that already withdrew their rewards for this group.
    #[serde(default)]
    pub withdrawn: Vec<Address>,
}

/// Random beacon operator contract state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconState {
    /// Number of expired groups.
    #[serde(default)]
    pub first_active_group_index: u64,
    /// Reported active count. Defaults to every non-expired group.
    #[serde(default)]
    pub active_group_count: Option<u64>,
    /// Groups in creation order; position is the group index.
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

/// One bonded ECDSA keep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeepRecord {
    /// Factory index.
    pub index: u64,
    /// Keep contract address.
    pub address: Address,
    /// Whether the keep is active.
    #[serde(default)]
    pub active: bool,
    /// Members by slot.
    #[serde(default)]
    pub members: Vec<Address>,
    /// ETH held for each member, in wei.
    #[serde(default)]
    pub member_balances: HashMap<Address, Amount>,
}

/// Bonded ECDSA keep factory state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcdsaState {
    /// Keeps in any order.
    #[serde(default)]
    pub keeps: Vec<KeepRecord>,
}

/// One mined transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Block number.
    pub block: u64,
    /// Transaction hash.
    pub hash: String,
    /// Sender.
    pub from: Address,
    /// Gas price in wei.
    pub gas_price: Amount,
    /// Gas consumed.
    pub gas_used: Amount,
    /// Called contract method, when known.
    #[serde(default)]
    pub method: Option<String>,
}

/// Complete chain snapshot document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainState {
    /// Account balances.
    #[serde(default)]
    pub balances: HashMap<Address, AccountBalances>,
    /// Random beacon state.
    #[serde(default)]
    pub beacon: BeaconState,
    /// ECDSA keep state.
    #[serde(default)]
    pub ecdsa: EcdsaState,
    /// Mined transactions.
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,
}

/// Data source answering from a [`ChainState`].
#[derive(Clone, Debug)]
pub struct SnapshotChain {
    state: ChainState,
    group_keys: Vec<Vec<u8>>,
}

impl SnapshotChain {
    /// Wrap a chain state.
    ///
    /// # Errors
    ///
    /// - [`ChainError::InvalidSnapshot`] if a group public key is not valid
    ///   hex or a keep index appears twice
    pub fn new(state: ChainState) -> Result<Self> {
        let group_keys = state
            .beacon
            .groups
            .iter()
            .map(|group| decode_public_key(&group.public_key))
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashMap::new();
        for keep in &state.ecdsa.keeps {
            if let Some(previous) = seen.insert(keep.index, &keep.address) {
                return Err(ChainError::InvalidSnapshot(format!(
                    "keep index {} used by both {} and {}",
                    keep.index, previous, keep.address
                )));
            }
        }

        Ok(Self { state, group_keys })
    }

    /// Decode a snapshot from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let state: ChainState = serde_json::from_str(text)?;
        Self::new(state)
    }

    /// Load a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let chain = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            groups = chain.state.beacon.groups.len(),
            keeps = chain.state.ecdsa.keeps.len(),
            "chain snapshot loaded"
        );
        Ok(chain)
    }

    /// The underlying chain state.
    pub fn state(&self) -> &ChainState {
        &self.state
    }

    fn account(&self, address: &Address) -> AccountBalances {
        self.state.balances.get(address).cloned().unwrap_or_default()
    }

    fn group(&self, public_key: &[u8]) -> Result<&GroupRecord> {
        self.group_keys
            .iter()
            .position(|key| key.as_slice() == public_key)
            .and_then(|position| self.state.beacon.groups.get(position))
            .ok_or_else(|| ChainError::NotFound(format!("group 0x{}", hex::encode(public_key))))
    }

    fn keep(&self, address: &Address) -> Result<&KeepRecord> {
        self.state
            .ecdsa
            .keeps
            .iter()
            .find(|keep| &keep.address == address)
            .ok_or_else(|| ChainError::NotFound(format!("keep {address}")))
    }

    fn transaction(&self, hash: &str) -> Result<&TransactionRecord> {
        self.state
            .transactions
            .iter()
            .find(|tx| tx.hash.eq_ignore_ascii_case(hash))
            .ok_or_else(|| ChainError::NotFound(format!("transaction {hash}")))
    }
}

fn decode_public_key(text: &str) -> Result<Vec<u8>> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits)
        .map_err(|e| ChainError::InvalidSnapshot(format!("group public key {text:?}: {e}")))
}

impl BalanceSource for SnapshotChain {
    fn eth_balance(&self, address: &Address) -> Result<U256> {
        Ok(self.account(address).eth.0)
    }

    fn keep_balance(&self, address: &Address) -> Result<U256> {
        Ok(self.account(address).keep.0)
    }

    fn tbtc_balance(&self, address: &Address) -> Result<U256> {
        Ok(self.account(address).tbtc.0)
    }

    fn stake(&self, address: &Address) -> Result<U256> {
        Ok(self.account(address).stake.0)
    }
}

impl BeaconSource for SnapshotChain {
    fn created_group_count(&self) -> Result<u64> {
        Ok(self.state.beacon.groups.len() as u64)
    }

    fn active_group_count(&self) -> Result<u64> {
        let beacon = &self.state.beacon;
        Ok(beacon.active_group_count.unwrap_or_else(|| {
            (beacon.groups.len() as u64).saturating_sub(beacon.first_active_group_index)
        }))
    }

    fn first_active_group_index(&self) -> Result<u64> {
        Ok(self.state.beacon.first_active_group_index)
    }

    fn group_public_key(&self, index: u64) -> Result<Vec<u8>> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.group_keys.get(i))
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("group with index {index}")))
    }

    fn group_members(&self, public_key: &[u8]) -> Result<Vec<Address>> {
        Ok(self.group(public_key)?.members.clone())
    }

    fn group_member_rewards(&self, public_key: &[u8]) -> Result<U256> {
        Ok(self.group(public_key)?.member_rewards.0)
    }

    fn rewards_withdrawn(&self, operator: &Address, group_index: u64) -> Result<bool> {
        let group = usize::try_from(group_index)
            .ok()
            .and_then(|i| self.state.beacon.groups.get(i))
            .ok_or_else(|| ChainError::NotFound(format!("group with index {group_index}")))?;
        Ok(group.withdrawn.contains(operator))
    }
}

impl EcdsaSource for SnapshotChain {
    fn keeps(&self) -> Result<(HashMap<u64, Address>, HashMap<u64, Address>)> {
        let mut active = HashMap::new();
        let mut inactive = HashMap::new();
        for keep in &self.state.ecdsa.keeps {
            if keep.active {
                active.insert(keep.index, keep.address.clone());
            } else {
                inactive.insert(keep.index, keep.address.clone());
            }
        }
        Ok((active, inactive))
    }

    fn keep_members(&self, keep: &Address) -> Result<Vec<Address>> {
        Ok(self.keep(keep)?.members.clone())
    }

    fn keep_member_balance(&self, keep: &Address, member: &Address) -> Result<U256> {
        Ok(self
            .keep(keep)?
            .member_balances
            .get(member)
            .map(|amount| amount.0)
            .unwrap_or_default())
    }
}

impl TransactionSource for SnapshotChain {
    fn outbound_transactions(
        &self,
        address: &Address,
        from: u64,
        to: u64,
    ) -> Result<BTreeMap<u64, Vec<String>>> {
        if from > to {
            return Err(ChainError::InvalidBlockRange { from, to });
        }

        let mut blocks: BTreeMap<u64, Vec<String>> = BTreeMap::new();
        for tx in &self.state.transactions {
            if &tx.from == address && (from..=to).contains(&tx.block) {
                blocks.entry(tx.block).or_default().push(tx.hash.clone());
            }
        }
        Ok(blocks)
    }

    fn transaction_gas_price(&self, hash: &str) -> Result<U256> {
        Ok(self.transaction(hash)?.gas_price.0)
    }

    fn transaction_gas_used(&self, hash: &str) -> Result<U256> {
        Ok(self.transaction(hash)?.gas_used.0)
    }

    fn transaction_method(&self, hash: &str) -> Result<Option<String>> {
        Ok(self.transaction(hash)?.method.clone())
    }
}
