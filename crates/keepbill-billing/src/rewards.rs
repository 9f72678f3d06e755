//! Unclaimed reward accumulation.
//!
//! Every cohort is checked for a withdrawal by the operator; cohorts not
//! withdrawn contribute `member_reward * slots` for per-slot rewards, or the
//! member reward once for per-member balances. The sum is kept in the
//! integer base unit with checked arithmetic and converted to ETH once,
//! after the last cohort.

use bigdecimal::BigDecimal;
use keepbill_chain::{BeaconSource, ChainError, EcdsaSource};
use keepbill_types::units::wei_to_eth;
use keepbill_types::{Address, Cohort, CohortId, CohortSnapshot};
use primitive_types::U256;

use crate::membership::cohort_slots;
use crate::{BillingError, FetchContext, Result};

/// What one member reward amount pays for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardBasis {
    /// Paid once per slot held.
    PerSlot,
    /// Already the whole balance of the member, whatever its slot count.
    PerMember,
}

/// Per-cohort reward queries for one cohort kind.
pub trait RewardSource {
    /// How [`RewardSource::member_reward`] relates to slots.
    fn basis(&self) -> RewardBasis {
        RewardBasis::PerSlot
    }

    /// Whether `operator` already withdrew its rewards from `cohort`.
    fn rewards_withdrawn(&self, operator: &Address, cohort: &Cohort) -> keepbill_chain::Result<bool>;

    /// Reward owed to `member` for one slot of `cohort`, in wei.
    fn member_reward(&self, cohort: &Cohort, member: &Address) -> keepbill_chain::Result<U256>;
}

/// Random beacon group rewards.
///
/// Rewards are per group member; withdrawals are tracked per operator and
/// group index.
pub struct GroupRewards<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: BeaconSource + ?Sized> GroupRewards<'a, S> {
    /// Wrap a beacon data source.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }
}

impl<S: BeaconSource + ?Sized> RewardSource for GroupRewards<'_, S> {
    fn rewards_withdrawn(&self, operator: &Address, cohort: &Cohort) -> keepbill_chain::Result<bool> {
        self.source.rewards_withdrawn(operator, cohort.index)
    }

    fn member_reward(&self, cohort: &Cohort, _member: &Address) -> keepbill_chain::Result<U256> {
        match &cohort.id {
            CohortId::PublicKey(key) => self.source.group_member_rewards(key),
            CohortId::Contract(address) => Err(ChainError::NotFound(format!(
                "keep {address} is not a beacon group"
            ))),
        }
    }
}

/// ECDSA keep rewards.
///
/// The reward is the member balance held by the keep, counted once per
/// keep however many slots the operator holds. Keeps have no
/// withdrawal flag: a withdrawn balance reads as zero.
pub struct KeepRewards<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: EcdsaSource + ?Sized> KeepRewards<'a, S> {
    /// Wrap an ECDSA data source.
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }
}

impl<S: EcdsaSource + ?Sized> RewardSource for KeepRewards<'_, S> {
    fn basis(&self) -> RewardBasis {
        RewardBasis::PerMember
    }

    fn rewards_withdrawn(&self, _operator: &Address, _cohort: &Cohort) -> keepbill_chain::Result<bool> {
        Ok(false)
    }

    fn member_reward(&self, cohort: &Cohort, member: &Address) -> keepbill_chain::Result<U256> {
        match &cohort.id {
            CohortId::Contract(keep) => self.source.keep_member_balance(keep, member),
            CohortId::PublicKey(_) => Err(ChainError::NotFound(format!(
                "group with index {} is not a keep",
                cohort.index
            ))),
        }
    }
}

/// Sum of unclaimed rewards for `operator`, in wei.
///
/// # Errors
///
/// - [`BillingError::DataFetch`] on the first failed query; no partial sum
/// - [`BillingError::Overflow`] if the sum exceeds 256 bits
pub fn accumulate_base_units<R>(
    snapshot: &CohortSnapshot,
    operator: &Address,
    rewards: &R,
) -> Result<U256>
where
    R: RewardSource + ?Sized,
{
    let mut total = U256::zero();

    for cohort in snapshot {
        let withdrawn = rewards
            .rewards_withdrawn(operator, cohort)
            .fetching(|| format!("withdrawal status of cohort with index {}", cohort.index))?;
        if withdrawn {
            tracing::debug!(index = cohort.index, %operator, "rewards already withdrawn");
            continue;
        }

        let slots = cohort_slots(cohort, operator).len();
        if slots == 0 {
            continue;
        }

        let reward = rewards
            .member_reward(cohort, operator)
            .fetching(|| format!("member rewards of cohort with index {}", cohort.index))?;

        let multiplier = match rewards.basis() {
            RewardBasis::PerSlot => slots,
            RewardBasis::PerMember => 1,
        };
        let contribution = reward.checked_mul(U256::from(multiplier)).ok_or_else(|| {
            BillingError::Overflow(format!(
                "reward {reward} times {multiplier} in cohort with index {}",
                cohort.index
            ))
        })?;
        total = total.checked_add(contribution).ok_or_else(|| {
            BillingError::Overflow(format!(
                "accumulated rewards at cohort with index {}",
                cohort.index
            ))
        })?;
    }

    Ok(total)
}

/// Sum of unclaimed rewards for `operator`, in ETH.
///
/// # Errors
///
/// Same as [`accumulate_base_units`].
pub fn accumulate<R>(snapshot: &CohortSnapshot, operator: &Address, rewards: &R) -> Result<BigDecimal>
where
    R: RewardSource + ?Sized,
{
    let wei = accumulate_base_units(snapshot, operator, rewards)?;
    tracing::debug!(%operator, %wei, "rewards accumulated");
    Ok(wei_to_eth(wei))
}
