//! Cohort snapshot construction.
//!
//! The snapshot is fetched once per batch run, visiting cohort indices in
//! ascending order. The first failed query aborts the build; a partial
//! snapshot is never returned.
//!
//! ## Group count strategies
//!
//! The beacon operator contract reports both a "first active group index"
//! (the number of expired groups) and an "active groups count" that leaves
//! out terminated groups. Walking `0..first_active + active_count` misses
//! the last groups whenever a group in the middle was terminated, so the
//! created-groups count is preferred. The legacy walk is kept for contract
//! deployments without the created-groups query.

use std::collections::BTreeMap;

use keepbill_chain::{BeaconSource, EcdsaSource};
use keepbill_types::{Address, Cohort, CohortId, CohortKind, CohortSnapshot};
use serde::{Deserialize, Serialize};

use crate::{BillingError, FetchContext, Result};

/// How the number of groups to walk is obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStrategy {
    /// Walk every group ever created.
    #[default]
    Created,
    /// Walk `first_active_index + active_group_count` groups.
    ActiveRange,
}

/// Build the snapshot of random beacon groups.
///
/// A group is active when its index is at or past the first active index.
///
/// # Errors
///
/// - [`BillingError::DataFetch`] on the first failed query
/// - [`BillingError::InconsistentCohorts`] if the legacy range overflows
pub fn build_group_snapshot<S>(source: &S, strategy: CountStrategy) -> Result<CohortSnapshot>
where
    S: BeaconSource + ?Sized,
{
    let first_active_index = source
        .first_active_group_index()
        .fetching(|| "first active group index".to_string())?;

    let count = match strategy {
        CountStrategy::Created => source
            .created_group_count()
            .fetching(|| "created groups count".to_string())?,
        CountStrategy::ActiveRange => {
            let active_count = source
                .active_group_count()
                .fetching(|| "active groups count".to_string())?;
            tracing::warn!(
                first_active_index,
                active_count,
                "walking groups by active range; terminated groups shift the range"
            );
            first_active_index.checked_add(active_count).ok_or_else(|| {
                BillingError::InconsistentCohorts(format!(
                    "first active index {first_active_index} plus active count {active_count} overflows"
                ))
            })?
        }
    };

    let mut cohorts = Vec::new();
    for index in 0..count {
        let public_key = source
            .group_public_key(index)
            .fetching(|| format!("public key of group with index {index}"))?;

        let members = source
            .group_members(&public_key)
            .fetching(|| format!("members of group with index {index}"))?;

        tracing::debug!(index, members = members.len(), "group fetched");

        cohorts.push(Cohort {
            index,
            kind: CohortKind::ConsensusGroup,
            is_active: index >= first_active_index,
            id: CohortId::PublicKey(public_key),
            members,
        });
    }

    let snapshot = CohortSnapshot::from_ordered(cohorts)
        .map_err(|e| BillingError::InconsistentCohorts(e.to_string()))?;

    tracing::info!(
        groups = snapshot.len(),
        active = snapshot.active_count(),
        first_active_index,
        "group snapshot built"
    );

    Ok(snapshot)
}

/// Build the snapshot of ECDSA keeps.
///
/// Activity comes from the active/inactive partition reported by the data
/// source. Both index-keyed sets are merged and walked in ascending index
/// order.
///
/// # Errors
///
/// - [`BillingError::DataFetch`] on the first failed query
/// - [`BillingError::InconsistentCohorts`] if an index is reported both
///   active and inactive
pub fn build_keep_snapshot<S>(source: &S) -> Result<CohortSnapshot>
where
    S: EcdsaSource + ?Sized,
{
    let (active, inactive) = source.keeps().fetching(|| "keeps".to_string())?;

    let mut indexed: BTreeMap<u64, (Address, bool)> = BTreeMap::new();
    for (index, address) in active {
        indexed.insert(index, (address, true));
    }
    for (index, address) in inactive {
        if let Some((other, _)) = indexed.insert(index, (address.clone(), false)) {
            return Err(BillingError::InconsistentCohorts(format!(
                "keep index {index} reported as active {other} and inactive {address}"
            )));
        }
    }

    let mut cohorts = Vec::with_capacity(indexed.len());
    for (index, (address, is_active)) in indexed {
        let members = source
            .keep_members(&address)
            .fetching(|| format!("members of keep {address} with index {index}"))?;

        tracing::debug!(index, %address, is_active, members = members.len(), "keep fetched");

        cohorts.push(Cohort {
            index,
            kind: CohortKind::SigningKeep,
            is_active,
            id: CohortId::Contract(address),
            members,
        });
    }

    let snapshot = CohortSnapshot::from_ordered(cohorts)
        .map_err(|e| BillingError::InconsistentCohorts(e.to_string()))?;

    tracing::info!(
        keeps = snapshot.len(),
        active = snapshot.active_count(),
        "keep snapshot built"
    );

    Ok(snapshot)
}
