//! Slot counting for one operator across a cohort snapshot.
//!
//! Counting is by slot, not by distinct address: an operator holding two
//! seats in one cohort is counted twice. Address comparison relies on
//! [`Address`] normalization, so any casing of the operator address gives
//! the same counts.

use keepbill_types::{Address, Cohort, CohortSnapshot};
use serde::Serialize;

/// Active and inactive slot counts for one operator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SlotCounts {
    /// Slots held in active cohorts.
    pub active: u64,
    /// Slots held in inactive cohorts.
    pub inactive: u64,
}

impl SlotCounts {
    /// Slots held across all cohorts.
    pub fn total(&self) -> u64 {
        self.active + self.inactive
    }
}

/// Slot indices held by `operator` in `cohort`, ascending.
pub fn cohort_slots(cohort: &Cohort, operator: &Address) -> Vec<u32> {
    cohort
        .members
        .iter()
        .enumerate()
        .filter(|(_, member)| *member == operator)
        .map(|(slot, _)| slot as u32)
        .collect()
}

/// Count the slots `operator` holds, split by cohort activity.
pub fn count_slots(snapshot: &CohortSnapshot, operator: &Address) -> SlotCounts {
    let mut counts = SlotCounts::default();
    for cohort in snapshot {
        let held = cohort.members.iter().filter(|m| *m == operator).count() as u64;
        if cohort.is_active {
            counts.active += held;
        } else {
            counts.inactive += held;
        }
    }
    counts
}

/// Slots held in one active cohort.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CohortSummary {
    /// Cohort index.
    pub index: u64,
    /// Display label of the cohort identifier.
    pub label: String,
    /// Slot indices held by the operator, ascending. Empty when none.
    pub slots: Vec<u32>,
}

/// Slot counts plus the per-cohort breakdown of active cohorts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MembershipSummary {
    /// Active/inactive totals.
    pub counts: SlotCounts,
    /// Every active cohort in index order, including those without the
    /// operator.
    pub active_cohorts: Vec<CohortSummary>,
}

/// Summarize the membership of `operator` for presentation.
pub fn summarize(snapshot: &CohortSnapshot, operator: &Address) -> MembershipSummary {
    let active_cohorts = snapshot
        .iter()
        .filter(|c| c.is_active)
        .map(|c| CohortSummary {
            index: c.index,
            label: c.id.label(),
            slots: cohort_slots(c, operator),
        })
        .collect();

    MembershipSummary {
        counts: count_slots(snapshot, operator),
        active_cohorts,
    }
}
