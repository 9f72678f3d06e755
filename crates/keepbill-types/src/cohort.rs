//! Reward-bearing cohorts.
//!
//! A cohort is either a random beacon consensus group (keyed by its group
//! public key) or an ECDSA signing keep (keyed by its contract address).
//! Members are stored as a vector whose positions are the dense zero-based
//! slot indices; an operator may hold several slots in one cohort.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Address, Result, TypesError};

/// Number of public key hex digits shown in a group label.
pub const GROUP_LABEL_HEX_DIGITS: usize = 32;

/// Which kind of reward-bearing unit a cohort is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortKind {
    /// Random beacon consensus group.
    ConsensusGroup,
    /// ECDSA signing keep.
    SigningKeep,
}

/// Opaque key used to query a cohort's members and rewards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortId {
    /// Group public key bytes.
    PublicKey(Vec<u8>),
    /// Keep contract address.
    Contract(Address),
}

impl CohortId {
    /// Short human-readable label used in report summaries.
    ///
    /// Public keys are truncated to their first 32 hex digits.
    pub fn label(&self) -> String {
        match self {
            CohortId::PublicKey(key) => {
                let encoded = hex::encode(key);
                let shown = encoded.len().min(GROUP_LABEL_HEX_DIGITS);
                format!("0x{}...", &encoded[..shown])
            }
            CohortId::Contract(address) => address.to_string(),
        }
    }
}

/// One reward-bearing cohort.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    /// Ordinal assigned by the chain.
    pub index: u64,
    /// Group or keep.
    pub kind: CohortKind,
    /// Whether the cohort is still active.
    pub is_active: bool,
    /// Key used for member and reward queries.
    pub id: CohortId,
    /// Members by slot; position `i` is slot `i`.
    pub members: Vec<Address>,
}

/// Frozen, index-ordered view of every cohort for one batch run.
///
/// Cohorts are strictly ascending by index. There is no mutable access
/// after construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CohortSnapshot {
    cohorts: Vec<Cohort>,
}

impl CohortSnapshot {
    /// Build a snapshot from cohorts that are already in index order.
    ///
    /// # Errors
    ///
    /// - [`TypesError::UnorderedCohorts`] if indices are not strictly ascending
    pub fn from_ordered(cohorts: Vec<Cohort>) -> Result<Self> {
        for window in cohorts.windows(2) {
            if window[1].index <= window[0].index {
                return Err(TypesError::UnorderedCohorts {
                    previous: window[0].index,
                    next: window[1].index,
                });
            }
        }
        Ok(Self { cohorts })
    }

    /// Build a snapshot from an index-keyed map, sorting by index.
    pub fn from_indexed(cohorts: HashMap<u64, Cohort>) -> Self {
        let mut cohorts: Vec<(u64, Cohort)> = cohorts.into_iter().collect();
        cohorts.sort_by_key(|(index, _)| *index);
        Self {
            cohorts: cohorts.into_iter().map(|(_, cohort)| cohort).collect(),
        }
    }

    /// Iterate cohorts in ascending index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Cohort> {
        self.cohorts.iter()
    }

    /// All cohorts in ascending index order.
    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    /// Number of cohorts.
    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    /// Whether the snapshot holds no cohorts.
    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    /// Number of active cohorts.
    pub fn active_count(&self) -> usize {
        self.cohorts.iter().filter(|c| c.is_active).count()
    }
}

impl<'a> IntoIterator for &'a CohortSnapshot {
    type Item = &'a Cohort;
    type IntoIter = std::slice::Iter<'a, Cohort>;

    fn into_iter(self) -> Self::IntoIter {
        self.cohorts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keep(index: u64, is_active: bool) -> Cohort {
        Cohort {
            index,
            kind: CohortKind::SigningKeep,
            is_active,
            id: CohortId::Contract(
                Address::parse(&format!("0x{:040x}", index + 1)).expect("address"),
            ),
            members: Vec::new(),
        }
    }

    #[test]
    fn test_group_label_truncates_public_key() {
        let id = CohortId::PublicKey(vec![0xab; 64]);
        let label = id.label();
        assert_eq!(label, format!("0x{}...", "ab".repeat(16)));
    }

    #[test]
    fn test_short_public_key_label() {
        let id = CohortId::PublicKey(vec![0x01, 0x02]);
        assert_eq!(id.label(), "0x0102...");
    }

    #[test]
    fn test_keep_label_is_lowercase_address() {
        let address = Address::parse("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").expect("address");
        assert_eq!(
            CohortId::Contract(address).label(),
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        );
    }

    #[test]
    fn test_from_ordered_accepts_gaps() {
        let snapshot = CohortSnapshot::from_ordered(vec![keep(0, false), keep(2, true)])
            .expect("ordered");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.active_count(), 1);
    }

    #[test]
    fn test_from_ordered_rejects_out_of_order() {
        let err = CohortSnapshot::from_ordered(vec![keep(3, true), keep(1, true)]).unwrap_err();
        assert!(matches!(err, TypesError::UnorderedCohorts { previous: 3, next: 1 }));
    }

    #[test]
    fn test_from_ordered_rejects_duplicates() {
        assert!(CohortSnapshot::from_ordered(vec![keep(1, true), keep(1, false)]).is_err());
    }

    #[test]
    fn test_from_indexed_sorts() {
        let mut map = HashMap::new();
        for index in [7u64, 2, 9, 0, 4] {
            map.insert(index, keep(index, index % 2 == 0));
        }

        let snapshot = CohortSnapshot::from_indexed(map);
        let indices: Vec<u64> = snapshot.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 2, 4, 7, 9]);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = CohortSnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.active_count(), 0);
    }
}
