//! Report assembly.
//!
//! A generator owns the cohort snapshot of one batch run and produces one
//! report per customer from it. Every report field is fixed-precision text
//! so exported reports compare byte for byte.
//!
//! ## Rendered precision
//!
//! | Field | Fractional digits |
//! |---|---|
//! | Stake | 0 |
//! | Balances, rewards, shares, costs | 6 |
//! | Gas prices, fees | 9 |

use bigdecimal::BigDecimal;
use keepbill_chain::{BalanceSource, BeaconSource, EcdsaSource, TransactionSource};
use keepbill_types::units::{format_fixed, wei_to_eth, COIN_PLACES, STAKE_PLACES};
use keepbill_types::{Address, CohortSnapshot, Customer};
use serde::Serialize;

use crate::anomaly::AnomalySink;
use crate::cohort::{build_group_snapshot, build_keep_snapshot, CountStrategy};
use crate::membership::{count_slots, summarize};
use crate::rewards::{accumulate, GroupRewards, KeepRewards};
use crate::split::{CoinShares, Split, SplitCalculator};
use crate::transactions::{outbound_ledger, BlockRange, TransactionLedger};
use crate::{FetchContext, Result};

/// Summary value for an active cohort without the operator.
pub const NO_MEMBERS: &str = "No members";

/// Fields shared by both report flavors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Customer display name.
    pub customer_name: String,
    /// Billed operator address.
    pub operator: String,
    /// Beneficiary address of the operator.
    pub beneficiary: String,
    /// Customer share in whole percent.
    pub customer_share_percentage: u8,
    /// Operator stake in whole KEEP.
    pub stake: String,
    /// Operator ETH balance.
    pub operator_balance: String,
    /// Beneficiary ETH balance.
    pub beneficiary_eth_balance: String,
    /// Beneficiary KEEP balance.
    pub beneficiary_keep_balance: String,
    /// Unwithdrawn ETH rewards over the snapshot.
    pub accumulated_rewards: String,
    /// Customer part of the ETH rewards plus the beneficiary balance.
    pub customer_eth_share: String,
    /// Provider part of the ETH rewards.
    pub provider_eth_share: String,
    /// Customer part of the beneficiary KEEP balance.
    pub customer_keep_share: String,
    /// Provider part of the beneficiary KEEP balance.
    pub provider_keep_share: String,
}

/// One line of the active groups summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SummaryLine {
    /// Shortened group public key.
    pub cohort: String,
    /// Comma-separated slot indices, or [`NO_MEMBERS`].
    pub members: String,
}

/// Random beacon report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BeaconReport {
    /// Shared report fields.
    #[serde(flatten)]
    pub base: Report,
    /// Groups in the snapshot.
    pub groups_count: usize,
    /// Active groups in the snapshot.
    pub active_groups_count: usize,
    /// Operator slots held in active groups.
    pub active_groups_members_count: u64,
    /// Operator slots held in expired groups.
    pub inactive_groups_members_count: u64,
    /// One line per active group.
    pub active_groups_summary: Vec<SummaryLine>,
    /// Present when a block range was requested.
    pub transactions: Option<TransactionLedger>,
}

/// ECDSA keeps report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EcdsaReport {
    /// Shared report fields.
    #[serde(flatten)]
    pub base: Report,
    /// Beneficiary TBTC balance.
    pub beneficiary_tbtc_balance: String,
    /// Customer part of the beneficiary TBTC balance.
    pub customer_tbtc_share: String,
    /// Provider part of the beneficiary TBTC balance.
    pub provider_tbtc_share: String,
    /// Initial minus current operator ETH balance.
    pub operational_costs: String,
    /// Keeps in the snapshot.
    pub keeps_count: usize,
    /// Active keeps in the snapshot.
    pub active_keeps_count: usize,
    /// Operator slots held in active keeps.
    pub active_keeps_members_count: u64,
    /// Operator slots held in closed keeps.
    pub inactive_keeps_members_count: u64,
    /// One keep address per active slot held.
    pub active_keeps_summary: Vec<String>,
}

fn coin(value: &BigDecimal) -> String {
    format_fixed(value, COIN_PLACES)
}

/// Live balances of a customer, in whole units.
struct Balances {
    stake: BigDecimal,
    operator_eth: BigDecimal,
    beneficiary_eth: BigDecimal,
    beneficiary_keep: BigDecimal,
}

impl Balances {
    fn fetch<S: BalanceSource + ?Sized>(source: &S, customer: &Customer) -> Result<Self> {
        let operator = &customer.operator;
        let beneficiary = &customer.beneficiary;
        Ok(Self {
            stake: wei_to_eth(source.stake(operator).fetching(|| format!("stake of {operator}"))?),
            operator_eth: wei_to_eth(
                source
                    .eth_balance(operator)
                    .fetching(|| format!("ETH balance of {operator}"))?,
            ),
            beneficiary_eth: wei_to_eth(
                source
                    .eth_balance(beneficiary)
                    .fetching(|| format!("ETH balance of {beneficiary}"))?,
            ),
            beneficiary_keep: wei_to_eth(
                source
                    .keep_balance(beneficiary)
                    .fetching(|| format!("KEEP balance of {beneficiary}"))?,
            ),
        })
    }

    fn report(
        &self,
        customer: &Customer,
        accumulated: &BigDecimal,
        eth: &CoinShares,
        keep: &Split,
    ) -> Report {
        Report {
            customer_name: customer.name.clone(),
            operator: customer.operator.to_string(),
            beneficiary: customer.beneficiary.to_string(),
            customer_share_percentage: customer.share_percentage.value(),
            stake: format_fixed(&self.stake, STAKE_PLACES),
            operator_balance: coin(&self.operator_eth),
            beneficiary_eth_balance: coin(&self.beneficiary_eth),
            beneficiary_keep_balance: coin(&self.beneficiary_keep),
            accumulated_rewards: coin(accumulated),
            customer_eth_share: coin(&eth.split.customer),
            provider_eth_share: coin(&eth.split.provider),
            customer_keep_share: coin(&keep.customer),
            provider_keep_share: coin(&keep.provider),
        }
    }
}

/// Random beacon report generator.
pub struct BeaconReportGenerator<'a, S: ?Sized> {
    source: &'a S,
    sink: &'a dyn AnomalySink,
    snapshot: CohortSnapshot,
}

impl<'a, S> BeaconReportGenerator<'a, S>
where
    S: BeaconSource + TransactionSource + ?Sized,
{
    /// Fetch the group snapshot shared by every report of the run.
    ///
    /// # Errors
    ///
    /// Any error of [`build_group_snapshot`].
    pub fn fetch(source: &'a S, sink: &'a dyn AnomalySink, strategy: CountStrategy) -> Result<Self> {
        let snapshot = build_group_snapshot(source, strategy)?;
        Ok(Self::with_snapshot(source, sink, snapshot))
    }

    /// Use an already built snapshot.
    pub fn with_snapshot(source: &'a S, sink: &'a dyn AnomalySink, snapshot: CohortSnapshot) -> Self {
        Self {
            source,
            sink,
            snapshot,
        }
    }

    /// The group snapshot.
    pub fn snapshot(&self) -> &CohortSnapshot {
        &self.snapshot
    }

    /// Generate the report of one customer.
    ///
    /// # Errors
    ///
    /// The first data fetch, overflow or block range error. No partial
    /// report is returned.
    pub fn generate(&self, customer: &Customer, blocks: Option<BlockRange>) -> Result<BeaconReport> {
        let operator = &customer.operator;
        let balances = Balances::fetch(self.source, customer)?;

        let accumulated = accumulate(&self.snapshot, operator, &GroupRewards::new(self.source))?;

        let transactions = blocks
            .map(|range| outbound_ledger(self.source, operator, range))
            .transpose()?;

        let calculator = SplitCalculator::new(self.sink);
        let eth = calculator.coin_shares(
            &customer.name,
            customer.share_percentage,
            &balances.beneficiary_eth,
            &accumulated,
            None,
        );
        let keep = calculator.token_shares(customer.share_percentage, &balances.beneficiary_keep);

        let summary = summarize(&self.snapshot, operator);
        let active_groups_summary = summary
            .active_cohorts
            .iter()
            .map(|c| SummaryLine {
                cohort: c.label.clone(),
                members: if c.slots.is_empty() {
                    NO_MEMBERS.to_string()
                } else {
                    c.slots
                        .iter()
                        .map(u32::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                },
            })
            .collect();

        tracing::info!(
            customer = %customer.name,
            %operator,
            accumulated = %coin(&accumulated),
            active_slots = summary.counts.active,
            "beacon report generated"
        );

        Ok(BeaconReport {
            base: balances.report(customer, &accumulated, &eth, &keep),
            groups_count: self.snapshot.len(),
            active_groups_count: self.snapshot.active_count(),
            active_groups_members_count: summary.counts.active,
            inactive_groups_members_count: summary.counts.inactive,
            active_groups_summary,
            transactions,
        })
    }
}

/// ECDSA keeps report generator.
pub struct EcdsaReportGenerator<'a, S: ?Sized> {
    source: &'a S,
    sink: &'a dyn AnomalySink,
    snapshot: CohortSnapshot,
}

impl<'a, S> EcdsaReportGenerator<'a, S>
where
    S: EcdsaSource + ?Sized,
{
    /// Fetch the keep snapshot shared by every report of the run.
    ///
    /// # Errors
    ///
    /// Any error of [`build_keep_snapshot`].
    pub fn fetch(source: &'a S, sink: &'a dyn AnomalySink) -> Result<Self> {
        let snapshot = build_keep_snapshot(source)?;
        Ok(Self::with_snapshot(source, sink, snapshot))
    }

    /// Use an already built snapshot.
    pub fn with_snapshot(source: &'a S, sink: &'a dyn AnomalySink, snapshot: CohortSnapshot) -> Self {
        Self {
            source,
            sink,
            snapshot,
        }
    }

    /// The keep snapshot.
    pub fn snapshot(&self) -> &CohortSnapshot {
        &self.snapshot
    }

    /// Generate the report of one customer.
    ///
    /// # Errors
    ///
    /// The first data fetch or overflow error. No partial report is
    /// returned.
    pub fn generate(&self, customer: &Customer) -> Result<EcdsaReport> {
        let operator = &customer.operator;
        let beneficiary = &customer.beneficiary;
        let balances = Balances::fetch(self.source, customer)?;
        let beneficiary_tbtc = wei_to_eth(
            self.source
                .tbtc_balance(beneficiary)
                .fetching(|| format!("TBTC balance of {beneficiary}"))?,
        );

        let accumulated = accumulate(&self.snapshot, operator, &KeepRewards::new(self.source))?;
        let operational_cost = &customer.initial_operator_eth_balance - &balances.operator_eth;

        let calculator = SplitCalculator::new(self.sink);
        let eth = calculator.coin_shares(
            &customer.name,
            customer.share_percentage,
            &balances.beneficiary_eth,
            &accumulated,
            Some(&operational_cost),
        );
        let keep = calculator.token_shares(customer.share_percentage, &balances.beneficiary_keep);
        let tbtc = calculator.token_shares(customer.share_percentage, &beneficiary_tbtc);

        let counts = count_slots(&self.snapshot, operator);
        let active_keeps_summary = active_keep_slots(&self.snapshot, operator);

        tracing::info!(
            customer = %customer.name,
            %operator,
            accumulated = %coin(&accumulated),
            active_slots = counts.active,
            "ecdsa report generated"
        );

        Ok(EcdsaReport {
            base: balances.report(customer, &accumulated, &eth, &keep),
            beneficiary_tbtc_balance: coin(&beneficiary_tbtc),
            customer_tbtc_share: coin(&tbtc.customer),
            provider_tbtc_share: coin(&tbtc.provider),
            operational_costs: coin(eth.operational_cost.as_ref().unwrap_or(&operational_cost)),
            keeps_count: self.snapshot.len(),
            active_keeps_count: self.snapshot.active_count(),
            active_keeps_members_count: counts.active,
            inactive_keeps_members_count: counts.inactive,
            active_keeps_summary,
        })
    }
}

fn active_keep_slots(snapshot: &CohortSnapshot, operator: &Address) -> Vec<String> {
    snapshot
        .iter()
        .filter(|keep| keep.is_active)
        .flat_map(|keep| {
            let label = keep.id.label();
            keep.members
                .iter()
                .filter(move |member| *member == operator)
                .map(move |_| label.clone())
        })
        .collect()
}
