//! Configuration file management.

use std::path::{Path, PathBuf};

use anyhow::Context;
use keepbill_billing::cohort::CountStrategy;
use keepbill_billing::transactions::BlockRange;
use serde::{Deserialize, Serialize};

/// Complete billing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Batch settings.
    #[serde(default)]
    pub billings: BillingsConfig,
    /// Chain data source settings.
    #[serde(default)]
    pub chain: ChainConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which report flavor a run generates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Random beacon groups.
    #[default]
    Beacon,
    /// ECDSA keeps.
    Ecdsa,
}

/// Batch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingsConfig {
    /// JSON array of customers.
    #[serde(default = "default_customers_file")]
    pub customers_file: PathBuf,
    /// Output directory, created when missing.
    #[serde(default = "default_target_directory")]
    pub target_directory: PathBuf,
    /// Report flavor.
    #[serde(default)]
    pub report_kind: ReportKind,
    /// First block of the outbound transaction ledger.
    #[serde(default)]
    pub from_block: Option<u64>,
    /// Last block of the outbound transaction ledger.
    #[serde(default)]
    pub to_block: Option<u64>,
    /// How many groups to walk: "created" | "active_range".
    #[serde(default)]
    pub group_count_strategy: CountStrategy,
}

/// Chain data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON chain-state snapshot.
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_customers_file() -> PathBuf {
    PathBuf::from("./configs/customers.json")
}

fn default_target_directory() -> PathBuf {
    PathBuf::from("./billings")
}

fn default_snapshot_file() -> PathBuf {
    PathBuf::from("./configs/chain.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BillingsConfig {
    fn default() -> Self {
        Self {
            customers_file: default_customers_file(),
            target_directory: default_target_directory(),
            report_kind: ReportKind::default(),
            from_block: None,
            to_block: None,
            group_count_strategy: CountStrategy::default(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            snapshot_file: default_snapshot_file(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl BillingConfig {
    /// Load configuration from `path`.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("could not parse config {}", path.display()))
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Block range of the transaction ledger, if one is configured.
    ///
    /// Both ends must be set together.
    pub fn block_range(&self) -> anyhow::Result<Option<BlockRange>> {
        match (self.billings.from_block, self.billings.to_block) {
            (Some(from), Some(to)) => Ok(Some(BlockRange::new(from, to)?)),
            (None, None) => Ok(None),
            _ => anyhow::bail!("from_block and to_block must be set together"),
        }
    }
}
