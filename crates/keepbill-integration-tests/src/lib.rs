//! Integration test crate for keepbill.
//!
//! The library only holds fixtures shared by the tests under `tests/`,
//! which exercise whole billing runs across the workspace crates.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p keepbill-integration-tests
//! ```

use keepbill_chain::SnapshotChain;
use keepbill_types::{Address, Customer, SharePercentage};

/// Operator billed in most scenarios, checksum-cased.
pub const OPERATOR: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

/// Beneficiary of [`OPERATOR`].
pub const BENEFICIARY: &str = "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb";

/// Operator of a second customer.
pub const SECOND_OPERATOR: &str = "0x8617E340B3D01FA5F11F306F4090FD50E238070D";

/// Beneficiary of [`SECOND_OPERATOR`].
pub const SECOND_BENEFICIARY: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

/// Unrelated group member.
pub const STRANGER: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

/// Parse an address fixture.
pub fn address(text: &str) -> Address {
    Address::parse(text).expect("fixture address")
}

/// Build a customer.
pub fn customer(name: &str, operator: &str, beneficiary: &str, share: u8) -> Customer {
    Customer {
        name: name.to_string(),
        operator: address(operator),
        beneficiary: address(beneficiary),
        share_percentage: SharePercentage::new(share).expect("fixture share"),
        initial_operator_eth_balance: Default::default(),
    }
}

/// Build a chain snapshot from a JSON value.
pub fn chain(state: serde_json::Value) -> SnapshotChain {
    SnapshotChain::from_json(&state.to_string()).expect("fixture chain")
}

/// 128-byte group public key filled with `byte`, hex-encoded.
pub fn group_key(byte: u8) -> String {
    format!("0x{}", format!("{byte:02x}").repeat(128))
}
