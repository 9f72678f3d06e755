//! Account addresses.
//!
//! Addresses arrive from the chain in EIP-55 mixed-case checksum form and
//! from customer files in whatever casing the operator typed. They are
//! normalized to lowercase at parse time so that equality, ordering and
//! hashing are case-insensitive everywhere downstream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, TypesError};

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// A normalized (lowercase, `0x`-prefixed) account address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse an address in any letter casing.
    ///
    /// # Errors
    ///
    /// - [`TypesError::InvalidAddress`] if the text is not `0x` followed by
    ///   40 hex digits
    pub fn parse(text: &str) -> Result<Self> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidAddress(text.to_string()))?;

        let bytes =
            hex::decode(digits).map_err(|_| TypesError::InvalidAddress(text.to_string()))?;
        if bytes.len() != ADDRESS_LEN {
            return Err(TypesError::InvalidAddress(text.to_string()));
        }

        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }

    /// The lowercase textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against unparsed text.
    pub fn matches(&self, text: &str) -> bool {
        self.0.eq_ignore_ascii_case(text)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypesError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
