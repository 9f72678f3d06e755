//! Base unit conversion and fixed-precision rendering.
//!
//! Chain amounts are integers in the smallest denomination (wei for ETH,
//! and the 18-decimal base unit for KEEP and TBTC). They are summed as
//! integers and converted to a decimal exactly once, as a scale shift, so no
//! rounding error accumulates. Rounding happens only when rendering.
//!
//! ## Rendered precision
//!
//! | Value | Fractional digits |
//! |---|---|
//! | Stake | [`STAKE_PLACES`] = 0 |
//! | Coin/token balances and shares | [`COIN_PLACES`] = 6 |
//! | Gas prices and fees | [`GAS_PLACES`] = 9 |

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::{BigInt, Sign};
use primitive_types::U256;

/// Decimals of ETH and of the 18-decimal ERC-20 tokens.
pub const ETH_DECIMALS: i64 = 18;

/// Decimals between wei and gwei.
pub const GWEI_DECIMALS: i64 = 9;

/// Rendered fractional digits for stake amounts.
pub const STAKE_PLACES: u32 = 0;

/// Rendered fractional digits for coin and token amounts.
pub const COIN_PLACES: u32 = 6;

/// Rendered fractional digits for gas-fee style values.
pub const GAS_PLACES: u32 = 9;

/// Convert an integer base-unit amount to a decimal with `decimals` places.
pub fn to_decimal(amount: U256, decimals: i64) -> BigDecimal {
    let mut bytes = [0u8; 32];
    amount.to_big_endian(&mut bytes);
    BigDecimal::new(BigInt::from_bytes_be(Sign::Plus, &bytes), decimals)
}

/// Convert wei (or an 18-decimal token base unit) to whole units.
pub fn wei_to_eth(amount: U256) -> BigDecimal {
    to_decimal(amount, ETH_DECIMALS)
}

/// Convert wei to gwei.
pub fn wei_to_gwei(amount: U256) -> BigDecimal {
    to_decimal(amount, GWEI_DECIMALS)
}

/// Render `value` with exactly `places` fractional digits.
///
/// Rounds half to even at the last rendered digit. Never uses exponent
/// notation.
pub fn format_fixed(value: &BigDecimal, places: u32) -> String {
    let rounded = value.with_scale_round(i64::from(places), RoundingMode::HalfEven);
    let (digits, _) = rounded.as_bigint_and_exponent();

    let negative = digits.sign() == Sign::Minus;
    let mut text = digits.magnitude().to_string();
    let places = places as usize;
    if text.len() <= places {
        text = format!("{}{}", "0".repeat(places + 1 - text.len()), text);
    }

    let (integer, fraction) = text.split_at(text.len() - places);
    let mut rendered = String::with_capacity(text.len() + 2);
    if negative {
        rendered.push('-');
    }
    rendered.push_str(integer);
    if places > 0 {
        rendered.push('.');
        rendered.push_str(fraction);
    }
    rendered
}
