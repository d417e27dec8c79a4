// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion between human-readable token amounts and base units.

use alloy::primitives::U256;

use super::client::ChainClientError;

/// Decimal places shown in balance displays.
const DISPLAY_DECIMALS: usize = 6;

/// Largest `decimals` whose scale factor `10^decimals` fits in a `U256`.
pub const MAX_TOKEN_DECIMALS: u8 = 77;

/// Parse a human-readable amount to base units.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (18 for ETH, 6 for USDC)
///
/// # Returns
/// * `Ok(U256)` - Amount in smallest unit
/// * `Err` - If parsing fails or the amount has too many decimal places
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ChainClientError> {
    if decimals > MAX_TOKEN_DECIMALS {
        return Err(ChainClientError::InvalidAmount(format!(
            "Token decimals {decimals} exceed {MAX_TOKEN_DECIMALS}"
        )));
    }
    let amount = amount.trim();
    let parts: Vec<&str> = amount.split('.').collect();

    if amount.is_empty() || parts.len() > 2 {
        return Err(ChainClientError::InvalidAmount(format!(
            "Invalid amount format: `{amount}`"
        )));
    }

    let whole_str = if parts[0].is_empty() { "0" } else { parts[0] };
    if !whole_str.chars().all(|c| c.is_ascii_digit()) {
        return Err(ChainClientError::InvalidAmount(format!(
            "Invalid whole number: `{whole_str}`"
        )));
    }
    let whole = U256::from_str_radix(whole_str, 10)
        .map_err(|e| ChainClientError::InvalidAmount(format!("Invalid whole number: {e}")))?;

    let fraction = match parts.get(1) {
        Some(dec_str) if !dec_str.is_empty() => {
            if dec_str.len() > decimals as usize {
                return Err(ChainClientError::InvalidAmount(format!(
                    "Too many decimal places (max {})",
                    decimals
                )));
            }
            if !dec_str.chars().all(|c| c.is_ascii_digit()) {
                return Err(ChainClientError::InvalidAmount(format!(
                    "Invalid decimal: `{dec_str}`"
                )));
            }
            // Pad with zeros to match decimals
            let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
            U256::from_str_radix(&padded, 10)
                .map_err(|e| ChainClientError::InvalidAmount(format!("Invalid decimal: {e}")))?
        }
        _ => U256::ZERO,
    };

    let multiplier = U256::from(10u64).pow(U256::from(decimals));
    whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| ChainClientError::InvalidAmount("Amount overflow".to_string()))
}

/// Format base units to a human-readable amount with full precision.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    format_with_limit(amount, decimals, usize::MAX)
}

/// Format base units for display, truncated to six decimal places.
pub fn format_balance(amount: U256, decimals: u8) -> String {
    format_with_limit(amount, decimals, DISPLAY_DECIMALS)
}

fn format_with_limit(amount: U256, decimals: u8, max_fraction: usize) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        return whole.to_string();
    }

    let digits = remainder.to_string();
    let decimal_str = format!(
        "{}{}",
        "0".repeat((decimals as usize).saturating_sub(digits.len())),
        digits
    );
    let truncated = &decimal_str[..decimal_str.len().min(max_fraction)];
    let trimmed = truncated.trim_end_matches('0');
    if trimmed.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_whole() {
        let result = parse_amount("1", 18).unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_decimal() {
        let result = parse_amount("1.5", 18).unwrap();
        assert_eq!(result, U256::from(1_500_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_usdc() {
        // 1.5 USDC = 1_500_000 (6 decimals)
        assert_eq!(parse_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_amount("0.01", 6).unwrap(), U256::from(10_000u64));
        assert_eq!(parse_amount(".5", 6).unwrap(), U256::from(500_000u64));
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert!(parse_amount("", 6).is_err());
        assert!(parse_amount("1.2.3", 6).is_err());
        assert!(parse_amount("abc", 6).is_err());
        assert!(parse_amount("-1", 6).is_err());
        assert!(parse_amount("1.1234567", 6).is_err());
    }

    #[test]
    fn test_parse_amount_beyond_u128() {
        let huge = "1000000000000000000000000000000";
        let expected = U256::from_str_radix(huge, 10).unwrap() * U256::from(1_000_000u64);
        assert_eq!(parse_amount(huge, 6).unwrap(), expected);
    }

    #[test]
    fn test_parse_amount_rejects_unrepresentable_decimals() {
        assert_eq!(
            parse_amount("1", MAX_TOKEN_DECIMALS).unwrap(),
            U256::from(10u64).pow(U256::from(MAX_TOKEN_DECIMALS))
        );
        assert!(matches!(
            parse_amount("1", 80),
            Err(ChainClientError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_format_amount() {
        let one_eth = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(format_amount(one_eth, 18), "1");

        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_amount(one_and_half, 18), "1.5");

        let precise = U256::from(1_234_567_890_000_000_000u64);
        assert_eq!(format_amount(precise, 18), "1.23456789");
    }

    #[test]
    fn test_format_balance_truncates() {
        // 1.23456789 ETH (truncated to 6 decimals)
        let complex = U256::from(1_234_567_890_000_000_000u64);
        assert_eq!(format_balance(complex, 18), "1.234567");

        assert_eq!(format_balance(U256::ZERO, 18), "0");
        assert_eq!(format_balance(U256::from(1_000_000u64), 6), "1");
        // Below display precision
        assert_eq!(format_balance(U256::from(1u64), 18), "0");
    }
}
