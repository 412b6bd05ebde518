//! Gold amount parsing and formatting.
//!
//! Players write amounts the way the game displays them: `250k`, `2.5m`,
//! `1b`. Suffixes are case-insensitive; a fractional prefix is truncated
//! toward zero once scaled.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::types::{Capital, TraderError};

const THOUSAND: Capital = 1_000;
const MILLION: Capital = 1_000_000;
const BILLION: Capital = 1_000_000_000;

/// Parse a user-supplied gp amount.
///
/// Accepts plain integers (`"1500"`, `"1,500"`) or a number followed by
/// `k`, `m` or `b`. Everything else, including the empty string and a
/// bare suffix, is `InvalidCapitalInput`.
pub fn parse_gold_amount(input: &str) -> Result<Capital, TraderError> {
    let invalid = || TraderError::InvalidCapitalInput(input.to_string());

    let cleaned: String = input
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '_')
        .collect::<String>()
        .to_lowercase();

    let Some(last) = cleaned.chars().last() else {
        return Err(invalid());
    };

    let multiplier = match last {
        'k' => THOUSAND,
        'm' => MILLION,
        'b' => BILLION,
        _ => return cleaned.parse::<Capital>().map_err(|_| invalid()),
    };

    let prefix = &cleaned[..cleaned.len() - 1];
    let digits = prefix.chars().filter(char::is_ascii_digit).count();
    let dots = prefix.chars().filter(|c| *c == '.').count();
    if digits == 0 || dots > 1 || digits + dots != prefix.len() {
        // Rejects signs, exponents and anything else that is not a plain decimal.
        return Err(invalid());
    }

    // Exact decimal: "8.2m" must not truncate to 8,199,999.
    let normalized = if prefix.starts_with('.') {
        format!("0{prefix}")
    } else {
        prefix.trim_end_matches('.').to_string()
    };
    let number: Decimal = normalized.parse().map_err(|_| invalid())?;

    number
        .checked_mul(Decimal::from(multiplier))
        .map(|scaled| scaled.trunc())
        .and_then(|scaled| scaled.to_u64())
        .ok_or_else(invalid)
}

/// Render an amount with thousands separators, e.g. `2,500,000`.
pub fn format_gold(amount: Capital) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
