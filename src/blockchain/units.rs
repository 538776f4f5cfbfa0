//! Fixed-point conversion between smallest-unit integers and decimal strings.
//!
//! Both directions work on the decimal digits directly, so amounts of any
//! magnitude convert exactly.

use num_bigint::BigUint;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount format: '{0}' is not a non-negative decimal number")]
    InvalidFormat(String),
    #[error("Invalid raw amount: '{0}' is not an integer")]
    InvalidRaw(String),
}

/// Formats a smallest-unit amount (e.g. planck) as a human decimal string.
///
/// `to_human("12345", 4) == "1.2345"`, `to_human("100000000", 10) == "0.01"`.
/// A leading `-` is carried over untouched. Anything other than an optional
/// `-` followed by ASCII digits is rejected.
pub fn to_human(raw: &str, decimals: u32) -> Result<String, AmountError> {
    let (sign, digits) = split_raw(raw)?;
    let decimals = decimals as usize;

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits.to_string()
    };
    let (whole, frac) = padded.split_at(padded.len() - decimals);

    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    let frac = frac.trim_end_matches('0');

    Ok(if frac.is_empty() {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{frac}")
    })
}

/// Checks that `raw` is a smallest-unit integer: an optional `-` followed by
/// one or more ASCII digits.
pub fn check_raw(raw: &str) -> Result<(), AmountError> {
    split_raw(raw).map(|_| ())
}

fn split_raw(raw: &str) -> Result<(&'static str, &str), AmountError> {
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::InvalidRaw(raw.to_string()));
    }
    Ok((sign, digits))
}

/// Parses a human decimal amount into smallest units.
///
/// Fraction digits beyond `decimals` are dropped (rounds toward zero).
pub fn to_raw(human: &str, decimals: u32) -> Result<BigUint, AmountError> {
    let invalid = || AmountError::InvalidFormat(human.to_string());
    let (whole, frac) = split_amount(human)?;

    let frac: String = frac
        .chars()
        .chain(std::iter::repeat('0'))
        .take(decimals as usize)
        .collect();

    let whole = parse_digits(whole).ok_or_else(invalid)?;
    let frac = parse_digits(&frac).ok_or_else(invalid)?;

    Ok(whole * BigUint::from(10u32).pow(decimals) + frac)
}

/// Checks that `human` is a plain non-negative decimal numeral
/// (`12`, `0.5`, `.5`, `7.`) without converting it.
pub fn check_format(human: &str) -> Result<(), AmountError> {
    split_amount(human).map(|_| ())
}

fn split_amount(human: &str) -> Result<(&str, &str), AmountError> {
    let (whole, frac) = human.split_once('.').unwrap_or((human, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !all_digits(whole) || !all_digits(frac) {
        return Err(AmountError::InvalidFormat(human.to_string()));
    }
    Ok((whole, frac))
}

fn parse_digits(digits: &str) -> Option<BigUint> {
    if digits.is_empty() {
        return Some(BigUint::from(0u32));
    }
    digits.parse().ok()
}
