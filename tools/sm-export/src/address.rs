//! Parsing of SNES addresses and table ranges given on the command line

use std::str::FromStr;

use thiserror::Error;

use crate::extract::TableRange;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address '{0}' (use $A288DA, 0xA288DA or decimal)")]
    Invalid(String),

    #[error("Address '{0}' is outside the 24-bit address space")]
    TooLarge(String),
}

/// Parse `$A288DA`, `0xA288DA` or a decimal number
pub fn parse_address(text: &str) -> Result<u32, AddressError> {
    let text = text.trim();
    let hex = text
        .strip_prefix('$')
        .or_else(|| text.strip_prefix("0x"))
        .or_else(|| text.strip_prefix("0X"));

    let value = match hex {
        Some(digits) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
            u32::from_str_radix(digits, 16)
        }
        Some(_) => return Err(AddressError::Invalid(text.to_string())),
        None if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) => text.parse(),
        None => return Err(AddressError::Invalid(text.to_string())),
    }
    .map_err(|_| AddressError::TooLarge(text.to_string()))?;

    if value > 0xFF_FFFF {
        return Err(AddressError::TooLarge(text.to_string()));
    }
    Ok(value)
}

/// Parse a bank-relative pointer or id (16 bits)
pub fn parse_word(text: &str) -> Result<u16, AddressError> {
    let value = parse_address(text)?;
    u16::try_from(value).map_err(|_| AddressError::TooLarge(text.to_string()))
}

/// Parse `start` or `start:end`
pub fn parse_range(text: &str) -> Result<TableRange, AddressError> {
    match text.split_once(':') {
        Some((start, end)) => Ok(TableRange::bounded(parse_address(start)?, parse_address(end)?)),
        None => Ok(TableRange::new(parse_address(text)?)),
    }
}

impl FromStr for TableRange {
    type Err = AddressError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_range(text)
    }
}
