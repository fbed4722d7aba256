use crate::{
    error::{ConfigError, Result},
    word::Word,
};

/// Smallest supported radix.
pub const MIN_RADIX: u32 = 2;

/// Largest supported radix.
pub const MAX_RADIX: u32 = 36;

/// Default radix for textual IDs.
pub const DEFAULT_RADIX: u32 = 36;

const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn check_radix(radix: u32) -> Result<(), ConfigError> {
    if (MIN_RADIX..=MAX_RADIX).contains(&radix) {
        Ok(())
    } else {
        Err(ConfigError::InvalidRadix { radix })
    }
}

/// Renders an identifier in the given radix with upper-case digits.
///
/// ```
/// assert_eq!(snowbit::to_radix_string(255u64, 16).unwrap(), "FF");
/// assert_eq!(snowbit::to_radix_string(35u64, 36).unwrap(), "Z");
/// ```
///
/// # Errors
///
/// Returns [`ConfigError::InvalidRadix`] unless `radix` is in `2..=36`.
pub fn to_radix_string<W: Word>(id: W, radix: u32) -> Result<String> {
    check_radix(radix)?;
    if id.is_zero() {
        return Ok("0".to_owned());
    }

    let mut digits = Vec::with_capacity(W::BITS as usize);
    let mut rest = id;
    while !rest.is_zero() {
        let (quotient, digit) = rest.div_rem_small(radix);
        digits.push(DIGITS[digit as usize]);
        rest = quotient;
    }
    Ok(digits.iter().rev().map(|&d| char::from(d)).collect())
}

/// Parses an identifier rendered by [`to_radix_string`]. Digits are
/// case-insensitive.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidRadix`] for an unsupported radix and
/// [`ConfigError::MalformedId`] for an empty string, a foreign digit, or a
/// value that overflows `W`.
pub fn parse_radix<W: Word>(input: &str, radix: u32) -> Result<W> {
    check_radix(radix)?;
    let malformed = || ConfigError::MalformedId {
        input: input.to_owned(),
        radix,
    };
    if input.is_empty() {
        return Err(malformed().into());
    }

    let mut value = W::ZERO;
    for c in input.chars() {
        let digit = c.to_digit(radix).ok_or_else(malformed)?;
        value = value.checked_mul_add(radix, digit).ok_or_else(malformed)?;
    }
    Ok(value)
}
