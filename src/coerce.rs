//!
//! Coercion of textual override values into typed slots.
//!
//! Integers are base-agnostic (`0x`/`0o`/`0b` prefixes next to plain
//! decimal) and checked against the slot's width. Durations accept the
//! human-readable expressions `humantime` understands (`"5s"`,
//! `"2h 30m"`). Booleans accept the conventional literal set.
//!

use std::borrow::Cow;

use crate::{error::Error, field::Scalar};

impl Scalar<'_> {
    /// Coerce `raw` into this slot and store it.
    ///
    /// `key` and `field` only feed the error on a failed parse.
    pub(crate) fn assign(self, key: &str, field: &'static str, raw: &str) -> Result<(), Error> {
        let type_name = self.type_name();
        let invalid = || Error::InvalidValue {
            key: key.to_owned(),
            field,
            type_name,
            value: raw.to_owned(),
        };

        macro_rules! store {
            ($slot:expr, $parsed:expr) => {{
                *$slot = $parsed.ok_or_else(invalid)?;
                Ok(())
            }};
        }

        match self {
            Scalar::Str(slot) => {
                *slot = raw.to_owned();
                Ok(())
            }
            Scalar::I8(slot) => store!(slot, parse_signed(raw)),
            Scalar::I16(slot) => store!(slot, parse_signed(raw)),
            Scalar::I32(slot) => store!(slot, parse_signed(raw)),
            Scalar::I64(slot) => store!(slot, parse_signed(raw)),
            Scalar::Isize(slot) => store!(slot, parse_signed(raw)),
            Scalar::U8(slot) => store!(slot, parse_unsigned(raw)),
            Scalar::U16(slot) => store!(slot, parse_unsigned(raw)),
            Scalar::U32(slot) => store!(slot, parse_unsigned(raw)),
            Scalar::U64(slot) => store!(slot, parse_unsigned(raw)),
            Scalar::Usize(slot) => store!(slot, parse_unsigned(raw)),
            Scalar::F32(slot) => store!(slot, raw.parse().ok()),
            Scalar::F64(slot) => store!(slot, raw.parse().ok()),
            Scalar::Bool(slot) => store!(slot, parse_bool(raw)),
            Scalar::Duration(slot) => store!(slot, humantime::parse_duration(raw).ok()),
        }
    }
}

fn parse_signed<T: TryFrom<i64>>(raw: &str) -> Option<T> {
    let (radix, digits) = radix_split(raw)?;
    let wide = i64::from_str_radix(digits.as_ref(), radix).ok()?;
    T::try_from(wide).ok()
}

fn parse_unsigned<T: TryFrom<u64>>(raw: &str) -> Option<T> {
    let (radix, digits) = radix_split(raw)?;
    let wide = u64::from_str_radix(digits.as_ref(), radix).ok()?;
    T::try_from(wide).ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Split an integer literal into radix and digits, keeping the sign
/// with the digits so `from_str_radix` can range-check it.
///
/// `None` for malformed literals: a doubled sign, or a sign after the
/// radix prefix (the sign must come first, as in `-0x10`).
fn radix_split(raw: &str) -> Option<(u32, Cow<'_, str>)> {
    let (negative, body) = match raw.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if body.starts_with('-') || body.starts_with('+') {
        return None;
    }

    let (radix, digits) = if let Some(digits) = strip_radix(body, "0x", "0X") {
        (16, digits)
    } else if let Some(digits) = strip_radix(body, "0o", "0O") {
        (8, digits)
    } else if let Some(digits) = strip_radix(body, "0b", "0B") {
        (2, digits)
    } else {
        (10, body)
    };
    if digits.starts_with('-') || digits.starts_with('+') {
        return None;
    }

    Some(if negative {
        (radix, Cow::Owned(format!("-{}", digits)))
    } else {
        (radix, Cow::Borrowed(digits))
    })
}

fn strip_radix<'a>(body: &'a str, lower: &str, upper: &str) -> Option<&'a str> {
    body.strip_prefix(lower).or_else(|| body.strip_prefix(upper))
}
