//! Shared argument-parsing and range-clamping helpers used across command
//! families.

use bytes::Bytes;

use crate::error::CommandError;

pub fn parse_i64_arg(b: &Bytes) -> Result<i64, CommandError> {
    std::str::from_utf8(b)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(CommandError::NotAnInteger)
}

pub fn parse_f64_arg(b: &Bytes) -> Result<f64, CommandError> {
    let text = std::str::from_utf8(b).map_err(|_| CommandError::NotAFloat)?;
    let value: f64 = text.parse().map_err(|_| CommandError::NotAFloat)?;
    if value.is_nan() {
        return Err(CommandError::generic("not a valid float value"));
    }
    Ok(value)
}

/// Parses the current contents of a string-typed value as a signed decimal
/// integer, rejecting leading/trailing whitespace per §4.4.
pub fn parse_stored_integer(b: &Bytes) -> Result<i64, CommandError> {
    if b.is_empty() {
        return Ok(0);
    }
    if b.first().map_or(false, u8::is_ascii_whitespace)
        || b.last().map_or(false, u8::is_ascii_whitespace)
    {
        return Err(CommandError::NotAnInteger);
    }
    std::str::from_utf8(b)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(CommandError::NotAnInteger)
}

/// Parses the current contents of a string-typed value as a decimal float,
/// rejecting leading/trailing whitespace, NaN and infinities.
pub fn parse_stored_float(b: &Bytes) -> Result<f64, CommandError> {
    if b.is_empty() {
        return Ok(0.0);
    }
    if b.first().map_or(false, u8::is_ascii_whitespace)
        || b.last().map_or(false, u8::is_ascii_whitespace)
    {
        return Err(CommandError::NotAFloat);
    }
    let text = std::str::from_utf8(b).map_err(|_| CommandError::NotAFloat)?;
    let value: f64 = text.parse().map_err(|_| CommandError::NotAFloat)?;
    if value.is_nan() || value.is_infinite() {
        return Err(CommandError::generic("value would produce NaN or Infinity"));
    }
    Ok(value)
}

/// Canonical decimal text for an integer counter: no leading zeros, no sign
/// for non-negatives.
pub fn canonical_integer(n: i64) -> Bytes {
    Bytes::from(n.to_string())
}

/// Canonical decimal text for a float counter: at most 17 significant
/// fractional digits, trailing zeros stripped, trailing bare `.` stripped.
pub fn canonical_float(f: f64) -> Bytes {
    let text = format!("{:.17}", f);
    let text = text.trim_end_matches('0');
    let text = text.trim_end_matches('.');
    Bytes::from(text.to_string())
}

/// Clamps a closed `[start, end]` range (negative indices counted from the
/// tail) against a sequence of length `len`, returning a `[lo, hi)`
/// half-open index pair suitable for slicing, or `None` if the clamped
/// range is empty.
pub fn clamp_range(len: usize, start: i64, end: i64) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len_i = len as i64;
    let s = if start < 0 {
        (len_i + start).max(0)
    } else {
        start
    };
    let e = if end < 0 { len_i + end } else { end };
    if s > len_i - 1 || e < 0 {
        return None;
    }
    let e = e.min(len_i - 1);
    if s > e {
        return None;
    }
    Some((s as usize, (e + 1) as usize))
}
