//! Extended datatypes that have no native JSON form
//!
//! - [`DataApiDuration`]: months/days/nanoseconds duration used by `duration` columns
//! - [`DataApiVector`]: f32 embedding
//! - [`ObjectId`]: 12-byte document identifier

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;

// =============================================================================
// DataApiDuration
// =============================================================================

/// A duration with independent month, day and nanosecond components.
///
/// Months and days are kept apart from the nanosecond part because their
/// length depends on the calendar. All three components carry the same sign.
///
/// Two textual forms are accepted:
/// - compact: `1y2mo3w4d5h6m7s8ms9us10ns` (units in any subset, this order)
/// - ISO-8601: `P1Y2M3DT4H5M6S`, `P2W`
///
/// Either form may be prefixed with `-`. [`Display`](fmt::Display) always
/// produces the compact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DataApiDuration {
    /// Calendar months
    pub months: i32,
    /// Calendar days
    pub days: i32,
    /// Nanoseconds within the day part
    pub nanoseconds: i64,
}

impl DataApiDuration {
    /// Create a duration from its raw components
    pub fn new(months: i32, days: i32, nanoseconds: i64) -> Self {
        Self {
            months,
            days,
            nanoseconds,
        }
    }

    /// Check if every component is zero
    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0 && self.nanoseconds == 0
    }

    fn is_negative(&self) -> bool {
        self.months < 0 || self.days < 0 || self.nanoseconds < 0
    }

    fn parse_compact(text: &str, input: &str) -> Result<(i64, i64, i64)> {
        let mut months = 0i64;
        let mut days = 0i64;
        let mut nanos = 0i64;
        let mut rest = text;

        while !rest.is_empty() {
            let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            if digits == 0 {
                return Err(Error::parse("DataApiDuration", input, "expected a number"));
            }
            let amount: i64 = rest[..digits]
                .parse()
                .map_err(|e| Error::parse("DataApiDuration", input, e))?;
            rest = &rest[digits..];

            let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
            let unit = &rest[..unit_len];
            rest = &rest[unit_len..];

            let (total, factor) = match unit.to_ascii_lowercase().as_str() {
                "y" => (&mut months, 12),
                "mo" => (&mut months, 1),
                "w" => (&mut days, 7),
                "d" => (&mut days, 1),
                "h" => (&mut nanos, NANOS_PER_HOUR),
                "m" => (&mut nanos, NANOS_PER_MINUTE),
                "s" => (&mut nanos, NANOS_PER_SECOND),
                "ms" => (&mut nanos, NANOS_PER_MILLI),
                "us" | "µs" => (&mut nanos, NANOS_PER_MICRO),
                "ns" => (&mut nanos, 1),
                "" => return Err(Error::parse("DataApiDuration", input, "missing unit")),
                other => {
                    return Err(Error::parse(
                        "DataApiDuration",
                        input,
                        format!("unknown unit '{}'", other),
                    ))
                }
            };
            accumulate(total, amount, factor, input)?;
        }

        Ok((months, days, nanos))
    }

    fn parse_iso(text: &str, input: &str) -> Result<(i64, i64, i64)> {
        let mut months = 0i64;
        let mut days = 0i64;
        let mut nanos = 0i64;
        let mut in_time = false;
        let mut number = String::new();

        for c in text.chars() {
            match c {
                '0'..='9' | '.' => number.push(c),
                'T' | 't' => in_time = true,
                unit => {
                    if number.is_empty() {
                        return Err(Error::parse("DataApiDuration", input, "expected a number"));
                    }
                    let unit = unit.to_ascii_uppercase();
                    if unit == 'S' && in_time {
                        let seconds: f64 = number
                            .parse()
                            .map_err(|e| Error::parse("DataApiDuration", input, e))?;
                        let scaled = (seconds * NANOS_PER_SECOND as f64).round();
                        // i64::MAX as f64 rounds up to 2^63, which is already out of range
                        if !scaled.is_finite() || scaled >= i64::MAX as f64 {
                            return Err(out_of_range(input));
                        }
                        accumulate(&mut nanos, scaled as i64, 1, input)?;
                    } else {
                        let amount: i64 = number
                            .parse()
                            .map_err(|e| Error::parse("DataApiDuration", input, e))?;
                        let (total, factor) = match (unit, in_time) {
                            ('Y', false) => (&mut months, 12),
                            ('M', false) => (&mut months, 1),
                            ('W', false) => (&mut days, 7),
                            ('D', false) => (&mut days, 1),
                            ('H', true) => (&mut nanos, NANOS_PER_HOUR),
                            ('M', true) => (&mut nanos, NANOS_PER_MINUTE),
                            _ => {
                                return Err(Error::parse(
                                    "DataApiDuration",
                                    input,
                                    format!("unexpected designator '{}'", unit),
                                ))
                            }
                        };
                        accumulate(total, amount, factor, input)?;
                    }
                    number.clear();
                }
            }
        }

        if !number.is_empty() {
            return Err(Error::parse("DataApiDuration", input, "trailing number without unit"));
        }
        Ok((months, days, nanos))
    }
}

fn out_of_range(input: &str) -> Error {
    Error::parse("DataApiDuration", input, "out of range")
}

/// `total += amount * factor`, failing instead of overflowing
fn accumulate(total: &mut i64, amount: i64, factor: i64, input: &str) -> Result<()> {
    *total = amount
        .checked_mul(factor)
        .and_then(|n| total.checked_add(n))
        .ok_or_else(|| out_of_range(input))?;
    Ok(())
}

impl FromStr for DataApiDuration {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return Err(Error::parse("DataApiDuration", input, "empty duration"));
        }

        let (months, days, nanos) = match body.strip_prefix(['P', 'p']) {
            Some(iso) => Self::parse_iso(iso, input)?,
            None => Self::parse_compact(body, input)?,
        };

        let sign = if negative { -1 } else { 1 };
        let months = i32::try_from(months * sign)
            .map_err(|_| Error::parse("DataApiDuration", input, "months out of range"))?;
        let days = i32::try_from(days * sign)
            .map_err(|_| Error::parse("DataApiDuration", input, "days out of range"))?;

        Ok(Self::new(months, days, nanos * sign))
    }
}

impl fmt::Display for DataApiDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0s");
        }
        if self.is_negative() {
            f.write_str("-")?;
        }

        let months = i64::from(self.months).abs();
        let days = i64::from(self.days).abs();
        let mut nanos = self.nanoseconds.abs();

        if months / 12 > 0 {
            write!(f, "{}y", months / 12)?;
        }
        if months % 12 > 0 {
            write!(f, "{}mo", months % 12)?;
        }
        if days > 0 {
            write!(f, "{}d", days)?;
        }
        for (unit, size) in [
            ("h", NANOS_PER_HOUR),
            ("m", NANOS_PER_MINUTE),
            ("s", NANOS_PER_SECOND),
            ("ms", NANOS_PER_MILLI),
            ("us", NANOS_PER_MICRO),
            ("ns", 1),
        ] {
            if nanos >= size {
                write!(f, "{}{}", nanos / size, unit)?;
                nanos %= size;
            }
        }
        Ok(())
    }
}

// =============================================================================
// DataApiVector
// =============================================================================

/// An f32 embedding.
///
/// On the wire a vector is either a JSON number array or a base64 string of
/// its big-endian f32 bytes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataApiVector(pub Vec<f32>);

impl DataApiVector {
    /// Create a vector from its components
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Number of dimensions
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the vector has no components
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Components as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Pack the components as big-endian f32 bytes
    pub fn to_be_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|f| f.to_be_bytes()).collect()
    }

    /// Unpack big-endian f32 bytes
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(Error::parse(
                "DataApiVector",
                format!("{} bytes", bytes.len()),
                "length is not a multiple of 4",
            ));
        }
        Ok(Self(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ))
    }
}

impl From<Vec<f32>> for DataApiVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

// =============================================================================
// ObjectId
// =============================================================================

/// A 12-byte document identifier, written as 24 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Create an id from raw bytes
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Seconds since the epoch encoded in the first four bytes
    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        if input.len() != 24 || !input.is_ascii() {
            return Err(Error::parse("ObjectId", input, "expected 24 hex digits"));
        }
        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&input[i * 2..i * 2 + 2], 16)
                .map_err(|e| Error::parse("ObjectId", input, e))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
