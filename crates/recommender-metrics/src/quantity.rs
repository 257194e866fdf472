//! Resource quantities and their conversion to metric values
//!
//! A [`Quantity`] holds an exact resource amount (CPU cores, memory bytes)
//! parsed from the Kubernetes quantity notation, e.g. `100m`, `256Mi`, `1.5`,
//! `2e3`. Amounts are stored as a count of nano-units so that both the
//! whole-unit and the milli-unit views are exact integers.

use crate::error::{MetricsError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Above this many whole units a quantity is reported by its plain value
/// instead of its milli value.
pub const DIRECT_VALUE_THRESHOLD: i64 = 10_000_000;

const NANOS_PER_UNIT: i128 = 1_000_000_000;
const NANOS_PER_MILLI: i128 = 1_000_000;

/// Largest accepted magnitude of an `e<int>` exponent suffix
const MAX_EXPONENT: i32 = 64;

/// An exact resource amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity {
    nanos: i128,
}

impl Quantity {
    pub const fn zero() -> Self {
        Self { nanos: 0 }
    }

    /// Quantity of `value` whole units.
    pub const fn from_value(value: i64) -> Self {
        Self {
            nanos: value as i128 * NANOS_PER_UNIT,
        }
    }

    /// Quantity of `milli` thousandths of a unit.
    pub const fn from_milli(milli: i64) -> Self {
        Self {
            nanos: milli as i128 * NANOS_PER_MILLI,
        }
    }

    /// Whole units, rounded up and saturated to the `i64` range.
    pub fn value(&self) -> i64 {
        saturate(div_round_up(self.nanos, NANOS_PER_UNIT))
    }

    /// Milli-units, rounded up and saturated to the `i64` range.
    pub fn milli_value(&self) -> i64 {
        saturate(div_round_up(self.nanos, NANOS_PER_MILLI))
    }

    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }
}

/// Convert a quantity into a float suitable for a gauge.
///
/// Small amounts keep milli precision (CPU millicores); amounts above
/// [`DIRECT_VALUE_THRESHOLD`] units are reported by their whole value so that
/// large byte counts are not pushed through the milli representation.
pub fn to_metric_value(quantity: &Quantity) -> f64 {
    let value = quantity.value();
    if value > DIRECT_VALUE_THRESHOLD {
        return value as f64;
    }
    quantity.milli_value() as f64 * 0.001
}

/// Division rounding away from zero.
fn div_round_up(n: i128, d: i128) -> i128 {
    let q = n / d;
    if n % d == 0 {
        q
    } else if n > 0 {
        q + 1
    } else {
        q - 1
    }
}

fn saturate(v: i128) -> i64 {
    v.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

enum Multiplier {
    Decimal(i32),
    Binary(u32),
}

fn parse_suffix(suffix: &str) -> Option<Multiplier> {
    let m = match suffix {
        "" => Multiplier::Decimal(0),
        "n" => Multiplier::Decimal(-9),
        "u" => Multiplier::Decimal(-6),
        "m" => Multiplier::Decimal(-3),
        "k" => Multiplier::Decimal(3),
        "M" => Multiplier::Decimal(6),
        "G" => Multiplier::Decimal(9),
        "T" => Multiplier::Decimal(12),
        "P" => Multiplier::Decimal(15),
        "E" => Multiplier::Decimal(18),
        "Ki" => Multiplier::Binary(10),
        "Mi" => Multiplier::Binary(20),
        "Gi" => Multiplier::Binary(30),
        "Ti" => Multiplier::Binary(40),
        "Pi" => Multiplier::Binary(50),
        "Ei" => Multiplier::Binary(60),
        s if s.len() > 1 && (s.starts_with('e') || s.starts_with('E')) => {
            Multiplier::Decimal(s[1..].parse::<i32>().ok()?)
        }
        _ => return None,
    };
    Some(m)
}

impl FromStr for Quantity {
    type Err = MetricsError;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = |reason| MetricsError::InvalidQuantity {
            input: input.to_string(),
            reason,
        };

        let s = input.trim();
        let (negative, s) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            Some(_) => (false, s),
            None => return Err(invalid("empty quantity")),
        };

        let number_len = s
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .unwrap_or(s.len());
        let (number, suffix) = s.split_at(number_len);

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("missing number"));
        }
        if frac_part.contains('.') {
            return Err(invalid("more than one decimal point"));
        }

        let multiplier = parse_suffix(suffix).ok_or_else(|| invalid("unknown suffix"))?;
        if let Multiplier::Decimal(e) = multiplier {
            if !(-MAX_EXPONENT..=MAX_EXPONENT).contains(&e) {
                return Err(invalid("exponent out of range"));
            }
        }

        let mut mantissa: i128 = 0;
        for digit in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add(i128::from(digit - b'0')))
                .ok_or_else(|| invalid("quantity out of range"))?;
        }
        let frac_len =
            i32::try_from(frac_part.len()).map_err(|_| invalid("quantity out of range"))?;

        // nanos = mantissa * multiplier * 10^(9 - frac_len)
        let (numerator, exponent) = match multiplier {
            Multiplier::Decimal(e) => (Some(mantissa), 9i32.checked_add(e)),
            Multiplier::Binary(b) => (mantissa.checked_mul(1i128 << b), Some(9)),
        };
        let numerator = numerator.ok_or_else(|| invalid("quantity out of range"))?;
        let exponent = exponent
            .and_then(|e| e.checked_sub(frac_len))
            .ok_or_else(|| invalid("quantity out of range"))?;

        let nanos = if exponent >= 0 {
            10i128
                .checked_pow(exponent as u32)
                .and_then(|p| numerator.checked_mul(p))
                .ok_or_else(|| invalid("quantity out of range"))?
        } else {
            match 10i128.checked_pow(exponent.unsigned_abs()) {
                Some(p) => div_round_up(numerator, p),
                // Less than one nano-unit rounds up to one.
                None => i128::from(numerator != 0),
            }
        };

        Ok(Self {
            nanos: if negative { -nanos } else { nanos },
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.nanos;
        if n % NANOS_PER_UNIT == 0 {
            write!(f, "{}", n / NANOS_PER_UNIT)
        } else if n % NANOS_PER_MILLI == 0 {
            write!(f, "{}m", n / NANOS_PER_MILLI)
        } else if n % 1_000 == 0 {
            write!(f, "{}u", n / 1_000)
        } else {
            write!(f, "{}n", n)
        }
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
