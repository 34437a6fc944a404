//! Currency amounts in integer minor units.
//!
//! All arithmetic on money happens on [`Cents`]. Decimal strings only appear
//! at the edges: when form input is read ([`parse_cents_with`]) and when
//! values are rendered ([`format_cents`]).
//!
//! # Example
//!
//! ```
//! use order_core::money::{Cents, CurrencyFormat, format_cents, parse_cents};
//!
//! let amount = parse_cents("12,90").unwrap();
//! assert_eq!(amount, Cents(1290));
//! assert_eq!(format_cents(amount, &CurrencyFormat::default()), "12,90 Euro");
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::round_half_away;

/// An amount of money in minor currency units (euro cents).
///
/// Serializes as a bare integer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(
        self,
        other: Cents,
    ) -> Option<Cents> {
        self.0.checked_add(other.0).map(Cents)
    }

    pub fn checked_mul(
        self,
        factor: i64,
    ) -> Option<Cents> {
        self.0.checked_mul(factor).map(Cents)
    }

    /// The amount in major units, e.g. `Cents(1290)` becomes `12.90`.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Converts an amount in major units to cents, rounding half away from zero.
    ///
    /// Returns `None` when the result does not fit into an `i64`.
    pub fn from_decimal(amount: Decimal) -> Option<Cents> {
        round_half_away(amount.checked_mul(Decimal::ONE_HUNDRED)?)
            .to_i64()
            .map(Cents)
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(
        self,
        rhs: Cents,
    ) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(
        &mut self,
        rhs: Cents,
    ) {
        self.0 += rhs.0;
    }
}

impl Sub for Cents {
    type Output = Cents;

    fn sub(
        self,
        rhs: Cents,
    ) -> Cents {
        Cents(self.0 - rhs.0)
    }
}

impl Neg for Cents {
    type Output = Cents;

    fn neg(self) -> Cents {
        Cents(-self.0)
    }
}

impl Mul<i64> for Cents {
    type Output = Cents;

    fn mul(
        self,
        rhs: i64,
    ) -> Cents {
        Cents(self.0 * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl fmt::Display for Cents {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&format_cents(*self, &CurrencyFormat::default()))
    }
}

/// How amounts are rendered for people.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyFormat {
    /// Separator between the major and minor part.
    pub decimal_separator: char,
    /// Appended after a single space. Empty means no suffix.
    pub suffix: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            decimal_separator: ',',
            suffix: "Euro".to_string(),
        }
    }
}

/// Renders an amount with exactly two fractional digits, e.g. `"-0,50 Euro"`.
pub fn format_cents(
    amount: Cents,
    format: &CurrencyFormat,
) -> String {
    let sign = if amount.0 < 0 { "-" } else { "" };
    let abs = amount.0.unsigned_abs();
    let mut out = format!(
        "{sign}{}{}{:02}",
        abs / 100,
        format.decimal_separator,
        abs % 100
    );
    if !format.suffix.is_empty() {
        out.push(' ');
        out.push_str(&format.suffix);
    }
    out
}

/// Strips whitespace, the format's suffix and any other trailing non-numeric
/// run, and turns the decimal separator into a point.
fn normalize_amount_input(
    s: &str,
    format: &CurrencyFormat,
) -> String {
    let mut s = s.trim();
    let suffix = format.suffix.trim();
    if !suffix.is_empty() {
        s = s.strip_suffix(suffix).unwrap_or(s);
    }
    s.trim_end_matches(|c: char| !c.is_ascii_digit())
        .trim()
        .replacen(format.decimal_separator, ".", 1)
        .replacen(',', ".", 1)
}

/// Parses a decimal amount into cents, reading the separator and suffix of
/// `format`.
///
/// Accepts the format's separator as well as `.` and `,`, and tolerates any
/// trailing currency suffix such as `"Euro"` or `"€"`. Returns `None` for
/// empty input and for input that is not a number (logged as a warning).
pub fn parse_cents_with(
    s: &str,
    format: &CurrencyFormat,
) -> Option<Cents> {
    if s.trim().is_empty() {
        return None;
    }
    let normalized = normalize_amount_input(s, format);
    if normalized.is_empty() {
        warn!(input = %s, "invalid amount: no digits");
        return None;
    }
    match normalized.parse::<Decimal>() {
        Ok(amount) => Cents::from_decimal(amount).or_else(|| {
            warn!(input = %s, "amount out of range");
            None
        }),
        Err(e) => {
            warn!(input = %s, "invalid amount: {}", e);
            None
        }
    }
}

/// [`parse_cents_with`] for the default format.
pub fn parse_cents(s: &str) -> Option<Cents> {
    parse_cents_with(s, &CurrencyFormat::default())
}

/// Parses a decimal amount into cents, treating missing or invalid input as zero.
pub fn parse_cents_or_zero(s: &str) -> Cents {
    parse_cents(s).unwrap_or(Cents::ZERO)
}

/// [`parse_cents_or_zero`] for a configured format.
pub fn parse_cents_or_zero_with(
    s: &str,
    format: &CurrencyFormat,
) -> Cents {
    parse_cents_with(s, format).unwrap_or(Cents::ZERO)
}

/// Parses a quantity field. Missing or invalid input is zero.
pub fn parse_quantity(s: &str) -> i64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0;
    }
    trimmed.parse().unwrap_or_else(|e| {
        warn!(input = %s, "invalid quantity: {}", e);
        0
    })
}
