//! # Quantity Module
//!
//! Fixed-point quantities for cart lines and the quantity dialog.
//!
//! Loose goods are sold by weight or volume (1.25 kg, 0.1 liter steps), so
//! quantities need decimals. Quantities are stored as whole *hundredths*:
//! the "round to two decimal places" rule is built into the type and
//! repeated `+ 0.1` steps land exactly on `1.2`, never on
//! `1.2000000000000002`.
//!
//! ## Parsing User Input
//! ```text
//! "1"     → 1.00      "0.5"  → 0.50     "1.006" → 1.01 (rounded)
//! "abc"   → rejected  "NaN"  → rejected "inf"   → rejected
//! "2abc"  → rejected  "1e13" → rejected (more than 10^12 units)
//! ```
//! Whether zero or negative values are acceptable is up to the caller;
//! [`Quantity::parse_positive`] is what the cart and dialog use.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Sub};

const SCALE: i64 = 100;

/// Anything past this many units is a typo, not a quantity.
const MAX_WHOLE: i64 = 1_000_000_000_000;
const MAX_MAGNITUDE: f64 = MAX_WHOLE as f64;
const MAX_HUNDREDTHS: i64 = MAX_WHOLE * SCALE;

/// A quantity with two decimal places of precision.
///
/// Serializes as a plain JSON number (`1.25`), which is what the rendering
/// host binds to its input fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    /// One whole unit.
    pub const ONE: Quantity = Quantity(SCALE);

    /// One tenth of a unit, the step for weighed and poured goods.
    pub const TENTH: Quantity = Quantity(SCALE / 10);

    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Quantity(hundredths)
    }

    /// Saturates instead of overflowing.
    #[inline]
    pub const fn from_whole(units: i64) -> Self {
        Quantity(units.saturating_mul(SCALE))
    }

    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Converts a float, rounding to the nearest hundredth.
    ///
    /// Returns `None` for NaN, infinities and absurd magnitudes.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value.abs() > MAX_MAGNITUDE {
            return None;
        }
        Some(Quantity((value * SCALE as f64).round() as i64))
    }

    /// Returns the quantity as a float, for display only.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / SCALE as f64
    }

    /// Parses user input into a quantity. Surrounding whitespace is ignored.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::parse("1.5"), Some(Quantity::from_hundredths(150)));
    /// assert_eq!(Quantity::parse("-1"), Some(Quantity::from_whole(-1)));
    /// assert_eq!(Quantity::parse("abc"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        // Integer fast path avoids float rounding for the common case
        if let Ok(whole) = text.parse::<i64>() {
            if whole.unsigned_abs() > MAX_WHOLE as u64 {
                return None;
            }
            return Some(Quantity(whole * SCALE));
        }

        text.parse::<f64>().ok().and_then(Quantity::from_f64)
    }

    /// Parses user input and keeps it only when it is strictly positive.
    ///
    /// This is the guard in front of every cart mutation: `"0"`, `"-1"` and
    /// `"abc"` all come back as `None`.
    pub fn parse_positive(text: &str) -> Option<Self> {
        Quantity::parse(text).filter(Quantity::is_positive)
    }

    /// Adds, returning `None` past the largest quantity `parse` accepts.
    pub fn checked_add(self, other: Quantity) -> Option<Quantity> {
        self.0
            .checked_add(other.0)
            .filter(|sum| sum.unsigned_abs() <= MAX_HUNDREDTHS as u64)
            .map(Quantity)
    }

    /// Rounds to the nearest tenth, half away from zero.
    ///
    /// ```rust
    /// use till_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_hundredths(135).round_to_tenth(), Quantity::from_hundredths(140));
    /// assert_eq!(Quantity::from_hundredths(-115).round_to_tenth(), Quantity::from_hundredths(-120));
    /// ```
    pub fn round_to_tenth(self) -> Quantity {
        let rem = self.0 % 10;
        let down = self.0 - rem;
        if rem >= 5 {
            Quantity(down.saturating_add(10))
        } else if rem <= -5 {
            Quantity(down.saturating_sub(10))
        } else {
            Quantity(down)
        }
    }

    /// Restricts the quantity to `[lo, hi]`.
    ///
    /// If the range is empty (`hi < lo`), `lo` wins.
    pub fn clamp_to(self, lo: Quantity, hi: Quantity) -> Quantity {
        if self > hi {
            if hi < lo {
                lo
            } else {
                hi
            }
        } else if self < lo {
            lo
        } else {
            self
        }
    }

    /// Formats for an input field: always at least one decimal place.
    ///
    /// ```rust
    /// use till_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_whole(2).to_input_text(), "2.0");
    /// assert_eq!(Quantity::from_hundredths(110).to_input_text(), "1.1");
    /// assert_eq!(Quantity::from_hundredths(125).to_input_text(), "1.25");
    /// ```
    pub fn to_input_text(&self) -> String {
        let text = self.to_string();
        if text.contains('.') {
            text
        } else {
            format!("{}.0", text)
        }
    }
}

/// Shows the shortest exact decimal: `2`, `1.5`, `1.25`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / SCALE as u64;
        let frac = abs % SCALE as u64;

        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else if frac % 10 == 0 {
            write!(f, "{}{}.{}", sign, whole, frac / 10)
        } else {
            write!(f, "{}{}.{:02}", sign, whole, frac)
        }
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0.saturating_add(other.0))
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0.saturating_sub(other.0))
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Quantity::from_f64(value)
            .ok_or_else(|| de::Error::custom(format!("invalid quantity: {}", value)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
