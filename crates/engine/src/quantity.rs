use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use crate::EngineError;

/// Signed stock quantity represented as **integer grams**.
///
/// Use this type for **all** stock values in the engine (balances, ratios,
/// consumption, draws) to avoid floating-point drift in running balances.
///
/// The value is signed:
/// - positive = stock on hand / increase
/// - negative = shortfall (the ledger enforces no floor on balances)
///
/// # Examples
///
/// ```rust
/// use engine::Grams;
///
/// let qty = Grams::new(12_345);
/// assert_eq!(qty.grams(), 12_345);
/// assert_eq!(qty.to_string(), "12.345kg");
/// ```
///
/// Parsing from user input (kilograms; accepts `.` or `,` as decimal
/// separator; rejects > 3 decimals):
///
/// ```rust
/// use engine::Grams;
///
/// assert_eq!("10".parse::<Grams>().unwrap().grams(), 10_000);
/// assert_eq!("10,5".parse::<Grams>().unwrap().grams(), 10_500);
/// assert!("1.2345".parse::<Grams>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Grams(i64);

impl Grams {
    pub const ZERO: Grams = Grams(0);

    /// Creates a new quantity from integer grams.
    #[must_use]
    pub const fn new(grams: i64) -> Self {
        Self(grams)
    }

    /// Returns the raw value in grams.
    #[must_use]
    pub const fn grams(self) -> i64 {
        self.0
    }

    /// Returns `true` if the quantity is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the quantity is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the quantity is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Grams) -> Option<Grams> {
        self.0.checked_add(rhs.0).map(Grams)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Grams) -> Option<Grams> {
        self.0.checked_sub(rhs.0).map(Grams)
    }

    /// Checked scaling by an integer factor (returns `None` on overflow).
    #[must_use]
    pub fn checked_mul(self, factor: i64) -> Option<Grams> {
        self.0.checked_mul(factor).map(Grams)
    }

    /// Converts a kilogram value from a JSON body into grams.
    ///
    /// The wire contract speaks kilograms as plain numbers; sub-gram
    /// precision is rounded half away from zero. Non-finite input is
    /// rejected.
    pub fn from_kg(kg: f64) -> Result<Grams, EngineError> {
        if !kg.is_finite() {
            return Err(EngineError::Validation(
                "quantity must be a finite number".to_string(),
            ));
        }
        let grams = (kg * 1000.0).round();
        if grams.abs() >= i64::MAX as f64 {
            return Err(EngineError::Validation("quantity too large".to_string()));
        }
        Ok(Grams(grams as i64))
    }

    /// Returns the value in kilograms for JSON responses.
    #[must_use]
    pub fn to_kg(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl fmt::Display for Grams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let kg = abs / 1000;
        let grams = abs % 1000;
        write!(f, "{sign}{kg}.{grams:03}kg")
    }
}

impl From<i64> for Grams {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Grams> for i64 {
    fn from(value: Grams) -> Self {
        value.0
    }
}

impl Add for Grams {
    type Output = Grams;

    fn add(self, rhs: Grams) -> Self::Output {
        Grams(self.0 + rhs.0)
    }
}

impl AddAssign for Grams {
    fn add_assign(&mut self, rhs: Grams) {
        self.0 += rhs.0;
    }
}

impl Sub for Grams {
    type Output = Grams;

    fn sub(self, rhs: Grams) -> Self::Output {
        Grams(self.0 - rhs.0)
    }
}

impl SubAssign for Grams {
    fn sub_assign(&mut self, rhs: Grams) {
        self.0 -= rhs.0;
    }
}

impl Neg for Grams {
    type Output = Grams;

    fn neg(self) -> Self::Output {
        Grams(-self.0)
    }
}

impl Sum for Grams {
    fn sum<I: Iterator<Item = Grams>>(iter: I) -> Self {
        Grams(iter.map(|g| g.0).sum())
    }
}

impl FromStr for Grams {
    type Err = EngineError;

    /// Parses a decimal kilogram string into grams.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading
    /// `+`/`-`.
    ///
    /// Validation rules:
    /// - max 3 fractional digits (rejects `1.2345`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::Validation("empty quantity".to_string());
        let invalid = || EngineError::Validation("invalid quantity".to_string());
        let overflow = || EngineError::Validation("quantity too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (sign, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (-1i64, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (1i64, stripped)
        } else {
            (1i64, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let kg_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if kg_str.is_empty() || !kg_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let kg: i64 = kg_str.parse().map_err(|_| invalid())?;

        let grams: i64 = match frac_str {
            None => 0,
            Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                match frac.len() {
                    0 => 0,
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 100,
                    2 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    3 => frac.parse::<i64>().map_err(|_| invalid())?,
                    _ => return Err(EngineError::Validation("too many decimals".to_string())),
                }
            }
        };

        let total = kg
            .checked_mul(1000)
            .and_then(|v| v.checked_add(grams))
            .ok_or_else(overflow)?;

        let signed = if sign < 0 {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Grams(signed))
    }
}
