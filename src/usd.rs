use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign, Div, Mul, Sub},
};

/// Represents an amount of money in USD currency.
///
/// The amount is stored internally at full precision as a number of dollars,
/// so that fees and revenue can be accumulated without intermediate rounding.
/// The [`Display`] implementation rounds it to 2 decimal places, honouring any
/// width given in the format string:
///
/// ```
/// # use sales_report::Usd;
/// let amount = Usd::from_cents(123_456);
/// assert_eq!(format!("{amount}"), "$1234.56");
/// assert_eq!(format!("{amount:>10}"), "$  1234.56");
/// ```
#[derive(Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Usd(f64);

impl Usd {
    pub const ZERO: Usd = Usd(0.0);

    #[must_use]
    pub fn from_dollars(dollars: f64) -> Self {
        Self(dollars)
    }

    /// Converts an amount in minor units (cents), as the APIs report them.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_cents(cents: i64) -> Self {
        Self(cents as f64 / 100.0)
    }

    #[must_use]
    pub fn dollars(self) -> f64 {
        self.0
    }

    /// Returns the amount rounded to whole cents, for export.
    #[must_use]
    pub fn rounded(self) -> f64 {
        (self.0 * 100.0).round() / 100.0
    }

    /// Returns `self` as a percentage of `whole`, or zero if `whole` is not
    /// positive.
    #[must_use]
    pub fn percent_of(self, whole: Usd) -> f64 {
        if whole.0 > 0.0 {
            self.0 / whole.0 * 100.0
        } else {
            0.0
        }
    }
}

impl Debug for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Usd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let precision = f.precision().unwrap_or(2);
        match f.width() {
            Some(width) => {
                let width = width.saturating_sub(1);
                write!(f, "${:>width$.precision$}", self.0)
            }
            None => write!(f, "${:.precision$}", self.0),
        }
    }
}

impl Add for Usd {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Usd {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Usd {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Usd {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<f64> for Usd {
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Usd::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_fn_converts_minor_units_to_dollars() {
        assert_eq!(Usd::from_cents(1999).dollars(), 19.99);
        assert_eq!(Usd::from_cents(0), Usd::ZERO);
    }

    #[test]
    fn display_rounds_to_two_places_only_when_printed() {
        let third = Usd::from_dollars(10.0) / 3.0;
        assert_eq!(format!("{third}"), "$3.33");
        assert_eq!(format!("{:>10}", third * 3.0), "$    10.00");
        assert_ne!(third.dollars(), 3.33);
    }

    #[test]
    fn percent_of_fn_returns_zero_for_empty_whole() {
        assert_eq!(Usd::from_dollars(5.0).percent_of(Usd::ZERO), 0.0);
        assert_eq!(Usd::from_dollars(5.0).percent_of(Usd::from_dollars(50.0)), 10.0);
    }
}
