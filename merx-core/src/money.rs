use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Monetary amount in minor currency units (cents).
///
/// Totals, allocations and settlements are all tracked in minor units;
/// `Display` renders major units ("45.00") for order notes and other
/// operator-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Build from a major-unit amount and a cents part, e.g.
    /// `Money::new(45, 0)` renders as "45.00".
    pub fn new(major: i64, cents: i64) -> Self {
        Money(major * 100 + cents)
    }

    /// Amount in minor units, the integer form payment processors expect.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul<u32> for Money {
    type Output = Money;

    fn mul(self, rhs: u32) -> Money {
        Money(self.0 * rhs as i64)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_major_units() {
        assert_eq!(Money::new(45, 0).to_string(), "45.00");
        assert_eq!(Money::new(0, 5).to_string(), "0.05");
        assert_eq!(Money::from_minor(10050).to_string(), "100.50");
        assert_eq!(Money::from_minor(-2550).to_string(), "-25.50");
    }

    #[test]
    fn test_minor_units_for_processor() {
        assert_eq!(Money::new(45, 0).minor_units(), 4500);
    }

    #[test]
    fn test_arithmetic() {
        let line_total = Money::new(45, 0) * 2;
        assert_eq!(line_total, Money::new(90, 0));

        let with_shipping = line_total + Money::new(10, 0);
        assert_eq!(with_shipping, Money::new(100, 0));

        let remaining = with_shipping - Money::new(55, 0);
        assert_eq!(remaining, Money::new(45, 0));
    }

    #[test]
    fn test_sum() {
        let total: Money = vec![Money::new(55, 0), Money::new(45, 0)].into_iter().sum();
        assert_eq!(total, Money::new(100, 0));
    }
}
