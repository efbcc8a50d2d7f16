use derive_more::{Add, AddAssign, Display, From, Neg, Sub, SubAssign};
use serde::{Deserialize, Serialize};

pub const VND: &str = "VND";
pub const USD: &str = "USD";

/// Amount in the settlement currency. Whole dong, may go negative when
/// advances exceed earnings.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Add,
    Sub,
    AddAssign,
    SubAssign,
    Neg,
    From,
    Display,
)]
#[serde(transparent)]
#[display(fmt = "{}", _0)]
pub struct Vnd(pub i64);

impl Vnd {
    pub const ZERO: Vnd = Vnd(0);

    pub fn amount(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Converted amounts arrive as floats already rounded up by the converter.
    pub fn from_converted(value: f64) -> Self {
        Vnd(value as i64)
    }

    /// `20000000` -> `20,000,000`
    pub fn formatted(self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
        if self.0 < 0 {
            out.push('-');
        }
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }
}

impl std::iter::Sum for Vnd {
    fn sum<I: Iterator<Item = Vnd>>(iter: I) -> Self {
        iter.fold(Vnd::ZERO, |acc, v| acc + v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_thousand_separators() {
        assert_eq!(Vnd(20_000_000).formatted(), "20,000,000");
        assert_eq!(Vnd(999).formatted(), "999");
        assert_eq!(Vnd(-1_036_000).formatted(), "-1,036,000");
        assert_eq!(Vnd(0).formatted(), "0");
    }

    #[test]
    fn sums_and_subtracts() {
        let total: Vnd = [Vnd(20_000_000), Vnd(1_000_000)].into_iter().sum();
        assert_eq!(total - Vnd(1_036_000), Vnd(19_964_000));
    }
}
