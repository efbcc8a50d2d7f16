//! Parsing of the `"<reason> | <amount> | <currency>"` expense title.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::money::VND;

const THOUSAND: i64 = 1_000;
const MILLION: i64 = 1_000_000;

static AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(k|tr|m)\d+|\d+(k|tr|m)|\d+)").expect("amount pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor<'a> {
    pub reason: &'a str,
    pub amount: &'a str,
    pub currency: &'a str,
}

impl<'a> Descriptor<'a> {
    /// `None` when the title has fewer than three `|` segments.
    pub fn parse(title: &'a str) -> Option<Self> {
        let mut parts = title.split('|');
        let reason = parts.next()?.trim();
        let amount = parts.next()?.trim();
        let currency = parts.next()?.trim();
        Some(Self {
            reason,
            amount,
            currency: if currency.is_empty() { VND } else { currency },
        })
    }

    pub fn is_vnd(&self) -> bool {
        self.currency.eq_ignore_ascii_case(VND)
    }
}

/// Amount written by hand in a tracker title: `"50k"`, `"1tr5"`, `"2.500.000"`.
/// Anything unparseable is zero.
pub fn shorthand_amount(raw: &str) -> i64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '.' && *c != ',')
        .flat_map(char::to_lowercase)
        .collect();

    let Some(m) = AMOUNT.find(&cleaned) else {
        return 0;
    };
    let s = m.as_str();
    let millions = s.replace("tr", "m");

    if let Some((prefix, suffix)) = s.split_once('k') {
        scaled(prefix, suffix, THOUSAND, 3)
    } else if let Some((prefix, suffix)) = millions.split_once('m') {
        scaled(prefix, suffix, MILLION, 6)
    } else {
        s.parse().unwrap_or(0)
    }
}

/// `prefix * unit` plus the suffix read as the leading digits of the
/// fractional part, e.g. `1m25` is 1.25 million. Amounts that do not fit
/// an `i64` read as zero.
fn scaled(prefix: &str, suffix: &str, unit: i64, max_suffix: usize) -> i64 {
    if suffix.len() > max_suffix {
        return 0;
    }
    let whole: i64 = prefix.parse().unwrap_or(0);
    let frac = if suffix.is_empty() {
        0
    } else {
        let digits: i64 = suffix.parse().unwrap_or(0);
        digits * unit / 10_i64.pow(suffix.len() as u32)
    };
    whole
        .checked_mul(unit)
        .and_then(|w| w.checked_add(frac))
        .unwrap_or(0)
}

/// Amount produced by a structured source: `"120000"` or `"120000.0"`.
pub fn plain_amount(raw: &str) -> i64 {
    raw.trim()
        .replace(',', "")
        .parse::<f64>()
        .map(|v| v.round() as i64)
        .unwrap_or(0)
}
