use chrono::{Datelike, NaiveDate, Weekday};

/// Saturdays and Sundays in the inclusive range between `a` and `b`, in
/// either order.
pub fn weekend_days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    let (from, to) = if a <= b { (a, b) } else { (b, a) };
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as i64
}

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// True when `joined` falls in the batch month, or in December of the previous
/// year for a January batch.
pub fn joined_in_batch(joined: NaiveDate, batch_date: NaiveDate) -> bool {
    let same_month = joined.month() == batch_date.month() && joined.year() == batch_date.year();
    let year_rollover =
        joined.month() == 12 && batch_date.month() == 1 && joined.year() == batch_date.year() - 1;
    same_month || year_rollover
}

/// `2 Jan`, `31 Dec`
pub fn short_day_month(date: NaiveDate) -> String {
    date.format("%-d %b").to_string()
}

/// `01 January 2024`, as used in ledger names.
pub fn ledger_date(date: NaiveDate) -> String {
    date.format("%d %B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn counts_weekends_in_january_2020() {
        assert_eq!(weekend_days_between(d(2020, 1, 1), d(2020, 1, 31)), 8);
    }

    #[test]
    fn counts_weekends_across_months() {
        assert_eq!(weekend_days_between(d(2020, 1, 15), d(2020, 2, 24)), 12);
    }

    #[test]
    fn single_day_range() {
        // 2020-01-04 is a Saturday
        assert_eq!(weekend_days_between(d(2020, 1, 4), d(2020, 1, 4)), 1);
        assert_eq!(weekend_days_between(d(2020, 1, 6), d(2020, 1, 6)), 0);
    }

    #[test]
    fn december_join_counts_for_january_batch() {
        assert!(joined_in_batch(d(2023, 12, 20), d(2024, 1, 1)));
        assert!(joined_in_batch(d(2024, 3, 10), d(2024, 3, 15)));
        assert!(!joined_in_batch(d(2022, 12, 20), d(2024, 1, 1)));
        assert!(!joined_in_batch(d(2024, 2, 28), d(2024, 3, 1)));
    }

    #[test]
    fn formats_dates() {
        assert_eq!(short_day_month(d(2024, 1, 10)), "10 Jan");
        assert_eq!(ledger_date(d(2024, 1, 1)), "01 January 2024");
    }

    proptest! {
        #[test]
        fn weekend_count_is_order_independent(a in 0i64..3000, b in 0i64..3000) {
            let base = d(2018, 1, 1);
            let x = base + chrono::Duration::days(a);
            let y = base + chrono::Duration::days(b);
            prop_assert_eq!(weekend_days_between(x, y), weekend_days_between(y, x));
        }

        #[test]
        fn weekend_count_never_exceeds_span(a in 0i64..3000, len in 0i64..400) {
            let from = d(2018, 1, 1) + chrono::Duration::days(a);
            let to = from + chrono::Duration::days(len);
            let weekends = weekend_days_between(from, to);
            prop_assert!(weekends <= len + 1);
            // every full week holds exactly two weekend days
            prop_assert!(weekends >= (len + 1) / 7 * 2);
        }
    }
}
