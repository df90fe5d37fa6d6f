use chrono::{Datelike, NaiveDate};

use crate::errors::{AppError, AppResult};

/// First through last calendar day of a month, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl MonthRange {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };

        Some(Self {
            first,
            last: next.pred_opt()?,
        })
    }

    /// Parses a `YYYY-MM` key.
    pub fn parse(key: &str) -> AppResult<Self> {
        let invalid = || AppError::InvalidMonth(key.to_string());

        let (year, month) = key.trim().split_once('-').ok_or_else(invalid)?;
        let digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if year.len() != 4 || month.len() != 2 || !digits(year) || !digits(month) {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        Self::new(year, month).ok_or_else(invalid)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
            last: Self::new(date.year(), date.month())
                .map(|r| r.last)
                .unwrap_or(date),
        }
    }

    pub fn key(&self) -> String {
        self.first.format("%Y-%m").to_string()
    }

    pub fn days(&self) -> i64 {
        (self.last - self.first).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn february_in_common_year_has_28_days() {
        let range = MonthRange::parse("2026-02").unwrap();
        assert_eq!(range.first, ymd(2026, 2, 1));
        assert_eq!(range.last, ymd(2026, 2, 28));
        assert_eq!(range.days(), 28);
    }

    #[test]
    fn february_in_leap_year_has_29_days() {
        let range = MonthRange::parse("2024-02").unwrap();
        assert_eq!(range.last, ymd(2024, 2, 29));
        assert_eq!(range.days(), 29);
    }

    #[test]
    fn thirty_one_day_months_end_on_the_31st() {
        let january = MonthRange::parse("2026-01").unwrap();
        assert_eq!(january.last, ymd(2026, 1, 31));

        let december = MonthRange::parse("2026-12").unwrap();
        assert_eq!(december.first, ymd(2026, 12, 1));
        assert_eq!(december.last, ymd(2026, 12, 31));
    }

    #[test]
    fn thirty_day_month() {
        let april = MonthRange::parse("2026-04").unwrap();
        assert_eq!(april.last, ymd(2026, 4, 30));
        assert!(april.contains(ymd(2026, 4, 30)));
        assert!(!april.contains(ymd(2026, 5, 1)));
        assert!(!april.contains(ymd(2026, 3, 31)));
    }

    #[test]
    fn rejects_malformed_keys() {
        for key in ["2026-13", "2026-00", "2026-2", "26-02", "february", "", "2026-+2", "+026-02"] {
            assert!(
                matches!(MonthRange::parse(key), Err(AppError::InvalidMonth(_))),
                "{key} should be rejected"
            );
        }
    }

    #[test]
    fn range_containing_a_date_and_its_key() {
        let range = MonthRange::containing(ymd(2026, 10, 18));
        assert_eq!(range.first, ymd(2026, 10, 1));
        assert_eq!(range.last, ymd(2026, 10, 31));
        assert_eq!(range.key(), "2026-10");
    }
}
