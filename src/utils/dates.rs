// src/utils/dates.rs

//! Calendar-day helpers. All gameplay day boundaries are UTC, matching the
//! scheduled jobs.

use chrono::{Duration, NaiveDate, Utc};

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn yesterday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yesterday_crosses_month_boundaries() {
        let first = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(yesterday(first), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
    }
}
