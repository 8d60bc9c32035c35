//! Shared utility functions for OCC crates.

/// Timestamp utility functions
pub mod dates {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    /// Reading timestamps in station files: "YYYY-MM-DD HH:MM"
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

    /// Day tick labels on charts, e.g. "Sat 01/06"
    pub const DAY_LABEL_FORMAT: &str = "%a %d/%m";

    /// Format a NaiveDateTime as "YYYY-MM-DD HH:MM"
    pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
        timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Parse a timestamp string in "YYYY-MM-DD HH:MM" format
    pub fn parse_timestamp(s: &str) -> anyhow::Result<NaiveDateTime> {
        Ok(NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)?)
    }

    /// Format the day part of a timestamp as "Www DD/MM"
    pub fn format_day_label(timestamp: &NaiveDateTime) -> String {
        timestamp.format(DAY_LABEL_FORMAT).to_string()
    }

    /// Midnight of the given date.
    pub fn midnight(date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::default())
    }

}

/// Inclusive iteration over calendar days
pub mod date_range {
    use chrono::{NaiveDate, TimeDelta};
    use std::mem::replace;

    /// A date range iterator that yields each date from the start date
    /// through the end date (inclusive).
    #[derive(Clone, Eq, PartialEq, Copy, Debug)]
    pub struct DateRange(pub NaiveDate, pub NaiveDate);

    impl Iterator for DateRange {
        type Item = NaiveDate;
        fn next(&mut self) -> Option<Self::Item> {
            if self.0 <= self.1 {
                let next = self.0 + TimeDelta::days(1);
                Some(replace(&mut self.0, next))
            } else {
                None
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::DateRange;
        use chrono::NaiveDate;

        #[test]
        fn test_date_range_iteration() {
            let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
            let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
            let dates: Vec<NaiveDate> = DateRange(start, end).collect();
            // 2024 is a leap year
            assert_eq!(dates.len(), 5);
            assert_eq!(dates[2], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
            assert_eq!(dates[4], end);
        }

        #[test]
        fn test_date_range_empty() {
            let start = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
            let end = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
            assert_eq!(DateRange(start, end).count(), 0);
        }
    }
}

/// Chart tick positions on a time axis
pub mod ticks {
    use crate::{date_range::DateRange, dates::midnight};
    use chrono::{NaiveDateTime, NaiveTime};

    /// Hours of the day that carry minor gridlines.
    pub const MINOR_TICK_HOURS: [u32; 4] = [0, 6, 12, 18];

    /// Every midnight within `[start, end]`.
    pub fn day_boundaries(start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
        DateRange(start.date(), end.date())
            .map(midnight)
            .filter(|t| *t >= start && *t <= end)
            .collect()
    }

    /// Every `hours` mark of every day within `[start, end]`, in order.
    pub fn hour_marks(start: NaiveDateTime, end: NaiveDateTime, hours: &[u32]) -> Vec<NaiveDateTime> {
        DateRange(start.date(), end.date())
            .flat_map(|date| {
                hours
                    .iter()
                    .filter_map(move |h| NaiveTime::from_hms_opt(*h, 0, 0).map(|t| date.and_time(t)))
            })
            .filter(|t| *t >= start && *t <= end)
            .collect()
    }

}
