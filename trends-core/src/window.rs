use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use std::fmt;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Half-open `[start, end)` range of epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    /// The full UTC calendar day before `now`.
    pub fn previous_day(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let yesterday = today
            .checked_sub_days(Days::new(1))
            .unwrap_or(NaiveDate::MIN);

        Self {
            start: midnight_utc(yesterday),
            end: midnight_utc(today),
        }
    }

    pub fn contains(&self, epoch_seconds: i64) -> bool {
        self.start <= epoch_seconds && epoch_seconds < self.end
    }

    /// The calendar day this window covers.
    pub fn snapshot_date(&self) -> NaiveDate {
        Utc.timestamp_opt(self.start, 0)
            .single()
            .map(|start| start.date_naive())
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |ts: i64| {
            Utc.timestamp_opt(ts, 0)
                .single()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| ts.to_string())
        };
        write!(f, "[{}, {})", render(self.start), render(self.end))
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_previous_day_boundaries() {
        let window = TimeWindow::previous_day(at(2024, 3, 15, 13, 45, 10));
        assert_eq!(window.start, at(2024, 3, 14, 0, 0, 0).timestamp());
        assert_eq!(window.end, at(2024, 3, 15, 0, 0, 0).timestamp());
        assert_eq!(window.end - window.start, 86_400);
        assert_eq!(
            window.snapshot_date(),
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
        );
    }

    #[test]
    fn test_previous_day_at_midnight_and_year_boundary() {
        let window = TimeWindow::previous_day(at(2025, 1, 1, 0, 0, 0));
        assert_eq!(window.start, at(2024, 12, 31, 0, 0, 0).timestamp());
        assert_eq!(window.end, at(2025, 1, 1, 0, 0, 0).timestamp());
    }

    #[test]
    fn test_previous_day_across_leap_day() {
        let window = TimeWindow::previous_day(at(2024, 3, 1, 8, 0, 0));
        assert_eq!(
            window.snapshot_date(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_window_is_half_open() {
        let window = TimeWindow::previous_day(at(2024, 3, 15, 12, 0, 0));
        assert!(window.contains(window.start));
        assert!(window.contains(window.end - 1));
        assert!(!window.contains(window.end));
        assert!(!window.contains(window.start - 1));
    }

    #[test]
    fn test_fixed_clock() {
        let instant = at(2024, 3, 15, 12, 0, 0);
        assert_eq!(FixedClock(instant).now(), instant);
    }
}
