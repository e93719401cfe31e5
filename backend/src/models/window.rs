//! Scheduling windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Half-open time window `[start, end)` covering a maintenance slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window starting at `start` and lasting `duration_hours` hours.
    ///
    /// `None` when the end falls outside the representable date range.
    pub fn from_duration(start: DateTime<Utc>, duration_hours: u32) -> Option<Self> {
        let end = start.checked_add_signed(Duration::try_hours(i64::from(duration_hours))?)?;
        Some(Self { start, end })
    }

    /// Whether `instant` falls inside the window.
    ///
    /// Booking conflicts compare only the start of an existing booking
    /// against the window, so this is the predicate the availability engine
    /// uses for both technicians and work centers.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_window_is_half_open() {
        let window = TimeWindow::from_duration(at(8), 2).unwrap();
        assert!(window.contains(at(8)));
        assert!(window.contains(at(9)));
        assert!(!window.contains(at(10)));
        assert!(!window.contains(at(7)));
    }

    #[test]
    fn test_window_duration() {
        let window = TimeWindow::from_duration(at(8), 3).unwrap();
        assert_eq!(window.duration(), Duration::hours(3));
        assert_eq!(window.end, at(11));
    }

    #[test]
    fn test_zero_hour_window_is_empty() {
        let window = TimeWindow::from_duration(at(8), 0).unwrap();
        assert!(!window.contains(at(8)));
    }

    #[test]
    fn test_window_past_calendar_end_is_none() {
        assert!(TimeWindow::from_duration(at(8), u32::MAX).is_none());
        let last = DateTime::<Utc>::MAX_UTC - Duration::minutes(30);
        assert!(TimeWindow::from_duration(last, 1).is_none());
    }
}
