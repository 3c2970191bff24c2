use chrono::{DateTime, Utc};

use crate::error::CoreError;

/// Closed interval of creation timestamps; both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidDateRange(format!(
                "{} is after {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(DateRange { start, end })
    }

    /// Parses RFC 3339 `date-time` bounds as sent over the wire.
    pub fn parse(start: &str, end: &str) -> Result<Self, CoreError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, CoreError> {
    DateTime::parse_from_rfc3339(input.trim())
        .map(|value| value.with_timezone(&Utc))
        .map_err(|_| CoreError::InvalidDateRange(input.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_full_range() {
        let range = DateRange::parse("2024-01-01T00:00:00Z", "2024-02-01T00:00:00+02:00").unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 1, 31, 22, 0, 0).unwrap());
    }

    #[test]
    fn contains_is_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let range = DateRange::new(start, end).unwrap();
        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(end + chrono::Duration::microseconds(1)));
    }

    #[test]
    fn reject_inverted_range() {
        assert!(DateRange::parse("2021-01-01T00:00:00Z", "2020-01-01T00:00:00Z").is_err());
    }

    #[test]
    fn reject_plain_dates() {
        assert!(DateRange::parse("2021-01-01", "2021-02-01").is_err());
    }
}
