use chrono::{DateTime, SecondsFormat, Utc};

use super::TimeRangeError;

/// An optional, inclusive time window used to filter analytics reports.
///
/// Either bound may be absent; each present bound is applied independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Creates a new time range, validating that start <= end when both are set.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, TimeRangeError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(TimeRangeError::InvalidRange);
            }
        }
        Ok(Self { start, end })
    }

    /// A range without bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Lower bound in storage format.
    pub fn start_key(&self) -> Option<String> {
        self.start.as_ref().map(format_timestamp)
    }

    /// Upper bound in storage format.
    pub fn end_key(&self) -> Option<String> {
        self.end.as_ref().map(format_timestamp)
    }

    /// Whether the instant falls inside the range.
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| *instant >= start)
            && self.end.is_none_or(|end| *instant <= end)
    }
}

/// Formats a timestamp the way it is stored.
///
/// Fixed-width UTC with microseconds, so lexical order equals time order.
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_valid_range_construction() {
        let range = TimeRange::new(Some(at(1)), Some(at(2))).unwrap();
        assert_eq!(range.start, Some(at(1)));
        assert_eq!(range.end, Some(at(2)));
    }

    #[test]
    fn test_open_ended_ranges_are_valid() {
        assert!(TimeRange::new(Some(at(1)), None).is_ok());
        assert!(TimeRange::new(None, Some(at(1))).is_ok());
        assert_eq!(TimeRange::new(None, None).unwrap(), TimeRange::unbounded());
    }

    #[test]
    fn test_inverted_range_returns_error() {
        let result = TimeRange::new(Some(at(2)), Some(at(1)));
        assert_eq!(result, Err(TimeRangeError::InvalidRange));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = TimeRange::new(Some(at(1)), Some(at(2))).unwrap();
        assert!(range.contains(&at(1)));
        assert!(range.contains(&at(2)));
        assert!(!range.contains(&(at(2) + Duration::seconds(1))));
        assert!(TimeRange::unbounded().contains(&at(5)));
    }

    #[test]
    fn test_format_timestamp_is_fixed_width_and_sortable() {
        let earlier = format_timestamp(&at(9));
        let later = format_timestamp(&(at(9) + Duration::microseconds(1)));
        assert_eq!(earlier, "2024-06-15T09:00:00.000000Z");
        assert_eq!(earlier.len(), later.len());
        assert!(earlier < later);
    }
}
