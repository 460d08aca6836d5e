//! Locale rules for turning raw strings into numbers and timestamps.

use bon::Builder;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Culture-specific parsing rules applied to every primitive value the binder reads.
///
/// Use [`Culture::invariant()`] for `1,234.5`-style numbers and ISO dates,
/// [`Culture::german()`] for `1.234,5`-style numbers and `dd.mm.yyyy` dates, or
/// build one from scratch:
///
/// ```
/// use climatestore::Culture;
///
/// let culture = Culture::builder()
///     .decimal_separator(',')
///     .group_separator(' ')
///     .build();
/// assert_eq!(culture.parse_number("1 234,5"), Some(1234.5));
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Culture {
    #[builder(default = '.')]
    decimal_separator: char,
    group_separator: Option<char>,
    #[builder(default = invariant_datetime_formats())]
    datetime_formats: Vec<String>,
    #[builder(default = invariant_date_formats())]
    date_formats: Vec<String>,
    /// Values starting with this marker count as "no value" (spreadsheet `#N/A`).
    #[builder(into, default = "#".to_string())]
    missing_marker: String,
}

fn invariant_datetime_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%m/%d/%Y %H:%M:%S",
    ]
    .map(String::from)
    .to_vec()
}

fn invariant_date_formats() -> Vec<String> {
    ["%Y-%m-%d", "%m/%d/%Y"].map(String::from).to_vec()
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}

impl Culture {
    pub fn invariant() -> Self {
        Culture::builder().group_separator(',').build()
    }

    pub fn german() -> Self {
        Culture::builder()
            .decimal_separator(',')
            .group_separator('.')
            .datetime_formats(
                [
                    "%d.%m.%Y %H:%M:%S",
                    "%d.%m.%Y %H:%M",
                    "%Y-%m-%d %H:%M:%S",
                    "%Y-%m-%dT%H:%M:%S",
                ]
                .map(String::from)
                .to_vec(),
            )
            .date_formats(["%d.%m.%Y", "%Y-%m-%d"].map(String::from).to_vec())
            .build()
    }

    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    /// True for blank values and values starting with the missing marker.
    pub fn is_missing(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty()
            || (!self.missing_marker.is_empty() && trimmed.starts_with(&self.missing_marker))
    }

    /// Parses a decimal number written in this culture.
    ///
    /// Group separators are accepted in the integer part only, and only between
    /// complete groups of three digits (`"1,234.5"`, `"1.234,5"`). Anything else
    /// is rejected, so `"12.5"` under a `,` culture is an error rather than `125`.
    pub fn parse_number(&self, raw: &str) -> Option<f64> {
        let raw = raw.trim();
        let (integer, fraction) = match raw.split_once(self.decimal_separator) {
            Some((integer, fraction)) => (integer, Some(fraction)),
            None => (raw, None),
        };
        let mut normalized = self.ungroup(integer)?;
        if normalized.contains('.') {
            return None;
        }
        if let Some(fraction) = fraction {
            normalized.push('.');
            normalized.push_str(fraction);
        }
        normalized.parse().ok()
    }

    pub fn parse_integer(&self, raw: &str) -> Option<i64> {
        self.ungroup(raw.trim())?.parse().ok()
    }

    fn ungroup(&self, integer: &str) -> Option<String> {
        let Some(separator) = self.group_separator.filter(|s| integer.contains(*s)) else {
            return Some(integer.to_string());
        };
        let digits = integer.trim_start_matches(|c: char| c == '-' || c == '+');
        let mut ungrouped = integer[..integer.len() - digits.len()].to_string();
        for (i, group) in digits.split(separator).enumerate() {
            let valid_len = if i == 0 {
                (1..=3).contains(&group.len())
            } else {
                group.len() == 3
            };
            if !valid_len || !group.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            ungrouped.push_str(group);
        }
        Some(ungrouped)
    }

    /// Parses a timestamp, trying full date-time formats before date-only ones
    /// (which resolve to midnight).
    pub fn parse_timestamp(&self, raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        self.datetime_formats
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                self.date_formats
                    .iter()
                    .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                    .map(|date| date.and_time(NaiveTime::MIN))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invariant_numbers() {
        let culture = Culture::invariant();
        assert_eq!(culture.parse_number(" 12.5 "), Some(12.5));
        assert_eq!(culture.parse_number("-0.25"), Some(-0.25));
        assert_eq!(culture.parse_number("12,5"), None);
        assert_eq!(culture.parse_number("abc"), None);
    }

    #[test]
    fn test_german_numbers() {
        let culture = Culture::german();
        assert_eq!(culture.parse_number("12,5"), Some(12.5));
        assert_eq!(culture.parse_number("12.5"), None);
    }

    #[test]
    fn test_group_separators() {
        let invariant = Culture::invariant();
        assert_eq!(invariant.parse_number("1,234.5"), Some(1234.5));
        assert_eq!(invariant.parse_number("-12,345,678"), Some(-12345678.0));
        assert_eq!(invariant.parse_number("1,23.5"), None);
        assert_eq!(invariant.parse_number("1234,567"), None);
        assert_eq!(invariant.parse_number("1.234,5"), None);
        assert_eq!(invariant.parse_integer("1,234"), Some(1234));

        let german = Culture::german();
        assert_eq!(german.parse_number("1.234,5"), Some(1234.5));
        assert_eq!(german.parse_number("1.234.567"), Some(1234567.0));
        assert_eq!(german.parse_number("1,234.5"), None);
        assert_eq!(german.parse_number("1,5.3"), None);
        assert_eq!(german.parse_integer("2.500"), Some(2500));
    }

    #[test]
    fn test_missing_values() {
        let culture = Culture::invariant();
        assert!(culture.is_missing(""));
        assert!(culture.is_missing("   "));
        assert!(culture.is_missing("#N/A"));
        assert!(!culture.is_missing("0"));
    }

    #[test]
    fn test_timestamps() {
        let invariant = Culture::invariant();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(invariant.parse_timestamp("2024-03-09"), Some(expected));
        assert_eq!(
            invariant.parse_timestamp("2024-03-09 06:30:00"),
            Some(expected + chrono::Duration::minutes(390))
        );
        assert_eq!(Culture::german().parse_timestamp("09.03.2024"), Some(expected));
        assert_eq!(invariant.parse_timestamp("09.03.2024"), None);
    }
}
