use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Anything that identifies a point in (civil) time a climate series can be queried at.
///
/// Climate series are indexed by the civil (wall-clock) timestamps of their source
/// data. Zoned values keep their local date and time and drop the offset, so a
/// query at 01:00 local time lands in that local day. `DateTime<Utc>` is taken as
/// its UTC wall clock.
pub trait IntoTimestamp {
    fn into_timestamp(self) -> NaiveDateTime;
}

impl IntoTimestamp for NaiveDateTime {
    fn into_timestamp(self) -> NaiveDateTime {
        self
    }
}

impl IntoTimestamp for NaiveDate {
    fn into_timestamp(self) -> NaiveDateTime {
        self.and_time(NaiveTime::MIN)
    }
}

impl IntoTimestamp for DateTime<Utc> {
    fn into_timestamp(self) -> NaiveDateTime {
        self.naive_utc()
    }
}

impl IntoTimestamp for DateTime<Local> {
    fn into_timestamp(self) -> NaiveDateTime {
        self.naive_local()
    }
}

impl IntoTimestamp for DateTime<FixedOffset> {
    fn into_timestamp(self) -> NaiveDateTime {
        self.naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_offset_timestamps_keep_local_wall_clock() {
        let zoned = DateTime::parse_from_rfc3339("2024-01-02T01:00:00+02:00").unwrap();
        assert_eq!(zoned.into_timestamp(), at(2024, 1, 2, 1));

        let west = DateTime::parse_from_rfc3339("2024-01-01T23:30:00-05:00").unwrap();
        assert_eq!(west.into_timestamp().date(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_local_and_utc_timestamps() {
        let local = Local.from_local_datetime(&at(2024, 6, 1, 12)).earliest().unwrap();
        assert_eq!(local.into_timestamp(), at(2024, 6, 1, 12));

        let utc = Utc.from_utc_datetime(&at(2024, 6, 1, 22));
        assert_eq!(utc.into_timestamp(), at(2024, 6, 1, 22));
        assert_eq!(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().into_timestamp(), at(2024, 6, 1, 0));
    }
}
