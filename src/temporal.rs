//! Calendar features derived from record timestamps.

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use tracing::debug;

use crate::parser::Record;

/// Timestamp layout of the sensor export.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Monday through Friday versus Saturday and Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl From<Weekday> for DayType {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Sat | Weekday::Sun => DayType::Weekend,
            _ => DayType::Weekday,
        }
    }
}

/// Full English name of a day.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// A record whose timestamp parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedRecord<'a> {
    pub record: &'a Record,
    pub hour: u32,
    pub weekday: Weekday,
}

impl DerivedRecord<'_> {
    pub fn day_type(&self) -> DayType {
        self.weekday.into()
    }

    pub fn weekday_name(&self) -> &'static str {
        weekday_name(self.weekday)
    }
}

/// Parses `timestamp` into (hour, weekday).
pub fn extract(timestamp: &str) -> Option<(u32, Weekday)> {
    let dt = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
    Some((dt.hour(), dt.weekday()))
}

/// Derives features for every record, returning them with the number of
/// records whose timestamp did not parse.
pub fn derive_all(records: &[Record]) -> (Vec<DerivedRecord<'_>>, usize) {
    let mut undated = 0;
    let derived = records
        .iter()
        .filter_map(|record| match extract(&record.timestamp) {
            Some((hour, weekday)) => Some(DerivedRecord {
                record,
                hour,
                weekday,
            }),
            None => {
                debug!(timestamp = %record.timestamp, "Unparseable timestamp");
                undated += 1;
                None
            }
        })
        .collect();

    (derived, undated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: &str) -> Record {
        Record {
            timestamp: timestamp.to_string(),
            traffic_volume: 100,
            rainfall: 0.0,
            snowfall: 0.0,
        }
    }

    #[test]
    fn test_extract_valid() {
        // 2023-01-01 was a Sunday
        assert_eq!(extract("2023-01-01 08:15:00"), Some((8, Weekday::Sun)));
        assert_eq!(extract("2023-01-02 23:59:59"), Some((23, Weekday::Mon)));
    }

    #[test]
    fn test_extract_rejects_other_formats() {
        assert_eq!(extract("01/01/2023 08:00"), None);
        assert_eq!(extract("2023-01-01T08:00:00"), None);
        assert_eq!(extract("2023-01-01 25:00:00"), None);
        assert_eq!(extract(""), None);
    }

    #[test]
    fn test_day_type_partition() {
        let weekend = [Weekday::Sat, Weekday::Sun];
        for day in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            let expected = if weekend.contains(&day) {
                DayType::Weekend
            } else {
                DayType::Weekday
            };
            assert_eq!(DayType::from(day), expected);
        }
    }

    #[test]
    fn test_weekday_names() {
        assert_eq!(weekday_name(Weekday::Mon), "Monday");
        assert_eq!(weekday_name(Weekday::Sun), "Sunday");
    }

    #[test]
    fn test_derive_all_skips_bad_timestamps() {
        let records = vec![
            record("2023-01-06 17:00:00"),
            record("not a date"),
            record("2023-01-07 06:30:00"),
        ];
        let (derived, undated) = derive_all(&records);

        assert_eq!(undated, 1);
        assert_eq!(derived.len(), 2);
        assert_eq!(derived[0].hour, 17);
        assert_eq!(derived[0].weekday_name(), "Friday");
        assert_eq!(derived[1].day_type(), DayType::Weekend);
        assert!(std::ptr::eq(derived[1].record, &records[2]));
    }
}
