//! Data types produced by the aggregation pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::analyzers::utility::average;
use crate::parser::RejectedRow;

pub const HOURS_PER_DAY: usize = 24;

/// Running sum and count for one partition key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub sum: i128,
    pub count: usize,
}

impl Bucket {
    pub fn add(&mut self, volume: i64) {
        self.sum += i128::from(volume);
        self.count += 1;
    }

    /// 0.0 when the bucket is empty.
    pub fn average(&self) -> f64 {
        average(self.sum, self.count)
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Bucket", 3)?;
        s.serialize_field("sum", &self.sum)?;
        s.serialize_field("count", &self.count)?;
        s.serialize_field("average", &self.average())?;
        s.end()
    }
}

/// Traffic volume bucketed by hour of day.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HourlyTraffic {
    pub buckets: [Bucket; HOURS_PER_DAY],
    /// Hours outside 0..24 that were refused.
    pub out_of_range: usize,
}

impl HourlyTraffic {
    /// Adds `volume` to the bucket for `hour`. Returns false, leaving the
    /// buckets untouched, when `hour` is not a valid hour of day.
    pub fn add(&mut self, hour: u32, volume: i64) -> bool {
        match self.buckets.get_mut(hour as usize) {
            Some(bucket) => {
                bucket.add(volume);
                true
            }
            None => {
                self.out_of_range += 1;
                false
            }
        }
    }

    pub fn averages(&self) -> [f64; HOURS_PER_DAY] {
        self.buckets.map(|b| b.average())
    }

    pub fn total_count(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Hour with the highest average; earliest hour wins a tie.
    pub fn peak_hour(&self) -> PeakHour {
        PeakHour::from_buckets(&self.buckets)
    }
}

/// The busiest hour, or an explicit marker when there is no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum PeakHour {
    Hour(u32),
    NotApplicable,
}

impl PeakHour {
    /// Picks the populated bucket with the highest positive average. Empty
    /// buckets never qualify, so a day with no positive traffic is `NotApplicable`.
    pub fn from_buckets(buckets: &[Bucket]) -> Self {
        let mut best: Option<(usize, f64)> = None;
        for (hour, bucket) in buckets.iter().enumerate() {
            if bucket.count == 0 {
                continue;
            }
            let avg = bucket.average();
            if avg > 0.0 && best.is_none_or(|(_, top)| avg > top) {
                best = Some((hour, avg));
            }
        }

        match best {
            Some((hour, _)) => PeakHour::Hour(hour as u32),
            None => PeakHour::NotApplicable,
        }
    }
}

impl fmt::Display for PeakHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeakHour::Hour(h) => write!(f, "{h}:00"),
            PeakHour::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// Weekday versus weekend traffic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DayTypeTraffic {
    pub weekday: Bucket,
    pub weekend: Bucket,
}

/// Traffic split on whether a precipitation reading is positive or zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct WeatherTraffic {
    /// Reading > 0.
    pub wet: Bucket,
    /// Reading == 0.
    pub dry: Bucket,
    /// Negative or NaN readings, counted in neither group.
    pub unclassified: usize,
}

/// Everything the report needs from one run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrafficSummary {
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub rows_read: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub skipped_samples: Vec<RejectedRow>,
    /// Empty lines in the source, not counted as rows.
    pub blank_lines: usize,
    /// Accepted records whose timestamp did not parse.
    pub undated: usize,
    pub hourly: HourlyTraffic,
    pub peak_hour: PeakHour,
    pub day_type: DayTypeTraffic,
    pub rain: WeatherTraffic,
    pub snow: WeatherTraffic,
}
