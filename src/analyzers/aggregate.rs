use chrono::Utc;
use tracing::{debug, info, trace, warn};

use crate::analyzers::types::{DayTypeTraffic, HourlyTraffic, TrafficSummary, WeatherTraffic};
use crate::parser::{Ingested, Record};
use crate::temporal::{DayType, DerivedRecord, derive_all};

/// Buckets traffic volume by hour of day.
pub fn hourly(derived: &[DerivedRecord<'_>]) -> HourlyTraffic {
    let mut hourly = HourlyTraffic::default();
    for d in derived {
        if !hourly.add(d.hour, d.record.traffic_volume) {
            warn!(hour = d.hour, timestamp = %d.record.timestamp, "Hour out of range, skipped");
        }
    }
    hourly
}

/// Splits traffic volume into weekday and weekend groups.
pub fn by_day_type(derived: &[DerivedRecord<'_>]) -> DayTypeTraffic {
    let mut split = DayTypeTraffic::default();
    for d in derived {
        trace!(weekday = d.weekday_name(), day_type = ?d.day_type(), "Day type assigned");
        match d.day_type() {
            DayType::Weekday => split.weekday.add(d.record.traffic_volume),
            DayType::Weekend => split.weekend.add(d.record.traffic_volume),
        }
    }
    split
}

/// Splits traffic volume on a precipitation reading: positive is wet, zero is dry.
pub fn by_precipitation(records: &[Record], reading: impl Fn(&Record) -> f64) -> WeatherTraffic {
    let mut split = WeatherTraffic::default();
    for record in records {
        let value = reading(record);
        if value > 0.0 {
            split.wet.add(record.traffic_volume);
        } else if value == 0.0 {
            split.dry.add(record.traffic_volume);
        } else {
            split.unclassified += 1;
        }
    }
    split
}

pub fn by_rainfall(records: &[Record]) -> WeatherTraffic {
    by_precipitation(records, |r| r.rainfall)
}

pub fn by_snowfall(records: &[Record]) -> WeatherTraffic {
    by_precipitation(records, |r| r.snowfall)
}

/// Runs every grouping pass over an ingested batch.
///
/// Hour and day-type groups only see records whose timestamp parsed. The
/// weather groups see every accepted record, dated or not.
#[tracing::instrument(skip_all, fields(records = ingested.records.len()))]
pub fn summarize(source: &str, ingested: Ingested) -> TrafficSummary {
    let Ingested {
        records,
        rows_read,
        rejected,
        samples,
        blank_lines,
    } = ingested;

    let (derived, undated) = derive_all(&records);
    if undated > 0 {
        warn!(undated, "Records with unparseable timestamps left out of hourly and day-type groups");
    }

    let hourly = hourly(&derived);
    let peak_hour = hourly.peak_hour();
    let day_type = by_day_type(&derived);
    let rain = by_rainfall(&records);
    let snow = by_snowfall(&records);

    debug!(
        hourly_count = hourly.total_count(),
        rain_unclassified = rain.unclassified,
        snow_unclassified = snow.unclassified,
        "Grouping passes done"
    );
    info!(%peak_hour, "Aggregation complete");

    TrafficSummary {
        generated_at: Utc::now(),
        source: source.to_string(),
        rows_read,
        rows_loaded: records.len(),
        rows_skipped: rejected,
        skipped_samples: samples,
        blank_lines,
        undated,
        hourly,
        peak_hour,
        day_type,
        rain,
        snow,
    }
}
