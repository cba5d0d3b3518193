//! Calendar feature derivation.
//!
//! Turns a location identifier and an ISO-8601 timestamp into the feature
//! vector the demand model was trained on. Timestamps are read as written:
//! an explicit UTC offset is kept, never converted.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Timelike};

use crate::error::ValidationError;
use crate::schema::LocationId;

const SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Source of "now" for requests without a timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock, read on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Model inputs for one location at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub location_id: LocationId,
    /// 0..=23
    pub hour: u32,
    /// Monday = 0 through Sunday = 6
    pub day_of_week: u32,
    /// 1..=31
    pub day_of_month: u32,
    /// 1..=12
    pub month: u32,
}

impl FeatureVector {
    pub fn from_datetime(location_id: LocationId, dt: &NaiveDateTime) -> Self {
        Self {
            location_id,
            hour: dt.hour(),
            day_of_week: dt.weekday().num_days_from_monday(),
            day_of_month: dt.day(),
            month: dt.month(),
        }
    }
}

/// Features together with the timestamp string they were derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub features: FeatureVector,
    pub timestamp: String,
}

pub struct FeatureExtractor<C = SystemClock> {
    clock: C,
}

impl FeatureExtractor<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl Default for FeatureExtractor<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> FeatureExtractor<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Derive features, defaulting the timestamp to the clock's current time.
    pub fn extract(
        &self,
        location_id: LocationId,
        timestamp: Option<&str>,
    ) -> Result<Extracted, ValidationError> {
        let timestamp = match timestamp {
            Some(ts) => ts.to_string(),
            None => isoformat(&self.clock.now()),
        };
        let dt = parse_timestamp(&timestamp)?;

        Ok(Extracted {
            features: FeatureVector::from_datetime(location_id, &dt),
            timestamp,
        })
    }
}

/// ISO-8601 rendering with microseconds, omitted entirely when zero.
pub fn isoformat(dt: &NaiveDateTime) -> String {
    let micros = dt.nanosecond() / 1_000;
    if micros == 0 {
        dt.format(SECONDS_FORMAT).to_string()
    } else {
        format!("{}.{:06}", dt.format(SECONDS_FORMAT), micros)
    }
}

/// Parse an ISO-8601 date or date-time, keeping the wall-clock fields of any
/// offset as they appear in the input.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, ValidationError> {
    let bad = || ValidationError::BadTimestamp(input.to_string());

    // `Z` is shorthand for a zero offset
    let normalized = match input.strip_suffix('Z').or_else(|| input.strip_suffix('z')) {
        Some(rest) if rest.len() > 10 => format!("{rest}+00:00"),
        _ => input.to_string(),
    };

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.naive_local());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt);
        }
    }
    // reduced precision `YYYY-MM-DDTHH`
    if let (Some(date), Some(sep), Some(hour)) = (
        normalized.get(..10),
        normalized.get(10..11),
        normalized.get(11..),
    ) {
        if matches!(sep, "T" | " ") && hour.len() == 2 {
            let padded = format!("{date}T{hour}:00");
            if let Ok(dt) = NaiveDateTime::parse_from_str(&padded, "%Y-%m-%dT%H:%M") {
                return Ok(dt);
            }
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).ok_or_else(bad);
    }

    Err(bad())
}
