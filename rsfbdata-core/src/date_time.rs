//! Firebird date, time and timestamp encoding
//!
//! Dates are days since 1858-11-17, times are 1/10000 of a second since midnight.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::{ibase::ISC_TIME_SECONDS_PRECISION, FbError};

/// `num_days_from_ce` of 1858-11-17
const FB_EPOCH_CE_DAYS: i32 = 678_576;

const NANOS_PER_FRACTION: u32 = 1_000_000_000 / ISC_TIME_SECONDS_PRECISION;

/// Convert a chrono date to the firebird format
pub fn encode_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - FB_EPOCH_CE_DAYS
}

/// Convert a firebird date to a chrono date
pub fn decode_date(days: i32) -> Result<NaiveDate, FbError> {
    days.checked_add(FB_EPOCH_CE_DAYS)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| FbError::conversion("Date", format!("invalid date: {} days", days)))
}

/// Convert a chrono time to the firebird format. Precision below 100µs is lost.
pub fn encode_time(time: NaiveTime) -> u32 {
    // Leap seconds are kept in the last fraction of the second
    let nanos = time.nanosecond().min(999_999_999);

    time.num_seconds_from_midnight() * ISC_TIME_SECONDS_PRECISION + nanos / NANOS_PER_FRACTION
}

/// Convert a firebird time to a chrono time
pub fn decode_time(time: u32) -> Result<NaiveTime, FbError> {
    NaiveTime::from_num_seconds_from_midnight_opt(
        time / ISC_TIME_SECONDS_PRECISION,
        (time % ISC_TIME_SECONDS_PRECISION) * NANOS_PER_FRACTION,
    )
    .ok_or_else(|| FbError::conversion("Time", format!("invalid time: {}", time)))
}

/// Convert a chrono timestamp to the firebird `(date, time)` pair
pub fn encode_timestamp(dt: NaiveDateTime) -> (i32, u32) {
    (encode_date(dt.date()), encode_time(dt.time()))
}

/// Convert a firebird `(date, time)` pair to a chrono timestamp
pub fn decode_timestamp(date: i32, time: u32) -> Result<NaiveDateTime, FbError> {
    Ok(NaiveDateTime::new(decode_date(date)?, decode_time(time)?))
}
