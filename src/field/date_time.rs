//! `DATE`, `TIME` and `TIMESTAMP` columns

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rsfbdata_core::{date_time::*, FbError, SqlData, SqlType, XSqlVar};

use super::FieldKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Temporal {
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl Temporal {
    pub fn read(var: &XSqlVar) -> Result<Temporal, FbError> {
        match var.data() {
            Some(SqlData::Date(days)) => decode_date(*days).map(Temporal::Date),
            Some(SqlData::Time(time)) => decode_time(*time).map(Temporal::Time),
            Some(SqlData::Timestamp { date, time }) => {
                decode_timestamp(*date, *time).map(Temporal::Timestamp)
            }
            other => Err(FbError::illegal_state(format!(
                "Expected a date/time value, found {:?}",
                other
            ))),
        }
    }

    pub fn to_date(self) -> Result<NaiveDate, FbError> {
        match self {
            Temporal::Date(d) => Ok(d),
            Temporal::Timestamp(dt) => Ok(dt.date()),
            Temporal::Time(_) => Err(FbError::conversion("Date", "a TIME has no date")),
        }
    }

    pub fn to_time(self) -> Result<NaiveTime, FbError> {
        match self {
            Temporal::Time(t) => Ok(t),
            Temporal::Timestamp(dt) => Ok(dt.time()),
            Temporal::Date(_) => Err(FbError::conversion("Time", "a DATE has no time")),
        }
    }

    /// Dates are at midnight, times at 1970-01-01
    pub fn to_timestamp(self) -> Result<NaiveDateTime, FbError> {
        match self {
            Temporal::Timestamp(dt) => Ok(dt),
            Temporal::Date(d) => d
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| FbError::conversion("Timestamp", "invalid date")),
            Temporal::Time(t) => NaiveDate::from_ymd_opt(1970, 1, 1)
                .map(|epoch| epoch.and_time(t))
                .ok_or_else(|| FbError::conversion("Timestamp", "invalid time")),
        }
    }

    pub fn to_text(self) -> String {
        match self {
            Temporal::Date(d) => d.to_string(),
            Temporal::Time(t) => t.to_string(),
            Temporal::Timestamp(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        }
    }

    pub fn to_object(self) -> SqlType {
        match self {
            Temporal::Date(d) => SqlType::Date(d),
            Temporal::Time(t) => SqlType::Time(t),
            Temporal::Timestamp(dt) => SqlType::Timestamp(dt),
        }
    }
}

/// Encodes the value for a column of the kind
pub(super) fn encode(kind: FieldKind, value: Temporal) -> Result<SqlData, FbError> {
    match kind {
        FieldKind::Date => value.to_date().map(|d| SqlData::Date(encode_date(d))),
        FieldKind::Time => value.to_time().map(|t| SqlData::Time(encode_time(t))),
        FieldKind::Timestamp => value.to_timestamp().map(|dt| {
            let (date, time) = encode_timestamp(dt);
            SqlData::Timestamp { date, time }
        }),
        _ => Err(FbError::illegal_state(format!(
            "{:?} is not a date/time column",
            kind
        ))),
    }
}
