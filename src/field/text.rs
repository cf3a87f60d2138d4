//! `CHAR` and `VARCHAR` columns

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rsfbdata_core::{Charset, FbError, SqlData, XSqlVar};
use std::str::FromStr;

use super::numeric;

const LONG_TRUE: &str = "TRUE";
const LONG_FALSE: &str = "FALSE";
const SHORT_TRUE: &str = "Y";
const SHORT_FALSE: &str = "N";
const SHORT_TRUE_2: &str = "T";

pub(super) fn raw(var: &XSqlVar) -> Result<&[u8], FbError> {
    match var.data() {
        Some(SqlData::Text(bytes)) => Ok(bytes),
        other => Err(FbError::illegal_state(format!(
            "Expected a text value, found {:?}",
            other
        ))),
    }
}

pub(super) fn decode(bytes: &[u8], charset: &Charset, trim: bool) -> Result<String, FbError> {
    let s = charset.decode(bytes)?;

    Ok(if trim {
        s.trim_end_matches(' ').to_string()
    } else {
        s.into_owned()
    })
}

/// Encodes the string, failing if it does not fit in the column
pub(super) fn encode(s: &str, charset: &Charset, var: &XSqlVar) -> Result<SqlData, FbError> {
    let bytes = charset.encode(s)?;
    check_len(bytes.len(), var)?;

    Ok(SqlData::Text(bytes.into_owned()))
}

pub(super) fn check_len(len: usize, var: &XSqlVar) -> Result<(), FbError> {
    let max = var.sqllen.max(0) as usize;

    if len > max {
        return Err(FbError::conversion(
            "String",
            format!("Data truncation: {} bytes for a column of {} bytes", len, max),
        ));
    }

    Ok(())
}

pub(super) fn parse_integral(s: &str, target: &'static str) -> Result<i128, FbError> {
    s.trim()
        .parse::<i128>()
        .map_err(|_| FbError::conversion(target, format!("can't parse '{}'", s.trim())))
}

pub(super) fn parse_f64(s: &str, target: &'static str) -> Result<f64, FbError> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| FbError::conversion(target, format!("can't parse '{}'", s.trim())))
}

pub(super) fn parse_f32(s: &str) -> Result<f32, FbError> {
    numeric::narrow_float(parse_f64(s, "float")?, "float")
}

/// `TRUE`, `Y` and `T` are true, ignoring the case. Anything else is false.
pub(super) fn parse_bool(s: &str) -> bool {
    let s = s.trim();

    [LONG_TRUE, SHORT_TRUE, SHORT_TRUE_2]
        .iter()
        .any(|t| s.eq_ignore_ascii_case(t))
}

/// Boolean text that fits in a column of `sqllen` bytes
pub(super) fn bool_text(value: bool, sqllen: i16) -> &'static str {
    match (value, sqllen as usize >= LONG_FALSE.len()) {
        (true, true) => LONG_TRUE,
        (false, true) => LONG_FALSE,
        (true, false) => SHORT_TRUE,
        (false, false) => SHORT_FALSE,
    }
}

pub(super) fn parse_date(s: &str) -> Result<NaiveDate, FbError> {
    NaiveDate::from_str(s.trim())
        .map_err(|e| FbError::conversion("Date", format!("can't parse '{}': {}", s.trim(), e)))
}

pub(super) fn parse_time(s: &str) -> Result<NaiveTime, FbError> {
    NaiveTime::from_str(s.trim())
        .map_err(|e| FbError::conversion("Time", format!("can't parse '{}': {}", s.trim(), e)))
}

pub(super) fn parse_timestamp(s: &str) -> Result<NaiveDateTime, FbError> {
    let s = s.trim();

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::from_str(s))
        .map_err(|e| FbError::conversion("Timestamp", format!("can't parse '{}': {}", s, e)))
}
