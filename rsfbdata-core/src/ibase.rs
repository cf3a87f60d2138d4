//! Constants of the firebird client api

#![allow(non_upper_case_globals)]

use num_enum::TryFromPrimitive;
use std::convert::TryFrom;

pub const SQL_TEXT: u32 = 452;
pub const SQL_VARYING: u32 = 448;
pub const SQL_SHORT: u32 = 500;
pub const SQL_LONG: u32 = 496;
pub const SQL_FLOAT: u32 = 482;
pub const SQL_DOUBLE: u32 = 480;
pub const SQL_D_FLOAT: u32 = 530;
pub const SQL_TIMESTAMP: u32 = 510;
pub const SQL_BLOB: u32 = 520;
pub const SQL_ARRAY: u32 = 540;
pub const SQL_QUAD: u32 = 550;
pub const SQL_TYPE_TIME: u32 = 560;
pub const SQL_TYPE_DATE: u32 = 570;
pub const SQL_INT64: u32 = 580;

pub const DSQL_close: u32 = 1;
pub const DSQL_drop: u32 = 2;

/// Blob subtype of untyped binary data
pub const isc_blob_untyped: i16 = 0;
/// Blob subtype of text data
pub const isc_blob_text: i16 = 1;

/// Integer subtype of a `NUMERIC(p, s)` column
pub const SUBTYPE_NUMERIC: i16 = 1;
/// Integer subtype of a `DECIMAL(p, s)` column
pub const SUBTYPE_DECIMAL: i16 = 2;

/// Null indicator of a column holding a value
pub const SQLIND_NOT_NULL: i16 = 0;
/// Null indicator of a column holding `NULL`
pub const SQLIND_NULL: i16 = -1;

/// Fractions of a second used by `ISC_TIME`
pub const ISC_TIME_SECONDS_PRECISION: u32 = 10_000;

#[repr(u32)]
#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, TryFromPrimitive)]
/// Wire type of a column, without the nullable flag
pub enum WireType {
    Short = SQL_SHORT,
    Long = SQL_LONG,
    Int64 = SQL_INT64,
    Float = SQL_FLOAT,
    Double = SQL_DOUBLE,
    DFloat = SQL_D_FLOAT,
    Text = SQL_TEXT,
    Varying = SQL_VARYING,
    Timestamp = SQL_TIMESTAMP,
    TypeDate = SQL_TYPE_DATE,
    TypeTime = SQL_TYPE_TIME,
    Blob = SQL_BLOB,
    Array = SQL_ARRAY,
    Quad = SQL_QUAD,
}

impl WireType {
    /// Wire type of a raw `sqltype`, ignoring the nullable flag (lowest bit)
    pub fn from_sqltype(sqltype: i16) -> Option<WireType> {
        WireType::try_from((sqltype & !1) as u16 as u32).ok()
    }

    /// `true` for the integer families that may carry a scale
    pub fn is_integer(self) -> bool {
        matches!(self, WireType::Short | WireType::Long | WireType::Int64)
    }

    /// `true` for the column types whose value is a blob id
    pub fn is_blob(self) -> bool {
        matches!(self, WireType::Blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullable_flag_is_ignored() {
        assert_eq!(
            WireType::from_sqltype(SQL_VARYING as i16 + 1),
            Some(WireType::Varying)
        );
        assert_eq!(WireType::from_sqltype(SQL_INT64 as i16), Some(WireType::Int64));
        assert_eq!(WireType::from_sqltype(42), None);
    }
}
