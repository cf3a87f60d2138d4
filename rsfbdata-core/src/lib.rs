//! Types, traits and constants shared by the firebird data marshaling
//! engine and the implementations of the database access layer

pub mod charset;
mod connection;
pub mod date_time;
pub(crate) mod error;
pub mod ibase;
mod params;
mod row;

pub use charset::Charset;
pub use connection::*;
pub use error::FbError;
pub use params::*;
pub use row::*;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, PartialEq)]
/// Column value as a rust type, used by the dynamic getters and setters
pub enum SqlType {
    Null,

    Boolean(bool),

    Byte(i8),

    SmallInt(i16),

    Integer(i32),

    BigInt(i64),

    Float(f32),

    Double(f64),

    /// Fixed point `NUMERIC` and `DECIMAL`
    Decimal(BigDecimal),

    Text(String),

    Date(NaiveDate),

    Time(NaiveTime),

    Timestamp(NaiveDateTime),

    Binary(Vec<u8>),

    /// Blob id, not read yet
    Blob(u64),
}

impl SqlType {
    /// Returns `true` if the type is `NULL`
    pub fn is_null(&self) -> bool {
        matches!(self, Null)
    }

    /// Name of the rust side type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Null => "null",
            Boolean(_) => "boolean",
            Byte(_) => "byte",
            SmallInt(_) => "short",
            Integer(_) => "int",
            BigInt(_) => "long",
            Float(_) => "float",
            Double(_) => "double",
            Decimal(_) => "BigDecimal",
            Text(_) => "String",
            Date(_) => "Date",
            Time(_) => "Time",
            Timestamp(_) => "Timestamp",
            Binary(_) => "byte[]",
            Blob(_) => "Blob",
        }
    }
}
