//! Conversions from rust types to column values

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::SqlType;

pub use SqlType::*;

impl From<Vec<u8>> for SqlType {
    fn from(val: Vec<u8>) -> SqlType {
        Binary(val)
    }
}

impl From<&[u8]> for SqlType {
    fn from(val: &[u8]) -> SqlType {
        Binary(val.to_vec())
    }
}

impl From<String> for SqlType {
    fn from(val: String) -> SqlType {
        Text(val)
    }
}

impl From<&str> for SqlType {
    fn from(val: &str) -> SqlType {
        Text(val.to_string())
    }
}

impl From<bool> for SqlType {
    fn from(val: bool) -> SqlType {
        Boolean(val)
    }
}

impl From<i64> for SqlType {
    fn from(val: i64) -> SqlType {
        BigInt(val)
    }
}
impl From<i32> for SqlType {
    fn from(val: i32) -> SqlType {
        Integer(val)
    }
}
impl From<i16> for SqlType {
    fn from(val: i16) -> SqlType {
        SmallInt(val)
    }
}
impl From<i8> for SqlType {
    fn from(val: i8) -> SqlType {
        Byte(val)
    }
}
impl From<u32> for SqlType {
    fn from(val: u32) -> SqlType {
        BigInt(val as i64)
    }
}
impl From<u16> for SqlType {
    fn from(val: u16) -> SqlType {
        Integer(val as i32)
    }
}
impl From<u8> for SqlType {
    fn from(val: u8) -> SqlType {
        SmallInt(val as i16)
    }
}

impl From<f64> for SqlType {
    fn from(val: f64) -> SqlType {
        Double(val)
    }
}
impl From<f32> for SqlType {
    fn from(val: f32) -> SqlType {
        Float(val)
    }
}

impl From<BigDecimal> for SqlType {
    fn from(val: BigDecimal) -> SqlType {
        Decimal(val)
    }
}

impl From<NaiveDate> for SqlType {
    fn from(val: NaiveDate) -> SqlType {
        Date(val)
    }
}
impl From<NaiveTime> for SqlType {
    fn from(val: NaiveTime) -> SqlType {
        Time(val)
    }
}
impl From<NaiveDateTime> for SqlType {
    fn from(val: NaiveDateTime) -> SqlType {
        Timestamp(val)
    }
}

/// Implements `From` for all nullable variants
impl<T> From<Option<T>> for SqlType
where
    T: Into<SqlType>,
{
    fn from(val: Option<T>) -> SqlType {
        match val {
            None => Null,
            Some(v) => v.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_types() {
        assert_eq!(SqlType::from(5i16), SmallInt(5));
        assert_eq!(SqlType::from(200u8), SmallInt(200));
        assert_eq!(SqlType::from(u32::MAX), BigInt(u32::MAX as i64));
        assert_eq!(SqlType::from("a"), Text("a".to_string()));
        assert_eq!(SqlType::from(None::<i32>), Null);
        assert_eq!(SqlType::from(Some(1.5f64)), Double(1.5));
        assert!(SqlType::from(None::<String>).is_null());
    }
}
