//! Column descriptors and the raw values fetched into them

use bytes::Bytes;

use crate::{ibase::*, FbError};

/// Raw row as returned by the database access layer, one entry per column.
/// `None` is a `NULL` column.
pub type RawRow = Vec<Option<SqlData>>;

#[derive(Debug, Clone, PartialEq)]
/// Column value in the firebird wire representation
pub enum SqlData {
    Short(i16),
    Long(i32),
    Int64(i64),
    Float(f32),
    Double(f64),

    /// `CHAR` and `VARCHAR` bytes, in the connection charset
    Text(Vec<u8>),

    /// Days since 1858-11-17
    Date(i32),
    /// 1/10000 of a second since midnight
    Time(u32),
    Timestamp { date: i32, time: u32 },

    /// Blob, array or quad id
    Quad(u64),

    /// Blob contents already read from the server
    Cached(Bytes),
}

impl SqlData {
    /// `true` if the value can be stored in a column of the wire type
    pub fn matches(&self, wire: WireType) -> bool {
        use WireType as W;

        matches!(
            (self, wire),
            (SqlData::Short(_), W::Short)
                | (SqlData::Long(_), W::Long)
                | (SqlData::Int64(_), W::Int64)
                | (SqlData::Float(_), W::Float)
                | (SqlData::Double(_), W::Double)
                | (SqlData::Double(_), W::DFloat)
                | (SqlData::Text(_), W::Text)
                | (SqlData::Text(_), W::Varying)
                | (SqlData::Date(_), W::TypeDate)
                | (SqlData::Time(_), W::TypeTime)
                | (SqlData::Timestamp { .. }, W::Timestamp)
                | (SqlData::Quad(_), W::Blob)
                | (SqlData::Quad(_), W::Array)
                | (SqlData::Quad(_), W::Quad)
                | (SqlData::Cached(_), W::Blob)
        )
    }

    /// Name of the variant, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            SqlData::Short(_) => "SHORT",
            SqlData::Long(_) => "LONG",
            SqlData::Int64(_) => "INT64",
            SqlData::Float(_) => "FLOAT",
            SqlData::Double(_) => "DOUBLE",
            SqlData::Text(_) => "TEXT",
            SqlData::Date(_) => "DATE",
            SqlData::Time(_) => "TIME",
            SqlData::Timestamp { .. } => "TIMESTAMP",
            SqlData::Quad(_) => "QUAD",
            SqlData::Cached(_) => "CACHED",
        }
    }
}

#[derive(Debug, Clone)]
/// Column descriptor, with the value of the current row
pub struct XSqlVar {
    /// Wire type, lowest bit set when the column is nullable
    pub sqltype: i16,
    pub sqlsubtype: i16,
    pub sqlscale: i16,
    pub sqllen: i16,

    /// `SQLIND_NULL` or `SQLIND_NOT_NULL`
    pub sqlind: i16,
    pub sqldata: Option<SqlData>,

    pub sqlname: String,
    pub relname: String,
    pub ownname: String,
    pub aliasname: String,
}

impl XSqlVar {
    /// Nullable column descriptor holding `NULL`
    pub fn new(sqltype: u32, sqlsubtype: i16, sqlscale: i16, sqllen: i16) -> Self {
        XSqlVar {
            sqltype: (sqltype | 1) as i16,
            sqlsubtype,
            sqlscale,
            sqllen,
            sqlind: SQLIND_NULL,
            sqldata: None,
            sqlname: String::new(),
            relname: String::new(),
            ownname: String::new(),
            aliasname: String::new(),
        }
    }

    /// Sets the column name, also used as the alias
    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.sqlname = name.into();
        self.aliasname = self.sqlname.clone();
        self
    }

    pub fn with_alias<S: Into<String>>(mut self, alias: S) -> Self {
        self.aliasname = alias.into();
        self
    }

    pub fn with_relation<S: Into<String>>(mut self, relation: S) -> Self {
        self.relname = relation.into();
        self
    }

    pub fn wire_type(&self) -> Option<WireType> {
        WireType::from_sqltype(self.sqltype)
    }

    pub fn is_nullable(&self) -> bool {
        self.sqltype & 1 == 1
    }

    /// `true` if the current value is `NULL`
    pub fn is_null(&self) -> bool {
        self.sqlind == SQLIND_NULL || self.sqldata.is_none()
    }

    pub fn data(&self) -> Option<&SqlData> {
        if self.is_null() {
            None
        } else {
            self.sqldata.as_ref()
        }
    }

    pub fn set_null(&mut self) {
        self.sqlind = SQLIND_NULL;
        self.sqldata = None;
    }

    /// Stores a new value. The descriptor is left untouched if the value
    /// does not match the wire type.
    pub fn set_data(&mut self, data: SqlData) -> Result<(), FbError> {
        self.check_data(&data)?;

        self.sqldata = Some(data);
        self.sqlind = SQLIND_NOT_NULL;
        Ok(())
    }

    /// Fails when the value can't be stored in the column
    pub fn check_data(&self, data: &SqlData) -> Result<(), FbError> {
        match self.wire_type() {
            Some(wire) if data.matches(wire) => Ok(()),
            _ => Err(FbError::illegal_state(format!(
                "{} value can't be stored in a {} column",
                data.kind_name(),
                self.sql_type_name()
            ))),
        }
    }

    /// Copies a fetched value into the descriptor
    pub fn load(&mut self, value: Option<SqlData>) -> Result<(), FbError> {
        match value {
            Some(data) => self.set_data(data),
            None => {
                self.set_null();
                Ok(())
            }
        }
    }

    /// Name of the column type as written in sql
    pub fn sql_type_name(&self) -> String {
        let wire = match self.wire_type() {
            Some(wire) => wire,
            None => return format!("UNKNOWN ({})", self.sqltype & !1),
        };

        if wire.is_integer() && self.sqlscale != 0 {
            return if self.sqlsubtype == SUBTYPE_DECIMAL {
                "DECIMAL".to_string()
            } else {
                "NUMERIC".to_string()
            };
        }

        match wire {
            WireType::Short => "SMALLINT".to_string(),
            WireType::Long => "INTEGER".to_string(),
            WireType::Int64 => "BIGINT".to_string(),
            WireType::Float => "FLOAT".to_string(),
            WireType::Double | WireType::DFloat => "DOUBLE PRECISION".to_string(),
            WireType::Text => "CHAR".to_string(),
            WireType::Varying => "VARCHAR".to_string(),
            WireType::Timestamp => "TIMESTAMP".to_string(),
            WireType::TypeDate => "DATE".to_string(),
            WireType::TypeTime => "TIME".to_string(),
            WireType::Blob => format!("BLOB SUB_TYPE {}", self.sqlsubtype),
            WireType::Array => "ARRAY".to_string(),
            WireType::Quad => "QUAD".to_string(),
        }
    }
}
