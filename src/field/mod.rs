//! Conversion between the column values and the rust types
//!
//! The converter is chosen from the wire type, sub type and scale of the
//! column descriptor. Getters on a `NULL` column return `0`, `false` or
//! `None`.

mod blob;
mod date_time;
mod numeric;
mod text;

pub use self::blob::BinaryStream;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rsfbdata_core::{ibase::WireType, FbError, FirebirdClient, SqlData, SqlType, XSqlVar};
use std::{
    convert::TryFrom,
    io::{Cursor, Read},
};

use self::{
    date_time::Temporal,
    numeric::{NumSource, Numeric},
};
use crate::{blob::BlobValue, connection::FbConnection, handles::BlobHandles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Width of the integer backing a column
pub enum IntWidth {
    Short,
    Long,
    Int64,
}

impl IntWidth {
    /// Decimal digits of the largest value
    pub(crate) fn digits(self) -> i64 {
        match self {
            IntWidth::Short => 5,
            IntWidth::Long => 10,
            IntWidth::Int64 => 19,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Converter used for a column
pub enum FieldKind {
    SmallInt,
    Integer,
    BigInt,
    /// `NUMERIC`/`DECIMAL` stored as a scaled integer
    FixedPoint(IntWidth),
    Float,
    Double,
    /// `NUMERIC`/`DECIMAL` stored as a double (dialect 1)
    ScaledDouble,
    Char,
    VarChar,
    Date,
    Time,
    Timestamp,
    /// Blob with a negative (user defined) sub type
    Blob,
    /// `BLOB SUB_TYPE 0`
    Binary,
    /// `BLOB SUB_TYPE 1`
    LongText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Numeric,
    Text,
    Temporal,
    Blob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Types that can be requested from a column
pub enum SemanticType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    BigDecimal,
    Boolean,
    String,
    Bytes,
    Date,
    Time,
    Timestamp,
    Blob,
    BinaryStream,
    Object,
}

impl FieldKind {
    /// Selects the converter for a column.
    ///
    /// Integers with a scale are fixed point, blobs are split by sub type
    pub fn select(sqltype: i16, subtype: i16, scale: i16) -> Result<FieldKind, FbError> {
        let unsupported = || FbError::UnsupportedType {
            sqltype: sqltype & !1,
            subtype,
        };
        let wire = WireType::from_sqltype(sqltype).ok_or_else(unsupported)?;

        Ok(match wire {
            WireType::Short if scale == 0 => FieldKind::SmallInt,
            WireType::Long if scale == 0 => FieldKind::Integer,
            WireType::Int64 if scale == 0 => FieldKind::BigInt,
            WireType::Short => FieldKind::FixedPoint(IntWidth::Short),
            WireType::Long => FieldKind::FixedPoint(IntWidth::Long),
            WireType::Int64 => FieldKind::FixedPoint(IntWidth::Int64),
            WireType::Float => FieldKind::Float,
            WireType::Double | WireType::DFloat if scale == 0 => FieldKind::Double,
            WireType::Double | WireType::DFloat => FieldKind::ScaledDouble,
            WireType::Text => FieldKind::Char,
            WireType::Varying => FieldKind::VarChar,
            WireType::TypeDate => FieldKind::Date,
            WireType::TypeTime => FieldKind::Time,
            WireType::Timestamp => FieldKind::Timestamp,
            WireType::Blob if subtype < 0 => FieldKind::Blob,
            WireType::Blob if subtype == 1 => FieldKind::LongText,
            WireType::Blob => FieldKind::Binary,
            WireType::Array | WireType::Quad => return Err(unsupported()),
        })
    }

    pub fn for_var(var: &XSqlVar) -> Result<FieldKind, FbError> {
        FieldKind::select(var.sqltype, var.sqlsubtype, var.sqlscale)
    }

    pub fn int_width(self) -> Option<IntWidth> {
        match self {
            FieldKind::SmallInt => Some(IntWidth::Short),
            FieldKind::Integer => Some(IntWidth::Long),
            FieldKind::BigInt => Some(IntWidth::Int64),
            FieldKind::FixedPoint(width) => Some(width),
            _ => None,
        }
    }

    /// Name of the natural rust side type, used in conversion errors
    pub fn type_name(self) -> &'static str {
        match self {
            FieldKind::SmallInt => "short",
            FieldKind::Integer => "int",
            FieldKind::BigInt => "long",
            FieldKind::FixedPoint(_) | FieldKind::ScaledDouble => "BigDecimal",
            FieldKind::Float => "float",
            FieldKind::Double => "double",
            FieldKind::Char | FieldKind::VarChar | FieldKind::LongText => "String",
            FieldKind::Date => "Date",
            FieldKind::Time => "Time",
            FieldKind::Timestamp => "Timestamp",
            FieldKind::Blob => "Blob",
            FieldKind::Binary => "byte[]",
        }
    }

    /// Type returned by `get_object`
    pub fn semantic_type(self) -> SemanticType {
        match self {
            FieldKind::SmallInt => SemanticType::Short,
            FieldKind::Integer => SemanticType::Int,
            FieldKind::BigInt => SemanticType::Long,
            FieldKind::FixedPoint(_) | FieldKind::ScaledDouble => SemanticType::BigDecimal,
            FieldKind::Float => SemanticType::Float,
            FieldKind::Double => SemanticType::Double,
            FieldKind::Char | FieldKind::VarChar | FieldKind::LongText => SemanticType::String,
            FieldKind::Date => SemanticType::Date,
            FieldKind::Time => SemanticType::Time,
            FieldKind::Timestamp => SemanticType::Timestamp,
            FieldKind::Blob => SemanticType::Blob,
            FieldKind::Binary => SemanticType::Bytes,
        }
    }

    fn family(self) -> Family {
        match self {
            FieldKind::Char | FieldKind::VarChar => Family::Text,
            FieldKind::Date | FieldKind::Time | FieldKind::Timestamp => Family::Temporal,
            FieldKind::Blob | FieldKind::Binary | FieldKind::LongText => Family::Blob,
            _ => Family::Numeric,
        }
    }
}

/// `true` if `ty` may be requested from the column without a conversion
/// through its text form
pub fn is_compatible(var: &XSqlVar, ty: SemanticType) -> Result<bool, FbError> {
    use SemanticType as S;

    let kind = FieldKind::for_var(var)?;

    Ok(ty == S::Object
        || match kind {
            FieldKind::Char | FieldKind::VarChar => ty == S::String,
            FieldKind::Date => matches!(ty, S::Date | S::Timestamp),
            FieldKind::Time => matches!(ty, S::Time | S::Timestamp),
            FieldKind::Timestamp => matches!(ty, S::Date | S::Time | S::Timestamp),
            FieldKind::Blob => matches!(ty, S::Blob | S::BinaryStream),
            FieldKind::Binary => matches!(ty, S::Blob | S::BinaryStream | S::Bytes),
            FieldKind::LongText => {
                matches!(ty, S::Blob | S::BinaryStream | S::Bytes | S::String)
            }
            _ => matches!(
                ty,
                S::Byte
                    | S::Short
                    | S::Int
                    | S::Long
                    | S::Float
                    | S::Double
                    | S::BigDecimal
                    | S::Boolean
                    | S::String
            ),
        })
}

/// Converter bound to one column descriptor
pub struct FbField<'a, C: FirebirdClient> {
    var: &'a mut XSqlVar,
    kind: FieldKind,
    conn: &'a FbConnection<C>,
    blobs: Option<&'a BlobHandles<C>>,
    trim_strings: bool,
}

impl<'a, C: FirebirdClient> FbField<'a, C> {
    pub fn new(var: &'a mut XSqlVar, conn: &'a FbConnection<C>) -> Result<Self, FbError> {
        Self::for_cursor(var, conn, None, false)
    }

    /// Converter whose blob streams are closed with the cursor owning `blobs`
    pub(crate) fn for_cursor(
        var: &'a mut XSqlVar,
        conn: &'a FbConnection<C>,
        blobs: Option<&'a BlobHandles<C>>,
        trim_strings: bool,
    ) -> Result<Self, FbError> {
        let kind = FieldKind::for_var(var)?;

        Ok(FbField {
            var,
            kind,
            conn,
            blobs,
            trim_strings,
        })
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        self.var.is_null()
    }

    fn var(&self) -> &XSqlVar {
        &*self.var
    }

    fn incompatible(&self, target: &'static str) -> FbError {
        FbError::conversion(
            target,
            format!("can't convert a {} column", self.var().sql_type_name()),
        )
    }

    /// Decoded value of a text column
    fn text(&self) -> Result<String, FbError> {
        let trim = self.trim_strings && self.kind == FieldKind::Char;

        text::decode(text::raw(self.var())?, self.conn.charset(), trim)
    }

    fn integral<T: TryFrom<i128> + Default>(&self, target: &'static str) -> Result<T, FbError> {
        if self.is_null() {
            return Ok(T::default());
        }

        let v = match self.kind.family() {
            Family::Numeric => Numeric::read(self.var(), self.kind)?.integral(target)?,
            Family::Text => text::parse_integral(&self.text()?, target)?,
            _ => return Err(self.incompatible(target)),
        };

        numeric::narrow(v, target)
    }

    pub fn get_byte(&self) -> Result<i8, FbError> {
        self.integral("byte")
    }

    pub fn get_short(&self) -> Result<i16, FbError> {
        self.integral("short")
    }

    pub fn get_int(&self) -> Result<i32, FbError> {
        self.integral("int")
    }

    pub fn get_long(&self) -> Result<i64, FbError> {
        self.integral("long")
    }

    pub fn get_float(&self) -> Result<f32, FbError> {
        if self.is_null() {
            return Ok(0.0);
        }

        match self.kind.family() {
            Family::Numeric => Numeric::read(self.var(), self.kind)?.to_f32("float"),
            Family::Text => text::parse_f32(&self.text()?),
            _ => Err(self.incompatible("float")),
        }
    }

    pub fn get_double(&self) -> Result<f64, FbError> {
        if self.is_null() {
            return Ok(0.0);
        }

        match self.kind.family() {
            Family::Numeric => Ok(Numeric::read(self.var(), self.kind)?.to_f64()),
            Family::Text => text::parse_f64(&self.text()?, "double"),
            _ => Err(self.incompatible("double")),
        }
    }

    pub fn get_big_decimal(&self) -> Result<Option<BigDecimal>, FbError> {
        if self.is_null() {
            return Ok(None);
        }

        match self.kind.family() {
            Family::Numeric => Numeric::read(self.var(), self.kind)?
                .to_decimal("BigDecimal")
                .map(Some),
            Family::Text => numeric::parse_decimal(&self.text()?, "BigDecimal").map(Some),
            _ => Err(self.incompatible("BigDecimal")),
        }
    }

    pub fn get_boolean(&self) -> Result<bool, FbError> {
        if self.is_null() {
            return Ok(false);
        }

        match self.kind.family() {
            Family::Numeric => Ok(Numeric::read(self.var(), self.kind)?.is_true()),
            Family::Text => Ok(text::parse_bool(&self.text()?)),
            _ => Err(self.incompatible("boolean")),
        }
    }

    pub fn get_string(&self) -> Result<Option<String>, FbError> {
        if self.is_null() {
            return Ok(None);
        }

        let s = match self.kind.family() {
            Family::Numeric => Numeric::read(self.var(), self.kind)?.to_text(),
            Family::Text => self.text()?,
            Family::Temporal => Temporal::read(self.var())?.to_text(),
            Family::Blob => {
                let bytes = blob::read_bytes(self.var(), self.conn)?;
                self.conn.charset().decode(&bytes)?.into_owned()
            }
        };

        Ok(Some(s))
    }

    pub fn get_bytes(&self) -> Result<Option<Vec<u8>>, FbError> {
        if self.is_null() {
            return Ok(None);
        }

        match self.kind.family() {
            Family::Text => Ok(Some(text::raw(self.var())?.to_vec())),
            Family::Blob => Ok(Some(blob::read_bytes(self.var(), self.conn)?.to_vec())),
            _ => Err(self.incompatible("byte[]")),
        }
    }

    fn temporal(&self, target: &'static str) -> Result<Option<Temporal>, FbError> {
        if self.is_null() {
            return Ok(None);
        }

        match self.kind.family() {
            Family::Temporal => Temporal::read(self.var()).map(Some),
            Family::Text => {
                let s = self.text()?;
                let value = match target {
                    "Date" => Temporal::Date(text::parse_date(&s)?),
                    "Time" => Temporal::Time(text::parse_time(&s)?),
                    _ => Temporal::Timestamp(text::parse_timestamp(&s)?),
                };

                Ok(Some(value))
            }
            _ => Err(self.incompatible(target)),
        }
    }

    pub fn get_date(&self) -> Result<Option<NaiveDate>, FbError> {
        self.temporal("Date")?.map(Temporal::to_date).transpose()
    }

    pub fn get_time(&self) -> Result<Option<NaiveTime>, FbError> {
        self.temporal("Time")?.map(Temporal::to_time).transpose()
    }

    pub fn get_timestamp(&self) -> Result<Option<NaiveDateTime>, FbError> {
        self.temporal("Timestamp")?
            .map(Temporal::to_timestamp)
            .transpose()
    }

    pub fn get_blob(&self) -> Result<Option<BlobValue<C>>, FbError> {
        if self.is_null() {
            return Ok(None);
        }

        match self.kind.family() {
            Family::Blob => blob::get_blob(self.var(), self.conn).map(Some),
            _ => Err(self.incompatible("Blob")),
        }
    }

    /// Reader over the column bytes. Blob read sessions opened through a
    /// cursor are closed with it.
    pub fn get_binary_stream(&self) -> Result<Option<BinaryStream<C>>, FbError> {
        if self.is_null() {
            return Ok(None);
        }

        match self.kind.family() {
            Family::Blob => blob::stream(self.var(), self.conn, self.blobs).map(Some),
            Family::Text => {
                let bytes = Bytes::copy_from_slice(text::raw(self.var())?);
                Ok(Some(BinaryStream::Memory(Cursor::new(bytes))))
            }
            _ => Err(self.incompatible("BinaryStream")),
        }
    }

    pub fn get_object(&self) -> Result<SqlType, FbError> {
        if self.is_null() {
            return Ok(SqlType::Null);
        }

        match self.kind.family() {
            Family::Numeric => Numeric::read(self.var(), self.kind)?.to_object(self.kind),
            Family::Text => self.text().map(SqlType::Text),
            Family::Temporal => Ok(Temporal::read(self.var())?.to_object()),
            Family::Blob => blob::object(self.kind, self.var(), self.conn),
        }
    }

    pub fn set_null(&mut self) {
        self.var.set_null();
    }

    fn set_numeric(&mut self, src: NumSource, source: &'static str) -> Result<(), FbError> {
        let data = match self.kind.family() {
            Family::Numeric => numeric::encode(self.kind, self.var.sqlscale, src)?,
            Family::Text => text::encode(&src.to_text(), self.conn.charset(), self.var())?,
            _ => return Err(self.incompatible(source)),
        };

        self.var.set_data(data)
    }

    pub fn set_byte(&mut self, value: i8) -> Result<(), FbError> {
        self.set_numeric(NumSource::Integral(value.into()), "byte")
    }

    pub fn set_short(&mut self, value: i16) -> Result<(), FbError> {
        self.set_numeric(NumSource::Integral(value.into()), "short")
    }

    pub fn set_int(&mut self, value: i32) -> Result<(), FbError> {
        self.set_numeric(NumSource::Integral(value.into()), "int")
    }

    pub fn set_long(&mut self, value: i64) -> Result<(), FbError> {
        self.set_numeric(NumSource::Integral(value.into()), "long")
    }

    pub fn set_float(&mut self, value: f32) -> Result<(), FbError> {
        self.set_numeric(NumSource::Real(value.into()), "float")
    }

    pub fn set_double(&mut self, value: f64) -> Result<(), FbError> {
        self.set_numeric(NumSource::Real(value), "double")
    }

    /// Fixed point columns round the value half up to their scale
    pub fn set_big_decimal(&mut self, value: &BigDecimal) -> Result<(), FbError> {
        self.set_numeric(NumSource::Decimal(value.clone()), "BigDecimal")
    }

    pub fn set_boolean(&mut self, value: bool) -> Result<(), FbError> {
        match self.kind.family() {
            Family::Text => {
                let s = text::bool_text(value, self.var.sqllen);
                let data = text::encode(s, self.conn.charset(), self.var())?;
                self.var.set_data(data)
            }
            Family::Numeric => self.set_numeric(NumSource::Integral(value as i128), "boolean"),
            _ => Err(self.incompatible("boolean")),
        }
    }

    pub fn set_string(&mut self, value: &str) -> Result<(), FbError> {
        let data = match self.kind.family() {
            Family::Numeric => numeric::encode(
                self.kind,
                self.var.sqlscale,
                numeric::parse(self.kind, value)?,
            )?,
            Family::Text => text::encode(value, self.conn.charset(), self.var())?,
            Family::Temporal => {
                let parsed = match self.kind {
                    FieldKind::Date => Temporal::Date(text::parse_date(value)?),
                    FieldKind::Time => Temporal::Time(text::parse_time(value)?),
                    _ => Temporal::Timestamp(text::parse_timestamp(value)?),
                };
                date_time::encode(self.kind, parsed)?
            }
            Family::Blob => {
                let bytes = self.conn.charset().encode(value)?;
                blob::write_bytes(self.conn, &bytes)?
            }
        };

        self.var.set_data(data)
    }

    pub fn set_bytes(&mut self, value: &[u8]) -> Result<(), FbError> {
        let data = match self.kind.family() {
            Family::Text => {
                text::check_len(value.len(), self.var())?;
                SqlData::Text(value.to_vec())
            }
            Family::Blob => blob::write_bytes(self.conn, value)?,
            _ => return Err(self.incompatible("byte[]")),
        };

        self.var.set_data(data)
    }

    fn set_temporal(&mut self, value: Temporal, source: &'static str) -> Result<(), FbError> {
        let data = match self.kind.family() {
            Family::Temporal => date_time::encode(self.kind, value)?,
            Family::Text => text::encode(&value.to_text(), self.conn.charset(), self.var())?,
            _ => return Err(self.incompatible(source)),
        };

        self.var.set_data(data)
    }

    pub fn set_date(&mut self, value: NaiveDate) -> Result<(), FbError> {
        self.set_temporal(Temporal::Date(value), "Date")
    }

    pub fn set_time(&mut self, value: NaiveTime) -> Result<(), FbError> {
        self.set_temporal(Temporal::Time(value), "Time")
    }

    pub fn set_timestamp(&mut self, value: NaiveDateTime) -> Result<(), FbError> {
        self.set_temporal(Temporal::Timestamp(value), "Timestamp")
    }

    /// Stores a blob. Cached contents are written to a new blob.
    pub fn set_blob(&mut self, value: &BlobValue<C>) -> Result<(), FbError> {
        if self.kind.family() != Family::Blob {
            return Err(self.incompatible("Blob"));
        }

        let data = match value {
            BlobValue::Cached(cached) => blob::write_bytes(self.conn, cached.as_bytes())?,
            live => blob::bound_id(live)?,
        };

        self.var.set_data(data)
    }

    /// Stores `length` bytes of the reader
    pub fn set_binary_stream<R: Read>(&mut self, input: R, length: usize) -> Result<(), FbError> {
        match self.kind.family() {
            Family::Blob => {
                let data = blob::write_stream(self.conn, input, length)?;
                self.var.set_data(data)
            }
            Family::Text => {
                let mut buf = Vec::with_capacity(length);
                input
                    .take(length as u64)
                    .read_to_end(&mut buf)
                    .map_err(|e| FbError::Streaming {
                        op: "Binary stream read",
                        source: e,
                    })?;

                self.set_bytes(&buf)
            }
            _ => Err(self.incompatible("BinaryStream")),
        }
    }

    /// Dispatches on the value type. `Null` sets the column to `NULL`.
    pub fn set_object(&mut self, value: SqlType) -> Result<(), FbError> {
        match value {
            SqlType::Null => {
                self.set_null();
                Ok(())
            }
            SqlType::Boolean(v) => self.set_boolean(v),
            SqlType::Byte(v) => self.set_byte(v),
            SqlType::SmallInt(v) => self.set_short(v),
            SqlType::Integer(v) => self.set_int(v),
            SqlType::BigInt(v) => self.set_long(v),
            SqlType::Float(v) => self.set_float(v),
            SqlType::Double(v) => self.set_double(v),
            SqlType::Decimal(v) => self.set_big_decimal(&v),
            SqlType::Text(v) => self.set_string(&v),
            SqlType::Date(v) => self.set_date(v),
            SqlType::Time(v) => self.set_time(v),
            SqlType::Timestamp(v) => self.set_timestamp(v),
            SqlType::Binary(v) => self.set_bytes(&v),
            SqlType::Blob(id) => {
                if self.kind.family() != Family::Blob {
                    return Err(self.incompatible("Blob"));
                }
                if id == 0 {
                    return Err(FbError::illegal_state("Blob id 0 has no value"));
                }

                self.var.set_data(SqlData::Quad(id))
            }
        }
    }
}
