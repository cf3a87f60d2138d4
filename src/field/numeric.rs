//! Integer, fixed point and floating point columns

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use num_bigint::BigInt;
use rsfbdata_core::{FbError, SqlData, SqlType, XSqlVar};
use std::{convert::TryFrom, str::FromStr};

use super::{FieldKind, IntWidth};

/// Value of a numeric column
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Numeric {
    Int(i64),
    /// `unscaled * 10^scale`
    Scaled { unscaled: i64, scale: i16 },
    Float(f32),
    Double(f64),
    /// Double column declared with a scale
    ScaledDouble { value: f64, scale: i16 },
}

/// Value given to a numeric setter
#[derive(Debug, Clone)]
pub(super) enum NumSource {
    Integral(i128),
    Real(f64),
    Decimal(BigDecimal),
}

impl Numeric {
    pub fn read(var: &XSqlVar, kind: FieldKind) -> Result<Numeric, FbError> {
        let scale = var.sqlscale;

        let int = match var.data() {
            Some(SqlData::Short(v)) => Some(*v as i64),
            Some(SqlData::Long(v)) => Some(*v as i64),
            Some(SqlData::Int64(v)) => Some(*v),
            _ => None,
        };

        Ok(match (kind, int, var.data()) {
            (FieldKind::FixedPoint(_), Some(unscaled), _) => Numeric::Scaled { unscaled, scale },
            (_, Some(v), _) => Numeric::Int(v),
            (_, _, Some(SqlData::Float(v))) => Numeric::Float(*v),
            (FieldKind::ScaledDouble, _, Some(SqlData::Double(value))) => Numeric::ScaledDouble {
                value: *value,
                scale,
            },
            (_, _, Some(SqlData::Double(v))) => Numeric::Double(*v),
            (_, _, other) => {
                return Err(FbError::illegal_state(format!(
                    "Expected a numeric value, found {:?}",
                    other
                )))
            }
        })
    }

    /// Integer part, truncated toward zero
    pub fn integral(&self, target: &'static str) -> Result<i128, FbError> {
        match *self {
            Numeric::Int(v) => Ok(v as i128),
            Numeric::Scaled { unscaled, scale } => truncate_scaled(unscaled as i128, scale)
                .ok_or_else(|| out_of_range(target, self.to_text())),
            Numeric::Float(v) => real_integral(v as f64, target),
            Numeric::Double(value) | Numeric::ScaledDouble { value, .. } => {
                real_integral(value, target)
            }
        }
    }

    pub fn to_f64(&self) -> f64 {
        match *self {
            Numeric::Int(v) => v as f64,
            Numeric::Scaled { unscaled, scale } if scale < 0 => {
                unscaled as f64 / 10f64.powi(-(scale as i32))
            }
            Numeric::Scaled { unscaled, scale } => unscaled as f64 * 10f64.powi(scale as i32),
            Numeric::Float(v) => v as f64,
            Numeric::Double(value) | Numeric::ScaledDouble { value, .. } => value,
        }
    }

    pub fn to_f32(&self, target: &'static str) -> Result<f32, FbError> {
        match *self {
            Numeric::Float(v) => Ok(v),
            _ => narrow_float(self.to_f64(), target),
        }
    }

    pub fn to_decimal(&self, target: &'static str) -> Result<BigDecimal, FbError> {
        match *self {
            Numeric::Int(v) => Ok(BigDecimal::from(v)),
            Numeric::Scaled { unscaled, scale } => {
                Ok(BigDecimal::new(BigInt::from(unscaled), -(scale as i64)))
            }
            Numeric::Float(v) => parse_decimal(&v.to_string(), target),
            Numeric::Double(v) => parse_decimal(&v.to_string(), target),
            Numeric::ScaledDouble { value, scale } => Ok(parse_decimal(&value.to_string(), target)?
                .with_scale_round(-(scale as i64), RoundingMode::HalfUp)),
        }
    }

    /// Numeric booleans are `true` only for 1
    pub fn is_true(&self) -> bool {
        match *self {
            Numeric::Int(v) => v == 1,
            Numeric::Scaled { .. } => self
                .to_decimal("boolean")
                .map(|d| d == BigDecimal::from(1))
                .unwrap_or(false),
            Numeric::Float(v) => v == 1.0,
            Numeric::Double(value) | Numeric::ScaledDouble { value, .. } => value == 1.0,
        }
    }

    pub fn to_text(&self) -> String {
        match *self {
            Numeric::Int(v) => v.to_string(),
            Numeric::Scaled { unscaled, scale } => {
                BigDecimal::new(BigInt::from(unscaled), -(scale as i64)).to_string()
            }
            Numeric::Float(v) => v.to_string(),
            Numeric::Double(v) => v.to_string(),
            Numeric::ScaledDouble { .. } => match self.to_decimal("String") {
                Ok(d) => d.to_string(),
                Err(_) => self.to_f64().to_string(),
            },
        }
    }

    pub fn to_object(&self, kind: FieldKind) -> Result<SqlType, FbError> {
        Ok(match (*self, kind) {
            (Numeric::Int(v), FieldKind::SmallInt) => SqlType::SmallInt(narrow(v as i128, "short")?),
            (Numeric::Int(v), FieldKind::Integer) => SqlType::Integer(narrow(v as i128, "int")?),
            (Numeric::Int(v), _) => SqlType::BigInt(v),
            (Numeric::Float(v), _) => SqlType::Float(v),
            (Numeric::Double(v), _) => SqlType::Double(v),
            (Numeric::Scaled { .. }, _) | (Numeric::ScaledDouble { .. }, _) => {
                SqlType::Decimal(self.to_decimal("BigDecimal")?)
            }
        })
    }
}

impl NumSource {
    pub fn to_text(&self) -> String {
        match self {
            NumSource::Integral(v) => v.to_string(),
            NumSource::Real(v) => v.to_string(),
            NumSource::Decimal(d) => d.to_string(),
        }
    }
}

/// Encodes the value for a column of the kind, checking its range
pub(super) fn encode(kind: FieldKind, scale: i16, src: NumSource) -> Result<SqlData, FbError> {
    let target = kind.type_name();

    match kind {
        FieldKind::SmallInt | FieldKind::Integer | FieldKind::BigInt => {
            let v = match src {
                NumSource::Integral(v) => v,
                NumSource::Real(v) => real_integral(v, target)?,
                NumSource::Decimal(d) => decimal_integral(&d, target)?,
            };

            int_data(kind.int_width(), v, target)
        }

        FieldKind::FixedPoint(width) => {
            let decimal = match src {
                NumSource::Integral(v) => BigDecimal::new(BigInt::from(v), 0),
                NumSource::Real(v) => decimal_from_f64(v, target)?,
                NumSource::Decimal(d) => d,
            };

            let frac = -(scale as i64);
            let unscaled = rescaled(&decimal, frac, RoundingMode::HalfUp, width.digits(), target)?;
            int_data(Some(width), unscaled, target)
        }

        FieldKind::Float => Ok(SqlData::Float(narrow_float(src_f64(&src, target)?, target)?)),

        FieldKind::Double => Ok(SqlData::Double(src_f64(&src, target)?)),

        FieldKind::ScaledDouble => {
            let v = match src {
                NumSource::Decimal(d) if d.is_zero() => 0.0,
                NumSource::Decimal(d) => {
                    let frac = -(scale as i64);
                    let digits = integer_digits(&d);
                    if digits > F64_MAX_DIGITS {
                        return Err(out_of_range(target, d.to_string()));
                    }

                    // Rounds to zero at the column scale
                    if digits + frac < -1 {
                        0.0
                    } else {
                        d.with_scale_round(frac, RoundingMode::HalfUp)
                            .to_f64()
                            .ok_or_else(|| out_of_range(target, d.to_string()))?
                    }
                }
                other => src_f64(&other, target)?,
            };

            Ok(SqlData::Double(v))
        }

        _ => Err(FbError::illegal_state(format!(
            "{:?} is not a numeric column",
            kind
        ))),
    }
}

/// Parses the text form of a value for a column of the kind
pub(super) fn parse(kind: FieldKind, s: &str) -> Result<NumSource, FbError> {
    let target = kind.type_name();
    let s = s.trim();

    match kind {
        FieldKind::SmallInt | FieldKind::Integer | FieldKind::BigInt => s
            .parse::<i128>()
            .map(NumSource::Integral)
            .map_err(|_| unparseable(target, s)),
        FieldKind::FixedPoint(_) | FieldKind::ScaledDouble => {
            parse_decimal(s, target).map(NumSource::Decimal)
        }
        _ => s
            .parse::<f64>()
            .map(NumSource::Real)
            .map_err(|_| unparseable(target, s)),
    }
}

/// Range checked integer conversion
pub(super) fn narrow<T: TryFrom<i128>>(v: i128, target: &'static str) -> Result<T, FbError> {
    T::try_from(v).map_err(|_| out_of_range(target, v.to_string()))
}

/// Range checked conversion to `f32`. Infinities and NaN are kept.
pub(super) fn narrow_float(v: f64, target: &'static str) -> Result<f32, FbError> {
    if v.is_finite() && v.abs() > f32::MAX as f64 {
        return Err(out_of_range(target, v.to_string()));
    }

    Ok(v as f32)
}

pub(super) fn parse_decimal(s: &str, target: &'static str) -> Result<BigDecimal, FbError> {
    BigDecimal::from_str(s.trim()).map_err(|_| unparseable(target, s))
}

/// Integer part of a float, the range is checked by the caller
pub(super) fn real_integral(v: f64, target: &'static str) -> Result<i128, FbError> {
    if !v.is_finite() {
        return Err(out_of_range(target, v.to_string()));
    }

    // Saturates far outside of any column range
    Ok(v.trunc() as i128)
}

/// Integer part of a decimal, truncated toward zero
pub(super) fn decimal_integral(d: &BigDecimal, target: &'static str) -> Result<i128, FbError> {
    rescaled(d, 0, RoundingMode::Down, I128_DIGITS, target)
}

/// Digits left of the decimal point, zero or negative below 1
fn integer_digits(d: &BigDecimal) -> i64 {
    let (_, exponent) = d.as_bigint_and_exponent();
    d.digits() as i64 - exponent
}

/// Unscaled value of the decimal with `frac` fractional digits.
/// Values longer than `max_digits` fail before rescaling, so a huge
/// exponent can't build a huge integer.
fn rescaled(
    d: &BigDecimal,
    frac: i64,
    mode: RoundingMode,
    max_digits: i64,
    target: &'static str,
) -> Result<i128, FbError> {
    if d.is_zero() {
        return Ok(0);
    }

    let digits = integer_digits(d) + frac;
    if digits > max_digits {
        return Err(out_of_range(target, d.to_string()));
    }
    // Below 10^-2 after scaling, rounds to zero in both modes
    if digits < -1 {
        return Ok(0);
    }

    d.with_scale_round(frac, mode)
        .as_bigint_and_exponent()
        .0
        .to_i128()
        .ok_or_else(|| out_of_range(target, d.to_string()))
}

fn truncate_scaled(unscaled: i128, scale: i16) -> Option<i128> {
    if scale < 0 {
        // Beyond 10^38 every i64 truncates to 0
        Some(pow10(-(scale as i32)).map(|p| unscaled / p).unwrap_or(0))
    } else {
        pow10(scale as i32).and_then(|p| unscaled.checked_mul(p))
    }
}

fn pow10(exp: i32) -> Option<i128> {
    10i128.checked_pow(exp as u32)
}

fn decimal_from_f64(v: f64, target: &'static str) -> Result<BigDecimal, FbError> {
    if !v.is_finite() {
        return Err(out_of_range(target, v.to_string()));
    }

    parse_decimal(&v.to_string(), target)
}

fn src_f64(src: &NumSource, target: &'static str) -> Result<f64, FbError> {
    match src {
        NumSource::Integral(v) => Ok(*v as f64),
        NumSource::Real(v) => Ok(*v),
        NumSource::Decimal(d) if d.is_zero() => Ok(0.0),
        NumSource::Decimal(d) => {
            let digits = integer_digits(d);
            if digits > F64_MAX_DIGITS {
                return Err(out_of_range(target, d.to_string()));
            }
            if digits < F64_MIN_DIGITS {
                return Ok(0.0);
            }

            d.to_f64().ok_or_else(|| out_of_range(target, d.to_string()))
        }
    }
}

fn int_data(width: Option<IntWidth>, v: i128, target: &'static str) -> Result<SqlData, FbError> {
    match width {
        Some(IntWidth::Short) => narrow(v, target).map(SqlData::Short),
        Some(IntWidth::Long) => narrow(v, target).map(SqlData::Long),
        Some(IntWidth::Int64) => narrow(v, target).map(SqlData::Int64),
        None => Err(FbError::illegal_state("Not an integer column")),
    }
}

/// Any i128 has at most 39 digits
const I128_DIGITS: i64 = 39;
/// Integer digits of `f64::MAX`
const F64_MAX_DIGITS: i64 = 309;
/// Below the smallest subnormal f64
const F64_MIN_DIGITS: i64 = -330;

fn out_of_range(target: &'static str, value: String) -> FbError {
    FbError::conversion(target, format!("value {} is out of range", value))
}

fn unparseable(target: &'static str, s: &str) -> FbError {
    FbError::conversion(target, format!("can't parse '{}'", s))
}
