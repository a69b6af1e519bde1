//! Values stored in a `.resources` container, in their native runtime shape.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

/// Type codes used by version 2 resource sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TypeCode {
    Null = 0x00,
    String = 0x01,
    Boolean = 0x02,
    Char = 0x03,
    Byte = 0x04,
    SByte = 0x05,
    Int16 = 0x06,
    UInt16 = 0x07,
    Int32 = 0x08,
    UInt32 = 0x09,
    Int64 = 0x0a,
    UInt64 = 0x0b,
    Single = 0x0c,
    Double = 0x0d,
    Decimal = 0x0e,
    DateTime = 0x0f,
    TimeSpan = 0x10,
    ByteArray = 0x20,
    Stream = 0x21,
}

/// First type code that indexes the container's user type table.
pub const USER_TYPES_START: i32 = 0x40;

impl TypeCode {
    pub fn from_i32(code: i32) -> Option<Self> {
        Some(match code {
            0x00 => TypeCode::Null,
            0x01 => TypeCode::String,
            0x02 => TypeCode::Boolean,
            0x03 => TypeCode::Char,
            0x04 => TypeCode::Byte,
            0x05 => TypeCode::SByte,
            0x06 => TypeCode::Int16,
            0x07 => TypeCode::UInt16,
            0x08 => TypeCode::Int32,
            0x09 => TypeCode::UInt32,
            0x0a => TypeCode::Int64,
            0x0b => TypeCode::UInt64,
            0x0c => TypeCode::Single,
            0x0d => TypeCode::Double,
            0x0e => TypeCode::Decimal,
            0x0f => TypeCode::DateTime,
            0x10 => TypeCode::TimeSpan,
            0x20 => TypeCode::ByteArray,
            0x21 => TypeCode::Stream,
            _ => return None,
        })
    }

    /// Version 1 sets name their types instead of coding them. Only the
    /// types the v1 writer stored natively map to a code; everything else
    /// is a serialized object.
    pub fn from_v1_type_name(name: &str) -> Option<Self> {
        Some(match strip_assembly(name) {
            "System.String" => TypeCode::String,
            "System.Byte" => TypeCode::Byte,
            "System.SByte" => TypeCode::SByte,
            "System.Int16" => TypeCode::Int16,
            "System.UInt16" => TypeCode::UInt16,
            "System.Int32" => TypeCode::Int32,
            "System.UInt32" => TypeCode::UInt32,
            "System.Int64" => TypeCode::Int64,
            "System.UInt64" => TypeCode::UInt64,
            "System.Single" => TypeCode::Single,
            "System.Double" => TypeCode::Double,
            "System.Decimal" => TypeCode::Decimal,
            "System.DateTime" => TypeCode::DateTime,
            "System.TimeSpan" => TypeCode::TimeSpan,
            _ => return None,
        })
    }
}

/// Drops the assembly qualification from a type name, keeping generic
/// arguments intact: `List`1[[System.String, mscorlib]], mscorlib` keeps
/// everything before the last top-level comma.
pub fn strip_assembly(name: &str) -> &str {
    let mut depth = 0i32;
    for (i, c) in name.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => return name[..i].trim(),
            _ => {}
        }
    }
    name.trim()
}

/// 96-bit scaled decimal as stored on disk (lo, mid, hi, flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Decimal {
    pub lo: i32,
    pub mid: i32,
    pub hi: i32,
    pub flags: i32,
}

impl Decimal {
    pub fn new(mantissa: u128, scale: u8, negative: bool) -> Self {
        let mut flags = ((scale as i32) & 0xff) << 16;
        if negative {
            flags |= i32::MIN;
        }
        Self {
            lo: mantissa as u32 as i32,
            mid: (mantissa >> 32) as u32 as i32,
            hi: (mantissa >> 64) as u32 as i32,
            flags,
        }
    }

    pub fn mantissa(&self) -> u128 {
        (self.hi as u32 as u128) << 64 | (self.mid as u32 as u128) << 32 | self.lo as u32 as u128
    }

    pub fn scale(&self) -> u32 {
        ((self.flags >> 16) & 0xff) as u32
    }

    pub fn is_negative(&self) -> bool {
        self.flags < 0
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mantissa = self.mantissa();
        let scale = self.scale() as usize;
        let mut digits = mantissa.to_string();
        if scale > 0 {
            if digits.len() <= scale {
                digits = format!("{}{digits}", "0".repeat(scale + 1 - digits.len()));
            }
            digits.insert(digits.len() - scale, '.');
        }
        if self.is_negative() && mantissa != 0 {
            f.write_str("-")?;
        }
        f.write_str(&digits)
    }
}

pub const TICKS_PER_SECOND: i64 = 10_000_000;
const TICKS_PER_MINUTE: u64 = 60 * TICKS_PER_SECOND as u64;
const TICKS_PER_HOUR: u64 = 60 * TICKS_PER_MINUTE;
const TICKS_PER_DAY: u64 = 24 * TICKS_PER_HOUR;
const DATE_TIME_TICKS_MASK: i64 = 0x3fff_ffff_ffff_ffff;
const TICKS_CEILING: i64 = 0x4000_0000_0000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTimeKind {
    Unspecified,
    Utc,
    Local,
}

/// Point in time as 100ns ticks since 0001-01-01, plus its kind.
///
/// `Local` values hold the UTC instant they were packed with. The writer's
/// time zone offset is not stored in the container, so they are shown as
/// UTC rather than shifted to any local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    pub ticks: i64,
    pub kind: DateTimeKind,
}

impl DateTime {
    /// Decodes the packed form: kind in the top two bits, ticks below.
    /// A `Local` instant within a day of the tick ceiling is a wrapped
    /// negative value and is unwrapped.
    pub fn from_binary(raw: i64) -> Self {
        let ticks = raw & DATE_TIME_TICKS_MASK;
        match (raw >> 62) & 0b11 {
            0 => Self {
                ticks,
                kind: DateTimeKind::Unspecified,
            },
            1 => Self {
                ticks,
                kind: DateTimeKind::Utc,
            },
            _ => Self {
                ticks: if ticks > TICKS_CEILING - TICKS_PER_DAY as i64 {
                    ticks - TICKS_CEILING
                } else {
                    ticks
                },
                kind: DateTimeKind::Local,
            },
        }
    }

    pub fn to_binary(&self) -> i64 {
        let kind: i64 = match self.kind {
            DateTimeKind::Unspecified => 0,
            DateTimeKind::Utc => 1,
            DateTimeKind::Local => 2,
        };
        (self.ticks & DATE_TIME_TICKS_MASK) | (kind << 62)
    }

    pub fn from_naive(dt: NaiveDateTime, kind: DateTimeKind) -> Option<Self> {
        let delta = dt.signed_duration_since(epoch()?);
        let micros = delta.num_microseconds()?;
        let sub_micro = i64::from(dt.nanosecond() % 1_000) / 100;
        Some(Self {
            ticks: micros.checked_mul(10)?.checked_add(sub_micro)?,
            kind,
        })
    }

    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let whole = Duration::microseconds(self.ticks / 10);
        let rest = Duration::nanoseconds((self.ticks % 10) * 100);
        epoch()?.checked_add_signed(whole)?.checked_add_signed(rest)
    }
}

fn epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1, 1, 1)?.and_hms_opt(0, 0, 0)
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive() {
            Some(dt) => write!(f, "{}", dt.format("%m/%d/%Y %H:%M:%S")),
            None => write!(f, "{} ticks", self.ticks),
        }
    }
}

/// Signed duration in 100ns ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimeSpan(pub i64);

impl fmt::Display for TimeSpan {
    /// Constant format: `[-][d.]hh:mm:ss[.fffffff]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let days = t / TICKS_PER_DAY;
        if days > 0 {
            write!(f, "{days}.")?;
        }
        write!(
            f,
            "{:02}:{:02}:{:02}",
            (t % TICKS_PER_DAY) / TICKS_PER_HOUR,
            (t % TICKS_PER_HOUR) / TICKS_PER_MINUTE,
            (t % TICKS_PER_MINUTE) / TICKS_PER_SECOND as u64
        )?;
        let frac = t % TICKS_PER_SECOND as u64;
        if frac > 0 {
            write!(f, ".{frac:07}")?;
        }
        Ok(())
    }
}

/// One resource value.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    Null,
    String(String),
    Boolean(bool),
    /// UTF-16 code unit; lone surrogates are legal.
    Char(u16),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    DateTime(DateTime),
    TimeSpan(TimeSpan),
    ByteArray(Vec<u8>),
    Stream(Vec<u8>),
    /// A user type kept as its serialized payload. `type_name` is the
    /// assembly-qualified name from the container's type table.
    Serialized { type_name: String, data: Vec<u8> },
}

impl ResourceValue {
    /// Fully-qualified runtime type name of the value.
    pub fn type_name(&self) -> &str {
        match self {
            ResourceValue::Null => "(null)",
            ResourceValue::String(_) => "System.String",
            ResourceValue::Boolean(_) => "System.Boolean",
            ResourceValue::Char(_) => "System.Char",
            ResourceValue::Byte(_) => "System.Byte",
            ResourceValue::SByte(_) => "System.SByte",
            ResourceValue::Int16(_) => "System.Int16",
            ResourceValue::UInt16(_) => "System.UInt16",
            ResourceValue::Int32(_) => "System.Int32",
            ResourceValue::UInt32(_) => "System.UInt32",
            ResourceValue::Int64(_) => "System.Int64",
            ResourceValue::UInt64(_) => "System.UInt64",
            ResourceValue::Single(_) => "System.Single",
            ResourceValue::Double(_) => "System.Double",
            ResourceValue::Decimal(_) => "System.Decimal",
            ResourceValue::DateTime(_) => "System.DateTime",
            ResourceValue::TimeSpan(_) => "System.TimeSpan",
            ResourceValue::ByteArray(_) => "System.Byte[]",
            ResourceValue::Stream(_) => "System.IO.UnmanagedMemoryStream",
            ResourceValue::Serialized { type_name, .. } => strip_assembly(type_name),
        }
    }

    /// Type code the value is written with; `None` for user types.
    pub fn type_code(&self) -> Option<TypeCode> {
        Some(match self {
            ResourceValue::Null => TypeCode::Null,
            ResourceValue::String(_) => TypeCode::String,
            ResourceValue::Boolean(_) => TypeCode::Boolean,
            ResourceValue::Char(_) => TypeCode::Char,
            ResourceValue::Byte(_) => TypeCode::Byte,
            ResourceValue::SByte(_) => TypeCode::SByte,
            ResourceValue::Int16(_) => TypeCode::Int16,
            ResourceValue::UInt16(_) => TypeCode::UInt16,
            ResourceValue::Int32(_) => TypeCode::Int32,
            ResourceValue::UInt32(_) => TypeCode::UInt32,
            ResourceValue::Int64(_) => TypeCode::Int64,
            ResourceValue::UInt64(_) => TypeCode::UInt64,
            ResourceValue::Single(_) => TypeCode::Single,
            ResourceValue::Double(_) => TypeCode::Double,
            ResourceValue::Decimal(_) => TypeCode::Decimal,
            ResourceValue::DateTime(_) => TypeCode::DateTime,
            ResourceValue::TimeSpan(_) => TypeCode::TimeSpan,
            ResourceValue::ByteArray(_) => TypeCode::ByteArray,
            ResourceValue::Stream(_) => TypeCode::Stream,
            ResourceValue::Serialized { .. } => return None,
        })
    }

    /// Raw bytes of byte-array and stream values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ResourceValue::ByteArray(b) | ResourceValue::Stream(b) => Some(b),
            _ => None,
        }
    }
}

/// Shortest text that reads back as the same value at its own width.
fn fmt_float<T: Into<f64> + fmt::Display + Copy>(f: &mut fmt::Formatter<'_>, v: T) -> fmt::Result {
    let wide: f64 = v.into();
    if wide.is_nan() {
        f.write_str("NaN")
    } else if wide.is_infinite() {
        f.write_str(if wide > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{v}")
    }
}

impl fmt::Display for ResourceValue {
    /// The value's default textual representation. Values without a
    /// natural text form print their type name. A `Char` holding a lone
    /// surrogate has no `char` form and prints U+FFFD.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceValue::Null => f.write_str(""),
            ResourceValue::String(s) => f.write_str(s),
            ResourceValue::Boolean(b) => f.write_str(if *b { "True" } else { "False" }),
            ResourceValue::Char(c) => {
                let ch = char::from_u32(*c as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
                write!(f, "{ch}")
            }
            ResourceValue::Byte(v) => write!(f, "{v}"),
            ResourceValue::SByte(v) => write!(f, "{v}"),
            ResourceValue::Int16(v) => write!(f, "{v}"),
            ResourceValue::UInt16(v) => write!(f, "{v}"),
            ResourceValue::Int32(v) => write!(f, "{v}"),
            ResourceValue::UInt32(v) => write!(f, "{v}"),
            ResourceValue::Int64(v) => write!(f, "{v}"),
            ResourceValue::UInt64(v) => write!(f, "{v}"),
            ResourceValue::Single(v) => fmt_float(f, *v),
            ResourceValue::Double(v) => fmt_float(f, *v),
            ResourceValue::Decimal(d) => write!(f, "{d}"),
            ResourceValue::DateTime(d) => write!(f, "{d}"),
            ResourceValue::TimeSpan(t) => write!(f, "{t}"),
            ResourceValue::ByteArray(_)
            | ResourceValue::Stream(_)
            | ResourceValue::Serialized { .. } => f.write_str(self.type_name()),
        }
    }
}
