use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian as LE, ReadBytesExt};
use tracing::debug;

use crate::encoding::{read_7bit_i32, read_string, read_utf16};
use crate::error::{FormatError, FormatResult};
use crate::header::Header;
use crate::value::{
    DateTime, DateTimeKind, Decimal, ResourceValue, TimeSpan, TypeCode, USER_TYPES_START,
};

const DEFAULT_BUF: usize = 64 << 10;

/// One key/value pair as stored in the container.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub key: String,
    pub value: ResourceValue,
}

/// Opened container. Construction reads and validates the headers;
/// [`ResourceReader::records`] hands out the entries.
#[derive(Debug)]
pub struct ResourceReader<R: Read + Seek> {
    reader: io::BufReader<R>,
    header: Header,
}

impl<R: Read + Seek> ResourceReader<R> {
    pub fn new(inner: R) -> FormatResult<Self> {
        Self::with_capacity(inner, DEFAULT_BUF)
    }

    pub fn with_capacity(inner: R, io_buf_bytes: usize) -> FormatResult<Self> {
        let mut reader = io::BufReader::with_capacity(io_buf_bytes, inner);
        let header = Header::read(&mut reader)?;
        Ok(Self { reader, header })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Consumes the reader. Records come out in name-table order, each
    /// decoded only when the iterator reaches it.
    pub fn records(self) -> Records<R> {
        Records {
            reader: self.reader,
            header: self.header,
            index: 0,
            data_ends: None,
        }
    }
}

impl<R: Read + Seek> IntoIterator for ResourceReader<R> {
    type Item = FormatResult<RawRecord>;
    type IntoIter = Records<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.records()
    }
}

/// One-shot iterator over a container's records. After the first error it
/// yields nothing more.
pub struct Records<R: Read + Seek> {
    reader: io::BufReader<R>,
    header: Header,
    index: usize,
    /// Sorted absolute data offsets plus the stream end, built on first use
    /// to size serialized payloads.
    data_ends: Option<Vec<u64>>,
}

impl<R: Read + Seek> Iterator for Records<R> {
    type Item = FormatResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.header.len() {
            return None;
        }
        let res = self.read_record(self.index);
        self.index = match res {
            Ok(_) => self.index + 1,
            Err(_) => self.header.len(),
        };
        Some(res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.header.len() - self.index;
        (0, Some(left))
    }
}

impl<R: Read + Seek> Records<R> {
    fn remaining(&mut self) -> FormatResult<u64> {
        Ok(self.header.stream_len.saturating_sub(self.reader.stream_position()?))
    }

    /// Reads the name entry at `index`: the key and its absolute data offset.
    fn read_name(&mut self, index: usize) -> FormatResult<(String, u64)> {
        let pos = self.header.name_section_offset + self.header.name_positions[index] as u64;
        self.reader.seek(SeekFrom::Start(pos))?;

        let limit = self.header.data_section_offset.saturating_sub(pos);
        let key = read_utf16(&mut self.reader, limit)?;

        let data_offset = self.reader.read_i32::<LE>()?;
        let abs = self.header.data_section_offset.checked_add_signed(data_offset as i64);
        match abs {
            Some(abs) if data_offset >= 0 && abs < self.header.stream_len => Ok((key, abs)),
            _ => Err(FormatError::InvalidData(format!(
                "data offset {data_offset} of '{key}' outside stream"
            ))),
        }
    }

    fn read_record(&mut self, index: usize) -> FormatResult<RawRecord> {
        let (key, data_pos) = self.read_name(index)?;
        self.reader.seek(SeekFrom::Start(data_pos))?;

        let value = if self.header.version == 1 {
            self.read_value_v1(data_pos)?
        } else {
            self.read_value_v2(data_pos)?
        };
        Ok(RawRecord { key, value })
    }

    fn read_value_v2(&mut self, data_pos: u64) -> FormatResult<ResourceValue> {
        let code = read_7bit_i32(&mut self.reader)?;
        if let Some(tc) = TypeCode::from_i32(code) {
            return self.read_typed(tc);
        }
        if code < USER_TYPES_START {
            return Err(FormatError::InvalidData(format!("unknown type code 0x{code:x}")));
        }
        self.read_serialized((code - USER_TYPES_START) as usize, data_pos)
    }

    fn read_value_v1(&mut self, data_pos: u64) -> FormatResult<ResourceValue> {
        let type_index = read_7bit_i32(&mut self.reader)?;
        if type_index == -1 {
            return Ok(ResourceValue::Null);
        }
        let type_name = self.type_name(type_index)?;
        match TypeCode::from_v1_type_name(type_name) {
            // v1 stored raw ticks, without a kind.
            Some(TypeCode::DateTime) => Ok(ResourceValue::DateTime(DateTime {
                ticks: self.reader.read_i64::<LE>()?,
                kind: DateTimeKind::Unspecified,
            })),
            Some(tc) => self.read_typed(tc),
            None => self.read_serialized(type_index as usize, data_pos),
        }
    }

    fn type_name(&self, index: i32) -> FormatResult<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.header.types.get(i))
            .map(String::as_str)
            .ok_or_else(|| FormatError::InvalidData(format!("type index {index} out of range")))
    }

    fn read_typed(&mut self, tc: TypeCode) -> FormatResult<ResourceValue> {
        let r = &mut self.reader;
        Ok(match tc {
            TypeCode::Null => ResourceValue::Null,
            TypeCode::String => {
                let limit = self.header.stream_len;
                ResourceValue::String(read_string(r, limit)?)
            }
            TypeCode::Boolean => ResourceValue::Boolean(r.read_u8()? != 0),
            TypeCode::Char => ResourceValue::Char(r.read_u16::<LE>()?),
            TypeCode::Byte => ResourceValue::Byte(r.read_u8()?),
            TypeCode::SByte => ResourceValue::SByte(r.read_i8()?),
            TypeCode::Int16 => ResourceValue::Int16(r.read_i16::<LE>()?),
            TypeCode::UInt16 => ResourceValue::UInt16(r.read_u16::<LE>()?),
            TypeCode::Int32 => ResourceValue::Int32(r.read_i32::<LE>()?),
            TypeCode::UInt32 => ResourceValue::UInt32(r.read_u32::<LE>()?),
            TypeCode::Int64 => ResourceValue::Int64(r.read_i64::<LE>()?),
            TypeCode::UInt64 => ResourceValue::UInt64(r.read_u64::<LE>()?),
            TypeCode::Single => ResourceValue::Single(r.read_f32::<LE>()?),
            TypeCode::Double => ResourceValue::Double(r.read_f64::<LE>()?),
            TypeCode::Decimal => ResourceValue::Decimal(read_decimal(r)?),
            TypeCode::DateTime => ResourceValue::DateTime(DateTime::from_binary(r.read_i64::<LE>()?)),
            TypeCode::TimeSpan => ResourceValue::TimeSpan(TimeSpan(r.read_i64::<LE>()?)),
            TypeCode::ByteArray => ResourceValue::ByteArray(self.read_sized_bytes()?),
            TypeCode::Stream => ResourceValue::Stream(self.read_sized_bytes()?),
        })
    }

    /// i32 length followed by that many bytes.
    fn read_sized_bytes(&mut self) -> FormatResult<Vec<u8>> {
        let len = self.reader.read_i32::<LE>()?;
        let remaining = self.remaining()?;
        if len < 0 || len as u64 > remaining {
            return Err(FormatError::Truncated(format!(
                "byte array of {len} bytes, {remaining} left"
            )));
        }
        let mut buf = vec![0u8; len as usize];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// A user type's payload runs until the next value starts.
    fn read_serialized(&mut self, type_index: usize, data_pos: u64) -> FormatResult<ResourceValue> {
        let type_name = self.type_name(type_index as i32)?.to_string();
        let start = self.reader.stream_position()?;
        let end = self.payload_end(data_pos)?;
        let len = read_len_between(start, end)?;

        let mut data = vec![0u8; len];
        self.reader.read_exact(&mut data)?;
        Ok(ResourceValue::Serialized { type_name, data })
    }

    fn payload_end(&mut self, data_pos: u64) -> FormatResult<u64> {
        if self.data_ends.is_none() {
            let ends = self.collect_data_offsets()?;
            debug!(values = ends.len(), "indexed data offsets");
            self.data_ends = Some(ends);
        }
        let ends = self.data_ends.as_deref().unwrap_or_default();
        let i = ends.partition_point(|&p| p <= data_pos);
        Ok(ends.get(i).copied().unwrap_or(self.header.stream_len))
    }

    fn collect_data_offsets(&mut self) -> FormatResult<Vec<u64>> {
        let here = self.reader.stream_position()?;
        let mut ends = Vec::with_capacity(self.header.len() + 1);
        for i in 0..self.header.len() {
            let (_, pos) = self.read_name(i)?;
            ends.push(pos);
        }
        ends.push(self.header.stream_len);
        ends.sort_unstable();
        ends.dedup();
        self.reader.seek(SeekFrom::Start(here))?;
        Ok(ends)
    }
}

fn read_len_between(start: u64, end: u64) -> FormatResult<usize> {
    end.checked_sub(start)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| FormatError::InvalidData(format!("payload end {end} before start {start}")))
}

fn read_decimal<R: Read>(r: &mut R) -> FormatResult<Decimal> {
    let d = Decimal {
        lo: r.read_i32::<LE>()?,
        mid: r.read_i32::<LE>()?,
        hi: r.read_i32::<LE>()?,
        flags: r.read_i32::<LE>()?,
    };
    if d.scale() > 28 || d.flags & 0x7f00_ffff != 0 {
        return Err(FormatError::InvalidData(format!("bad decimal flags 0x{:08x}", d.flags)));
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{write_7bit_i32, write_string, write_utf16};
    use crate::header::{MAGIC, READER_TYPE, RESOURCE_SET_TYPE};
    use crate::writer::ResourceWriter;
    use std::io::Cursor;

    fn container(entries: Vec<(&str, ResourceValue)>) -> Vec<u8> {
        let mut w = ResourceWriter::new(Vec::new());
        for (k, v) in entries {
            w.add(k, v);
        }
        w.generate().unwrap()
    }

    fn read_all(bytes: &[u8]) -> Vec<RawRecord> {
        ResourceReader::new(Cursor::new(bytes))
            .unwrap()
            .records()
            .collect::<FormatResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn every_type_code_reads_back() {
        let values = vec![
            ("null", ResourceValue::Null),
            ("string", ResourceValue::String("héllo".into())),
            ("bool", ResourceValue::Boolean(true)),
            ("char", ResourceValue::Char(0x263a)),
            ("byte", ResourceValue::Byte(200)),
            ("sbyte", ResourceValue::SByte(-5)),
            ("i16", ResourceValue::Int16(-300)),
            ("u16", ResourceValue::UInt16(60_000)),
            ("i32", ResourceValue::Int32(-70_000)),
            ("u32", ResourceValue::UInt32(4_000_000_000)),
            ("i64", ResourceValue::Int64(i64::MIN)),
            ("u64", ResourceValue::UInt64(u64::MAX)),
            ("f32", ResourceValue::Single(0.25)),
            ("f64", ResourceValue::Double(-2.5e10)),
            ("dec", ResourceValue::Decimal(Decimal::new(12345, 2, true))),
            (
                "dt",
                ResourceValue::DateTime(DateTime {
                    ticks: 634_066_743_090_000_000,
                    kind: DateTimeKind::Utc,
                }),
            ),
            ("ts", ResourceValue::TimeSpan(TimeSpan(-42))),
            ("bytes", ResourceValue::ByteArray(vec![1, 2, 3])),
            ("stream", ResourceValue::Stream(vec![9; 300])),
            (
                "obj",
                ResourceValue::Serialized {
                    type_name: "System.Drawing.Point, System.Drawing".into(),
                    data: vec![0, 1, 0, 0, 0, 0xff],
                },
            ),
        ];

        let bytes = container(values.clone());
        let mut got = read_all(&bytes);
        got.sort_by(|a, b| a.key.cmp(&b.key));

        let mut want: Vec<RawRecord> = values
            .into_iter()
            .map(|(k, v)| RawRecord {
                key: k.to_string(),
                value: v,
            })
            .collect();
        want.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(got, want);
    }

    #[test]
    fn serialized_payloads_are_bounded_by_next_value() {
        let a = ResourceValue::Serialized {
            type_name: "A, Lib".into(),
            data: vec![0xaa; 17],
        };
        let b = ResourceValue::Serialized {
            type_name: "B, Lib".into(),
            data: vec![0xbb; 3],
        };
        let bytes = container(vec![("first", a.clone()), ("second", b.clone()), ("third", ResourceValue::Int32(1))]);
        let got = read_all(&bytes);
        let find = |k: &str| got.iter().find(|r| r.key == k).unwrap().value.clone();
        assert_eq!(find("first"), a);
        assert_eq!(find("second"), b);
    }

    #[test]
    fn records_are_lazy_and_one_shot() {
        let bytes = container(vec![("a", ResourceValue::Int32(1)), ("b", ResourceValue::Int32(2))]);
        let mut records = ResourceReader::new(Cursor::new(&bytes)).unwrap().records();
        assert_eq!(records.size_hint(), (0, Some(2)));
        assert!(records.next().unwrap().is_ok());
        assert!(records.next().unwrap().is_ok());
        assert!(records.next().is_none());
        assert!(records.next().is_none());
    }

    #[test]
    fn duplicate_keys_survive() {
        let bytes = container(vec![("k", ResourceValue::Int32(1)), ("k", ResourceValue::Int32(2))]);
        let got = read_all(&bytes);
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|r| r.key == "k"));
    }

    #[test]
    fn random_bytes_fail_to_open() {
        let junk: Vec<u8> = (0..512u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 7) as u8).collect();
        assert!(ResourceReader::new(Cursor::new(junk)).is_err());
        assert!(ResourceReader::new(Cursor::new(Vec::new())).is_err());
    }

    #[test]
    fn bad_data_offset_stops_iteration() {
        let mut bytes = container(vec![("a", ResourceValue::Int32(1))]);
        // Name entry is the last thing before the data section; its data
        // offset is the 4 bytes ending there.
        let header = Header::read(&mut Cursor::new(&bytes)).unwrap();
        let at = header.data_section_offset as usize - 4;
        bytes[at..at + 4].copy_from_slice(&i32::MAX.to_le_bytes());

        let mut records = ResourceReader::new(Cursor::new(&bytes)).unwrap().records();
        assert!(matches!(records.next(), Some(Err(FormatError::InvalidData(_)))));
        assert!(records.next().is_none());
    }

    #[test]
    fn unknown_reader_type_is_rejected() {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&1i32.to_le_bytes());
        let mut strings = Vec::new();
        write_string(&mut strings, "Some.Other.Reader, Other").unwrap();
        write_string(&mut strings, RESOURCE_SET_TYPE).unwrap();
        out.extend_from_slice(&(strings.len() as i32).to_le_bytes());
        out.extend_from_slice(&strings);
        out.extend_from_slice(&[0; 16]);
        assert!(matches!(
            ResourceReader::new(Cursor::new(out)),
            Err(FormatError::UnsupportedReader(_))
        ));
    }

    /// Hand-assembled version 1 set: types are named, not coded.
    #[test]
    fn reads_version_1_sets() {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&1i32.to_le_bytes());
        let mut strings = Vec::new();
        write_string(&mut strings, READER_TYPE).unwrap();
        write_string(&mut strings, RESOURCE_SET_TYPE).unwrap();
        out.extend_from_slice(&(strings.len() as i32).to_le_bytes());
        out.extend_from_slice(&strings);

        out.extend_from_slice(&1i32.to_le_bytes()); // set version
        out.extend_from_slice(&2i32.to_le_bytes()); // resources
        out.extend_from_slice(&1i32.to_le_bytes()); // types
        write_string(&mut out, "System.Int32, mscorlib").unwrap();
        while out.len() % 8 != 0 {
            out.push(b'P');
        }

        let mut names = Vec::new();
        let mut data = Vec::new();
        let mut positions = Vec::new();
        for (name, value) in [("answer", Some(42i32)), ("nothing", None)] {
            positions.push(names.len() as u32);
            write_utf16(&mut names, name).unwrap();
            names.extend_from_slice(&(data.len() as i32).to_le_bytes());
            match value {
                Some(v) => {
                    write_7bit_i32(&mut data, 0).unwrap();
                    data.extend_from_slice(&v.to_le_bytes());
                }
                None => write_7bit_i32(&mut data, -1).unwrap(),
            }
        }
        out.extend_from_slice(&[0u8; 8]); // hashes, unused by the reader
        for p in &positions {
            out.extend_from_slice(&p.to_le_bytes());
        }
        let data_section = out.len() + 4 + names.len();
        out.extend_from_slice(&(data_section as i32).to_le_bytes());
        out.extend_from_slice(&names);
        out.extend_from_slice(&data);

        let got = read_all(&out);
        assert_eq!(got[0].key, "answer");
        assert_eq!(got[0].value, ResourceValue::Int32(42));
        assert_eq!(got[1].value, ResourceValue::Null);
    }
}
