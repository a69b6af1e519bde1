//! Resource manager and resource set headers.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! u32     magic 0xbeefcace
//! i32     header version
//! i32     byte count of the rest of the manager header
//! string  reader type      (header version 1)
//! string  resource set type (header version 1)
//! i32     resource set version (1 or 2)
//! i32     resource count
//! i32     type count
//! string  type names[type count]
//! ...     "PAD" padding up to an 8 byte boundary
//! u32     name hashes[resource count]
//! u32     name positions[resource count]
//! i32     data section offset
//! ...     name section, then data section
//! ```

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian as LE, ReadBytesExt};
use tracing::debug;

use crate::encoding::read_string;
use crate::error::{FormatError, FormatResult};
use crate::value::strip_assembly;

pub const MAGIC: u32 = 0xbeef_cace;
pub const HEADER_VERSION: i32 = 1;

pub const READER_TYPE: &str = "System.Resources.ResourceReader, mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089";
pub const RESOURCE_SET_TYPE: &str = "System.Resources.RuntimeResourceSet";

/// Everything needed to locate names and values.
#[derive(Debug, Clone)]
pub struct Header {
    pub header_version: i32,
    pub reader_type: String,
    pub set_type: String,
    /// Resource set version, 1 or 2.
    pub version: i32,
    pub types: Vec<String>,
    pub name_hashes: Vec<u32>,
    pub name_positions: Vec<u32>,
    pub name_section_offset: u64,
    pub data_section_offset: u64,
    pub stream_len: u64,
}

impl Header {
    pub fn len(&self) -> usize {
        self.name_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_positions.is_empty()
    }

    /// Reads both headers from the start of `r`.
    pub fn read<R: Read + Seek>(r: &mut R) -> FormatResult<Self> {
        let stream_len = r.seek(SeekFrom::End(0))?;
        r.seek(SeekFrom::Start(0))?;

        let magic = r.read_u32::<LE>()?;
        if magic != MAGIC {
            return Err(FormatError::BadMagic(magic));
        }

        let header_version = r.read_i32::<LE>()?;
        let skip = r.read_i32::<LE>()?;
        let after_skip = r.stream_position()?;
        if skip < 0 || after_skip + skip as u64 > stream_len {
            return Err(FormatError::InvalidData(format!("bad header length {skip}")));
        }

        let (reader_type, set_type) = match header_version {
            HEADER_VERSION => {
                let limit = skip as u64;
                let reader_type = read_string(r, limit)?;
                let set_type = read_string(r, limit)?;
                if strip_assembly(&reader_type) != "System.Resources.ResourceReader" {
                    return Err(FormatError::UnsupportedReader(reader_type));
                }
                (reader_type, set_type)
            }
            v if v > HEADER_VERSION => (String::new(), String::new()),
            v => {
                return Err(FormatError::UnsupportedVersion {
                    what: "resource manager header",
                    version: v,
                });
            }
        };
        r.seek(SeekFrom::Start(after_skip + skip as u64))?;

        let version = r.read_i32::<LE>()?;
        if version != 1 && version != 2 {
            return Err(FormatError::UnsupportedVersion {
                what: "resource set",
                version,
            });
        }

        let count = read_count(r, "resource")?;
        let type_count = read_count(r, "type")?;

        let mut types = Vec::with_capacity(type_count.min(1024));
        for _ in 0..type_count {
            let remaining = stream_len.saturating_sub(r.stream_position()?);
            types.push(read_string(r, remaining)?);
        }

        let pos = r.stream_position()?;
        let misalign = pos & 7;
        if misalign != 0 {
            r.seek(SeekFrom::Current((8 - misalign) as i64))?;
        }

        let remaining = stream_len.saturating_sub(r.stream_position()?);
        if (count as u64) * 8 + 4 > remaining {
            return Err(FormatError::Truncated(format!(
                "{count} resources need {} bytes of tables, {remaining} left",
                count as u64 * 8 + 4
            )));
        }

        let mut name_hashes = vec![0u32; count];
        r.read_u32_into::<LE>(&mut name_hashes)?;
        let mut name_positions = vec![0u32; count];
        r.read_u32_into::<LE>(&mut name_positions)?;

        let data_section_offset = r.read_i32::<LE>()?;
        let name_section_offset = r.stream_position()?;
        if data_section_offset < 0
            || (data_section_offset as u64) < name_section_offset
            || data_section_offset as u64 > stream_len
        {
            return Err(FormatError::InvalidData(format!(
                "data section offset {data_section_offset} outside {name_section_offset}..{stream_len}"
            )));
        }
        let data_section_offset = data_section_offset as u64;

        let name_section_len = data_section_offset - name_section_offset;
        if let Some(bad) = name_positions
            .iter()
            .find(|&&p| p as u64 >= name_section_len)
        {
            return Err(FormatError::InvalidData(format!(
                "name position {bad} outside name section of {name_section_len} bytes"
            )));
        }

        debug!(
            header_version,
            version,
            resources = count,
            types = types.len(),
            data_section_offset,
            "read resource set header"
        );

        Ok(Self {
            header_version,
            reader_type,
            set_type,
            version,
            types,
            name_hashes,
            name_positions,
            name_section_offset,
            data_section_offset,
            stream_len,
        })
    }
}

fn read_count<R: Read>(r: &mut R, what: &str) -> FormatResult<usize> {
    let n = r.read_i32::<LE>()?;
    if n < 0 {
        return Err(FormatError::InvalidData(format!("negative {what} count {n}")));
    }
    Ok(n as usize)
}

/// Cheap sniff for the container magic.
pub fn is_resources(data: &[u8]) -> bool {
    data.len() >= 4 && u32::from_le_bytes([data[0], data[1], data[2], data[3]]) == MAGIC
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ResourceValue;
    use crate::writer::ResourceWriter;
    use std::io::Cursor;

    fn container(entries: &[(&str, ResourceValue)]) -> Vec<u8> {
        let mut w = ResourceWriter::new(Vec::new());
        for (k, v) in entries {
            w.add(*k, v.clone());
        }
        w.generate().unwrap()
    }

    #[test]
    fn reads_written_header() {
        let bytes = container(&[
            ("b", ResourceValue::Int32(1)),
            ("a", ResourceValue::String("x".into())),
        ]);
        let header = Header::read(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(header.header_version, HEADER_VERSION);
        assert_eq!(header.version, 2);
        assert_eq!(header.len(), 2);
        assert_eq!(header.set_type, RESOURCE_SET_TYPE);
        assert_eq!(header.stream_len, bytes.len() as u64);
        assert_eq!(header.name_section_offset % 8, 4);
        let mut sorted = header.name_hashes.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, header.name_hashes);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = container(&[]);
        bytes[0] ^= 0xff;
        assert!(matches!(
            Header::read(&mut Cursor::new(&bytes)),
            Err(FormatError::BadMagic(_))
        ));
        assert!(!is_resources(&bytes));
    }

    #[test]
    fn rejects_unknown_set_version() {
        let mut bytes = container(&[]);
        let skip = i32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        let set_version_at = 12 + skip;
        bytes[set_version_at..set_version_at + 4].copy_from_slice(&7i32.to_le_bytes());
        assert!(matches!(
            Header::read(&mut Cursor::new(&bytes)),
            Err(FormatError::UnsupportedVersion { version: 7, .. })
        ));
    }

    #[test]
    fn short_input_is_truncated() {
        let bytes = container(&[("a", ResourceValue::Null)]);
        for cut in [2, 10, 40] {
            let err = Header::read(&mut Cursor::new(&bytes[..cut])).unwrap_err();
            assert!(
                matches!(err, FormatError::Truncated(_) | FormatError::InvalidData(_)),
                "cut {cut}: {err}"
            );
        }
    }
}
