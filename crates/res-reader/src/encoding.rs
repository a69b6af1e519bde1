//! Primitive encodings shared by the reader and the writer.
//!
//! Lengths and type codes use the 7-bit variable-length integer encoding:
//! little-endian groups of 7 bits, high bit set on every byte but the last,
//! at most 5 bytes for a 32-bit value.

use std::io::{Read, Write};

use byteorder::ReadBytesExt;

use crate::error::{FormatError, FormatResult};

const MAX_7BIT_LEN_32: usize = 5;

/// Reads a 7-bit encoded 32-bit integer.
pub fn read_7bit_i32<R: Read>(r: &mut R) -> FormatResult<i32> {
    let mut x: u32 = 0;

    for i in 0..MAX_7BIT_LEN_32 - 1 {
        let byte = r.read_u8()?;
        x |= ((byte & 0x7f) as u32) << (7 * i);
        if byte < 0x80 {
            return Ok(x as i32);
        }
    }

    // Fifth byte carries only the top 4 bits.
    let byte = r.read_u8()?;
    if byte > 0x0f {
        return Err(FormatError::InvalidData("7-bit int overflow".to_string()));
    }
    x |= (byte as u32) << 28;
    Ok(x as i32)
}

pub fn write_7bit_i32<W: Write>(w: &mut W, value: i32) -> std::io::Result<()> {
    let mut v = value as u32;
    while v >= 0x80 {
        w.write_all(&[(v as u8) | 0x80])?;
        v >>= 7;
    }
    w.write_all(&[v as u8])
}

/// Number of bytes `write_7bit_i32` produces for `value`.
pub fn len_7bit_i32(value: i32) -> usize {
    let mut v = value as u32;
    let mut n = 1;
    while v >= 0x80 {
        v >>= 7;
        n += 1;
    }
    n
}

/// Reads a byte length prefix, refusing anything that cannot fit in `limit`.
pub fn read_len<R: Read>(r: &mut R, limit: u64, what: &str) -> FormatResult<usize> {
    let len = read_7bit_i32(r)?;
    if len < 0 {
        return Err(FormatError::InvalidData(format!("negative {what} length {len}")));
    }
    if len as u64 > limit {
        return Err(FormatError::Truncated(format!(
            "{what} length {len} exceeds remaining {limit} bytes"
        )));
    }
    Ok(len as usize)
}

/// Reads a length-prefixed UTF-8 string.
pub fn read_string<R: Read>(r: &mut R, limit: u64) -> FormatResult<String> {
    let len = read_len(r, limit, "string")?;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| FormatError::InvalidData(format!("string not utf-8: {e}")))
}

pub fn write_string<W: Write>(w: &mut W, s: &str) -> std::io::Result<()> {
    write_7bit_i32(w, s.len() as i32)?;
    w.write_all(s.as_bytes())
}

/// Reads a resource name: byte-length-prefixed UTF-16LE.
pub fn read_utf16<R: Read>(r: &mut R, limit: u64) -> FormatResult<String> {
    let len = read_len(r, limit, "name")?;
    if len % 2 != 0 {
        return Err(FormatError::InvalidData(format!("odd name byte length {len}")));
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    let units: Vec<u16> = buf
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).map_err(|e| FormatError::InvalidData(format!("name not utf-16: {e}")))
}

pub fn write_utf16<W: Write>(w: &mut W, s: &str) -> std::io::Result<()> {
    let bytes: Vec<u8> = s.encode_utf16().flat_map(u16::to_le_bytes).collect();
    write_7bit_i32(w, bytes.len() as i32)?;
    w.write_all(&bytes)
}

/// Hash the container stores for each resource name.
pub fn hash_name(key: &str) -> u32 {
    key.encode_utf16()
        .fold(5381u32, |h, c| (h.wrapping_shl(5).wrapping_add(h)) ^ c as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(v: i32) -> Vec<u8> {
        let mut out = Vec::new();
        write_7bit_i32(&mut out, v).unwrap();
        out
    }

    #[test]
    fn seven_bit_known_encodings() {
        assert_eq!(encode(0), vec![0x00]);
        assert_eq!(encode(0x7f), vec![0x7f]);
        assert_eq!(encode(0x80), vec![0x80, 0x01]);
        assert_eq!(encode(300), vec![0xac, 0x02]);
        assert_eq!(encode(-1), vec![0xff, 0xff, 0xff, 0xff, 0x0f]);
        assert_eq!(len_7bit_i32(300), 2);
        assert_eq!(len_7bit_i32(-1), 5);
    }

    #[test]
    fn seven_bit_reads_back_extremes() {
        for v in [0, 1, 127, 128, 16_383, 16_384, i32::MAX, i32::MIN, -1] {
            let bytes = encode(v);
            assert_eq!(read_7bit_i32(&mut Cursor::new(bytes)).unwrap(), v);
        }
    }

    #[test]
    fn seven_bit_overflow_is_rejected() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0x1f];
        assert!(matches!(
            read_7bit_i32(&mut Cursor::new(bytes)),
            Err(FormatError::InvalidData(_))
        ));
    }

    #[test]
    fn seven_bit_eof_is_truncated() {
        let bytes = [0x80];
        assert!(matches!(
            read_7bit_i32(&mut Cursor::new(bytes)),
            Err(FormatError::Truncated(_))
        ));
    }

    #[test]
    fn string_length_beyond_limit() {
        let mut bytes = Vec::new();
        write_string(&mut bytes, "hello").unwrap();
        assert!(matches!(
            read_string(&mut Cursor::new(&bytes), 3),
            Err(FormatError::Truncated(_))
        ));
        assert_eq!(read_string(&mut Cursor::new(&bytes), 64).unwrap(), "hello");
    }

    #[test]
    fn utf16_names() {
        let mut bytes = Vec::new();
        write_utf16(&mut bytes, "Ünïcode.Name").unwrap();
        assert_eq!(bytes[0] as usize, "Ünïcode.Name".encode_utf16().count() * 2);
        assert_eq!(read_utf16(&mut Cursor::new(&bytes), 64).unwrap(), "Ünïcode.Name");
    }

    #[test]
    fn name_hash_matches_format() {
        assert_eq!(hash_name(""), 5381);
        // ((5381 << 5) + 5381) ^ 'A'
        assert_eq!(hash_name("A"), (5381u32 * 33) ^ 0x41);
        assert_ne!(hash_name("ab"), hash_name("ba"));
    }
}
