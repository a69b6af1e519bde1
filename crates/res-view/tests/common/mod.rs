#![allow(dead_code)]

use res_reader::{ResourceValue, ResourceWriter};

pub const CULTURE_INFO: &str = "System.Globalization.CultureInfo, mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089";

pub fn container(entries: &[(&str, ResourceValue)]) -> Vec<u8> {
    let mut w = ResourceWriter::new(Vec::new());
    for (k, v) in entries {
        w.add(*k, v.clone());
    }
    w.generate().expect("write container")
}

/// Minimal serialized object graph carrying `name` as its first string
/// record, the way a serialized culture does.
pub fn culture_payload(name: &str) -> Vec<u8> {
    let mut v = vec![0x00];
    for part in [1i32, -1, 1, 0] {
        v.extend_from_slice(&part.to_le_bytes());
    }
    v.push(0x06);
    v.extend_from_slice(&3i32.to_le_bytes());
    v.push(name.len() as u8);
    v.extend_from_slice(name.as_bytes());
    v.push(0x0b);
    v
}

pub fn png_header() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0x0d]
}
