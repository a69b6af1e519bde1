use std::io::{self, Write};

use byteorder::{LittleEndian as LE, WriteBytesExt};

use crate::encoding::{hash_name, write_7bit_i32, write_string, write_utf16};
use crate::header::{HEADER_VERSION, MAGIC, READER_TYPE, RESOURCE_SET_TYPE};
use crate::value::{ResourceValue, USER_TYPES_START};

const SET_VERSION: i32 = 2;

/// Builds a version 2 container. Entries are buffered until
/// [`ResourceWriter::generate`]; duplicate keys are written as given.
pub struct ResourceWriter<W: Write> {
    w: W,
    entries: Vec<(String, ResourceValue)>,
}

impl<W: Write> ResourceWriter<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, key: impl Into<String>, value: ResourceValue) {
        self.entries.push((key.into(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the whole container and hands back the sink.
    pub fn generate(mut self) -> io::Result<W> {
        let mut types: Vec<&str> = Vec::new();
        for (_, v) in &self.entries {
            if let ResourceValue::Serialized { type_name, .. } = v {
                if !types.contains(&type_name.as_str()) {
                    types.push(type_name);
                }
            }
        }

        let mut order: Vec<(u32, usize)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (hash_name(k), i))
            .collect();
        order.sort_by_key(|&(h, _)| h);

        let mut data = Vec::new();
        let mut names = Vec::new();
        let mut positions = Vec::with_capacity(order.len());
        for &(_, i) in &order {
            let (key, value) = &self.entries[i];
            positions.push(names.len() as u32);
            write_utf16(&mut names, key)?;
            names.write_i32::<LE>(data.len() as i32)?;
            write_value(&mut data, value, &types)?;
        }

        let mut head = Vec::new();
        head.write_u32::<LE>(MAGIC)?;
        head.write_i32::<LE>(HEADER_VERSION)?;
        let mut manager = Vec::new();
        write_string(&mut manager, READER_TYPE)?;
        write_string(&mut manager, RESOURCE_SET_TYPE)?;
        head.write_i32::<LE>(manager.len() as i32)?;
        head.extend_from_slice(&manager);

        head.write_i32::<LE>(SET_VERSION)?;
        head.write_i32::<LE>(order.len() as i32)?;
        head.write_i32::<LE>(types.len() as i32)?;
        for t in &types {
            write_string(&mut head, t)?;
        }
        let misalign = head.len() & 7;
        if misalign != 0 {
            head.extend(b"PAD".iter().cycle().take(8 - misalign));
        }
        for &(h, _) in &order {
            head.write_u32::<LE>(h)?;
        }
        for p in &positions {
            head.write_u32::<LE>(*p)?;
        }
        let data_section = head.len() + 4 + names.len();
        head.write_i32::<LE>(data_section as i32)?;

        self.w.write_all(&head)?;
        self.w.write_all(&names)?;
        self.w.write_all(&data)?;
        self.w.flush()?;
        Ok(self.w)
    }
}

fn write_value<W: Write>(w: &mut W, value: &ResourceValue, types: &[&str]) -> io::Result<()> {
    let code = match value.type_code() {
        Some(tc) => tc as i32,
        None => {
            let ResourceValue::Serialized { type_name, .. } = value else {
                return Err(io::Error::other("untyped value without a type name"));
            };
            let idx = types
                .iter()
                .position(|t| *t == type_name.as_str())
                .ok_or_else(|| io::Error::other(format!("type {type_name} not in table")))?;
            USER_TYPES_START + idx as i32
        }
    };
    write_7bit_i32(w, code)?;

    match value {
        ResourceValue::Null => {}
        ResourceValue::String(s) => write_string(w, s)?,
        ResourceValue::Boolean(b) => w.write_u8(*b as u8)?,
        ResourceValue::Char(c) => w.write_u16::<LE>(*c)?,
        ResourceValue::Byte(v) => w.write_u8(*v)?,
        ResourceValue::SByte(v) => w.write_i8(*v)?,
        ResourceValue::Int16(v) => w.write_i16::<LE>(*v)?,
        ResourceValue::UInt16(v) => w.write_u16::<LE>(*v)?,
        ResourceValue::Int32(v) => w.write_i32::<LE>(*v)?,
        ResourceValue::UInt32(v) => w.write_u32::<LE>(*v)?,
        ResourceValue::Int64(v) => w.write_i64::<LE>(*v)?,
        ResourceValue::UInt64(v) => w.write_u64::<LE>(*v)?,
        ResourceValue::Single(v) => w.write_f32::<LE>(*v)?,
        ResourceValue::Double(v) => w.write_f64::<LE>(*v)?,
        ResourceValue::Decimal(d) => {
            for part in [d.lo, d.mid, d.hi, d.flags] {
                w.write_i32::<LE>(part)?;
            }
        }
        ResourceValue::DateTime(d) => w.write_i64::<LE>(d.to_binary())?,
        ResourceValue::TimeSpan(t) => w.write_i64::<LE>(t.0)?,
        ResourceValue::ByteArray(b) | ResourceValue::Stream(b) => {
            w.write_i32::<LE>(b.len() as i32)?;
            w.write_all(b)?;
        }
        ResourceValue::Serialized { data, .. } => w.write_all(data)?,
    }
    Ok(())
}
