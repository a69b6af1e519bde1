//! ResX (XML resource) output.

use std::io::Write;

use base64::{Engine, engine::general_purpose::STANDARD};
use res_reader::{ResourceValue, value::TICKS_PER_SECOND};

use crate::export::{ExportError, Result};

const RESX_MIME_TYPE: &str = "text/microsoft-resx";
const RESX_VERSION: &str = "2.0";
const RESX_READER: &str = "System.Resources.ResXResourceReader, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089";
const RESX_WRITER: &str = "System.Resources.ResXResourceWriter, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089";
const NULL_REF_TYPE: &str = "System.Resources.ResXNullRef, System.Windows.Forms";
pub const BINARY_MIME_TYPE: &str = "application/x-microsoft.net.object.binary.base64";

const TICKS_PER_DAY: i64 = 86_400 * TICKS_PER_SECOND;
const BASE64_LINE: usize = 80;
const BASE64_INDENT: &str = "        ";

/// Streams resources into a ResX document. The header is written on
/// construction and the root element is closed by [`ResXWriter::finish`].
pub struct ResXWriter<W: Write> {
    w: W,
    count: usize,
}

impl<W: Write> ResXWriter<W> {
    pub fn new(mut w: W) -> Result<Self> {
        writeln!(w, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
        writeln!(w, "<root>")?;
        for (name, value) in [
            ("resmimetype", RESX_MIME_TYPE),
            ("version", RESX_VERSION),
            ("reader", RESX_READER),
            ("writer", RESX_WRITER),
        ] {
            writeln!(w, r#"  <resheader name="{name}">"#)?;
            writeln!(w, "    <value>{value}</value>")?;
            writeln!(w, "  </resheader>")?;
        }
        Ok(Self { w, count: 0 })
    }

    /// Number of resources written so far.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Appends one resource. Values with no ResX form are an
    /// [`ExportError::Unsupported`]; nothing is written for them. That
    /// covers streams and a `Char` holding a lone surrogate, which XML
    /// text cannot carry.
    pub fn add_resource(&mut self, key: &str, value: &ResourceValue) -> Result<()> {
        let name = escape(key, true);
        match value {
            ResourceValue::String(s) => {
                self.data(&name, r#" xml:space="preserve""#, &escape(s, false))?;
            }
            ResourceValue::Null => {
                writeln!(self.w, r#"  <data name="{name}" type="{NULL_REF_TYPE}">"#)?;
                writeln!(self.w, "    <value />")?;
                writeln!(self.w, "  </data>")?;
            }
            ResourceValue::ByteArray(b) => {
                self.data(&name, r#" type="System.Byte[], mscorlib""#, &wrapped_base64(b))?;
            }
            ResourceValue::Serialized { data, .. } => {
                let attr = format!(r#" mimetype="{BINARY_MIME_TYPE}""#);
                self.data(&name, &attr, &wrapped_base64(data))?;
            }
            ResourceValue::Stream(_) | ResourceValue::Char(0xd800..=0xdfff) => {
                return Err(ExportError::Unsupported {
                    key: key.to_string(),
                    type_name: value.type_name().to_string(),
                });
            }
            primitive => {
                let attr = format!(r#" type="{}, mscorlib""#, primitive.type_name());
                self.data(&name, &attr, &escape(&invariant_text(primitive), false))?;
            }
        }
        self.count += 1;
        Ok(())
    }

    fn data(&mut self, name: &str, attrs: &str, value: &str) -> Result<()> {
        writeln!(self.w, r#"  <data name="{name}"{attrs}>"#)?;
        writeln!(self.w, "    <value>{value}</value>")?;
        writeln!(self.w, "  </data>")?;
        Ok(())
    }

    /// Closes the document and hands back the sink.
    pub fn finish(mut self) -> Result<W> {
        writeln!(self.w, "</root>")?;
        self.w.flush()?;
        Ok(self.w)
    }
}

/// Round-trippable text for primitive values. Dates at midnight drop the
/// time part.
fn invariant_text(value: &ResourceValue) -> String {
    match value {
        ResourceValue::DateTime(dt) => match dt.to_naive() {
            Some(n) if dt.ticks % TICKS_PER_DAY == 0 => n.format("%Y-%m-%d").to_string(),
            _ => dt.to_string(),
        },
        other => other.to_string(),
    }
}

fn wrapped_base64(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    if encoded.len() <= BASE64_LINE {
        return encoded;
    }
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE * 10 + 8);
    for chunk in encoded.as_bytes().chunks(BASE64_LINE) {
        out.push('\n');
        out.push_str(BASE64_INDENT);
        // base64 output is ASCII
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
    }
    out.push('\n');
    out.push_str("    ");
    out
}

/// Escapes XML markup; `attr` also escapes quotes. Control characters
/// other than tab, CR and LF become character references.
fn escape(s: &str, attr: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            '\'' if attr => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if (c as u32) < 0x20 => out.push_str(&format!("&#x{:X};", c as u32)),
            c => out.push(c),
        }
    }
    out
}
