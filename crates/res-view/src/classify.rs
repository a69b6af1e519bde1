use std::io::Cursor;

use res_reader::{RawRecord, ResourceValue, value::strip_assembly};
use serde::Serialize;

use crate::culture::{CULTURE_INFO_TYPE, Culture};

/// A string resource shown in the string table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEntry {
    pub key: String,
    pub text: String,
}

/// Where a blob came from; decides the type shown when no resolver
/// claims it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlobSource {
    ByteArray,
    Stream,
}

impl BlobSource {
    pub fn type_name(self) -> &'static str {
        match self {
            BlobSource::ByteArray => "System.Byte[]",
            BlobSource::Stream => "System.IO.UnmanagedMemoryStream",
        }
    }
}

/// Raw binary content offered to a [`BlobResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    pub key: String,
    pub bytes: Vec<u8>,
    pub source: BlobSource,
}

/// Any other value, shown by type and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplexEntry {
    pub key: String,
    pub type_name: String,
    pub display_text: String,
}

/// First-pass classification of a record by its value's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedEntry {
    Text(TextEntry),
    Blob(BlobEntry),
    Complex(ComplexEntry),
}

/// Final placement of a record once blobs have been offered to the
/// resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified<N> {
    Text(TextEntry),
    Complex(ComplexEntry),
    Child(N),
}

/// Turns binary content into a richer child node (an image, a nested
/// document, ...). Returning `None` declines the blob.
pub trait BlobResolver {
    type Node;

    fn resolve(&self, key: &str, data: &mut Cursor<&[u8]>) -> Option<Self::Node>;
}

impl<N, F> BlobResolver for F
where
    F: Fn(&str, &mut Cursor<&[u8]>) -> Option<N>,
{
    type Node = N;

    fn resolve(&self, key: &str, data: &mut Cursor<&[u8]>) -> Option<N> {
        self(key, data)
    }
}

/// Resolver that declines everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl BlobResolver for NoResolver {
    type Node = ();

    fn resolve(&self, _key: &str, _data: &mut Cursor<&[u8]>) -> Option<()> {
        None
    }
}

impl From<RawRecord> for ClassifiedEntry {
    fn from(RawRecord { key, value }: RawRecord) -> Self {
        match value {
            ResourceValue::String(text) => ClassifiedEntry::Text(TextEntry { key, text }),
            ResourceValue::ByteArray(bytes) => ClassifiedEntry::Blob(BlobEntry {
                key,
                bytes,
                source: BlobSource::ByteArray,
            }),
            ResourceValue::Stream(bytes) => ClassifiedEntry::Blob(BlobEntry {
                key,
                bytes,
                source: BlobSource::Stream,
            }),
            other => ClassifiedEntry::Complex(complex_entry(key, &other)),
        }
    }
}

impl BlobEntry {
    /// The entry as shown when no resolver wants it.
    pub fn into_complex(self) -> ComplexEntry {
        let type_name = self.source.type_name().to_string();
        ComplexEntry {
            key: self.key,
            display_text: type_name.clone(),
            type_name,
        }
    }
}

fn complex_entry(key: String, value: &ResourceValue) -> ComplexEntry {
    let display_text = culture_display_name(value).unwrap_or_else(|| value.to_string());
    ComplexEntry {
        key,
        type_name: value.type_name().to_string(),
        display_text,
    }
}

fn culture_display_name(value: &ResourceValue) -> Option<String> {
    match value {
        ResourceValue::Serialized { type_name, data }
            if strip_assembly(type_name) == CULTURE_INFO_TYPE =>
        {
            Culture::from_serialized(data).map(|c| c.display_name())
        }
        _ => None,
    }
}

/// Classifies one record. Blobs are offered to `resolver` with a cursor at
/// position zero; a declined blob falls back to a complex entry.
pub fn classify<B: BlobResolver>(record: RawRecord, resolver: &B) -> Classified<B::Node> {
    match ClassifiedEntry::from(record) {
        ClassifiedEntry::Text(t) => Classified::Text(t),
        ClassifiedEntry::Complex(c) => Classified::Complex(c),
        ClassifiedEntry::Blob(blob) => {
            let node = resolver.resolve(&blob.key, &mut Cursor::new(&blob.bytes[..]));
            match node {
                Some(node) => Classified::Child(node),
                None => Classified::Complex(blob.into_complex()),
            }
        }
    }
}
