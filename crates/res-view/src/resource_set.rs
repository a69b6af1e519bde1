use std::io::{Read, Seek};

use res_reader::{FormatResult, RawRecord, ResourceReader};
use serde::Serialize;
use tracing::{debug, warn};

use crate::classify::{BlobResolver, Classified, ComplexEntry, TextEntry, classify};

/// The classified contents of one container, ordered by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSet<N> {
    pub text_entries: Vec<TextEntry>,
    pub complex_entries: Vec<ComplexEntry>,
    pub children: Vec<N>,
}

impl<N> Default for ResourceSet<N> {
    fn default() -> Self {
        Self {
            text_entries: Vec::new(),
            complex_entries: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// Orders records by the raw UTF-8 bytes of their keys. The sort is
/// stable, so duplicate keys keep their container order.
pub fn sort_records(records: &mut [RawRecord]) {
    records.sort_by(|a, b| a.key.as_bytes().cmp(b.key.as_bytes()));
}

impl<N> ResourceSet<N> {
    /// Reads, orders and classifies every record of `stream`. A container
    /// that fails to parse at any point yields an empty set.
    pub fn load<R, B>(stream: R, resolver: &B) -> Self
    where
        R: Read + Seek,
        B: BlobResolver<Node = N>,
    {
        match collect(stream) {
            Ok(records) => Self::from_records(records, resolver),
            Err(e) => {
                warn!("unreadable resource container: {e}");
                Self::default()
            }
        }
    }

    pub fn from_records<B>(mut records: Vec<RawRecord>, resolver: &B) -> Self
    where
        B: BlobResolver<Node = N>,
    {
        sort_records(&mut records);
        let mut set = Self::default();
        for record in records {
            set.push(classify(record, resolver));
        }
        debug!(
            "classified {} text, {} complex, {} child entries",
            set.text_entries.len(),
            set.complex_entries.len(),
            set.children.len()
        );
        set
    }

    pub fn push(&mut self, entry: Classified<N>) {
        match entry {
            Classified::Text(t) => self.text_entries.push(t),
            Classified::Complex(c) => self.complex_entries.push(c),
            Classified::Child(n) => self.children.push(n),
        }
    }

    /// Total entries across the three groups.
    pub fn len(&self) -> usize {
        self.text_entries.len() + self.complex_entries.len() + self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn collect<R: Read + Seek>(stream: R) -> FormatResult<Vec<RawRecord>> {
    let reader = ResourceReader::new(stream)?;
    let mut records = Vec::with_capacity(reader.len());
    for record in reader {
        records.push(record?);
    }
    Ok(records)
}
