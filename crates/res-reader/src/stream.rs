use std::{
    fs::File,
    io::{BufReader, Cursor, Read},
    path::Path,
};

use bytes::Bytes;

use crate::{
    ResourceReader,
    error::{FormatError, FormatResult as Result},
};

const ZSTD_BUF: usize = 1 << 20;

/// Seekable in-memory container bytes.
pub type MemoryStream = Cursor<Bytes>;

pub fn open_file(path: &Path) -> Result<ResourceReader<File>> {
    let file = File::open(path).map_err(|e| FormatError::Io(annotate(path, e)))?;
    ResourceReader::new(file)
}

/// Opens a zstd-compressed container. The reader needs random access, so
/// the whole container is decompressed up front.
pub fn open_zstd(path: &Path) -> Result<ResourceReader<MemoryStream>> {
    let bytes = read_zstd(path)?;
    ResourceReader::new(Cursor::new(bytes))
}

pub fn read_zstd(path: &Path) -> Result<Bytes> {
    let file = File::open(path).map_err(|e| FormatError::Io(annotate(path, e)))?;
    let file = BufReader::with_capacity(ZSTD_BUF, file);
    let mut zstd = zstd::Decoder::with_buffer(file)
        .map_err(|e| FormatError::InvalidData(format!("zstd decoder init failed: {e}")))?;

    let mut out = Vec::new();
    zstd.read_to_end(&mut out)
        .map_err(|e| FormatError::InvalidData(format!("zstd decode failed: {e}")))?;
    Ok(Bytes::from(out))
}

pub fn is_zstd_path(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("zst"))
}

fn annotate(path: &Path, e: std::io::Error) -> std::io::Error {
    std::io::Error::new(e.kind(), format!("open {}: {e}", path.display()))
}
