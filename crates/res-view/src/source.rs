use std::{
    fs::File,
    io::{self, Cursor, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use bytes::Bytes;
use res_reader::stream::{MemoryStream, is_zstd_path, read_zstd};
use tracing::debug;

/// Something that can hand out a fresh seekable stream of container bytes.
pub trait ResourceSource {
    type Stream: Read + Seek;

    /// Name used for display and for suggesting export file names.
    fn name(&self) -> &str;

    /// Opens a new stream positioned at the start, or `None` when the
    /// content cannot be read.
    fn try_open(&self) -> Option<Self::Stream>;
}

/// Stream over either a plain file or a decompressed `.zst` file.
pub enum SourceStream {
    File(File),
    Memory(MemoryStream),
}

impl Read for SourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SourceStream::File(f) => f.read(buf),
            SourceStream::Memory(m) => m.read(buf),
        }
    }
}

impl Seek for SourceStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            SourceStream::File(f) => f.seek(pos),
            SourceStream::Memory(m) => m.seek(pos),
        }
    }
}

/// A container on disk. Paths ending in `.zst` are decompressed on open
/// and the source is named after the inner file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = if is_zstd_path(&path) {
            file_name
                .strip_suffix(".zst")
                .or_else(|| file_name.strip_suffix(".ZST"))
                .unwrap_or(&file_name)
                .to_string()
        } else {
            file_name
        };
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResourceSource for FileSource {
    type Stream = SourceStream;

    fn name(&self) -> &str {
        &self.name
    }

    fn try_open(&self) -> Option<SourceStream> {
        let opened = if is_zstd_path(&self.path) {
            read_zstd(&self.path)
                .map(|b| SourceStream::Memory(Cursor::new(b)))
                .map_err(|e| e.to_string())
        } else {
            File::open(&self.path)
                .map(SourceStream::File)
                .map_err(|e| e.to_string())
        };
        match opened {
            Ok(s) => Some(s),
            Err(e) => {
                debug!("cannot open {}: {e}", self.path.display());
                None
            }
        }
    }
}

/// Container bytes already in memory, e.g. an entry of an archive.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Bytes,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl ResourceSource for MemorySource {
    type Stream = MemoryStream;

    fn name(&self) -> &str {
        &self.name
    }

    fn try_open(&self) -> Option<MemoryStream> {
        Some(Cursor::new(self.bytes.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_names() {
        assert_eq!(FileSource::new("/a/b/Strings.resources").name(), "Strings.resources");
        let packed = FileSource::new("x/App.resources.zst");
        assert_eq!(packed.name(), "App.resources");
        assert_eq!(packed.path(), Path::new("x/App.resources.zst"));
    }

    #[test]
    fn missing_file_does_not_open() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileSource::new(dir.path().join("gone.resources")).try_open().is_none());
        assert!(FileSource::new(dir.path().join("gone.resources.zst")).try_open().is_none());
    }

    #[test]
    fn memory_source_reopens_at_start() {
        let src = MemorySource::new("m.resources", vec![1u8, 2, 3]);
        let mut a = src.try_open().unwrap();
        let mut buf = Vec::new();
        a.read_to_end(&mut buf).unwrap();
        let b = src.try_open().unwrap();
        assert_eq!(b.position(), 0);
        assert_eq!(buf, [1, 2, 3]);
    }
}
