use std::io::{Cursor, Read};

use res_reader::is_resources;
use res_view::BlobResolver;
use serde::Serialize;

const NESTED_MIME: &str = "application/x-dotnet-resources";

/// A blob recognized by its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedFile {
    pub key: String,
    pub mime_type: String,
    pub extension: String,
    pub len: usize,
}

/// Claims blobs whose magic bytes identify a known file type, including
/// nested resource containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentResolver;

impl BlobResolver for ContentResolver {
    type Node = EmbeddedFile;

    fn resolve(&self, key: &str, data: &mut Cursor<&[u8]>) -> Option<EmbeddedFile> {
        let mut buf = Vec::new();
        data.read_to_end(&mut buf).ok()?;

        let (mime_type, extension) = if is_resources(&buf) {
            (NESTED_MIME, "resources")
        } else {
            let kind = infer::get(&buf)?;
            (kind.mime_type(), kind.extension())
        };
        Some(EmbeddedFile {
            key: key.to_string(),
            mime_type: mime_type.to_string(),
            extension: extension.to_string(),
            len: buf.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(data: &[u8]) -> Option<EmbeddedFile> {
        ContentResolver.resolve("k", &mut Cursor::new(data))
    }

    #[test]
    fn recognizes_png() {
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0x0d];
        let f = resolve(&png).unwrap();
        assert_eq!(f.mime_type, "image/png");
        assert_eq!(f.extension, "png");
        assert_eq!(f.len, png.len());
    }

    #[test]
    fn recognizes_nested_container() {
        let bytes = res_reader::ResourceWriter::new(Vec::new()).generate().unwrap();
        assert_eq!(resolve(&bytes).unwrap().extension, "resources");
    }

    #[test]
    fn declines_unknown_bytes() {
        assert_eq!(resolve(&[1, 2, 3, 4]), None);
        assert_eq!(resolve(&[]), None);
    }
}
