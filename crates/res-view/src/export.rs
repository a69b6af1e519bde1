use std::{
    io::{self, Read, Seek, Write},
    path::Path,
};

use res_reader::{FormatError, ResourceReader};
use tracing::{debug, info};

use crate::resx::ResXWriter;
use crate::source::ResourceSource;

/// Output formats a container can be saved in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveFormat {
    /// The source bytes, unchanged.
    RawCopy,
    /// An XML resource document.
    ResX,
}

impl SaveFormat {
    pub const ALL: [SaveFormat; 2] = [SaveFormat::RawCopy, SaveFormat::ResX];

    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::RawCopy => "resources",
            SaveFormat::ResX => "resx",
        }
    }

    /// Filter label for a save dialog.
    pub fn description(self) -> &'static str {
        match self {
            SaveFormat::RawCopy => "Resources file (*.resources)",
            SaveFormat::ResX => "Resource XML file (*.resx)",
        }
    }

    /// Picks the format from a destination file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The destination picker was dismissed. Not an error.
    Declined,
    /// The source could not be opened; another handler may try.
    NotHandled,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot read resource container: {0}")]
    Format(#[from] FormatError),

    #[error("resource '{key}' of type {type_name} cannot be written in this format")]
    Unsupported { key: String, type_name: String },
}

pub type Result<T> = std::result::Result<T, ExportError>;

/// Chooses where and how to save. `Ok(None)` means the user declined.
pub trait DestinationPicker {
    fn pick(&mut self, suggested_name: &str) -> io::Result<Option<(SaveFormat, Box<dyn Write>)>>;
}

/// Writes the container in `stream` to `destination`. `RawCopy` copies the
/// bytes from the start of the stream; `ResX` re-encodes every record and
/// fails on the first value ResX cannot represent.
pub fn export<R, W>(format: SaveFormat, mut stream: R, mut destination: W) -> Result<W>
where
    R: Read + Seek,
    W: Write,
{
    match format {
        SaveFormat::RawCopy => {
            stream.rewind()?;
            let copied = io::copy(&mut stream, &mut destination)?;
            destination.flush()?;
            debug!("copied {copied} bytes");
            Ok(destination)
        }
        SaveFormat::ResX => {
            let reader = ResourceReader::new(stream)?;
            let mut resx = ResXWriter::new(destination)?;
            for record in reader {
                let record = record?;
                resx.add_resource(&record.key, &record.value)?;
            }
            debug!("wrote {} resx entries", resx.len());
            resx.finish()
        }
    }
}

/// Saves `source` to a destination chosen by `picker`.
pub fn save<S: ResourceSource>(source: &S, picker: &mut dyn DestinationPicker) -> Result<SaveOutcome> {
    let Some(stream) = source.try_open() else {
        return Ok(SaveOutcome::NotHandled);
    };
    let Some((format, destination)) = picker.pick(&suggested_file_name(source.name()))? else {
        return Ok(SaveOutcome::Declined);
    };
    export(format, stream, destination)?;
    info!("saved {} as {:?}", source.name(), format);
    Ok(SaveOutcome::Saved)
}

/// File name offered to the destination picker: the name up to the first
/// `:` or backtick, trimmed, with characters not allowed in file names
/// replaced by `-`.
pub fn suggested_file_name(name: &str) -> String {
    let mut name = name;
    for stop in [':', '`'] {
        if let Some(pos) = name.find(stop).filter(|&p| p > 0) {
            name = &name[..pos];
        }
    }
    name.trim()
        .chars()
        .map(|c| match c {
            '"' | '<' | '>' | '|' | ':' | '*' | '?' | '\\' | '/' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect()
}
