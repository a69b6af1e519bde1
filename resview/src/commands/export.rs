use anyhow::{Result, bail};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use res_view::{DestinationPicker, FileSource, SaveFormat, SaveOutcome, save};

/// Resolves the output of `resview export` from the command line instead
/// of a dialog. A directory output gets the suggested file name; an
/// existing file is only replaced with `force`.
pub struct PathPicker {
    output: PathBuf,
    format: Option<SaveFormat>,
    force: bool,
    chosen: Option<PathBuf>,
}

impl PathPicker {
    pub fn new(output: PathBuf, format: Option<SaveFormat>, force: bool) -> Self {
        Self {
            output,
            format,
            force,
            chosen: None,
        }
    }

    fn destination(&self, suggested_name: &str) -> (PathBuf, Option<SaveFormat>) {
        if self.output.is_dir() {
            let format = self.format.unwrap_or(SaveFormat::ResX);
            let path = self
                .output
                .join(suggested_name)
                .with_extension(format.extension());
            (path, Some(format))
        } else {
            let format = self.format.or_else(|| SaveFormat::from_path(&self.output));
            (self.output.clone(), format)
        }
    }
}

impl DestinationPicker for PathPicker {
    fn pick(&mut self, suggested_name: &str) -> io::Result<Option<(SaveFormat, Box<dyn Write>)>> {
        let (path, format) = self.destination(suggested_name);
        let Some(format) = format else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "cannot tell the format of {}; pass --format or use one of: {}",
                    path.display(),
                    SaveFormat::ALL.map(SaveFormat::description).join(", ")
                ),
            ));
        };
        if path.exists() && !self.force {
            warn!("{} exists; pass --force to replace it", path.display());
            return Ok(None);
        }
        let file = File::create(&path)
            .map_err(|e| io::Error::new(e.kind(), format!("create {}: {e}", path.display())))?;
        self.chosen = Some(path);
        Ok(Some((format, Box::new(BufWriter::new(file)))))
    }
}

pub fn export_resources(
    input: &Path,
    output: PathBuf,
    format: Option<SaveFormat>,
    force: bool,
) -> Result<()> {
    let source = FileSource::new(input);
    let mut picker = PathPicker::new(output, format, force);
    match save(&source, &mut picker)? {
        SaveOutcome::Saved => {
            if let Some(p) = &picker.chosen {
                info!("wrote {}", p.display());
            }
            Ok(())
        }
        SaveOutcome::Declined => {
            info!("nothing written");
            Ok(())
        }
        SaveOutcome::NotHandled => bail!("cannot open {}", input.display()),
    }
}
