use anyhow::{Context, Result};
use std::{
    fmt,
    io::{self, BufWriter, Write},
    path::Path,
};
use tracing::{info, warn};

use res_view::{
    ComplexEntry, FileSource, ResourceDisplay, ResourceSource, ResourcesFile, TextEntry,
    is_resources_file,
};

use super::resolver::{ContentResolver, EmbeddedFile};

/// Plain-text tables, one section per non-empty group.
pub struct TextDisplay<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> TextDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if self.error.is_none() {
            if let Err(e) = self.out.write_fmt(args).and_then(|_| self.out.write_all(b"\n")) {
                self.error = Some(e);
            }
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Keeps each entry on one line.
fn one_line(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

impl<W: Write> ResourceDisplay<EmbeddedFile> for TextDisplay<W> {
    fn string_table(&mut self, entries: &[TextEntry]) {
        self.line(format_args!("== strings ({}) ==", entries.len()));
        for e in entries {
            self.line(format_args!("{}\t{}", one_line(&e.key), one_line(&e.text)));
        }
    }

    fn object_table(&mut self, entries: &[ComplexEntry]) {
        self.line(format_args!("== objects ({}) ==", entries.len()));
        for e in entries {
            self.line(format_args!(
                "{}\t{}\t{}",
                one_line(&e.key),
                e.type_name,
                one_line(&e.display_text)
            ));
        }
    }

    fn children(&mut self, nodes: &[EmbeddedFile]) {
        self.line(format_args!("== embedded ({}) ==", nodes.len()));
        for n in nodes {
            self.line(format_args!(
                "{}\t{}\t{} bytes",
                one_line(&n.key),
                n.mime_type,
                n.len
            ));
        }
    }
}

pub fn list_resources(path: &Path, json: bool) -> Result<()> {
    let source = FileSource::new(path);
    if !is_resources_file(source.name()) {
        warn!("{} does not have a .resources extension", source.path().display());
    }
    let file = ResourcesFile::new(source, ContentResolver);
    let set = file.resources();
    info!("{}: {} entries", file.name(), set.len());

    let stdout = BufWriter::new(io::stdout().lock());
    if json {
        let mut out = stdout;
        serde_json::to_writer_pretty(&mut out, set).context("write json")?;
        writeln!(out)?;
        out.flush()?;
    } else {
        let mut display = TextDisplay::new(stdout);
        file.render(&mut display);
        display.finish().context("write listing")?;
    }
    Ok(())
}
