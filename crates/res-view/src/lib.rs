//! Presentation and export of `.resources` containers.
//!
//! Records read by `res-reader` are ordered by key and sorted into three
//! groups: string entries, binary blobs claimed by a caller-supplied
//! [`BlobResolver`], and everything else with a type name and display text.
//! Containers can be saved unchanged or re-encoded as ResX.

pub mod classify;
pub mod culture;
pub mod export;
pub mod resource_set;
pub mod resources_file;
pub mod resx;
pub mod source;

pub use classify::{
    BlobEntry, BlobResolver, BlobSource, Classified, ClassifiedEntry, ComplexEntry, NoResolver,
    TextEntry, classify,
};
pub use culture::Culture;
pub use export::{DestinationPicker, ExportError, SaveFormat, SaveOutcome, export, save};
pub use resource_set::{ResourceSet, sort_records};
pub use resources_file::{ResourceDisplay, ResourcesFile, is_resources_file};
pub use resx::ResXWriter;
pub use source::{FileSource, MemorySource, ResourceSource, SourceStream};
