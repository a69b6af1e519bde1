use std::cell::OnceCell;

use tracing::warn;

use crate::classify::{BlobResolver, ComplexEntry, TextEntry};
use crate::export::{self, DestinationPicker, SaveOutcome};
use crate::resource_set::ResourceSet;
use crate::source::ResourceSource;

const RESOURCES_EXTENSION: &[u8] = b".resources";

/// True when `name` ends with `.resources`, ignoring ASCII case.
pub fn is_resources_file(name: &str) -> bool {
    let name = name.as_bytes();
    name.len() >= RESOURCES_EXTENSION.len()
        && name[name.len() - RESOURCES_EXTENSION.len()..].eq_ignore_ascii_case(RESOURCES_EXTENSION)
}

/// Receives the grouped contents of a container for presentation.
pub trait ResourceDisplay<N> {
    fn string_table(&mut self, entries: &[TextEntry]);

    fn object_table(&mut self, entries: &[ComplexEntry]);

    fn children(&mut self, _nodes: &[N]) {}
}

/// A container node whose contents are read on first access.
pub struct ResourcesFile<S: ResourceSource, B: BlobResolver> {
    source: S,
    resolver: B,
    set: OnceCell<ResourceSet<B::Node>>,
}

impl<S: ResourceSource, B: BlobResolver> ResourcesFile<S, B> {
    pub fn new(source: S, resolver: B) -> Self {
        Self {
            source,
            resolver,
            set: OnceCell::new(),
        }
    }

    /// Wraps `source` only when its name marks it as a container.
    pub fn for_source(source: S, resolver: B) -> Option<Self> {
        is_resources_file(source.name()).then(|| Self::new(source, resolver))
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    pub fn is_loaded(&self) -> bool {
        self.set.get().is_some()
    }

    /// Classified contents; loaded once, on the first call.
    pub fn resources(&self) -> &ResourceSet<B::Node> {
        self.set.get_or_init(|| match self.source.try_open() {
            Some(stream) => ResourceSet::load(stream, &self.resolver),
            None => {
                warn!("cannot open {}", self.source.name());
                ResourceSet::default()
            }
        })
    }

    /// Drops the loaded contents so the next access reads the source again.
    pub fn reload(&mut self) {
        self.set = OnceCell::new();
    }

    pub fn render<D: ResourceDisplay<B::Node>>(&self, display: &mut D) {
        let set = self.resources();
        if !set.text_entries.is_empty() {
            display.string_table(&set.text_entries);
        }
        if !set.complex_entries.is_empty() {
            display.object_table(&set.complex_entries);
        }
        if !set.children.is_empty() {
            display.children(&set.children);
        }
    }

    pub fn save(&self, picker: &mut dyn DestinationPicker) -> export::Result<SaveOutcome> {
        export::save(&self.source, picker)
    }
}
