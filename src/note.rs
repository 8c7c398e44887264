//! Note entities and the canonical identity map
//!
//! Every markdown file the run knows about, real or synthesized, is a
//! [`Note`] owned by the [`NoteMap`]. All cross-file references go through
//! the map's case-insensitive canonical key, so however a link is written
//! it lands on the same entity.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::meta::MetaValue;

/// File extension carried by every note, real or synthesized.
pub const MARKDOWN_EXTENSION: &str = ".md";

static DATE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}\.md$").expect("date-name pattern"));

/// Index of a note inside the [`NoteMap`] arena.
///
/// Backlinks store their source as a `NoteId`; it is a back-reference, not
/// ownership, which keeps the entity graph in a single owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteId(usize);

/// A recorded inbound reference from one note to another.
#[derive(Debug, Clone)]
pub struct Backlink {
    /// The note containing the link.
    pub source: NoteId,
    /// Surrounding block text of the occurrence, wiki-link syntax still
    /// in place. Rewritten only at render time.
    pub context: String,
}

/// One markdown note.
#[derive(Debug)]
pub struct Note {
    /// Lower-cased, extension-qualified identity string.
    pub canonical_key: String,
    /// Original-case filename, used for display and output paths.
    pub original_name: String,
    /// Display title; defaults from the filename, overridable via
    /// frontmatter.
    pub title: String,
    /// True when the entity exists only because something links to it.
    /// Set at creation and never flips.
    pub is_stub: bool,
    /// True when the filename itself encodes a calendar date.
    pub is_date_named: bool,
    /// Flat frontmatter mapping.
    pub metadata: BTreeMap<String, MetaValue>,
    /// Inbound references, accumulated during collection.
    pub backlinks: Vec<Backlink>,
    /// First content line when the file had no frontmatter block.
    pub first_line: Option<String>,
    /// Content lines after the frontmatter (always empty for stubs).
    pub body: Vec<String>,
    /// Accumulated output buffer for the rewritten file.
    pub rendered: String,
}

impl Note {
    fn new(original_name: &str, is_stub: bool) -> Self {
        Note {
            canonical_key: canonical_key(original_name),
            original_name: original_name.to_string(),
            title: remove_extension(original_name).to_string(),
            is_stub,
            is_date_named: is_date_named(original_name),
            metadata: BTreeMap::new(),
            backlinks: Vec::new(),
            first_line: None,
            body: Vec::new(),
            rendered: String::new(),
        }
    }

    /// Filename without its extension.
    pub fn plain_name(&self) -> &str {
        remove_extension(&self.original_name)
    }
}

/// Trim the extension from a filename.
pub fn remove_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) => &name[..i],
        None => name,
    }
}

/// Whether a filename encodes a calendar date (`YYYY-MM-DD.md`).
///
/// Pattern match only; the strict calendar parse happens later during
/// frontmatter adjustment.
pub fn is_date_named(name: &str) -> bool {
    DATE_NAME_RE.is_match(name)
}

/// Normalize arbitrary link text to a canonical file identity.
///
/// Lower-cased, with the markdown extension appended if absent.
pub fn canonical_key(link_text: &str) -> String {
    let lowered = link_text.to_lowercase();
    if lowered.ends_with(MARKDOWN_EXTENSION) {
        lowered
    } else {
        lowered + MARKDOWN_EXTENSION
    }
}

/// The shared entity map: one [`Note`] per canonical key.
///
/// Owned by the orchestrator and passed by reference to every component
/// that resolves links. The map may grow while a phase iterates, so phases
/// work over an id snapshot from [`NoteMap::ids`].
#[derive(Debug, Default)]
pub struct NoteMap {
    notes: Vec<Note>,
    by_key: HashMap<String, NoteId>,
}

impl NoteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a real on-disk file. Used only by the initial scan.
    ///
    /// Case-variant duplicates (two files collapsing to one canonical key)
    /// are refused rather than merged.
    pub fn insert_real(&mut self, filename: &str) -> Result<NoteId> {
        let key = canonical_key(filename);
        if let Some(&existing) = self.by_key.get(&key) {
            return Err(Error::DuplicateNote {
                file: filename.to_string(),
                existing: self.notes[existing.0].original_name.clone(),
            });
        }
        let id = NoteId(self.notes.len());
        self.notes.push(Note::new(filename, false));
        self.by_key.insert(key, id);
        Ok(id)
    }

    /// Resolve link text to an entity, creating a stub if none exists.
    ///
    /// Idempotent: any surface text with the same canonical key yields the
    /// same id, no matter how often or in what order it is resolved.
    pub fn resolve(&mut self, link_text: &str) -> NoteId {
        let key = canonical_key(link_text);
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let original = if link_text.to_lowercase().ends_with(MARKDOWN_EXTENSION) {
            link_text.to_string()
        } else {
            format!("{}{}", link_text, MARKDOWN_EXTENSION)
        };
        debug!("creating stub entity for '{}'", link_text);
        let id = NoteId(self.notes.len());
        self.notes.push(Note::new(&original, true));
        self.by_key.insert(key, id);
        id
    }

    /// Look up by link text without creating anything.
    pub fn lookup(&self, link_text: &str) -> Option<NoteId> {
        self.by_key.get(&canonical_key(link_text)).copied()
    }

    pub fn get(&self, id: NoteId) -> &Note {
        &self.notes[id.0]
    }

    pub fn get_mut(&mut self, id: NoteId) -> &mut Note {
        &mut self.notes[id.0]
    }

    /// Snapshot of all current ids. Taken at the start of each phase so
    /// the map can keep growing while the phase iterates.
    pub fn ids(&self) -> Vec<NoteId> {
        (0..self.notes.len()).map(NoteId).collect()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}
