//! noteweave - static-site content preprocessor for markdown notes
//!
//! Resolves wiki-style `[[Link]]` references across a directory of notes,
//! synthesizes stub files for referenced-but-missing notes, injects a
//! backlinks section into every referenced file, and normalizes YAML
//! frontmatter. The HTML itself is generated downstream by a static site
//! generator; this tool only rewrites markdown.

pub mod backlinks;
pub mod cli;
pub mod collect;
pub mod error;
pub mod frontmatter;
pub mod meta;
pub mod note;
pub mod pipeline;
pub mod rewrite;

pub use cli::Cli;
pub use error::{Error, Result};
pub use meta::MetaValue;
pub use note::{Backlink, Note, NoteId, NoteMap, MARKDOWN_EXTENSION};
