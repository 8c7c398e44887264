use std::path::PathBuf;

use clap::Parser;

/// noteweave - markdown note preprocessor for static sites
///
/// Scans a directory of markdown notes, resolves `[[Wiki Link]]`
/// references between them (synthesizing stub files for linked-but-missing
/// notes), rewrites wiki-links to standard markdown links, injects a
/// `## Backlinks` section into every referenced file, and normalizes YAML
/// frontmatter (title and date inference).
///
/// ```bash
/// noteweave ./notes                # rewrite in place
/// noteweave ./notes ./public/posts # write to a separate directory
/// noteweave -v ./notes             # with debug logging
/// ```
///
/// Every run is a full rebuild: all .md files in SOURCE are read, and one
/// output file per known note (including synthesized stubs) is written to
/// DEST, named by its original-cased filename.
#[derive(Parser, Debug)]
#[command(name = "noteweave")]
#[command(version = "0.1.0")]
#[command(about = "Resolve wiki-links and inject backlinks across a directory of markdown notes")]
pub struct Cli {
    /// Source directory containing .md notes
    pub source: PathBuf,

    /// Destination directory (defaults to SOURCE, rewriting in place)
    pub dest: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}
