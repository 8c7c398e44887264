//! Backlink section rendering
//!
//! Appends a `## Backlinks` section listing every inbound reference with
//! its captured context. Ordering: sources with a known date first, newest
//! first; ties and undated sources fall back to title order.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};
use tracing::warn;

use crate::meta::MetaValue;
use crate::note::{Note, NoteId, NoteMap};
use crate::rewrite::{rewrite_line, site_link};

/// Heading line emitted once per note with at least one inbound reference.
pub const BACKLINKS_HEADING: &str = "## Backlinks";

struct Entry {
    title: String,
    link: String,
    date: Option<DateTime<FixedOffset>>,
    context: String,
}

/// Render the backlinks section for a note. Empty string when the note has
/// no inbound references.
pub fn render(map: &mut NoteMap, id: NoteId) -> String {
    let mut entries: Vec<Entry> = {
        let note = map.get(id);
        if note.backlinks.is_empty() {
            return String::new();
        }
        note.backlinks
            .iter()
            .map(|backlink| {
                let source = map.get(backlink.source);
                Entry {
                    title: source.title.clone(),
                    link: site_link(&source.original_name),
                    date: source_date(source),
                    context: backlink.context.clone(),
                }
            })
            .collect()
    };

    entries.sort_by(|a, b| match (a.date, b.date) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(da), Some(db)) if da != db => db.cmp(&da),
        _ => a.title.cmp(&b.title),
    });

    let mut out = format!("\n{}\n\n", BACKLINKS_HEADING);
    for entry in entries {
        // Wiki-links inside the captured context get the same inline
        // substitution as body lines.
        let context = rewrite_line(map, &entry.context);
        out.push_str(&format!(
            "- [{}]({})\n    - {}\n",
            entry.title, entry.link, context
        ));
    }
    out
}

/// The source's finalized date, if it has one of the right shape.
fn source_date(source: &Note) -> Option<DateTime<FixedOffset>> {
    match source.metadata.get("date") {
        Some(MetaValue::Date(d)) => Some(*d),
        Some(other) => {
            warn!(
                source = %source.original_name,
                "treating backlink source as undated: unexpected date shape ({})",
                other.type_name()
            );
            None
        }
        None => None,
    }
}
