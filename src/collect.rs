//! Wiki-link extraction with block-level context capture
//!
//! Walks a file's markdown with pulldown-cmark, accumulating the plain
//! text of each leaf block (paragraph, heading, list item, table cell).
//! When a block closes, its text is scanned for `[[...]]` spans and every
//! occurrence registers a backlink on the resolved target, carrying the
//! whole block text as context. The source text itself is never modified
//! here; rewriting happens in a separate pass over raw lines.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::note::{Backlink, NoteId, NoteMap};
use crate::rewrite::wiki_spans;

/// Extract wiki-links from `text` and register a backlink on each target.
///
/// Each occurrence counts: the same target linked twice in two blocks (or
/// twice in one block) accumulates two backlinks, each with its own
/// context. Targets that do not exist yet become stub entities through the
/// shared resolver.
pub fn collect_links(map: &mut NoteMap, source: NoteId, text: &str) {
    // `context` is the block text as the reader sees it; `scan` is the
    // same text with inline code blanked out so code spans never register
    // links. Non-code segments are identical in both.
    let mut context = String::new();
    let mut scan = String::new();
    let mut in_code_block = false;

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                context.clear();
                scan.clear();
            }
            Event::Text(t) => {
                if !in_code_block {
                    context.push_str(&t);
                    scan.push_str(&t);
                }
            }
            Event::Code(t) => {
                context.push('`');
                context.push_str(&t);
                context.push('`');
                for _ in 0..t.chars().count() {
                    scan.push(' ');
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                context.push(' ');
                scan.push(' ');
            }
            Event::End(
                TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::TableCell,
            ) => {
                flush_block(map, source, &context, &scan);
                context.clear();
                scan.clear();
            }
            _ => {}
        }
    }
    // Safety net for block types without an explicit flush above.
    flush_block(map, source, &context, &scan);
}

fn flush_block(map: &mut NoteMap, source: NoteId, context: &str, scan: &str) {
    if scan.is_empty() {
        return;
    }
    for span in wiki_spans(scan) {
        let target = map.resolve(span.text);
        map.get_mut(target).backlinks.push(Backlink {
            source,
            context: context.to_string(),
        });
    }
}
