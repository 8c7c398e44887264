//! Wiki-link rewriting
//!
//! Line-level substitution of `[[Target]]` spans with standard markdown
//! links. This deliberately does not reuse the block parser: rewriting is a
//! plain scan over raw lines, sharing only the identity map with the
//! extractor so both paths create and find the same entities.

use std::ops::Range;

use crate::note::{remove_extension, NoteId, NoteMap};

/// A `[[...]]` occurrence in a line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct WikiSpan<'a> {
    /// Byte range of the full span, brackets included.
    pub range: Range<usize>,
    /// The text between the brackets.
    pub text: &'a str,
}

/// Find all non-overlapping `[[...]]` spans in a line.
///
/// Greedy and non-nested: the span text is everything up to the next `]]`.
/// An opening `[[` without a closing `]]` is not a span and is left alone.
pub fn wiki_spans(line: &str) -> Vec<WikiSpan<'_>> {
    let mut spans = Vec::new();
    let mut at = 0;
    while let Some(open) = line[at..].find("[[") {
        let open = at + open;
        let Some(close) = line[open + 2..].find("]]") else {
            break;
        };
        let close = open + 2 + close;
        let text = &line[open + 2..close];
        if !text.is_empty() {
            spans.push(WikiSpan {
                range: open..close + 2,
                text,
            });
        }
        at = close + 2;
    }
    spans
}

/// Build the site-relative link path for a note filename.
///
/// The downstream site generator publishes each note as a sibling
/// directory: lower-cased, spaces replaced with hyphens, wrapped in
/// `./` and a trailing slash.
pub fn site_link(original_name: &str) -> String {
    let name = remove_extension(original_name)
        .to_lowercase()
        .replace(' ', "-");
    format!("./{}/", name)
}

/// Resolve a link target and return its site-relative path.
///
/// Stub entities are created here for targets never seen before; this is
/// the second stub-creation path besides the extractor, kept consistent by
/// going through the same resolver.
pub fn resolve_site_link(map: &mut NoteMap, link_text: &str) -> (NoteId, String) {
    let id = map.resolve(link_text);
    let link = site_link(&map.get(id).original_name);
    (id, link)
}

/// Replace every wiki-link span on a line with a standard markdown link.
pub fn rewrite_line(map: &mut NoteMap, line: &str) -> String {
    let spans = wiki_spans(line);
    if spans.is_empty() {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for span in spans {
        out.push_str(&line[last..span.range.start]);
        let (_, target) = resolve_site_link(map, span.text);
        out.push('[');
        out.push_str(span.text);
        out.push_str("](");
        out.push_str(&target);
        out.push(')');
        last = span.range.end;
    }
    out.push_str(&line[last..]);
    out
}
