//! Frontmatter extraction and adjustment
//!
//! A frontmatter block is recognized only when the very first line of a
//! file is exactly the `---` delimiter; an opened block that never closes
//! is a fatal parse error. Adjustment applies title and date inference and
//! re-serializes the mapping between fresh delimiter lines.

use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::{Error, Result};
use crate::meta::{self, MetaValue};
use crate::note::{NoteId, NoteMap};

/// Frontmatter delimiter line.
pub const DELIMITER: &str = "---";

/// Result of scanning a file's leading lines for a frontmatter block.
#[derive(Debug)]
pub struct Extracted {
    pub metadata: BTreeMap<String, MetaValue>,
    /// The first content line when the file has no frontmatter block.
    /// Preserved separately so it is not lost to the scan.
    pub first_line: Option<String>,
    /// Index of the first body line in the input.
    pub body_start: usize,
}

/// Scan `lines` for a frontmatter block and parse it.
pub fn extract(file: &str, lines: &[String]) -> Result<Extracted> {
    let Some(first) = lines.first() else {
        return Ok(Extracted {
            metadata: BTreeMap::new(),
            first_line: None,
            body_start: 0,
        });
    };

    if first != DELIMITER {
        return Ok(Extracted {
            metadata: BTreeMap::new(),
            first_line: Some(first.clone()),
            body_start: 1,
        });
    }

    let close = lines[1..]
        .iter()
        .position(|line| line == DELIMITER)
        .ok_or_else(|| Error::UnterminatedFrontmatter {
            file: file.to_string(),
        })?;

    let yaml = lines[1..1 + close].join("\n");
    Ok(Extracted {
        metadata: meta::parse_mapping(file, &yaml)?,
        first_line: None,
        body_start: close + 2,
    })
}

/// Adjust a note's metadata and render the frontmatter block.
///
/// Rules, in order:
/// 1. date-named and no `title`: title defaults to the plain filename;
/// 2. date-named and no `date`: the filename is parsed as a calendar date
///    at 08:00 -05:00;
/// 3. an explicit `title` overrides the display title, otherwise the
///    current title is written back into the metadata;
/// 4. still no `date`: infer the latest date among backlink sources;
/// 5. serialize between delimiter lines.
///
/// Rule 4 reads other entities' finalized dates, which is why all
/// date-named notes must be adjusted before any other note.
pub fn adjust(map: &mut NoteMap, id: NoteId) -> Result<String> {
    {
        let note = map.get_mut(id);
        let plain = note.plain_name().to_string();

        if note.is_date_named {
            if !note.metadata.contains_key("title") {
                note.metadata
                    .insert("title".to_string(), MetaValue::Str(plain.clone()));
            }
            if !note.metadata.contains_key("date") {
                let stamp = format!("{}T08:00:00-05:00", plain);
                let date = DateTime::parse_from_rfc3339(&stamp).map_err(|e| {
                    Error::InvalidDateName {
                        file: note.original_name.clone(),
                        reason: e.to_string(),
                    }
                })?;
                note.metadata
                    .insert("date".to_string(), MetaValue::Date(date));
            }
        }

        match note.metadata.get("title") {
            Some(value) => note.title = value.expect_str("title")?.to_string(),
            None => {
                let title = note.title.clone();
                note.metadata
                    .insert("title".to_string(), MetaValue::Str(title));
            }
        }
    }

    if !map.get(id).metadata.contains_key("date") {
        if let Some(latest) = latest_backlink_date(map, id) {
            // Strictly-after-epoch guard: a zero date is no date at all.
            if latest.timestamp() > 0 {
                map.get_mut(id)
                    .metadata
                    .insert("date".to_string(), MetaValue::Date(latest));
            }
        }
    }

    let yaml = meta::to_yaml_string(&map.get(id).metadata);
    Ok(format!("{}\n{}{}\n", DELIMITER, yaml, DELIMITER))
}

/// Latest `date` among the note's backlink sources, skipping sources
/// without one. A wrong-shape date is warned about and skipped rather
/// than failing the run.
fn latest_backlink_date(map: &NoteMap, id: NoteId) -> Option<DateTime<FixedOffset>> {
    let mut latest: Option<DateTime<FixedOffset>> = None;
    for backlink in &map.get(id).backlinks {
        let source = map.get(backlink.source);
        let Some(value) = source.metadata.get("date") else {
            continue;
        };
        match value.expect_date("date") {
            // Last max wins on equal dates; equal dates are equivalent.
            Ok(date) => {
                if latest.map_or(true, |l| date >= l) {
                    latest = Some(date);
                }
            }
            Err(e) => warn!(source = %source.original_name, "skipping backlink date: {}", e),
        }
    }
    latest
}
