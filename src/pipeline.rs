//! Run orchestration
//!
//! Sequences the whole preprocessing run: scan, collect, frontmatter,
//! rewrite, backlinks, write. Phases run strictly in order and each phase
//! completes over the whole entity set before the next starts; date-named
//! notes get their frontmatter finalized before any other note infers a
//! date from them. Every phase iterates an id snapshot so the resolver can
//! keep creating stubs while a phase runs.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::backlinks;
use crate::collect;
use crate::error::{Error, Result};
use crate::frontmatter;
use crate::note::{NoteMap, MARKDOWN_EXTENSION};
use crate::rewrite::rewrite_line;

/// Process every markdown file under `source_dir` and write the results
/// to `dest_dir` (which may equal `source_dir`).
///
/// All-or-nothing: the first fatal error aborts the run; files already
/// written to the destination stay as written.
pub fn run(source_dir: &Path, dest_dir: &Path) -> Result<()> {
    // Phase 1: list real files and build the initial entity map.
    let files = list_markdown_files(source_dir)?;
    info!("processing {} markdown file(s) in {}", files.len(), source_dir.display());
    let mut map = NoteMap::new();
    for name in &files {
        map.insert_real(name)?;
    }

    // Phase 2: parse each real file, register backlinks and stubs.
    for id in map.ids() {
        if map.get(id).is_stub {
            continue;
        }
        let path = source_dir.join(&map.get(id).original_name);
        debug!("collecting backlinks from {}", path.display());
        let text = read_file(&path)?;
        collect::collect_links(&mut map, id, &text);
    }

    // Phase 3: read content lines and extract frontmatter. Stubs have no
    // on-disk content even if a case-variant file happens to exist.
    for id in map.ids() {
        let lines: Vec<String> = if map.get(id).is_stub {
            info!("{} is a new file", map.get(id).original_name);
            Vec::new()
        } else {
            let path = source_dir.join(&map.get(id).original_name);
            debug!("reading {}", path.display());
            read_file(&path)?.lines().map(String::from).collect()
        };
        let name = map.get(id).original_name.clone();
        let extracted = frontmatter::extract(&name, &lines)?;
        let note = map.get_mut(id);
        note.metadata = extracted.metadata;
        note.first_line = extracted.first_line;
        note.body = lines[extracted.body_start..].to_vec();
    }

    // Phases 4 and 5: frontmatter adjustment, date-named files first so
    // every other file's date inference sees finalized dates.
    for id in map.ids() {
        if map.get(id).is_date_named {
            let block = frontmatter::adjust(&mut map, id)?;
            map.get_mut(id).rendered.push_str(&block);
        }
    }
    for id in map.ids() {
        if !map.get(id).is_date_named {
            let block = frontmatter::adjust(&mut map, id)?;
            map.get_mut(id).rendered.push_str(&block);
        }
    }

    // Phase 6: rewrite wiki-links in the remaining content, line by line.
    // Each line ends with exactly one newline regardless of input style.
    for id in map.ids() {
        let first_line = map.get_mut(id).first_line.take();
        let body = std::mem::take(&mut map.get_mut(id).body);
        let mut out = String::new();
        if let Some(line) = first_line {
            out.push_str(&rewrite_line(&mut map, &line));
            out.push('\n');
        }
        for line in &body {
            out.push_str(&rewrite_line(&mut map, line));
            out.push('\n');
        }
        map.get_mut(id).rendered.push_str(&out);
    }

    // Phase 7: append backlink sections.
    for id in map.ids() {
        let section = backlinks::render(&mut map, id);
        map.get_mut(id).rendered.push_str(&section);
    }

    // Phase 8: write everything out, stubs included.
    if !dest_dir.exists() {
        fs::create_dir_all(dest_dir).map_err(|e| Error::WriteOutput {
            path: dest_dir.to_path_buf(),
            source: e,
        })?;
    }
    for id in map.ids() {
        let path = dest_dir.join(&map.get(id).original_name);
        debug!("writing {}", path.display());
        fs::write(&path, map.get(id).rendered.as_bytes()).map_err(|e| Error::WriteOutput {
            path: path.clone(),
            source: e,
        })?;
    }
    info!("wrote {} file(s) to {}", map.len(), dest_dir.display());

    Ok(())
}

/// Markdown filenames directly under `dir`, sorted for deterministic
/// processing. Subdirectories and other extensions are ignored.
fn list_markdown_files(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::DirRead {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::DirRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if entry.path().is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name.ends_with(MARKDOWN_EXTENSION) {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::DirRead {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::extract;
    use crate::meta::MetaValue;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn write_note(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn read_note(dir: &Path, name: &str) -> String {
        fs::read_to_string(dir.join(name)).unwrap()
    }

    fn parse_frontmatter(text: &str) -> BTreeMap<String, MetaValue> {
        let lines: Vec<String> = text.lines().map(String::from).collect();
        extract("out.md", &lines).unwrap().metadata
    }

    #[test]
    fn test_stub_synthesis_scenario() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(src.path(), "Zettel.md", "See [[New Idea]] for more.\n");

        run(src.path(), dst.path()).unwrap();

        let zettel = read_note(dst.path(), "Zettel.md");
        assert!(zettel.contains("See [New Idea](./new-idea/) for more."));
        assert!(!zettel.contains("## Backlinks"));

        let stub = read_note(dst.path(), "New Idea.md");
        assert!(stub.contains("title: New Idea"));
        assert!(stub.contains("## Backlinks"));
        assert!(stub.contains("- [Zettel](./zettel/)"));
        assert!(stub.contains("    - See [New Idea](./new-idea/) for more."));
    }

    #[test]
    fn test_no_inbound_links_no_backlinks_heading() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(src.path(), "Alone.md", "Nothing links here.\n");

        run(src.path(), dst.path()).unwrap();

        assert!(!read_note(dst.path(), "Alone.md").contains("## Backlinks"));
    }

    #[test]
    fn test_date_inference_from_date_named_linker() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(src.path(), "2021-03-01.md", "Thought about [[Plain]].\n");
        write_note(src.path(), "Plain.md", "Some content.\n");

        run(src.path(), dst.path()).unwrap();

        let plain = parse_frontmatter(&read_note(dst.path(), "Plain.md"));
        assert_eq!(
            plain["date"].expect_date("date").unwrap().to_rfc3339(),
            "2021-03-01T08:00:00-05:00"
        );
    }

    #[test]
    fn test_backlink_ordering_in_output() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(src.path(), "2021-01-05.md", "Early note on [[Hub]].\n");
        write_note(src.path(), "2021-01-10.md", "Later note on [[Hub]].\n");
        write_note(src.path(), "Undated.md", "Undated note on [[Hub]].\n");
        write_note(src.path(), "Hub.md", "The hub.\n");

        run(src.path(), dst.path()).unwrap();

        let hub = read_note(dst.path(), "Hub.md");
        let late = hub.find("[2021-01-10]").unwrap();
        let early = hub.find("[2021-01-05]").unwrap();
        let undated = hub.find("[Undated]").unwrap();
        assert!(late < early);
        assert!(early < undated);
    }

    #[test]
    fn test_two_occurrences_two_backlink_entries() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(
            src.path(),
            "A.md",
            "First paragraph about [[B]].\n\nSecond paragraph about [[B]].\n",
        );
        write_note(src.path(), "B.md", "B content.\n");

        run(src.path(), dst.path()).unwrap();

        let b = read_note(dst.path(), "B.md");
        assert!(b.contains("    - First paragraph about [B](./b/)."));
        assert!(b.contains("    - Second paragraph about [B](./b/)."));
    }

    #[test]
    fn test_frontmatter_is_idempotent_across_reruns() {
        let src = TempDir::new().unwrap();
        let mid = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(src.path(), "2021-01-05.md", "Dated entry about [[Essay]].\n");
        write_note(src.path(), "Essay.md", "---\ntitle: The Essay\n---\nBody.\n");

        run(src.path(), mid.path()).unwrap();
        run(mid.path(), dst.path()).unwrap();

        let first = parse_frontmatter(&read_note(mid.path(), "Essay.md"));
        let second = parse_frontmatter(&read_note(dst.path(), "Essay.md"));
        assert_eq!(first["title"], second["title"]);
        assert_eq!(first["date"], second["date"]);

        let dated_first = parse_frontmatter(&read_note(mid.path(), "2021-01-05.md"));
        let dated_second = parse_frontmatter(&read_note(dst.path(), "2021-01-05.md"));
        assert_eq!(dated_first, dated_second);
    }

    #[test]
    fn test_malformed_frontmatter_aborts_run() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(src.path(), "Broken.md", "---\ntitle: Broken\nno closing line\n");

        let err = run(src.path(), dst.path()).unwrap_err();
        assert!(matches!(err, Error::UnterminatedFrontmatter { .. }));
        assert!(err.to_string().contains("Broken.md"));
    }

    #[test]
    fn test_title_override_shows_in_backlinks() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(
            src.path(),
            "Source.md",
            "---\ntitle: Fancy Title\n---\nPoints at [[Target]].\n",
        );
        write_note(src.path(), "Target.md", "Target body.\n");

        run(src.path(), dst.path()).unwrap();

        let target = read_note(dst.path(), "Target.md");
        assert!(target.contains("- [Fancy Title](./source/)"));
    }

    #[test]
    fn test_non_markdown_files_ignored() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(src.path(), "Note.md", "Content.\n");
        write_note(src.path(), "image.png", "not markdown");

        run(src.path(), dst.path()).unwrap();

        assert!(dst.path().join("Note.md").exists());
        assert!(!dst.path().join("image.png").exists());
    }

    #[test]
    fn test_in_place_run() {
        let dir = TempDir::new().unwrap();
        write_note(dir.path(), "Zettel.md", "See [[New Idea]].\n");

        run(dir.path(), dir.path()).unwrap();

        assert!(read_note(dir.path(), "Zettel.md").contains("[New Idea](./new-idea/)"));
        assert!(dir.path().join("New Idea.md").exists());
    }

    #[test]
    fn test_first_line_without_frontmatter_is_kept() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(src.path(), "Note.md", "[[Top]] link on the first line.\nSecond line.\n");

        run(src.path(), dst.path()).unwrap();

        let note = read_note(dst.path(), "Note.md");
        assert!(note.contains("[Top](./top/) link on the first line.\nSecond line.\n"));
    }

    #[test]
    fn test_case_variant_duplicate_files_rejected() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write_note(src.path(), "Foo.md", "a\n");
        write_note(src.path(), "foo.md", "b\n");

        // On a case-insensitive filesystem the second write replaces the
        // first, leaving nothing to reject.
        if fs::read_dir(src.path()).unwrap().count() == 2 {
            let err = run(src.path(), dst.path()).unwrap_err();
            assert!(matches!(err, Error::DuplicateNote { .. }));
        }
    }

    #[test]
    fn test_missing_source_dir_is_fatal() {
        let dst = TempDir::new().unwrap();
        let err = run(Path::new("/nonexistent/notes"), dst.path()).unwrap_err();
        assert!(matches!(err, Error::DirRead { .. }));
    }
}
