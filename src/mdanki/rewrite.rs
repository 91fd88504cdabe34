//! # Identifier Write-Back
//!
//! Persists freshly minted ids by appending their annotation to the line the
//! card's heading sits on. Every other line is copied as-is.
//!
//! Line terminators are normalized: `\n` and `\r\n` are both read as a line
//! break and written back as `\n`. A newline is only written *between* lines,
//! plus once at the end if the source ended with one, so the line count never
//! changes and no blank line is ever appended.
//!
//! [`write_ids`] never modifies the document in place. The new content goes to
//! a temp file in the same directory, which is then renamed over the original,
//! so readers see either the old document or the new one.

use crate::error::{MdAnkiError, Result};
use crate::ids;
use crate::model::NewId;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Line number (1-based) to the id that must be appended to that line.
pub type Assignments = BTreeMap<usize, String>;

pub fn assignments(new_ids: &[NewId]) -> Assignments {
    new_ids
        .iter()
        .map(|new_id| (new_id.line, new_id.id.clone()))
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteStats {
    pub lines: usize,
    pub annotated: usize,
}

/// Streams `reader` into `writer`, annotating the lines named in `assignments`.
pub fn rewrite<R, W>(
    mut reader: R,
    mut writer: W,
    assignments: &Assignments,
) -> io::Result<RewriteStats>
where
    R: BufRead,
    W: Write,
{
    let mut stats = RewriteStats::default();
    let mut line = Vec::new();
    let mut ends_with_newline = false;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }

        ends_with_newline = line.last() == Some(&b'\n');
        if ends_with_newline {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }

        stats.lines += 1;
        if stats.lines > 1 {
            writer.write_all(b"\n")?;
        }
        writer.write_all(&line)?;

        if let Some(id) = assignments.get(&stats.lines) {
            writer.write_all(b" ")?;
            writer.write_all(ids::annotation(id).as_bytes())?;
            stats.annotated += 1;
        }
    }

    if ends_with_newline {
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(stats)
}

/// Writes `assignments` into the document at `path`.
///
/// Returns `Ok(false)` without touching the file when there is nothing to write.
pub fn write_ids(path: &Path, assignments: &Assignments) -> Result<bool> {
    if assignments.is_empty() {
        debug!(path = %path.display(), "no new ids, leaving document untouched");
        return Ok(false);
    }

    let tmp_path = temp_path_for(path)?;
    match replace_with_rewrite(path, &tmp_path, assignments) {
        Ok(stats) => {
            if let Some((&last, _)) = assignments.last_key_value() {
                if last > stats.lines {
                    warn!(
                        path = %path.display(),
                        line = last,
                        lines = stats.lines,
                        "id assigned past the end of the document was not written"
                    );
                }
            }
            debug!(path = %path.display(), annotated = stats.annotated, "wrote new ids");
            Ok(true)
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            Err(e)
        }
    }
}

fn temp_path_for(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| MdAnkiError::Api(format!("Not a file: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(dir.join(format!(
        ".{}-{}.tmp",
        name.to_string_lossy(),
        Uuid::new_v4().simple()
    )))
}

fn replace_with_rewrite(
    path: &Path,
    tmp_path: &Path,
    assignments: &Assignments,
) -> Result<RewriteStats> {
    let input = File::open(path).map_err(|e| MdAnkiError::document(path, e))?;
    let permissions = input
        .metadata()
        .map_err(|e| MdAnkiError::document(path, e))?
        .permissions();

    let output = File::create(tmp_path).map_err(|e| MdAnkiError::document(tmp_path, e))?;
    let mut writer = BufWriter::new(output);
    let stats = rewrite(BufReader::new(input), &mut writer, assignments)
        .map_err(|e| MdAnkiError::document(tmp_path, e))?;
    let output = writer
        .into_inner()
        .map_err(|e| MdAnkiError::document(tmp_path, e.into_error()))?;
    output
        .sync_all()
        .map_err(|e| MdAnkiError::document(tmp_path, e))?;
    drop(output);

    fs::set_permissions(tmp_path, permissions).map_err(|e| MdAnkiError::document(tmp_path, e))?;
    fs::rename(tmp_path, path).map_err(|e| MdAnkiError::document(path, e))?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn rewrite_str(input: &str, assignments: &Assignments) -> (String, RewriteStats) {
        let mut out = Vec::new();
        let stats = rewrite(input.as_bytes(), &mut out, assignments).unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    fn assign(pairs: &[(usize, &str)]) -> Assignments {
        pairs.iter().map(|(l, id)| (*l, id.to_string())).collect()
    }

    #[test]
    fn appends_ids_to_assigned_lines() {
        let input = "\n  # Hello world\n  \n  ## Some other line";
        let (out, stats) = rewrite_str(input, &assign(&[(2, "someid"), (4, "someotherid")]));

        assert_eq!(
            out,
            "\n  # Hello world <!-- id:someid -->\n  \n  ## Some other line <!-- id:someotherid -->"
        );
        assert_eq!(stats, RewriteStats { lines: 4, annotated: 2 });
    }

    #[test]
    fn never_adds_trailing_newline() {
        let (out, _) = rewrite_str("a\nb", &assign(&[(2, "x")]));
        assert_eq!(out, "a\nb <!-- id:x -->");
    }

    #[test]
    fn keeps_existing_trailing_newline() {
        let (out, stats) = rewrite_str("a\nb\n", &assign(&[(1, "x")]));
        assert_eq!(out, "a <!-- id:x -->\nb\n");
        assert_eq!(stats.lines, 2);
    }

    #[test]
    fn crlf_is_normalized() {
        let (out, stats) = rewrite_str("# A\r\n\r\n## B\r\n", &assign(&[(3, "b")]));
        assert_eq!(out, "# A\n\n## B <!-- id:b -->\n");
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn line_count_is_preserved() {
        let input = "one\n\n\nfour\nfive";
        let (out, stats) = rewrite_str(input, &assign(&[(1, "a"), (5, "b")]));
        assert_eq!(out.split('\n').count(), input.split('\n').count());
        assert_eq!(stats.lines, 5);
    }

    #[test]
    fn empty_input_stays_empty() {
        let (out, stats) = rewrite_str("", &assign(&[(1, "a")]));
        assert_eq!(out, "");
        assert_eq!(stats, RewriteStats::default());
    }

    #[test]
    fn write_ids_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cards.md");
        fs::write(&path, "# Deck: D\n\n## Q\n\nA").unwrap();

        let written = write_ids(&path, &assign(&[(3, "newid")])).unwrap();

        assert!(written);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "# Deck: D\n\n## Q <!-- id:newid -->\n\nA"
        );
        // Only the document remains; the temp file was renamed away.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn write_ids_without_assignments_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cards.md");
        fs::write(&path, "a\r\nb\r\n").unwrap();

        let written = write_ids(&path, &Assignments::new()).unwrap();

        assert!(!written);
        assert_eq!(fs::read(&path).unwrap(), b"a\r\nb\r\n");
    }

    #[test]
    fn second_write_with_no_assignments_changes_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cards.md");
        fs::write(&path, "## Q\n\nA\n").unwrap();

        write_ids(&path, &assign(&[(1, "q")])).unwrap();
        let once = fs::read_to_string(&path).unwrap();
        write_ids(&path, &Assignments::new()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), once);
    }

    #[test]
    fn missing_document_fails_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.md");

        let err = write_ids(&path, &assign(&[(1, "x")])).unwrap_err();

        assert!(matches!(err, MdAnkiError::Document { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn failed_temp_file_leaves_original_untouched() {
        let dir = tempdir().unwrap();
        // Fits the file name limit, but the temp name built from it does not.
        let path = dir.path().join(format!("{}.md", "n".repeat(240)));
        fs::write(&path, "## Q\n\nA\n").unwrap();

        let err = write_ids(&path, &assign(&[(1, "q")])).unwrap_err();

        assert!(matches!(err, MdAnkiError::Document { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"## Q\n\nA\n");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![path.file_name().unwrap().to_os_string()]);
    }

    #[test]
    fn assignments_from_new_ids() {
        let new_ids = vec![
            NewId {
                line: 7,
                id: "b".to_string(),
            },
            NewId {
                line: 3,
                id: "a".to_string(),
            },
        ];
        assert_eq!(assignments(&new_ids), assign(&[(3, "a"), (7, "b")]));
    }
}
