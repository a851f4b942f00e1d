//! Blob-level diff: line-by-line comparison of file contents.
//!
//! Lines are byte slices that keep their trailing `\n`, so a file without a
//! final newline still diffs exactly. Matching uses the `similar` crate's
//! Myers algorithm, which finds a minimal edit script (and so a longest
//! common subsequence) in O((n + m) * d) time for d differing lines.

use std::ops::Range;

use similar::{capture_diff_slices, Algorithm, ChangeTag, TextDiff};

/// Bytes inspected when sniffing for binary content.
pub const BINARY_SNIFF_LEN: usize = 8000;

/// Returns `true` if `data` looks binary: a NUL byte in its first
/// [`BINARY_SNIFF_LEN`] bytes.
pub fn is_binary(data: &[u8]) -> bool {
    data.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

/// Split content into lines, each keeping its `\n` terminator.
///
/// The last line has no terminator if the content does not end in `\n`.
/// Empty content has no lines.
pub fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    data.split_inclusive(|&b| b == b'\n').collect()
}

/// One step of a line diff.
///
/// Ranges index into the line sequences passed to [`diff_lines`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffOp {
    /// Lines present, unchanged, in both inputs.
    Equal { old: Range<usize>, new: Range<usize> },
    /// Lines only in the old input; `new_index` is where they would have been.
    Delete { old: Range<usize>, new_index: usize },
    /// Lines only in the new input; `old_index` is where they were inserted.
    Insert { old_index: usize, new: Range<usize> },
}

/// Minimal (Myers) diff of two line sequences.
///
/// A replaced region is reported as a `Delete` followed by an `Insert`.
pub fn diff_lines(old: &[&[u8]], new: &[&[u8]]) -> Vec<DiffOp> {
    let mut ops = Vec::new();
    for op in capture_diff_slices(Algorithm::Myers, old, new) {
        match op {
            similar::DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => ops.push(DiffOp::Equal {
                old: old_index..old_index + len,
                new: new_index..new_index + len,
            }),
            similar::DiffOp::Delete {
                old_index,
                old_len,
                new_index,
            } => ops.push(DiffOp::Delete {
                old: old_index..old_index + old_len,
                new_index,
            }),
            similar::DiffOp::Insert {
                old_index,
                new_index,
                new_len,
            } => ops.push(DiffOp::Insert {
                old_index,
                new: new_index..new_index + new_len,
            }),
            similar::DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                ops.push(DiffOp::Delete {
                    old: old_index..old_index + old_len,
                    new_index,
                });
                ops.push(DiffOp::Insert {
                    old_index: old_index + old_len,
                    new: new_index..new_index + new_len,
                });
            }
        }
    }
    ops
}

/// The result of diffing two blobs (file contents).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobDiff {
    /// The diff hunks.
    pub hunks: Vec<DiffHunk>,
    /// Total number of lines in the old content.
    pub old_lines: usize,
    /// Total number of lines in the new content.
    pub new_lines: usize,
    /// Either side looked binary; `hunks` holds a synthetic summary.
    pub binary: bool,
}

impl BlobDiff {
    /// Returns `true` if the two blobs are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Total number of lines added across all hunks.
    pub fn additions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, DiffLine::Added(_)))
            .count()
    }

    /// Total number of lines removed across all hunks.
    pub fn deletions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, DiffLine::Removed(_)))
            .count()
    }
}

/// A contiguous region of changes in a diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// Line number in the old content where this hunk starts (1-based).
    pub old_start: usize,
    /// Number of lines from the old content in this hunk.
    pub old_count: usize,
    /// Line number in the new content where this hunk starts (1-based).
    pub new_start: usize,
    /// Number of lines from the new content in this hunk.
    pub new_count: usize,
    /// The individual diff lines in this hunk.
    pub lines: Vec<DiffLine>,
}

/// A single line in a diff hunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    /// A line present in both old and new (context).
    Context(String),
    /// A line added in the new content.
    Added(String),
    /// A line removed from the old content.
    Removed(String),
}

/// Compute a hunked line diff between two blobs, with three lines of context.
///
/// Content that is binary (see [`is_binary`]) or not valid UTF-8 yields a
/// single synthetic hunk noting the sizes.
pub fn diff_blobs(old: &[u8], new: &[u8]) -> BlobDiff {
    let (old_str, new_str) = match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(o), Ok(n)) if !is_binary(old) && !is_binary(new) => (o, n),
        _ => return make_binary_diff(old, new),
    };

    let old_lines = old_str.lines().count();
    let new_lines = new_str.lines().count();

    if old_str == new_str {
        return BlobDiff {
            hunks: Vec::new(),
            old_lines,
            new_lines,
            binary: false,
        };
    }

    let text_diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old_str, new_str);

    let mut hunks = Vec::new();

    for group in text_diff.grouped_ops(3) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = DiffHunk {
            old_start: first.old_range().start + 1,
            old_count: 0,
            new_start: first.new_range().start + 1,
            new_count: 0,
            lines: Vec::new(),
        };

        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.lines.push(DiffLine::Context(text));
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                    }
                    ChangeTag::Delete => {
                        hunk.lines.push(DiffLine::Removed(text));
                        hunk.old_count += 1;
                    }
                    ChangeTag::Insert => {
                        hunk.lines.push(DiffLine::Added(text));
                        hunk.new_count += 1;
                    }
                }
            }
        }

        hunks.push(hunk);
    }

    BlobDiff {
        hunks,
        old_lines,
        new_lines,
        binary: false,
    }
}

fn make_binary_diff(old: &[u8], new: &[u8]) -> BlobDiff {
    if old == new {
        return BlobDiff {
            hunks: Vec::new(),
            old_lines: 0,
            new_lines: 0,
            binary: true,
        };
    }

    let mut lines = Vec::new();
    if !old.is_empty() {
        lines.push(DiffLine::Removed(format!("(binary content, {} bytes)", old.len())));
    }
    if !new.is_empty() {
        lines.push(DiffLine::Added(format!("(binary content, {} bytes)", new.len())));
    }

    BlobDiff {
        hunks: vec![DiffHunk {
            old_start: 1,
            old_count: usize::from(!old.is_empty()),
            new_start: 1,
            new_count: usize::from(!new.is_empty()),
            lines,
        }],
        old_lines: 0,
        new_lines: 0,
        binary: true,
    }
}
