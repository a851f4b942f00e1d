//! Line-level three-way merge (diff3).
//!
//! Both sides are diffed against the base with the Myers line diff. The base
//! is then cut into alternating chunks: *stable* chunks, where a run of base
//! lines is matched on both sides, and *unstable* chunks between them. An
//! unstable chunk changed on one side only takes that side; changed
//! identically on both sides takes either; otherwise it becomes a conflict
//! block:
//!
//! ```text
//! <<<<<<< ours
//! ours lines
//! ||||||| base
//! base lines
//! =======
//! theirs lines
//! >>>>>>> theirs
//! ```

use grove_diff::{diff_lines, split_lines, DiffOp};

/// Default width of conflict markers.
pub const DEFAULT_MARKER_SIZE: usize = 7;

/// Labels written after the conflict markers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeLabels {
    pub ours: String,
    pub base: String,
    pub theirs: String,
}

impl Default for MergeLabels {
    fn default() -> Self {
        Self {
            ours: "ours".into(),
            base: "base".into(),
            theirs: "theirs".into(),
        }
    }
}

/// How conflict blocks are rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOptions {
    pub labels: MergeLabels,
    /// Number of marker characters (`<`, `|`, `=`, `>`) per marker line.
    pub marker_size: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            labels: MergeLabels::default(),
            marker_size: DEFAULT_MARKER_SIZE,
        }
    }
}

/// Outcome of a line-level merge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineMerge {
    /// Every chunk resolved; the merged content.
    Clean(Vec<u8>),
    /// At least one conflict block; the content with markers inserted.
    Conflicted { content: Vec<u8>, conflicts: usize },
}

impl LineMerge {
    /// Returns `true` for a merge without conflict blocks.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean(_))
    }

    /// The merged bytes, with markers if conflicted.
    pub fn content(&self) -> &[u8] {
        match self {
            Self::Clean(content) | Self::Conflicted { content, .. } => content,
        }
    }
}

/// Three-way merge of `ours` and `theirs` against their common `base`.
pub fn merge_lines(base: &[u8], ours: &[u8], theirs: &[u8], options: &MergeOptions) -> LineMerge {
    let o = split_lines(base);
    let a = split_lines(ours);
    let b = split_lines(theirs);

    let match_a = base_matches(&o, &a);
    let match_b = base_matches(&o, &b);

    let mut out = Vec::with_capacity(base.len().max(ours.len()).max(theirs.len()));
    let mut conflicts = 0usize;
    let (mut io, mut ia, mut ib) = (0usize, 0usize, 0usize);

    loop {
        // Stable run: base lines matched on both sides at the current cursors.
        let mut run = 0;
        while io + run < o.len()
            && match_a[io + run] == Some(ia + run)
            && match_b[io + run] == Some(ib + run)
        {
            run += 1;
        }
        if run > 0 {
            extend_lines(&mut out, &o[io..io + run]);
            io += run;
            ia += run;
            ib += run;
            continue;
        }

        // Unstable chunk up to the next base line matched on both sides.
        let sync = (io..o.len()).find_map(|i| match (match_a[i], match_b[i]) {
            (Some(ja), Some(jb)) => Some((i, ja, jb)),
            _ => None,
        });
        let (end_o, end_a, end_b) = sync.unwrap_or((o.len(), a.len(), b.len()));
        if end_o == io && end_a == ia && end_b == ib {
            break;
        }

        let chunk = Chunk {
            base: &o[io..end_o],
            ours: &a[ia..end_a],
            theirs: &b[ib..end_b],
        };
        if !chunk.resolve(&mut out) {
            conflicts += 1;
            chunk.write_conflict(&mut out, options);
        }

        io = end_o;
        ia = end_a;
        ib = end_b;
    }

    if conflicts == 0 {
        LineMerge::Clean(out)
    } else {
        LineMerge::Conflicted {
            content: out,
            conflicts,
        }
    }
}

/// For each base line, the index of the line it is matched to on `side`.
fn base_matches(base: &[&[u8]], side: &[&[u8]]) -> Vec<Option<usize>> {
    let mut matches = vec![None; base.len()];
    for op in diff_lines(base, side) {
        if let DiffOp::Equal { old, new } = op {
            for (i, j) in old.zip(new) {
                matches[i] = Some(j);
            }
        }
    }
    matches
}

struct Chunk<'a> {
    base: &'a [&'a [u8]],
    ours: &'a [&'a [u8]],
    theirs: &'a [&'a [u8]],
}

impl Chunk<'_> {
    /// Append the resolution if one side (or both identically) changed.
    fn resolve(&self, out: &mut Vec<u8>) -> bool {
        let pick = if self.ours == self.base || self.ours == self.theirs {
            self.theirs
        } else if self.theirs == self.base {
            self.ours
        } else {
            return false;
        };
        extend_lines(out, pick);
        true
    }

    fn write_conflict(&self, out: &mut Vec<u8>, options: &MergeOptions) {
        let labels = &options.labels;
        write_marker(out, b'<', options.marker_size, &labels.ours);
        extend_block(out, self.ours);
        write_marker(out, b'|', options.marker_size, &labels.base);
        extend_block(out, self.base);
        write_marker(out, b'=', options.marker_size, "");
        extend_block(out, self.theirs);
        write_marker(out, b'>', options.marker_size, &labels.theirs);
    }
}

fn extend_lines(out: &mut Vec<u8>, lines: &[&[u8]]) {
    for line in lines {
        out.extend_from_slice(line);
    }
}

/// Like [`extend_lines`], but guarantees the block ends in a newline so the
/// following marker starts on its own line.
fn extend_block(out: &mut Vec<u8>, lines: &[&[u8]]) {
    extend_lines(out, lines);
    if lines.last().is_some_and(|l| !l.ends_with(b"\n")) {
        out.push(b'\n');
    }
}

fn write_marker(out: &mut Vec<u8>, ch: u8, size: usize, label: &str) {
    out.extend(std::iter::repeat(ch).take(size));
    if !label.is_empty() {
        out.push(b' ');
        out.extend_from_slice(label.as_bytes());
    }
    out.push(b'\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(base: &str, ours: &str, theirs: &str) -> LineMerge {
        merge_lines(
            base.as_bytes(),
            ours.as_bytes(),
            theirs.as_bytes(),
            &MergeOptions::default(),
        )
    }

    fn text(result: &LineMerge) -> &str {
        std::str::from_utf8(result.content()).unwrap()
    }

    #[test]
    fn unchanged_sides_keep_base() {
        let result = merge("a\nb\n", "a\nb\n", "a\nb\n");
        assert_eq!(result, LineMerge::Clean(b"a\nb\n".to_vec()));
    }

    #[test]
    fn one_sided_change_is_taken() {
        let result = merge("a\nb\nc\n", "a\nB\nc\n", "a\nb\nc\n");
        assert_eq!(text(&result), "a\nB\nc\n");
        let result = merge("a\nb\nc\n", "a\nb\nc\n", "a\nb\nC\n");
        assert_eq!(text(&result), "a\nb\nC\n");
    }

    #[test]
    fn disjoint_changes_combine() {
        let base = "1\n2\n3\n4\n5\n6\n7\n";
        let ours = "ONE\n2\n3\n4\n5\n6\n7\n";
        let theirs = "1\n2\n3\n4\n5\n6\nSEVEN\n";
        let result = merge(base, ours, theirs);
        assert!(result.is_clean());
        assert_eq!(text(&result), "ONE\n2\n3\n4\n5\n6\nSEVEN\n");
    }

    #[test]
    fn identical_changes_do_not_conflict() {
        let result = merge("a\nb\nc\n", "a\nX\nc\n", "a\nX\nc\n");
        assert_eq!(result, LineMerge::Clean(b"a\nX\nc\n".to_vec()));
    }

    #[test]
    fn insertions_at_different_places() {
        let base = "a\nb\nc\nd\n";
        let ours = "top\na\nb\nc\nd\n";
        let theirs = "a\nb\nc\nd\nbottom\n";
        assert_eq!(text(&merge(base, ours, theirs)), "top\na\nb\nc\nd\nbottom\n");
    }

    #[test]
    fn deletion_and_distant_edit() {
        let base = "a\nb\nc\nd\ne\n";
        let ours = "a\nc\nd\ne\n";
        let theirs = "a\nb\nc\nd\nE\n";
        assert_eq!(text(&merge(base, ours, theirs)), "a\nc\nd\nE\n");
    }

    #[test]
    fn same_line_edit_conflicts_with_markers() {
        let result = merge("a\nb\nc\n", "a\nours\nc\n", "a\ntheirs\nc\n");
        assert_eq!(
            result,
            LineMerge::Conflicted {
                content: b"a\n<<<<<<< ours\nours\n||||||| base\nb\n=======\ntheirs\n>>>>>>> theirs\nc\n"
                    .to_vec(),
                conflicts: 1,
            }
        );
    }

    #[test]
    fn two_separate_conflicts_are_counted() {
        let base = "1\n2\n3\n4\n5\n";
        let ours = "X\n2\n3\n4\nY\n";
        let theirs = "x\n2\n3\n4\ny\n";
        match merge(base, ours, theirs) {
            LineMerge::Conflicted { conflicts, .. } => assert_eq!(conflicts, 2),
            other => panic!("expected conflicts, got {other:?}"),
        }
    }

    #[test]
    fn missing_final_newline_still_gets_marker_on_own_line() {
        let result = merge("a\nb", "a\nours", "a\ntheirs");
        assert_eq!(
            text(&result),
            "a\n<<<<<<< ours\nours\n||||||| base\nb\n=======\ntheirs\n>>>>>>> theirs\n"
        );
    }

    #[test]
    fn empty_base_add_add_conflicts_whole_file() {
        let result = merge("", "left\n", "right\n");
        assert_eq!(
            text(&result),
            "<<<<<<< ours\nleft\n||||||| base\n=======\nright\n>>>>>>> theirs\n"
        );
    }

    #[test]
    fn custom_labels_and_marker_size() {
        let options = MergeOptions {
            labels: MergeLabels {
                ours: "HEAD".into(),
                base: "merged common ancestors".into(),
                theirs: "feature".into(),
            },
            marker_size: 3,
        };
        let result = merge_lines(b"x\n", b"y\n", b"z\n", &options);
        assert_eq!(
            std::str::from_utf8(result.content()).unwrap(),
            "<<< HEAD\ny\n||| merged common ancestors\nx\n===\nz\n>>> feature\n"
        );
    }

    #[test]
    fn large_file_with_edits_at_both_ends_merges_cleanly() {
        let lines: Vec<String> = (0..5000).map(|i| format!("line {i}\n")).collect();
        let base = lines.concat();

        let mut ours_lines = lines.clone();
        ours_lines[0] = "first\n".into();
        ours_lines[4999] = "last\n".into();
        let ours = ours_lines.concat();

        let mut theirs_lines = lines.clone();
        theirs_lines.insert(2500, "middle\n".into());
        let theirs = theirs_lines.concat();

        let result = merge(&base, &ours, &theirs);
        assert!(result.is_clean());

        let mut expected = ours_lines;
        expected.insert(2500, "middle\n".into());
        assert_eq!(text(&result), expected.concat());
    }
}
