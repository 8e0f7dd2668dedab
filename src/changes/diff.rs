use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "op", content = "text", rename_all = "snake_case")]
pub enum DiffLine {
    Context(String),
    Removed(String),
    Added(String),
    /// Follows the final line of a side that has no trailing newline.
    NoNewlineAtEof,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub kind: ChangeKind,
    pub old_lines: usize,
    pub new_lines: usize,
    pub lines: Vec<DiffLine>,
}

/// Lines with their terminators, so `"a\n"` and `"a"` compare unequal.
fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

fn text_of(line: &str) -> String {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line).to_string()
}

fn push_line(lines: &mut Vec<DiffLine>, raw: &str, make: fn(String) -> DiffLine) {
    lines.push(make(text_of(raw)));
    if !raw.ends_with('\n') {
        lines.push(DiffLine::NoNewlineAtEof);
    }
}

/// Line-by-line comparison by position. Lines at the same index that differ
/// become one removal followed by one addition; surplus lines on either side
/// are pure removals or additions.
pub fn positional_diff(old: &str, new: &str) -> Vec<DiffLine> {
    let old = split_lines(old);
    let new = split_lines(new);
    let mut lines = Vec::with_capacity(old.len().max(new.len()));

    for i in 0..old.len().max(new.len()) {
        match (old.get(i), new.get(i)) {
            (Some(a), Some(b)) if a == b => push_line(&mut lines, a, DiffLine::Context),
            (Some(a), Some(b)) => {
                push_line(&mut lines, a, DiffLine::Removed);
                push_line(&mut lines, b, DiffLine::Added);
            }
            (Some(a), None) => push_line(&mut lines, a, DiffLine::Removed),
            (None, Some(b)) => push_line(&mut lines, b, DiffLine::Added),
            (None, None) => {}
        }
    }

    lines
}

impl FileDiff {
    pub fn new(path: impl Into<String>, old: Option<&str>, new: Option<&str>) -> Self {
        let path = path.into();
        let old_lines = old.map(|c| split_lines(c).len()).unwrap_or(0);
        let new_lines = new.map(|c| split_lines(c).len()).unwrap_or(0);

        let (kind, lines) = match (old, new) {
            (None, Some(new)) => (ChangeKind::Added, positional_diff("", new)),
            (Some(old), None) => (ChangeKind::Deleted, positional_diff(old, "")),
            (Some(old), Some(new)) => (ChangeKind::Modified, positional_diff(old, new)),
            (None, None) => (ChangeKind::Modified, vec![]),
        };

        Self { path, kind, old_lines, new_lines, lines }
    }

    pub fn added(&self) -> usize {
        self.lines.iter().filter(|l| matches!(l, DiffLine::Added(_))).count()
    }

    pub fn removed(&self) -> usize {
        self.lines.iter().filter(|l| matches!(l, DiffLine::Removed(_))).count()
    }

    pub fn render(&self) -> String {
        let rel = self.path.trim_start_matches('/');
        let mut out = format!("diff --git a/{0} b/{0}\n", rel);

        match self.kind {
            ChangeKind::Added => {
                out.push_str("new file\n--- /dev/null\n");
                out.push_str(&format!("+++ b/{}\n", rel));
            }
            ChangeKind::Deleted => {
                out.push_str("deleted file\n");
                out.push_str(&format!("--- a/{}\n+++ /dev/null\n", rel));
            }
            ChangeKind::Modified => {
                out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", rel));
            }
        }

        if self.lines.is_empty() {
            return out;
        }

        let old_start = if self.old_lines == 0 { 0 } else { 1 };
        let new_start = if self.new_lines == 0 { 0 } else { 1 };
        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_start, self.old_lines, new_start, self.new_lines
        ));

        for line in &self.lines {
            let (prefix, text) = match line {
                DiffLine::Context(t) => (' ', t),
                DiffLine::Removed(t) => ('-', t),
                DiffLine::Added(t) => ('+', t),
                DiffLine::NoNewlineAtEof => {
                    out.push_str("\\ No newline at end of file\n");
                    continue;
                }
            };
            out.push(prefix);
            out.push_str(text);
            out.push('\n');
        }

        out
    }
}

pub fn render_all(diffs: &[FileDiff]) -> String {
    diffs.iter().map(FileDiff::render).collect::<Vec<_>>().join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn changed_line_is_one_removal_and_one_addition() {
        let diff = FileDiff::new("/a.js", Some("1\n2\n"), Some("1\n3\n"));
        assert_eq!(diff.kind, ChangeKind::Modified);
        assert_eq!(
            diff.lines,
            vec![
                DiffLine::Context("1".into()),
                DiffLine::Removed("2".into()),
                DiffLine::Added("3".into()),
            ]
        );
        assert_eq!(
            diff.render(),
            "diff --git a/a.js b/a.js\n--- a/a.js\n+++ b/a.js\n@@ -1,2 +1,2 @@\n 1\n-2\n+3\n"
        );
    }

    #[test]
    fn insertion_shifts_every_following_line() {
        // Positional, not minimal: an inserted line misaligns the rest.
        let lines = positional_diff("a\nb\n", "x\na\nb\n");
        assert_eq!(
            lines,
            vec![
                DiffLine::Removed("a".into()),
                DiffLine::Added("x".into()),
                DiffLine::Removed("b".into()),
                DiffLine::Added("a".into()),
                DiffLine::Added("b".into()),
            ]
        );
    }

    #[test]
    fn new_and_deleted_files() {
        let added = FileDiff::new("/n.txt", None, Some("a\nb"));
        assert_eq!((added.added(), added.removed()), (2, 0));
        assert!(added.render().contains("new file\n--- /dev/null\n+++ b/n.txt\n@@ -0,0 +1,2 @@\n+a\n+b\n"));

        let deleted = FileDiff::new("/old.txt", Some("z\n"), None);
        assert_eq!(deleted.kind, ChangeKind::Deleted);
        assert!(deleted.render().ends_with("+++ /dev/null\n@@ -1,1 +0,0 @@\n-z\n"));
    }

    #[test]
    fn dropping_the_trailing_newline_is_a_visible_change() {
        let diff = FileDiff::new("/a.js", Some("a\n"), Some("a"));
        assert_eq!((diff.added(), diff.removed()), (1, 1));
        assert_eq!(
            diff.render(),
            "diff --git a/a.js b/a.js\n--- a/a.js\n+++ b/a.js\n@@ -1,1 +1,1 @@\n-a\n+a\n\\ No newline at end of file\n"
        );
    }

    #[test]
    fn unterminated_last_line_on_both_sides_is_context() {
        let lines = positional_diff("x\ny", "z\ny");
        assert_eq!(
            lines,
            vec![
                DiffLine::Removed("x".into()),
                DiffLine::Added("z".into()),
                DiffLine::Context("y".into()),
                DiffLine::NoNewlineAtEof,
            ]
        );
    }

    #[test]
    fn empty_new_file_has_no_hunk() {
        let diff = FileDiff::new("/empty", None, Some(""));
        assert_eq!(diff.render(), "diff --git a/empty b/empty\nnew file\n--- /dev/null\n+++ b/empty\n");
    }
}
