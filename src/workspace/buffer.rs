use std::collections::BTreeMap;

/// Live in-memory file set backing the editable workspace. Keys are
/// normalized `/`-rooted paths.
#[derive(Debug, Default, Clone)]
pub struct WorkspaceBuffer {
    files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEntry {
    File { name: String, size: usize },
    Directory { name: String },
}

impl DirEntry {
    pub fn name(&self) -> &str {
        match self {
            DirEntry::File { name, .. } | DirEntry::Directory { name } => name,
        }
    }
}

impl WorkspaceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Write `content`, returning the previous content if the file existed.
    pub fn write(&mut self, path: &str, content: &str) -> Option<String> {
        self.files.insert(path.to_string(), content.to_string())
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.files.remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Immediate children of `dir`, directories derived from file paths.
    /// Sorted by name with directories and files interleaved.
    pub fn list_dir(&self, dir: &str) -> Vec<DirEntry> {
        let prefix = if dir == "/" { "/".to_string() } else { format!("{}/", dir.trim_end_matches('/')) };
        let mut entries: BTreeMap<String, DirEntry> = BTreeMap::new();

        for (path, content) in self.files.range(prefix.clone()..) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    entries
                        .entry(child.to_string())
                        .or_insert_with(|| DirEntry::Directory { name: child.to_string() });
                }
                None => {
                    entries.insert(rest.to_string(), DirEntry::File { name: rest.to_string(), size: content.len() });
                }
            }
        }

        entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> WorkspaceBuffer {
        let mut buf = WorkspaceBuffer::new();
        buf.write("/index.js", "console.log(1)");
        buf.write("/src/app.js", "app");
        buf.write("/src/lib/util.js", "util");
        buf.write("/srcfile.txt", "not in src");
        buf
    }

    #[test]
    fn write_returns_previous_content() {
        let mut buf = WorkspaceBuffer::new();
        assert_eq!(buf.write("/a.js", "x"), None);
        assert_eq!(buf.write("/a.js", "y").as_deref(), Some("x"));
        assert_eq!(buf.get("/a.js"), Some("y"));
    }

    #[test]
    fn list_root_derives_directories() {
        let names: Vec<String> = buffer().list_dir("/").iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["index.js", "src", "srcfile.txt"]);
    }

    #[test]
    fn list_subdirectory_excludes_siblings_with_shared_prefix() {
        let entries = buffer().list_dir("/src");
        assert_eq!(
            entries,
            vec![
                DirEntry::File { name: "app.js".into(), size: 3 },
                DirEntry::Directory { name: "lib".into() },
            ]
        );
    }

    #[test]
    fn list_missing_directory_is_empty() {
        assert!(buffer().list_dir("/nope").is_empty());
    }
}
