use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where the pipeline gets its documents from.
///
/// `discover` runs once per indexing call on the caller's thread; `size` and
/// `read` are called from worker threads, each path by exactly one worker.
pub trait DocumentSource: Send + Sync {
    fn discover(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
    fn size(&self, path: &Path) -> io::Result<u64>;
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Regular files below a folder whose name ends in one extension.
#[derive(Debug, Clone)]
pub struct FsSource {
    extension: String,
}

impl FsSource {
    pub const DEFAULT_EXTENSION: &'static str = "txt";

    pub fn new(extension: &str) -> Self {
        Self { extension: extension.trim_start_matches('.').to_ascii_lowercase() }
    }

    pub fn extension(&self) -> &str { &self.extension }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

impl Default for FsSource {
    fn default() -> Self { Self::new(Self::DEFAULT_EXTENSION) }
}

impl DocumentSource for FsSource {
    fn discover(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let root = fs::canonicalize(root)?;
        if !root.is_dir() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a directory"));
        }
        // Linked folders are walked too; entries are resolved so a file reached
        // through several links is listed once.
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for entry in WalkDir::new(&root).follow_links(true).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }
            let Ok(path) = fs::canonicalize(entry.path()) else { continue };
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn size(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn read(&self, path: &Path) -> io::Result<String> {
        let bytes = fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_extension_case_insensitively() {
        let src = FsSource::new(".TXT");
        assert_eq!(src.extension(), "txt");
        assert!(src.matches(Path::new("/a/b/notes.txt")));
        assert!(src.matches(Path::new("/a/b/NOTES.Txt")));
        assert!(!src.matches(Path::new("/a/b/notes.md")));
        assert!(!src.matches(Path::new("/a/b/txt")));
    }
}
