// ABOUTME: Filesystem layout of the vaglio data directory.
// ABOUTME: Resolves every store file path and creates the directories they live in.

use std::fs;
use std::path::{Path, PathBuf};

use crate::atomic::StoreError;

/// Paths of every file the engine reads at startup or writes at runtime,
/// relative to one data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn eliminated_file(&self) -> PathBuf {
        self.root.join("eliminate").join("domande_eliminate.json")
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.root.join("blocks")
    }

    /// Working copy of the document pool, rewritten on every change.
    pub fn documents_file(&self) -> PathBuf {
        self.root.join("human_valid").join("data.json")
    }

    /// Source dataset the document pool is derived from on first start.
    pub fn dataset_file(&self) -> PathBuf {
        self.root.join("valid").join("dataset_v2.json")
    }

    pub fn validated_file(&self) -> PathBuf {
        self.root.join("validated").join("validated_final.json")
    }

    pub fn comments_file(&self) -> PathBuf {
        self.root.join("validated").join("commenti.json")
    }

    /// Create every directory in the layout.
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        for dir in [
            self.root.join("eliminate"),
            self.blocks_dir(),
            self.root.join("human_valid"),
            self.root.join("valid"),
            self.root.join("validated"),
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Block files in the blocks directory, sorted by file name.
    pub fn block_files(&self) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.blocks_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ensure_dirs_creates_layout() {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path().join("data"));

        layout.ensure_dirs().unwrap();

        assert!(layout.blocks_dir().is_dir());
        assert!(layout.eliminated_file().parent().unwrap().is_dir());
        assert!(layout.documents_file().parent().unwrap().is_dir());
        assert!(layout.validated_file().parent().unwrap().is_dir());
    }

    #[test]
    fn block_files_are_sorted_json_only() {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path());
        layout.ensure_dirs().unwrap();

        fs::write(layout.blocks_dir().join("b.json"), "[]").unwrap();
        fs::write(layout.blocks_dir().join("a.json"), "[]").unwrap();
        fs::write(layout.blocks_dir().join("a.json.tmp"), "[]").unwrap();
        fs::write(layout.blocks_dir().join("notes.txt"), "").unwrap();

        let names: Vec<String> = layout
            .block_files()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn block_files_empty_without_directory() {
        let dir = TempDir::new().unwrap();
        let layout = DataLayout::new(dir.path().join("missing"));
        assert!(layout.block_files().unwrap().is_empty());
    }
}
