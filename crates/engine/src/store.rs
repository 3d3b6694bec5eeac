// File collaborator access: list project source files, save rewritten contents.
//
// The engine never touches durable storage directly; everything goes through
// the `FileStore` seam so the patcher can be exercised against an in-memory
// store in tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

/// One project source file as the collaborator exposes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Project-relative path, forward slashes.
    pub file_path: String,
    pub contents: String,
}

/// Contract consumed from the file collaborator.
pub trait FileStore: Send + Sync {
    /// All source files eligible for patching.
    fn list_files(&self) -> Result<Vec<SourceFile>>;

    /// Persist new contents for one path, with a human-readable message.
    fn save_file(&self, path: &str, contents: &str, message: &str) -> Result<()>;

    /// Persist a binary asset (reassembled uploads).
    fn save_binary(&self, path: &str, bytes: &[u8], message: &str) -> Result<()>;

    /// Fetch one file by its project-relative path.
    fn read_file(&self, path: &str) -> Result<Option<SourceFile>> {
        Ok(self.list_files()?.into_iter().find(|file| file.file_path == path))
    }
}

/// Extensions considered source markup by default.
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js", "html", "vue", "svelte"];

/// Directory names never scanned for source files.
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", ".next"];

/// Filesystem-backed store rooted at the project directory.
pub struct DiskStore {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    pub fn with_extensions(root: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self { root: root.into(), extensions }
    }

    fn collect_files(&self, dir: &Path, out: &mut Vec<SourceFile>) -> Result<()> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read directory {}", dir.display()))?;

        for entry in entries {
            let entry = entry.context("failed to read directory entry")?;
            let path = entry.path();

            if path.is_dir() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if SKIPPED_DIRS.contains(&name.as_ref()) || name.starts_with('.') {
                    continue;
                }
                self.collect_files(&path, out)?;
                continue;
            }

            let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
                continue;
            };
            if !self.extensions.iter().any(|allowed| allowed == extension) {
                continue;
            }

            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read source file {}", path.display()))?;
            let relative = path
                .strip_prefix(&self.root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            out.push(SourceFile { file_path: relative, contents });
        }

        Ok(())
    }
}

impl FileStore for DiskStore {
    fn list_files(&self) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();
        self.collect_files(&self.root, &mut files)?;
        files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        Ok(files)
    }

    fn save_file(&self, path: &str, contents: &str, message: &str) -> Result<()> {
        let absolute = self.root.join(path);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        std::fs::write(&absolute, contents)
            .with_context(|| format!("failed to write {}", absolute.display()))?;
        tracing::info!(path, message, "saved file");
        Ok(())
    }

    fn save_binary(&self, path: &str, bytes: &[u8], message: &str) -> Result<()> {
        let absolute = self.root.join(path);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        std::fs::write(&absolute, bytes)
            .with_context(|| format!("failed to write {}", absolute.display()))?;
        tracing::info!(path, message, size = bytes.len(), "saved binary asset");
        Ok(())
    }
}

/// In-memory store for unit and integration tests.
#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, String>>,
    binaries: Mutex<BTreeMap<String, Vec<u8>>>,
    /// Messages passed to `save_file`/`save_binary`, in call order.
    pub saved_messages: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new(files: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            files: Mutex::new(files.into_iter().collect()),
            binaries: Mutex::new(BTreeMap::new()),
            saved_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn contents_of(&self, path: &str) -> Option<String> {
        self.files.lock().expect("store lock poisoned").get(path).cloned()
    }

    pub fn binary_of(&self, path: &str) -> Option<Vec<u8>> {
        self.binaries.lock().expect("store lock poisoned").get(path).cloned()
    }
}

impl FileStore for MemoryStore {
    fn list_files(&self) -> Result<Vec<SourceFile>> {
        Ok(self
            .files
            .lock()
            .expect("store lock poisoned")
            .iter()
            .map(|(file_path, contents)| SourceFile {
                file_path: file_path.clone(),
                contents: contents.clone(),
            })
            .collect())
    }

    fn save_file(&self, path: &str, contents: &str, message: &str) -> Result<()> {
        self.files.lock().expect("store lock poisoned").insert(path.to_string(), contents.to_string());
        self.saved_messages.lock().expect("store lock poisoned").push(message.to_string());
        Ok(())
    }

    fn save_binary(&self, path: &str, bytes: &[u8], message: &str) -> Result<()> {
        self.binaries.lock().expect("store lock poisoned").insert(path.to_string(), bytes.to_vec());
        self.saved_messages.lock().expect("store lock poisoned").push(message.to_string());
        Ok(())
    }
}
