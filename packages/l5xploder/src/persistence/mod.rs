//! Storage of an exploded tree on disk.
//!
//! A [`PersistenceBackend`] encodes single nodes and the root shell. The
//! [`ExplodedStore`] owns the destination layout around it: the fixed
//! subdirectory, the options record, directory creation and the worker pool
//! used for parallel reads and writes.

mod files;
mod json;
mod xml;

pub use files::{verify_unique_paths, ElementFile};
pub use json::JsonBackend;
pub use xml::XmlBackend;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::config::{
    cmp_ignore_case, worker_count, CLEANUP_MAX_ATTEMPTS, CLEANUP_RETRY_DELAY_MS,
    EXPLODED_SUBDIR_NAME, OPTIONS_FILE_NAME, ROOT_DOCUMENT_BASE_NAME,
};
use crate::error::{PloderError, Result};
use crate::options::{SerializationFormat, SerializationOptions};
use crate::retry::retry_io;
use crate::serializer::CustomSerializer;
use crate::tree::{Document, Node};

/// Encoding of single nodes and root shells.
///
/// Implementations are called concurrently with disjoint paths.
pub trait PersistenceBackend: Send + Sync {
    /// File extension including the dot, e.g. `".xml"`.
    fn extension(&self) -> &'static str;

    fn save_root(&self, document: &Document, path: &Path) -> Result<()>;

    fn load_root(&self, path: &Path) -> Result<Document>;

    fn save_node(&self, node: &Node, path: &Path) -> Result<()>;

    fn load_node(&self, path: &Path) -> Result<Node>;
}

/// Pick the backend named by an options record.
#[must_use]
pub fn create_backend(options: &SerializationOptions) -> Box<dyn PersistenceBackend> {
    match options.format {
        SerializationFormat::Xml => Box::new(XmlBackend::new(options.pretty_attributes)),
        SerializationFormat::Json => Box::new(JsonBackend),
    }
}

/// The `RSLogix5000Content` subdirectory of a destination, with the backend
/// and options it was (or will be) written with.
///
/// Relative paths passed to the store are `/`-separated and relative to the
/// subdirectory.
pub struct ExplodedStore {
    root_dir: PathBuf,
    options: SerializationOptions,
    backend: Box<dyn PersistenceBackend>,
    pool: ThreadPool,
}

impl ExplodedStore {
    /// Store for writing under `destination` with the given options.
    pub fn new(destination: impl AsRef<Path>, options: SerializationOptions) -> Result<Self> {
        let backend = create_backend(&options);
        Self::with_backend(destination, options, backend)
    }

    /// Store for reading under `destination`.
    ///
    /// Options are read from the stored record; `defaults` apply when the
    /// record is missing.
    pub fn open(destination: impl AsRef<Path>, defaults: SerializationOptions) -> Result<Self> {
        let root_dir = destination.as_ref().join(EXPLODED_SUBDIR_NAME);
        let options = SerializationOptions::load_or(&root_dir.join(OPTIONS_FILE_NAME), defaults)?;
        tracing::debug!(format = options.format.as_str(), "Loaded export options");
        Self::new(destination, options)
    }

    /// Store with an explicit backend.
    pub fn with_backend(
        destination: impl AsRef<Path>,
        options: SerializationOptions,
        backend: Box<dyn PersistenceBackend>,
    ) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count())
            .thread_name(|i| format!("l5xploder-io-{i}"))
            .build()?;
        Ok(Self {
            root_dir: destination.as_ref().join(EXPLODED_SUBDIR_NAME),
            options,
            backend,
            pool,
        })
    }

    /// Absolute path of the exploded subdirectory.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    #[must_use]
    pub fn options(&self) -> &SerializationOptions {
        &self.options
    }

    #[must_use]
    pub fn backend(&self) -> &dyn PersistenceBackend {
        self.backend.as_ref()
    }

    /// Path of the options record.
    #[must_use]
    pub fn options_path(&self) -> PathBuf {
        self.root_dir.join(OPTIONS_FILE_NAME)
    }

    /// Path of the root shell file.
    #[must_use]
    pub fn root_document_path(&self) -> PathBuf {
        self.root_dir
            .join(format!("{ROOT_DOCUMENT_BASE_NAME}{}", self.backend.extension()))
    }

    /// Absolute path of a relative store path.
    #[must_use]
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root_dir.clone(), |path, part| path.join(part))
    }

    /// Run `op` on the store's worker pool.
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        self.pool.install(op)
    }

    /// Replace the exploded subdirectory with the root shell, the element
    /// files and the options record.
    ///
    /// Paths are checked for duplicates before anything on disk changes.
    pub fn save(&self, root: &Document, files: &[ElementFile]) -> Result<()> {
        verify_unique_paths(files, self.backend.extension())?;

        self.clear()?;
        fs::create_dir_all(&self.root_dir).map_err(|e| PloderError::io_at(&self.root_dir, e))?;

        for (depth, level) in directory_levels(files) {
            tracing::trace!(depth, directories = level.len(), "Creating directory level");
            self.install(|| {
                level.par_iter().try_for_each(|dir| {
                    let path = self.resolve(dir);
                    fs::create_dir_all(&path).map_err(|e| PloderError::io_at(&path, e))
                })
            })?;
        }

        self.install(|| files.par_iter().try_for_each(|file| self.write_file(file)))?;

        self.backend.save_root(root, &self.root_document_path())?;
        self.options.save(&self.options_path())?;

        tracing::info!(
            path = %self.root_dir.display(),
            files = files.len(),
            format = self.options.format.as_str(),
            "Saved exploded tree"
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if !self.root_dir.exists() {
            return Ok(());
        }
        retry_io(
            CLEANUP_MAX_ATTEMPTS,
            Duration::from_millis(CLEANUP_RETRY_DELAY_MS),
            || fs::remove_dir_all(&self.root_dir),
        )
        .map_err(|(source, attempts)| PloderError::DirectoryCleanup {
            path: self.root_dir.clone(),
            attempts,
            source,
        })
    }

    fn write_file(&self, file: &ElementFile) -> Result<()> {
        let path = self.resolve(&file.final_path(self.backend.extension()));
        match file {
            ElementFile::Structural { node, .. } => self.backend.save_node(node, &path),
            ElementFile::Custom { content, .. } => {
                fs::write(&path, content).map_err(|e| PloderError::io_at(&path, e))
            }
        }
    }

    /// Load the root shell.
    pub fn load_root(&self) -> Result<Document> {
        self.backend.load_root(&self.root_document_path())
    }

    /// Load one node from a relative path without extension.
    pub fn load_node(&self, relative: &str) -> Result<Node> {
        let path = self.resolve(&format!("{relative}{}", self.backend.extension()));
        self.backend.load_node(&path)
    }

    /// Nodes the given serializers rebuild from a relative folder, in
    /// serializer order.
    pub fn load_custom(
        &self,
        relative: &str,
        serializers: &[Arc<dyn CustomSerializer>],
    ) -> Result<Vec<Node>> {
        let folder = self.resolve(relative);
        let mut nodes = Vec::new();
        for serializer in serializers {
            let loaded = serializer.deserialize(&folder)?;
            tracing::debug!(
                serializer = serializer.name(),
                folder = relative,
                nodes = loaded.len(),
                "Deserialized custom files"
            );
            nodes.extend(loaded);
        }
        Ok(nodes)
    }

    #[must_use]
    pub fn directory_exists(&self, relative: &str) -> bool {
        self.resolve(relative).is_dir()
    }

    /// Names of the subdirectories of a relative folder, in ordinal-ignore-case order.
    pub fn subdirectories(&self, relative: &str) -> Result<Vec<String>> {
        let mut names = self.entries(relative, |path| path.is_dir())?;
        names.sort_by(|a, b| cmp_ignore_case(a, b));
        Ok(names)
    }

    /// Base names of the backend files in a relative folder, in
    /// ordinal-ignore-case order.
    pub fn base_files(&self, relative: &str) -> Result<Vec<String>> {
        let extension = self.backend.extension();
        let mut names: Vec<String> = self
            .entries(relative, |path| path.is_file())?
            .into_iter()
            .filter_map(|name| strip_extension(&name, extension).map(str::to_string))
            .collect();
        names.sort_by(|a, b| cmp_ignore_case(a, b));
        Ok(names)
    }

    fn entries(&self, relative: &str, keep: impl Fn(&Path) -> bool) -> Result<Vec<String>> {
        let folder = self.resolve(relative);
        let entries = fs::read_dir(&folder).map_err(|e| PloderError::io_at(&folder, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PloderError::io_at(&folder, e))?;
            let path = entry.path();
            if !keep(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

/// `name` without `extension` if it ends with it, ignoring case.
fn strip_extension<'a>(name: &'a str, extension: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(extension.len())?;
    let (stem, ext) = (name.get(..split)?, name.get(split..)?);
    (ext.eq_ignore_ascii_case(extension) && !stem.is_empty()).then_some(stem)
}

/// Every folder holding a file, plus all ancestors, grouped by depth.
///
/// Folders differing only in case are created once.
fn directory_levels(files: &[ElementFile]) -> BTreeMap<usize, Vec<String>> {
    let mut seen = HashSet::new();
    let mut levels: BTreeMap<usize, Vec<String>> = BTreeMap::new();

    for file in files {
        let folder = file.folder();
        if folder.is_empty() {
            continue;
        }
        let mut end = 0;
        for (depth, part) in folder.split('/').enumerate() {
            end += part.len() + usize::from(depth > 0);
            let ancestor = &folder[..end];
            if seen.insert(ancestor.to_uppercase()) {
                levels.entry(depth).or_default().push(ancestor.to_string());
            }
        }
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn tag(name: &str) -> Node {
        Node::new("Tag").with_attribute("Name", name)
    }

    fn root() -> Document {
        Document::new(Node::new("RSLogix5000Content").with_child(Node::new("Controller")))
    }

    #[test]
    fn test_directory_levels() {
        let files = vec![
            ElementFile::structural("Programs/Main/Tags/A", tag("A")),
            ElementFile::structural("programs/Main/Main", Node::new("Program")),
            ElementFile::structural("Tags/B", tag("B")),
            ElementFile::structural("Top", tag("Top")),
        ];
        let levels = directory_levels(&files);
        assert_eq!(levels[&0], vec!["Programs", "Tags"]);
        assert_eq!(levels[&1], vec!["Programs/Main"]);
        assert_eq!(levels[&2], vec!["Programs/Main/Tags"]);
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("Main.xml", ".xml"), Some("Main"));
        assert_eq!(strip_extension("Main.XML", ".xml"), Some("Main"));
        assert_eq!(strip_extension("Main.st", ".xml"), None);
        assert_eq!(strip_extension(".xml", ".xml"), None);
    }

    #[test]
    fn test_save_writes_layout() {
        let dir = TempDir::new().unwrap();
        let store = ExplodedStore::new(dir.path(), SerializationOptions::default()).unwrap();
        let files = vec![
            ElementFile::structural("Tags/A", tag("A")),
            ElementFile::custom("Programs/Main/Routines/Calc", ".st", "a := 1;"),
        ];
        store.save(&root(), &files).unwrap();

        let base = dir.path().join("RSLogix5000Content");
        assert!(base.join("RSLogix5000Content.xml").is_file());
        assert!(base.join("export-options.yaml").is_file());
        assert!(base.join("Tags").join("A.xml").is_file());
        assert_eq!(
            fs::read_to_string(base.join("Programs/Main/Routines/Calc.st")).unwrap(),
            "a := 1;"
        );
        assert_eq!(store.load_node("Tags/A").unwrap(), tag("A"));
        assert_eq!(store.load_root().unwrap().root, root().root);
    }

    #[test]
    fn test_save_replaces_previous_tree_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README.md"), "keep").unwrap();
        let store = ExplodedStore::new(dir.path(), SerializationOptions::default()).unwrap();

        store
            .save(&root(), &[ElementFile::structural("Tags/Old", tag("Old"))])
            .unwrap();
        store
            .save(&root(), &[ElementFile::structural("Tags/New", tag("New"))])
            .unwrap();

        assert_eq!(store.base_files("Tags").unwrap(), vec!["New"]);
        assert!(dir.path().join("README.md").is_file());
    }

    #[test]
    fn test_duplicates_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let store = ExplodedStore::new(dir.path(), SerializationOptions::default()).unwrap();
        let files = vec![
            ElementFile::structural("Tags/A", tag("A")),
            ElementFile::structural("TAGS/a", tag("a")),
        ];
        assert!(matches!(
            store.save(&root(), &files),
            Err(PloderError::DuplicateOutput { .. })
        ));
        assert!(!store.root_dir().exists());
    }

    #[test]
    fn test_listing_helpers() {
        let dir = TempDir::new().unwrap();
        let store = ExplodedStore::new(dir.path(), SerializationOptions::default()).unwrap();
        let files = vec![
            ElementFile::structural("Programs/b/b", Node::new("Program")),
            ElementFile::structural("Programs/A/A", Node::new("Program")),
            ElementFile::custom("Programs/A/Notes", ".txt", "x"),
        ];
        store.save(&root(), &files).unwrap();

        assert!(store.directory_exists("Programs/A"));
        assert!(!store.directory_exists("Programs/C"));
        assert_eq!(store.subdirectories("Programs").unwrap(), vec!["A", "b"]);
        assert_eq!(store.base_files("Programs/A").unwrap(), vec!["A"]);
    }

    #[test]
    fn test_open_reads_options_record() {
        let dir = TempDir::new().unwrap();
        let options = SerializationOptions {
            format: SerializationFormat::Json,
            ..SerializationOptions::default()
        };
        ExplodedStore::new(dir.path(), options)
            .unwrap()
            .save(&root(), &[])
            .unwrap();

        let store = ExplodedStore::open(dir.path(), SerializationOptions::default()).unwrap();
        assert_eq!(store.options().format, SerializationFormat::Json);
        assert_eq!(store.backend().extension(), ".json");
        assert!(store.root_document_path().is_file());
    }
}
