//! Destinations for a converted course.
//!
//! A course is written as a set of documents addressed by kind and name plus
//! the static files copied from the backup. Every document is written exactly
//! once; a second write to the same address is an error.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Kind of document in an edX course directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentKind {
    /// `html/<name>.xml`
    Html,
    /// `problem/<name>.xml`
    Problem,
    /// `course/<name>.xml`
    Course,
    /// The top-level `course.xml`; the name is ignored.
    Pointer,
}

impl DocumentKind {
    /// Path of a document relative to the course root.
    pub fn relative_path(self, name: &str) -> PathBuf {
        match self {
            DocumentKind::Html => Path::new("html").join(format!("{name}.xml")),
            DocumentKind::Problem => Path::new("problem").join(format!("{name}.xml")),
            DocumentKind::Course => Path::new("course").join(format!("{name}.xml")),
            DocumentKind::Pointer => PathBuf::from("course.xml"),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentKind::Html => "html",
            DocumentKind::Problem => "problem",
            DocumentKind::Course => "course",
            DocumentKind::Pointer => "pointer",
        })
    }
}

/// Destination for course documents and static files.
pub trait CourseStore {
    /// Write a document. Fails with [`Error::DuplicateDocument`] when the
    /// same kind and name were already written.
    fn write_document(&mut self, kind: DocumentKind, name: &str, content: &str) -> Result<()>;

    /// Copy a file from the backup into `static/<name>`.
    fn copy_static(&mut self, source: &Path, name: &str) -> Result<()>;
}

/// Tracks written addresses so both stores share the write-once rule.
#[derive(Debug, Default)]
struct WrittenSet(HashSet<(DocumentKind, String)>);

impl WrittenSet {
    fn claim(&mut self, kind: DocumentKind, name: &str) -> Result<()> {
        let key = match kind {
            DocumentKind::Pointer => (kind, String::new()),
            _ => (kind, name.to_string()),
        };
        if !self.0.insert(key) {
            return Err(Error::DuplicateDocument(
                kind.relative_path(name).display().to_string(),
            ));
        }
        Ok(())
    }
}

/// Writes a course into a directory on disk.
#[derive(Debug)]
pub struct DirStore {
    root: PathBuf,
    written: WrittenSet,
}

impl DirStore {
    /// Create the course directory and its `html/`, `problem/`, `course/`
    /// and `static/` subdirectories.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for sub in ["html", "problem", "course", "static"] {
            fs::create_dir_all(root.join(sub))?;
        }
        Ok(Self {
            root,
            written: WrittenSet::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CourseStore for DirStore {
    fn write_document(&mut self, kind: DocumentKind, name: &str, content: &str) -> Result<()> {
        self.written.claim(kind, name)?;
        let path = self.root.join(kind.relative_path(name));
        fs::write(&path, content)?;
        debug!(path = %path.display(), "wrote {kind} document");
        Ok(())
    }

    fn copy_static(&mut self, source: &Path, name: &str) -> Result<()> {
        fs::copy(source, self.root.join("static").join(name))?;
        Ok(())
    }
}

/// Keeps a converted course in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: BTreeMap<(DocumentKind, String), String>,
    statics: BTreeMap<String, Vec<u8>>,
    written: WrittenSet,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, kind: DocumentKind, name: &str) -> Option<&str> {
        self.documents
            .get(&(kind, name.to_string()))
            .map(String::as_str)
    }

    /// Names of every document of one kind, sorted.
    pub fn names(&self, kind: DocumentKind) -> Vec<&str> {
        self.documents
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, name)| name.as_str())
            .collect()
    }

    pub fn static_file(&self, name: &str) -> Option<&[u8]> {
        self.statics.get(name).map(Vec::as_slice)
    }
}

impl CourseStore for MemoryStore {
    fn write_document(&mut self, kind: DocumentKind, name: &str, content: &str) -> Result<()> {
        self.written.claim(kind, name)?;
        let name = match kind {
            DocumentKind::Pointer => String::new(),
            _ => name.to_string(),
        };
        self.documents.insert((kind, name), content.to_string());
        Ok(())
    }

    fn copy_static(&mut self, source: &Path, name: &str) -> Result<()> {
        let data = fs::read(source)?;
        self.statics.insert(name.to_string(), data);
        Ok(())
    }
}
