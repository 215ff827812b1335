//! Copying uploaded files and resolving them by file id.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{ConversionReport, Diagnostic};
use crate::edx::CourseStore;
use crate::error::Result;
use crate::moodle::{MoodleBackup, StaticFileRecord};

/// Filename Moodle records for directory entries.
const DIRECTORY_ENTRY: &str = ".";

/// Where an uploaded file lives in the converted course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    /// `/static/<name>`
    pub url: String,
    /// Filename as the instructor uploaded it.
    pub display_name: String,
}

/// Uploaded files by backup file id.
#[derive(Debug, Default)]
pub struct StaticFiles {
    by_id: HashMap<String, StaticFile>,
    copied: usize,
}

impl StaticFiles {
    /// Copy every file listed in `files.xml` into the store's `static/`
    /// directory and index it by id.
    ///
    /// When two files map to the same static name the first copy is kept;
    /// both ids resolve to it.
    pub fn copy_from<S: CourseStore + ?Sized>(
        backup: &MoodleBackup,
        store: &mut S,
        report: &mut ConversionReport,
    ) -> Result<Self> {
        let mut files = Self::default();
        let mut taken: HashSet<String> = HashSet::new();

        for record in backup.file_records()? {
            if record.original_name == DIRECTORY_ENTRY {
                continue;
            }
            let name = static_name(&record.original_name);
            files.by_id.insert(
                record.id.clone(),
                StaticFile {
                    url: format!("/static/{name}"),
                    display_name: record.original_name.clone(),
                },
            );

            if !taken.insert(name.clone()) {
                report.diagnose(Diagnostic::DuplicateStaticName {
                    file_id: record.id.clone(),
                    name,
                });
                continue;
            }

            if files.copy_one(backup, store, report, &record, &name)? {
                debug!("      {}", record.original_name);
            }
        }

        Ok(files)
    }

    fn copy_one<S: CourseStore + ?Sized>(
        &mut self,
        backup: &MoodleBackup,
        store: &mut S,
        report: &mut ConversionReport,
        record: &StaticFileRecord,
        name: &str,
    ) -> Result<bool> {
        let source = backup.file_content_path(&record.content_hash);
        let data = match std::fs::read(&source) {
            Ok(data) => data,
            Err(_) => {
                report.diagnose(Diagnostic::MissingStaticContent {
                    file_id: record.id.clone(),
                    name: name.to_string(),
                });
                return Ok(false);
            }
        };

        if !record.content_hash.eq_ignore_ascii_case(&sha1_hex(&data)) {
            report.diagnose(Diagnostic::StaticHashMismatch {
                file_id: record.id.clone(),
                name: name.to_string(),
            });
        }

        store.copy_static(&source, name)?;
        self.copied += 1;
        Ok(true)
    }

    pub fn get(&self, file_id: &str) -> Option<&StaticFile> {
        self.by_id.get(file_id)
    }

    /// Number of files actually copied.
    pub fn copied(&self) -> usize {
        self.copied
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Name of the copied file under `static/`: spaces become underscores.
pub fn static_name(original: &str) -> String {
    original.replace(' ', "_")
}

fn sha1_hex(data: &[u8]) -> String {
    sha1_smol::Sha1::from(data).digest().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edx::MemoryStore;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &[u8]) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn add_blob(root: &Path, data: &[u8]) -> String {
        let hash = sha1_hex(data);
        write(root, &format!("files/{}/{}", &hash[..2], hash), data);
        hash
    }

    #[test]
    fn test_sha1_hex() {
        assert_eq!(sha1_hex(b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn test_static_name() {
        assert_eq!(static_name("My File.png"), "My_File.png");
    }

    #[test]
    fn test_copy_from_backup() {
        let dir = TempDir::new().unwrap();
        let png = add_blob(dir.path(), b"png bytes");
        let pdf = add_blob(dir.path(), b"pdf bytes");
        let files_xml = format!(
            r#"<files>
              <file id="10"><contenthash>{png}</contenthash><mimetype>image/png</mimetype><filename>My File.png</filename></file>
              <file id="11"><contenthash>da39a3ee5e6b4b0d3255bfef95601890afd80709</contenthash><mimetype>$@NULL@$</mimetype><filename>.</filename></file>
              <file id="12"><contenthash>{pdf}</contenthash><mimetype>application/pdf</mimetype><filename>notes.pdf</filename></file>
            </files>"#
        );
        write(dir.path(), "files.xml", files_xml.as_bytes());

        let backup = MoodleBackup::open(dir.path()).unwrap();
        let mut store = MemoryStore::new();
        let mut report = ConversionReport::default();
        let files = StaticFiles::copy_from(&backup, &mut store, &mut report).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files.copied(), 2);
        assert_eq!(
            files.get("10"),
            Some(&StaticFile {
                url: "/static/My_File.png".into(),
                display_name: "My File.png".into(),
            })
        );
        assert!(files.get("11").is_none());
        assert_eq!(store.static_file("My_File.png"), Some(&b"png bytes"[..]));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_duplicate_names_keep_first_copy() {
        let dir = TempDir::new().unwrap();
        let first = add_blob(dir.path(), b"first");
        let second = add_blob(dir.path(), b"second");
        let files_xml = format!(
            r#"<files>
              <file id="1"><contenthash>{first}</contenthash><filename>a b.txt</filename></file>
              <file id="2"><contenthash>{second}</contenthash><filename>a_b.txt</filename></file>
            </files>"#
        );
        write(dir.path(), "files.xml", files_xml.as_bytes());

        let backup = MoodleBackup::open(dir.path()).unwrap();
        let mut store = MemoryStore::new();
        let mut report = ConversionReport::default();
        let files = StaticFiles::copy_from(&backup, &mut store, &mut report).unwrap();

        assert_eq!(store.static_file("a_b.txt"), Some(&b"first"[..]));
        assert_eq!(files.get("2").unwrap().url, "/static/a_b.txt");
        assert_eq!(files.copied(), 1);
        assert!(matches!(
            report.diagnostics.as_slice(),
            [Diagnostic::DuplicateStaticName { .. }]
        ));
    }

    #[test]
    fn test_missing_content_and_hash_mismatch_are_reported() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "files/00/0011", b"not matching");
        write(
            dir.path(),
            "files.xml",
            br#"<files>
              <file id="1"><contenthash>0011</contenthash><filename>bad.txt</filename></file>
              <file id="2"><contenthash>ffee</contenthash><filename>gone.txt</filename></file>
            </files>"#,
        );

        let backup = MoodleBackup::open(dir.path()).unwrap();
        let mut store = MemoryStore::new();
        let mut report = ConversionReport::default();
        let files = StaticFiles::copy_from(&backup, &mut store, &mut report).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files.copied(), 1);
        assert!(matches!(
            report.diagnostics.as_slice(),
            [
                Diagnostic::StaticHashMismatch { .. },
                Diagnostic::MissingStaticContent { .. }
            ]
        ));
    }

    #[test]
    fn test_missing_files_xml_is_fatal() {
        let dir = TempDir::new().unwrap();
        let backup = MoodleBackup::open(dir.path()).unwrap();
        let mut store = MemoryStore::new();
        let mut report = ConversionReport::default();
        assert!(StaticFiles::copy_from(&backup, &mut store, &mut report).is_err());
    }
}
