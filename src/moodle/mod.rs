//! Reading Moodle course backups.
//!
//! A backup is a directory tree (or an `.mbz` archive of one) containing:
//! - `moodle_backup.xml`: course name and the ordered activity list
//! - `course/course.xml`: the course's own summary
//! - `sections/section_<id>/section.xml`: one record per section
//! - `activities/<module>_<id>/<module>.xml`: one record per activity
//! - `questions.xml`: the question bank
//! - `files.xml` and `files/<hash[0..2]>/<hash>`: uploaded files

mod archive;
mod records;
mod xml;

pub use archive::{ArchiveKind, detect_archive, extract_archive};
pub use records::{
    ActivityCategory, Answer, CourseHead, Manifest, ModuleRecord, NULL_MARKER, QuestionType,
    QuizRecord, SourceActivity, SourceQuestion, SourceSection, StaticFileRecord, basename,
};
pub use xml::XmlElement;

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::warn;

use crate::error::{Error, Result};
use crate::util::{decode_text, xml_encoding_hint};

/// An opened backup, either a directory on disk or an unpacked archive.
#[derive(Debug)]
pub struct MoodleBackup {
    root: PathBuf,
    // Keeps the extraction directory alive for archives.
    _extracted: Option<TempDir>,
}

impl MoodleBackup {
    /// Open a backup directory or `.mbz` archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            return Ok(Self {
                root: path.to_path_buf(),
                _extracted: None,
            });
        }
        if !path.is_file() {
            return Err(Error::InvalidBackup(format!(
                "{} is not a backup directory or archive",
                path.display()
            )));
        }

        let dir = extract_archive(path)?;
        Ok(Self {
            root: dir.path().to_path_buf(),
            _extracted: Some(dir),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parse an XML file relative to the backup root.
    pub fn read_xml(&self, relative: impl AsRef<Path>) -> Result<XmlElement> {
        let relative = relative.as_ref();
        let bytes = std::fs::read(self.root.join(relative)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::missing("file", relative.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;
        let text = decode_text(&bytes, xml_encoding_hint(&bytes));
        XmlElement::parse(&text)
    }

    /// Course name, short name and activities from `moodle_backup.xml`.
    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::from_xml(&self.read_xml("moodle_backup.xml")?)
    }

    /// The course's own record, `course/course.xml`.
    pub fn course_head(&self) -> Result<CourseHead> {
        Ok(CourseHead::from_xml(&self.read_xml("course/course.xml")?))
    }

    pub fn section(&self, section_id: &str) -> Result<SourceSection> {
        let xml = self.read_xml(format!("sections/section_{section_id}/section.xml"))?;
        Ok(SourceSection::from_xml(section_id, &xml))
    }

    /// Module record of a url, label, resource or page activity.
    pub fn module(&self, directory: &str, category: &ActivityCategory) -> Result<ModuleRecord> {
        let file = category
            .record_file()
            .ok_or_else(|| Error::InvalidBackup(format!("no module record for {category}")))?;
        ModuleRecord::from_xml(&self.read_xml(Path::new(directory).join(file))?)
    }

    /// Directory of the page activity with the given module id.
    pub fn page_directory(module_id: &str) -> String {
        format!("activities/page_{module_id}")
    }

    pub fn quiz(&self, directory: &str) -> Result<QuizRecord> {
        QuizRecord::from_xml(&self.read_xml(Path::new(directory).join("quiz.xml"))?)
    }

    /// Ids of the files an activity references, from its `inforef.xml`.
    pub fn file_refs(&self, directory: &str) -> Result<Vec<String>> {
        let xml = self.read_xml(Path::new(directory).join("inforef.xml"))?;
        Ok(xml
            .find_all("fileref")
            .into_iter()
            .flat_map(|fileref| fileref.find_all("id"))
            .map(|id| id.text().trim().to_string())
            .filter(|id| !id.is_empty())
            .collect())
    }

    /// Every question in `questions.xml` that carries an id, in file order.
    pub fn questions(&self) -> Result<Vec<SourceQuestion>> {
        let xml = self.read_xml("questions.xml")?;
        Ok(xml
            .find_all("question")
            .into_iter()
            .filter_map(|q| q.attr("id").map(|id| SourceQuestion::from_xml(id, q)))
            .collect())
    }

    /// Every record in `files.xml`; records without an id are skipped.
    pub fn file_records(&self) -> Result<Vec<StaticFileRecord>> {
        let xml = self.read_xml("files.xml")?;
        let mut records = Vec::new();
        for file in xml.find_all("file") {
            match StaticFileRecord::from_xml(file) {
                Ok(record) => records.push(record),
                Err(e) => warn!("skipping file record: {e}"),
            }
        }
        Ok(records)
    }

    /// Location of a file's bytes inside the backup.
    pub fn file_content_path(&self, content_hash: &str) -> PathBuf {
        let prefix = content_hash.get(..2).unwrap_or(content_hash);
        self.root.join("files").join(prefix).join(content_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_open_directory() {
        let dir = TempDir::new().unwrap();
        let backup = MoodleBackup::open(dir.path()).unwrap();
        assert_eq!(backup.root(), dir.path());
    }

    #[test]
    fn test_open_missing_path() {
        let dir = TempDir::new().unwrap();
        let result = MoodleBackup::open(dir.path().join("nope"));
        assert!(matches!(result, Err(Error::InvalidBackup(_))));
    }

    #[test]
    fn test_missing_file_is_missing_resource() {
        let dir = TempDir::new().unwrap();
        let backup = MoodleBackup::open(dir.path()).unwrap();
        assert!(matches!(
            backup.section("9"),
            Err(Error::MissingResource { kind: "file", .. })
        ));
    }

    #[test]
    fn test_file_refs_only_reads_filerefs() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "activities/resource_3/inforef.xml",
            "<inforef><fileref><file><id>11</id></file><file><id>12</id></file></fileref>\
             <grade_itemref><grade_item><id>99</id></grade_item></grade_itemref></inforef>",
        );
        let backup = MoodleBackup::open(dir.path()).unwrap();
        assert_eq!(
            backup.file_refs("activities/resource_3").unwrap(),
            vec!["11", "12"]
        );
    }

    #[test]
    fn test_questions_skip_records_without_id() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "questions.xml",
            r#"<question_categories><question_category><questions>
               <question id="1"><name>A</name><qtype>truefalse</qtype></question>
               <question><name>No id</name></question>
               </questions></question_category></question_categories>"#,
        );
        let backup = MoodleBackup::open(dir.path()).unwrap();
        let questions = backup.questions().unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "1");
    }

    #[test]
    fn test_file_content_path() {
        let dir = TempDir::new().unwrap();
        let backup = MoodleBackup::open(dir.path()).unwrap();
        assert_eq!(
            backup.file_content_path("abcdef"),
            dir.path().join("files").join("ab").join("abcdef")
        );
    }

    #[test]
    fn test_page_directory() {
        assert_eq!(MoodleBackup::page_directory("42"), "activities/page_42");
    }
}
