//! Moodle → edX course conversion.
//!
//! The conversion is a single top-to-bottom pass:
//! 1. Load the question bank and copy uploaded files ([`QuestionBank`],
//!    [`StaticFiles`])
//! 2. Read the manifest and open the course element
//! 3. Feed every activity, in manifest order, to the [`ActivityDispatcher`],
//!    which places it in the chapter/sequential tree
//! 4. Write the course document and the top-level pointer
//!
//! [`CourseAssembler`] drives the pass.

mod assembler;
mod assets;
mod dispatcher;
mod naming;
mod pages;
mod questions;

pub use assembler::CourseAssembler;
pub use assets::{StaticFile, StaticFiles};
pub use dispatcher::{ActivityDispatcher, ImportContext, SequentialRef};
pub use naming::chapter_name;
pub use pages::{PageEntry, PageIndex, PageLookup};
pub use questions::QuestionBank;

use std::fmt;

use tracing::warn;

/// Organization tag used when none is configured.
pub const DEFAULT_ORG: &str = "MITx";

/// Course run name used when none is configured.
pub const DEFAULT_SEMESTER: &str = "2014_Spring";

/// Settings for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Organization tag written to the course and pointer documents.
    pub org: String,
    /// Course run; becomes the name of `course/<run>.xml`.
    pub semester: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            org: DEFAULT_ORG.to_string(),
            semester: DEFAULT_SEMESTER.to_string(),
        }
    }
}

impl ConvertConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        self.org = org.into();
        self
    }

    pub fn with_semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = semester.into();
        self
    }
}

/// Something the conversion skipped or could only partly convert.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
#[cfg_attr(feature = "cli", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Diagnostic {
    UnknownActivity { category: String, directory: String },
    MissingQuestionName { question_id: String },
    MissingStaticFile { file_id: String, directory: String },
    MissingStaticContent { file_id: String, name: String },
    DuplicateStaticName { file_id: String, name: String },
    StaticHashMismatch { file_id: String, name: String },
    AmbiguousAnswer { question_id: String },
    ActivityFailed { directory: String, message: String },
    SectionSummaryFailed { section_id: String, message: String },
    EmptyCourse,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownActivity {
                category,
                directory,
            } => write!(f, "unknown activity type {category} (adir={directory})"),
            Self::MissingQuestionName { question_id } => {
                write!(f, "can't get name for question id={question_id}")
            }
            Self::MissingStaticFile { file_id, directory } => {
                write!(f, "file id {file_id} referenced by {directory} is not in files.xml")
            }
            Self::MissingStaticContent { file_id, name } => {
                write!(f, "content of file id {file_id} ({name}) is missing from the backup")
            }
            Self::DuplicateStaticName { file_id, name } => {
                write!(f, "file id {file_id} maps to static/{name}, which is already taken")
            }
            Self::StaticHashMismatch { file_id, name } => {
                write!(f, "content hash mismatch for file id {file_id} ({name})")
            }
            Self::AmbiguousAnswer { question_id } => write!(
                f,
                "question {question_id} has several fully correct answers, using the first"
            ),
            Self::ActivityFailed { directory, message } => {
                write!(f, "skipped activity {directory}: {message}")
            }
            Self::SectionSummaryFailed {
                section_id,
                message,
            } => write!(f, "left out summary of section {section_id}: {message}"),
            Self::EmptyCourse => f.write_str("course has no chapters"),
        }
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(serde::Serialize))]
pub struct ConversionReport {
    pub course_name: String,
    pub course_number: String,
    /// Name of `course/<run>.xml`.
    pub run: String,
    pub chapters: usize,
    pub html_documents: usize,
    pub problem_documents: usize,
    pub static_files: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConversionReport {
    /// Log a diagnostic and keep it for the report.
    pub fn diagnose(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }
}
