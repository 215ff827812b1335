//! # moodle2edx
//!
//! Converts Moodle course backups (`.mbz` archives or their unpacked
//! directories) into edX XML courses.
//!
//! ## Quick Start
//!
//! ```no_run
//! use moodle2edx::{ConvertConfig, convert_backup};
//!
//! let config = ConvertConfig::new().with_org("HarvardX");
//! let report = convert_backup("backup.mbz", "course_out", &config).unwrap();
//! println!("{} chapters", report.chapters);
//! ```
//!
//! ## Mapping
//!
//! | Moodle               | edX                                      |
//! |----------------------|------------------------------------------|
//! | course               | `course/<run>.xml` and `course.xml`      |
//! | section              | chapter                                  |
//! | url, label, resource | HTML component in a shared sequential    |
//! | page                 | HTML component in its own sequential     |
//! | quiz question        | problem component, one vertical each     |
//! | uploaded file        | `static/<name>`                          |
//!
//! Other activity types are skipped and listed in the
//! [`ConversionReport`].
//!
//! To write somewhere other than a directory, implement [`CourseStore`]
//! and drive a [`CourseAssembler`] directly.

pub mod convert;
pub mod edx;
pub mod error;
pub mod moodle;
pub(crate) mod util;

use std::path::Path;

use tracing::info;

pub use convert::{ConversionReport, ConvertConfig, CourseAssembler, Diagnostic};
pub use edx::{CourseStore, DirStore, DocumentKind, MemoryStore, NameRegistry};
pub use error::{Error, Result};
pub use moodle::MoodleBackup;

/// Convert the backup at `input` into an edX course under `output`.
///
/// `input` may be a backup directory or an `.mbz` archive. The output
/// directory and its `html/`, `problem/`, `course/` and `static/`
/// subdirectories are created as needed.
pub fn convert_backup(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConvertConfig,
) -> Result<ConversionReport> {
    let input = input.as_ref();
    info!("converting {}", input.display());
    let backup = MoodleBackup::open(input)?;
    let mut store = DirStore::create(output)?;
    CourseAssembler::new(&backup, &mut store, config).run()
}
