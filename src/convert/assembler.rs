//! Top-level driver for converting one backup.

use tracing::info;

use super::{
    ActivityDispatcher, ConversionReport, ConvertConfig, Diagnostic, ImportContext, QuestionBank,
    StaticFiles,
};
use crate::edx::{Course, CourseStore, DocumentKind, pointer_xml};
use crate::error::{Error, Result};
use crate::moodle::MoodleBackup;

/// Converts a [`MoodleBackup`] into an edX course written to a [`CourseStore`].
pub struct CourseAssembler<'a, S: CourseStore + ?Sized> {
    backup: &'a MoodleBackup,
    store: &'a mut S,
    config: &'a ConvertConfig,
}

impl<'a, S: CourseStore + ?Sized> CourseAssembler<'a, S> {
    pub fn new(backup: &'a MoodleBackup, store: &'a mut S, config: &'a ConvertConfig) -> Self {
        Self {
            backup,
            store,
            config,
        }
    }

    /// Run the conversion.
    ///
    /// A missing or malformed manifest or `files.xml` aborts the run, as does
    /// any I/O failure. Anything that goes wrong inside a single activity is
    /// recorded in the report and the activity is left out.
    pub fn run(self) -> Result<ConversionReport> {
        let mut report = ConversionReport::default();
        let questions = QuestionBank::load(self.backup, &mut report)?;
        info!("loaded {} questions", questions.len());

        info!("==== Copying static files");
        let statics = StaticFiles::copy_from(self.backup, self.store, &mut report)?;

        let manifest = self.backup.manifest()?;
        let mut ctx = ImportContext::new(self.backup, self.store, statics, questions, report);
        let number = ctx.names.mint(&manifest.shortname, "", false, ".");
        info!("course: {} ({number})", manifest.fullname);

        let mut course = Course::new(&manifest.fullname, &number, &self.config.org);
        if let Some(chapter) = ctx.course_head_chapter()? {
            course.chapters.push(chapter);
        }

        let mut dispatcher = ActivityDispatcher::new();
        for activity in &manifest.activities {
            match dispatcher.dispatch(&mut ctx, &mut course, activity) {
                Ok(()) => {}
                Err(e @ Error::Io(_)) => return Err(e),
                Err(e) => ctx.report.diagnose(Diagnostic::ActivityFailed {
                    directory: activity.directory.clone(),
                    message: e.to_string(),
                }),
            }
        }

        match course.chapters.first_mut() {
            Some(first) => first.display_name = Some(manifest.fullname.replace('/', " ")),
            None => ctx.report.diagnose(Diagnostic::EmptyCourse),
        }

        let run = ctx.names.make_url_name(&self.config.semester, "");
        ctx.store
            .write_document(DocumentKind::Course, &run, &course.to_xml()?)?;
        ctx.store.write_document(
            DocumentKind::Pointer,
            "",
            &pointer_xml(&run, &self.config.org, &number),
        )?;
        info!("wrote course/{run}.xml");

        let mut report = ctx.report;
        report.course_name = manifest.fullname;
        report.course_number = number;
        report.run = run;
        report.chapters = course.chapters.len();
        report.static_files = ctx.statics.copied();
        Ok(report)
    }
}
