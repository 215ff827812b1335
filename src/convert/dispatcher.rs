//! Placing activities in the chapter/sequential tree.
//!
//! Each Moodle section becomes a chapter the first time one of its
//! activities is seen. Url, label, resource and quiz activities that follow
//! each other in a chapter share one sequential. A page always opens a new
//! sequential, which the activities after it then share.

use std::collections::HashMap;

use tracing::info;

use super::pages::{PageIndex, PageLookup};
use super::{ConversionReport, Diagnostic, QuestionBank, StaticFiles, chapter_name};
use crate::edx::rewrite::strip_vendor_tags;
use crate::edx::xml::escape_xml;
use crate::edx::{
    Chapter, Course, CourseStore, DocumentKind, NameRegistry, Sequential, Vertical,
    export_question, render_html,
};
use crate::error::{Error, Result};
use crate::moodle::{ActivityCategory, ModuleRecord, MoodleBackup, SourceActivity};

/// Everything an importer needs while converting one course.
pub struct ImportContext<'a, S: CourseStore + ?Sized> {
    pub backup: &'a MoodleBackup,
    pub store: &'a mut S,
    pub names: NameRegistry,
    pub pages: PageIndex,
    pub statics: StaticFiles,
    pub questions: QuestionBank,
    pub report: ConversionReport,
}

impl<'a, S: CourseStore + ?Sized> ImportContext<'a, S> {
    pub fn new(
        backup: &'a MoodleBackup,
        store: &'a mut S,
        statics: StaticFiles,
        questions: QuestionBank,
        report: ConversionReport,
    ) -> Self {
        Self {
            backup,
            store,
            names: NameRegistry::new(),
            pages: PageIndex::new(),
            statics,
            questions,
            report,
        }
    }

    /// Render HTML into `html/<url_name>.xml` and return the vertical
    /// that shows it.
    pub fn save_html(&mut self, url_name: &str, display_name: &str, raw_html: &str) -> Result<Vertical> {
        let mut lookup = PageLookup {
            backup: self.backup,
            names: &mut self.names,
            index: &mut self.pages,
        };
        let doc = render_html(url_name, display_name, raw_html, &mut lookup)?;
        self.store
            .write_document(DocumentKind::Html, &doc.url_name, &doc.content)?;
        self.report.html_documents += 1;
        Ok(Vertical::html(url_name))
    }

    /// Chapter for a section seen for the first time. When the section has
    /// a summary it is rendered into the chapter's first sequential.
    ///
    /// A summary that fails to render is reported and left out; the chapter
    /// is still returned so the section's activities have somewhere to go.
    pub fn section_chapter(&mut self, section_id: &str, activity_title: &str) -> Result<Chapter> {
        let section = self.backup.section(section_id)?;
        let summary = strip_vendor_tags(section.summary_html.as_deref().unwrap_or_default());
        let name = chapter_name(&section, &summary, activity_title);
        info!("--> Section: {name}");

        let mut chapter = Chapter {
            display_name: Some(name.clone()),
            sequentials: Vec::new(),
        };
        if !summary.is_empty() {
            let url_name = self
                .names
                .make_url_name(&format!("section_{section_id}__{name}"), "");
            match self.save_html(&url_name, &name, &summary) {
                Ok(vertical) => {
                    let mut sequential = Sequential::named(name);
                    sequential.verticals.push(vertical);
                    chapter.sequentials.push(sequential);
                }
                Err(e @ Error::Io(_)) => return Err(e),
                Err(e) => self.report.diagnose(Diagnostic::SectionSummaryFailed {
                    section_id: section_id.to_string(),
                    message: e.to_string(),
                }),
            }
        }
        Ok(chapter)
    }

    /// Chapter holding the course's own summary, if it has one.
    pub fn course_head_chapter(&mut self) -> Result<Option<Chapter>> {
        let head = match self.backup.course_head() {
            Ok(head) => head,
            Err(Error::MissingResource { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        let Some(summary) = head.summary_html.filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let url_name = self
            .names
            .make_url_name(&format!("course__{}", head.shortname), "");
        let vertical = self.save_html(&url_name, &head.shortname, &summary)?;
        let mut sequential = Sequential::named(head.shortname);
        sequential.verticals.push(vertical);
        Ok(Some(Chapter {
            display_name: None,
            sequentials: vec![sequential],
        }))
    }

    /// Import a url, label, resource or page activity as one HTML vertical.
    /// Returns the activity name along with the vertical.
    pub fn import_module(&mut self, activity: &SourceActivity) -> Result<(String, Vertical)> {
        let entry = self
            .pages
            .resolve(self.backup, &mut self.names, &activity.directory, &activity.category)?
            .clone();
        let record = &entry.record;

        let html = match activity.category {
            ActivityCategory::Url => url_body(record),
            ActivityCategory::Label => record.intro.clone().unwrap_or_default(),
            ActivityCategory::Resource => self.resource_body(&activity.directory, record)?,
            ActivityCategory::Page => record.content.clone().unwrap_or_default(),
            _ => {
                return Err(Error::InvalidBackup(format!(
                    "{} is not an HTML activity",
                    activity.directory
                )));
            }
        };

        let vertical = self.save_html(&entry.url_name, &record.name, &html)?;
        Ok((record.name.clone(), vertical))
    }

    /// Heading plus one link per file the resource references.
    fn resource_body(&mut self, directory: &str, record: &ModuleRecord) -> Result<String> {
        let mut html = format!("<h2>{}</h2>", escape_xml(&record.name));
        for file_id in self.backup.file_refs(directory)? {
            let (url, file_name) = match self.statics.get(&file_id) {
                Some(file) => (file.url.clone(), file.display_name.clone()),
                None => {
                    self.report.diagnose(Diagnostic::MissingStaticFile {
                        file_id,
                        directory: directory.to_string(),
                    });
                    (String::new(), String::new())
                }
            };
            html.push_str(&format!(
                "<p><a href=\"{}\">{}</a></p>",
                escape_xml(&url),
                escape_xml(&file_name)
            ));
        }
        Ok(html)
    }

    /// Export every question of a quiz, one problem vertical each.
    ///
    /// All question ids are looked up before anything is written, so a quiz
    /// that references an unknown question produces no documents.
    pub fn import_quiz(&mut self, directory: &str) -> Result<(String, Vec<Vertical>)> {
        let quiz = self.backup.quiz(directory)?;
        let questions = quiz
            .question_ids
            .iter()
            .map(|id| self.questions.get(id))
            .collect::<Result<Vec<_>>>()?;

        let mut verticals = Vec::with_capacity(questions.len());
        for question in questions {
            let candidate = match self.questions.stem(&question.id) {
                Some(stem) => stem.to_string(),
                None => format!("question_{}", question.id),
            };
            let url_name = self.names.make_url_name(&candidate, "");
            let display_name = question.name.as_deref().unwrap_or(&candidate);
            info!("    --> question: {display_name} ({url_name})");

            let doc = export_question(question, display_name, &url_name)?;
            self.store
                .write_document(DocumentKind::Problem, &doc.url_name, &doc.content)?;
            self.report.problem_documents += 1;
            if doc.ambiguous_answer {
                self.report.diagnose(Diagnostic::AmbiguousAnswer {
                    question_id: question.id.clone(),
                });
            }
            verticals.push(Vertical::problem(&url_name));
        }
        Ok((quiz.name, verticals))
    }
}

fn url_body(record: &ModuleRecord) -> String {
    format!(
        "<p>{}</p><p><a href=\"{}\">{}</a></p>",
        record.intro.as_deref().unwrap_or_default(),
        escape_xml(record.external_url.as_deref().unwrap_or_default()),
        escape_xml(&record.name)
    )
}

/// Position of a sequential in the course tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequentialRef {
    pub chapter: usize,
    pub sequential: usize,
}

/// Walks activities in manifest order and attaches each to the course.
#[derive(Debug, Default)]
pub struct ActivityDispatcher {
    /// Chapter index per section id.
    sections: HashMap<String, usize>,
    /// Sequential that the next url/label/resource/quiz leaf joins.
    current: Option<SequentialRef>,
}

impl ActivityDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import one activity and attach it under its section's chapter.
    ///
    /// Nothing is attached when the import fails; a chapter opened for the
    /// activity's section stays in place.
    pub fn dispatch<S: CourseStore + ?Sized>(
        &mut self,
        ctx: &mut ImportContext<'_, S>,
        course: &mut Course,
        activity: &SourceActivity,
    ) -> Result<()> {
        let chapter = match self.sections.get(&activity.section_id) {
            Some(&index) => index,
            None => self.open_chapter(ctx, course, activity)?,
        };

        let category = &activity.category;
        match category {
            ActivityCategory::Url | ActivityCategory::Label | ActivityCategory::Resource => {
                info!("  --> {category} {} ({})", activity.title, activity.directory);
                let (name, vertical) = ctx.import_module(activity)?;
                let sequential = self.shared_sequential(course, chapter);
                sequential.display_name = Some(name);
                sequential.verticals.push(vertical);
            }
            ActivityCategory::Page => {
                info!("  --> page {} ({})", activity.title, activity.directory);
                let (name, vertical) = ctx.import_module(activity)?;
                let mut sequential = Sequential::named(name);
                sequential.verticals.push(vertical);
                let sequentials = &mut course.chapters[chapter].sequentials;
                sequentials.push(sequential);
                self.current = Some(SequentialRef {
                    chapter,
                    sequential: sequentials.len() - 1,
                });
            }
            ActivityCategory::Quiz => {
                info!("  --> quiz {} ({})", activity.title, activity.directory);
                let (name, verticals) = ctx.import_quiz(&activity.directory)?;
                let sequential = self.shared_sequential(course, chapter);
                // Keep the name a preceding label or page gave the sequential.
                if sequential.display_name.is_none() {
                    sequential.display_name = Some(name);
                }
                sequential.verticals.extend(verticals);
            }
            ActivityCategory::Unknown(name) => {
                ctx.report.diagnose(Diagnostic::UnknownActivity {
                    category: name.clone(),
                    directory: activity.directory.clone(),
                });
            }
        }
        Ok(())
    }

    fn open_chapter<S: CourseStore + ?Sized>(
        &mut self,
        ctx: &mut ImportContext<'_, S>,
        course: &mut Course,
        activity: &SourceActivity,
    ) -> Result<usize> {
        let chapter = ctx.section_chapter(&activity.section_id, &activity.title)?;
        let index = course.chapters.len();
        self.current = (!chapter.sequentials.is_empty()).then_some(SequentialRef {
            chapter: index,
            sequential: 0,
        });
        course.chapters.push(chapter);
        self.sections.insert(activity.section_id.clone(), index);
        Ok(index)
    }

    /// The open sequential of `chapter`, or a new one made current.
    fn shared_sequential<'c>(&mut self, course: &'c mut Course, chapter: usize) -> &'c mut Sequential {
        let at = match self.current {
            Some(at) if at.chapter == chapter => at,
            _ => {
                let sequentials = &mut course.chapters[chapter].sequentials;
                sequentials.push(Sequential::default());
                let at = SequentialRef {
                    chapter,
                    sequential: sequentials.len() - 1,
                };
                self.current = Some(at);
                at
            }
        };
        &mut course.chapters[at.chapter].sequentials[at.sequential]
    }
}
