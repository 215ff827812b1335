//! Typed records read from a Moodle backup.
//!
//! Every record is parsed once from its XML file and never mutated.

use std::fmt;

use super::xml::XmlElement;
use crate::error::{Error, Result};

/// Value Moodle writes for an unset field.
pub const NULL_MARKER: &str = "$@NULL@$";

/// Returns the text unless it is empty or the null marker.
pub(crate) fn non_null(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty() && *t != NULL_MARKER)
}

/// Module type of an activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityCategory {
    Url,
    Label,
    Resource,
    Page,
    Quiz,
    Unknown(String),
}

impl ActivityCategory {
    pub fn from_modulename(name: &str) -> Self {
        match name {
            "url" => Self::Url,
            "label" => Self::Label,
            "resource" => Self::Resource,
            "page" => Self::Page,
            "quiz" => Self::Quiz,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// File inside the activity directory holding the module record.
    pub fn record_file(&self) -> Option<&'static str> {
        match self {
            Self::Url => Some("url.xml"),
            Self::Label => Some("label.xml"),
            Self::Resource => Some("resource.xml"),
            Self::Page => Some("page.xml"),
            Self::Quiz => Some("quiz.xml"),
            Self::Unknown(_) => None,
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => f.write_str("url"),
            Self::Label => f.write_str("label"),
            Self::Resource => f.write_str("resource"),
            Self::Page => f.write_str("page"),
            Self::Quiz => f.write_str("quiz"),
            Self::Unknown(name) => f.write_str(name),
        }
    }
}

/// One activity listed in the backup manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceActivity {
    /// Directory relative to the backup root, e.g. `activities/page_12`.
    pub directory: String,
    pub title: String,
    pub category: ActivityCategory,
    pub section_id: String,
}

impl SourceActivity {
    pub(crate) fn from_xml(el: &XmlElement) -> Result<Self> {
        Ok(Self {
            directory: el.require_text("directory")?.trim().to_string(),
            title: el.text_of("title").unwrap_or_default().trim().to_string(),
            category: ActivityCategory::from_modulename(el.require_text("modulename")?.trim()),
            section_id: el.require_text("sectionid")?.trim().to_string(),
        })
    }
}

pub fn basename(directory: &str) -> &str {
    directory
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(directory)
}

/// Top-level course information from `moodle_backup.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub fullname: String,
    pub shortname: String,
    pub activities: Vec<SourceActivity>,
}

impl Manifest {
    pub(crate) fn from_xml(root: &XmlElement) -> Result<Self> {
        let info = root
            .find("information")
            .ok_or_else(|| Error::MissingElement("<information> in moodle_backup.xml".into()))?;
        let fullname = info.require_text("original_course_fullname")?.to_string();
        let shortname = info.require_text("original_course_shortname")?.to_string();

        let contents = info
            .find("contents")
            .ok_or_else(|| Error::MissingElement("<contents> in moodle_backup.xml".into()))?;
        let activities = contents
            .find_all("activity")
            .into_iter()
            .map(SourceActivity::from_xml)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            fullname,
            shortname,
            activities,
        })
    }
}

/// A course section (chapter grouping).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSection {
    pub id: String,
    pub name: Option<String>,
    pub summary_html: Option<String>,
}

impl SourceSection {
    pub(crate) fn from_xml(id: &str, root: &XmlElement) -> Self {
        Self {
            id: id.to_string(),
            name: non_null(root.text_of("name")).map(str::to_string),
            summary_html: non_null(root.text_of("summary")).map(str::to_string),
        }
    }
}

/// The course's own record from `course/course.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseHead {
    pub shortname: String,
    pub summary_html: Option<String>,
}

impl CourseHead {
    pub(crate) fn from_xml(root: &XmlElement) -> Self {
        Self {
            shortname: root.text_of("shortname").unwrap_or_default().to_string(),
            summary_html: non_null(root.text_of("summary")).map(str::to_string),
        }
    }
}

/// Module record of a url, label, resource or page activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRecord {
    /// First line of the module name, trimmed.
    pub name: String,
    pub intro: Option<String>,
    /// Page body (`page.xml` only).
    pub content: Option<String>,
    /// Link target (`url.xml` only).
    pub external_url: Option<String>,
}

impl ModuleRecord {
    pub(crate) fn from_xml(root: &XmlElement) -> Result<Self> {
        let name = root
            .require_text("name")?
            .trim()
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Self {
            name,
            intro: non_null(root.text_of("intro")).map(str::to_string),
            content: non_null(root.text_of("content")).map(str::to_string),
            external_url: non_null(root.text_of("externalurl")).map(str::to_string),
        })
    }
}

/// Quiz record: its name and the ids of the questions it uses, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizRecord {
    pub name: String,
    pub question_ids: Vec<String>,
}

impl QuizRecord {
    pub(crate) fn from_xml(root: &XmlElement) -> Result<Self> {
        let name = root.require_text("name")?.trim().to_string();
        // Older backups use <question>, newer ones <questionid>.
        let question_ids = root
            .find_all("question_instance")
            .into_iter()
            .filter_map(|inst| {
                non_null(inst.child("question").map(XmlElement::text))
                    .or_else(|| non_null(inst.child("questionid").map(XmlElement::text)))
            })
            .map(|id| id.trim().to_string())
            .collect();
        Ok(Self { name, question_ids })
    }
}

/// Question type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionType {
    TrueFalse,
    MultiChoice,
    Other(String),
}

impl QuestionType {
    pub fn from_qtype(qtype: &str) -> Self {
        match qtype {
            "truefalse" => Self::TrueFalse,
            "multichoice" => Self::MultiChoice,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One answer option of a question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Fraction of full credit this answer earns.
    pub fraction: f64,
}

impl Answer {
    pub fn is_correct(&self) -> bool {
        self.fraction == 1.0
    }
}

/// A question from the backup's question bank.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuestion {
    pub id: String,
    /// Question name; `None` when the record has no usable name.
    pub name: Option<String>,
    pub qtype: QuestionType,
    pub body_html: String,
    pub answers: Vec<Answer>,
}

impl SourceQuestion {
    pub(crate) fn from_xml(id: &str, el: &XmlElement) -> Self {
        let answers = el
            .find_all("answer")
            .into_iter()
            .map(|answer| Answer {
                text: answer.text_of("answertext").unwrap_or_default().to_string(),
                fraction: answer
                    .text_of("fraction")
                    .and_then(|f| f.trim().parse().ok())
                    .unwrap_or(0.0),
            })
            .collect();

        Self {
            id: id.to_string(),
            name: non_null(el.child("name").map(XmlElement::text)).map(str::to_string),
            qtype: QuestionType::from_qtype(el.text_of("qtype").unwrap_or_default().trim()),
            body_html: el.text_of("questiontext").unwrap_or_default().to_string(),
            answers,
        }
    }
}

/// One entry of `files.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFileRecord {
    pub id: String,
    pub original_name: String,
    pub content_hash: String,
    pub mime_type: String,
}

impl StaticFileRecord {
    pub(crate) fn from_xml(el: &XmlElement) -> Result<Self> {
        let id = el
            .attr("id")
            .ok_or_else(|| Error::MissingElement("id attribute on <file>".into()))?;
        Ok(Self {
            id: id.to_string(),
            original_name: el.require_text("filename")?.to_string(),
            content_hash: el.require_text("contenthash")?.trim().to_string(),
            mime_type: el.text_of("mimetype").unwrap_or_default().to_string(),
        })
    }
}
