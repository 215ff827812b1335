//! The preloaded question bank.

use std::collections::HashMap;

use tracing::info;

use super::{ConversionReport, Diagnostic};
use crate::error::{Error, Result};
use crate::moodle::{MoodleBackup, SourceQuestion};

/// Questions keyed by id, with the file stem each one will be exported under.
#[derive(Debug, Default)]
pub struct QuestionBank {
    questions: HashMap<String, SourceQuestion>,
    stems: HashMap<String, String>,
}

impl QuestionBank {
    /// Build the bank from questions in file order.
    ///
    /// Questions without a usable name stay addressable by id but get no
    /// file stem; each one is reported.
    pub fn new(questions: Vec<SourceQuestion>, report: &mut ConversionReport) -> Self {
        let mut bank = Self::default();
        for question in questions {
            match &question.name {
                Some(name) => {
                    bank.stems
                        .insert(question.id.clone(), name.replace(' ', "_").replace('.', "_"));
                }
                None => report.diagnose(Diagnostic::MissingQuestionName {
                    question_id: question.id.clone(),
                }),
            }
            bank.questions.insert(question.id.clone(), question);
        }
        bank
    }

    /// Load `questions.xml`; a backup without one has an empty bank.
    pub fn load(backup: &MoodleBackup, report: &mut ConversionReport) -> Result<Self> {
        match backup.questions() {
            Ok(questions) => Ok(Self::new(questions, report)),
            Err(Error::MissingResource { .. }) => {
                info!("backup has no questions.xml");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Look up a question; an unknown id is an error.
    pub fn get(&self, id: &str) -> Result<&SourceQuestion> {
        self.questions
            .get(id)
            .ok_or_else(|| Error::missing("question", id))
    }

    /// File stem derived from the question name.
    pub fn stem(&self, id: &str) -> Option<&str> {
        self.stems.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moodle::QuestionType;

    fn question(id: &str, name: Option<&str>) -> SourceQuestion {
        SourceQuestion {
            id: id.into(),
            name: name.map(str::to_string),
            qtype: QuestionType::TrueFalse,
            body_html: String::new(),
            answers: Vec::new(),
        }
    }

    #[test]
    fn test_stems_replace_spaces_and_dots() {
        let mut report = ConversionReport::default();
        let bank = QuestionBank::new(vec![question("1", Some("Q 1.a"))], &mut report);
        assert_eq!(bank.stem("1"), Some("Q_1_a"));
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_missing_name_is_reported_but_kept() {
        let mut report = ConversionReport::default();
        let bank = QuestionBank::new(vec![question("7", None)], &mut report);
        assert_eq!(bank.stem("7"), None);
        assert!(bank.get("7").is_ok());
        assert_eq!(
            report.diagnostics,
            vec![Diagnostic::MissingQuestionName {
                question_id: "7".into()
            }]
        );
    }

    #[test]
    fn test_unknown_id_is_error() {
        let bank = QuestionBank::default();
        assert!(matches!(
            bank.get("3"),
            Err(Error::MissingResource { kind: "question", .. })
        ));
    }
}
