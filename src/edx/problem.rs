//! Conversion of Moodle questions into edX problem documents.

use tracing::warn;

use super::rewrite::{close_void_elements, fix_math, numeric_char_refs};
use super::text::html_to_text;
use super::xml::{check_well_formed, escape_xml, pretty_print};
use crate::error::Result;
use crate::moodle::{QuestionType, SourceQuestion};

/// Gradable answer element of a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerWidget {
    /// Drop-down with a single expected option (true/false questions).
    Option {
        options: Vec<String>,
        expected: Option<usize>,
    },
    /// Radio-button choice list with a single correct choice.
    MultipleChoice {
        options: Vec<String>,
        expected: Option<usize>,
    },
}

impl AnswerWidget {
    /// Build the widget for a question, or `None` for unsupported types.
    pub fn for_question(question: &SourceQuestion) -> Option<Self> {
        let options = |nbsp: bool| -> Vec<String> {
            question
                .answers
                .iter()
                .map(|a| {
                    let text = if nbsp {
                        a.text.replace('\u{a0}', " ")
                    } else {
                        a.text.clone()
                    };
                    text.replace('"', "'")
                })
                .collect()
        };
        let expected = question.answers.iter().position(|a| a.is_correct());

        match question.qtype {
            QuestionType::TrueFalse => Some(Self::Option {
                options: options(false),
                expected,
            }),
            QuestionType::MultiChoice => Some(Self::MultipleChoice {
                options: options(true),
                expected,
            }),
            QuestionType::Other(_) => None,
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            Self::Option { options, .. } | Self::MultipleChoice { options, .. } => options,
        }
    }

    /// Text of the expected option; empty when no answer is fully correct.
    pub fn expected(&self) -> &str {
        let (Self::Option { options, expected } | Self::MultipleChoice { options, expected }) =
            self;
        expected
            .and_then(|i| options.get(i))
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn to_xml(&self) -> String {
        match self {
            Self::Option { options, .. } => {
                let list = options
                    .iter()
                    .map(|o| format!("'{o}'"))
                    .collect::<Vec<_>>()
                    .join(",");
                format!(
                    "<optionresponse><optioninput options=\"{}\" correct=\"{}\"/></optionresponse>",
                    escape_xml(&format!("({list})")),
                    escape_xml(self.expected())
                )
            }
            Self::MultipleChoice { options, expected } => {
                let mut xml = String::from(
                    "<multiplechoiceresponse><choicegroup type=\"MultipleChoice\">",
                );
                for (i, option) in options.iter().enumerate() {
                    xml.push_str(&format!(
                        "<choice correct=\"{}\">{}</choice>",
                        *expected == Some(i),
                        escape_xml(option)
                    ));
                }
                xml.push_str("</choicegroup></multiplechoiceresponse>");
                xml
            }
        }
    }
}

/// A serialized problem ready to be stored as `problem/<url_name>.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDocument {
    pub url_name: String,
    pub content: String,
    /// More than one answer earns full credit; the first one is expected.
    pub ambiguous_answer: bool,
}

/// Number of answers that earn full credit.
pub fn correct_answer_count(question: &SourceQuestion) -> usize {
    question.answers.iter().filter(|a| a.is_correct()).count()
}

/// Convert one question into a problem document.
pub fn export_question(
    question: &SourceQuestion,
    display_name: &str,
    url_name: &str,
) -> Result<ProblemDocument> {
    let mut xml = format!("<problem display_name=\"{}\">", escape_xml(display_name));
    xml.push_str("<text>");
    xml.push_str(&question_body(question));
    xml.push_str("</text>");

    if let Some(widget) = AnswerWidget::for_question(question) {
        xml.push_str(&widget.to_xml());
    }
    xml.push_str("</problem>");

    Ok(ProblemDocument {
        url_name: url_name.to_string(),
        content: pretty_print(&xml)?,
        ambiguous_answer: correct_answer_count(question) > 1,
    })
}

/// Question text as an `<html>` element, falling back to plain text when the
/// markup is not well-formed XML.
fn question_body(question: &SourceQuestion) -> String {
    let body = format!(
        "<html>{}</html>",
        close_void_elements(&fix_math(&numeric_char_refs(&question.body_html)))
    );
    if check_well_formed(&body).is_ok() {
        return body;
    }

    warn!(
        question = %question.id,
        "question text is not well-formed markup, keeping plain text only"
    );
    let text = html_to_text(&fix_math(&question.body_html));
    let paragraphs: String = text
        .lines()
        .map(|line| format!("<p>{}</p>", escape_xml(line)))
        .collect();
    format!("<html>{paragraphs}</html>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moodle::Answer;

    fn question(qtype: QuestionType, body: &str, answers: &[(&str, f64)]) -> SourceQuestion {
        SourceQuestion {
            id: "1".into(),
            name: Some("Q".into()),
            qtype,
            body_html: body.into(),
            answers: answers
                .iter()
                .map(|(text, fraction)| Answer {
                    text: text.to_string(),
                    fraction: *fraction,
                })
                .collect(),
        }
    }

    #[test]
    fn test_truefalse_widget() {
        let q = question(
            QuestionType::TrueFalse,
            "Is it?",
            &[("True", 1.0), ("False", 0.0)],
        );
        let widget = AnswerWidget::for_question(&q).unwrap();
        assert_eq!(widget.expected(), "True");
        assert_eq!(widget.options(), ["True", "False"]);
        assert_eq!(
            widget.to_xml(),
            "<optionresponse><optioninput options=\"(&apos;True&apos;,&apos;False&apos;)\" \
             correct=\"True\"/></optionresponse>"
        );
    }

    #[test]
    fn test_multichoice_widget() {
        let q = question(
            QuestionType::MultiChoice,
            "Pick",
            &[("a\u{a0}b", 0.0), ("say \"hi\"", 1.0)],
        );
        let widget = AnswerWidget::for_question(&q).unwrap();
        assert_eq!(widget.options(), ["a b", "say 'hi'"]);
        assert_eq!(widget.expected(), "say 'hi'");
        assert_eq!(
            widget.to_xml(),
            "<multiplechoiceresponse><choicegroup type=\"MultipleChoice\">\
             <choice correct=\"false\">a b</choice>\
             <choice correct=\"true\">say &apos;hi&apos;</choice>\
             </choicegroup></multiplechoiceresponse>"
        );
    }

    #[test]
    fn test_first_full_credit_answer_wins() {
        let q = question(
            QuestionType::MultiChoice,
            "Pick",
            &[("A", 1.0), ("B", 1.0), ("C", 0.0)],
        );
        assert_eq!(AnswerWidget::for_question(&q).unwrap().expected(), "A");
        let doc = export_question(&q, "Q", "q").unwrap();
        assert!(doc.ambiguous_answer);
    }

    #[test]
    fn test_partial_credit_is_not_expected() {
        let q = question(QuestionType::TrueFalse, "x", &[("True", 0.5), ("False", 0.0)]);
        assert_eq!(AnswerWidget::for_question(&q).unwrap().expected(), "");
    }

    #[test]
    fn test_other_types_have_no_widget() {
        let q = question(QuestionType::Other("essay".into()), "Write", &[]);
        assert!(AnswerWidget::for_question(&q).is_none());
        let doc = export_question(&q, "Essay", "essay").unwrap();
        assert!(!doc.content.contains("response"));
        assert!(doc.content.contains("<html>Write</html>"));
    }

    #[test]
    fn test_export_truefalse_document() {
        let q = question(
            QuestionType::TrueFalse,
            "<p>Energy is $$E=mc^2$$</p>",
            &[("True", 1.0), ("False", 0.0)],
        );
        let doc = export_question(&q, "Energy", "Energy_q").unwrap();
        assert_eq!(doc.url_name, "Energy_q");
        assert!(!doc.ambiguous_answer);
        assert!(doc.content.starts_with("<problem display_name=\"Energy\">"));
        assert!(doc.content.contains("<p>Energy is [mathjax]E=mc^2[/mathjax]</p>"));
        assert!(doc.content.contains("<optionresponse>"));
        assert!(doc.content.contains("correct=\"True\""));
    }

    #[test]
    fn test_void_elements_are_closed_in_body() {
        let q = question(QuestionType::Other("x".into()), "line<br>next", &[]);
        let doc = export_question(&q, "Q", "q").unwrap();
        assert!(doc.content.contains("line<br/>next"));
    }

    #[test]
    fn test_html_entities_become_character_refs() {
        let q = question(
            QuestionType::TrueFalse,
            "<p>Is 1&nbsp;+&nbsp;1 = 2?</p>",
            &[("True", 1.0), ("False", 0.0)],
        );
        let doc = export_question(&q, "Q", "q").unwrap();
        assert!(doc.content.contains("<p>Is 1&#160;+&#160;1 = 2?</p>"));
        assert!(!doc.content.contains("&nbsp;"));
    }

    #[test]
    fn test_malformed_body_falls_back_to_text() {
        let q = question(QuestionType::Other("x".into()), "<p>open <b>bold</p>", &[]);
        let doc = export_question(&q, "Q", "q").unwrap();
        assert!(doc.content.contains("<p>open bold</p>"));
    }
}
