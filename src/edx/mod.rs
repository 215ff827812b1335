//! Building edX XML courses.
//!
//! An edX course directory holds:
//! - `course.xml`: a pointer to the course run document
//! - `course/<run>.xml`: the chapter/sequential/vertical tree
//! - `html/<url_name>.xml` and `problem/<url_name>.xml`: leaf content
//! - `static/`: uploaded files

pub mod course;
pub mod names;
pub mod problem;
pub mod rewrite;
pub mod store;
pub mod text;
pub mod xml;

pub use course::{Chapter, Course, GRACE_PERIOD, Leaf, Sequential, Vertical, pointer_xml};
pub use names::NameRegistry;
pub use problem::{AnswerWidget, ProblemDocument, export_question};
pub use rewrite::{HtmlDocument, PageLinkResolver, fix_math, render_html};
pub use store::{CourseStore, DirStore, DocumentKind, MemoryStore};
pub use text::html_to_text;
