//! The edX course tree: course → chapter → sequential → vertical → leaf.
//!
//! Only the structure lives here; leaf content is stored separately as
//! `html/` and `problem/` documents addressed by the leaf's `url_name`.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::error::Result;

/// Grace period applied to every due date in converted courses.
pub const GRACE_PERIOD: &str = "1 day 5 hours 59 minutes 59 seconds";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Course {
    pub display_name: String,
    /// Sanitized course number.
    pub number: String,
    pub org: String,
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chapter {
    pub display_name: Option<String>,
    pub sequentials: Vec<Sequential>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequential {
    pub display_name: Option<String>,
    pub verticals: Vec<Vertical>,
}

/// A vertical holds exactly one leaf in converted courses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertical {
    pub url_name: Option<String>,
    pub leaf: Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    Html { url_name: String },
    Problem { url_name: String },
}

impl Leaf {
    pub fn url_name(&self) -> &str {
        match self {
            Leaf::Html { url_name } | Leaf::Problem { url_name } => url_name,
        }
    }
}

impl Vertical {
    /// Vertical wrapping an HTML component, named `vert_<url_name>`.
    pub fn html(url_name: &str) -> Self {
        Self {
            url_name: Some(format!("vert_{url_name}")),
            leaf: Leaf::Html {
                url_name: url_name.to_string(),
            },
        }
    }

    pub fn problem(url_name: &str) -> Self {
        Self {
            url_name: None,
            leaf: Leaf::Problem {
                url_name: url_name.to_string(),
            },
        }
    }
}

impl Sequential {
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            verticals: Vec::new(),
        }
    }
}

impl Course {
    pub fn new(display_name: impl Into<String>, number: impl Into<String>, org: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            number: number.into(),
            org: org.into(),
            chapters: Vec::new(),
        }
    }

    /// Every leaf in document order.
    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.chapters
            .iter()
            .flat_map(|c| &c.sequentials)
            .flat_map(|s| &s.verticals)
            .map(|v| &v.leaf)
    }

    /// Serialize the course document (`course/<run>.xml`).
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        let mut course = BytesStart::new("course");
        course.push_attribute(("graceperiod", GRACE_PERIOD));
        course.push_attribute(("display_name", self.display_name.as_str()));
        course.push_attribute(("number", self.number.as_str()));
        course.push_attribute(("org", self.org.as_str()));
        writer.write_event(Event::Start(course))?;

        for chapter in &self.chapters {
            let mut el = BytesStart::new("chapter");
            if let Some(name) = &chapter.display_name {
                el.push_attribute(("display_name", name.as_str()));
            }
            writer.write_event(Event::Start(el))?;

            for seq in &chapter.sequentials {
                let mut el = BytesStart::new("sequential");
                if let Some(name) = &seq.display_name {
                    el.push_attribute(("display_name", name.as_str()));
                }
                writer.write_event(Event::Start(el))?;

                for vert in &seq.verticals {
                    let mut el = BytesStart::new("vertical");
                    if let Some(url_name) = &vert.url_name {
                        el.push_attribute(("url_name", url_name.as_str()));
                    }
                    writer.write_event(Event::Start(el))?;
                    writer.write_event(Event::Empty(leaf_element(&vert.leaf)))?;
                    writer.write_event(Event::End(BytesEnd::new("vertical")))?;
                }

                writer.write_event(Event::End(BytesEnd::new("sequential")))?;
            }

            writer.write_event(Event::End(BytesEnd::new("chapter")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("course")))?;

        let mut out = String::from_utf8(writer.into_inner())?;
        out.push('\n');
        Ok(out)
    }
}

fn leaf_element(leaf: &Leaf) -> BytesStart<'_> {
    match leaf {
        Leaf::Html { url_name } => {
            let mut el = BytesStart::new("html");
            el.push_attribute(("url_name", url_name.as_str()));
            el
        }
        Leaf::Problem { url_name } => {
            let mut el = BytesStart::new("problem");
            el.push_attribute(("url_name", url_name.as_str()));
            el.push_attribute(("rerandomize", "never"));
            el.push_attribute(("showanswer", "attempted"));
            el
        }
    }
}

/// The top-level `course.xml` pointing at `course/<run>.xml`.
pub fn pointer_xml(run: &str, org: &str, number: &str) -> String {
    let mut el = BytesStart::new("course");
    el.push_attribute(("url_name", run));
    el.push_attribute(("org", org));
    el.push_attribute(("course", number));

    let mut writer = Writer::new(Vec::new());
    // Writing into a Vec cannot fail.
    let _ = writer.write_event(Event::Empty(el));
    let mut out = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    out.push('\n');
    out
}
