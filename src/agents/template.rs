//! Prompt templates with named placeholders.
//!
//! Templates are parsed once at startup against the set of placeholders the
//! caller can provide, so a typo like `{qeury}` fails construction instead of
//! rendering a half-filled prompt.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The user's question for this run.
    Query,
    /// Location of the run's uploaded report.
    FilePath,
}

impl Placeholder {
    pub const fn name(self) -> &'static str {
        match self {
            Placeholder::Query => "query",
            Placeholder::FilePath => "file_path",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "query" => Some(Placeholder::Query),
            "file_path" => Some(Placeholder::FilePath),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed placeholder at byte {0}")]
    Unclosed(usize),

    #[error("unknown placeholder {{{0}}}")]
    Unknown(String),

    #[error("placeholder {{{0}}} is not provided in this context")]
    NotProvided(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Slot(Placeholder),
}

/// Values substituted into a template at render time.
#[derive(Debug, Clone, Copy)]
pub struct TemplateValues<'a> {
    pub query: &'a str,
    pub file_path: &'a str,
}

impl TemplateValues<'_> {
    fn get(&self, placeholder: Placeholder) -> &str {
        match placeholder {
            Placeholder::Query => self.query,
            Placeholder::FilePath => self.file_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse `source`, accepting only placeholders listed in `provided`.
    /// `{{` and `}}` render as literal braces.
    pub fn parse(source: &str, provided: &[Placeholder]) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, ch)) = chars.next() {
            match ch {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    text.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::Unclosed(pos));
                    }
                    let placeholder = Placeholder::from_name(name.trim())
                        .ok_or_else(|| TemplateError::Unknown(name.clone()))?;
                    if !provided.contains(&placeholder) {
                        return Err(TemplateError::NotProvided(placeholder.name()));
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Slot(placeholder));
                }
                _ => text.push(ch),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, values: &TemplateValues<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(p) => out.push_str(values.get(*p)),
            }
        }
        out
    }
}
