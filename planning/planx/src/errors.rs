use std::{
    fmt::{Debug, Display},
    ops::Range,
    sync::Arc,
};

use crate::pddl::input::Input;
use annotate_snippets::*;
use itertools::Itertools;

pub type Res<T> = Result<T, Message>;

pub type SrcRange = Range<usize>;

/// A substring of a file, with metadata for displaying (filename, indices, ...)
#[derive(Clone)]
pub struct Span {
    input: Arc<Input>,
    span: SrcRange,
}

impl Span {
    /// Span covering the bytes `first..=last` of the input.
    pub fn new(input: Arc<Input>, first: usize, last: usize) -> Self {
        Span {
            input,
            span: first..(last + 1),
        }
    }

    pub fn str(&self) -> &str {
        &self.input.text[self.span.clone()]
    }

    /// Reduces the span to its last byte.
    pub fn end(self) -> Self {
        let last = self.span.end.saturating_sub(1).max(self.span.start);
        Self {
            input: self.input,
            span: last..(last + 1),
        }
    }

    pub fn annotate(&self, primary: bool, message: impl ToString) -> Annot {
        Annot {
            primary,
            span: self.clone(),
            message: message.to_string(),
        }
    }

    pub fn error(&self, message: impl ToString) -> Annot {
        self.annotate(true, message)
    }

    pub fn info(&self, message: impl ToString) -> Annot {
        self.annotate(false, message)
    }

    pub fn invalid(&self, msg: impl ToString) -> Message {
        let msg = msg.to_string();
        // no explicit title, derive it from the message, including the source text when it is short
        let title = if self.span.len() < 60 {
            format!("{msg}: {}", self.str())
        } else {
            msg.clone()
        };
        Message::error(title).snippet(self.error(msg))
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[span]")
    }
}

/// An element that may be traced back to a location in a source file.
pub trait Spanned: Display {
    fn span(&self) -> Option<&Span>;

    fn span_or_default(&self) -> Span {
        self.span().cloned().unwrap_or_else(|| {
            let text = self.to_string();
            let span = 0..text.len();
            Span {
                input: Arc::new(Input::from_string(text)),
                span,
            }
        })
    }

    fn loc(&self) -> Span {
        self.span_or_default()
    }

    fn invalid(&self, msg: impl ToString) -> Message {
        self.span_or_default().invalid(msg)
    }

    fn error(&self, message: impl ToString) -> Annot {
        self.span_or_default().error(message)
    }

    fn info(&self, message: impl ToString) -> Annot {
        self.span_or_default().info(message)
    }
}

impl<T: Spanned> Spanned for &T {
    fn span(&self) -> Option<&Span> {
        (*self).span()
    }
}

/// Annotation of a span, with a label.
pub struct Annot {
    primary: bool,
    span: Span,
    message: String,
}

impl Annot {
    fn build_annot(&self) -> Annotation<'_> {
        let kind = if self.primary {
            AnnotationKind::Primary
        } else {
            AnnotationKind::Context
        };
        kind.span(self.span.span.clone()).label(&self.message)
    }
}

/// A diagnostic, rendered with all annotated source snippets.
pub struct Message {
    level: Level<'static>,
    title: String,
    snippets: Vec<Annot>,
}

impl Message {
    #[cold]
    pub fn new(level: Level<'static>, title: impl ToString) -> Self {
        Self {
            level,
            title: title.to_string(),
            snippets: Vec::new(),
        }
    }

    #[cold]
    pub fn error(title: impl ToString) -> Self {
        Self::new(Level::ERROR, title)
    }

    #[cold]
    pub fn snippet(mut self, snippet: Annot) -> Self {
        self.snippets.push(snippet);
        self
    }

    #[cold]
    pub fn info(self, s: impl Spanned, msg: &str) -> Message {
        let annot = s.info(msg);
        self.snippet(annot)
    }

    #[cold]
    pub fn title(mut self, s: impl ToString) -> Message {
        self.title = s.to_string();
        self
    }

    pub fn get_title(&self) -> &str {
        &self.title
    }

    #[cold]
    pub fn failed<T>(self) -> Result<T, Message> {
        Err(self)
    }
}

pub trait Ctx<T> {
    fn title(self, error_context: impl Display) -> Result<T, Message>;
}
impl<T> Ctx<T> for Result<T, Message> {
    fn title(self, error_context: impl Display) -> Result<T, Message> {
        self.map_err(|e| e.title(error_context))
    }
}
impl<T> Ctx<T> for Option<T> {
    fn title(self, msg: impl Display) -> Result<T, Message> {
        self.ok_or_else(|| Message::error(msg))
    }
}

pub trait ErrorMessageExt<T> {
    /// Adds an informative annotation to the error, if any.
    fn tag(self, tagged: impl Spanned, tag: impl ToString) -> Result<T, Message>;
}

impl<T> ErrorMessageExt<T> for Result<T, Message> {
    fn tag(self, tagged: impl Spanned, tag: impl ToString) -> Result<T, Message> {
        self.map_err(|m| m.snippet(tagged.info(tag)))
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // one snippet per source file, holding all annotations on this file
        let snippets_by_source = self.snippets.iter().into_group_map_by(|s| &s.span.input);
        let snippets = snippets_by_source
            .iter()
            .map(|(source, annots)| {
                let snippet = Snippet::source(&source.text).line_start(1).fold(true);
                let snippet = if let Some(file) = source.source.as_ref() {
                    snippet.path(file.as_str())
                } else {
                    snippet
                };
                snippet.annotations(annots.iter().map(|a| a.build_annot()))
            })
            .collect_vec();

        let renderer = Renderer::styled();
        let disp = self.level.clone().primary_title(&self.title).elements(snippets);
        let disp = renderer.render(&[disp]);
        f.write_str(&disp)
    }
}
impl Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for Message {}

impl From<std::io::Error> for Message {
    #[cold]
    fn from(error: std::io::Error) -> Self {
        Message::error(error)
    }
}

impl From<crate::ObjectError> for Message {
    #[cold]
    fn from(error: crate::ObjectError) -> Self {
        match &error {
            crate::ObjectError::DuplicateObjectDeclaration(name, previous) => {
                name.invalid(&error).info(previous, "previously declared here")
            }
            crate::ObjectError::UnknownObject(name) => name.invalid(&error),
        }
    }
}

impl From<crate::TypeError> for Message {
    #[cold]
    fn from(error: crate::TypeError) -> Self {
        match &error {
            crate::TypeError::UnknownType(name) => name.invalid(&error),
            crate::TypeError::CyclicType(name) => name.invalid(&error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sym;

    #[test]
    fn located_messages() {
        let input = Arc::new(Input::from_string("(at ball1 rooma)"));
        let sym = Sym::with_source("ball1", Span::new(input, 4, 8));
        let msg = sym.invalid("unknown object");
        assert_eq!(msg.get_title(), "unknown object: ball1");
        let rendered = msg.to_string();
        assert!(rendered.contains("unknown object"));

        let renamed: Res<()> = Err(msg);
        let renamed = renamed.title("Invalid problem");
        assert_eq!(renamed.err().map(|m| m.get_title().to_string()).as_deref(), Some("Invalid problem"));
    }

    #[test]
    fn unlocated_messages() {
        let sym = Sym::from("truck");
        let msg = sym.invalid("unknown type");
        assert_eq!(msg.get_title(), "unknown type: truck");
        let none: Option<u32> = None;
        assert!(none.title("missing").is_err());
    }
}
