//! Builder-pattern printer for rendering errors.

use std::fmt::Write;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};
use ctxesc_core::AutoescapeError;
use indexmap::IndexMap;

use crate::Error;
use crate::source_map::{SourceId, SourceMap};
use crate::tree::ParseError;

/// Builder for rendering an [`Error`] with various options.
///
/// Without sources the error's own `Display` is used. With sources, every
/// located frame is drawn under the source line it points at.
pub struct ErrorPrinter<'e, 's> {
    error: &'e Error,
    sources: Option<&'s SourceMap>,
    colored: bool,
}

impl<'e, 's> ErrorPrinter<'e, 's> {
    pub fn new(error: &'e Error) -> Self {
        Self {
            error,
            sources: None,
            colored: false,
        }
    }

    pub fn sources(mut self, sources: &'s SourceMap) -> Self {
        self.sources = Some(sources);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.format(&mut out);
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let Some(sources) = self.sources else {
            return self.format_plain(w);
        };

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        match self.error {
            Error::Parse(err) => format_parse_error(w, &renderer, err, sources),
            Error::Autoescape(err) if has_known_location(err, sources) => {
                format_autoescape_error(w, &renderer, err, sources)
            }
            Error::Autoescape(_) => self.format_plain(w),
        }
    }

    fn format_plain(&self, w: &mut impl Write) -> std::fmt::Result {
        write!(w, "{}", self.error)
    }
}

fn format_parse_error(
    w: &mut impl Write,
    renderer: &Renderer,
    err: &ParseError,
    sources: &SourceMap,
) -> std::fmt::Result {
    let source = sources.get(err.span.source);
    let snippet = Snippet::source(source.content)
        .line_start(1)
        .path(source.kind.display_name())
        .annotation(
            AnnotationKind::Primary.span(adjust_range(err.span.range(), source.content.len())),
        );

    let report = vec![Level::ERROR.primary_title(err.message.as_str()).element(snippet)];
    write!(w, "{}", renderer.render(&report))
}

/// The innermost frame is the primary annotation; frames added while
/// unwinding through calls annotate the call sites.
fn format_autoescape_error(
    w: &mut impl Write,
    renderer: &Renderer,
    err: &AutoescapeError,
    sources: &SourceMap,
) -> std::fmt::Result {
    let frames = err.frames();
    let primary_label = frames
        .first()
        .and_then(|frame| frame.location())
        .map(|loc| format!("in template {}", loc.template));

    let mut by_source: IndexMap<u32, Vec<(usize, &AutoescapeError)>> = IndexMap::new();
    for (i, &frame) in frames.iter().enumerate() {
        if let Some(loc) = frame.location()
            && (loc.source as usize) < sources.len()
        {
            by_source.entry(loc.source).or_default().push((i, frame));
        }
    }

    let mut snippets = Vec::new();
    for (&source, located) in &by_source {
        let source = sources.get(SourceId(source));
        let limit = source.content.len();
        let mut snippet = Snippet::source(source.content)
            .line_start(1)
            .path(source.kind.display_name());
        for &(i, frame) in located {
            let Some(loc) = frame.location() else {
                continue;
            };
            let range = adjust_range(loc.range.clone(), limit);
            let annotation = if i == 0 {
                let annotation = AnnotationKind::Primary.span(range);
                match &primary_label {
                    Some(label) => annotation.label(label.as_str()),
                    None => annotation,
                }
            } else {
                AnnotationKind::Context
                    .span(range)
                    .label(frame.message().trim_end_matches(':'))
            };
            snippet = snippet.annotation(annotation);
        }
        snippets.push(snippet);
    }

    let mut snippets = snippets.into_iter();
    let Some(first) = snippets.next() else {
        return write!(w, "{err}");
    };
    let title = Level::ERROR
        .primary_title(err.root_cause().message())
        .element(first);
    let report = vec![snippets.fold(title, |group, snippet| group.element(snippet))];
    write!(w, "{}", renderer.render(&report))
}

fn has_known_location(err: &AutoescapeError, sources: &SourceMap) -> bool {
    err.frames()
        .iter()
        .filter_map(|frame| frame.location())
        .any(|loc| (loc.source as usize) < sources.len())
}

fn adjust_range(range: Range<usize>, limit: usize) -> Range<usize> {
    let start = range.start.min(limit);
    let end = range.end.min(limit);

    if start == end {
        return start..(start + 1).min(limit);
    }

    start..end
}
