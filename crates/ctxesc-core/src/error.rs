//! The single error kind of the autoescaping pass.

use std::fmt::Write;
use std::ops::Range;

/// Where an error was found: a byte range in one source, resolved to a
/// line and column, plus the template being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLocation {
    /// Index of the source in the host's source map.
    pub source: u32,
    pub path: String,
    /// 1-based.
    pub line: u32,
    /// 1-based, in characters.
    pub column: u32,
    pub range: Range<usize>,
    pub template: String,
}

/// Autoescaping failed; the message says why and usually how to fix it.
///
/// Errors raised while re-contextualizing a callee are wrapped in a frame
/// naming the callee and the context it was specialized for, so a
/// failure deep in a call chain can be traced back to the call site.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.render_frames())]
pub struct AutoescapeError {
    message: String,
    location: Option<ErrorLocation>,
    cause: Option<Box<AutoescapeError>>,
}

impl AutoescapeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            cause: None,
        }
    }

    /// Attaches `location` unless a more precise one is already known.
    #[must_use]
    pub fn or_located_at(mut self, location: impl FnOnce() -> ErrorLocation) -> Self {
        if self.location.is_none() {
            self.location = Some(location());
        }
        self
    }

    /// Wraps `self` in an outer frame.
    #[must_use]
    pub fn wrapped(self, message: impl Into<String>, location: Option<ErrorLocation>) -> Self {
        Self {
            message: message.into(),
            location,
            cause: Some(Box::new(self)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&ErrorLocation> {
        self.location.as_ref()
    }

    pub fn cause(&self) -> Option<&AutoescapeError> {
        self.cause.as_deref()
    }

    /// The error that started it all.
    pub fn root_cause(&self) -> &AutoescapeError {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }

    /// Every frame, innermost cause first.
    pub fn frames(&self) -> Vec<&AutoescapeError> {
        let mut frames = Vec::new();
        let mut current = Some(self);
        while let Some(frame) = current {
            frames.push(frame);
            current = frame.cause();
        }
        frames.reverse();
        frames
    }

    /// One line per frame, innermost first, joined by `"\n- "`.
    fn render_frames(&self) -> String {
        let mut out = String::new();
        for (i, frame) in self.frames().into_iter().enumerate() {
            if i > 0 {
                out.push_str("\n- ");
            }
            if let Some(loc) = &frame.location {
                let _ = write!(
                    out,
                    "In file {}:{}:{}, template {}: ",
                    loc.path, loc.line, loc.column, loc.template
                );
            }
            out.push_str(&frame.message);
        }
        out
    }
}
