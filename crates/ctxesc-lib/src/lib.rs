//! ctxesc: contextual autoescaping for a Closure-style template language.
//!
//! Parses templates, infers where in an HTML document every dynamic value
//! lands, and rewrites each print with the escaping directives that make
//! it safe there.
//!
//! # Example
//!
//! ```
//! use ctxesc_lib::{Autoescaper, SourceMap, tree::print_templates};
//!
//! let sources = SourceMap::inline(
//!     "{namespace ns}\n{template .t autoescape=\"deprecated-contextual\"}<a href=\"{$x}\">{/template}",
//! );
//! let out = Autoescaper::default().run_sources(&sources).expect("autoescapes");
//! assert!(print_templates(&out.templates.templates).contains("{$x |filterNormalizeUri |escapeHtmlAttribute}"));
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod diagnostics;
pub mod infer;
pub mod source_map;
pub mod tree;

mod invariants;
mod rewrite;

#[cfg(test)]
mod source_map_tests;

pub use ctxesc_core::{
    AutoescapeError, AutoescapeMode, ContentKind, Context, ErrorLocation, EscapingMode, SlicedText,
};
pub use diagnostics::ErrorPrinter;
pub use infer::{
    Autoescaped, Autoescaper, AutoescaperConfig, DEFAULT_RECONTEXTUALIZATION_FUEL, derived_name,
};
pub use source_map::{SourceId, SourceMap};
pub use tree::{ParseError, TemplateSet, parse};

/// Errors of a full parse-and-autoescape run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A template file is malformed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The templates parsed but cannot be escaped safely.
    #[error(transparent)]
    Autoescape(#[from] AutoescapeError),
}

/// Result type for pass runs.
pub type Result<T> = std::result::Result<T, Error>;
