//! Core of the ctxesc contextual autoescaper.
//!
//! Knows nothing about templates. Provides:
//! - [`Context`]: where a byte of output lands across HTML, CSS, JS and URI
//! - [`escaping_modes_for`]: which sanitizers make a value safe there
//! - [`process_raw_text`]: how literal text moves the context along
//! - [`Context::union`]: how contexts from divergent branches merge
//!
//! ```
//! use ctxesc_core::{Context, EscapingMode, escaping_modes_for, process_raw_text};
//!
//! let sliced = process_raw_text("<a href=\"", Context::HTML_PCDATA).unwrap();
//! let modes = escaping_modes_for(&sliced.end_context()).unwrap();
//! assert_eq!(
//!     modes,
//!     [EscapingMode::FilterNormalizeUri, EscapingMode::EscapeHtmlAttribute]
//! );
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod context;
pub mod escaping;
pub mod raw_text;
pub mod sliced;

mod error;
mod invariants;

#[cfg(test)]
mod escaping_tests;

pub use context::{
    AttributeEndDelimiter, AttributeType, Context, ElementType, JsFollowingSlash,
    ParseContextError, State, UriPart, UriType,
};
pub use error::{AutoescapeError, ErrorLocation};
pub use escaping::{AutoescapeMode, ContentKind, EscapingMode, escaping_modes_for};
pub use raw_text::{advance, process_raw_text};
pub use sliced::{SlicedText, TextSlice};
