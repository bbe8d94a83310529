//! Textual form of contexts: `(Context JS_DQ_STRING SCRIPT DOUBLE_QUOTE)`.

use std::fmt;
use std::str::FromStr;

use super::{
    AttributeEndDelimiter, AttributeType, Context, ElementType, JsFollowingSlash, State, UriPart,
    UriType,
};

const NEST_DEPTH_PREFIX: &str = "templateNestDepth=";

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(Context {}", self.state.name())?;
        if self.element_type != ElementType::None {
            write!(f, " {}", self.element_type.name())?;
        }
        if self.attribute_type != AttributeType::None {
            write!(f, " {}", self.attribute_type.name())?;
        }
        if self.delimiter != AttributeEndDelimiter::None {
            write!(f, " {}", self.delimiter.name())?;
        }
        if self.slash != JsFollowingSlash::None {
            write!(f, " {}", self.slash.name())?;
        }
        if self.uri_part != UriPart::None {
            write!(f, " {}", self.uri_part.name())?;
        }
        if self.uri_type != UriType::None {
            write!(f, " {}", self.uri_type.name())?;
        }
        if self.template_nest_depth != 0 {
            write!(f, " {NEST_DEPTH_PREFIX}{}", self.template_nest_depth)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseContextError {
    #[error("empty context")]
    Empty,
    #[error("unknown state `{0}`")]
    UnknownState(String),
    #[error("unrecognized context field `{0}`")]
    UnknownField(String),
    #[error("context field `{0}` given twice")]
    DuplicateField(String),
    #[error("URI part without a URI type")]
    UriPartWithoutType,
}

/// Parses the space-separated field names written by `Display`, with or
/// without the `(Context ...)` wrapper.
///
/// Several names (`SCRIPT`, `STYLE`, `NORMAL`, `MEDIA`) belong to more than
/// one field. Fields appear in display order, so each reading assigns names
/// to strictly increasing fields; the first reading in which an attribute
/// type appears exactly when an attribute is being scanned wins.
impl FromStr for Context {
    type Err = ParseContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let body = s
            .strip_prefix("(Context")
            .and_then(|rest| rest.strip_suffix(')'))
            .unwrap_or(s);
        let mut words = body.split_whitespace();

        let state_name = words.next().ok_or(ParseContextError::Empty)?;
        let state = State::from_name(state_name)
            .ok_or_else(|| ParseContextError::UnknownState(state_name.to_owned()))?;

        let mut depth = None;
        let mut names = Vec::new();
        for word in words {
            match word.strip_prefix(NEST_DEPTH_PREFIX) {
                Some(n) => {
                    if depth.is_some() {
                        return Err(ParseContextError::DuplicateField(word.to_owned()));
                    }
                    let n = n
                        .parse()
                        .map_err(|_| ParseContextError::UnknownField(word.to_owned()))?;
                    depth = Some(n);
                }
                None => names.push(word),
            }
        }

        let mut fields = [0; FIELD_COUNT];
        let mut first_valid = None;
        let mut any_reading = false;
        assign(&names, 0, &mut fields, &mut |fields| {
            any_reading = true;
            let candidate = build(state, fields, depth.unwrap_or(0));
            if first_valid.is_none() && candidate.is_some_and(|c| scans_attribute(&c)) {
                first_valid = candidate;
            }
        });

        if let Some(context) = first_valid {
            return Ok(context);
        }
        if !any_reading {
            let unknown = names
                .iter()
                .find(|w| (0..FIELD_COUNT).all(|slot| field_bits(slot, w).is_none()))
                .or(names.last())
                .copied()
                .unwrap_or_default();
            return Err(ParseContextError::UnknownField(unknown.to_owned()));
        }
        // Every reading is inconsistent; fall back to the first well-formed one.
        let mut fallback = None;
        assign(&names, 0, &mut fields, &mut |fields| {
            if fallback.is_none() {
                fallback = build(state, fields, depth.unwrap_or(0));
            }
        });
        fallback.ok_or(ParseContextError::UriPartWithoutType)
    }
}

const FIELD_COUNT: usize = 6;

fn field_bits(slot: usize, name: &str) -> Option<u32> {
    match slot {
        0 => ElementType::from_name(name).map(|v| v as u32),
        1 => AttributeType::from_name(name).map(|v| v as u32),
        2 => AttributeEndDelimiter::from_name(name).map(|v| v as u32),
        3 => JsFollowingSlash::from_name(name).map(|v| v as u32),
        4 => UriPart::from_name(name).map(|v| v as u32),
        5 => UriType::from_name(name).map(|v| v as u32),
        _ => None,
    }
}

/// Enumerates every assignment of `names` to strictly increasing fields.
fn assign(
    names: &[&str],
    min_slot: usize,
    fields: &mut [u32; FIELD_COUNT],
    visit: &mut dyn FnMut(&[u32; FIELD_COUNT]),
) {
    let Some((name, rest)) = names.split_first() else {
        visit(fields);
        return;
    };
    for slot in min_slot..FIELD_COUNT {
        if let Some(bits) = field_bits(slot, name) {
            fields[slot] = bits;
            assign(rest, slot + 1, fields, visit);
            fields[slot] = 0;
        }
    }
}

fn build(state: State, fields: &[u32; FIELD_COUNT], depth: u32) -> Option<Context> {
    Context::from_parts(
        state,
        ElementType::from_bits(fields[0])?,
        AttributeType::from_bits(fields[1])?,
        AttributeEndDelimiter::from_bits(fields[2])?,
        JsFollowingSlash::from_bits(fields[3])?,
        UriPart::from_bits(fields[4])?,
        UriType::from_bits(fields[5])?,
        depth,
    )
}

fn scans_attribute(context: &Context) -> bool {
    let in_attribute = context.delimiter != AttributeEndDelimiter::None
        || matches!(
            context.state,
            State::HtmlAttributeName | State::HtmlBeforeAttributeValue
        );
    in_attribute == (context.attribute_type != AttributeType::None)
}
