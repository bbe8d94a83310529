//! Joining contexts at the end of divergent control-flow branches.

use super::{AttributeEndDelimiter, Context, JsFollowingSlash, State, UriPart};

impl Context {
    /// The context that satisfies both `self` and `other`, if any.
    ///
    /// Reconciles differences that do not matter to later escaping
    /// decisions; anything else is a divergence the caller must report.
    pub fn union(self, other: Context) -> Option<Context> {
        if self == other {
            return Some(self);
        }

        let mut a = self;
        let mut b = other;

        if a.slash != b.slash {
            a = a.with_slash(JsFollowingSlash::Unknown);
            b = b.with_slash(JsFollowingSlash::Unknown);
            if a == b {
                return Some(a);
            }
        }

        if a.uri_part != b.uri_part {
            let joined = union_uri_parts(a.uri_part, b.uri_part);
            // Set directly: one side may not be in a URI at all, in which
            // case the states differ and the union fails below anyway.
            a = Context {
                uri_part: joined,
                ..a
            };
            b = Context {
                uri_part: joined,
                ..b
            };
            if a == b {
                return Some(a);
            }
        }

        if a.state != b.state {
            if a.state > b.state {
                std::mem::swap(&mut a, &mut b);
            }
            if a.state == State::HtmlTagName && b.state == State::HtmlTag {
                // `<foo{if x} bar{/if}` versus `<foo`: both can continue with attributes.
                a = a.with_state(State::HtmlTag).without_attr_context();
            }
            if a.state == State::HtmlTag && a.element_type == b.element_type {
                // One branch ends inside a value-less attribute or an unquoted value,
                // the other between attributes; both accept another attribute next.
                if b.state == State::HtmlAttributeName
                    || b.delimiter == AttributeEndDelimiter::SpaceOrTagEnd
                {
                    b = b.with_state(State::HtmlTag).without_attr_context();
                }
            }
        }

        (a == b).then_some(a)
    }

    /// Folds [`union`](Self::union) over `contexts`. `None` for an empty
    /// iterator or any divergence.
    pub fn union_all(contexts: impl IntoIterator<Item = Context>) -> Option<Context> {
        let mut contexts = contexts.into_iter();
        let first = contexts.next()?;
        contexts.try_fold(first, Context::union)
    }
}

fn union_uri_parts(a: UriPart, b: UriPart) -> UriPart {
    debug_assert_ne!(a, b);
    if a == UriPart::DangerousScheme || b == UriPart::DangerousScheme {
        return UriPart::DangerousScheme;
    }
    if matches!(a, UriPart::Fragment | UriPart::Unknown)
        || matches!(b, UriPart::Fragment | UriPart::Unknown)
    {
        // One side may be in the fragment; only the fragment is certain after that.
        return UriPart::Unknown;
    }
    if (a == UriPart::MaybeVariableScheme || b == UriPart::MaybeVariableScheme)
        && a != UriPart::UnknownPreFragment
        && b != UriPart::UnknownPreFragment
    {
        return UriPart::MaybeVariableScheme;
    }
    UriPart::UnknownPreFragment
}
