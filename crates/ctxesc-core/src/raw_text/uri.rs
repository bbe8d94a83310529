//! URI productions, shared by URI attributes and CSS `url(...)`.

use super::patterns::{Match, find_any_byte, find_end, starts_with_ci};
use super::{Action, Pattern, Transition};
use crate::context::{Context, UriPart};
use crate::error::AutoescapeError;

/// Moves between the parts of an http-like URI on its first significant
/// character, or at the end of the text.
pub(super) const PART: Transition =
    Transition::new(Pattern::Custom(find_part_boundary), Action::Compute(next_part));

/// Rejects hard-coded dangerous schemes up front.
pub(super) const START: Transition =
    Transition::new(Pattern::Custom(find_dangerous_scheme), Action::Compute(dangerous_scheme))
        .when(at_uri_start);

pub(super) const URI: &[Transition] = &[PART, START];

const DANGEROUS_SCHEMES: &[&str] = &["javascript", "data", "blob", "filesystem"];

/// `([:./&?=#])|\z`
fn find_part_boundary(text: &str, from: usize) -> Option<Match> {
    match find_any_byte(text, from, b":./&?=#") {
        Some(m) => {
            let group = m.start..m.end;
            Some(m.with_group(group))
        }
        None => find_end(text, from),
    }
}

/// `(?i)^(javascript|data|blob|filesystem):`
fn find_dangerous_scheme(text: &str, from: usize) -> Option<Match> {
    if from != 0 {
        return None;
    }
    let bytes = text.as_bytes();
    DANGEROUS_SCHEMES.iter().find_map(|scheme| {
        let colon = scheme.len();
        (starts_with_ci(bytes, 0, scheme.as_bytes()) && bytes.get(colon) == Some(&b':'))
            .then(|| Match::new(0, colon + 1).with_group(0..colon))
    })
}

fn at_uri_start(context: &Context, _: &str, _: &Match) -> bool {
    context.uri_part() == UriPart::Start
}

fn dangerous_scheme(prior: Context, _: &str, _: &Match) -> Result<Context, AutoescapeError> {
    Ok(prior.with_uri_part(UriPart::DangerousScheme))
}

fn next_part(prior: Context, text: &str, m: &Match) -> Result<Context, AutoescapeError> {
    let part = match prior.uri_part() {
        UriPart::Start => UriPart::MaybeScheme,
        part => part,
    };
    let part = match m.group(text).bytes().next() {
        Some(c) => part_after(part, c)?,
        None => part,
    };
    Ok(prior.with_uri_part(part))
}

const VARIABLE_SCHEME: &str = "Can't safely process a URI that might start with a variable \
    scheme. For example, {$x}:{$y} could have an XSS if $x is 'javascript' and $y is \
    attacker-controlled. Either use a hard-coded scheme, or introduce disambiguating characters \
    (e.g. http://{$x}:{$y}, ./{$x}:{$y}, or {$x}?foo=:{$y})";

/// The part after `c` is seen in `part`. Each arm also takes the checks
/// of the arms below it, the way a URI is read left to right.
fn part_after(part: UriPart, c: u8) -> Result<UriPart, AutoescapeError> {
    use UriPart as P;

    if matches!(part, P::MaybeScheme | P::MaybeVariableScheme) {
        match c {
            // `{$x}:{$y}` could be `javascript:...`.
            b':' if part == P::MaybeVariableScheme => {
                return Err(AutoescapeError::new(VARIABLE_SCHEME));
            }
            b':' | b'/' => return Ok(P::AuthorityOrPath),
            // No scheme has `=` or `&`, and query values are escaped as components.
            b'=' | b'&' if part == P::MaybeVariableScheme => return Ok(P::Query),
            _ => {}
        }
    }
    if matches!(
        part,
        P::MaybeScheme | P::MaybeVariableScheme | P::AuthorityOrPath | P::UnknownPreFragment
    ) && c == b'?'
    {
        return Ok(P::Query);
    }
    if matches!(
        part,
        P::MaybeScheme
            | P::MaybeVariableScheme
            | P::AuthorityOrPath
            | P::UnknownPreFragment
            | P::Query
            | P::Unknown
    ) && c == b'#'
    {
        return Ok(P::Fragment);
    }
    Ok(part)
}
