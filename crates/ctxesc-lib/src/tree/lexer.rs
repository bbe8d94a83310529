//! Lexer for template files.
//!
//! Splits source into commands (`{...}`) and the text between them. The
//! body of `{literal}...{/literal}` is taken verbatim, braces included.
//!
//! ## Error handling
//!
//! Consecutive stray braces are coalesced into one `Garbage` token; the
//! parser reports it.

use std::ops::Range;

use logos::Logos;

const LITERAL_OPEN: &str = "{literal}";
const LITERAL_CLOSE: &str = "{/literal}";

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum RawKind {
    #[regex(r"\{[^{}]*\}")]
    Command,

    #[regex(r"[^{}]+")]
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TokenKind {
    /// `{...}` including the braces.
    Command,
    Text,
    /// The verbatim body of a `{literal}` block.
    Literal,
    /// `{literal}` without a matching close.
    UnclosedLiteral,
    Garbage,
}

/// Zero-copy token: kind + byte span into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }
}

pub(super) fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = RawKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(TokenKind::Garbage, start..lexer.span().start));
                }

                let span = lexer.span();
                if kind == RawKind::Text {
                    tokens.push(Token::new(TokenKind::Text, span));
                    continue;
                }
                if &source[span.clone()] != LITERAL_OPEN {
                    tokens.push(Token::new(TokenKind::Command, span));
                    continue;
                }

                let body_start = span.end;
                match lexer.remainder().find(LITERAL_CLOSE) {
                    Some(len) => {
                        tokens.push(Token::new(TokenKind::Literal, body_start..body_start + len));
                        lexer.bump(len + LITERAL_CLOSE.len());
                    }
                    None => {
                        tokens.push(Token::new(TokenKind::UnclosedLiteral, span));
                        break;
                    }
                }
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(TokenKind::Garbage, start..source.len()));
                }
                break;
            }
        }
    }

    tokens
}
