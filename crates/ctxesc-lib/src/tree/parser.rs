//! Recursive-descent parser for template files.
//!
//! The syntax is a compact command language: `{namespace}` and
//! `{template}`/`{deltemplate}` at the top level, control flow and prints
//! inside. Raw text between commands is line-joined: lines are trimmed,
//! blank lines dropped, and the rest joined with a single space unless the
//! join borders a markup tag.

use std::ops::Range;

use ctxesc_core::{AutoescapeMode, ContentKind};
use thiserror::Error;

use super::lexer::{Token, TokenKind, lex};
use super::{
    Block, Call, Case, For, IdGenerator, IfBranch, Let, Msg, Node, NodeKind, Param, Print,
    Switch, Template, TemplateSet, Value,
};
use crate::source_map::SourceId;
use crate::tree::Span;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

/// Parses one template file and appends its templates to `set`.
pub fn parse(set: &mut TemplateSet, source: SourceId, text: &str) -> Result<(), ParseError> {
    let templates = {
        let mut parser = Parser {
            text,
            source,
            tokens: lex(text),
            pos: 0,
            ids: &mut set.ids,
            namespace: None,
            default_autoescape: AutoescapeMode::default(),
        };
        parser.parse_file()?
    };
    log::debug!(target: "ctxesc::parse", "parsed {} templates", templates.len());
    set.templates.extend(templates);
    Ok(())
}

/// A command split into its name and the text after it.
///
/// `{$x}` is a `print` whose args are `$x`; `{/if}` has the name `/if`.
#[derive(Debug, Clone, Copy)]
struct Command<'s> {
    name: &'s str,
    args: &'s str,
    start: usize,
    end: usize,
}

impl<'s> Command<'s> {
    fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    fn display(&self) -> String {
        format!("{{{}}}", self.name)
    }

    /// Args with a trailing `/` removed, and whether there was one.
    fn self_closing_args(&self) -> (&'s str, bool) {
        match self.args.trim_end().strip_suffix('/') {
            Some(args) => (args.trim_end(), true),
            None => (self.args.trim(), false),
        }
    }
}

struct Parser<'s, 'i> {
    text: &'s str,
    source: SourceId,
    tokens: Vec<Token>,
    pos: usize,
    ids: &'i mut IdGenerator,
    namespace: Option<&'s str>,
    default_autoescape: AutoescapeMode,
}

type PResult<T> = Result<T, ParseError>;

/// What a token turned out to be, from the point of view of a body.
enum Item<'s> {
    Text(String, Range<usize>),
    Command(Command<'s>),
}

impl<'s> Parser<'s, '_> {
    fn error<T>(&self, message: impl Into<String>, range: Range<usize>) -> PResult<T> {
        Err(ParseError {
            message: message.into(),
            span: Span::new(self.source, range),
        })
    }

    fn span(&self, range: Range<usize>) -> Span {
        Span::new(self.source, range)
    }

    // ------------------------------------------------------------------
    // Tokens
    // ------------------------------------------------------------------

    fn next_item(&mut self) -> PResult<Option<Item<'s>>> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Ok(None);
        };
        self.pos += 1;
        let span = token.span;
        let item = match token.kind {
            TokenKind::Text => Item::Text(join_lines(&self.text[span.clone()]), span),
            TokenKind::Literal => Item::Text(self.text[span.clone()].to_owned(), span),
            TokenKind::Command => Item::Command(self.command(span)?),
            TokenKind::UnclosedLiteral => return self.error("Unclosed {literal}", span),
            TokenKind::Garbage => {
                return self.error(
                    "Unmatched brace; use {lb} and {rb} for literal braces",
                    span,
                );
            }
        };
        Ok(Some(item))
    }

    /// Next command, skipping whitespace-only text. Other text is an error
    /// naming `context`.
    fn next_command(&mut self, open: &Command<'s>, context: &str) -> PResult<Command<'s>> {
        loop {
            match self.next_item()? {
                None => return self.error(format!("Unclosed {}", open.display()), open.range()),
                Some(Item::Text(text, _)) if text.trim().is_empty() => {}
                Some(Item::Text(_, span)) => return self.error(context.to_owned(), span),
                Some(Item::Command(command)) => return Ok(command),
            }
        }
    }

    fn command(&self, range: Range<usize>) -> PResult<Command<'s>> {
        let text: &'s str = self.text;
        let inner = text[range.start + 1..range.end - 1].trim();
        if inner.is_empty() {
            return self.error("Empty command", range);
        }
        let (name, args) = if inner.starts_with('$') {
            ("print", inner)
        } else {
            match inner.find(char::is_whitespace) {
                Some(at) => (&inner[..at], inner[at..].trim_start()),
                None => (inner, ""),
            }
        };
        Ok(Command {
            name,
            args,
            start: range.start,
            end: range.end,
        })
    }

    // ------------------------------------------------------------------
    // File level
    // ------------------------------------------------------------------

    fn parse_file(&mut self) -> PResult<Vec<Template>> {
        let mut templates = Vec::new();
        while let Some(item) = self.next_item()? {
            let command = match item {
                Item::Text(text, _) if text.trim().is_empty() => continue,
                Item::Text(_, span) => return self.error("Text outside of a template", span),
                Item::Command(command) => command,
            };
            match command.name {
                "namespace" => self.parse_namespace(&command)?,
                "template" | "deltemplate" => templates.push(self.parse_template(&command)?),
                _ => {
                    return self.error(
                        format!("Unexpected {} outside of a template", command.display()),
                        command.range(),
                    );
                }
            }
        }
        Ok(templates)
    }

    fn parse_namespace(&mut self, command: &Command<'s>) -> PResult<()> {
        let (name, attrs) = split_name(command.args);
        if name.is_empty() {
            return self.error("{namespace} requires a name", command.range());
        }
        for (key, value) in self.attributes(command, attrs)? {
            if key == "autoescape" {
                self.default_autoescape = self.autoescape_mode(command, value)?;
            }
        }
        self.namespace = Some(name);
        Ok(())
    }

    fn parse_template(&mut self, open: &Command<'s>) -> PResult<Template> {
        let (name, attrs) = split_name(open.args);
        if name.is_empty() {
            return self.error(format!("{} requires a name", open.display()), open.range());
        }
        let name = self.qualify(name, open)?;

        let mut autoescape = self.default_autoescape;
        let mut kind = None;
        let mut variant = None;
        for (key, value) in self.attributes(open, attrs)? {
            match key {
                "autoescape" => autoescape = self.autoescape_mode(open, value)?,
                "kind" => kind = Some(self.content_kind(open, value)?),
                "variant" => variant = Some(value.to_owned()),
                _ => {}
            }
        }

        let id = self.ids.next_id();
        let params = self.parse_param_declarations();
        let close = format!("/{}", open.name);
        let (body, end) = self.parse_body(open, &[close.as_str()])?;

        Ok(Template {
            id,
            name,
            delegate: open.name == "deltemplate",
            variant,
            autoescape,
            kind,
            span: self.span(open.start..end.end),
            params,
            body,
        })
    }

    /// `{@param ...}` lines at the top of a template body.
    fn parse_param_declarations(&mut self) -> Vec<String> {
        let mut params = Vec::new();
        while let Some(token) = self.tokens.get(self.pos) {
            let text = &self.text[token.span.clone()];
            match token.kind {
                TokenKind::Text if text.trim().is_empty() => {}
                TokenKind::Command if text[1..].starts_with('@') => {
                    params.push(text[1..text.len() - 1].trim().to_owned());
                }
                _ => break,
            }
            self.pos += 1;
        }
        params
    }

    fn qualify(&self, name: &str, command: &Command<'s>) -> PResult<String> {
        if !name.starts_with('.') {
            return Ok(name.to_owned());
        }
        match self.namespace {
            Some(namespace) => Ok(format!("{namespace}{name}")),
            None => self.error(
                format!("Relative name {name} used before {{namespace}}"),
                command.range(),
            ),
        }
    }

    // ------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------

    /// Nodes up to (and including) the first command named in `ends`.
    fn parse_body(
        &mut self,
        open: &Command<'s>,
        ends: &[&str],
    ) -> PResult<(Vec<Node>, Command<'s>)> {
        let mut body = Vec::new();
        loop {
            let Some(item) = self.next_item()? else {
                return self.error(format!("Unclosed {}", open.display()), open.range());
            };
            let command = match item {
                Item::Text(text, span) => {
                    self.push_text(&mut body, text, span);
                    continue;
                }
                Item::Command(command) => command,
            };
            if ends.contains(&command.name) {
                return Ok((body, command));
            }
            if let Some(text) = special_character(command.name) {
                self.push_text(&mut body, text.to_owned(), command.range());
                continue;
            }
            let node = match command.name {
                "print" => self.parse_print(&command)?,
                "if" => self.parse_if(&command)?,
                "switch" => self.parse_switch(&command)?,
                "for" | "foreach" => self.parse_for(&command)?,
                "call" | "delcall" => self.parse_call(&command)?,
                "let" => self.parse_let(&command)?,
                "msg" => self.parse_msg(&command)?,
                name if name.starts_with('/')
                    || matches!(name, "elseif" | "else" | "case" | "default" | "ifempty" | "param") =>
                {
                    return self.error(
                        format!("Unexpected {}", command.display()),
                        command.range(),
                    );
                }
                _ => {
                    return self.error(
                        format!("Unknown command {}", command.display()),
                        command.range(),
                    );
                }
            };
            body.push(node);
        }
    }

    /// Appends raw text, merging with a preceding raw text node.
    fn push_text(&mut self, body: &mut Vec<Node>, text: String, range: Range<usize>) {
        if text.is_empty() {
            return;
        }
        if let Some(Node {
            span,
            kind: NodeKind::RawText(prev),
            ..
        }) = body.last_mut()
        {
            prev.push_str(&text);
            span.end = range.end;
            return;
        }
        body.push(Node {
            id: self.ids.next_id(),
            span: self.span(range),
            kind: NodeKind::RawText(text),
        });
    }

    fn node(&mut self, range: Range<usize>, kind: NodeKind) -> Node {
        Node {
            id: self.ids.next_id(),
            span: self.span(range),
            kind,
        }
    }

    fn parse_print(&mut self, command: &Command<'s>) -> PResult<Node> {
        let (expr, directives) = split_directives(command.args);
        if expr.is_empty() {
            return self.error("{print} requires an expression", command.range());
        }
        let kind = NodeKind::Print(Print {
            expr: expr.to_owned(),
            directives,
        });
        Ok(self.node(command.range(), kind))
    }

    fn parse_if(&mut self, open: &Command<'s>) -> PResult<Node> {
        let id = self.ids.next_id();
        let mut branches = Vec::new();
        let mut head = *open;
        loop {
            let condition = match head.name {
                "else" => None,
                _ if head.args.is_empty() => {
                    return self.error(
                        format!("{} requires a condition", head.display()),
                        head.range(),
                    );
                }
                _ => Some(head.args.to_owned()),
            };
            let (body, end) = self.parse_body(open, &["elseif", "else", "/if"])?;
            branches.push(IfBranch {
                id: self.ids.next_id(),
                span: self.span(head.start..end.start),
                condition,
                body,
            });
            if end.name == "/if" {
                return Ok(Node {
                    id,
                    span: self.span(open.start..end.end),
                    kind: NodeKind::If(branches),
                });
            }
            if head.name == "else" {
                return self.error(
                    format!("Unexpected {} after {{else}}", end.display()),
                    end.range(),
                );
            }
            head = end;
        }
    }

    fn parse_switch(&mut self, open: &Command<'s>) -> PResult<Node> {
        if open.args.is_empty() {
            return self.error("{switch} requires an expression", open.range());
        }
        let id = self.ids.next_id();
        let mut cases = Vec::new();
        let mut default = None;
        let mut head = self.next_command(open, "Only {case} and {default} may follow {switch}")?;
        loop {
            match head.name {
                "/switch" => break,
                "case" | "default" if default.is_some() => {
                    return self.error(
                        format!("Unexpected {} after {{default}}", head.display()),
                        head.range(),
                    );
                }
                "case" | "default" => {
                    let (body, end) = self.parse_body(open, &["case", "default", "/switch"])?;
                    let case = Case {
                        id: self.ids.next_id(),
                        span: self.span(head.start..end.start),
                        values: (head.name == "case").then(|| head.args.to_owned()),
                        body,
                    };
                    if head.name == "case" {
                        cases.push(case);
                    } else {
                        default = Some(case);
                    }
                    head = end;
                }
                _ => {
                    return self.error(
                        format!("Unexpected {} inside {{switch}}", head.display()),
                        head.range(),
                    );
                }
            }
        }
        Ok(Node {
            id,
            span: self.span(open.start..head.end),
            kind: NodeKind::Switch(Switch {
                expr: open.args.to_owned(),
                cases,
                default,
            }),
        })
    }

    fn parse_for(&mut self, open: &Command<'s>) -> PResult<Node> {
        let Some((var, iterable)) = open.args.split_once(" in ") else {
            return self.error(
                format!("Expected {{{} $VAR in EXPR}}", open.name),
                open.range(),
            );
        };
        let id = self.ids.next_id();
        let close = format!("/{}", open.name);
        let (body, mut end) = self.parse_body(open, &["ifempty", close.as_str()])?;
        let if_empty = if end.name == "ifempty" {
            let (if_empty, close) = self.parse_body(open, &[close.as_str()])?;
            end = close;
            Some(if_empty)
        } else {
            None
        };
        Ok(Node {
            id,
            span: self.span(open.start..end.end),
            kind: NodeKind::For(For {
                var: var.trim().to_owned(),
                iterable: iterable.trim().to_owned(),
                body,
                if_empty,
            }),
        })
    }

    fn parse_call(&mut self, open: &Command<'s>) -> PResult<Node> {
        let (args, self_closing) = open.self_closing_args();
        let (head, directives) = split_directives(args);
        let (callee, attrs) = split_name(head);
        if callee.is_empty() {
            return self.error(format!("{} requires a callee", open.display()), open.range());
        }
        let callee = self.qualify(callee, open)?;
        let data = self
            .attributes(open, attrs)?
            .into_iter()
            .find(|&(key, _)| key == "data")
            .map(|(_, value)| value.to_owned());

        let id = self.ids.next_id();
        let mut params = Vec::new();
        let mut end = open.end;
        if !self_closing {
            let close = format!("/{}", open.name);
            loop {
                let child = self.next_command(open, "Only {param} may appear inside a call")?;
                if child.name == close {
                    end = child.end;
                    break;
                }
                if child.name != "param" {
                    return self.error(
                        format!("Unexpected {} inside {}", child.display(), open.display()),
                        child.range(),
                    );
                }
                params.push(self.parse_param(&child)?);
            }
        }

        Ok(Node {
            id,
            span: self.span(open.start..end),
            kind: NodeKind::Call(Call {
                callee,
                delegate: open.name == "delcall",
                data,
                params,
                directives,
            }),
        })
    }

    fn parse_param(&mut self, open: &Command<'s>) -> PResult<Param> {
        let id = self.ids.next_id();
        let (name, value, end) = self.parse_value(open, "/param")?;
        Ok(Param {
            id,
            span: self.span(open.start..end),
            name,
            value,
        })
    }

    fn parse_let(&mut self, open: &Command<'s>) -> PResult<Node> {
        let id = self.ids.next_id();
        let (var, value, end) = self.parse_value(open, "/let")?;
        if !var.starts_with('$') {
            return self.error("{let} variables start with $", open.range());
        }
        Ok(Node {
            id,
            span: self.span(open.start..end),
            kind: NodeKind::Let(Let { var, value }),
        })
    }

    /// `{cmd NAME: EXPR /}` or `{cmd NAME kind="..."}...{/cmd}`.
    fn parse_value(
        &mut self,
        open: &Command<'s>,
        close: &str,
    ) -> PResult<(String, Value, usize)> {
        let (args, self_closing) = open.self_closing_args();
        if self_closing {
            let Some((name, expr)) = args.split_once(':') else {
                return self.error(
                    format!("Expected {{{} NAME: EXPR /}}", open.name),
                    open.range(),
                );
            };
            let value = Value::Expr(expr.trim().to_owned());
            return Ok((name.trim().to_owned(), value, open.end));
        }

        let (name, attrs) = split_name(args);
        if name.is_empty() || name.contains(':') {
            return self.error(
                format!("Expected {{{} NAME}}...{{{close}}}", open.name),
                open.range(),
            );
        }
        let mut kind = None;
        for (key, value) in self.attributes(open, attrs)? {
            if key == "kind" {
                kind = Some(self.content_kind(open, value)?);
            }
        }
        let (body, end) = self.parse_body(open, &[close])?;
        Ok((name.to_owned(), Value::Block(Block { kind, body }), end.end))
    }

    fn parse_msg(&mut self, open: &Command<'s>) -> PResult<Node> {
        let (attributes, directives) = split_directives(open.args);
        let id = self.ids.next_id();
        let (body, end) = self.parse_body(open, &["/msg"])?;
        Ok(Node {
            id,
            span: self.span(open.start..end.end),
            kind: NodeKind::Msg(Msg {
                attributes: attributes.to_owned(),
                body,
                directives,
            }),
        })
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    fn attributes(&self, command: &Command<'s>, text: &'s str) -> PResult<Vec<(&'s str, &'s str)>> {
        parse_attributes(text).or_else(|message| self.error(message, command.range()))
    }

    fn autoescape_mode(&self, command: &Command<'s>, value: &str) -> PResult<AutoescapeMode> {
        match AutoescapeMode::from_attribute_value(value) {
            Some(mode) => Ok(mode),
            None => self.error(format!("Unknown autoescape mode \"{value}\""), command.range()),
        }
    }

    fn content_kind(&self, command: &Command<'s>, value: &str) -> PResult<ContentKind> {
        match ContentKind::from_attribute_value(value) {
            Some(kind) => Ok(kind),
            None => self.error(format!("Unknown kind \"{value}\""), command.range()),
        }
    }
}

/// `key="value"` pairs separated by whitespace.
fn parse_attributes(text: &str) -> Result<Vec<(&str, &str)>, String> {
    let mut attrs = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        let Some((key, after)) = rest.split_once('=') else {
            return Err(format!("Expected key=\"value\" but found `{rest}`"));
        };
        let key = key.trim();
        let Some(after) = after.trim_start().strip_prefix('"') else {
            return Err(format!("Value of `{key}` must be double-quoted"));
        };
        let Some((value, after)) = after.split_once('"') else {
            return Err(format!("Unterminated value of `{key}`"));
        };
        attrs.push((key, value));
        rest = after.trim_start();
    }
    Ok(attrs)
}

/// First word, and the rest trimmed.
fn split_name(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.find(char::is_whitespace) {
        Some(at) => (&text[..at], text[at..].trim_start()),
        None => (text, ""),
    }
}

/// Splits `expr |d1 |d2:arg` at the first `|` outside a string literal.
fn split_directives(text: &str) -> (&str, Vec<String>) {
    let mut quote = None;
    let mut cut = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '|' => {
                cut = Some(i);
                break;
            }
            None => {}
        }
    }
    let Some(cut) = cut else {
        return (text.trim(), Vec::new());
    };
    let directives = text[cut..]
        .split('|')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| format!("|{d}"))
        .collect();
    (text[..cut].trim(), directives)
}

fn special_character(name: &str) -> Option<&'static str> {
    Some(match name {
        "sp" => " ",
        "nil" => "",
        "\\n" => "\n",
        "\\r" => "\r",
        "\\t" => "\t",
        "lb" => "{",
        "rb" => "}",
        _ => return None,
    })
}

/// Line joining for raw text between commands.
///
/// Text on the same line as a neighbouring command keeps its spacing on
/// that side; every other line is trimmed. Blank lines vanish. Remaining
/// lines join with a space unless the join touches `>` or `<`.
pub(super) fn join_lines(text: &str) -> String {
    if !text.contains('\n') {
        return text.to_owned();
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len() - 1;
    let mut joined = String::with_capacity(text.len());
    let mut prev: Option<&str> = None;
    for (i, line) in lines.into_iter().enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let piece = match i {
            0 => line.trim_end(),
            i if i == last => line.trim_start(),
            _ => line.trim(),
        };
        if piece.is_empty() {
            continue;
        }
        if let Some(prev) = prev
            && !prev.ends_with('>')
            && !piece.starts_with('<')
        {
            joined.push(' ');
        }
        joined.push_str(piece);
        prev = Some(piece);
    }
    joined
}
