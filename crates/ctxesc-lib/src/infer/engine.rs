//! The inference walk.
//!
//! Threads a [`Context`] through every template body, node by node:
//! raw text advances it, prints and escaped calls record escaping modes,
//! branches are reconciled with [`Context::union`], and calls to
//! contextual templates are specialized per calling context.

use std::rc::Rc;

use ctxesc_core::{
    AutoescapeError, AutoescapeMode, Context, ContentKind, ErrorLocation, EscapingMode, State,
    escaping_modes_for, process_raw_text,
};

use super::AutoescaperConfig;
use super::store::{Decisions, Inferences};
use crate::source_map::SourceMap;
use crate::tree::{
    Block, Call, IdGenerator, IfBranch, Msg, Node, NodeKind, Print, Span, Switch, Template, Value,
    branch_tag, node_source, value_tag,
};

type Result<T> = std::result::Result<T, AutoescapeError>;

const NO_AUTOESCAPE: &str = "|noAutoescape";

/// Name of the clone of `name` specialized for calls starting in `context`.
pub fn derived_name(name: &str, context: Context) -> String {
    if context == Context::HTML_PCDATA {
        name.to_owned()
    } else {
        format!("{name}__C{:x}", context.pack())
    }
}

/// An end context assumed for a template whose walk is still in progress.
struct Guess {
    name: String,
    end: Context,
    consulted: bool,
}

pub(super) struct Engine<'a> {
    config: &'a AutoescaperConfig,
    sources: &'a SourceMap,
    store: Inferences,
    ids: IdGenerator,
    /// Templates being walked, innermost last.
    walking: Vec<String>,
    guesses: Vec<Guess>,
}

impl<'a> Engine<'a> {
    pub fn new(
        config: &'a AutoescaperConfig,
        sources: &'a SourceMap,
        templates: Vec<Template>,
        ids: IdGenerator,
    ) -> Self {
        Self {
            config,
            sources,
            store: Inferences::new(templates),
            ids,
            walking: Vec::new(),
            guesses: Vec::new(),
        }
    }

    /// Walks every contextual and strict template that no call reached yet.
    pub fn run(mut self) -> Result<(Decisions, IdGenerator)> {
        for name in self.store.template_names() {
            if self.store.was_checked(&name) {
                continue;
            }
            let Some(templates) = self.store.templates(&name) else {
                continue;
            };

            let (strict, contextual): (Vec<_>, Vec<_>) = templates
                .into_iter()
                .filter(|t| t.autoescape != AutoescapeMode::NonContextual)
                .partition(|t| t.autoescape == AutoescapeMode::Strict);

            for template in &strict {
                self.check_strict(template)?;
            }
            if let Some(first) = contextual.first() {
                let span = first.span;
                self.infer_end_context(&name, &contextual, Context::HTML_PCDATA)
                    .map_err(|e| e.or_located_at(|| self.location_in(span, &name)))?;
            }
            self.store.record_checked(&name);
        }
        Ok((self.store.into_decisions(), self.ids))
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    fn check_strict(&mut self, template: &Rc<Template>) -> Result<()> {
        let kind = template.content_kind();
        let end = self.walk_template(template, Context::start_of(kind))?;
        if end.is_valid_end_for(kind) {
            return Ok(());
        }
        let err = AutoescapeError::new(format!(
            "A strict block of kind=\"{kind}\" cannot end in context {end}. Likely cause is {}.",
            end.likely_end_mismatch_cause(kind)
        ));
        Err(err.or_located_at(|| self.location_in(template.span, &template.name)))
    }

    fn walk_template(&mut self, template: &Rc<Template>, start: Context) -> Result<Context> {
        log::trace!(target: "ctxesc::infer", "walking {} from {start}", template.name);
        self.walking.push(template.name.clone());
        let result = self.walk_nodes(&template.body, start, template.autoescape);
        self.walking.pop();
        result
    }

    /// End context of the delegates named `name` when called in `start`.
    fn walk_delegates(
        &mut self,
        name: &str,
        templates: &[Rc<Template>],
        start: Context,
    ) -> Result<Context> {
        let mut joined: Option<Context> = None;
        for template in templates {
            let end = self.walk_template(template, start)?;
            joined = match joined {
                None => Some(end),
                Some(prev) => Some(prev.union(end).ok_or_else(|| {
                    AutoescapeError::new(format!(
                        "Deltemplates diverge when used with deltemplate name {name} in \
                         context {start}: one implementation ends in {prev}, another in {end}"
                    ))
                    .or_located_at(|| self.location_in(template.span, &template.name))
                })?),
            };
        }
        Ok(joined.unwrap_or(start))
    }

    /// Optimistic fixed point over a (possibly recursive) contextual
    /// template: assume it ends where it starts, walk it, and walk once
    /// more if a recursive call relied on a wrong guess.
    fn infer_end_context(
        &mut self,
        name: &str,
        templates: &[Rc<Template>],
        start: Context,
    ) -> Result<Context> {
        if let Some(guess) = self.guesses.iter_mut().rev().find(|g| g.name == name) {
            guess.consulted = true;
            return Ok(guess.end);
        }
        if let Some(end) = self.store.end_context(name) {
            return Ok(end);
        }

        let fuel = self.config.recontextualization_fuel();
        if self.guesses.len() >= fuel as usize {
            return Err(AutoescapeError::new(format!(
                "Giving up on template {name} after {fuel} nested re-contextualizations"
            )));
        }

        let mut guess = start;
        for _ in 0..2 {
            self.guesses.push(Guess {
                name: name.to_owned(),
                end: guess,
                consulted: false,
            });
            self.store.push();
            let result = self.walk_delegates(name, templates, start);
            let consulted = self.guesses.pop().is_some_and(|g| g.consulted);

            match result {
                Ok(end) if !consulted || end == guess => {
                    log::debug!(target: "ctxesc::infer", "{name}: {start} -> {end}");
                    self.store.record_end_context(name, end);
                    self.store.record_checked(name);
                    self.store.fold();
                    return Ok(end);
                }
                Ok(end) => {
                    log::debug!(
                        target: "ctxesc::infer",
                        "{name}: guessed {guess} but ended in {end}, re-guessing"
                    );
                    self.store.discard();
                    guess = end;
                }
                Err(err) => {
                    self.store.discard();
                    return Err(err);
                }
            }
        }

        Err(AutoescapeError::new(format!(
            "Cannot determine end context for recursive template {name}"
        )))
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    fn walk_nodes(&mut self, nodes: &[Node], mut context: Context, mode: AutoescapeMode) -> Result<Context> {
        for node in nodes {
            context = self.walk_node(node, context, mode)?;
        }
        Ok(context)
    }

    fn walk_node(&mut self, node: &Node, context: Context, mode: AutoescapeMode) -> Result<Context> {
        self.visit(node, context, mode)
            .map_err(|e| e.or_located_at(|| self.location(node.span)))
    }

    fn visit(&mut self, node: &Node, context: Context, mode: AutoescapeMode) -> Result<Context> {
        match &node.kind {
            NodeKind::RawText(text) => {
                let sliced = process_raw_text(text, context)?;
                let end = sliced.end_context();
                self.store.record_sliced_text(node.id, sliced);
                Ok(end)
            }
            NodeKind::Print(Print { directives, .. }) => {
                self.escape_dynamic_value(node, directives, context, mode)
            }
            NodeKind::If(branches) => self.visit_if(node, branches, context, mode),
            NodeKind::Switch(switch) => self.visit_switch(node, switch, context, mode),
            NodeKind::For(for_node) => {
                let end = self.visit_loop(node, &for_node.body, context, mode)?;
                let Some(if_empty) = &for_node.if_empty else {
                    return Ok(end);
                };
                let empty_end = self.walk_nodes(if_empty, context, mode)?;
                end.union(empty_end).ok_or_else(|| {
                    AutoescapeError::new(format!(
                        "{{for}} command branch ends in a different context than preceding \
                         branches: {{ifempty}}{}",
                        sources_of(if_empty)
                    ))
                })
            }
            NodeKind::Call(call) => self.visit_call(node, call, context, mode),
            NodeKind::Let(let_node) => {
                let tag = value_tag("let", &let_node.var, &let_node.value);
                self.visit_value(&tag, &let_node.value, mode)?;
                Ok(context)
            }
            NodeKind::Msg(msg) => self.visit_msg(node, msg, context, mode),
        }
    }

    /// A print, or a call that has to be escaped like one.
    fn escape_dynamic_value(
        &mut self,
        node: &Node,
        directives: &[String],
        context: Context,
        mode: AutoescapeMode,
    ) -> Result<Context> {
        if directives
            .iter()
            .any(|d| d == EscapingMode::Text.directive_name())
        {
            return Err(AutoescapeError::new(format!(
                "Print directive {} is only for internal use by the autoescaper: {}",
                EscapingMode::Text.directive_name(),
                node_source(node)
            )));
        }

        let cancelling = directives.iter().find(|d| self.config.is_cancelling(d));
        if let Some(directive) = cancelling
            && mode == AutoescapeMode::Strict
            && context.state() != State::Text
        {
            return Err(AutoescapeError::new(cancelling_in_strict(
                directive, node, context,
            )));
        }

        let context = context.context_before_dynamic_value();
        let explicit: Vec<EscapingMode> = directives
            .iter()
            .filter_map(|d| {
                if self.config.is_cancelling(d) {
                    Some(EscapingMode::NoAutoescape)
                } else {
                    EscapingMode::from_directive(d)
                }
            })
            .collect();

        let modes = if let Some(&first) = explicit.first() {
            if !context.is_compatible_with(first) {
                let names: Vec<String> = explicit.iter().map(ToString::to_string).collect();
                return Err(AutoescapeError::new(format!(
                    "Escaping modes [{}] not compatible with {context} : {}",
                    names.join(", "),
                    node_source(node)
                )));
            }
            explicit
        } else {
            escaping_modes_for(&context)?
        };

        let end = modes
            .first()
            .map_or(context, |&first| context.derive_after_escaping(first));
        self.store.record_escaping_modes(node.id, modes);
        Ok(end)
    }

    fn visit_if(
        &mut self,
        node: &Node,
        branches: &[IfBranch],
        context: Context,
        mode: AutoescapeMode,
    ) -> Result<Context> {
        let mut joined: Option<Context> = None;
        for (i, branch) in branches.iter().enumerate() {
            let end = self.walk_nodes(&branch.body, context, mode)?;
            joined = Some(match joined {
                None => end,
                Some(prev) => prev.union(end).ok_or_else(|| {
                    AutoescapeError::new(format!(
                        "{{if}} command branch ends in a different context than preceding \
                         branches: {}{}",
                        branch_tag(i, branch),
                        sources_of(&branch.body)
                    ))
                    .or_located_at(|| self.location(branch.span))
                })?,
            });
        }

        let has_else = branches.last().is_some_and(|b| b.condition.is_none());
        let joined = joined.unwrap_or(context);
        if has_else {
            return Ok(joined);
        }
        joined.union(context).ok_or_else(|| {
            AutoescapeError::new(format!(
                "{{if}} command without {{else}} changes context : {}",
                node_source(node)
            ))
        })
    }

    fn visit_switch(
        &mut self,
        node: &Node,
        switch: &Switch,
        context: Context,
        mode: AutoescapeMode,
    ) -> Result<Context> {
        let mut joined: Option<Context> = None;
        for case in switch.cases.iter().chain(&switch.default) {
            let end = self.walk_nodes(&case.body, context, mode)?;
            joined = Some(match joined {
                None => end,
                Some(prev) => prev.union(end).ok_or_else(|| {
                    let tag = match &case.values {
                        Some(values) => format!("{{case {values}}}"),
                        None => "{default}".to_owned(),
                    };
                    AutoescapeError::new(format!(
                        "{{switch}} command case ends in a different context than preceding \
                         cases: {tag}{}",
                        sources_of(&case.body)
                    ))
                    .or_located_at(|| self.location(case.span))
                })?,
            });
        }

        let joined = joined.unwrap_or(context);
        if switch.default.is_some() {
            return Ok(joined);
        }
        joined.union(context).ok_or_else(|| {
            AutoescapeError::new(format!(
                "{{switch}} command without {{default}} changes context : {}",
                node_source(node)
            ))
        })
    }

    /// A loop body runs zero or more times, so it has to end in a context
    /// it can start again from.
    fn visit_loop(
        &mut self,
        node: &Node,
        body: &[Node],
        context: Context,
        mode: AutoescapeMode,
    ) -> Result<Context> {
        let not_reentrant = || {
            AutoescapeError::new(format!(
                "{{for}} command changes context so it cannot be reentered : {}",
                node_source(node)
            ))
        };

        let end = self.walk_nodes(body, context, mode)?;
        let joined = context.union(end).ok_or_else(not_reentrant)?;
        if joined == context {
            return Ok(joined);
        }
        let end = self.walk_nodes(body, joined, mode)?;
        joined.union(end).ok_or_else(not_reentrant)
    }

    /// `{let}` and `{param}` values. Blocks are walked on their own; they
    /// never move the surrounding context.
    fn visit_value(&mut self, tag: &str, value: &Value, mode: AutoescapeMode) -> Result<()> {
        let Value::Block(Block { kind, body }) = value else {
            return Ok(());
        };

        if let Some(kind) = *kind {
            let end = self.walk_nodes(body, Context::start_of(kind), AutoescapeMode::Strict)?;
            if !end.is_valid_end_for(kind) {
                return Err(AutoescapeError::new(format!(
                    "A strict block of kind=\"{kind}\" cannot end in context {end}. Likely \
                     cause is {}: {tag}",
                    end.likely_end_mismatch_cause(kind)
                )));
            }
            return Ok(());
        }

        if mode == AutoescapeMode::Strict {
            let command = if tag.starts_with("{let") { "let" } else { "param" };
            return Err(AutoescapeError::new(format!(
                "In strict templates, {{{command}}}...{{/{command}}} blocks require an \
                 explicit kind=\"<type>\": {tag}"
            )));
        }

        let end = self.walk_nodes(body, Context::HTML_PCDATA, mode)?;
        if end != Context::HTML_PCDATA {
            return Err(AutoescapeError::new(format!(
                "Blocks should start and end in HTML context: {tag}"
            )));
        }
        Ok(())
    }

    fn visit_msg(
        &mut self,
        node: &Node,
        msg: &Msg,
        context: Context,
        mode: AutoescapeMode,
    ) -> Result<Context> {
        let Some((body_context, modes)) = context.msg_escaping_strategy() else {
            return Err(AutoescapeError::new(format!(
                "Messages are not supported in this context, because it would mean asking \
                 translators to write source code; if this is desired, try factoring the \
                 message into a {{let}} block: {context}"
            )));
        };

        let end = self.walk_nodes(&msg.body, body_context, mode)?;
        if end != body_context {
            return Err(AutoescapeError::new(format!(
                "Message text should not alter the escaping context. {body_context} != {end}"
            )));
        }
        let end = modes
            .first()
            .map_or(context, |&first| context.derive_after_escaping(first));
        if !modes.is_empty() {
            self.store.record_escaping_modes(node.id, modes);
        }
        Ok(end)
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn visit_call(
        &mut self,
        node: &Node,
        call: &Call,
        context: Context,
        mode: AutoescapeMode,
    ) -> Result<Context> {
        for param in &call.params {
            let tag = value_tag("param", &param.name, &param.value);
            self.visit_value(&tag, &param.value, mode)
                .map_err(|e| e.or_located_at(|| self.location(param.span)))?;
        }

        let Some(callees) = self.store.templates(&call.callee) else {
            log::trace!(target: "ctxesc::infer", "{} is extern", call.callee);
            return match mode {
                AutoescapeMode::Strict => {
                    self.escape_dynamic_value(node, &call.directives, context, mode)
                }
                _ => Ok(context),
            };
        };
        let Some(first) = callees.first() else {
            return Ok(context);
        };
        let (callee_mode, callee_kind) = (first.autoescape, first.content_kind());

        match (mode, callee_mode) {
            (AutoescapeMode::Strict, AutoescapeMode::Strict) => {
                if context.is_valid_start_for(callee_kind) {
                    Ok(context)
                } else {
                    self.escape_dynamic_value(node, &call.directives, context, mode)
                }
            }
            // Contextual callers get the loose check while they migrate to strict.
            (_, AutoescapeMode::Strict) => {
                if context.is_valid_start_for_loose(callee_kind) {
                    Ok(context)
                } else {
                    Err(AutoescapeError::new(format!(
                        "Cannot call strictly autoescaped template {} of kind=\"{callee_kind}\" \
                         from incompatible context {context}. Strict templates generate extra \
                         code to safely call templates of other content kinds, but non-strict \
                         templates do not: {}",
                        call.callee,
                        node_source(node)
                    )))
                }
            }
            (AutoescapeMode::Strict, _) => {
                if context.state() == State::Text {
                    self.escape_dynamic_value(node, &call.directives, context, mode)
                } else {
                    Err(AutoescapeError::new(format!(
                        "Strict autoescaping currently forbids calls to non-strict templates, \
                         unless the context is kind=\"text\", since there's no guarantee the \
                         callee is safe: {}",
                        node_source(node)
                    )))
                }
            }
            (_, AutoescapeMode::NonContextual) => Ok(context),
            (_, AutoescapeMode::Contextual) => self.specialize_call(node, call, &callees, context),
        }
    }

    /// Points the call at the clone of its callee for `context`, creating
    /// the clone on first use, and returns the clone's end context.
    fn specialize_call(
        &mut self,
        node: &Node,
        call: &Call,
        callees: &[Rc<Template>],
        context: Context,
    ) -> Result<Context> {
        let derived = derived_name(&call.callee, context);
        let templates = match self.store.templates(&derived) {
            Some(templates) => templates,
            None => {
                log::debug!(target: "ctxesc::infer", "cloning {} as {derived}", call.callee);
                let clones: Vec<_> = callees
                    .iter()
                    .map(|t| Rc::new(t.clone_with_new_ids(&derived, &mut self.ids)))
                    .collect();
                self.store.add_templates(&derived, clones.clone());
                clones
            }
        };
        if derived != call.callee {
            self.store.retarget(node.id, &derived);
        }

        let span = templates.first().map_or(node.span, |t| t.span);
        self.infer_end_context(&derived, &templates, context)
            .map_err(|e| {
                e.or_located_at(|| self.location_in(span, &derived)).wrapped(
                    format!(
                        "Error while re-contextualizing template {} in context {context}:",
                        call.callee
                    ),
                    Some(self.location(node.span)),
                )
            })
    }

    // ------------------------------------------------------------------
    // Locations
    // ------------------------------------------------------------------

    fn location(&self, span: Span) -> ErrorLocation {
        let template = self.walking.last().map(String::as_str).unwrap_or_default();
        self.location_in(span, template)
    }

    fn location_in(&self, span: Span, template: &str) -> ErrorLocation {
        let (line, column) = self.sources.line_col(span.source, span.start);
        ErrorLocation {
            source: span.source.index(),
            path: self.sources.kind(span.source).display_name().to_owned(),
            line,
            column,
            range: span.range(),
            template: template.to_owned(),
        }
    }
}

fn sources_of(nodes: &[Node]) -> String {
    nodes.iter().map(node_source).collect()
}

fn cancelling_in_strict(directive: &str, node: &Node, context: Context) -> String {
    if directive == NO_AUTOESCAPE {
        let kind = match context.most_appropriate_content_kind() {
            ContentKind::Text => "appropriate kind=\"...\"".to_owned(),
            kind => format!("kind=\"{kind}\""),
        };
        return format!(
            "noAutoescape is not allowed in strict autoescaping mode. Instead, pass in a \
             {{param}} with {kind} or SanitizedContent."
        );
    }
    format!(
        "Autoescape-cancelling print directives like {directive} are only allowed in \
         kind=\"text\" blocks. If you really want to over-escape, try using a let block: \
         {{let $foo kind=\"text\"}}{}{{/let}}{{$foo}}.",
        node_source(node)
    )
}
