//! Applies inference decisions to the template tree.
//!
//! Prints, escaped calls and messages get their inferred directives
//! appended after any the author wrote; calls are pointed at specialized
//! clones. Bare prints in noncontextual templates are HTML-escaped.

use std::rc::Rc;

use ctxesc_core::{AutoescapeMode, EscapingMode};
use indexmap::IndexMap;

use crate::infer::{Autoescaped, AutoescaperConfig, Decisions};
use crate::tree::{IdGenerator, Node, NodeId, NodeKind, Template, TemplateSet, Value};

pub(crate) fn apply(decisions: Decisions, ids: IdGenerator, config: &AutoescaperConfig) -> Autoescaped {
    let Decisions {
        templates,
        escaping_modes,
        retargets,
        sliced_text,
    } = decisions;
    let rewriter = Rewriter {
        config,
        escaping_modes: &escaping_modes,
        retargets: &retargets,
    };

    let mut rewritten = Vec::new();
    for template in templates.into_values().flatten() {
        let mut template = Rc::try_unwrap(template).unwrap_or_else(|shared| (*shared).clone());
        rewriter.rewrite_template(&mut template);
        rewritten.push(template);
    }
    log::debug!(
        target: "ctxesc::rewrite",
        "{} templates, {} calls retargeted",
        rewritten.len(),
        retargets.len()
    );

    Autoescaped {
        templates: TemplateSet {
            templates: rewritten,
            ids,
        },
        sliced_text,
    }
}

struct Rewriter<'a> {
    config: &'a AutoescaperConfig,
    escaping_modes: &'a IndexMap<NodeId, Vec<EscapingMode>>,
    retargets: &'a IndexMap<NodeId, String>,
}

impl Rewriter<'_> {
    fn rewrite_template(&self, template: &mut Template) {
        let noncontextual = template.autoescape == AutoescapeMode::NonContextual;
        self.rewrite_nodes(&mut template.body, noncontextual);
    }

    fn rewrite_nodes(&self, nodes: &mut [Node], noncontextual: bool) {
        for node in nodes {
            let id = node.id;
            match &mut node.kind {
                NodeKind::RawText(_) => {}
                NodeKind::Print(print) if noncontextual => {
                    if !self.has_escaping(&print.directives) {
                        print
                            .directives
                            .push(EscapingMode::EscapeHtml.directive_name().to_owned());
                    }
                }
                NodeKind::Print(print) => self.append_modes(id, &mut print.directives),
                NodeKind::If(branches) => {
                    for branch in branches {
                        self.rewrite_nodes(&mut branch.body, noncontextual);
                    }
                }
                NodeKind::Switch(switch) => {
                    for case in switch.cases.iter_mut().chain(switch.default.as_mut()) {
                        self.rewrite_nodes(&mut case.body, noncontextual);
                    }
                }
                NodeKind::For(for_node) => {
                    self.rewrite_nodes(&mut for_node.body, noncontextual);
                    if let Some(if_empty) = &mut for_node.if_empty {
                        self.rewrite_nodes(if_empty, noncontextual);
                    }
                }
                NodeKind::Call(call) => {
                    if let Some(target) = self.retargets.get(&id) {
                        call.callee = target.clone();
                    }
                    self.append_modes(id, &mut call.directives);
                    for param in &mut call.params {
                        self.rewrite_value(&mut param.value, noncontextual);
                    }
                }
                NodeKind::Let(let_node) => self.rewrite_value(&mut let_node.value, noncontextual),
                NodeKind::Msg(msg) => {
                    self.append_modes(id, &mut msg.directives);
                    self.rewrite_nodes(&mut msg.body, noncontextual);
                }
            }
        }
    }

    fn rewrite_value(&self, value: &mut Value, noncontextual: bool) {
        if let Value::Block(block) = value {
            self.rewrite_nodes(&mut block.body, noncontextual);
        }
    }

    /// Appends inferred modes the author did not already write. `|text`
    /// and the cancelling mode are never written back.
    fn append_modes(&self, node: NodeId, directives: &mut Vec<String>) {
        let Some(modes) = self.escaping_modes.get(&node) else {
            return;
        };
        for &mode in modes {
            if mode.is_internal_only() || mode == EscapingMode::NoAutoescape {
                continue;
            }
            let name = mode.directive_name();
            if !directives.iter().any(|d| d == name) {
                directives.push(name.to_owned());
            }
        }
    }

    fn has_escaping(&self, directives: &[String]) -> bool {
        directives
            .iter()
            .any(|d| self.config.is_cancelling(d) || EscapingMode::from_directive(d).is_some())
    }
}
