//! The template tree the pass runs over.
//!
//! A small stand-in for a template compiler's AST: every node has a stable
//! [`NodeId`] and a [`Span`]; the pass annotates print, call and message
//! nodes with escaping directives and may add specialized clones of
//! templates to the set.

mod lexer;
mod parser;
mod printer;

#[cfg(test)]
mod tree_tests;

use std::ops::Range;

use ctxesc_core::{AutoescapeMode, ContentKind};

use crate::source_map::SourceId;

pub use parser::{ParseError, parse};
pub use printer::{node_source, print_template, print_templates};
pub(crate) use printer::{branch_tag, value_tag};

/// Identifies a node (or template) within one [`TemplateSet`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Hands out fresh node ids, including for clones made by the pass.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Span {
    pub source: SourceId,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(source: SourceId, range: Range<usize>) -> Self {
        Self {
            source,
            start: range.start,
            end: range.end,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub span: Span,
    pub kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    RawText(String),
    Print(Print),
    If(Vec<IfBranch>),
    Switch(Switch),
    For(For),
    Call(Call),
    Let(Let),
    Msg(Msg),
}

/// `{$x |directive ...}` or `{print expr |directive ...}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Print {
    pub expr: String,
    /// Directive text such as `|escapeUri` or `|truncate:8`, in order.
    pub directives: Vec<String>,
}

/// `{if}`, `{elseif}` and a final condition-less `{else}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfBranch {
    pub id: NodeId,
    pub span: Span,
    pub condition: Option<String>,
    pub body: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Switch {
    pub expr: String,
    pub cases: Vec<Case>,
    pub default: Option<Case>,
}

/// A `{case}` (with its comma-separated values) or the `{default}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Case {
    pub id: NodeId,
    pub span: Span,
    pub values: Option<String>,
    pub body: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct For {
    pub var: String,
    pub iterable: String,
    pub body: Vec<Node>,
    pub if_empty: Option<Vec<Node>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    /// Fully qualified.
    pub callee: String,
    pub delegate: bool,
    pub data: Option<String>,
    pub params: Vec<Param>,
    pub directives: Vec<String>,
}

/// `{param name: expr /}` or `{param name kind="..."}...{/param}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub id: NodeId,
    pub span: Span,
    pub name: String,
    pub value: Value,
}

/// `{let $x: expr /}` or `{let $x kind="..."}...{/let}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Let {
    pub var: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Expr(String),
    Block(Block),
}

/// A block of template content, optionally typed with `kind="..."`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub kind: Option<ContentKind>,
    pub body: Vec<Node>,
}

/// `{msg ...}...{/msg}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Msg {
    /// Attribute text after the command name, e.g. `desc="Greeting"`.
    pub attributes: String,
    pub body: Vec<Node>,
    /// Escaping applied to the whole translated message.
    pub directives: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pub id: NodeId,
    /// Fully qualified, e.g. `ns.foo`.
    pub name: String,
    pub delegate: bool,
    pub variant: Option<String>,
    pub autoescape: AutoescapeMode,
    pub kind: Option<ContentKind>,
    pub span: Span,
    /// `{@param ...}` declarations, kept verbatim for printing.
    pub params: Vec<String>,
    pub body: Vec<Node>,
}

impl Template {
    /// Declared kind, for the kind-sensitive checks of strict templates.
    pub fn content_kind(&self) -> ContentKind {
        self.kind.unwrap_or(ContentKind::Html)
    }

    /// A copy named `name` where every node has a fresh id.
    pub fn clone_with_new_ids(&self, name: &str, ids: &mut IdGenerator) -> Template {
        Template {
            id: ids.next_id(),
            name: name.to_owned(),
            body: clone_nodes(&self.body, ids),
            ..self.clone()
        }
    }
}

fn clone_nodes(nodes: &[Node], ids: &mut IdGenerator) -> Vec<Node> {
    nodes.iter().map(|node| clone_node(node, ids)).collect()
}

fn clone_node(node: &Node, ids: &mut IdGenerator) -> Node {
    let id = ids.next_id();
    let kind = match &node.kind {
        NodeKind::RawText(_) | NodeKind::Print(_) => node.kind.clone(),
        NodeKind::If(branches) => NodeKind::If(
            branches
                .iter()
                .map(|branch| IfBranch {
                    id: ids.next_id(),
                    span: branch.span,
                    condition: branch.condition.clone(),
                    body: clone_nodes(&branch.body, ids),
                })
                .collect(),
        ),
        NodeKind::Switch(switch) => {
            let mut clone_case = |case: &Case| Case {
                id: ids.next_id(),
                span: case.span,
                values: case.values.clone(),
                body: clone_nodes(&case.body, ids),
            };
            NodeKind::Switch(Switch {
                expr: switch.expr.clone(),
                cases: switch.cases.iter().map(&mut clone_case).collect(),
                default: switch.default.as_ref().map(&mut clone_case),
            })
        }
        NodeKind::For(for_node) => NodeKind::For(For {
            var: for_node.var.clone(),
            iterable: for_node.iterable.clone(),
            body: clone_nodes(&for_node.body, ids),
            if_empty: for_node.if_empty.as_deref().map(|body| clone_nodes(body, ids)),
        }),
        NodeKind::Call(call) => NodeKind::Call(Call {
            params: call
                .params
                .iter()
                .map(|param| Param {
                    id: ids.next_id(),
                    span: param.span,
                    name: param.name.clone(),
                    value: clone_value(&param.value, ids),
                })
                .collect(),
            ..call.clone()
        }),
        NodeKind::Let(let_node) => NodeKind::Let(Let {
            var: let_node.var.clone(),
            value: clone_value(&let_node.value, ids),
        }),
        NodeKind::Msg(msg) => NodeKind::Msg(Msg {
            attributes: msg.attributes.clone(),
            body: clone_nodes(&msg.body, ids),
            directives: msg.directives.clone(),
        }),
    };
    Node {
        id,
        span: node.span,
        kind,
    }
}

fn clone_value(value: &Value, ids: &mut IdGenerator) -> Value {
    match value {
        Value::Expr(expr) => Value::Expr(expr.clone()),
        Value::Block(block) => Value::Block(Block {
            kind: block.kind,
            body: clone_nodes(&block.body, ids),
        }),
    }
}

/// Parsed templates plus the id generator that numbered them.
#[derive(Clone, Debug, Default)]
pub struct TemplateSet {
    pub templates: Vec<Template>,
    pub ids: IdGenerator,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// Splits the raw text node `id` at byte `offset` and inserts `nodes`
    /// between the halves. The left half keeps the id. Returns `false` if
    /// no raw text node has that id or the offset is out of range.
    pub fn splice_raw_text(&mut self, id: NodeId, offset: usize, nodes: Vec<Node>) -> bool {
        let mut nodes = Some(nodes);
        let ids = &mut self.ids;
        self.templates
            .iter_mut()
            .any(|template| splice_in(&mut template.body, id, offset, &mut nodes, ids))
    }
}

fn splice_in(
    body: &mut Vec<Node>,
    id: NodeId,
    offset: usize,
    nodes: &mut Option<Vec<Node>>,
    ids: &mut IdGenerator,
) -> bool {
    if let Some(index) = body.iter().position(|node| node.id == id) {
        let node = &body[index];
        let NodeKind::RawText(text) = &node.kind else {
            return false;
        };
        if offset > text.len() || !text.is_char_boundary(offset) {
            return false;
        }
        let (left, right) = text.split_at(offset);
        let split = node.span.start + offset.min(node.span.end - node.span.start);
        let left_node = Node {
            id: node.id,
            span: Span { end: split, ..node.span },
            kind: NodeKind::RawText(left.to_owned()),
        };
        let right_node = Node {
            id: ids.next_id(),
            span: Span { start: split, ..node.span },
            kind: NodeKind::RawText(right.to_owned()),
        };
        let inserted = nodes.take().unwrap_or_default();
        let tail = [left_node]
            .into_iter()
            .chain(inserted)
            .chain([right_node])
            .filter(|n| !matches!(&n.kind, NodeKind::RawText(t) if t.is_empty()));
        body.splice(index..=index, tail.collect::<Vec<_>>());
        return true;
    }

    body.iter_mut().any(|node| match &mut node.kind {
        NodeKind::RawText(_) | NodeKind::Print(_) => false,
        NodeKind::If(branches) => branches
            .iter_mut()
            .any(|b| splice_in(&mut b.body, id, offset, nodes, ids)),
        NodeKind::Switch(switch) => switch
            .cases
            .iter_mut()
            .chain(switch.default.as_mut())
            .any(|c| splice_in(&mut c.body, id, offset, nodes, ids)),
        NodeKind::For(for_node) => {
            splice_in(&mut for_node.body, id, offset, nodes, ids)
                || for_node
                    .if_empty
                    .as_mut()
                    .is_some_and(|body| splice_in(body, id, offset, nodes, ids))
        }
        NodeKind::Call(call) => call.params.iter_mut().any(|p| match &mut p.value {
            Value::Block(block) => splice_in(&mut block.body, id, offset, nodes, ids),
            Value::Expr(_) => false,
        }),
        NodeKind::Let(let_node) => match &mut let_node.value {
            Value::Block(block) => splice_in(&mut block.body, id, offset, nodes, ids),
            Value::Expr(_) => false,
        },
        NodeKind::Msg(msg) => splice_in(&mut msg.body, id, offset, nodes, ids),
    })
}
