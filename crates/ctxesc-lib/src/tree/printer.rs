//! Renders templates back to source.
//!
//! Output re-parses to the same tree: each template body is printed on one
//! line so line joining leaves it alone, and characters the lexer treats
//! specially are written as `{lb}`, `{rb}`, `{\n}` and friends.

use ctxesc_core::AutoescapeMode;

use super::{Call, IfBranch, Node, NodeKind, Param, Print, Template, Value};

pub fn print_templates(templates: &[Template]) -> String {
    templates
        .iter()
        .map(print_template)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn print_template(template: &Template) -> String {
    let command = if template.delegate {
        "deltemplate"
    } else {
        "template"
    };
    let mut out = format!("{{{command} {}", template.name);
    if let Some(variant) = &template.variant {
        out.push_str(&format!(" variant=\"{variant}\""));
    }
    if template.autoescape != AutoescapeMode::Strict {
        out.push_str(&format!(
            " autoescape=\"{}\"",
            template.autoescape.attribute_value()
        ));
    }
    if let Some(kind) = template.kind {
        out.push_str(&format!(" kind=\"{kind}\""));
    }
    out.push_str("}\n");

    for param in &template.params {
        out.push_str(&format!("  {{{param}}}\n"));
    }

    let mut body = String::new();
    render_nodes(&mut body, &template.body);
    if !body.is_empty() {
        // Line joining trims the edges of a line.
        if let Some(rest) = body.strip_prefix(' ') {
            body = format!("{{sp}}{rest}");
        }
        if let Some(rest) = body.strip_suffix(' ') {
            body = format!("{rest}{{sp}}");
        }
        out.push_str(&body);
        out.push('\n');
    }

    out.push_str(&format!("{{/{command}}}\n"));
    out
}

/// One node, including everything nested in it.
pub fn node_source(node: &Node) -> String {
    let mut out = String::new();
    render_node(&mut out, node);
    out
}

/// `{if $c}`, `{elseif $d}` or `{else}`.
pub(crate) fn branch_tag(index: usize, branch: &IfBranch) -> String {
    match (&branch.condition, index) {
        (Some(condition), 0) => format!("{{if {condition}}}"),
        (Some(condition), _) => format!("{{elseif {condition}}}"),
        (None, _) => "{else}".to_owned(),
    }
}

/// Opening tag of a `{param}` or `{let}`, e.g. `{param x kind="html"}`.
pub(crate) fn value_tag(command: &str, name: &str, value: &Value) -> String {
    match value {
        Value::Expr(expr) => format!("{{{command} {name}: {expr} /}}"),
        Value::Block(block) => match block.kind {
            Some(kind) => format!("{{{command} {name} kind=\"{kind}\"}}"),
            None => format!("{{{command} {name}}}"),
        },
    }
}

fn render_nodes(out: &mut String, nodes: &[Node]) {
    for node in nodes {
        render_node(out, node);
    }
}

fn render_node(out: &mut String, node: &Node) {
    match &node.kind {
        NodeKind::RawText(text) => render_text(out, text),
        NodeKind::Print(print) => render_print(out, print),
        NodeKind::If(branches) => {
            for (i, branch) in branches.iter().enumerate() {
                out.push_str(&branch_tag(i, branch));
                render_nodes(out, &branch.body);
            }
            out.push_str("{/if}");
        }
        NodeKind::Switch(switch) => {
            out.push_str(&format!("{{switch {}}}", switch.expr));
            for case in &switch.cases {
                let values = case.values.as_deref().unwrap_or_default();
                out.push_str(&format!("{{case {values}}}"));
                render_nodes(out, &case.body);
            }
            if let Some(default) = &switch.default {
                out.push_str("{default}");
                render_nodes(out, &default.body);
            }
            out.push_str("{/switch}");
        }
        NodeKind::For(for_node) => {
            out.push_str(&format!("{{for {} in {}}}", for_node.var, for_node.iterable));
            render_nodes(out, &for_node.body);
            if let Some(if_empty) = &for_node.if_empty {
                out.push_str("{ifempty}");
                render_nodes(out, if_empty);
            }
            out.push_str("{/for}");
        }
        NodeKind::Call(call) => render_call(out, call),
        NodeKind::Let(let_node) => render_value(out, "let", &let_node.var, &let_node.value),
        NodeKind::Msg(msg) => {
            out.push_str("{msg");
            if !msg.attributes.is_empty() {
                out.push(' ');
                out.push_str(&msg.attributes);
            }
            render_directives(out, &msg.directives);
            out.push('}');
            render_nodes(out, &msg.body);
            out.push_str("{/msg}");
        }
    }
}

fn render_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '{' => out.push_str("{lb}"),
            '}' => out.push_str("{rb}"),
            '\n' => out.push_str("{\\n}"),
            '\r' => out.push_str("{\\r}"),
            c => out.push(c),
        }
    }
}

fn render_print(out: &mut String, print: &Print) {
    if print.expr.starts_with('$') {
        out.push('{');
    } else {
        out.push_str("{print ");
    }
    out.push_str(&print.expr);
    render_directives(out, &print.directives);
    out.push('}');
}

fn render_directives(out: &mut String, directives: &[String]) {
    for directive in directives {
        out.push(' ');
        out.push_str(directive);
    }
}

fn render_call(out: &mut String, call: &Call) {
    let command = if call.delegate { "delcall" } else { "call" };
    out.push_str(&format!("{{{command} {}", call.callee));
    if let Some(data) = &call.data {
        out.push_str(&format!(" data=\"{data}\""));
    }
    render_directives(out, &call.directives);
    if call.params.is_empty() {
        out.push_str(" /}");
        return;
    }
    out.push('}');
    for Param { name, value, .. } in &call.params {
        render_value(out, "param", name, value);
    }
    out.push_str(&format!("{{/{command}}}"));
}

fn render_value(out: &mut String, command: &str, name: &str, value: &Value) {
    out.push_str(&value_tag(command, name, value));
    if let Value::Block(block) = value {
        render_nodes(out, &block.body);
        out.push_str(&format!("{{/{command}}}"));
    }
}
