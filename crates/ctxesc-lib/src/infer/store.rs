//! Layered store of inference decisions.
//!
//! The base layer holds everything decided so far. A speculative walk
//! pushes a layer on top; on success the layer is folded into the one
//! below, on failure it is discarded whole. Lookups see the top layer
//! first, so a speculative walk observes its own guesses.

use std::rc::Rc;

use ctxesc_core::{Context, EscapingMode, SlicedText};
use indexmap::{IndexMap, IndexSet};

use crate::invariants::ensure_speculative_layer;
use crate::tree::{NodeId, Template};

#[derive(Debug, Default)]
struct Layer {
    /// Templates by full name; delegates share a name. Clones added by a
    /// layer live here until it is folded.
    templates: IndexMap<String, Vec<Rc<Template>>>,
    end_contexts: IndexMap<String, Context>,
    escaping_modes: IndexMap<NodeId, Vec<EscapingMode>>,
    /// Calls redirected to a specialized clone.
    retargets: IndexMap<NodeId, String>,
    checked: IndexSet<String>,
    sliced_text: IndexMap<NodeId, SlicedText>,
}

impl Layer {
    fn absorb(&mut self, child: Layer) {
        self.templates.extend(child.templates);
        self.end_contexts.extend(child.end_contexts);
        self.escaping_modes.extend(child.escaping_modes);
        self.retargets.extend(child.retargets);
        self.checked.extend(child.checked);
        self.sliced_text.extend(child.sliced_text);
    }
}

/// Everything the pass decided, ready for the rewriter.
#[derive(Debug, Default)]
pub struct Decisions {
    pub templates: IndexMap<String, Vec<Rc<Template>>>,
    pub escaping_modes: IndexMap<NodeId, Vec<EscapingMode>>,
    pub retargets: IndexMap<NodeId, String>,
    pub sliced_text: IndexMap<NodeId, SlicedText>,
}

#[derive(Debug)]
pub struct Inferences {
    layers: Vec<Layer>,
}

impl Inferences {
    pub fn new(templates: impl IntoIterator<Item = Template>) -> Self {
        let mut base = Layer::default();
        for template in templates {
            base.templates
                .entry(template.name.clone())
                .or_default()
                .push(Rc::new(template));
        }
        Self { layers: vec![base] }
    }

    /// Number of layers, the base included.
    #[cfg(test)]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn push(&mut self) {
        self.layers.push(Layer::default());
    }

    /// Commits the top layer into the one below.
    pub fn fold(&mut self) {
        ensure_speculative_layer(self.layers.len(), "fold");
        if let Some(top) = self.layers.pop()
            && let Some(parent) = self.layers.last_mut()
        {
            parent.absorb(top);
        }
    }

    /// Drops the top layer and everything recorded in it.
    pub fn discard(&mut self) {
        ensure_speculative_layer(self.layers.len(), "discard");
        self.layers.pop();
    }

    fn top(&mut self) -> &mut Layer {
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    fn lookup<'a, T: ?Sized>(&'a self, get: impl Fn(&'a Layer) -> Option<&'a T>) -> Option<&'a T> {
        self.layers.iter().rev().find_map(get)
    }

    /// Names of all templates, originals first.
    pub fn template_names(&self) -> Vec<String> {
        let mut names = IndexSet::new();
        for layer in &self.layers {
            names.extend(layer.templates.keys().cloned());
        }
        names.into_iter().collect()
    }

    pub fn templates(&self, name: &str) -> Option<Vec<Rc<Template>>> {
        self.lookup(|layer| layer.templates.get(name)).cloned()
    }

    pub fn add_templates(&mut self, name: &str, templates: Vec<Rc<Template>>) {
        self.top().templates.insert(name.to_owned(), templates);
    }

    pub fn end_context(&self, name: &str) -> Option<Context> {
        self.lookup(|layer| layer.end_contexts.get(name)).copied()
    }

    pub fn record_end_context(&mut self, name: &str, context: Context) {
        self.top().end_contexts.insert(name.to_owned(), context);
    }

    #[cfg(test)]
    pub fn escaping_modes(&self, node: NodeId) -> Option<&[EscapingMode]> {
        self.lookup(|layer| layer.escaping_modes.get(&node))
            .map(Vec::as_slice)
    }

    pub fn record_escaping_modes(&mut self, node: NodeId, modes: Vec<EscapingMode>) {
        self.top().escaping_modes.insert(node, modes);
    }

    #[cfg(test)]
    pub fn retargeted(&self, call: NodeId) -> Option<&str> {
        self.lookup(|layer| layer.retargets.get(&call))
            .map(String::as_str)
    }

    pub fn retarget(&mut self, call: NodeId, name: &str) {
        self.top().retargets.insert(call, name.to_owned());
    }

    pub fn was_checked(&self, name: &str) -> bool {
        self.layers.iter().any(|layer| layer.checked.contains(name))
    }

    pub fn record_checked(&mut self, name: &str) {
        self.top().checked.insert(name.to_owned());
    }

    #[cfg(test)]
    pub fn sliced_text(&self, node: NodeId) -> Option<&SlicedText> {
        self.lookup(|layer| layer.sliced_text.get(&node))
    }

    pub fn record_sliced_text(&mut self, node: NodeId, sliced: SlicedText) {
        self.top().sliced_text.insert(node, sliced);
    }

    /// Flattens every layer. Called once no speculative walk is open.
    pub fn into_decisions(self) -> Decisions {
        let mut layers = self.layers.into_iter();
        let mut base = layers.next().unwrap_or_default();
        for layer in layers {
            base.absorb(layer);
        }
        Decisions {
            templates: base.templates,
            escaping_modes: base.escaping_modes,
            retargets: base.retargets,
            sliced_text: base.sliced_text,
        }
    }
}
