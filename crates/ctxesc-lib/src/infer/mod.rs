//! Contextual autoescaping inference.
//!
//! [`Autoescaper::run`] walks a [`TemplateSet`], decides the escaping of
//! every dynamic value, specializes contextual templates per calling
//! context, and hands back the rewritten set.

mod engine;
mod store;

#[cfg(test)]
mod store_tests;

use ctxesc_core::{AutoescapeError, SlicedText};
use indexmap::{IndexMap, IndexSet};

use crate::source_map::SourceMap;
use crate::tree::{NodeId, TemplateSet, parse};

pub use engine::derived_name;
pub(crate) use store::Decisions;

/// Nested re-contextualizations allowed before the pass gives up.
pub const DEFAULT_RECONTEXTUALIZATION_FUEL: u32 = 256;

#[derive(Clone, Debug)]
pub struct AutoescaperConfig {
    cancelling_directives: IndexSet<String>,
    recontextualization_fuel: u32,
}

impl Default for AutoescaperConfig {
    fn default() -> Self {
        Self {
            cancelling_directives: IndexSet::from(["|noAutoescape".to_owned()]),
            recontextualization_fuel: DEFAULT_RECONTEXTUALIZATION_FUEL,
        }
    }
}

impl AutoescaperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a print directive that disables autoescaping. The leading `|`
    /// is optional.
    pub fn with_cancelling_directive(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.starts_with('|') {
            name
        } else {
            format!("|{name}")
        };
        self.cancelling_directives.insert(name);
        self
    }

    pub fn with_cancelling_directives<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .fold(self, |config, name| config.with_cancelling_directive(name))
    }

    pub fn with_recontextualization_fuel(mut self, fuel: u32) -> Self {
        self.recontextualization_fuel = fuel;
        self
    }

    /// Whether `directive` (possibly with `:args`) cancels autoescaping.
    pub fn is_cancelling(&self, directive: &str) -> bool {
        let name = directive.split(':').next().unwrap_or(directive).trim();
        self.cancelling_directives.contains(name)
    }

    pub fn cancelling_directives(&self) -> impl Iterator<Item = &str> {
        self.cancelling_directives.iter().map(String::as_str)
    }

    pub fn recontextualization_fuel(&self) -> u32 {
        self.recontextualization_fuel
    }
}

/// The rewritten templates, clones included, plus the context-labelled
/// raw text a Content-Security-Policy pass works from.
#[derive(Debug)]
pub struct Autoescaped {
    pub templates: TemplateSet,
    pub sliced_text: IndexMap<NodeId, SlicedText>,
}

#[derive(Clone, Debug, Default)]
pub struct Autoescaper {
    config: AutoescaperConfig,
}

impl Autoescaper {
    pub fn new(config: AutoescaperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AutoescaperConfig {
        &self.config
    }

    /// Runs the pass. `sources` resolves node spans in error locations.
    pub fn run(&self, set: TemplateSet, sources: &SourceMap) -> Result<Autoescaped, AutoescapeError> {
        let TemplateSet { templates, ids } = set;
        log::debug!(target: "ctxesc::infer", "autoescaping {} templates", templates.len());
        let (decisions, ids) = engine::Engine::new(&self.config, sources, templates, ids).run()?;
        Ok(crate::rewrite::apply(decisions, ids, &self.config))
    }

    /// Parses every source in `sources`, then runs the pass.
    pub fn run_sources(&self, sources: &SourceMap) -> crate::Result<Autoescaped> {
        let mut set = TemplateSet::new();
        for source in sources.iter() {
            parse(&mut set, source.id, source.content)?;
        }
        Ok(self.run(set, sources)?)
    }
}
