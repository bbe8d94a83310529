//! Source storage for a pass run.
//!
//! Template files are stored as owned strings. Spans in the template tree
//! point into them by [`SourceId`].

/// Lightweight handle to a source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct SourceId(pub(crate) u32);

impl SourceId {
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Describes the origin of a source.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SourceKind {
    /// Inline text (tests, tooling).
    Inline,
    /// Input read from stdin.
    Stdin,
    /// A file with its path.
    File(String),
}

impl SourceKind {
    /// Returns the display name for diagnostics.
    pub fn display_name(&self) -> &str {
        match self {
            SourceKind::Inline => "<inline>",
            SourceKind::Stdin => "<stdin>",
            SourceKind::File(path) => path,
        }
    }
}

/// A borrowed view of a source: id, kind, and content.
#[derive(Clone, Debug)]
pub struct Source<'s> {
    pub id: SourceId,
    pub kind: &'s SourceKind,
    pub content: &'s str,
}

#[derive(Clone, Debug)]
struct SourceEntry {
    kind: SourceKind,
    content: String,
    /// Byte offsets of line starts, for line/column lookups.
    line_starts: Vec<usize>,
}

/// Registry of all sources.
#[derive(Clone, Debug, Default)]
pub struct SourceMap {
    entries: Vec<SourceEntry>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_inline(&mut self, content: &str) -> SourceId {
        self.push_entry(SourceKind::Inline, content)
    }

    pub fn add_stdin(&mut self, content: &str) -> SourceId {
        self.push_entry(SourceKind::Stdin, content)
    }

    pub fn add_file(&mut self, path: &str, content: &str) -> SourceId {
        self.push_entry(SourceKind::File(path.to_owned()), content)
    }

    /// A map with one inline source.
    pub fn inline(content: &str) -> Self {
        let mut map = Self::new();
        map.add_inline(content);
        map
    }

    /// Panics on an id from another map.
    pub fn content(&self, id: SourceId) -> &str {
        &self.entry(id).content
    }

    pub fn kind(&self, id: SourceId) -> &SourceKind {
        &self.entry(id).kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: SourceId) -> Source<'_> {
        let entry = self.entry(id);
        Source {
            id,
            kind: &entry.kind,
            content: &entry.content,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Source<'_>> {
        self.entries.iter().enumerate().map(|(idx, entry)| Source {
            id: SourceId(idx as u32),
            kind: &entry.kind,
            content: &entry.content,
        })
    }

    /// 1-based line and character column of a byte offset.
    pub fn line_col(&self, id: SourceId, offset: usize) -> (u32, u32) {
        let entry = self.entry(id);
        let offset = offset.min(entry.content.len());
        let line = entry.line_starts.partition_point(|&start| start <= offset) - 1;
        let line_start = entry.line_starts[line];
        let column = entry
            .content
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        (line as u32 + 1, column as u32 + 1)
    }

    fn entry(&self, id: SourceId) -> &SourceEntry {
        crate::invariants::ensure_source(self.entries.get(id.0 as usize))
    }

    fn push_entry(&mut self, kind: SourceKind, content: &str) -> SourceId {
        let id = SourceId(self.entries.len() as u32);
        let line_starts = std::iter::once(0)
            .chain(line_break_ends(content))
            .collect();
        self.entries.push(SourceEntry {
            kind,
            content: content.to_owned(),
            line_starts,
        });
        id
    }
}

fn line_break_ends(content: &str) -> impl Iterator<Item = usize> + '_ {
    content
        .bytes()
        .enumerate()
        .filter(|&(_, b)| b == b'\n')
        .map(|(i, _)| i + 1)
}
