//! The import graph of a single entry point.

use camino::{Utf8Path, Utf8PathBuf};
use smallvec::SmallVec;
use sw_core::{FxHashMap, fx_hash_map};

/// A file in the import graph and its direct edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphNode {
    /// Files this file imports directly.
    pub imports: SmallVec<[Utf8PathBuf; 4]>,
}

/// Every file reachable from an entry point through import directives.
///
/// The entry point itself is always part of the index, even when it imports
/// nothing. Keys are absolute, normalized paths.
///
/// # Examples
///
/// ```
/// use sw_graph::ImportGraph;
/// use camino::Utf8Path;
///
/// let mut graph = ImportGraph::new("/p/main.scss".into());
/// graph.add_edge(Utf8Path::new("/p/main.scss"), Utf8Path::new("/p/_vars.scss"));
///
/// assert_eq!(graph.len(), 2);
/// assert!(graph.contains(Utf8Path::new("/p/_vars.scss")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportGraph {
    entry: Utf8PathBuf,
    index: FxHashMap<Utf8PathBuf, GraphNode>,
}

impl ImportGraph {
    /// Creates a graph containing only the entry point.
    #[must_use]
    pub fn new(entry: Utf8PathBuf) -> Self {
        let mut index = fx_hash_map();
        index.insert(entry.clone(), GraphNode::default());
        Self { entry, index }
    }

    /// Returns the entry point this graph was resolved from.
    #[inline]
    #[must_use]
    pub fn entry(&self) -> &Utf8Path {
        &self.entry
    }

    /// Adds a file without edges, returning `true` if it was new.
    pub fn insert_file(&mut self, path: &Utf8Path) -> bool {
        if self.index.contains_key(path) {
            return false;
        }
        self.index.insert(path.to_owned(), GraphNode::default());
        true
    }

    /// Records that `from` imports `to`, adding either file if needed.
    pub fn add_edge(&mut self, from: &Utf8Path, to: &Utf8Path) {
        self.insert_file(from);
        self.insert_file(to);

        if let Some(node) = self.index.get_mut(from)
            && !node.imports.iter().any(|p| p == to)
        {
            node.imports.push(to.to_owned());
        }
    }

    /// Returns `true` if the file is part of the graph.
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.index.contains_key(path)
    }

    /// Returns the node for a file, if present.
    #[inline]
    #[must_use]
    pub fn get(&self, path: &Utf8Path) -> Option<&GraphNode> {
        self.index.get(path)
    }

    /// Returns the number of files in the graph.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Always `false`: the entry point is part of every graph.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Iterates over every file in the graph.
    pub fn paths(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.index.keys()
    }

    /// Consumes the graph, yielding every file in it.
    pub fn into_paths(self) -> impl Iterator<Item = Utf8PathBuf> {
        self.index.into_keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str) -> &Utf8Path {
        Utf8Path::new(path)
    }

    #[test]
    fn test_new_graph_contains_entry() {
        let graph = ImportGraph::new("/p/main.scss".into());
        assert_eq!(graph.len(), 1);
        assert!(graph.contains(p("/p/main.scss")));
        assert_eq!(graph.entry(), p("/p/main.scss"));
        assert!(!graph.is_empty());
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let mut graph = ImportGraph::new("/p/main.scss".into());
        graph.add_edge(p("/p/main.scss"), p("/p/_a.scss"));
        graph.add_edge(p("/p/main.scss"), p("/p/_a.scss"));

        let node = graph.get(p("/p/main.scss")).expect("entry present");
        assert_eq!(node.imports.len(), 1);
        let imported = graph.get(p("/p/_a.scss")).expect("import present");
        assert!(imported.imports.is_empty());
    }

    #[test]
    fn test_into_paths_yields_every_file() {
        let mut graph = ImportGraph::new("/p/main.scss".into());
        graph.add_edge(p("/p/main.scss"), p("/p/_a.scss"));
        let mut paths: Vec<_> = graph.into_paths().collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![Utf8PathBuf::from("/p/_a.scss"), Utf8PathBuf::from("/p/main.scss")]
        );
    }
}
