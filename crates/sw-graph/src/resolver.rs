//! Dependency resolution for stylesheet entry points.
//!
//! The [`DependencyResolver`] trait is the seam between the watcher and the
//! import discovery strategy. [`SassGraphResolver`] is the filesystem-backed
//! implementation: a breadth-first walk over import directives, resolving
//! each target against an ordered list of load paths.
//!
//! # Resolution Order
//!
//! For an import `name` found in `dir/file.scss`, the load paths are
//! `dir`, the entry point's directory, then every configured search path.
//! For each load path, in order, the first existing file wins among:
//!
//! 1. `name.<ext>` for every relevant extension
//! 2. `_name.<ext>` (partials)
//! 3. `name/_index.<ext>` and `name/index.<ext>`
//!
//! A relevant extension already present in `name` is stripped first, so
//! `@import "vars.scss"` also finds `_vars.scss`.

use std::collections::VecDeque;

use camino::{Utf8Path, Utf8PathBuf};
use smallvec::SmallVec;
use sw_core::{FxHashSet, RelevantExtensions, WatchOptions, fx_hash_set, normalize_path};

use crate::error::ResolveError;
use crate::graph::ImportGraph;
use crate::import::{Syntax, extract_imports};

/// Options controlling how imports are located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Extra directories searched after the importing file's directory and
    /// the entry point's directory. Must be absolute.
    pub search_paths: Vec<Utf8PathBuf>,

    /// Extensions tried, in order, when locating an import.
    pub extensions: RelevantExtensions,

    /// Fail on imports that cannot be located instead of skipping them.
    pub strict: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            extensions: RelevantExtensions::default(),
            strict: false,
        }
    }
}

impl ResolveOptions {
    /// Derives resolution options from watch options.
    #[must_use]
    pub fn from_watch_options(options: &WatchOptions) -> Self {
        Self {
            search_paths: options.search_paths.clone(),
            extensions: options.extensions.clone(),
            strict: options.strict_imports,
        }
    }
}

/// Computes the set of files an entry point depends on.
///
/// Implementations must be [`Send`] and [`Sync`] because the watcher calls
/// them from its event loop task.
///
/// # Examples
///
/// ```
/// use sw_graph::{DependencyResolver, ImportGraph, ResolveError, ResolveOptions};
/// use camino::Utf8Path;
///
/// /// Treats every entry point as standalone.
/// struct NoImports;
///
/// impl DependencyResolver for NoImports {
///     fn resolve(
///         &self,
///         entry: &Utf8Path,
///         _options: &ResolveOptions,
///     ) -> Result<ImportGraph, ResolveError> {
///         Ok(ImportGraph::new(entry.to_owned()))
///     }
/// }
/// ```
pub trait DependencyResolver: Send + Sync + 'static {
    /// Resolves the full import graph of `entry`.
    ///
    /// The returned graph always contains `entry` itself.
    fn resolve(&self, entry: &Utf8Path, options: &ResolveOptions)
    -> Result<ImportGraph, ResolveError>;
}

/// Filesystem-backed resolver following Sass load-path semantics.
///
/// Unreadable imported files are kept in the graph without edges (or
/// reported, in strict mode). Import cycles are walked once.
///
/// # Examples
///
/// ```no_run
/// use sw_graph::{DependencyResolver, ResolveOptions, SassGraphResolver};
/// use camino::Utf8Path;
///
/// let graph = SassGraphResolver
///     .resolve(Utf8Path::new("/project/styles/main.scss"), &ResolveOptions::default())?;
/// for path in graph.paths() {
///     println!("{path}");
/// }
/// # Ok::<(), sw_graph::ResolveError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SassGraphResolver;

impl DependencyResolver for SassGraphResolver {
    fn resolve(
        &self,
        entry: &Utf8Path,
        options: &ResolveOptions,
    ) -> Result<ImportGraph, ResolveError> {
        if !entry.is_file() {
            return Err(ResolveError::EntryNotFound(entry.to_owned()));
        }

        let entry_dir = entry.parent().unwrap_or(Utf8Path::new("/"));
        let mut graph = ImportGraph::new(entry.to_owned());
        let mut queued: FxHashSet<Utf8PathBuf> = fx_hash_set();
        let mut queue: VecDeque<Utf8PathBuf> = VecDeque::new();
        queued.insert(entry.to_owned());
        queue.push_back(entry.to_owned());

        while let Some(file) = queue.pop_front() {
            let source = match std::fs::read_to_string(&file) {
                Ok(source) => source,
                Err(err) if file.as_path() != entry && !options.strict => {
                    tracing::debug!(path = %file, error = %err, "Skipping unreadable stylesheet");
                    continue;
                }
                Err(err) => return Err(ResolveError::read(file, err)),
            };

            let imports = extract_imports(&source, Syntax::from_path(&file))?;
            if imports.is_empty() {
                continue;
            }

            let paths = load_paths(&file, entry_dir, &options.search_paths);

            for import in imports.iter().filter(|import| !import.is_external()) {
                match resolve_import(&import.path, &paths, &options.extensions) {
                    Some(target) => {
                        graph.add_edge(&file, &target);
                        if queued.insert(target.clone()) {
                            queue.push_back(target);
                        }
                    }
                    None if options.strict => {
                        return Err(ResolveError::UnresolvedImport {
                            importer: file,
                            import: import.path.clone(),
                        });
                    }
                    None => {
                        tracing::debug!(importer = %file, import = %import.path, "Skipping unresolved import");
                    }
                }
            }
        }

        Ok(graph)
    }
}

/// Builds the ordered, de-duplicated load paths for imports found in `file`.
fn load_paths(
    file: &Utf8Path,
    entry_dir: &Utf8Path,
    search_paths: &[Utf8PathBuf],
) -> SmallVec<[Utf8PathBuf; 4]> {
    let mut paths: SmallVec<[Utf8PathBuf; 4]> = SmallVec::new();
    let file_dir = file.parent().unwrap_or(Utf8Path::new("/"));

    for dir in [file_dir, entry_dir]
        .into_iter()
        .chain(search_paths.iter().map(Utf8PathBuf::as_path))
    {
        if !paths.iter().any(|p| p == dir) {
            paths.push(dir.to_owned());
        }
    }

    paths
}

/// Locates the file an import target refers to.
///
/// Returns the normalized path of the first existing regular file, or `None`
/// if no candidate exists in any load path.
///
/// # Examples
///
/// ```no_run
/// use sw_graph::resolve_import;
/// use sw_core::RelevantExtensions;
/// use camino::Utf8PathBuf;
///
/// let load_paths = [Utf8PathBuf::from("/project/styles")];
/// // Finds /project/styles/partials/_vars.scss if it exists.
/// let found = resolve_import("partials/vars", &load_paths, &RelevantExtensions::default());
/// ```
#[must_use]
pub fn resolve_import(
    import: &str,
    load_paths: &[Utf8PathBuf],
    extensions: &RelevantExtensions,
) -> Option<Utf8PathBuf> {
    let target = Utf8Path::new(import.trim());
    let stem = match target.extension() {
        Some(ext) if extensions.contains(ext) => target.with_extension(""),
        _ => target.to_owned(),
    };
    let base = stem.file_name()?;
    let partial = match stem.parent() {
        Some(parent) => parent.join(format!("_{base}")),
        None => Utf8PathBuf::from(format!("_{base}")),
    };

    for load_path in load_paths {
        let direct = extensions
            .iter()
            .map(|ext| load_path.join(format!("{stem}.{ext}")));
        let partials = extensions
            .iter()
            .map(|ext| load_path.join(format!("{partial}.{ext}")));
        let indexes = extensions.iter().flat_map(|ext| {
            [
                load_path.join(&stem).join(format!("_index.{ext}")),
                load_path.join(&stem).join(format!("index.{ext}")),
            ]
        });

        if let Some(found) = direct.chain(partials).chain(indexes).find(|c| c.is_file()) {
            return Some(normalize_path(load_path, &found));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        root: Utf8PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().expect("Failed to create temp directory");
            let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 path");
            Self { _dir: dir, root }
        }

        fn write(&self, relative: &str, contents: &str) -> Utf8PathBuf {
            let path = self.root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(&path, contents).expect("write file");
            path
        }
    }

    fn sorted(graph: &ImportGraph) -> Vec<Utf8PathBuf> {
        let mut paths: Vec<_> = graph.paths().cloned().collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_entry_without_imports() {
        let fx = Fixture::new();
        let entry = fx.write("main.scss", ".a { color: red; }");

        let graph = SassGraphResolver
            .resolve(&entry, &ResolveOptions::default())
            .expect("resolves");
        assert_eq!(sorted(&graph), vec![entry]);
    }

    #[test]
    fn test_missing_entry() {
        let fx = Fixture::new();
        let result = SassGraphResolver.resolve(&fx.root.join("nope.scss"), &ResolveOptions::default());
        assert!(matches!(result, Err(ResolveError::EntryNotFound(_))));
    }

    #[test]
    fn test_partials_and_transitive_imports() {
        let fx = Fixture::new();
        let entry = fx.write("main.scss", "@import 'partials/base';");
        let base = fx.write("partials/_base.scss", "@import \"colors\";");
        let colors = fx.write("partials/colors.scss", "$red: #f00;");

        let graph = SassGraphResolver
            .resolve(&entry, &ResolveOptions::default())
            .expect("resolves");
        assert_eq!(sorted(&graph), vec![entry, base, colors]);
    }

    #[test]
    fn test_direct_file_wins_over_partial() {
        let fx = Fixture::new();
        let entry = fx.write("main.scss", "@import 'vars';");
        let direct = fx.write("vars.scss", "");
        let partial = fx.write("_vars.scss", "");

        let graph = SassGraphResolver
            .resolve(&entry, &ResolveOptions::default())
            .expect("resolves");
        assert!(graph.contains(&direct));
        assert!(!graph.contains(&partial));
    }

    #[test]
    fn test_explicit_extension_is_stripped() {
        let fx = Fixture::new();
        let entry = fx.write("main.scss", "@use 'mixins.scss';");
        let mixins = fx.write("_mixins.scss", "");

        let graph = SassGraphResolver
            .resolve(&entry, &ResolveOptions::default())
            .expect("resolves");
        assert!(graph.contains(&mixins));
    }

    #[test]
    fn test_index_files() {
        let fx = Fixture::new();
        let entry = fx.write("main.scss", "@use 'theme';");
        let index = fx.write("theme/_index.scss", "");

        let graph = SassGraphResolver
            .resolve(&entry, &ResolveOptions::default())
            .expect("resolves");
        assert!(graph.contains(&index));
    }

    #[test]
    fn test_search_paths_and_entry_dir() {
        let fx = Fixture::new();
        let entry = fx.write("site/main.scss", "@import 'components/button';");
        let button = fx.write("site/components/_button.scss", "@import 'shared';");
        let shared = fx.write("lib/_shared.scss", "");

        let options = ResolveOptions {
            search_paths: vec![fx.root.join("lib")],
            ..ResolveOptions::default()
        };
        let graph = SassGraphResolver.resolve(&entry, &options).expect("resolves");
        assert_eq!(sorted(&graph), {
            let mut expected = vec![entry, button, shared];
            expected.sort();
            expected
        });
    }

    #[test]
    fn test_unresolved_import_is_skipped_by_default() {
        let fx = Fixture::new();
        let entry = fx.write("main.scss", "@import 'missing';\n@import 'present';");
        let present = fx.write("_present.scss", "");

        let graph = SassGraphResolver
            .resolve(&entry, &ResolveOptions::default())
            .expect("resolves");
        assert_eq!(sorted(&graph), vec![present, entry]);
    }

    #[test]
    fn test_unresolved_import_fails_in_strict_mode() {
        let fx = Fixture::new();
        let entry = fx.write("main.scss", "@import 'missing';");

        let options = ResolveOptions {
            strict: true,
            ..ResolveOptions::default()
        };
        match SassGraphResolver.resolve(&entry, &options) {
            Err(ResolveError::UnresolvedImport { importer, import }) => {
                assert_eq!(importer, entry);
                assert_eq!(import, "missing");
            }
            other => panic!("expected UnresolvedImport, got {other:?}"),
        }
    }

    #[test]
    fn test_cycles_terminate() {
        let fx = Fixture::new();
        let entry = fx.write("main.scss", "@import 'a';");
        let a = fx.write("_a.scss", "@import 'b';");
        let b = fx.write("_b.scss", "@import 'a';\n@import 'main';");

        let graph = SassGraphResolver
            .resolve(&entry, &ResolveOptions::default())
            .expect("resolves");
        assert_eq!(sorted(&graph), vec![a, b, entry]);
    }

    #[test]
    fn test_external_imports_are_ignored() {
        let fx = Fixture::new();
        let entry = fx.write(
            "main.scss",
            "@use 'sass:math';\n@import url(http://example.com/x.css);\n@import 'https://cdn/y.css';",
        );

        let options = ResolveOptions {
            strict: true,
            ..ResolveOptions::default()
        };
        let graph = SassGraphResolver.resolve(&entry, &options).expect("resolves");
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_relevant_extensions_limit_candidates() {
        let fx = Fixture::new();
        let entry = fx.write("main.scss", "@import 'theme';");
        fx.write("_theme.scss", "");

        let options = ResolveOptions {
            extensions: RelevantExtensions::new(["css"]),
            ..ResolveOptions::default()
        };
        let graph = SassGraphResolver.resolve(&entry, &options).expect("resolves");
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_load_paths_are_deduplicated() {
        let paths = load_paths(
            Utf8Path::new("/p/main.scss"),
            Utf8Path::new("/p"),
            &[Utf8PathBuf::from("/p"), Utf8PathBuf::from("/lib")],
        );
        assert_eq!(paths.as_slice(), [Utf8PathBuf::from("/p"), Utf8PathBuf::from("/lib")]);
    }
}
