//! Import directive discovery in stylesheet sources.
//!
//! Extraction is lexical: comments are blanked out, then `@import`, `@use`
//! and `@forward` directives are matched and their targets pulled out of the
//! quoted arguments. No stylesheet is compiled or evaluated.
//!
//! ```text
//! source ──► strip_comments ──► directive pattern ──► quoted targets ──► ImportStatement
//! ```

use std::sync::OnceLock;

use camino::Utf8Path;
use regex::Regex;
use smallvec::SmallVec;

use crate::error::ResolveError;

/// Directive pattern for brace-delimited syntaxes (SCSS and CSS).
const BLOCK_DIRECTIVE: &str = r"@(import|use|forward)\s+([^;{}]+)";

/// Directive pattern for the indented syntax, where a line ends a statement.
const INDENTED_DIRECTIVE: &str = r"(?m)@(import|use|forward)\s+([^\n;]+)";

/// A single- or double-quoted string.
const QUOTED: &str = r#""([^"]*)"|'([^']*)'"#;

static COMPILED_BLOCK: OnceLock<Regex> = OnceLock::new();
static COMPILED_INDENTED: OnceLock<Regex> = OnceLock::new();
static COMPILED_QUOTED: OnceLock<Regex> = OnceLock::new();

/// The syntax of a stylesheet, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// SCSS: brace-delimited, `//` and `/* */` comments.
    Scss,
    /// Indented Sass: newline-delimited, `//` and `/* */` comments.
    Sass,
    /// Plain CSS: brace-delimited, `/* */` comments only.
    Css,
}

impl Syntax {
    /// Infers the syntax from a file extension. Unknown extensions are treated as SCSS.
    ///
    /// # Examples
    ///
    /// ```
    /// use sw_graph::Syntax;
    /// use camino::Utf8Path;
    ///
    /// assert_eq!(Syntax::from_path(Utf8Path::new("a/_b.sass")), Syntax::Sass);
    /// assert_eq!(Syntax::from_path(Utf8Path::new("a/b.CSS")), Syntax::Css);
    /// assert_eq!(Syntax::from_path(Utf8Path::new("a/b.scss")), Syntax::Scss);
    /// ```
    #[must_use]
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("sass") => Self::Sass,
            Some(ext) if ext.eq_ignore_ascii_case("css") => Self::Css,
            _ => Self::Scss,
        }
    }

    /// Returns `true` if `//` starts a comment in this syntax.
    #[inline]
    #[must_use]
    pub const fn has_line_comments(self) -> bool {
        !matches!(self, Self::Css)
    }
}

/// The directive an import was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// `@import`, which may list several targets.
    Import,
    /// `@use`, a single module.
    Use,
    /// `@forward`, a single module.
    Forward,
}

impl ImportKind {
    fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "use" => Self::Use,
            "forward" => Self::Forward,
            _ => Self::Import,
        }
    }
}

/// One import target as written in a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportStatement {
    /// The target exactly as written, without quotes.
    pub path: String,
    /// The directive the target came from.
    pub kind: ImportKind,
}

impl ImportStatement {
    /// Creates a new import statement.
    #[must_use]
    pub fn new(path: impl Into<String>, kind: ImportKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Returns `true` if the target can never be a local file.
    ///
    /// Covers URLs, protocol-relative paths, `url(...)` arguments, built-in
    /// `sass:` modules and interpolated targets.
    ///
    /// # Examples
    ///
    /// ```
    /// use sw_graph::{ImportKind, ImportStatement};
    ///
    /// assert!(ImportStatement::new("sass:math", ImportKind::Use).is_external());
    /// assert!(ImportStatement::new("https://fonts.example/css", ImportKind::Import).is_external());
    /// assert!(!ImportStatement::new("partials/vars", ImportKind::Import).is_external());
    /// ```
    #[must_use]
    pub fn is_external(&self) -> bool {
        let path = self.path.trim();
        path.starts_with("url(")
            || path.starts_with("http://")
            || path.starts_with("https://")
            || path.starts_with("//")
            || path.starts_with("sass:")
            || path.contains("#{")
    }
}

/// Blanks out comments, preserving line breaks and quoted strings.
///
/// A `//` directly after a `:` is kept, so unquoted `url(http://...)`
/// arguments survive in SCSS and Sass sources.
#[must_use]
pub fn strip_comments(source: &str, syntax: Syntax) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;
    let mut prev = '\0';

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q || c == '\n' {
                quote = None;
            }
            prev = c;
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut last = '\0';
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        out.push('\n');
                    }
                    if last == '*' && inner == '/' {
                        break;
                    }
                    last = inner;
                }
                out.push(' ');
            }
            '/' if syntax.has_line_comments() && prev != ':' && chars.peek() == Some(&'/') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            _ => out.push(c),
        }
        prev = c;
    }

    out
}

/// Extracts every import target from a stylesheet source.
///
/// `@import` contributes every quoted target in its argument list (and, in
/// the indented syntax, unquoted comma-separated targets). `@use` and
/// `@forward` contribute their first quoted target only; trailing
/// `with (...)`, `as` and `show`/`hide` clauses are ignored.
///
/// # Errors
///
/// Returns [`ResolveError::Pattern`] if a directive pattern fails to compile.
///
/// # Examples
///
/// ```
/// use sw_graph::{extract_imports, ImportKind, Syntax};
///
/// let source = r#"
/// // @import "commented-out";
/// @use "config" with ($primary: blue);
/// @import "reset", 'layout/grid';
/// "#;
///
/// let imports = extract_imports(source, Syntax::Scss).unwrap();
/// let targets: Vec<_> = imports.iter().map(|i| i.path.as_str()).collect();
/// assert_eq!(targets, ["config", "reset", "layout/grid"]);
/// assert_eq!(imports[0].kind, ImportKind::Use);
/// ```
pub fn extract_imports(
    source: &str,
    syntax: Syntax,
) -> Result<SmallVec<[ImportStatement; 8]>, ResolveError> {
    let stripped = strip_comments(source, syntax);
    let directive = directive_pattern(syntax)?;
    let quoted = compiled(&COMPILED_QUOTED, QUOTED)?;

    let mut imports: SmallVec<[ImportStatement; 8]> = SmallVec::new();

    for captures in directive.captures_iter(&stripped) {
        let kind = ImportKind::from_keyword(captures.get(1).map_or("", |m| m.as_str()));
        let arguments = captures.get(2).map_or("", |m| m.as_str());

        let mut found_quoted = false;
        for target in quoted.captures_iter(arguments) {
            found_quoted = true;
            let path = target
                .get(1)
                .or_else(|| target.get(2))
                .map_or("", |m| m.as_str());
            if !path.is_empty() {
                imports.push(ImportStatement::new(path, kind));
            }
            if kind != ImportKind::Import {
                break;
            }
        }

        if !found_quoted && syntax == Syntax::Sass && kind == ImportKind::Import {
            imports.extend(
                arguments
                    .split(',')
                    .map(str::trim)
                    .filter(|path| !path.is_empty())
                    .map(|path| ImportStatement::new(path, kind)),
            );
        }
    }

    Ok(imports)
}

fn directive_pattern(syntax: Syntax) -> Result<&'static Regex, ResolveError> {
    match syntax {
        Syntax::Sass => compiled(&COMPILED_INDENTED, INDENTED_DIRECTIVE),
        Syntax::Scss | Syntax::Css => compiled(&COMPILED_BLOCK, BLOCK_DIRECTIVE),
    }
}

/// Returns the cached regex for `pattern`, compiling it on first use.
fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> Result<&'static Regex, ResolveError> {
    if let Some(regex) = cell.get() {
        return Ok(regex);
    }

    let regex = Regex::new(pattern)?;
    Ok(cell.get_or_init(|| regex))
}
