//! @ai:module:intent Map file extensions to comment syntax and build marker matchers
//! @ai:module:layer domain
//! @ai:module:public_api Language, LanguageProfile, ProfileTable, MarkerSyntax, MarkerKind, build_marker_pattern, count_marker_shapes
//! @ai:module:stateless true

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// @ai:intent Built-in languages with a known comment syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Rust,
    Python,
    TypeScript,
    JavaScript,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Kotlin,
    Swift,
    Shell,
    Config,
    Ruby,
    Sql,
    Lua,
    Haskell,
    Markup,
}

const ALL_LANGUAGES: [Language; 18] = [
    Language::Rust,
    Language::Python,
    Language::TypeScript,
    Language::JavaScript,
    Language::Go,
    Language::Java,
    Language::C,
    Language::Cpp,
    Language::CSharp,
    Language::Kotlin,
    Language::Swift,
    Language::Shell,
    Language::Config,
    Language::Ruby,
    Language::Sql,
    Language::Lua,
    Language::Haskell,
    Language::Markup,
];

/// @ai:intent Comment delimiters used to recognize markers in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageProfile {
    pub name: String,
    pub line_prefixes: Vec<String>,
    pub block_open: Option<String>,
    pub block_close: Option<String>,
    /// Prefix of continuation lines inside a block comment, e.g. ` * `.
    pub block_line_prefix: Option<String>,
}

impl LanguageProfile {
    /// @ai:intent Build a profile from static delimiter strings
    /// @ai:effects pure
    pub fn new(
        name: &str,
        line_prefixes: &[&str],
        block: Option<(&str, &str)>,
        block_line_prefix: Option<&str>,
    ) -> Self {
        Self {
            name: name.to_string(),
            line_prefixes: line_prefixes.iter().map(|p| p.to_string()).collect(),
            block_open: block.map(|(open, _)| open.to_string()),
            block_close: block.map(|(_, close)| close.to_string()),
            block_line_prefix: block_line_prefix.map(str::to_string),
        }
    }

    /// @ai:intent The profile used for unregistered extensions: `//` line comments
    /// @ai:effects pure
    pub fn fallback() -> Self {
        Self::new("default", &["//"], None, None)
    }

    /// @ai:intent Every sequence that may open a comment on a line, longest first
    /// @ai:post no empty strings, sorted by descending length
    /// @ai:effects pure
    pub fn openers(&self) -> Vec<&str> {
        let mut openers: Vec<&str> = self
            .line_prefixes
            .iter()
            .map(String::as_str)
            .chain(self.block_open.as_deref())
            .chain(self.block_line_prefix.as_deref())
            .filter(|o| !o.is_empty())
            .collect();
        openers.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        openers.dedup();
        openers
    }

    /// @ai:intent Regex alternation matching any comment opener at line start
    /// @ai:post a block continuation prefix only matches when followed by whitespace or end of line
    /// @ai:example (rust) matches " * @begin" but not "*count += 1"
    /// @ai:effects pure
    pub fn opener_pattern(&self) -> String {
        let continuation_only = self.block_line_prefix.as_deref().filter(|prefix| {
            !self.line_prefixes.iter().any(|p| p == prefix)
                && self.block_open.as_deref() != Some(*prefix)
        });

        self.openers()
            .into_iter()
            .map(|opener| {
                if Some(opener) == continuation_only {
                    format!(r"{}(?:\s|$)", regex::escape(opener))
                } else {
                    regex::escape(opener)
                }
            })
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl Language {
    /// @ai:intent Get the comment profile for this language
    /// @ai:effects pure
    pub fn profile(&self) -> LanguageProfile {
        let c_block = Some(("/*", "*/"));
        match self {
            Language::Rust => LanguageProfile::new(self.name(), &["///", "//!", "//"], c_block, Some("*")),
            Language::Python => {
                LanguageProfile::new(self.name(), &["#"], Some(("\"\"\"", "\"\"\"")), None)
            }
            Language::Shell | Language::Config => LanguageProfile::new(self.name(), &["#"], None, None),
            Language::Ruby => LanguageProfile::new(self.name(), &["#"], Some(("=begin", "=end")), None),
            Language::Sql => LanguageProfile::new(self.name(), &["--"], c_block, Some("*")),
            Language::Lua => LanguageProfile::new(self.name(), &["--"], Some(("--[[", "]]")), None),
            Language::Haskell => LanguageProfile::new(self.name(), &["--"], Some(("{-", "-}")), None),
            Language::Markup => LanguageProfile::new(self.name(), &[], Some(("<!--", "-->")), None),
            Language::TypeScript
            | Language::JavaScript
            | Language::Go
            | Language::Java
            | Language::C
            | Language::Cpp
            | Language::CSharp
            | Language::Kotlin
            | Language::Swift => LanguageProfile::new(self.name(), &["//"], c_block, Some("*")),
        }
    }

    /// @ai:intent Get file extensions for this language
    /// @ai:effects pure
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::Rust => &["rs"],
            Language::Python => &["py", "pyi"],
            Language::TypeScript => &["ts", "tsx"],
            Language::JavaScript => &["js", "jsx", "mjs", "cjs"],
            Language::Go => &["go"],
            Language::Java => &["java"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
            Language::CSharp => &["cs"],
            Language::Kotlin => &["kt", "kts"],
            Language::Swift => &["swift"],
            Language::Shell => &["sh", "bash", "zsh"],
            Language::Config => &["toml", "yaml", "yml"],
            Language::Ruby => &["rb"],
            Language::Sql => &["sql"],
            Language::Lua => &["lua"],
            Language::Haskell => &["hs"],
            Language::Markup => &["md", "html", "htm", "xml"],
        }
    }

    /// @ai:intent Get language name as string
    /// @ai:effects pure
    pub fn name(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Kotlin => "kotlin",
            Language::Swift => "swift",
            Language::Shell => "shell",
            Language::Config => "config",
            Language::Ruby => "ruby",
            Language::Sql => "sql",
            Language::Lua => "lua",
            Language::Haskell => "haskell",
            Language::Markup => "markup",
        }
    }
}

/// @ai:intent Immutable extension-to-profile lookup shared by all scans
///
/// Extensions of one language share a single `Arc<LanguageProfile>`.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    by_extension: BTreeMap<String, Arc<LanguageProfile>>,
    fallback: Arc<LanguageProfile>,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileTable {
    /// @ai:intent Build the table from the built-in language list
    /// @ai:effects pure
    pub fn builtin() -> Self {
        let mut by_extension = BTreeMap::new();
        for lang in ALL_LANGUAGES {
            let profile = Arc::new(lang.profile());
            for ext in lang.extensions() {
                by_extension.insert(ext.to_string(), Arc::clone(&profile));
            }
        }
        Self {
            by_extension,
            fallback: Arc::new(LanguageProfile::fallback()),
        }
    }

    /// @ai:intent Replace or add the profile for one extension
    /// @ai:pre called before the table is shared with any scan
    pub fn insert(&mut self, extension: &str, profile: LanguageProfile) {
        self.by_extension
            .insert(normalize_extension(extension), Arc::new(profile));
    }

    /// @ai:intent Resolve a profile by extension, falling back to `//` comments
    /// @ai:example ("rs") -> rust
    /// @ai:example ("unknown") -> default
    /// @ai:effects pure
    pub fn profile_for(&self, extension: &str) -> &Arc<LanguageProfile> {
        self.by_extension
            .get(&normalize_extension(extension))
            .unwrap_or(&self.fallback)
    }

    /// @ai:intent Resolve a profile from a file path's extension
    /// @ai:effects pure
    pub fn profile_for_path(&self, path: &Path) -> &Arc<LanguageProfile> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.profile_for(ext)
    }

    /// @ai:intent Check whether a path has an explicitly registered extension
    /// @ai:effects pure
    pub fn is_known(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.by_extension.contains_key(&normalize_extension(ext)))
    }

    /// @ai:intent Every distinct profile in the table, fallback included
    /// @ai:effects pure
    pub fn profiles(&self) -> impl Iterator<Item = &Arc<LanguageProfile>> {
        self.by_extension
            .values()
            .chain(std::iter::once(&self.fallback))
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// @ai:intent Directive recognized by a marker pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Begin,
    End,
    Standalone,
    ExcludeBegin,
    ExcludeEnd,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 5] = [
        MarkerKind::Begin,
        MarkerKind::End,
        MarkerKind::Standalone,
        MarkerKind::ExcludeBegin,
        MarkerKind::ExcludeEnd,
    ];

    /// @ai:intent Whether the marker carries a `type:scope:phase` body
    pub fn is_keyed(&self) -> bool {
        matches!(self, MarkerKind::Begin | MarkerKind::End | MarkerKind::Standalone)
    }
}

/// @ai:intent Spelling of marker directives, optionally namespaced per project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSyntax {
    pub namespace: Option<String>,
}

impl MarkerSyntax {
    /// @ai:intent Syntax whose directives read `@<ns>-begin`, `@no-<ns>-begin`, ...
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: (!namespace.is_empty()).then_some(namespace),
        }
    }

    /// @ai:intent Directive text after the `@` sign for a marker kind
    /// @ai:example (None, Begin) -> "begin"
    /// @ai:example (Some("cpt"), ExcludeEnd) -> "no-cpt-end"
    /// @ai:effects pure
    pub fn directive(&self, kind: MarkerKind) -> String {
        let word = match kind {
            MarkerKind::Begin | MarkerKind::ExcludeBegin => "begin",
            MarkerKind::End | MarkerKind::ExcludeEnd => "end",
            MarkerKind::Standalone => "mark",
        };
        let stem = match &self.namespace {
            Some(ns) => format!("{ns}-{word}"),
            None => word.to_string(),
        };
        match kind {
            MarkerKind::ExcludeBegin | MarkerKind::ExcludeEnd => format!("no-{stem}"),
            _ => stem,
        }
    }

    /// @ai:intent Loose matcher for anything that looks like a marker directive
    ///
    /// Used with `count_marker_shapes`; it is not anchored to a comment opener
    /// and does not consume the characters around a directive.
    /// @ai:effects pure
    pub fn shape_pattern(&self) -> Result<Regex> {
        let ns = self
            .namespace
            .as_deref()
            .map(|ns| format!("{}-", regex::escape(ns)))
            .unwrap_or_default();
        let pattern = format!(r"@(?:no-)?{ns}(?:begin|end|mark)");
        Ok(Regex::new(&pattern)?)
    }
}

/// @ai:intent Count marker directives on a line, however closely they follow each other
/// @ai:pre shape comes from `MarkerSyntax::shape_pattern`
/// @ai:post a directive counts only when not glued to a word, `@` or `-` on either side
/// @ai:example ("// @no-begin @no-end") -> 2
/// @ai:example ("// user@end:point @beginning") -> 0
/// @ai:effects pure
pub fn count_marker_shapes(shape: &Regex, line: &str) -> usize {
    let glued = |c: char| c.is_alphanumeric() || c == '_' || c == '@' || c == '-';
    shape
        .find_iter(line)
        .filter(|m| {
            let before = line[..m.start()].chars().next_back();
            let after = line[m.end()..].chars().next();
            !before.is_some_and(glued) && !after.is_some_and(glued)
        })
        .count()
}

/// @ai:intent Build the anchored matcher for one marker kind in one comment syntax
/// @ai:pre profile has at least one comment opener
/// @ai:post keyed kinds capture `body`; exclusion kinds capture the `rest` of the line
/// @ai:example (rust, default, Begin) matches "  // @begin:algo:foo:p1"
/// @ai:example (rust, default, Begin) rejects "let s = \"@begin:algo:foo:p1\";"
/// @ai:effects pure
pub fn build_marker_pattern(
    profile: &LanguageProfile,
    syntax: &MarkerSyntax,
    kind: MarkerKind,
) -> Result<Regex> {
    let openers = profile.opener_pattern();
    let directive = regex::escape(&syntax.directive(kind));

    let pattern = if kind.is_keyed() {
        format!(r"^\s*(?:{openers})\s*@{directive}:(?P<body>\S*)")
    } else {
        format!(r"^\s*(?:{openers})\s*@{directive}(?P<rest>.*)$")
    };
    Ok(Regex::new(&pattern)?)
}
