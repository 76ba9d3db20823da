//! @ai:module:intent Run the lex, match, cross-validate and aggregate pipeline on one file
//! @ai:module:layer application
//! @ai:module:public_api ScanContext, scan_source, scan_file
//! @ai:module:depends_on language, lexer, matcher, validator, report, registry, error
//! @ai:module:stateless true
//! @ai:module:thread_safe true

use crate::annotation::CodeFile;
use crate::error::{Error, Result};
use crate::language::{LanguageProfile, MarkerSyntax, ProfileTable};
use crate::lexer::MarkerLexer;
use crate::matcher::match_events;
use crate::registry::Registry;
use crate::report::aggregate;
use crate::validator::cross_validate;
use std::path::Path;
use std::sync::Arc;

/// @ai:intent Read-only inputs shared by every file scan of one run
///
/// Lexers are compiled once per distinct profile when the context is built.
#[derive(Debug)]
pub struct ScanContext {
    profiles: ProfileTable,
    syntax: MarkerSyntax,
    registry: Registry,
    lexers: Vec<(Arc<LanguageProfile>, MarkerLexer)>,
}

impl ScanContext {
    /// @ai:intent Build the context and compile every marker pattern up front
    /// @ai:post Err(Pattern) if any profile produces an invalid regex
    /// @ai:effects pure
    pub fn new(profiles: ProfileTable, syntax: MarkerSyntax, registry: Registry) -> Result<Self> {
        let mut lexers: Vec<(Arc<LanguageProfile>, MarkerLexer)> = Vec::new();
        for profile in profiles.profiles() {
            if lexers.iter().any(|(p, _)| Arc::ptr_eq(p, profile)) {
                continue;
            }
            let lexer = MarkerLexer::new(Arc::clone(profile), &syntax)?;
            lexers.push((Arc::clone(profile), lexer));
        }

        Ok(Self {
            profiles,
            syntax,
            registry,
            lexers,
        })
    }

    pub fn profiles(&self) -> &ProfileTable {
        &self.profiles
    }

    pub fn syntax(&self) -> &MarkerSyntax {
        &self.syntax
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn lexer_for(&self, path: &Path) -> Result<&MarkerLexer> {
        let profile = self.profiles.profile_for_path(path);
        self.lexers
            .iter()
            .find(|(p, _)| Arc::ptr_eq(p, profile))
            .map(|(_, lexer)| lexer)
            .ok_or_else(|| Error::Config(format!("no lexer compiled for profile `{}`", profile.name)))
    }
}

/// @ai:intent Scan in-memory file content
/// @ai:pre ctx was built before any scan starts and is not mutated afterwards
/// @ai:post the same content always yields an identical CodeFile
/// @ai:effects pure
pub fn scan_source(path: &Path, content: &str, ctx: &ScanContext) -> Result<CodeFile> {
    let lexer = ctx.lexer_for(path)?;
    let lexed = lexer.lex_source(content);
    let outcome = match_events(&lexed.events);
    let references = cross_validate(path, &outcome.scopes, &outcome.standalone, ctx.registry());

    for error in &outcome.errors {
        tracing::debug!(
            "{}:{}: {:?} {}",
            path.display(),
            error.line,
            error.kind,
            error.message
        );
    }

    let file = aggregate(
        path,
        lexer.profile(),
        content.lines().count(),
        outcome,
        references,
        lexed.errors,
    );
    tracing::debug!(
        "Scanned {} ({}): {} scopes, {} errors",
        path.display(),
        file.language,
        file.scope_count(),
        file.error_count()
    );
    Ok(file)
}

/// @ai:intent Read a file fully and scan it
/// @ai:effects fs:read
pub fn scan_file(path: &Path, ctx: &ScanContext) -> Result<CodeFile> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    scan_source(path, &content, ctx)
}
