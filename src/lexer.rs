//! @ai:module:intent Recognize and decode one traceability marker per source line
//! @ai:module:layer application
//! @ai:module:public_api MarkerLexer, LexedSource
//! @ai:module:depends_on language, annotation, error
//! @ai:module:stateless true

use crate::annotation::{MarkerEvent, ParseError, ScopeKey};
use crate::error::Result;
use crate::language::{
    build_marker_pattern, count_marker_shapes, LanguageProfile, MarkerKind, MarkerSyntax,
};
use regex::Regex;
use std::sync::Arc;

/// @ai:intent Compiled matchers for one comment syntax and one marker syntax
#[derive(Debug, Clone)]
pub struct MarkerLexer {
    profile: Arc<LanguageProfile>,
    comment_start: Regex,
    shape: Regex,
    patterns: Vec<(MarkerKind, Regex)>,
}

/// @ai:intent Marker events and parse errors of a whole file, in line order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LexedSource {
    pub events: Vec<MarkerEvent>,
    pub errors: Vec<ParseError>,
}

impl MarkerLexer {
    /// @ai:intent Compile all marker patterns for a profile
    /// @ai:effects pure
    pub fn new(profile: Arc<LanguageProfile>, syntax: &MarkerSyntax) -> Result<Self> {
        let comment_start = Regex::new(&format!(r"^\s*(?:{})", profile.opener_pattern()))?;

        let patterns = MarkerKind::ALL
            .iter()
            .map(|&kind| Ok((kind, build_marker_pattern(&profile, syntax, kind)?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            shape: syntax.shape_pattern()?,
            comment_start,
            patterns,
            profile,
        })
    }

    pub fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    /// @ai:intent Lex every line of a file
    /// @ai:post events and errors are ordered by line number
    /// @ai:effects pure
    pub fn lex_source(&self, content: &str) -> LexedSource {
        let mut lexed = LexedSource::default();
        for (idx, line) in content.lines().enumerate() {
            match self.lex_line(line, idx + 1) {
                Ok(Some(event)) => lexed.events.push(event),
                Ok(None) => {}
                Err(error) => lexed.errors.push(error),
            }
        }
        lexed
    }

    /// @ai:intent Extract at most one marker from a line
    /// @ai:pre line_number is 1-based
    /// @ai:post Ok(None) when the line is not a comment or holds no marker-shaped text
    /// @ai:example ("// @begin:algo:foo:p1:inst-a", 1) -> Ok(Some(Begin algo:foo:p1:inst-a))
    /// @ai:example ("let x = 1;", 2) -> Ok(None)
    /// @ai:edge_cases two markers on one line -> Err, neither is emitted
    /// @ai:effects pure
    pub fn lex_line(
        &self,
        line: &str,
        line_number: usize,
    ) -> std::result::Result<Option<MarkerEvent>, ParseError> {
        if !self.comment_start.is_match(line) {
            return Ok(None);
        }

        match count_marker_shapes(&self.shape, line) {
            0 => return Ok(None),
            1 => {}
            n => {
                return Err(ParseError::new(
                    line_number,
                    format!("{n} markers on one line; only one marker per line is allowed"),
                ))
            }
        }

        for (kind, re) in &self.patterns {
            let Some(caps) = re.captures(line) else {
                continue;
            };

            return if kind.is_keyed() {
                let body = caps.name("body").map_or("", |m| m.as_str());
                let key = self.decode_key(*kind, body, line_number)?;
                Ok(Some(MarkerEvent {
                    kind: *kind,
                    key: Some(key),
                    line: line_number,
                    reason: None,
                }))
            } else {
                let rest = caps.name("rest").map_or("", |m| m.as_str());
                let reason = self.decode_reason(rest, line_number)?;
                Ok(Some(MarkerEvent {
                    kind: *kind,
                    key: None,
                    line: line_number,
                    reason,
                }))
            };
        }

        Err(ParseError::new(
            line_number,
            "malformed marker: expected `@<directive>:<type>:<scope>:<phase>[:<instance>]` right after the comment opener",
        ))
    }

    /// Splits from the right: `phase` and the optional instance id are the
    /// trailing tokens, everything between them and the marker type is the
    /// (possibly colon-separated) scope id.
    fn decode_key(
        &self,
        kind: MarkerKind,
        body: &str,
        line: usize,
    ) -> std::result::Result<ScopeKey, ParseError> {
        let body = self.strip_block_close(body);
        if body.is_empty() {
            return Err(ParseError::new(line, "empty marker body"));
        }

        let tokens: Vec<&str> = body.split(':').collect();
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(ParseError::new(line, format!("empty field in marker `{body}`")));
        }
        if tokens.len() < 3 {
            return Err(ParseError::new(
                line,
                format!(
                    "expected <type>:<scope>:<phase>[:<instance>], found {} field(s) in `{body}`",
                    tokens.len()
                ),
            ));
        }

        let last = tokens.len() - 1;
        let (scope_end, phase, instance_id) = if is_phase(tokens[last]) {
            (last, tokens[last], None)
        } else if tokens.len() >= 4 && is_phase(tokens[last - 1]) {
            (last - 1, tokens[last - 1], Some(tokens[last].to_string()))
        } else {
            return Err(ParseError::new(
                line,
                format!("missing phase token (p<N>) in `{body}`"),
            ));
        };

        if kind == MarkerKind::Standalone && instance_id.is_some() {
            return Err(ParseError::new(
                line,
                format!("standalone marker cannot carry an instance id: `{body}`"),
            ));
        }

        Ok(ScopeKey {
            marker_type: tokens[0].to_string(),
            scope_id: tokens[1..scope_end].join(":"),
            phase: phase.to_string(),
            instance_id,
        })
    }

    fn decode_reason(
        &self,
        rest: &str,
        line: usize,
    ) -> std::result::Result<Option<String>, ParseError> {
        let trimmed_end = rest.trim_end();
        let close_follows = self
            .profile
            .block_close
            .as_deref()
            .is_some_and(|close| !close.is_empty() && trimmed_end.starts_with(close));

        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) && !close_follows {
            return Err(ParseError::new(
                line,
                format!("exclusion marker takes no key, found `{}`", rest.trim()),
            ));
        }

        let reason = self.strip_block_close(trimmed_end).trim();
        Ok((!reason.is_empty()).then(|| reason.to_string()))
    }

    fn strip_block_close<'a>(&self, text: &'a str) -> &'a str {
        match self.profile.block_close.as_deref() {
            Some(close) if !close.is_empty() => text.strip_suffix(close).unwrap_or(text),
            _ => text,
        }
    }
}

fn is_phase(token: &str) -> bool {
    token
        .strip_prefix('p')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
