//! @ai:module:intent Pair begin/end markers into a nested scope tree
//! @ai:module:layer application
//! @ai:module:public_api match_events, MatchOutcome
//! @ai:module:depends_on annotation, language
//! @ai:module:stateless true
//!
//! A single stack of open frames is kept in line order. Scopes may nest but
//! never interleave: an end marker only closes the frame on top of the stack.

use crate::annotation::{
    BlockMarker, ExcludedRegion, MarkerEvent, ParseError, ScopeKey, ScopeMarker, StructuralError,
    StructuralErrorKind,
};
use crate::language::MarkerKind;

/// @ai:intent Scope tree and pairing failures for one file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub scopes: Vec<ScopeMarker>,
    pub standalone: Vec<BlockMarker>,
    pub excluded: Vec<ExcludedRegion>,
    pub errors: Vec<StructuralError>,
    /// Unpaired or nested exclusion markers.
    pub exclusion_errors: Vec<ParseError>,
}

#[derive(Debug)]
struct Frame {
    key: ScopeKey,
    start_line: usize,
    depth: usize,
    children: Vec<ScopeMarker>,
    /// Its end marker was seen while another scope was on top.
    crossed: bool,
}

#[derive(Debug)]
struct OpenExclusion {
    start_line: usize,
    reason: Option<String>,
}

/// @ai:intent Build the scope tree from the ordered marker events of one file
/// @ai:pre events are sorted by line, at most one per line
/// @ai:post every BEGIN either becomes exactly one ScopeMarker or yields an error
/// @ai:post depth-first traversal of scopes follows BEGIN line order
/// @ai:edge_cases END with no open frame for its key -> ORPHAN_END, event dropped
/// @ai:edge_cases END matching a frame below the top -> CROSSING, nothing popped
/// @ai:edge_cases BEGIN of a key already open -> DUPLICATE, event dropped
/// @ai:edge_cases frames left at end of file -> UNCLOSED at their begin line
/// @ai:effects pure
/// @ai:complexity O(n * d) for n events and maximum nesting depth d
pub fn match_events(events: &[MarkerEvent]) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();
    let mut stack: Vec<Frame> = Vec::new();
    let mut exclusion: Option<OpenExclusion> = None;

    for event in events {
        match (event.kind, &event.key) {
            (MarkerKind::Begin, Some(key)) => open_scope(&mut stack, &mut outcome, key, event.line),
            (MarkerKind::End, Some(key)) => close_scope(&mut stack, &mut outcome, key, event.line),
            (MarkerKind::Standalone, Some(key)) => outcome.standalone.push(BlockMarker {
                key: key.clone(),
                line: event.line,
            }),
            (MarkerKind::ExcludeBegin, _) => {
                if let Some(open) = &exclusion {
                    outcome.exclusion_errors.push(ParseError::new(
                        event.line,
                        format!(
                            "exclusion region already open since line {}; exclusions do not nest",
                            open.start_line
                        ),
                    ));
                } else {
                    exclusion = Some(OpenExclusion {
                        start_line: event.line,
                        reason: event.reason.clone(),
                    });
                }
            }
            (MarkerKind::ExcludeEnd, _) => match exclusion.take() {
                Some(open) => outcome.excluded.push(ExcludedRegion {
                    start_line: open.start_line,
                    end_line: event.line,
                    reason: open.reason,
                }),
                None => outcome.exclusion_errors.push(ParseError::new(
                    event.line,
                    "exclusion end without a matching exclusion begin",
                )),
            },
            // The lexer never emits keyed kinds without a key.
            (MarkerKind::Begin | MarkerKind::End | MarkerKind::Standalone, None) => {}
        }
    }

    if let Some(open) = exclusion {
        outcome.exclusion_errors.push(ParseError::new(
            open.start_line,
            "exclusion region is never closed",
        ));
    }

    drain_unclosed(stack, &mut outcome);
    outcome
}

fn open_scope(stack: &mut Vec<Frame>, outcome: &mut MatchOutcome, key: &ScopeKey, line: usize) {
    if let Some(open) = stack.iter().find(|frame| &frame.key == key) {
        outcome.errors.push(StructuralError {
            kind: StructuralErrorKind::Duplicate,
            key: key.clone(),
            line,
            message: format!(
                "scope `{key}` is already open since line {}",
                open.start_line
            ),
        });
        return;
    }

    stack.push(Frame {
        key: key.clone(),
        start_line: line,
        depth: stack.len(),
        children: Vec::new(),
        crossed: false,
    });
}

fn close_scope(stack: &mut Vec<Frame>, outcome: &mut MatchOutcome, key: &ScopeKey, line: usize) {
    if stack.last().is_some_and(|top| &top.key == key) {
        if let Some(frame) = stack.pop() {
            let scope = ScopeMarker {
                key: frame.key,
                start_line: frame.start_line,
                end_line: line,
                depth: frame.depth,
                children: frame.children,
            };
            attach(stack, &mut outcome.scopes, scope);
        }
        return;
    }

    let Some(pos) = stack.iter().rposition(|frame| &frame.key == key) else {
        outcome.errors.push(StructuralError {
            kind: StructuralErrorKind::OrphanEnd,
            key: key.clone(),
            line,
            message: format!("end of scope `{key}` has no matching begin"),
        });
        return;
    };

    stack[pos].crossed = true;
    let (top_key, top_line) = stack
        .last()
        .map(|top| (top.key.to_string(), top.start_line))
        .unwrap_or_default();
    outcome.errors.push(StructuralError {
        kind: StructuralErrorKind::Crossing,
        key: key.clone(),
        line,
        message: format!(
            "scope `{key}` (opened at line {}) ends while `{top_key}` (opened at line {top_line}) is still open; scopes must nest",
            stack[pos].start_line
        ),
    });
}

fn attach(stack: &mut [Frame], top_level: &mut Vec<ScopeMarker>, scope: ScopeMarker) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(scope),
        None => top_level.push(scope),
    }
}

/// Frames still open at end of file are reported once each, except those
/// whose end marker already raised a crossing error. Their closed children
/// move up one level so no matched scope is lost.
fn drain_unclosed(mut stack: Vec<Frame>, outcome: &mut MatchOutcome) {
    let mut unclosed = Vec::new();

    while let Some(frame) = stack.pop() {
        if !frame.crossed {
            unclosed.push(StructuralError {
                kind: StructuralErrorKind::Unclosed,
                message: format!("scope `{}` is never closed", frame.key),
                key: frame.key,
                line: frame.start_line,
            });
        }

        for mut child in frame.children {
            shift_depth(&mut child);
            attach(&mut stack, &mut outcome.scopes, child);
        }
    }

    unclosed.reverse();
    outcome.errors.extend(unclosed);
}

fn shift_depth(scope: &mut ScopeMarker) {
    scope.depth = scope.depth.saturating_sub(1);
    for child in &mut scope.children {
        shift_depth(child);
    }
}
