use crate::error::{MergeError, Result};
use crate::planner::RenameMap;
use aho_corasick::{AhoCorasick, MatchKind};
use serde::Serialize;

/// One defunct key rewritten in one piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub defunct: String,
    pub canonical: String,
    pub count: usize,
}

/// Result of applying a [`Substituter`] to text that contained at least one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    /// In defunct-key order, only keys that were replaced
    pub replacements: Vec<Replacement>,
}

/// All renames compiled into one leftmost-longest automaton.
///
/// Text is scanned once, left to right: a key that is a prefix of a longer
/// key never splits it, and inserted canonical keys are never rescanned.
#[derive(Debug, Clone)]
pub struct Substituter {
    automaton: Option<AhoCorasick>,
    pairs: Vec<(String, String)>,
    whole_identifier: bool,
}

impl Substituter {
    pub fn new(renames: &RenameMap, whole_identifier: bool) -> Result<Self> {
        let pairs: Vec<(String, String)> = renames
            .iter()
            .filter(|(defunct, _)| {
                if defunct.is_empty() {
                    log::warn!("Ignoring empty defunct key; it would match everywhere");
                }
                !defunct.is_empty()
            })
            .map(|(defunct, canonical)| (defunct.to_string(), canonical.to_string()))
            .collect();

        let automaton = if pairs.is_empty() {
            None
        } else {
            // boundary filtering needs every candidate, not just the leftmost-longest one
            let match_kind = if whole_identifier {
                MatchKind::Standard
            } else {
                MatchKind::LeftmostLongest
            };
            let automaton = AhoCorasick::builder()
                .match_kind(match_kind)
                .build(pairs.iter().map(|(defunct, _)| defunct))
                .map_err(|err| MergeError::invalid_config(format!("rename automaton: {err}")))?;
            Some(automaton)
        };

        Ok(Self {
            automaton,
            pairs,
            whole_identifier,
        })
    }

    /// Nothing to rename
    pub fn is_empty(&self) -> bool {
        self.automaton.is_none()
    }

    /// Rewrite every defunct key in `text`; `None` when nothing changed
    pub fn apply(&self, text: &str) -> Option<Substitution> {
        let automaton = self.automaton.as_ref()?;
        if !automaton.is_match(text) {
            return None;
        }

        let matches = if self.whole_identifier {
            identifier_matches(automaton, text)
        } else {
            automaton
                .find_iter(text)
                .map(|found| (found.start(), found.end(), found.pattern().as_usize()))
                .collect()
        };

        let mut counts = vec![0usize; self.pairs.len()];
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;

        for (start, end, slot) in matches {
            out.push_str(&text[cursor..start]);
            out.push_str(&self.pairs[slot].1);
            cursor = end;
            counts[slot] += 1;
        }

        if counts.iter().all(|&count| count == 0) {
            return None;
        }
        out.push_str(&text[cursor..]);

        let replacements = self
            .pairs
            .iter()
            .zip(counts)
            .filter(|(_, count)| *count > 0)
            .map(|((defunct, canonical), count)| Replacement {
                defunct: defunct.clone(),
                canonical: canonical.clone(),
                count,
            })
            .collect();

        Some(Substitution {
            text: out,
            replacements,
        })
    }
}

/// Non-overlapping `(start, end, pattern)` matches that stand as whole
/// identifiers, leftmost first and longest at each start.
fn identifier_matches(automaton: &AhoCorasick, text: &str) -> Vec<(usize, usize, usize)> {
    let mut candidates: Vec<(usize, usize, usize)> = automaton
        .find_overlapping_iter(text)
        .filter(|found| on_identifier_boundary(text, found.start(), found.end()))
        .map(|found| (found.start(), found.end(), found.pattern().as_usize()))
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut chosen = Vec::with_capacity(candidates.len());
    let mut cursor = 0;
    for (start, end, slot) in candidates {
        if start < cursor {
            continue;
        }
        chosen.push((start, end, slot));
        cursor = end;
    }
    chosen
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn on_identifier_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char)
}
