//! Mutation candidates and source rewriting.

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::parser::TokenPosition;

/// First and last token of the text a mutation replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: TokenPosition,
    pub end: TokenPosition,
}

impl TokenSpan {
    /// Byte range covered by the span, end exclusive.
    pub fn byte_range(&self) -> (usize, usize) {
        (self.start.start_offset, self.end.stop_offset + 1)
    }
}

/// A candidate mutation produced by a mutator during the tree walk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mutation {
    /// Name of the mutator that produced this candidate.
    pub mutator_name: String,
    /// Tokens being replaced.
    pub target: TokenSpan,
    /// Text inserted in place of the target.
    pub replacement: String,
}

impl Mutation {
    /// Create a new mutation.
    pub fn new(
        mutator_name: impl Into<String>,
        target: TokenSpan,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            mutator_name: mutator_name.into(),
            target,
            replacement: replacement.into(),
        }
    }

    /// Line of the first replaced token.
    pub fn line(&self) -> u32 {
        self.target.start.line
    }

    /// The original text this mutation replaces.
    pub fn original_text<'s>(&self, source: &'s str) -> Result<&'s str> {
        let (start, end) = checked_range(source, &self.target)?;
        Ok(&source[start..end])
    }
}

/// Apply a mutation to the source it was computed from.
///
/// Pure text substitution: everything before the first target byte, the
/// replacement, everything after the last target byte. The result is not
/// re-parsed and may not compile.
pub fn apply(source: &str, mutation: &Mutation) -> Result<String> {
    let (start, end) = checked_range(source, &mutation.target)?;
    let mut mutated =
        String::with_capacity(source.len() - (end - start) + mutation.replacement.len());
    mutated.push_str(&source[..start]);
    mutated.push_str(&mutation.replacement);
    mutated.push_str(&source[end..]);
    Ok(mutated)
}

fn checked_range(source: &str, span: &TokenSpan) -> Result<(usize, usize)> {
    let start = span.start.start_offset;
    let stop = span.end.stop_offset;
    if start > stop {
        return Err(Error::mutation_span(format!(
            "start offset {start} is after stop offset {stop}"
        )));
    }
    if stop >= source.len() {
        return Err(Error::mutation_span(format!(
            "stop offset {stop} beyond source length {}",
            source.len()
        )));
    }
    let end = stop + 1;
    if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
        return Err(Error::mutation_span(format!(
            "offsets {start}..={stop} split a character"
        )));
    }
    Ok((start, end))
}
