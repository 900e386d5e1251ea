//! Clause scanner for the criteria-filter grammar.

use greengrocer_core::{DomainError, DomainResult};

/// Comparison operator of one clause.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterOp {
    /// `:` — substring match on text, equality otherwise.
    Match,
    /// `<` — inclusive upper bound.
    AtMost,
    /// `>` — inclusive lower bound.
    AtLeast,
}

impl FilterOp {
    fn from_char(c: char) -> Option<Self> {
        match c {
            ':' => Some(Self::Match),
            '<' => Some(Self::AtMost),
            '>' => Some(Self::AtLeast),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Match => ':',
            Self::AtMost => '<',
            Self::AtLeast => '>',
        }
    }
}

/// One `field<op>value` clause, not yet resolved against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Scan a filter string into clauses.
///
/// The trailing comma is implicit: `a:b` and `a:b,` are equivalent, and empty
/// segments between commas are ignored. A segment that is not exactly
/// `word op word` is rejected; garbage never matches silently.
pub fn scan(input: &str) -> DomainResult<Vec<Clause>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let mut clauses = Vec::new();
    for segment in input.split(',') {
        if segment.is_empty() {
            continue;
        }
        clauses.push(scan_segment(segment)?);
    }
    Ok(clauses)
}

fn scan_segment(segment: &str) -> DomainResult<Clause> {
    let Some((op_idx, op)) = segment
        .char_indices()
        .find_map(|(i, c)| FilterOp::from_char(c).map(|op| (i, op)))
    else {
        return Err(DomainError::parse(format!(
            "clause \"{segment}\" has no operator (expected one of ':', '<', '>')"
        )));
    };

    let field = &segment[..op_idx];
    // The operator chars are ASCII, so op_idx + 1 stays on a char boundary.
    let value = &segment[op_idx + 1..];

    if field.is_empty() || !field.chars().all(is_word) {
        return Err(DomainError::parse(format!(
            "clause \"{segment}\" has a malformed field name"
        )));
    }
    if value.is_empty() || !value.chars().all(is_word) {
        return Err(DomainError::parse(format!(
            "clause \"{segment}\" has a malformed value"
        )));
    }

    Ok(Clause {
        field: field.to_string(),
        op,
        value: value.to_string(),
    })
}
