//! Decoder for the server's textual sequence formats.
//!
//! Attack and dice-roll events arrive as the server's `toString` rendering of
//! its own data types rather than JSON:
//!
//! ```text
//! List(3, 7, 2)              attack: origin, target, attackers[, defenders]
//! Result(List(4, 6), 1, 0)   dice rolls followed by two result codes
//! ```
//!
//! Everything past this module works on the decoded integers only.

use thiserror::Error;

/// Why a result tuple could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Input is not of the form `Name(...)`.
    #[error("input is not a Name(...) tuple")]
    Shape,

    /// Outer shape matched but some groups are missing.
    #[error("expected 3 groups in result tuple, found {found}")]
    MissingGroups { found: usize },

    /// A group was present but did not parse as an integer.
    #[error("invalid integer {0:?} in result tuple")]
    InvalidInteger(String),
}

/// A decoded `Name(List(...), a, b)` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTuple {
    pub dice_rolls: Vec<i64>,
    pub codes: [i64; 2],
}

/// Decode `List(a, b, c, ...)` into its integers.
///
/// Anything that is not exactly that shape decodes to an empty sequence,
/// which callers read as "no attack in progress".
pub fn decode_list(text: &str) -> Vec<i64> {
    parse_list(text.trim()).unwrap_or_default()
}

/// Decode `Name(List(...), a, b)` into dice rolls and the two result codes.
pub fn decode_result_tuple(text: &str) -> Result<ResultTuple, SequenceError> {
    let text = text.trim();
    let open = text.find('(').ok_or(SequenceError::Shape)?;
    let (name, rest) = text.split_at(open);
    if !is_capitalized_identifier(name) {
        return Err(SequenceError::Shape);
    }
    let body = rest[1..].strip_suffix(')').ok_or(SequenceError::Shape)?;

    let list_end = body
        .starts_with("List(")
        .then(|| body.find(')'))
        .flatten()
        .ok_or(SequenceError::MissingGroups { found: 0 })?;
    let dice_rolls =
        parse_list(&body[..=list_end]).ok_or(SequenceError::MissingGroups { found: 0 })?;

    let tail = body[list_end + 1..].trim();
    let codes = if tail.is_empty() {
        Vec::new()
    } else {
        let tail = tail.strip_prefix(',').ok_or(SequenceError::Shape)?;
        tail.split(',')
            .map(|item| {
                let item = item.trim();
                item.parse::<i64>()
                    .map_err(|_| SequenceError::InvalidInteger(item.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    match codes.as_slice() {
        [first, second] => Ok(ResultTuple {
            dice_rolls,
            codes: [*first, *second],
        }),
        [] | [_] => Err(SequenceError::MissingGroups {
            found: 1 + codes.len(),
        }),
        _ => Err(SequenceError::Shape),
    }
}

fn parse_list(text: &str) -> Option<Vec<i64>> {
    let inner = text.strip_prefix("List(")?.strip_suffix(')')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    inner
        .split(',')
        .map(|item| item.trim().parse::<i64>().ok())
        .collect()
}

fn is_capitalized_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
