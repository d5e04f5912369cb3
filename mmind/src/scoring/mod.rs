//! Peg scoring for the guessing game.
//!
//! A candidate is compared against the secret in two passes. The first pass
//! pairs up symbols that sit at the same position (exact matches). The second
//! pass takes each remaining candidate symbol and pairs it with the leftmost
//! remaining secret symbol of the same value (color matches). Every secret
//! symbol is used at most once, so repeated values are never counted twice:
//! secret `2233` against `2222` scores two exact and no color matches.

use std::fmt;
use std::str::FromStr;

use crate::errors::{MmindError, Result};

/// Exact and color match counts for one candidate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub exact: usize,
    pub color: usize,
}

/// Scores `candidate` against `secret`. Symbols are compared as raw bytes;
/// nothing is validated. Only the common prefix of the two slices counts.
pub fn score(secret: &[u8], candidate: &[u8]) -> Score {
    let len = secret.len().min(candidate.len());
    let secret = &secret[..len];
    let candidate = &candidate[..len];

    let mut secret_used = vec![false; len];
    let mut candidate_used = vec![false; len];
    let mut result = Score::default();

    for i in 0..len {
        if candidate[i] == secret[i] {
            secret_used[i] = true;
            candidate_used[i] = true;
            result.exact += 1;
        }
    }

    for (i, symbol) in candidate.iter().enumerate() {
        if candidate_used[i] {
            continue;
        }
        let hit = (0..len).find(|&j| !secret_used[j] && secret[j] == *symbol);
        if let Some(j) = hit {
            secret_used[j] = true;
            result.color += 1;
        }
    }
    result
}

/// A fixed-length code of ASCII digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Code(Vec<u8>);

impl Code {
    /// Accepts exactly `len` ASCII digits.
    pub fn parse(bytes: &[u8], len: usize) -> Result<Code> {
        if bytes.len() != len {
            return Err(MmindError::InvalidArgument(format!(
                "code must have {} digits, got {}",
                len,
                bytes.len()
            )));
        }
        if let Some(bad) = bytes.iter().find(|b| !b.is_ascii_digit()) {
            return Err(MmindError::InvalidArgument(format!(
                "code symbol {:?} is not a digit",
                *bad as char
            )));
        }
        Ok(Code(bytes.to_vec()))
    }

    /// Renders `value` as a zero-padded code of `len` digits.
    pub fn from_number(value: u64, len: usize) -> Result<Code> {
        let text = format!("{:0width$}", value, width = len);
        if text.len() != len {
            return Err(MmindError::InvalidArgument(format!(
                "{} does not fit in {} digits",
                value, len
            )));
        }
        Ok(Code(text.into_bytes()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn score_against(&self, secret: &Code) -> Score {
        score(secret.as_bytes(), self.as_bytes())
    }
}

impl FromStr for Code {
    type Err = MmindError;

    fn from_str(s: &str) -> Result<Code> {
        Code::parse(s.as_bytes(), s.len())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Construction guarantees ASCII.
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}
