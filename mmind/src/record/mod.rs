//! Feedback records and their line encoding.
//!
//! On the wire a record is one line: `"<candidate> <exact>+<color>- <attempt>\n"`
//! with the attempt number zero-padded to four digits, e.g. `"2222 2+0- 0001\n"`.

use std::fmt;
use std::str;

use crate::errors::{MmindError, Result};
use crate::scoring::{Code, Score};

/// Largest attempt number that still fits the four-digit field.
pub const MAX_ENCODED_ATTEMPT: u32 = 9999;
/// Largest code length whose counts stay single digits.
pub const MAX_ENCODED_CODE_LEN: usize = 9;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub candidate: Code,
    pub exact_matches: usize,
    pub color_matches: usize,
    pub attempt_index: u32,
}

impl FeedbackRecord {
    pub fn new(candidate: Code, score: Score, attempt_index: u32) -> FeedbackRecord {
        FeedbackRecord {
            candidate,
            exact_matches: score.exact,
            color_matches: score.color,
            attempt_index,
        }
    }

    pub fn score(&self) -> Score {
        Score {
            exact: self.exact_matches,
            color: self.color_matches,
        }
    }

    /// Length of an encoded line for a code of `code_len` symbols.
    pub const fn encoded_len(code_len: usize) -> usize {
        // code, ' ', 'e', '+', 'c', '-', ' ', four digits, '\n'
        code_len + 11
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }

    /// Parses one encoded line. Trailing zero padding is ignored.
    pub fn decode(bytes: &[u8]) -> Result<FeedbackRecord> {
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let line = str::from_utf8(&bytes[..end]).map_err(|e| malformed(e.to_string()))?;
        let line = line
            .strip_suffix('\n')
            .ok_or_else(|| malformed(format!("{:?} is not newline terminated", line)))?;

        let mut fields = line.split(' ');
        let (candidate, counts, attempt) = match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(a), Some(b), Some(c), None) => (a, b, c),
            _ => return Err(malformed(format!("{:?} does not have three fields", line))),
        };

        let candidate: Code = candidate
            .parse()
            .map_err(|e: MmindError| malformed(e.to_string()))?;
        let (exact, color) = counts
            .strip_suffix('-')
            .and_then(|c| c.split_once('+'))
            .ok_or_else(|| malformed(format!("bad counts {:?}", counts)))?;
        let exact_matches = parse_number(exact)?;
        let color_matches = parse_number(color)?;
        if attempt.len() < 4 {
            return Err(malformed(format!("attempt {:?} is not zero padded", attempt)));
        }
        let attempt_index = parse_number(attempt)?;

        Ok(FeedbackRecord {
            candidate,
            exact_matches,
            color_matches,
            attempt_index,
        })
    }
}

impl fmt::Display for FeedbackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}+{}- {:04}",
            self.candidate, self.exact_matches, self.color_matches, self.attempt_index
        )
    }
}

fn malformed(msg: String) -> MmindError {
    MmindError::MalformedRecord(msg)
}

fn parse_number<T: str::FromStr>(field: &str) -> Result<T> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(format!("{:?} is not a number", field)));
    }
    field
        .parse()
        .map_err(|_| malformed(format!("{:?} is out of range", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn record(candidate: &str, exact: usize, color: usize, attempt: u32) -> FeedbackRecord {
        FeedbackRecord {
            candidate: candidate.parse().unwrap(),
            exact_matches: exact,
            color_matches: color,
            attempt_index: attempt,
        }
    }

    #[test]
    fn encodes_the_line_format() {
        assert_eq!(record("2222", 2, 0, 1).encode(), b"2222 2+0- 0001\n".to_vec());
        assert_eq!(record("8234", 0, 4, 10).encode(), b"8234 0+4- 0010\n".to_vec());
        assert_eq!(record("8234", 0, 4, 10).encode().len(), FeedbackRecord::encoded_len(4));
    }

    #[test]
    fn round_trips_through_a_padded_chunk() -> std::result::Result<(), Box<dyn Error>> {
        let original = record("4283", 4, 0, 7);
        let mut chunk = vec![0u8; 16];
        let line = original.encode();
        chunk[..line.len()].copy_from_slice(&line);
        assert_eq!(FeedbackRecord::decode(&chunk)?, original);
        assert_eq!(FeedbackRecord::decode(&line)?, original);
        Ok(())
    }

    #[test]
    fn rejects_malformed_lines() {
        let bad: [&[u8]; 8] = [
            b"",
            b"2222 2+0- 0001",
            b"2222 2+0 0001\n",
            b"2222 2-0+ 0001\n",
            b"22x2 2+0- 0001\n",
            b"2222 2+0- 01\n",
            b"2222  2+0- 0001\n",
            b"2222 2+0- 0001 extra\n",
        ];
        for line in bad.iter() {
            assert!(
                matches!(FeedbackRecord::decode(line), Err(MmindError::MalformedRecord(_))),
                "{:?}",
                String::from_utf8_lossy(line)
            );
        }
    }
}
