// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SizeError {
    #[error("size {0:?} is not an integer with an optional g/m/k suffix")]
    Malformed(String),

    #[error("size {0:?} does not fit in 64 bits")]
    Overflow(String),
}

const KIB: u64 = 1024;
const MIB: u64 = KIB * 1024;
const GIB: u64 = MIB * 1024;

/// Parses a human-readable size such as `512m` into a byte count
///
/// Only the lowercase suffixes `g`, `m` and `k` are recognised; anything
/// else must be a plain integer. Limits are byte counts, so a leading `-`
/// (e.g. `-1k`) is rejected as malformed rather than yielding a negative
/// limit.
pub fn parse_size(s: &str) -> Result<u64, SizeError> {
    let (digits, multiplier) = match s.as_bytes().last() {
        Some(b'g') => (&s[..s.len() - 1], GIB),
        Some(b'm') => (&s[..s.len() - 1], MIB),
        Some(b'k') => (&s[..s.len() - 1], KIB),
        _ => (s, 1),
    };

    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| SizeError::Malformed(s.to_owned()))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| SizeError::Overflow(s.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffixes() {
        assert_eq!(parse_size("2g"), Ok(2_147_483_648));
        assert_eq!(parse_size("512m"), Ok(536_870_912));
        assert_eq!(parse_size("4k"), Ok(4096));
        assert_eq!(parse_size("100"), Ok(100));
    }

    #[test]
    fn whitespace_around_digits() {
        assert_eq!(parse_size(" 16m"), Ok(16 * MIB));
        assert_eq!(parse_size("300 "), Ok(300));
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "k", "4K", "4kb", "1.5m", "abc", "-1", "-1k"] {
            assert_eq!(
                parse_size(bad),
                Err(SizeError::Malformed(bad.to_owned())),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn overflow() {
        let s = format!("{}g", u64::MAX);
        assert_eq!(parse_size(&s), Err(SizeError::Overflow(s.clone())));
    }
}
