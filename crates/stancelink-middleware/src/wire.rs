//! Foot-pressure frame decoder.
//!
//! The insole firmware emits one ASCII record per line.  Two layouts are in
//! the field:
//!
//! ```text
//! H;r0,r1,r2,r3;l0,l1,l2,l3      three fields: right group, left group
//! H;r0,r1,r2,r3,l0,l1,l2,l3      two fields: eight taps, right then left
//! ```
//!
//! The leading header field is ignored.  Each foot value is the plain mean of
//! its four integer taps.
//!
//! # Example
//!
//! ```rust
//! use stancelink_middleware::wire::decode;
//!
//! let reading = decode(b"H;10,10,10,10;500,500,500,500").unwrap();
//! assert_eq!(reading.foot_right, 10.0);
//! assert_eq!(reading.foot_left, 500.0);
//! ```

use stancelink_types::{DecodeError, FootReading, TapGroup};

/// Field separator between the header and the tap groups.
pub const FIELD_SEPARATOR: char = ';';
/// Separator between individual taps inside a group.
pub const TAP_SEPARATOR: char = ',';
/// Pressure taps per foot.
pub const TAPS_PER_FOOT: usize = 4;
/// Stand-in for any byte outside the ASCII range.
pub const NON_ASCII_PLACEHOLDER: char = '?';

/// Decode one raw record into a [`FootReading`].
///
/// The record is read as ASCII: every byte above `0x7F` becomes
/// [`NON_ASCII_PLACEHOLDER`], so it surfaces as a
/// [`DecodeError::ParseFailure`] or a field-count error rather than a panic.
/// Only ASCII whitespace is trimmed.  Either both feet decode or the whole
/// frame is rejected.
pub fn decode(raw: &[u8]) -> Result<FootReading, DecodeError> {
    let text = ascii_text(raw);
    let text = trim_ascii(&text);
    let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();

    let (right, left) = match fields.as_slice() {
        [_, right, left] => (
            split_group(text, right, TapGroup::Right, TAPS_PER_FOOT)?,
            split_group(text, left, TapGroup::Left, TAPS_PER_FOOT)?,
        ),
        [_, combined] => {
            let mut taps = split_group(text, combined, TapGroup::Combined, 2 * TAPS_PER_FOOT)?;
            let left = taps.split_off(TAPS_PER_FOOT);
            (taps, left)
        }
        _ => {
            return Err(DecodeError::MalformedFrame {
                raw: text.to_string(),
                fields: fields.len(),
            });
        }
    };

    Ok(FootReading {
        foot_right: mean_of(text, &right)?,
        foot_left: mean_of(text, &left)?,
    })
}

fn ascii_text(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| {
            if b.is_ascii() {
                char::from(b)
            } else {
                NON_ASCII_PLACEHOLDER
            }
        })
        .collect()
}

fn trim_ascii(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_ascii_whitespace())
}

fn split_group<'a>(
    raw: &str,
    group: &'a str,
    kind: TapGroup,
    expected: usize,
) -> Result<Vec<&'a str>, DecodeError> {
    let taps: Vec<&str> = group.split(TAP_SEPARATOR).collect();
    if taps.len() != expected {
        return Err(DecodeError::MalformedGroup {
            raw: raw.to_string(),
            group: kind,
            expected,
            found: taps.len(),
        });
    }
    Ok(taps)
}

fn mean_of(raw: &str, taps: &[&str]) -> Result<f32, DecodeError> {
    let mut sum: u64 = 0;
    for token in taps {
        let value: u32 = trim_ascii(token)
            .parse()
            .map_err(|e: std::num::ParseIntError| DecodeError::ParseFailure {
                raw: raw.to_string(),
                token: token.to_string(),
                detail: e.to_string(),
            })?;
        sum += u64::from(value);
    }
    Ok(sum as f32 / taps.len() as f32)
}
