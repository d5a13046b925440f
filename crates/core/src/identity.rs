//! Field identity — the structured pseudo-random token that names a client.
//!
//! A token has five hyphen-joined segments:
//!
//! ```text
//! K44 - R∞ - A0B - K725 - iX
//!  │     │     │     │     └─ [a-z0-9][A-Z]
//!  │     │     │     └─ [A-Z] + integer 0..=999
//!  │     │     └─ [A-Z][0-9][A-Z]
//!  │     └─ [A-Z] + one marker symbol
//!  └─ [A-Z] + integer 0..=99
//! ```
//!
//! Tokens are not cryptographically unguessable and nothing prevents two
//! clients from drawing the same one. Collisions are accepted.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Uppercase letters followed by digits; the first 26 are the letters.
pub const ALPHANUMERIC: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The ten non-alphanumeric marker symbols used by the second segment.
pub const MARKERS: [char; 10] = ['∞', '⊕', '⧉', '◇', '△', '▽', '⬡', '⌬', '⟁', '∴'];

const LETTERS: usize = 26;

/// An opaque client identity token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Generate a fresh token from the thread-local RNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::rng())
    }

    /// Generate a fresh token from the given RNG.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let segment1 = format!("{}{}", letter(rng), rng.random_range(0..100u32));
        let segment2 = format!("{}{}", letter(rng), MARKERS[rng.random_range(0..MARKERS.len())]);
        let segment3 = format!(
            "{}{}{}",
            letter(rng),
            rng.random_range(0..10u32),
            letter(rng)
        );
        let segment4 = format!("{}{}", letter(rng), rng.random_range(0..1000u32));
        let lower = (ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())] as char)
            .to_ascii_lowercase();
        let segment5 = format!("{}{}", lower, letter(rng));

        Self(format!("{segment1}-{segment2}-{segment3}-{segment4}-{segment5}"))
    }

    /// Wrap a stored token without validating it.
    ///
    /// Persisted identities are opaque: a token that does not match the
    /// current grammar is still the client's identity.
    pub fn from_stored(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check a token against the five-segment grammar.
    pub fn is_well_formed(token: &str) -> bool {
        let segments: Vec<&str> = token.split('-').collect();
        let [s1, s2, s3, s4, s5] = segments.as_slice() else {
            return false;
        };

        letter_then_number(s1, 2) && letter_then_marker(s2) && letter_digit_letter(s3)
            && letter_then_number(s4, 3)
            && lower_then_upper(s5)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    ALPHANUMERIC[rng.random_range(0..LETTERS)] as char
}

/// `[A-Z]` followed by an unpadded integer of at most `max_digits` digits.
fn letter_then_number(segment: &str, max_digits: usize) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let digits = chars.as_str();
    first.is_ascii_uppercase()
        && !digits.is_empty()
        && digits.len() <= max_digits
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
}

fn letter_then_marker(segment: &str) -> bool {
    let chars: Vec<char> = segment.chars().collect();
    chars.len() == 2 && chars[0].is_ascii_uppercase() && MARKERS.contains(&chars[1])
}

fn letter_digit_letter(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 3
        && bytes[0].is_ascii_uppercase()
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_uppercase()
}

fn lower_then_upper(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2
        && (bytes[0].is_ascii_lowercase() || bytes[0].is_ascii_digit())
        && bytes[1].is_ascii_uppercase()
}
