// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary literal decoding
//!
//! A binary is written as `"` + one digit (0-3) + hex digits + `"`. The
//! leading digit counts the unused high-order bits of the first hex digit,
//! so `"23F"` is the six bits `111111`. Unused bits must be zero; anything
//! that does not satisfy that decodes to [`Binary::Invalid`].

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decoded binary literal
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Binary {
    /// Bit string, right-aligned big-endian in `bytes`
    Bits { bit_len: usize, bytes: Vec<u8> },
    /// Malformed literal, kept verbatim (without the quotes)
    Invalid(String),
}

impl Binary {
    /// Decode the text between the quotes of a binary literal
    pub fn decode(literal: &str) -> Self {
        let invalid = || Binary::Invalid(literal.to_string());
        let bytes = literal.as_bytes();

        let pad = match bytes.first() {
            Some(&d @ b'0'..=b'3') => (d - b'0') as usize,
            _ => return invalid(),
        };

        let mut nibbles = Vec::with_capacity(bytes.len());
        for &b in &bytes[1..] {
            match hex_value(b) {
                Some(v) => nibbles.push(v),
                None => return invalid(),
            }
        }

        match nibbles.first() {
            None if pad > 0 => return invalid(),
            Some(&first) if pad > 0 && first >> (4 - pad) != 0 => return invalid(),
            _ => {}
        }

        let bit_len = nibbles.len() * 4 - pad;
        let mut packed = Vec::with_capacity(nibbles.len().div_ceil(2));
        let mut iter = nibbles.iter();
        if nibbles.len() % 2 == 1 {
            if let Some(&n) = iter.next() {
                packed.push(n);
            }
        }
        while let (Some(&hi), Some(&lo)) = (iter.next(), iter.next()) {
            packed.push((hi << 4) | lo);
        }

        Binary::Bits {
            bit_len,
            bytes: packed,
        }
    }

    /// Number of significant bits, `None` when invalid
    pub fn bit_len(&self) -> Option<usize> {
        match self {
            Binary::Bits { bit_len, .. } => Some(*bit_len),
            Binary::Invalid(_) => None,
        }
    }

    /// Numeric value when the bit string fits in 64 bits
    pub fn to_u64(&self) -> Option<u64> {
        match self {
            Binary::Bits { bit_len, bytes } if *bit_len <= 64 => Some(
                bytes
                    .iter()
                    .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
            ),
            _ => None,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, Binary::Bits { .. })
    }
}

#[inline]
fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
