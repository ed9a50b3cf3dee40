//! Bit-strings naming computational basis states.
//!
//! A [`BitString`] is written most-significant qubit first: the rightmost
//! character is qubit 0. This is the same order the backend uses for its
//! count keys, so a target can be looked up in [`amplify_hal::Counts`]
//! directly.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GroverError, GroverResult};

/// Widest register [`BitString::all`] will enumerate.
pub const MAX_ENUMERATED_QUBITS: u32 = 20;

/// An n-bit string over `'0'` and `'1'`, qubit 0 rightmost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BitString(String);

impl BitString {
    /// Parse a bit-string, rejecting empty input and characters other than 0/1.
    pub fn parse(s: &str) -> GroverResult<Self> {
        if s.is_empty() {
            return Err(GroverError::InvalidConfiguration(
                "bit-string must not be empty".into(),
            ));
        }
        if let Some(c) = s.chars().find(|c| !matches!(c, '0' | '1')) {
            return Err(GroverError::InvalidConfiguration(format!(
                "bit-string '{s}' contains '{c}'"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// The all-zero string of width `n`.
    pub fn zeros(n: u32) -> GroverResult<Self> {
        check_width(n)?;
        Ok(Self("0".repeat(n as usize)))
    }

    /// Every n-bit string in ascending numeric order.
    pub fn all(n: u32) -> GroverResult<Vec<Self>> {
        check_width(n)?;
        if n > MAX_ENUMERATED_QUBITS {
            return Err(GroverError::InvalidConfiguration(format!(
                "refusing to enumerate 2^{n} bit-strings (limit 2^{MAX_ENUMERATED_QUBITS})"
            )));
        }
        let width = n as usize;
        Ok((0..1usize << n)
            .map(|i| Self(format!("{i:0width$b}")))
            .collect())
    }

    /// Number of bits.
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// The string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of qubit `qubit` (qubit 0 is the last character), or `None`
    /// when the string has no such qubit.
    pub fn bit(&self, qubit: usize) -> Option<bool> {
        let pos = self.width().checked_sub(qubit)?.checked_sub(1)?;
        Some(self.0.as_bytes()[pos] == b'1')
    }

    /// Qubits whose bit is 0, in ascending qubit order.
    pub fn zero_qubits(&self) -> impl Iterator<Item = usize> + '_ {
        // Reversing the string puts qubit 0 first.
        self.0
            .bytes()
            .rev()
            .enumerate()
            .filter(|&(_, b)| b == b'0')
            .map(|(q, _)| q)
    }

    /// The basis-state index this string names.
    pub fn to_index(&self) -> u64 {
        self.0
            .bytes()
            .fold(0u64, |acc, b| (acc << 1) | u64::from(b == b'1'))
    }
}

fn check_width(n: u32) -> GroverResult<()> {
    if n == 0 {
        return Err(GroverError::InvalidConfiguration(
            "number of qubits must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Draw a uniformly random n-bit target; each bit is an independent fair coin.
pub fn random_target<R: Rng + ?Sized>(n: u32, rng: &mut R) -> GroverResult<BitString> {
    check_width(n)?;
    let s: String = (0..n)
        .map(|_| if rng.gen_bool(0.5) { '1' } else { '0' })
        .collect();
    Ok(BitString(s))
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BitString {
    type Err = GroverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for BitString {
    type Error = GroverError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<BitString> for String {
    fn from(bits: BitString) -> Self {
        bits.0
    }
}

impl AsRef<str> for BitString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
