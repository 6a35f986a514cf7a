//! Postal code normalization and validation.

use crate::error::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of digits in a normalized postal code.
pub const POSTAL_CODE_LEN: usize = 8;

/// Separators accepted in user input and stripped before validation.
const SEPARATORS: [char; 3] = ['-', '.', ' '];

/// A postal code that is exactly eight ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostalCode(String);

impl PostalCode {
    /// Normalize and validate raw input such as `"01001-000"` or `"01.001 000"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let cleaned: String = raw.chars().filter(|c| !SEPARATORS.contains(c)).collect();

        if cleaned.len() != POSTAL_CODE_LEN || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LabError::malformed(format!(
                "postal code must have {} digits: {:?}",
                POSTAL_CODE_LEN, raw
            )));
        }

        Ok(Self(cleaned))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display form `XXXXX-XXX`.
    pub fn formatted(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PostalCode {
    type Error = LabError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PostalCode> for String {
    fn from(code: PostalCode) -> Self {
        code.0
    }
}
