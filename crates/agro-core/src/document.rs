//! # Taxpayer Documents
//!
//! Classifies a raw document string as a CPF (individual, 11 digits) or a
//! CNPJ (organization, 14 digits) by running the national check-digit
//! algorithms. The kind is derived, never supplied by the caller.
//!
//! ## Check digits
//!
//! Both formats share one algorithm and differ only in length and in the
//! starting factors of the two weighted sums:
//!
//! | Format | Digits | Factor (digit 1) | Factor (digit 2) |
//! |--------|--------|------------------|------------------|
//! | CPF    | 11     | 10               | 11               |
//! | CNPJ   | 14     | 5                | 6                |
//!
//! The factor descends by one per digit and wraps from 2 back to 9.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Which national format a document validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Individual taxpayer id, 11 digits.
    Cpf,
    /// Organization taxpayer id, 14 digits.
    Cnpj,
}

impl DocumentKind {
    fn length(&self) -> usize {
        match self {
            Self::Cpf => 11,
            Self::Cnpj => 14,
        }
    }

    fn factors(&self) -> (u32, u32) {
        match self {
            Self::Cpf => (10, 11),
            Self::Cnpj => (5, 6),
        }
    }

    /// Run this format's checksum over `raw`.
    pub fn validates(&self, raw: &str) -> bool {
        let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
        let len = self.length();
        if digits.len() != len || all_same(&digits) {
            return false;
        }
        let (first_factor, second_factor) = self.factors();
        let first = check_digit(&digits[..len - 2], first_factor);
        let second = check_digit(&digits[..len - 1], second_factor);
        digits[len - 2] == first && digits[len - 1] == second
    }
}

/// A classified taxpayer document. The value is kept exactly as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Document {
    kind: DocumentKind,
    value: String,
}

impl Document {
    /// Classify a document, trying CPF first and CNPJ only if CPF fails.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDocument`] if neither checksum
    /// validates.
    pub fn classify(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let value = raw.into();
        let kind = [DocumentKind::Cpf, DocumentKind::Cnpj]
            .into_iter()
            .find(|kind| kind.validates(&value))
            .ok_or_else(|| ValidationError::InvalidDocument(value.clone()))?;
        Ok(Self { kind, value })
    }

    /// The derived format.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// The document as supplied, punctuation included.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::classify(raw).map_err(serde::de::Error::custom)
    }
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|pair| pair[0] == pair[1])
}

/// Weighted mod-11 check digit.
fn check_digit(digits: &[u32], mut factor: u32) -> u32 {
    let mut total = 0;
    for digit in digits {
        total += digit * factor;
        factor = if factor == 2 { 9 } else { factor - 1 };
    }
    let remainder = total % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}
