//! # State Codes
//!
//! Two-letter codes of the 27 Brazilian federative units. Matching is
//! case-insensitive after trimming; the stored value keeps the caller's
//! casing, trimmed.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The fixed set of accepted codes.
pub const STATE_CODES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
    "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// A validated state code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StateCode(String);

impl StateCode {
    /// Validate a state code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidState`] if the trimmed code is not
    /// a case-insensitive match for one of [`STATE_CODES`].
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = code.into();
        let trimmed = raw.trim();
        let upper = trimmed.to_uppercase();
        if !STATE_CODES.contains(&upper.as_str()) {
            return Err(ValidationError::InvalidState(raw));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StateCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StateCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_code() {
        for code in STATE_CODES {
            assert_eq!(StateCode::new(code).unwrap().as_str(), code);
        }
    }

    #[test]
    fn keeps_input_casing_trimmed() {
        assert_eq!(StateCode::new("  sp ").unwrap().as_str(), "sp");
        assert_eq!(StateCode::new("Rj").unwrap().to_string(), "Rj");
    }

    #[test]
    fn rejects_unknown_and_empty() {
        assert!(matches!(
            StateCode::new("XX"),
            Err(ValidationError::InvalidState(_))
        ));
        assert!(StateCode::new("").is_err());
        assert!(StateCode::new("   ").is_err());
        assert!(StateCode::new("SPX").is_err());
        assert!(StateCode::new("Test State").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn mixed_case(code: &str, lower: &[bool]) -> String {
        code.chars()
            .zip(lower.iter())
            .map(|(c, lower)| if *lower { c.to_ascii_lowercase() } else { c })
            .collect()
    }

    proptest! {
        /// Every valid code passes in any casing with surrounding whitespace.
        #[test]
        fn valid_codes_pass_in_any_form(
            index in 0usize..STATE_CODES.len(),
            lower in prop::collection::vec(any::<bool>(), 2),
            left in "[ \t]{0,3}",
            right in "[ \t]{0,3}",
        ) {
            let cased = mixed_case(STATE_CODES[index], &lower);
            let input = format!("{left}{cased}{right}");
            let state = StateCode::new(input).unwrap();
            prop_assert_eq!(state.as_str(), cased.as_str());
        }

        /// Anything outside the set fails.
        #[test]
        fn other_strings_fail(input in "[A-Za-z0-9 ]{0,5}") {
            let upper = input.trim().to_uppercase();
            prop_assume!(!STATE_CODES.contains(&upper.as_str()));
            prop_assert!(StateCode::new(input).is_err());
        }
    }
}
