//! Text normalization shared by training and query time.
//!
//! Candidate-table keys and query text must pass through the *same*
//! normalization, or match quality silently degrades — the table persists a
//! [`Normalizer::fingerprint`] so a divergence is detectable at load time
//! rather than masked (see [`crate::table::ExampleDb::check_normalizer`]).
//!
//! Normalization is: Unicode NFC, punctuation → space, configured case
//! transform, whitespace collapse.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Case transform applied to words at training time and to queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Casing {
    /// Fold everything to lowercase.
    Lower,
    /// Fold everything to uppercase.
    Upper,
    /// Leave case untouched.
    #[default]
    Ignore,
}

impl Casing {
    fn apply(self, text: &str) -> String {
        match self {
            Casing::Lower => text.to_lowercase(),
            Casing::Upper => text.to_uppercase(),
            Casing::Ignore => text.to_string(),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Casing::Lower => "lower",
            Casing::Upper => "upper",
            Casing::Ignore => "ignore",
        }
    }
}

/// Normalizer configuration. A plain struct so sessions can construct it
/// explicitly; no process-wide state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Case transform.
    pub casing: Casing,
}

/// Canonicalizes sentence text so training keys and queries compare equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    /// Normalizer with the given configuration.
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalizer with the given case transform and defaults otherwise.
    pub fn with_casing(casing: Casing) -> Self {
        Self::new(NormalizerConfig { casing })
    }

    /// Canonicalize text: NFC, punctuation to spaces, case transform,
    /// single-space tokens, trimmed.
    pub fn apply(&self, text: &str) -> String {
        let folded: String = text
            .nfc()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let cased = self.config.casing.apply(&folded);
        cased.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Stable identifier of this normalizer's behavior, persisted alongside
    /// the examples table. Two normalizers with equal fingerprints produce
    /// identical keys for any input.
    pub fn fingerprint(&self) -> String {
        format!("v1/nfc/strip-punct/casing={}", self.config.casing.as_str())
    }
}
