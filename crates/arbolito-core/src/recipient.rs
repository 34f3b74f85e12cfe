//! Recipient identifiers — normalization and country fallback rules.
//!
//! A [`RecipientId`] is the canonical chat-destination token used by the
//! messaging network for individual chats: the digits of a phone number
//! followed by the fixed `@c.us` suffix. No length or country-code
//! validation happens here; a malformed number simply yields an id the
//! resolver or the send call will reject later.

use serde::{Deserialize, Serialize};

use crate::error::ArbolitoError;

/// Fixed suffix for individual-chat identifiers.
pub const CHAT_SUFFIX: &str = "@c.us";

/// Canonical chat-destination token. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipientId(String);

impl RecipientId {
    /// Normalize an arbitrary phone string into a recipient id.
    ///
    /// Strips every non-digit character (spaces, dashes, `+`, parentheses)
    /// and appends [`CHAT_SUFFIX`]. An input with no digits at all is a
    /// caller error and is rejected here.
    pub fn normalize(raw: &str) -> Result<Self, ArbolitoError> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Err(ArbolitoError::Recipient(format!(
                "phone number '{raw}' contains no digits"
            )));
        }
        Ok(Self(format!("{digits}{CHAT_SUFFIX}")))
    }

    /// Construct from an already-canonical id string. Used by the fallback
    /// table and by tests; does not re-validate.
    fn from_digits(digits: &str) -> Self {
        Self(format!("{digits}{CHAT_SUFFIX}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The digit portion, without the suffix.
    pub fn digits(&self) -> &str {
        self.0.strip_suffix(CHAT_SUFFIX).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for RecipientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Network-canonical identifier returned by a successful registration
/// lookup. Created per send attempt and discarded after use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecipient {
    /// The network's serialized form of the identifier.
    pub serialized: String,
}

/// A country-specific digit-prefix rewrite applied when the primary
/// registration lookup finds no match.
///
/// Some countries over-qualify mobile numbers with an extra digit after
/// the country code (Mexico inserts a `1`); the registered account often
/// lives under the shorter form.
#[derive(Debug, Clone, Copy)]
pub struct CountryRule {
    /// Digit prefix the canonical id must start with.
    pub prefix: &'static str,
    /// Replacement for that prefix in the retried lookup.
    pub replacement: &'static str,
}

/// Known over-qualified country-code patterns.
pub const COUNTRY_RULES: &[CountryRule] = &[
    // Mexico: mobile numbers registered as 52..., often dialed as 521...
    CountryRule {
        prefix: "521",
        replacement: "52",
    },
];

/// Alternate id for the fallback lookup, if any rule applies.
pub fn fallback_id(id: &RecipientId) -> Option<RecipientId> {
    let digits = id.digits();
    COUNTRY_RULES.iter().find_map(|rule| {
        digits
            .strip_prefix(rule.prefix)
            .map(|rest| RecipientId::from_digits(&format!("{}{rest}", rule.replacement)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_formatting() {
        let id = RecipientId::normalize("+52 155 1234 5678").unwrap();
        assert_eq!(id.as_str(), "5215512345678@c.us");
    }

    #[test]
    fn test_normalize_parentheses_and_dashes() {
        let id = RecipientId::normalize("(573) 00-123-4567").unwrap();
        assert_eq!(id.as_str(), "573001234567@c.us");
    }

    #[test]
    fn test_normalize_plain_digits_passthrough() {
        let id = RecipientId::normalize("573001234567").unwrap();
        assert_eq!(id.as_str(), "573001234567@c.us");
        assert_eq!(id.digits(), "573001234567");
    }

    #[test]
    fn test_normalize_preserves_digit_order() {
        let id = RecipientId::normalize("1a2b3c").unwrap();
        assert_eq!(id.digits(), "123");
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(RecipientId::normalize("").is_err());
        assert!(RecipientId::normalize("+- ()").is_err());
    }

    #[test]
    fn test_fallback_mexico_drops_mobile_prefix() {
        let id = RecipientId::normalize("5215512345678").unwrap();
        let alt = fallback_id(&id).unwrap();
        assert_eq!(alt.as_str(), "525512345678@c.us");
    }

    #[test]
    fn test_fallback_no_rule_for_other_prefixes() {
        let id = RecipientId::normalize("573001234567").unwrap();
        assert!(fallback_id(&id).is_none());
        // 52 without the mobile 1 is already the short form.
        let id = RecipientId::normalize("525512345678").unwrap();
        assert!(fallback_id(&id).is_none());
    }
}
