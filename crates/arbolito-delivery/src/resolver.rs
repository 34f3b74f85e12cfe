//! Registration lookup with country-specific fallback.
//!
//! The lookup capability is known to be unreliable (false negatives
//! observed in practice), so "unresolved" is an ordinary outcome here.
//! Callers proceed with the original id as a best-effort target; only a
//! transport failure of the lookup call itself propagates as an error.

use tracing::{debug, warn};

use arbolito_core::{
    error::ArbolitoError,
    recipient::{fallback_id, RecipientId, ResolvedRecipient},
    traits::Messenger,
};

/// Result of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The network confirmed the account and returned its canonical id.
    Resolved(ResolvedRecipient),
    /// No registered account found under either digit form.
    Unresolved,
}

impl Resolution {
    /// The identifier a send should target: canonical if resolved,
    /// otherwise the original id.
    pub fn target<'a>(&'a self, original: &'a RecipientId) -> &'a str {
        match self {
            Self::Resolved(resolved) => &resolved.serialized,
            Self::Unresolved => original.as_str(),
        }
    }
}

/// Resolve a recipient id against the messaging network's registry.
///
/// When the primary lookup finds no match (or fails in transport) and a
/// country rule applies to the id's digit prefix, the lookup is retried
/// once under the rewritten form. A "not registered" outcome on either
/// attempt yields [`Resolution::Unresolved`], never an error.
pub async fn resolve(
    messenger: &dyn Messenger,
    id: &RecipientId,
) -> Result<Resolution, ArbolitoError> {
    let primary = messenger.lookup_recipient(id).await;

    match primary {
        Ok(Some(resolved)) => {
            debug!(id = %id, canonical = %resolved.serialized, "recipient resolved");
            return Ok(Resolution::Resolved(resolved));
        }
        Ok(None) => {
            debug!(id = %id, "primary lookup found no account");
        }
        Err(ref e) => {
            warn!(id = %id, error = %e, "primary lookup failed");
        }
    }

    let Some(alt) = fallback_id(id) else {
        // No rewrite rule: a transport failure propagates, "not found" does not.
        return match primary {
            Err(e) => Err(e),
            _ => Ok(Resolution::Unresolved),
        };
    };

    debug!(id = %id, alt = %alt, "retrying lookup under country fallback");
    match messenger.lookup_recipient(&alt).await? {
        Some(resolved) => Ok(Resolution::Resolved(resolved)),
        None => Ok(Resolution::Unresolved),
    }
}
