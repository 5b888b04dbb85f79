//! Pins: user-supplied text blocks that bypass compaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A persistent text block injected as a system block on every turn until it
/// expires or is explicitly removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// Monotonically increasing identifier, unique within a session.
    pub id: u64,
    /// The pinned text.
    pub text: String,
    /// When the pin was created.
    pub created_at: DateTime<Utc>,
    /// When the pin expires, if it has a TTL.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Pin {
    /// Construct a new pin. Returns `CoreError::EmptyPinText` for empty text.
    pub fn new(
        id: u64,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
        ttl_seconds: Option<i64>,
    ) -> CoreResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(CoreError::EmptyPinText);
        }
        let expires_at = ttl_seconds.map(|secs| created_at + chrono::Duration::seconds(secs));
        Ok(Self {
            id,
            text,
            created_at,
            expires_at,
        })
    }

    /// Whether this pin has expired as of `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_text() {
        let err = Pin::new(1, "   ", Utc::now(), None).unwrap_err();
        assert!(matches!(err, CoreError::EmptyPinText));
    }

    #[test]
    fn expires_after_ttl() {
        let now = Utc::now();
        let pin = Pin::new(1, "remember this", now, Some(60)).unwrap();
        assert!(!pin.is_expired(now));
        assert!(pin.is_expired(now + chrono::Duration::seconds(61)));
    }

    #[test]
    fn no_ttl_never_expires() {
        let now = Utc::now();
        let pin = Pin::new(1, "forever", now, None).unwrap();
        assert!(!pin.is_expired(now + chrono::Duration::days(365)));
    }
}
