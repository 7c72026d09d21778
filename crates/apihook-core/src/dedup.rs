//! Per-orchestrator request deduplication.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

/// Name of a calling function with no usable name.
pub const ANONYMOUS_FUNCTION: &str = "customFunction";

/// Function name or endpoint followed by the serialized parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestIdentity(String);

impl RequestIdentity {
    /// Build an identity from a request key and its effective parameters.
    pub fn new(key: &str, params: Option<&[Value]>) -> Self {
        let serialized = serde_json::to_string(&params).unwrap_or_default();
        Self(format!("{key}{serialized}"))
    }

    /// The identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last-fired instant per request identity.
#[derive(Debug, Clone, Default)]
pub struct DedupLedger {
    window: Duration,
    last_fired: HashMap<RequestIdentity, Instant>,
}

impl DedupLedger {
    /// Create a ledger that suppresses repeats inside `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: HashMap::new(),
        }
    }

    /// Suppression window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a fire at `now` unless the identity fired inside the window.
    ///
    /// Returns `false` when the call must be skipped; the ledger is left
    /// unchanged in that case.
    pub fn try_fire(&mut self, identity: &RequestIdentity, now: Instant) -> bool {
        if let Some(last) = self.last_fired.get(identity) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }
        self.last_fired.insert(identity.clone(), now);
        true
    }

    /// When an identity last fired.
    pub fn last_fired(&self, identity: &RequestIdentity) -> Option<Instant> {
        self.last_fired.get(identity).copied()
    }

    /// Number of identities seen.
    pub fn len(&self) -> usize {
        self.last_fired.len()
    }

    /// Check if nothing has fired yet.
    pub fn is_empty(&self) -> bool {
        self.last_fired.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // === Identity Tests ===

    #[test]
    fn test_identity_appends_params() {
        let id = RequestIdentity::new("/users", Some(&[json!(1), json!("a")]));
        assert_eq!(id.as_str(), r#"/users[1,"a"]"#);
    }

    #[test]
    fn test_identity_without_params() {
        let id = RequestIdentity::new(ANONYMOUS_FUNCTION, None);
        assert_eq!(id.to_string(), "customFunctionnull");
        assert_ne!(id, RequestIdentity::new(ANONYMOUS_FUNCTION, Some(&[])));
    }

    // === Ledger Tests ===

    #[tokio::test(start_paused = true)]
    async fn test_repeat_inside_window_is_skipped() {
        let mut ledger = DedupLedger::new(Duration::from_millis(500));
        let id = RequestIdentity::new("/users", None);

        assert!(ledger.try_fire(&id, Instant::now()));
        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(!ledger.try_fire(&id, Instant::now()));
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(ledger.try_fire(&id, Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_does_not_extend_window() {
        let mut ledger = DedupLedger::new(Duration::from_millis(100));
        let id = RequestIdentity::new("/a", None);
        let start = Instant::now();

        assert!(ledger.try_fire(&id, start));
        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(!ledger.try_fire(&id, Instant::now()));
        assert_eq!(ledger.last_fired(&id), Some(start));
    }

    #[test]
    fn test_zero_window_never_skips() {
        let mut ledger = DedupLedger::default();
        let id = RequestIdentity::new("/users", None);
        let now = Instant::now();

        assert!(ledger.try_fire(&id, now));
        assert!(ledger.try_fire(&id, now));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_identities_are_independent() {
        let mut ledger = DedupLedger::new(Duration::from_secs(60));
        let now = Instant::now();

        assert!(ledger.try_fire(&RequestIdentity::new("/a", None), now));
        assert!(ledger.try_fire(&RequestIdentity::new("/b", None), now));
        assert!(ledger.try_fire(&RequestIdentity::new("/a", Some(&[json!(2)])), now));
        assert!(!ledger.try_fire(&RequestIdentity::new("/a", None), now));
        assert_eq!(ledger.len(), 3);
    }
}
