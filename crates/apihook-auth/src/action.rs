//! Custom status-code actions.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A side-effect callback with no arguments.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// A caller-supplied override that preempts default status handling for a
/// set of status codes.
#[derive(Clone)]
pub struct CustomAction {
    codes: BTreeSet<u16>,
    action: Callback,
}

impl CustomAction {
    /// Create an action for the given codes.
    pub fn new<F>(codes: impl IntoIterator<Item = u16>, action: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            codes: codes.into_iter().collect(),
            action: Arc::new(action),
        }
    }

    /// Status codes this action handles.
    pub fn codes(&self) -> &BTreeSet<u16> {
        &self.codes
    }

    /// Check if this action handles a status. An absent status never matches.
    pub fn matches(&self, status: Option<u16>) -> bool {
        status.is_some_and(|code| self.codes.contains(&code))
    }

    /// Run the callback.
    pub fn run(&self) {
        (self.action)();
    }
}

impl fmt::Debug for CustomAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAction")
            .field("codes", &self.codes)
            .finish_non_exhaustive()
    }
}

/// First action in `actions` that handles `status`.
pub fn find_action(actions: &[CustomAction], status: Option<u16>) -> Option<&CustomAction> {
    actions.iter().find(|a| a.matches(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_matches() {
        let action = CustomAction::new([418, 429], || {});
        assert!(action.matches(Some(418)));
        assert!(action.matches(Some(429)));
        assert!(!action.matches(Some(200)));
        assert!(!action.matches(None));
    }

    #[test]
    fn test_first_match_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let (f, s) = (first.clone(), second.clone());

        let actions = vec![
            CustomAction::new([500], move || {
                f.fetch_add(1, Ordering::SeqCst);
            }),
            CustomAction::new([500, 502], move || {
                s.fetch_add(1, Ordering::SeqCst);
            }),
        ];

        find_action(&actions, Some(500)).unwrap().run();
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);

        find_action(&actions, Some(502)).unwrap().run();
        assert_eq!(second.load(Ordering::SeqCst), 1);

        assert!(find_action(&actions, Some(404)).is_none());
    }

    #[test]
    fn test_debug_lists_codes() {
        let action = CustomAction::new([401], || {});
        assert!(format!("{action:?}").contains("401"));
    }
}
