//! View binding: the surface a view renders from.

use serde_json::Value;
use tokio::sync::watch;

use crate::error::HookError;
use crate::hook::ApiHook;
use crate::options::{ApiHookOptions, FetchOptions, ReturnFn};
use crate::state::FetchState;

/// Binds an [`ApiHook`] to a view's lifecycle.
///
/// The view calls [`UseApi::activate`] on every render pass. The first
/// enabled activation fetches when mount fetching is on, and any enabled
/// activation whose dependency list differs from the previous one fetches
/// once.
#[derive(Debug)]
pub struct UseApi {
    hook: ApiHook,
    run_on_mount: bool,
    is_enabled: bool,
    mounted: bool,
    dependencies: Vec<Value>,
    snapshot: String,
}

impl UseApi {
    /// Build a binding and its orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Configuration`] for an invalid request source.
    pub fn new(options: ApiHookOptions) -> Result<Self, HookError> {
        let run_on_mount = options.run_on_time_of_screen_mount;
        let is_enabled = options.is_enabled;
        let dependencies = options.re_fetch_dependencies.clone();
        let hook = ApiHook::new(options)?;
        Ok(Self::bind(hook, run_on_mount, is_enabled, dependencies))
    }

    /// Build a binding whose orchestrator reads the active provider's store.
    pub fn in_scope(options: ApiHookOptions) -> Result<Self, HookError> {
        let run_on_mount = options.run_on_time_of_screen_mount;
        let is_enabled = options.is_enabled;
        let dependencies = options.re_fetch_dependencies.clone();
        let hook = ApiHook::in_scope(options)?;
        Ok(Self::bind(hook, run_on_mount, is_enabled, dependencies))
    }

    fn bind(hook: ApiHook, run_on_mount: bool, is_enabled: bool, dependencies: Vec<Value>) -> Self {
        let snapshot = serialize(&dependencies);
        Self {
            hook,
            run_on_mount,
            is_enabled,
            mounted: false,
            dependencies,
            snapshot,
        }
    }

    /// The underlying orchestrator.
    pub fn hook(&self) -> &ApiHook {
        &self.hook
    }

    /// Current data.
    pub fn data(&self) -> Value {
        self.hook.state().data
    }

    /// Whether a fetch with loader is in flight.
    pub fn loading(&self) -> bool {
        self.hook.state().loading
    }

    /// Last error message.
    pub fn error(&self) -> Option<String> {
        self.hook.state().error
    }

    /// Whether a background refetch is in flight.
    pub fn refetching(&self) -> bool {
        self.hook.state().refetching
    }

    /// Full state snapshot.
    pub fn state(&self) -> FetchState {
        self.hook.state()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.hook.subscribe()
    }

    /// Fetch with structured overrides.
    pub async fn fetch_data(&self, options: FetchOptions) {
        self.hook.fetch_data(options).await;
    }

    /// Fetch with only the loader flag set.
    pub async fn fetch_data_with_loader(&self, show_loader: bool) {
        self.hook.fetch_data(FetchOptions::from(show_loader)).await;
    }

    /// Fetch with positional overrides.
    pub async fn fetch_data_legacy(
        &self,
        show_loader: Option<bool>,
        params: Option<Vec<Value>>,
        custom_return: Option<ReturnFn>,
    ) {
        self.hook
            .fetch_data(FetchOptions::from_parts(show_loader, params, custom_return))
            .await;
    }

    /// Overwrite the stored data.
    pub fn alter_data(&self, data: Value) {
        self.hook.alter_data(data);
    }

    /// Whether automatic fetches are allowed.
    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    /// Allow or block automatic fetches.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.is_enabled = enabled;
    }

    /// Current dependency list.
    pub fn dependencies(&self) -> &[Value] {
        &self.dependencies
    }

    /// Replace the dependency list; takes effect on the next activation.
    pub fn set_dependencies(&mut self, dependencies: Vec<Value>) {
        self.dependencies = dependencies;
    }

    /// Run one render pass. Returns whether a fetch ran.
    pub async fn activate(&mut self) -> bool {
        let current = serialize(&self.dependencies);
        let mut fire = false;

        if self.is_enabled {
            if self.run_on_mount && !self.mounted {
                self.mounted = true;
                fire = true;
            }
            if current != self.snapshot {
                tracing::debug!(dependencies = %current, "dependencies changed");
                fire = true;
            }
        }
        self.snapshot = current;

        if fire {
            self.hook.fetch_data(FetchOptions::new()).await;
        }
        fire
    }

    /// Replace the dependency list and run a render pass.
    pub async fn update(&mut self, dependencies: Vec<Value>) -> bool {
        self.set_dependencies(dependencies);
        self.activate().await
    }
}

fn serialize(dependencies: &[Value]) -> String {
    serde_json::to_string(dependencies).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ApiFunction;
    use apihook_data::NormalizedResponse;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting() -> (Arc<AtomicUsize>, ApiHookOptions) {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let function = ApiFunction::named("load", move |_p| {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(NormalizedResponse::new(200, json!(n))) }
        });
        (calls, ApiHookOptions::function(function))
    }

    // === Mount Tests ===

    #[tokio::test]
    async fn test_mount_fetch_runs_once() {
        let (calls, options) = counting();
        let mut view = UseApi::new(options.run_on_time_of_screen_mount(true)).unwrap();

        assert!(view.activate().await);
        assert!(!view.activate().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(view.data()["statusCode"], json!(200));
    }

    #[tokio::test]
    async fn test_no_mount_fetch_by_default() {
        let (calls, options) = counting();
        let mut view = UseApi::new(options).unwrap();

        assert!(!view.activate().await);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!view.loading());
        assert!(view.error().is_none());
        assert!(!view.refetching());
    }

    #[tokio::test]
    async fn test_mount_waits_for_enable() {
        let (calls, options) = counting();
        let mut view =
            UseApi::new(options.run_on_time_of_screen_mount(true).is_enabled(false)).unwrap();

        assert!(!view.activate().await);
        view.set_enabled(true);
        assert!(view.activate().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // === Dependency Tests ===

    #[tokio::test]
    async fn test_dependency_change_fetches_once() {
        let (calls, options) = counting();
        let mut view = UseApi::new(options.re_fetch_dependencies(vec![json!(1)])).unwrap();

        assert!(!view.activate().await);
        assert!(view.update(vec![json!(2)]).await);
        assert!(!view.activate().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mount_and_change_in_same_pass_fetch_once() {
        let (calls, options) = counting();
        let mut view = UseApi::new(
            options
                .run_on_time_of_screen_mount(true)
                .re_fetch_dependencies(vec![json!("a")]),
        )
        .unwrap();

        view.set_dependencies(vec![json!("b")]);
        assert!(view.activate().await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_ignores_changes_but_tracks_snapshot() {
        let (calls, options) = counting();
        let mut view = UseApi::new(
            options
                .is_enabled(false)
                .re_fetch_dependencies(vec![json!(1)]),
        )
        .unwrap();

        assert!(!view.update(vec![json!(2)]).await);
        view.set_enabled(true);
        assert!(!view.activate().await);
        assert!(view.update(vec![json!(3)]).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(view.dependencies(), &[json!(3)]);
    }

    // === Output Tests ===

    #[tokio::test]
    async fn test_fetch_forms_merge_identically() {
        let (_, options) = counting();
        let view = UseApi::new(options.api_parameters(vec![json!("default")])).unwrap();

        let as_data: ReturnFn = Arc::new(|r: &NormalizedResponse| r.data.clone());
        view.fetch_data_legacy(Some(false), None, Some(as_data)).await;
        assert_eq!(view.data(), json!(1));

        view.fetch_data(FetchOptions::new().show_loader(false).custom_return(|r| r.data.clone()))
            .await;
        assert_eq!(view.data(), json!(2));

        view.fetch_data_with_loader(true).await;
        assert_eq!(view.data()["data"], json!(3));
    }

    #[tokio::test]
    async fn test_alter_data_and_subscribe() {
        let (_, options) = counting();
        let view = UseApi::new(options.initial_data(json!([]))).unwrap();
        let mut rx = view.subscribe();

        view.alter_data(json!(["x"]));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().data, json!(["x"]));
        assert_eq!(view.state(), FetchState::new(json!(["x"]), false));
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(UseApi::new(ApiHookOptions::new()).is_err());
    }
}
