//! Orchestrator construction and per-call options.

use std::any::type_name;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use apihook_auth::{AuthStore, Callback};
use apihook_data::{NormalizedResponse, RequestDescriptor, SharedExecutor};
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::dedup::ANONYMOUS_FUNCTION;
use crate::error::{FetchFailure, HookError};

/// Maps a successful response to the data stored in state.
pub type ReturnFn = Arc<dyn Fn(&NormalizedResponse) -> Value + Send + Sync>;

/// Side effect run on failure outcomes.
pub type ErrorFn = Arc<dyn Fn(&FetchFailure) + Send + Sync>;

type CallFn =
    Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, anyhow::Result<NormalizedResponse>> + Send + Sync>;

/// A caller-supplied async function that performs the request itself.
///
/// It receives the effective parameter list and must produce a normalized
/// response; an `Err` is reported as a fault.
#[derive(Clone)]
pub struct ApiFunction {
    name: Option<String>,
    call: CallFn,
}

impl ApiFunction {
    /// Wrap a function. Named functions keep their item name as identity;
    /// closures are anonymous.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<NormalizedResponse>> + Send + 'static,
    {
        Self {
            name: function_name::<F>(),
            call: Arc::new(move |params| f(params).boxed()),
        }
    }

    /// Wrap a function under an explicit name.
    pub fn named<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<NormalizedResponse>> + Send + 'static,
    {
        Self {
            name: Some(name.into()),
            ..Self::new(f)
        }
    }

    /// Function name, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Key used for request identity.
    pub fn identity_key(&self) -> &str {
        self.name().unwrap_or(ANONYMOUS_FUNCTION)
    }

    pub(crate) fn call(&self, params: Vec<Value>) -> BoxFuture<'static, anyhow::Result<NormalizedResponse>> {
        (self.call)(params)
    }
}

impl fmt::Debug for ApiFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn function_name<F>() -> Option<String> {
    short_name(type_name::<F>()).map(str::to_owned)
}

/// Last path segment of an fn item's type name, without generics.
///
/// Closures, fn pointers, trait objects and references have no usable name.
fn short_name(full: &str) -> Option<&str> {
    const UNNAMED: [&str; 6] = ["fn(", "dyn ", "&", "(", "*", "["];
    if full.contains("{{closure}}") || UNNAMED.iter().any(|prefix| full.starts_with(prefix)) {
        return None;
    }

    let bytes = full.as_bytes();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth -= 1,
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                start = i + 2;
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    let segment = &full[start..];
    let name = segment.split('<').next().unwrap_or(segment);
    Some(name).filter(|name| !name.is_empty())
}

/// Where the orchestrator's requests come from.
#[derive(Debug, Clone)]
pub enum ApiSource {
    /// A caller-supplied function.
    Function(ApiFunction),
    /// A request template run through an executor.
    Config(RequestDescriptor),
}

impl ApiSource {
    /// Function name or endpoint.
    pub fn identity_key(&self) -> &str {
        match self {
            Self::Function(function) => function.identity_key(),
            Self::Config(config) => &config.endpoint,
        }
    }
}

/// Everything an orchestrator is built from.
///
/// Exactly one of [`ApiHookOptions::api_calling_function`] and
/// [`ApiHookOptions::api_config`] must be set.
#[derive(Clone)]
pub struct ApiHookOptions {
    pub(crate) api_calling_function: Option<ApiFunction>,
    pub(crate) api_config: Option<RequestDescriptor>,
    pub(crate) api_parameters: Option<Vec<Value>>,
    pub(crate) api_custom_return_function: Option<ReturnFn>,
    pub(crate) on_error: Option<ErrorFn>,
    pub(crate) run_on_time_of_screen_mount: bool,
    pub(crate) initial_loading_state: bool,
    pub(crate) initial_data: Value,
    pub(crate) re_fetch_dependencies: Vec<Value>,
    pub(crate) logout_function: Option<Callback>,
    pub(crate) debouncing_limit: Duration,
    pub(crate) is_enabled: bool,
    pub(crate) store: Option<AuthStore>,
    pub(crate) executor: Option<SharedExecutor>,
}

impl Default for ApiHookOptions {
    fn default() -> Self {
        Self {
            api_calling_function: None,
            api_config: None,
            api_parameters: None,
            api_custom_return_function: None,
            on_error: None,
            run_on_time_of_screen_mount: false,
            initial_loading_state: false,
            initial_data: Value::Null,
            re_fetch_dependencies: Vec::new(),
            logout_function: None,
            debouncing_limit: Duration::ZERO,
            is_enabled: true,
            store: None,
            executor: None,
        }
    }
}

impl ApiHookOptions {
    /// Empty options; a source must still be set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for a request template.
    pub fn config(config: RequestDescriptor) -> Self {
        Self::new().api_config(config)
    }

    /// Options for a calling function.
    pub fn function(function: ApiFunction) -> Self {
        Self::new().api_calling_function(function)
    }

    /// Use a caller-supplied function to perform requests.
    pub fn api_calling_function(mut self, function: ApiFunction) -> Self {
        self.api_calling_function = Some(function);
        self
    }

    /// Use a request template.
    pub fn api_config(mut self, config: RequestDescriptor) -> Self {
        self.api_config = Some(config);
        self
    }

    /// Default positional parameters.
    pub fn api_parameters(mut self, params: Vec<Value>) -> Self {
        self.api_parameters = Some(params);
        self
    }

    /// Default mapping from a successful response to stored data.
    pub fn api_custom_return_function<F>(mut self, f: F) -> Self
    where
        F: Fn(&NormalizedResponse) -> Value + Send + Sync + 'static,
    {
        self.api_custom_return_function = Some(Arc::new(f));
        self
    }

    /// Callback for failure outcomes.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&FetchFailure) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Fetch on the first activation.
    pub fn run_on_time_of_screen_mount(mut self, run: bool) -> Self {
        self.run_on_time_of_screen_mount = run;
        self
    }

    /// Initial `loading` flag.
    pub fn initial_loading_state(mut self, loading: bool) -> Self {
        self.initial_loading_state = loading;
        self
    }

    /// Initial data.
    pub fn initial_data(mut self, data: Value) -> Self {
        self.initial_data = data;
        self
    }

    /// Values whose change triggers a refetch.
    pub fn re_fetch_dependencies(mut self, dependencies: Vec<Value>) -> Self {
        self.re_fetch_dependencies = dependencies;
        self
    }

    /// Logout used when the store has none.
    pub fn logout_function<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.logout_function = Some(Arc::new(f));
        self
    }

    /// Window inside which a repeated identical request is skipped.
    pub fn debouncing_limit(mut self, limit: Duration) -> Self {
        self.debouncing_limit = limit;
        self
    }

    /// Debouncing window in milliseconds.
    pub fn debouncing_limit_ms(self, millis: u64) -> Self {
        self.debouncing_limit(Duration::from_millis(millis))
    }

    /// Allow automatic fetches.
    pub fn is_enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }

    /// Store to read the token, base URL and overrides from.
    pub fn store(mut self, store: AuthStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Executor used when the store has no custom executor.
    pub fn executor(mut self, executor: SharedExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    pub(crate) fn source(&self) -> Result<ApiSource, HookError> {
        match (&self.api_calling_function, &self.api_config) {
            (Some(function), None) => Ok(ApiSource::Function(function.clone())),
            (None, Some(config)) => Ok(ApiSource::Config(config.clone())),
            (Some(_), Some(_)) => Err(HookError::conflicting_sources()),
            (None, None) => Err(HookError::missing_source()),
        }
    }
}

impl fmt::Debug for ApiHookOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiHookOptions")
            .field("api_calling_function", &self.api_calling_function)
            .field("api_config", &self.api_config)
            .field("api_parameters", &self.api_parameters)
            .field("run_on_time_of_screen_mount", &self.run_on_time_of_screen_mount)
            .field("debouncing_limit", &self.debouncing_limit)
            .field("is_enabled", &self.is_enabled)
            .finish_non_exhaustive()
    }
}

/// Per-call overrides for a fetch. Unset fields fall back to the
/// orchestrator's construction options.
#[derive(Clone, Default)]
pub struct FetchOptions {
    pub(crate) show_loader: Option<bool>,
    pub(crate) params: Option<Vec<Value>>,
    pub(crate) custom_return: Option<ReturnFn>,
}

impl FetchOptions {
    /// No overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to transition to loading before the call. Defaults to true.
    pub fn show_loader(mut self, show: bool) -> Self {
        self.show_loader = Some(show);
        self
    }

    /// Parameters for this call.
    pub fn params(mut self, params: Vec<Value>) -> Self {
        self.params = Some(params);
        self
    }

    /// Response mapping for this call.
    pub fn custom_return<F>(mut self, f: F) -> Self
    where
        F: Fn(&NormalizedResponse) -> Value + Send + Sync + 'static,
    {
        self.custom_return = Some(Arc::new(f));
        self
    }

    /// Build from the positional `(show_loader, params, custom_return)` form.
    pub fn from_parts(
        show_loader: Option<bool>,
        params: Option<Vec<Value>>,
        custom_return: Option<ReturnFn>,
    ) -> Self {
        Self {
            show_loader,
            params,
            custom_return,
        }
    }
}

impl From<bool> for FetchOptions {
    fn from(show_loader: bool) -> Self {
        Self::new().show_loader(show_loader)
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("show_loader", &self.show_loader)
            .field("params", &self.params)
            .field("has_custom_return", &self.custom_return.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn load_users(_params: Vec<Value>) -> anyhow::Result<NormalizedResponse> {
        Ok(NormalizedResponse::status(200))
    }

    // === ApiFunction Tests ===

    #[test]
    fn test_named_fn_item_keeps_name() {
        let function = ApiFunction::new(load_users);
        assert_eq!(function.name(), Some("load_users"));
        assert_eq!(function.identity_key(), "load_users");
    }

    #[test]
    fn test_closure_is_anonymous() {
        let function = ApiFunction::new(|_params| async { Ok(NormalizedResponse::status(200)) });
        assert_eq!(function.name(), None);
        assert_eq!(function.identity_key(), "customFunction");
    }

    #[test]
    fn test_short_name_of_paths() {
        assert_eq!(short_name("app::api::get_users"), Some("get_users"));
        assert_eq!(short_name("app::api::fetch_page<u32>"), Some("fetch_page"));
        assert_eq!(short_name("my_crate::Api<alloc::vec::Vec<u8>>::load"), Some("load"));
        assert_eq!(short_name("<app::Users as app::Source>::list"), Some("list"));
        assert_eq!(short_name("standalone"), Some("standalone"));
    }

    #[test]
    fn test_short_name_of_unnamed_types() {
        assert_eq!(
            short_name("fn(alloc::vec::Vec<serde_json::value::Value>) -> core::pin::Pin<alloc::boxed::Box<u8>>"),
            None
        );
        assert_eq!(short_name("dyn core::ops::function::Fn(alloc::vec::Vec<u8>)"), None);
        assert_eq!(short_name("&app::api::get_users"), None);
        assert_eq!(short_name("app::main::{{closure}}"), None);
        assert_eq!(short_name("app::Api<u8>::"), None);
    }

    #[test]
    fn test_fn_pointer_is_anonymous() {
        let pointer: fn(Vec<Value>) -> std::future::Ready<anyhow::Result<NormalizedResponse>> =
            |_params| std::future::ready(Ok(NormalizedResponse::status(200)));
        let function = ApiFunction::new(pointer);
        assert_eq!(function.name(), None);
        assert_eq!(function.identity_key(), "customFunction");
    }

    #[test]
    fn test_explicit_name() {
        let function = ApiFunction::named("listOrders", |_params| async {
            Ok(NormalizedResponse::status(200))
        });
        assert_eq!(function.identity_key(), "listOrders");
    }

    #[tokio::test]
    async fn test_call_receives_params() {
        let function = ApiFunction::new(|params: Vec<Value>| async move {
            Ok(NormalizedResponse::new(200, Value::Array(params)))
        });
        let response = function.call(vec![json!(1), json!("x")]).await.unwrap();
        assert_eq!(response.data, json!([1, "x"]));
    }

    // === Source Tests ===

    #[test]
    fn test_source_requires_exactly_one() {
        let config = RequestDescriptor::new("/users");
        let function = ApiFunction::new(load_users);

        assert!(matches!(
            ApiHookOptions::config(config.clone()).source(),
            Ok(ApiSource::Config(_))
        ));
        assert!(matches!(
            ApiHookOptions::function(function.clone()).source(),
            Ok(ApiSource::Function(_))
        ));
        assert!(ApiHookOptions::new().source().is_err());
        assert!(ApiHookOptions::config(config)
            .api_calling_function(function)
            .source()
            .unwrap_err()
            .is_configuration_error());
    }

    #[test]
    fn test_source_identity_key() {
        let source = ApiHookOptions::config(RequestDescriptor::new("/orders"))
            .source()
            .unwrap();
        assert_eq!(source.identity_key(), "/orders");
    }

    // === Defaults Tests ===

    #[test]
    fn test_option_defaults() {
        let options = ApiHookOptions::new();
        assert!(options.is_enabled);
        assert!(!options.run_on_time_of_screen_mount);
        assert!(!options.initial_loading_state);
        assert_eq!(options.debouncing_limit, Duration::ZERO);
        assert_eq!(options.initial_data, Value::Null);
    }

    #[test]
    fn test_fetch_options_from_bool() {
        let options = FetchOptions::from(false);
        assert_eq!(options.show_loader, Some(false));
        assert!(options.params.is_none());
        assert!(format!("{options:?}").contains("has_custom_return: false"));
    }
}
