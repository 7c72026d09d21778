//! The fetch orchestrator.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use apihook_auth::{current_store, AuthStore, Callback};
use apihook_data::{
    HttpExecutor, NormalizedResponse, RequestBody, RequestDescriptor, SharedExecutor,
    FALLBACK_ERROR_MESSAGE,
};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::dedup::{DedupLedger, RequestIdentity};
use crate::error::{FetchFailure, HookError};
use crate::options::{ApiHookOptions, ApiSource, ErrorFn, FetchOptions, ReturnFn};
use crate::state::{reduce, FetchAction, FetchState};
use crate::status::StatusClass;

/// Stateful controller for one logical data need.
///
/// Runs requests through a calling function or an executor, suppresses
/// repeats inside the debouncing window, maps the response status to a state
/// transition or side effect, and publishes every state change.
///
/// Cloning yields another handle to the same orchestrator.
#[derive(Clone)]
pub struct ApiHook {
    inner: Arc<HookInner>,
}

struct HookInner {
    source: ApiSource,
    api_parameters: Option<Vec<Value>>,
    custom_return: Option<ReturnFn>,
    on_error: Option<ErrorFn>,
    logout_function: Option<Callback>,
    store: Option<AuthStore>,
    executor: SharedExecutor,
    ledger: Mutex<DedupLedger>,
    state: watch::Sender<FetchState>,
}

impl ApiHook {
    /// Build an orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::Configuration`] unless exactly one of a calling
    /// function and a request template is set.
    pub fn new(options: ApiHookOptions) -> Result<Self, HookError> {
        let source = options.source().map_err(|err| {
            tracing::warn!(error = %err, "rejecting orchestrator options");
            err
        })?;

        let initial = FetchState::new(options.initial_data, options.initial_loading_state);
        let (state, _) = watch::channel(initial);
        let executor: SharedExecutor = match options.executor {
            Some(executor) => executor,
            None => Arc::new(HttpExecutor::new()),
        };

        Ok(Self {
            inner: Arc::new(HookInner {
                source,
                api_parameters: options.api_parameters,
                custom_return: options.api_custom_return_function,
                on_error: options.on_error,
                logout_function: options.logout_function,
                store: options.store,
                executor,
                ledger: Mutex::new(DedupLedger::new(options.debouncing_limit)),
                state,
            }),
        })
    }

    /// Build an orchestrator bound to the active provider's store, unless the
    /// options already name one.
    pub fn in_scope(mut options: ApiHookOptions) -> Result<Self, HookError> {
        if options.store.is_none() {
            options.store = current_store();
        }
        Self::new(options)
    }

    /// Request source.
    pub fn source(&self) -> &ApiSource {
        &self.inner.source
    }

    /// Store this orchestrator reads from.
    pub fn store(&self) -> Option<&AuthStore> {
        self.inner.store.as_ref()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> FetchState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.inner.state.subscribe()
    }

    /// Overwrite the stored data and clear `loading`.
    pub fn alter_data(&self, data: Value) {
        self.dispatch(FetchAction::AlterData(data));
    }

    /// Run one fetch. All outcomes land in state or in callbacks.
    pub async fn fetch_data(&self, options: FetchOptions) {
        let show_loader = options.show_loader.unwrap_or(true);
        let params = options
            .params
            .or_else(|| self.inner.api_parameters.clone());
        let custom_return = options
            .custom_return
            .or_else(|| self.inner.custom_return.clone());
        let identity = RequestIdentity::new(self.inner.source.identity_key(), params.as_deref());

        let fired = self.ledger().try_fire(&identity, Instant::now());
        if !fired {
            tracing::info!(identity = %identity, "skipping request inside debouncing window");
            return;
        }

        if show_loader {
            self.dispatch(FetchAction::Init);
        }

        tracing::debug!(identity = %identity, "dispatching request");
        match self.call(params).await {
            Ok(response) => self.handle_response(response, custom_return.as_ref()),
            Err(fault) => self.handle_fault(&fault),
        }
    }

    /// Run a fetch on the runtime without waiting for it.
    pub fn spawn_fetch(&self, options: FetchOptions) -> JoinHandle<()> {
        let hook = self.clone();
        tokio::spawn(async move { hook.fetch_data(options).await })
    }

    fn ledger(&self) -> MutexGuard<'_, DedupLedger> {
        self.inner.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, action: FetchAction) {
        tracing::debug!(action = action.name(), "state transition");
        self.inner
            .state
            .send_modify(|state| *state = reduce(state, action));
    }

    fn report(&self, failure: FetchFailure) {
        if let Some(on_error) = &self.inner.on_error {
            on_error(&failure);
        }
    }

    async fn call(&self, params: Option<Vec<Value>>) -> anyhow::Result<NormalizedResponse> {
        match &self.inner.source {
            ApiSource::Function(function) => function.call(params.unwrap_or_default()).await,
            ApiSource::Config(config) => {
                let store = self.inner.store.as_ref();
                let request = resolve_request(config, store, params.as_deref());
                let executor = store
                    .and_then(AuthStore::custom_executor)
                    .unwrap_or_else(|| self.inner.executor.clone());
                Ok(executor.execute(request).await)
            }
        }
    }

    fn handle_response(&self, response: NormalizedResponse, custom_return: Option<&ReturnFn>) {
        let status = response.status_code;

        if let Some(action) = self.store().and_then(|s| s.find_custom_action(status)) {
            tracing::debug!(status = ?status, "running custom status action");
            action.run();
            return;
        }

        let class = StatusClass::of(status);
        tracing::debug!(status = ?status, class = %class, "classified response");

        match class {
            StatusClass::Informational | StatusClass::Redirect => {
                self.report(FetchFailure::Response(response));
            }
            StatusClass::Success => {
                let data = match custom_return {
                    Some(map) => map(&response),
                    None => response.to_value(),
                };
                self.dispatch(FetchAction::Success(data));
            }
            StatusClass::AuthFailure => match self.logout() {
                Some(logout) => logout(),
                None => tracing::warn!(status = ?status, "auth failure with no logout function"),
            },
            StatusClass::ClientError | StatusClass::ServerError | StatusClass::Unknown => {
                if response.is_transport_failure() {
                    tracing::warn!(error = ?response.error, "request failed before a status was received");
                }
                let fallback = class.fallback_message().unwrap_or(FALLBACK_ERROR_MESSAGE);
                let message = match class {
                    StatusClass::Unknown => fallback.to_string(),
                    _ => response.message().unwrap_or(fallback).to_string(),
                };
                self.report(FetchFailure::Response(response));
                self.dispatch(FetchAction::Error(message));
            }
        }
    }

    fn handle_fault(&self, fault: &anyhow::Error) {
        let message = match fault.to_string() {
            m if m.is_empty() => FALLBACK_ERROR_MESSAGE.to_string(),
            m => m,
        };
        tracing::warn!(error = %message, "calling function failed");
        self.dispatch(FetchAction::Error(message.clone()));
        self.report(FetchFailure::Fault(message));
    }

    fn logout(&self) -> Option<Callback> {
        self.store()
            .and_then(AuthStore::logout)
            .or_else(|| self.inner.logout_function.clone())
    }
}

impl fmt::Debug for ApiHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiHook")
            .field("source", &self.inner.source)
            .field("store", &self.inner.store)
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Merge a request template with the store and the call's parameters.
///
/// The template's URL and token win when non-empty; the body is the first
/// parameter when parameters were given.
fn resolve_request(
    config: &RequestDescriptor,
    store: Option<&AuthStore>,
    params: Option<&[Value]>,
) -> RequestDescriptor {
    let mut request = config.clone();
    request.url = non_empty(config.url.clone()).or_else(|| store.and_then(AuthStore::base_url));
    request.token = Some(
        non_empty(config.token.clone())
            .or_else(|| store.and_then(AuthStore::token))
            .unwrap_or_default(),
    );
    request.body = match params {
        Some(params) => params.first().cloned().map(RequestBody::Json),
        None => config.body.clone(),
    };
    request
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
