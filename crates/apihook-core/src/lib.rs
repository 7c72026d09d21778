//! Fetch orchestration for apihook.
//!
//! This crate provides:
//! - `ApiHook` - Runs requests, deduplicates them and maps statuses to state
//! - `UseApi` - View binding with mount and dependency-triggered refetch
//! - `StatusClass` - Closed classification of HTTP status codes
//! - `FetchState` / `reduce` - Orchestrator state and its transitions
//! - `DedupLedger` - Per-orchestrator debouncing ledger

mod binding;
mod dedup;
mod error;
mod hook;
mod options;
mod state;
mod status;

pub use binding::UseApi;
pub use dedup::{DedupLedger, RequestIdentity, ANONYMOUS_FUNCTION};
pub use error::{FetchFailure, HookError};
pub use hook::ApiHook;
pub use options::{ApiFunction, ApiHookOptions, ApiSource, ErrorFn, FetchOptions, ReturnFn};
pub use state::{reduce, FetchAction, FetchState};
pub use status::StatusClass;
