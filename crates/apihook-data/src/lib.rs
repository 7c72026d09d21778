//! Request execution for apihook.
//!
//! This crate provides:
//! - `RequestDescriptor` - Structured description of a request
//! - `NormalizedResponse` - The uniform `{data, statusCode, error}` shape
//! - `RequestExecutor` - The pluggable "perform a request" seam
//! - `HttpExecutor` - Default `reqwest`-backed executor
//!
//! # Example
//!
//! ```rust,ignore
//! use apihook_data::{HttpExecutor, Method, RequestDescriptor, RequestExecutor};
//!
//! let executor = HttpExecutor::new();
//!
//! let response = executor
//!     .execute(
//!         RequestDescriptor::new("/users")
//!             .with_url("https://api.example.com")
//!             .with_method(Method::Post)
//!             .with_json(serde_json::json!({ "name": "Ada" }))
//!             .with_token(token)
//!             .with_authentication(true),
//!     )
//!     .await;
//!
//! match response.status_code {
//!     Some(201) => println!("created {}", response.data),
//!     Some(code) => println!("server answered {code}"),
//!     None => println!("transport failed: {:?}", response.error),
//! }
//! ```

mod client;
mod error;
mod executor;
mod request;
mod response;

pub use client::{ExecutorConfig, HttpExecutor};
pub use error::FetchError;
pub use executor::{executor_fn, FnExecutor, RequestExecutor, SharedExecutor};
pub use request::{Method, RequestBody, RequestDescriptor};
pub use response::{NormalizedResponse, FALLBACK_ERROR_MESSAGE};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        HttpExecutor, Method, NormalizedResponse, RequestDescriptor, RequestExecutor,
        SharedExecutor,
    };
}
