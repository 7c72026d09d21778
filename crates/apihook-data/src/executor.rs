//! The request executor seam.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{NormalizedResponse, RequestDescriptor};

/// Performs one request and normalizes the outcome.
///
/// Implementations never fail: transport and decoding problems come back as
/// [`NormalizedResponse::failure`].
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Execute a request.
    async fn execute(&self, request: RequestDescriptor) -> NormalizedResponse;
}

/// Shared, type-erased executor.
pub type SharedExecutor = Arc<dyn RequestExecutor>;

#[async_trait]
impl<T: RequestExecutor + ?Sized> RequestExecutor for Arc<T> {
    async fn execute(&self, request: RequestDescriptor) -> NormalizedResponse {
        (**self).execute(request).await
    }
}

/// Executor backed by an async closure.
pub struct FnExecutor<F> {
    f: F,
}

impl<F> FnExecutor<F> {
    /// Wrap a closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> RequestExecutor for FnExecutor<F>
where
    F: Fn(RequestDescriptor) -> Fut + Send + Sync,
    Fut: Future<Output = NormalizedResponse> + Send + 'static,
{
    async fn execute(&self, request: RequestDescriptor) -> NormalizedResponse {
        (self.f)(request).await
    }
}

/// Build a shared executor from an async closure.
pub fn executor_fn<F, Fut>(f: F) -> SharedExecutor
where
    F: Fn(RequestDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = NormalizedResponse> + Send + 'static,
{
    Arc::new(FnExecutor::new(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fn_executor_passes_descriptor() {
        let executor = executor_fn(|req: RequestDescriptor| async move {
            NormalizedResponse::new(200, json!({ "endpoint": req.endpoint }))
        });

        let resp = executor.execute(RequestDescriptor::new("/ping")).await;
        assert_eq!(resp.status_code, Some(200));
        assert_eq!(resp.data["endpoint"], "/ping");
    }

    #[tokio::test]
    async fn test_arc_executor_delegates() {
        let inner: SharedExecutor =
            executor_fn(|_req| async { NormalizedResponse::status(204) });
        let outer = Arc::new(inner);
        let resp = outer.execute(RequestDescriptor::new("/")).await;
        assert_eq!(resp.status_code, Some(204));
    }
}
