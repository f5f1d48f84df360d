//! Wrappers that turn provider calls into orchestration results.
//!
//! Ordinary API calls are bounded by the per-call API timeout. Wait calls
//! are not: the provider's wait policy decides how long they poll, and the
//! run deadline is the only outer bound.

use std::time::Duration;

use crate::error::{CycleError, CycleResult};
use crate::provider::ProviderFuture;

/// Run a non-wait provider call under the per-call API timeout.
pub async fn bounded<T>(
    op: &'static str,
    target: &str,
    limit: Duration,
    call: ProviderFuture<'_, T>,
) -> CycleResult<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(|e| CycleError::provider(op, target, e)),
        Err(_) => Err(CycleError::ApiTimeout {
            op,
            target: target.to_string(),
            timeout: limit,
        }),
    }
}

/// Run a provider wait primitive to completion.
pub async fn unbounded<T>(
    op: &'static str,
    target: &str,
    call: ProviderFuture<'_, T>,
) -> CycleResult<T> {
    call.await.map_err(|e| CycleError::provider(op, target, e))
}
