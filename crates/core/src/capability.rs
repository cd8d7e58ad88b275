//! Timeout guard for external capability calls

use std::future::Future;
use std::time::Duration;

use crate::{Error, Result};

/// Run a capability call under a deadline.
///
/// An elapsed deadline becomes [`Error::CapabilityTimeout`], so the caller
/// handles timeouts on the same path as any other capability failure.
pub async fn guard<T, F>(capability: &str, timeout: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_elapsed) => {
            tracing::warn!(
                capability = capability,
                timeout_ms = timeout.as_millis() as u64,
                "Capability call timed out"
            );
            Err(Error::CapabilityTimeout(capability.to_string()))
        }
    }
}
