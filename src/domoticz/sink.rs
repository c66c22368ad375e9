//! Push sink abstraction.
//!
//! The scheduler only needs one operation from the backend: deliver a fully
//! formatted request. Keeping it behind a trait lets tests record pushes and
//! lets the bridge target something other than HTTP.

use crate::error::TeleinfoError;
use async_trait::async_trait;
use std::sync::Arc;

/// Delivers formatted sensor payloads to the home-automation backend.
///
/// Implementations must be safe to call concurrently from several sensor jobs.
#[async_trait]
pub trait PushSink: Send + Sync {
    /// Delivers one payload. `Ok` means the backend accepted it.
    async fn push(&self, payload: &str) -> Result<(), TeleinfoError>;
}

#[async_trait]
impl<T: PushSink + ?Sized> PushSink for Arc<T> {
    async fn push(&self, payload: &str) -> Result<(), TeleinfoError> {
        (**self).push(payload).await
    }
}
