//! Update checker contract and the sequential batch-to-single checker.
//!
//! An update checker asks "are there updates for these components?" and
//! reports back through a one-shot callback. The callback is always delivered
//! asynchronously, never from inside the call that registered it.
//!
//! `SequentialUpdateChecker` wraps any checker and turns an N-id batch into N
//! single-id checks issued one after another, so a redirecting update server
//! can route each component to its own upstream.

mod error;
mod guard;
mod sequential;
mod session;
mod types;

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::configurator::Configurator;
use crate::persisted_data::PersistedData;

pub use error::CheckerError;
pub use sequential::{sequential_factory, SequentialUpdateChecker};
pub use types::{
    CheckRequest, CheckResult, ComponentDescriptor, ComponentMap, ErrorCategory, ProtocolError,
    ProtocolResults, UpdateResult, UpdateStatus,
};

/// Completion callback: fires exactly once with the outcome.
pub type UpdateCheckCallback = Box<dyn FnOnce(CheckResult) + Send + 'static>;

/// Creates a fresh checker bound to the given configuration and metadata store.
pub type CheckerFactory =
    Arc<dyn Fn(Arc<Configurator>, Arc<PersistedData>) -> Box<dyn UpdateChecker> + Send + Sync>;

/// Checks a batch of components for updates.
pub trait UpdateChecker: Send {
    /// Start a check. Returns immediately; `callback` fires later with the result.
    ///
    /// On `Err` nothing was started and `callback` is dropped without being called.
    fn check_for_updates(
        &mut self,
        request: CheckRequest,
        callback: UpdateCheckCallback,
    ) -> Result<(), CheckerError>;
}

/// Run a check and await its callback.
pub async fn check(
    checker: &mut dyn UpdateChecker,
    request: CheckRequest,
) -> Result<CheckResult, CheckerError> {
    let (tx, rx) = oneshot::channel();
    checker.check_for_updates(
        request,
        Box::new(move |result| {
            let _ = tx.send(result);
        }),
    )?;
    rx.await.map_err(|_| CheckerError::CallbackDropped)
}
