//! Errors returned synchronously when a check cannot be started.

use thiserror::Error;

/// Why `check_for_updates` rejected a call. The callback is dropped unfired.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckerError {
    /// The request carried no component ids.
    #[error("update check requested with an empty id list")]
    EmptyIdentifiers,

    /// A previous session on this checker has not delivered its result yet.
    #[error("an update check session is already in progress on this checker")]
    SessionInProgress,

    /// Called outside a tokio runtime, so there is nowhere to post the result.
    #[error("no tokio runtime available to deliver the update check result")]
    NoRuntime,

    /// The checker dropped its callback without firing it.
    #[error("update checker dropped its callback without a result")]
    CallbackDropped,
}
