use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("component id must not be empty")]
    InvalidComponent,

    #[error("component already registered: {0}")]
    AlreadyRegistered(String),

    #[error("unknown component: {0}")]
    UnknownComponent(String),

    #[error("no tokio runtime available to run update checks")]
    NoRuntime,
}
