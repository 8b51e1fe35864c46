use std::io;

use crate::service::ServiceError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Unknown template '{0}'")]
    UnknownTemplate(String),

    #[error("Required field '{label}' ({key}) is empty")]
    MissingField { key: String, label: String },

    #[error("Generated document is incomplete: {0}")]
    IncompleteGeneration(String),

    #[error("Render backend could not complete the operation: {0}")]
    RenderBackendFailure(String),

    #[error("Could not produce the output document: {0}")]
    SerializationFailure(String),

    #[error("Unknown document handle #{0}")]
    UnknownDocument(u64),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Io(#[from] io::Error),
}
