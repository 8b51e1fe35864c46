//! Contracts for the collaborators that live outside the composition core:
//! the template catalogue and the text generation endpoint.

use serde_json::Value;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("caller is not authenticated")]
    Unauthenticated,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request failed: {0}")]
    Failed(String),
}

/// Remote side of the template registry and the prose generator.
///
/// `list_templates` returns the raw catalogue payload; the registry validates
/// its shape before trusting it. `generate` receives the fields in template
/// order and returns already-substituted prose.
pub trait TemplateService {
    fn list_templates(&self) -> Result<Value, ServiceError>;

    fn generate(&self, template_id: &str, fields: &[(String, String)]) -> Result<String, ServiceError>;
}

/// A service that has nothing to offer. Loading a registry against it always
/// ends on the built-in templates.
pub struct OfflineService;

impl TemplateService for OfflineService {
    fn list_templates(&self) -> Result<Value, ServiceError> {
        Err(ServiceError::Unavailable("offline".into()))
    }

    fn generate(&self, _template_id: &str, _fields: &[(String, String)]) -> Result<String, ServiceError> {
        Err(ServiceError::Unavailable("offline".into()))
    }
}

/// Serves a fixed, pre-written body of text for every request. Used by the
/// CLI, where the prose comes from a file the user already has.
pub struct StaticTextService {
    text: String,
}

impl StaticTextService {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TemplateService for StaticTextService {
    fn list_templates(&self) -> Result<Value, ServiceError> {
        Err(ServiceError::Unavailable("static text source has no catalogue".into()))
    }

    fn generate(&self, _template_id: &str, _fields: &[(String, String)]) -> Result<String, ServiceError> {
        Ok(self.text.clone())
    }
}
