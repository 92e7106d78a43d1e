//! Error types for entity resolution and document scanning

use crate::guard::ERROR_MESSAGE_BASE;
use thiserror::Error;

/// An external reference was refused by the entity guard.
///
/// Parsing must stop once this is returned. The same system identifier is
/// always refused, so there is nothing to retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}{}", ERROR_MESSAGE_BASE, shown_system_id(.system_id))]
pub struct ResolutionDisallowed {
    system_id: Option<String>,
}

// An absent identifier is shown as `null`.
fn shown_system_id(system_id: &Option<String>) -> &str {
    system_id.as_deref().unwrap_or("null")
}

impl ResolutionDisallowed {
    pub fn new(system_id: Option<String>) -> Self {
        Self { system_id }
    }

    /// The system identifier exactly as the parser reported it.
    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }
}

/// Errors raised while scanning a document for external references
#[derive(Debug, Error)]
pub enum XmlGuardError {
    #[error(transparent)]
    Disallowed(#[from] ResolutionDisallowed),

    #[error("XML parsing error: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("invalid text encoding: {0}")]
    Encoding(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl XmlGuardError {
    /// True when the document was rejected by policy rather than failing to parse.
    pub fn is_disallowed(&self) -> bool {
        matches!(self, Self::Disallowed(_))
    }
}

pub type Result<T> = std::result::Result<T, XmlGuardError>;
