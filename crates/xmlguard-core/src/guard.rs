//! The entity resolution policy
//!
//! [`EntityGuard`] allows only system identifiers that point at an `.xsd`
//! schema through one of three mechanisms:
//!
//! - `http` / `https`: external schema references
//! - `jar:file`: schemas bundled inside an archive
//! - `vfs`: schemas on the JBoss virtual filesystem
//!
//! Anything carrying `?`, `#` or `;` is refused so that a permitted-looking
//! prefix cannot smuggle another resource through. Everything else, an
//! absent system identifier included, is refused.
//!
//! # Example
//!
//! ```
//! use xmlguard_core::EntityGuard;
//!
//! let guard = EntityGuard::INSTANCE;
//!
//! assert!(guard.decide(None, Some("http://www.opengis.net/gml/3.2/gml.xsd")).is_ok());
//!
//! let err = guard.decide(None, Some("file:///etc/passwd")).unwrap_err();
//! assert_eq!(err.to_string(), "Entity resolution disallowed for file:///etc/passwd");
//! ```

use crate::error::ResolutionDisallowed;
use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix of every denial message; the offending system identifier follows it.
pub const ERROR_MESSAGE_BASE: &str = "Entity resolution disallowed for ";

// Whole-string match. Case folding is ASCII-only so that e.g. U+017F does
// not stand in for the `s` of `.xsd`.
static ALLOWED_SYSTEM_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A(?i-u:jar:file|http|vfs)[^?#;]*(?i-u:\.xsd)\z")
        .expect("system id allow-list pattern must compile")
});

/// Stateless resolver that refuses external entities.
///
/// There is nothing to configure; share [`EntityGuard::INSTANCE`] across
/// parsers and threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityGuard {
    _private: (),
}

impl EntityGuard {
    /// The process-wide guard.
    pub const INSTANCE: EntityGuard = EntityGuard { _private: () };

    /// Decide whether the parser may resolve the given reference.
    ///
    /// `Ok(())` means "no override": the parser continues with its own
    /// default resolution. An error must abort the parse. `public_id` is
    /// logged but never affects the outcome.
    pub fn decide(
        &self,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), ResolutionDisallowed> {
        tracing::trace!(?public_id, ?system_id, "resolve entity request");

        match system_id {
            Some(id) if Self::is_allowed(id) => Ok(()),
            _ => {
                tracing::debug!(?system_id, "entity resolution denied");
                Err(ResolutionDisallowed::new(system_id.map(str::to_owned)))
            }
        }
    }

    /// Whether `system_id` matches the schema allow-list.
    pub fn is_allowed(system_id: &str) -> bool {
        ALLOWED_SYSTEM_ID.is_match(system_id)
    }
}

impl Default for EntityGuard {
    fn default() -> Self {
        Self::INSTANCE
    }
}
