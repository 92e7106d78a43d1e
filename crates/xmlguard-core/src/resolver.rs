//! Parser extension point for external references

use crate::error::ResolutionDisallowed;
use crate::guard::EntityGuard;
use std::sync::Arc;

/// An entity or DTD reference as reported by a parser.
///
/// Borrowed for the duration of one resolution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityReference<'a> {
    pub public_id: Option<&'a str>,
    pub system_id: Option<&'a str>,
}

impl<'a> EntityReference<'a> {
    pub fn new(public_id: Option<&'a str>, system_id: Option<&'a str>) -> Self {
        Self {
            public_id,
            system_id,
        }
    }

    pub fn system(system_id: &'a str) -> Self {
        Self::new(None, Some(system_id))
    }
}

/// Consulted by a parser before it fetches any external reference.
///
/// `Ok(())` lets the parser continue with its default resolution; an error
/// aborts the parse. Implementations are shared across concurrent parses.
pub trait EntityResolver: Send + Sync {
    fn resolve_entity(&self, reference: EntityReference<'_>) -> Result<(), ResolutionDisallowed>;
}

impl EntityResolver for EntityGuard {
    fn resolve_entity(&self, reference: EntityReference<'_>) -> Result<(), ResolutionDisallowed> {
        self.decide(reference.public_id, reference.system_id)
    }
}

impl<R: EntityResolver + ?Sized> EntityResolver for &R {
    fn resolve_entity(&self, reference: EntityReference<'_>) -> Result<(), ResolutionDisallowed> {
        (**self).resolve_entity(reference)
    }
}

impl<R: EntityResolver + ?Sized> EntityResolver for Arc<R> {
    fn resolve_entity(&self, reference: EntityReference<'_>) -> Result<(), ResolutionDisallowed> {
        (**self).resolve_entity(reference)
    }
}
