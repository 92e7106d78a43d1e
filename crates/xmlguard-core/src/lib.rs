//! # xmlguard Core
//!
//! Entity resolution guard for XML parsing. The guard blocks XML External
//! Entity (XXE) injection by refusing every external reference except the
//! `.xsd` schema locations that validation legitimately needs.
//!
//! A parser consults an [`EntityResolver`] before it fetches any external
//! entity, DTD or schema. [`EntityGuard::INSTANCE`] is the shared resolver;
//! the [`scan`] module walks a document and submits each reference it finds.

pub mod error;
pub mod guard;
pub mod resolver;
pub mod scan;

pub use error::{ResolutionDisallowed, Result, XmlGuardError};
pub use guard::{ERROR_MESSAGE_BASE, EntityGuard};
pub use resolver::{EntityReference, EntityResolver};
pub use scan::{ExternalReference, ReferenceKind, check_document, external_references};
