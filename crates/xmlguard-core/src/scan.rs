//! External reference scanning
//!
//! Reads a document with `quick-xml` and reports every reference a
//! validating parser would try to fetch:
//!
//! - the DOCTYPE external subset (`SYSTEM` / `PUBLIC` identifiers)
//! - external general and parameter entities declared in the internal subset
//! - `schemaLocation` and `noNamespaceSchemaLocation` attributes
//!
//! [`check_document`] submits the references to an [`EntityResolver`] in
//! document order and aborts at the first refusal.
//!
//! # Example
//!
//! ```
//! use xmlguard_core::{EntityGuard, check_document};
//!
//! let xxe = r#"<?xml version="1.0"?>
//! <!DOCTYPE foo [ <!ENTITY xxe SYSTEM "file:///etc/passwd"> ]>
//! <foo>&xxe;</foo>"#;
//!
//! let err = check_document(xxe, &EntityGuard::INSTANCE).unwrap_err();
//! assert!(err.is_disallowed());
//! ```

use crate::error::{Result, XmlGuardError};
use crate::resolver::{EntityReference, EntityResolver};
use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use regex::{Captures, Regex};
use serde::Serialize;
use std::borrow::Cow;

const QUOTED: &str = r#"(?:"([^"]*)"|'([^']*)')"#;

// Content follows `<!DOCTYPE` and starts at the root name.
static DOCTYPE_EXTERNAL_ID: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(r"\A\s*[^\s\[>]+\s+(?:SYSTEM\s+{QUOTED}|PUBLIC\s+{QUOTED}\s+{QUOTED})");
    Regex::new(&pattern).expect("doctype external id pattern must compile")
});

static ENTITY_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r#"<!ENTITY\s+(%\s+)?([^\s%"']+)\s+(?:SYSTEM\s+{QUOTED}|PUBLIC\s+{QUOTED}\s+{QUOTED})"#
    );
    Regex::new(&pattern).expect("entity declaration pattern must compile")
});

/// Where a reference was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReferenceKind {
    /// The DTD named by the DOCTYPE declaration
    ExternalSubset,
    /// `<!ENTITY name SYSTEM ...>`
    GeneralEntity { name: String },
    /// `<!ENTITY % name SYSTEM ...>`
    ParameterEntity { name: String },
    /// An `xsi` schema location hint
    SchemaLocation,
}

/// A reference discovered in a document, owned so it can outlive the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalReference {
    pub kind: ReferenceKind,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

impl ExternalReference {
    fn schema_location(location: &str) -> Self {
        Self {
            kind: ReferenceKind::SchemaLocation,
            public_id: None,
            system_id: Some(location.to_string()),
        }
    }

    pub fn as_entity_reference(&self) -> EntityReference<'_> {
        EntityReference::new(self.public_id.as_deref(), self.system_id.as_deref())
    }
}

/// Collect every external reference in `xml`, in document order.
pub fn external_references(xml: &str) -> Result<Vec<ExternalReference>> {
    let mut references = Vec::new();
    visit_references(xml, |reference| {
        references.push(reference);
        Ok(())
    })?;
    Ok(references)
}

/// Submit each external reference in `xml` to `resolver`.
///
/// Stops at the first refusal and returns it as
/// [`XmlGuardError::Disallowed`]. On success returns how many references
/// were allowed; a document without references passes with `0`.
pub fn check_document<R: EntityResolver + ?Sized>(xml: &str, resolver: &R) -> Result<usize> {
    let mut allowed = 0;
    visit_references(xml, |reference| {
        resolver.resolve_entity(reference.as_entity_reference())?;
        allowed += 1;
        Ok(())
    })?;

    tracing::debug!(references = allowed, "document passed entity resolution");
    Ok(allowed)
}

fn visit_references<F>(xml: &str, mut visit: F) -> Result<()>
where
    F: FnMut(ExternalReference) -> Result<()>,
{
    // quick-xml ends a DOCTYPE at the first unbalanced `>`, even one inside a
    // quoted entity value, comment or PI, so the declaration is cut out here.
    let body = match locate_doctype(xml) {
        Some(doctype) => {
            for reference in doctype_references(&xml[doctype.content..doctype.end - 1]) {
                visit(reference)?;
            }
            Cow::Owned(format!("{}{}", &xml[..doctype.start], &xml[doctype.end..]))
        }
        None => Cow::Borrowed(xml),
    };

    let mut reader = Reader::from_str(&body);

    loop {
        match reader.read_event()? {
            Event::DocType(doctype) => {
                let content = std::str::from_utf8(&doctype)
                    .map_err(|e| XmlGuardError::Encoding(e.to_string()))?;
                for reference in doctype_references(content) {
                    visit(reference)?;
                }
            }
            Event::Start(element) | Event::Empty(element) => {
                for reference in schema_locations(&reader, &element)? {
                    visit(reference)?;
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}

/// Byte offsets of a DOCTYPE declaration in the prolog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DoctypeSpan {
    /// The `<` of `<!DOCTYPE`
    start: usize,
    /// First byte after `<!DOCTYPE`
    content: usize,
    /// One past the closing `>`
    end: usize,
}

/// Find the DOCTYPE after the XML declaration, comments and PIs of the
/// prolog. Quoted literals, comments and PIs are skipped whole, so a `>`
/// inside them does not end the declaration. Returns `None` when there is no
/// DOCTYPE or it is unterminated; the reader then reports the document as is.
fn locate_doctype(xml: &str) -> Option<DoctypeSpan> {
    const KEYWORD: &[u8] = b"<!DOCTYPE";

    let mut pos = 0;
    loop {
        let rest = &xml[pos..];
        let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
        pos += rest.len() - trimmed.len();

        if trimmed.starts_with("<?") {
            pos += trimmed.find("?>")? + 2;
        } else if trimmed.starts_with("<!--") {
            pos += 4 + trimmed[4..].find("-->")? + 3;
        } else {
            break;
        }
    }

    let bytes = xml.as_bytes();
    let keyword = bytes.get(pos..pos + KEYWORD.len())?;
    if !keyword.eq_ignore_ascii_case(KEYWORD) {
        return None;
    }

    let content = pos + KEYWORD.len();
    let mut i = content;
    let mut depth = 0usize;
    // `xml` is only sliced at ASCII bytes, which are always char boundaries.
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i += 1 + xml[i + 1..].find(quote as char)? + 1;
                continue;
            }
            b'<' if xml[i..].starts_with("<!--") => {
                i += 4 + xml[i + 4..].find("-->")? + 3;
                continue;
            }
            b'<' if xml[i..].starts_with("<?") => {
                i += 2 + xml[i + 2..].find("?>")? + 2;
                continue;
            }
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b'>' if depth == 0 => {
                return Some(DoctypeSpan {
                    start: pos,
                    content,
                    end: i + 1,
                });
            }
            _ => {}
        }
        i += 1;
    }

    None
}

fn doctype_references(content: &str) -> Vec<ExternalReference> {
    let mut references = Vec::new();

    if let Some(caps) = DOCTYPE_EXTERNAL_ID.captures(content) {
        let (public_id, system_id) = external_id(&caps, 1);
        references.push(ExternalReference {
            kind: ReferenceKind::ExternalSubset,
            public_id,
            system_id,
        });
    }

    // Declarations inside comments are reported too; refusing too much is safe.
    for caps in ENTITY_DECLARATION.captures_iter(content) {
        let name = caps[2].to_string();
        let kind = if caps.get(1).is_some() {
            ReferenceKind::ParameterEntity { name }
        } else {
            ReferenceKind::GeneralEntity { name }
        };
        let (public_id, system_id) = external_id(&caps, 3);
        references.push(ExternalReference {
            kind,
            public_id,
            system_id,
        });
    }

    references
}

/// Read `SYSTEM s` / `PUBLIC p s` captures laid out from group `first`:
/// two alternatives for the SYSTEM literal, then two each for PUBLIC.
fn external_id(caps: &Captures<'_>, first: usize) -> (Option<String>, Option<String>) {
    let quoted = |group: usize| {
        caps.get(group)
            .or_else(|| caps.get(group + 1))
            .map(|m| m.as_str().to_string())
    };

    match quoted(first) {
        Some(system_id) => (None, Some(system_id)),
        None => (quoted(first + 2), quoted(first + 4)),
    }
}

fn schema_locations(
    reader: &Reader<&[u8]>,
    element: &BytesStart<'_>,
) -> Result<Vec<ExternalReference>> {
    let mut references = Vec::new();

    for attribute in element.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        match attribute.key.local_name().as_ref() {
            b"schemaLocation" => {
                let value = attribute.decode_and_unescape_value(reader.decoder())?;
                // namespace/location pairs
                references.extend(
                    value
                        .split_whitespace()
                        .skip(1)
                        .step_by(2)
                        .map(ExternalReference::schema_location),
                );
            }
            b"noNamespaceSchemaLocation" => {
                let value = attribute.decode_and_unescape_value(reader.decoder())?;
                references.extend(
                    value
                        .split_whitespace()
                        .map(ExternalReference::schema_location),
                );
            }
            _ => {}
        }
    }

    Ok(references)
}
