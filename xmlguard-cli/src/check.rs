//! `check` subcommand: scan XML files for disallowed external references

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use xmlguard_core::{EntityGuard, XmlGuardError, check_document};

/// Outcome of scanning one file
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Ok { references: usize },
    Rejected { reason: String },
    Error { reason: String },
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn passed(&self) -> bool {
        matches!(self.outcome, FileOutcome::Ok { .. })
    }
}

pub fn check_file(path: &Path) -> FileReport {
    let result = fs::read_to_string(path)
        .map_err(XmlGuardError::from)
        .and_then(|xml| check_document(&xml, &EntityGuard::INSTANCE));

    let outcome = match result {
        Ok(references) => FileOutcome::Ok { references },
        Err(e) if e.is_disallowed() => {
            tracing::warn!(path = %path.display(), error = %e, "document rejected");
            FileOutcome::Rejected {
                reason: e.to_string(),
            }
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "document could not be scanned");
            FileOutcome::Error {
                reason: e.to_string(),
            }
        }
    };

    FileReport {
        path: path.to_path_buf(),
        outcome,
    }
}

/// Scan every file and print one line each. Returns whether all passed.
pub fn run_check(files: &[PathBuf], json: bool) -> bool {
    let mut all_passed = true;

    for path in files {
        let report = check_file(path);
        all_passed &= report.passed();

        if json {
            match serde_json::to_string(&report) {
                Ok(line) => println!("{line}"),
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize report");
                    all_passed = false;
                }
            }
        } else {
            match &report.outcome {
                FileOutcome::Ok { references } => {
                    println!("{}: ok ({} references)", path.display(), references)
                }
                FileOutcome::Rejected { reason } => {
                    println!("{}: rejected: {}", path.display(), reason)
                }
                FileOutcome::Error { reason } => {
                    println!("{}: error: {}", path.display(), reason)
                }
            }
        }
    }

    all_passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn xml_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write xml");
        file
    }

    #[test]
    fn test_schema_only_document_passes() {
        let file = xml_file(
            r#"<gml:Point xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                xsi:schemaLocation="http://www.opengis.net/gml http://schemas.opengis.net/gml/3.1.1/base/gml.xsd"/>"#,
        );
        let report = check_file(file.path());
        assert!(report.passed());
        assert!(matches!(report.outcome, FileOutcome::Ok { references: 1 }));
    }

    #[test]
    fn test_xxe_document_is_rejected() {
        let file = xml_file(
            r#"<!DOCTYPE foo [ <!ENTITY xxe SYSTEM "file:///etc/passwd"> ]><foo>&xxe;</foo>"#,
        );
        let report = check_file(file.path());
        match report.outcome {
            FileOutcome::Rejected { reason } => {
                assert_eq!(reason, "Entity resolution disallowed for file:///etc/passwd")
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_internal_entity_with_gt_reports_ok() {
        let file = xml_file(r#"<!DOCTYPE foo [ <!ENTITY a "x>y"> ]><foo/>"#);
        let report = check_file(file.path());
        assert!(matches!(report.outcome, FileOutcome::Ok { references: 0 }));
    }

    #[test]
    fn test_missing_file_is_an_error_not_a_rejection() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = check_file(&dir.path().join("missing.xml"));
        assert!(matches!(report.outcome, FileOutcome::Error { .. }));
    }

    #[test]
    fn test_report_json_shape() {
        let report = FileReport {
            path: PathBuf::from("a.xml"),
            outcome: FileOutcome::Rejected {
                reason: "Entity resolution disallowed for null".to_string(),
            },
        };
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["path"], "a.xml");
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "Entity resolution disallowed for null");
    }

    #[test]
    fn test_run_check_fails_when_any_file_fails() {
        let good = xml_file("<root/>");
        let bad = xml_file(r#"<!DOCTYPE r SYSTEM "file:///etc/shadow"><r/>"#);

        assert!(run_check(&[good.path().to_path_buf()], false));
        assert!(!run_check(
            &[good.path().to_path_buf(), bad.path().to_path_buf()],
            true
        ));
    }
}
