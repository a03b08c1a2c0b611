//! Batch processing of source files.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::annotate;
use crate::config::Configuration;
use crate::parser::{self, ParseError};
use crate::printer;

/// A file that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFault {
    pub file: PathBuf,
    pub message: String,
}

impl fmt::Display for ParseFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.file.display(), self.message)
    }
}

/// Every parse fault of a batch, plus the files rewritten regardless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseFaults {
    pub faults: Vec<ParseFault>,
    pub rewritten: Vec<PathBuf>,
}

impl fmt::Display for ParseFaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} file(s) failed to parse", self.faults.len())?;
        for fault in &self.faults {
            write!(f, "\n  {}", fault)?;
        }
        Ok(())
    }
}

/// Errors that end a batch.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("{0}")]
    Faults(ParseFaults),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Rewritten(PathBuf),
    Unchanged(PathBuf),
    Faulted(ParseFault),
}

/// Applies a configuration to a batch of files.
pub struct Runner<'a> {
    config: &'a Configuration,
}

impl<'a> Runner<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Process `files` in order and return the ones rewritten.
    ///
    /// Parse failures do not stop the batch; they are collected and reported
    /// together once every file has been visited. Files rewritten before a
    /// failure stay rewritten.
    pub fn process(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>, ProcessError> {
        let mut rewritten = Vec::new();
        let mut faults = Vec::new();

        for file in files {
            match self.process_file(file)? {
                FileOutcome::Rewritten(path) => rewritten.push(path),
                FileOutcome::Unchanged(_) => {}
                FileOutcome::Faulted(fault) => faults.push(fault),
            }
        }

        if faults.is_empty() {
            Ok(rewritten)
        } else {
            Err(ProcessError::Faults(ParseFaults { faults, rewritten }))
        }
    }

    /// Parse, annotate and, if anything changed, rewrite one file.
    pub fn process_file(&self, file: &Path) -> Result<FileOutcome, ProcessError> {
        let encoding = self.config.encoding();
        let mut unit = match parser::parse_unit(file, encoding) {
            Ok(unit) => unit,
            Err(ParseError::Io { path, source }) => return Err(ProcessError::Read { path, source }),
            Err(err) => {
                warn!(file = %file.display(), error = %err, "failed to parse");
                return Ok(FileOutcome::Faulted(ParseFault {
                    file: file.to_path_buf(),
                    message: err.to_string(),
                }));
            }
        };

        if !annotate::walk(&mut unit, self.config) {
            debug!(file = %file.display(), "no configured annotations");
            return Ok(FileOutcome::Unchanged(file.to_path_buf()));
        }

        let text = printer::print_unit(&unit);
        write_back(file, &encoding.encode(&text))?;
        info!(file = %file.display(), "rewrote annotations");
        Ok(FileOutcome::Rewritten(file.to_path_buf()))
    }
}

/// Replace `file` with `bytes`: the old file is removed, then recreated.
fn write_back(file: &Path, bytes: &[u8]) -> Result<(), ProcessError> {
    let write_error = |source| ProcessError::Write {
        path: file.to_path_buf(),
        source,
    };
    fs::remove_file(file).map_err(write_error)?;
    fs::write(file, bytes).map_err(write_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"{"classes": {"p.Good": {"classAnnotations": ["@Seen"]}}}"#;

    #[test]
    fn test_batch_collects_faults_and_keeps_rewrites() {
        let temp = TempDir::new().unwrap();
        let bad = temp.path().join("Bad.java");
        let good = temp.path().join("Good.java");
        fs::write(&bad, "package p;\npublic class Bad {\n  void m( {\n").unwrap();
        fs::write(&good, "package p;\npublic class Good {}\n").unwrap();

        let config = Configuration::from_json_str(CONFIG).unwrap();
        let err = Runner::new(&config)
            .process(&[bad.clone(), good.clone()])
            .unwrap_err();

        match err {
            ProcessError::Faults(report) => {
                assert_eq!(report.faults.len(), 1);
                assert_eq!(report.faults[0].file, bad);
                assert_eq!(report.rewritten, vec![good.clone()]);
                assert!(report.to_string().contains("Bad.java -> "));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            fs::read_to_string(&good).unwrap(),
            "package p;\n@Seen\npublic class Good {}\n"
        );
    }

    #[test]
    fn test_unchanged_file_is_not_written() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Other.java");
        let source = "package p;\nclass Other {}\n";
        fs::write(&file, source).unwrap();

        let config = Configuration::from_json_str(CONFIG).unwrap();
        let outcome = Runner::new(&config).process_file(&file).unwrap();
        assert_eq!(outcome, FileOutcome::Unchanged(file.clone()));
        assert_eq!(fs::read_to_string(&file).unwrap(), source);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_failure_aborts_remaining_files() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        let open = temp.path().join("open");
        fs::create_dir_all(&locked).unwrap();
        fs::create_dir_all(&open).unwrap();
        let first = locked.join("Good.java");
        let second = open.join("Good.java");
        let source = "package p;\npublic class Good {}\n";
        fs::write(&first, source).unwrap();
        fs::write(&second, source).unwrap();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        // Privileged users ignore directory permissions.
        let enforced = fs::write(locked.join("canary"), "").is_err();

        let config = Configuration::from_json_str(CONFIG).unwrap();
        let result = Runner::new(&config).process(&[first.clone(), second.clone()]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if !enforced {
            return;
        }

        match result {
            Err(ProcessError::Write { path, .. }) => assert_eq!(path, first),
            other => panic!("expected a write error, got {other:?}"),
        }
        assert_eq!(
            fs::read_to_string(&second).unwrap(),
            source,
            "files after a write failure should not be processed"
        );
    }

    #[test]
    fn test_write_back_reports_write_error() {
        let temp = TempDir::new().unwrap();
        let gone = temp.path().join("Gone.java");
        match write_back(&gone, b"class Gone {}") {
            Err(ProcessError::Write { path, .. }) => assert_eq!(path, gone),
            other => panic!("expected a write error, got {other:?}"),
        }
        assert!(!gone.exists(), "nothing should be created after a failed remove");
    }

    #[test]
    fn test_missing_file_fails_fast() {
        let config = Configuration::from_json_str(CONFIG).unwrap();
        let err = Runner::new(&config)
            .process(&[PathBuf::from("/nonexistent/Gone.java")])
            .unwrap_err();
        assert!(matches!(err, ProcessError::Read { .. }));
    }

    #[test]
    fn test_writes_with_configured_encoding() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Good.java");
        fs::write(&file, b"package p;\n// caf\xE9\nclass Good {}\n").unwrap();

        let config = Configuration::from_json_str(
            r#"{"encoding": "ISO-8859-1", "classes": {"p.Good": {"classAnnotations": ["@Seen"]}}}"#,
        )
        .unwrap();
        let outcome = Runner::new(&config).process_file(&file).unwrap();
        assert_eq!(outcome, FileOutcome::Rewritten(file.clone()));
        assert_eq!(
            fs::read(&file).unwrap(),
            b"package p;\n// caf\xE9\n@Seen\nclass Good {}\n".to_vec()
        );
    }
}
