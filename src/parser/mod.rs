//! Java source parsing into the declaration model.
//!
//! Parsing is backed by tree-sitter. A source file that produces any
//! ERROR or MISSING node is rejected with [`ParseError::Syntax`] rather than
//! processed partially.

mod java;

pub use java::{parse_annotation, parse_source};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::Encoding;
use crate::model::Unit;

/// Errors raised while turning text into a [`Unit`] or an annotation.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("file is not valid {encoding}")]
    Decode { encoding: Encoding },
    #[error("syntax error at line {line}, column {column} near {near:?}")]
    Syntax {
        line: usize,
        column: usize,
        near: String,
    },
    #[error("invalid annotation {snippet:?}: {reason}")]
    InvalidAnnotation { snippet: String, reason: String },
    #[error("failed to load Java grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),
}

/// Read, decode and parse one Java file.
pub fn parse_unit(path: &Path, encoding: Encoding) -> Result<Unit, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let source = encoding
        .decode(&bytes)
        .ok_or(ParseError::Decode { encoding })?;
    parse_source(path, source)
}
