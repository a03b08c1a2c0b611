//! javannotate - configuration-driven Java annotation synchronizer.
//!
//! A configuration maps fully qualified class names to the annotations their
//! class, fields and methods should carry. javannotate parses the Java
//! sources under a root, reconciles every declaration's annotations with the
//! configuration and writes back the files that changed.
//!
//! # Architecture
//!
//! - `config`: configuration document, validation and encodings
//! - `model`: declaration arena for one compilation unit
//! - `parser`: tree-sitter lowering of Java source into the model
//! - `printer`: format-preserving rendering of rewritten headers
//! - `annotate`: identity resolution, signatures, merge and the tree walk
//! - `select` / `context`: incremental work-set selection
//! - `runner`: batch orchestration with fault aggregation
//! - `report` / `cli`: terminal output and command handling

pub mod annotate;
pub mod cli;
pub mod config;
pub mod context;
pub mod logging;
pub mod model;
pub mod parser;
pub mod printer;
pub mod report;
pub mod runner;
pub mod select;

pub use annotate::{merge, resolve, walk, IdentityError};
pub use config::{AnnotationTarget, ConfigError, Configuration, Encoding};
pub use context::{BuildContext, DeltaTracker, FullBuild};
pub use model::{AnnotationTag, DeclId, DeclKind, Declaration, Unit};
pub use parser::{parse_unit, ParseError};
pub use printer::print_unit;
pub use runner::{FileOutcome, ParseFault, ParseFaults, ProcessError, Runner};
