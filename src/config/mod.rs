//! Annotation configuration.
//!
//! The configuration document maps fully qualified class names to the
//! annotations their class, fields and methods should carry:
//!
//! ```json
//! {
//!   "encoding": "UTF-8",
//!   "classes": {
//!     "com.acme.Order": {
//!       "classAnnotations": ["@Entity"],
//!       "fieldAnnotations": { "id": ["@Id"] },
//!       "methodAnnotations": { "total(int,String)": ["@Transient"] }
//!     }
//!   }
//! }
//! ```
//!
//! [`ConfigDocument`] is the raw serde shape. [`Configuration`] is the
//! validated, immutable form with every annotation snippet already parsed.

mod encoding;

pub use encoding::Encoding;

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::AnnotationTag;
use crate::parser::{self, ParseError};

/// Errors raised while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed configuration {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("malformed configuration {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("{class}: {member}: {source}")]
    Annotation {
        class: String,
        member: String,
        source: ParseError,
    },
    #[error("unsupported encoding {0:?}")]
    UnsupportedEncoding(String),
    #[error("invalid excludedPaths pattern {pattern:?}: {source}")]
    Glob {
        pattern: String,
        source: globset::Error,
    },
}

/// Raw configuration document.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Source file encoding (default: UTF-8).
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub classes: BTreeMap<String, ClassSpec>,
    /// Glob patterns, relative to the source root, for files to leave alone.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
}

/// Annotation snippets configured for one class.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClassSpec {
    #[serde(default)]
    pub class_annotations: Vec<String>,
    /// Keyed by field name.
    #[serde(default)]
    pub field_annotations: BTreeMap<String, Vec<String>>,
    /// Keyed by method signature, e.g. `method(String,int)`.
    #[serde(default)]
    pub method_annotations: BTreeMap<String, Vec<String>>,
}

impl ConfigDocument {
    /// Read a document from disk. `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        } else {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Parsed annotations for one class.
#[derive(Debug, Clone, Default)]
pub struct ConfigEntry {
    class_annotations: Vec<AnnotationTag>,
    field_annotations: HashMap<String, Vec<AnnotationTag>>,
    method_annotations: HashMap<String, Vec<AnnotationTag>>,
}

impl ConfigEntry {
    pub fn new(
        class_annotations: Vec<AnnotationTag>,
        field_annotations: HashMap<String, Vec<AnnotationTag>>,
        method_annotations: HashMap<String, Vec<AnnotationTag>>,
    ) -> Self {
        Self {
            class_annotations,
            field_annotations,
            method_annotations,
        }
    }

    pub fn class_annotations(&self) -> &[AnnotationTag] {
        &self.class_annotations
    }

    pub fn field_annotations(&self, field: &str) -> &[AnnotationTag] {
        self.field_annotations
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn method_annotations(&self, signature: &str) -> &[AnnotationTag] {
        self.method_annotations
            .get(signature)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn member_count(&self) -> (usize, usize) {
        (self.field_annotations.len(), self.method_annotations.len())
    }
}

/// Something annotations can be configured for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationTarget<'a> {
    Class(&'a str),
    Field { class: &'a str, name: &'a str },
    Method { class: &'a str, signature: &'a str },
}

impl AnnotationTarget<'_> {
    /// Fully qualified name of the owning class.
    pub fn class(&self) -> &str {
        match self {
            AnnotationTarget::Class(class) => class,
            AnnotationTarget::Field { class, .. } => class,
            AnnotationTarget::Method { class, .. } => class,
        }
    }
}

/// Validated, immutable annotation configuration.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    classes: HashMap<String, ConfigEntry>,
    encoding: Encoding,
    excluded: Option<GlobSet>,
}

impl Configuration {
    pub fn new(classes: HashMap<String, ConfigEntry>, encoding: Encoding) -> Self {
        Self {
            classes,
            encoding,
            excluded: None,
        }
    }

    /// Load and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let document = ConfigDocument::parse_file(path)?;
        Self::from_document(&document)
    }

    /// Validate a JSON document held in memory.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let document: ConfigDocument =
            serde_json::from_str(json).map_err(|source| ConfigError::Json {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        Self::from_document(&document)
    }

    /// Parse every annotation snippet and resolve the encoding.
    pub fn from_document(document: &ConfigDocument) -> Result<Self, ConfigError> {
        let encoding = match &document.encoding {
            Some(label) => Encoding::from_label(label)
                .ok_or_else(|| ConfigError::UnsupportedEncoding(label.clone()))?,
            None => Encoding::default(),
        };

        let mut classes = HashMap::with_capacity(document.classes.len());
        for (class, spec) in &document.classes {
            let class_annotations = parse_snippets(class, "class annotations", &spec.class_annotations)?;
            let field_annotations = parse_member_snippets(class, "field", &spec.field_annotations)?;
            let method_annotations =
                parse_member_snippets(class, "method", &spec.method_annotations)?;
            classes.insert(
                class.clone(),
                ConfigEntry::new(class_annotations, field_annotations, method_annotations),
            );
        }

        let excluded = if document.excluded_paths.is_empty() {
            None
        } else {
            let mut builder = GlobSetBuilder::new();
            for pattern in &document.excluded_paths {
                let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
                    pattern: pattern.clone(),
                    source,
                })?;
                builder.add(glob);
            }
            Some(builder.build().map_err(|source| ConfigError::Glob {
                pattern: document.excluded_paths.join(", "),
                source,
            })?)
        };

        Ok(Self {
            classes,
            encoding,
            excluded,
        })
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn entry(&self, fqn: &str) -> Option<&ConfigEntry> {
        self.classes.get(fqn)
    }

    /// Configured annotations for a target; empty when nothing is configured.
    pub fn lookup(&self, target: AnnotationTarget<'_>) -> &[AnnotationTag] {
        let Some(entry) = self.entry(target.class()) else {
            return &[];
        };
        match target {
            AnnotationTarget::Class(_) => entry.class_annotations(),
            AnnotationTarget::Field { name, .. } => entry.field_annotations(name),
            AnnotationTarget::Method { signature, .. } => entry.method_annotations(signature),
        }
    }

    /// Number of configured classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Configured class names, sorted.
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Total number of configured field and method entries.
    pub fn member_counts(&self) -> (usize, usize) {
        self.classes
            .values()
            .map(ConfigEntry::member_count)
            .fold((0, 0), |(f, m), (ef, em)| (f + ef, m + em))
    }

    /// Whether a path (relative to the source root) matches `excludedPaths`.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.excluded
            .as_ref()
            .map(|set| set.is_match(path))
            .unwrap_or(false)
    }
}

fn parse_snippets(
    class: &str,
    member: &str,
    snippets: &[String],
) -> Result<Vec<AnnotationTag>, ConfigError> {
    snippets
        .iter()
        .map(|snippet| {
            parser::parse_annotation(snippet).map_err(|source| ConfigError::Annotation {
                class: class.to_string(),
                member: member.to_string(),
                source,
            })
        })
        .collect()
}

fn parse_member_snippets(
    class: &str,
    kind: &str,
    members: &BTreeMap<String, Vec<String>>,
) -> Result<HashMap<String, Vec<AnnotationTag>>, ConfigError> {
    let mut parsed = HashMap::with_capacity(members.len());
    for (key, snippets) in members {
        let member = format!("{} {}", kind, key);
        parsed.insert(key.clone(), parse_snippets(class, &member, snippets)?);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
{
  "classes": {
    "codegen.TestClass": {
      "classAnnotations": ["@ClassAnnotation"],
      "fieldAnnotations": { "field": ["@FieldAnnotation(name = \"value\")"] },
      "methodAnnotations": { "method()": ["@MethodAnnotation"] }
    }
  }
}
"#;

    #[test]
    fn test_parse_configuration() {
        let config = Configuration::from_json_str(CONFIG).unwrap();
        assert_eq!(config.len(), 1);
        assert_eq!(config.encoding(), Encoding::Utf8);

        let class = config.lookup(AnnotationTarget::Class("codegen.TestClass"));
        assert_eq!(class, &[AnnotationTag::marker("ClassAnnotation")]);

        let field = config.lookup(AnnotationTarget::Field {
            class: "codegen.TestClass",
            name: "field",
        });
        assert_eq!(
            field,
            &[AnnotationTag::named("FieldAnnotation", [("name", "\"value\"")])]
        );

        let method = config.lookup(AnnotationTarget::Method {
            class: "codegen.TestClass",
            signature: "method()",
        });
        assert_eq!(method.len(), 1);
        assert_eq!(config.member_counts(), (1, 1));
    }

    #[test]
    fn test_lookup_missing_targets_is_empty() {
        let config = Configuration::from_json_str(CONFIG).unwrap();
        assert!(config.lookup(AnnotationTarget::Class("other.Class")).is_empty());
        assert!(config
            .lookup(AnnotationTarget::Field {
                class: "codegen.TestClass",
                name: "missing",
            })
            .is_empty());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let config =
            Configuration::from_json_str(r#"{"classes": {"a.B": {"classAnnotations": ["@X"]}}}"#)
                .unwrap();
        let entry = config.entry("a.B").unwrap();
        assert!(entry.field_annotations("x").is_empty());
        assert!(entry.method_annotations("m()").is_empty());
    }

    #[test]
    fn test_malformed_annotation_is_config_error() {
        let err = Configuration::from_json_str(
            r#"{"classes": {"a.B": {"fieldAnnotations": {"x": ["@Broken(("]}}}"#,
        )
        .unwrap_err();
        match err {
            ConfigError::Annotation { class, member, .. } => {
                assert_eq!(class, "a.B");
                assert_eq!(member, "field x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unsupported_encoding() {
        let err = Configuration::from_json_str(r#"{"encoding": "EBCDIC", "classes": {}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedEncoding(_)));
    }

    #[test]
    fn test_yaml_document() {
        let yaml = r#"
encoding: ISO-8859-1
excludedPaths:
  - "generated/**"
classes:
  com.acme.Order:
    classAnnotations:
      - "@Entity"
    methodAnnotations:
      "total(int)":
        - "@Transient"
"#;
        let document: ConfigDocument = serde_yaml::from_str(yaml).unwrap();
        let config = Configuration::from_document(&document).unwrap();
        assert_eq!(config.encoding(), Encoding::Latin1);
        assert!(config.is_excluded(Path::new("generated/Foo.java")));
        assert!(!config.is_excluded(Path::new("src/Foo.java")));
        assert_eq!(
            config.lookup(AnnotationTarget::Method {
                class: "com.acme.Order",
                signature: "total(int)",
            }),
            &[AnnotationTag::marker("Transient")]
        );
    }

    #[test]
    fn test_parse_file_by_extension() {
        let temp = tempfile::TempDir::new().unwrap();
        let json = temp.path().join("cfg.json");
        std::fs::write(&json, CONFIG).unwrap();
        assert_eq!(Configuration::load(&json).unwrap().len(), 1);

        let broken = temp.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            Configuration::load(&broken),
            Err(ConfigError::Json { .. })
        ));

        assert!(matches!(
            Configuration::load(temp.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
