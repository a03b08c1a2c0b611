//! Annotation tags attached to declarations.

use std::fmt;

/// Argument list of an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationArgs {
    /// `@Foo`
    Marker,
    /// `@Foo(value)`, the shorthand for a single `value` element.
    Single(String),
    /// `@Foo(a = 1, b = "x")`, possibly empty for `@Foo()`.
    Named(Vec<(String, String)>),
}

/// One annotation: a name plus its arguments.
///
/// Merging identifies tags by [`name`](Self::name) only; argument values are
/// kept as literal source text and never compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationTag {
    pub name: String,
    pub args: AnnotationArgs,
}

impl AnnotationTag {
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: AnnotationArgs::Marker,
        }
    }

    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: AnnotationArgs::Single(value.into()),
        }
    }

    pub fn named<K, V>(name: impl Into<String>, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            args: AnnotationArgs::Named(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Arguments as an ordered `name -> literal` list.
    ///
    /// The single-member form reports its element as `value`.
    pub fn arguments(&self) -> Vec<(&str, &str)> {
        match &self.args {
            AnnotationArgs::Marker => Vec::new(),
            AnnotationArgs::Single(v) => vec![("value", v.as_str())],
            AnnotationArgs::Named(pairs) => pairs
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
        }
    }
}

impl fmt::Display for AnnotationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        match &self.args {
            AnnotationArgs::Marker => Ok(()),
            AnnotationArgs::Single(v) => write!(f, "({})", v),
            AnnotationArgs::Named(pairs) => {
                write!(f, "(")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", k, v)?;
                }
                write!(f, ")")
            }
        }
    }
}
