//! Attribute names and attribute paths.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use crate::syntax::NodePtr;
use crate::syntax::ast::Attr;

/// One segment of an attribute path.
///
/// Static attributes compare by name. Dynamic attributes compare by the node
/// that spells them, so two different `${...}` segments never unify.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Static(SmolStr),
    Dynamic(NodePtr),
}

impl Attribute {
    pub fn from_attr(attr: &Attr) -> Self {
        match attr.static_name() {
            Some(name) => Attribute::Static(name),
            None => Attribute::Dynamic(NodePtr::from(attr)),
        }
    }

    /// The name, if known without evaluation.
    pub fn name(&self) -> Option<&str> {
        match self {
            Attribute::Static(name) => Some(name),
            Attribute::Dynamic(_) => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Attribute::Dynamic(_))
    }
}

impl From<&str> for Attribute {
    fn from(name: &str) -> Self {
        Attribute::Static(SmolStr::new(name))
    }
}

impl From<SmolStr> for Attribute {
    fn from(name: SmolStr) -> Self {
        Attribute::Static(name)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Static(name) if is_plain_identifier(name) => f.write_str(name),
            Attribute::Static(name) => {
                f.write_str("\"")?;
                for c in name.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        '$' => f.write_str("\\$")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Attribute::Dynamic(_) => f.write_str("${\u{2026}}"),
        }
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '\'' | '-'))
        && !matches!(
            name,
            "assert" | "else" | "if" | "in" | "inherit" | "let" | "rec" | "then" | "with"
        )
}

/// A non-empty, immutable sequence of attributes; the first one names the
/// root variable.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AttributePath(Arc<[Attribute]>);

#[allow(clippy::len_without_is_empty)]
impl AttributePath {
    /// Returns `None` for an empty sequence.
    pub fn new(attributes: impl IntoIterator<Item = Attribute>) -> Option<Self> {
        let attributes: Arc<[Attribute]> = attributes.into_iter().collect();
        (!attributes.is_empty()).then_some(Self(attributes))
    }

    pub fn single(attribute: Attribute) -> Self {
        Self(Arc::from([attribute]))
    }

    /// Builds a static path, e.g. `AttributePath::from_names(["a", "b"])`.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        Self::new(names.into_iter().map(Attribute::from))
    }

    pub fn first(&self) -> &Attribute {
        &self.0[0]
    }

    pub fn last(&self) -> &Attribute {
        &self.0[self.0.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Attribute] {
        &self.0
    }

    /// The path without its last segment.
    pub fn parent(&self) -> Option<Self> {
        Self::new(self.0[..self.0.len() - 1].iter().cloned())
    }

    pub fn child(&self, attribute: Attribute) -> Self {
        Self(self.0.iter().cloned().chain([attribute]).collect())
    }

    pub fn starts_with(&self, prefix: &AttributePath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl<'a> IntoIterator for &'a AttributePath {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, attribute) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            write!(f, "{attribute}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributePath({self})")
    }
}
