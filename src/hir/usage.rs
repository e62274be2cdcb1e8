//! Usage extraction: which syntax nodes reference a variable, and through
//! which attribute path.
//!
//! A usage is one of
//!
//! - a bare variable `x` that is not the base of a selection,
//! - a selection `x.a.b` whose base is a bare variable,
//! - a name in `inherit x;` (without a source expression).
//!
//! Selections on any other expression (`(f x).a`, `{ }.a`) are not usages;
//! the variables inside them are extracted on their own.

use tracing::warn;

use super::attribute::{Attribute, AttributePath};
use crate::base::TextRange;
use crate::syntax::ast::{Attr, AstNode, Expr, InheritedName, Select, Var};
use crate::syntax::{NodePtr, SyntaxKind, SyntaxNode};

/// The node a usage was extracted from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UsageElement {
    Select(Select),
    Var(Var),
    InheritedName(InheritedName),
}

impl UsageElement {
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            UsageElement::Select(it) => it.syntax(),
            UsageElement::Var(it) => it.syntax(),
            UsageElement::InheritedName(it) => it.syntax(),
        }
    }
}

/// The node that spells one segment of a usage's path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AttributeElement {
    Var(Var),
    Attr(Attr),
}

impl AttributeElement {
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            AttributeElement::Var(it) => it.syntax(),
            AttributeElement::Attr(it) => it.syntax(),
        }
    }

    pub fn text_range(&self) -> TextRange {
        self.syntax().text_range()
    }
}

/// A reference to a variable, optionally followed by attribute selections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableUsage {
    element: UsageElement,
    path: AttributePath,
    attribute_elements: Vec<AttributeElement>,
}

impl VariableUsage {
    /// Extracts the usage rooted at `node`, if `node` is one.
    pub fn of(node: &SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::VAR => {
                let var = Var::cast(node.clone())?;
                if is_select_base(node) {
                    return None;
                }
                let mut builder = VariableUsageBuilder::new(UsageElement::Var(var.clone()));
                builder.push_var(var)?;
                builder.build()
            }
            SyntaxKind::SELECT => {
                let select = Select::cast(node.clone())?;
                let Some(Expr::Var(var)) = select.value() else {
                    return None;
                };
                let attrs: Vec<Attr> = match select.attrpath() {
                    Some(attrpath) => attrpath.attrs().collect(),
                    None => Vec::new(),
                };
                debug_assert!(!attrs.is_empty(), "select without attribute path: {node}");
                if attrs.is_empty() {
                    warn!(range = ?node.text_range(), "select without attribute path");
                    return None;
                }
                let mut builder = VariableUsageBuilder::new(UsageElement::Select(select));
                builder.push_var(var)?;
                for attr in attrs {
                    builder.push_attr(attr);
                }
                builder.build()
            }
            SyntaxKind::INHERITED_NAME => {
                let name = InheritedName::cast(node.clone())?;
                if name.inherit()?.from().is_some() {
                    return None;
                }
                let attr = name.attr()?;
                let mut builder = VariableUsageBuilder::new(UsageElement::InheritedName(name));
                builder.push_attr(attr);
                builder.build()
            }
            _ => None,
        }
    }

    pub fn element(&self) -> &UsageElement {
        &self.element
    }

    pub fn path(&self) -> &AttributePath {
        &self.path
    }

    /// One node per path segment, in source order.
    pub fn attribute_elements(&self) -> &[AttributeElement] {
        &self.attribute_elements
    }

    /// Path segments paired with the nodes that spell them.
    pub fn segments(&self) -> impl Iterator<Item = (&Attribute, &AttributeElement)> {
        self.path.iter().zip(&self.attribute_elements)
    }

    pub fn text_range(&self) -> TextRange {
        self.element.syntax().text_range()
    }

    pub fn pointer(&self) -> UsagePointer {
        UsagePointer {
            element: NodePtr::new(self.element.syntax()),
            path: self.path.clone(),
        }
    }
}

fn is_select_base(var: &SyntaxNode) -> bool {
    var.parent()
        .and_then(Select::cast)
        .and_then(|select| select.value())
        .is_some_and(|value| value.syntax() == var)
}

/// Every usage under `root`, in source order.
pub fn usages(root: &SyntaxNode) -> impl Iterator<Item = VariableUsage> + use<> {
    root.descendants().filter_map(|node| VariableUsage::of(&node))
}

/// Accumulates a usage left to right, then freezes it.
struct VariableUsageBuilder {
    element: UsageElement,
    attributes: Vec<Attribute>,
    attribute_elements: Vec<AttributeElement>,
}

impl VariableUsageBuilder {
    fn new(element: UsageElement) -> Self {
        Self {
            element,
            attributes: Vec::new(),
            attribute_elements: Vec::new(),
        }
    }

    fn push_var(&mut self, var: Var) -> Option<()> {
        self.attributes.push(Attribute::Static(var.name()?));
        self.attribute_elements.push(AttributeElement::Var(var));
        Some(())
    }

    fn push_attr(&mut self, attr: Attr) {
        self.attributes.push(Attribute::from_attr(&attr));
        self.attribute_elements.push(AttributeElement::Attr(attr));
    }

    fn build(self) -> Option<VariableUsage> {
        debug_assert_eq!(self.attributes.len(), self.attribute_elements.len());
        Some(VariableUsage {
            element: self.element,
            path: AttributePath::new(self.attributes)?,
            attribute_elements: self.attribute_elements,
        })
    }
}

/// A durable handle to a usage: the span of its element plus its path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UsagePointer {
    element: NodePtr,
    path: AttributePath,
}

impl UsagePointer {
    pub fn path(&self) -> &AttributePath {
        &self.path
    }

    pub fn range(&self) -> TextRange {
        self.element.range()
    }

    /// Re-extracts the usage under `root`; `None` if the node is gone or now
    /// spells a different path.
    pub fn dereference(&self, root: &SyntaxNode) -> Option<VariableUsage> {
        let usage = VariableUsage::of(&self.element.to_node(root)?)?;
        (usage.path == self.path).then_some(usage)
    }
}
