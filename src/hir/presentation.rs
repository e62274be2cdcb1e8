//! How symbols and targets are shown to a user.

/// Icon category of a symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolIcon {
    Attribute,
    Builtin,
    Parameter,
    Variable,
}

/// Highlighting key for a symbol's label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextAttributesKey {
    Attribute,
    Builtin,
    Parameter,
    LocalVariable,
}

impl TextAttributesKey {
    /// Stable key name, e.g. for colour scheme lookups.
    pub fn external_name(self) -> &'static str {
        match self {
            TextAttributesKey::Attribute => "NIX_ATTRIBUTE",
            TextAttributesKey::Builtin => "NIX_BUILTIN",
            TextAttributesKey::Parameter => "NIX_PARAMETER",
            TextAttributesKey::LocalVariable => "NIX_LOCAL_VARIABLE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Presentation {
    pub label: String,
    pub icon: Option<SymbolIcon>,
    pub text_attributes: Option<TextAttributesKey>,
}

impl Presentation {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon: None,
            text_attributes: None,
        }
    }

    pub fn with_icon(mut self, icon: SymbolIcon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_text_attributes(mut self, key: TextAttributesKey) -> Self {
        self.text_attributes = Some(key);
        self
    }
}
