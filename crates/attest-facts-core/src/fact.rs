//! Fact types: one structural expectation each.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::AnnotationKind;

/// A harvested structural expectation.
///
/// Two facts are equal iff every field, including the kind payload, is equal.
/// Facts are never mutated after harvest; per-run findings (absent keys,
/// serialization failures) travel on the verifier's result records instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fact {
    /// Human-readable location of the annotated element (`pkg.Type.method`).
    pub annotated_element: String,
    /// User-supplied failure text; replaces the generated diagnostic when non-blank.
    pub message: Option<String>,
    pub kind: FactKind,
}

/// Kind-specific payload of a [`Fact`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Constructor(ConstructorFact),
    Field(FieldFact),
    Fields(FieldsFact),
    Method(MethodFact),
    Key(KeyFact),
    Keys(KeysFact),
    ResourceBundle(ResourceBundleFact),
    Serializable(SerializableFact),
}

/// `targetClass` must declare a constructor with exactly these parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstructorFact {
    pub target_class: String,
    /// Canonical type names, in declaration order. Empty means the zero-arg constructor.
    pub parameters: Vec<String>,
}

/// `targetClass` (or a supertype) must declare field `value`, optionally of type `type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldFact {
    pub target_class: String,
    pub value: String,
    pub field_type: Option<String>,
}

/// `targetClass` (or a supertype) must declare every field in `values`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldsFact {
    pub target_class: String,
    pub values: Vec<String>,
}

/// `targetClass` (or a supertype) must declare method `value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodFact {
    pub target_class: String,
    pub value: String,
    /// Canonical return type; `None` accepts any.
    pub return_type: Option<String>,
    /// Canonical parameter types; `None` accepts any list, `Some(vec![])` requires zero-arg.
    pub parameters: Option<Vec<String>>,
}

/// Bundle `base_name` must define `value` for `locale` (default locale when `None`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyFact {
    pub base_name: String,
    pub value: String,
    pub locale: Option<String>,
}

/// Bundle `base_name` must define every key in `values` for `locale`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeysFact {
    pub base_name: String,
    pub values: Vec<String>,
    pub locale: Option<String>,
}

/// The bundles of `base_name` for every tag in `locales` must define the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceBundleFact {
    pub base_name: String,
    /// Locale tags; `""` is the default bundle.
    pub locales: BTreeSet<String>,
}

/// Every class in `target_package`, minus `excludes`, must be serializable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SerializableFact {
    /// Package to scan; `None` means the annotated package itself.
    pub target_package: Option<String>,
    /// Canonical names of classes to skip.
    pub excludes: BTreeSet<String>,
}

impl Fact {
    pub fn new(annotated_element: impl Into<String>, kind: FactKind) -> Self {
        Self {
            annotated_element: annotated_element.into(),
            message: None,
            kind,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The annotation this fact was harvested from.
    pub fn annotation(&self) -> AnnotationKind {
        self.kind.annotation()
    }

    /// The custom message, if it is set and not blank.
    pub fn custom_message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

impl FactKind {
    pub fn annotation(&self) -> AnnotationKind {
        match self {
            FactKind::Constructor(_) => AnnotationKind::Constructor,
            FactKind::Field(_) => AnnotationKind::Field,
            FactKind::Fields(_) => AnnotationKind::Fields,
            FactKind::Method(_) => AnnotationKind::Method,
            FactKind::Key(_) => AnnotationKind::Key,
            FactKind::Keys(_) => AnnotationKind::Keys,
            FactKind::ResourceBundle(_) => AnnotationKind::ResourceBundle,
            FactKind::Serializable(_) => AnnotationKind::Serializable,
        }
    }

    /// Class the expectation is about, for the reflective kinds.
    pub fn target_class(&self) -> Option<&str> {
        match self {
            FactKind::Constructor(f) => Some(&f.target_class),
            FactKind::Field(f) => Some(&f.target_class),
            FactKind::Fields(f) => Some(&f.target_class),
            FactKind::Method(f) => Some(&f.target_class),
            FactKind::Key(_)
            | FactKind::Keys(_)
            | FactKind::ResourceBundle(_)
            | FactKind::Serializable(_) => None,
        }
    }

    /// Bundle base name, for the resource-bundle kinds.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            FactKind::Key(f) => Some(&f.base_name),
            FactKind::Keys(f) => Some(&f.base_name),
            FactKind::ResourceBundle(f) => Some(&f.base_name),
            _ => None,
        }
    }
}
