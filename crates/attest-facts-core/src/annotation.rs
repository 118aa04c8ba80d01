//! The annotation vocabulary recognized by the harvester.

use serde::{Deserialize, Serialize};

/// One of the recognized check annotations.
///
/// Each kind has a repeatable container form named `<Simple>.List` whose
/// `value` attribute holds an array of the plain annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Constructor,
    Field,
    Fields,
    Method,
    Key,
    Keys,
    ResourceBundle,
    Serializable,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 8] = [
        AnnotationKind::Constructor,
        AnnotationKind::Field,
        AnnotationKind::Fields,
        AnnotationKind::Method,
        AnnotationKind::Key,
        AnnotationKind::Keys,
        AnnotationKind::ResourceBundle,
        AnnotationKind::Serializable,
    ];

    /// Simple name as written in source (`@CheckField`).
    pub fn simple_name(&self) -> &'static str {
        match self {
            AnnotationKind::Constructor => "CheckConstructor",
            AnnotationKind::Field => "CheckField",
            AnnotationKind::Fields => "CheckFields",
            AnnotationKind::Method => "CheckMethod",
            AnnotationKind::Key => "CheckKey",
            AnnotationKind::Keys => "CheckKeys",
            AnnotationKind::ResourceBundle => "CheckResourceBundle",
            AnnotationKind::Serializable => "CheckSerializable",
        }
    }

    /// Short identifier used in reports and check names.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnotationKind::Constructor => "constructor",
            AnnotationKind::Field => "field",
            AnnotationKind::Fields => "fields",
            AnnotationKind::Method => "method",
            AnnotationKind::Key => "key",
            AnnotationKind::Keys => "keys",
            AnnotationKind::ResourceBundle => "resource_bundle",
            AnnotationKind::Serializable => "serializable",
        }
    }

    pub fn from_simple_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.simple_name() == name)
    }

    /// Attributes that must be present after short-form substitution.
    pub fn required_attributes(&self) -> &'static [&'static str] {
        match self {
            AnnotationKind::Constructor => &["targetClass"],
            AnnotationKind::Field => &["targetClass", "value"],
            AnnotationKind::Fields => &["targetClass", "values"],
            AnnotationKind::Method => &["targetClass", "value"],
            AnnotationKind::Key => &["baseName", "value"],
            AnnotationKind::Keys => &["baseName", "values"],
            AnnotationKind::ResourceBundle => &["baseName", "locales"],
            AnnotationKind::Serializable => &[],
        }
    }

    /// Required string attributes a constant field may fill in, in priority order.
    ///
    /// Only the first missing one is filled; a constant supplies one literal.
    pub fn short_form_attributes(&self) -> &'static [&'static str] {
        match self {
            AnnotationKind::Field | AnnotationKind::Method => &["value"],
            AnnotationKind::Key => &["value", "baseName"],
            AnnotationKind::Keys | AnnotationKind::ResourceBundle => &["baseName"],
            AnnotationKind::Constructor | AnnotationKind::Fields | AnnotationKind::Serializable => {
                &[]
            }
        }
    }
}

impl std::fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.simple_name())
    }
}
