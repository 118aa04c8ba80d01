//! Compile-time element model.
//!
//! The harvester never sees a parser or a compiler. It sees elements through
//! [`SourceElement`], the capability set every front-end provides: annotations,
//! modifiers, declared type and enclosing element. [`Element`] is the plain
//! owned implementation front-ends build.

use std::collections::BTreeMap;

/// Category of a program element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Package,
    Class,
    Interface,
    Enum,
    Record,
    AnnotationType,
    Field,
    EnumConstant,
    Constructor,
    Method,
    LocalVariable,
}

impl ElementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Package => "package",
            ElementKind::Class => "class",
            ElementKind::Interface => "interface",
            ElementKind::Enum => "enum",
            ElementKind::Record => "record",
            ElementKind::AnnotationType => "annotation",
            ElementKind::Field => "field",
            ElementKind::EnumConstant => "enum constant",
            ElementKind::Constructor => "constructor",
            ElementKind::Method => "method",
            ElementKind::LocalVariable => "local variable",
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(
            self,
            ElementKind::Class
                | ElementKind::Interface
                | ElementKind::Enum
                | ElementKind::Record
                | ElementKind::AnnotationType
        )
    }
}

/// Modifiers relevant to harvesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElementModifiers {
    pub is_static: bool,
    pub is_final: bool,
}

/// A declared annotation attribute value, as the front-end resolved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    /// A string literal, or a constant reference resolved to its literal.
    String(String),
    /// A class literal, as a canonical type name (`java.lang.String`, `int`, `double[]`).
    Class(String),
    Array(Vec<AnnotationValue>),
    Annotation(AnnotationInstance),
    /// Any other expression (numbers, enum constants, unresolved references), verbatim.
    Other(String),
}

/// One annotation occurrence on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationInstance {
    /// Annotation type name, qualified when the front-end could resolve it.
    pub type_name: String,
    /// Explicitly declared attributes only; defaults are not materialized.
    pub values: BTreeMap<String, AnnotationValue>,
}

impl AnnotationInstance {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, attribute: &str, value: AnnotationValue) -> Self {
        self.values.insert(attribute.to_string(), value);
        self
    }

    pub fn with_str(self, attribute: &str, value: &str) -> Self {
        self.with(attribute, AnnotationValue::String(value.to_string()))
    }

    pub fn with_class(self, attribute: &str, class: &str) -> Self {
        self.with(attribute, AnnotationValue::Class(class.to_string()))
    }
}

/// What the harvester needs to know about a program element.
pub trait SourceElement {
    fn kind(&self) -> ElementKind;

    /// Simple name; the qualified name for packages.
    fn simple_name(&self) -> &str;

    /// Display name of the enclosing element: the package for top-level types,
    /// the type for members, `Type.method` for local variables.
    fn enclosing_element(&self) -> Option<&str>;

    fn annotations(&self) -> &[AnnotationInstance];

    fn modifiers(&self) -> ElementModifiers;

    /// Canonical declared type for fields and variables.
    fn declared_type(&self) -> Option<&str>;

    /// Compile-time constant value of a string field, if its initializer is one.
    fn constant_value(&self) -> Option<&str>;

    /// Canonical parameter types for constructors and methods.
    fn parameter_types(&self) -> &[String];

    /// True when this element is a final field of type `String` with a constant value.
    fn is_string_constant(&self) -> bool {
        self.kind() == ElementKind::Field
            && self.modifiers().is_final
            && matches!(self.declared_type(), Some("java.lang.String" | "String"))
            && self.constant_value().is_some()
    }
}

/// Owned element, as built by front-ends and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub name: String,
    pub enclosing: Option<String>,
    pub modifiers: ElementModifiers,
    pub declared_type: Option<String>,
    pub constant_value: Option<String>,
    pub parameter_types: Vec<String>,
    pub annotations: Vec<AnnotationInstance>,
}

impl Element {
    pub fn new(kind: ElementKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            enclosing: None,
            modifiers: ElementModifiers::default(),
            declared_type: None,
            constant_value: None,
            parameter_types: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn package(name: &str) -> Self {
        Self::new(ElementKind::Package, name)
    }

    /// A type; `qualified` is split into package/enclosing and simple name.
    pub fn class(qualified: &str) -> Self {
        let (enclosing, name) = split_last(qualified);
        Self::new(ElementKind::Class, name).enclosed_by(enclosing)
    }

    pub fn field(owner: &str, name: &str, declared_type: &str) -> Self {
        let mut element = Self::new(ElementKind::Field, name).enclosed_by(owner);
        element.declared_type = Some(declared_type.to_string());
        element
    }

    /// A `static final String` field initialized with `value`.
    pub fn string_constant(owner: &str, name: &str, value: &str) -> Self {
        let mut element = Self::field(owner, name, "java.lang.String");
        element.modifiers = ElementModifiers {
            is_static: true,
            is_final: true,
        };
        element.constant_value = Some(value.to_string());
        element
    }

    pub fn constructor(owner: &str, parameter_types: &[&str]) -> Self {
        let (_, simple) = split_last(owner);
        let mut element = Self::new(ElementKind::Constructor, simple).enclosed_by(owner);
        element.parameter_types = parameter_types.iter().map(|s| s.to_string()).collect();
        element
    }

    pub fn method(owner: &str, name: &str, parameter_types: &[&str]) -> Self {
        let mut element = Self::new(ElementKind::Method, name).enclosed_by(owner);
        element.parameter_types = parameter_types.iter().map(|s| s.to_string()).collect();
        element
    }

    pub fn enclosed_by(mut self, enclosing: &str) -> Self {
        self.enclosing = (!enclosing.is_empty()).then(|| enclosing.to_string());
        self
    }

    pub fn annotated(mut self, annotation: AnnotationInstance) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl SourceElement for Element {
    fn kind(&self) -> ElementKind {
        self.kind
    }

    fn simple_name(&self) -> &str {
        &self.name
    }

    fn enclosing_element(&self) -> Option<&str> {
        self.enclosing.as_deref()
    }

    fn annotations(&self) -> &[AnnotationInstance] {
        &self.annotations
    }

    fn modifiers(&self) -> ElementModifiers {
        self.modifiers
    }

    fn declared_type(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    fn constant_value(&self) -> Option<&str> {
        self.constant_value.as_deref()
    }

    fn parameter_types(&self) -> &[String] {
        &self.parameter_types
    }
}

/// Format the `annotatedElement` of a fact harvested from `element`.
///
/// - type, package: qualified name
/// - field, enum constant, method, local variable: `Enclosing.name`
/// - constructor: `Enclosing.Simple(ParamType, ...)`
///
/// A constructor is always rendered with its own declared parameter types,
/// whatever the annotation on it says: `@CheckConstructor(parameters = ...)`
/// on a constructor does not change the name. Local variables are qualified
/// with their enclosing method (`a.App.run.bundle`) rather than rendered as
/// the bare variable name, so facts from different methods stay distinct.
pub fn annotated_element<E: SourceElement + ?Sized>(element: &E) -> String {
    let enclosing = element.enclosing_element().unwrap_or_default();
    let qualify = |name: &str| {
        if enclosing.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", enclosing, name)
        }
    };
    match element.kind() {
        ElementKind::Package => element.simple_name().to_string(),
        ElementKind::Constructor => {
            let (_, simple) = split_last(enclosing);
            format!(
                "{}({})",
                qualify(simple),
                element.parameter_types().join(", ")
            )
        }
        _ => qualify(element.simple_name()),
    }
}

fn split_last(qualified: &str) -> (&str, &str) {
    match qualified.rsplit_once('.') {
        Some((head, last)) => (head, last),
        None => ("", qualified),
    }
}
