//! Declared-member model of a class, as a reflective view would expose it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ModelError, OBJECT};

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// A (possibly generic) type reference as written in a declaration.
///
/// Serialized as its source-like string form (`java.util.Map<java.lang.String, int[]>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Primitive(String),
    Class { name: String, args: Vec<TypeRef> },
    Array(Box<TypeRef>),
    /// A type parameter of the declaring class or method.
    Variable(String),
    /// `?`, with or without bounds.
    Wildcard,
}

impl TypeRef {
    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Class {
            name: name.into(),
            args,
        }
    }

    pub fn array(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    /// Canonical name of the erased type: `java.util.List`, `int`, `double[]`.
    pub fn canonical_name(&self) -> String {
        match self {
            TypeRef::Primitive(name) => name.clone(),
            TypeRef::Class { name, .. } => name.clone(),
            TypeRef::Array(component) => format!("{}[]", component.canonical_name()),
            TypeRef::Variable(_) | TypeRef::Wildcard => OBJECT.to_string(),
        }
    }

    /// Class name for class types, `None` otherwise.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeRef::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Actual type arguments; empty for raw and non-class types.
    pub fn type_arguments(&self) -> &[TypeRef] {
        match self {
            TypeRef::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// Replace class references named like one of `params` with type variables.
    pub fn bind_variables(self, params: &[String]) -> TypeRef {
        match self {
            TypeRef::Class { name, args } if args.is_empty() && params.contains(&name) => {
                TypeRef::Variable(name)
            }
            TypeRef::Class { name, args } => TypeRef::Class {
                name,
                args: args.into_iter().map(|a| a.bind_variables(params)).collect(),
            },
            TypeRef::Array(component) => TypeRef::array(component.bind_variables(params)),
            other => other,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Primitive(name) | TypeRef::Variable(name) => f.write_str(name),
            TypeRef::Class { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Array(component) => write!(f, "{}[]", component),
            TypeRef::Wildcard => f.write_str("?"),
        }
    }
}

impl From<TypeRef> for String {
    fn from(ty: TypeRef) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for TypeRef {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl FromStr for TypeRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { src: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(ty)
    }
}

/// Recursive-descent parser for type strings.
struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn parse_type(&mut self) -> Result<TypeRef, ModelError> {
        self.skip_ws();
        let mut ty = if self.eat("?") {
            self.skip_ws();
            if self.eat_word("extends") || self.eat_word("super") {
                // bounds are irrelevant to erasure
                self.parse_type()?;
            }
            TypeRef::Wildcard
        } else {
            let name = self.identifier()?;
            if is_primitive(&name) {
                TypeRef::Primitive(name)
            } else {
                self.skip_ws();
                let mut args = Vec::new();
                if self.eat("<") {
                    loop {
                        args.push(self.parse_type()?);
                        self.skip_ws();
                        if self.eat(",") {
                            continue;
                        }
                        if self.eat(">") {
                            break;
                        }
                        return Err(self.error("expected ',' or '>'"));
                    }
                }
                TypeRef::Class { name, args }
            }
        };
        loop {
            self.skip_ws();
            if self.eat("[]") {
                ty = TypeRef::array(ty);
            } else {
                break;
            }
        }
        Ok(ty)
    }

    fn identifier(&mut self) -> Result<String, ModelError> {
        let rest = &self.src[self.pos..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_alphanumeric() || matches!(c, '_' | '$' | '.')))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.src[self.pos..].starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        let rest = &self.src[self.pos..];
        let Some(after) = rest.strip_prefix(word) else {
            return false;
        };
        if after.chars().next().is_none_or(|c| !c.is_alphanumeric()) {
            self.pos += word.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, reason: &str) -> ModelError {
        ModelError::InvalidType {
            input: self.src.to_string(),
            reason: format!("{} at offset {}", reason, self.pos),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    #[serde(rename = "static")]
    pub is_static: bool,
    #[serde(rename = "final")]
    pub is_final: bool,
    #[serde(rename = "transient")]
    pub is_transient: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub return_type: TypeRef,
    #[serde(default)]
    pub parameters: Vec<TypeRef>,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, return_type: TypeRef, parameters: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters,
            modifiers: Modifiers::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConstructorInfo {
    #[serde(default)]
    pub parameters: Vec<TypeRef>,
}

impl ConstructorInfo {
    pub fn new(parameters: Vec<TypeRef>) -> Self {
        Self { parameters }
    }
}

/// One class, interface, enum or record with its declared members.
///
/// Members are the declared ones only; inherited members are reached through
/// the hierarchy helpers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    /// Canonical name, nested types joined with `.`.
    pub name: String,
    /// Declared package; derived from `name` when absent.
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub superclass: Option<TypeRef>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default)]
    pub constructors: Vec<ConstructorInfo>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            package: None,
            kind,
            type_params: Vec::new(),
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_superclass(mut self, superclass: TypeRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn with_interface(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorInfo) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn package_name(&self) -> &str {
        match &self.package {
            Some(p) => p,
            None => self.name.rsplit_once('.').map(|(p, _)| p).unwrap_or(""),
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    /// Direct superclass, including the implicit ones (`Object`, `Enum`, `Record`).
    pub fn superclass_name(&self) -> Option<String> {
        if let Some(sc) = &self.superclass {
            return Some(sc.canonical_name());
        }
        if self.name == OBJECT {
            return None;
        }
        match self.kind {
            ClassKind::Class => Some(OBJECT.to_string()),
            ClassKind::Enum => Some("java.lang.Enum".to_string()),
            ClassKind::Record => Some("java.lang.Record".to_string()),
            ClassKind::Interface | ClassKind::Annotation => None,
        }
    }

    /// Turn bare references to the class's own type parameters into variables.
    pub(crate) fn bind_type_params(&mut self) {
        if self.type_params.is_empty() {
            return;
        }
        let params = self.type_params.clone();
        let bind = |ty: &mut TypeRef| {
            let taken = std::mem::replace(ty, TypeRef::Wildcard);
            *ty = taken.bind_variables(&params);
        };
        for field in &mut self.fields {
            bind(&mut field.ty);
        }
        for method in &mut self.methods {
            bind(&mut method.return_type);
            method.parameters.iter_mut().for_each(bind);
        }
        for ctor in &mut self.constructors {
            ctor.parameters.iter_mut().for_each(bind);
        }
        if let Some(sc) = &mut self.superclass {
            bind(sc);
        }
        self.interfaces.iter_mut().for_each(bind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> TypeRef {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_erase() {
        assert_eq!(parse("int"), TypeRef::Primitive("int".into()));
        assert_eq!(parse("double[]").canonical_name(), "double[]");
        assert_eq!(parse("java.lang.String[][]").canonical_name(), "java.lang.String[][]");

        let map = parse("java.util.Map<java.lang.String, java.util.List<a.B>>");
        assert_eq!(map.canonical_name(), "java.util.Map");
        assert_eq!(map.type_arguments().len(), 2);
        assert_eq!(map.type_arguments()[1].canonical_name(), "java.util.List");
        assert_eq!(map.to_string(), "java.util.Map<java.lang.String, java.util.List<a.B>>");
    }

    #[test]
    fn test_parse_wildcards() {
        let ty = parse("java.util.List<? extends java.lang.Number>");
        assert_eq!(ty.type_arguments(), &[TypeRef::Wildcard]);
        assert_eq!(parse("java.util.List<?>").type_arguments(), &[TypeRef::Wildcard]);
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<TypeRef>().is_err());
        assert!("java.util.List<".parse::<TypeRef>().is_err());
        assert!("a.B c".parse::<TypeRef>().is_err());
    }

    #[test]
    fn test_bind_type_params() {
        let mut class = ClassInfo::new("a.Box", ClassKind::Class)
            .with_field(FieldInfo::new("value", parse("T")))
            .with_field(FieldInfo::new("items", parse("java.util.List<T>")));
        class.type_params = vec!["T".into()];
        class.bind_type_params();
        assert_eq!(class.fields[0].ty, TypeRef::Variable("T".into()));
        assert_eq!(class.fields[0].ty.canonical_name(), OBJECT);
        assert_eq!(class.fields[1].ty.type_arguments(), &[TypeRef::Variable("T".into())]);
    }

    #[test]
    fn test_implicit_superclass() {
        assert_eq!(
            ClassInfo::new("a.B", ClassKind::Class).superclass_name().as_deref(),
            Some(OBJECT)
        );
        assert_eq!(
            ClassInfo::new("a.E", ClassKind::Enum).superclass_name().as_deref(),
            Some("java.lang.Enum")
        );
        assert_eq!(ClassInfo::new("a.I", ClassKind::Interface).superclass_name(), None);
        assert_eq!(ClassInfo::new(OBJECT, ClassKind::Class).superclass_name(), None);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{
            "name": "a.Dto",
            "superclass": "a.Base",
            "fields": [{ "name": "id", "type": "long", "modifiers": { "transient": true } }]
        }"#;
        let class: ClassInfo = serde_json::from_str(json).unwrap();
        assert_eq!(class.kind, ClassKind::Class);
        assert_eq!(class.package_name(), "a");
        assert!(class.fields[0].modifiers.is_transient);
        assert_eq!(class.superclass, Some(TypeRef::class("a.Base")));
    }
}
