//! Tree-sitter Java syntax tree to owned declaration records.
//!
//! Nothing here resolves names: type and constant references are kept as
//! written and bound later by `lower`, once every compilation unit is known.

use std::path::PathBuf;

use attest_types::{ClassKind, TypeRef, is_primitive};
use tree_sitter::{Node, Parser};

use crate::JavaError;

/// An annotation attribute value as written.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawValue {
    String(String),
    ClassLiteral(TypeRef),
    /// `NAME`, `Type.NAME` or `pkg.Type.NAME`.
    Reference(String),
    /// String concatenation with `+`.
    Concat(Vec<RawValue>),
    Array(Vec<RawValue>),
    Annotation(RawAnnotation),
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawAnnotation {
    pub name: String,
    pub arguments: Vec<(String, RawValue)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Flags {
    pub is_static: bool,
    pub is_final: bool,
    pub is_transient: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Modifiers {
    pub flags: Flags,
    pub annotations: Vec<RawAnnotation>,
}

#[derive(Debug, Clone)]
pub(crate) struct Import {
    pub path: String,
    pub on_demand: bool,
    pub is_static: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct FieldDecl {
    pub name: String,
    pub ty: TypeRef,
    pub modifiers: Modifiers,
    pub init: Option<RawValue>,
}

#[derive(Debug, Clone)]
pub(crate) struct LocalDecl {
    pub name: String,
    pub ty: TypeRef,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone)]
pub(crate) struct MethodDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub return_type: TypeRef,
    pub parameters: Vec<TypeRef>,
    pub modifiers: Modifiers,
    /// Annotated local variables of the body.
    pub locals: Vec<LocalDecl>,
}

#[derive(Debug, Clone)]
pub(crate) struct ConstructorDecl {
    pub type_params: Vec<String>,
    pub parameters: Vec<TypeRef>,
    pub modifiers: Modifiers,
    pub locals: Vec<LocalDecl>,
}

#[derive(Debug, Clone)]
pub(crate) struct EnumConstantDecl {
    pub name: String,
    pub modifiers: Modifiers,
}

#[derive(Debug, Clone)]
pub(crate) struct TypeDecl {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<String>,
    pub modifiers: Modifiers,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub record_components: Vec<(String, TypeRef)>,
    pub enum_constants: Vec<EnumConstantDecl>,
    pub fields: Vec<FieldDecl>,
    pub constructors: Vec<ConstructorDecl>,
    pub methods: Vec<MethodDecl>,
    pub nested: Vec<TypeDecl>,
}

impl TypeDecl {
    fn new(name: String, kind: ClassKind, modifiers: Modifiers) -> Self {
        Self {
            name,
            kind,
            type_params: Vec::new(),
            modifiers,
            superclass: None,
            interfaces: Vec::new(),
            record_components: Vec::new(),
            enum_constants: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
        }
    }
}

/// One parsed `.java` file.
#[derive(Debug, Clone)]
pub(crate) struct Unit {
    pub path: PathBuf,
    pub package: String,
    /// Annotations on the package declaration (`package-info.java`).
    pub package_annotations: Vec<RawAnnotation>,
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
}

pub(crate) fn new_parser() -> Result<Parser, JavaError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .map_err(|e| JavaError::Grammar(e.to_string()))?;
    Ok(parser)
}

pub(crate) fn parse_unit(parser: &mut Parser, path: PathBuf, src: &str) -> Result<Unit, JavaError> {
    let tree = parser
        .parse(src, None)
        .ok_or_else(|| JavaError::Parse { path: path.clone() })?;
    let root = tree.root_node();
    if root.has_error() {
        tracing::warn!(path = %path.display(), "syntax errors, reading what parsed");
    }

    let mut unit = Unit {
        path,
        package: String::new(),
        package_annotations: Vec::new(),
        imports: Vec::new(),
        types: Vec::new(),
    };
    for child in named_children(root) {
        match child.kind() {
            "package_declaration" => {
                for part in named_children(child) {
                    match part.kind() {
                        "identifier" | "scoped_identifier" => {
                            unit.package = compact(text(part, src));
                        }
                        "marker_annotation" | "annotation" => {
                            unit.package_annotations.push(annotation(part, src));
                        }
                        _ => {}
                    }
                }
            }
            "import_declaration" => unit.imports.push(import(child, src)),
            _ => {
                if let Some(decl) = type_decl(child, src) {
                    unit.types.push(decl);
                }
            }
        }
    }
    Ok(unit)
}

fn import(node: Node, src: &str) -> Import {
    let mut result = Import {
        path: String::new(),
        on_demand: false,
        is_static: false,
    };
    for child in children(node) {
        match child.kind() {
            "static" => result.is_static = true,
            "asterisk" => result.on_demand = true,
            "identifier" | "scoped_identifier" => result.path = compact(text(child, src)),
            _ => {}
        }
    }
    result
}

fn type_decl(node: Node, src: &str) -> Option<TypeDecl> {
    let kind = match node.kind() {
        "class_declaration" => ClassKind::Class,
        "interface_declaration" => ClassKind::Interface,
        "enum_declaration" => ClassKind::Enum,
        "record_declaration" => ClassKind::Record,
        "annotation_type_declaration" => ClassKind::Annotation,
        _ => return None,
    };
    let name = text(node.child_by_field_name("name")?, src).to_string();
    let mut decl = TypeDecl::new(name, kind, modifiers(node, src));
    if let Some(params) = node.child_by_field_name("type_parameters") {
        decl.type_params = type_parameters(params, src);
    }

    for child in named_children(node) {
        match child.kind() {
            "superclass" => decl.superclass = named_children(child).first().map(|t| type_ref(*t, src)),
            "super_interfaces" | "extends_interfaces" => {
                for list in named_children(child) {
                    decl.interfaces.extend(named_children(list).into_iter().map(|t| type_ref(t, src)));
                }
            }
            _ => {}
        }
    }
    if kind == ClassKind::Record
        && let Some(params) = node.child_by_field_name("parameters")
    {
        for param in named_children(params) {
            if param.kind() == "formal_parameter"
                && let (Some(ty), Some(name)) = (
                    param.child_by_field_name("type"),
                    param.child_by_field_name("name"),
                )
            {
                decl.record_components.push((text(name, src).to_string(), type_ref(ty, src)));
            }
        }
    }

    if let Some(body) = node.child_by_field_name("body") {
        members(body, src, &mut decl);
    }
    Some(decl)
}

fn members(body: Node, src: &str, decl: &mut TypeDecl) {
    for member in named_children(body) {
        match member.kind() {
            "field_declaration" | "constant_declaration" => {
                let mods = modifiers(member, src);
                let Some(ty) = member.child_by_field_name("type").map(|t| type_ref(t, src)) else {
                    continue;
                };
                let mut cursor = member.walk();
                for declarator in member.children_by_field_name("declarator", &mut cursor) {
                    let Some(name) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    decl.fields.push(FieldDecl {
                        name: text(name, src).to_string(),
                        ty: with_dimensions(ty.clone(), declarator, src),
                        modifiers: mods.clone(),
                        init: declarator.child_by_field_name("value").map(|v| value(v, src)),
                    });
                }
            }
            "method_declaration" | "annotation_type_element_declaration" => {
                let (Some(name), Some(ty)) = (
                    member.child_by_field_name("name"),
                    member.child_by_field_name("type"),
                ) else {
                    continue;
                };
                decl.methods.push(MethodDecl {
                    name: text(name, src).to_string(),
                    type_params: member
                        .child_by_field_name("type_parameters")
                        .map(|p| type_parameters(p, src))
                        .unwrap_or_default(),
                    return_type: type_ref(ty, src),
                    parameters: member
                        .child_by_field_name("parameters")
                        .map(|p| parameters(p, src))
                        .unwrap_or_default(),
                    modifiers: modifiers(member, src),
                    locals: member
                        .child_by_field_name("body")
                        .map(|b| annotated_locals(b, src))
                        .unwrap_or_default(),
                });
            }
            "constructor_declaration" | "compact_constructor_declaration" => {
                let parameters = match member.child_by_field_name("parameters") {
                    Some(p) => parameters(p, src),
                    // compact canonical constructor
                    None => decl.record_components.iter().map(|(_, t)| t.clone()).collect(),
                };
                decl.constructors.push(ConstructorDecl {
                    type_params: member
                        .child_by_field_name("type_parameters")
                        .map(|p| type_parameters(p, src))
                        .unwrap_or_default(),
                    parameters,
                    modifiers: modifiers(member, src),
                    locals: member
                        .child_by_field_name("body")
                        .map(|b| annotated_locals(b, src))
                        .unwrap_or_default(),
                });
            }
            "enum_constant" => {
                if let Some(name) = member.child_by_field_name("name") {
                    decl.enum_constants.push(EnumConstantDecl {
                        name: text(name, src).to_string(),
                        modifiers: modifiers(member, src),
                    });
                }
            }
            "enum_body_declarations" => members(member, src, decl),
            _ => {
                if let Some(nested) = type_decl(member, src) {
                    decl.nested.push(nested);
                }
            }
        }
    }
}

/// Annotated `local_variable_declaration`s, not descending into nested classes.
fn annotated_locals(body: Node, src: &str) -> Vec<LocalDecl> {
    let mut out = Vec::new();
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "class_body" | "class_declaration" | "interface_declaration" | "enum_declaration"
            | "record_declaration" => continue,
            "local_variable_declaration" => {
                let mods = modifiers(node, src);
                if mods.annotations.is_empty() {
                    continue;
                }
                let Some(ty) = node.child_by_field_name("type").map(|t| type_ref(t, src)) else {
                    continue;
                };
                let mut cursor = node.walk();
                for declarator in node.children_by_field_name("declarator", &mut cursor) {
                    if let Some(name) = declarator.child_by_field_name("name") {
                        out.push(LocalDecl {
                            name: text(name, src).to_string(),
                            ty: with_dimensions(ty.clone(), declarator, src),
                            modifiers: mods.clone(),
                        });
                    }
                }
            }
            _ => {
                let mut kids = named_children(node);
                kids.reverse();
                stack.extend(kids);
            }
        }
    }
    out
}

fn modifiers(node: Node, src: &str) -> Modifiers {
    let mut mods = Modifiers::default();
    let Some(list) = children(node).into_iter().find(|c| c.kind() == "modifiers") else {
        return mods;
    };
    for child in children(list) {
        match child.kind() {
            "static" => mods.flags.is_static = true,
            "final" => mods.flags.is_final = true,
            "transient" => mods.flags.is_transient = true,
            "marker_annotation" | "annotation" => mods.annotations.push(annotation(child, src)),
            _ => {}
        }
    }
    mods
}

fn annotation(node: Node, src: &str) -> RawAnnotation {
    let name = node
        .child_by_field_name("name")
        .map(|n| compact(text(n, src)))
        .unwrap_or_default();
    let mut arguments = Vec::new();
    if let Some(args) = node.child_by_field_name("arguments") {
        for arg in named_children(args) {
            if arg.kind() == "element_value_pair" {
                if let (Some(key), Some(v)) = (
                    arg.child_by_field_name("key"),
                    arg.child_by_field_name("value"),
                ) {
                    arguments.push((text(key, src).to_string(), value(v, src)));
                }
            } else if arg.kind() != "comment" {
                // single-element shorthand
                arguments.push(("value".to_string(), value(arg, src)));
            }
        }
    }
    RawAnnotation { name, arguments }
}

fn value(node: Node, src: &str) -> RawValue {
    match node.kind() {
        "string_literal" => RawValue::String(string_literal(node, src)),
        "class_literal" => match named_children(node).first() {
            Some(ty) => RawValue::ClassLiteral(type_ref(*ty, src)),
            None => RawValue::Other(text(node, src).to_string()),
        },
        "identifier" | "field_access" | "scoped_identifier" => {
            RawValue::Reference(compact(text(node, src)))
        }
        "element_value_array_initializer" | "array_initializer" => RawValue::Array(
            named_children(node)
                .into_iter()
                .filter(|c| c.kind() != "comment")
                .map(|c| value(c, src))
                .collect(),
        ),
        "marker_annotation" | "annotation" => RawValue::Annotation(annotation(node, src)),
        "parenthesized_expression" => match named_children(node).first() {
            Some(inner) => value(*inner, src),
            None => RawValue::Other(text(node, src).to_string()),
        },
        "binary_expression"
            if node
                .child_by_field_name("operator")
                .is_some_and(|op| op.kind() == "+") =>
        {
            let mut parts = Vec::new();
            for side in ["left", "right"] {
                match node.child_by_field_name(side).map(|n| value(n, src)) {
                    Some(RawValue::Concat(inner)) => parts.extend(inner),
                    Some(part) => parts.push(part),
                    None => {}
                }
            }
            RawValue::Concat(parts)
        }
        _ => RawValue::Other(text(node, src).to_string()),
    }
}

fn string_literal(node: Node, src: &str) -> String {
    let mut out = String::new();
    for child in named_children(node) {
        match child.kind() {
            "string_fragment" | "multiline_string_fragment" => out.push_str(text(child, src)),
            "escape_sequence" => out.push_str(&unescape(text(child, src))),
            _ => {}
        }
    }
    out
}

fn unescape(escape: &str) -> String {
    let body = escape.strip_prefix('\\').unwrap_or(escape);
    match body {
        "n" => "\n".into(),
        "t" => "\t".into(),
        "r" => "\r".into(),
        "b" => "\u{8}".into(),
        "f" => "\u{c}".into(),
        "s" => " ".into(),
        "0" => "\0".into(),
        _ => {
            if let Some(hex) = body.trim_start_matches('u').get(..4)
                && body.starts_with('u')
                && let Some(c) = u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            {
                return c.to_string();
            }
            if body.chars().all(|c| c.is_digit(8))
                && let Some(c) = u32::from_str_radix(body, 8).ok().and_then(char::from_u32)
            {
                return c.to_string();
            }
            body.to_string()
        }
    }
}

fn type_parameters(node: Node, src: &str) -> Vec<String> {
    named_children(node)
        .into_iter()
        .filter(|p| p.kind() == "type_parameter")
        .filter_map(|p| {
            named_children(p)
                .into_iter()
                .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
                .map(|n| text(n, src).to_string())
        })
        .collect()
}

fn parameters(node: Node, src: &str) -> Vec<TypeRef> {
    let mut out = Vec::new();
    for param in named_children(node) {
        match param.kind() {
            "formal_parameter" => {
                if let Some(ty) = param.child_by_field_name("type") {
                    out.push(with_dimensions(type_ref(ty, src), param, src));
                }
            }
            "spread_parameter" => {
                if let Some(ty) = named_children(param)
                    .into_iter()
                    .find(|c| !matches!(c.kind(), "modifiers" | "variable_declarator"))
                {
                    out.push(TypeRef::array(type_ref(ty, src)));
                }
            }
            _ => {}
        }
    }
    out
}

/// Apply C-style dimensions written after a name (`int values[]`).
fn with_dimensions(ty: TypeRef, declarator: Node, src: &str) -> TypeRef {
    match declarator.child_by_field_name("dimensions") {
        Some(dims) => (0..text(dims, src).matches('[').count()).fold(ty, |t, _| TypeRef::array(t)),
        None => ty,
    }
}

/// A type node as written; names stay unresolved.
pub(crate) fn type_ref(node: Node, src: &str) -> TypeRef {
    match node.kind() {
        "integral_type" | "floating_point_type" | "boolean_type" | "void_type" => {
            TypeRef::Primitive(text(node, src).to_string())
        }
        "type_identifier" | "identifier" => {
            let name = text(node, src);
            if is_primitive(name) {
                TypeRef::Primitive(name.to_string())
            } else {
                TypeRef::class(name)
            }
        }
        "scoped_type_identifier" => TypeRef::class(scoped_name(node, src)),
        "generic_type" => {
            let kids = named_children(node);
            let name = kids
                .iter()
                .find(|c| matches!(c.kind(), "type_identifier" | "scoped_type_identifier"))
                .map(|c| scoped_name(*c, src))
                .unwrap_or_default();
            let args = kids
                .iter()
                .find(|c| c.kind() == "type_arguments")
                .map(|a| named_children(*a).into_iter().map(|t| type_ref(t, src)).collect())
                .unwrap_or_default();
            TypeRef::generic(name, args)
        }
        "array_type" => {
            let element = node
                .child_by_field_name("element")
                .map(|e| type_ref(e, src))
                .unwrap_or(TypeRef::Wildcard);
            with_dimensions(element, node, src)
        }
        "annotated_type" => named_children(node)
            .into_iter()
            .rev()
            .find(|c| !matches!(c.kind(), "marker_annotation" | "annotation"))
            .map(|t| type_ref(t, src))
            .unwrap_or(TypeRef::Wildcard),
        "wildcard" => TypeRef::Wildcard,
        _ => TypeRef::class(compact(text(node, src))),
    }
}

/// `a.b.Outer<T>.Inner` as `a.b.Outer.Inner`.
fn scoped_name(node: Node, src: &str) -> String {
    match node.kind() {
        "scoped_type_identifier" => named_children(node)
            .into_iter()
            .filter(|c| !matches!(c.kind(), "marker_annotation" | "annotation"))
            .map(|c| scoped_name(c, src))
            .collect::<Vec<_>>()
            .join("."),
        "generic_type" => named_children(node)
            .into_iter()
            .find(|c| c.kind() != "type_arguments")
            .map(|c| scoped_name(c, src))
            .unwrap_or_default(),
        _ => compact(text(node, src)),
    }
}

fn text<'s>(node: Node, src: &'s str) -> &'s str {
    &src[node.byte_range()]
}

/// Drop whitespace inside dotted names.
fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}
