//! Name resolution and lowering of parsed units into harvestable elements and
//! a reflective type model.
//!
//! Type names are bound the way `javac` looks them up, minus inheritance of
//! member types: enclosing types and their members, single-type imports, the
//! unit's package, on-demand imports, then `java.lang`. String constants are
//! folded when their declaration is among the parsed sources.

use std::collections::{HashMap, HashSet};

use attest_facts::{AnnotationInstance, AnnotationValue, Element, ElementKind, ElementModifiers};
use attest_types::{
    ClassInfo, ClassKind, ConstructorInfo, FieldInfo, MethodInfo, Modifiers, TypeIndex, TypeRef,
    is_primitive,
};

use crate::syntax::{LocalDecl, RawAnnotation, RawValue, TypeDecl, Unit};

/// `java.lang` types resolvable without an import even when not in the type index.
const JAVA_LANG: &[&str] = &[
    "AutoCloseable", "Boolean", "Byte", "Character", "CharSequence", "Class", "Cloneable",
    "Comparable", "Deprecated", "Double", "Enum", "Error", "Exception", "Float",
    "FunctionalInterface", "IllegalArgumentException", "IllegalStateException", "Integer",
    "Iterable", "Long", "Math", "Number", "Object", "Override", "Record", "Runnable",
    "RuntimeException", "SafeVarargs", "Short", "String", "StringBuilder", "SuppressWarnings",
    "System", "Thread", "Throwable", "Void",
];

/// Bound on constant-reference chains; also breaks reference cycles.
const MAX_CONSTANT_DEPTH: usize = 32;

const STRING: &str = "java.lang.String";

struct Entry<'u> {
    unit: &'u Unit,
    decl: &'u TypeDecl,
    /// Qualified names, this type first, then its enclosing types outwards.
    chain: Vec<String>,
    outer_kind: Option<ClassKind>,
}

impl Entry<'_> {
    fn qualified(&self) -> &str {
        &self.chain[0]
    }

    /// Package for top-level types, the enclosing type otherwise.
    fn enclosing(&self) -> &str {
        self.chain.get(1).map(String::as_str).unwrap_or(&self.unit.package)
    }

    fn is_interface(&self) -> bool {
        matches!(self.decl.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    /// Inner (non-static) classes get the enclosing instance as a leading constructor parameter.
    fn outer_instance(&self) -> Option<TypeRef> {
        let inner = self.decl.kind == ClassKind::Class
            && !self.decl.modifiers.flags.is_static
            && matches!(
                self.outer_kind,
                Some(ClassKind::Class | ClassKind::Enum | ClassKind::Record)
            );
        inner.then(|| TypeRef::class(self.chain[1].clone()))
    }
}

pub(crate) struct Lowering<'u> {
    units: &'u [Unit],
    entries: Vec<Entry<'u>>,
    by_name: HashMap<String, usize>,
    known: HashSet<String>,
}

impl<'u> Lowering<'u> {
    pub(crate) fn new(units: &'u [Unit], base: &TypeIndex) -> Self {
        let mut entries = Vec::new();
        for unit in units {
            for decl in &unit.types {
                let qualified = qualify(&unit.package, &decl.name);
                collect(unit, decl, vec![qualified], None, &mut entries);
            }
        }
        let by_name: HashMap<String, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.qualified().to_string(), i))
            .collect();
        let known = base
            .iter()
            .map(|c| c.name.clone())
            .chain(by_name.keys().cloned())
            .collect();
        Self {
            units,
            entries,
            by_name,
            known,
        }
    }

    /// Lower every unit: elements carrying annotations, and one class per declaration.
    pub(crate) fn run(&self) -> (Vec<Element>, Vec<ClassInfo>) {
        let mut elements = Vec::new();
        for unit in self.units {
            if unit.package_annotations.is_empty() {
                continue;
            }
            let scope = Scope {
                lowering: self,
                unit,
                chain: &[],
                type_vars: Vec::new(),
            };
            let mut element = Element::package(&unit.package);
            element.annotations = scope.annotations(&unit.package_annotations);
            elements.push(element);
        }
        let mut classes = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            classes.push(self.lower_entry(entry, &mut elements));
        }
        (elements, classes)
    }

    fn scope<'a>(&'a self, entry: &'a Entry<'u>) -> Scope<'a, 'u> {
        let type_vars = entry
            .chain
            .iter()
            .filter_map(|q| self.by_name.get(q))
            .flat_map(|&i| self.entries[i].decl.type_params.iter().cloned())
            .collect();
        Scope {
            lowering: self,
            unit: entry.unit,
            chain: &entry.chain,
            type_vars,
        }
    }

    /// Value of the string constant `owner.field`, following inheritance.
    fn constant(&self, owner: &str, field: &str, depth: usize) -> Option<String> {
        if depth > MAX_CONSTANT_DEPTH {
            tracing::debug!(owner, field, "constant reference chain too deep");
            return None;
        }
        let entry = &self.entries[*self.by_name.get(owner)?];
        let scope = self.scope(entry);
        if let Some(decl) = entry.decl.fields.iter().find(|f| f.name == field) {
            if !(decl.modifiers.flags.is_final || entry.is_interface()) {
                return None;
            }
            return decl.init.as_ref().and_then(|v| scope.eval(v, depth + 1));
        }
        entry
            .decl
            .superclass
            .iter()
            .chain(&entry.decl.interfaces)
            .find_map(|t| self.constant(&scope.resolve_type(t).canonical_name(), field, depth + 1))
    }

    fn lower_entry(&self, entry: &Entry<'u>, elements: &mut Vec<Element>) -> ClassInfo {
        let decl = entry.decl;
        let scope = self.scope(entry);
        let qualified = entry.qualified();
        let interface = entry.is_interface();

        let mut class = ClassInfo::new(qualified, decl.kind);
        class.package = Some(entry.unit.package.clone());
        class.type_params = decl.type_params.clone();
        class.superclass = decl.superclass.as_ref().map(|t| scope.resolve_type(t));
        class.interfaces = decl.interfaces.iter().map(|t| scope.resolve_type(t)).collect();

        if !decl.modifiers.annotations.is_empty() {
            let mut element = Element::new(element_kind(decl.kind), &decl.name)
                .enclosed_by(entry.enclosing());
            element.annotations = scope.annotations(&decl.modifiers.annotations);
            elements.push(element);
        }

        for constant in &decl.enum_constants {
            let mut info = FieldInfo::new(&constant.name, TypeRef::class(qualified));
            info.modifiers = Modifiers {
                is_static: true,
                is_final: true,
                is_transient: false,
            };
            class.fields.push(info);
            if !constant.modifiers.annotations.is_empty() {
                let mut element =
                    Element::new(ElementKind::EnumConstant, &constant.name).enclosed_by(qualified);
                element.modifiers = ElementModifiers {
                    is_static: true,
                    is_final: true,
                };
                element.declared_type = Some(qualified.to_string());
                element.annotations = scope.annotations(&constant.modifiers.annotations);
                elements.push(element);
            }
        }

        for (name, ty) in &decl.record_components {
            let ty = scope.resolve_type(ty);
            let mut field = FieldInfo::new(name, ty.clone());
            field.modifiers.is_final = true;
            class.fields.push(field);
            class.methods.push(MethodInfo::new(name, ty, Vec::new()));
        }

        for field in &decl.fields {
            let ty = scope.resolve_type(&field.ty);
            let flags = field.modifiers.flags;
            let modifiers = Modifiers {
                is_static: flags.is_static || interface,
                is_final: flags.is_final || interface,
                is_transient: flags.is_transient,
            };
            if !field.modifiers.annotations.is_empty() {
                let declared = ty.canonical_name();
                let mut element = Element::field(qualified, &field.name, &declared);
                element.modifiers = ElementModifiers {
                    is_static: modifiers.is_static,
                    is_final: modifiers.is_final,
                };
                if modifiers.is_final && declared == STRING {
                    element.constant_value =
                        field.init.as_ref().and_then(|v| scope.eval(v, 0));
                }
                element.annotations = scope.annotations(&field.modifiers.annotations);
                elements.push(element);
            }
            class.fields.push(FieldInfo {
                name: field.name.clone(),
                ty,
                modifiers,
            });
        }

        let outer = entry.outer_instance();
        for ctor in &decl.constructors {
            let scope = scope.with_vars(&ctor.type_params);
            let declared: Vec<TypeRef> = ctor.parameters.iter().map(|t| scope.resolve_type(t)).collect();
            if !ctor.modifiers.annotations.is_empty() {
                let names: Vec<String> = declared.iter().map(TypeRef::canonical_name).collect();
                let mut element =
                    Element::new(ElementKind::Constructor, &decl.name).enclosed_by(qualified);
                element.parameter_types = names;
                element.annotations = scope.annotations(&ctor.modifiers.annotations);
                elements.push(element);
            }
            let owner = format!("{}.{}", qualified, decl.name);
            scope.lower_locals(&ctor.locals, &owner, elements);
            class
                .constructors
                .push(ConstructorInfo::new(outer.iter().cloned().chain(declared).collect()));
        }
        match decl.kind {
            ClassKind::Class if decl.constructors.is_empty() => {
                class.constructors.push(ConstructorInfo::new(outer.into_iter().collect()));
            }
            ClassKind::Record => {
                let canonical: Vec<TypeRef> =
                    class.fields.iter().take(decl.record_components.len()).map(|f| f.ty.clone()).collect();
                if !class.constructors.iter().any(|c| c.parameters == canonical) {
                    class.constructors.push(ConstructorInfo::new(canonical));
                }
            }
            ClassKind::Enum => {
                let mut values = MethodInfo::new("values", TypeRef::array(TypeRef::class(qualified)), Vec::new());
                values.modifiers.is_static = true;
                let mut value_of =
                    MethodInfo::new("valueOf", TypeRef::class(qualified), vec![TypeRef::class(STRING)]);
                value_of.modifiers.is_static = true;
                class.methods.push(values);
                class.methods.push(value_of);
            }
            _ => {}
        }

        for method in &decl.methods {
            let scope = scope.with_vars(&method.type_params);
            let parameters: Vec<TypeRef> =
                method.parameters.iter().map(|t| scope.resolve_type(t)).collect();
            if !method.modifiers.annotations.is_empty() {
                let names: Vec<String> = parameters.iter().map(TypeRef::canonical_name).collect();
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                let mut element = Element::method(qualified, &method.name, &names);
                element.modifiers.is_static = method.modifiers.flags.is_static;
                element.annotations = scope.annotations(&method.modifiers.annotations);
                elements.push(element);
            }
            let owner = format!("{}.{}", qualified, method.name);
            scope.lower_locals(&method.locals, &owner, elements);
            let mut info = MethodInfo::new(&method.name, scope.resolve_type(&method.return_type), parameters);
            info.modifiers.is_static = method.modifiers.flags.is_static;
            class.methods.push(info);
        }

        class
    }
}

fn collect<'u>(
    unit: &'u Unit,
    decl: &'u TypeDecl,
    chain: Vec<String>,
    outer_kind: Option<ClassKind>,
    out: &mut Vec<Entry<'u>>,
) {
    for nested in &decl.nested {
        let mut nested_chain = vec![format!("{}.{}", chain[0], nested.name)];
        nested_chain.extend(chain.iter().cloned());
        collect(unit, nested, nested_chain, Some(decl.kind), out);
    }
    out.push(Entry {
        unit,
        decl,
        chain,
        outer_kind,
    });
}

fn element_kind(kind: ClassKind) -> ElementKind {
    match kind {
        ClassKind::Class => ElementKind::Class,
        ClassKind::Interface => ElementKind::Interface,
        ClassKind::Enum => ElementKind::Enum,
        ClassKind::Record => ElementKind::Record,
        ClassKind::Annotation => ElementKind::AnnotationType,
    }
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}

/// Name-resolution context: a compilation unit, the enclosing type chain and
/// the type variables in scope.
struct Scope<'a, 'u> {
    lowering: &'a Lowering<'u>,
    unit: &'a Unit,
    chain: &'a [String],
    type_vars: Vec<String>,
}

impl Scope<'_, '_> {
    fn with_vars(&self, vars: &[String]) -> Self {
        let mut type_vars = self.type_vars.clone();
        type_vars.extend(vars.iter().cloned());
        Scope {
            lowering: self.lowering,
            unit: self.unit,
            chain: self.chain,
            type_vars,
        }
    }

    fn resolve_name(&self, name: &str) -> String {
        if is_primitive(name) {
            return name.to_string();
        }
        let known = &self.lowering.known;
        let (head, rest) = match name.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };
        let join = |base: &str| match rest {
            Some(rest) => format!("{}.{}", base, rest),
            None => base.to_string(),
        };

        for owner in self.chain {
            if owner.rsplit('.').next() == Some(head) {
                return join(owner);
            }
            let member = format!("{}.{}", owner, head);
            if known.contains(&member) {
                return join(&member);
            }
        }
        let imports = self.unit.imports.iter().filter(|i| !i.is_static);
        for import in imports.clone().filter(|i| !i.on_demand) {
            if import.path.rsplit('.').next() == Some(head) {
                return join(&import.path);
            }
        }
        let local = qualify(&self.unit.package, head);
        if known.contains(&local) {
            return join(&local);
        }
        for import in imports.filter(|i| i.on_demand) {
            let candidate = format!("{}.{}", import.path, head);
            if known.contains(&candidate) {
                return join(&candidate);
            }
        }
        let lang = format!("java.lang.{}", head);
        if known.contains(&lang) || JAVA_LANG.contains(&head) {
            return join(&lang);
        }
        if rest.is_some() {
            // already qualified
            return name.to_string();
        }
        // not among the parsed sources: assume the unit's own package
        tracing::debug!(name, path = %self.unit.path.display(), "unresolved type name");
        local
    }

    fn resolve_type(&self, ty: &TypeRef) -> TypeRef {
        match ty {
            TypeRef::Class { name, args } => {
                if args.is_empty() && self.type_vars.iter().any(|v| v == name) {
                    return TypeRef::Variable(name.clone());
                }
                TypeRef::generic(
                    self.resolve_name(name),
                    args.iter().map(|a| self.resolve_type(a)).collect(),
                )
            }
            TypeRef::Array(component) => TypeRef::array(self.resolve_type(component)),
            other => other.clone(),
        }
    }

    /// Fold a constant string expression.
    fn eval(&self, value: &RawValue, depth: usize) -> Option<String> {
        match value {
            RawValue::String(s) => Some(s.clone()),
            RawValue::Reference(name) => self.reference(name, depth),
            RawValue::Concat(parts) => parts
                .iter()
                .map(|p| match p {
                    RawValue::Other(literal) if literal.parse::<i64>().is_ok() => {
                        Some(literal.clone())
                    }
                    _ => self.eval(p, depth),
                })
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.concat()),
            _ => None,
        }
    }

    fn reference(&self, name: &str, depth: usize) -> Option<String> {
        let lowering = self.lowering;
        match name.rsplit_once('.') {
            Some((owner, field)) => lowering.constant(&self.resolve_name(owner), field, depth),
            None => {
                if let Some(value) = self
                    .chain
                    .iter()
                    .find_map(|owner| lowering.constant(owner, name, depth))
                {
                    return Some(value);
                }
                self.unit
                    .imports
                    .iter()
                    .filter(|i| i.is_static)
                    .find_map(|import| {
                        if import.on_demand {
                            lowering.constant(&import.path, name, depth)
                        } else {
                            let (owner, member) = import.path.rsplit_once('.')?;
                            (member == name)
                                .then(|| lowering.constant(owner, name, depth))
                                .flatten()
                        }
                    })
            }
        }
    }

    fn annotations(&self, raw: &[RawAnnotation]) -> Vec<AnnotationInstance> {
        raw.iter().map(|a| self.annotation(a)).collect()
    }

    fn annotation(&self, raw: &RawAnnotation) -> AnnotationInstance {
        let mut instance = AnnotationInstance::new(self.resolve_name(&raw.name));
        for (key, value) in &raw.arguments {
            instance.values.insert(key.clone(), self.annotation_value(value));
        }
        instance
    }

    fn annotation_value(&self, raw: &RawValue) -> AnnotationValue {
        match raw {
            RawValue::String(s) => AnnotationValue::String(s.clone()),
            RawValue::ClassLiteral(ty) => {
                AnnotationValue::Class(self.resolve_type(ty).canonical_name())
            }
            RawValue::Reference(_) | RawValue::Concat(_) => match self.eval(raw, 0) {
                Some(value) => AnnotationValue::String(value),
                None => AnnotationValue::Other(describe(raw)),
            },
            RawValue::Array(items) => {
                AnnotationValue::Array(items.iter().map(|v| self.annotation_value(v)).collect())
            }
            RawValue::Annotation(a) => AnnotationValue::Annotation(self.annotation(a)),
            RawValue::Other(text) => AnnotationValue::Other(text.clone()),
        }
    }

    fn lower_locals(
        &self,
        locals: &[LocalDecl],
        owner: &str,
        elements: &mut Vec<Element>,
    ) {
        for local in locals {
            let mut element = Element::new(ElementKind::LocalVariable, &local.name).enclosed_by(owner);
            element.modifiers.is_final = local.modifiers.flags.is_final;
            element.declared_type = Some(self.resolve_type(&local.ty).canonical_name());
            element.annotations = self.annotations(&local.modifiers.annotations);
            elements.push(element);
        }
    }
}

fn describe(raw: &RawValue) -> String {
    match raw {
        RawValue::String(s) => format!("{:?}", s),
        RawValue::Reference(name) => name.clone(),
        RawValue::Concat(parts) => parts.iter().map(describe).collect::<Vec<_>>().join(" + "),
        RawValue::ClassLiteral(ty) => format!("{}.class", ty),
        RawValue::Array(items) => {
            format!("{{{}}}", items.iter().map(describe).collect::<Vec<_>>().join(", "))
        }
        RawValue::Annotation(a) => format!("@{}", a.name),
        RawValue::Other(text) => text.clone(),
    }
}
