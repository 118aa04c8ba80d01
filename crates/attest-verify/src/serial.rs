//! Serializability of a class and everything reachable from its fields.
//!
//! The walk follows non-static, non-transient fields through the whole
//! hierarchy. Interface-typed fields cannot be verified statically: they only
//! produce a warning, but the element types of iterable and map-like
//! interfaces are checked like concrete fields. Array components are checked
//! the same way.
//!
//! Cycle prevention uses a visited set that belongs to one root check and is
//! threaded through every call. When a field's type is already being checked
//! further up, the current class stops and returns what it has found so far.
//!
//! Types the model does not know, as a field type or as a missing supertype of
//! a class lacking the marker, are reported as warnings, never as failures.

use std::collections::HashSet;

use attest_types::hierarchy;
use attest_types::{ClassInfo, ClassKind, TypeRef, TypeSystem};

/// Canonical names the check is built on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPolicy {
    /// Marker interface a serializable class implements.
    pub marker: String,
    /// Containers whose single type argument is checked.
    pub iterable: String,
    /// Containers whose key and value type arguments are checked.
    pub map: String,
}

impl Default for SerialPolicy {
    fn default() -> Self {
        Self {
            marker: "java.io.Serializable".to_string(),
            iterable: "java.lang.Iterable".to_string(),
            map: "java.util.Map".to_string(),
        }
    }
}

/// Failures and warnings of one root class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerialFindings {
    pub failures: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct SerialChecker<'a> {
    types: &'a dyn TypeSystem,
    policy: &'a SerialPolicy,
}

impl<'a> SerialChecker<'a> {
    pub fn new(types: &'a dyn TypeSystem, policy: &'a SerialPolicy) -> Self {
        Self { types, policy }
    }

    /// Check `class` with a fresh visited set.
    pub fn check(&self, class: &ClassInfo) -> SerialFindings {
        let mut walk = Walk {
            types: self.types,
            policy: self.policy,
            warnings: Vec::new(),
        };
        let mut visited = HashSet::from([class.name.clone()]);
        let failures = walk.class(class, &mut visited);
        SerialFindings {
            failures,
            warnings: walk.warnings,
        }
    }
}

struct Walk<'a> {
    types: &'a dyn TypeSystem,
    policy: &'a SerialPolicy,
    warnings: Vec<String>,
}

impl Walk<'_> {
    fn warn(&mut self, warning: String) {
        tracing::warn!("{}", warning);
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    /// Failures of a type that appears as a field or element type.
    fn type_ref(&mut self, ty: &TypeRef, visited: &mut HashSet<String>) -> Vec<String> {
        match ty {
            TypeRef::Primitive(_) => Vec::new(),
            TypeRef::Array(component) => self.type_ref(component, visited),
            // erased to Object, as reflection would report it
            TypeRef::Variable(_) | TypeRef::Wildcard | TypeRef::Class { .. } => {
                let name = ty.canonical_name();
                let types = self.types;
                match types.class(&name) {
                    Some(info) => self.class(info, visited),
                    None => {
                        self.warn(format!(
                            "{} -> Not found in the type model, serialization cannot be verified",
                            name
                        ));
                        Vec::new()
                    }
                }
            }
        }
    }

    fn class(&mut self, class: &ClassInfo, visited: &mut HashSet<String>) -> Vec<String> {
        if class.kind == ClassKind::Enum {
            return Vec::new();
        }
        if !hierarchy::implements(self.types, class, &self.policy.marker) {
            let unresolved = hierarchy::unresolved_supertypes(self.types, class);
            if !unresolved.is_empty() {
                self.warn(format!(
                    "{} -> Supertypes {} Not found in the type model, serialization cannot be verified",
                    class.name,
                    unresolved.join(", ")
                ));
                return Vec::new();
            }
            return vec![format!("{} -> Not implements {}", class.name, self.policy.marker)];
        }
        self.fields(class, visited)
    }

    fn fields(&mut self, class: &ClassInfo, visited: &mut HashSet<String>) -> Vec<String> {
        let mut failures = Vec::new();
        let types = self.types;
        for (_, field) in hierarchy::fields_top_down(types, class) {
            if field.modifiers.is_static || field.modifiers.is_transient {
                continue;
            }
            let key = field.ty.canonical_name();
            if visited.contains(&key) {
                return failures;
            }
            visited.insert(key.clone());

            let interface = field
                .ty
                .class_name()
                .and_then(|name| types.class(name))
                .filter(|info| info.is_interface());
            match interface {
                Some(info) => {
                    if !hierarchy::implements(types, info, &self.policy.marker) {
                        self.warn(format!(
                            "{} -> {} is defined with interface type {} and can contain unserializable implementation class",
                            class.name, field.name, info.name
                        ));
                    }
                    let mut positions = Vec::new();
                    if hierarchy::implements(types, info, &self.policy.iterable) {
                        positions.push(0);
                    }
                    if hierarchy::implements(types, info, &self.policy.map) {
                        positions.extend([0, 1]);
                    }
                    positions.dedup();
                    for index in positions {
                        if let Some(argument) = self.type_argument(class, &field.name, &field.ty, index) {
                            let found = self.type_ref(&argument, visited);
                            failures.extend(prefixed(class, &field.name, found));
                        }
                    }
                }
                None => {
                    let found = self.type_ref(&field.ty, visited);
                    failures.extend(prefixed(class, &field.name, found));
                }
            }

            visited.remove(&key);
        }
        failures
    }

    /// The `index`th type argument of a container field, raw. `None` (with a
    /// warning) when the argument is missing or not a concrete type.
    fn type_argument(
        &mut self,
        class: &ClassInfo,
        field: &str,
        ty: &TypeRef,
        index: usize,
    ) -> Option<TypeRef> {
        match ty.type_arguments().get(index) {
            Some(TypeRef::Class { name, .. }) => Some(TypeRef::class(name.clone())),
            Some(array @ TypeRef::Array(_)) => Some(array.clone()),
            Some(primitive @ TypeRef::Primitive(_)) => Some(primitive.clone()),
            Some(TypeRef::Variable(_) | TypeRef::Wildcard) | None => {
                tracing::debug!(
                    class = %class.name,
                    field,
                    index,
                    arguments = ty.type_arguments().len(),
                    "generic argument not available"
                );
                self.warn(format!(
                    "{} -> {} has undefined generic type and can contain unserializable data",
                    class.name, field
                ));
                None
            }
        }
    }
}

fn prefixed(class: &ClassInfo, field: &str, failures: Vec<String>) -> impl Iterator<Item = String> {
    let prefix = format!("{} -> {}: ", class.name, field);
    failures.into_iter().map(move |f| format!("{}{}", prefix, f))
}
