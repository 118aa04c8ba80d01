//! Structural lookups: does a class expose this constructor, field or method?
//!
//! All comparisons are on canonical (erased) type names, exact and ordered.
//! A blank type constraint counts as absent.

use crate::hierarchy;
use crate::{ClassInfo, ConstructorInfo, FieldInfo, MethodInfo, ResolveError, TypeRef, TypeSystem};

pub struct Resolver<'a> {
    types: &'a dyn TypeSystem,
}

impl<'a> Resolver<'a> {
    pub fn new(types: &'a dyn TypeSystem) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &'a dyn TypeSystem {
        self.types
    }

    /// Load a class by canonical name; binary names (`Outer$Inner`) are accepted too.
    pub fn load(&self, name: &str) -> Result<&'a ClassInfo, ResolveError> {
        self.types
            .class(name)
            .or_else(|| name.contains('$').then(|| self.types.class(&name.replace('$', "."))).flatten())
            .ok_or_else(|| ResolveError::ClassNotFound(name.to_string()))
    }

    /// A constructor declared by `target` with exactly these parameter types.
    pub fn find_constructor(
        &self,
        target: &str,
        parameters: &[String],
    ) -> Result<&'a ConstructorInfo, ResolveError> {
        let class = self.load(target)?;
        class
            .constructors
            .iter()
            .find(|c| parameters_match(parameters, &c.parameters))
            .ok_or_else(|| no_match(class))
    }

    /// The first field named `name` in the hierarchy of `target`, supertypes first.
    pub fn find_field(
        &self,
        target: &str,
        name: &str,
        field_type: Option<&str>,
    ) -> Result<(&'a ClassInfo, &'a FieldInfo), ResolveError> {
        let class = self.load(target)?;
        let field_type = constraint(field_type);
        hierarchy::fields_top_down(self.types, class)
            .into_iter()
            .find(|(_, f)| {
                f.name == name && field_type.is_none_or(|t| f.ty.canonical_name() == t)
            })
            .ok_or_else(|| no_match(class))
    }

    /// Names from `names` that no field in the hierarchy of `target` carries, in order.
    pub fn missing_fields(&self, target: &str, names: &[String]) -> Result<Vec<String>, ResolveError> {
        let class = self.load(target)?;
        let fields = hierarchy::fields_top_down(self.types, class);
        Ok(names
            .iter()
            .filter(|name| !fields.iter().any(|(_, f)| &f.name == *name))
            .cloned()
            .collect())
    }

    /// A method of `target` or its supertypes. `None` constraints match anything;
    /// `Some(&[])` requires a zero-argument method.
    pub fn find_method(
        &self,
        target: &str,
        name: &str,
        return_type: Option<&str>,
        parameters: Option<&[String]>,
    ) -> Result<(&'a ClassInfo, &'a MethodInfo), ResolveError> {
        let class = self.load(target)?;
        let return_type = constraint(return_type);
        hierarchy::methods(self.types, class)
            .find(|(_, m)| {
                m.name == name
                    && return_type.is_none_or(|t| m.return_type.canonical_name() == t)
                    && parameters.is_none_or(|p| parameters_match(p, &m.parameters))
            })
            .ok_or_else(|| no_match(class))
    }
}

fn constraint(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parameters_match(expected: &[String], actual: &[TypeRef]) -> bool {
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(e, a)| *e == a.canonical_name())
}

fn no_match(class: &ClassInfo) -> ResolveError {
    ResolveError::NoMatch {
        class: class.name.clone(),
    }
}
