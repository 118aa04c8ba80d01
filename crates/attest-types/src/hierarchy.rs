//! Supertype traversal over a [`TypeSystem`].
//!
//! Unknown supertypes end their branch of the walk; a class whose parent was
//! not loaded still exposes its own members.

use std::collections::HashSet;

use crate::{ClassInfo, FieldInfo, MethodInfo, TypeRef, TypeSystem};

/// Superclass chain from `class` up to the root, `class` first.
pub fn superclasses<'a>(types: &'a dyn TypeSystem, class: &'a ClassInfo) -> Vec<&'a ClassInfo> {
    let mut chain = vec![class];
    let mut seen = HashSet::from([class.name.as_str()]);
    let mut current = class;
    while let Some(name) = current.superclass_name() {
        let Some(parent) = types.class(&name) else {
            tracing::debug!(class = %current.name, superclass = %name, "superclass not in type system");
            break;
        };
        if !seen.insert(parent.name.as_str()) {
            break;
        }
        chain.push(parent);
        current = parent;
    }
    chain
}

/// Every interface `class` implements, directly or through supertypes, breadth first.
pub fn all_interfaces<'a>(types: &'a dyn TypeSystem, class: &'a ClassInfo) -> Vec<&'a ClassInfo> {
    let mut result = Vec::new();
    let mut seen = HashSet::new();
    let mut queue: Vec<&ClassInfo> = superclasses(types, class);
    let mut i = 0;
    while i < queue.len() {
        let current = queue[i];
        i += 1;
        for iface in &current.interfaces {
            let name = iface.canonical_name();
            if !seen.insert(name.clone()) {
                continue;
            }
            match types.class(&name) {
                Some(info) => {
                    result.push(info);
                    queue.push(info);
                }
                None => tracing::debug!(class = %current.name, interface = %name, "interface not in type system"),
            }
        }
    }
    result
}

/// True when `class` is `target` or inherits from it, through superclasses or interfaces.
pub fn implements(types: &dyn TypeSystem, class: &ClassInfo, target: &str) -> bool {
    class.name == target
        || superclasses(types, class).iter().any(|c| c.name == target)
        || all_interfaces(types, class).iter().any(|c| c.name == target)
}

/// Supertypes named in the hierarchy of `class` that `types` cannot load, in
/// walk order. When non-empty, a negative [`implements`] is inconclusive.
pub fn unresolved_supertypes(types: &dyn TypeSystem, class: &ClassInfo) -> Vec<String> {
    let mut owners = superclasses(types, class);
    owners.extend(all_interfaces(types, class));
    let mut missing = Vec::new();
    for owner in owners {
        let named = owner
            .superclass_name()
            .into_iter()
            .chain(owner.interfaces.iter().map(TypeRef::canonical_name));
        for name in named {
            if types.class(&name).is_none() && !missing.contains(&name) {
                missing.push(name);
            }
        }
    }
    missing
}

/// Fields visible in `class`, supertypes first: for each level, superclass
/// fields, then interface constants, then the level's own fields.
pub fn fields_top_down<'a>(
    types: &'a dyn TypeSystem,
    class: &'a ClassInfo,
) -> Vec<(&'a ClassInfo, &'a FieldInfo)> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    collect_fields(types, class, &mut visited, &mut out);
    out
}

fn collect_fields<'a>(
    types: &'a dyn TypeSystem,
    class: &'a ClassInfo,
    visited: &mut HashSet<&'a str>,
    out: &mut Vec<(&'a ClassInfo, &'a FieldInfo)>,
) {
    if !visited.insert(class.name.as_str()) {
        return;
    }
    if let Some(parent) = class.superclass_name().and_then(|n| types.class(&n)) {
        collect_fields(types, parent, visited, out);
    }
    for iface in &class.interfaces {
        if let Some(info) = types.class(&iface.canonical_name()) {
            collect_fields(types, info, visited, out);
        }
    }
    out.extend(class.fields.iter().map(|f| (class, f)));
}

/// Methods declared by `class` and every supertype, `class` first.
pub fn methods<'a>(
    types: &'a dyn TypeSystem,
    class: &'a ClassInfo,
) -> impl Iterator<Item = (&'a ClassInfo, &'a MethodInfo)> {
    let mut owners = superclasses(types, class);
    owners.extend(all_interfaces(types, class));
    owners
        .into_iter()
        .flat_map(|owner| owner.methods.iter().map(move |m| (owner, m)))
}
