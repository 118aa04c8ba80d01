//! In-memory type system.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ClassInfo, ModelError};

/// Reflective view of a type system: load a class by canonical name, list a package.
pub trait TypeSystem: Send + Sync {
    fn class(&self, name: &str) -> Option<&ClassInfo>;

    /// Classes declared in `package` or any of its sub-packages, ordered by name.
    /// The empty package name selects every class.
    fn classes_in_package(&self, package: &str) -> Vec<&ClassInfo>;
}

/// Serialized form of a [`TypeIndex`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeModel {
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
}

const BUILTINS: &str = include_str!("builtins.json");

/// A [`TypeSystem`] held in memory.
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    classes: BTreeMap<String, ClassInfo>,
    /// Names still served by the embedded JDK subset; never listed by package scans.
    builtins: BTreeSet<String>,
}

impl TypeIndex {
    /// An empty index, without even `java.lang.Object`.
    pub fn new() -> Self {
        Self::default()
    }

    /// An index seeded with the well-known JDK types.
    pub fn with_builtins() -> Self {
        let mut index = Self::new();
        match serde_json::from_str::<TypeModel>(BUILTINS) {
            Ok(model) => {
                for class in model.classes {
                    let name = class.name.clone();
                    index.insert(class);
                    index.builtins.insert(name);
                }
            }
            // Only reachable if the embedded model is edited into an invalid state.
            Err(e) => tracing::error!(error = %e, "embedded JDK type model is invalid"),
        }
        index
    }

    /// Add or replace a class. Replacing a builtin makes it a regular class.
    pub fn insert(&mut self, mut class: ClassInfo) {
        class.bind_type_params();
        self.builtins.remove(&class.name);
        self.classes.insert(class.name.clone(), class);
    }

    pub fn extend(&mut self, classes: impl IntoIterator<Item = ClassInfo>) {
        for class in classes {
            self.insert(class);
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }

    /// Parse a JSON type model and add its classes on top of the builtins.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: TypeModel = serde_json::from_str(json)?;
        let mut index = Self::with_builtins();
        index.extend(model.classes);
        Ok(index)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), classes = index.len(), "loaded type model");
        Ok(index)
    }

    /// The non-builtin classes as a JSON model.
    pub fn to_json(&self) -> Result<String, ModelError> {
        let model = TypeModel {
            classes: self
                .classes
                .values()
                .filter(|c| !self.builtins.contains(&c.name))
                .cloned()
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&model)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let io = |source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        std::fs::write(path, self.to_json()?).map_err(io)
    }
}

impl TypeSystem for TypeIndex {
    fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    fn classes_in_package(&self, package: &str) -> Vec<&ClassInfo> {
        self.classes
            .values()
            .filter(|c| !self.builtins.contains(&c.name))
            .filter(|c| {
                let pkg = c.package_name();
                package.is_empty()
                    || pkg == package
                    || pkg
                        .strip_prefix(package)
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassKind, FieldInfo, TypeRef};

    #[test]
    fn test_builtins_load() {
        let index = TypeIndex::with_builtins();
        assert!(index.class("java.lang.Object").is_some());
        assert!(index.class("java.lang.String").is_some());
        let list = index.class("java.util.List").unwrap();
        assert!(list.is_interface());
        assert_eq!(list.interfaces[0].type_arguments(), &[TypeRef::Variable("E".into())]);
    }

    #[test]
    fn test_classes_in_package_includes_subpackages() {
        let mut index = TypeIndex::with_builtins();
        index.insert(ClassInfo::new("com.example.model.A", ClassKind::Class));
        index.insert(ClassInfo::new("com.example.model.sub.B", ClassKind::Class));
        index.insert(ClassInfo::new("com.example.modelling.C", ClassKind::Class));

        let names: Vec<_> = index
            .classes_in_package("com.example.model")
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["com.example.model.A", "com.example.model.sub.B"]);
        // builtins never show up in scans
        assert_eq!(index.classes_in_package("").len(), 3);
        assert!(index.classes_in_package("java.util").is_empty());
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model").join("types.json");

        let mut index = TypeIndex::with_builtins();
        index.insert(
            ClassInfo::new("a.Dto", ClassKind::Class)
                .with_field(FieldInfo::new("name", TypeRef::class("java.lang.String"))),
        );
        index.save(&path).unwrap();

        let loaded = TypeIndex::load(&path).unwrap();
        assert_eq!(loaded.class("a.Dto"), index.class("a.Dto"));
        assert!(loaded.class("java.lang.Object").is_some());
    }

    #[test]
    fn test_malformed_model() {
        assert!(matches!(TypeIndex::from_json("{"), Err(ModelError::Json(_))));
        let bad_type = r#"{ "classes": [{ "name": "a.B", "superclass": "a.<" }] }"#;
        assert!(TypeIndex::from_json(bad_type).is_err());
    }
}
