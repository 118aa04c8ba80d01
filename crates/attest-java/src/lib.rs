//! Java source front-end.
//!
//! Parses `.java` files with tree-sitter and produces, without a JVM:
//! - the annotated program elements the harvester consumes
//!   (types, fields, enum constants, constructors, methods, local variables,
//!   and packages annotated in `package-info.java`)
//! - a [`TypeIndex`] of the declared classes, as reflection would see them
//!   (implicit default constructors, inner-class outer parameters, enum
//!   `values`/`valueOf`, record components)
//!
//! ```ignore
//! let project = JavaProject::load(Path::new("src/main/java"))?;
//! let outcome = Harvester::default().harvest(&project.elements);
//! ```

mod error;
mod lower;
mod syntax;

use std::path::{Path, PathBuf};

use attest_facts::Element;
use attest_types::TypeIndex;
use rayon::prelude::*;

pub use error::JavaError;

/// A set of parsed compilation units.
#[derive(Debug, Default)]
pub struct JavaSources {
    units: Vec<syntax::Unit>,
}

impl JavaSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Parse one compilation unit from memory.
    pub fn add_source(&mut self, path: impl Into<PathBuf>, source: &str) -> Result<(), JavaError> {
        let mut parser = syntax::new_parser()?;
        self.units.push(syntax::parse_unit(&mut parser, path.into(), source)?);
        Ok(())
    }

    pub fn add_file(&mut self, path: &Path) -> Result<(), JavaError> {
        let source = read(path)?;
        self.add_source(path, &source)
    }

    /// Parse every `.java` file under `root`, honoring ignore files. Returns the
    /// number of files added.
    pub fn add_dir(&mut self, root: &Path) -> Result<usize, JavaError> {
        let mut paths = Vec::new();
        for entry in ignore::WalkBuilder::new(root).hidden(false).build() {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file())
                && path.extension().is_some_and(|e| e == "java")
            {
                paths.push(path.to_path_buf());
            }
        }
        paths.sort();

        let units: Vec<syntax::Unit> = paths
            .par_iter()
            .map_init(syntax::new_parser, |parser, path| {
                let parser = parser
                    .as_mut()
                    .map_err(|e| JavaError::Grammar(e.to_string()))?;
                let source = read(path)?;
                syntax::parse_unit(parser, path.clone(), &source)
            })
            .collect::<Result<_, _>>()?;

        let added = units.len();
        tracing::debug!(root = %root.display(), files = added, "parsed java sources");
        self.units.extend(units);
        Ok(added)
    }

    /// Lower the sources on top of the well-known JDK types.
    pub fn analyze(&self) -> JavaProject {
        self.analyze_with(TypeIndex::with_builtins())
    }

    /// Lower the sources on top of `base`, e.g. a type model of dependencies.
    pub fn analyze_with(&self, mut base: TypeIndex) -> JavaProject {
        let lowering = lower::Lowering::new(&self.units, &base);
        let (elements, classes) = lowering.run();
        let declared = classes.len();
        base.extend(classes);
        tracing::info!(
            units = self.units.len(),
            classes = declared,
            annotated_elements = elements.len(),
            "analyzed java sources"
        );
        JavaProject {
            elements,
            types: base,
        }
    }
}

/// Annotated elements and the type model of a Java source tree.
#[derive(Debug)]
pub struct JavaProject {
    pub elements: Vec<Element>,
    pub types: TypeIndex,
}

impl JavaProject {
    /// Parse and analyze every `.java` file under `root`.
    pub fn load(root: &Path) -> Result<Self, JavaError> {
        let mut sources = JavaSources::new();
        sources.add_dir(root)?;
        Ok(sources.analyze())
    }
}

fn read(path: &Path) -> Result<String, JavaError> {
    std::fs::read_to_string(path).map_err(|source| JavaError::Io {
        path: path.to_path_buf(),
        source,
    })
}
