//! Type-system view and structural resolution.
//!
//! The verifier never talks to a runtime directly. It asks a [`TypeSystem`]:
//! load a class by canonical name, enumerate its declared members, list the
//! classes of a package. [`TypeIndex`] is the in-memory implementation,
//! populated by a front-end (see `attest-java`) or from a JSON type model, and
//! seeded with the well-known JDK types the checks depend on.
//!
//! On top of that view:
//! - `hierarchy` walks supertypes (top-down field order, transitive interfaces)
//! - [`Resolver`] answers "does this constructor/field/method exist?"

mod error;
pub mod hierarchy;
mod index;
mod model;
mod resolve;

pub use error::{ModelError, ResolveError};
pub use index::{TypeIndex, TypeModel, TypeSystem};
pub use model::{
    ClassInfo, ClassKind, ConstructorInfo, FieldInfo, MethodInfo, Modifiers, TypeRef,
    is_primitive,
};
pub use resolve::Resolver;

/// Canonical name of the root class.
pub const OBJECT: &str = "java.lang.Object";
