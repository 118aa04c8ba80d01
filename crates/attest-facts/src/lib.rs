//! Annotation harvesting and fact storage.
//!
//! This crate provides:
//! - A compile-time element model ([`SourceElement`]) that any front-end can implement
//! - The [`Harvester`], which turns check annotations into a deduplicated [`FactSet`]
//! - The [`FactStore`], which persists that set between harvest and verification
//!
//! ```text
//! front-end (elements) -> Harvester -> FactSet -> FactStore -> verifier
//! ```

mod element;
mod error;
mod harvest;
mod store;

pub use element::{
    AnnotationInstance, AnnotationValue, Element, ElementKind, ElementModifiers, SourceElement,
    annotated_element,
};
pub use error::{HarvestError, StoreError};
pub use harvest::{HarvestOptions, HarvestOutcome, Harvester};
pub use store::{DEFAULT_STORE_PATH, FactStore};

// Re-export core types for convenience
pub use attest_facts_core::{
    AnnotationKind, ConstructorFact, Fact, FactKind, FactSet, FieldFact, FieldsFact, KeyFact,
    KeysFact, MethodFact, ResourceBundleFact, SerializableFact,
};
