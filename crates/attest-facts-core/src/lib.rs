//! Core data types for attest facts.
//!
//! This crate defines the vocabulary shared by both phases of the pipeline:
//! - `attest-facts` harvests annotations into [`Fact`]s and persists them
//! - `attest-verify` reads them back and checks each one against a type view
//!
//! A fact is one normalized, immutable structural expectation. Facts compare
//! structurally, so a set of facts collapses duplicate annotations.

mod annotation;
mod fact;

pub use annotation::AnnotationKind;
pub use fact::{
    ConstructorFact, Fact, FactKind, FieldFact, FieldsFact, KeyFact, KeysFact, MethodFact,
    ResourceBundleFact, SerializableFact,
};

/// The harvested fact set. Ordered so that stores are byte-stable across runs.
pub type FactSet = std::collections::BTreeSet<Fact>;
