//! Annotation harvesting: elements in, deduplicated facts out.
//!
//! For every element the harvester:
//! 1. unwraps repeatable containers (`@CheckField.List`) into plain instances,
//!    then appends the direct instances, processing one flat list
//! 2. reads each instance's declared attributes
//! 3. fills one missing short-form attribute from the element's own constant value
//! 4. rejects instances still missing a required attribute
//! 5. builds the fact and inserts it into the set
//!
//! A configuration error discards the facts of that element only.

use std::collections::BTreeMap;

use attest_facts_core::{
    AnnotationKind, ConstructorFact, Fact, FactKind, FactSet, FieldFact, FieldsFact, KeyFact,
    KeysFact, MethodFact, ResourceBundleFact, SerializableFact,
};

use crate::{
    AnnotationInstance, AnnotationValue, FactStore, HarvestError, SourceElement, StoreError,
    annotated_element,
};

/// Harvest configuration.
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// When non-empty, only annotations declared in one of these packages are recognized.
    pub annotation_packages: Vec<String>,
}

/// Result of a harvest pass.
#[derive(Debug, Default)]
pub struct HarvestOutcome {
    pub facts: FactSet,
    /// One entry per element whose harvesting was aborted.
    pub errors: Vec<HarvestError>,
    /// Number of elements that carried at least one recognized annotation.
    pub annotated_elements: usize,
    /// Set when [`Harvester::harvest_to_store`] could not persist the facts.
    pub store_error: Option<StoreError>,
}

impl HarvestOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.store_error.is_none()
    }
}

/// Turns annotated elements into facts.
#[derive(Debug, Clone, Default)]
pub struct Harvester {
    options: HarvestOptions,
}

impl Harvester {
    pub fn new(options: HarvestOptions) -> Self {
        Self { options }
    }

    /// Harvest every element. Errors are collected per element, never fatal.
    pub fn harvest<'a, E>(&self, elements: impl IntoIterator<Item = &'a E>) -> HarvestOutcome
    where
        E: SourceElement + 'a,
    {
        let mut outcome = HarvestOutcome::default();
        for element in elements {
            let annotations = self.collect_annotations(element);
            if annotations.is_empty() {
                continue;
            }
            outcome.annotated_elements += 1;
            match build_facts(&annotations, element) {
                Ok(facts) => outcome.facts.extend(facts),
                Err(e) => {
                    tracing::error!(error = %e, "annotation misuse");
                    outcome.errors.push(e);
                }
            }
        }
        tracing::info!(
            facts = outcome.facts.len(),
            elements = outcome.annotated_elements,
            errors = outcome.errors.len(),
            "harvest complete"
        );
        outcome
    }

    /// Harvest and persist. A store failure is logged and carried in
    /// [`HarvestOutcome::store_error`], never returned: harvesting must not
    /// break the surrounding build.
    pub fn harvest_to_store<'a, E>(
        &self,
        elements: impl IntoIterator<Item = &'a E>,
        store: &FactStore,
    ) -> HarvestOutcome
    where
        E: SourceElement + 'a,
    {
        let mut outcome = self.harvest(elements);
        if let Err(e) = store.write(&outcome.facts) {
            tracing::warn!(path = %store.path().display(), error = %e, "failed to persist facts");
            outcome.store_error = Some(e);
        }
        outcome
    }

    /// Facts of a single element.
    pub fn harvest_element<E: SourceElement + ?Sized>(
        &self,
        element: &E,
    ) -> Result<Vec<Fact>, HarvestError> {
        build_facts(&self.collect_annotations(element), element)
    }

    /// Container contents first, then direct instances.
    fn collect_annotations<'e, E: SourceElement + ?Sized>(
        &self,
        element: &'e E,
    ) -> Vec<(AnnotationKind, &'e AnnotationInstance)> {
        let mut contained = Vec::new();
        let mut direct = Vec::new();
        for annotation in element.annotations() {
            match self.recognize(&annotation.type_name) {
                Some((kind, true)) => {
                    let items = match annotation.values.get("value") {
                        Some(AnnotationValue::Array(items)) => items.as_slice(),
                        Some(single) => std::slice::from_ref(single),
                        None => &[],
                    };
                    for item in items {
                        if let AnnotationValue::Annotation(inner) = item
                            && self.recognize(&inner.type_name) == Some((kind, false))
                        {
                            contained.push((kind, inner));
                        }
                    }
                }
                Some((kind, false)) => direct.push((kind, annotation)),
                None => {}
            }
        }
        contained.extend(direct);
        contained
    }

    /// Map an annotation type name to its kind and whether it is the container form.
    fn recognize(&self, type_name: &str) -> Option<(AnnotationKind, bool)> {
        let (path, container) = match type_name.strip_suffix(".List") {
            Some(path) => (path, true),
            None => (type_name, false),
        };
        let (package, simple) = path.rsplit_once('.').unwrap_or(("", path));
        let kind = AnnotationKind::from_simple_name(simple)?;
        if !self.options.annotation_packages.is_empty()
            && !self.options.annotation_packages.iter().any(|p| p == package)
        {
            return None;
        }
        Some((kind, container))
    }
}

fn build_facts<E: SourceElement + ?Sized>(
    annotations: &[(AnnotationKind, &AnnotationInstance)],
    element: &E,
) -> Result<Vec<Fact>, HarvestError> {
    annotations
        .iter()
        .map(|(kind, annotation)| build_fact(*kind, annotation, element))
        .collect()
}

fn build_fact<E: SourceElement + ?Sized>(
    kind: AnnotationKind,
    annotation: &AnnotationInstance,
    element: &E,
) -> Result<Fact, HarvestError> {
    let mut attrs = Attributes {
        kind,
        element: annotated_element(element),
        values: annotation.values.clone(),
    };
    attrs.apply_short_form(element);
    attrs.check_required()?;

    let payload = match kind {
        AnnotationKind::Constructor => FactKind::Constructor(ConstructorFact {
            target_class: attrs.class("targetClass")?,
            parameters: attrs.optional_class_array("parameters")?.unwrap_or_default(),
        }),
        AnnotationKind::Field => FactKind::Field(FieldFact {
            target_class: attrs.class("targetClass")?,
            value: attrs.string("value")?,
            field_type: attrs.optional_class("type")?,
        }),
        AnnotationKind::Fields => FactKind::Fields(FieldsFact {
            target_class: attrs.class("targetClass")?,
            values: attrs.string_array("values")?,
        }),
        AnnotationKind::Method => FactKind::Method(MethodFact {
            target_class: attrs.class("targetClass")?,
            value: attrs.string("value")?,
            return_type: attrs.optional_class("returnType")?,
            parameters: attrs.optional_class_array("parameters")?,
        }),
        AnnotationKind::Key => FactKind::Key(KeyFact {
            base_name: attrs.string("baseName")?,
            value: attrs.string("value")?,
            locale: attrs.optional_string("locale")?,
        }),
        AnnotationKind::Keys => FactKind::Keys(KeysFact {
            base_name: attrs.string("baseName")?,
            values: attrs.string_array("values")?,
            locale: attrs.optional_string("locale")?,
        }),
        AnnotationKind::ResourceBundle => FactKind::ResourceBundle(ResourceBundleFact {
            base_name: attrs.string("baseName")?,
            locales: attrs.string_array("locales")?.into_iter().collect(),
        }),
        AnnotationKind::Serializable => FactKind::Serializable(SerializableFact {
            target_package: attrs
                .optional_string("targetPackage")?
                .filter(|p| !p.is_empty()),
            excludes: attrs
                .optional_class_array("excludes")?
                .unwrap_or_default()
                .into_iter()
                .collect(),
        }),
    };

    let fact = Fact {
        annotated_element: attrs.element.clone(),
        message: attrs.optional_string("message")?,
        kind: payload,
    };
    tracing::debug!(element = %fact.annotated_element, annotation = %kind, "harvested fact");
    Ok(fact)
}

/// Declared attributes of one annotation instance, with typed accessors.
struct Attributes {
    kind: AnnotationKind,
    element: String,
    values: BTreeMap<String, AnnotationValue>,
}

impl Attributes {
    /// Fill the first missing short-form attribute from a string constant element.
    fn apply_short_form<E: SourceElement + ?Sized>(&mut self, element: &E) {
        if !element.is_string_constant() {
            return;
        }
        let Some(constant) = element.constant_value() else {
            return;
        };
        if let Some(attr) = self
            .kind
            .short_form_attributes()
            .iter()
            .find(|attr| !self.values.contains_key(**attr))
        {
            self.values
                .insert(attr.to_string(), AnnotationValue::String(constant.to_string()));
        }
    }

    fn check_required(&self) -> Result<(), HarvestError> {
        match self
            .kind
            .required_attributes()
            .iter()
            .find(|attr| !self.values.contains_key(**attr))
        {
            Some(attr) => Err(self.missing(*attr)),
            None => Ok(()),
        }
    }

    fn missing(&self, attribute: &'static str) -> HarvestError {
        HarvestError::MissingAttribute {
            annotation: self.kind.simple_name(),
            attribute,
            element: self.element.clone(),
        }
    }

    fn invalid(&self, attribute: &'static str, expected: &'static str) -> HarvestError {
        HarvestError::InvalidAttribute {
            annotation: self.kind.simple_name(),
            attribute,
            expected,
            element: self.element.clone(),
        }
    }

    fn string(&self, attribute: &'static str) -> Result<String, HarvestError> {
        self.optional_string(attribute)?
            .ok_or_else(|| self.missing(attribute))
    }

    fn optional_string(&self, attribute: &'static str) -> Result<Option<String>, HarvestError> {
        match self.values.get(attribute) {
            None => Ok(None),
            Some(AnnotationValue::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(attribute, "a string")),
        }
    }

    fn class(&self, attribute: &'static str) -> Result<String, HarvestError> {
        self.optional_class(attribute)?
            .ok_or_else(|| self.missing(attribute))
    }

    fn optional_class(&self, attribute: &'static str) -> Result<Option<String>, HarvestError> {
        match self.values.get(attribute) {
            None => Ok(None),
            Some(value) => class_name(value)
                .map(Some)
                .ok_or_else(|| self.invalid(attribute, "a class literal")),
        }
    }

    fn string_array(&self, attribute: &'static str) -> Result<Vec<String>, HarvestError> {
        let Some(value) = self.values.get(attribute) else {
            return Err(self.missing(attribute));
        };
        array_items(value)
            .iter()
            .map(|item| match item {
                AnnotationValue::String(s) => Ok(s.clone()),
                _ => Err(self.invalid(attribute, "an array of strings")),
            })
            .collect()
    }

    fn optional_class_array(
        &self,
        attribute: &'static str,
    ) -> Result<Option<Vec<String>>, HarvestError> {
        let Some(value) = self.values.get(attribute) else {
            return Ok(None);
        };
        array_items(value)
            .iter()
            .map(|item| {
                class_name(item)
                    .ok_or_else(|| self.invalid(attribute, "an array of class literals"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

/// Single values stand in for one-element arrays, as in Java annotation syntax.
fn array_items(value: &AnnotationValue) -> &[AnnotationValue] {
    match value {
        AnnotationValue::Array(items) => items,
        single => std::slice::from_ref(single),
    }
}

fn class_name(value: &AnnotationValue) -> Option<String> {
    match value {
        AnnotationValue::Class(name) | AnnotationValue::String(name) => Some(name.clone()),
        _ => None,
    }
}
