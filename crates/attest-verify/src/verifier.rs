//! Per-fact dispatch.
//!
//! Every fact yields exactly one [`CheckResult`]. Facts are independent, so
//! they are checked on the rayon pool unless configured otherwise. A non-blank
//! custom message replaces the generated diagnostic of a failed check.

use std::collections::BTreeMap;

use attest_bundles::{BundleError, BundleLoader, SyncOutcome, missing_keys, synchronize};
use attest_facts::{
    ConstructorFact, Fact, FactKind, FactSet, FactStore, FieldFact, FieldsFact, KeyFact, KeysFact,
    MethodFact, ResourceBundleFact, SerializableFact,
};
use attest_types::{ResolveError, Resolver, TypeSystem};
use rayon::prelude::*;

use crate::{AttestConfig, CheckResult, Outcome, Report, SerialChecker, SerialPolicy};

pub struct Verifier<'a> {
    types: &'a dyn TypeSystem,
    bundles: &'a dyn BundleLoader,
    policy: SerialPolicy,
    parallel: bool,
}

impl<'a> Verifier<'a> {
    pub fn new(types: &'a dyn TypeSystem, bundles: &'a dyn BundleLoader) -> Self {
        Self {
            types,
            bundles,
            policy: SerialPolicy::default(),
            parallel: true,
        }
    }

    pub fn from_config(
        types: &'a dyn TypeSystem,
        bundles: &'a dyn BundleLoader,
        config: &AttestConfig,
    ) -> Self {
        Self::new(types, bundles)
            .with_policy(config.serial_policy())
            .parallel(config.parallel())
    }

    pub fn with_policy(mut self, policy: SerialPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check every fact. Results come back in fact order.
    pub fn verify(&self, facts: &FactSet) -> Report {
        let results: Vec<CheckResult> = if self.parallel {
            facts.par_iter().map(|fact| self.check(fact)).collect()
        } else {
            facts.iter().map(|fact| self.check(fact)).collect()
        };
        let report = Report { results };
        tracing::info!(
            facts = facts.len(),
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            "verified facts"
        );
        report
    }

    /// Check the facts of `store`. A missing or unreadable store verifies nothing.
    pub fn verify_store(&self, store: &FactStore) -> Report {
        self.verify(&store.read())
    }

    /// Check a single fact.
    pub fn check(&self, fact: &Fact) -> CheckResult {
        tracing::debug!(
            annotation = fact.annotation().simple_name(),
            element = %fact.annotated_element,
            "checking fact"
        );
        let mut warnings = Vec::new();
        let outcome = match &fact.kind {
            FactKind::Constructor(f) => self.constructor(fact, f),
            FactKind::Field(f) => self.field(fact, f),
            FactKind::Fields(f) => self.fields(fact, f),
            FactKind::Method(f) => self.method(fact, f),
            FactKind::Key(f) => self.key(fact, f),
            FactKind::Keys(f) => self.keys(fact, f),
            FactKind::ResourceBundle(f) => self.resource_bundle(fact, f),
            FactKind::Serializable(f) => self.serializable(fact, f, &mut warnings),
        };
        let outcome = match (outcome, fact.custom_message()) {
            (Outcome::Failed { .. }, Some(custom)) => Outcome::Failed {
                message: custom.to_string(),
            },
            (outcome, _) => outcome,
        };
        CheckResult::new(fact, outcome).with_warnings(warnings)
    }

    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.types)
    }

    fn constructor(&self, fact: &Fact, f: &ConstructorFact) -> Outcome {
        match self.resolver().find_constructor(&f.target_class, &f.parameters) {
            Ok(_) => Outcome::Passed,
            Err(e) => {
                let wanted = if f.parameters.is_empty() {
                    "without parameters".to_string()
                } else {
                    format!("with parameters {}", f.parameters.join(", "))
                };
                failed(
                    format!(
                        "Annotation @CheckConstructor on type {} warns: Class {} has no accessible constructor {}",
                        fact.annotated_element, f.target_class, wanted
                    ),
                    &e,
                )
            }
        }
    }

    fn field(&self, fact: &Fact, f: &FieldFact) -> Outcome {
        match self
            .resolver()
            .find_field(&f.target_class, &f.value, f.field_type.as_deref())
        {
            Ok(_) => Outcome::Passed,
            Err(e) => {
                let field_type = f
                    .field_type
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| format!("{} ", t))
                    .unwrap_or_default();
                failed(
                    format!(
                        "Annotation @CheckField on field {} warns: Class {} has no accessible field {}{}",
                        fact.annotated_element, f.target_class, field_type, f.value
                    ),
                    &e,
                )
            }
        }
    }

    fn fields(&self, fact: &Fact, f: &FieldsFact) -> Outcome {
        let missing = match self.resolver().missing_fields(&f.target_class, &f.values) {
            Ok(missing) if missing.is_empty() => return Outcome::Passed,
            Ok(missing) => missing,
            Err(e) => {
                return failed(
                    format!(
                        "Annotation @CheckFields on {} warns: Class {} has no accessible fields {}",
                        fact.annotated_element,
                        f.target_class,
                        f.values.join(", ")
                    ),
                    &e,
                );
            }
        };
        Outcome::Failed {
            message: format!(
                "Annotation @CheckFields on {} warns: Class {} has no accessible fields {}",
                fact.annotated_element,
                f.target_class,
                missing.join(", ")
            ),
        }
    }

    fn method(&self, fact: &Fact, f: &MethodFact) -> Outcome {
        match self.resolver().find_method(
            &f.target_class,
            &f.value,
            f.return_type.as_deref(),
            f.parameters.as_deref(),
        ) {
            Ok(_) => Outcome::Passed,
            Err(e) => {
                let return_type = f
                    .return_type
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(|t| format!("{} ", t))
                    .unwrap_or_default();
                let parameters = match &f.parameters {
                    Some(parameters) => parameters.join(", "),
                    None => "..".to_string(),
                };
                failed(
                    format!(
                        "Annotation @CheckMethod on method {} warns: Class {} has no accessible method {}{}({})",
                        fact.annotated_element, f.target_class, return_type, f.value, parameters
                    ),
                    &e,
                )
            }
        }
    }

    fn key(&self, fact: &Fact, f: &KeyFact) -> Outcome {
        let keys = std::slice::from_ref(&f.value);
        match missing_keys(self.bundles, &f.base_name, f.locale.as_deref(), keys) {
            Ok(missing) if missing.is_empty() => Outcome::Passed,
            Ok(_) => Outcome::Failed {
                message: format!(
                    "Annotation @CheckKey on {} warns: ResourceBundle with base name {} has no key {}",
                    fact.annotated_element, f.base_name, f.value
                ),
            },
            Err(e) => bundle_unavailable("CheckKey", fact, &f.base_name, &e),
        }
    }

    fn keys(&self, fact: &Fact, f: &KeysFact) -> Outcome {
        match missing_keys(self.bundles, &f.base_name, f.locale.as_deref(), &f.values) {
            Ok(missing) if missing.is_empty() => Outcome::Passed,
            Ok(missing) => Outcome::Failed {
                message: format!(
                    "Annotation @CheckKeys on {} warns: ResourceBundle with base name {} has no keys {}",
                    fact.annotated_element,
                    f.base_name,
                    missing.join(", ")
                ),
            },
            Err(e) => bundle_unavailable("CheckKeys", fact, &f.base_name, &e),
        }
    }

    fn resource_bundle(&self, fact: &Fact, f: &ResourceBundleFact) -> Outcome {
        match synchronize(self.bundles, &f.base_name, &f.locales) {
            SyncOutcome::Synchronized => Outcome::Passed,
            SyncOutcome::Skipped { distinct } => {
                tracing::warn!(
                    element = %fact.annotated_element,
                    base_name = %f.base_name,
                    distinct,
                    "resource bundle check skipped"
                );
                Outcome::Skipped {
                    reason: format!(
                        "Annotation @CheckResourceBundle on {} informs: Attribute 'locales' must have more than 1 unique locales for testing. With {} locales testing is not possible",
                        fact.annotated_element, distinct
                    ),
                }
            }
            SyncOutcome::MissingLocales(missing) => Outcome::Failed {
                message: format!(
                    "Annotation @CheckResourceBundle on {} warns: ResourceBundles for base name {} with locales {} was not found",
                    fact.annotated_element,
                    f.base_name,
                    quoted(&missing)
                ),
            },
            SyncOutcome::AbsentKeys(absent) => Outcome::Failed {
                message: format!(
                    "Annotation @CheckResourceBundle on {} warns: ResourceBundles for baseName {} has absent keys in locales:\n{}",
                    fact.annotated_element,
                    f.base_name,
                    absent_keys(&absent)
                ),
            },
        }
    }

    fn serializable(&self, fact: &Fact, f: &SerializableFact, warnings: &mut Vec<String>) -> Outcome {
        let package = f
            .target_package
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(&fact.annotated_element);
        let classes: Vec<_> = self
            .types
            .classes_in_package(package)
            .into_iter()
            .filter(|c| !f.excludes.contains(&c.name))
            .collect();
        if classes.is_empty() {
            tracing::warn!(package, element = %fact.annotated_element, "no classes to check for serialization");
            warnings.push(format!("package {} has no classes to check", package));
            return Outcome::Passed;
        }

        let checker = SerialChecker::new(self.types, &self.policy);
        let mut failures = Vec::new();
        for class in classes {
            let findings = checker.check(class);
            failures.extend(findings.failures);
            for warning in findings.warnings {
                if !warnings.contains(&warning) {
                    warnings.push(warning);
                }
            }
        }
        if failures.is_empty() {
            Outcome::Passed
        } else {
            Outcome::Failed {
                message: format!(
                    "Annotation @CheckSerializable on {} warns: next classes have problems with serialization:{}",
                    fact.annotated_element,
                    failures
                        .iter()
                        .map(|f| format!("\n\t{}", f))
                        .collect::<String>()
                ),
            }
        }
    }
}

/// A failed lookup. A missing class is called out after the generated text.
fn failed(message: String, error: &ResolveError) -> Outcome {
    let message = match error {
        ResolveError::ClassNotFound(class) => format!("{} (class {} not found)", message, class),
        ResolveError::NoMatch { .. } => message,
    };
    Outcome::Failed { message }
}

fn bundle_unavailable(annotation: &str, fact: &Fact, base_name: &str, error: &BundleError) -> Outcome {
    if let BundleError::Io { .. } = error {
        tracing::warn!(base_name, error = %error, "unreadable resource bundle");
    }
    Outcome::Failed {
        message: format!(
            "Annotation @{} on {} warns: ResourceBundle with base name {} not found",
            annotation, fact.annotated_element, base_name
        ),
    }
}

fn quoted(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!("'{}'", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn absent_keys(absent: &BTreeMap<String, Vec<String>>) -> String {
    absent
        .iter()
        .map(|(locale, keys)| format!("\t{}: [{}]\n", locale, quoted(keys)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_bundles::MemoryLoader;
    use attest_types::{ClassInfo, ClassKind, ConstructorInfo, FieldInfo, MethodInfo, TypeIndex, TypeRef};
    use std::collections::BTreeSet;

    fn types() -> TypeIndex {
        let mut index = TypeIndex::with_builtins();
        index.insert(
            ClassInfo::new("com.example.Dto", ClassKind::Class)
                .with_constructor(ConstructorInfo::new(vec![TypeRef::class("java.lang.String")]))
                .with_field(FieldInfo::new("name", TypeRef::class("java.lang.String")))
                .with_method(MethodInfo::new(
                    "getName",
                    TypeRef::class("java.lang.String"),
                    vec![],
                )),
        );
        index
    }

    fn bundles() -> MemoryLoader {
        MemoryLoader::new()
            .with_bundle("Messages", "", &["title", "body"])
            .with_bundle("Messages", "de", &["title"])
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn constructor(params: &[&str]) -> Fact {
        Fact::new(
            "com.example.App",
            FactKind::Constructor(ConstructorFact {
                target_class: "com.example.Dto".into(),
                parameters: strings(params),
            }),
        )
    }

    fn check(fact: &Fact) -> Outcome {
        let types = types();
        let bundles = bundles();
        Verifier::new(&types, &bundles).check(fact).outcome
    }

    #[test]
    fn test_constructor_exactness() {
        assert_eq!(check(&constructor(&["java.lang.String"])), Outcome::Passed);
        assert_eq!(
            check(&constructor(&["java.lang.String", "int"])),
            Outcome::Failed {
                message: "Annotation @CheckConstructor on type com.example.App warns: Class com.example.Dto has no accessible constructor with parameters java.lang.String, int".into()
            }
        );
        assert_eq!(
            check(&constructor(&[])).message(),
            Some("Annotation @CheckConstructor on type com.example.App warns: Class com.example.Dto has no accessible constructor without parameters")
        );
    }

    #[test]
    fn test_missing_class_is_named() {
        let fact = Fact::new(
            "com.example.App",
            FactKind::Constructor(ConstructorFact {
                target_class: "com.example.Gone".into(),
                parameters: vec![],
            }),
        );
        assert!(check(&fact).message().unwrap().ends_with("(class com.example.Gone not found)"));
    }

    #[test]
    fn test_custom_message_wins() {
        let fact = constructor(&["int"]).with_message("Dto must keep its int constructor");
        assert_eq!(
            check(&fact),
            Outcome::Failed {
                message: "Dto must keep its int constructor".into()
            }
        );
        // blank messages do not count
        let fact = constructor(&["int"]).with_message("  ");
        assert!(check(&fact).message().unwrap().starts_with("Annotation @CheckConstructor"));
        // and never turn a pass into a failure
        let fact = constructor(&["java.lang.String"]).with_message("unused");
        assert_eq!(check(&fact), Outcome::Passed);
    }

    #[test]
    fn test_field_messages() {
        let fact = Fact::new(
            "com.example.App.NAME",
            FactKind::Field(FieldFact {
                target_class: "com.example.Dto".into(),
                value: "name".into(),
                field_type: Some("int".into()),
            }),
        );
        assert_eq!(
            check(&fact).message(),
            Some("Annotation @CheckField on field com.example.App.NAME warns: Class com.example.Dto has no accessible field int name")
        );

        let fact = Fact::new(
            "com.example.App",
            FactKind::Fields(FieldsFact {
                target_class: "com.example.Dto".into(),
                values: strings(&["name", "age", "email"]),
            }),
        );
        assert_eq!(
            check(&fact).message(),
            Some("Annotation @CheckFields on com.example.App warns: Class com.example.Dto has no accessible fields age, email")
        );
    }

    #[test]
    fn test_method_constraints() {
        let method = |return_type: Option<&str>, parameters: Option<&[&str]>| {
            Fact::new(
                "com.example.App.run",
                FactKind::Method(MethodFact {
                    target_class: "com.example.Dto".into(),
                    value: "getName".into(),
                    return_type: return_type.map(String::from),
                    parameters: parameters.map(strings),
                }),
            )
        };
        assert!(check(&method(None, None)).is_passed());
        assert!(check(&method(Some("java.lang.String"), Some(&[]))).is_passed());
        assert_eq!(
            check(&method(Some("int"), None)).message(),
            Some("Annotation @CheckMethod on method com.example.App.run warns: Class com.example.Dto has no accessible method int getName(..)")
        );
        assert_eq!(
            check(&method(None, Some(&["int"]))).message(),
            Some("Annotation @CheckMethod on method com.example.App.run warns: Class com.example.Dto has no accessible method getName(int)")
        );
    }

    #[test]
    fn test_key_checks() {
        let key = |base: &str, value: &str, locale: Option<&str>| {
            Fact::new(
                "com.example.App.KEY",
                FactKind::Key(KeyFact {
                    base_name: base.into(),
                    value: value.into(),
                    locale: locale.map(String::from),
                }),
            )
        };
        assert!(check(&key("Messages", "body", None)).is_passed());
        // de inherits body from the default bundle
        assert!(check(&key("Messages", "body", Some("de"))).is_passed());
        assert_eq!(
            check(&key("Messages", "footer", None)).message(),
            Some("Annotation @CheckKey on com.example.App.KEY warns: ResourceBundle with base name Messages has no key footer")
        );
        assert_eq!(
            check(&key("Other", "title", None)).message(),
            Some("Annotation @CheckKey on com.example.App.KEY warns: ResourceBundle with base name Other not found")
        );

        let keys = Fact::new(
            "com.example.App",
            FactKind::Keys(KeysFact {
                base_name: "Messages".into(),
                values: strings(&["title", "footer", "header"]),
                locale: None,
            }),
        );
        assert_eq!(
            check(&keys).message(),
            Some("Annotation @CheckKeys on com.example.App warns: ResourceBundle with base name Messages has no keys footer, header")
        );
    }

    #[test]
    fn test_resource_bundle_outcomes() {
        let bundle = |locales: &[&str]| {
            Fact::new(
                "com.example.App",
                FactKind::ResourceBundle(ResourceBundleFact {
                    base_name: "Messages".into(),
                    locales: locales.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
                }),
            )
        };
        let skipped = check(&bundle(&["en"]));
        assert_eq!(
            skipped,
            Outcome::Skipped {
                reason: "Annotation @CheckResourceBundle on com.example.App informs: Attribute 'locales' must have more than 1 unique locales for testing. With 1 locales testing is not possible".into()
            }
        );
        assert_eq!(
            check(&bundle(&["", "de"])).message(),
            Some("Annotation @CheckResourceBundle on com.example.App warns: ResourceBundles for baseName Messages has absent keys in locales:\n\tde: ['body']\n")
        );
        assert_eq!(
            check(&bundle(&["", "fr", "it"])).message(),
            Some("Annotation @CheckResourceBundle on com.example.App warns: ResourceBundles for base name Messages with locales 'fr', 'it' was not found")
        );
        // custom messages do not replace a skip
        assert!(check(&bundle(&["en"]).with_message("custom")).is_skipped());
    }

    #[test]
    fn test_serializable_package_scan() {
        let mut types = TypeIndex::with_builtins();
        types.insert(
            ClassInfo::new("com.example.model.Dto", ClassKind::Class)
                .with_interface(TypeRef::class("java.io.Serializable"))
                .with_field(FieldInfo::new("lock", TypeRef::class("java.lang.Thread"))),
        );
        types.insert(ClassInfo::new("com.example.model.Helper", ClassKind::Class));
        let bundles = MemoryLoader::new();
        let verifier = Verifier::new(&types, &bundles);

        let fact = Fact::new(
            "com.example.model",
            FactKind::Serializable(SerializableFact {
                target_package: None,
                excludes: BTreeSet::from(["com.example.model.Helper".to_string()]),
            }),
        );
        let result = verifier.check(&fact);
        assert_eq!(
            result.outcome.message(),
            Some("Annotation @CheckSerializable on com.example.model warns: next classes have problems with serialization:\n\tcom.example.model.Dto -> lock: java.lang.Thread -> Not implements java.io.Serializable")
        );

        let empty = Fact::new(
            "com.example.App",
            FactKind::Serializable(SerializableFact {
                target_package: Some("com.example.none".into()),
                excludes: BTreeSet::new(),
            }),
        );
        let result = verifier.check(&empty);
        assert!(result.outcome.is_passed());
        assert_eq!(result.warnings, ["package com.example.none has no classes to check"]);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let types = types();
        let bundles = bundles();
        let facts: FactSet = [
            constructor(&["java.lang.String"]),
            constructor(&["int"]),
            constructor(&[]),
        ]
        .into_iter()
        .collect();
        let parallel = Verifier::new(&types, &bundles).verify(&facts);
        let sequential = Verifier::new(&types, &bundles).parallel(false).verify(&facts);
        let outcomes = |report: &Report| {
            report
                .results
                .iter()
                .map(|r| r.outcome.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(outcomes(&parallel), outcomes(&sequential));
        assert_eq!((parallel.passed(), parallel.failed()), (1, 2));
    }
}
