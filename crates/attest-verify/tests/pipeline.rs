//! Java project on disk -> harvest -> fact store -> verification report.

use std::path::Path;

use attest_bundles::PropertiesLoader;
use attest_facts::{AnnotationKind, FactStore, Harvester, HarvestError};
use attest_java::{JavaProject, JavaSources};
use attest_types::TypeSystem;
use attest_verify::{AttestConfig, Outcome, Report, SerialChecker, SerialPolicy, Verifier};

const APP: &str = r#"
package com.example;

import com.example.model.Dto;
import name.bychkov.junit5.CheckConstructor;
import name.bychkov.junit5.CheckField;
import name.bychkov.junit5.CheckKey;
import name.bychkov.junit5.CheckResourceBundle;

@CheckConstructor(targetClass = Dto.class, parameters = String.class)
@CheckConstructor(targetClass = Dto.class, parameters = String.class)
@CheckConstructor(targetClass = Dto.class, parameters = { String.class, int.class }, message = "Dto(String, int) is gone")
@CheckField(targetClass = Dto.class, value = "id", type = "long")
@CheckResourceBundle(baseName = App.BUNDLE, locales = { "", "de" })
public class App {
    static final String BUNDLE = "com.example.Messages";

    @CheckKey(baseName = BUNDLE)
    static final String TITLE = "title";

    @CheckResourceBundle(baseName = BUNDLE, locales = { "en" })
    void single() {}

    @CheckField(targetClass = Dto.class)
    void broken() {}
}
"#;

const BASE: &str = r#"
package com.example.model;

import java.io.Serializable;

public abstract class Base implements Serializable {
    protected long id;
}
"#;

const DTO: &str = r#"
package com.example.model;

public class Dto extends Base {
    private String name;
    public Dto(String name) { this.name = name; }
}
"#;

const NODE: &str = r#"
package com.example.model;

import java.io.Serializable;

public class Node implements Serializable {
    private Node next;
    private String label;
}
"#;

const HOLDER: &str = r#"
package com.example.model;

import java.io.Serializable;
import java.util.List;

public class Holder implements Serializable {
    private List<NotSerializable> items;
}

class NotSerializable {}
"#;

const PACKAGE_INFO: &str = r#"
@CheckSerializable(excludes = "com.example.model.NotSerializable")
package com.example.model;

import name.bychkov.junit5.CheckSerializable;
"#;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let java = "src/main/java/com/example";
    write(root, &format!("{java}/App.java"), APP);
    write(root, &format!("{java}/model/Base.java"), BASE);
    write(root, &format!("{java}/model/Dto.java"), DTO);
    write(root, &format!("{java}/model/Node.java"), NODE);
    write(root, &format!("{java}/model/Holder.java"), HOLDER);
    write(root, &format!("{java}/model/package-info.java"), PACKAGE_INFO);
    write(
        root,
        "src/main/resources/com/example/Messages.properties",
        "title = Title\nbody = Body\n",
    );
    write(
        root,
        "src/main/resources/com/example/Messages_de.properties",
        "title = Titel\n",
    );
    dir
}

fn run(root: &Path) -> (Report, Vec<HarvestError>) {
    let config = AttestConfig::load(root);
    let project = JavaProject::load(&root.join("src/main/java")).unwrap();

    let store = config.store(root);
    let harvest = Harvester::new(config.harvest_options()).harvest_to_store(&project.elements, &store);

    let bundles = PropertiesLoader::new(config.bundle_roots(root));
    let report = Verifier::from_config(&project.types, &bundles, &config).verify_store(&store);
    (report, harvest.errors)
}

fn outcome<'a>(report: &'a Report, kind: AnnotationKind, element: &str) -> Vec<&'a Outcome> {
    report
        .results
        .iter()
        .filter(|r| r.fact.annotation() == kind && r.fact.annotated_element == element)
        .map(|r| &r.outcome)
        .collect()
}

#[test]
fn test_end_to_end_report() {
    let dir = fixture();
    let (report, errors) = run(dir.path());

    // the misused annotation is reported, the rest of the file is harvested
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        &errors[0],
        HarvestError::MissingAttribute { attribute: "value", .. }
    ));

    // duplicate constructor annotations collapse into one fact
    assert_eq!(report.results.len(), 7);
    assert_eq!((report.passed(), report.failed(), report.skipped()), (3, 3, 1));
}

#[test]
fn test_structural_checks() {
    let dir = fixture();
    let (report, _) = run(dir.path());

    let constructors = outcome(&report, AnnotationKind::Constructor, "com.example.App");
    assert_eq!(constructors.len(), 2);
    assert!(constructors.contains(&&Outcome::Passed));
    assert!(constructors.contains(&&Outcome::Failed {
        message: "Dto(String, int) is gone".into()
    }));

    // id is declared on the superclass
    assert_eq!(
        outcome(&report, AnnotationKind::Field, "com.example.App"),
        [&Outcome::Passed]
    );
}

#[test]
fn test_bundle_checks() {
    let dir = fixture();
    let (report, _) = run(dir.path());

    // short form: the constant's value is the key
    assert_eq!(
        outcome(&report, AnnotationKind::Key, "com.example.App.TITLE"),
        [&Outcome::Passed]
    );
    assert_eq!(
        outcome(&report, AnnotationKind::ResourceBundle, "com.example.App"),
        [&Outcome::Failed {
            message: "Annotation @CheckResourceBundle on com.example.App warns: ResourceBundles for baseName com.example.Messages has absent keys in locales:\n\tde: ['body']\n".into()
        }]
    );
    let single = outcome(&report, AnnotationKind::ResourceBundle, "com.example.App.single");
    assert!(single[0].is_skipped());
}

#[test]
fn test_serializable_graph() {
    let dir = fixture();
    let (report, _) = run(dir.path());

    let result = report
        .results
        .iter()
        .find(|r| r.fact.annotation() == AnnotationKind::Serializable)
        .unwrap();
    // Node -> next is a cycle and passes; only the list element fails
    assert_eq!(
        result.outcome,
        Outcome::Failed {
            message: "Annotation @CheckSerializable on com.example.model warns: next classes have problems with serialization:\n\tcom.example.model.Holder -> items: com.example.model.NotSerializable -> Not implements java.io.Serializable".into()
        }
    );
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.contains("interface type java.util.List"))
    );
}

#[test]
fn test_missing_store_verifies_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let project = JavaProject::load(dir.path()).unwrap();
    let bundles = PropertiesLoader::new(vec![]);
    let report = Verifier::new(&project.types, &bundles).verify_store(&FactStore::in_project(dir.path()));
    assert!(report.results.is_empty());
    assert!(report.is_success());
}

#[test]
fn test_project_config_moves_store() {
    let dir = fixture();
    write(dir.path(), ".attest/config.toml", "[store]\npath = \"build/facts.bin\"\n");
    let (report, _) = run(dir.path());
    assert!(dir.path().join("build/facts.bin").is_file());
    assert_eq!(report.results.len(), 7);
}

#[test]
fn test_exception_classes_in_scanned_package() {
    let mut sources = JavaSources::new();
    sources
        .add_source(
            "com/x/MyError.java",
            "package com.x; public class MyError extends RuntimeException { private String code; }",
        )
        .unwrap();
    sources
        .add_source(
            "com/x/LibError.java",
            "package com.x; import org.lib.BaseError; public class LibError extends BaseError {}",
        )
        .unwrap();
    let project = sources.analyze();
    let policy = SerialPolicy::default();
    let checker = SerialChecker::new(&project.types, &policy);

    let my_error = checker.check(project.types.class("com.x.MyError").unwrap());
    assert!(my_error.failures.is_empty());
    assert!(my_error.warnings.is_empty());

    // base class outside the model: inconclusive, not a failure
    let lib_error = checker.check(project.types.class("com.x.LibError").unwrap());
    assert!(lib_error.failures.is_empty());
    assert_eq!(lib_error.warnings.len(), 1);
    assert!(lib_error.warnings[0].contains("org.lib.BaseError"));
}
