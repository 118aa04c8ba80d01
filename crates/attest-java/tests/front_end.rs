//! Java sources in, annotated elements and type model out.

use attest_facts::{AnnotationValue, Element, ElementKind, SourceElement, annotated_element};
use attest_java::{JavaProject, JavaSources};
use attest_types::{ClassKind, Resolver, TypeRef, TypeSystem};

const MODEL: &str = r#"
package com.example.model;

import java.io.Serializable;
import java.util.List;

public class Dto extends Base implements Serializable {
    public static final String NAME_FIELD = "name";

    private String name;
    private List<Item> items;
    private transient Thread worker;

    public Dto() {}
    public Dto(String name, double[] weights) {}

    public String getName() { return name; }
    public <T> T convert(Class<T> type, int... flags) { return null; }

    public class Inner {}
    public static class Nested {
        Nested(long id) {}
    }
}
"#;

const BASE: &str = r#"
package com.example.model;

public abstract class Base implements Keys {
    protected long id;
}

interface Keys {
    String TITLE = "title";
    String TITLE_LONG = TITLE + ".long";
}
"#;

const APP: &str = r#"
package com.example;

import com.example.model.Dto;
import com.example.model.*;
import name.bychkov.junit5.CheckConstructor;
import name.bychkov.junit5.CheckField;
import name.bychkov.junit5.CheckKey;
import name.bychkov.junit5.CheckResourceBundle;

@CheckConstructor(targetClass = Dto.class, parameters = { String.class, double[].class })
@CheckField.List({
    @CheckField(targetClass = Dto.class, value = Dto.NAME_FIELD),
    @CheckField(targetClass = Dto.class, value = "items", type = "java.util.List")
})
public class App {
    @CheckKey(baseName = App.BUNDLE)
    public static final String TITLE_KEY = "title";

    static final String BUNDLE = "com.example.Messages";

    @CheckConstructor(targetClass = Dto.Nested.class, parameters = long.class)
    public App(String name, int count) {}

    public void run() {
        @CheckResourceBundle(locales = { "", "de" }) final String bundle = BUNDLE;
    }

    enum Mode {
        @CheckKey(baseName = BUNDLE, value = "mode.fast") FAST,
        SLOW
    }
}
"#;

const PACKAGE_INFO: &str = r#"
@CheckSerializable(excludes = "com.example.model.Base")
package com.example.model;

import name.bychkov.junit5.CheckSerializable;
"#;

fn project() -> JavaProject {
    let mut sources = JavaSources::new();
    sources.add_source("com/example/model/Dto.java", MODEL).unwrap();
    sources.add_source("com/example/model/Base.java", BASE).unwrap();
    sources.add_source("com/example/App.java", APP).unwrap();
    sources.add_source("com/example/model/package-info.java", PACKAGE_INFO).unwrap();
    sources.analyze()
}

fn find<'a>(project: &'a JavaProject, kind: ElementKind, name: &str) -> &'a Element {
    project
        .elements
        .iter()
        .find(|e| e.kind == kind && e.name == name)
        .unwrap_or_else(|| panic!("no {:?} named {}", kind, name))
}

#[test]
fn test_class_element_and_class_literals() {
    let project = project();
    let app = find(&project, ElementKind::Class, "App");
    assert_eq!(annotated_element(app), "com.example.App");
    assert_eq!(app.annotations.len(), 2);

    let ctor = &app.annotations[0];
    assert_eq!(ctor.type_name, "name.bychkov.junit5.CheckConstructor");
    assert_eq!(
        ctor.values["targetClass"],
        AnnotationValue::Class("com.example.model.Dto".into())
    );
    assert_eq!(
        ctor.values["parameters"],
        AnnotationValue::Array(vec![
            AnnotationValue::Class("java.lang.String".into()),
            AnnotationValue::Class("double[]".into()),
        ])
    );

    let list = &app.annotations[1];
    assert_eq!(list.type_name, "name.bychkov.junit5.CheckField.List");
    let AnnotationValue::Array(fields) = &list.values["value"] else {
        panic!("container value is not an array");
    };
    let AnnotationValue::Annotation(first) = &fields[0] else {
        panic!("container element is not an annotation");
    };
    // constant reference folded to its literal
    assert_eq!(first.values["value"], AnnotationValue::String("name".into()));
}

#[test]
fn test_constant_fields_and_constructor_elements() {
    let project = project();
    let key = find(&project, ElementKind::Field, "TITLE_KEY");
    assert!(key.is_string_constant());
    assert_eq!(key.constant_value(), Some("title"));
    assert_eq!(
        key.annotations[0].values["baseName"],
        AnnotationValue::String("com.example.Messages".into())
    );

    let ctor = find(&project, ElementKind::Constructor, "App");
    assert_eq!(
        annotated_element(ctor),
        "com.example.App.App(java.lang.String, int)"
    );
    assert_eq!(
        ctor.annotations[0].values["targetClass"],
        AnnotationValue::Class("com.example.model.Dto.Nested".into())
    );
    assert_eq!(
        ctor.annotations[0].values["parameters"],
        AnnotationValue::Class("long".into())
    );
}

#[test]
fn test_local_variable_and_enum_constant_elements() {
    let project = project();
    let local = find(&project, ElementKind::LocalVariable, "bundle");
    assert_eq!(annotated_element(local), "com.example.App.run.bundle");
    assert_eq!(local.declared_type(), Some("java.lang.String"));

    let fast = find(&project, ElementKind::EnumConstant, "FAST");
    assert_eq!(annotated_element(fast), "com.example.App.Mode.FAST");
    // unqualified constant found in the enclosing class
    assert_eq!(
        fast.annotations[0].values["baseName"],
        AnnotationValue::String("com.example.Messages".into())
    );
}

#[test]
fn test_package_element() {
    let project = project();
    let package = find(&project, ElementKind::Package, "com.example.model");
    assert_eq!(annotated_element(package), "com.example.model");
    assert_eq!(
        package.annotations[0].type_name,
        "name.bychkov.junit5.CheckSerializable"
    );
}

#[test]
fn test_type_model() {
    let project = project();
    let types = &project.types;

    let dto = types.class("com.example.model.Dto").unwrap();
    assert_eq!(dto.superclass, Some(TypeRef::class("com.example.model.Base")));
    assert_eq!(dto.interfaces, [TypeRef::class("java.io.Serializable")]);
    let items = dto.fields.iter().find(|f| f.name == "items").unwrap();
    assert_eq!(items.ty.to_string(), "java.util.List<com.example.model.Item>");
    assert!(dto.fields.iter().any(|f| f.name == "worker" && f.modifiers.is_transient));

    let convert = dto.methods.iter().find(|m| m.name == "convert").unwrap();
    assert_eq!(convert.return_type, TypeRef::Variable("T".into()));
    assert_eq!(convert.parameters[1].canonical_name(), "int[]");

    // inner classes take the enclosing instance, nested ones do not
    let inner = types.class("com.example.model.Dto.Inner").unwrap();
    assert_eq!(inner.constructors[0].parameters, [TypeRef::class("com.example.model.Dto")]);
    let nested = types.class("com.example.model.Dto.Nested").unwrap();
    assert_eq!(nested.constructors.len(), 1);

    let keys = types.class("com.example.model.Keys").unwrap();
    assert_eq!(keys.kind, ClassKind::Interface);
    assert!(keys.fields.iter().all(|f| f.modifiers.is_static && f.modifiers.is_final));

    let mode = types.class("com.example.App.Mode").unwrap();
    assert!(mode.methods.iter().any(|m| m.name == "values"));

    let model: Vec<_> = types
        .classes_in_package("com.example.model")
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(
        model,
        [
            "com.example.model.Base",
            "com.example.model.Dto",
            "com.example.model.Dto.Inner",
            "com.example.model.Dto.Nested",
            "com.example.model.Keys",
        ]
    );
}

#[test]
fn test_resolver_over_parsed_sources() {
    let project = project();
    let resolver = Resolver::new(&project.types);
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    assert!(
        resolver
            .find_constructor("com.example.model.Dto", &strings(&["java.lang.String", "double[]"]))
            .is_ok()
    );
    assert!(resolver.find_constructor("com.example.model.Dto", &[]).is_ok());
    assert!(resolver.find_field("com.example.model.Dto", "id", Some("long")).is_ok());
    assert!(resolver.find_field("com.example.model.Dto", "TITLE", None).is_ok());
    assert!(
        resolver
            .find_method("com.example.model.Dto", "getName", Some("java.lang.String"), Some(&[]))
            .is_ok()
    );
}

#[test]
fn test_inherited_interface_constant() {
    let mut sources = JavaSources::new();
    sources.add_source("com/example/model/Base.java", BASE).unwrap();
    sources
        .add_source(
            "com/example/model/Child.java",
            r#"
            package com.example.model;
            class Child extends Base {
                @CheckKey(baseName = "Messages", value = TITLE_LONG) String unused;
            }
            "#,
        )
        .unwrap();
    let project = sources.analyze();
    let field = find(&project, ElementKind::Field, "unused");
    assert_eq!(
        field.annotations[0].values["value"],
        AnnotationValue::String("title.long".into())
    );
}

#[test]
fn test_load_directory() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("com").join("example");
    std::fs::create_dir_all(pkg.join("model")).unwrap();
    std::fs::write(pkg.join("App.java"), APP).unwrap();
    std::fs::write(pkg.join("model").join("Dto.java"), MODEL).unwrap();
    std::fs::write(pkg.join("notes.txt"), "not java").unwrap();

    let project = JavaProject::load(dir.path()).unwrap();
    assert!(project.types.class("com.example.App").is_some());
    assert!(project.types.class("com.example.model.Dto").is_some());
}
