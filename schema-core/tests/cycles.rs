use schema_ast::{ImportDecl, Model};
use schema_core::{detect_cross_schema_cycles, Code, Collector, MemoryRegistry, ResolvedImports};

mod common;
use common::{complete, complete_in, model, source, sp, ty};

#[test]
fn two_node_cycle_is_fatal() {
    let m = model("cyc")
        .with_type(ty("A", 1).extends("B", sp(2)))
        .with_type(ty("B", 3).extends("A", sp(4)));

    let out = complete(&m);
    out.assert_only(Code::InheritCycle);
    let d = out.diags.with_code(Code::InheritCycle).next().expect("cycle");
    assert_eq!(d.message, "inheritance cycle: A -> B -> A");
    assert_eq!(d.related.len(), 2);
}

#[test]
fn three_node_cycle() {
    let m = model("cyc3")
        .with_type(ty("A", 1).extends("B", sp(2)))
        .with_type(ty("B", 3).extends("C", sp(4)))
        .with_type(ty("C", 5).extends("A", sp(6)));

    let out = complete(&m);
    out.assert_only(Code::InheritCycle);
    assert!(out.messages(Code::InheritCycle)[0].contains("A -> B -> C -> A"));
}

#[test]
fn self_inheritance() {
    let m = model("selfish").with_type(ty("A", 1).extends("A", sp(2)));
    let out = complete(&m);
    out.assert_only(Code::InheritCycle);
    assert!(out.messages(Code::InheritCycle)[0].contains("A -> A"));
}

#[test]
fn every_cycle_is_reported() {
    let m = model("many")
        .with_type(ty("A", 1).extends("B", sp(2)))
        .with_type(ty("B", 3).extends("A", sp(4)))
        .with_type(ty("C", 5).extends("C", sp(6)))
        .with_type(ty("Fine", 7));

    let out = complete(&m);
    assert_eq!(out.messages(Code::InheritCycle).len(), 2);
}

#[test]
fn diamond_is_not_a_cycle() {
    let m = model("diamond")
        .with_type(ty("A", 1))
        .with_type(ty("B", 2).extends("A", sp(3)))
        .with_type(ty("C", 4).extends("A", sp(5)))
        .with_type(ty("D", 6).extends("B", sp(7)).extends("C", sp(8)));
    complete(&m).assert_ok();
}

fn pair() -> (Model, Model, ResolvedImports, ResolvedImports) {
    let a = model("a")
        .with_import(ImportDecl::new("b.schema", "b", sp(1)))
        .with_type(ty("A", 2).extends("b.B", sp(3)));
    let b = model("b")
        .with_import(ImportDecl::new("a.schema", "a", sp(1)))
        .with_type(ty("B", 2).extends("a.A", sp(3)));

    let a_imports = ResolvedImports::from([("b".to_string(), source("b"))]);
    let b_imports = ResolvedImports::from([("a".to_string(), source("a"))]);
    (a, b, a_imports, b_imports)
}

#[test]
fn cross_schema_cycle_through_registry() {
    let (a, b, a_imports, b_imports) = pair();

    let mut registry = MemoryRegistry::new();
    for (m, imports) in [(&a, &a_imports), (&b, &b_imports)] {
        let out = complete_in(&source(&m.name.node), m, None, Some(imports));
        registry.insert(out.result.expect("local pass defers foreign supertypes"));
    }

    let mut diags = Collector::new();
    let cycles = detect_cross_schema_cycles(&registry, &mut diags);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].len(), 3);
    assert!(diags.has_code(Code::InheritCycle));
    assert!(diags.diagnostics()[0].message.contains("A (a.schema) -> B (b.schema) -> A (a.schema)"));
}

#[test]
fn acyclic_registry() {
    let base = model("base").with_type(ty("Base", 1));
    let app = model("app")
        .with_import(ImportDecl::new("base.schema", "base", sp(1)))
        .with_type(ty("App", 2).extends("base.Base", sp(3)));
    let imports = ResolvedImports::from([("base".to_string(), source("base"))]);

    let mut registry = MemoryRegistry::new();
    registry.insert(complete_in(&source("base"), &base, None, None).result.expect("base"));
    registry.insert(complete_in(&source("app"), &app, None, Some(&imports)).result.expect("app"));

    let mut diags = Collector::new();
    assert!(detect_cross_schema_cycles(&registry, &mut diags).is_empty());
    assert!(diags.is_empty());
}
