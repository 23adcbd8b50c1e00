use schema_ast::{Constraint, DataTypeDecl, Model};
use schema_core::Code;

mod common;
use common::{complete, model, prop, sp, ty};

fn parent_child(parent: Constraint, child: Constraint) -> Model {
    model("narrow")
        .with_type(ty("Parent", 1).property(prop("age", parent, 2)))
        .with_type(ty("Child", 3).extends("Parent", sp(4)).property(prop("age", child, 5)))
}

#[test]
fn narrower_bound_wins() {
    let m = parent_child(Constraint::integer_range(0, 150), Constraint::integer_range(18, 150));
    let out = complete(&m);
    let schema = out.assert_ok();
    let age = schema.type_named("Child").and_then(|t| t.property("age")).expect("age");
    assert_eq!(age.constraint, Constraint::integer_range(18, 150));
    assert_eq!(age.owner.name, "Child");
}

#[test]
fn widening_is_a_conflict() {
    let m = parent_child(Constraint::integer_range(0, 150), Constraint::integer_range(0, 200));
    let out = complete(&m);
    out.assert_only(Code::PropertyConflict);

    let d = out.diags.with_code(Code::PropertyConflict).next().expect("conflict");
    assert!(d.message.contains("Parent") && d.message.contains("Child"));
    assert_eq!(d.related.len(), 2);
}

#[test]
fn incomparable_kinds_conflict() {
    let m = parent_child(Constraint::integer(), Constraint::string());
    complete(&m).assert_only(Code::PropertyConflict);
}

#[test]
fn required_cannot_become_optional() {
    let m = model("opt")
        .with_type(ty("Parent", 1).property(prop("nick", Constraint::string(), 2)))
        .with_type(
            ty("Child", 3)
                .extends("Parent", sp(4))
                .property(prop("nick", Constraint::string(), 5).optional()),
        );
    complete(&m).assert_only(Code::PropertyConflict);
}

#[test]
fn optional_may_become_required() {
    let m = model("opt")
        .with_type(ty("Parent", 1).property(prop("nick", Constraint::string(), 2).optional()))
        .with_type(
            ty("Child", 3)
                .extends("Parent", sp(4))
                .property(prop("nick", Constraint::string(), 5)),
        );
    let out = complete(&m);
    let schema = out.assert_ok();
    let nick = schema.type_named("Child").and_then(|t| t.property("nick")).expect("nick");
    assert!(!nick.optional);
}

#[test]
fn primary_key_flag_must_agree() {
    let m = model("pk")
        .with_type(ty("Parent", 1).property(prop("code", Constraint::string(), 2).primary_key()))
        .with_type(
            ty("Child", 3)
                .extends("Parent", sp(4))
                .property(prop("code", Constraint::string(), 5)),
        );
    complete(&m).assert_only(Code::PropertyConflict);
}

#[test]
fn narrowing_through_datatype_alias() {
    let m = model("alias")
        .with_datatype(DataTypeDecl::new("Age", Constraint::integer_range(0, 150), sp(1)))
        .with_type(ty("Parent", 2).property(prop("age", Constraint::alias("Age"), 3)))
        .with_type(
            ty("Child", 4)
                .extends("Parent", sp(5))
                .property(prop("age", Constraint::integer_range(21, 99), 6)),
        );
    complete(&m).assert_ok();
}

#[test]
fn pending_foreign_alias_is_accepted() {
    let m = model("pending")
        .with_import(schema_ast::ImportDecl::new("money.schema", "money", sp(1)))
        .with_type(ty("Parent", 2).property(prop("price", Constraint::float(), 3)))
        .with_type(
            ty("Child", 4)
                .extends("Parent", sp(5))
                .property(prop("price", Constraint::alias("money.Amount"), 6)),
        );
    complete(&m).assert_ok();
}

/// `Diamond` extends `Left` then `Right`; both declare `v`. Covers the
/// inherited-vs-inherited column of the merge table.
fn two_parents(left: Constraint, right: Constraint) -> Model {
    model("matrix")
        .with_type(ty("Left", 1).property(prop("v", left, 2)))
        .with_type(ty("Right", 3).property(prop("v", right, 4)))
        .with_type(ty("Diamond", 5).extends("Left", sp(6)).extends("Right", sp(7)))
}

fn merged_v(m: &Model) -> (Constraint, String) {
    let out = complete(m);
    let schema = out.assert_ok();
    let v = schema.type_named("Diamond").and_then(|t| t.property("v")).expect("v");
    (v.constraint.clone(), v.owner.name.clone())
}

#[test]
fn inherited_replaced_by_narrower_incoming() {
    let m = two_parents(Constraint::integer_range(0, 100), Constraint::integer_range(10, 20));
    assert_eq!(merged_v(&m), (Constraint::integer_range(10, 20), "Right".to_string()));
}

#[test]
fn inherited_kept_when_already_narrower() {
    let m = two_parents(Constraint::integer_range(10, 20), Constraint::integer_range(0, 100));
    assert_eq!(merged_v(&m), (Constraint::integer_range(10, 20), "Left".to_string()));
}

#[test]
fn inherited_equal_is_deduplicated() {
    let m = two_parents(Constraint::Uuid, Constraint::Uuid);
    assert_eq!(merged_v(&m), (Constraint::Uuid, "Left".to_string()));
}

#[test]
fn inherited_incomparable_conflict() {
    let m = two_parents(Constraint::integer_range(0, 10), Constraint::integer_range(5, 20));
    let out = complete(&m);
    out.assert_only(Code::PropertyConflict);
    assert!(out.messages(Code::PropertyConflict)[0].contains("Diamond"));
}

#[test]
fn own_narrower_than_every_parent() {
    let m = two_parents(Constraint::integer_range(0, 100), Constraint::integer_range(0, 50));
    let m = Model {
        types: m
            .types
            .into_iter()
            .map(|t| {
                if t.name.node == "Diamond" {
                    t.property(prop("v", Constraint::integer_range(1, 2), 8))
                } else {
                    t
                }
            })
            .collect(),
        ..m
    };
    assert_eq!(merged_v(&m), (Constraint::integer_range(1, 2), "Diamond".to_string()));
}

#[test]
fn own_wider_than_second_parent() {
    let m = two_parents(Constraint::integer_range(0, 100), Constraint::integer_range(0, 50));
    let m = Model {
        types: m
            .types
            .into_iter()
            .map(|t| {
                if t.name.node == "Diamond" {
                    t.property(prop("v", Constraint::integer_range(0, 80), 8))
                } else {
                    t
                }
            })
            .collect(),
        ..m
    };
    complete(&m).assert_only(Code::PropertyConflict);
}
