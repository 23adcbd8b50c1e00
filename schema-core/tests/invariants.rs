use schema_ast::{BinOp, Constraint, Expr, ImportDecl, InvariantDecl, Model, PipeOp, RelationDecl};
use schema_core::{Code, MemoryRegistry, ResolvedImports};

mod common;
use common::{complete, complete_in, model, prop, source, sp, ty};

fn gt_zero(lhs: Expr) -> Expr {
    Expr::binary(lhs, BinOp::Gt, Expr::int(0, sp(90)), sp(91))
}

fn person(expr: Expr) -> Model {
    model("people").with_type(
        ty("Person", 1)
            .property(prop("name", Constraint::string(), 2))
            .invariant(InvariantDecl::new("check", expr, sp(3))),
    )
}

#[test]
fn unknown_bare_name() {
    let out = complete(&person(gt_zero(Expr::name("fake_property", sp(10)))));
    out.assert_only(Code::UnknownProperty);
    let msg = &out.messages(Code::UnknownProperty)[0];
    assert!(msg.contains("fake_property"));
    assert!(msg.contains("Person"));
    assert!(msg.contains("check"));
}

#[test]
fn known_bare_name() {
    complete(&person(Expr::name("name", sp(10)))).assert_ok();
}

#[test]
fn self_member_access() {
    complete(&person(Expr::member(Expr::self_var(sp(10)), "name", sp(11)))).assert_ok();

    let out = complete(&person(Expr::member(Expr::self_var(sp(10)), "nickname", sp(11))));
    out.assert_only(Code::UnknownProperty);
}

fn shop(body: Expr) -> Model {
    model("shop")
        .with_type(ty("LineItem", 1).part().property(prop("quantity", Constraint::integer(), 2)))
        .with_type(
            ty("Order", 3)
                .relation(RelationDecl::composition("ITEMS", "LineItem", sp(4)).many())
                .invariant(InvariantDecl::new(
                    "positive_quantities",
                    Expr::pipe_lambda(Expr::name("ITEMS", sp(5)), PipeOp::All, &["item"], body, sp(6)),
                    sp(7),
                )),
        )
}

#[test]
fn lambda_variable_is_typed_by_relation_target() {
    let body = gt_zero(Expr::member(Expr::var("item", sp(8)), "quantity", sp(9)));
    complete(&shop(body)).assert_ok();
}

#[test]
fn lambda_member_checked_against_target() {
    let body = gt_zero(Expr::member(Expr::var("item", sp(8)), "nonexistent", sp(9)));
    let out = complete(&shop(body));
    out.assert_only(Code::UnknownProperty);
    let msg = &out.messages(Code::UnknownProperty)[0];
    assert!(msg.contains("nonexistent"));
    assert!(msg.contains("LineItem"));
}

#[test]
fn lambda_variable_as_bare_name() {
    complete(&shop(Expr::name("item", sp(8)))).assert_ok();
}

#[test]
fn lambda_binding_ends_with_the_body() {
    let m = model("scope").with_type(
        ty("Order", 1)
            .property(prop("total", Constraint::integer(), 2))
            .invariant(InvariantDecl::new(
                "leak",
                Expr::binary(
                    Expr::pipe_lambda(Expr::name("total", sp(3)), PipeOp::Then, &["t"], Expr::name("t", sp(4)), sp(5)),
                    BinOp::And,
                    Expr::name("t", sp(6)),
                    sp(7),
                ),
                sp(8),
            )),
    );
    let out = complete(&m);
    out.assert_only(Code::UnknownProperty);
    assert_eq!(out.diags.diagnostics()[0].span, Some(sp(6)));
}

#[test]
fn reduce_types_only_the_element() {
    let reduce = |member: &str| {
        Expr::pipe_lambda(
            Expr::name("ITEMS", sp(5)),
            PipeOp::Reduce,
            &["acc", "item"],
            Expr::binary(
                Expr::member(Expr::var("acc", sp(10)), "anything", sp(11)),
                BinOp::Add,
                Expr::member(Expr::var("item", sp(12)), member, sp(13)),
                sp(14),
            ),
            sp(6),
        )
    };

    complete(&shop(gt_zero(reduce("quantity")))).assert_ok();
    let out = complete(&shop(gt_zero(reduce("price"))));
    out.assert_only(Code::UnknownProperty);
    assert_eq!(out.diags.diagnostics()[0].span, Some(sp(13)));
}

#[test]
fn lambda_on_an_operator_without_one_is_untyped() {
    let sum = Expr::pipe_lambda(
        Expr::name("ITEMS", sp(5)),
        PipeOp::Sum,
        &["item"],
        Expr::member(Expr::var("item", sp(8)), "nonexistent", sp(9)),
        sp(6),
    );
    complete(&shop(gt_zero(sum))).assert_ok();

    let all = Expr::pipe_lambda(
        Expr::name("ITEMS", sp(5)),
        PipeOp::All,
        &["item"],
        Expr::member(Expr::var("item", sp(8)), "nonexistent", sp(9)),
        sp(6),
    );
    complete(&shop(all)).assert_only(Code::UnknownProperty);
}

#[test]
fn element_preserving_pipeline_keeps_type() {
    let first = Expr::pipe(Expr::name("ITEMS", sp(5)), PipeOp::First, sp(6));
    let m = model("shop")
        .with_type(ty("LineItem", 1).part().property(prop("quantity", Constraint::integer(), 2)))
        .with_type(
            ty("Order", 3)
                .relation(RelationDecl::composition("ITEMS", "LineItem", sp(4)).many())
                .invariant(InvariantDecl::new(
                    "first",
                    gt_zero(Expr::member(first, "qty", sp(7))),
                    sp(8),
                )),
        );
    let out = complete(&m);
    out.assert_only(Code::UnknownProperty);
    assert!(out.messages(Code::UnknownProperty)[0].contains("LineItem"));
}

#[test]
fn untyped_bases_are_skipped() {
    let count = Expr::pipe(Expr::name("ITEMS", sp(5)), PipeOp::Len, sp(6));
    complete(&shop(gt_zero(Expr::member(count, "whatever", sp(7))))).assert_ok();
}

#[test]
fn inherited_members_are_in_scope() {
    let m = model("inherit")
        .with_type(ty("Base", 1).property(prop("createdAt", Constraint::timestamp(), 2)))
        .with_type(
            ty("Sub", 3)
                .extends("Base", sp(4))
                .invariant(InvariantDecl::new("dated", Expr::name("created_at", sp(5)), sp(6))),
        );
    complete(&m).assert_ok();
}

#[test]
fn foreign_scope_from_registry() {
    let crm = model("crm").with_type(ty("Customer", 1).property(prop("email", Constraint::string(), 2)));
    let mut registry = MemoryRegistry::new();
    registry.insert(complete_in(&source("crm"), &crm, None, None).result.expect("crm"));
    let imports = ResolvedImports::from([("crm".to_string(), source("crm"))]);

    let shop = |member: &str| {
        model("shop")
            .with_import(ImportDecl::new("crm.schema", "crm", sp(1)))
            .with_type(
                ty("Order", 2)
                    .relation(RelationDecl::association("BUYER", "crm.Customer", sp(3)))
                    .invariant(InvariantDecl::new(
                        "buyer_contact",
                        Expr::member(Expr::name("BUYER", sp(4)), member, sp(5)),
                        sp(6),
                    )),
            )
    };

    complete_in(&source("shop"), &shop("email"), Some(&registry), Some(&imports)).assert_ok();

    let out = complete_in(&source("shop"), &shop("phone"), Some(&registry), Some(&imports));
    out.assert_only(Code::UnknownProperty);
    assert!(out.messages(Code::UnknownProperty)[0].contains("Customer (crm.schema)"));
}
