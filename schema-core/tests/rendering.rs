use miette::{GraphicalReportHandler, GraphicalTheme, Report};
use schema_ast::span;
use schema_core::{Code, Completer, CompleteConfig, Collector};

mod common;
use common::{model, ty};

const SOURCE: &str = "schema zoo\ntype Cat {}\ntype Cat {}\n";

#[test]
fn duplicate_type_renders_with_both_locations() {
    let m = model("zoo")
        .with_type(ty("Cat", 0))
        .with_type(ty("Cat", 0));
    let m = schema_ast::Model {
        types: m
            .types
            .into_iter()
            .zip([span(16, 3), span(28, 3)])
            .map(|(mut t, s)| {
                t.name.span = s;
                t
            })
            .collect(),
        ..m
    };

    let config = CompleteConfig::default();
    let mut diags = Collector::new();
    let err = Completer::new(&config)
        .complete(common::source("zoo"), &m, &mut diags)
        .expect_err("duplicate type must fail");
    assert_eq!(err.errors, 1);
    assert!(err.to_string().contains("zoo"));

    let diag = diags.into_diagnostics().remove(0);
    assert_eq!(diag.code, Code::DuplicateType);

    let report = Report::new(diag).with_source_code(SOURCE);
    let mut out = String::new();
    GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor())
        .render_report(&mut out, &*report)
        .expect("render");

    assert!(out.contains("E_DUPLICATE_TYPE"), "{out}");
    assert!(out.contains("first defined here"), "{out}");
    assert!(out.contains("type `Cat` is defined more than once"), "{out}");
}
