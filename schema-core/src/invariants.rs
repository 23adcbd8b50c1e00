#![forbid(unsafe_code)]

//! Static scope check of invariant expressions.
//!
//! Every bare name and every member access whose base has a known static
//! type must name a property or relation of that type. Names are compared
//! in their lower-snake form. Lambda parameters of collection combinators
//! are bound for the lambda body only.

use std::collections::{HashMap, HashSet};

use schema_ast::{Expr, ExprKind, Lambda, PipeOp, SourceId, Span};

use crate::complete::Session;
use crate::diagnostics::{Code, SchemaDiagnostic};
use crate::model::{Invariant, Type, TypeId};
use crate::naming::field_name;
use crate::registry::Registry;

/// Member names of one type plus the element type of each relation.
#[derive(Debug, Default)]
struct TypeScope {
    names: HashSet<String>,
    targets: HashMap<String, TypeId>,
}

impl TypeScope {
    fn of(t: &Type, this_schema: &SourceId, resolve: impl Fn(&Type, &str) -> Option<TypeId>) -> Self {
        let mut scope = TypeScope::default();
        for p in t.all_properties() {
            scope.names.insert(field_name(&p.name));
        }
        for r in t.all_relations() {
            scope.names.insert(r.field_name.clone());
            let target = r.target_id.clone().or_else(|| {
                if r.owner.schema == *this_schema {
                    resolve(t, &r.field_name)
                } else {
                    None
                }
            });
            if let Some(target) = target {
                scope.targets.insert(r.field_name.clone(), target);
            }
        }
        scope
    }
}

struct Binding {
    name: String,
    ty: Option<TypeId>,
}

struct ScopeWalker<'r> {
    registry: Option<&'r dyn Registry>,
    this_schema: SourceId,
    scopes: HashMap<TypeId, TypeScope>,
    bindings: Vec<Binding>,
    owner: TypeId,
    invariant: String,
    found: Vec<SchemaDiagnostic>,
}

impl<'r> ScopeWalker<'r> {
    fn new(registry: Option<&'r dyn Registry>, this_schema: SourceId) -> Self {
        ScopeWalker {
            registry,
            this_schema: this_schema.clone(),
            scopes: HashMap::new(),
            bindings: Vec::new(),
            owner: TypeId::new(this_schema, ""),
            invariant: String::new(),
            found: Vec::new(),
        }
    }

    /// Loads a foreign type's scope on first use.
    fn load(&mut self, id: &TypeId) -> bool {
        if self.scopes.contains_key(id) {
            return true;
        }
        let Some(t) = self.registry.and_then(|r| r.lookup_type(id)) else {
            return false;
        };
        let scope = TypeScope::of(t, &self.this_schema, |_, _| None);
        self.scopes.insert(id.clone(), scope);
        true
    }

    /// `None` when the type's scope is unknown.
    fn has_member(&mut self, id: &TypeId, name: &str) -> Option<bool> {
        if !self.load(id) {
            return None;
        }
        self.scopes.get(id).map(|s| s.names.contains(name))
    }

    fn member_target(&mut self, id: &TypeId, name: &str) -> Option<TypeId> {
        if !self.load(id) {
            return None;
        }
        self.scopes.get(id)?.targets.get(name).cloned()
    }

    fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().rev().find(|b| b.name == name)
    }

    fn check(&mut self, owner: &TypeId, inv: &Invariant) {
        self.owner = owner.clone();
        self.invariant = inv.name.clone();
        self.bindings.clear();
        self.walk(&inv.expr);
    }

    fn report(&mut self, name: &str, on: &TypeId, at: Span) {
        let on_name = if on.schema == self.this_schema {
            on.name.clone()
        } else {
            on.to_string()
        };
        self.found.push(
            SchemaDiagnostic::error(
                Code::UnknownProperty,
                format!(
                    "invariant \"{}\" of `{}` references `{name}`, which is not a property or relation of `{on_name}`",
                    self.invariant, self.owner.name
                ),
            )
            .at(at),
        );
    }

    fn walk(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) | ExprKind::Var(_) => {}
            ExprKind::Name(name) => {
                if self.binding(name).is_some() {
                    return;
                }
                let owner = self.owner.clone();
                if self.has_member(&owner, &field_name(name)) == Some(false) {
                    self.report(name, &owner, expr.span);
                }
            }
            ExprKind::Member { base, member } => {
                self.walk(base);
                if let Some(on) = self.static_type(base) {
                    if self.has_member(&on, &field_name(&member.node)) == Some(false) {
                        self.report(&member.node, &on, member.span);
                    }
                }
            }
            ExprKind::Unary { expr, .. } => self.walk(expr),
            ExprKind::Binary { left, right, .. } => {
                self.walk(left);
                self.walk(right);
            }
            ExprKind::Pipeline { lhs, op, args, lambda } => {
                self.walk(lhs);
                for a in args {
                    self.walk(a);
                }
                if let Some(lambda) = lambda {
                    let element = if op.takes_lambda() { self.static_type(lhs) } else { None };
                    self.walk_lambda(*op, lambda, element);
                }
            }
            ExprKind::Call { args, .. } | ExprKind::List(args) => {
                for a in args {
                    self.walk(a);
                }
            }
            ExprKind::If {
                cond,
                then_expr,
                else_expr,
            } => {
                self.walk(cond);
                self.walk(then_expr);
                if let Some(e) = else_expr {
                    self.walk(e);
                }
            }
        }
    }

    fn walk_lambda(&mut self, op: PipeOp, lambda: &Lambda, element: Option<TypeId>) {
        let depth = self.bindings.len();
        let typed = if op == PipeOp::Reduce { 1 } else { 0 };
        for (k, param) in lambda.params.iter().enumerate() {
            self.bindings.push(Binding {
                name: param.node.clone(),
                ty: if k == typed { element.clone() } else { None },
            });
        }
        self.walk(&lambda.body);
        self.bindings.truncate(depth);
    }

    /// Type whose members `expr` denotes, when it can be known statically.
    fn static_type(&mut self, expr: &Expr) -> Option<TypeId> {
        match &expr.kind {
            ExprKind::Var(v) if v == "self" => Some(self.owner.clone()),
            ExprKind::Var(v) => self.binding(v)?.ty.clone(),
            ExprKind::Name(n) => {
                if let Some(b) = self.binding(n) {
                    return b.ty.clone();
                }
                let owner = self.owner.clone();
                self.member_target(&owner, &field_name(n))
            }
            ExprKind::Member { base, member } => {
                let on = self.static_type(base)?;
                self.member_target(&on, &field_name(&member.node))
            }
            ExprKind::Pipeline { lhs, op, .. } if op.preserves_element() => self.static_type(lhs),
            _ => None,
        }
    }
}

impl<'a> Session<'a> {
    /// Walks every own invariant of every type.
    pub(crate) fn validate_invariants(&mut self) {
        let mut walker = ScopeWalker::new(self.registry, self.source.clone());
        for t in &self.types {
            let scope = TypeScope::of(t, &self.source, |t, field| {
                t.relation(field).and_then(|r| self.relation_target_key(r))
            });
            walker.scopes.insert(t.id().clone(), scope);
        }

        for t in &self.types {
            for inv in t.own_invariants() {
                walker.check(t.id(), inv);
            }
        }

        let found = walker.found;
        self.diags.extend(found);
    }
}
