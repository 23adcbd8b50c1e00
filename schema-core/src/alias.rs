#![forbid(unsafe_code)]

use schema_ast::{Constraint, Span};
use tracing::trace;

use crate::complete::{Halt, Phase, Session};
use crate::diagnostics::{Code, SchemaDiagnostic};

impl<'a> Session<'a> {
    /// Replaces every alias constraint that can be followed with a resolved
    /// alias. Anything that cannot be followed yet stays unresolved.
    pub(crate) fn resolve_aliases(&mut self) -> Phase {
        for i in 0..self.datatypes.len() {
            let name = self.datatypes[i].name().to_string();
            let resolved = self.resolve_datatype(&name, &mut Vec::new())?;
            self.datatypes[i].set_constraint(resolved);
        }

        for t in 0..self.types.len() {
            let props: Vec<(Constraint, Span)> = self.types[t]
                .own_properties()
                .iter()
                .map(|p| (p.constraint.clone(), p.span))
                .collect();
            let mut resolved = Vec::with_capacity(props.len());
            for (c, at) in &props {
                resolved.push(self.resolve_constraint(c, *at, &mut Vec::new())?);
            }
            for (p, c) in self.types[t].own_properties_mut().iter_mut().zip(resolved) {
                p.constraint = c;
            }

            let edges: Vec<Vec<(Constraint, Span)>> = self.types[t]
                .own_relations()
                .iter()
                .map(|r| r.properties.iter().map(|p| (p.constraint.clone(), p.span)).collect())
                .collect();
            let mut resolved_edges = Vec::with_capacity(edges.len());
            for props in &edges {
                let mut resolved = Vec::with_capacity(props.len());
                for (c, at) in props {
                    resolved.push(self.resolve_constraint(c, *at, &mut Vec::new())?);
                }
                resolved_edges.push(resolved);
            }
            for (r, cs) in self.types[t].own_relations_mut().iter_mut().zip(resolved_edges) {
                for (p, c) in r.properties.iter_mut().zip(cs) {
                    p.constraint = c;
                }
            }
        }

        Ok(())
    }

    /// Resolved constraint of the local datatype `name`. `chain` holds the
    /// datatypes currently being followed.
    fn resolve_datatype(&mut self, name: &str, chain: &mut Vec<String>) -> Result<Constraint, Halt> {
        if let Some(c) = self.alias_memo.get(name) {
            return Ok(c.clone());
        }

        let Some(&idx) = self.datatype_index.get(name) else {
            return Ok(Constraint::alias(name));
        };
        let at = self.datatypes[idx].span();

        if let Some(start) = chain.iter().position(|n| n == name) {
            let mut path: Vec<&str> = chain[start..].iter().map(String::as_str).collect();
            path.push(name);
            self.report(
                SchemaDiagnostic::fatal(Code::AliasCycle, format!("datatype alias cycle: {}", path.join(" -> ")))
                    .at(at),
            );
            return Err(Halt);
        }

        let raw = self.datatypes[idx].constraint().clone();
        chain.push(name.to_string());
        let resolved = self.resolve_constraint(&raw, at, chain)?;
        chain.pop();

        trace!(datatype = name, constraint = %resolved.display(), "datatype resolved");
        self.alias_memo.insert(name.to_string(), resolved.clone());
        Ok(resolved)
    }

    fn resolve_constraint(&mut self, c: &Constraint, at: Span, chain: &mut Vec<String>) -> Result<Constraint, Halt> {
        match c {
            Constraint::Alias { name, .. } => {
                if let Some((qualifier, local)) = name.split_once('.') {
                    return Ok(self.resolve_foreign_alias(c, qualifier, local, at));
                }
                if !self.datatype_index.contains_key(name) {
                    return Ok(c.clone());
                }
                let target = self.resolve_datatype(name, chain)?;
                Ok(Constraint::Alias {
                    name: name.clone(),
                    resolved: Some(Box::new(target)),
                })
            }
            Constraint::List {
                element,
                min_len,
                max_len,
            } => Ok(Constraint::List {
                element: Box::new(self.resolve_constraint(element, at, chain)?),
                min_len: *min_len,
                max_len: *max_len,
            }),
            other => Ok(other.clone()),
        }
    }

    /// `alias.Name`: the foreign datatype is already resolved in its own
    /// completed schema.
    fn resolve_foreign_alias(&mut self, c: &Constraint, qualifier: &str, local: &str, at: Span) -> Constraint {
        let Some(import) = self.import(qualifier) else {
            self.unknown_import(qualifier, at);
            return c.clone();
        };
        let foreign = import
            .source
            .as_ref()
            .zip(self.registry)
            .and_then(|(source, registry)| registry.lookup_by_source_id(source))
            .and_then(|schema| schema.datatype_named(local));

        match (foreign, c) {
            (Some(dt), Constraint::Alias { name, .. }) => Constraint::Alias {
                name: name.clone(),
                resolved: Some(Box::new(dt.constraint().clone())),
            },
            _ => c.clone(),
        }
    }
}
