#![forbid(unsafe_code)]

//! Inheritance cycle detection, within one schema and across a registry.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::complete::{Halt, Phase, Session};
use crate::diagnostics::{Code, Collector, SchemaDiagnostic};
use crate::model::TypeId;
use crate::registry::Registry;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Visited,
}

/// Three-state DFS over `nodes` in the given order. Each back edge yields
/// one cycle, closed by repeating its first node; the offending edge is not
/// followed.
pub(crate) fn find_cycles<K, F>(nodes: &[K], mut edges: F) -> Vec<Vec<K>>
where
    K: Clone + Eq + Hash,
    F: FnMut(&K) -> Vec<K>,
{
    struct Walk<K> {
        marks: HashMap<K, Mark>,
        stack: Vec<K>,
        cycles: Vec<Vec<K>>,
    }

    fn visit<K, F>(walk: &mut Walk<K>, node: &K, edges: &mut F)
    where
        K: Clone + Eq + Hash,
        F: FnMut(&K) -> Vec<K>,
    {
        walk.marks.insert(node.clone(), Mark::Visiting);
        walk.stack.push(node.clone());

        for next in edges(node) {
            match walk.marks.get(&next) {
                None => visit(walk, &next, edges),
                Some(Mark::Visiting) => {
                    let Some(start) = walk.stack.iter().position(|n| *n == next) else {
                        unreachable!("visiting node missing from the DFS stack");
                    };
                    let mut cycle = walk.stack[start..].to_vec();
                    cycle.push(next);
                    walk.cycles.push(cycle);
                }
                Some(Mark::Visited) => {}
            }
        }

        walk.stack.pop();
        walk.marks.insert(node.clone(), Mark::Visited);
    }

    let mut walk = Walk {
        marks: HashMap::new(),
        stack: Vec::new(),
        cycles: Vec::new(),
    };
    for node in nodes {
        if !walk.marks.contains_key(node) {
            visit(&mut walk, node, &mut edges);
        }
    }
    walk.cycles
}

impl<'a> Session<'a> {
    /// Any cycle among local `inherits` edges is fatal. Qualified edges are
    /// left to [`detect_cross_schema_cycles`].
    pub(crate) fn detect_cycles(&mut self) -> Phase {
        let edges: Vec<Vec<usize>> = self
            .types
            .iter()
            .map(|t| {
                t.inherits()
                    .iter()
                    .filter(|r| r.is_local())
                    .filter_map(|r| self.type_index.get(&r.name).copied())
                    .collect()
            })
            .collect();
        let nodes: Vec<usize> = (0..self.types.len()).collect();

        let cycles = find_cycles(&nodes, |&n| edges[n].clone());
        if cycles.is_empty() {
            return Ok(());
        }

        for cycle in cycles {
            let path: Vec<&str> = cycle.iter().map(|&i| self.types[i].name()).collect();
            let mut diag = SchemaDiagnostic::fatal(
                Code::InheritCycle,
                format!("inheritance cycle: {}", path.join(" -> ")),
            )
            .at(self.types[cycle[0]].span());

            for pair in cycle.windows(2) {
                let (from, to) = (&self.types[pair[0]], &self.types[pair[1]]);
                if let Some(r) = from.inherits().iter().find(|r| r.is_local() && r.name == to.name()) {
                    diag = diag.with_related(r.span, format!("`{}` extends `{}` here", from.name(), to.name()));
                }
            }
            self.report(diag);
        }
        Err(Halt)
    }
}

/// Walks every type of every registered schema, following qualified
/// `inherits` through each owner's imports. Reports each cycle and returns
/// them; an empty result means the registry is acyclic.
#[tracing::instrument(level = "debug", skip_all)]
pub fn detect_cross_schema_cycles(registry: &dyn Registry, diags: &mut Collector) -> Vec<Vec<TypeId>> {
    let mut schemas = registry.all();
    schemas.sort_by(|a, b| a.id().cmp(b.id()));

    let nodes: Vec<TypeId> = schemas
        .iter()
        .flat_map(|s| s.types().iter().map(|t| t.id().clone()))
        .collect();

    let cycles = find_cycles(&nodes, |id| {
        let Some(schema) = registry.lookup_by_source_id(&id.schema) else {
            return Vec::new();
        };
        let Some(ty) = schema.type_named(&id.name) else {
            return Vec::new();
        };
        ty.inherits()
            .iter()
            .filter_map(|r| schema.reference_target(r))
            .filter(|target| registry.lookup_type(target).is_some())
            .collect()
    });

    for cycle in &cycles {
        let path: Vec<String> = cycle.iter().map(TypeId::to_string).collect();
        let mut diag = SchemaDiagnostic::fatal(
            Code::InheritCycle,
            format!("inheritance cycle across schemas: {}", path.join(" -> ")),
        );
        if let Some(first) = registry.lookup_type(&cycle[0]) {
            diag = diag.at(first.span());
        }
        diags.push(diag);
    }

    debug!(types = nodes.len(), cycles = cycles.len(), "cross-schema cycle check");
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, u32)]) -> impl FnMut(&u32) -> Vec<u32> + '_ {
        move |n: &u32| edges.iter().filter(|(a, _)| a == n).map(|(_, b)| *b).collect()
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let edges = [(4, 2), (4, 3), (2, 1), (3, 1)];
        assert!(find_cycles(&[1, 2, 3, 4], graph(&edges)).is_empty());
    }

    #[test]
    fn two_independent_cycles() {
        let edges = [(1, 2), (2, 1), (3, 4), (4, 5), (5, 3)];
        let cycles = find_cycles(&[1, 2, 3, 4, 5], graph(&edges));
        assert_eq!(cycles, vec![vec![1, 2, 1], vec![3, 4, 5, 3]]);
    }

    #[test]
    fn self_edge() {
        let edges = [(7, 7)];
        assert_eq!(find_cycles(&[7], graph(&edges)), vec![vec![7, 7]]);
    }
}
