use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::api::reactive::ReactiveGraph;

/// Why an output slot was scheduled for recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum InvalidationReason {
    Initial,
    Input(String),
    Pressed(String),
    Upstream(String),
}

/// Coalesced set of dirty outputs, keyed by topological position.
///
/// The first reason recorded for an output wins; later marks are merged into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInvalidation {
    dirty: IndexMap<usize, InvalidationReason>,
}

impl PendingInvalidation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks every output of `graph`.
    #[must_use]
    pub fn all(graph: &ReactiveGraph) -> Self {
        Self {
            dirty: (0..graph.len())
                .map(|position| (position, InvalidationReason::Initial))
                .collect(),
        }
    }

    pub fn mark(&mut self, position: usize, reason: InvalidationReason) {
        self.dirty.entry(position).or_insert(reason);
    }

    /// Marks the direct readers of `input`.
    pub fn invalidate_input(&mut self, graph: &ReactiveGraph, input: &str, reason: &InvalidationReason) {
        for &reader in graph.readers_of_input(input) {
            self.mark(reader, reason.clone());
        }
    }

    /// Extends the dirty set to every output reading a dirty output.
    ///
    /// Positions are topological, so one forward pass reaches the closure.
    pub fn propagate(&mut self, graph: &ReactiveGraph) {
        for position in 0..graph.len() {
            if self.dirty.contains_key(&position) {
                let upstream = graph.node_at(position).key().to_owned();
                for &reader in graph.readers_of_output(position) {
                    self.mark(reader, InvalidationReason::Upstream(upstream.clone()));
                }
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dirty.len()
    }

    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        self.dirty.contains_key(&position)
    }

    /// Empties the set, yielding dirty outputs in recomputation order.
    pub fn drain_ordered(&mut self) -> Vec<(usize, InvalidationReason)> {
        let mut drained: Vec<_> = self.dirty.drain(..).collect();
        drained.sort_by_key(|(position, _)| *position);
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::inputs::{Widget, WidgetStore};
    use crate::api::reactive::{Dependency, OutputNode};
    use crate::api::view::View;

    #[test]
    fn propagates_through_output_dependencies_in_order() {
        let mut widgets = WidgetStore::new();
        widgets
            .declare(Widget::switch("x", "X", true))
            .expect("switch");
        let graph = ReactiveGraph::build(
            vec![
                OutputNode::new("summary", vec![Dependency::output("table")], |_| {
                    Ok(View::Text(String::new()))
                }),
                OutputNode::new("table", vec![Dependency::input("x")], |_| {
                    Ok(View::Text(String::new()))
                }),
                OutputNode::new("other", vec![], |_| Ok(View::Text(String::new()))),
            ],
            Vec::new(),
            &widgets,
        )
        .expect("graph");

        let mut pending = PendingInvalidation::new();
        pending.invalidate_input(&graph, "x", &InvalidationReason::Input("x".to_owned()));
        pending.propagate(&graph);
        let drained = pending.drain_ordered();
        let keys: Vec<&str> = drained
            .iter()
            .map(|(position, _)| graph.node_at(*position).key())
            .collect();
        assert_eq!(keys, vec!["table", "summary"]);
        assert_eq!(
            drained[1].1,
            InvalidationReason::Upstream("table".to_owned())
        );
        assert!(pending.is_empty());
    }
}
