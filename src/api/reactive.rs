use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::api::inputs::{Choice, InputValue, WidgetStore};
use crate::api::session::ViewContext;
use crate::api::view::View;
use crate::core::FittedModel;
use crate::error::{DashError, DashResult};

/// Upper bound on rule passes triggered by one input change.
pub const MAX_RULE_PASSES: usize = 16;

/// Something an output reads while it is computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Dependency {
    Input(String),
    Output(String),
}

impl Dependency {
    #[must_use]
    pub fn input(key: impl Into<String>) -> Self {
        Self::Input(key.into())
    }

    #[must_use]
    pub fn output(key: impl Into<String>) -> Self {
        Self::Output(key.into())
    }
}

pub type ComputeFn = Arc<dyn Fn(&ViewContext<'_>) -> DashResult<View> + Send + Sync>;
pub type RuleFn = Arc<dyn Fn(&mut RuleContext<'_>) -> DashResult<()> + Send + Sync>;

/// Derived output and the dependencies it declares.
#[derive(Clone)]
pub struct OutputNode {
    key: String,
    reads: Vec<Dependency>,
    compute: ComputeFn,
}

impl OutputNode {
    pub fn new<F>(key: impl Into<String>, reads: Vec<Dependency>, compute: F) -> Self
    where
        F: Fn(&ViewContext<'_>) -> DashResult<View> + Send + Sync + 'static,
    {
        Self {
            key: key.into(),
            reads,
            compute: Arc::new(compute),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn reads(&self) -> &[Dependency] {
        &self.reads
    }

    #[must_use]
    pub fn declares(&self, dependency: &Dependency) -> bool {
        self.reads.contains(dependency)
    }

    pub(crate) fn compute(&self, context: &ViewContext<'_>) -> DashResult<View> {
        (self.compute)(context)
    }
}

impl fmt::Debug for OutputNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputNode")
            .field("key", &self.key)
            .field("reads", &self.reads)
            .finish_non_exhaustive()
    }
}

/// Input-to-input effect such as keeping two axis selectors distinct.
#[derive(Clone)]
pub struct Rule {
    name: String,
    triggers: SmallVec<[String; 2]>,
    apply: RuleFn,
}

impl Rule {
    pub fn new<F>(name: impl Into<String>, triggers: impl IntoIterator<Item = String>, apply: F) -> Self
    where
        F: Fn(&mut RuleContext<'_>) -> DashResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            triggers: triggers.into_iter().collect(),
            apply: Arc::new(apply),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    fn is_triggered_by(&self, changed: &IndexSet<String>) -> bool {
        self.triggers.iter().any(|trigger| changed.contains(trigger))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("triggers", &self.triggers)
            .finish_non_exhaustive()
    }
}

/// Mutable view of the widget store handed to a rule.
pub struct RuleContext<'a> {
    model: &'a FittedModel,
    widgets: &'a mut WidgetStore,
    triggered_by: &'a IndexSet<String>,
    changed: IndexSet<String>,
    choices_changed: IndexSet<String>,
}

impl RuleContext<'_> {
    #[must_use]
    pub fn model(&self) -> &FittedModel {
        self.model
    }

    /// Returns `true` when `key` changed in the pass that triggered the rule.
    #[must_use]
    pub fn triggered_by(&self, key: &str) -> bool {
        self.triggered_by.contains(key)
    }

    pub fn value(&self, key: &str) -> DashResult<&InputValue> {
        self.widgets.value(key)
    }

    pub fn set_value(&mut self, key: &str, value: InputValue) -> DashResult<()> {
        if self.widgets.set(key, value)? {
            self.changed.insert(key.to_owned());
        }
        Ok(())
    }

    /// Replaces the choices offered by `key` and its selection.
    pub fn set_choices(
        &mut self,
        key: &str,
        choices: Vec<Choice>,
        selected: InputValue,
    ) -> DashResult<()> {
        let previous = self.widgets.value(key)?.clone();
        if self.widgets.set_choices(key, choices, selected.clone())? {
            self.choices_changed.insert(key.to_owned());
        }
        if previous != selected {
            self.changed.insert(key.to_owned());
        }
        Ok(())
    }
}

/// Outcome of running rules after an input change.
#[derive(Debug, Default)]
pub(crate) struct RuleOutcome {
    pub changed: IndexSet<String>,
    pub choices_changed: IndexSet<String>,
    pub settled: bool,
}

/// Output nodes in topological order plus the rules between inputs.
#[derive(Debug)]
pub struct ReactiveGraph {
    nodes: Vec<OutputNode>,
    positions: IndexMap<String, usize>,
    input_readers: IndexMap<String, Vec<usize>>,
    output_readers: Vec<Vec<usize>>,
    rules: Vec<Rule>,
}

impl ReactiveGraph {
    /// Validates declarations against `widgets` and sorts outputs with Kahn's
    /// algorithm. Ties keep declaration order.
    pub fn build(nodes: Vec<OutputNode>, rules: Vec<Rule>, widgets: &WidgetStore) -> DashResult<Self> {
        let mut declared: IndexMap<String, usize> = IndexMap::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if declared.insert(node.key.clone(), position).is_some() {
                return Err(DashError::DuplicateOutput(node.key.clone()));
            }
        }

        let mut indegree = vec![0_usize; nodes.len()];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (position, node) in nodes.iter().enumerate() {
            for dependency in &node.reads {
                match dependency {
                    Dependency::Input(key) if !widgets.contains(key) => {
                        return Err(DashError::UnknownDependency {
                            output: node.key.clone(),
                            dependency: key.clone(),
                        });
                    }
                    Dependency::Input(_) => {}
                    Dependency::Output(key) => {
                        let upstream = declared.get(key).copied().ok_or_else(|| {
                            DashError::UnknownDependency {
                                output: node.key.clone(),
                                dependency: key.clone(),
                            }
                        })?;
                        adjacency[upstream].push(position);
                        indegree[position] += 1;
                    }
                }
            }
        }

        for rule in &rules {
            if let Some(missing) = rule.triggers.iter().find(|key| !widgets.contains(key)) {
                return Err(DashError::UnknownInput(missing.clone()));
            }
        }

        let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&node| indegree[node] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &next in &adjacency[node] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != nodes.len() {
            let cycle = find_cycle(&adjacency)
                .unwrap_or_default()
                .into_iter()
                .map(|node| nodes[node].key.clone())
                .collect();
            return Err(DashError::Cycle(cycle));
        }

        let mut slots: Vec<Option<OutputNode>> = nodes.into_iter().map(Some).collect();
        let sorted: Vec<OutputNode> = order
            .iter()
            .filter_map(|&node| slots[node].take())
            .collect();
        let positions: IndexMap<String, usize> = sorted
            .iter()
            .enumerate()
            .map(|(position, node)| (node.key.clone(), position))
            .collect();

        let mut input_readers: IndexMap<String, Vec<usize>> = IndexMap::new();
        let mut output_readers = vec![Vec::new(); sorted.len()];
        for (position, node) in sorted.iter().enumerate() {
            for dependency in &node.reads {
                match dependency {
                    Dependency::Input(key) => {
                        input_readers.entry(key.clone()).or_default().push(position);
                    }
                    Dependency::Output(key) => {
                        if let Some(&upstream) = positions.get(key) {
                            output_readers[upstream].push(position);
                        }
                    }
                }
            }
        }

        debug!(
            outputs = sorted.len(),
            rules = rules.len(),
            inputs = input_readers.len(),
            "built reactive graph"
        );

        Ok(Self {
            nodes: sorted,
            positions,
            input_readers,
            output_readers,
            rules,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Output keys in recomputation order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(OutputNode::key)
    }

    #[must_use]
    pub fn node(&self, key: &str) -> Option<&OutputNode> {
        self.positions.get(key).map(|&position| &self.nodes[position])
    }

    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub(crate) fn node_at(&self, position: usize) -> &OutputNode {
        &self.nodes[position]
    }

    pub(crate) fn readers_of_input(&self, key: &str) -> &[usize] {
        self.input_readers.get(key).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn readers_of_output(&self, position: usize) -> &[usize] {
        self.output_readers.get(position).map_or(&[], Vec::as_slice)
    }

    /// Output keys that depend, directly or through other outputs, on `input`.
    #[must_use]
    pub fn dependents_of_input(&self, input: &str) -> Vec<&str> {
        let mut dirty = vec![false; self.nodes.len()];
        for &reader in self.readers_of_input(input) {
            dirty[reader] = true;
        }
        for position in 0..self.nodes.len() {
            if dirty[position] {
                for &reader in self.readers_of_output(position) {
                    dirty[reader] = true;
                }
            }
        }
        dirty
            .iter()
            .enumerate()
            .filter(|&(_, &is_dirty)| is_dirty)
            .map(|(position, _)| self.nodes[position].key())
            .collect()
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Runs rules triggered by `changed` until no rule changes anything more.
    pub(crate) fn run_rules(
        &self,
        model: &FittedModel,
        widgets: &mut WidgetStore,
        changed: IndexSet<String>,
    ) -> DashResult<RuleOutcome> {
        let mut outcome = RuleOutcome {
            changed: changed.clone(),
            ..RuleOutcome::default()
        };
        let mut frontier = changed;

        for _ in 0..MAX_RULE_PASSES {
            if frontier.is_empty() {
                outcome.settled = true;
                return Ok(outcome);
            }

            let mut next = IndexSet::new();
            for rule in self.rules.iter().filter(|rule| rule.is_triggered_by(&frontier)) {
                let mut context = RuleContext {
                    model,
                    widgets: &mut *widgets,
                    triggered_by: &frontier,
                    changed: IndexSet::new(),
                    choices_changed: IndexSet::new(),
                };
                (rule.apply)(&mut context)?;
                next.extend(context.changed);
                outcome.choices_changed.extend(context.choices_changed);
            }
            outcome.changed.extend(next.iter().cloned());
            frontier = next;
        }

        outcome.settled = frontier.is_empty();
        Ok(outcome)
    }
}

fn find_cycle(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum VisitState {
        Unvisited,
        Visiting,
        Visited,
    }

    fn dfs(
        node: usize,
        adjacency: &[Vec<usize>],
        state: &mut [VisitState],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        state[node] = VisitState::Visiting;
        stack.push(node);

        for &neighbour in &adjacency[node] {
            match state[neighbour] {
                VisitState::Unvisited => {
                    if let Some(cycle) = dfs(neighbour, adjacency, state, stack) {
                        return Some(cycle);
                    }
                }
                VisitState::Visiting => {
                    if let Some(position) = stack.iter().position(|&n| n == neighbour) {
                        let mut cycle = stack[position..].to_vec();
                        cycle.push(neighbour);
                        return Some(cycle);
                    }
                }
                VisitState::Visited => {}
            }
        }

        stack.pop();
        state[node] = VisitState::Visited;
        None
    }

    let mut state = vec![VisitState::Unvisited; adjacency.len()];
    for node in 0..adjacency.len() {
        if state[node] == VisitState::Unvisited {
            let mut stack = Vec::new();
            if let Some(cycle) = dfs(node, adjacency, &mut state, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::inputs::Widget;

    fn widgets() -> WidgetStore {
        let mut widgets = WidgetStore::new();
        widgets
            .declare(Widget::switch("flag", "Flag", false))
            .expect("switch");
        widgets
    }

    fn text_node(key: &str, reads: Vec<Dependency>) -> OutputNode {
        let text = key.to_owned();
        OutputNode::new(key, reads, move |_| Ok(View::Text(text.clone())))
    }

    #[test]
    fn sorts_outputs_after_their_upstreams() {
        let graph = ReactiveGraph::build(
            vec![
                text_node("b", vec![Dependency::output("a")]),
                text_node("a", vec![Dependency::input("flag")]),
                text_node("c", vec![]),
            ],
            Vec::new(),
            &widgets(),
        )
        .expect("graph");
        assert_eq!(graph.order().collect::<Vec<_>>(), vec!["a", "c", "b"]);
        assert_eq!(graph.dependents_of_input("flag"), vec!["a", "b"]);
    }

    #[test]
    fn rejects_cycles_with_the_offending_path() {
        let err = ReactiveGraph::build(
            vec![
                text_node("a", vec![Dependency::output("b")]),
                text_node("b", vec![Dependency::output("a")]),
            ],
            Vec::new(),
            &widgets(),
        )
        .expect_err("cycle");
        match err {
            DashError::Cycle(path) => {
                assert_eq!(path.first(), path.last());
                assert!(path.contains(&"a".to_owned()) && path.contains(&"b".to_owned()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_duplicate_and_unknown_declarations() {
        assert!(matches!(
            ReactiveGraph::build(
                vec![text_node("a", vec![]), text_node("a", vec![])],
                Vec::new(),
                &widgets()
            ),
            Err(DashError::DuplicateOutput(_))
        ));
        assert!(matches!(
            ReactiveGraph::build(
                vec![text_node("a", vec![Dependency::input("missing")])],
                Vec::new(),
                &widgets()
            ),
            Err(DashError::UnknownDependency { .. })
        ));
    }
}
