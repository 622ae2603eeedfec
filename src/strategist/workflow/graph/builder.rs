// SPDX-License-Identifier: MIT

//! Graph construction and compile-time validation

use super::executor::CompiledGraph;
use super::node::{BlockingNode, Node, NodeId, NodeRecord, Target};
use crate::adk::error::GraphError;
use crate::strategist::workflow::state::{GraphState, StateField};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

type Router<S, N> = Box<dyn Fn(&S) -> Result<Target<N>, GraphError> + Send + Sync>;

/// Outgoing edge of a node
pub(crate) enum Edge<S, N> {
    Fixed(Target<N>),
    Conditional {
        router: Router<S, N>,
        targets: Vec<Target<N>>,
    },
}

impl<S, N: Copy> Edge<S, N> {
    fn targets(&self) -> Vec<Target<N>> {
        match self {
            Edge::Fixed(target) => vec![*target],
            Edge::Conditional { targets, .. } => targets.clone(),
        }
    }

    pub(crate) fn resolve(&self, state: &S) -> Result<Target<N>, GraphError> {
        match self {
            Edge::Fixed(target) => Ok(*target),
            Edge::Conditional { router, .. } => router(state),
        }
    }
}

/// Mutable graph under construction
pub struct StateGraph<S: GraphState, N: NodeId> {
    nodes: HashMap<N, NodeRecord<S>>,
    order: Vec<N>,
    edges: HashMap<N, Edge<S, N>>,
    entry: Option<N>,
    inputs: Vec<S::Field>,
    max_steps: Option<usize>,
}

impl<S: GraphState, N: NodeId> Default for StateGraph<S, N> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            edges: HashMap::new(),
            entry: None,
            inputs: Vec::new(),
            max_steps: None,
        }
    }
}

impl<S: GraphState, N: NodeId> StateGraph<S, N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async node under `name`
    pub fn register(&mut self, name: N, node: impl Node<S> + 'static) -> Result<(), GraphError> {
        self.insert_node(name, NodeRecord::Async(Arc::new(node)))
    }

    /// Register a node that blocks its thread
    pub fn register_blocking(
        &mut self,
        name: N,
        node: impl BlockingNode<S> + 'static,
    ) -> Result<(), GraphError> {
        self.insert_node(name, NodeRecord::Blocking(Arc::new(node)))
    }

    fn insert_node(&mut self, name: N, record: NodeRecord<S>) -> Result<(), GraphError> {
        if self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateNode(name.to_string()));
        }
        self.order.push(name);
        self.nodes.insert(name, record);
        Ok(())
    }

    fn ensure_registered(&self, name: &N) -> Result<(), GraphError> {
        if self.nodes.contains_key(name) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(name.to_string()))
        }
    }

    fn insert_edge(&mut self, from: N, edge: Edge<S, N>) -> Result<(), GraphError> {
        self.ensure_registered(&from)?;
        for target in edge.targets() {
            if let Target::Node(to) = target {
                self.ensure_registered(&to)?;
            }
        }
        if self.edges.contains_key(&from) {
            return Err(GraphError::ConflictingEdge(from.to_string()));
        }
        self.edges.insert(from, edge);
        Ok(())
    }

    /// Unconditional edge `from -> to`
    pub fn add_edge(&mut self, from: N, to: impl Into<Target<N>>) -> Result<(), GraphError> {
        self.insert_edge(from, Edge::Fixed(to.into()))
    }

    /// Edge chosen at run time. `router` inspects the state after `from`
    /// ran and names a label; `mapping` turns labels into targets. A label
    /// outside the mapping, or no label at all, fails the run.
    pub fn add_conditional_edge<L, R, I>(
        &mut self,
        from: N,
        router: R,
        mapping: I,
    ) -> Result<(), GraphError>
    where
        L: Eq + Hash + fmt::Display + Send + Sync + 'static,
        R: Fn(&S) -> Option<L> + Send + Sync + 'static,
        I: IntoIterator<Item = (L, Target<N>)>,
    {
        let mapping: HashMap<L, Target<N>> = mapping.into_iter().collect();
        let targets = mapping.values().copied().collect();
        let from_name = from.to_string();

        let router: Router<S, N> = Box::new(move |state| match router(state) {
            Some(label) => mapping
                .get(&label)
                .copied()
                .ok_or_else(|| GraphError::Routing {
                    from: from_name.clone(),
                    label: label.to_string(),
                }),
            None => Err(GraphError::Routing {
                from: from_name.clone(),
                label: "<none>".to_string(),
            }),
        });

        self.insert_edge(from, Edge::Conditional { router, targets })
    }

    pub fn set_entry(&mut self, name: N) -> Result<(), GraphError> {
        self.ensure_registered(&name)?;
        self.entry = Some(name);
        Ok(())
    }

    /// Fields the caller seeds in the initial state
    pub fn set_inputs(&mut self, fields: impl IntoIterator<Item = S::Field>) {
        self.inputs = fields.into_iter().collect();
    }

    /// Maximum number of node executions per run; `None` is unbounded
    pub fn set_max_steps(&mut self, max_steps: Option<usize>) {
        self.max_steps = max_steps;
    }

    /// Validate the graph and freeze it for execution
    pub fn compile(self) -> Result<CompiledGraph<S, N>, GraphError> {
        let schema = S::schema();
        schema.validate()?;

        let entry = self.entry.ok_or(GraphError::MissingEntry)?;
        if let Some(node) = self.order.iter().find(|n| !self.edges.contains_key(*n)) {
            return Err(GraphError::MissingEdge(node.to_string()));
        }

        self.check_dataflow(entry)?;

        log::debug!(
            "Compiled graph with {} nodes, entry {}",
            self.nodes.len(),
            entry
        );

        Ok(CompiledGraph::new(
            self.nodes,
            self.edges,
            entry,
            schema,
            self.max_steps,
        ))
    }

    fn reachable(&self, entry: N) -> HashSet<N> {
        let mut seen = HashSet::from([entry]);
        let mut queue = VecDeque::from([entry]);
        while let Some(node) = queue.pop_front() {
            if let Some(edge) = self.edges.get(&node) {
                for target in edge.targets() {
                    if let Target::Node(next) = target {
                        if seen.insert(next) {
                            queue.push_back(next);
                        }
                    }
                }
            }
        }
        seen
    }

    /// Every field a node reads must be written on every path from the
    /// entry to that node (or seeded as an input).
    fn check_dataflow(&self, entry: N) -> Result<(), GraphError> {
        let all: BTreeSet<S::Field> = S::Field::ALL.iter().copied().collect();
        let inputs: BTreeSet<S::Field> = self.inputs.iter().copied().collect();
        let reachable = self.reachable(entry);

        let mut preds: HashMap<N, Vec<N>> = HashMap::new();
        for (from, edge) in &self.edges {
            if !reachable.contains(from) {
                continue;
            }
            for target in edge.targets() {
                if let Target::Node(to) = target {
                    preds.entry(to).or_default().push(*from);
                }
            }
        }

        let mut available: HashMap<N, BTreeSet<S::Field>> =
            reachable.iter().map(|n| (*n, all.clone())).collect();

        let mut changed = true;
        while changed {
            changed = false;
            for node in self.order.iter().filter(|n| reachable.contains(*n)) {
                let mut incoming = if *node == entry {
                    inputs.clone()
                } else {
                    all.clone()
                };
                for pred in preds.get(node).into_iter().flatten() {
                    let mut out = available[pred].clone();
                    out.extend(self.nodes[pred].writes().iter().copied());
                    incoming = incoming.intersection(&out).copied().collect();
                }
                if available[node] != incoming {
                    available.insert(*node, incoming);
                    changed = true;
                }
            }
        }

        for node in &self.order {
            if !reachable.contains(node) {
                log::warn!("Node {} is unreachable from {}", node, entry);
                continue;
            }
            for field in self.nodes[node].reads() {
                if !available[node].contains(field) {
                    return Err(GraphError::UnsatisfiedInput {
                        node: node.to_string(),
                        field: field.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
