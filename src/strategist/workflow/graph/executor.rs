// SPDX-License-Identifier: MIT

//! Graph workflow executor

use super::builder::Edge;
use super::node::{NodeId, NodeRecord, Target};
use crate::adk::error::{GraphError, StrategistError};
use crate::strategist::workflow::state::{GraphState, StateSchema};
use futures::Stream;
use std::collections::HashMap;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Validated graph, ready to run any number of times
pub struct CompiledGraph<S: GraphState, N: NodeId> {
    nodes: HashMap<N, NodeRecord<S>>,
    edges: HashMap<N, Edge<S, N>>,
    entry: N,
    schema: StateSchema<S::Field>,
    max_steps: Option<usize>,
}

impl<S: GraphState, N: NodeId> CompiledGraph<S, N> {
    pub(super) fn new(
        nodes: HashMap<N, NodeRecord<S>>,
        edges: HashMap<N, Edge<S, N>>,
        entry: N,
        schema: StateSchema<S::Field>,
        max_steps: Option<usize>,
    ) -> Self {
        Self {
            nodes,
            edges,
            entry,
            schema,
            max_steps,
        }
    }

    pub fn entry(&self) -> N {
        self.entry
    }

    pub fn max_steps(&self) -> Option<usize> {
        self.max_steps
    }

    /// Start a lazy run from `initial`. Nothing executes until the run is
    /// polled.
    pub fn run(&self, initial: S) -> GraphRun<'_, S, N> {
        GraphRun {
            graph: self,
            state: initial,
            cursor: Cursor::At(self.entry),
            steps: 0,
            cancel: None,
        }
    }

    /// Drive a run to completion and return the final state
    pub async fn invoke(&self, initial: S) -> Result<S, StrategistError> {
        let mut run = self.run(initial);
        while let Some(step) = run.next_step().await {
            step?;
        }
        Ok(run.into_state())
    }

    fn route(&self, from: N, state: &S) -> Result<Target<N>, GraphError> {
        match self.edges.get(&from) {
            Some(edge) => edge.resolve(state),
            None => Err(GraphError::MissingEdge(from.to_string())),
        }
    }
}

/// One executed node and the partial update it produced
pub struct Step<S: GraphState, N> {
    pub node: N,
    pub update: S::Update,
}

impl<S: GraphState, N: fmt::Debug> fmt::Debug for Step<S, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("node", &self.node)
            .field("update", &self.update)
            .finish()
    }
}

enum Cursor<N> {
    At(N),
    Failed(StrategistError),
    Done,
}

/// An in-progress execution.
///
/// Each call to [`GraphRun::next_step`] runs one node, folds its update
/// into the run's private state and resolves the next edge. Once the run
/// reaches the terminal, fails, or is cancelled it yields `None` forever.
pub struct GraphRun<'g, S: GraphState, N: NodeId> {
    graph: &'g CompiledGraph<S, N>,
    state: S,
    cursor: Cursor<N>,
    steps: usize,
    cancel: Option<CancellationToken>,
}

impl<'g, S: GraphState, N: NodeId> GraphRun<'g, S, N> {
    /// Abort the in-flight node when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.cursor, Cursor::Done)
    }

    /// Execute the next node. `None` once the run is over.
    pub async fn next_step(&mut self) -> Option<Result<Step<S, N>, StrategistError>> {
        let current = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return None,
            Cursor::Failed(err) => return Some(Err(err)),
            Cursor::At(node) => node,
        };

        Some(self.execute(current).await)
    }

    async fn execute(&mut self, current: N) -> Result<Step<S, N>, StrategistError> {
        let graph = self.graph;

        if let Some(limit) = graph.max_steps {
            if self.steps >= limit {
                log::error!("Graph execution exceeded {} steps", limit);
                return Err(GraphError::StepLimitExceeded { limit }.into());
            }
        }

        let record = graph
            .nodes
            .get(&current)
            .ok_or_else(|| GraphError::UnknownNode(current.to_string()))?;

        log::info!("Executing node: {}", current);

        let result = match &self.cancel {
            Some(token) => {
                if token.is_cancelled() {
                    return Err(StrategistError::Cancelled);
                }
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        log::warn!("Node {} cancelled", current);
                        Err(StrategistError::Cancelled)
                    }
                    result = record.execute(&self.state) => result,
                }
            }
            None => record.execute(&self.state).await,
        };

        let update = result.map_err(|e| {
            log::error!("Node {} failed: {}", current, e);
            e
        })?;

        if let Some(field) = S::written(&update)
            .into_iter()
            .find(|field| !record.writes().contains(field))
        {
            return Err(GraphError::UndeclaredWrite {
                node: current.to_string(),
                field: field.to_string(),
            }
            .into());
        }

        self.state.apply(update.clone(), &graph.schema);
        self.steps += 1;
        log::info!("Node {} completed", current);

        // The step itself succeeded; a routing fault surfaces on the next poll
        self.cursor = match graph.route(current, &self.state) {
            Ok(Target::Node(next)) => Cursor::At(next),
            Ok(Target::End) => Cursor::Done,
            Err(err) => {
                log::error!("Routing after {} failed: {}", current, err);
                Cursor::Failed(err.into())
            }
        };

        Ok(Step {
            node: current,
            update,
        })
    }

    /// Consume the run as a stream of steps
    pub fn into_stream(self) -> impl Stream<Item = Result<Step<S, N>, StrategistError>> + 'g {
        futures::stream::unfold(self, |mut run| async move {
            let item = run.next_step().await?;
            Some((item, run))
        })
    }
}
