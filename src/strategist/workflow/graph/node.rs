// SPDX-License-Identifier: MIT

//! Node contracts

use crate::adk::error::StrategistError;
use crate::strategist::workflow::state::GraphState;
use async_trait::async_trait;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Identifier of a node. Workflows use a closed enum.
pub trait NodeId: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> NodeId for T where T: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// Where an edge leads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target<N> {
    Node(N),
    End,
}

impl<N> From<N> for Target<N> {
    fn from(node: N) -> Self {
        Target::Node(node)
    }
}

/// A unit of work reading the state and returning a partial update.
///
/// `reads` lists the fields that must have been written on every path
/// reaching the node. Fields a node only consults opportunistically, such
/// as feedback from a later loop iteration, are left out.
#[async_trait]
pub trait Node<S: GraphState>: Send + Sync {
    fn reads(&self) -> &[S::Field] {
        &[]
    }

    fn writes(&self) -> &[S::Field];

    async fn run(&self, state: &S) -> Result<S::Update, StrategistError>;
}

/// A node that blocks its thread (console input). Executed off the async
/// runtime on a snapshot of the state.
pub trait BlockingNode<S: GraphState>: Send + Sync {
    fn reads(&self) -> &[S::Field] {
        &[]
    }

    fn writes(&self) -> &[S::Field];

    fn run(&self, state: &S) -> Result<S::Update, StrategistError>;
}

pub(crate) enum NodeRecord<S: GraphState> {
    Async(Arc<dyn Node<S>>),
    Blocking(Arc<dyn BlockingNode<S>>),
}

impl<S: GraphState> NodeRecord<S> {
    pub(crate) fn reads(&self) -> &[S::Field] {
        match self {
            NodeRecord::Async(node) => node.reads(),
            NodeRecord::Blocking(node) => node.reads(),
        }
    }

    pub(crate) fn writes(&self) -> &[S::Field] {
        match self {
            NodeRecord::Async(node) => node.writes(),
            NodeRecord::Blocking(node) => node.writes(),
        }
    }

    pub(crate) async fn execute(&self, state: &S) -> Result<S::Update, StrategistError> {
        match self {
            NodeRecord::Async(node) => node.run(state).await,
            NodeRecord::Blocking(node) => {
                let node = Arc::clone(node);
                let snapshot = state.clone();
                tokio::task::spawn_blocking(move || node.run(&snapshot))
                    .await
                    .map_err(|e| StrategistError::other(format!("blocking node aborted: {}", e)))?
            }
        }
    }
}
