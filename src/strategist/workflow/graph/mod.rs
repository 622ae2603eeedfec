// SPDX-License-Identifier: MIT

//! Graph workflow module
//!
//! A [`StateGraph`] is assembled from named nodes plus fixed and
//! conditional edges, validated once by [`StateGraph::compile`], and then
//! driven step by step through a [`GraphRun`].

mod builder;
mod executor;
mod node;

pub use builder::StateGraph;
pub use executor::{CompiledGraph, GraphRun, Step};
pub use node::{BlockingNode, Node, NodeId, Target};
