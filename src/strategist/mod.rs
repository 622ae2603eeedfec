// SPDX-License-Identifier: MIT

//! Marketing strategy workflow: typed state, graph engine, nodes and their
//! collaborators

pub mod agent_factory;
pub mod config;
pub mod console;
pub mod nodes;
pub mod pipeline;
pub mod prompts;
pub mod state;
pub mod store;
pub mod tools;
pub mod workflow;
