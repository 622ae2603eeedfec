// SPDX-License-Identifier: MIT

//! Workflow engine: typed state with reducers and a compiled state graph

pub mod graph;
pub mod state;
