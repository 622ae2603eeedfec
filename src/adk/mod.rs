// SPDX-License-Identifier: MIT

//! Agent development kit: vendor adapters, tools and the text-generation
//! capability the strategist nodes are written against.

pub mod agent;
pub mod error;
pub mod model;
pub mod retry;
pub mod schema;
pub mod tool;
