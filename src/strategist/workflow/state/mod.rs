// SPDX-License-Identifier: MIT

//! Workflow state: field schemas, reducers and update folding

mod schema;
mod store;

pub use schema::{FieldKind, Reducer, Reducible, StateField, StateSchema};
pub use store::{fold_field, GraphState};
