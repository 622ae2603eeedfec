// SPDX-License-Identifier: MIT

//! Runtime state contract for graph execution

use super::schema::{Reducible, StateField, StateSchema};
use std::fmt;

/// State record threaded through a graph.
///
/// Nodes never mutate the state directly. They return an `Update` naming a
/// subset of fields, and the executor folds it in with the schema's
/// reducers before the next node runs.
pub trait GraphState: Clone + Send + Sync + 'static {
    type Field: StateField;
    type Update: Clone + fmt::Debug + Send + Sync + 'static;

    /// Reducer table for every field
    fn schema() -> StateSchema<Self::Field>;

    /// Fields a partial update touches
    fn written(update: &Self::Update) -> Vec<Self::Field>;

    /// Fold a partial update into the current state
    fn apply(&mut self, update: Self::Update, schema: &StateSchema<Self::Field>);
}

/// Fold one optional update value into a field slot
pub fn fold_field<F: StateField, T: Reducible>(
    slot: &mut T,
    value: Option<T>,
    field: F,
    schema: &StateSchema<F>,
) {
    if let Some(value) = value {
        slot.reduce(value, schema.reducer(field));
    }
}
