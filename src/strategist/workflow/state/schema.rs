// SPDX-License-Identifier: MIT

//! State schema definitions

use crate::adk::error::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

/// How a partial update is merged into the current value of a field
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    /// Replace the value (default)
    #[default]
    Replace,
    /// Concatenate onto a sequence
    Append,
}

/// Shape of a state field, used to check reducer compatibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Sequence,
}

/// A closed set of named state fields
pub trait StateField:
    Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Every field of the state, in declaration order
    const ALL: &'static [Self];

    fn kind(self) -> FieldKind;
}

/// Field -> reducer table
#[derive(Debug, Clone)]
pub struct StateSchema<F: StateField> {
    reducers: BTreeMap<F, Reducer>,
    duplicates: Vec<F>,
}

impl<F: StateField> Default for StateSchema<F> {
    fn default() -> Self {
        Self {
            reducers: BTreeMap::new(),
            duplicates: Vec::new(),
        }
    }
}

impl<F: StateField> StateSchema<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with its reducer
    pub fn field(mut self, field: F, reducer: Reducer) -> Self {
        if self.reducers.insert(field, reducer).is_some() {
            self.duplicates.push(field);
        }
        self
    }

    /// Reducer for `field`. Validated schemas declare every field, so the
    /// fallback only matters for schemas that were never validated.
    pub fn reducer(&self, field: F) -> Reducer {
        self.reducers.get(&field).copied().unwrap_or_default()
    }

    /// Every field declared exactly once, and APPEND only on sequences
    pub fn validate(&self) -> Result<(), GraphError> {
        if let Some(field) = self.duplicates.first() {
            return Err(GraphError::Schema(format!(
                "field '{}' declared more than once",
                field
            )));
        }

        for field in F::ALL {
            match self.reducers.get(field) {
                None => {
                    return Err(GraphError::Schema(format!(
                        "field '{}' has no reducer",
                        field
                    )))
                }
                Some(Reducer::Append) if field.kind() != FieldKind::Sequence => {
                    return Err(GraphError::Schema(format!(
                        "field '{}' is not a sequence and cannot use the append reducer",
                        field
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

/// A field value that can absorb a partial update
pub trait Reducible {
    fn reduce(&mut self, update: Self, reducer: Reducer);
}

impl<T> Reducible for Vec<T> {
    fn reduce(&mut self, update: Self, reducer: Reducer) {
        match reducer {
            Reducer::Replace => *self = update,
            Reducer::Append => self.extend(update),
        }
    }
}

impl<T> Reducible for Option<T> {
    fn reduce(&mut self, update: Self, _reducer: Reducer) {
        *self = update;
    }
}

macro_rules! replace_only {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reducible for $ty {
                fn reduce(&mut self, update: Self, _reducer: Reducer) {
                    *self = update;
                }
            }
        )*
    };
}

replace_only!(String, bool, u32, usize);
