// SPDX-License-Identifier: MIT

use crate::adk::error::StrategistError;
use crate::strategist::state::{StrategyField, StrategyState, StrategyUpdate};
use crate::strategist::store::ArtifactStore;
use crate::strategist::workflow::graph::Node;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Writes the final document under a fresh identifier and replaces
/// `final_output` with the confirmation naming the storage path
pub struct SaveFileNode {
    store: Arc<dyn ArtifactStore>,
}

impl SaveFileNode {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Node<StrategyState> for SaveFileNode {
    fn reads(&self) -> &[StrategyField] {
        &[StrategyField::FinalOutput]
    }

    fn writes(&self) -> &[StrategyField] {
        &[StrategyField::FinalOutput]
    }

    async fn run(&self, state: &StrategyState) -> Result<StrategyUpdate, StrategistError> {
        let id = Uuid::new_v4().to_string();
        let path = self.store.save(&id, &state.final_output).await?;

        Ok(StrategyUpdate {
            final_output: Some(format!("Saved final output to {}", path.display())),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategist::store::FileStore;

    #[tokio::test]
    async fn test_confirmation_names_written_file() {
        let tmp = tempfile::tempdir().unwrap();
        let node = SaveFileNode::new(Arc::new(FileStore::new(tmp.path())));
        let state = StrategyState {
            final_output: "# Acme strategy".into(),
            ..Default::default()
        };

        let update = node.run(&state).await.unwrap();
        let confirmation = update.final_output.unwrap();
        let path = confirmation.strip_prefix("Saved final output to ").unwrap();

        assert!(path.ends_with(".md"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Acme strategy");
    }
}
