//! In-memory interaction store

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{sort_chronologically, Interaction, InteractionStore, Result, StoreStats};

/// Keeps interactions in a map keyed by session
#[derive(Debug, Default)]
pub struct MemoryInteractionStore {
    sessions: RwLock<HashMap<String, Vec<Interaction>>>,
}

impl MemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InteractionStore for MemoryInteractionStore {
    async fn append(&self, interaction: &Interaction) -> Result<()> {
        self.sessions
            .write()
            .await
            .entry(interaction.session_id.clone())
            .or_default()
            .push(interaction.clone());
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Interaction>> {
        let mut interactions = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default();
        sort_chronologically(&mut interactions);
        Ok(interactions)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let sessions = self.sessions.read().await;
        Ok(StoreStats {
            sessions: sessions.len(),
            interactions: sessions.values().map(Vec::len).sum(),
        })
    }
}
