use crate::traits::InteractionStore;
use crate::types::{InteractionGroup, RemoteEvent, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Looks up comments and likes recorded locally against mirrored posts
pub struct LocalInteractionCollector {
    store: Arc<dyn InteractionStore>,
}

impl LocalInteractionCollector {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store }
    }

    /// The whole event set goes to the store; matching events to posts is
    /// the store's business.
    pub async fn collect_interactions(&self, events: &[RemoteEvent]) -> Result<Vec<InteractionGroup>> {
        debug!("Collecting local interactions for {} events", events.len());

        let groups = self.store.collect_interactions(events).await?;

        info!("Found interactions on {} mirrored posts", groups.len());
        Ok(groups)
    }
}
