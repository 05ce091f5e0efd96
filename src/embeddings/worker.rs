//! Background embedding generation.
//!
//! Knowledge writes enqueue one task per inserted item; the worker drains
//! the queue and fills the `embedding` column. A failed task is logged and
//! dropped, leaving the item unembedded until the next full embed pass
//! (`process_pending`), which scans for rows with a NULL embedding.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::database::sqlite::Database;
use crate::database::sqlite::queries::KnowledgeItemQueries;
use crate::embeddings::openai::OpenAiClient;

/// One unit of embedding work: the knowledge item to (re)embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedTask {
    pub item_id: i64,
}

/// Channel pair connecting knowledge writes to the worker.
#[inline]
pub fn embed_channel() -> (
    mpsc::UnboundedSender<EmbedTask>,
    mpsc::UnboundedReceiver<EmbedTask>,
) {
    mpsc::unbounded_channel()
}

#[derive(Debug)]
pub struct EmbeddingWorker {
    database: Database,
    client: OpenAiClient,
    receiver: mpsc::UnboundedReceiver<EmbedTask>,
}

impl EmbeddingWorker {
    #[inline]
    pub fn new(
        database: Database,
        client: OpenAiClient,
        receiver: mpsc::UnboundedReceiver<EmbedTask>,
    ) -> Self {
        Self {
            database,
            client,
            receiver,
        }
    }

    /// Drain tasks until every sender is dropped. Task failures never stop
    /// the loop; content writes must not depend on provider availability.
    #[inline]
    pub async fn run(mut self) {
        while let Some(task) = self.receiver.recv().await {
            if let Err(error) = embed_item(&self.database, &self.client, task.item_id).await {
                warn!(
                    "Failed to embed knowledge item {}: {:#}",
                    task.item_id, error
                );
            }
        }
        debug!("Embedding queue closed, worker exiting");
    }
}

/// Embed every knowledge item that has no vector yet. Returns how many
/// were embedded; items that fail are logged and left for a later pass.
#[inline]
pub async fn process_pending(database: &Database, client: &OpenAiClient) -> Result<usize> {
    let pending = KnowledgeItemQueries::list_pending_embedding(database.pool()).await?;

    if pending.is_empty() {
        debug!("No knowledge items awaiting embedding");
        return Ok(0);
    }

    info!("Embedding {} pending knowledge items", pending.len());

    let mut embedded = 0;
    for item in pending {
        match embed_item(database, client, item.id).await {
            Ok(()) => embedded += 1,
            Err(error) => warn!("Failed to embed knowledge item {}: {:#}", item.id, error),
        }
    }

    Ok(embedded)
}

/// Fetch, embed, and store the vector for one item. Missing items are a
/// no-op: the source entity may have been deleted while the task was
/// queued.
async fn embed_item(database: &Database, client: &OpenAiClient, item_id: i64) -> Result<()> {
    let Some(item) = KnowledgeItemQueries::get_by_id(database.pool(), item_id).await? else {
        debug!("Knowledge item {} vanished before embedding, skipping", item_id);
        return Ok(());
    };

    let text = format!("{}: {}", item.title, item.content);

    // ureq is blocking; keep the reactor free while the request runs.
    let client = client.clone();
    let embedding = tokio::task::spawn_blocking(move || client.embed(&text))
        .await
        .context("Embedding task panicked")??;

    let encoded =
        serde_json::to_string(&embedding).context("Failed to serialize embedding vector")?;
    KnowledgeItemQueries::set_embedding(database.pool(), item_id, &encoded).await?;

    debug!(
        "Stored {}-dimension embedding for knowledge item {}",
        embedding.len(),
        item_id
    );
    Ok(())
}
