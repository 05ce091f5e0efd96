use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

use crate::chat::{ChatResponder, ChatService, DEFAULT_HISTORY_LIMIT};
use crate::config::Config;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::ContentKind;
use crate::database::sqlite::queries::KnowledgeItemQueries;
use crate::embeddings::{self, EmbeddingWorker, OpenAiClient};
use crate::knowledge::KnowledgeBase;

async fn open_database(config: &Config) -> Result<Database> {
    let data_dir = config.data_dir().context("Failed to resolve data directory")?;
    Database::initialize_from_data_dir(&data_dir)
        .await
        .context("Failed to initialize database")
}

/// Rebuild the whole knowledge base from source content. With a provider
/// configured the rebuild enqueues one embedding task per item and a
/// worker drains the queue before the command returns.
#[inline]
pub async fn rebuild() -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config).await?;

    let Some(client) = OpenAiClient::from_config(&config.openai) else {
        let count = KnowledgeBase::new(database).rebuild_all().await?;
        println!("Rebuilt knowledge base with {} items", count);
        println!("No embedding provider configured; items stored without vectors.");
        println!("Run 'folio-chat config' to set an API key, then 'folio-chat embed'.");
        return Ok(());
    };

    let (embed_tx, embed_rx) = embeddings::embed_channel();
    let worker = EmbeddingWorker::new(database.clone(), client, embed_rx);
    let worker_handle = tokio::spawn(worker.run());

    let knowledge = KnowledgeBase::new(database).with_embed_queue(embed_tx);
    let count = knowledge.rebuild_all().await?;
    println!("Rebuilt knowledge base with {} items", count);

    // Dropping the store drops the only sender; the worker exits once the
    // queued tasks are done.
    drop(knowledge);
    worker_handle.await.context("Embedding worker panicked")?;
    println!("Embedding generation finished");

    Ok(())
}

/// Embed every knowledge item still missing a vector.
#[inline]
pub async fn embed() -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config).await?;

    let Some(client) = OpenAiClient::from_config(&config.openai) else {
        println!("No embedding provider configured.");
        println!("Run 'folio-chat config' to set an API key first.");
        return Ok(());
    };

    let embedded = embeddings::process_pending(&database, &client).await?;
    if embedded == 0 {
        println!("All knowledge items already have embeddings.");
    } else {
        println!("Generated embeddings for {} items", embedded);
    }

    Ok(())
}

/// Answer one question and record the exchange. A fresh session id is
/// minted when the caller does not supply one, so the exchange can be
/// continued with `--session`.
#[inline]
pub async fn ask(question: &str, session_id: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config).await?;

    let session = session_id.map_or_else(|| Uuid::new_v4().to_string(), str::to_string);

    let service = chat_service(&config, database);
    let message = service.ask(question, Some(&session)).await?;

    if let Some(answer) = &message.answer {
        println!("{}", answer);
    }
    if session_id.is_none() {
        println!();
        println!("(session: {} — pass --session to continue this conversation)", session);
    }

    Ok(())
}

/// Print the merged history for a session.
#[inline]
pub async fn history(session_id: &str, limit: Option<i64>) -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config).await?;

    let service = chat_service(&config, database);
    let messages = service
        .history(session_id, limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
        .await?;

    if messages.is_empty() {
        println!("No chat history for session '{}'.", session_id);
        return Ok(());
    }

    for message in &messages {
        println!("[{}] Q: {}", message.created_at.format("%Y-%m-%d %H:%M"), message.question);
        if let Some(answer) = &message.answer {
            println!("           A: {}", answer);
        }
        println!();
    }

    Ok(())
}

/// Show per-kind item counts and embedding progress.
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load()?;
    let database = open_database(&config).await?;
    let pool = database.pool();

    println!("Knowledge base status:");
    println!();

    let mut total = 0;
    for kind in ContentKind::ALL {
        let count = KnowledgeItemQueries::count_by_kind(pool, kind).await?;
        total += count;
        println!("  {:<14} {}", kind.as_str(), count);
    }

    let embedded = KnowledgeItemQueries::count_embedded(pool).await?;
    println!();
    println!("  Total items:   {}", total);
    println!("  With vectors:  {}", embedded);
    println!("  Pending:       {}", total - embedded);

    if !config.provider_configured() {
        println!();
        println!("No embedding provider configured; similarity search is unavailable.");
    }

    info!("Status reported for {} knowledge items", total);
    Ok(())
}

fn chat_service(config: &Config, database: Database) -> ChatService {
    let client = OpenAiClient::from_config(&config.openai);
    let responder = ChatResponder::new(
        KnowledgeBase::new(database),
        client,
        config.retrieval,
    );
    ChatService::new(responder)
}
