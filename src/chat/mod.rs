//! Retrieval-augmented chat over the knowledge base.
//!
//! The responder never errors to its caller: every failure path resolves
//! to a text answer. Only question validation surfaces as an error, from
//! `ChatService::ask`, and nothing is persisted in that case.

#[cfg(test)]
mod tests;

mod responder;

pub use responder::ChatResponder;

use tracing::debug;

use crate::database::sqlite::models::ChatMessage;
use crate::database::sqlite::queries::ChatMessageQueries;
use crate::{FolioError, Result};

pub const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// Question-in, persisted-message-out surface consumed by the chat UI.
#[derive(Debug)]
pub struct ChatService {
    responder: ChatResponder,
}

impl ChatService {
    #[inline]
    pub fn new(responder: ChatResponder) -> Self {
        Self { responder }
    }

    /// Answer a question and persist the exchange for the session.
    ///
    /// An empty (post-trim) question is rejected with a field-level
    /// validation error and no row is written.
    #[inline]
    pub async fn ask(&self, question: &str, session_id: Option<&str>) -> Result<ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return Err(FolioError::validation("question", "can't be blank"));
        }

        let answer = self.responder.respond(question).await;

        let message = ChatMessageQueries::append(
            self.responder.database().pool(),
            session_id,
            question,
            &answer,
        )
        .await?;

        debug!("Recorded chat message {} for session {:?}", message.id, session_id);
        Ok(message)
    }

    /// Messages for a session plus legacy rows with no session id, oldest
    /// first.
    #[inline]
    pub async fn history(&self, session_id: &str, limit: i64) -> Result<Vec<ChatMessage>> {
        let messages =
            ChatMessageQueries::history_for(self.responder.database().pool(), session_id, limit)
                .await?;
        Ok(messages)
    }
}
