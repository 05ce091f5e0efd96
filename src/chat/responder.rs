use anyhow::{Context, Result};
use tracing::{debug, error, warn};

use crate::config::RetrievalConfig;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::KnowledgeItem;
use crate::database::sqlite::queries::{ContentQueries, KnowledgeItemQueries};
use crate::embeddings::OpenAiClient;
use crate::knowledge::KnowledgeBase;

const TROUBLE_RESPONSE: &str = "I'm sorry, I'm having trouble processing your question right now. \
                                Please try again later.";

const EXCERPT_MAX_CHARS: usize = 200;

/// Recruitment-domain terms matched against the question in addition to
/// its own words, so "what stack do they use?" still finds skills items.
const RECRUITMENT_KEYWORDS: &[&str] = &[
    "experience",
    "work",
    "job",
    "career",
    "skill",
    "skills",
    "education",
    "degree",
    "university",
    "certification",
    "certificate",
    "project",
    "portfolio",
    "blog",
    "language",
    "framework",
    "rust",
    "python",
    "javascript",
    "typescript",
    "java",
    "react",
    "available",
    "availability",
    "remote",
    "contract",
    "senior",
    "junior",
    "lead",
];

/// Answers questions about the candidate from the knowledge base.
///
/// Provider configuration is injected at construction; `None` means every
/// question takes the keyword-fallback path.
#[derive(Debug)]
pub struct ChatResponder {
    knowledge: KnowledgeBase,
    client: Option<OpenAiClient>,
    retrieval: RetrievalConfig,
}

impl ChatResponder {
    #[inline]
    pub fn new(
        knowledge: KnowledgeBase,
        client: Option<OpenAiClient>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            knowledge,
            client,
            retrieval,
        }
    }

    #[inline]
    pub fn database(&self) -> &Database {
        self.knowledge.database()
    }

    /// Answer a question. Never errors: provider and retrieval failures
    /// degrade to keyword fallback, anything unexpected to a generic
    /// try-again-later response.
    #[inline]
    pub async fn respond(&self, question: &str) -> String {
        match self.answer(question).await {
            Ok(answer) => answer,
            Err(error) => {
                error!("Chat responder error: {:#}", error);
                TROUBLE_RESPONSE.to_string()
            }
        }
    }

    async fn answer(&self, question: &str) -> Result<String> {
        if let Some(client) = &self.client {
            if let Some(answer) = self.provider_answer(client, question).await? {
                return Ok(answer);
            }
        } else {
            debug!("No chat provider configured, using fallback response");
        }

        self.fallback_answer(question).await
    }

    /// The embed/retrieve/generate path. `Ok(None)` means "use the
    /// fallback": provider errors and empty retrievals are expected
    /// outcomes here, only local failures (the database, a panicked
    /// blocking task) propagate.
    async fn provider_answer(
        &self,
        client: &OpenAiClient,
        question: &str,
    ) -> Result<Option<String>> {
        let embed_client = client.clone();
        let embed_input = question.to_string();
        let query = match tokio::task::spawn_blocking(move || embed_client.embed(&embed_input))
            .await
            .context("Embedding task panicked")?
        {
            Ok(query) => query,
            Err(error) => {
                warn!("Failed to embed question, using fallback: {:#}", error);
                return Ok(None);
            }
        };

        let items = self
            .knowledge
            .find_similar(
                &query,
                self.retrieval.context_limit,
                self.retrieval.similarity_threshold,
            )
            .await?;

        if items.is_empty() {
            debug!("No knowledge items above similarity threshold, using fallback");
            return Ok(None);
        }

        let candidate = self.candidate_name().await?;
        let system = system_prompt(candidate.as_deref());
        let user = user_prompt(&items, question);

        let chat_client = client.clone();
        let completion =
            tokio::task::spawn_blocking(move || chat_client.chat_completion(&system, &user))
                .await
                .context("Chat completion task panicked")?;

        match completion {
            Ok(text) if !text.trim().is_empty() => Ok(Some(text)),
            Ok(_) => {
                warn!("Chat completion returned empty text, using fallback");
                Ok(None)
            }
            Err(error) => {
                warn!("Chat completion failed, using fallback: {:#}", error);
                Ok(None)
            }
        }
    }

    /// Keyword matching over the knowledge base, provider-free.
    async fn fallback_answer(&self, question: &str) -> Result<String> {
        let items = KnowledgeItemQueries::list_all(self.database().pool()).await?;
        let keywords = extract_keywords(question);

        if let Some(item) = best_keyword_match(&items, &keywords) {
            return Ok(format!(
                "Here's what I found: {} Feel free to ask for more detail.",
                excerpt(&item.content, EXCERPT_MAX_CHARS)
            ));
        }

        let candidate = self.candidate_name().await?;
        Ok(topic_menu(candidate.as_deref()))
    }

    async fn candidate_name(&self) -> Result<Option<String>> {
        let info = ContentQueries::personal_info(self.database().pool()).await?;
        Ok(info
            .map(|info| info.name)
            .filter(|name| !name.trim().is_empty()))
    }
}

fn system_prompt(candidate: Option<&str>) -> String {
    let subject = candidate.unwrap_or("the candidate");
    format!(
        "You are a helpful assistant representing {} to recruiters and other visitors \
         of their portfolio site. Be professional and concise. Answer using only the \
         provided background information; if it does not cover the question, say so \
         instead of guessing.",
        subject
    )
}

fn user_prompt(items: &[KnowledgeItem], question: &str) -> String {
    let context = items
        .iter()
        .map(|item| format!("{}: {}", item.title, item.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Based on the following background information, please answer this question: {}\n\n\
         Background information:\n{}\n\n\
         Please provide a helpful and accurate response based only on the information provided.",
        question, context
    )
}

/// Lowercased words longer than 2 chars from the question, plus any
/// recruitment-domain term the question mentions.
fn extract_keywords(question: &str) -> Vec<String> {
    let lowered = question.to_lowercase();

    let mut keywords: Vec<String> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() > 2)
        .map(str::to_string)
        .collect();

    for keyword in RECRUITMENT_KEYWORDS {
        if lowered.contains(keyword) && !keywords.iter().any(|k| k == keyword) {
            keywords.push((*keyword).to_string());
        }
    }

    keywords.dedup();
    keywords
}

/// Item with the most keyword hits in title or content; ties go to the
/// earlier item in scan order.
fn best_keyword_match<'a>(items: &'a [KnowledgeItem], keywords: &[String]) -> Option<&'a KnowledgeItem> {
    let mut best: Option<(&KnowledgeItem, usize)> = None;

    for item in items {
        let haystack = format!("{} {}", item.title, item.content).to_lowercase();
        let hits = keywords
            .iter()
            .filter(|keyword| haystack.contains(keyword.as_str()))
            .count();

        if hits > 0 && best.is_none_or(|(_, best_hits)| hits > best_hits) {
            best = Some((item, hits));
        }
    }

    best.map(|(item, _)| item)
}

fn topic_menu(candidate: Option<&str>) -> String {
    let whose = candidate.map_or_else(
        || "this person's".to_string(),
        |name| format!("{}'s", name),
    );
    format!(
        "I'd be happy to help you learn more about {} background. You can ask about \
         their experience, skills, education, certifications, projects, or blog posts.",
        whose
    )
}

/// Char-boundary-safe truncation in the style of a display excerpt: at
/// most `max_chars` total, ellipsis included when cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().nth(max_chars).is_none() {
        return text.to_string();
    }

    let kept = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(kept).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::sqlite::models::ContentKind;
    use chrono::Utc;

    fn item(id: i64, title: &str, content: &str) -> KnowledgeItem {
        let now = Utc::now().naive_utc();
        KnowledgeItem {
            id,
            content_type: ContentKind::CvEntry,
            content_id: id,
            title: title.to_string(),
            content: content.to_string(),
            embedding: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn keywords_drop_short_words() {
        let keywords = extract_keywords("What is it he of an do at my");
        assert!(keywords.iter().all(|k| k.chars().count() > 2));
        assert!(keywords.contains(&"what".to_string()));
        assert!(!keywords.contains(&"is".to_string()));
    }

    #[test]
    fn keywords_include_recruitment_terms() {
        // "skills" appears embedded in the question, so the domain list
        // contributes it even though tokenization already found it.
        let keywords = extract_keywords("what skills does she have?");
        assert!(keywords.contains(&"skills".to_string()));
        assert!(keywords.contains(&"skill".to_string()));
    }

    #[test]
    fn keywords_are_lowercased() {
        let keywords = extract_keywords("Tell me about EDUCATION");
        assert!(keywords.contains(&"education".to_string()));
    }

    #[test]
    fn best_match_prefers_most_hits() {
        let items = vec![
            item(1, "Project: Side Hustle", "rust tooling work"),
            item(2, "Work Experience: Two", "rust backend experience and leadership"),
        ];
        let keywords = extract_keywords("rust backend experience");

        let best = best_keyword_match(&items, &keywords).expect("should match");
        assert_eq!(best.id, 2);
    }

    #[test]
    fn best_match_ties_go_to_scan_order() {
        let items = vec![
            item(1, "Skills: Languages", "Rust Python"),
            item(2, "Skills: Tools", "Rust Docker"),
        ];
        let keywords = vec!["rust".to_string()];

        let best = best_keyword_match(&items, &keywords).expect("should match");
        assert_eq!(best.id, 1);
    }

    #[test]
    fn best_match_requires_at_least_one_hit() {
        let items = vec![item(1, "Education: BSc", "computer science degree")];
        let keywords = vec!["astronomy".to_string()];
        assert!(best_keyword_match(&items, &keywords).is_none());
    }

    #[test]
    fn excerpt_passes_short_text_through() {
        assert_eq!(excerpt("short", 200), "short");
    }

    #[test]
    fn excerpt_truncates_with_ellipsis() {
        let long = "x".repeat(500);
        let cut = excerpt(&long, 200);
        assert_eq!(cut.chars().count(), 200);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let long = "é".repeat(500);
        let cut = excerpt(&long, 200);
        assert_eq!(cut.chars().count(), 200);
    }

    #[test]
    fn prompts_name_the_candidate() {
        let system = system_prompt(Some("Jane Doe"));
        assert!(system.contains("Jane Doe"));

        let anonymous = system_prompt(None);
        assert!(anonymous.contains("the candidate"));
    }

    #[test]
    fn user_prompt_embeds_context_and_question() {
        let items = vec![item(1, "Work Experience: Acme", "Built things")];
        let prompt = user_prompt(&items, "What did they build?");

        assert!(prompt.contains("Work Experience: Acme: Built things"));
        assert!(prompt.contains("What did they build?"));
    }

    #[test]
    fn topic_menu_uses_candidate_name_when_known() {
        assert!(topic_menu(Some("Jane Doe")).contains("Jane Doe's"));
        assert!(topic_menu(None).contains("this person's"));
    }
}
