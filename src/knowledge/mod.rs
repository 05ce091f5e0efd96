// Knowledge store
// Durable mirror of the portfolio content as flattened knowledge items.
// Writes re-check qualification from the current source row, replace the
// item for the (content_type, content_id) key transactionally, and enqueue
// embedding generation after commit.


pub mod similarity;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::content::{
    self, Extracted, extract_blog_post, extract_certification, extract_education,
    extract_experience, extract_personal_info, extract_project,
};
use crate::database::sqlite::models::{ContentKind, KnowledgeItem, NewKnowledgeItem};
use crate::database::sqlite::queries::{ContentQueries, KnowledgeItemQueries};
use crate::database::sqlite::{Database, models::SKILL_CATEGORIES};
use crate::embeddings::worker::EmbedTask;

pub use similarity::{cosine_similarity, find_similar};

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    database: Database,
    embed_tx: Option<mpsc::UnboundedSender<EmbedTask>>,
}

impl KnowledgeBase {
    #[inline]
    pub fn new(database: Database) -> Self {
        Self {
            database,
            embed_tx: None,
        }
    }

    /// Attach the embedding queue; every inserted item enqueues one task.
    #[inline]
    pub fn with_embed_queue(mut self, embed_tx: mpsc::UnboundedSender<EmbedTask>) -> Self {
        self.embed_tx = Some(embed_tx);
        self
    }

    #[inline]
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Replace the knowledge item for one source entity.
    ///
    /// Re-fetches the entity and re-checks qualification; an entity that is
    /// missing, unpublished, or no longer an experience degrades to a
    /// delete. The delete-then-insert pair runs in one transaction so no
    /// reader sees both or neither, and exactly one embedding task is
    /// enqueued per inserted item, after commit.
    #[inline]
    pub async fn upsert_for_entity(
        &self,
        kind: ContentKind,
        content_id: i64,
    ) -> Result<Option<i64>> {
        // Skills use a coarser collaborator contract: any skill change
        // rebuilds the whole Skills kind.
        if kind == ContentKind::Skills {
            self.rebuild_skills().await?;
            return Ok(None);
        }

        let Some(extracted) = self.extract_current(kind, content_id).await? else {
            let removed = self.delete_for_entity(kind, content_id).await?;
            if removed > 0 {
                debug!(
                    "Removed knowledge item for disqualified {}#{}",
                    kind, content_id
                );
            }
            return Ok(None);
        };

        let new_item = NewKnowledgeItem {
            content_type: kind,
            content_id,
            title: extracted.title,
            content: extracted.content,
        };

        let mut tx = self
            .database
            .pool()
            .begin()
            .await
            .context("Failed to begin upsert transaction")?;

        KnowledgeItemQueries::delete_for_source(&mut tx, kind, content_id).await?;
        let item_id = KnowledgeItemQueries::insert(&mut tx, &new_item).await?;

        tx.commit()
            .await
            .context("Failed to commit upsert transaction")?;

        debug!("Upserted knowledge item {} for {}#{}", item_id, kind, content_id);
        self.enqueue_embedding(item_id);

        Ok(Some(item_id))
    }

    /// Remove the item(s) for a source entity. No-op when absent.
    #[inline]
    pub async fn delete_for_entity(&self, kind: ContentKind, content_id: i64) -> Result<u64> {
        let mut conn = self
            .database
            .pool()
            .acquire()
            .await
            .context("Failed to acquire connection for delete")?;

        let removed = KnowledgeItemQueries::delete_for_source(&mut conn, kind, content_id).await?;
        if removed > 0 {
            info!("Deleted knowledge items for {}#{}", kind, content_id);
        }
        Ok(removed)
    }

    /// Clear and repopulate the whole store from every qualifying entity.
    ///
    /// Runs as a single transaction: readers on other connections never
    /// observe an empty store mid-rebuild. Embedding tasks are enqueued
    /// after commit, one per inserted item.
    #[inline]
    pub async fn rebuild_all(&self) -> Result<usize> {
        let pool = self.database.pool();
        let today = Utc::now().date_naive();

        let mut new_items: Vec<NewKnowledgeItem> = Vec::new();

        if let Some(info) = ContentQueries::personal_info(pool).await? {
            new_items.push(to_new_item(
                ContentKind::PersonalInfo,
                info.id,
                extract_personal_info(&info),
            ));
        }

        for entry in ContentQueries::experiences(pool).await? {
            new_items.push(to_new_item(
                ContentKind::CvEntry,
                entry.id,
                extract_experience(&entry),
            ));
        }

        for education in ContentQueries::educations(pool).await? {
            new_items.push(to_new_item(
                ContentKind::Education,
                education.id,
                extract_education(&education),
            ));
        }

        for category in SKILL_CATEGORIES {
            let skills = ContentQueries::skills_by_category(pool, category).await?;
            if let Some(extracted) = content::extract_skills(category, &skills) {
                new_items.push(to_new_item(ContentKind::Skills, 0, extracted));
            }
        }

        for cert in ContentQueries::certifications(pool).await? {
            new_items.push(to_new_item(
                ContentKind::Certification,
                cert.id,
                extract_certification(&cert, today),
            ));
        }

        for project in ContentQueries::published_projects(pool).await? {
            new_items.push(to_new_item(
                ContentKind::Project,
                project.id,
                extract_project(&project),
            ));
        }

        for post in ContentQueries::published_blog_posts(pool).await? {
            new_items.push(to_new_item(
                ContentKind::BlogPost,
                post.id,
                extract_blog_post(&post),
            ));
        }

        let mut tx = pool
            .begin()
            .await
            .context("Failed to begin rebuild transaction")?;

        KnowledgeItemQueries::delete_all(&mut tx).await?;

        let mut inserted_ids = Vec::with_capacity(new_items.len());
        for item in &new_items {
            inserted_ids.push(KnowledgeItemQueries::insert(&mut tx, item).await?);
        }

        tx.commit()
            .await
            .context("Failed to commit rebuild transaction")?;

        for item_id in &inserted_ids {
            self.enqueue_embedding(*item_id);
        }

        info!("Knowledge base rebuilt with {} items", inserted_ids.len());
        Ok(inserted_ids.len())
    }

    /// Rebuild only the Skills kind (one virtual item per non-empty
    /// category, all keyed content_id 0).
    #[inline]
    pub async fn rebuild_skills(&self) -> Result<usize> {
        let pool = self.database.pool();

        let mut new_items = Vec::new();
        for category in SKILL_CATEGORIES {
            let skills = ContentQueries::skills_by_category(pool, category).await?;
            if let Some(extracted) = content::extract_skills(category, &skills) {
                new_items.push(to_new_item(ContentKind::Skills, 0, extracted));
            }
        }

        let mut tx = pool
            .begin()
            .await
            .context("Failed to begin skills rebuild transaction")?;

        KnowledgeItemQueries::delete_for_kind(&mut tx, ContentKind::Skills).await?;

        let mut inserted_ids = Vec::with_capacity(new_items.len());
        for item in &new_items {
            inserted_ids.push(KnowledgeItemQueries::insert(&mut tx, item).await?);
        }

        tx.commit()
            .await
            .context("Failed to commit skills rebuild transaction")?;

        for item_id in &inserted_ids {
            self.enqueue_embedding(*item_id);
        }

        debug!("Rebuilt {} skills knowledge items", inserted_ids.len());
        Ok(inserted_ids.len())
    }

    /// Top-`limit` items above `threshold` for the query vector, scanning
    /// every item that carries a vector.
    #[inline]
    pub async fn find_similar(
        &self,
        query: &[f32],
        limit: usize,
        threshold: f32,
    ) -> Result<Vec<KnowledgeItem>> {
        let items = KnowledgeItemQueries::list_embedded(self.database.pool()).await?;
        Ok(similarity::find_similar(items, query, limit, threshold))
    }

    /// Extract the current text projection for one entity, or `None` when
    /// the entity is missing or disqualified. Qualification is evaluated
    /// here, from the row as it exists right now, never cached.
    async fn extract_current(
        &self,
        kind: ContentKind,
        content_id: i64,
    ) -> Result<Option<Extracted>> {
        let pool = self.database.pool();
        let today = Utc::now().date_naive();

        let extracted = match kind {
            ContentKind::PersonalInfo => ContentQueries::personal_info_by_id(pool, content_id)
                .await?
                .map(|info| extract_personal_info(&info)),
            ContentKind::CvEntry => ContentQueries::cv_entry_by_id(pool, content_id)
                .await?
                .filter(|entry| entry.is_experience())
                .map(|entry| extract_experience(&entry)),
            ContentKind::Education => ContentQueries::education_by_id(pool, content_id)
                .await?
                .map(|education| extract_education(&education)),
            ContentKind::Certification => ContentQueries::certification_by_id(pool, content_id)
                .await?
                .map(|cert| extract_certification(&cert, today)),
            ContentKind::Project => ContentQueries::project_by_id(pool, content_id)
                .await?
                .filter(|project| project.published)
                .map(|project| extract_project(&project)),
            ContentKind::BlogPost => ContentQueries::blog_post_by_id(pool, content_id)
                .await?
                .filter(|post| post.published)
                .map(|post| extract_blog_post(&post)),
            ContentKind::Skills => None,
        };

        Ok(extracted)
    }

    fn enqueue_embedding(&self, item_id: i64) {
        match &self.embed_tx {
            Some(tx) => {
                if tx.send(EmbedTask { item_id }).is_err() {
                    warn!(
                        "Embedding queue closed; item {} stays unembedded until the next embed pass",
                        item_id
                    );
                }
            }
            None => debug!(
                "No embedding queue attached; item {} awaits the next embed pass",
                item_id
            ),
        }
    }
}

fn to_new_item(kind: ContentKind, content_id: i64, extracted: Extracted) -> NewKnowledgeItem {
    NewKnowledgeItem {
        content_type: kind,
        content_id,
        title: extracted.title,
        content: extracted.content,
    }
}
