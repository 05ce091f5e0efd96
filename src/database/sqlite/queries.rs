use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::models::{
    BlogPost, Certification, ChatMessage, ContentKind, CvEntry, Education, KnowledgeItem,
    NewKnowledgeItem, PersonalInfo, Project, Skill,
};

const SELECT_ITEM: &str = "SELECT id, content_type, content_id, title, content, embedding, \
     created_at, updated_at FROM knowledge_items";

pub struct KnowledgeItemQueries;

impl KnowledgeItemQueries {
    /// Insert one item inside a caller-owned transaction. The store's
    /// delete-then-insert upserts and the full rebuild both go through here.
    #[inline]
    pub async fn insert(conn: &mut SqliteConnection, item: &NewKnowledgeItem) -> Result<i64> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO knowledge_items (content_type, content_id, title, content, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(item.content_type)
        .bind(item.content_id)
        .bind(&item.title)
        .bind(&item.content)
        .bind(now)
        .bind(now)
        .execute(conn)
        .await
        .context("Failed to insert knowledge item")?
        .last_insert_rowid();

        Ok(id)
    }

    #[inline]
    pub async fn delete_for_source(
        conn: &mut SqliteConnection,
        kind: ContentKind,
        content_id: i64,
    ) -> Result<u64> {
        let result =
            sqlx::query("DELETE FROM knowledge_items WHERE content_type = ? AND content_id = ?")
                .bind(kind)
                .bind(content_id)
                .execute(conn)
                .await
                .context("Failed to delete knowledge items for source")?;

        Ok(result.rows_affected())
    }

    #[inline]
    pub async fn delete_for_kind(conn: &mut SqliteConnection, kind: ContentKind) -> Result<u64> {
        let result = sqlx::query("DELETE FROM knowledge_items WHERE content_type = ?")
            .bind(kind)
            .execute(conn)
            .await
            .context("Failed to delete knowledge items for kind")?;

        Ok(result.rows_affected())
    }

    #[inline]
    pub async fn delete_all(conn: &mut SqliteConnection) -> Result<u64> {
        let result = sqlx::query("DELETE FROM knowledge_items")
            .execute(conn)
            .await
            .context("Failed to clear knowledge items")?;

        Ok(result.rows_affected())
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<KnowledgeItem>> {
        let item = sqlx::query_as::<_, KnowledgeItem>(&format!("{} WHERE id = ?", SELECT_ITEM))
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get knowledge item by id")?;

        Ok(item)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<KnowledgeItem>> {
        let items = sqlx::query_as::<_, KnowledgeItem>(&format!("{} ORDER BY id", SELECT_ITEM))
            .fetch_all(pool)
            .await
            .context("Failed to list knowledge items")?;

        Ok(items)
    }

    /// Items that already carry a vector, in stable storage order. This is
    /// the similarity-search scan set.
    #[inline]
    pub async fn list_embedded(pool: &SqlitePool) -> Result<Vec<KnowledgeItem>> {
        let items = sqlx::query_as::<_, KnowledgeItem>(&format!(
            "{} WHERE embedding IS NOT NULL ORDER BY id",
            SELECT_ITEM
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list embedded knowledge items")?;

        Ok(items)
    }

    /// Items still waiting for a vector.
    #[inline]
    pub async fn list_pending_embedding(pool: &SqlitePool) -> Result<Vec<KnowledgeItem>> {
        let items = sqlx::query_as::<_, KnowledgeItem>(&format!(
            "{} WHERE embedding IS NULL ORDER BY id",
            SELECT_ITEM
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list knowledge items pending embedding")?;

        Ok(items)
    }

    #[inline]
    pub async fn set_embedding(pool: &SqlitePool, id: i64, embedding_json: &str) -> Result<()> {
        let now = Utc::now().naive_utc();
        sqlx::query("UPDATE knowledge_items SET embedding = ?, updated_at = ? WHERE id = ?")
            .bind(embedding_json)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to store embedding on knowledge item")?;

        debug!("Stored embedding for knowledge item {}", id);
        Ok(())
    }

    #[inline]
    pub async fn count_by_kind(pool: &SqlitePool, kind: ContentKind) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM knowledge_items WHERE content_type = ?")
                .bind(kind)
                .fetch_one(pool)
                .await
                .context("Failed to count knowledge items by kind")?;

        Ok(count)
    }

    #[inline]
    pub async fn count_embedded(pool: &SqlitePool) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM knowledge_items WHERE embedding IS NOT NULL")
                .fetch_one(pool)
                .await
                .context("Failed to count embedded knowledge items")?;

        Ok(count)
    }
}

pub struct ChatMessageQueries;

impl ChatMessageQueries {
    #[inline]
    pub async fn append(
        pool: &SqlitePool,
        session_id: Option<&str>,
        question: &str,
        answer: &str,
    ) -> Result<ChatMessage> {
        let now = Utc::now().naive_utc();
        let id = sqlx::query(
            "INSERT INTO chat_messages (question, answer, session_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(question)
        .bind(answer)
        .bind(session_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to append chat message")?
        .last_insert_rowid();

        Self::get_by_id(pool, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created chat message"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<ChatMessage>> {
        let message = sqlx::query_as::<_, ChatMessage>(
            "SELECT id, question, answer, session_id, created_at FROM chat_messages WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get chat message by id")?;

        Ok(message)
    }

    /// Most recent `limit` messages for a session, merged with legacy rows
    /// that predate session tracking, oldest first for display.
    #[inline]
    pub async fn history_for(
        pool: &SqlitePool,
        session_id: &str,
        limit: i64,
    ) -> Result<Vec<ChatMessage>> {
        let mut messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT id, question, answer, session_id, created_at FROM chat_messages \
             WHERE session_id = ? OR session_id IS NULL \
             ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(session_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to load chat history")?;

        messages.reverse();
        Ok(messages)
    }
}

/// Read access to the portfolio content tables. The CRUD side lives in the
/// admin collaborators; this subsystem only ever reads current rows.
pub struct ContentQueries;

impl ContentQueries {
    #[inline]
    pub async fn personal_info(pool: &SqlitePool) -> Result<Option<PersonalInfo>> {
        let info = sqlx::query_as::<_, PersonalInfo>(
            "SELECT id, name, title, location, email, phone, summary, website, linkedin, github, twitter \
             FROM personal_infos ORDER BY id LIMIT 1",
        )
        .fetch_optional(pool)
        .await
        .context("Failed to load personal info")?;

        Ok(info)
    }

    #[inline]
    pub async fn personal_info_by_id(pool: &SqlitePool, id: i64) -> Result<Option<PersonalInfo>> {
        let info = sqlx::query_as::<_, PersonalInfo>(
            "SELECT id, name, title, location, email, phone, summary, website, linkedin, github, twitter \
             FROM personal_infos WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to load personal info by id")?;

        Ok(info)
    }

    #[inline]
    pub async fn cv_entry_by_id(pool: &SqlitePool, id: i64) -> Result<Option<CvEntry>> {
        let entry = sqlx::query_as::<_, CvEntry>(
            "SELECT id, title, company, location, entry_type, start_date, end_date, current, content, position \
             FROM cv_entries WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to load CV entry by id")?;

        Ok(entry)
    }

    #[inline]
    pub async fn experiences(pool: &SqlitePool) -> Result<Vec<CvEntry>> {
        let entries = sqlx::query_as::<_, CvEntry>(
            "SELECT id, title, company, location, entry_type, start_date, end_date, current, content, position \
             FROM cv_entries WHERE entry_type = 'experience' ORDER BY position",
        )
        .fetch_all(pool)
        .await
        .context("Failed to load experiences")?;

        Ok(entries)
    }

    #[inline]
    pub async fn education_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Education>> {
        let education = sqlx::query_as::<_, Education>(
            "SELECT id, institution, degree, field_of_study, start_date, end_date, current, gpa, achievements, position \
             FROM educations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to load education by id")?;

        Ok(education)
    }

    #[inline]
    pub async fn educations(pool: &SqlitePool) -> Result<Vec<Education>> {
        let educations = sqlx::query_as::<_, Education>(
            "SELECT id, institution, degree, field_of_study, start_date, end_date, current, gpa, achievements, position \
             FROM educations ORDER BY position",
        )
        .fetch_all(pool)
        .await
        .context("Failed to load educations")?;

        Ok(educations)
    }

    #[inline]
    pub async fn certification_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Certification>> {
        let certification = sqlx::query_as::<_, Certification>(
            "SELECT id, name, issuer, issue_date, expiry_date, credential_id, credential_url, position \
             FROM certifications WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to load certification by id")?;

        Ok(certification)
    }

    #[inline]
    pub async fn certifications(pool: &SqlitePool) -> Result<Vec<Certification>> {
        let certifications = sqlx::query_as::<_, Certification>(
            "SELECT id, name, issuer, issue_date, expiry_date, credential_id, credential_url, position \
             FROM certifications ORDER BY position",
        )
        .fetch_all(pool)
        .await
        .context("Failed to load certifications")?;

        Ok(certifications)
    }

    #[inline]
    pub async fn project_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT id, title, slug, description, github_url, demo_url, tags, published, position \
             FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to load project by id")?;

        Ok(project)
    }

    #[inline]
    pub async fn published_projects(pool: &SqlitePool) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT id, title, slug, description, github_url, demo_url, tags, published, position \
             FROM projects WHERE published = TRUE ORDER BY position",
        )
        .fetch_all(pool)
        .await
        .context("Failed to load published projects")?;

        Ok(projects)
    }

    #[inline]
    pub async fn blog_post_by_id(pool: &SqlitePool, id: i64) -> Result<Option<BlogPost>> {
        let post = sqlx::query_as::<_, BlogPost>(
            "SELECT id, title, slug, content, published, published_at FROM blog_posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to load blog post by id")?;

        Ok(post)
    }

    #[inline]
    pub async fn published_blog_posts(pool: &SqlitePool) -> Result<Vec<BlogPost>> {
        let posts = sqlx::query_as::<_, BlogPost>(
            "SELECT id, title, slug, content, published, published_at \
             FROM blog_posts WHERE published = TRUE ORDER BY published_at DESC, id",
        )
        .fetch_all(pool)
        .await
        .context("Failed to load published blog posts")?;

        Ok(posts)
    }

    #[inline]
    pub async fn skills_by_category(pool: &SqlitePool, category: &str) -> Result<Vec<Skill>> {
        let skills = sqlx::query_as::<_, Skill>(
            "SELECT id, name, category, proficiency_level, position \
             FROM skills WHERE category = ? ORDER BY position",
        )
        .bind(category)
        .fetch_all(pool)
        .await
        .context("Failed to load skills by category")?;

        Ok(skills)
    }
}
