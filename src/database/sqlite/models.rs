use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use tracing::warn;

/// Source entity kind for a knowledge item. Stored as the literal variant
/// name, which doubles as the wire tag used by entity-write collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT")]
pub enum ContentKind {
    PersonalInfo,
    CvEntry,
    Education,
    Certification,
    Project,
    BlogPost,
    Skills,
}

impl ContentKind {
    pub const ALL: [ContentKind; 7] = [
        ContentKind::PersonalInfo,
        ContentKind::CvEntry,
        ContentKind::Education,
        ContentKind::Certification,
        ContentKind::Project,
        ContentKind::BlogPost,
        ContentKind::Skills,
    ];

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::PersonalInfo => "PersonalInfo",
            ContentKind::CvEntry => "CvEntry",
            ContentKind::Education => "Education",
            ContentKind::Certification => "Certification",
            ContentKind::Project => "Project",
            ContentKind::BlogPost => "BlogPost",
            ContentKind::Skills => "Skills",
        }
    }
}

impl std::fmt::Display for ContentKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PersonalInfo" => Ok(ContentKind::PersonalInfo),
            "CvEntry" => Ok(ContentKind::CvEntry),
            "Education" => Ok(ContentKind::Education),
            "Certification" => Ok(ContentKind::Certification),
            "Project" => Ok(ContentKind::Project),
            "BlogPost" => Ok(ContentKind::BlogPost),
            "Skills" => Ok(ContentKind::Skills),
            other => Err(format!("Unknown content kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct KnowledgeItem {
    pub id: i64,
    pub content_type: ContentKind,
    pub content_id: i64,
    pub title: String,
    pub content: String,
    /// JSON-serialized vector; `None` until the embedding worker completes.
    pub embedding: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl KnowledgeItem {
    /// Parsed embedding vector. A missing or malformed embedding yields
    /// `None`; the malformed case is logged so it can be regenerated.
    #[inline]
    pub fn embedding_vector(&self) -> Option<Vec<f32>> {
        let raw = self.embedding.as_deref()?;
        match serde_json::from_str(raw) {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!(
                    "Failed to parse embedding for knowledge item {}: {}",
                    self.id, e
                );
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewKnowledgeItem {
    pub content_type: ContentKind,
    pub content_id: i64,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub question: String,
    pub answer: Option<String>,
    pub session_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PersonalInfo {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub location: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub summary: Option<String>,
    pub website: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
}

impl PersonalInfo {
    /// Social links as (label, url) pairs, in display order.
    #[inline]
    pub fn social_links(&self) -> Vec<(&'static str, &str)> {
        let mut links = Vec::new();
        if let Some(url) = non_blank(self.website.as_deref()) {
            links.push(("Website", url));
        }
        if let Some(url) = non_blank(self.linkedin.as_deref()) {
            links.push(("LinkedIn", url));
        }
        if let Some(url) = non_blank(self.github.as_deref()) {
            links.push(("GitHub", url));
        }
        if let Some(url) = non_blank(self.twitter.as_deref()) {
            links.push(("Twitter", url));
        }
        links
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CvEntry {
    pub id: i64,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub entry_type: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub current: bool,
    pub content: String,
    pub position: i64,
}

impl CvEntry {
    #[inline]
    pub fn is_experience(&self) -> bool {
        self.entry_type == "experience"
    }

    /// Formatted as "Jan 2020 - Mar 2022", with "Present" for current roles.
    #[inline]
    pub fn date_range(&self) -> Option<String> {
        let start = self.start_date?;
        let start_str = start.format("%b %Y").to_string();
        let end_str = if self.current {
            "Present".to_string()
        } else {
            self.end_date?.format("%b %Y").to_string()
        };
        Some(format!("{} - {}", start_str, end_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Education {
    pub id: i64,
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub current: bool,
    pub gpa: Option<String>,
    pub achievements: Option<String>,
    pub position: i64,
}

impl Education {
    #[inline]
    pub fn full_degree(&self) -> String {
        format!("{} in {}", self.degree, self.field_of_study)
    }

    /// Year-level range, e.g. "2015 - 2019" or "2021 - Present".
    #[inline]
    pub fn date_range(&self) -> Option<String> {
        let start = self.start_date?;
        let start_str = start.format("%Y").to_string();
        let end_str = if self.current {
            Some("Present".to_string())
        } else {
            self.end_date.map(|d| d.format("%Y").to_string())
        };
        match end_str {
            Some(end) => Some(format!("{} - {}", start_str, end)),
            None => Some(start_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Certification {
    pub id: i64,
    pub name: String,
    pub issuer: String,
    pub issue_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub position: i64,
}

impl Certification {
    #[inline]
    pub fn expired(&self, today: NaiveDate) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry <= today)
    }

    /// Human-readable expiry status relative to `today`.
    #[inline]
    pub fn expiry_status(&self, today: NaiveDate) -> String {
        let Some(expiry) = self.expiry_date else {
            return "No expiration".to_string();
        };

        if expiry <= today {
            return format!("Expired on {}", expiry.format("%b %Y"));
        }

        let days_until_expiry = (expiry - today).num_days();
        if days_until_expiry <= 30 {
            format!("Expires in {} days", days_until_expiry)
        } else {
            format!("Expires {}", expiry.format("%b %Y"))
        }
    }

    #[inline]
    pub fn date_range(&self) -> String {
        let issue_str = self.issue_date.format("%b %Y").to_string();
        match self.expiry_date {
            Some(expiry) => format!("{} - {}", issue_str, expiry.format("%b %Y")),
            None => format!("{} - No expiration", issue_str),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    /// JSON array of tag names.
    pub tags: Option<String>,
    pub published: bool,
    pub position: i64,
}

impl Project {
    #[inline]
    pub fn tag_names(&self) -> Vec<String> {
        let Some(raw) = self.tags.as_deref() else {
            return Vec::new();
        };
        match serde_json::from_str(raw) {
            Ok(names) => names,
            Err(e) => {
                warn!("Failed to parse tags for project {}: {}", self.id, e);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub published: bool,
    pub published_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub proficiency_level: i64,
    pub position: i64,
}

/// Fixed skill category display order, mirrored by the admin UI.
pub const SKILL_CATEGORIES: [&str; 6] = [
    "Programming Languages",
    "Frameworks & Libraries",
    "Databases",
    "Tools & Technologies",
    "Cloud Services",
    "Other",
];

impl Skill {
    #[inline]
    pub fn proficiency_name(&self) -> &'static str {
        match self.proficiency_level {
            1 => "Beginner",
            2 => "Novice",
            3 => "Intermediate",
            4 => "Advanced",
            _ => "Expert",
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
