// Knowledge content extraction
// Pure mappings from portfolio entities to the flattened title + body text
// stored on knowledge items. No side effects; qualification rules live with
// the knowledge store, formatting rules live here.


use chrono::NaiveDate;

use crate::database::sqlite::models::{
    BlogPost, Certification, CvEntry, Education, PersonalInfo, Project, Skill,
};

/// Flattened text projection of one source entity (or entity group).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    pub content: String,
}

#[inline]
pub fn extract_personal_info(info: &PersonalInfo) -> Extracted {
    let mut parts = Vec::new();
    push_labeled(&mut parts, "Name", Some(&info.name));
    push_labeled(&mut parts, "Professional Title", Some(&info.title));
    push_labeled(&mut parts, "Location", info.location.as_deref());
    push_labeled(&mut parts, "Contact", Some(&info.email));
    push_labeled(&mut parts, "Summary", info.summary.as_deref());

    for (label, url) in info.social_links() {
        parts.push(format!("{}: {}", label, url));
    }

    Extracted {
        title: format!("{} - {}", info.name, info.title),
        content: parts.join(". "),
    }
}

#[inline]
pub fn extract_experience(entry: &CvEntry) -> Extracted {
    let mut parts = Vec::new();
    push_labeled(&mut parts, "Position", Some(&entry.title));
    push_labeled(&mut parts, "Company", entry.company.as_deref());
    push_labeled(&mut parts, "Location", entry.location.as_deref());
    push_labeled(&mut parts, "Duration", entry.date_range().as_deref());
    push_labeled(&mut parts, "Description", Some(&entry.content));

    Extracted {
        title: format!("Work Experience: {}", entry.title),
        content: parts.join(". "),
    }
}

#[inline]
pub fn extract_education(education: &Education) -> Extracted {
    let full_degree = education.full_degree();

    let mut parts = Vec::new();
    push_labeled(&mut parts, "Degree", Some(&full_degree));
    push_labeled(&mut parts, "Institution", Some(&education.institution));
    push_labeled(&mut parts, "Duration", education.date_range().as_deref());
    push_labeled(&mut parts, "GPA", education.gpa.as_deref());
    push_labeled(&mut parts, "Achievements", education.achievements.as_deref());

    Extracted {
        title: format!("Education: {}", full_degree),
        content: parts.join(". "),
    }
}

/// `today` feeds the expiry-status wording; passing it in keeps extraction a
/// pure function of its inputs.
#[inline]
pub fn extract_certification(cert: &Certification, today: NaiveDate) -> Extracted {
    let mut parts = Vec::new();
    push_labeled(&mut parts, "Certification", Some(&cert.name));
    push_labeled(&mut parts, "Issuer", Some(&cert.issuer));
    push_labeled(&mut parts, "Date", Some(&cert.date_range()));
    push_labeled(&mut parts, "Status", Some(&cert.expiry_status(today)));
    push_labeled(&mut parts, "Credential ID", cert.credential_id.as_deref());

    Extracted {
        title: format!("Certification: {}", cert.name),
        content: parts.join(". "),
    }
}

#[inline]
pub fn extract_project(project: &Project) -> Extracted {
    let mut parts = Vec::new();
    push_labeled(&mut parts, "Project", Some(&project.title));
    push_labeled(&mut parts, "Description", Some(&project.description));

    let tags = project.tag_names();
    if !tags.is_empty() {
        parts.push(format!("Technologies: {}", tags.join(", ")));
    }

    push_labeled(&mut parts, "GitHub", project.github_url.as_deref());
    push_labeled(&mut parts, "Demo", project.demo_url.as_deref());

    Extracted {
        title: format!("Project: {}", project.title),
        content: parts.join(". "),
    }
}

#[inline]
pub fn extract_blog_post(post: &BlogPost) -> Extracted {
    let mut parts = Vec::new();
    push_labeled(&mut parts, "Blog Post", Some(&post.title));
    push_labeled(&mut parts, "Content", Some(&post.content));

    if let Some(published_at) = post.published_at {
        parts.push(format!("Published: {}", published_at.format("%B %Y")));
    }

    Extracted {
        title: format!("Blog Post: {}", post.title),
        content: parts.join(". "),
    }
}

/// One synthetic item per skill category. Returns `None` for an empty
/// category so no placeholder item is stored.
#[inline]
pub fn extract_skills(category: &str, skills: &[Skill]) -> Option<Extracted> {
    if skills.is_empty() {
        return None;
    }

    let mut parts = vec![format!("Skills in {}:", category)];
    for skill in skills {
        parts.push(format!("{} ({} level)", skill.name, skill.proficiency_name()));
    }

    Some(Extracted {
        title: format!("Skills: {}", category),
        content: parts.join(" "),
    })
}

/// Push "{label}: {value}" when the value is present and non-blank. Absent
/// optional fields are omitted entirely, never rendered as empty
/// placeholders.
fn push_labeled(parts: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        parts.push(format!("{}: {}", label, value));
    }
}
