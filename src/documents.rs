use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;

use crate::models::{CoverLetter, Resume, Tone};

/// Nine base-36 characters.
pub fn local_id() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

fn sample_resumes(user_id: &str) -> Vec<Resume> {
    vec![
        Resume {
            id: "1".to_string(),
            user_id: user_id.to_string(),
            name: "Software Engineer Resume".to_string(),
            version: 3,
            file_name: "software_engineer_v3.pdf".to_string(),
            file_url: "/documents/resume.pdf".to_string(),
            content: "Experienced software engineer with 5+ years in React, Node.js, and cloud technologies...".to_string(),
            tags: tags(&["Software Engineer", "React", "Node.js", "AWS"]),
            is_active: true,
            ai_score: Some(85),
            created_at: day(2024, 1, 1),
            updated_at: day(2024, 1, 15),
        },
        Resume {
            id: "2".to_string(),
            user_id: user_id.to_string(),
            name: "Frontend Developer Resume".to_string(),
            version: 2,
            file_name: "frontend_v2.pdf".to_string(),
            file_url: "/documents/resume_frontend.pdf".to_string(),
            content: "Frontend specialist with expertise in React, TypeScript, and modern CSS frameworks...".to_string(),
            tags: tags(&["Frontend", "React", "TypeScript", "CSS"]),
            is_active: false,
            ai_score: Some(78),
            created_at: day(2023, 12, 1),
            updated_at: day(2023, 12, 15),
        },
    ]
}

fn sample_cover_letters(user_id: &str) -> Vec<CoverLetter> {
    vec![
        CoverLetter {
            id: "1".to_string(),
            user_id: user_id.to_string(),
            name: "Generic Tech Cover Letter".to_string(),
            content: "Dear Hiring Manager,\n\nI am excited to apply for the [Position] role at [Company]...".to_string(),
            job_title: None,
            company: None,
            tags: tags(&["Tech", "Generic", "Template"]),
            is_template: true,
            tone: Tone::Professional,
            created_at: day(2024, 1, 1),
            updated_at: day(2024, 1, 1),
        },
        CoverLetter {
            id: "2".to_string(),
            user_id: user_id.to_string(),
            name: "TechCorp Cover Letter".to_string(),
            content: "Dear Sarah Johnson,\n\nI am writing to express my strong interest in the Senior Frontend Developer position at TechCorp...".to_string(),
            job_title: Some("Senior Frontend Developer".to_string()),
            company: Some("TechCorp".to_string()),
            tags: tags(&["TechCorp", "Frontend", "Personalized"]),
            is_template: false,
            tone: Tone::Friendly,
            created_at: day(2024, 1, 10),
            updated_at: day(2024, 1, 10),
        },
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewResume {
    pub name: String,
    pub file_name: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCoverLetter {
    pub name: String,
    pub content: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub tags: Vec<String>,
    pub is_template: bool,
    pub tone: Tone,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    pub name: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    /// Resumes only.
    pub is_active: Option<bool>,
}

/// Resumes and cover letters. Starts from a sample set; nothing is persisted.
pub struct DocumentStore {
    user_id: String,
    resumes: Vec<Resume>,
    cover_letters: Vec<CoverLetter>,
}

impl DocumentStore {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            resumes: Vec::new(),
            cover_letters: Vec::new(),
        }
    }

    pub fn with_samples(user_id: &str) -> Self {
        let mut store = Self::new(user_id);
        store.resumes = sample_resumes(user_id);
        store.cover_letters = sample_cover_letters(user_id);
        store
    }

    pub fn resumes(&self) -> &[Resume] {
        &self.resumes
    }

    pub fn cover_letters(&self) -> &[CoverLetter] {
        &self.cover_letters
    }

    pub fn active_resume(&self) -> Option<&Resume> {
        self.resumes.iter().find(|r| r.is_active)
    }

    /// Newest first.
    pub fn add_resume(&mut self, resume: NewResume) -> &Resume {
        let now = Utc::now();
        self.resumes.insert(
            0,
            Resume {
                id: local_id(),
                user_id: self.user_id.clone(),
                name: resume.name,
                version: 1,
                file_url: format!("/documents/{}", resume.file_name),
                file_name: resume.file_name,
                content: resume.content,
                tags: resume.tags,
                is_active: resume.is_active,
                ai_score: None,
                created_at: now,
                updated_at: now,
            },
        );
        &self.resumes[0]
    }

    pub fn update_resume(&mut self, id: &str, update: &DocumentUpdate) -> Result<()> {
        let resume = self
            .resumes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| anyhow!("Resume '{}' not found", id))?;
        if let Some(name) = &update.name {
            resume.name = name.clone();
        }
        if let Some(content) = &update.content {
            resume.content = content.clone();
            resume.version += 1;
        }
        if let Some(tags) = &update.tags {
            resume.tags = tags.clone();
        }
        if let Some(active) = update.is_active {
            resume.is_active = active;
        }
        resume.updated_at = Utc::now();
        Ok(())
    }

    pub fn delete_resume(&mut self, id: &str) -> bool {
        let before = self.resumes.len();
        self.resumes.retain(|r| r.id != id);
        self.resumes.len() != before
    }

    pub fn add_cover_letter(&mut self, letter: NewCoverLetter) -> &CoverLetter {
        let now = Utc::now();
        self.cover_letters.insert(
            0,
            CoverLetter {
                id: local_id(),
                user_id: self.user_id.clone(),
                name: letter.name,
                content: letter.content,
                job_title: letter.job_title,
                company: letter.company,
                tags: letter.tags,
                is_template: letter.is_template,
                tone: letter.tone,
                created_at: now,
                updated_at: now,
            },
        );
        &self.cover_letters[0]
    }

    pub fn update_cover_letter(&mut self, id: &str, update: &DocumentUpdate) -> Result<()> {
        let letter = self
            .cover_letters
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| anyhow!("Cover letter '{}' not found", id))?;
        if let Some(name) = &update.name {
            letter.name = name.clone();
        }
        if let Some(content) = &update.content {
            letter.content = content.clone();
        }
        if let Some(tags) = &update.tags {
            letter.tags = tags.clone();
        }
        letter.updated_at = Utc::now();
        Ok(())
    }

    pub fn delete_cover_letter(&mut self, id: &str) -> bool {
        let before = self.cover_letters.len();
        self.cover_letters.retain(|l| l.id != id);
        self.cover_letters.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_id_shape() {
        let id = local_id();
        assert_eq!(id.len(), 9);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(local_id(), local_id());
    }

    #[test]
    fn test_samples_belong_to_user() {
        let store = DocumentStore::with_samples("u1");
        assert_eq!(store.resumes().len(), 2);
        assert_eq!(store.cover_letters().len(), 2);
        assert!(store.resumes().iter().all(|r| r.user_id == "u1"));
        assert_eq!(store.active_resume().unwrap().name, "Software Engineer Resume");
    }

    #[test]
    fn test_resume_lifecycle() {
        let mut store = DocumentStore::new("u1");
        let id = store
            .add_resume(NewResume {
                name: "Data Resume".to_string(),
                file_name: "data.pdf".to_string(),
                content: "SQL and Python".to_string(),
                tags: vec!["Data".to_string()],
                is_active: false,
            })
            .id
            .clone();
        assert_eq!(store.resumes()[0].file_url, "/documents/data.pdf");

        let update = DocumentUpdate {
            content: Some("SQL, Python and Rust".to_string()),
            is_active: Some(true),
            ..Default::default()
        };
        store.update_resume(&id, &update).unwrap();
        let resume = &store.resumes()[0];
        assert_eq!(resume.version, 2);
        assert!(resume.is_active);

        assert!(store.update_resume("missing", &update).is_err());
        assert!(store.delete_resume(&id));
        assert!(!store.delete_resume(&id));
    }

    #[test]
    fn test_cover_letters_newest_first() {
        let mut store = DocumentStore::with_samples("u1");
        store.add_cover_letter(NewCoverLetter {
            name: "Globex".to_string(),
            content: "Dear team".to_string(),
            job_title: Some("SRE".to_string()),
            company: Some("Globex".to_string()),
            tags: Vec::new(),
            is_template: false,
            tone: Tone::Bold,
        });
        assert_eq!(store.cover_letters().len(), 3);
        assert_eq!(store.cover_letters()[0].name, "Globex");
        assert!(store.delete_cover_letter("1"));
        assert_eq!(store.cover_letters().len(), 2);
    }
}
