use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

use crate::documents::DocumentStore;
use crate::models::{CoverLetter, JobApplication, Resume, UserProfile};

pub const DEFAULT_FILE_NAME: &str = "job-tracker-data-export.json";

/// Everything a user owns, in the in-memory (camelCase) shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport<'a> {
    pub exported_at: DateTime<Utc>,
    pub profile: &'a UserProfile,
    pub applications: &'a [JobApplication],
    pub resumes: &'a [Resume],
    pub cover_letters: &'a [CoverLetter],
}

impl<'a> DataExport<'a> {
    pub fn new(
        profile: &'a UserProfile,
        applications: &'a [JobApplication],
        documents: &'a DocumentStore,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            exported_at: now,
            profile,
            applications,
            resumes: documents.resumes(),
            cover_letters: documents.cover_letters(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize export")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write export: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::demo_profile;
    use crate::models::{JobStatus, NewApplication};
    use chrono::TimeZone;

    fn application(profile: &UserProfile, now: DateTime<Utc>) -> JobApplication {
        let new = NewApplication::new("Frontend Developer", "TechCorp", "Remote");
        JobApplication {
            id: "app-1".to_string(),
            user_id: profile.id.clone(),
            job_title: new.job_title,
            company: new.company,
            location: new.location,
            salary: None,
            salary_max: None,
            job_url: None,
            description: None,
            status: JobStatus::Applied,
            applied_date: Some(now),
            deadline_date: None,
            notes: String::new(),
            tags: Vec::new(),
            resume_id: None,
            cover_letter_id: None,
            contact_person: None,
            contact_email: None,
            follow_up_date: None,
            interview_dates: Vec::new(),
            ai_match_score: None,
            skill_gaps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_export_shape() {
        let now = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let profile = demo_profile(now);
        let apps = vec![application(&profile, now)];
        let docs = DocumentStore::with_samples(&profile.id);

        let json: serde_json::Value =
            serde_json::from_str(&DataExport::new(&profile, &apps, &docs, now).to_json().unwrap())
                .unwrap();
        assert_eq!(json["exportedAt"], "2024-02-01T09:00:00Z");
        assert_eq!(json["profile"]["email"], "demo@jobtrackerpro.com");
        assert_eq!(json["applications"][0]["jobTitle"], "Frontend Developer");
        assert_eq!(json["applications"][0]["status"], "applied");
        assert_eq!(json["resumes"].as_array().unwrap().len(), 2);
        assert_eq!(json["coverLetters"][1]["company"], "TechCorp");
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_FILE_NAME);
        let now = Utc::now();
        let profile = demo_profile(now);
        let docs = DocumentStore::with_samples(&profile.id);

        DataExport::new(&profile, &[], &docs, now).write_to(&path).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written["applications"].as_array().unwrap().is_empty());
    }
}
