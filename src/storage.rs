use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    ApplicationUpdate, JobApplication, JobStatus, NewApplication, ProfileUpdate, Theme,
    UserProfile, UserRole,
};

#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("invalid timestamp in {field}: {value:?}")]
    Timestamp { field: &'static str, value: String },
    #[error("invalid status {0:?}")]
    Status(String),
}

/// Formats like JavaScript's `toISOString`: millisecond precision, `Z` suffix.
pub fn to_iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_iso(field: &'static str, value: &str) -> Result<DateTime<Utc>, RowError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| RowError::Timestamp {
            field,
            value: value.to_string(),
        })
}

fn parse_opt_iso(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, RowError> {
    value.map(|v| parse_iso(field, v)).transpose()
}

/// A `job_applications` row: snake_case columns, ISO-8601 date strings and
/// nullable collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRow {
    pub id: String,
    pub user_id: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    #[serde(default)]
    pub salary: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub applied_date: Option<String>,
    #[serde(default)]
    pub deadline_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub resume_id: Option<String>,
    #[serde(default)]
    pub cover_letter_id: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub follow_up_date: Option<String>,
    #[serde(default)]
    pub interview_dates: Option<Vec<String>>,
    #[serde(default)]
    pub ai_match_score: Option<f64>,
    #[serde(default)]
    pub skill_gaps: Option<Vec<String>>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<ApplicationRow> for JobApplication {
    type Error = RowError;

    fn try_from(row: ApplicationRow) -> Result<Self, RowError> {
        let status = row
            .status
            .parse::<JobStatus>()
            .map_err(|_| RowError::Status(row.status.clone()))?;

        let interview_dates = row
            .interview_dates
            .unwrap_or_default()
            .iter()
            .map(|d| parse_iso("interview_dates", d))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(JobApplication {
            applied_date: parse_opt_iso("applied_date", row.applied_date.as_deref())?,
            deadline_date: parse_opt_iso("deadline_date", row.deadline_date.as_deref())?,
            follow_up_date: parse_opt_iso("follow_up_date", row.follow_up_date.as_deref())?,
            created_at: parse_iso("created_at", &row.created_at)?,
            updated_at: parse_iso("updated_at", &row.updated_at)?,
            id: row.id,
            user_id: row.user_id,
            job_title: row.job_title,
            company: row.company,
            location: row.location,
            salary: row.salary,
            salary_max: row.salary_max,
            job_url: row.job_url,
            description: row.description,
            status,
            notes: row.notes.unwrap_or_default(),
            tags: row.tags.unwrap_or_default(),
            resume_id: row.resume_id,
            cover_letter_id: row.cover_letter_id,
            contact_person: row.contact_person,
            contact_email: row.contact_email,
            interview_dates,
            ai_match_score: row.ai_match_score,
            skill_gaps: row.skill_gaps.unwrap_or_default(),
        })
    }
}

impl From<&JobApplication> for ApplicationRow {
    fn from(app: &JobApplication) -> Self {
        Self {
            id: app.id.clone(),
            user_id: app.user_id.clone(),
            job_title: app.job_title.clone(),
            company: app.company.clone(),
            location: app.location.clone(),
            salary: app.salary,
            salary_max: app.salary_max,
            job_url: app.job_url.clone(),
            description: app.description.clone(),
            status: app.status.as_str().to_string(),
            applied_date: app.applied_date.as_ref().map(to_iso),
            deadline_date: app.deadline_date.as_ref().map(to_iso),
            notes: Some(app.notes.clone()),
            tags: Some(app.tags.clone()),
            resume_id: app.resume_id.clone(),
            cover_letter_id: app.cover_letter_id.clone(),
            contact_person: app.contact_person.clone(),
            contact_email: app.contact_email.clone(),
            follow_up_date: app.follow_up_date.as_ref().map(to_iso),
            interview_dates: Some(app.interview_dates.iter().map(to_iso).collect()),
            ai_match_score: app.ai_match_score,
            skill_gaps: Some(app.skill_gaps.clone()),
            created_at: to_iso(&app.created_at),
            updated_at: to_iso(&app.updated_at),
        }
    }
}

/// Insert payload. Identity and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationInsert {
    pub user_id: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_date: Option<String>,
    pub notes: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<String>,
    pub interview_dates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_match_score: Option<f64>,
    pub skill_gaps: Vec<String>,
}

impl ApplicationInsert {
    pub fn new(user_id: &str, app: &NewApplication) -> Self {
        Self {
            user_id: user_id.to_string(),
            job_title: app.job_title.clone(),
            company: app.company.clone(),
            location: app.location.clone(),
            salary: app.salary,
            salary_max: app.salary_max,
            job_url: app.job_url.clone(),
            description: app.description.clone(),
            status: app.status.as_str().to_string(),
            applied_date: app.applied_date.as_ref().map(to_iso),
            deadline_date: app.deadline_date.as_ref().map(to_iso),
            notes: app.notes.clone(),
            tags: app.tags.clone(),
            resume_id: app.resume_id.clone(),
            cover_letter_id: app.cover_letter_id.clone(),
            contact_person: app.contact_person.clone(),
            contact_email: app.contact_email.clone(),
            follow_up_date: app.follow_up_date.as_ref().map(to_iso),
            interview_dates: app.interview_dates.iter().map(to_iso).collect(),
            ai_match_score: app.ai_match_score,
            skill_gaps: app.skill_gaps.clone(),
        }
    }
}

/// Update payload. Absent fields are not serialized and so stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_dates: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_match_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_gaps: Option<Vec<String>>,
    pub updated_at: String,
}

impl ApplicationPatch {
    pub fn from_update(update: &ApplicationUpdate, now: DateTime<Utc>) -> Self {
        Self {
            job_title: update.job_title.clone(),
            company: update.company.clone(),
            location: update.location.clone(),
            salary: update.salary,
            salary_max: update.salary_max,
            job_url: update.job_url.clone(),
            description: update.description.clone(),
            status: update.status.map(|s| s.as_str().to_string()),
            applied_date: update.applied_date.as_ref().map(to_iso),
            deadline_date: update.deadline_date.as_ref().map(to_iso),
            notes: update.notes.clone(),
            tags: update.tags.clone(),
            resume_id: update.resume_id.clone(),
            cover_letter_id: update.cover_letter_id.clone(),
            contact_person: update.contact_person.clone(),
            contact_email: update.contact_email.clone(),
            follow_up_date: update.follow_up_date.as_ref().map(to_iso),
            interview_dates: update
                .interview_dates
                .as_ref()
                .map(|dates| dates.iter().map(to_iso).collect()),
            ai_match_score: update.ai_match_score,
            skill_gaps: update.skill_gaps.clone(),
            updated_at: to_iso(&now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub career_goals: Option<String>,
    #[serde(default)]
    pub preferred_industries: Option<Vec<String>>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub theme: Option<String>,
    pub created_at: String,
    pub last_login: String,
    #[serde(default)]
    pub achievements: Option<Vec<String>>,
    #[serde(default)]
    pub streak_count: Option<i64>,
    #[serde(default)]
    pub total_points: Option<i64>,
}

impl TryFrom<UserRow> for UserProfile {
    type Error = RowError;

    fn try_from(row: UserRow) -> Result<Self, RowError> {
        Ok(UserProfile {
            created_at: parse_iso("created_at", &row.created_at)?,
            last_login: parse_iso("last_login", &row.last_login)?,
            id: row.id,
            email: row.email,
            name: row.name,
            role: UserRole::parse(row.role.as_deref().unwrap_or_default()),
            avatar: row.avatar,
            location: row.location,
            career_goals: row.career_goals,
            preferred_industries: row.preferred_industries.unwrap_or_default(),
            skills: row.skills.unwrap_or_default(),
            theme: Theme::parse(row.theme.as_deref().unwrap_or_default()),
            achievements: row.achievements.unwrap_or_default(),
            streak_count: row.streak_count.unwrap_or(0).max(0) as u32,
            total_points: row.total_points.unwrap_or(0).max(0) as u32,
        })
    }
}

impl From<&UserProfile> for UserRow {
    fn from(user: &UserProfile) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: Some(user.role.as_str().to_string()),
            avatar: user.avatar.clone(),
            location: user.location.clone(),
            career_goals: user.career_goals.clone(),
            preferred_industries: Some(user.preferred_industries.clone()),
            skills: Some(user.skills.clone()),
            theme: Some(user.theme.as_str().to_string()),
            created_at: to_iso(&user.created_at),
            last_login: to_iso(&user.last_login),
            achievements: Some(user.achievements.clone()),
            streak_count: Some(user.streak_count as i64),
            total_points: Some(user.total_points as i64),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career_goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_industries: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_points: Option<i64>,
}

impl From<&ProfileUpdate> for UserPatch {
    fn from(update: &ProfileUpdate) -> Self {
        Self {
            name: update.name.clone(),
            location: update.location.clone(),
            career_goals: update.career_goals.clone(),
            preferred_industries: update.preferred_industries.clone(),
            skills: update.skills.clone(),
            theme: update.theme.map(|t| t.as_str().to_string()),
            last_login: update.last_login.as_ref().map(to_iso),
            achievements: update.achievements.clone(),
            streak_count: update.streak_count.map(i64::from),
            total_points: update.total_points.map(i64::from),
        }
    }
}

/// Applies a profile update to a cached copy, mirroring what the store did.
pub fn apply_profile_update(profile: &mut UserProfile, update: &ProfileUpdate) {
    if let Some(name) = &update.name {
        profile.name = name.clone();
    }
    if let Some(location) = &update.location {
        profile.location = Some(location.clone());
    }
    if let Some(goals) = &update.career_goals {
        profile.career_goals = Some(goals.clone());
    }
    if let Some(industries) = &update.preferred_industries {
        profile.preferred_industries = industries.clone();
    }
    if let Some(skills) = &update.skills {
        profile.skills = skills.clone();
    }
    if let Some(theme) = update.theme {
        profile.theme = theme;
    }
    if let Some(last_login) = update.last_login {
        profile.last_login = last_login;
    }
    if let Some(achievements) = &update.achievements {
        profile.achievements = achievements.clone();
    }
    if let Some(streak) = update.streak_count {
        profile.streak_count = streak;
    }
    if let Some(points) = update.total_points {
        profile.total_points = points;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn full_application() -> JobApplication {
        JobApplication {
            id: "app-1".to_string(),
            user_id: "user-1".to_string(),
            job_title: "Platform Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Berlin".to_string(),
            salary: Some(90_000),
            salary_max: Some(120_000),
            job_url: Some("https://acme.example/jobs/1".to_string()),
            description: Some("Build things".to_string()),
            status: JobStatus::Interviewing,
            applied_date: Some(ts(1_700_000_000)),
            deadline_date: Some(ts(1_700_500_000)),
            notes: "Referred by Sam".to_string(),
            tags: vec!["rust".to_string(), "infra".to_string()],
            resume_id: Some("r-1".to_string()),
            cover_letter_id: Some("c-1".to_string()),
            contact_person: Some("Sam".to_string()),
            contact_email: Some("sam@acme.example".to_string()),
            follow_up_date: Some(ts(1_700_900_000)),
            interview_dates: vec![ts(1_701_000_000), ts(1_701_100_000)],
            ai_match_score: Some(78.0),
            skill_gaps: vec!["Kubernetes".to_string()],
            created_at: ts(1_699_000_000),
            updated_at: ts(1_699_500_000),
        }
    }

    #[test]
    fn test_application_round_trip() {
        let app = full_application();
        let row = ApplicationRow::from(&app);
        let back = JobApplication::try_from(row).unwrap();
        assert_eq!(back, app);
    }

    #[test]
    fn test_row_uses_storage_field_names() {
        let row = ApplicationRow::from(&full_application());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["job_title"], "Platform Engineer");
        assert_eq!(json["applied_date"], "2023-11-14T22:13:20.000Z");
        assert_eq!(json["interview_dates"][0], "2023-11-26T12:00:00.000Z");
        assert!(json.get("jobTitle").is_none());

        let app_json = serde_json::to_value(full_application()).unwrap();
        assert_eq!(app_json["jobTitle"], "Platform Engineer");
        assert!(app_json.get("job_title").is_none());
    }

    #[test]
    fn test_nullable_collections_default_to_empty() {
        let json = serde_json::json!({
            "id": "a",
            "user_id": "u",
            "job_title": "t",
            "company": "c",
            "location": "l",
            "status": "applied",
            "notes": null,
            "tags": null,
            "created_at": "2024-01-01T00:00:00.000Z",
            "updated_at": "2024-01-01T00:00:00+00:00"
        });
        let row: ApplicationRow = serde_json::from_value(json).unwrap();
        let app = JobApplication::try_from(row).unwrap();
        assert_eq!(app.notes, "");
        assert!(app.tags.is_empty());
        assert!(app.interview_dates.is_empty());
        assert_eq!(app.status, JobStatus::Applied);
    }

    #[test]
    fn test_invalid_row_is_rejected() {
        let mut row = ApplicationRow::from(&full_application());
        row.status = "ghosted".to_string();
        assert_eq!(
            JobApplication::try_from(row).unwrap_err(),
            RowError::Status("ghosted".to_string())
        );

        let mut row = ApplicationRow::from(&full_application());
        row.applied_date = Some("yesterday".to_string());
        assert!(matches!(
            JobApplication::try_from(row),
            Err(RowError::Timestamp { field: "applied_date", .. })
        ));
    }

    #[test]
    fn test_patch_skips_absent_fields() {
        let update = ApplicationUpdate {
            status: Some(JobStatus::Offer),
            notes: Some("Negotiating".to_string()),
            ..Default::default()
        };
        let patch = ApplicationPatch::from_update(&update, ts(0));
        let json = serde_json::to_value(&patch).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(json["status"], "offer");
        assert_eq!(json["updated_at"], "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_user_round_trip() {
        let user = UserProfile {
            id: "u-1".to_string(),
            email: "ada@example.com".to_string(),
            name: "Ada".to_string(),
            role: UserRole::CareerCoach,
            avatar: None,
            location: Some("London".to_string()),
            career_goals: Some("Lead a team".to_string()),
            preferred_industries: vec!["Fintech".to_string()],
            skills: vec!["Rust".to_string(), "SQL".to_string()],
            theme: Theme::Dark,
            created_at: ts(1_600_000_000),
            last_login: ts(1_700_000_000),
            achievements: vec!["first-app".to_string()],
            streak_count: 3,
            total_points: 10,
        };
        let row = UserRow::from(&user);
        assert_eq!(row.career_goals.as_deref(), Some("Lead a team"));
        assert_eq!(UserProfile::try_from(row).unwrap(), user);
    }
}
