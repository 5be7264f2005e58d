use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Saved,
    Applied,
    Interviewing,
    Rejected,
    Offer,
    Hired,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Saved,
        JobStatus::Applied,
        JobStatus::Interviewing,
        JobStatus::Rejected,
        JobStatus::Offer,
        JobStatus::Hired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Saved => "saved",
            JobStatus::Applied => "applied",
            JobStatus::Interviewing => "interviewing",
            JobStatus::Rejected => "rejected",
            JobStatus::Offer => "offer",
            JobStatus::Hired => "hired",
        }
    }

    /// Reached at least the interview stage.
    pub fn is_interview_stage(&self) -> bool {
        matches!(
            self,
            JobStatus::Interviewing | JobStatus::Offer | JobStatus::Hired
        )
    }

    pub fn is_offer_stage(&self) -> bool {
        matches!(self, JobStatus::Offer | JobStatus::Hired)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        JobStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown status '{}'. Expected one of: saved, applied, interviewing, rejected, offer, hired",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: String,
    pub user_id: String,
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<i64>,
    pub salary_max: Option<i64>,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub status: JobStatus,
    pub applied_date: Option<DateTime<Utc>>,
    pub deadline_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub tags: Vec<String>,
    pub resume_id: Option<String>,
    pub cover_letter_id: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub interview_dates: Vec<DateTime<Utc>>,
    pub ai_match_score: Option<f64>,
    pub skill_gaps: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user submission: everything except identity, owner and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub job_title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<i64>,
    pub salary_max: Option<i64>,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub status: JobStatus,
    pub applied_date: Option<DateTime<Utc>>,
    pub deadline_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub tags: Vec<String>,
    pub resume_id: Option<String>,
    pub cover_letter_id: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub interview_dates: Vec<DateTime<Utc>>,
    pub ai_match_score: Option<f64>,
    pub skill_gaps: Vec<String>,
}

impl NewApplication {
    pub fn new(job_title: &str, company: &str, location: &str) -> Self {
        Self {
            job_title: job_title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            salary: None,
            salary_max: None,
            job_url: None,
            description: None,
            status: JobStatus::Saved,
            applied_date: None,
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
        }
    }
}

impl From<&JobApplication> for NewApplication {
    fn from(app: &JobApplication) -> Self {
        Self {
            job_title: app.job_title.clone(),
            company: app.company.clone(),
            location: app.location.clone(),
            salary: app.salary,
            salary_max: app.salary_max,
            job_url: app.job_url.clone(),
            description: app.description.clone(),
            status: app.status,
            applied_date: app.applied_date,
            deadline_date: app.deadline_date,
            notes: app.notes.clone(),
            tags: app.tags.clone(),
            resume_id: app.resume_id.clone(),
            cover_letter_id: app.cover_letter_id.clone(),
            contact_person: app.contact_person.clone(),
            contact_email: app.contact_email.clone(),
            follow_up_date: app.follow_up_date,
            interview_dates: app.interview_dates.clone(),
            ai_match_score: app.ai_match_score,
            skill_gaps: app.skill_gaps.clone(),
        }
    }
}

/// Partial edit. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationUpdate {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<i64>,
    pub salary_max: Option<i64>,
    pub job_url: Option<String>,
    pub description: Option<String>,
    pub status: Option<JobStatus>,
    pub applied_date: Option<DateTime<Utc>>,
    pub deadline_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub resume_id: Option<String>,
    pub cover_letter_id: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub interview_dates: Option<Vec<DateTime<Utc>>>,
    pub ai_match_score: Option<f64>,
    pub skill_gaps: Option<Vec<String>>,
}

impl ApplicationUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ApplicationUpdate::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    JobSeeker,
    Admin,
    CareerCoach,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::JobSeeker => "job-seeker",
            UserRole::Admin => "admin",
            UserRole::CareerCoach => "career-coach",
        }
    }

    /// Unrecognised roles fall back to job-seeker.
    pub fn parse(s: &str) -> Self {
        match s {
            "admin" => UserRole::Admin,
            "career-coach" => UserRole::CareerCoach,
            _ => UserRole::JobSeeker,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "dark" { Theme::Dark } else { Theme::Light }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub avatar: Option<String>,
    pub location: Option<String>,
    pub career_goals: Option<String>,
    pub preferred_industries: Vec<String>,
    pub skills: Vec<String>,
    pub theme: Theme,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub achievements: Vec<String>,
    pub streak_count: u32,
    pub total_points: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub career_goals: Option<String>,
    pub preferred_industries: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub theme: Option<Theme>,
    pub last_login: Option<DateTime<Utc>>,
    pub achievements: Option<Vec<String>>,
    pub streak_count: Option<u32>,
    pub total_points: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resume {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub version: u32,
    pub file_name: String,
    pub file_url: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_active: bool,
    pub ai_score: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Professional,
    Friendly,
    Bold,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Friendly => "friendly",
            Tone::Bold => "bold",
        }
    }
}

impl FromStr for Tone {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "professional" => Ok(Tone::Professional),
            "friendly" => Ok(Tone::Friendly),
            "bold" => Ok(Tone::Bold),
            _ => Err(anyhow!("Unknown tone '{}'. Expected professional, friendly or bold", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetter {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub content: String,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub tags: Vec<String>,
    pub is_template: bool,
    pub tone: Tone,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Reminder,
    FollowUp,
    Interview,
    Achievement,
    System,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Reminder => "reminder",
            NotificationKind::FollowUp => "follow-up",
            NotificationKind::Interview => "interview",
            NotificationKind::Achievement => "achievement",
            NotificationKind::System => "system",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub action_url: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Reflection,
    Goal,
    Achievement,
    Learning,
    Networking,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Reflection => "reflection",
            EntryKind::Goal => "goal",
            EntryKind::Achievement => "achievement",
            EntryKind::Learning => "learning",
            EntryKind::Networking => "networking",
        }
    }
}

impl FromStr for EntryKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "reflection" => Ok(EntryKind::Reflection),
            "goal" => Ok(EntryKind::Goal),
            "achievement" => Ok(EntryKind::Achievement),
            "learning" => Ok(EntryKind::Learning),
            "networking" => Ok(EntryKind::Networking),
            _ => Err(anyhow!("Unknown journal entry type '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Excited,
    Confident,
    Neutral,
    Frustrated,
    Motivated,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Excited => "excited",
            Mood::Confident => "confident",
            Mood::Neutral => "neutral",
            Mood::Frustrated => "frustrated",
            Mood::Motivated => "motivated",
        }
    }
}

impl FromStr for Mood {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "excited" => Ok(Mood::Excited),
            "confident" => Ok(Mood::Confident),
            "neutral" => Ok(Mood::Neutral),
            "frustrated" => Ok(Mood::Frustrated),
            "motivated" => Ok(Mood::Motivated),
            _ => Err(anyhow!("Unknown mood '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub kind: EntryKind,
    pub mood: Mood,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Success,
    Question,
    Advice,
    Resource,
}

impl PostKind {
    pub const ALL: [PostKind; 4] = [
        PostKind::Success,
        PostKind::Question,
        PostKind::Advice,
        PostKind::Resource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Success => "success",
            PostKind::Question => "question",
            PostKind::Advice => "advice",
            PostKind::Resource => "resource",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PostKind::Success => "Success Stories",
            PostKind::Question => "Questions",
            PostKind::Advice => "Advice",
            PostKind::Resource => "Resources",
        }
    }
}

impl FromStr for PostKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "success" => Ok(PostKind::Success),
            "question" => Ok(PostKind::Question),
            "advice" => Ok(PostKind::Advice),
            "resource" => Ok(PostKind::Resource),
            _ => Err(anyhow!("Unknown post type '{}'. Use success, question, advice or resource", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityPost {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub tags: Vec<String>,
    pub likes: u32,
    pub replies: u32,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// Splits a comma separated form field into trimmed, non-empty tags.
pub fn split_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_round_trip() {
        for status in JobStatus::ALL {
            assert_eq!(status.as_str().parse::<JobStatus>().unwrap(), status);
        }
        assert!("closed".parse::<JobStatus>().is_err());
        assert!("Applied".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_status_stages() {
        assert!(!JobStatus::Applied.is_interview_stage());
        assert!(JobStatus::Interviewing.is_interview_stage());
        assert!(JobStatus::Hired.is_interview_stage());
        assert!(!JobStatus::Interviewing.is_offer_stage());
        assert!(JobStatus::Offer.is_offer_stage());
        assert!(!JobStatus::Rejected.is_offer_stage());
    }

    #[test]
    fn test_application_serializes_camel_case() {
        let mut new_app = NewApplication::new("Engineer", "Acme", "Remote");
        new_app.salary_max = Some(150_000);
        let json = serde_json::to_value(&new_app).unwrap();
        assert_eq!(json["jobTitle"], "Engineer");
        assert_eq!(json["salaryMax"], 150_000);
        assert_eq!(json["status"], "saved");
        assert!(json.get("interviewDates").is_some());
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags(" rust, remote ,,senior "), vec!["rust", "remote", "senior"]);
        assert!(split_tags("  ").is_empty());
    }

    #[test]
    fn test_role_and_theme_fallbacks() {
        assert_eq!(UserRole::parse("career-coach"), UserRole::CareerCoach);
        assert_eq!(UserRole::parse("wizard"), UserRole::JobSeeker);
        assert_eq!(Theme::parse("dark"), Theme::Dark);
        assert_eq!(Theme::parse(""), Theme::Light);
    }
}
