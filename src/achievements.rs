use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::JobApplication;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Milestone,
    Streak,
    Skill,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Milestone, Category::Streak, Category::Skill];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Milestone => "milestone",
            Category::Streak => "streak",
            Category::Skill => "skill",
        }
    }
}

/// Unlock condition of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    ApplicationCount(usize),
    Streak(u32),
    AnyInterview,
    SkillCount(usize),
    AnyOffer,
    InterviewedApplications(usize),
    /// No predicate exists; the entry can never be earned.
    Unassigned,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: Category,
    pub requirement: u32,
    pub points: u32,
    #[serde(skip)]
    pub rule: Rule,
}

pub const CATALOG: [AchievementDef; 8] = [
    AchievementDef {
        id: "first-app",
        name: "First Application",
        description: "Submit your first job application",
        icon: "target",
        category: Category::Milestone,
        requirement: 1,
        points: 10,
        rule: Rule::ApplicationCount(1),
    },
    AchievementDef {
        id: "app-streak-7",
        name: "Week Warrior",
        description: "Apply to jobs for 7 consecutive days",
        icon: "fire",
        category: Category::Streak,
        requirement: 7,
        points: 50,
        rule: Rule::Streak(7),
    },
    AchievementDef {
        id: "first-interview",
        name: "Interview Ready",
        description: "Land your first interview",
        icon: "microphone",
        category: Category::Milestone,
        requirement: 1,
        points: 25,
        rule: Rule::AnyInterview,
    },
    AchievementDef {
        id: "skill-master",
        name: "Skill Master",
        description: "Add 10 skills to your profile",
        icon: "brain",
        category: Category::Skill,
        requirement: 10,
        points: 30,
        rule: Rule::SkillCount(10),
    },
    AchievementDef {
        id: "networking-pro",
        name: "Networking Pro",
        description: "Connect with 5 mentors or coaches",
        icon: "handshake",
        category: Category::Milestone,
        requirement: 5,
        points: 40,
        // TODO: needs a mentor-connection count on the profile before it can unlock.
        rule: Rule::Unassigned,
    },
    AchievementDef {
        id: "offer-received",
        name: "Offer Champion",
        description: "Receive your first job offer",
        icon: "trophy",
        category: Category::Milestone,
        requirement: 1,
        points: 100,
        rule: Rule::AnyOffer,
    },
    AchievementDef {
        id: "app-100",
        name: "Century Club",
        description: "Submit 100 job applications",
        icon: "hundred",
        category: Category::Milestone,
        requirement: 100,
        points: 200,
        rule: Rule::ApplicationCount(100),
    },
    AchievementDef {
        id: "interview-ace",
        name: "Interview Ace",
        description: "Complete 10 interviews",
        icon: "star",
        category: Category::Milestone,
        requirement: 10,
        points: 75,
        rule: Rule::InterviewedApplications(10),
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub streak_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Achievement {
    #[serde(flatten)]
    pub def: AchievementDef,
    pub earned: Option<DateTime<Utc>>,
}

impl Achievement {
    pub fn id(&self) -> &'static str {
        self.def.id
    }

    pub fn is_earned(&self) -> bool {
        self.earned.is_some()
    }
}

impl Rule {
    pub fn holds(&self, applications: &[JobApplication], stats: &UserStats, skills: &[String]) -> bool {
        match *self {
            Rule::ApplicationCount(n) => applications.len() >= n,
            Rule::Streak(days) => stats.streak_count >= days,
            Rule::AnyInterview => applications.iter().any(|a| a.status.is_interview_stage()),
            Rule::SkillCount(n) => skills.len() >= n,
            Rule::AnyOffer => applications.iter().any(|a| a.status.is_offer_stage()),
            Rule::InterviewedApplications(n) => {
                applications
                    .iter()
                    .filter(|a| !a.interview_dates.is_empty())
                    .count()
                    >= n
            }
            Rule::Unassigned => false,
        }
    }
}

/// Catalog entries paired with the user's earned state.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementBook {
    entries: Vec<Achievement>,
}

impl Default for AchievementBook {
    fn default() -> Self {
        Self {
            entries: CATALOG
                .iter()
                .map(|def| Achievement {
                    def: *def,
                    earned: None,
                })
                .collect(),
        }
    }
}

impl AchievementBook {
    /// Marks the ids stored on the profile as earned at `now`. Unknown ids are ignored.
    pub fn from_profile(earned_ids: &[String], now: DateTime<Utc>) -> Self {
        let mut book = Self::default();
        for entry in &mut book.entries {
            if earned_ids.iter().any(|id| id == entry.def.id) {
                entry.earned = Some(now);
            }
        }
        book
    }

    pub fn entries(&self) -> &[Achievement] {
        &self.entries
    }

    /// Tests every unearned entry and stamps the ones that now hold.
    ///
    /// Earned entries are skipped before their rule is tested, so an entry is
    /// returned at most once over the life of the book.
    pub fn evaluate(
        &mut self,
        applications: &[JobApplication],
        stats: &UserStats,
        skills: &[String],
        now: DateTime<Utc>,
    ) -> Vec<Achievement> {
        let mut newly_earned = Vec::new();
        for entry in &mut self.entries {
            if entry.is_earned() {
                continue;
            }
            if entry.def.rule.holds(applications, stats, skills) {
                entry.earned = Some(now);
                log::info!("Achievement unlocked: {}", entry.def.id);
                newly_earned.push(entry.clone());
            }
        }
        newly_earned
    }

    pub fn earned_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|a| a.is_earned())
            .map(|a| a.def.id.to_string())
            .collect()
    }

    pub fn earned_count(&self) -> usize {
        self.entries.iter().filter(|a| a.is_earned()).count()
    }

    pub fn total_points(&self) -> u32 {
        self.entries
            .iter()
            .filter(|a| a.is_earned())
            .map(|a| a.def.points)
            .sum()
    }

    pub fn completion_percent(&self) -> u32 {
        if self.entries.is_empty() {
            return 0;
        }
        (self.earned_count() as f64 / self.entries.len() as f64 * 100.0).round() as u32
    }

    /// (earned, total) per category.
    pub fn by_category(&self) -> Vec<(Category, usize, usize)> {
        Category::ALL
            .iter()
            .map(|&category| {
                let in_category = self.entries.iter().filter(|a| a.def.category == category);
                let total = in_category.clone().count();
                let earned = in_category.filter(|a| a.is_earned()).count();
                (category, earned, total)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn entry<'a>(book: &'a AchievementBook, id: &str) -> &'a Achievement {
        book.entries().iter().find(|a| a.id() == id).unwrap()
    }

    fn app(status: JobStatus, interviews: usize) -> JobApplication {
        JobApplication {
            id: "a".to_string(),
            user_id: "u".to_string(),
            job_title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            salary: None,
            salary_max: None,
            job_url: None,
            description: None,
            status,
            applied_date: None,
            deadline_date: None,
            notes: String::new(),
            tags: Vec::new(),
            resume_id: None,
            cover_letter_id: None,
            contact_person: None,
            contact_email: None,
            follow_up_date: None,
            interview_dates: vec![now(); interviews],
            ai_match_score: None,
            skill_gaps: Vec::new(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn skills(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("skill-{}", i)).collect()
    }

    #[test]
    fn test_first_application_only() {
        let mut book = AchievementBook::default();
        let earned = book.evaluate(
            &[app(JobStatus::Applied, 0)],
            &UserStats { streak_count: 0 },
            &skills(3),
            now(),
        );
        let ids: Vec<&str> = earned.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["first-app"]);
        assert_eq!(earned[0].earned, Some(now()));
    }

    #[test]
    fn test_never_re_awards() {
        let mut book = AchievementBook::default();
        let apps = vec![app(JobStatus::Offer, 1)];
        let first = book.evaluate(&apps, &UserStats::default(), &[], now());
        assert_eq!(first.len(), 3);

        let again = book.evaluate(&apps, &UserStats::default(), &[], now());
        assert!(again.is_empty());

        // Predicate no longer holds; the entry stays earned.
        let later = book.evaluate(&[], &UserStats::default(), &[], now());
        assert!(later.is_empty());
        assert!(entry(&book, "offer-received").is_earned());
    }

    #[test]
    fn test_every_rule() {
        let mut apps: Vec<JobApplication> = (0..100).map(|_| app(JobStatus::Applied, 0)).collect();
        for a in apps.iter_mut().take(10) {
            a.interview_dates = vec![now()];
        }
        apps[0].status = JobStatus::Hired;

        let mut book = AchievementBook::default();
        let earned = book.evaluate(&apps, &UserStats { streak_count: 7 }, &skills(10), now());
        let mut ids: Vec<&str> = earned.iter().map(|a| a.id()).collect();
        ids.sort();
        assert_eq!(
            ids,
            vec![
                "app-100",
                "app-streak-7",
                "first-app",
                "first-interview",
                "interview-ace",
                "offer-received",
                "skill-master",
            ]
        );
        assert!(!entry(&book, "networking-pro").is_earned());
    }

    #[test]
    fn test_thresholds_are_inclusive_lower_bounds() {
        let nine: Vec<JobApplication> = (0..9).map(|_| app(JobStatus::Interviewing, 1)).collect();
        assert!(!Rule::InterviewedApplications(10).holds(&nine, &UserStats::default(), &[]));
        assert!(!Rule::SkillCount(10).holds(&[], &UserStats::default(), &skills(9)));
        assert!(!Rule::Streak(7).holds(&[], &UserStats { streak_count: 6 }, &[]));
        assert!(Rule::Streak(7).holds(&[], &UserStats { streak_count: 7 }, &[]));
        assert!(!Rule::AnyOffer.holds(&[app(JobStatus::Interviewing, 0)], &UserStats::default(), &[]));
    }

    #[test]
    fn test_from_profile_and_totals() {
        let ids = vec![
            "first-app".to_string(),
            "offer-received".to_string(),
            "profile-complete".to_string(),
        ];
        let book = AchievementBook::from_profile(&ids, now());
        assert_eq!(book.earned_count(), 2);
        assert_eq!(book.total_points(), 110);
        assert_eq!(book.completion_percent(), 25);
        assert_eq!(book.earned_ids(), vec!["first-app".to_string(), "offer-received".to_string()]);

        let categories = book.by_category();
        assert_eq!(categories[0], (Category::Milestone, 2, 6));
        assert_eq!(categories[1], (Category::Streak, 0, 1));
        assert_eq!(categories[2], (Category::Skill, 0, 1));
    }

    #[test]
    fn test_seeded_entries_are_skipped() {
        let mut book = AchievementBook::from_profile(&["first-app".to_string()], now());
        let earned = book.evaluate(&[app(JobStatus::Applied, 0)], &UserStats::default(), &[], now());
        assert!(earned.is_empty());
    }
}
