use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

use crate::documents::local_id;
use crate::models::{EntryKind, JournalEntry, Mood};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JournalStats {
    pub total_entries: usize,
    pub this_week: usize,
    pub goals: usize,
    pub achievements: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub title: String,
    pub content: String,
    pub kind: EntryKind,
    pub mood: Mood,
    pub tags: Vec<String>,
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn sample_entries() -> Vec<JournalEntry> {
    let samples = [
        (
            "First Week of Job Searching",
            "Started my job search journey today. Applied to 5 companies including TechCorp and StartupXYZ. Feeling optimistic about the opportunities ahead. Updated my resume and LinkedIn profile.",
            EntryKind::Reflection,
            Mood::Excited,
            &["job search", "applications", "resume"][..],
            15,
        ),
        (
            "Interview Preparation Goal",
            "Set a goal to practice coding problems for 2 hours daily. Want to be ready for technical interviews. Planning to focus on algorithms and system design.",
            EntryKind::Goal,
            Mood::Motivated,
            &["interview prep", "coding", "goals"][..],
            16,
        ),
        (
            "Networking Success",
            "Connected with 3 senior developers on LinkedIn today. Had a great coffee chat with Sarah. She gave me valuable advice about the interview process.",
            EntryKind::Networking,
            Mood::Confident,
            &["networking", "linkedin", "mentorship"][..],
            17,
        ),
        (
            "Learned React Hooks",
            "Completed an advanced React Hooks course today. Finally understand useCallback and useMemo properly. Built a small project to practice the concepts.",
            EntryKind::Learning,
            Mood::Excited,
            &["react", "learning", "hooks"][..],
            18,
        ),
        (
            "First Interview Completed",
            "Had my first technical interview with TechCorp. The coding challenge went well, but I struggled with the system design question. Need to practice more.",
            EntryKind::Achievement,
            Mood::Neutral,
            &["interview", "techcorp", "system design"][..],
            19,
        ),
    ];

    samples
        .iter()
        .enumerate()
        .map(|(i, (title, content, kind, mood, tags, d))| JournalEntry {
            id: (i + 1).to_string(),
            title: title.to_string(),
            content: content.to_string(),
            kind: *kind,
            mood: *mood,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: day(2024, 1, *d),
            updated_at: day(2024, 1, *d),
        })
        .collect()
}

/// Sunday-to-Saturday week containing `now`.
fn week_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let days_from_sunday = now.weekday().num_days_from_sunday() as i64;
    let start_date = now.date_naive() - Duration::days(days_from_sunday);
    let start = Utc.from_utc_datetime(&start_date.and_time(NaiveTime::MIN));
    (start, start + Duration::days(7))
}

pub struct JournalStore {
    entries: Vec<JournalEntry>,
}

impl JournalStore {
    pub fn new(entries: Vec<JournalEntry>) -> Self {
        Self { entries }
    }

    pub fn with_samples() -> Self {
        Self::new(sample_entries())
    }

    pub fn add(&mut self, entry: NewEntry, now: DateTime<Utc>) -> &JournalEntry {
        self.entries.insert(
            0,
            JournalEntry {
                id: local_id(),
                title: entry.title,
                content: entry.content,
                kind: entry.kind,
                mood: entry.mood,
                tags: entry.tags,
                created_at: now,
                updated_at: now,
            },
        );
        &self.entries[0]
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Case-insensitive match on title, content or any tag, optionally by kind.
    pub fn search(&self, term: &str, kind: Option<EntryKind>) -> Vec<&JournalEntry> {
        let needle = term.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.title.to_lowercase().contains(&needle)
                    || e.content.to_lowercase().contains(&needle)
                    || e.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .collect()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> JournalStats {
        let (start, end) = week_bounds(now);
        JournalStats {
            total_entries: self.entries.len(),
            this_week: self
                .entries
                .iter()
                .filter(|e| e.created_at >= start && e.created_at < end)
                .count(),
            goals: self.entries.iter().filter(|e| e.kind == EntryKind::Goal).count(),
            achievements: self
                .entries
                .iter()
                .filter(|e| e.kind == EntryKind::Achievement)
                .count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_matches_title_content_and_tags() {
        let store = JournalStore::with_samples();
        assert_eq!(store.search("", None).len(), 5);
        assert_eq!(store.search("TECHCORP", None).len(), 2);
        assert_eq!(store.search("mentorship", None).len(), 1);
        assert_eq!(store.search("interview", Some(EntryKind::Goal)).len(), 1);
        assert!(store.search("kubernetes", None).is_empty());
    }

    #[test]
    fn test_stats_counts_current_week() {
        let store = JournalStore::with_samples();
        // Wednesday 2024-01-17; the week runs Sun 14th to Sat 20th.
        let stats = store.stats(Utc.with_ymd_and_hms(2024, 1, 17, 12, 0, 0).unwrap());
        assert_eq!(
            stats,
            JournalStats {
                total_entries: 5,
                this_week: 5,
                goals: 1,
                achievements: 1,
            }
        );

        let later = store.stats(Utc.with_ymd_and_hms(2024, 1, 21, 0, 0, 0).unwrap());
        assert_eq!(later.this_week, 0);
    }

    #[test]
    fn test_add_and_delete() {
        let mut store = JournalStore::new(Vec::new());
        let now = Utc::now();
        let id = store
            .add(
                NewEntry {
                    title: "Offer call".to_string(),
                    content: "Got the call".to_string(),
                    kind: EntryKind::Achievement,
                    mood: Mood::Excited,
                    tags: vec!["offer".to_string()],
                },
                now,
            )
            .id
            .clone();
        assert_eq!(store.stats(now).this_week, 1);
        assert!(store.delete(&id));
        assert!(store.search("", None).is_empty());
    }
}
