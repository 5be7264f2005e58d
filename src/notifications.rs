use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::models::{Notification, NotificationKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl std::str::FromStr for ReadFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "all" => Ok(ReadFilter::All),
            "unread" => Ok(ReadFilter::Unread),
            "read" => Ok(ReadFilter::Read),
            _ => Err(anyhow::anyhow!("Unknown filter '{}'. Use all, unread or read", s)),
        }
    }
}

impl ReadFilter {
    pub fn matches(&self, notification: &Notification) -> bool {
        match self {
            ReadFilter::All => true,
            ReadFilter::Unread => !notification.read,
            ReadFilter::Read => notification.read,
        }
    }
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0)
        .single()
        .unwrap_or_default()
}

fn sample_feed(user_id: &str, now: DateTime<Utc>) -> Vec<Notification> {
    let entry = |id: &str,
                 kind: NotificationKind,
                 title: &str,
                 message: &str,
                 read: bool,
                 action_url: &str,
                 scheduled_for: Option<DateTime<Utc>>,
                 created_at: DateTime<Utc>| Notification {
        id: id.to_string(),
        user_id: user_id.to_string(),
        kind,
        title: title.to_string(),
        message: message.to_string(),
        read,
        action_url: Some(action_url.to_string()),
        scheduled_for,
        created_at,
    };

    vec![
        entry(
            "1",
            NotificationKind::Reminder,
            "Follow-up Reminder",
            "Time to follow up on your application to TechCorp for Senior Frontend Developer position.",
            false,
            "/applications/1",
            Some(now),
            at(2024, 1, 20, 10),
        ),
        entry(
            "2",
            NotificationKind::Interview,
            "Interview Tomorrow",
            "You have an interview scheduled with StartupXYZ tomorrow at 2:00 PM.",
            false,
            "/applications/2",
            Some(now + Duration::days(1)),
            at(2024, 1, 20, 9),
        ),
        entry(
            "3",
            NotificationKind::Achievement,
            "Achievement Unlocked!",
            "Congratulations! You've earned the \"First Application\" achievement.",
            true,
            "/achievements",
            None,
            at(2024, 1, 19, 15),
        ),
        entry(
            "4",
            NotificationKind::FollowUp,
            "Follow-up Suggestion",
            "It's been 2 weeks since you applied to MegaCorp. Consider sending a follow-up email.",
            true,
            "/applications/3",
            None,
            at(2024, 1, 18, 11),
        ),
        entry(
            "5",
            NotificationKind::System,
            "Weekly Report Ready",
            "Your weekly job search report is ready. Check your progress and insights.",
            false,
            "/analytics",
            None,
            at(2024, 1, 17, 8),
        ),
    ]
}

pub struct NotificationStore {
    items: Vec<Notification>,
}

impl NotificationStore {
    pub fn new(items: Vec<Notification>) -> Self {
        Self { items }
    }

    pub fn with_samples(user_id: &str, now: DateTime<Utc>) -> Self {
        Self::new(sample_feed(user_id, now))
    }

    pub fn list(&self, filter: ReadFilter) -> Vec<&Notification> {
        self.items.iter().filter(|n| filter.matches(n)).collect()
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    /// Returns false when no notification has this id.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for n in &mut self.items {
            n.read = true;
        }
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> NotificationStore {
        NotificationStore::with_samples("u1", at(2024, 1, 21, 0))
    }

    #[test]
    fn test_filters() {
        let store = store();
        assert_eq!(store.list(ReadFilter::All).len(), 5);
        assert_eq!(store.list(ReadFilter::Unread).len(), 3);
        assert_eq!(store.list(ReadFilter::Read).len(), 2);
        assert_eq!(store.unread_count(), 3);
        assert_eq!("unread".parse::<ReadFilter>().unwrap(), ReadFilter::Unread);
        assert!("starred".parse::<ReadFilter>().is_err());
    }

    #[test]
    fn test_mark_and_delete() {
        let mut store = store();
        assert!(store.mark_read("1"));
        assert!(!store.mark_read("99"));
        assert_eq!(store.unread_count(), 2);

        store.mark_all_read();
        assert_eq!(store.unread_count(), 0);

        assert!(store.delete("3"));
        assert!(!store.delete("3"));
        assert_eq!(store.list(ReadFilter::All).len(), 4);
    }
}
