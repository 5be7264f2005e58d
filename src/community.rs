use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeZone, Utc};

use crate::documents::local_id;
use crate::models::{CommunityPost, PostKind};

const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub kind: PostKind,
    pub tags: Vec<String>,
    pub is_anonymous: bool,
}

fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn sample_posts() -> Vec<CommunityPost> {
    let samples = [
        (
            "user1",
            "Sarah Chen",
            "Just landed my dream job at Google!",
            "After 6 months of preparation and 50+ applications, I finally got an offer from Google as a Senior Frontend Engineer. Here are the key things that helped me...",
            PostKind::Success,
            &["Google", "Frontend", "Success Story"][..],
            124,
            23,
            false,
            20,
        ),
        (
            "user2",
            ANONYMOUS,
            "How to negotiate salary effectively?",
            "I have an offer but I think the salary is below market rate. What are some strategies to negotiate without losing the offer?",
            PostKind::Question,
            &["Salary", "Negotiation", "Advice"][..],
            45,
            18,
            true,
            19,
        ),
        (
            "user3",
            "Mike Rodriguez",
            "Best resources for system design interviews",
            "Sharing a curated list of resources that helped me ace system design interviews at FAANG companies...",
            PostKind::Resource,
            &["System Design", "Interview", "Resources"][..],
            89,
            12,
            false,
            18,
        ),
        (
            "user4",
            ANONYMOUS,
            "Feeling overwhelmed with job search",
            "Been searching for 4 months with no luck. Getting rejections or no responses. How do you stay motivated?",
            PostKind::Advice,
            &["Motivation", "Job Search", "Mental Health"][..],
            67,
            31,
            true,
            17,
        ),
    ];

    samples
        .iter()
        .enumerate()
        .map(
            |(i, (user_id, user_name, title, content, kind, tags, likes, replies, anonymous, d))| {
                CommunityPost {
                    id: (i + 1).to_string(),
                    user_id: user_id.to_string(),
                    user_name: user_name.to_string(),
                    title: title.to_string(),
                    content: content.to_string(),
                    kind: *kind,
                    tags: tags.iter().map(|t| t.to_string()).collect(),
                    likes: *likes,
                    replies: *replies,
                    is_anonymous: *anonymous,
                    created_at: day(2024, 1, *d),
                }
            },
        )
        .collect()
}

/// Community board. Starts from sample posts; nothing is persisted.
pub struct CommunityStore {
    posts: Vec<CommunityPost>,
}

impl CommunityStore {
    pub fn new(posts: Vec<CommunityPost>) -> Self {
        Self { posts }
    }

    pub fn with_samples() -> Self {
        Self::new(sample_posts())
    }

    /// Total first, then one count per post type.
    pub fn tab_counts(&self) -> Vec<(Option<PostKind>, usize)> {
        let mut counts = vec![(None, self.posts.len())];
        for kind in PostKind::ALL {
            let n = self.posts.iter().filter(|p| p.kind == kind).count();
            counts.push((Some(kind), n));
        }
        counts
    }

    /// Case-insensitive match on title, content or any tag, optionally by type.
    pub fn search(&self, term: &str, kind: Option<PostKind>) -> Vec<&CommunityPost> {
        let needle = term.to_lowercase();
        self.posts
            .iter()
            .filter(|p| kind.is_none_or(|k| p.kind == k))
            .filter(|p| {
                p.title.to_lowercase().contains(&needle)
                    || p.content.to_lowercase().contains(&needle)
                    || p.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn like(&mut self, id: &str) -> Result<u32> {
        let post = self
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("Post '{}' not found", id))?;
        post.likes += 1;
        Ok(post.likes)
    }

    /// Newest first. Anonymous posts hide the author's name.
    pub fn add(
        &mut self,
        post: NewPost,
        user_id: &str,
        user_name: &str,
        now: DateTime<Utc>,
    ) -> Result<&CommunityPost> {
        if post.title.trim().is_empty() || post.content.trim().is_empty() {
            return Err(anyhow!("A post needs a title and content"));
        }
        let user_name = if post.is_anonymous { ANONYMOUS } else { user_name };
        self.posts.insert(
            0,
            CommunityPost {
                id: local_id(),
                user_id: user_id.to_string(),
                user_name: user_name.to_string(),
                title: post.title,
                content: post.content,
                kind: post.kind,
                tags: post.tags,
                likes: 0,
                replies: 0,
                is_anonymous: post.is_anonymous,
                created_at: now,
            },
        );
        Ok(&self.posts[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(anonymous: bool) -> NewPost {
        NewPost {
            title: "Take-home or live coding?".to_string(),
            content: "Which do you prefer and why?".to_string(),
            kind: PostKind::Question,
            tags: vec!["Interview".to_string()],
            is_anonymous: anonymous,
        }
    }

    #[test]
    fn test_tab_counts() {
        let store = CommunityStore::with_samples();
        assert_eq!(
            store.tab_counts(),
            vec![
                (None, 4),
                (Some(PostKind::Success), 1),
                (Some(PostKind::Question), 1),
                (Some(PostKind::Advice), 1),
                (Some(PostKind::Resource), 1),
            ]
        );
    }

    #[test]
    fn test_search_matches_title_content_and_tags() {
        let store = CommunityStore::with_samples();
        assert_eq!(store.search("", None).len(), 4);
        assert_eq!(store.search("GOOGLE", None).len(), 1);
        assert_eq!(store.search("mental health", None).len(), 1);
        assert_eq!(store.search("interview", None).len(), 1);
        assert!(store.search("interview", Some(PostKind::Success)).is_empty());
        assert_eq!(store.search("", Some(PostKind::Advice))[0].id, "4");
    }

    #[test]
    fn test_like_increments() {
        let mut store = CommunityStore::with_samples();
        assert_eq!(store.like("2").unwrap(), 46);
        assert_eq!(store.like("2").unwrap(), 47);
        assert!(store.like("99").is_err());
    }

    #[test]
    fn test_add_post() {
        let mut store = CommunityStore::with_samples();
        let now = Utc::now();
        let post = store.add(question(true), "u1", "Ada", now).unwrap();
        assert_eq!(post.user_name, "Anonymous");
        assert_eq!(post.likes, 0);
        assert_eq!(store.search("", None)[0].title, "Take-home or live coding?");
        assert_eq!(store.tab_counts()[2], (Some(PostKind::Question), 2));

        let named = store.add(question(false), "u1", "Ada", now).unwrap();
        assert_eq!(named.user_name, "Ada");

        let mut empty = question(false);
        empty.title = " ".to_string();
        assert!(store.add(empty, "u1", "Ada", now).is_err());
    }
}
