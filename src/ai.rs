use anyhow::{anyhow, Result};
use serde::Serialize;
use std::time::Duration;

// The tools return canned analyses after a fixed delay. Nothing here calls a
// model; the delay stands in for one so callers exercise the async path.

const MATCH_DELAY_MS: u64 = 2000;
const COVER_LETTER_DELAY_MS: u64 = 1500;
const SKILL_GAP_DELAY_MS: u64 = 2000;

const ANSWER_FEEDBACK: &str = "Good answer! You demonstrated understanding of the concept. \
To improve, consider adding specific examples from your experience and mentioning best practices.";

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(anyhow!("{}", message))
    } else {
        Ok(())
    }
}

// --- Result types ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAnalysis {
    pub match_score: u32,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CoverLetterRequest {
    pub job_title: String,
    pub company: String,
    pub hiring_manager: Option<String>,
    pub key_points: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Behavioral,
    Technical,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Behavioral => "behavioral",
            QuestionKind::Technical => "technical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(anyhow!("Unknown difficulty '{}'. Use easy, medium or hard", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterviewQuestion {
    pub id: u32,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub difficulty: Difficulty,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingSkill {
    pub skill: String,
    pub priority: Priority,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningWeek {
    pub week: u32,
    pub focus: String,
    pub resources: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapAnalysis {
    pub missing_skills: Vec<MissingSkill>,
    pub strength_skills: Vec<String>,
    pub recommendations: Vec<String>,
    pub learning_path: Vec<LearningWeek>,
}

// --- Tools ---

#[derive(Debug, Clone, Copy)]
pub struct AiTools {
    delay_scale: f64,
}

impl AiTools {
    /// `delay_scale` multiplies every simulated delay; 0 disables them.
    pub fn new(delay_scale: f64) -> Self {
        Self {
            delay_scale: delay_scale.max(0.0),
        }
    }

    async fn think(&self, millis: u64) {
        let scaled = (millis as f64 * self.delay_scale).round() as u64;
        if scaled > 0 {
            tokio::time::sleep(Duration::from_millis(scaled)).await;
        }
    }

    pub async fn match_resume(&self, resume: &str, job_description: &str) -> Result<MatchAnalysis> {
        if resume.trim().is_empty() || job_description.trim().is_empty() {
            return Err(anyhow!("Please provide both resume and job description"));
        }
        log::debug!(
            "matching resume ({} chars) against job description ({} chars)",
            resume.len(),
            job_description.len()
        );
        self.think(MATCH_DELAY_MS).await;

        Ok(MatchAnalysis {
            match_score: 78,
            strengths: owned(&[
                "Strong technical skills alignment",
                "Relevant experience in React and Node.js",
                "Good educational background match",
            ]),
            improvements: owned(&[
                "Add more cloud computing experience",
                "Include specific project metrics",
                "Highlight leadership experience",
            ]),
            missing_keywords: owned(&["AWS", "Docker", "Kubernetes", "Agile"]),
            recommendations: owned(&[
                "Emphasize your experience with modern JavaScript frameworks",
                "Add quantifiable achievements to your work experience",
                "Include relevant certifications or courses",
            ]),
        })
    }

    pub async fn generate_cover_letter(&self, request: &CoverLetterRequest) -> Result<String> {
        if request.job_title.trim().is_empty() || request.company.trim().is_empty() {
            return Err(anyhow!("Please provide job title and company name"));
        }
        self.think(COVER_LETTER_DELAY_MS).await;

        let manager = request
            .hiring_manager
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("Hiring Manager");
        let title = &request.job_title;
        let company = &request.company;

        let mut letter = format!(
            "Dear {manager},\n\n\
            I am writing to express my strong interest in the {title} position at {company}. \
            With my background in software development and passion for creating innovative solutions, \
            I am excited about the opportunity to contribute to your team.\n\n\
            In my previous roles, I have developed expertise in modern web technologies including React, \
            Node.js, and cloud platforms. I am particularly drawn to {company} because of your commitment \
            to innovation and excellence in the technology space.\n\n"
        );
        if let Some(points) = request.key_points.as_deref().filter(|p| !p.trim().is_empty()) {
            letter.push_str(&format!("Additionally, I would like to highlight: {points}\n\n"));
        }
        letter.push_str(&format!(
            "I would welcome the opportunity to discuss how my skills and enthusiasm can contribute to \
            {company}'s continued success. Thank you for considering my application.\n\n\
            Best regards,\n\
            [Your Name]"
        ));
        Ok(letter)
    }

    /// The question set is the same for every role and difficulty.
    pub async fn interview_questions(
        &self,
        role: &str,
        difficulty: Difficulty,
    ) -> Result<Vec<InterviewQuestion>> {
        require(role, "Please choose a role to practice for")?;
        log::debug!("interview practice for {} at {}", role, difficulty.as_str());

        let question = |id, text: &str, kind, difficulty, category: &str| InterviewQuestion {
            id,
            question: text.to_string(),
            kind,
            difficulty,
            category: category.to_string(),
        };
        Ok(vec![
            question(
                1,
                "Tell me about yourself and your experience with React.",
                QuestionKind::Behavioral,
                Difficulty::Easy,
                "Introduction",
            ),
            question(
                2,
                "How do you handle state management in large React applications?",
                QuestionKind::Technical,
                Difficulty::Medium,
                "React",
            ),
            question(
                3,
                "Describe a challenging project you worked on and how you overcame obstacles.",
                QuestionKind::Behavioral,
                Difficulty::Medium,
                "Problem Solving",
            ),
            question(
                4,
                "Explain the difference between useMemo and useCallback hooks.",
                QuestionKind::Technical,
                Difficulty::Hard,
                "React Hooks",
            ),
            question(
                5,
                "How do you stay updated with the latest frontend technologies?",
                QuestionKind::Behavioral,
                Difficulty::Easy,
                "Learning",
            ),
        ])
    }

    pub fn answer_feedback(&self, answer: &str) -> Result<String> {
        require(answer, "Please provide an answer")?;
        Ok(ANSWER_FEEDBACK.to_string())
    }

    pub async fn analyze_skill_gap(
        &self,
        target_role: &str,
        current_skills: &str,
    ) -> Result<SkillGapAnalysis> {
        if target_role.trim().is_empty() || current_skills.trim().is_empty() {
            return Err(anyhow!("Please provide target role and current skills"));
        }
        self.think(SKILL_GAP_DELAY_MS).await;

        let missing = |skill: &str, priority, resources: &[&str]| MissingSkill {
            skill: skill.to_string(),
            priority,
            resources: owned(resources),
        };
        let week = |week, focus: &str, resources| LearningWeek {
            week,
            focus: focus.to_string(),
            resources,
        };

        Ok(SkillGapAnalysis {
            missing_skills: vec![
                missing("Docker", Priority::High, &["Docker Official Tutorial", "Kubernetes Course"]),
                missing("AWS", Priority::High, &["AWS Certified Developer", "Cloud Practitioner"]),
                missing("GraphQL", Priority::Medium, &["GraphQL Tutorial", "Apollo Client Guide"]),
                missing("TypeScript", Priority::Medium, &["TypeScript Handbook", "Advanced TypeScript"]),
            ],
            strength_skills: owned(&["React", "JavaScript", "Node.js", "CSS"]),
            recommendations: owned(&[
                "Focus on containerization technologies (Docker, Kubernetes)",
                "Gain cloud platform experience, particularly AWS",
                "Learn modern API technologies like GraphQL",
                "Strengthen TypeScript knowledge for better code quality",
            ]),
            learning_path: vec![
                week(1, "Docker Fundamentals", 2),
                week(2, "AWS Basics", 3),
                week(3, "Kubernetes Introduction", 2),
                week(4, "GraphQL & Apollo", 2),
            ],
        })
    }
}

/// Runs one tool future to completion on a fresh current-thread runtime.
pub fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    Ok(runtime.block_on(future))
}
