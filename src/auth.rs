use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;

use crate::models::{Theme, UserProfile, UserRole};
use crate::remote::check_status;

pub const DEMO_USER_ID: &str = "demo-user-id";
pub const DEMO_EMAIL: &str = "demo@jobtrackerpro.com";
const DEMO_NAME: &str = "Demo User";

/// A signed-in backend user or the explicit demo user. Demo mode is only
/// entered on request, never as a stand-in for a failed login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Session {
    Authenticated {
        user_id: String,
        email: String,
        access_token: String,
    },
    Demo,
}

impl Session {
    pub fn user_id(&self) -> &str {
        match self {
            Session::Authenticated { user_id, .. } => user_id,
            Session::Demo => DEMO_USER_ID,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Session::Authenticated { email, .. } => email,
            Session::Demo => DEMO_EMAIL,
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Session::Demo)
    }

    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        match serde_json::from_str(&text) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                log::warn!("Discarding unreadable session file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write session file: {}", path.display()))
    }

    pub fn clear(path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove session file: {}", path.display()))?;
        }
        Ok(())
    }
}

/// Profile for a freshly registered account.
pub fn new_profile(id: &str, email: &str, name: &str, now: DateTime<Utc>) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        role: UserRole::JobSeeker,
        avatar: None,
        location: None,
        career_goals: None,
        preferred_industries: Vec::new(),
        skills: Vec::new(),
        theme: Theme::Light,
        created_at: now,
        last_login: now,
        achievements: Vec::new(),
        streak_count: 0,
        total_points: 0,
    }
}

/// The seeded profile behind a demo session.
pub fn demo_profile(now: DateTime<Utc>) -> UserProfile {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    UserProfile {
        location: Some("Demo City".to_string()),
        career_goals: Some("Exploring job opportunities".to_string()),
        preferred_industries: strings(&["Technology", "Software Development"]),
        skills: strings(&["JavaScript", "React", "Node.js", "TypeScript"]),
        achievements: strings(&["first-application", "profile-complete"]),
        streak_count: 5,
        total_points: 150,
        ..new_profile(DEMO_USER_ID, DEMO_EMAIL, DEMO_NAME, now)
    }
}

pub fn demo_session() -> Session {
    log::warn!("Entering demo mode: data is stored locally under the demo user");
    Session::Demo
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
    // Signup without auto-confirm returns the bare user.
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
}

fn auth_error_message(body: &str) -> String {
    let parsed: AuthErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .unwrap_or_else(|| body.to_string())
}

/// Outcome of a signup. Projects that require email confirmation return no
/// token until the address is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    SignedIn(Session),
    ConfirmationPending { user_id: String },
}

pub struct Authenticator {
    base_url: String,
    anon_key: String,
    client: Client,
}

impl Authenticator {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client: Client::new(),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn post(&self, url: &str, body: serde_json::Value, token: Option<&str>) -> Result<String> {
        let mut request = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        let response = request.send().context("Failed to reach the auth service")?;
        match check_status(response) {
            Ok(response) => Ok(response.text()?),
            Err(crate::remote::RemoteError::Status { status, body }) => Err(anyhow!(
                "Auth request failed ({}): {}",
                status,
                auth_error_message(&body)
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub fn login(&self, email: &str, password: &str) -> Result<Session> {
        let text = self.post(
            &self.auth_url("token?grant_type=password"),
            json!({ "email": email, "password": password }),
            None,
        )?;
        let parsed: TokenResponse =
            serde_json::from_str(&text).context("Failed to parse auth response")?;
        let access_token = parsed
            .access_token
            .ok_or_else(|| anyhow!("Auth response carried no access token"))?;
        let user = parsed
            .user
            .ok_or_else(|| anyhow!("Auth response carried no user"))?;
        log::info!("signed in as {}", user.id);
        Ok(Session::Authenticated {
            user_id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
            access_token,
        })
    }

    pub fn register(&self, email: &str, password: &str) -> Result<Registration> {
        let text = self.post(
            &self.auth_url("signup"),
            json!({ "email": email, "password": password }),
            None,
        )?;
        let parsed: TokenResponse =
            serde_json::from_str(&text).context("Failed to parse signup response")?;
        match (parsed.access_token, parsed.user, parsed.id) {
            (Some(access_token), Some(user), _) => Ok(Registration::SignedIn(Session::Authenticated {
                user_id: user.id,
                email: user.email.unwrap_or_else(|| email.to_string()),
                access_token,
            })),
            (None, Some(user), _) => Ok(Registration::ConfirmationPending { user_id: user.id }),
            (None, None, Some(id)) => Ok(Registration::ConfirmationPending { user_id: id }),
            _ => Err(anyhow!("Signup response carried no user")),
        }
    }

    /// Demo sessions have nothing to revoke.
    pub fn logout(&self, session: &Session) -> Result<()> {
        if let Session::Authenticated { access_token, .. } = session {
            self.post(&self.auth_url("logout"), json!({}), Some(access_token))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_session_round_trip_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");
        assert_eq!(Session::load(&path).unwrap(), None);

        let session = Session::Authenticated {
            user_id: "u-1".to_string(),
            email: "a@b.co".to_string(),
            access_token: "tok".to_string(),
        };
        session.save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), Some(session));

        Session::clear(&path).unwrap();
        assert!(!path.exists());
        Session::clear(&path).unwrap();
    }

    #[test]
    fn test_demo_session_serializes_by_mode() {
        let json = serde_json::to_value(Session::Demo).unwrap();
        assert_eq!(json["mode"], "demo");
        assert_eq!(Session::Demo.user_id(), DEMO_USER_ID);
        assert!(Session::Demo.is_demo());
    }

    #[test]
    fn test_corrupt_session_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{\"mode\": \"wizard\"}").unwrap();
        assert_eq!(Session::load(&path).unwrap(), None);
    }

    #[test]
    fn test_demo_profile_values() {
        let profile = demo_profile(Utc::now());
        assert_eq!(profile.id, DEMO_USER_ID);
        assert_eq!(profile.email, DEMO_EMAIL);
        assert_eq!(profile.skills.len(), 4);
        assert_eq!(profile.streak_count, 5);
        assert_eq!(profile.total_points, 150);
        assert_eq!(profile.role, UserRole::JobSeeker);
    }

    #[test]
    fn test_auth_error_message_prefers_description() {
        assert_eq!(
            auth_error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(auth_error_message(r#"{"msg":"User already registered"}"#), "User already registered");
        assert_eq!(auth_error_message("gateway timeout"), "gateway timeout");
    }

    #[test]
    fn test_failed_login_is_an_error() {
        // Nothing listens on the discard port.
        let auth = Authenticator::new("http://127.0.0.1:9", "key");
        assert!(auth.login("a@b.co", "pw").is_err());
    }

    #[test]
    fn test_auth_urls() {
        let auth = Authenticator::new("https://x.supabase.co/", "key");
        assert_eq!(
            auth.auth_url("token?grant_type=password"),
            "https://x.supabase.co/auth/v1/token?grant_type=password"
        );
    }
}
