use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const PLACEHOLDER_URL: &str = "https://your-project-id.supabase.co";
const PLACEHOLDER_KEY: &str = "your-anon-key-here";

/// Optional `config.json` in the user's config dir. Every key may be omitted.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FileConfig {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub demo: Option<bool>,
    pub db_path: Option<PathBuf>,
    pub ai_delay_scale: Option<f64>,
}

impl FileConfig {
    /// A missing file is an empty config; a malformed one is an error.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub demo_mode: bool,
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub ai_delay_scale: f64,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "jobtrack")
}

fn truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Drops empty and template credentials so they read as "not configured".
fn credential(value: Option<String>, placeholder: &str, name: &str) -> Option<String> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())?;
    if value == placeholder {
        log::warn!("{} is still the template placeholder; ignoring it", name);
        return None;
    }
    Some(value)
}

impl Config {
    pub fn load() -> Result<Self> {
        let (config_file, data_dir) = match project_dirs() {
            Some(dirs) => (
                Some(dirs.config_dir().join("config.json")),
                dirs.data_dir().to_path_buf(),
            ),
            // Fallback to current directory
            None => (None, PathBuf::from(".")),
        };
        let file = match &config_file {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok(), data_dir)
    }

    /// Layers environment values over file values.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        data_dir: PathBuf,
    ) -> Result<Self> {
        let backend_url = credential(
            env("JOBTRACK_BACKEND_URL").or(file.backend_url),
            PLACEHOLDER_URL,
            "backend URL",
        )
        .map(|url| url.trim_end_matches('/').to_string());
        let anon_key = credential(
            env("JOBTRACK_ANON_KEY").or(file.anon_key),
            PLACEHOLDER_KEY,
            "anon key",
        );

        let demo_mode = match env("JOBTRACK_DEMO") {
            Some(value) => truthy(&value),
            None => file.demo.unwrap_or(false),
        };

        let db_path = env("JOBTRACK_DB")
            .map(PathBuf::from)
            .or(file.db_path)
            .unwrap_or_else(|| data_dir.join("jobtrack.db"));

        let ai_delay_scale = match env("JOBTRACK_AI_DELAY_SCALE") {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .with_context(|| format!("JOBTRACK_AI_DELAY_SCALE must be a number, got '{}'", raw))?,
            None => file.ai_delay_scale.unwrap_or(1.0),
        };

        Ok(Self {
            backend_url,
            anon_key,
            demo_mode,
            db_path,
            data_dir,
            ai_delay_scale,
        })
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}
