use anyhow::{anyhow, Context, Result};
use chrono::Utc;

use crate::models::{
    ApplicationUpdate, JobApplication, JobStatus, NewApplication, ProfileUpdate, UserProfile,
};
use crate::remote::RemoteStore;
use crate::storage::{
    apply_profile_update, ApplicationInsert, ApplicationPatch, UserPatch, UserRow,
};
use crate::validation::validate_application;

/// Caches one owner's applications. Every mutation goes to the store first and
/// then refetches, so the cache only holds what the store returned. A failed
/// store call is logged and leaves the cache as it was.
pub struct ApplicationRepository<'a> {
    store: &'a dyn RemoteStore,
    user_id: String,
    cache: Vec<JobApplication>,
    loaded: bool,
}

impl<'a> ApplicationRepository<'a> {
    pub fn new(store: &'a dyn RemoteStore, user_id: &str) -> Self {
        Self {
            store,
            user_id: user_id.to_string(),
            cache: Vec::new(),
            loaded: false,
        }
    }

    /// Creates the repository and loads the owner's applications.
    pub fn load(store: &'a dyn RemoteStore, user_id: &str) -> Result<Self> {
        let mut repo = Self::new(store, user_id);
        repo.refresh()?;
        Ok(repo)
    }

    /// Refetches the owner's applications, replacing the cache on success only.
    pub fn refresh(&mut self) -> Result<()> {
        let rows = match self.store.list_applications(&self.user_id) {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Error fetching applications for {}: {}", self.user_id, e);
                return Err(e).context("Failed to fetch applications");
            }
        };

        let mut applications = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match JobApplication::try_from(row) {
                Ok(app) => applications.push(app),
                Err(e) => {
                    log::error!("Error decoding application {}: {}", id, e);
                    return Err(e).with_context(|| format!("Application {} is malformed", id));
                }
            }
        }

        log::debug!("Loaded {} applications", applications.len());
        self.cache = applications;
        self.loaded = true;
        Ok(())
    }

    /// Newest first, as returned by the store.
    pub fn list(&self) -> &[JobApplication] {
        &self.cache
    }

    pub fn get(&self, id: &str) -> Option<&JobApplication> {
        self.cache.iter().find(|app| app.id == id)
    }

    /// Resolves a full id or a unique id prefix.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<&JobApplication> {
        if let Some(app) = self.get(id_or_prefix) {
            return Ok(app);
        }
        let matches: Vec<&JobApplication> = self
            .cache
            .iter()
            .filter(|app| app.id.starts_with(id_or_prefix))
            .collect();
        match matches.as_slice() {
            [app] => Ok(*app),
            [] => Err(anyhow!("Application '{}' not found", id_or_prefix)),
            _ => Err(anyhow!(
                "Application id prefix '{}' is ambiguous ({} matches)",
                id_or_prefix,
                matches.len()
            )),
        }
    }

    /// Case-insensitive search over title and company, optionally by status.
    pub fn filter(&self, search: Option<&str>, status: Option<JobStatus>) -> Vec<&JobApplication> {
        let needle = search.map(str::to_lowercase).unwrap_or_default();
        self.cache
            .iter()
            .filter(|app| {
                needle.is_empty()
                    || app.job_title.to_lowercase().contains(&needle)
                    || app.company.to_lowercase().contains(&needle)
            })
            .filter(|app| status.is_none_or(|s| app.status == s))
            .collect()
    }

    pub fn create(&mut self, application: &NewApplication) -> Result<JobApplication> {
        validate_application(application)?;

        let insert = ApplicationInsert::new(&self.user_id, application);
        let row = match self.store.insert_application(&insert) {
            Ok(row) => row,
            Err(e) => {
                log::error!("Error adding application: {}", e);
                return Err(e).context("Failed to add application");
            }
        };
        let created = JobApplication::try_from(row).context("Store returned a malformed row")?;
        log::info!("Added application {} ({} at {})", created.id, created.job_title, created.company);

        self.refresh()?;
        Ok(created)
    }

    pub fn update(&mut self, id: &str, update: &ApplicationUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        if !self.loaded || self.get(id).is_none() {
            self.refresh()?;
        }
        let current = self
            .get(id)
            .ok_or_else(|| anyhow!("Application '{}' not found", id))?;
        let mut merged = NewApplication::from(current);
        merge_update(&mut merged, update);
        validate_application(&merged)?;

        let patch = ApplicationPatch::from_update(update, Utc::now());
        if let Err(e) = self.store.update_application(id, &self.user_id, &patch) {
            log::error!("Error updating application {}: {}", id, e);
            return Err(e).context("Failed to update application");
        }
        log::info!("Updated application {}", id);

        self.refresh()
    }

    pub fn delete(&mut self, id: &str) -> Result<()> {
        if let Err(e) = self.store.delete_application(id, &self.user_id) {
            log::error!("Error deleting application {}: {}", id, e);
            return Err(e).context("Failed to delete application");
        }
        log::info!("Deleted application {}", id);

        self.refresh()
    }

    /// Copies an application as a fresh "saved" entry without its history.
    pub fn duplicate(&mut self, id: &str) -> Result<JobApplication> {
        let original = self
            .get(id)
            .ok_or_else(|| anyhow!("Application '{}' not found", id))?;

        let mut copy = NewApplication::from(original);
        copy.job_title = format!("{} (Copy)", original.job_title);
        copy.status = JobStatus::Saved;
        copy.applied_date = None;
        copy.interview_dates.clear();

        self.create(&copy)
    }

    /// Count per status, in first-seen order.
    pub fn status_counts(&self) -> Vec<(JobStatus, usize)> {
        let mut counts: Vec<(JobStatus, usize)> = Vec::new();
        for app in &self.cache {
            match counts.iter_mut().find(|(status, _)| *status == app.status) {
                Some((_, n)) => *n += 1,
                None => counts.push((app.status, 1)),
            }
        }
        counts
    }
}

fn merge_update(app: &mut NewApplication, update: &ApplicationUpdate) {
    fn set<T: Clone>(field: &mut T, value: &Option<T>) {
        if let Some(v) = value {
            *field = v.clone();
        }
    }
    fn set_opt<T: Clone>(field: &mut Option<T>, value: &Option<T>) {
        if value.is_some() {
            *field = value.clone();
        }
    }

    set(&mut app.job_title, &update.job_title);
    set(&mut app.company, &update.company);
    set(&mut app.location, &update.location);
    set_opt(&mut app.salary, &update.salary);
    set_opt(&mut app.salary_max, &update.salary_max);
    set_opt(&mut app.job_url, &update.job_url);
    set_opt(&mut app.description, &update.description);
    set(&mut app.status, &update.status);
    set_opt(&mut app.applied_date, &update.applied_date);
    set_opt(&mut app.deadline_date, &update.deadline_date);
    set(&mut app.notes, &update.notes);
    set(&mut app.tags, &update.tags);
    set_opt(&mut app.resume_id, &update.resume_id);
    set_opt(&mut app.cover_letter_id, &update.cover_letter_id);
    set_opt(&mut app.contact_person, &update.contact_person);
    set_opt(&mut app.contact_email, &update.contact_email);
    set_opt(&mut app.follow_up_date, &update.follow_up_date);
    set(&mut app.interview_dates, &update.interview_dates);
    set_opt(&mut app.ai_match_score, &update.ai_match_score);
    set(&mut app.skill_gaps, &update.skill_gaps);
}

pub struct ProfileRepository<'a> {
    store: &'a dyn RemoteStore,
    cached: Option<UserProfile>,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(store: &'a dyn RemoteStore) -> Self {
        Self {
            store,
            cached: None,
        }
    }

    pub fn load(&mut self, user_id: &str) -> Result<Option<&UserProfile>> {
        let row = match self.store.fetch_profile(user_id) {
            Ok(row) => row,
            Err(e) => {
                log::error!("Error fetching user profile {}: {}", user_id, e);
                return Err(e).context("Failed to fetch user profile");
            }
        };
        self.cached = row
            .map(UserProfile::try_from)
            .transpose()
            .context("Stored profile is malformed")?;
        Ok(self.cached.as_ref())
    }

    pub fn current(&self) -> Option<&UserProfile> {
        self.cached.as_ref()
    }

    pub fn save(&mut self, profile: &UserProfile) -> Result<()> {
        if let Err(e) = self.store.upsert_profile(&UserRow::from(profile)) {
            log::error!("Error saving user profile {}: {}", profile.id, e);
            return Err(e).context("Failed to save user profile");
        }
        self.cached = Some(profile.clone());
        Ok(())
    }

    pub fn update(&mut self, user_id: &str, update: &ProfileUpdate) -> Result<()> {
        if let Err(e) = self.store.update_profile(user_id, &UserPatch::from(update)) {
            log::error!("Error updating user profile {}: {}", user_id, e);
            return Err(e).context("Failed to update user profile");
        }
        if let Some(profile) = self.cached.as_mut().filter(|p| p.id == user_id) {
            apply_profile_update(profile, update);
        }
        Ok(())
    }
}
