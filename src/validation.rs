use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::NewApplication;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid application: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<FieldError>);

/// Checks a submission before anything is sent to the store.
pub fn validate_application(app: &NewApplication) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: &str| {
        errors.push(FieldError {
            field,
            message: message.to_string(),
        })
    };

    if app.job_title.trim().is_empty() {
        fail("jobTitle", "Job title is required");
    }
    if app.company.trim().is_empty() {
        fail("company", "Company is required");
    }
    if app.salary.is_some_and(|s| s < 0) || app.salary_max.is_some_and(|s| s < 0) {
        fail("salary", "Salary cannot be negative");
    }
    if let (Some(min), Some(max)) = (app.salary, app.salary_max) {
        if min > max {
            fail("salaryMax", "Maximum salary must not be below the minimum");
        }
    }
    if let Some(email) = app.contact_email.as_deref().filter(|e| !e.is_empty()) {
        if !EMAIL.is_match(email) {
            fail("contactEmail", "Contact email is not a valid address");
        }
    }
    if let Some(url) = app.job_url.as_deref().filter(|u| !u.is_empty()) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            fail("jobUrl", "Job URL must start with http:// or https://");
        }
    }
    if app.ai_match_score.is_some_and(|s| !(0.0..=100.0).contains(&s)) {
        fail("aiMatchScore", "Match score must be between 0 and 100");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_application_passes() {
        let mut app = NewApplication::new("Engineer", "Acme", "Remote");
        app.salary = Some(100_000);
        app.salary_max = Some(120_000);
        app.contact_email = Some("jane@acme.example".to_string());
        app.job_url = Some("https://acme.example/jobs/7".to_string());
        assert!(validate_application(&app).is_ok());
    }

    #[test]
    fn test_collects_every_field_error() {
        let mut app = NewApplication::new(" ", "", "Remote");
        app.salary = Some(150_000);
        app.salary_max = Some(90_000);
        app.contact_email = Some("not-an-email".to_string());
        app.job_url = Some("acme.example".to_string());

        let err = validate_application(&app).unwrap_err();
        let fields: Vec<&str> = err.0.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["jobTitle", "company", "salaryMax", "contactEmail", "jobUrl"]
        );
        assert!(err.to_string().starts_with("invalid application: jobTitle"));
    }

    #[test]
    fn test_email_pattern() {
        for good in ["a@b.co", "first.last+jobs@mail.example.org"] {
            assert!(EMAIL.is_match(good), "{}", good);
        }
        for bad in ["plain", "a@b", "a b@c.io", "@c.io"] {
            assert!(!EMAIL.is_match(bad), "{}", bad);
        }
    }

    #[test]
    fn test_empty_optional_fields_are_ignored() {
        let mut app = NewApplication::new("Engineer", "Acme", "");
        app.contact_email = Some(String::new());
        app.job_url = Some(String::new());
        assert!(validate_application(&app).is_ok());
    }
}
