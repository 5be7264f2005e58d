use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::remote::{RemoteError, RemoteStore};
use crate::storage::{
    to_iso, ApplicationInsert, ApplicationPatch, ApplicationRow, UserPatch, UserRow,
};

const APPLICATION_COLUMNS: &str = "id, user_id, job_title, company, location, salary, salary_max,
    job_url, description, status, applied_date, deadline_date, notes, tags, resume_id,
    cover_letter_id, contact_person, contact_email, follow_up_date, interview_dates,
    ai_match_score, skill_gaps, created_at, updated_at";

const USER_COLUMNS: &str = "id, email, name, role, avatar, location, career_goals,
    preferred_industries, skills, theme, created_at, last_login, achievements,
    streak_count, total_points";

/// Columns a patch may touch. Keys outside this list are never interpolated.
const PATCHABLE_APPLICATION: &[&str] = &[
    "job_title", "company", "location", "salary", "salary_max", "job_url", "description",
    "status", "applied_date", "deadline_date", "notes", "tags", "resume_id",
    "cover_letter_id", "contact_person", "contact_email", "follow_up_date",
    "interview_dates", "ai_match_score", "skill_gaps", "updated_at",
];

const PATCHABLE_USER: &[&str] = &[
    "name", "location", "career_goals", "preferred_industries", "skills", "theme",
    "last_login", "achievements", "streak_count", "total_points",
];

/// Local SQLite backend with the same tables as the hosted one.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'job-seeker',
                avatar TEXT,
                location TEXT,
                career_goals TEXT,
                preferred_industries TEXT,
                skills TEXT,
                theme TEXT NOT NULL DEFAULT 'light',
                created_at TEXT NOT NULL,
                last_login TEXT NOT NULL,
                achievements TEXT,
                streak_count INTEGER NOT NULL DEFAULT 0,
                total_points INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS job_applications (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                job_title TEXT NOT NULL,
                company TEXT NOT NULL,
                location TEXT NOT NULL,
                salary INTEGER,
                salary_max INTEGER,
                job_url TEXT,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'saved' CHECK (status IN ('saved', 'applied', 'interviewing', 'rejected', 'offer', 'hired')),
                applied_date TEXT,
                deadline_date TEXT,
                notes TEXT,
                tags TEXT,
                resume_id TEXT,
                cover_letter_id TEXT,
                contact_person TEXT,
                contact_email TEXT,
                follow_up_date TEXT,
                interview_dates TEXT,
                ai_match_score REAL,
                skill_gaps TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_applications_user ON job_applications(user_id);
            CREATE INDEX IF NOT EXISTS idx_applications_status ON job_applications(status);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='job_applications'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Database not initialized. Run 'jobtrack init' first."
            ));
        }
        Ok(())
    }

    fn get_application(&self, id: &str) -> Result<Option<ApplicationRow>, RemoteError> {
        let sql = format!("SELECT {} FROM job_applications WHERE id = ?1", APPLICATION_COLUMNS);
        let result = self.conn.query_row(&sql, [id], Self::row_to_application);
        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn row_to_application(row: &Row) -> rusqlite::Result<ApplicationRow> {
        Ok(ApplicationRow {
            id: row.get(0)?,
            user_id: row.get(1)?,
            job_title: row.get(2)?,
            company: row.get(3)?,
            location: row.get(4)?,
            salary: row.get(5)?,
            salary_max: row.get(6)?,
            job_url: row.get(7)?,
            description: row.get(8)?,
            status: row.get(9)?,
            applied_date: row.get(10)?,
            deadline_date: row.get(11)?,
            notes: row.get(12)?,
            tags: json_column(row, 13)?,
            resume_id: row.get(14)?,
            cover_letter_id: row.get(15)?,
            contact_person: row.get(16)?,
            contact_email: row.get(17)?,
            follow_up_date: row.get(18)?,
            interview_dates: json_column(row, 19)?,
            ai_match_score: row.get(20)?,
            skill_gaps: json_column(row, 21)?,
            created_at: row.get(22)?,
            updated_at: row.get(23)?,
        })
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<UserRow> {
        Ok(UserRow {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            role: row.get(3)?,
            avatar: row.get(4)?,
            location: row.get(5)?,
            career_goals: row.get(6)?,
            preferred_industries: json_column(row, 7)?,
            skills: json_column(row, 8)?,
            theme: row.get(9)?,
            created_at: row.get(10)?,
            last_login: row.get(11)?,
            achievements: json_column(row, 12)?,
            streak_count: row.get(13)?,
            total_points: row.get(14)?,
        })
    }

    /// Runs `UPDATE {table} SET ... WHERE {filters}` for every field the patch carries.
    fn apply_patch<P: Serialize>(
        &self,
        table: &'static str,
        allowed: &[&str],
        patch: &P,
        filters: &[(&str, &str)],
        id: &str,
    ) -> Result<(), RemoteError> {
        let fields = match serde_json::to_value(patch)? {
            serde_json::Value::Object(map) => map,
            _ => return Ok(()),
        };

        let mut sets = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();
        for (column, value) in fields {
            if !allowed.contains(&column.as_str()) {
                continue;
            }
            values.push(to_sql_value(value)?);
            sets.push(format!("{} = ?{}", column, values.len()));
        }
        if sets.is_empty() {
            return Ok(());
        }

        let mut sql = format!("UPDATE {} SET {}", table, sets.join(", "));
        for (i, (column, value)) in filters.iter().enumerate() {
            values.push(SqlValue::Text(value.to_string()));
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!("{} = ?{}", column, values.len()));
        }

        let changed = self.conn.execute(&sql, params_from_iter(values))?;
        if changed == 0 {
            return Err(RemoteError::NotFound {
                table,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

fn json_column(row: &Row, idx: usize) -> rusqlite::Result<Option<Vec<String>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|text| {
        serde_json::from_str(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn json_text(list: &[String]) -> Result<String, RemoteError> {
    Ok(serde_json::to_string(list)?)
}

fn to_sql_value(value: serde_json::Value) -> Result<SqlValue, RemoteError> {
    use serde_json::Value;
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(b as i64),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => SqlValue::Text(s),
        list @ Value::Array(_) => SqlValue::Text(serde_json::to_string(&list)?),
        obj @ Value::Object(_) => SqlValue::Text(serde_json::to_string(&obj)?),
    })
}

impl RemoteStore for Database {
    fn fetch_profile(&self, user_id: &str) -> Result<Option<UserRow>, RemoteError> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        match self.conn.query_row(&sql, [user_id], Self::row_to_user) {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn upsert_profile(&self, row: &UserRow) -> Result<(), RemoteError> {
        let preferred = row.preferred_industries.as_deref().map(json_text).transpose()?;
        let skills = row.skills.as_deref().map(json_text).transpose()?;
        let achievements = row.achievements.as_deref().map(json_text).transpose()?;
        self.conn.execute(
            "INSERT INTO users (id, email, name, role, avatar, location, career_goals,
                preferred_industries, skills, theme, created_at, last_login, achievements,
                streak_count, total_points)
             VALUES (?1, ?2, ?3, COALESCE(?4, 'job-seeker'), ?5, ?6, ?7, ?8, ?9,
                COALESCE(?10, 'light'), ?11, ?12, ?13, COALESCE(?14, 0), COALESCE(?15, 0))
             ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                role = excluded.role,
                avatar = excluded.avatar,
                location = excluded.location,
                career_goals = excluded.career_goals,
                preferred_industries = excluded.preferred_industries,
                skills = excluded.skills,
                theme = excluded.theme,
                last_login = excluded.last_login,
                achievements = excluded.achievements,
                streak_count = excluded.streak_count,
                total_points = excluded.total_points",
            params![
                row.id,
                row.email,
                row.name,
                row.role,
                row.avatar,
                row.location,
                row.career_goals,
                preferred,
                skills,
                row.theme,
                row.created_at,
                row.last_login,
                achievements,
                row.streak_count,
                row.total_points,
            ],
        )?;
        Ok(())
    }

    fn update_profile(&self, user_id: &str, patch: &UserPatch) -> Result<(), RemoteError> {
        self.apply_patch("users", PATCHABLE_USER, patch, &[("id", user_id)], user_id)
    }

    fn list_applications(&self, user_id: &str) -> Result<Vec<ApplicationRow>, RemoteError> {
        let sql = format!(
            "SELECT {} FROM job_applications WHERE user_id = ?1 ORDER BY created_at DESC",
            APPLICATION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([user_id], Self::row_to_application)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_application(&self, row: &ApplicationInsert) -> Result<ApplicationRow, RemoteError> {
        let id = Uuid::new_v4().to_string();
        let now = to_iso(&Utc::now());
        self.conn.execute(
            "INSERT INTO job_applications (id, user_id, job_title, company, location, salary,
                salary_max, job_url, description, status, applied_date, deadline_date, notes,
                tags, resume_id, cover_letter_id, contact_person, contact_email, follow_up_date,
                interview_dates, ai_match_score, skill_gaps, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?23)",
            params![
                id,
                row.user_id,
                row.job_title,
                row.company,
                row.location,
                row.salary,
                row.salary_max,
                row.job_url,
                row.description,
                row.status,
                row.applied_date,
                row.deadline_date,
                row.notes,
                json_text(&row.tags)?,
                row.resume_id,
                row.cover_letter_id,
                row.contact_person,
                row.contact_email,
                row.follow_up_date,
                json_text(&row.interview_dates)?,
                row.ai_match_score,
                json_text(&row.skill_gaps)?,
                now,
            ],
        )?;

        self.get_application(&id)?.ok_or(RemoteError::NotFound {
            table: "job_applications",
            id,
        })
    }

    fn update_application(
        &self,
        id: &str,
        user_id: &str,
        patch: &ApplicationPatch,
    ) -> Result<(), RemoteError> {
        self.apply_patch(
            "job_applications",
            PATCHABLE_APPLICATION,
            patch,
            &[("id", id), ("user_id", user_id)],
            id,
        )
    }

    fn delete_application(&self, id: &str, user_id: &str) -> Result<(), RemoteError> {
        let removed = self.conn.execute(
            "DELETE FROM job_applications WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if removed == 0 {
            return Err(RemoteError::NotFound {
                table: "job_applications",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobStatus, NewApplication};

    fn insert(db: &Database, user: &str, title: &str) -> ApplicationRow {
        let mut app = NewApplication::new(title, "Acme", "Remote");
        app.tags = vec!["rust".to_string()];
        db.insert_application(&ApplicationInsert::new(user, &app)).unwrap()
    }

    fn user_row(id: &str) -> UserRow {
        UserRow {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            name: "Test".to_string(),
            role: None,
            avatar: None,
            location: None,
            career_goals: None,
            preferred_industries: None,
            skills: Some(vec!["Rust".to_string()]),
            theme: None,
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            last_login: "2024-01-01T00:00:00.000Z".to_string(),
            achievements: None,
            streak_count: None,
            total_points: None,
        }
    }

    #[test]
    fn test_ensure_initialized() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("nested/jobtrack.db")).unwrap();
        assert!(db.ensure_initialized().is_err());
        db.init().unwrap();
        assert!(db.ensure_initialized().is_ok());
    }

    #[test]
    fn test_insert_and_list_scoped_to_owner() {
        let db = Database::in_memory().unwrap();
        let row = insert(&db, "alice", "Engineer");
        insert(&db, "bob", "Designer");

        assert_eq!(row.status, "saved");
        assert_eq!(row.tags.as_deref(), Some(&["rust".to_string()][..]));
        assert_eq!(row.created_at, row.updated_at);

        let rows = db.list_applications("alice").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].job_title, "Engineer");
    }

    #[test]
    fn test_patch_updates_only_given_columns() {
        let db = Database::in_memory().unwrap();
        let row = insert(&db, "alice", "Engineer");

        let patch = ApplicationPatch {
            status: Some(JobStatus::Interviewing.as_str().to_string()),
            interview_dates: Some(vec!["2024-02-01T10:00:00.000Z".to_string()]),
            updated_at: "2024-02-01T00:00:00.000Z".to_string(),
            ..Default::default()
        };
        db.update_application(&row.id, "alice", &patch).unwrap();

        let stored = db.get_application(&row.id).unwrap().unwrap();
        assert_eq!(stored.status, "interviewing");
        assert_eq!(stored.job_title, "Engineer");
        assert_eq!(stored.interview_dates.unwrap().len(), 1);
        assert_eq!(stored.updated_at, "2024-02-01T00:00:00.000Z");
    }

    #[test]
    fn test_other_owner_cannot_mutate() {
        let db = Database::in_memory().unwrap();
        let row = insert(&db, "alice", "Engineer");

        let patch = ApplicationPatch {
            notes: Some("hijacked".to_string()),
            updated_at: to_iso(&Utc::now()),
            ..Default::default()
        };
        assert!(matches!(
            db.update_application(&row.id, "mallory", &patch),
            Err(RemoteError::NotFound { .. })
        ));
        assert!(matches!(
            db.delete_application(&row.id, "mallory"),
            Err(RemoteError::NotFound { .. })
        ));
        db.delete_application(&row.id, "alice").unwrap();
        assert!(db.list_applications("alice").unwrap().is_empty());
    }

    #[test]
    fn test_status_check_constraint() {
        let db = Database::in_memory().unwrap();
        let mut bad = ApplicationInsert::new("alice", &NewApplication::new("t", "c", "l"));
        bad.status = "ghosted".to_string();
        assert!(matches!(db.insert_application(&bad), Err(RemoteError::Sqlite(_))));
    }

    #[test]
    fn test_profile_upsert_and_patch() {
        let db = Database::in_memory().unwrap();
        assert!(db.fetch_profile("u1").unwrap().is_none());

        db.upsert_profile(&user_row("u1")).unwrap();
        let stored = db.fetch_profile("u1").unwrap().unwrap();
        assert_eq!(stored.role.as_deref(), Some("job-seeker"));
        assert_eq!(stored.streak_count, Some(0));

        let patch = UserPatch {
            skills: Some(vec!["Rust".to_string(), "Go".to_string()]),
            total_points: Some(35),
            ..Default::default()
        };
        db.update_profile("u1", &patch).unwrap();
        let stored = db.fetch_profile("u1").unwrap().unwrap();
        assert_eq!(stored.skills.unwrap().len(), 2);
        assert_eq!(stored.total_points, Some(35));

        let mut renamed = user_row("u1");
        renamed.name = "Renamed".to_string();
        db.upsert_profile(&renamed).unwrap();
        assert_eq!(db.fetch_profile("u1").unwrap().unwrap().name, "Renamed");
    }
}
