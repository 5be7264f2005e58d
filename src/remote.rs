use reqwest::blocking::{Client, RequestBuilder, Response};
use thiserror::Error;

use crate::storage::{
    ApplicationInsert, ApplicationPatch, ApplicationRow, RowError, UserPatch, UserRow,
};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not decode stored value: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: String },
    #[error(transparent)]
    InvalidRow(#[from] RowError),
}

/// Row-level access to the `users` and `job_applications` tables.
///
/// Every application call is scoped to an owner id; implementations must
/// never touch rows belonging to another user. Updates and deletes that match
/// no row fail with [`RemoteError::NotFound`].
pub trait RemoteStore {
    fn fetch_profile(&self, user_id: &str) -> Result<Option<UserRow>, RemoteError>;
    fn upsert_profile(&self, row: &UserRow) -> Result<(), RemoteError>;
    fn update_profile(&self, user_id: &str, patch: &UserPatch) -> Result<(), RemoteError>;

    /// Newest first.
    fn list_applications(&self, user_id: &str) -> Result<Vec<ApplicationRow>, RemoteError>;
    fn insert_application(&self, row: &ApplicationInsert) -> Result<ApplicationRow, RemoteError>;
    fn update_application(
        &self,
        id: &str,
        user_id: &str,
        patch: &ApplicationPatch,
    ) -> Result<(), RemoteError>;
    fn delete_application(&self, id: &str, user_id: &str) -> Result<(), RemoteError>;
}

const USERS: &str = "users";
const APPLICATIONS: &str = "job_applications";

/// PostgREST client for the hosted backend.
#[derive(Debug)]
pub struct RestStore {
    base_url: String,
    anon_key: String,
    access_token: String,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: &str, anon_key: &str, access_token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: access_token.to_string(),
            client: Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("Content-Type", "application/json")
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self.authorized(request).send()?;
        check_status(response)
    }
}

/// Zero rows back from a `return=representation` write means the filter matched nothing.
fn require_affected(
    rows: &[serde_json::Value],
    table: &'static str,
    id: &str,
) -> Result<(), RemoteError> {
    if rows.is_empty() {
        return Err(RemoteError::NotFound {
            table,
            id: id.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_status(response: Response) -> Result<Response, RemoteError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    Err(RemoteError::Status { status, body })
}

impl RemoteStore for RestStore {
    fn fetch_profile(&self, user_id: &str) -> Result<Option<UserRow>, RemoteError> {
        let request = self
            .client
            .get(self.table_url(USERS))
            .query(&[("id", format!("eq.{}", user_id)), ("select", "*".to_string())]);
        let rows: Vec<UserRow> = self.send(request)?.json()?;
        Ok(rows.into_iter().next())
    }

    fn upsert_profile(&self, row: &UserRow) -> Result<(), RemoteError> {
        let request = self
            .client
            .post(self.table_url(USERS))
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(row);
        self.send(request)?;
        Ok(())
    }

    fn update_profile(&self, user_id: &str, patch: &UserPatch) -> Result<(), RemoteError> {
        let request = self
            .client
            .patch(self.table_url(USERS))
            .query(&[("id", format!("eq.{}", user_id))])
            .header("Prefer", "return=representation")
            .json(patch);
        let rows: Vec<serde_json::Value> = self.send(request)?.json()?;
        require_affected(&rows, USERS, user_id)
    }

    fn list_applications(&self, user_id: &str) -> Result<Vec<ApplicationRow>, RemoteError> {
        let request = self.client.get(self.table_url(APPLICATIONS)).query(&[
            ("user_id", format!("eq.{}", user_id)),
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ]);
        Ok(self.send(request)?.json()?)
    }

    fn insert_application(&self, row: &ApplicationInsert) -> Result<ApplicationRow, RemoteError> {
        let request = self
            .client
            .post(self.table_url(APPLICATIONS))
            .header("Prefer", "return=representation")
            .json(row);
        let rows: Vec<ApplicationRow> = self.send(request)?.json()?;
        rows.into_iter().next().ok_or_else(|| RemoteError::NotFound {
            table: APPLICATIONS,
            id: "(inserted)".to_string(),
        })
    }

    fn update_application(
        &self,
        id: &str,
        user_id: &str,
        patch: &ApplicationPatch,
    ) -> Result<(), RemoteError> {
        let request = self
            .client
            .patch(self.table_url(APPLICATIONS))
            .query(&[
                ("id", format!("eq.{}", id)),
                ("user_id", format!("eq.{}", user_id)),
            ])
            .header("Prefer", "return=representation")
            .json(patch);
        let rows: Vec<serde_json::Value> = self.send(request)?.json()?;
        require_affected(&rows, APPLICATIONS, id)
    }

    fn delete_application(&self, id: &str, user_id: &str) -> Result<(), RemoteError> {
        let request = self
            .client
            .delete(self.table_url(APPLICATIONS))
            .query(&[
                ("id", format!("eq.{}", id)),
                ("user_id", format!("eq.{}", user_id)),
            ])
            .header("Prefer", "return=representation");
        let rows: Vec<serde_json::Value> = self.send(request)?.json()?;
        require_affected(&rows, APPLICATIONS, id)
    }
}
