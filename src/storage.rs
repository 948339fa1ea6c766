//! The storage module writes original and improved HTML to a hosted table
//! through its PostgREST interface.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::BoxFuture;
use crate::constants::{RECORDS_TABLE, SUPABASE_KEY_ENV_NAME, SUPABASE_URL_ENV_NAME};
use crate::error::ImproveError;

/// A row of the records table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub original_html: String,
    pub improved_html: String,
}

/// Destination for stored records.
pub trait RecordStore: Send + Sync {
    /// Inserts one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be written.
    fn insert<'a>(&'a self, record: &'a StoredRecord) -> BoxFuture<'a, Result<(), ImproveError>>;
}

/// Client for the hosted records table.
///
/// Inserts are sent once. There is no retry, idempotency key or conflict handling.
#[derive(Clone, Debug)]
pub struct SupabaseStore {
    client: reqwest::Client,
    endpoint: Url,
    key: String,
}

impl SupabaseStore {
    /// Creates a client for the project at `base_url` authenticated with `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str, key: impl Into<String>) -> Result<Self> {
        let mut base = Url::parse(base_url).context(format!("Invalid project URL: {base_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(&format!("rest/v1/{RECORDS_TABLE}"))
            .context("Unable to build table endpoint")?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            key: key.into(),
        })
    }

    /// Creates a client from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is unset or the URL is invalid.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates a client, resolving variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is missing or the URL is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(SUPABASE_URL_ENV_NAME)
            .context(format!("{SUPABASE_URL_ENV_NAME} is not set"))?;
        let key = lookup(SUPABASE_KEY_ENV_NAME)
            .context(format!("{SUPABASE_KEY_ENV_NAME} is not set"))?;

        Self::new(&url, key)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Posts `record` to the table.
    ///
    /// # Errors
    ///
    /// Returns [`ImproveError::Persistence`] on transport failure or a non-2xx answer.
    pub async fn save(&self, record: &StoredRecord) -> Result<(), ImproveError> {
        debug!("Inserting record into {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImproveError::Persistence {
                reason: format!("{status}: {body}"),
            });
        }

        Ok(())
    }
}

impl RecordStore for SupabaseStore {
    fn insert<'a>(&'a self, record: &'a StoredRecord) -> BoxFuture<'a, Result<(), ImproveError>> {
        Box::pin(self.save(record))
    }
}
