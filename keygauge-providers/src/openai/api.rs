//! OpenAI organization API client.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use keygauge_core::Credential;
use keygauge_fetch::{FetchContext, FetchError, Pacer, bearer, endpoint};
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::parser::{CostResponse, ListPage, Project, ProjectApiKey, UsageResponse};

/// API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Pause between key listings and between usage calls.
pub const DEFAULT_REQUEST_PAUSE: Duration = Duration::from_secs(1);

const KEY_SUFFIX_LEN: usize = 4;

const LIST_PAGE_SIZE: usize = 100;

// ============================================================================
// Usage Window
// ============================================================================

/// The reporting window shared by the usage and cost queries of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageWindow {
    /// Start, in unix seconds.
    pub start: i64,
    /// End, in unix seconds.
    pub end: i64,
}

impl UsageWindow {
    /// The day ending at `now`.
    pub fn last_day(now: DateTime<Utc>) -> Self {
        Self {
            start: (now - TimeDelta::days(1)).timestamp(),
            end: now.timestamp(),
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("start_time", self.start.to_string()),
            ("end_time", self.end.to_string()),
            ("bucket_width", "1d".to_string()),
            ("limit", "7".to_string()),
        ]
    }
}

// ============================================================================
// Key Index
// ============================================================================

/// Maps the last four characters of a project key to its key id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyIndex {
    by_suffix: HashMap<String, String>,
}

impl KeyIndex {
    /// Builds the index from listed project keys.
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a ProjectApiKey>) -> Self {
        let by_suffix = keys
            .into_iter()
            .map(|key| (suffix(&key.redacted_value).to_string(), key.id.clone()))
            .collect();
        Self { by_suffix }
    }

    /// Returns the key id of `credential`, if it belongs to a listed project.
    pub fn resolve(&self, credential: &Credential) -> Option<&str> {
        self.by_suffix
            .get(credential.suffix(KEY_SUFFIX_LEN))
            .map(String::as_str)
    }

    /// Returns the number of indexed keys.
    pub fn len(&self) -> usize {
        self.by_suffix.len()
    }

    /// Returns true if no key is indexed.
    pub fn is_empty(&self) -> bool {
        self.by_suffix.is_empty()
    }

    /// Counts indexed keys that none of `credentials` refers to.
    pub fn unmonitored(&self, credentials: &[Credential]) -> usize {
        self.by_suffix
            .keys()
            .filter(|s| !credentials.iter().any(|c| c.suffix(KEY_SUFFIX_LEN) == s.as_str()))
            .count()
    }
}

fn suffix(value: &str) -> &str {
    let start = value
        .char_indices()
        .rev()
        .nth(KEY_SUFFIX_LEN - 1)
        .map_or(0, |(i, _)| i);
    &value[start..]
}

// ============================================================================
// API Client
// ============================================================================

/// Admin-key client for the organization endpoints.
#[derive(Debug)]
pub struct OpenAiApi {
    base_url: String,
    admin: Credential,
    pacer: Pacer,
}

impl OpenAiApi {
    /// Creates a client paced by `pause`.
    pub fn new(base_url: impl Into<String>, admin: Credential, pause: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            admin,
            pacer: Pacer::new(pause),
        }
    }

    /// Lists the organization's projects.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    pub async fn list_projects(&self, ctx: &FetchContext) -> Result<Vec<Project>, FetchError> {
        let url = endpoint(&self.base_url, "organization/projects")?;
        self.list_all(ctx, url.as_str()).await
    }

    /// Lists one project's API keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    pub async fn list_project_keys(
        &self,
        ctx: &FetchContext,
        project_id: &str,
    ) -> Result<Vec<ProjectApiKey>, FetchError> {
        let mut url = endpoint(&self.base_url, "organization/projects")?;
        url.path_segments_mut()
            .map_err(|()| FetchError::Config(format!("{} cannot be a base", self.base_url)))?
            .push(project_id)
            .push("api_keys");

        self.pacer.wait().await;
        self.list_all(ctx, url.as_str()).await
    }

    /// Collects every page of a list endpoint, following `after` cursors.
    async fn list_all<T: DeserializeOwned>(
        &self,
        ctx: &FetchContext,
        url: &str,
    ) -> Result<Vec<T>, FetchError> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut query = vec![("limit", LIST_PAGE_SIZE.to_string())];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }
            let page: ListPage<T> = ctx
                .http
                .get_json_with_query(url, bearer(self.admin.expose())?, &query)
                .await?;

            let next = page.next_cursor().map(str::to_string);
            items.extend(page.data);
            match next {
                Some(cursor) if after.as_deref() != Some(cursor.as_str()) => {
                    debug!(url, after = %cursor, "Fetching next page");
                    after = Some(cursor);
                    self.pacer.wait().await;
                }
                Some(cursor) => {
                    warn!(url, after = %cursor, "Cursor did not advance, stopping");
                    return Ok(items);
                }
                None => return Ok(items),
            }
        }
    }

    /// Indexes every project key of the organization.
    ///
    /// # Errors
    ///
    /// Returns an error if any listing fails; a partial index would turn
    /// valid keys into spurious failures.
    #[instrument(skip_all)]
    pub async fn key_index(&self, ctx: &FetchContext) -> Result<KeyIndex, FetchError> {
        let projects = self.list_projects(ctx).await?;
        let mut keys = Vec::new();
        for project in &projects {
            let listed = self.list_project_keys(ctx, &project.id).await?;
            debug!(project = %project.id, keys = listed.len(), "Project keys listed");
            keys.extend(listed);
        }

        let index = KeyIndex::from_keys(&keys);
        info!(projects = projects.len(), keys = index.len(), "Key index built");
        Ok(index)
    }

    /// Fetches completions usage of one key over `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    pub async fn completions_usage(
        &self,
        ctx: &FetchContext,
        key_id: &str,
        window: UsageWindow,
    ) -> Result<UsageResponse, FetchError> {
        let url = endpoint(&self.base_url, "organization/usage/completions")?;
        let mut params = window.params();
        params.push(("api_key_ids", key_id.to_string()));
        params.push(("group_by", "api_key_id".to_string()));

        self.pacer.wait().await;
        ctx.http
            .get_json_with_query(url.as_str(), bearer(self.admin.expose())?, &params)
            .await
    }

    /// Fetches the organization's total cost over `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is malformed.
    pub async fn total_cost(&self, ctx: &FetchContext, window: UsageWindow) -> Result<f64, FetchError> {
        let url = endpoint(&self.base_url, "organization/costs")?;
        let response: CostResponse = ctx
            .http
            .get_json_with_query(url.as_str(), bearer(self.admin.expose())?, &window.params())
            .await?;
        let total = response.total();
        debug!(total_cost_usd = total, "Organization cost summed");
        Ok(total)
    }
}

// ============================================================================
// Tests
// ============================================================================
