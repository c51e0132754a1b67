//! OpenAI response parser.

use keygauge_fetch::FetchError;
use serde::Deserialize;
use tracing::debug;

/// One page of an organization list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage<T> {
    /// Items of this page.
    pub data: Vec<T>,
    /// True if another page follows.
    #[serde(default)]
    pub has_more: bool,
    /// Id of the last item, passed as `after` to fetch the next page.
    #[serde(default)]
    pub last_id: Option<String>,
}

impl<T> ListPage<T> {
    /// Returns the cursor of the next page, if there is one.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_more {
            self.last_id.as_deref()
        } else {
            None
        }
    }
}

/// Body of `GET /organization/projects`.
pub type ProjectsResponse = ListPage<Project>;

/// An organization project.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// Project id, e.g. `proj_abc`.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of `GET /organization/projects/{id}/api_keys`.
pub type ProjectApiKeysResponse = ListPage<ProjectApiKey>;

/// A project API key as listed by the admin API.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectApiKey {
    /// Key id, the value usage queries filter on.
    pub id: String,
    /// Key with all but its last characters masked.
    pub redacted_value: String,
}

/// Body of `GET /organization/usage/completions`.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageResponse {
    /// Time buckets of the window.
    pub data: Vec<UsageBucket>,
}

/// One time bucket of completions usage.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageBucket {
    /// Bucket start, in unix seconds.
    pub start_time: i64,
    /// Bucket end, in unix seconds.
    pub end_time: i64,
    /// Grouped results; empty when nothing was used.
    pub results: Vec<UsageResult>,
}

/// Usage of one key within a bucket.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct UsageResult {
    /// Prompt tokens consumed.
    pub input_tokens: u64,
    /// Number of model requests.
    pub num_model_requests: u64,
}

impl UsageResponse {
    /// Returns `(input tokens, model requests)` summed over every bucket.
    pub fn totals(&self) -> (u64, u64) {
        self.data
            .iter()
            .flat_map(|bucket| &bucket.results)
            .fold((0, 0), |(tokens, requests), result| {
                (
                    tokens + result.input_tokens,
                    requests + result.num_model_requests,
                )
            })
    }
}

/// Body of `GET /organization/costs`.
#[derive(Debug, Clone, Deserialize)]
pub struct CostResponse {
    /// Time buckets of the window.
    pub data: Vec<CostBucket>,
}

/// One time bucket of organization cost.
#[derive(Debug, Clone, Deserialize)]
pub struct CostBucket {
    /// Cost line items of the bucket.
    pub results: Vec<CostResult>,
}

/// One cost line item.
#[derive(Debug, Clone, Deserialize)]
pub struct CostResult {
    /// Amount charged.
    pub amount: CostAmount,
}

/// A monetary amount.
#[derive(Debug, Clone, Deserialize)]
pub struct CostAmount {
    /// Value in `currency`.
    pub value: f64,
    /// Lowercase ISO currency code.
    pub currency: String,
}

impl CostResponse {
    /// Returns the summed cost over every bucket.
    pub fn total(&self) -> f64 {
        self.data
            .iter()
            .flat_map(|bucket| &bucket.results)
            .map(|result| result.amount.value)
            .sum()
    }
}

/// Parses a raw usage body.
///
/// # Errors
///
/// Returns an error if the body is malformed.
pub fn parse_usage_response(json_str: &str) -> Result<UsageResponse, FetchError> {
    debug!(len = json_str.len(), "Parsing OpenAI usage response");
    Ok(serde_json::from_str(json_str)?)
}

/// Parses a raw costs body.
///
/// # Errors
///
/// Returns an error if the body is malformed.
pub fn parse_cost_response(json_str: &str) -> Result<CostResponse, FetchError> {
    debug!(len = json_str.len(), "Parsing OpenAI cost response");
    Ok(serde_json::from_str(json_str)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_totals() {
        let json = r#"{
            "object": "page",
            "data": [
                {"object": "bucket", "start_time": 1720000000, "end_time": 1720086400,
                 "results": [
                    {"object": "organization.usage.completions.result",
                     "input_tokens": 1500, "output_tokens": 300, "num_model_requests": 12,
                     "api_key_id": "key_abc"}
                 ]},
                {"object": "bucket", "start_time": 1720086400, "end_time": 1720172800,
                 "results": [{"input_tokens": 500, "num_model_requests": 3}]},
                {"object": "bucket", "start_time": 1720172800, "end_time": 1720259200,
                 "results": []}
            ],
            "has_more": false
        }"#;

        let usage = parse_usage_response(json).unwrap();
        assert_eq!(usage.totals(), (2000, 15));
    }

    #[test]
    fn test_result_without_tokens_is_rejected() {
        let json = r#"{"data": [{"start_time": 0, "end_time": 1, "results": [{}]}]}"#;
        assert!(parse_usage_response(json).is_err());
    }

    #[test]
    fn test_next_cursor_only_when_more() {
        let page: ProjectsResponse = serde_json::from_str(
            r#"{"object": "list", "data": [{"id": "proj_1"}], "first_id": "proj_1",
                "last_id": "proj_1", "has_more": true}"#,
        )
        .unwrap();
        assert_eq!(page.next_cursor(), Some("proj_1"));

        let last: ProjectsResponse = serde_json::from_str(
            r#"{"data": [{"id": "proj_2"}], "last_id": "proj_2", "has_more": false}"#,
        )
        .unwrap();
        assert_eq!(last.next_cursor(), None);
    }

    #[test]
    fn test_cost_total() {
        let json = r#"{
            "object": "page",
            "data": [
                {"object": "bucket", "start_time": 0, "end_time": 1, "results": [
                    {"object": "organization.costs.result",
                     "amount": {"value": 12.5, "currency": "usd"}, "line_item": null},
                    {"amount": {"value": 7.25, "currency": "usd"}}
                ]},
                {"start_time": 1, "end_time": 2, "results": [
                    {"amount": {"value": 0.25, "currency": "usd"}}
                ]}
            ],
            "has_more": false
        }"#;

        let costs = parse_cost_response(json).unwrap();
        assert!((costs.total() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cost_without_amount_is_rejected() {
        let json = r#"{"data": [{"results": [{"line_item": "gpt-4o"}]}]}"#;
        assert!(parse_cost_response(json).is_err());
    }
}
