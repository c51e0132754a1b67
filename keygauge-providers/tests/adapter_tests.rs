//! Adapter tests against a local HTTP responder.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use keygauge_core::{Credential, ProviderKind};
use keygauge_fetch::{
    Credentials, ErrorClass, FetchContext, FetchError, FetchSettings, ProviderSettings,
    RetryPolicy, UsageAdapter,
};
use keygauge_providers::ProviderRegistry;
use keygauge_providers::birdeye::BirdeyeAdapter;
use keygauge_providers::coingecko::CoinGeckoAdapter;
use keygauge_providers::quicknode::QuickNodeAdapter;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ============================================================================
// Responder
// ============================================================================

/// `(substring of the request target, status, body)`; first match wins.
type Route = (&'static str, u16, String);

struct Responder {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl Responder {
    async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move { respond(stream, &routes, &seen).await });
            }
        });

        Self { base_url, requests }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn respond(mut stream: TcpStream, routes: &[Route], seen: &Mutex<Vec<String>>) {
    let request = read_request(&mut stream).await;
    let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();
    seen.lock().unwrap().push(request);

    let (status, body) = routes
        .iter()
        .find(|(pattern, _, _)| target.contains(pattern))
        .map_or((404, "{}".to_string()), |(_, status, body)| (*status, body.clone()));
    let response = format!(
        "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < end + 4 + body_len {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn ctx() -> Arc<FetchContext> {
    let settings = FetchSettings::default().with_timeout(Duration::from_secs(5));
    Arc::new(FetchContext::new(settings).unwrap())
}

fn settings(kind: ProviderKind, credentials: Credentials, base_url: String) -> ProviderSettings {
    ProviderSettings::new(kind, credentials)
        .with_base_url(base_url)
        .with_retry(RetryPolicy::no_retry())
}

// ============================================================================
// Single-endpoint providers
// ============================================================================

#[tokio::test]
async fn test_coingecko_sends_key_header() {
    let server = Responder::start(vec![(
        "/api/v3/key",
        200,
        r#"{"plan": "Analyst", "rate_limit_request_per_minute": 500,
            "monthly_call_credit": 500000, "current_total_monthly_calls": 10,
            "current_remaining_monthly_calls": 499000}"#
            .to_string(),
    )])
    .await;
    let credential = Credential::new("CG-abcdef0123456789");
    let adapter = CoinGeckoAdapter::new(&settings(
        ProviderKind::CoinGecko,
        Credentials::One(credential.clone()),
        server.url("/api/v3"),
    ));

    let metric = adapter.fetch(&ctx(), &credential).await.unwrap();

    assert_eq!((metric.usage, metric.limit), (1000, 500_000));
    let requests = server.requests();
    assert!(requests[0].starts_with("GET /api/v3/key "));
    assert!(requests[0].contains("x-cg-pro-api-key: CG-abcdef0123456789"));
}

#[tokio::test]
async fn test_quicknode_unauthorized_is_permanent() {
    let server = Responder::start(vec![(
        "/v0/usage/rpc",
        401,
        r#"{"error": "unauthorized"}"#.to_string(),
    )])
    .await;
    let credential = Credential::new("qn-revoked-key-000000");
    let adapter = QuickNodeAdapter::new(&settings(
        ProviderKind::QuickNode,
        Credentials::One(credential.clone()),
        server.base_url.clone(),
    ));

    let err = adapter.fetch(&ctx(), &credential).await.unwrap_err();

    assert!(matches!(err, FetchError::AuthenticationFailed(_)));
    assert_eq!(err.class(), ErrorClass::Permanent);
}

#[tokio::test]
async fn test_quicknode_server_error_retried_then_reported() {
    let server = Responder::start(vec![("/v0/usage/rpc", 503, "{}".to_string())]).await;
    let provider = ProviderSettings::new(
        ProviderKind::QuickNode,
        Credentials::Many(vec![
            Credential::new("qn-key-number-one-0001"),
            Credential::new("qn-key-number-two-0002"),
        ]),
    )
    .with_base_url(server.base_url.clone())
    .with_retry(RetryPolicy::new(2).with_base_delay(0));

    let (collector, rejected) = ProviderRegistry::build_collector(&[provider]);
    let report = collector.collect(&ctx()).await;

    assert!(rejected.is_empty());
    assert_eq!(report.metrics.len(), 2);
    assert_eq!(report.failure_count(), 2);
    assert_eq!(server.requests().len(), 4);
}

// ============================================================================
// Birdeye login flow
// ============================================================================

#[tokio::test]
async fn test_birdeye_login_account_usage() {
    let server = Responder::start(vec![
        ("/user/login", 200, r#"{"token": "session-token-1"}"#.to_string()),
        (
            "/accounts/default",
            200,
            r#"{"success": true, "data": {"subscription": {"_id": "sub_42",
                "status": "active", "currentPeriodStartAt": "2024-07-01",
                "currentPeriodEndAt": "2024-08-01",
                "plan": {"name": "Starter", "monthlyUnits": 5000000}}}}"#
                .to_string(),
        ),
        (
            "/payments/subscriptions/sub_42/usage",
            200,
            r#"{"success": true, "data": {"usage": 1250000, "api_usage": 1250000,
                "ws_usage": 0, "csv_usage": 0, "has_overage": false}}"#
                .to_string(),
        ),
    ])
    .await;
    let credential = Credential::new("ops@example.com:hunter2");
    let adapter = BirdeyeAdapter::new(&settings(
        ProviderKind::Birdeye,
        Credentials::One(credential.clone()),
        server.base_url.clone(),
    ));

    let metric = adapter.fetch(&ctx(), &credential).await.unwrap();

    assert_eq!((metric.usage, metric.limit), (1_250_000, 5_000_000));
    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].starts_with("POST /user/login "));
    assert!(requests[0].contains(r#""email":"ops@example.com""#));
    assert!(requests[1].contains("token=session-token-1"));
    assert!(requests[2].starts_with("GET /payments/subscriptions/sub_42/usage?token="));
}

#[tokio::test]
async fn test_birdeye_login_without_token_fails() {
    let server = Responder::start(vec![(
        "/user/login",
        200,
        r#"{"message": "check your email"}"#.to_string(),
    )])
    .await;
    let credential = Credential::new("ops@example.com:hunter2");
    let adapter = BirdeyeAdapter::new(&settings(
        ProviderKind::Birdeye,
        Credentials::One(credential.clone()),
        server.base_url.clone(),
    ));

    let err = adapter.fetch(&ctx(), &credential).await.unwrap_err();

    assert!(matches!(err, FetchError::Login(_)));
    assert_eq!(server.requests().len(), 1);
}

// ============================================================================
// OpenAI cost allocation
// ============================================================================

fn openai_routes(tokens_a: u64, tokens_b: u64) -> Vec<Route> {
    let usage = |tokens: u64| {
        format!(
            r#"{{"object": "page", "has_more": false, "data": [{{"object": "bucket",
                "start_time": 0, "end_time": 86400,
                "results": [{{"input_tokens": {tokens}, "num_model_requests": 4}}]}}]}}"#
        )
    };
    vec![
        (
            "/organization/projects/proj_1/api_keys",
            200,
            r#"{"object": "list", "has_more": false, "data": [
                {"id": "key_a", "name": "a", "redacted_value": "sk-proj-****AAAA"},
                {"id": "key_b", "name": "b", "redacted_value": "sk-proj-****BBBB"}]}"#
                .to_string(),
        ),
        (
            "/organization/projects",
            200,
            r#"{"object": "list", "has_more": false, "data": [{"id": "proj_1"}]}"#.to_string(),
        ),
        ("api_key_ids=key_a", 200, usage(tokens_a)),
        ("api_key_ids=key_b", 200, usage(tokens_b)),
        (
            "/organization/costs",
            200,
            r#"{"object": "page", "has_more": false, "data": [{"start_time": 0,
                "end_time": 86400, "results": [
                    {"amount": {"value": 40.0, "currency": "usd"}}]}]}"#
                .to_string(),
        ),
    ]
}

fn openai_settings(base_url: String) -> ProviderSettings {
    let mut provider = settings(
        ProviderKind::OpenAi,
        Credentials::Many(vec![
            Credential::new("sk-proj-0123456789AAAA"),
            Credential::new("sk-proj-0123456789BBBB"),
            Credential::new("sk-proj-0123456789CCCC"),
        ]),
        base_url,
    )
    .with_admin_credential(Credential::new("sk-admin-0123456789"));
    provider.request_pause = Some(Duration::ZERO);
    provider
}

#[tokio::test]
async fn test_openai_cost_allocated_by_tokens() {
    let server = Responder::start(openai_routes(100, 300)).await;

    let (collector, rejected) =
        ProviderRegistry::build_collector(&[openai_settings(server.url("/v1"))]);
    let report = collector.collect(&ctx()).await;

    assert!(rejected.is_empty());
    assert!(report.failed_providers.is_empty());
    assert_eq!(report.metrics.len(), 3);

    let usage_of = |suffix: &str| {
        report
            .metrics
            .iter()
            .find(|m| m.key_label().ends_with(suffix))
            .unwrap()
    };
    assert_eq!(usage_of("AAAA").usage, 10);
    assert_eq!(usage_of("BBBB").usage, 30);
    assert!(usage_of("AAAA").is_derived());
    assert!(!usage_of("CCCC").is_success());

    let requests = server.requests();
    assert!(requests.iter().all(|r| r.contains("authorization: Bearer sk-admin-0123456789")));
}

#[tokio::test]
async fn test_openai_zero_usage_fails_provider() {
    let server = Responder::start(openai_routes(0, 0)).await;

    let (collector, _) = ProviderRegistry::build_collector(&[openai_settings(server.url("/v1"))]);
    let report = collector.collect(&ctx()).await;

    assert!(report.metrics.is_empty());
    assert_eq!(report.failed_providers.len(), 1);
    assert_eq!(report.failed_providers[0].provider, ProviderKind::OpenAi);
    assert_eq!(report.failed_providers[0].class, Some(ErrorClass::Derivation));
    assert!(
        server
            .requests()
            .iter()
            .all(|r| !r.contains("/organization/costs"))
    );
}

#[tokio::test]
async fn test_openai_follows_project_pages() {
    let mut routes: Vec<Route> = vec![
        (
            "/organization/projects/proj_2/api_keys",
            200,
            r#"{"object": "list", "has_more": false, "data": [
                {"id": "key_c", "name": "c", "redacted_value": "sk-proj-****CCCC"}]}"#
                .to_string(),
        ),
        (
            "after=proj_1",
            200,
            r#"{"object": "list", "has_more": false, "first_id": "proj_2",
                "last_id": "proj_2", "data": [{"id": "proj_2"}]}"#
                .to_string(),
        ),
        (
            "/organization/projects?",
            200,
            r#"{"object": "list", "has_more": true, "first_id": "proj_1",
                "last_id": "proj_1", "data": [{"id": "proj_1"}]}"#
                .to_string(),
        ),
        (
            "api_key_ids=key_c",
            200,
            r#"{"object": "page", "has_more": false, "data": [{"start_time": 0,
                "end_time": 86400,
                "results": [{"input_tokens": 100, "num_model_requests": 2}]}]}"#
                .to_string(),
        ),
    ];
    routes.extend(openai_routes(100, 300));
    let server = Responder::start(routes).await;

    let (collector, _) = ProviderRegistry::build_collector(&[openai_settings(server.url("/v1"))]);
    let report = collector.collect(&ctx()).await;

    assert!(report.failed_providers.is_empty());
    assert_eq!(report.metrics.len(), 3);
    assert!(report.metrics.iter().all(|m| m.is_success()));
    let usage_of = |suffix: &str| {
        report
            .metrics
            .iter()
            .find(|m| m.key_label().ends_with(suffix))
            .unwrap()
            .usage
    };
    assert_eq!((usage_of("AAAA"), usage_of("BBBB"), usage_of("CCCC")), (8, 24, 8));
    assert!(server.requests().iter().any(|r| r.contains("after=proj_1")));
}
