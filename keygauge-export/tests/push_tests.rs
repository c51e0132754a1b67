//! Push-gateway round trip against a local listener.

use std::time::Duration;

use keygauge_core::{Metric, ProviderKind};
use keygauge_export::{ExportError, MetricsSink, PrometheusExporter, PushGateway};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Accepts one request, answers with `status`, returns the raw request.
async fn one_shot(status: u16) -> (String, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let lower = line.to_ascii_lowercase();
                        lower
                            .strip_prefix("content-length:")
                            .map(|v| v.trim().parse::<usize>().unwrap())
                    })
                    .unwrap_or(0);
                if raw.len() >= end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        let reply = format!("HTTP/1.1 {status} X\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        socket.write_all(reply.as_bytes()).await.unwrap();
        String::from_utf8_lossy(&raw).to_string()
    });

    (url, handle)
}

#[tokio::test]
async fn test_push_puts_exposition() {
    let (url, server) = one_shot(200).await;
    let exporter = PrometheusExporter::new().unwrap();
    exporter.record_cycle(&[Metric::new(ProviderKind::CoinGecko, 100, 500)]);

    let gateway = PushGateway::new(&url, "cron-apikey-usage", Duration::from_secs(5)).unwrap();
    gateway.push(&exporter).await.unwrap();

    let request = server.await.unwrap();
    assert!(request.starts_with("PUT /metrics/job/cron-apikey-usage HTTP/1.1"));
    assert!(request.contains("apikey_requests_used_total{exported_service=\"coingecko\""));
}

#[tokio::test]
async fn test_push_rejected_status() {
    let (url, server) = one_shot(500).await;
    let exporter = PrometheusExporter::new().unwrap();

    let gateway = PushGateway::new(&url, "job", Duration::from_secs(5)).unwrap();
    let err = gateway.push(&exporter).await.unwrap_err();

    assert!(matches!(err, ExportError::Status { status: 500, .. }));
    server.await.unwrap();
}
