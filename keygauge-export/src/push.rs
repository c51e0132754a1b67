//! Push-gateway client.

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};
use reqwest::header::CONTENT_TYPE;
use tracing::{info, instrument};
use url::Url;

use crate::error::ExportError;
use crate::gauges::PrometheusExporter;

/// Pushes an exporter's registry under one job.
#[derive(Debug, Clone)]
pub struct PushGateway {
    client: reqwest::Client,
    target: Url,
}

impl PushGateway {
    /// Creates a client for `<url>/metrics/job/<job>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the job is empty or contains
    /// `/`, or the client cannot be built.
    pub fn new(url: &str, job: &str, timeout: Duration) -> Result<Self, ExportError> {
        if job.is_empty() || job.contains('/') {
            return Err(ExportError::InvalidUrl(format!(
                "job `{job}` must be non-empty and contain no `/`"
            )));
        }
        let mut target =
            Url::parse(url).map_err(|e| ExportError::InvalidUrl(format!("{url}: {e}")))?;
        target
            .path_segments_mut()
            .map_err(|()| ExportError::InvalidUrl(format!("{url} cannot be a base")))?
            .pop_if_empty()
            .extend(["metrics", "job", job]);

        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, target })
    }

    /// Returns the full push URL.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Replaces the job's metrics on the gateway with the registry's.
    ///
    /// # Errors
    ///
    /// Returns an error on encoding, transport, or non-success status.
    #[instrument(skip_all, fields(target = %self.target))]
    pub async fn push(&self, exporter: &PrometheusExporter) -> Result<(), ExportError> {
        let encoder = TextEncoder::new();
        let mut body = Vec::new();
        encoder.encode(&exporter.registry().gather(), &mut body)?;

        let response = self
            .client
            .put(self.target.clone())
            .header(CONTENT_TYPE, encoder.format_type())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExportError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        info!("Metrics pushed to gateway");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_url() {
        let gateway =
            PushGateway::new("http://pushgateway:9091/", "cron-apikey-usage", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            gateway.target().as_str(),
            "http://pushgateway:9091/metrics/job/cron-apikey-usage"
        );
    }

    #[test]
    fn test_job_under_path_prefix() {
        let gateway =
            PushGateway::new("http://localhost:9091/prefix", "a b", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            gateway.target().as_str(),
            "http://localhost:9091/prefix/metrics/job/a%20b"
        );
    }

    #[test]
    fn test_job_with_slash_rejected() {
        for job in ["a/b", "/", ""] {
            assert!(matches!(
                PushGateway::new("http://localhost:9091", job, Duration::from_secs(5)),
                Err(ExportError::InvalidUrl(_))
            ));
        }
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            PushGateway::new("not a url", "job", Duration::from_secs(5)),
            Err(ExportError::InvalidUrl(_))
        ));
    }
}
