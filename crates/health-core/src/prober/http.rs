use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{classify, ProbeError, ProbeOutcome, ProbeSuccess, Prober};
use crate::config::MonitorConfig;
use crate::endpoint::EndpointDescriptor;

/// HTTP prober over one pooled client. One attempt per probe, never retried.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    latency_threshold: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration, latency_threshold: Duration) -> Self {
        Self::with_client(Self::build_client(timeout), latency_threshold)
    }

    pub fn with_client(client: Client, latency_threshold: Duration) -> Self {
        Self {
            client,
            latency_threshold,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.request_timeout, config.latency_threshold)
    }

    /// `timeout` bounds the whole exchange, from connect until the body is read.
    pub fn build_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(8)
            // One attempt per check, whatever protocol features are enabled.
            .retry(reqwest::retry::never())
            .build()
            .expect("Failed to build HTTP client")
    }

    pub fn latency_threshold(&self) -> Duration {
        self.latency_threshold
    }

    /// Sends the request and reports why it failed, if it did.
    pub async fn check(&self, endpoint: &EndpointDescriptor) -> Result<ProbeSuccess, ProbeError> {
        let method = endpoint.http_method();
        let url = endpoint.url.as_str();

        let mut request = self.client.request(method.as_reqwest(), url);
        for (name, value) in &endpoint.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if method.sends_body() {
            if let Some(body) = &endpoint.body {
                request = request.body(body.clone());
            }
        }

        let started = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let status = response.status().as_u16();
        response
            .bytes()
            .await
            .map_err(|e| transport_error(url, e))?;
        let latency = started.elapsed();

        match classify(status, latency, self.latency_threshold) {
            ProbeOutcome::Up => Ok(ProbeSuccess { status, latency }),
            ProbeOutcome::Down if !(200..300).contains(&status) => Err(ProbeError::Status {
                url: url.to_string(),
                status,
                latency,
            }),
            ProbeOutcome::Down => Err(ProbeError::Slow {
                url: url.to_string(),
                status,
                latency,
                threshold: self.latency_threshold,
            }),
        }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout {
            url: url.to_string(),
        }
    } else {
        ProbeError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, endpoint: &EndpointDescriptor) -> ProbeOutcome {
        match self.check(endpoint).await {
            Ok(success) => {
                debug!(
                    endpoint = endpoint.label(),
                    method = %endpoint.http_method(),
                    status = success.status,
                    latency_ms = success.latency.as_millis() as u64,
                    "Probe up"
                );
                ProbeOutcome::Up
            }
            Err(e) => {
                debug!(endpoint = endpoint.label(), error = %e, "Probe down");
                ProbeOutcome::Down
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prober() -> HttpProber {
        HttpProber::new(Duration::from_millis(1000), Duration::from_millis(500))
    }

    #[tokio::test]
    async fn fast_200_is_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(2)
            .mount(&server)
            .await;

        let ep = EndpointDescriptor::new(format!("{}/health", server.uri()));
        let success = prober().check(&ep).await.unwrap();
        assert_eq!(success.status, 200);
        assert!(success.latency < Duration::from_millis(500));
        assert_eq!(prober().probe(&ep).await, ProbeOutcome::Up);
    }

    #[tokio::test]
    async fn status_404_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ep = EndpointDescriptor::new(format!("{}/missing", server.uri()));
        let err = prober().check(&ep).await.unwrap_err();
        assert!(matches!(err, ProbeError::Status { status: 404, .. }), "{err}");
        assert_eq!(prober().probe(&ep).await, ProbeOutcome::Down);
    }

    #[tokio::test]
    async fn slow_200_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(600)))
            .mount(&server)
            .await;

        let ep = EndpointDescriptor::new(format!("{}/slow", server.uri()));
        let err = prober().check(&ep).await.unwrap_err();
        match err {
            ProbeError::Slow {
                status, latency, ..
            } => {
                assert_eq!(status, 200);
                assert!(latency >= Duration::from_millis(600));
            }
            other => panic!("expected slow response, got {other}"),
        }
    }

    #[tokio::test]
    async fn response_past_timeout_is_down() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hang"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
            .expect(1)
            .mount(&server)
            .await;

        let ep = EndpointDescriptor::new(format!("{}/hang", server.uri()));
        let err = prober().check(&ep).await.unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }), "{err}");
        assert_eq!(err.latency(), None);
    }

    #[tokio::test]
    async fn connection_refused_is_down() {
        let ep = EndpointDescriptor::new("http://127.0.0.1:1/");
        let err = prober().check(&ep).await.unwrap_err();
        assert!(
            matches!(err, ProbeError::Network { .. } | ProbeError::Timeout { .. }),
            "{err}"
        );
        assert_eq!(prober().probe(&ep).await, ProbeOutcome::Down);
    }

    #[tokio::test]
    async fn unknown_method_issues_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/foo"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let ep = EndpointDescriptor::new(format!("{}/foo", server.uri())).with_method("FOO");
        assert_eq!(prober().probe(&ep).await, ProbeOutcome::Up);
    }

    #[tokio::test]
    async fn post_sends_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("content-type", "application/json"))
            .and(body_string(r#"{"foo":"bar"}"#))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let ep = EndpointDescriptor::new(format!("{}/submit", server.uri()))
            .with_method("post")
            .with_header("content-type", "application/json")
            .with_body(r#"{"foo":"bar"}"#);
        assert_eq!(prober().probe(&ep).await, ProbeOutcome::Up);
    }

    #[tokio::test]
    async fn failed_request_is_sent_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let ep = EndpointDescriptor::new(format!("{}/flaky", server.uri()));
        assert_eq!(prober().probe(&ep).await, ProbeOutcome::Down);
    }
}
