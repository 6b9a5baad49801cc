use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, StatusCode};
use hyper_tls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HyperClient;
use hyper_util::rt::TokioExecutor;
use tokio::time;

use crate::config::RequestConfig;

pub type RequestBody = Full<Bytes>;

type Client = HyperClient<HttpsConnector<HttpConnector>, RequestBody>;

/// The capability request tasks use to talk to the target.
///
/// Implementations must consume and drop the response body before
/// returning so the connection can be reused.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: Request<RequestBody>) -> Result<StatusCode>;
}

/// Builds one request from the shared configuration.
pub fn build_request(config: &RequestConfig) -> Result<Request<RequestBody>, hyper::http::Error> {
    let mut builder = Request::builder()
        .method(config.method.as_str())
        .uri(config.url.as_str());
    for (key, value) in &config.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }
    builder.body(Full::new(Bytes::from(config.body.clone())))
}

pub struct HyperHttpClient {
    client: Client,
    timeout: Option<Duration>,
}

impl HyperHttpClient {
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        let https = HttpsConnector::new_with_connector(http);
        let client = HyperClient::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(30))
            .build(https);

        HyperHttpClient { client, timeout }
    }

    async fn send(&self, request: Request<RequestBody>) -> Result<StatusCode> {
        let resp = self.client.request(request).await?;
        let status = resp.status();
        resp.into_body().collect().await?;
        Ok(status)
    }
}

#[async_trait]
impl HttpClient for HyperHttpClient {
    async fn execute(&self, request: Request<RequestBody>) -> Result<StatusCode> {
        match self.timeout {
            Some(limit) => time::timeout(limit, self.send(request))
                .await
                .map_err(|_| anyhow!("request timed out after {:?}", limit))?,
            None => self.send(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(url: String) -> RequestConfig {
        RequestConfig::new(url)
    }

    #[test]
    fn test_build_request_carries_method_headers_and_body() {
        let mut config = config_for("http://localhost:8080/items".to_string());
        config.method = "PUT".to_string();
        config.headers.insert("X-Trace".to_string(), "abc".to_string());
        config.body = "{\"a\":1}".to_string();

        let req = build_request(&config).unwrap();
        assert_eq!(req.method(), "PUT");
        assert_eq!(req.uri().path(), "/items");
        assert_eq!(req.headers()["x-trace"], "abc");
    }

    #[test]
    fn test_build_request_rejects_invalid_method() {
        let mut config = config_for("http://localhost:8080/".to_string());
        config.method = "NOT A METHOD".to_string();
        assert!(build_request(&config).is_err());
    }

    #[test]
    fn test_build_request_rejects_invalid_header_name() {
        let mut config = config_for("http://localhost:8080/".to_string());
        config.headers.insert("Bad Header".to_string(), "x".to_string());
        assert!(build_request(&config).is_err());
    }

    #[tokio::test]
    async fn test_execute_returns_status_and_sends_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("authorization", "Bearer x"))
            .and(body_string("payload"))
            .respond_with(ResponseTemplate::new(201).set_body_string("created"))
            .mount(&server)
            .await;

        let mut config = config_for(format!("{}/submit", server.uri()));
        config.method = "POST".to_string();
        config.headers.insert("Authorization".to_string(), "Bearer x".to_string());
        config.body = "payload".to_string();

        let client = HyperHttpClient::new(None);
        let status = client.execute(build_request(&config).unwrap()).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_execute_reports_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HyperHttpClient::new(None);
        let request = build_request(&config_for(server.uri())).unwrap();
        assert_eq!(client.execute(request).await.unwrap(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_execute_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = HyperHttpClient::new(Some(Duration::from_millis(50)));
        let request = build_request(&config_for(server.uri())).unwrap();
        let err = client.execute(request).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_execute_fails_on_refused_connection() {
        let client = HyperHttpClient::new(None);
        let request = build_request(&config_for("http://127.0.0.1:1/".to_string())).unwrap();
        assert!(client.execute(request).await.is_err());
    }
}
