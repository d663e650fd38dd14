//! `reqwest`-backed implementation of [`BritMetricsApi`].

use async_trait::async_trait;
use britmetrics_api_models::{
    Account, AnalyticsSummary, ApiErrorBody, ApiHealth, CampaignCatalog, CheckoutRequest,
    CheckoutSession, CityCatalog, CreateAccountRequest, PaymentVerification, PredictRequest,
    Prediction, TokenCheck, TokenCheckRequest,
};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::{ApiConfig, ApiError, BritMetricsApi};

/// Path of the session-token validation endpoint.
pub const VERIFY_TOKEN_PATH: &str = "/api/auth/verify-token";

/// HTTP client for the `BritMetrics` backend.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpApiClient {
    /// Creates a client for the given backend.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL is empty (a native
    /// client has no origin to resolve relative paths against), or
    /// [`ApiError::Http`] if the TLS backend fails to initialize.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        if config.base_url.is_empty() {
            return Err(ApiError::Config {
                message: format!(
                    "no backend base URL configured; set {}",
                    crate::config::API_URL_ENV
                ),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// Creates a client from [`ApiConfig::from_env`].
    ///
    /// # Errors
    ///
    /// See [`HttpApiClient::new`].
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(ApiConfig::from_env())
    }

    /// The backend base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Sends a request and decodes the JSON body.
    ///
    /// Returns `Ok(None)` for `204 No Content`.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<Option<T>, ApiError> {
        log::debug!("-> {path}");
        let resp = request.send().await?;
        let status = resp.status();
        log::debug!("<- {path} {status}");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = status_error(status, &body);
            log::debug!("{path} failed: {err}");
            return Err(err);
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = resp.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Like [`Self::send`] but a missing body is an error.
    async fn send_required<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<T, ApiError> {
        self.send(request, path)
            .await?
            .ok_or_else(|| ApiError::EmptyResponse {
                path: path.to_string(),
            })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.config.url(path))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.config.url(path))
    }
}

/// Builds the error for a non-success response.
///
/// Uses the `detail` or `message` field of a JSON body when present,
/// otherwise the status text, otherwise `"Request failed"`.
#[must_use]
pub fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.text().map(str::to_string))
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Request failed".to_string());

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl BritMetricsApi for HttpApiClient {
    async fn fetch_campaigns(&self) -> Result<CampaignCatalog, ApiError> {
        let path = "/api/campaigns";
        self.send_required(self.get(path), path).await
    }

    async fn fetch_cities(&self) -> Result<CityCatalog, ApiError> {
        let path = "/api/cities";
        self.send_required(self.get(path), path).await
    }

    async fn predict(&self, request: &PredictRequest) -> Result<Prediction, ApiError> {
        let path = "/api/predict";
        self.send_required(self.post(path).json(request), path).await
    }

    async fn fetch_analytics(&self) -> Result<AnalyticsSummary, ApiError> {
        let path = "/api/analytics";
        self.send_required(self.get(path), path).await
    }

    async fn clear_analytics(&self) -> Result<(), ApiError> {
        let path = "/api/analytics";
        let request = self.client.delete(self.config.url(path));
        self.send::<serde_json::Value>(request, path).await?;
        Ok(())
    }

    async fn create_account(&self, request: &CreateAccountRequest) -> Result<Account, ApiError> {
        let path = "/api/auth/create-account";
        self.send_required(self.post(path).json(request), path).await
    }

    async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, ApiError> {
        let path = "/api/auth/create-checkout";
        self.send_required(self.post(path).json(request), path).await
    }

    async fn verify_session(&self, session_id: &str) -> Result<PaymentVerification, ApiError> {
        let path = "/api/auth/verify-session";
        let request = self.get(path).query(&[("session_id", session_id)]);
        self.send_required(request, path).await
    }

    async fn check_token(&self, token: &str) -> Result<TokenCheck, ApiError> {
        let body = TokenCheckRequest {
            token: token.to_string(),
        };
        self.send_required(self.post(VERIFY_TOKEN_PATH).json(&body), VERIFY_TOKEN_PATH).await
    }

    async fn health(&self) -> Result<ApiHealth, ApiError> {
        let path = "/api/health";
        self.send_required(self.get(path), path).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use super::*;

    fn response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\n\
             Content-Type: application/json\r\n\
             Content-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len()
        )
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0_u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .to_ascii_lowercase()
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:").map(str::to_string))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8(buf).unwrap()
    }

    /// Answers a single connection with `reply` and yields the raw request.
    async fn serve_once(reply: String) -> (HttpApiClient, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });
        let client = HttpApiClient::new(ApiConfig::new(&format!("http://{addr}"))).unwrap();
        (client, server)
    }

    #[tokio::test]
    async fn clear_analytics_accepts_no_content() {
        let (client, server) =
            serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string())
                .await;

        client.clear_analytics().await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("DELETE /api/analytics HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn required_body_missing_on_no_content() {
        let (client, server) =
            serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n".to_string())
                .await;

        let err = client.health().await.unwrap_err();

        assert!(matches!(err, ApiError::EmptyResponse { ref path } if path == "/api/health"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn sends_json_content_type_on_every_request() {
        let body = r#"{"campaigns": [], "defaultCampaignId": null}"#;
        let (client, server) = serve_once(response("200 OK", body)).await;

        let catalog = client.fetch_campaigns().await.unwrap();

        assert!(catalog.campaigns.is_empty());
        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/campaigns HTTP/1.1\r\n"));
        assert!(
            request
                .to_ascii_lowercase()
                .contains("content-type: application/json\r\n")
        );
    }

    #[tokio::test]
    async fn predict_posts_selection_and_decodes_forecast() {
        let body = r#"{"successScore":81,"successLevel":"Excellent","impressionsPerHour":1500}"#;
        let (client, server) = serve_once(response("200 OK", body)).await;

        let prediction = client
            .predict(&PredictRequest {
                city_id: "london".to_string(),
                area_id: "shoreditch".to_string(),
                campaign_id: Some("tech-startup".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(prediction.success_level, "Excellent");
        assert_eq!(prediction.impressions_per_hour, Some(1500.0));
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/predict HTTP/1.1\r\n"));
        assert!(request.ends_with(
            r#"{"cityId":"london","areaId":"shoreditch","campaignId":"tech-startup"}"#
        ));
    }

    #[tokio::test]
    async fn error_detail_from_response_becomes_message() {
        let body = r#"{"detail": "Unknown area id 'soho' for city 'london'"}"#;
        let (client, server) = serve_once(response("404 Not Found", body)).await;

        let err = client.fetch_cities().await.unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "Unknown area id 'soho' for city 'london'");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn verify_session_encodes_session_id() {
        let body = r#"{"paid": true, "email": "a@b.com", "token": "tok-9"}"#;
        let (client, server) = serve_once(response("200 OK", body)).await;

        let verification = client.verify_session("cs_test a&b=1").await.unwrap();

        assert!(verification.paid);
        assert_eq!(verification.token.as_deref(), Some("tok-9"));
        let request = server.await.unwrap();
        assert!(request.starts_with(
            "GET /api/auth/verify-session?session_id=cs_test+a%26b%3D1 HTTP/1.1\r\n"
        ));
    }

    fn message(err: &ApiError) -> (u16, String) {
        match err {
            ApiError::Status { status, message } => (*status, message.clone()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_error_uses_detail_field() {
        let err = status_error(
            StatusCode::NOT_FOUND,
            r#"{"detail": "Unknown area id 'x' for city 'london'"}"#,
        );
        assert_eq!(
            message(&err),
            (404, "Unknown area id 'x' for city 'london'".to_string())
        );
    }

    #[test]
    fn status_error_uses_message_field() {
        let err = status_error(StatusCode::BAD_REQUEST, r#"{"message": "Invalid email"}"#);
        assert_eq!(message(&err), (400, "Invalid email".to_string()));
    }

    #[test]
    fn status_error_falls_back_to_status_text() {
        let err = status_error(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert_eq!(message(&err), (502, "Bad Gateway".to_string()));

        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail": ""}"#);
        assert_eq!(message(&err), (500, "Internal Server Error".to_string()));
    }

    #[test]
    fn status_error_without_reason_is_generic() {
        let status = StatusCode::from_u16(599).unwrap();
        let err = status_error(status, "");
        assert_eq!(message(&err), (599, "Request failed".to_string()));
    }

    #[test]
    fn rejects_empty_base_url() {
        let err = HttpApiClient::new(ApiConfig::new("")).unwrap_err();
        assert!(matches!(err, ApiError::Config { .. }));
    }

    #[test]
    fn builds_client_for_configured_url() {
        let client = HttpApiClient::new(ApiConfig::new("http://127.0.0.1:8000/")).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }
}
