//! Ethereal Client
//!
//! Provisions throwaway SMTP accounts from the Ethereal test service and
//! derives preview links for messages sent through them.

use async_trait::async_trait;
use contact_relay_utils::{RelayError, RelayResult};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const ETHEREAL_API_URL: &str = "https://api.nodemailer.com";
pub const ETHEREAL_SMTP_HOST: &str = "smtp.ethereal.email";
pub const ETHEREAL_SMTP_PORT: u16 = 587;
pub const ETHEREAL_WEB_URL: &str = "https://ethereal.email";

/// Generated credentials for a disposable account. Only valid for the
/// session that created them.
#[derive(Clone)]
pub struct TestAccount {
    pub user: String,
    pub pass: String,
    pub web_url: String,
}

impl std::fmt::Debug for TestAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestAccount")
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .field("web_url", &self.web_url)
            .finish()
    }
}

#[async_trait]
pub trait TestAccountProvider: Send + Sync {
    async fn create_test_account(&self) -> RelayResult<TestAccount>;
}

/// HTTP client for the Ethereal account API
pub struct EtherealClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AccountRequest<'a> {
    requestor: &'a str,
    version: &'a str,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    status: String,
    error: Option<String>,
    user: Option<String>,
    pass: Option<String>,
    web: Option<String>,
}

impl EtherealClient {
    pub fn new() -> RelayResult<Self> {
        Self::with_base_url(ETHEREAL_API_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> RelayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TestAccountProvider for EtherealClient {
    async fn create_test_account(&self) -> RelayResult<TestAccount> {
        let url = format!("{}/user", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&AccountRequest {
                requestor: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::transport_provision(format!(
                "Ethereal account API returned HTTP {}",
                status
            )));
        }

        let body: AccountResponse = response.json().await?;
        account_from_response(body)
    }
}

fn account_from_response(body: AccountResponse) -> RelayResult<TestAccount> {
    if body.status != "success" {
        return Err(RelayError::transport_provision(
            body.error
                .unwrap_or_else(|| format!("unexpected account status '{}'", body.status)),
        ));
    }

    match (body.user, body.pass) {
        (Some(user), Some(pass)) => Ok(TestAccount {
            user,
            pass,
            web_url: body.web.unwrap_or_else(|| ETHEREAL_WEB_URL.to_string()),
        }),
        _ => Err(RelayError::transport_provision(
            "account response is missing credentials",
        )),
    }
}

/// Preview link for a message accepted by Ethereal.
///
/// Ethereal appends `[STATUS=new MSGID=...]` to its final SMTP reply; both
/// keys must be present for the message to be viewable.
pub fn preview_url(web_url: &str, smtp_response: &str) -> Option<String> {
    let trailer = Regex::new(r"\[([^\]]+)\]\s*$").ok()?;
    let pair = Regex::new(r"\b([A-Z0-9]+)=(\S+)").ok()?;

    let props = trailer.captures(smtp_response)?.get(1)?.as_str();
    let values: HashMap<&str, &str> = pair
        .captures_iter(props)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect();

    if !values.contains_key("STATUS") {
        return None;
    }
    let msgid = values.get("MSGID")?;

    Some(format!("{}/message/{}", web_url.trim_end_matches('/'), msgid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json};
    use serde_json::json;

    #[test]
    fn test_preview_url_from_response() {
        let response = "250 Accepted [STATUS=new MSGID=Yb7ZkPx2aBcDeFgHYb7Zk.5pX-gAAAAB]";
        assert_eq!(
            preview_url("https://ethereal.email", response).as_deref(),
            Some("https://ethereal.email/message/Yb7ZkPx2aBcDeFgHYb7Zk.5pX-gAAAAB")
        );
    }

    #[test]
    fn test_preview_url_requires_status_and_msgid() {
        assert!(preview_url(ETHEREAL_WEB_URL, "250 2.0.0 Ok: queued as 12345").is_none());
        assert!(preview_url(ETHEREAL_WEB_URL, "250 Accepted [MSGID=abc]").is_none());
        assert!(preview_url(ETHEREAL_WEB_URL, "250 Accepted [STATUS=new]").is_none());
    }

    #[test]
    fn test_account_from_success_response() {
        let body: AccountResponse = serde_json::from_value(serde_json::json!({
            "status": "success",
            "user": "kaia.ward@ethereal.email",
            "pass": "s3cr3t",
            "smtp": { "host": "smtp.ethereal.email", "port": 587, "secure": false },
            "web": "https://ethereal.email"
        }))
        .unwrap();

        let account = account_from_response(body).unwrap();
        assert_eq!(account.user, "kaia.ward@ethereal.email");
        assert_eq!(account.pass, "s3cr3t");
        assert_eq!(account.web_url, "https://ethereal.email");
    }

    #[test]
    fn test_account_from_error_response() {
        let body: AccountResponse = serde_json::from_value(serde_json::json!({
            "status": "error",
            "error": "Too many accounts"
        }))
        .unwrap();

        let err = account_from_response(body).unwrap_err();
        assert!(matches!(err, RelayError::TransportProvision { .. }));
        assert!(err.to_string().contains("Too many accounts"));
    }

    async fn serve(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_create_test_account_over_http() {
        let router = axum::Router::new().route(
            "/user",
            post(|Json(request): Json<serde_json::Value>| async move {
                if request["requestor"] != env!("CARGO_PKG_NAME") {
                    return (StatusCode::BAD_REQUEST, Json(json!({ "status": "error" })));
                }
                (
                    StatusCode::OK,
                    Json(json!({
                        "status": "success",
                        "user": "kaia.ward@ethereal.email",
                        "pass": "s3cr3t",
                        "web": "https://ethereal.email"
                    })),
                )
            }),
        );
        let client = EtherealClient::with_base_url(serve(router).await).unwrap();

        let account = client.create_test_account().await.unwrap();
        assert_eq!(account.user, "kaia.ward@ethereal.email");
        assert_eq!(account.pass, "s3cr3t");
        assert_eq!(account.web_url, "https://ethereal.email");
    }

    #[tokio::test]
    async fn test_create_test_account_http_error_status() {
        let router = axum::Router::new().route(
            "/user",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let client = EtherealClient::with_base_url(serve(router).await).unwrap();

        let err = client.create_test_account().await.unwrap_err();
        assert!(matches!(err, RelayError::TransportProvision { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_create_test_account_undecodable_body() {
        let router = axum::Router::new().route("/user", post(|| async { "<html>not json</html>" }));
        let client = EtherealClient::with_base_url(serve(router).await).unwrap();

        let err = client.create_test_account().await.unwrap_err();
        assert!(matches!(err, RelayError::TransportProvision { .. }));
    }

    #[test]
    fn test_debug_redacts_password() {
        let account = TestAccount {
            user: "u".into(),
            pass: "hunter2".into(),
            web_url: ETHEREAL_WEB_URL.into(),
        };
        assert!(!format!("{:?}", account).contains("hunter2"));
    }
}
