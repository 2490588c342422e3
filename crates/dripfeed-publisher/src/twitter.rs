use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::PublishError;
use crate::oauth::{self, Credentials};
use crate::publisher::Publisher;

const V1_PATH: &str = "/1.1/statuses/update.json";
const V2_PATH: &str = "/2/tweets";

pub struct TwitterPublisher {
    client: reqwest::Client,
    creds: Credentials,
    base_url: String,
}

impl TwitterPublisher {
    pub fn new(creds: Credentials, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            creds,
            base_url: base_url
                .unwrap_or_else(|| "https://api.twitter.com".to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Form-encoded v1.1 status update. The form field is signed.
    async fn post_v1(&self, text: &str) -> Result<String, PublishError> {
        let url = format!("{}{}", self.base_url, V1_PATH);
        let auth = oauth::authorization_header(&self.creds, "POST", &url, &[("status", text)]);

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(format!("status={}", oauth::encode(text)))
            .send()
            .await?;

        let body: V1Status = decode(resp).await?;
        Ok(body.id_str)
    }

    /// JSON v2 create-tweet. The body is not part of the signature.
    async fn post_v2(&self, text: &str) -> Result<String, PublishError> {
        let url = format!("{}{}", self.base_url, V2_PATH);
        let auth = oauth::authorization_header(&self.creds, "POST", &url, &[]);

        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let body: V2Created = decode(resp).await?;
        Ok(body.data.id)
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    fn name(&self) -> &str {
        "twitter"
    }

    async fn post_text(&self, text: &str) -> Result<String, PublishError> {
        debug!("posting with v1.1 API");
        let v1_err = match self.post_v1(text).await {
            Ok(id) => {
                info!(post_id = %id, api = "v1.1", "posted");
                return Ok(id);
            }
            Err(e) => {
                warn!(error = %e, "v1.1 post failed, falling back to v2");
                e
            }
        };

        match self.post_v2(text).await {
            Ok(id) => {
                info!(post_id = %id, api = "v2", "posted");
                Ok(id)
            }
            Err(v2_err) => {
                warn!(error = %v2_err, "v2 post failed");
                Err(PublishError::Rejected(format!("v1.1: {v1_err}; v2: {v2_err}")))
            }
        }
    }
}

async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, PublishError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(PublishError::Api {
            status: status.as_u16(),
            message: text,
        });
    }
    resp.json::<T>()
        .await
        .map_err(|e| PublishError::Parse(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct V1Status {
    id_str: String,
}

#[derive(Debug, Deserialize)]
struct V2Created {
    data: V2Data,
}

#[derive(Debug, Deserialize)]
struct V2Data {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;

    fn creds() -> Credentials {
        Credentials {
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            token: "t".into(),
            token_secret: "ts".into(),
        }
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn v1_success_short_circuits() {
        let router = Router::new()
            .route(
                V1_PATH,
                post(|body: String| async move {
                    assert_eq!(body, "status=hi%20there");
                    Json(serde_json::json!({ "id_str": "111" }))
                }),
            )
            .route(
                V2_PATH,
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "should not be called") }),
            );
        let publisher = TwitterPublisher::new(creds(), Some(serve(router).await));

        assert_eq!(publisher.post_text("hi there").await.unwrap(), "111");
    }

    #[tokio::test]
    async fn falls_back_to_v2() {
        let router = Router::new()
            .route(
                V1_PATH,
                post(|| async { (StatusCode::FORBIDDEN, "v1.1 not allowed on this tier") }),
            )
            .route(
                V2_PATH,
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body["text"], "hello");
                    (
                        StatusCode::CREATED,
                        Json(serde_json::json!({ "data": { "id": "222", "text": "hello" } })),
                    )
                }),
            );
        let publisher = TwitterPublisher::new(creds(), Some(serve(router).await));

        assert_eq!(publisher.post_text("hello").await.unwrap(), "222");
    }

    #[tokio::test]
    async fn both_failing_is_rejected() {
        let router = Router::new()
            .route(V1_PATH, post(|| async { (StatusCode::FORBIDDEN, "nope") }))
            .route(V2_PATH, post(|| async { (StatusCode::UNAUTHORIZED, "nope") }));
        let publisher = TwitterPublisher::new(creds(), Some(serve(router).await));

        let err = publisher.post_text("x").await.unwrap_err();
        assert!(matches!(err, PublishError::Rejected(_)));
        assert_eq!(err.code(), "PUBLISH_REJECTED");
        assert!(!publisher.is_dry_run());
    }

    #[tokio::test]
    async fn malformed_success_body_is_parse_error() {
        let router = Router::new().route(V1_PATH, post(|| async { Json(serde_json::json!({})) }));
        let publisher = TwitterPublisher::new(creds(), Some(serve(router).await));

        let err = publisher.post_v1("x").await.unwrap_err();
        assert!(matches!(err, PublishError::Parse(_)));
    }
}
