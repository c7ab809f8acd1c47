use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

const DATA_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Outcome of a remote call. Transport failures are folded into the same
/// shape as HTTP errors: every failure is a soft failure the handler
/// classifies into a user-facing status code, never an exception.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: String,
}

impl BackendResponse {
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_str(&self.body).ok()
    }
}

/// The remote Supabase surface this application depends on: auth endpoints,
/// PostgREST collections, stored procedures, and object storage.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, path: &str, access_token: Option<&str>) -> BackendResponse;
    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
        access_token: Option<&str>,
    ) -> BackendResponse;
    async fn patch(
        &self,
        path: &str,
        body: serde_json::Value,
        access_token: Option<&str>,
    ) -> BackendResponse;
    async fn delete(&self, path: &str, access_token: Option<&str>) -> BackendResponse;
    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        data: Bytes,
        content_type: &str,
        access_token: Option<&str>,
    ) -> BackendResponse;
    fn public_url(&self, bucket: &str, object: &str) -> String;
}

#[derive(Clone)]
pub struct Supabase {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl Supabase {
    pub fn new(base_url: &str, anon_key: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(DATA_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    /// `apikey` always, bearer is the caller's token or the anon key.
    fn headers(&self, access_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", access_token.unwrap_or(&self.anon_key));
        if let Ok(v) = HeaderValue::from_str(&self.anon_key) {
            headers.insert("apikey", v);
        }
        if let Ok(v) = HeaderValue::from_str(&bearer) {
            headers.insert(AUTHORIZATION, v);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static("return=minimal"));
        headers
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> BackendResponse {
        match request.send().await {
            Ok(resp) => {
                let status = StatusCode::from_u16(resp.status().as_u16())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                let body = resp.text().await.unwrap_or_default();
                if status.is_client_error() || status.is_server_error() {
                    debug!(%status, body = %truncate(&body, 300), "backend error response");
                }
                BackendResponse { status, body }
            }
            Err(e) => {
                error!(error = %e, "backend request failed");
                BackendResponse {
                    status: StatusCode::BAD_GATEWAY,
                    body: e.to_string(),
                }
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Backend for Supabase {
    async fn get(&self, path: &str, access_token: Option<&str>) -> BackendResponse {
        self.send(self.client.get(self.url(path)).headers(self.headers(access_token)))
            .await
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
        access_token: Option<&str>,
    ) -> BackendResponse {
        self.send(
            self.client
                .post(self.url(path))
                .headers(self.headers(access_token))
                .json(&body),
        )
        .await
    }

    async fn patch(
        &self,
        path: &str,
        body: serde_json::Value,
        access_token: Option<&str>,
    ) -> BackendResponse {
        self.send(
            self.client
                .patch(self.url(path))
                .headers(self.headers(access_token))
                .json(&body),
        )
        .await
    }

    async fn delete(&self, path: &str, access_token: Option<&str>) -> BackendResponse {
        self.send(
            self.client
                .delete(self.url(path))
                .headers(self.headers(access_token)),
        )
        .await
    }

    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        data: Bytes,
        content_type: &str,
        access_token: Option<&str>,
    ) -> BackendResponse {
        let url = self.url(&format!("/storage/v1/object/{bucket}/{object}"));
        let mut headers = self.headers(access_token);
        headers.remove("Prefer");
        if let Ok(v) = HeaderValue::from_str(content_type) {
            headers.insert(CONTENT_TYPE, v);
        }
        headers.insert("x-upsert", HeaderValue::from_static("true"));
        self.send(
            self.client
                .post(url)
                .headers(headers)
                .timeout(UPLOAD_TIMEOUT)
                .body(data),
        )
        .await
    }

    fn public_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{bucket}/{object}",
            self.base_url
        )
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
