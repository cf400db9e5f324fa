use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use covid_stats::fetch::HttpClient;
use covid_stats::fetch::auth::UrlParam;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::services::publisher::FeedPublisher;

const GRAPH_API: &str = "https://graph.facebook.com";

#[derive(Serialize)]
struct PostRequest<'a> {
    message: &'a str,
    link: &'a str,
}

#[derive(Deserialize)]
struct PostResponse {
    id: String,
}

/// Posts to group feeds through the Graph API.
pub struct GraphApiClient<C> {
    base_url: String,
    client: UrlParam<C>,
}

impl<C: HttpClient> GraphApiClient<C> {
    pub fn new(inner: C, access_token: String) -> Self {
        Self::with_base_url(inner, access_token, GRAPH_API)
    }

    pub fn with_base_url(inner: C, access_token: String, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: UrlParam::access_token(inner, access_token),
        }
    }
}

#[async_trait]
impl<C: HttpClient> FeedPublisher for GraphApiClient<C> {
    async fn post(&self, group: &str, message: &str, link: &str) -> Result<String> {
        info!(group, "Posting to group");

        let url = format!("{}/{}/feed", self.base_url, group);
        let mut req = Request::new(Method::POST, url.parse()?);
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(serde_json::to_vec(&PostRequest { message, link })?.into());

        let response = self
            .client
            .execute(req)
            .await
            .map_err(|e| anyhow!("Failed to send post request: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Post failed with status {}: {}", status, body));
        }

        let post: PostResponse = response
            .json()
            .await
            .context("Failed to parse post response")?;

        info!(post_id = %post.id, "Posted to group");
        Ok(post.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use covid_stats::fetch::BasicClient;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_post_sends_token_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/12345/feed"))
            .and(query_param("access_token", "tok"))
            .and(body_json(serde_json::json!({
                "message": "hello",
                "link": "https://arkansascovid.com/"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "12345_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = GraphApiClient::with_base_url(BasicClient::new(), "tok".into(), &server.uri());
        let id = client
            .post("12345", "hello", "https://arkansascovid.com/")
            .await
            .unwrap();
        assert_eq!(id, "12345_1");
    }

    #[tokio::test]
    async fn test_post_failure_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = GraphApiClient::with_base_url(BasicClient::new(), "tok".into(), &server.uri());
        let err = client.post("1", "m", "l").await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
