//! Client for the upstream field-service REST API.
//!
//! Every outbound call goes through [`UpstreamClient::request_with_auth`],
//! the reactive refresh guard: on a 401 it forces one single-flight refresh
//! and retries the call exactly once. Callers never see token lifecycle.

use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::{PortalError, Result};
use crate::models::upstream::{Job, NewJobNote};
use crate::oauth::refresher::TokenRefresher;

pub struct UpstreamClient {
    base_url: String,
    http: reqwest::Client,
    refresher: Arc<TokenRefresher>,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, refresher: Arc<TokenRefresher>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            refresher,
        })
    }

    /// The reactive refresh guard. Builds and sends the request with the
    /// current access token; if the response is a 401, forces one refresh
    /// and retries once. Any other outcome — success, 404, 5xx — passes
    /// through untouched. A 401 on the retry is a genuine failure.
    pub async fn request_with_auth<F>(&self, build: F) -> Result<reqwest::Response>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let token = self.refresher.access_token().await?;
        let response = build(&self.http).bearer_auth(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("upstream returned 401, refreshing access token and retrying once");
        let fresh = self.refresher.refresh_after_failure(&token).await?;
        let retry = build(&self.http).bearer_auth(&fresh).send().await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            warn!("upstream rejected a freshly refreshed access token");
            return Err(PortalError::Unauthorized(
                "upstream rejected a freshly refreshed access token".into(),
            ));
        }
        Ok(retry)
    }

    async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{path_and_query}", self.base_url);
        let response = self
            .request_with_auth(|http| http.get(&url))
            .await?;
        Self::expect_success(response).await?.json().await.map_err(|e| {
            PortalError::Serialization(format!("failed to parse upstream response: {e}"))
        })
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .request_with_auth(|http| http.post(&url).json(body))
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(PortalError::Upstream { status, body })
    }

    /// List jobs belonging to one upstream client record.
    pub async fn list_jobs(&self, company_uuid: &str) -> Result<Vec<Job>> {
        let filter = format!("company_uuid eq '{company_uuid}'");
        let query = format!("/job.json?%24filter={}", urlencode(&filter));
        self.get_json(&query).await
    }

    pub async fn get_job(&self, job_uuid: &str) -> Result<Job> {
        self.get_json(&format!("/job/{job_uuid}.json")).await
    }

    pub async fn create_job_note(&self, note: &NewJobNote) -> Result<()> {
        self.post_json("/note.json", note).await
    }

    /// Probe used by `jobport status`: fetch a token and make one cheap
    /// authenticated request.
    pub async fn test_connection(&self) -> Result<()> {
        let url = format!("{}/job.json?%24top=1", self.base_url);
        let response = self.request_with_auth(|http| http.get(&url)).await?;
        Self::expect_success(response).await?;
        Ok(())
    }
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto;
    use crate::db::sqlite::SqliteRepository;
    use crate::db::DatabasePool;
    use crate::oauth::seed_refresh_token;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer) -> UpstreamClient {
        let pool = match DatabasePool::new_sqlite_memory().await.unwrap() {
            DatabasePool::Sqlite(p) => p,
        };
        let repo = Arc::new(SqliteRepository::new(pool));
        let key = crypto::generate_key();
        seed_refresh_token(repo.clone(), &key, "R0").await.unwrap();

        let config = UpstreamConfig {
            base_url: server.uri(),
            token_url: format!("{}/oauth/access_token", server.uri()),
            client_id: "app-123".into(),
            client_secret: "shh".into(),
            refresh_interval_minutes: 48,
            request_timeout_secs: 5,
        };
        let refresher = Arc::new(TokenRefresher::new(&config, key, repo).unwrap());
        UpstreamClient::new(&config, refresher).unwrap()
    }

    /// Mount a token endpoint that hands out A1 then A2.
    async fn mount_token_endpoint(server: &MockServer, expect: u64) {
        Mock::given(method("POST"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "A1",
                "refresh_token": "R1",
            })))
            .up_to_n_times(1)
            .expect(1)
            .mount(server)
            .await;
        if expect > 1 {
            Mock::given(method("POST"))
                .and(path("/oauth/access_token"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "access_token": "A2",
                    "refresh_token": "R2",
                })))
                .expect(expect - 1)
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn auth_failure_triggers_exactly_one_refresh_and_retry() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 2).await;

        // First attempt with A1 is rejected, retry with A2 succeeds.
        Mock::given(method("GET"))
            .and(path("/job/job-1.json"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/job/job-1.json"))
            .and(header("authorization", "Bearer A2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uuid": "job-1",
                "status": "Work Order"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup(&server).await;
        let job = client.get_job("job-1").await.unwrap();
        assert_eq!(job.uuid, "job-1");
    }

    #[tokio::test]
    async fn second_auth_failure_propagates_without_more_retries() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 2).await;

        Mock::given(method("GET"))
            .and(path("/job/job-1.json"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let client = setup(&server).await;
        let err = client.get_job("job-1").await.unwrap_err();
        assert!(matches!(err, PortalError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn non_auth_errors_are_not_retried() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/job/missing.json"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup(&server).await;
        let err = client.get_job("missing").await.unwrap_err();
        assert!(matches!(err, PortalError::Upstream { status: 404, .. }));
    }

    #[tokio::test]
    async fn list_jobs_filters_by_company() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/job.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"uuid": "job-1", "company_uuid": "company-9"},
                {"uuid": "job-2", "company_uuid": "company-9"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup(&server).await;
        let jobs = client.list_jobs("company-9").await.unwrap();
        assert_eq!(jobs.len(), 2);

        let requests = server.received_requests().await.unwrap();
        let job_req = requests
            .iter()
            .find(|r| r.url.path() == "/job.json")
            .unwrap();
        assert!(job_req.url.query().unwrap().contains("company-9"));
    }

    #[tokio::test]
    async fn create_note_posts_json() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, 1).await;

        Mock::given(method("POST"))
            .and(path("/note.json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup(&server).await;
        client
            .create_job_note(&NewJobNote {
                related_object_uuid: "job-1".into(),
                note: "Customer called".into(),
            })
            .await
            .unwrap();
    }

    #[test]
    fn urlencode_escapes_reserved_characters() {
        assert_eq!(urlencode("a eq 'b c'"), "a%20eq%20%27b%20c%27");
        assert_eq!(urlencode("plain-text_1.0~x"), "plain-text_1.0~x");
    }
}
