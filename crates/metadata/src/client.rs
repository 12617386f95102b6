use std::time::Duration;

use async_trait::async_trait;
use doibot_core::config::CrossrefConfig;
use doibot_core::Doi;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no metadata found for `{0}`")]
    NotFound(String),
    #[error("metadata api returned status {status}")]
    Api { status: u16, body: String },
    #[error("metadata api is unreachable: {0}")]
    Unreachable(String),
    #[error("metadata api returned a malformed body: {0}")]
    Malformed(String),
}

/// Boundary to the bibliographic metadata API.
#[async_trait]
pub trait WorksClient: Send + Sync {
    async fn fetch_work(&self, doi: &Doi) -> Result<Value, FetchError>;
}

pub struct CrossrefClient {
    http: reqwest::Client,
    base_url: String,
}

impl CrossrefClient {
    pub fn new(config: &CrossrefConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }

    fn works_url(&self, doi: &Doi) -> String {
        // The identifier is embedded in the path verbatim; Crossref accepts
        // unescaped slashes inside the DOI segment.
        format!("{}/works/{}", self.base_url, doi)
    }
}

#[async_trait]
impl WorksClient for CrossrefClient {
    async fn fetch_work(&self, doi: &Doi) -> Result<Value, FetchError> {
        let url = self.works_url(doi);
        debug!(doi = %doi, url = %url, "fetching crossref work");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| FetchError::Unreachable(err.to_string()))?;

        let status = response.status().as_u16();
        let body =
            response.text().await.map_err(|err| FetchError::Unreachable(err.to_string()))?;

        let body = classify_response(doi, status, body)?;
        serde_json::from_str(&body).map_err(|err| FetchError::Malformed(err.to_string()))
    }
}

fn classify_response(doi: &Doi, status: u16, body: String) -> Result<String, FetchError> {
    match status {
        200 => Ok(body),
        404 => Err(FetchError::NotFound(doi.to_string())),
        other => {
            error!(doi = %doi, status = other, body = %body, "crossref api error");
            Err(FetchError::Api { status: other, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use doibot_core::config::CrossrefConfig;
    use doibot_core::normalize;

    use super::{classify_response, CrossrefClient, FetchError};

    fn config(base_url: &str) -> CrossrefConfig {
        CrossrefConfig {
            base_url: base_url.to_owned(),
            timeout_secs: 10,
            user_agent: "doibot-test/0".to_owned(),
        }
    }

    #[test]
    fn works_url_embeds_identifier_in_path() {
        let client = CrossrefClient::new(&config("https://api.crossref.org"))
            .expect("client should build");
        let doi = normalize("10.1000/xyz123").expect("valid identifier");
        assert_eq!(client.works_url(&doi), "https://api.crossref.org/works/10.1000/xyz123");
    }

    #[test]
    fn trailing_base_url_slash_is_tolerated() {
        let client =
            CrossrefClient::new(&config("https://api.crossref.org/")).expect("client should build");
        let doi = normalize("10.1000/xyz123").expect("valid identifier");
        assert_eq!(client.works_url(&doi), "https://api.crossref.org/works/10.1000/xyz123");
    }

    #[test]
    fn ok_response_passes_body_through() {
        let doi = normalize("10.1000/xyz123").expect("valid identifier");
        let body = classify_response(&doi, 200, "{}".to_owned()).expect("200 is success");
        assert_eq!(body, "{}");
    }

    #[test]
    fn not_found_carries_the_identifier() {
        let doi = normalize("10.1000/xyz123").expect("valid identifier");
        let error = classify_response(&doi, 404, String::new()).expect_err("404 is not found");
        assert!(matches!(error, FetchError::NotFound(ref id) if id == "10.1000/xyz123"));
    }

    #[test]
    fn other_statuses_keep_status_and_body_for_the_log() {
        let doi = normalize("10.1000/xyz123").expect("valid identifier");
        let error = classify_response(&doi, 503, "upstream sad".to_owned())
            .expect_err("non-200 is an api error");
        match error {
            FetchError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "upstream sad");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
