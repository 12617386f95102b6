use async_trait::async_trait;
use doibot_core::doi::{normalize, Doi, NormalizeError, RESOLVER_DOMAIN};
use thiserror::Error;
use tracing::info;

use crate::client::{FetchError, WorksClient};
use crate::work::WorkSummary;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkPreview {
    pub doi: Doi,
    pub summary: WorkSummary,
}

/// User-facing failure taxonomy for a preview request. Every variant maps to
/// exactly one reply at the command boundary.
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("`{input}` is not a {RESOLVER_DOMAIN} link")]
    NotAResolverLink { input: String },
    #[error("identifier is empty")]
    EmptyInput,
    #[error("no metadata found for `{doi}`")]
    NotFound { doi: String },
    #[error("metadata api returned status {status}")]
    Api { status: u16 },
    #[error("metadata api is unreachable")]
    Unreachable,
    #[error("unexpected preview failure: {0}")]
    Unexpected(String),
}

impl From<NormalizeError> for PreviewError {
    fn from(error: NormalizeError) -> Self {
        match error {
            NormalizeError::NotAResolverLink { input } => Self::NotAResolverLink { input },
            NormalizeError::Empty => Self::EmptyInput,
        }
    }
}

impl From<FetchError> for PreviewError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::NotFound(doi) => Self::NotFound { doi },
            // Status and body are logged at the client; only the status
            // crosses into the user-facing taxonomy.
            FetchError::Api { status, .. } => Self::Api { status },
            FetchError::Unreachable(_) => Self::Unreachable,
            FetchError::Malformed(detail) => Self::Unexpected(detail),
        }
    }
}

/// The full doi-command pipeline behind one seam, so command handlers can be
/// exercised with a scripted implementation.
#[async_trait]
pub trait DoiPreviewService: Send + Sync {
    async fn preview(&self, input: &str) -> Result<WorkPreview, PreviewError>;
}

pub struct CrossrefPreviewService<C> {
    client: C,
}

impl<C> CrossrefPreviewService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C> DoiPreviewService for CrossrefPreviewService<C>
where
    C: WorksClient,
{
    async fn preview(&self, input: &str) -> Result<WorkPreview, PreviewError> {
        let doi = normalize(input)?;
        let body = self.client.fetch_work(&doi).await?;
        let summary = WorkSummary::from_response(&body);

        info!(doi = %doi, "work preview resolved");
        Ok(WorkPreview { doi, summary })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use doibot_core::Doi;
    use serde_json::{json, Value};

    use super::{CrossrefPreviewService, DoiPreviewService, PreviewError};
    use crate::client::{FetchError, WorksClient};

    struct ScriptedWorksClient {
        response: fn(&Doi) -> Result<Value, FetchError>,
    }

    #[async_trait]
    impl WorksClient for ScriptedWorksClient {
        async fn fetch_work(&self, doi: &Doi) -> Result<Value, FetchError> {
            (self.response)(doi)
        }
    }

    fn service(response: fn(&Doi) -> Result<Value, FetchError>) -> impl DoiPreviewService {
        CrossrefPreviewService::new(ScriptedWorksClient { response })
    }

    #[tokio::test]
    async fn resolver_link_is_normalized_before_the_fetch() {
        let service = service(|doi| {
            assert_eq!(doi.as_str(), "10.1000/xyz123");
            Ok(json!({"message": {"title": ["T"]}}))
        });

        let preview = service
            .preview("https://doi.org/10.1000/xyz123")
            .await
            .expect("preview should resolve");
        assert_eq!(preview.doi.as_str(), "10.1000/xyz123");
        assert_eq!(preview.summary.title_display(), "T");
    }

    #[tokio::test]
    async fn non_resolver_link_fails_without_a_fetch() {
        let service = service(|_| panic!("fetch must not run for rejected input"));

        let error = service
            .preview("https://example.com/10.1000/xyz123")
            .await
            .expect_err("foreign host should be rejected");
        assert!(matches!(error, PreviewError::NotAResolverLink { .. }));
    }

    #[tokio::test]
    async fn empty_input_fails_without_a_fetch() {
        let service = service(|_| panic!("fetch must not run for empty input"));

        let error = service.preview("  ").await.expect_err("empty input should be rejected");
        assert!(matches!(error, PreviewError::EmptyInput));
    }

    #[tokio::test]
    async fn not_found_surfaces_the_identifier() {
        let service = service(|doi| Err(FetchError::NotFound(doi.to_string())));

        let error = service.preview("10.1000/missing").await.expect_err("404 maps to not found");
        assert!(matches!(error, PreviewError::NotFound { ref doi } if doi == "10.1000/missing"));
    }

    #[tokio::test]
    async fn api_errors_drop_the_body_but_keep_the_status() {
        let service =
            service(|_| Err(FetchError::Api { status: 503, body: "secret detail".to_owned() }));

        let error = service.preview("10.1000/xyz123").await.expect_err("api error propagates");
        match error {
            PreviewError::Api { status } => assert_eq!(status, 503),
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failures_map_to_unreachable() {
        let service = service(|_| Err(FetchError::Unreachable("connection refused".to_owned())));

        let error = service.preview("10.1000/xyz123").await.expect_err("transport failure");
        assert!(matches!(error, PreviewError::Unreachable));
    }

    #[tokio::test]
    async fn malformed_bodies_map_to_unexpected() {
        let service = service(|_| Err(FetchError::Malformed("not json".to_owned())));

        let error = service.preview("10.1000/xyz123").await.expect_err("malformed body");
        assert!(matches!(error, PreviewError::Unexpected(_)));
    }
}
