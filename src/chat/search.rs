//! Topic lookups for the `/search` command.

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

const WIKIPEDIA_SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary/";
const USER_AGENT: &str = concat!("owllama/", env!("CARGO_PKG_VERSION"));

/// Reply used when a lookup finds nothing.
pub const NO_RESULT: &str = "No relevant information found.";

/// Something that can summarize a topic in a paragraph.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Returns a short summary of `query`, or [`NO_RESULT`].
    async fn lookup(&self, query: &str) -> Result<String>;
}

/// Page summaries from the Wikipedia REST API.
#[derive(Debug, Clone)]
pub struct Wikipedia {
    client: ReqwestClient,
    base_url: Url,
}

impl Wikipedia {
    /// Creates a source backed by English Wikipedia.
    pub fn new() -> Result<Self> {
        Self::with_base_url(WIKIPEDIA_SUMMARY_URL)
    }

    /// Creates a source rooted at `base_url`; the page title is appended as
    /// the final path segment.
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::url(
                format!("{base_url} cannot be used as a base URL"),
                None,
            ));
        }
        let client = ReqwestClient::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;
        Ok(Self { client, base_url })
    }

    fn page_url(&self, query: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&page_title(query));
        }
        url
    }
}

#[async_trait]
impl KnowledgeSource for Wikipedia {
    async fn lookup(&self, query: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct Summary {
            #[serde(default)]
            title: String,
            #[serde(default)]
            extract: String,
        }

        let response = self
            .client
            .get(self.page_url(query))
            .send()
            .await
            .map_err(|e| Error::connection(format!("Search failed: {}", e), Some(Box::new(e))))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(NO_RESULT.to_string());
        }
        if !status.is_success() {
            return Err(Error::api(
                status.as_u16(),
                format!("wikipedia API error: {status}"),
            ));
        }

        let summary = response.json::<Summary>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse search result: {}", e),
                Some(Box::new(e)),
            )
        })?;
        if summary.extract.is_empty() {
            Ok(NO_RESULT.to_string())
        } else {
            Ok(format!("{}: {}", summary.title, summary.extract))
        }
    }
}

/// Wikipedia page title for a free-form query.
fn page_title(query: &str) -> String {
    query.replace(' ', "_").replace(['\n', '\r'], "")
}
