//! Wikipedia knowledge source - page summaries and lead images

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::config::BuildConfig;
use crate::error::LookupError;

/// A page summary returned for an unambiguous query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub title: String,
    pub summary: String,
}

/// Outcome of one page query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Found(PageSummary),
    Disambiguation,
    NotFound,
}

/// External knowledge base used for enrichment
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Resolve a query to a single page
    async fn lookup_page(&self, query: &str) -> Result<PageLookup, LookupError>;

    /// Representative image for a resolved page title
    async fn page_image(&self, title: &str) -> Result<Option<String>, LookupError>;
}

/// REST page summary response
#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "type", default)]
    page_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
}

/// Action API `prop=pageimages` response
#[derive(Debug, Deserialize)]
struct PageImagesResponse {
    #[serde(default)]
    query: Option<PageImagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PageImagesQuery {
    #[serde(default)]
    pages: serde_json::Map<String, serde_json::Value>,
}

/// Wikipedia client over the REST summary and action APIs
pub struct WikipediaClient {
    client: Client,
    summary_endpoint: String,
    api_endpoint: String,
}

impl WikipediaClient {
    /// Fails when the HTTP client cannot be built, e.g. an invalid user agent
    pub fn new(
        summary_endpoint: String,
        api_endpoint: String,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            summary_endpoint,
            api_endpoint,
        })
    }

    pub fn from_config(config: &BuildConfig) -> Result<Self, LookupError> {
        Self::new(
            config.wiki_summary_endpoint.clone(),
            config.wiki_api_endpoint.clone(),
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Summary URL for a title, spaces become underscores as in page paths
    fn summary_url(&self, title: &str) -> Result<Url, LookupError> {
        let mut url = Url::parse(&self.summary_endpoint)
            .map_err(|e| LookupError::Malformed(format!("bad summary endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| LookupError::Malformed("summary endpoint cannot be a base".into()))?
            .push(&title.replace(' ', "_"));
        url.query_pairs_mut().append_pair("redirect", "true");
        Ok(url)
    }
}

#[async_trait]
impl KnowledgeSource for WikipediaClient {
    async fn lookup_page(&self, query: &str) -> Result<PageLookup, LookupError> {
        let url = self.summary_url(query)?;
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(PageLookup::NotFound);
        }
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: serde_json::Value = resp.json().await?;
        parse_summary(body)
    }

    async fn page_image(&self, title: &str) -> Result<Option<String>, LookupError> {
        let resp = self
            .client
            .get(&self.api_endpoint)
            .query(&[
                ("action", "query"),
                ("prop", "pageimages"),
                ("format", "json"),
                ("piprop", "original"),
                ("titles", title),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: serde_json::Value = resp.json().await?;
        parse_page_image(body)
    }
}

/// Classify a summary response body
fn parse_summary(body: serde_json::Value) -> Result<PageLookup, LookupError> {
    let resp: SummaryResponse =
        serde_json::from_value(body).map_err(|e| LookupError::Malformed(e.to_string()))?;

    match resp.page_type.as_str() {
        "disambiguation" => Ok(PageLookup::Disambiguation),
        "no-extract" | "" if resp.extract.trim().is_empty() => Ok(PageLookup::NotFound),
        _ => Ok(PageLookup::Found(PageSummary {
            title: resp.title,
            summary: resp.extract,
        })),
    }
}

/// Original image source of the first page in a `pageimages` response
fn parse_page_image(body: serde_json::Value) -> Result<Option<String>, LookupError> {
    let resp: PageImagesResponse =
        serde_json::from_value(body).map_err(|e| LookupError::Malformed(e.to_string()))?;

    let Some(query) = resp.query else {
        return Ok(None);
    };

    Ok(query
        .pages
        .values()
        .next()
        .and_then(|page| page["original"]["source"].as_str())
        .map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_summary_found() {
        let body = json!({
            "type": "standard",
            "title": "Ferruccio Busoni",
            "extract": "Ferruccio Busoni was an Italian composer and pianist."
        });
        assert_eq!(
            parse_summary(body).unwrap(),
            PageLookup::Found(PageSummary {
                title: "Ferruccio Busoni".into(),
                summary: "Ferruccio Busoni was an Italian composer and pianist.".into(),
            })
        );
    }

    #[test]
    fn test_parse_summary_disambiguation() {
        let body = json!({"type": "disambiguation", "title": "Bach", "extract": "Bach may refer to:"});
        assert_eq!(parse_summary(body).unwrap(), PageLookup::Disambiguation);
    }

    #[test]
    fn test_parse_summary_without_extract() {
        let body = json!({"type": "no-extract", "title": "Something"});
        assert_eq!(parse_summary(body).unwrap(), PageLookup::NotFound);
    }

    #[test]
    fn test_parse_page_image() {
        let body = json!({
            "query": {"pages": {"12345": {
                "pageid": 12345,
                "title": "Ferruccio Busoni",
                "original": {"source": "https://upload.wikimedia.org/busoni.jpg", "width": 800}
            }}}
        });
        assert_eq!(
            parse_page_image(body).unwrap(),
            Some("https://upload.wikimedia.org/busoni.jpg".to_string())
        );

        let body = json!({"query": {"pages": {"-1": {"missing": ""}}}});
        assert_eq!(parse_page_image(body).unwrap(), None);

        assert_eq!(parse_page_image(json!({})).unwrap(), None);
    }

    #[test]
    fn test_summary_url_encodes_title() {
        let client = WikipediaClient::new(
            "https://en.wikipedia.org/api/rest_v1/page/summary".into(),
            "https://en.wikipedia.org/w/api.php".into(),
            "test",
            Duration::from_secs(1),
        )
        .unwrap();
        let url = client.summary_url("Eugen d'Albert (composer)").unwrap();
        assert!(url
            .as_str()
            .starts_with("https://en.wikipedia.org/api/rest_v1/page/summary/Eugen_d"));
        assert!(!url.path().contains(' '));
        assert!(url.as_str().ends_with("?redirect=true"));
    }

    #[test]
    fn test_invalid_user_agent_is_rejected() {
        let result = WikipediaClient::new(
            "https://en.wikipedia.org/api/rest_v1/page/summary".into(),
            "https://en.wikipedia.org/w/api.php".into(),
            "broken\nagent",
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
