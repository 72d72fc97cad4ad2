//! HTTP access to the monitored page.
//!
//! The [`QueueHost`] trait is the seam between the probe logic and the
//! outside world: discovery finds open queue-page candidates, reload
//! re-fetches one of them bypassing caches. The production implementation
//! talks plain HTTP; tests substitute scripted hosts.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use url::Url;

use crate::decode::decode_page;
use crate::extract::has_queue_view_marker;
use crate::locate::{page_id, TargetPage};
use crate::types::{HostError, HostFailure, PageRef};

/// Transport limits for page fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

/// Access to the queue page.
#[async_trait]
pub trait QueueHost: Send + Sync {
    /// List open queue-page candidates under the monitored base URL.
    /// An empty list means the page is not reachable right now.
    async fn discover(&self) -> Result<Vec<PageRef>, HostError>;

    /// Re-fetch a candidate bypassing intermediate caches and return its
    /// HTML, decoded to text.
    async fn reload(&self, page: &PageRef) -> Result<String, HostError>;
}

/// [`QueueHost`] over plain HTTP.
pub struct HttpQueueHost {
    client: Client,
    settings: FetchSettings,
    target: TargetPage,
    view_table_selector: String,
}

struct FetchedDocument {
    final_url: String,
    html: String,
}

impl HttpQueueHost {
    pub fn new(target: TargetPage, settings: FetchSettings) -> Result<Self, HostError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(Policy::limited(settings.redirect_limit))
            .user_agent(concat!("vigia/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| HostError::new(HostFailure::Other, err.to_string()))?;
        Ok(Self {
            client,
            settings,
            target,
            view_table_selector: crate::extract::TableRowExtractor::DEFAULT_TABLE_SELECTOR
                .to_string(),
        })
    }

    /// Override the selector used to recognise the queue view during
    /// discovery.
    pub fn with_table_selector(mut self, selector: impl Into<String>) -> Self {
        self.view_table_selector = selector.into();
        self
    }

    async fn fetch_document(
        &self,
        url: Url,
        bypass_cache: bool,
    ) -> Result<FetchedDocument, HostError> {
        let mut request = self.client.get(url);
        if bypass_cache {
            request = request
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache");
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(HostError::new(
                HostFailure::Http {
                    status: status.as_u16(),
                },
                format!("GET {} returned {}", response.url(), status),
            ));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.check_content_type(content_type.as_deref())?;

        let body = read_capped(response, self.settings.max_bytes).await?;
        let page = decode_page(&body, content_type.as_deref())
            .map_err(|err| HostError::new(HostFailure::Decode, err.to_string()))?;

        Ok(FetchedDocument {
            final_url,
            html: page.html,
        })
    }

    fn check_content_type(&self, content_type: Option<&str>) -> Result<(), HostError> {
        // Absent headers pass; the queue page has historically been served
        // without one from some proxies.
        let Some(value) = content_type else {
            return Ok(());
        };
        let media_type = value.split(';').next().unwrap_or(value).trim();
        if self
            .settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
        {
            Ok(())
        } else {
            Err(HostError::new(
                HostFailure::UnsupportedContentType {
                    content_type: media_type.to_string(),
                },
                format!("refusing to parse {media_type:?} as a queue page"),
            ))
        }
    }
}

#[async_trait]
impl QueueHost for HttpQueueHost {
    async fn discover(&self) -> Result<Vec<PageRef>, HostError> {
        let document = self
            .fetch_document(self.target.request_url().clone(), false)
            .await?;

        // A redirect that left the monitored base (an SSO portal, say)
        // means no queue page is open.
        if !self.target.matches_base(&document.final_url) {
            return Ok(Vec::new());
        }

        let shows_queue_view = has_queue_view_marker(
            &document.html,
            self.target.fragment(),
            &self.view_table_selector,
        );
        let url = self.target.candidate_url(&document.final_url, shows_queue_view);
        Ok(vec![PageRef {
            id: page_id(&document.final_url),
            url,
        }])
    }

    async fn reload(&self, page: &PageRef) -> Result<String, HostError> {
        let mut url = Url::parse(&page.url)
            .map_err(|err| HostError::new(HostFailure::InvalidUrl, err.to_string()))?;
        url.set_fragment(None);
        let document = self.fetch_document(url, true).await?;
        Ok(document.html)
    }
}

async fn read_capped(response: Response, max_bytes: u64) -> Result<Vec<u8>, HostError> {
    if let Some(length) = response.content_length() {
        if length > max_bytes {
            return Err(HostError::new(
                HostFailure::TooLarge {
                    max_bytes,
                    actual: Some(length),
                },
                "declared content length exceeds cap",
            ));
        }
    }

    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        if (body.len() + chunk.len()) as u64 > max_bytes {
            return Err(HostError::new(
                HostFailure::TooLarge {
                    max_bytes,
                    actual: None,
                },
                "response body exceeds cap",
            ));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

fn map_reqwest_error(err: reqwest::Error) -> HostError {
    let kind = if err.is_timeout() {
        HostFailure::Timeout
    } else if err.is_connect() {
        HostFailure::Connect
    } else if err.is_redirect() {
        HostFailure::Redirect
    } else {
        HostFailure::Other
    };
    HostError::new(kind, err.to_string())
}
