use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};

use super::{missing_markers, PageLoader, PageWait};
use crate::headers::add_page_headers;
use crate::{Result, VkStatsError};

/// Loads pages with a plain HTTP GET.
///
/// The markers are checked against the response body; there is no script
/// execution, so this only works for pages served fully rendered.
pub struct HttpPageLoader {
    client: Box<dyn HttpClient>,
}

impl HttpPageLoader {
    pub fn new(client: Box<dyn HttpClient>) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<(u16, String)> {
        let parsed = Url::parse(url).map_err(|e| VkStatsError::Scrape(e.to_string()))?;
        let mut request = Request::new(Method::Get, parsed);
        add_page_headers(&mut request, Some("https://vk.com/"));

        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| VkStatsError::Http(e.to_string()))?;
        let status: u16 = response.status().into();
        let body = response
            .body_string()
            .await
            .map_err(|e| VkStatsError::Http(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl PageLoader for HttpPageLoader {
    async fn load(&self, url: &str, wait: &PageWait) -> Result<String> {
        log::debug!("GET {url}");

        let (status, body) = tokio::time::timeout(wait.timeout, self.fetch(url))
            .await
            .map_err(|_| VkStatsError::NotFound(format!("timed out loading {url}")))?
            .map_err(|e| match e {
                VkStatsError::Http(message) => VkStatsError::Scrape(message),
                other => other,
            })?;

        log::debug!("{url} responded with status {status}");
        if status == 404 {
            return Err(VkStatsError::NotFound(url.to_string()));
        }
        if !(200..300).contains(&status) {
            return Err(VkStatsError::Scrape(format!("{url} responded with status {status}")));
        }

        let missing = missing_markers(&body, &wait.markers);
        if !missing.is_empty() {
            log::debug!("{url} is missing markers {missing:?}");
            return Err(VkStatsError::NotFound(url.to_string()));
        }
        Ok(body)
    }
}
