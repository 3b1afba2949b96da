use async_trait::async_trait;
use reqwest::{Client, Url};
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ScrapeError;
use crate::model::ScrapedProduct;

pub mod extract;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches current product attributes for one retailer page.
#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedProduct, ScrapeError>;
}

/// Retailers whose product pages we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retailer {
    Bws,
    Liquorland,
}

impl Retailer {
    pub fn detect(url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));
        if matches("bws.com.au") {
            Some(Retailer::Bws)
        } else if matches("liquorland.com.au") {
            Some(Retailer::Liquorland)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Retailer::Bws => "BWS",
            Retailer::Liquorland => "Liquorland",
        }
    }
}

impl fmt::Display for Retailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct HttpScraper {
    http: Client,
}

impl fmt::Debug for HttpScraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpScraper").finish_non_exhaustive()
    }
}

impl HttpScraper {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Other(format!("failed to build http client: {e}")))?;
        Ok(Self { http })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ScrapeError> {
        Self::new(
            &cfg.scraper.user_agent,
            Duration::from_secs(cfg.scraper.request_timeout_secs),
        )
    }

    pub fn with_defaults() -> Result<Self, ScrapeError> {
        Self::new(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    /// Fetch and parse a page as the given retailer, skipping host detection.
    pub async fn scrape_as(
        &self,
        retailer: Retailer,
        url: Url,
    ) -> Result<ScrapedProduct, ScrapeError> {
        let html = self.fetch_page(url).await?;
        let product = extract::parse_product(&html);
        if product.name.is_none() && product.price.is_none() {
            return Err(ScrapeError::UnrecognizedPage(format!(
                "no product name or price found on {retailer} page"
            )));
        }
        debug!(%retailer, name = ?product.name, price = ?product.price, "parsed product page");
        Ok(product)
    }

    async fn fetch_page(&self, url: Url) -> Result<String, ScrapeError> {
        let res = self.http.get(url.clone()).send().await?;
        let status = res.status();
        if !status.is_success() {
            warn!(%url, %status, "product page request failed");
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(res.text().await?)
    }
}

/// Validate a product URL and work out which retailer it belongs to.
pub fn resolve(url: &str) -> Result<(Retailer, Url), ScrapeError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ScrapeError::InvalidUrl("url is empty".into()));
    }
    let parsed = Url::parse(trimmed).map_err(|e| ScrapeError::InvalidUrl(format!("{trimmed}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScrapeError::InvalidUrl(format!("{trimmed}: unsupported scheme")));
    }
    let retailer = Retailer::detect(&parsed)
        .ok_or_else(|| ScrapeError::UnsupportedRetailer(parsed.host_str().unwrap_or("").to_string()))?;
    Ok((retailer, parsed))
}

#[async_trait]
impl ScrapeProvider for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedProduct, ScrapeError> {
        let (retailer, parsed) = resolve(url)?;
        self.scrape_as(retailer, parsed).await
    }
}
