//! Pre-populate an item form from a retailer URL. Never touches the store.
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::model::ScrapedProduct;
use crate::scraper::ScrapeProvider;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutofillResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ScrapedProduct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AutofillResult {
    pub fn ok(data: ScrapedProduct) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[instrument(skip_all, fields(url = %url))]
pub async fn scrape_one(scraper: &dyn ScrapeProvider, url: &str) -> AutofillResult {
    match scraper.scrape(url).await {
        Ok(data) => {
            info!(name = ?data.name, price = ?data.price, "auto-fill succeeded");
            AutofillResult::ok(data)
        }
        Err(err) => {
            warn!(%err, "auto-fill failed");
            AutofillResult::failed(format!("failed to scrape {}: {}", url.trim(), err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use async_trait::async_trait;

    struct Fixed(Result<ScrapedProduct, ScrapeError>);

    #[async_trait]
    impl ScrapeProvider for Fixed {
        async fn scrape(&self, _url: &str) -> Result<ScrapedProduct, ScrapeError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn success_carries_partial_data() {
        let scraper = Fixed(Ok(ScrapedProduct {
            name: Some("Bombay Sapphire".into()),
            price: Some(52.0),
            ..Default::default()
        }));
        let res = scrape_one(&scraper, "https://bws.com.au/p/1").await;
        assert!(res.success);
        assert!(res.error.is_none());
        let data = res.data.unwrap();
        assert_eq!(data.price, Some(52.0));
        assert_eq!(data.size_ml, None);
    }

    #[tokio::test]
    async fn failure_is_descriptive() {
        let scraper = Fixed(Err(ScrapeError::Timeout));
        let res = scrape_one(&scraper, "https://bws.com.au/p/1").await;
        assert!(!res.success);
        assert!(res.data.is_none());
        assert_eq!(
            res.error.as_deref(),
            Some("failed to scrape https://bws.com.au/p/1: timeout")
        );
    }

    #[test]
    fn serializes_without_empty_members() {
        let v = serde_json::to_value(AutofillResult::failed("boom")).unwrap();
        assert_eq!(v, serde_json::json!({ "success": false, "error": "boom" }));
    }
}
