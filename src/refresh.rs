//! Bulk price refresh over one user's inventory.
//!
//! Every item with a source URL is scraped, re-priced and saved on its own.
//! A failing item becomes one line in the outcome report and never stops the
//! others. Only failing to load the inventory aborts the pass.
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::{ItemFailure, RefreshError, ScrapeError};
use crate::model::{InventoryItem, PricedItem, ScrapeOutcome, Session};
use crate::scraper::ScrapeProvider;
use crate::store::ItemStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOptions {
    /// Upper bound on items scraped at the same time.
    pub concurrency: usize,
    /// Limit for a single scrape call.
    pub item_timeout: Duration,
    /// Limit for the whole pass; exceeding it fails the pass.
    pub pass_timeout: Option<Duration>,
}

impl Default for RefreshOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            item_timeout: Duration::from_secs(15),
            pass_timeout: None,
        }
    }
}

impl RefreshOptions {
    pub fn from_config(cfg: &Config) -> Self {
        let s = &cfg.scraper;
        Self {
            concurrency: s.concurrency,
            item_timeout: Duration::from_secs(s.item_timeout_secs),
            pass_timeout: (s.pass_timeout_secs > 0).then(|| Duration::from_secs(s.pass_timeout_secs)),
        }
    }
}

#[derive(Clone)]
pub struct Refresher {
    store: Arc<dyn ItemStore>,
    scraper: Arc<dyn ScrapeProvider>,
    options: RefreshOptions,
}

impl Refresher {
    pub fn new(
        store: Arc<dyn ItemStore>,
        scraper: Arc<dyn ScrapeProvider>,
        options: RefreshOptions,
    ) -> Self {
        Self {
            store,
            scraper,
            options,
        }
    }

    pub fn options(&self) -> &RefreshOptions {
        &self.options
    }

    /// Run one pass over the session user's inventory.
    pub async fn refresh_all_prices(&self, session: &Session) -> Result<ScrapeOutcome, RefreshError> {
        self.refresh_all_prices_until(session, std::future::pending::<()>())
            .await
    }

    /// Like `refresh_all_prices`, but gives up as soon as `cancel` resolves.
    /// A cancelled or timed-out pass returns an error, never a partial report.
    pub async fn refresh_all_prices_until<C>(
        &self,
        session: &Session,
        cancel: C,
    ) -> Result<ScrapeOutcome, RefreshError>
    where
        C: Future<Output = ()>,
    {
        let pass = async {
            match self.options.pass_timeout {
                Some(limit) => tokio::time::timeout(limit, self.run_pass(session))
                    .await
                    .map_err(|_| RefreshError::TimedOut(limit))?,
                None => self.run_pass(session).await,
            }
        };
        tokio::select! {
            res = pass => {
                if let Err(RefreshError::TimedOut(limit)) = &res {
                    warn!(user_id = session.user_id(), ?limit, "refresh pass timed out");
                }
                res
            }
            _ = cancel => {
                warn!(user_id = session.user_id(), "refresh pass cancelled");
                Err(RefreshError::Cancelled)
            }
        }
    }

    #[instrument(skip_all, fields(user_id = %session.user_id()))]
    async fn run_pass(&self, session: &Session) -> Result<ScrapeOutcome, RefreshError> {
        let user_id = session.user_id();
        let items = self
            .store
            .list_items(user_id)
            .await
            .map_err(RefreshError::StoreUnavailable)?;

        let eligible: Vec<InventoryItem> = items
            .into_iter()
            .filter(|item| item.refresh_source().is_some())
            .collect();
        let refreshed_at = Utc::now();
        let mut outcome = ScrapeOutcome {
            total_items: eligible.len(),
            ..Default::default()
        };
        info!(eligible = outcome.total_items, "starting price refresh");

        // `buffered` yields in submission order, so error order is stable
        // however the scrapes finish.
        let mut results = std::pin::pin!(stream::iter(eligible)
            .map(|item| async move {
                let res = self.refresh_item(user_id, &item, refreshed_at).await;
                (item, res)
            })
            .buffered(self.options.concurrency.max(1)));

        while let Some((item, res)) = results.next().await {
            match res {
                Ok(updated) => {
                    debug!(
                        item_id = %updated.id,
                        price = updated.price,
                        price_per_liter = updated.price_per_liter,
                        "item refreshed"
                    );
                    outcome.updated_count += 1;
                }
                Err(failure) => {
                    warn!(item_id = %item.id, %failure, "item refresh failed");
                    outcome.errors.push(format!("{}: {}", item.label(), failure));
                }
            }
        }

        info!(
            updated = outcome.updated_count,
            failed = outcome.errors.len(),
            total = outcome.total_items,
            "price refresh finished"
        );
        Ok(outcome)
    }

    async fn refresh_item(
        &self,
        user_id: &str,
        item: &InventoryItem,
        refreshed_at: DateTime<Utc>,
    ) -> Result<InventoryItem, ItemFailure> {
        let url = item.refresh_source().unwrap_or_default();
        let scraped = tokio::time::timeout(self.options.item_timeout, self.scraper.scrape(url))
            .await
            .map_err(|_| ScrapeError::Timeout)??;
        let price = scraped
            .usable_price()
            .ok_or(ItemFailure::InvalidPrice(scraped.price))?;

        let mut fields = item.fields();
        fields.price = price;
        let priced = PricedItem::new(fields, refreshed_at)?;
        Ok(self.store.update_item(user_id, &item.id, &priced).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;

    #[test]
    fn options_from_example_config() {
        let cfg: Config = serde_yaml::from_str(config::example()).unwrap();
        let opts = RefreshOptions::from_config(&cfg);
        assert_eq!(opts.concurrency, 4);
        assert_eq!(opts.item_timeout, Duration::from_secs(15));
        assert_eq!(opts.pass_timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn zero_pass_timeout_means_unbounded() {
        let mut cfg: Config = serde_yaml::from_str(config::example()).unwrap();
        cfg.scraper.pass_timeout_secs = 0;
        assert_eq!(RefreshOptions::from_config(&cfg).pass_timeout, None);
    }
}
