//! Error taxonomy shared by the inventory service and the refresh pass.
use std::fmt;
use thiserror::Error;

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Bad user input. Carries every violated field, not just the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.field).collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.field == name)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: ")?;
        for (i, fe) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} {}", fe.field, fe.message)?;
        }
        Ok(())
    }
}

/// Programming-contract violation, e.g. a non-positive size reaching the pricing model.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid input: {0}")]
pub struct InvalidInput(pub String);

/// Failure reported by an item store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("item {0} not found")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a scrape provider for one URL.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScrapeError {
    #[error("timeout")]
    Timeout,
    #[error("unsupported retailer: {0}")]
    UnsupportedRetailer(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("unrecognized page: {0}")]
    UnrecognizedPage(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScrapeError::Timeout
        } else {
            ScrapeError::Network(err.to_string())
        }
    }
}

/// Why one item in a refresh pass did not get updated. Recovered into the
/// outcome report, never propagated out of the pass.
#[derive(Debug, Error)]
pub enum ItemFailure {
    #[error("{0}")]
    Scrape(#[from] ScrapeError),
    #[error("no usable price returned (got {})", fmt_price(.0))]
    InvalidPrice(Option<f64>),
    #[error("{0}")]
    Pricing(#[from] InvalidInput),
    #[error("failed to save: {0}")]
    Persist(#[from] StoreError),
}

fn fmt_price(price: &Option<f64>) -> String {
    match price {
        Some(p) => p.to_string(),
        None => "none".to_string(),
    }
}

/// Errors surfaced by inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("item {0} not found")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
}

impl From<StoreError> for InventoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => InventoryError::NotFound(id),
            other => InventoryError::StoreUnavailable(other),
        }
    }
}

/// Errors that abort a whole refresh pass. Per-item failures are not here.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),
    #[error("refresh pass cancelled")]
    Cancelled,
    #[error("refresh pass timed out after {0:?}")]
    TimedOut(std::time::Duration),
}
