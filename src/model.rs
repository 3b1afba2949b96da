use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FieldError, InvalidInput, ValidationError};
use crate::pricing;

/// Authenticated caller context. The user id comes from the auth provider and
/// is trusted as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Result<Self, InvalidInput> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(InvalidInput("session user id must be non-empty".into()));
        }
        Ok(Self { user_id })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Caller-editable attributes of an item. Everything except identity and the
/// derived fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemFields {
    pub name: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(rename = "sizeMilliliters")]
    pub size_ml: f64,
    pub alcohol_percentage: f64,
    pub price: f64,
    pub shop: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ItemFields {
    /// Check every rule and report all violations at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut fields = Vec::new();
        let mut require_text = |field: &'static str, value: &str| {
            if value.trim().is_empty() {
                fields.push(FieldError {
                    field,
                    message: "must be non-empty".into(),
                });
            }
        };
        require_text("name", &self.name);
        require_text("brand", &self.brand);
        require_text("type", &self.item_type);
        require_text("shop", &self.shop);

        if !self.size_ml.is_finite() || self.size_ml <= 0.0 {
            fields.push(FieldError {
                field: "sizeMilliliters",
                message: "must be greater than 0".into(),
            });
        }
        if !(0.0..=100.0).contains(&self.alcohol_percentage) {
            fields.push(FieldError {
                field: "alcoholPercentage",
                message: "must be between 0 and 100".into(),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            fields.push(FieldError {
                field: "price",
                message: "must be >= 0".into(),
            });
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { fields })
        }
    }

    /// Apply an auto-fill result to a form draft. Only attributes the scrape
    /// actually returned overwrite existing values.
    pub fn merge_scraped(&mut self, data: &ScrapedProduct) {
        if let Some(name) = non_blank(&data.name) {
            self.name = name.to_string();
        }
        if let Some(brand) = non_blank(&data.brand) {
            self.brand = brand.to_string();
        }
        if let Some(price) = data.price {
            self.price = price;
        }
        if let Some(size) = data.size_ml {
            self.size_ml = size;
        }
        if let Some(abv) = data.alcohol_percentage {
            self.alcohol_percentage = abv;
        }
        if let Some(url) = non_blank(&data.image_url) {
            self.image_url = Some(url.to_string());
        }
    }

    fn normalized(mut self) -> Self {
        self.source_url = self.source_url.filter(|s| !s.trim().is_empty());
        self.image_url = self.image_url.filter(|s| !s.trim().is_empty());
        self
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Item attributes paired with a unit price derived from them. This is the
/// only shape an item store accepts for writes, so `price_per_liter` can never
/// drift from `price` and `size_ml`.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem {
    fields: ItemFields,
    price_per_liter: f64,
    last_updated: DateTime<Utc>,
}

impl PricedItem {
    pub fn new(fields: ItemFields, last_updated: DateTime<Utc>) -> Result<Self, InvalidInput> {
        let price_per_liter = pricing::compute_price_per_liter(fields.price, fields.size_ml)?;
        Ok(Self {
            fields: fields.normalized(),
            price_per_liter,
            last_updated,
        })
    }

    pub fn fields(&self) -> &ItemFields {
        &self.fields
    }

    pub fn price_per_liter(&self) -> f64 {
        self.price_per_liter
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(rename = "sizeMilliliters")]
    pub size_ml: f64,
    pub alcohol_percentage: f64,
    pub price: f64,
    pub price_per_liter: f64,
    pub shop: String,
    pub source_url: Option<String>,
    pub image_url: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    pub fn from_priced(id: String, user_id: String, priced: &PricedItem) -> Self {
        let f = priced.fields();
        Self {
            id,
            user_id,
            name: f.name.clone(),
            brand: f.brand.clone(),
            item_type: f.item_type.clone(),
            size_ml: f.size_ml,
            alcohol_percentage: f.alcohol_percentage,
            price: f.price,
            price_per_liter: priced.price_per_liter(),
            shop: f.shop.clone(),
            source_url: f.source_url.clone(),
            image_url: f.image_url.clone(),
            last_updated: priced.last_updated(),
        }
    }

    pub fn fields(&self) -> ItemFields {
        ItemFields {
            name: self.name.clone(),
            brand: self.brand.clone(),
            item_type: self.item_type.clone(),
            size_ml: self.size_ml,
            alcohol_percentage: self.alcohol_percentage,
            price: self.price,
            shop: self.shop.clone(),
            source_url: self.source_url.clone(),
            image_url: self.image_url.clone(),
        }
    }

    /// The URL to re-scrape, if this item is eligible for refresh.
    pub fn refresh_source(&self) -> Option<&str> {
        self.source_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Unrounded per-liter price, used for ranking. Items with a bad size sort last.
    pub fn unit_price(&self) -> f64 {
        pricing::unit_price(self.price, self.size_ml).unwrap_or(f64::INFINITY)
    }

    /// Short label used in refresh error entries.
    pub fn label(&self) -> String {
        if self.name.trim().is_empty() {
            format!("item {}", self.id)
        } else {
            format!("item {} ({})", self.id, self.name.trim())
        }
    }
}

/// Whatever a scrape could extract from a product page. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedProduct {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "sizeMilliliters", skip_serializing_if = "Option::is_none")]
    pub size_ml: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alcohol_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ScrapedProduct {
    /// The scraped price if it can drive an update: present, finite, positive.
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }
}

/// Summary of one refresh pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutcome {
    pub total_items: usize,
    pub updated_count: usize,
    pub errors: Vec<String>,
}

impl ScrapeOutcome {
    pub fn summary(&self) -> String {
        format!("{} of {} updated", self.updated_count, self.total_items)
    }
}

/// Price recorded when an item's price changed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub item_id: String,
    pub price: f64,
    pub shop: String,
    pub recorded_at: DateTime<Utc>,
}

/// One line of a cocktail recipe with what that amount of the ingredient costs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CocktailIngredient {
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub amount: f64,
    pub unit: String,
    pub cost: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CocktailCosts {
    pub total_cost: f64,
    pub cost_per_serving: f64,
    pub selling_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fields() -> ItemFields {
        ItemFields {
            name: "Jameson Irish Whiskey".into(),
            brand: "Jameson".into(),
            item_type: "Whiskey".into(),
            size_ml: 700.0,
            alcohol_percentage: 40.0,
            price: 45.99,
            shop: "BWS".into(),
            source_url: Some("https://bws.com.au/product/1".into()),
            image_url: None,
        }
    }

    #[test]
    fn session_requires_user_id() {
        assert!(Session::new("  ").is_err());
        assert_eq!(Session::new("alice").unwrap().user_id(), "alice");
    }

    #[test]
    fn valid_fields_pass() {
        valid_fields().validate().unwrap();
    }

    #[test]
    fn validation_names_every_bad_field() {
        let fields = ItemFields {
            name: " ".into(),
            brand: String::new(),
            item_type: "Gin".into(),
            size_ml: 0.0,
            alcohol_percentage: 101.0,
            price: -1.0,
            shop: String::new(),
            source_url: None,
            image_url: None,
        };
        let err = fields.validate().unwrap_err();
        assert_eq!(
            err.field_names(),
            vec!["name", "brand", "shop", "sizeMilliliters", "alcoholPercentage", "price"]
        );
        assert!(!err.has_field("type"));
    }

    #[test]
    fn alcohol_bounds_are_inclusive() {
        let mut f = valid_fields();
        f.alcohol_percentage = 0.0;
        f.validate().unwrap();
        f.alcohol_percentage = 100.0;
        f.validate().unwrap();
    }

    #[test]
    fn priced_item_derives_unit_price_and_drops_blank_urls() {
        let mut f = valid_fields();
        f.image_url = Some("  ".into());
        let priced = PricedItem::new(f, Utc::now()).unwrap();
        assert_eq!(priced.price_per_liter(), 65.70);
        assert_eq!(priced.fields().image_url, None);
    }

    #[test]
    fn merge_scraped_keeps_values_not_returned() {
        let mut draft = valid_fields();
        draft.merge_scraped(&ScrapedProduct {
            price: Some(49.0),
            brand: Some("".into()),
            ..Default::default()
        });
        assert_eq!(draft.price, 49.0);
        assert_eq!(draft.brand, "Jameson");
        assert_eq!(draft.name, "Jameson Irish Whiskey");
        assert_eq!(draft.size_ml, 700.0);
    }

    #[test]
    fn usable_price_rejects_zero_and_missing() {
        let mut p = ScrapedProduct::default();
        assert_eq!(p.usable_price(), None);
        p.price = Some(0.0);
        assert_eq!(p.usable_price(), None);
        p.price = Some(-3.0);
        assert_eq!(p.usable_price(), None);
        p.price = Some(12.5);
        assert_eq!(p.usable_price(), Some(12.5));
    }

    #[test]
    fn item_serializes_with_wire_names() {
        let priced = PricedItem::new(valid_fields(), Utc::now()).unwrap();
        let item = InventoryItem::from_priced("1".into(), "u".into(), &priced);
        let v = serde_json::to_value(&item).unwrap();
        assert_eq!(v["type"], "Whiskey");
        assert_eq!(v["sizeMilliliters"], 700.0);
        assert_eq!(v["pricePerLiter"], 65.70);
        assert!(v.get("lastUpdated").is_some());
    }

    #[test]
    fn label_includes_name_when_present() {
        let priced = PricedItem::new(valid_fields(), Utc::now()).unwrap();
        let mut item = InventoryItem::from_priced("7".into(), "u".into(), &priced);
        assert_eq!(item.label(), "item 7 (Jameson Irish Whiskey)");
        item.name.clear();
        assert_eq!(item.label(), "item 7");
    }
}
