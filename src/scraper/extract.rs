//! Text extraction from retailer product pages.
//!
//! Retailer markup is loose and changes often, so these work on raw HTML with
//! a handful of patterns rather than a DOM.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ScrapedProduct;

static WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));
static NON_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<!--.*?-->").expect("valid regex")
});
static H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>").expect("valid regex"));
static H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h2\b[^>]*>(.*?)</h2>").expect("valid regex"));
static PRICE_SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span\b[^>]*class\s*=\s*["'][^"']*(?:price|amount)[^"']*["'][^>]*>(.*?)</span>"#)
        .expect("valid regex")
});
static DOLLAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\s*\d[\d,]*(?:\.\d+)?").expect("valid regex"));
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.?\d*").expect("valid regex"));
static ML: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*ml").expect("valid regex"));
static LITRE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*l(?:itre)?").expect("valid regex"));
static PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("valid regex"));
static PRODUCT_IMG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*\bsrc\s*=\s*["']([^"']*(?:product|item)[^"']*)["']"#)
        .expect("valid regex")
});

/// Trim and collapse runs of whitespace.
pub fn clean_text(text: &str) -> String {
    WS.replace_all(text.trim(), " ").into_owned()
}

/// Remove tags, scripts and comments, then clean whitespace.
pub fn strip_tags(html: &str) -> String {
    let without_code = NON_TEXT.replace_all(html, " ");
    let text = TAG.replace_all(&without_code, " ");
    clean_text(&decode_entities(&text))
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// First number in the text, ignoring currency symbols and thousands separators.
pub fn extract_price(text: &str) -> Option<f64> {
    let compact = text.replace(',', "");
    NUMBER
        .find(&compact)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Container size in milliliters. `ml` wins over liters; fractional ml are truncated.
pub fn extract_volume_ml(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    if let Some(c) = ML.captures(&lower) {
        return c[1].parse::<f64>().ok().map(f64::trunc);
    }
    LITRE
        .captures(&lower)
        .and_then(|c| c[1].parse::<f64>().ok())
        .map(|l| (l * 1000.0).trunc())
}

pub fn extract_alcohol_percentage(text: &str) -> Option<f64> {
    PERCENT
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
}

pub fn extract_name(html: &str) -> Option<String> {
    H1.captures(html)
        .or_else(|| H2.captures(html))
        .map(|c| strip_tags(&c[1]))
        .filter(|s| !s.is_empty())
}

fn extract_price_text(html: &str) -> Option<String> {
    if let Some(c) = PRICE_SPAN.captures(html) {
        let text = strip_tags(&c[1]);
        if !text.is_empty() {
            return Some(text);
        }
    }
    DOLLAR.find(html).map(|m| m.as_str().to_string())
}

pub fn extract_image_url(html: &str) -> Option<String> {
    PRODUCT_IMG.captures(html).map(|c| c[1].trim().to_string())
}

/// Pull every attribute we know how to find out of a product page.
pub fn parse_product(html: &str) -> ScrapedProduct {
    let name = extract_name(html);
    let brand = name
        .as_deref()
        .and_then(|n| n.split_whitespace().next())
        .map(str::to_string);
    let price = extract_price_text(html).and_then(|t| extract_price(&t));

    let page_text = format!("{} {}", name.as_deref().unwrap_or(""), strip_tags(html));

    ScrapedProduct {
        name,
        brand,
        price,
        size_ml: extract_volume_ml(&page_text),
        alcohol_percentage: extract_alcohol_percentage(&page_text),
        image_url: extract_image_url(html),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><head><title>BWS</title><script>var x = "99 ml";</script></head>
        <body>
          <img src="/static/logo.png">
          <img class="hero" src="https://cdn.bws.com.au/product/jameson-700.jpg">
          <h1 class="title">  Jameson   Irish
              Whiskey 700mL </h1>
          <div class="pricing"><span class="product-price">$45.99</span></div>
          <p>Alcohol 40% vol</p>
        </body></html>"#;

    #[test]
    fn parses_full_product_page() {
        let p = parse_product(PAGE);
        assert_eq!(p.name.as_deref(), Some("Jameson Irish Whiskey 700mL"));
        assert_eq!(p.brand.as_deref(), Some("Jameson"));
        assert_eq!(p.price, Some(45.99));
        assert_eq!(p.size_ml, Some(700.0));
        assert_eq!(p.alcohol_percentage, Some(40.0));
        assert_eq!(
            p.image_url.as_deref(),
            Some("https://cdn.bws.com.au/product/jameson-700.jpg")
        );
    }

    #[test]
    fn falls_back_to_h2_and_dollar_text() {
        let html = "<h2>Tanqueray <b>Gin</b></h2><div>Now only $1,049.50 each</div><p>1.5L</p>";
        let p = parse_product(html);
        assert_eq!(p.name.as_deref(), Some("Tanqueray Gin"));
        assert_eq!(p.price, Some(1049.5));
        assert_eq!(p.size_ml, Some(1500.0));
        assert_eq!(p.alcohol_percentage, None);
        assert_eq!(p.image_url, None);
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert_eq!(parse_product("<html><body></body></html>"), ScrapedProduct::default());
    }

    #[test]
    fn price_ignores_symbols_and_commas() {
        assert_eq!(extract_price("$1,299.00"), Some(1299.0));
        assert_eq!(extract_price("AUD 65"), Some(65.0));
        assert_eq!(extract_price("free"), None);
        assert_eq!(extract_price(""), None);
    }

    #[test]
    fn volume_prefers_ml_then_litres() {
        assert_eq!(extract_volume_ml("Bottle 750 ML"), Some(750.0));
        assert_eq!(extract_volume_ml("375.5ml"), Some(375.0));
        assert_eq!(extract_volume_ml("1 Litre cask"), Some(1000.0));
        assert_eq!(extract_volume_ml("no size here"), None);
    }

    #[test]
    fn alcohol_percentage_reads_first_match() {
        assert_eq!(extract_alcohol_percentage("ABV 37.5 % then 40%"), Some(37.5));
        assert_eq!(extract_alcohol_percentage("none"), None);
    }

    #[test]
    fn clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a \n\t b  "), "a b");
        assert_eq!(strip_tags("<p>Gin &amp; <i>Tonic</i></p>"), "Gin & Tonic");
    }
}
