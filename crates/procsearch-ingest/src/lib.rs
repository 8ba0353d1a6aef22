#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Raw source items -> [`Listing`] conversion.
//!
//! The HTTP clients that fetch announcements and catalog pages live outside
//! this workspace; what arrives here is their already-fetched JSON. The two
//! source shapes (public-bid announcements and commerce catalog items) carry
//! different fields and different price conventions, so each gets its own
//! converter onto the unified listing schema. Conversion is lenient: a field
//! that is missing or malformed becomes a zero/empty value, never an error —
//! a half-described listing still deserves to be indexed.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use procsearch_core::types::{Listing, Price};
use procsearch_normalize::TextPreprocessor;

pub const BID_SOURCE: &str = "bid";
pub const CATALOG_SOURCE: &str = "catalog";

const FALLBACK_CATEGORY: &str = "기타";

/// Standard category -> keywords that map source wording onto it.
fn category_mappings() -> &'static [(&'static str, &'static [&'static str])] {
    &[
        ("사무용품", &["사무/문구용품", "사무용품", "오피스", "문구"]),
        ("가구", &["가구/인테리어", "책상/의자", "가구", "인테리어"]),
        ("전자제품", &["가전디지털", "컴퓨터", "전자제품", "IT"]),
        ("건설자재", &["건설/시설", "건축자재", "건설", "시설"]),
        ("차량", &["차량/운송", "자동차", "운송장비", "차량"]),
    ]
}

pub struct SourceIntegrator {
    preprocessor: Arc<TextPreprocessor>,
    number_pattern: Regex,
}

impl SourceIntegrator {
    pub fn new(preprocessor: Arc<TextPreprocessor>) -> Result<Self> {
        Ok(Self { preprocessor, number_pattern: Regex::new(r"[\d,]+")? })
    }

    /// Converts a batch of public-bid announcement items.
    pub async fn bid_listings(&self, items: &[Value]) -> Vec<Listing> {
        let mut listings = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            listings.push(self.bid_listing(item, position).await);
        }
        tracing::info!(count = listings.len(), "bid announcements converted");
        listings
    }

    /// Converts a batch of commerce catalog items.
    pub async fn catalog_listings(&self, items: &[Value]) -> Vec<Listing> {
        let mut listings = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            listings.push(self.catalog_listing(item, position).await);
        }
        tracing::info!(count = listings.len(), "catalog items converted");
        listings
    }

    /// Converts one public-bid announcement. `position` seeds the synthetic
    /// id when the item carries none.
    pub async fn bid_listing(&self, item: &Value, position: usize) -> Listing {
        let title = str_field(item, "title");
        let budget = self.number_value(item.get("budget"));
        let name = self.preprocessor.process(&title).await;

        let industry_code = str_field(item, "industry_code");
        let mut category = vec![main_category_for(&title).to_string()];
        if !industry_code.is_empty() {
            category.push(industry_code.clone());
        }

        let specifications = spec_map(&[
            ("입찰방식", str_field(item, "bid_method")),
            ("계약형태", str_field(item, "contract_type")),
            ("업종코드", industry_code),
            ("지역", str_field(item, "region_code")),
        ]);

        let mut metadata = HashMap::new();
        for key in ["organization", "announcement_number", "deadline"] {
            let value = str_field(item, key);
            if !value.is_empty() {
                metadata.insert(key.to_string(), Value::String(value));
            }
        }
        let announcement_date = str_field(item, "announcement_date");
        if !announcement_date.is_empty() {
            metadata.insert("announcement_date".to_string(), Value::String(announcement_date.clone()));
            if let Some(date) = parse_date(&announcement_date) {
                metadata.insert(
                    "announcement_date_iso".to_string(),
                    Value::String(date.format("%Y-%m-%d").to_string()),
                );
            }
        }
        metadata.insert("procurement_type".to_string(), Value::String("public_bid".to_string()));

        Listing {
            id: id_or_synthetic(item, BID_SOURCE, position),
            source: BID_SOURCE.to_string(),
            name,
            price: Price::krw(budget),
            category,
            specifications,
            metadata,
        }
    }

    /// Converts one commerce catalog item.
    pub async fn catalog_listing(&self, item: &Value, position: usize) -> Listing {
        let raw_name = str_field(item, "name");
        let price = self.number_value(item.get("price"));
        let name = self.preprocessor.process(&raw_name).await;

        let category_name = str_field(item, "category_name");
        let category = if category_name.is_empty() {
            vec![FALLBACK_CATEGORY.to_string()]
        } else {
            let main = main_category_for(&category_name);
            if main == FALLBACK_CATEGORY {
                vec![category_name.clone()]
            } else {
                vec![main.to_string(), category_name.clone()]
            }
        };

        let mut spec_pairs = vec![
            ("판매자".to_string(), str_field(item, "vendor_name")),
            ("평점".to_string(), num_field_string(item, "rating")),
            ("리뷰수".to_string(), num_field_string(item, "review_count")),
            ("배송비".to_string(), num_field_string(item, "delivery_fee")),
        ];
        let original_price = self.number_value(item.get("original_price"));
        if original_price > price && price > 0.0 {
            spec_pairs.push(("정가".to_string(), format!("{original_price}")));
            spec_pairs.push(("할인율".to_string(), num_field_string(item, "discount_rate")));
        }
        let specifications = spec_map(
            &spec_pairs.iter().map(|(k, v)| (k.as_str(), v.clone())).collect::<Vec<_>>(),
        );

        let mut metadata = HashMap::new();
        for key in ["product_id", "url", "image_url", "vendor_name"] {
            let value = str_field(item, key);
            if !value.is_empty() {
                let meta_key = if key == "vendor_name" { "vendor" } else { key };
                metadata.insert(meta_key.to_string(), Value::String(value));
            }
        }
        metadata.insert("procurement_type".to_string(), Value::String("commercial".to_string()));

        Listing {
            id: id_or_synthetic(item, CATALOG_SOURCE, position),
            source: CATALOG_SOURCE.to_string(),
            name,
            price: Price::krw(price),
            category,
            specifications,
            metadata,
        }
    }

    /// Numbers arrive either as JSON numbers or as formatted strings
    /// ("5,000,000원"); both resolve to the first numeric run.
    fn number_value(&self, value: Option<&Value>) -> f64 {
        match value {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => self.extract_number(s),
            _ => 0.0,
        }
    }

    fn extract_number(&self, text: &str) -> f64 {
        self.number_pattern
            .find(text)
            .map(|m| m.as_str().replace(',', ""))
            .and_then(|digits| digits.parse::<f64>().ok())
            .unwrap_or(0.0)
    }
}

/// First standard category whose keywords appear in `text`.
fn main_category_for(text: &str) -> &'static str {
    let haystack = text.to_lowercase();
    for (main, keywords) in category_mappings() {
        if keywords.iter().any(|k| haystack.contains(&k.to_lowercase())) {
            return main;
        }
    }
    FALLBACK_CATEGORY
}

/// Supported announcement date shapes, tried in order.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    for format in ["%Y%m%d", "%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    None
}

fn str_field(item: &Value, key: &str) -> String {
    item.get(key).and_then(Value::as_str).unwrap_or("").to_string()
}

fn num_field_string(item: &Value, key: &str) -> String {
    match item.get(key) {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn spec_map(pairs: &[(&str, String)]) -> HashMap<String, String> {
    pairs
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

fn id_or_synthetic(item: &Value, source: &str, position: usize) -> String {
    let id = str_field(item, "id");
    if id.is_empty() {
        format!("{source}_{position}")
    } else {
        id
    }
}
