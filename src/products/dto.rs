use serde::{Deserialize, Serialize};

use crate::products::repo::Product;

/// `price` arrives as a JSON number or a numeric string; both coerce.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    /// Coerced value when it parses and is strictly positive.
    pub fn as_positive(&self) -> Option<f64> {
        let value = match self {
            PriceInput::Number(n) => Some(*n),
            PriceInput::Text(s) => s.trim().parse::<f64>().ok(),
        }?;
        (value.is_finite() && value > 0.0).then_some(value)
    }
}

/// Body of `POST /products`, validated field-by-field; the first failing
/// field's message is surfaced verbatim.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Fully validated creation payload.
#[derive(Debug)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub sku: String,
    pub description: Option<String>,
}

impl CreateProduct {
    pub fn validate(self) -> Result<NewProduct, String> {
        let name = require(self.name, "Name is required")?;
        let price = self
            .price
            .as_ref()
            .and_then(PriceInput::as_positive)
            .ok_or_else(|| "Price must be > 0".to_string())?;
        let category = require(self.category, "Category is required")?;
        let sku = require(self.sku, "SKU is required")?;
        Ok(NewProduct {
            name,
            price,
            category,
            sku,
            description: self.description,
        })
    }
}

/// Body of `PUT /products/{id}`: the same rules as creation, all optional.
#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Validated partial update. Absent fields keep their stored value.
#[derive(Debug, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
}

impl UpdateProduct {
    pub fn validate(self) -> Result<ProductPatch, String> {
        let name = require_if_present(self.name, "Name is required")?;
        let price = match self.price {
            Some(p) => Some(p.as_positive().ok_or_else(|| "Price must be > 0".to_string())?),
            None => None,
        };
        let category = require_if_present(self.category, "Category is required")?;
        let sku = require_if_present(self.sku, "SKU is required")?;
        Ok(ProductPatch {
            name,
            price,
            category,
            sku,
            description: self.description,
        })
    }
}

fn require(value: Option<String>, message: &str) -> Result<String, String> {
    value
        .filter(|s| !s.is_empty())
        .ok_or_else(|| message.to_string())
}

fn require_if_present(value: Option<String>, message: &str) -> Result<Option<String>, String> {
    match value {
        Some(s) if s.is_empty() => Err(message.to_string()),
        other => Ok(other),
    }
}

/// Query string of `GET /products`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl ListParams {
    /// Out-of-range values clamp rather than reject: page >= 1, 1 <= limit <= 50.
    pub fn clamped(&self) -> (i64, i64) {
        (self.page.max(1), self.limit.clamp(1, 50))
    }
}

#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct DeleteAck {
    pub ok: bool,
}
