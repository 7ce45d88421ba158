//! Conversions between store documents and the typed product schema.
//!
//! Every product read goes through [`convert_product`], which is the only
//! place legacy layouts and out-of-range counters are dealt with.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};
use vitrine_core::{Category, ColorStock, MAX_PRODUCT_IMAGES, Product, ProductId};

use crate::catalog::CatalogError;

/// Swatch used for colours migrated from the flat stock layout.
pub const NEUTRAL_COLOR_CODE: &str = "#cccccc";

/// Top-level field of the legacy flat `{color: count}` layout.
pub const LEGACY_STOCK_FIELD: &str = "stock";

/// Product document as stored, after the value wrappers are stripped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    category: String,
    #[serde(default)]
    images: Vec<Value>,
    #[serde(default)]
    colors: Option<BTreeMap<String, ColorDocument>>,
    /// Legacy layout: `{color: count}` with no swatch codes.
    #[serde(default)]
    stock: Option<BTreeMap<String, Value>>,
    #[serde(default = "default_active")]
    active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
struct ColorDocument {
    #[serde(default)]
    code: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    stock: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    reserved: u32,
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_from_value(&value))
}

/// Stock counter from any numeric-ish value. Negatives clamp to zero.
#[allow(clippy::cast_possible_truncation)]
fn count_from_value(value: &Value) -> u32 {
    let raw = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.floor() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    raw.map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
}

fn price_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn invalid(id: &str, reason: impl Into<String>) -> CatalogError {
    CatalogError::InvalidDocument {
        id: id.to_owned(),
        reason: reason.into(),
    }
}

/// Convert decoded document fields into a [`Product`].
///
/// # Errors
///
/// Returns `InvalidDocument` when the document has no name, no usable image,
/// or a missing or negative price.
pub fn convert_product(id: &str, fields: Map<String, Value>) -> Result<Product, CatalogError> {
    let doc: ProductDocument =
        serde_json::from_value(Value::Object(fields)).map_err(|e| invalid(id, e.to_string()))?;

    let name = doc.name.trim().to_owned();
    if name.is_empty() {
        return Err(invalid(id, "missing name"));
    }

    let price = price_from_value(&doc.price)
        .filter(|p| !p.is_sign_negative())
        .ok_or_else(|| invalid(id, "missing or negative price"))?;

    let images: Vec<String> = doc
        .images
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .take(MAX_PRODUCT_IMAGES)
        .map(str::to_owned)
        .collect();
    if images.is_empty() {
        return Err(invalid(id, "no images"));
    }

    let mut colors: BTreeMap<String, ColorStock> = doc
        .colors
        .unwrap_or_default()
        .into_iter()
        .map(|(color, entry)| {
            let code = entry
                .code
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| NEUTRAL_COLOR_CODE.to_owned());
            (color, ColorStock::new(code, entry.stock, entry.reserved))
        })
        .collect();
    // Flat entries fill in colours the map does not know yet.
    if let Some(flat) = doc.stock {
        tracing::debug!(product_id = id, "Migrating flat stock layout");
        for (color, count) in flat {
            colors.entry(color).or_insert_with(|| {
                ColorStock::new(NEUTRAL_COLOR_CODE, count_from_value(&count), 0)
            });
        }
    }

    Ok(Product {
        id: ProductId::new(id),
        name,
        price,
        category: Category::from(doc.category),
        images,
        colors,
        active: doc.active,
    })
}

/// One colour entry as stored.
#[must_use]
pub fn color_value(color: &ColorStock) -> Value {
    json!({
        "code": color.code,
        "stock": color.stock(),
        "reserved": color.reserved(),
    })
}

/// The whole `colors` map as stored.
#[must_use]
pub fn colors_value(colors: &BTreeMap<String, ColorStock>) -> Value {
    Value::Object(
        colors
            .iter()
            .map(|(name, color)| (name.clone(), color_value(color)))
            .collect(),
    )
}

/// Plain JSON fields for a product document, timestamps included.
#[must_use]
pub fn product_fields(product: &Product, now: DateTime<Utc>) -> Map<String, Value> {
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

    let mut fields = Map::new();
    fields.insert("name".to_owned(), json!(product.name));
    fields.insert("price".to_owned(), price_to_value(product.price));
    fields.insert("category".to_owned(), json!(product.category.as_str()));
    fields.insert("images".to_owned(), json!(product.images));
    fields.insert("colors".to_owned(), colors_value(&product.colors));
    fields.insert("active".to_owned(), json!(product.active));
    fields.insert("createdAt".to_owned(), json!(timestamp));
    fields.insert("updatedAt".to_owned(), json!(timestamp));
    fields
}

// Prices are stored as plain numbers so other readers can sort on them.
fn price_to_value(price: Decimal) -> Value {
    let normalized = price.normalize();
    if normalized.scale() == 0 {
        i64::try_from(normalized.mantissa())
            .map_or_else(|_| json!(normalized.to_string()), |n| json!(n))
    } else {
        normalized
            .to_string()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| json!(normalized.to_string()), Value::Number)
    }
}

/// Field path of a colour's entry, quoted so any colour name is a valid segment.
#[must_use]
pub fn color_field_path(color: &str) -> String {
    let escaped = color.replace('\\', "\\\\").replace('`', "\\`");
    format!("colors.`{escaped}`")
}
