//! Structured query bodies for `:runQuery`.

use serde_json::{Value, json};
use vitrine_core::Category;

/// Collection holding product documents.
pub const PRODUCTS_COLLECTION: &str = "products";
/// Collection and document ID of the site settings.
pub const SETTINGS_COLLECTION: &str = "settings";
pub const SETTINGS_DOCUMENT: &str = "siteSettings";

fn equal(field: &str, value: Value) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": field },
            "op": "EQUAL",
            "value": value,
        }
    })
}

/// Query for active products, optionally restricted to a category.
#[must_use]
pub fn active_products(category: Option<&Category>) -> Value {
    let active = equal("active", json!({ "booleanValue": true }));

    let filter = match category {
        None => active,
        Some(category) => json!({
            "compositeFilter": {
                "op": "AND",
                "filters": [
                    active,
                    equal("category", json!({ "stringValue": category.as_str() })),
                ],
            }
        }),
    };

    json!({
        "structuredQuery": {
            "from": [{ "collectionId": PRODUCTS_COLLECTION }],
            "where": filter,
        }
    })
}

/// Query for every product, active or not. Used by operator listings.
#[must_use]
pub fn all_products() -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": PRODUCTS_COLLECTION }],
        }
    })
}
