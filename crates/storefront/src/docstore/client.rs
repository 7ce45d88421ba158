//! Document store REST client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument, warn};
use url::Url;
use vitrine_core::{Category, ColorStock, Product, ProductId, SiteSettings};

use super::DocumentStoreError;
use super::conversions::{
    LEGACY_STOCK_FIELD, NEUTRAL_COLOR_CODE, color_field_path, color_value, colors_value,
    convert_product, product_fields,
};
use super::queries::{
    PRODUCTS_COLLECTION, SETTINGS_COLLECTION, SETTINGS_DOCUMENT, active_products, all_products,
};
use super::value::{decode_fields, encode_fields};
use crate::catalog::{CatalogError, CatalogSource};
use crate::config::DocStoreConfig;

/// Attempts for a read-modify-write before giving up on contention.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// Raw document as returned by the REST API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    /// Full resource name, ending in `{collection}/{id}`.
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    update_time: Option<String>,
}

impl Document {
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Write guard sent as `currentDocument.*`.
#[derive(Debug, Clone, Copy)]
enum Precondition<'a> {
    None,
    Exists,
    UpdateTime(&'a str),
}

// =============================================================================
// DocumentStoreClient
// =============================================================================

/// Client for the document store REST API.
///
/// Cheap to clone; clones share one HTTP connection pool.
#[derive(Clone)]
pub struct DocumentStoreClient {
    inner: Arc<DocumentStoreClientInner>,
}

struct DocumentStoreClientInner {
    client: reqwest::Client,
    documents_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for DocumentStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStoreClient")
            .field("documents_url", &self.inner.documents_url)
            .finish_non_exhaustive()
    }
}

impl DocumentStoreClient {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `Url` if the configured endpoint is not a valid URL.
    pub fn new(config: &DocStoreConfig) -> Result<Self, DocumentStoreError> {
        let documents_url = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            config.base_url.trim_end_matches('/'),
            config.project_id
        );
        Url::parse(&documents_url)?;

        Ok(Self {
            inner: Arc::new(DocumentStoreClientInner {
                client: reqwest::Client::new(),
                documents_url,
                api_key: config.api_key.clone(),
            }),
        })
    }

    fn url(&self, suffix: &str, params: &[(&str, &str)]) -> Result<Url, DocumentStoreError> {
        let mut url = Url::parse(&format!("{}{suffix}", self.inner.documents_url))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", self.inner.api_key.expose_secret());
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn document_suffix(collection: &str, id: &str) -> String {
        format!("/{collection}/{}", urlencoding::encode(id))
    }

    /// Send a request and return the response body.
    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        resource: &str,
    ) -> Result<String, DocumentStoreError> {
        let mut request = self.inner.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let response_text = response.text().await?;

        if status.is_success() {
            return Ok(response_text);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(DocumentStoreError::NotFound(resource.to_owned()));
        }

        let detail = serde_json::from_str::<ErrorEnvelope>(&response_text)
            .map(|envelope| envelope.error)
            .unwrap_or_default();
        if detail.status == "FAILED_PRECONDITION" || status == StatusCode::CONFLICT {
            return Err(DocumentStoreError::PreconditionFailed(resource.to_owned()));
        }

        tracing::error!(
            status = %status,
            body = %response_text.chars().take(500).collect::<String>(),
            "Document store returned non-success status"
        );
        Err(DocumentStoreError::Status {
            status: status.as_u16(),
            message: if detail.message.is_empty() {
                response_text.chars().take(200).collect()
            } else {
                detail.message
            },
        })
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Document, DocumentStoreError> {
        let url = self.url(&Self::document_suffix(collection, id), &[])?;
        let resource = format!("{collection}/{id}");
        let body = self.execute(Method::GET, url, None, &resource).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn run_query(&self, query: &Value) -> Result<Vec<Document>, DocumentStoreError> {
        let url = self.url(":runQuery", &[])?;
        let body = self
            .execute(Method::POST, url, Some(query), "runQuery")
            .await?;
        let results: Vec<QueryResult> = serde_json::from_str(&body)?;
        Ok(results.into_iter().filter_map(|r| r.document).collect())
    }

    /// Update `mask` fields of a document from plain JSON `fields`.
    ///
    /// Masked paths absent from `fields` are deleted. With no mask the whole
    /// document is replaced (and created if missing).
    async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: &Map<String, Value>,
        mask: &[String],
        precondition: Precondition<'_>,
    ) -> Result<Document, DocumentStoreError> {
        let mut params: Vec<(&str, &str)> = mask
            .iter()
            .map(|path| ("updateMask.fieldPaths", path.as_str()))
            .collect();
        match precondition {
            Precondition::None => {}
            Precondition::Exists => params.push(("currentDocument.exists", "true")),
            Precondition::UpdateTime(time) => params.push(("currentDocument.updateTime", time)),
        }

        let url = self.url(&Self::document_suffix(collection, id), &params)?;
        let body = json!({ "fields": encode_fields(fields) });
        let resource = format!("{collection}/{id}");
        let response = self
            .execute(Method::PATCH, url, Some(&body), &resource)
            .await?;
        Ok(serde_json::from_str(&response)?)
    }

    fn to_product(document: &Document) -> Result<Product, CatalogError> {
        let fields = decode_fields(&document.fields).map_err(|e| CatalogError::InvalidDocument {
            id: document.id().to_owned(),
            reason: e.to_string(),
        })?;
        convert_product(document.id(), fields)
    }

    fn to_products(documents: &[Document]) -> Vec<Product> {
        documents
            .iter()
            .filter_map(|document| match Self::to_product(document) {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid product document");
                    None
                }
            })
            .collect()
    }

    fn now() -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Fields and mask that store `color` of an updated product.
    ///
    /// Only the `changed` subfields are written, and a colour missing from
    /// `product` is deleted. A document still carrying the flat stock map
    /// gets the whole merged `colors` map instead and loses the flat map.
    fn color_write(
        document: &Document,
        product: &Product,
        color: &str,
        changed: &[&str],
    ) -> (Map<String, Value>, Vec<String>) {
        let mut fields = Map::new();
        if document.fields.contains_key(LEGACY_STOCK_FIELD) {
            fields.insert("colors".to_owned(), colors_value(&product.colors));
            return (
                fields,
                vec!["colors".to_owned(), LEGACY_STOCK_FIELD.to_owned()],
            );
        }

        let path = color_field_path(color);
        let Some(entry) = product.color(color) else {
            return (fields, vec![path]);
        };
        let stored = color_value(entry);
        let mut selected = Map::new();
        let mut mask = Vec::with_capacity(changed.len());
        for name in changed {
            if let Some(value) = stored.get(*name) {
                selected.insert((*name).to_owned(), value.clone());
                mask.push(format!("{path}.{name}"));
            }
        }
        let mut colors = Map::new();
        colors.insert(color.to_owned(), Value::Object(selected));
        fields.insert("colors".to_owned(), Value::Object(colors));
        (fields, mask)
    }

    /// Read-modify-write of one colour of a product.
    ///
    /// `apply` edits the product and names the subfields of `color` it
    /// changed. The write is guarded by the document's update time and
    /// retried when another writer got there first.
    async fn update_color<F>(
        &self,
        id: &ProductId,
        color: &str,
        touch: bool,
        mut apply: F,
    ) -> Result<Product, CatalogError>
    where
        F: FnMut(&mut Product) -> Result<Vec<&'static str>, CatalogError> + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let document = self.get_document(PRODUCTS_COLLECTION, id.as_str()).await?;
            let mut product = Self::to_product(&document)?;
            let changed = apply(&mut product)?;

            let (mut fields, mut mask) = Self::color_write(&document, &product, color, &changed);
            if touch {
                fields.insert("updatedAt".to_owned(), json!(Self::now()));
                mask.push("updatedAt".to_owned());
            }
            let precondition = document
                .update_time
                .as_deref()
                .map_or(Precondition::Exists, Precondition::UpdateTime);

            match self
                .patch_document(PRODUCTS_COLLECTION, id.as_str(), &fields, &mask, precondition)
                .await
            {
                Ok(_) => return Ok(product),
                Err(DocumentStoreError::PreconditionFailed(_)) => {
                    warn!(attempt, color, "Product changed during colour write, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CatalogError::Unavailable(format!(
            "colour write for {id} lost {MAX_WRITE_ATTEMPTS} races"
        )))
    }

    // =========================================================================
    // Operator writes
    // =========================================================================

    /// Every product, active or not, for operator listings.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all_products(&self) -> Result<Vec<Product>, CatalogError> {
        let documents = self.run_query(&all_products()).await?;
        Ok(Self::to_products(&documents))
    }

    /// Create a product document and return its ID.
    ///
    /// A blank `product.id` lets the store assign one.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the write fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, product: &Product) -> Result<ProductId, CatalogError> {
        let fields = product_fields(product, Utc::now());
        let params: Vec<(&str, &str)> = if product.id.as_str().is_empty() {
            Vec::new()
        } else {
            vec![("documentId", product.id.as_str())]
        };

        let url = self.url(&format!("/{PRODUCTS_COLLECTION}"), &params)?;
        let body = json!({ "fields": encode_fields(&fields) });
        let response = self
            .execute(Method::POST, url, Some(&body), PRODUCTS_COLLECTION)
            .await?;
        let document: Document = serde_json::from_str(&response).map_err(DocumentStoreError::from)?;

        debug!(product_id = document.id(), "Created product");
        Ok(ProductId::new(document.id()))
    }

    /// Replace the editable fields of an existing product.
    ///
    /// Creation time is kept. A leftover flat stock map is dropped, since
    /// `product.colors` already holds its merged contents.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn update_product(&self, product: &Product) -> Result<(), CatalogError> {
        let mut fields = product_fields(product, Utc::now());
        fields.remove("createdAt");
        let mut mask: Vec<String> = fields.keys().cloned().collect();
        mask.push(LEGACY_STOCK_FIELD.to_owned());

        self.patch_document(
            PRODUCTS_COLLECTION,
            product.id.as_str(),
            &fields,
            &mask,
            Precondition::Exists,
        )
        .await?;
        Ok(())
    }

    /// Set the stock of one colour, adding the colour if it is new.
    ///
    /// `code` replaces the swatch; a new colour without one gets the neutral
    /// swatch. Reserved units above the new stock are released.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_color_stock(
        &self,
        id: &ProductId,
        color: &str,
        stock: u32,
        code: Option<&str>,
    ) -> Result<(), CatalogError> {
        let code_given = code.is_some();
        self.update_color(id, color, true, |product| {
            let (current_code, reserved) = product
                .color(color)
                .map(|c| (Some(c.code.clone()), c.reserved()))
                .unwrap_or_default();
            let is_new = current_code.is_none();
            let code = code
                .map(str::to_owned)
                .or(current_code)
                .unwrap_or_else(|| NEUTRAL_COLOR_CODE.to_owned());
            product
                .colors
                .insert(color.to_owned(), ColorStock::new(code, stock, reserved));

            let mut changed = vec!["stock", "reserved"];
            if is_new || code_given {
                changed.push("code");
            }
            Ok(changed)
        })
        .await?;
        Ok(())
    }

    /// Delete one colour from a product. Deleting an absent colour succeeds.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_color(&self, id: &ProductId, color: &str) -> Result<(), CatalogError> {
        self.update_color(id, color, true, |product| {
            product.colors.remove(color);
            Ok(Vec::new())
        })
        .await?;
        Ok(())
    }

    /// Soft-delete a product: it stays readable but is no longer listed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn deactivate_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        let mut fields = Map::new();
        fields.insert("active".to_owned(), json!(false));
        fields.insert("updatedAt".to_owned(), json!(Self::now()));
        let mask = ["active".to_owned(), "updatedAt".to_owned()];

        self.patch_document(
            PRODUCTS_COLLECTION,
            id.as_str(),
            &fields,
            &mask,
            Precondition::Exists,
        )
        .await?;
        Ok(())
    }

    /// Replace the site settings document.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the write fails.
    #[instrument(skip(self, settings))]
    pub async fn save_site_settings(&self, settings: &SiteSettings) -> Result<(), CatalogError> {
        let fields = match serde_json::to_value(settings).map_err(DocumentStoreError::from)? {
            Value::Object(fields) => fields,
            other => {
                return Err(CatalogError::InvalidDocument {
                    id: SETTINGS_DOCUMENT.to_owned(),
                    reason: format!("settings serialized as {other}"),
                });
            }
        };

        self.patch_document(
            SETTINGS_COLLECTION,
            SETTINGS_DOCUMENT,
            &fields,
            &[],
            Precondition::None,
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for DocumentStoreClient {
    #[instrument(skip(self))]
    async fn list_active_products(
        &self,
        category: Option<&Category>,
    ) -> Result<Vec<Product>, CatalogError> {
        let documents = self.run_query(&active_products(category)).await?;
        let products = Self::to_products(&documents);
        debug!(count = products.len(), "Fetched active products");
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let document = self.get_document(PRODUCTS_COLLECTION, id.as_str()).await?;
        Self::to_product(&document)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn decrement_stock(
        &self,
        id: &ProductId,
        color: &str,
        quantity: u32,
    ) -> Result<(), CatalogError> {
        let product = self
            .update_color(id, color, false, |product| {
                let current = product
                    .color(color)
                    .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
                let remaining = current.stock().saturating_sub(quantity);
                let updated = ColorStock::new(current.code.clone(), remaining, current.reserved());

                let mut changed = vec!["stock"];
                if updated.reserved() != current.reserved() {
                    changed.push("reserved");
                }
                product.colors.insert(color.to_owned(), updated);
                Ok(changed)
            })
            .await?;

        let remaining = product.color(color).map_or(0, ColorStock::stock);
        debug!(color, quantity, remaining, "Decremented stock");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_site_settings(&self) -> Result<SiteSettings, CatalogError> {
        let document = match self
            .get_document(SETTINGS_COLLECTION, SETTINGS_DOCUMENT)
            .await
        {
            Ok(document) => document,
            Err(DocumentStoreError::NotFound(_)) => {
                debug!("No settings document, using defaults");
                return Ok(SiteSettings::default());
            }
            Err(e) => return Err(e.into()),
        };

        let invalid = |reason: String| CatalogError::InvalidDocument {
            id: format!("{SETTINGS_COLLECTION}/{SETTINGS_DOCUMENT}"),
            reason,
        };
        let fields = decode_fields(&document.fields).map_err(|e| invalid(e.to_string()))?;
        serde_json::from_value(Value::Object(fields)).map_err(|e| invalid(e.to_string()))
    }
}
