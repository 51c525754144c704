//! Product replication into the target store
//!
//! Each product becomes one `productCreate` call. Calls are independent and
//! run through a bounded pool behind a requests-per-second limiter.

use catalog_common::config::{ReplicationConfig, StoreEndpoint};
use catalog_common::events::{CatalogEvent, EventBus};
use chrono::Utc;
use futures::{future, stream, StreamExt};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::graphql::describe_user_errors;
use crate::models::{
    GraphqlRequest, Product, ReplicationOutcome, ReplicationResult, ReplicationSummary, UserError,
};
use crate::services::transport::{execute, GraphqlTransport};

/// Type assigned to every replicated metafield
///
/// The export does not carry the source type, so values are written as
/// single-line text.
pub const METAFIELD_TYPE: &str = "single_line_text_field";

pub const PRODUCT_CREATE_MUTATION: &str = r#"mutation productCreate($input: ProductInput!) {
  productCreate(input: $input) {
    product {
      id
    }
    userErrors {
      field
      message
    }
  }
}"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreateData {
    product_create: Option<ProductCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreatePayload {
    #[serde(default)]
    product: Option<CreatedProduct>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct CreatedProduct {
    id: String,
}

/// Build the creation call for one product
pub fn build_product_create_request(product: &Product) -> GraphqlRequest {
    let mut input = json!({
        "title": product.title,
        "productType": product.product_type,
        "vendor": product.vendor,
        "tags": product.tags.join(","),
    });

    if !product.metafields.is_empty() {
        let metafields: Vec<Value> = product
            .metafields
            .iter()
            .map(|m| {
                json!({
                    "namespace": m.namespace,
                    "key": m.key,
                    "value": m.value,
                    "type": METAFIELD_TYPE,
                })
            })
            .collect();
        input["metafields"] = Value::Array(metafields);
    }

    GraphqlRequest::with_variables(PRODUCT_CREATE_MUTATION, json!({ "input": input }))
}

pub struct Replicator {
    transport: Arc<dyn GraphqlTransport>,
    target: StoreEndpoint,
    rate_limiter: DefaultDirectRateLimiter,
    concurrency: usize,
    event_bus: EventBus,
}

impl Replicator {
    pub fn new(
        transport: Arc<dyn GraphqlTransport>,
        target: StoreEndpoint,
        config: &ReplicationConfig,
        event_bus: EventBus,
    ) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Self {
            transport,
            target,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
            concurrency: config.concurrency.max(1),
            event_bus,
        }
    }

    /// Create one product in the target store
    ///
    /// Never fails as a whole; the outcome says what happened.
    pub async fn replicate_product(&self, product: &Product) -> ReplicationResult {
        self.rate_limiter.until_ready().await;

        let request = build_product_create_request(product);
        let outcome =
            match execute::<ProductCreateData>(self.transport.as_ref(), &self.target, &request)
                .await
            {
                Ok(ProductCreateData {
                    product_create: Some(payload),
                }) => {
                    if !payload.user_errors.is_empty() {
                        ReplicationOutcome::Rejected {
                            user_errors: payload.user_errors,
                        }
                    } else if let Some(created) = payload.product {
                        ReplicationOutcome::Created { new_id: created.id }
                    } else {
                        ReplicationOutcome::Failed {
                            error: "productCreate returned no product".to_string(),
                        }
                    }
                }
                Ok(ProductCreateData {
                    product_create: None,
                }) => ReplicationOutcome::Failed {
                    error: "productCreate returned no payload".to_string(),
                },
                Err(e) => ReplicationOutcome::Failed {
                    error: e.to_string(),
                },
            };

        match &outcome {
            ReplicationOutcome::Created { new_id } => {
                debug!(source_id = %product.id, new_id = %new_id, "Product created")
            }
            ReplicationOutcome::Rejected { user_errors } => warn!(
                source_id = %product.id,
                errors = %describe_user_errors(user_errors),
                "Product rejected by target store"
            ),
            ReplicationOutcome::Failed { error } => {
                warn!(source_id = %product.id, error = %error, "Product replication failed")
            }
        }

        let result = ReplicationResult {
            source_id: product.id.clone(),
            title: product.title.clone(),
            outcome,
        };

        self.event_bus.emit_lossy(CatalogEvent::ProductReplicated {
            source_id: result.source_id.clone(),
            new_id: result.new_id().map(str::to_string),
            success: result.is_created(),
            timestamp: Utc::now(),
        });

        result
    }

    /// Replicate every product, reporting results in input order
    ///
    /// Cancellation stops dispatching further products; calls already in
    /// flight complete and are reported.
    pub async fn replicate_all(
        &self,
        products: &[Product],
        cancel: &CancellationToken,
    ) -> ReplicationSummary {
        info!(
            count = products.len(),
            concurrency = self.concurrency,
            "Replicating products to target store"
        );

        // Owned items keep the stream future `Send` for axum handlers
        let results: Vec<ReplicationResult> = stream::iter(products.iter().cloned())
            .take_while(|_: &Product| future::ready(!cancel.is_cancelled()))
            .map(|product: Product| async move { self.replicate_product(&product).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let cancelled = results.len() < products.len();
        let summary = ReplicationSummary::from_results(products.len(), results, cancelled);

        info!(
            created = summary.created,
            rejected = summary.rejected,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Replication finished"
        );

        self.event_bus.emit_lossy(CatalogEvent::ReplicationCompleted {
            created: summary.created,
            rejected: summary.rejected,
            failed: summary.failed,
            timestamp: Utc::now(),
        });

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metafield;

    fn product() -> Product {
        Product {
            id: "gid://shopify/Product/1".to_string(),
            title: "Shirt \"deluxe\"".to_string(),
            handle: "shirt".to_string(),
            vendor: "Acme".to_string(),
            product_type: "Apparel".to_string(),
            tags: vec![],
            metafields: vec![],
        }
    }

    #[test]
    fn test_no_metafields_key_when_empty() {
        let request = build_product_create_request(&product());
        let input = &request.variables.unwrap()["input"];
        assert!(input.get("metafields").is_none());
        assert_eq!(input["tags"], "");
    }

    #[test]
    fn test_values_are_not_spliced_into_document() {
        let request = build_product_create_request(&product());
        assert!(!request.query.contains("deluxe"));
        assert_eq!(
            request.variables.unwrap()["input"]["title"],
            "Shirt \"deluxe\""
        );
    }

    #[test]
    fn test_metafield_order_preserved() {
        let mut p = product();
        p.metafields = vec![
            Metafield {
                namespace: "custom".to_string(),
                key: "first".to_string(),
                value: "1".to_string(),
            },
            Metafield {
                namespace: "custom".to_string(),
                key: "second".to_string(),
                value: "2".to_string(),
            },
        ];
        let request = build_product_create_request(&p);
        let metafields = request.variables.unwrap()["input"]["metafields"].clone();
        assert_eq!(metafields[0]["key"], "first");
        assert_eq!(metafields[1]["key"], "second");
    }
}
