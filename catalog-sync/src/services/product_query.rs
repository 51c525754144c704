//! Live (non-bulk) product lookup against the source store

use catalog_common::config::StoreEndpoint;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::SyncError;
use crate::models::GraphqlRequest;
use crate::services::transport::{execute, GraphqlTransport};

const RECENT_PRODUCTS_QUERY: &str = r#"query recentProducts($first: Int!) {
  products(first: $first) {
    edges {
      node {
        id
        title
        handle
        vendor
        productType
        tags
      }
    }
  }
}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEdge {
    pub node: ProductNode,
}

#[derive(Debug, Deserialize)]
struct ProductsData {
    products: ProductConnection,
}

#[derive(Debug, Deserialize)]
struct ProductConnection {
    #[serde(default)]
    edges: Vec<ProductEdge>,
}

pub fn build_recent_products_request(first: u32) -> GraphqlRequest {
    GraphqlRequest::with_variables(RECENT_PRODUCTS_QUERY, json!({ "first": first }))
}

/// First `first` products of the source store, in store order
pub async fn fetch_recent_products(
    transport: &dyn GraphqlTransport,
    source: &StoreEndpoint,
    first: u32,
) -> Result<Vec<ProductEdge>, SyncError> {
    let data: ProductsData =
        execute(transport, source, &build_recent_products_request(first)).await?;
    Ok(data.products.edges)
}
