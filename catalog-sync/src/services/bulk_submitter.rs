//! Bulk export submission

use catalog_common::config::StoreEndpoint;
use serde_json::json;
use tracing::{debug, info};

use crate::error::SyncError;
use crate::models::graphql::describe_user_errors;
use crate::models::{BulkOperation, BulkOperationRunQueryData, GraphqlRequest};
use crate::services::transport::{execute, GraphqlTransport};

/// Product export query run remotely by the bulk operation
pub const PRODUCT_EXPORT_QUERY: &str = r#"{
  products {
    edges {
      node {
        id
        title
        handle
        vendor
        productType
        tags
        metafields {
          edges {
            node {
              namespace
              key
              value
            }
          }
        }
      }
    }
  }
}"#;

const BULK_OPERATION_RUN_QUERY: &str = r#"mutation bulkOperationRunQuery($query: String!) {
  bulkOperationRunQuery(query: $query) {
    bulkOperation {
      id
      status
      createdAt
      completedAt
      errorCode
      fileSize
      objectCount
      url
    }
    userErrors {
      field
      message
    }
  }
}"#;

pub fn build_submit_request() -> GraphqlRequest {
    GraphqlRequest::with_variables(
        BULK_OPERATION_RUN_QUERY,
        json!({ "query": PRODUCT_EXPORT_QUERY }),
    )
}

/// Submit the product export job
///
/// Returns `Ok(None)` when the store accepted the call but created no job.
pub async fn submit_bulk_export(
    transport: &dyn GraphqlTransport,
    source: &StoreEndpoint,
) -> Result<Option<BulkOperation>, SyncError> {
    debug!("Submitting bulk product export");

    let data: BulkOperationRunQueryData =
        execute(transport, source, &build_submit_request()).await?;

    let Some(payload) = data.bulk_operation_run_query else {
        return Ok(None);
    };

    if !payload.user_errors.is_empty() {
        return Err(SyncError::RemoteOperation(describe_user_errors(
            &payload.user_errors,
        )));
    }

    if let Some(operation) = &payload.bulk_operation {
        info!(
            operation_id = %operation.id,
            status = operation.status.as_str(),
            "Bulk export submitted"
        );
    }

    Ok(payload.bulk_operation)
}
