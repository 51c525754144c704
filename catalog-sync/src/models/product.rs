//! Product aggregates and the flat export records they are rebuilt from

use serde::{Deserialize, Serialize};

/// Single attribute attached to a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metafield {
    pub namespace: String,
    pub key: String,
    pub value: String,
}

/// Product together with all of its metafields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub vendor: String,
    pub product_type: String,
    pub tags: Vec<String>,
    /// File order
    pub metafields: Vec<Metafield>,
}

/// One line of a bulk export result file
///
/// Product and metafield fields share one flat schema; unused fields are
/// absent or null. Child records carry `__parentId`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, rename = "__parentId")]
    pub parent_id: Option<String>,
}

/// Classified export record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKind {
    Product(Product),
    Metafield {
        parent_id: String,
        metafield: Metafield,
    },
}

impl ExportRecord {
    /// Split into product or metafield by presence of a parent reference.
    ///
    /// Returns `None` for a top-level record without an identifier.
    pub fn classify(self) -> Option<RecordKind> {
        match self.parent_id.filter(|p| !p.is_empty()) {
            Some(parent_id) => Some(RecordKind::Metafield {
                parent_id,
                metafield: Metafield {
                    namespace: self.namespace.unwrap_or_default(),
                    key: self.key.unwrap_or_default(),
                    value: self.value.unwrap_or_default(),
                },
            }),
            None => {
                let id = self.id.filter(|id| !id.is_empty())?;
                Some(RecordKind::Product(Product {
                    id,
                    title: self.title.unwrap_or_default(),
                    handle: self.handle.unwrap_or_default(),
                    vendor: self.vendor.unwrap_or_default(),
                    product_type: self.product_type.unwrap_or_default(),
                    tags: self.tags.unwrap_or_default(),
                    metafields: Vec::new(),
                }))
            }
        }
    }
}
