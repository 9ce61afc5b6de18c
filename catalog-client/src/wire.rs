//! Raw wire types for upstream catalog responses
//!
//! The upstream provider returns type-tagged catalog objects. Only the fields
//! this system reads are modeled; everything else is ignored during
//! deserialization. Missing or odd fields map to `None` rather than failing
//! the whole response.

use serde::{Deserialize, Serialize};

/// A type-tagged object from the upstream catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogObject {
    /// Object type: `ITEM`, `CATEGORY` or `IMAGE`
    #[serde(rename = "type")]
    pub object_type: String,
    /// Upstream identifier
    pub id: String,
    /// Present when `object_type` is `ITEM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_data: Option<ItemData>,
    /// Present when `object_type` is `CATEGORY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_data: Option<CategoryData>,
    /// Present when `object_type` is `IMAGE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageData>,
}

/// Item payload of an `ITEM` object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub image_ids: Option<Vec<String>>,
    #[serde(default)]
    pub variations: Option<Vec<Variation>>,
}

/// A purchasable variation of an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variation {
    pub id: String,
    #[serde(default)]
    pub item_variation_data: Option<VariationData>,
}

/// Variation payload carrying pricing and inventory flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariationData {
    #[serde(default)]
    pub price_money: Option<Money>,
    #[serde(default)]
    pub track_inventory: Option<bool>,
}

/// Money amount in integer minor currency units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Money {
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Category payload of a `CATEGORY` object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryData {
    #[serde(default)]
    pub name: Option<String>,
}

/// Image payload of an `IMAGE` object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub url: Option<String>,
}

/// Envelope for list and batch responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectsResponse {
    #[serde(default)]
    pub objects: Vec<CatalogObject>,
}

/// Request body for the batch-retrieve endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRetrieveRequest {
    pub object_ids: Vec<String>,
}
