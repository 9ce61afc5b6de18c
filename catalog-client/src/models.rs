//! Local data model and the transform from upstream catalog objects
//!
//! Records are created by transforming an upstream object once and are
//! immutable after that; a cache expiry triggers a fresh transform of a fresh
//! fetch. Dangling category/image references are kept as identifiers only,
//! there is no foreign-key enforcement.

use serde::{Deserialize, Serialize};

use crate::wire::CatalogObject;

/// A book in the storefront catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price in major units, computed from upstream minor units / 100
    pub price: f64,
    pub currency: String,
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub variation_id: Option<String>,
    #[serde(default)]
    pub track_inventory: Option<bool>,
}

/// A catalog category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A resolved image URL for an image identifier
///
/// Upstream-issued URLs can expire independently of the content, which is why
/// the image cache tier carries a shorter TTL than the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
    pub url: String,
}

impl Book {
    /// Transform an upstream `ITEM` object into a book
    ///
    /// Returns `None` for objects that are not items or carry no item data.
    /// The first variation supplies price and inventory tracking; an item
    /// without any priced variation gets a zero price rather than being
    /// dropped.
    pub fn from_object(obj: &CatalogObject) -> Option<Self> {
        if obj.object_type != "ITEM" {
            return None;
        }
        let item = obj.item_data.as_ref()?;

        let first_variation = item
            .variations
            .as_ref()
            .and_then(|variations| variations.first());
        let variation_data = first_variation.and_then(|v| v.item_variation_data.as_ref());
        let price_money = variation_data.and_then(|d| d.price_money.as_ref());

        Some(Self {
            id: obj.id.clone(),
            name: item.name.clone().unwrap_or_default(),
            description: item.description.clone(),
            price: price_money.map_or(0.0, |m| m.amount as f64 / 100.0),
            currency: price_money
                .and_then(|m| m.currency.clone())
                .unwrap_or_else(|| "USD".to_string()),
            image_id: item
                .image_ids
                .as_ref()
                .and_then(|ids| ids.first())
                .cloned(),
            category_id: item.category_id.clone(),
            variation_id: first_variation.map(|v| v.id.clone()),
            track_inventory: variation_data.and_then(|d| d.track_inventory),
        })
    }

    /// Whether this book carries an image reference
    pub fn has_image(&self) -> bool {
        self.image_id.is_some()
    }
}

impl Category {
    /// Transform an upstream `CATEGORY` object into a category
    pub fn from_object(obj: &CatalogObject) -> Option<Self> {
        if obj.object_type != "CATEGORY" {
            return None;
        }
        let data = obj.category_data.as_ref()?;
        Some(Self {
            id: obj.id.clone(),
            name: data.name.clone().unwrap_or_default(),
        })
    }
}

impl ImageRef {
    /// Transform an upstream `IMAGE` object into a resolved image URL
    ///
    /// Objects without a URL are skipped, there is nothing to serve for them.
    pub fn from_object(obj: &CatalogObject) -> Option<Self> {
        if obj.object_type != "IMAGE" {
            return None;
        }
        let url = obj.image_data.as_ref()?.url.clone()?;
        Some(Self {
            id: obj.id.clone(),
            url,
        })
    }
}
