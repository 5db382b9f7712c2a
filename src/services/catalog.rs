//! Catalog service — typed reads and writes over the row store.
//!
//! DESIGN
//! ======
//! Each function is one store round trip (two for the joint catalog fetch)
//! plus decoding. Writes return the confirmed row when the store sends a
//! representation back, `None` when it does not, so callers can fall back to
//! a full re-fetch.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Category, Product, Restaurant};
use crate::state::draft::{ProductPayload, RestaurantUpdate};
use crate::store::{DataStore, Direction, Query, StoreError, Table};

// =============================================================================
// TYPES
// =============================================================================

/// Categories and products of one restaurant, in display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
}

/// Insert payload for `categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCategory {
    pub restaurant_id: Uuid,
    pub name: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
}

// =============================================================================
// RESTAURANTS
// =============================================================================

/// All restaurants, ordered by name.
///
/// # Errors
///
/// Returns the store error if the select fails or a row does not decode.
pub async fn list_restaurants(store: &dyn DataStore) -> Result<Vec<Restaurant>, StoreError> {
    let rows = store
        .select(&Query::from(Table::Restaurants).order("name", Direction::Ascending))
        .await?;
    decode_rows(rows)
}

/// # Errors
///
/// Returns the store error if the select fails or a row does not decode.
pub async fn find_restaurant_by_slug(store: &dyn DataStore, slug: &str) -> Result<Option<Restaurant>, StoreError> {
    let rows = store
        .select(&Query::from(Table::Restaurants).eq("slug", slug))
        .await?;
    Ok(decode_rows(rows)?.into_iter().next())
}

/// # Errors
///
/// Returns the store error if the update fails.
pub async fn update_restaurant(
    store: &dyn DataStore,
    id: Uuid,
    update: &RestaurantUpdate,
) -> Result<Option<Restaurant>, StoreError> {
    let rows = store.update(Table::Restaurants, id, encode(update)?).await?;
    first_row(rows)
}

// =============================================================================
// CATALOG
// =============================================================================

/// Fetch categories (sort order ascending) and products (newest first)
/// concurrently. Either failure fails the whole fetch.
///
/// # Errors
///
/// Returns the first store error from either select.
pub async fn fetch_catalog(store: &dyn DataStore, restaurant_id: Uuid) -> Result<Catalog, StoreError> {
    let categories = Query::from(Table::Categories)
        .eq("restaurant_id", restaurant_id.to_string())
        .order("order", Direction::Ascending);
    let products = Query::from(Table::Products)
        .eq("restaurant_id", restaurant_id.to_string())
        .order("created_at", Direction::Descending);

    let (categories, products) = tokio::try_join!(store.select(&categories), store.select(&products))?;
    Ok(Catalog { categories: decode_rows(categories)?, products: decode_rows(products)? })
}

/// # Errors
///
/// Returns the store error if the insert fails.
pub async fn insert_product(store: &dyn DataStore, payload: &ProductPayload) -> Result<Option<Product>, StoreError> {
    let rows = store.insert(Table::Products, vec![encode(payload)?]).await?;
    first_row(rows)
}

/// # Errors
///
/// Returns the store error if the update fails.
pub async fn update_product(
    store: &dyn DataStore,
    id: Uuid,
    payload: &ProductPayload,
) -> Result<Option<Product>, StoreError> {
    let rows = store.update(Table::Products, id, encode(payload)?).await?;
    first_row(rows)
}

/// # Errors
///
/// Returns the store error if the delete fails.
pub async fn delete_product(store: &dyn DataStore, id: Uuid) -> Result<(), StoreError> {
    store.delete(Table::Products, id).await
}

/// # Errors
///
/// Returns the store error if the insert fails.
pub async fn insert_category(store: &dyn DataStore, category: &NewCategory) -> Result<Option<Category>, StoreError> {
    let rows = store.insert(Table::Categories, vec![encode(category)?]).await?;
    first_row(rows)
}

/// Products pointing at the category are left as they are.
///
/// # Errors
///
/// Returns the store error if the delete fails.
pub async fn delete_category(store: &dyn DataStore, id: Uuid) -> Result<(), StoreError> {
    store.delete(Table::Categories, id).await
}

// =============================================================================
// CODEC
// =============================================================================

fn encode<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Parse(e.to_string()))
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| StoreError::Parse(e.to_string())))
        .collect()
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, StoreError> {
    Ok(decode_rows(rows)?.into_iter().next())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
