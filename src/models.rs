//! Row types mirrored from the backend tables.
//!
//! These mirror the `restaurants`, `categories` and `products` tables as the
//! row store returns them. Nullable columns are `Option`s; the defaults the
//! UI applies (open, delivery on, no minimum) live in helper methods so the
//! raw row stays faithful to what was fetched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// RESTAURANT
// =============================================================================

/// A tenant. Mirrors the `restaurants` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    /// Unique public identifier used in menu links.
    pub slug: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "isOpen", default)]
    pub is_open: Option<bool>,
    #[serde(default)]
    pub allows_delivery: Option<bool>,
    #[serde(default)]
    pub min_order_value: Option<Decimal>,
    /// Owning account. Compared against the session user id.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Restaurant {
    #[must_use]
    pub fn accepting_orders(&self) -> bool {
        self.is_open.unwrap_or(true)
    }

    #[must_use]
    pub fn delivers(&self) -> bool {
        self.allows_delivery.unwrap_or(true)
    }

    #[must_use]
    pub fn minimum_order(&self) -> Decimal {
        self.min_order_value.unwrap_or(Decimal::ZERO)
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

// =============================================================================
// CATEGORY
// =============================================================================

/// A menu section. Mirrors the `categories` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    #[serde(rename = "order", default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// PRODUCT
// =============================================================================

/// A menu item. Mirrors the `products` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    /// Not verified client-side; may dangle after its category is deleted.
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_promotion: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    #[must_use]
    pub fn on_promotion(&self) -> bool {
        self.is_promotion.unwrap_or(false)
    }
}

fn default_true() -> bool {
    true
}

// =============================================================================
// ORDERING
// =============================================================================

/// Sort categories the way the store returns them: sort order ascending,
/// unset positions last.
pub fn sort_categories(categories: &mut [Category]) {
    categories.sort_by_key(|c| (c.sort_order.is_none(), c.sort_order));
}

/// Sort products the way the store returns them: newest first, rows without
/// a creation time last.
pub fn sort_products(products: &mut [Product]) {
    products.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
#[path = "models_test.rs"]
mod tests;
