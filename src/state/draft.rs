//! Form drafts — local copies of rows staged before a save.
//!
//! A draft is built from the persisted row, edited field by field through an
//! edit enum, and turned into a write payload only on save. The payload
//! types leave out server-managed columns, so they cannot be sent by
//! accident.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Product, Restaurant};

// =============================================================================
// SETTINGS DRAFT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantDraft {
    /// Row being edited. Never written back.
    pub id: Uuid,
    /// Shown read-only; the public link depends on it.
    pub slug: String,
    pub name: String,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub is_open: bool,
    pub allows_delivery: bool,
    pub min_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEdit {
    Name(String),
    Logo(Option<String>),
    PrimaryColor(String),
    SecondaryColor(String),
    ContactEmail(String),
    ContactPhone(String),
    Whatsapp(String),
    Address(String),
    Open(bool),
    Delivery(bool),
    MinOrderValue(Decimal),
}

/// Update payload for `restaurants`. Has no id, slug, owner or timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestaurantUpdate {
    pub name: String,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "isOpen")]
    pub is_open: bool,
    pub allows_delivery: bool,
    pub min_order_value: Decimal,
}

impl RestaurantDraft {
    /// Snapshot `restaurant`, filling unset flags with their defaults.
    #[must_use]
    pub fn from_restaurant(restaurant: &Restaurant) -> Self {
        Self {
            id: restaurant.id,
            slug: restaurant.slug.clone(),
            name: restaurant.name.clone(),
            logo: restaurant.logo.clone(),
            primary_color: restaurant.primary_color.clone(),
            secondary_color: restaurant.secondary_color.clone(),
            contact_email: restaurant.contact_email.clone(),
            contact_phone: restaurant.contact_phone.clone(),
            whatsapp: restaurant.whatsapp.clone(),
            address: restaurant.address.clone(),
            is_open: restaurant.accepting_orders(),
            allows_delivery: restaurant.delivers(),
            min_order_value: restaurant.minimum_order(),
        }
    }

    pub fn apply(&mut self, edit: SettingsEdit) {
        match edit {
            SettingsEdit::Name(v) => self.name = v,
            SettingsEdit::Logo(v) => self.logo = v,
            SettingsEdit::PrimaryColor(v) => self.primary_color = non_blank(v),
            SettingsEdit::SecondaryColor(v) => self.secondary_color = non_blank(v),
            SettingsEdit::ContactEmail(v) => self.contact_email = non_blank(v),
            SettingsEdit::ContactPhone(v) => self.contact_phone = non_blank(v),
            SettingsEdit::Whatsapp(v) => self.whatsapp = non_blank(v),
            SettingsEdit::Address(v) => self.address = non_blank(v),
            SettingsEdit::Open(v) => self.is_open = v,
            SettingsEdit::Delivery(v) => self.allows_delivery = v,
            SettingsEdit::MinOrderValue(v) => self.min_order_value = v,
        }
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank name or a negative minimum.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Restaurant name is required."));
        }
        if self.min_order_value < Decimal::ZERO {
            return Err(AppError::validation("Minimum order value cannot be negative."));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_update(&self) -> RestaurantUpdate {
        RestaurantUpdate {
            name: self.name.trim().to_owned(),
            logo: self.logo.clone(),
            primary_color: self.primary_color.clone(),
            secondary_color: self.secondary_color.clone(),
            contact_email: self.contact_email.clone(),
            contact_phone: self.contact_phone.clone(),
            whatsapp: self.whatsapp.clone(),
            address: self.address.clone(),
            is_open: self.is_open,
            allows_delivery: self.allows_delivery,
            min_order_value: self.min_order_value,
        }
    }
}

// =============================================================================
// PRODUCT DRAFT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDraft {
    /// Set when editing an existing product.
    pub id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: Option<String>,
    pub is_available: bool,
    pub is_promotion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductEdit {
    Name(String),
    Description(String),
    Price(Decimal),
    Image(Option<String>),
    Category(Option<Uuid>),
    Available(bool),
    Promotion(bool),
}

/// Insert and update payload for `products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPayload {
    pub restaurant_id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub is_available: bool,
    pub is_promotion: bool,
}

impl ProductDraft {
    /// Blank form: price zero, available, not promoted.
    #[must_use]
    pub fn new(first_category: Option<Uuid>) -> Self {
        Self {
            id: None,
            category_id: first_category,
            name: String::new(),
            description: String::new(),
            price: Decimal::ZERO,
            image: None,
            is_available: true,
            is_promotion: false,
        }
    }

    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: Some(product.id),
            category_id: product.category_id,
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price,
            image: product.image.clone(),
            is_available: product.is_available,
            is_promotion: product.on_promotion(),
        }
    }

    pub fn apply(&mut self, edit: ProductEdit) {
        match edit {
            ProductEdit::Name(v) => self.name = v,
            ProductEdit::Description(v) => self.description = v,
            ProductEdit::Price(v) => self.price = v,
            ProductEdit::Image(v) => self.image = v,
            ProductEdit::Category(v) => self.category_id = v,
            ProductEdit::Available(v) => self.is_available = v,
            ProductEdit::Promotion(v) => self.is_promotion = v,
        }
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank name or a negative price.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("Product name is required."));
        }
        if self.price < Decimal::ZERO {
            return Err(AppError::validation("Price cannot be negative."));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_payload(&self, restaurant_id: Uuid) -> ProductPayload {
        ProductPayload {
            restaurant_id,
            category_id: self.category_id,
            name: self.name.trim().to_owned(),
            description: non_blank(self.description.clone()),
            price: self.price,
            image: self.image.clone(),
            is_available: self.is_available,
            is_promotion: self.is_promotion,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() { None } else { Some(value) }
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
