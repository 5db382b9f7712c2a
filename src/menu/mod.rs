//! Public menu — read-only projection of one restaurant's catalog.
//!
//! DESIGN
//! ======
//! [`PublicMenu::project`] takes rows the caller already fetched and never
//! touches the network. Only rows belonging to the restaurant are kept.
//! Sections follow category sort order and products within a section are
//! newest first. Products whose category is gone are dropped, as are
//! sections with nothing in them.

pub mod order;

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::models::{self, Category, Product, Restaurant};

// =============================================================================
// TYPES
// =============================================================================

/// Display fields of the restaurant. No owner or timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuHeader {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub contact_phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub is_open: bool,
    pub allows_delivery: bool,
    pub min_order_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image: Option<String>,
    pub is_available: bool,
    pub is_promotion: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuSection {
    pub category_id: Uuid,
    pub name: String,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicMenu {
    pub restaurant: MenuHeader,
    pub sections: Vec<MenuSection>,
}

// =============================================================================
// PROJECTION
// =============================================================================

impl MenuHeader {
    #[must_use]
    pub fn from_restaurant(restaurant: &Restaurant) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name.clone(),
            slug: restaurant.slug.clone(),
            logo: restaurant.logo.clone(),
            primary_color: restaurant.primary_color.clone(),
            secondary_color: restaurant.secondary_color.clone(),
            contact_phone: restaurant.contact_phone.clone(),
            whatsapp: restaurant.whatsapp.clone(),
            address: restaurant.address.clone(),
            is_open: restaurant.accepting_orders(),
            allows_delivery: restaurant.delivers(),
            min_order_value: restaurant.minimum_order(),
        }
    }
}

impl MenuItem {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            image: product.image.clone(),
            is_available: product.is_available,
            is_promotion: product.on_promotion(),
        }
    }
}

impl PublicMenu {
    #[must_use]
    pub fn project(restaurant: &Restaurant, categories: &[Category], products: &[Product]) -> Self {
        let mut categories: Vec<Category> = categories
            .iter()
            .filter(|c| c.restaurant_id == restaurant.id)
            .cloned()
            .collect();
        models::sort_categories(&mut categories);

        let mut products: Vec<Product> = products
            .iter()
            .filter(|p| p.restaurant_id == restaurant.id)
            .cloned()
            .collect();
        models::sort_products(&mut products);

        let sections = categories
            .into_iter()
            .map(|category| MenuSection {
                category_id: category.id,
                items: products
                    .iter()
                    .filter(|p| p.category_id == Some(category.id))
                    .map(MenuItem::from_product)
                    .collect(),
                name: category.name,
            })
            .filter(|section| !section.items.is_empty())
            .collect();

        Self { restaurant: MenuHeader::from_restaurant(restaurant), sections }
    }

    /// Look up an item by id across all sections.
    #[must_use]
    pub fn item(&self, id: Uuid) -> Option<&MenuItem> {
        self.sections.iter().flat_map(|s| &s.items).find(|i| i.id == id)
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

/// Public link for a restaurant: `{origin}?menu={slug}`.
#[must_use]
pub fn menu_link(origin: &Url, slug: &str) -> Url {
    let mut url = origin.clone();
    url.set_fragment(None);
    url.query_pairs_mut().clear().append_pair("menu", slug);
    url
}

// =============================================================================
// TEXT RENDERING
// =============================================================================

impl fmt::Display for PublicMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = &self.restaurant;
        let status = if header.is_open { "open" } else { "closed" };
        writeln!(f, "{} ({status})", header.name)?;
        if let Some(address) = &header.address {
            writeln!(f, "{address}")?;
        }
        if header.min_order_value > Decimal::ZERO {
            writeln!(f, "Minimum order: {:.2}", header.min_order_value)?;
        }

        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "== {} ==", section.name)?;
            for item in &section.items {
                write!(f, "- {} .... {:.2}", item.name, item.price)?;
                if item.is_promotion {
                    write!(f, " [promo]")?;
                }
                if !item.is_available {
                    write!(f, " (unavailable)")?;
                }
                writeln!(f)?;
                if let Some(description) = item.description.as_deref().filter(|d| !d.trim().is_empty()) {
                    writeln!(f, "  {description}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
