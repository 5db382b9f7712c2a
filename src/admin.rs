//! Admin shell — the pane shown for the active admin tab.
//!
//! Stateless: everything is borrowed from [`AppState`] and nothing is
//! fetched here.

use serde::Serialize;
use uuid::Uuid;

use crate::models::{Category, Product, Restaurant};
use crate::state::AppState;
use crate::state::draft::{ProductDraft, RestaurantDraft};
use crate::state::view::AdminTab;

/// Product with its category name resolved for the grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductCard<'a> {
    pub product: &'a Product,
    /// `None` when the product has no category or it was deleted.
    pub category: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCard<'a> {
    pub category: &'a Category,
    pub product_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pane", rename_all = "snake_case")]
pub enum AdminPane<'a> {
    Menu { products: Vec<ProductCard<'a>>, form: Option<&'a ProductDraft> },
    Inventory { categories: Vec<CategoryCard<'a>> },
    Settings { draft: Option<&'a RestaurantDraft>, menu_link: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminShell<'a> {
    pub restaurant: &'a Restaurant,
    pub tab: AdminTab,
    pub busy: bool,
    pub pane: AdminPane<'a>,
}

impl<'a> AdminShell<'a> {
    #[must_use]
    pub fn new(restaurant: &'a Restaurant, tab: AdminTab, state: &'a AppState, menu_link: String) -> Self {
        let pane = match tab {
            AdminTab::Menu => AdminPane::Menu {
                products: state
                    .products()
                    .iter()
                    .map(|product| ProductCard {
                        product,
                        category: product.category_id.and_then(|id| state.category_name(id)),
                    })
                    .collect(),
                form: state.product_draft(),
            },
            AdminTab::Inventory => AdminPane::Inventory {
                categories: state
                    .categories()
                    .iter()
                    .map(|category| CategoryCard { category, product_count: state.products_in(category.id) })
                    .collect(),
            },
            AdminTab::Settings => AdminPane::Settings { draft: state.settings_draft(), menu_link },
        };
        Self { restaurant, tab, busy: state.busy(), pane }
    }

    /// Ids shown in the current pane, in display order.
    #[must_use]
    pub fn row_ids(&self) -> Vec<Uuid> {
        match &self.pane {
            AdminPane::Menu { products, .. } => products.iter().map(|c| c.product.id).collect(),
            AdminPane::Inventory { categories } => categories.iter().map(|c| c.category.id).collect(),
            AdminPane::Settings { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
