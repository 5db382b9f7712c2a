//! Application state owned by the controller.
//!
//! DESIGN
//! ======
//! Everything the UI reads lives in one [`AppState`]. Getters are public,
//! mutators are `pub(crate)` so only the controller changes state, and
//! form input arrives as edit enums applied to the drafts. Row mutations
//! are applied locally from the store's confirmed response and re-sorted
//! to the same order a fresh fetch would return.

pub mod draft;
pub mod view;

use uuid::Uuid;

use crate::auth::Session;
use crate::error::Notice;
use crate::menu::PublicMenu;
use crate::models::{self, Category, Product, Restaurant};
use draft::{ProductDraft, RestaurantDraft};
use view::{AdminTab, View};

/// Banner shown on the landing page when the restaurant list fails to load.
pub const RESTAURANTS_FAILED_BANNER: &str = "Failed to load restaurants.";

#[derive(Debug, Default)]
pub struct AppState {
    view: View,
    admin_tab: AdminTab,
    session: Option<Session>,

    restaurants: Vec<Restaurant>,
    loading: bool,
    banner: Option<String>,

    active: Option<Restaurant>,
    categories: Vec<Category>,
    products: Vec<Product>,
    settings_draft: Option<RestaurantDraft>,
    product_draft: Option<ProductDraft>,

    menu: Option<PublicMenu>,

    busy: bool,
    notices: Vec<Notice>,
}

// =============================================================================
// READ API
// =============================================================================

impl AppState {
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    #[must_use]
    pub fn admin_tab(&self) -> AdminTab {
        self.admin_tab
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Restaurants listed on the landing page, ordered by name.
    #[must_use]
    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    /// True while the landing list is being fetched.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// The restaurant being administered.
    #[must_use]
    pub fn active_restaurant(&self) -> Option<&Restaurant> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn settings_draft(&self) -> Option<&RestaurantDraft> {
        self.settings_draft.as_ref()
    }

    #[must_use]
    pub fn product_draft(&self) -> Option<&ProductDraft> {
        self.product_draft.as_ref()
    }

    /// The menu shown in [`View::Menu`].
    #[must_use]
    pub fn menu(&self) -> Option<&PublicMenu> {
        self.menu.as_ref()
    }

    /// True while a mutation is in flight. Submit controls are disabled.
    #[must_use]
    pub fn busy(&self) -> bool {
        self.busy
    }

    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    #[must_use]
    pub fn category_name(&self, id: Uuid) -> Option<&str> {
        self.categories.iter().find(|c| c.id == id).map(|c| c.name.as_str())
    }

    /// Products whose category is `category_id`.
    #[must_use]
    pub fn products_in(&self, category_id: Uuid) -> usize {
        self.products.iter().filter(|p| p.category_id == Some(category_id)).count()
    }
}

// =============================================================================
// MUTATIONS (controller only)
// =============================================================================

impl AppState {
    /// Switch view. Any switch drops unsaved settings edits.
    pub(crate) fn set_view(&mut self, view: View) {
        if self.view != view {
            self.discard_settings_edits();
        }
        self.view = view;
    }

    pub(crate) fn set_admin_tab(&mut self, tab: AdminTab) {
        self.admin_tab = tab;
    }

    pub(crate) fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub(crate) fn set_restaurants(&mut self, restaurants: Vec<Restaurant>, banner: Option<String>) {
        self.restaurants = restaurants;
        self.banner = banner;
    }

    /// Commit a selection and its catalog together.
    pub(crate) fn select(&mut self, restaurant: Restaurant, categories: Vec<Category>, products: Vec<Product>) {
        self.settings_draft = Some(RestaurantDraft::from_restaurant(&restaurant));
        self.product_draft = None;
        self.active = Some(restaurant);
        self.categories = categories;
        self.products = products;
    }

    pub(crate) fn replace_catalog(&mut self, categories: Vec<Category>, products: Vec<Product>) {
        self.categories = categories;
        self.products = products;
    }

    /// Forget the admin selection (on sign-out).
    pub(crate) fn clear_selection(&mut self) {
        self.active = None;
        self.categories.clear();
        self.products.clear();
        self.settings_draft = None;
        self.product_draft = None;
        self.admin_tab = AdminTab::default();
    }

    /// Install a confirmed restaurant row as the active one and rebuild the
    /// settings draft. The landing list copy is replaced too.
    pub(crate) fn apply_restaurant(&mut self, restaurant: Restaurant) {
        if let Some(listed) = self.restaurants.iter_mut().find(|r| r.id == restaurant.id) {
            listed.clone_from(&restaurant);
        }
        self.settings_draft = Some(RestaurantDraft::from_restaurant(&restaurant));
        self.active = Some(restaurant);
    }

    pub(crate) fn settings_draft_mut(&mut self) -> Option<&mut RestaurantDraft> {
        self.settings_draft.as_mut()
    }

    pub(crate) fn discard_settings_edits(&mut self) {
        if let Some(active) = &self.active {
            self.settings_draft = Some(RestaurantDraft::from_restaurant(active));
        }
    }

    pub(crate) fn set_product_draft(&mut self, draft: Option<ProductDraft>) {
        self.product_draft = draft;
    }

    pub(crate) fn product_draft_mut(&mut self) -> Option<&mut ProductDraft> {
        self.product_draft.as_mut()
    }

    pub(crate) fn upsert_product(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
        models::sort_products(&mut self.products);
    }

    pub(crate) fn remove_product(&mut self, id: Uuid) {
        self.products.retain(|p| p.id != id);
    }

    pub(crate) fn upsert_category(&mut self, category: Category) {
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(existing) => *existing = category,
            None => self.categories.push(category),
        }
        models::sort_categories(&mut self.categories);
    }

    pub(crate) fn remove_category(&mut self, id: Uuid) {
        self.categories.retain(|c| c.id != id);
    }

    /// Position for a new category: one past the highest in use.
    pub(crate) fn next_category_order(&self) -> i32 {
        self.categories
            .iter()
            .filter_map(|c| c.sort_order)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    pub(crate) fn set_menu(&mut self, menu: Option<PublicMenu>) {
        self.menu = menu;
    }

    pub(crate) fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    pub(crate) fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
