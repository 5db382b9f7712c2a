//! Controller — view and session orchestration over the collaborators.
//!
//! DESIGN
//! ======
//! One controller per interactive client. Every operation takes `&mut self`,
//! so there is never more than one mutation in flight. The controller owns
//! the [`AppState`] and is the only writer; views read it through
//! [`Controller::state`].
//!
//! Mutations follow a confirmed-update contract: when the store answers with
//! the written row, that row is applied locally and re-sorted. When it
//! answers with nothing, the controller re-fetches the whole catalog
//! instead. [`Controller::reconcile`] runs that re-fetch on demand.
//!
//! Admin writes run under the signed-in user's token. An expired session is
//! refreshed before the first store call; when refresh fails the user is
//! signed out and the write is not sent. The busy flag brackets each write
//! and is also published on [`Controller::busy_signal`].
//!
//! ERROR HANDLING
//! ==============
//! Every failure is logged, pushed onto the notice queue, and returned.
//! Text generation never fails: it degrades to fallback text with a
//! warning notice.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::admin::AdminShell;
use crate::auth::gotrue::GoTrueAuth;
use crate::auth::{AuthError, AuthProvider, Session, SessionSubscription};
use crate::config::{AppConfig, DEFAULT_CUISINE};
use crate::error::{AppError, ErrorCode, Notice, Severity};
use crate::images::{BucketImages, ImageFile, ImageStore, InlineImages};
use crate::llm::{LlmClient, TextGenerator};
use crate::menu::{self, PublicMenu};
use crate::models::Restaurant;
use crate::services::catalog::{self, NewCategory};
use crate::services::copywriter;
use crate::state::draft::{ProductDraft, ProductEdit, SettingsEdit};
use crate::state::view::{AdminTab, NavEvent, View};
use crate::state::{AppState, RESTAURANTS_FAILED_BANNER};
use crate::store::DataStore;
use crate::store::rest::RestStore;

const AI_FALLBACK_CODE: &str = "E_AI_FALLBACK";

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Origin the public menu link is built on.
    pub public_origin: Url,
    /// Select the first restaurant when the signed-in user owns none.
    pub demo_fallback: bool,
    pub cuisine: String,
}

impl ControllerSettings {
    #[must_use]
    pub fn new(public_origin: Url) -> Self {
        Self { public_origin, demo_fallback: true, cuisine: DEFAULT_CUISINE.to_owned() }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            public_origin: config.public_origin.clone(),
            demo_fallback: config.demo_fallback,
            cuisine: config.cuisine.clone(),
        }
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct Controller {
    store: Arc<dyn DataStore>,
    auth: Arc<dyn AuthProvider>,
    generator: Option<Arc<dyn TextGenerator>>,
    images: Arc<dyn ImageStore>,
    settings: ControllerSettings,
    state: AppState,
    subscription: Option<SessionSubscription>,
    busy: watch::Sender<bool>,
}

impl Controller {
    /// A controller with inline image storage and no text generator.
    #[must_use]
    pub fn new(store: Arc<dyn DataStore>, auth: Arc<dyn AuthProvider>, settings: ControllerSettings) -> Self {
        Self {
            store,
            auth,
            generator: None,
            images: Arc::new(InlineImages),
            settings,
            state: AppState::default(),
            subscription: None,
            busy: watch::channel(false).0,
        }
    }

    /// Wire the hosted backend from configuration: `GoTrue` auth, the REST
    /// store and, when `IMAGE_BUCKET` is set, bucket image storage. Text
    /// generation is optional; without a usable LLM configuration the AI
    /// assist falls back.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let backend = &config.backend;
        let auth = GoTrueAuth::new(backend.url.clone(), backend.anon_key.clone(), config.timeouts)?;
        let tokens = auth.token_source();
        let store = RestStore::new(backend.url.clone(), tokens.clone(), config.timeouts)?;
        let mut controller = Self::new(Arc::new(store), Arc::new(auth), ControllerSettings::from_config(config));

        if let Some(bucket) = &config.image_bucket {
            let images = BucketImages::new(backend.url.clone(), bucket.clone(), tokens, config.timeouts)?;
            controller = controller.with_images(Arc::new(images));
        }
        match LlmClient::from_env() {
            Ok(client) => {
                info!(model = client.model(), "text generation enabled");
                controller = controller.with_generator(Arc::new(client));
            }
            Err(e) => warn!(error = %e, "text generation disabled"),
        }
        Ok(controller)
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn with_images(mut self, images: Arc<dyn ImageStore>) -> Self {
        self.images = images;
        self
    }

    /// Shared handle to the data store.
    #[must_use]
    pub fn store(&self) -> Arc<dyn DataStore> {
        Arc::clone(&self.store)
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Follows the busy flag, for views that render outside the controller.
    #[must_use]
    pub fn busy_signal(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    /// Drain queued notices for display.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.state.take_notices()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Subscribe to session changes, pick up any existing session, and load
    /// the landing list.
    ///
    /// # Errors
    ///
    /// Returns the restaurant fetch error. A failed session lookup is
    /// reported and treated as signed out.
    pub async fn start(&mut self) -> Result<(), AppError> {
        self.subscription = Some(self.auth.subscribe());

        let session = match self.auth.current_session().await {
            Ok(session) => session,
            Err(e) => {
                self.report(e.into());
                None
            }
        };
        info!(authenticated = session.is_some(), "controller started");
        self.apply_session(session);

        let loaded = self.load_restaurants().await;
        self.sync_selection().await;
        loaded
    }

    /// Wait for the next session change and apply it. Returns `false` once
    /// there is no subscription or the provider went away.
    pub async fn next_session_change(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        let Some(session) = subscription.changed().await else {
            self.subscription = None;
            return false;
        };
        debug!(authenticated = session.is_some(), "session changed");
        self.apply_session(session);
        self.sync_selection().await;
        true
    }

    /// Unsubscribe from session changes.
    pub fn stop(&mut self) {
        if self.subscription.take().is_some() {
            info!("session subscription dropped");
        }
    }

    /// Fetch every restaurant for the landing page.
    ///
    /// # Errors
    ///
    /// Returns the store error; the list is left empty and the landing
    /// banner is set.
    pub async fn load_restaurants(&mut self) -> Result<(), AppError> {
        self.state.set_loading(true);
        let result = catalog::list_restaurants(self.store.as_ref()).await;
        self.state.set_loading(false);

        match result {
            Ok(restaurants) => {
                info!(count = restaurants.len(), "restaurants loaded");
                self.state.set_restaurants(restaurants, None);
                Ok(())
            }
            Err(e) => {
                self.state.set_restaurants(Vec::new(), Some(RESTAURANTS_FAILED_BANNER.to_owned()));
                Err(self.report(e.into()))
            }
        }
    }

    // =========================================================================
    // NAVIGATION + AUTH
    // =========================================================================

    /// Admin access from the landing page: straight in when signed in,
    /// otherwise to the sign-in screen.
    pub async fn request_admin(&mut self) {
        let authenticated = self.state.is_authenticated();
        if self.navigate(NavEvent::RequestAdmin { authenticated }) && self.state.view() == View::Admin {
            self.sync_selection().await;
        }
    }

    /// # Errors
    ///
    /// Returns the auth error; the view stays where it was.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        self.set_busy(true);
        let result = self.auth.sign_in_with_password(email.trim(), password).await;
        self.set_busy(false);

        let session = result.map_err(|e| self.report(e.into()))?;
        info!(user_id = %session.user.id, "signed in");
        self.enter_session(session).await;
        Ok(())
    }

    /// Register and, when the provider signs the account in right away,
    /// enter the admin view.
    ///
    /// # Errors
    ///
    /// Returns the auth error.
    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<(), AppError> {
        self.set_busy(true);
        let result = self.auth.sign_up(email.trim(), password).await;
        self.set_busy(false);

        match result.map_err(|e| self.report(e.into()))? {
            Some(session) => {
                info!(user_id = %session.user.id, "account created and signed in");
                self.enter_session(session).await;
            }
            None => {
                info!("account created, awaiting email confirmation");
                self.state.push_notice(Notice::info("Check your email to confirm your account."));
            }
        }
        Ok(())
    }

    /// Sign out and return to the landing page. Local state is cleared even
    /// when the provider call fails.
    ///
    /// # Errors
    ///
    /// Returns the auth error from the provider.
    pub async fn logout(&mut self) -> Result<(), AppError> {
        self.set_busy(true);
        let result = self.auth.sign_out().await;
        self.set_busy(false);

        self.apply_session(None);
        result.map_err(|e| self.report(e.into()))?;
        info!("signed out");
        Ok(())
    }

    /// Back to the landing page from the sign-in screen or a public menu.
    pub fn go_back(&mut self) {
        if self.navigate(NavEvent::Back) {
            self.state.set_menu(None);
        }
    }

    pub fn set_admin_tab(&mut self, tab: AdminTab) {
        self.state.set_admin_tab(tab);
    }

    /// Open the public menu of a restaurant from the landing list.
    ///
    /// # Errors
    ///
    /// Fails when the restaurant is not listed, the menu cannot be opened
    /// from the current view, or its catalog fails to load.
    pub async fn open_menu(&mut self, restaurant_id: Uuid) -> Result<(), AppError> {
        let result = self.try_open_menu(restaurant_id).await;
        result.map_err(|e| self.report(e))
    }

    /// Open the public menu a menu link points at.
    ///
    /// # Errors
    ///
    /// Fails when no restaurant has `slug` or its catalog fails to load.
    pub async fn open_menu_by_slug(&mut self, slug: &str) -> Result<(), AppError> {
        let result = self.try_open_menu_by_slug(slug).await;
        result.map_err(|e| self.report(e))
    }

    async fn try_open_menu(&mut self, restaurant_id: Uuid) -> Result<(), AppError> {
        let restaurant = self
            .state
            .restaurants()
            .iter()
            .find(|r| r.id == restaurant_id)
            .cloned()
            .ok_or_else(|| AppError::RestaurantNotFound(restaurant_id.to_string()))?;
        self.show_menu(restaurant).await
    }

    async fn try_open_menu_by_slug(&mut self, slug: &str) -> Result<(), AppError> {
        let listed = self.state.restaurants().iter().find(|r| r.slug == slug).cloned();
        let restaurant = match listed {
            Some(r) => r,
            None => catalog::find_restaurant_by_slug(self.store.as_ref(), slug)
                .await?
                .ok_or_else(|| AppError::RestaurantNotFound(slug.to_owned()))?,
        };
        self.show_menu(restaurant).await
    }

    async fn show_menu(&mut self, restaurant: Restaurant) -> Result<(), AppError> {
        if self.state.view().next(NavEvent::OpenMenu).is_none() {
            return Err(AppError::validation("Menus open from the landing page."));
        }
        let catalog = catalog::fetch_catalog(self.store.as_ref(), restaurant.id)
            .await
            .map_err(AppError::Refresh)?;
        let menu = PublicMenu::project(&restaurant, &catalog.categories, &catalog.products);
        info!(slug = %restaurant.slug, sections = menu.sections.len(), "public menu opened");
        self.state.set_menu(Some(menu));
        self.navigate(NavEvent::OpenMenu);
        Ok(())
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Make `restaurant_id` the administered restaurant. Categories and
    /// products are fetched together; if either fails nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::RestaurantNotFound`] or [`AppError::Refresh`].
    pub async fn select_restaurant(&mut self, restaurant_id: Uuid) -> Result<(), AppError> {
        let result = self.try_select_restaurant(restaurant_id).await;
        result.map_err(|e| self.report(e))
    }

    async fn try_select_restaurant(&mut self, restaurant_id: Uuid) -> Result<(), AppError> {
        let restaurant = self
            .state
            .restaurants()
            .iter()
            .find(|r| r.id == restaurant_id)
            .cloned()
            .ok_or_else(|| AppError::RestaurantNotFound(restaurant_id.to_string()))?;

        let catalog = catalog::fetch_catalog(self.store.as_ref(), restaurant_id)
            .await
            .map_err(AppError::Refresh)?;
        info!(
            restaurant_id = %restaurant_id,
            categories = catalog.categories.len(),
            products = catalog.products.len(),
            "restaurant selected"
        );
        self.state.select(restaurant, catalog.categories, catalog.products);
        Ok(())
    }

    /// Pick the signed-in user's restaurant, or the first listed one in
    /// demo mode.
    async fn sync_selection(&mut self) {
        let Some(user_id) = self.state.session().map(|s| s.user.id) else {
            return;
        };
        let owned = self.state.restaurants().iter().find(|r| r.is_owned_by(user_id)).map(|r| r.id);

        let target = match owned {
            Some(id) => id,
            None if self.state.view() == View::Admin && self.settings.demo_fallback => {
                let Some(first) = self.state.restaurants().first() else {
                    return;
                };
                // TODO: drop once every account is provisioned with its own restaurant.
                warn!(
                    user_id = %user_id,
                    restaurant_id = %first.id,
                    "user owns no restaurant; falling back to the first listed (demo mode)"
                );
                first.id
            }
            None => return,
        };

        if self.state.active_restaurant().is_some_and(|r| r.id == target) {
            return;
        }
        // Failures are already reported.
        let _ = self.select_restaurant(target).await;
    }

    /// Re-fetch the active restaurant's categories and products.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NoRestaurant`] or [`AppError::Refresh`].
    pub async fn reconcile(&mut self) -> Result<(), AppError> {
        let result = match self.active_id() {
            Ok(id) => self.refresh_catalog(id).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| self.report(e))
    }

    // =========================================================================
    // SETTINGS
    // =========================================================================

    /// Edit the settings draft. Nothing is sent until [`Self::save_settings`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NoRestaurant`] when nothing is selected.
    pub fn edit_settings(&mut self, edit: SettingsEdit) -> Result<(), AppError> {
        match self.state.settings_draft_mut() {
            Some(draft) => {
                draft.apply(edit);
                Ok(())
            }
            None => Err(self.report(AppError::NoRestaurant)),
        }
    }

    /// # Errors
    ///
    /// Returns validation or store errors, or [`AuthError::SessionExpired`];
    /// the draft is kept for another try.
    pub async fn save_settings(&mut self) -> Result<(), AppError> {
        self.set_busy(true);
        let result = self.persist_settings().await;
        self.set_busy(false);
        self.conclude(result, "Settings saved.")
    }

    async fn persist_settings(&mut self) -> Result<(), AppError> {
        let draft = self.state.settings_draft().ok_or(AppError::NoRestaurant)?;
        draft.validate()?;
        let id = draft.id;
        let update = draft.to_update();
        self.ensure_fresh_session().await?;

        match catalog::update_restaurant(self.store.as_ref(), id, &update).await? {
            Some(saved) => self.state.apply_restaurant(saved),
            None => self.refresh_restaurant(id).await?,
        }
        info!(restaurant_id = %id, "settings saved");
        Ok(())
    }

    /// Attach a logo from a local file to the settings draft.
    ///
    /// # Errors
    ///
    /// Returns image read/store errors or [`AppError::NoRestaurant`].
    pub async fn attach_logo(&mut self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let result = self.try_attach_logo(path.as_ref()).await;
        result.map_err(|e| self.report(e))
    }

    async fn try_attach_logo(&mut self, path: &Path) -> Result<(), AppError> {
        let restaurant_id = self.active_id()?;
        let reference = self.store_image(path, &format!("{restaurant_id}/logo")).await?;
        let draft = self.state.settings_draft_mut().ok_or(AppError::NoRestaurant)?;
        draft.apply(SettingsEdit::Logo(Some(reference)));
        Ok(())
    }

    // =========================================================================
    // PRODUCTS
    // =========================================================================

    /// Open the product form, blank for `None` or filled from an existing
    /// product.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NoRestaurant`] or a validation error for an
    /// unknown product.
    pub fn open_product_form(&mut self, product_id: Option<Uuid>) -> Result<(), AppError> {
        let draft = match (self.state.active_restaurant(), product_id) {
            (None, _) => Err(AppError::NoRestaurant),
            (Some(_), None) => Ok(ProductDraft::new(self.state.categories().first().map(|c| c.id))),
            (Some(_), Some(id)) => self
                .state
                .products()
                .iter()
                .find(|p| p.id == id)
                .map(ProductDraft::from_product)
                .ok_or_else(|| AppError::validation("Product not found.")),
        };
        match draft {
            Ok(draft) => {
                self.state.set_product_draft(Some(draft));
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    pub fn close_product_form(&mut self) {
        self.state.set_product_draft(None);
    }

    /// # Errors
    ///
    /// Returns [`AppError::NoDraft`] when the form is closed.
    pub fn edit_product(&mut self, edit: ProductEdit) -> Result<(), AppError> {
        match self.state.product_draft_mut() {
            Some(draft) => {
                draft.apply(edit);
                Ok(())
            }
            None => Err(self.report(AppError::NoDraft)),
        }
    }

    /// Insert or update the product in the form. Invalid drafts are
    /// rejected before any store call.
    ///
    /// # Errors
    ///
    /// Returns validation or store errors, or [`AuthError::SessionExpired`];
    /// the form stays open.
    pub async fn save_product(&mut self) -> Result<(), AppError> {
        self.set_busy(true);
        let result = self.persist_product().await;
        self.set_busy(false);
        self.conclude(result, "Product saved.")
    }

    async fn persist_product(&mut self) -> Result<(), AppError> {
        let restaurant_id = self.active_id()?;
        let draft = self.state.product_draft().ok_or(AppError::NoDraft)?;
        draft.validate()?;
        let existing = draft.id;
        let payload = draft.to_payload(restaurant_id);
        self.ensure_fresh_session().await?;

        let confirmed = match existing {
            Some(id) => catalog::update_product(self.store.as_ref(), id, &payload).await?,
            None => catalog::insert_product(self.store.as_ref(), &payload).await?,
        };
        match confirmed {
            Some(product) => {
                info!(product_id = %product.id, created = existing.is_none(), "product saved");
                self.state.upsert_product(product);
            }
            None => self.refresh_catalog(restaurant_id).await?,
        }
        self.state.set_product_draft(None);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the store error; local state is untouched.
    pub async fn delete_product(&mut self, product_id: Uuid) -> Result<(), AppError> {
        self.set_busy(true);
        let result = self.remove_product(product_id).await;
        self.set_busy(false);
        self.conclude(result, "Product deleted.")
    }

    async fn remove_product(&mut self, product_id: Uuid) -> Result<(), AppError> {
        self.active_id()?;
        self.ensure_fresh_session().await?;
        catalog::delete_product(self.store.as_ref(), product_id).await?;
        info!(product_id = %product_id, "product deleted");
        self.state.remove_product(product_id);
        if self.state.product_draft().is_some_and(|d| d.id == Some(product_id)) {
            self.state.set_product_draft(None);
        }
        Ok(())
    }

    /// Attach an image from a local file to the open product form.
    ///
    /// # Errors
    ///
    /// Returns image read/store errors or [`AppError::NoDraft`].
    pub async fn attach_product_image(&mut self, path: impl AsRef<Path>) -> Result<(), AppError> {
        let result = self.try_attach_product_image(path.as_ref()).await;
        result.map_err(|e| self.report(e))
    }

    async fn try_attach_product_image(&mut self, path: &Path) -> Result<(), AppError> {
        let restaurant_id = self.active_id()?;
        if self.state.product_draft().is_none() {
            return Err(AppError::NoDraft);
        }
        let reference = self.store_image(path, &format!("{restaurant_id}/products")).await?;
        let draft = self.state.product_draft_mut().ok_or(AppError::NoDraft)?;
        draft.apply(ProductEdit::Image(Some(reference)));
        Ok(())
    }

    /// Fill the form's description from the text generator. The description
    /// always ends up set: generated text or a fallback message.
    ///
    /// # Errors
    ///
    /// Only when the form is closed or the product has no name yet.
    pub async fn generate_description(&mut self) -> Result<(), AppError> {
        let name = match self.state.product_draft() {
            Some(draft) => draft.name.trim().to_owned(),
            None => return Err(self.report(AppError::NoDraft)),
        };
        if name.is_empty() {
            return Err(self.report(AppError::validation("Enter a product name before generating a description.")));
        }

        self.set_busy(true);
        let suggestion =
            copywriter::generate_description(self.generator.as_deref(), &name, &self.settings.cuisine).await;
        self.set_busy(false);

        if suggestion.fallback {
            self.warn_fallback(&suggestion.text);
        }
        if let Some(draft) = self.state.product_draft_mut() {
            draft.apply(ProductEdit::Description(suggestion.text));
        }
        Ok(())
    }

    /// Advisory price range for `product_name`. Never touches the form.
    pub async fn suggest_price(&mut self, product_name: &str, ingredients: &str) -> String {
        self.set_busy(true);
        let suggestion = copywriter::suggest_price(self.generator.as_deref(), product_name, ingredients).await;
        self.set_busy(false);
        if suggestion.fallback {
            self.warn_fallback(&suggestion.text);
        }
        suggestion.text
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    /// Add a category at the end of the list.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, or the store error.
    pub async fn create_category(&mut self, name: &str) -> Result<(), AppError> {
        self.set_busy(true);
        let result = self.insert_category(name).await;
        self.set_busy(false);
        self.conclude(result, "Category created.")
    }

    async fn insert_category(&mut self, name: &str) -> Result<(), AppError> {
        let restaurant_id = self.active_id()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Category name is required."));
        }
        let category = NewCategory {
            restaurant_id,
            name: name.to_owned(),
            sort_order: self.state.next_category_order(),
        };
        self.ensure_fresh_session().await?;
        match catalog::insert_category(self.store.as_ref(), &category).await? {
            Some(created) => {
                info!(category_id = %created.id, "category created");
                self.state.upsert_category(created);
            }
            None => self.refresh_catalog(restaurant_id).await?,
        }
        Ok(())
    }

    /// Delete a category. Products that point at it keep the dangling
    /// reference and drop out of the public menu.
    ///
    /// # Errors
    ///
    /// Returns the store error; local state is untouched.
    pub async fn delete_category(&mut self, category_id: Uuid) -> Result<(), AppError> {
        self.set_busy(true);
        let result = self.remove_category(category_id).await;
        self.set_busy(false);
        self.conclude(result, "Category deleted.")
    }

    async fn remove_category(&mut self, category_id: Uuid) -> Result<(), AppError> {
        self.active_id()?;
        self.ensure_fresh_session().await?;
        let orphaned = self.state.products_in(category_id);
        catalog::delete_category(self.store.as_ref(), category_id).await?;
        if orphaned > 0 {
            warn!(category_id = %category_id, orphaned, "category deleted with products still assigned");
        } else {
            info!(category_id = %category_id, "category deleted");
        }
        self.state.remove_category(category_id);
        Ok(())
    }

    // =========================================================================
    // PROJECTIONS
    // =========================================================================

    /// Public link for the active restaurant.
    #[must_use]
    pub fn menu_link(&self) -> Option<String> {
        self.state
            .active_restaurant()
            .map(|r| menu::menu_link(&self.settings.public_origin, &r.slug).to_string())
    }

    #[must_use]
    pub fn public_menu(&self) -> Option<&PublicMenu> {
        match self.state.view() {
            View::Menu => self.state.menu(),
            _ => None,
        }
    }

    /// The admin shell, when the admin view has a restaurant to show.
    #[must_use]
    pub fn admin_shell(&self) -> Option<AdminShell<'_>> {
        if self.state.view() != View::Admin {
            return None;
        }
        let restaurant = self.state.active_restaurant()?;
        let link = menu::menu_link(&self.settings.public_origin, &restaurant.slug).to_string();
        Some(AdminShell::new(restaurant, self.state.admin_tab(), &self.state, link))
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn active_id(&self) -> Result<Uuid, AppError> {
        self.state.active_restaurant().map(|r| r.id).ok_or(AppError::NoRestaurant)
    }

    fn set_busy(&mut self, busy: bool) {
        self.state.set_busy(busy);
        self.busy.send_replace(busy);
    }

    fn navigate(&mut self, event: NavEvent) -> bool {
        let from = self.state.view();
        match from.next(event) {
            Some(to) => {
                if to != from {
                    debug!(?from, ?to, "view changed");
                }
                self.state.set_view(to);
                true
            }
            None => {
                debug!(?from, ?event, "navigation ignored");
                false
            }
        }
    }

    fn apply_session(&mut self, session: Option<Session>) {
        let event = if session.is_some() { NavEvent::SignedIn } else { NavEvent::SignedOut };
        if session.is_none() {
            self.state.clear_selection();
        }
        self.state.set_session(session);
        self.navigate(event);
    }

    async fn enter_session(&mut self, session: Session) {
        self.apply_session(Some(session));
        self.sync_selection().await;
    }

    async fn refresh_catalog(&mut self, restaurant_id: Uuid) -> Result<(), AppError> {
        let catalog = catalog::fetch_catalog(self.store.as_ref(), restaurant_id)
            .await
            .map_err(AppError::Refresh)?;
        debug!(restaurant_id = %restaurant_id, "catalog re-fetched");
        self.state.replace_catalog(catalog.categories, catalog.products);
        Ok(())
    }

    async fn refresh_restaurant(&mut self, restaurant_id: Uuid) -> Result<(), AppError> {
        let restaurants = catalog::list_restaurants(self.store.as_ref()).await?;
        let saved = restaurants
            .iter()
            .find(|r| r.id == restaurant_id)
            .cloned()
            .ok_or_else(|| AppError::RestaurantNotFound(restaurant_id.to_string()))?;
        self.state.set_restaurants(restaurants, None);
        self.state.apply_restaurant(saved);
        Ok(())
    }

    async fn store_image(&mut self, path: &Path, folder: &str) -> Result<String, AppError> {
        let image = ImageFile::read(path)?;
        self.ensure_fresh_session().await?;
        Ok(self.images.store(folder, &image).await?)
    }

    /// Swap an expired session for a refreshed one before a write. When the
    /// provider cannot refresh it, sign out locally and refuse the write.
    async fn ensure_fresh_session(&mut self) -> Result<(), AppError> {
        let now = Utc::now();
        if !self.state.session().is_some_and(|s| s.is_expired(now)) {
            return Ok(());
        }
        match self.auth.current_session().await? {
            Some(session) if !session.is_expired(Utc::now()) => {
                debug!(user_id = %session.user.id, "expired session refreshed");
                self.state.set_session(Some(session));
                Ok(())
            }
            _ => {
                warn!("session expired and could not be refreshed; signing out");
                self.apply_session(None);
                Err(AuthError::SessionExpired.into())
            }
        }
    }

    fn conclude(&mut self, result: Result<(), AppError>, success: &str) -> Result<(), AppError> {
        match result {
            Ok(()) => {
                self.state.push_notice(Notice::info(success));
                Ok(())
            }
            Err(e) => Err(self.report(e)),
        }
    }

    fn warn_fallback(&mut self, text: &str) {
        self.state.push_notice(Notice {
            severity: Severity::Warning,
            code: Some(AI_FALLBACK_CODE),
            message: text.to_owned(),
        });
    }

    /// Log `err` at its severity and queue it as a notice.
    fn report(&mut self, err: AppError) -> AppError {
        let code = err.error_code();
        match err.severity() {
            Severity::Error => error!(code, error = %err, "operation failed"),
            Severity::Warning => warn!(code, error = %err, "operation rejected"),
            Severity::Info => info!(code, error = %err, "operation note"),
        }
        self.state.push_notice(Notice::from_error(&err));
        err
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
