use super::*;

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use crate::auth::TokenSource;
use crate::auth::memory::MemoryAuth;
use crate::llm::types::LlmError;
use crate::services::copywriter::{DESCRIPTION_FAILED_FALLBACK, PRICE_FALLBACK};
use crate::store::memory::MemoryStore;
use crate::store::{Query, StoreError, Table};

// =========================================================================
// SpyStore
// =========================================================================

/// Memory store that counts calls, records update patches, and can be told
/// to fail catalog reads or answer writes without a representation. When
/// given a busy receiver or a token source, each write records what it saw.
#[derive(Default)]
struct SpyStore {
    inner: MemoryStore,
    calls: AtomicUsize,
    patches: Mutex<Vec<Value>>,
    fail_products: AtomicBool,
    fail_restaurants: AtomicBool,
    silent_writes: AtomicBool,
    busy: Mutex<Option<watch::Receiver<bool>>>,
    busy_seen: Mutex<Vec<bool>>,
    tokens: Mutex<Option<TokenSource>>,
    bearers_seen: Mutex<Vec<String>>,
}

impl SpyStore {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn patches(&self) -> Vec<Value> {
        self.patches.lock().unwrap().clone()
    }

    fn silence(&self, rows: Vec<Value>) -> Vec<Value> {
        if self.silent_writes.load(Ordering::SeqCst) { Vec::new() } else { rows }
    }

    fn record_write(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(busy) = self.busy.lock().unwrap().as_ref() {
            self.busy_seen.lock().unwrap().push(*busy.borrow());
        }
        if let Some(tokens) = self.tokens.lock().unwrap().as_ref() {
            self.bearers_seen.lock().unwrap().push(tokens.bearer());
        }
    }
}

#[async_trait::async_trait]
impl DataStore for SpyStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = match query.table {
            Table::Products => self.fail_products.load(Ordering::SeqCst),
            Table::Restaurants => self.fail_restaurants.load(Ordering::SeqCst),
            Table::Categories => false,
        };
        if failing {
            return Err(StoreError::Request("connection reset".into()));
        }
        self.inner.select(query).await
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        self.record_write();
        let rows = self.inner.insert(table, rows).await?;
        Ok(self.silence(rows))
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Vec<Value>, StoreError> {
        self.record_write();
        self.patches.lock().unwrap().push(patch.clone());
        let rows = self.inner.update(table, id, patch).await?;
        Ok(self.silence(rows))
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), StoreError> {
        self.record_write();
        self.inner.delete(table, id).await
    }
}

// =========================================================================
// MockGenerator
// =========================================================================

struct MockGenerator {
    reply: Result<String, ()>,
    calls: AtomicUsize,
}

impl MockGenerator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self { reply: Ok(text.into()), calls: AtomicUsize::new(0) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { reply: Err(()), calls: AtomicUsize::new(0) })
    }
}

#[async_trait::async_trait]
impl TextGenerator for MockGenerator {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .map_err(|()| LlmError::Status { status: 500, body: "boom".into() })
    }
}

// =========================================================================
// Fixtures
// =========================================================================

struct Fixture {
    store: Arc<SpyStore>,
    auth: Arc<MemoryAuth>,
    owner: Uuid,
    joe: Uuid,
    sushi: Uuid,
    pizzas: Uuid,
    drinks: Uuid,
}

impl Fixture {
    fn controller(&self) -> Controller {
        Controller::new(self.store.clone(), self.auth.clone(), settings())
    }
}

fn settings() -> ControllerSettings {
    ControllerSettings::new(Url::parse("https://menu.example.com/app#top").unwrap())
}

fn id_of(row: &Value) -> Uuid {
    Uuid::parse_str(row["id"].as_str().unwrap()).unwrap()
}

async fn insert(store: &SpyStore, table: Table, row: Value) -> Uuid {
    let rows = store.inner.insert(table, vec![row]).await.unwrap();
    id_of(&rows[0])
}

/// Pizza Joe (owned by `owner`) with two categories and two products, plus
/// an unowned Sushi Go.
async fn fixture() -> Fixture {
    let store = Arc::new(SpyStore::default());
    let auth = Arc::new(MemoryAuth::new());
    let owner = auth.add_account("joe@example.com", "secret");
    auth.add_account("guest@example.com", "guest");

    let joe = insert(
        &store,
        Table::Restaurants,
        json!({
            "name": "Pizza Joe",
            "slug": "pizza-joe",
            "user_id": owner,
            "contact_email": "joe@example.com",
            "isOpen": true,
            "allows_delivery": true,
        }),
    )
    .await;
    let sushi = insert(&store, Table::Restaurants, json!({ "name": "Sushi Go", "slug": "sushi-go" })).await;

    let pizzas =
        insert(&store, Table::Categories, json!({ "restaurant_id": joe, "name": "Pizzas", "order": 0 })).await;
    let drinks =
        insert(&store, Table::Categories, json!({ "restaurant_id": joe, "name": "Drinks", "order": 1 })).await;
    insert(
        &store,
        Table::Products,
        json!({ "restaurant_id": joe, "category_id": pizzas, "name": "Margherita", "price": 39.9, "is_available": true }),
    )
    .await;
    insert(
        &store,
        Table::Products,
        json!({ "restaurant_id": joe, "category_id": drinks, "name": "Soda", "price": 6.0, "is_available": true }),
    )
    .await;

    Fixture { store, auth, owner, joe, sushi, pizzas, drinks }
}

/// Controller signed in as the Pizza Joe owner, in the admin view.
async fn signed_in(fx: &Fixture) -> Controller {
    fx.auth.restore(fx.owner);
    let mut controller = fx.controller();
    controller.start().await.unwrap();
    controller.take_notices();
    controller
}

async fn assert_matches_fresh_fetch(controller: &Controller, store: &SpyStore, restaurant_id: Uuid) {
    let fresh = catalog::fetch_catalog(&store.inner, restaurant_id).await.unwrap();
    assert_eq!(controller.state().categories(), fresh.categories.as_slice());
    assert_eq!(controller.state().products(), fresh.products.as_slice());
}

// =========================================================================
// Lifecycle
// =========================================================================

#[tokio::test]
async fn start_signed_out_lists_restaurants_on_landing() {
    let fx = fixture().await;
    let mut controller = fx.controller();
    controller.start().await.unwrap();

    let state = controller.state();
    assert_eq!(state.view(), View::Landing);
    assert!(!state.loading());
    assert!(state.banner().is_none());
    let names: Vec<_> = state.restaurants().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Pizza Joe", "Sushi Go"]);
    assert!(state.active_restaurant().is_none());
}

#[tokio::test]
async fn restored_session_selects_owned_restaurant() {
    let fx = fixture().await;
    let controller = signed_in(&fx).await;

    let state = controller.state();
    assert_eq!(state.view(), View::Admin);
    assert_eq!(state.active_restaurant().map(|r| r.id), Some(fx.joe));
    assert_eq!(state.categories().len(), 2);
    assert_eq!(state.products().len(), 2);
    assert_eq!(state.settings_draft().map(|d| d.id), Some(fx.joe));
}

#[tokio::test]
async fn unowned_user_falls_back_to_first_restaurant() {
    let fx = fixture().await;
    let guest = fx.auth.add_account("someone@example.com", "pw");
    fx.auth.restore(guest);

    let mut controller = fx.controller();
    controller.start().await.unwrap();
    assert_eq!(controller.state().view(), View::Admin);
    assert_eq!(controller.state().active_restaurant().map(|r| r.name.as_str()), Some("Pizza Joe"));
}

#[tokio::test]
async fn fallback_can_be_disabled() {
    let fx = fixture().await;
    let guest = fx.auth.add_account("someone@example.com", "pw");
    fx.auth.restore(guest);

    let mut settings = settings();
    settings.demo_fallback = false;
    let mut controller = Controller::new(fx.store.clone(), fx.auth.clone(), settings);
    controller.start().await.unwrap();
    assert_eq!(controller.state().view(), View::Admin);
    assert!(controller.state().active_restaurant().is_none());
    assert!(controller.admin_shell().is_none());
}

#[tokio::test]
async fn restaurant_load_failure_sets_banner() {
    let fx = fixture().await;
    fx.store.fail_restaurants.store(true, Ordering::SeqCst);
    let mut controller = fx.controller();

    let err = controller.start().await.unwrap_err();
    assert_eq!(err.error_code(), "E_STORE_REQUEST");
    assert_eq!(controller.state().banner(), Some(RESTAURANTS_FAILED_BANNER));
    assert!(controller.state().restaurants().is_empty());
    assert!(!controller.state().loading());
    assert_eq!(controller.take_notices().len(), 1);
}

#[tokio::test]
async fn session_changes_drive_the_view() {
    let fx = fixture().await;
    let mut controller = fx.controller();
    controller.start().await.unwrap();
    assert_eq!(controller.state().view(), View::Landing);

    fx.auth.restore(fx.owner);
    assert!(controller.next_session_change().await);
    assert_eq!(controller.state().view(), View::Admin);
    assert_eq!(controller.state().active_restaurant().map(|r| r.id), Some(fx.joe));

    fx.auth.sign_out().await.unwrap();
    assert!(controller.next_session_change().await);
    assert_eq!(controller.state().view(), View::Landing);
    assert!(controller.state().active_restaurant().is_none());
    assert!(controller.state().session().is_none());
}

#[tokio::test]
async fn stop_ends_the_subscription() {
    let fx = fixture().await;
    let mut controller = fx.controller();
    controller.start().await.unwrap();
    controller.stop();
    fx.auth.restore(fx.owner);
    assert!(!controller.next_session_change().await);
    assert_eq!(controller.state().view(), View::Landing);
}

// =========================================================================
// Navigation + auth
// =========================================================================

#[tokio::test]
async fn admin_request_routes_through_sign_in() {
    let fx = fixture().await;
    let mut controller = fx.controller();
    controller.start().await.unwrap();

    controller.request_admin().await;
    assert_eq!(controller.state().view(), View::Auth);

    let err = controller.sign_in("joe@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.error_code(), "E_INVALID_CREDENTIALS");
    assert_eq!(controller.state().view(), View::Auth);
    let notices = controller.take_notices();
    assert_eq!(notices[0].severity, Severity::Warning);

    controller.sign_in(" joe@example.com ", "secret").await.unwrap();
    assert_eq!(controller.state().view(), View::Admin);
    assert_eq!(controller.state().active_restaurant().map(|r| r.id), Some(fx.joe));
    assert!(!controller.state().busy());

    controller.go_back();
    assert_eq!(controller.state().view(), View::Landing);
    controller.request_admin().await;
    assert_eq!(controller.state().view(), View::Admin);
}

#[tokio::test]
async fn sign_up_enters_admin_and_rejects_duplicates() {
    let fx = fixture().await;
    let mut controller = fx.controller();
    controller.start().await.unwrap();
    controller.request_admin().await;

    let err = controller.sign_up("joe@example.com", "again").await.unwrap_err();
    assert_eq!(err.error_code(), "E_AUTH_API");
    assert_eq!(controller.state().view(), View::Auth);

    controller.sign_up("new@example.com", "pw").await.unwrap();
    assert_eq!(controller.state().view(), View::Admin);
}

#[tokio::test]
async fn logout_clears_everything() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;
    controller.logout().await.unwrap();

    let state = controller.state();
    assert_eq!(state.view(), View::Landing);
    assert!(!state.is_authenticated());
    assert!(state.active_restaurant().is_none());
    assert!(state.settings_draft().is_none());
    assert!(fx.auth.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn pizza_joe_public_menu() {
    let fx = fixture().await;
    let mut controller = fx.controller();
    controller.start().await.unwrap();

    controller.open_menu_by_slug("pizza-joe").await.unwrap();
    assert_eq!(controller.state().view(), View::Menu);

    let menu = controller.public_menu().unwrap();
    assert_eq!(menu.restaurant.name, "Pizza Joe");
    let sections: Vec<_> = menu.sections.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sections, ["Pizzas", "Drinks"]);
    assert_eq!(menu.sections[0].items[0].name, "Margherita");
    assert_eq!(menu.sections[0].items[0].price, Decimal::new(399, 1));
    assert_eq!(menu.item_count(), 2);

    controller.go_back();
    assert_eq!(controller.state().view(), View::Landing);
    assert!(controller.public_menu().is_none());
    assert!(controller.state().menu().is_none());
}

#[tokio::test]
async fn unknown_slug_is_reported() {
    let fx = fixture().await;
    let mut controller = fx.controller();
    controller.start().await.unwrap();

    let err = controller.open_menu_by_slug("nope").await.unwrap_err();
    assert!(matches!(err, AppError::RestaurantNotFound(ref slug) if slug == "nope"));
    assert_eq!(controller.state().view(), View::Landing);
}

#[tokio::test]
async fn menu_does_not_open_from_admin() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;
    let err = controller.open_menu(fx.sushi).await.unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION");
    assert_eq!(controller.state().view(), View::Admin);
}

// =========================================================================
// Selection
// =========================================================================

#[tokio::test]
async fn failed_refresh_keeps_previous_selection() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;
    let before = controller.state().products().to_vec();

    fx.store.fail_products.store(true, Ordering::SeqCst);
    let err = controller.select_restaurant(fx.sushi).await.unwrap_err();
    assert!(matches!(err, AppError::Refresh(_)));

    let state = controller.state();
    assert_eq!(state.active_restaurant().map(|r| r.id), Some(fx.joe));
    assert_eq!(state.products(), before.as_slice());
    let notices = controller.take_notices();
    assert_eq!(notices[0].code, Some("E_REFRESH"));
}

#[tokio::test]
async fn reconcile_picks_up_outside_writes() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    insert(
        &fx.store,
        Table::Products,
        json!({ "restaurant_id": fx.joe, "name": "Calzone", "price": 42.0, "is_available": true }),
    )
    .await;
    controller.reconcile().await.unwrap();
    assert_eq!(controller.state().products()[0].name, "Calzone");
    assert_matches_fresh_fetch(&controller, &fx.store, fx.joe).await;
}

// =========================================================================
// Settings
// =========================================================================

#[tokio::test]
async fn settings_save_sends_editable_fields_only() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    controller.edit_settings(SettingsEdit::Open(false)).unwrap();
    controller.edit_settings(SettingsEdit::Whatsapp("+55 11 99999-0000".into())).unwrap();
    assert!(fx.store.patches().is_empty());

    controller.save_settings().await.unwrap();
    let patches = fx.store.patches();
    assert_eq!(patches.len(), 1);
    let patch = patches[0].as_object().unwrap();
    for key in ["id", "slug", "user_id", "created_at"] {
        assert!(!patch.contains_key(key), "patch must not carry {key}");
    }
    assert_eq!(patch["isOpen"], false);

    let state = controller.state();
    assert_eq!(state.active_restaurant().and_then(|r| r.is_open), Some(false));
    let listed = state.restaurants().iter().find(|r| r.id == fx.joe).unwrap();
    assert_eq!(listed.whatsapp.as_deref(), Some("+55 11 99999-0000"));
    assert_eq!(controller.take_notices(), vec![Notice::info("Settings saved.")]);
}

#[tokio::test]
async fn unsaved_settings_are_discarded_on_view_switch() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    controller.edit_settings(SettingsEdit::Name("Pizza Jim".into())).unwrap();
    controller.go_back();
    assert_eq!(controller.state().view(), View::Landing);
    assert_eq!(controller.state().settings_draft().map(|d| d.name.as_str()), Some("Pizza Joe"));
    assert!(fx.store.patches().is_empty());
}

#[tokio::test]
async fn invalid_settings_are_not_sent() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    controller.edit_settings(SettingsEdit::Name("  ".into())).unwrap();
    let calls = fx.store.calls();
    let err = controller.save_settings().await.unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION");
    assert_eq!(fx.store.calls(), calls);
    assert!(!controller.state().busy());
}

#[tokio::test]
async fn settings_save_without_representation_refetches() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;
    fx.store.silent_writes.store(true, Ordering::SeqCst);

    controller.edit_settings(SettingsEdit::Delivery(false)).unwrap();
    controller.save_settings().await.unwrap();
    assert_eq!(controller.state().active_restaurant().and_then(|r| r.allows_delivery), Some(false));
}

#[tokio::test]
async fn attach_logo_fills_the_draft() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    let path = std::env::temp_dir().join(format!("cardapio-logo-{}.png", Uuid::new_v4()));
    std::fs::write(&path, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]).unwrap();
    controller.attach_logo(&path).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    let logo = controller.state().settings_draft().and_then(|d| d.logo.clone()).unwrap();
    assert!(logo.starts_with("data:image/png;base64,"));

    let missing = std::env::temp_dir().join("cardapio-missing.png");
    assert!(controller.attach_logo(&missing).await.is_err());
}

#[tokio::test]
async fn menu_link_uses_public_origin() {
    let fx = fixture().await;
    let controller = signed_in(&fx).await;
    assert_eq!(controller.menu_link().as_deref(), Some("https://menu.example.com/app?menu=pizza-joe"));
}

// =========================================================================
// Products
// =========================================================================

#[tokio::test]
async fn blank_product_name_is_rejected_before_network() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    controller.open_product_form(None).unwrap();
    controller.edit_product(ProductEdit::Name("   ".into())).unwrap();
    controller.edit_product(ProductEdit::Price(Decimal::new(10, 0))).unwrap();

    let calls = fx.store.calls();
    let err = controller.save_product().await.unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION");
    assert_eq!(fx.store.calls(), calls);
    assert!(controller.state().product_draft().is_some());
}

#[tokio::test]
async fn product_create_update_delete_match_fresh_fetch() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    controller.open_product_form(None).unwrap();
    assert_eq!(controller.state().product_draft().and_then(|d| d.category_id), Some(fx.pizzas));
    controller.edit_product(ProductEdit::Name(" Calabresa ".into())).unwrap();
    controller.edit_product(ProductEdit::Price(Decimal::new(4590, 2))).unwrap();
    controller.save_product().await.unwrap();
    assert!(controller.state().product_draft().is_none());
    assert_eq!(controller.state().products()[0].name, "Calabresa");
    assert_matches_fresh_fetch(&controller, &fx.store, fx.joe).await;

    let id = controller.state().products()[0].id;
    controller.open_product_form(Some(id)).unwrap();
    controller.edit_product(ProductEdit::Category(Some(fx.drinks))).unwrap();
    controller.edit_product(ProductEdit::Promotion(true)).unwrap();
    controller.save_product().await.unwrap();
    assert_matches_fresh_fetch(&controller, &fx.store, fx.joe).await;
    let saved = controller.state().products().iter().find(|p| p.id == id).unwrap();
    assert_eq!(saved.category_id, Some(fx.drinks));
    assert!(saved.on_promotion());

    controller.delete_product(id).await.unwrap();
    assert!(controller.state().products().iter().all(|p| p.id != id));
    assert_matches_fresh_fetch(&controller, &fx.store, fx.joe).await;

    let notices: Vec<_> = controller.take_notices().into_iter().map(|n| n.message).collect();
    assert_eq!(notices, ["Product saved.", "Product saved.", "Product deleted."]);
}

#[tokio::test]
async fn writes_without_representation_refetch() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;
    fx.store.silent_writes.store(true, Ordering::SeqCst);

    controller.open_product_form(None).unwrap();
    controller.edit_product(ProductEdit::Name("Water".into())).unwrap();
    controller.edit_product(ProductEdit::Price(Decimal::new(4, 0))).unwrap();
    controller.save_product().await.unwrap();
    assert_eq!(controller.state().products().len(), 3);

    controller.create_category("Desserts").await.unwrap();
    assert_eq!(controller.state().categories().len(), 3);
    assert_matches_fresh_fetch(&controller, &fx.store, fx.joe).await;
}

#[tokio::test]
async fn busy_is_raised_while_writes_are_in_flight() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;
    let busy = controller.busy_signal();
    *fx.store.busy.lock().unwrap() = Some(busy.clone());

    controller.open_product_form(None).unwrap();
    controller.edit_product(ProductEdit::Name("Calzone".into())).unwrap();
    controller.edit_product(ProductEdit::Price(Decimal::new(42, 0))).unwrap();
    controller.save_product().await.unwrap();
    controller.create_category("Desserts").await.unwrap();
    let id = controller.state().products()[0].id;
    controller.delete_product(id).await.unwrap();

    assert_eq!(*fx.store.busy_seen.lock().unwrap(), [true, true, true]);
    assert!(!*busy.borrow());
    assert!(!controller.state().busy());
}

#[tokio::test]
async fn expired_session_is_refreshed_before_writes() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;
    *fx.store.tokens.lock().unwrap() = Some(fx.auth.token_source("anon"));
    let stale = fx.auth.restore_expired(fx.owner, Utc::now() - TimeDelta::minutes(5), true);
    assert!(controller.next_session_change().await);
    assert_eq!(controller.state().session(), Some(&stale));

    controller.create_category("Desserts").await.unwrap();

    let fresh = controller.state().session().unwrap().clone();
    assert_ne!(fresh.access_token, stale.access_token);
    assert!(!fresh.is_expired(Utc::now()));
    assert_eq!(*fx.store.bearers_seen.lock().unwrap(), [fresh.access_token]);
    assert_eq!(controller.state().view(), View::Admin);
}

#[tokio::test]
async fn unrefreshable_session_signs_out_without_writing() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;
    fx.auth.restore_expired(fx.owner, Utc::now() - TimeDelta::minutes(5), false);
    assert!(controller.next_session_change().await);
    let calls = fx.store.calls();

    let err = controller.create_category("Desserts").await.unwrap_err();
    assert_eq!(err.error_code(), "E_SESSION_EXPIRED");
    assert_eq!(fx.store.calls(), calls);
    assert_eq!(controller.state().view(), View::Landing);
    assert!(!controller.state().is_authenticated());
    assert!(controller.state().active_restaurant().is_none());
    assert!(!controller.state().busy());
}

#[tokio::test]
async fn form_requires_an_open_draft() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    assert!(matches!(controller.edit_product(ProductEdit::Available(false)), Err(AppError::NoDraft)));
    assert!(matches!(controller.save_product().await, Err(AppError::NoDraft)));
    assert!(controller.open_product_form(Some(Uuid::new_v4())).is_err());

    controller.open_product_form(None).unwrap();
    controller.close_product_form();
    assert!(controller.state().product_draft().is_none());
}

// =========================================================================
// Categories
// =========================================================================

#[tokio::test]
async fn new_categories_go_last() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    assert!(controller.create_category("  ").await.is_err());
    controller.create_category(" Desserts ").await.unwrap();

    let categories = controller.state().categories();
    let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Pizzas", "Drinks", "Desserts"]);
    assert_eq!(categories[2].sort_order, Some(2));
    assert_matches_fresh_fetch(&controller, &fx.store, fx.joe).await;
}

#[tokio::test]
async fn deleting_a_used_category_orphans_its_products() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    controller.delete_category(fx.drinks).await.unwrap();
    let state = controller.state();
    assert_eq!(state.categories().len(), 1);
    let soda = state.products().iter().find(|p| p.name == "Soda").unwrap();
    assert_eq!(soda.category_id, Some(fx.drinks));
    assert_eq!(state.category_name(fx.drinks), None);
    assert_matches_fresh_fetch(&controller, &fx.store, fx.joe).await;

    let restaurant = state.active_restaurant().unwrap();
    let menu = PublicMenu::project(restaurant, state.categories(), state.products());
    assert_eq!(menu.item_count(), 1);
}

// =========================================================================
// Text generation
// =========================================================================

#[tokio::test]
async fn description_needs_a_name_first() {
    let fx = fixture().await;
    let generator = MockGenerator::replying("Tasty.");
    let mut controller = signed_in(&fx).await.with_generator(generator.clone());

    controller.open_product_form(None).unwrap();
    let err = controller.generate_description().await.unwrap_err();
    assert_eq!(err.error_code(), "E_VALIDATION");
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn description_is_generated_into_the_draft() {
    let fx = fixture().await;
    let generator = MockGenerator::replying("Wood-fired, with fresh basil.");
    let mut controller = signed_in(&fx).await.with_generator(generator);

    controller.open_product_form(None).unwrap();
    controller.edit_product(ProductEdit::Name("Margherita".into())).unwrap();
    controller.generate_description().await.unwrap();
    assert_eq!(
        controller.state().product_draft().map(|d| d.description.as_str()),
        Some("Wood-fired, with fresh basil.")
    );
    assert!(controller.take_notices().is_empty());
}

#[tokio::test]
async fn generation_failure_falls_back() {
    let fx = fixture().await;
    for generator in [Some(MockGenerator::failing()), None] {
        let mut controller = signed_in(&fx).await;
        if let Some(generator) = generator {
            controller = controller.with_generator(generator);
        }
        controller.open_product_form(None).unwrap();
        controller.edit_product(ProductEdit::Name("Margherita".into())).unwrap();
        controller.generate_description().await.unwrap();

        assert_eq!(
            controller.state().product_draft().map(|d| d.description.as_str()),
            Some(DESCRIPTION_FAILED_FALLBACK)
        );
        assert!(!controller.state().busy());
        let notices = controller.take_notices();
        assert_eq!(notices[0].code, Some(AI_FALLBACK_CODE));
    }
}

#[tokio::test]
async fn price_suggestion_is_advisory() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await.with_generator(MockGenerator::replying("R$ 40-50."));
    assert_eq!(controller.suggest_price("Margherita", "tomato, mozzarella").await, "R$ 40-50.");
    assert!(controller.state().product_draft().is_none());

    let mut offline = signed_in(&fx).await;
    assert_eq!(offline.suggest_price("Marinara", "tomato").await, PRICE_FALLBACK);
}

// =========================================================================
// Projections
// =========================================================================

#[tokio::test]
async fn admin_shell_only_in_admin_view() {
    let fx = fixture().await;
    let mut controller = signed_in(&fx).await;

    controller.set_admin_tab(AdminTab::Inventory);
    let shell = controller.admin_shell().unwrap();
    assert_eq!(shell.tab, AdminTab::Inventory);
    assert_eq!(shell.row_ids(), vec![fx.pizzas, fx.drinks]);

    controller.go_back();
    assert!(controller.admin_shell().is_none());
}
