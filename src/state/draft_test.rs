use super::*;

use chrono::Utc;

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn restaurant() -> Restaurant {
    Restaurant {
        id: Uuid::new_v4(),
        name: "Pizza Joe".into(),
        slug: "pizza-joe".into(),
        logo: None,
        primary_color: Some("#d62828".into()),
        secondary_color: None,
        contact_email: None,
        contact_phone: None,
        whatsapp: Some("+55 11 99999-0000".into()),
        address: None,
        is_open: None,
        allows_delivery: None,
        min_order_value: None,
        user_id: Some(Uuid::new_v4()),
        created_at: Some(Utc::now()),
    }
}

#[test]
fn settings_draft_fills_defaults() {
    let draft = RestaurantDraft::from_restaurant(&restaurant());
    assert!(draft.is_open);
    assert!(draft.allows_delivery);
    assert_eq!(draft.min_order_value, Decimal::ZERO);
}

#[test]
fn toggles_only_touch_the_draft() {
    let row = restaurant();
    let mut draft = RestaurantDraft::from_restaurant(&row);
    draft.apply(SettingsEdit::Open(false));
    draft.apply(SettingsEdit::Delivery(false));
    assert!(!draft.is_open);
    assert!(!draft.allows_delivery);
    assert_eq!(row.is_open, None);
    assert_eq!(row.allows_delivery, None);
}

#[test]
fn blank_text_edits_clear_the_field() {
    let mut draft = RestaurantDraft::from_restaurant(&restaurant());
    draft.apply(SettingsEdit::PrimaryColor("  ".into()));
    draft.apply(SettingsEdit::Address("Rua A, 1".into()));
    assert_eq!(draft.primary_color, None);
    assert_eq!(draft.address.as_deref(), Some("Rua A, 1"));
}

#[test]
fn update_payload_omits_server_managed_fields() {
    let mut draft = RestaurantDraft::from_restaurant(&restaurant());
    draft.apply(SettingsEdit::Open(false));
    let json = serde_json::to_value(draft.to_update()).unwrap();
    let obj = json.as_object().unwrap();
    for field in ["id", "created_at", "slug", "user_id"] {
        assert!(!obj.contains_key(field), "{field} must not be sent");
    }
    assert_eq!(obj["isOpen"], false);
    assert_eq!(obj["allows_delivery"], true);
    assert_eq!(obj["name"], "Pizza Joe");
}

#[test]
fn settings_validation() {
    let mut draft = RestaurantDraft::from_restaurant(&restaurant());
    assert!(draft.validate().is_ok());
    draft.apply(SettingsEdit::MinOrderValue(dec("-1")));
    assert!(matches!(draft.validate(), Err(AppError::Validation(_))));
    draft.apply(SettingsEdit::MinOrderValue(dec("20")));
    draft.apply(SettingsEdit::Name(" ".into()));
    assert!(matches!(draft.validate(), Err(AppError::Validation(_))));
}

#[test]
fn new_product_draft_defaults() {
    let category = Uuid::new_v4();
    let draft = ProductDraft::new(Some(category));
    assert_eq!(draft.id, None);
    assert_eq!(draft.category_id, Some(category));
    assert_eq!(draft.price, Decimal::ZERO);
    assert!(draft.is_available);
    assert!(!draft.is_promotion);
}

#[test]
fn product_draft_from_row() {
    let product = Product {
        id: Uuid::new_v4(),
        restaurant_id: Uuid::new_v4(),
        category_id: None,
        name: "Calzone".into(),
        description: None,
        price: dec("42.50"),
        image: None,
        is_available: false,
        is_promotion: Some(true),
        created_at: None,
    };
    let draft = ProductDraft::from_product(&product);
    assert_eq!(draft.id, Some(product.id));
    assert_eq!(draft.description, "");
    assert!(!draft.is_available);
    assert!(draft.is_promotion);
}

#[test]
fn product_validation_rejects_blank_name_and_negative_price() {
    let mut draft = ProductDraft::new(None);
    draft.apply(ProductEdit::Name("   ".into()));
    assert!(matches!(draft.validate(), Err(AppError::Validation(_))));

    draft.apply(ProductEdit::Name("Margherita".into()));
    draft.apply(ProductEdit::Price(dec("-0.01")));
    assert!(matches!(draft.validate(), Err(AppError::Validation(_))));

    draft.apply(ProductEdit::Price(dec("0")));
    assert!(draft.validate().is_ok());
}

#[test]
fn product_payload_trims_and_attaches_restaurant() {
    let restaurant_id = Uuid::new_v4();
    let mut draft = ProductDraft::new(None);
    draft.apply(ProductEdit::Name("  Margherita ".into()));
    draft.apply(ProductEdit::Description(String::new()));
    draft.apply(ProductEdit::Price(dec("39.90")));

    let payload = draft.to_payload(restaurant_id);
    assert_eq!(payload.restaurant_id, restaurant_id);
    assert_eq!(payload.name, "Margherita");
    assert_eq!(payload.description, None);

    let json = serde_json::to_value(&payload).unwrap();
    assert!(json.get("id").is_none());
    assert!(json.get("created_at").is_none());
}
