//! WhatsApp order composer.
//!
//! Diners pick items from the public menu and the order goes out as a
//! prefilled WhatsApp message to the restaurant. Prices always come from the
//! menu, never from the caller.

use std::fmt::Write;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::{MenuHeader, PublicMenu};
use crate::error::{ErrorCode, Severity};

const WHATSAPP_BASE: &str = "https://wa.me/";

/// Largest quantity accepted for a single line.
pub const MAX_QUANTITY: u32 = 999;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("the order is empty")]
    Empty,
    #[error("{0} is not taking orders right now")]
    Closed(String),
    #[error("{0} does not deliver")]
    DeliveryUnavailable(String),
    #[error("order total {total:.2} is below the minimum of {minimum:.2}")]
    BelowMinimum { total: Decimal, minimum: Decimal },
    #[error("quantity for {0} must be between 1 and {MAX_QUANTITY}")]
    InvalidQuantity(String),
    #[error("order total is too large")]
    TotalOverflow,
    #[error("product {0} is not on this menu")]
    UnknownProduct(Uuid),
    #[error("{0} is unavailable")]
    Unavailable(String),
    #[error("{0} has no WhatsApp number")]
    NoWhatsapp(String),
    #[error("a delivery address is required")]
    MissingAddress,
}

impl ErrorCode for OrderError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "E_ORDER_EMPTY",
            Self::Closed(_) => "E_ORDER_CLOSED",
            Self::DeliveryUnavailable(_) => "E_ORDER_NO_DELIVERY",
            Self::BelowMinimum { .. } => "E_ORDER_BELOW_MINIMUM",
            Self::InvalidQuantity(_) => "E_ORDER_QUANTITY",
            Self::TotalOverflow => "E_ORDER_TOTAL",
            Self::UnknownProduct(_) => "E_ORDER_UNKNOWN_PRODUCT",
            Self::Unavailable(_) => "E_ORDER_UNAVAILABLE",
            Self::NoWhatsapp(_) => "E_ORDER_NO_WHATSAPP",
            Self::MissingAddress => "E_ORDER_ADDRESS",
        }
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }
}

/// A priced order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub price: Decimal,
}

impl OrderItem {
    /// `price * quantity`, or `None` when it does not fit a `Decimal`.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// What the diner asked for, before pricing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Fulfilment {
    Pickup,
    Delivery { address: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderMessage {
    pub items: Vec<OrderItem>,
    pub total: Decimal,
    pub text: String,
    pub link: String,
}

// =============================================================================
// PRICING
// =============================================================================

/// Price `lines` against `menu`.
///
/// # Errors
///
/// Rejects empty orders, quantities outside `1..=MAX_QUANTITY`, and items
/// that are missing or unavailable.
pub fn price_lines(menu: &PublicMenu, lines: &[OrderLine]) -> Result<Vec<OrderItem>, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::Empty);
    }
    lines
        .iter()
        .map(|line| {
            let item = menu.item(line.product_id).ok_or(OrderError::UnknownProduct(line.product_id))?;
            if !item.is_available {
                return Err(OrderError::Unavailable(item.name.clone()));
            }
            if !(1..=MAX_QUANTITY).contains(&line.quantity) {
                return Err(OrderError::InvalidQuantity(item.name.clone()));
            }
            Ok(OrderItem {
                product_id: item.id,
                product_name: item.name.clone(),
                quantity: line.quantity,
                price: item.price,
            })
        })
        .collect()
}

// =============================================================================
// COMPOSITION
// =============================================================================

/// Build the order message and its WhatsApp link.
///
/// # Errors
///
/// Rejects orders the restaurant cannot take: closed, no delivery, under the
/// minimum, or no WhatsApp number to send to.
pub fn compose(
    restaurant: &MenuHeader,
    items: &[OrderItem],
    fulfilment: &Fulfilment,
) -> Result<OrderMessage, OrderError> {
    if items.is_empty() {
        return Err(OrderError::Empty);
    }
    if let Some(item) = items.iter().find(|i| !(1..=MAX_QUANTITY).contains(&i.quantity)) {
        return Err(OrderError::InvalidQuantity(item.product_name.clone()));
    }
    if !restaurant.is_open {
        return Err(OrderError::Closed(restaurant.name.clone()));
    }
    if let Fulfilment::Delivery { address } = fulfilment {
        if !restaurant.allows_delivery {
            return Err(OrderError::DeliveryUnavailable(restaurant.name.clone()));
        }
        if address.trim().is_empty() {
            return Err(OrderError::MissingAddress);
        }
    }

    let subtotals = items
        .iter()
        .map(OrderItem::subtotal)
        .collect::<Option<Vec<_>>>()
        .ok_or(OrderError::TotalOverflow)?;
    let total = subtotals
        .iter()
        .try_fold(Decimal::ZERO, |sum, subtotal| sum.checked_add(*subtotal))
        .ok_or(OrderError::TotalOverflow)?;
    if total < restaurant.min_order_value {
        return Err(OrderError::BelowMinimum { total, minimum: restaurant.min_order_value });
    }

    let phone = restaurant
        .whatsapp
        .as_deref()
        .map(digits)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| OrderError::NoWhatsapp(restaurant.name.clone()))?;

    let text = order_text(restaurant, items, &subtotals, total, fulfilment);
    let link = whatsapp_link(&phone, &text)?;
    Ok(OrderMessage { items: items.to_vec(), total, text, link: link.to_string() })
}

fn order_text(
    restaurant: &MenuHeader,
    items: &[OrderItem],
    subtotals: &[Decimal],
    total: Decimal,
    fulfilment: &Fulfilment,
) -> String {
    let mut text = format!("Hello, {}! I'd like to order:\n", restaurant.name);
    for (item, subtotal) in items.iter().zip(subtotals) {
        let _ = writeln!(text, "{}x {} ({:.2}) = {:.2}", item.quantity, item.product_name, item.price, subtotal);
    }
    let _ = writeln!(text, "Total: {total:.2}");
    match fulfilment {
        Fulfilment::Pickup => text.push_str("Pickup at the restaurant."),
        Fulfilment::Delivery { address } => {
            let _ = write!(text, "Delivery to: {}", address.trim());
        }
    }
    text
}

fn whatsapp_link(phone: &str, text: &str) -> Result<Url, OrderError> {
    let mut url = Url::parse(WHATSAPP_BASE).map_err(|_| OrderError::NoWhatsapp(phone.to_owned()))?;
    url.set_path(phone);
    url.query_pairs_mut().append_pair("text", text);
    Ok(url)
}

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
#[path = "order_test.rs"]
mod tests;
