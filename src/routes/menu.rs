//! Public menu routes.

use std::fmt::Write;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use super::{ApiError, RouteState, error_response};
use crate::error::AppError;
use crate::menu::order::{self, Fulfilment, OrderLine, OrderMessage};
use crate::menu::{MenuHeader, PublicMenu, menu_link};
use crate::services::catalog;

#[derive(Debug, Serialize)]
pub struct RestaurantListing {
    #[serde(flatten)]
    pub restaurant: MenuHeader,
    pub menu_link: String,
}

#[derive(Debug, Deserialize)]
pub struct MenuLinkQuery {
    pub menu: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderLine>,
    pub fulfilment: Fulfilment,
}

async fn load_menu(state: &RouteState, slug: &str) -> Result<PublicMenu, AppError> {
    let restaurant = catalog::find_restaurant_by_slug(state.store.as_ref(), slug)
        .await?
        .ok_or_else(|| AppError::RestaurantNotFound(slug.to_owned()))?;
    let catalog = catalog::fetch_catalog(state.store.as_ref(), restaurant.id)
        .await
        .map_err(AppError::Refresh)?;
    Ok(PublicMenu::project(&restaurant, &catalog.categories, &catalog.products))
}

async fn listings(state: &RouteState) -> Result<Vec<RestaurantListing>, AppError> {
    let restaurants = catalog::list_restaurants(state.store.as_ref()).await?;
    Ok(restaurants
        .iter()
        .map(|r| RestaurantListing {
            restaurant: MenuHeader::from_restaurant(r),
            menu_link: menu_link(&state.public_origin, &r.slug).to_string(),
        })
        .collect())
}

/// `GET /api/restaurants` — landing list.
pub async fn list_restaurants(State(state): State<RouteState>) -> Result<Json<Vec<RestaurantListing>>, ApiError> {
    listings(&state).await.map(Json).map_err(|e| error_response(&e))
}

/// `GET /api/menu/{slug}` — public menu as JSON.
pub async fn get_menu(State(state): State<RouteState>, Path(slug): Path<String>) -> Result<Json<PublicMenu>, ApiError> {
    load_menu(&state, &slug).await.map(Json).map_err(|e| error_response(&e))
}

/// `GET /?menu={slug}` — the shared menu link, rendered as text. Without a
/// slug, the landing list.
pub async fn landing(State(state): State<RouteState>, Query(query): Query<MenuLinkQuery>) -> Result<String, ApiError> {
    let slug = query.menu.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let rendered = match slug {
        Some(slug) => load_menu(&state, slug).await.map(|menu| menu.to_string()),
        None => listings(&state).await.map(|list| render_landing(&list)),
    };
    rendered.map_err(|e| error_response(&e))
}

/// `POST /api/menu/{slug}/order` — price the lines against the menu and
/// build the WhatsApp message.
pub async fn create_order(
    State(state): State<RouteState>,
    Path(slug): Path<String>,
    Json(body): Json<OrderRequest>,
) -> Result<Json<OrderMessage>, ApiError> {
    let result = async {
        let menu = load_menu(&state, &slug).await?;
        let items = order::price_lines(&menu, &body.items)?;
        let message = order::compose(&menu.restaurant, &items, &body.fulfilment)?;
        tracing::info!(slug = %slug, items = message.items.len(), total = %message.total, "order composed");
        Ok::<_, AppError>(message)
    }
    .await;
    result.map(Json).map_err(|e| error_response(&e))
}

fn render_landing(listings: &[RestaurantListing]) -> String {
    if listings.is_empty() {
        return "No restaurants yet.\n".to_owned();
    }
    let mut out = String::new();
    for listing in listings {
        let status = if listing.restaurant.is_open { "open" } else { "closed" };
        let _ = writeln!(out, "{} ({status}) {}", listing.restaurant.name, listing.menu_link);
    }
    out
}

#[cfg(test)]
#[path = "menu_test.rs"]
mod tests;
