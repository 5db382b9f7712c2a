//! Cardapio — multi-tenant digital menus for restaurants.
//!
//! ARCHITECTURE
//! ============
//! - [`controller`] owns the session-aware application state and runs every
//!   user action against three collaborators: [`store::DataStore`],
//!   [`auth::AuthProvider`] and [`llm::TextGenerator`].
//! - [`menu`] projects a restaurant's catalog into the public menu and
//!   composes WhatsApp orders from it.
//! - [`admin`] projects state into the tabbed admin shell.
//! - [`routes`] serves the public side over HTTP.

pub mod admin;
pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod images;
pub mod llm;
pub mod menu;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
