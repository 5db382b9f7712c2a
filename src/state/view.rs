//! Navigation state machine.
//!
//! Four views, no history. Back always lands on [`View::Landing`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Landing,
    Auth,
    Admin,
    Menu,
}

/// Active pane inside the admin view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminTab {
    /// Product grid.
    #[default]
    Menu,
    /// Category grid.
    Inventory,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// The admin access button on the landing page.
    RequestAdmin { authenticated: bool },
    /// A session became present (sign in, sign up, restored session).
    SignedIn,
    /// The session went away (logout, expiry).
    SignedOut,
    /// A visitor picked a restaurant card or followed a menu link.
    OpenMenu,
    Back,
}

impl View {
    /// The view reached from `self` on `event`, or `None` when the event
    /// does not apply here.
    #[must_use]
    pub fn next(self, event: NavEvent) -> Option<Self> {
        match (self, event) {
            (Self::Landing, NavEvent::RequestAdmin { authenticated: false }) => Some(Self::Auth),
            (Self::Landing, NavEvent::RequestAdmin { authenticated: true }) | (_, NavEvent::SignedIn) => {
                Some(Self::Admin)
            }
            (_, NavEvent::SignedOut | NavEvent::Back) => Some(Self::Landing),
            (Self::Landing | Self::Menu, NavEvent::OpenMenu) => Some(Self::Menu),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
