//! Domain services used by the controller and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the collaborator round trips so the controller can
//! stay focused on state transitions and error reporting.

pub mod catalog;
pub mod copywriter;
