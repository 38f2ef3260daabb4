//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and store access so route handlers
//! can stay focused on protocol translation and status mapping.

pub mod endpoint;
pub mod hit;
pub mod probe;
