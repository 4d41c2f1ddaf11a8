//! Infrastructure Layer
//!
//! PostgreSQL stores, item table mappings and the email notifier.

pub mod items;
pub mod notifier;
pub mod postgres;
pub mod templates;
