//! Shared Kernel - Domain-crossing minimal core
//!
//! The smallest vocabulary every crate in the portfolio backend agrees on:
//! - Unified error type, error kinds and result alias
//! - Typed UUID identifiers for entities that cross crate boundaries
//!
//! Anything with meaning inside a single bounded context belongs in that
//! context's crate, not here.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
