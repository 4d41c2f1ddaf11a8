//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain meaning:
//! - Cryptographic randomness and encodings
//! - Client identification from HTTP headers
//! - Outbound mail transport

pub mod client;
pub mod crypto;
pub mod mail;
