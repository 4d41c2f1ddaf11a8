//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (VerificationRequest, VerificationLogEntry, ItemSnapshot)
//! - Domain value objects (ItemKind, VerificationStatus, Email)
//! - Domain services (token issuer, clock)
//! - Repository and collaborator traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
